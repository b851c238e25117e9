//! Feed tests against a stub catalog.

mod common;

use std::time::Duration;

use common::{film_id, TestApi, PAGE_SIZE};
use whatfilm_rs::feed::FeedDelays;
use whatfilm_rs::{Feed, FeedEvent, Film, PageRequest, PaginatedList};

fn delays() -> FeedDelays {
    FeedDelays {
        reload: Duration::from_millis(30),
        next_page: Duration::from_millis(20),
    }
}

async fn next_list(feed: &mut Feed<Film>) -> PaginatedList<Film> {
    loop {
        match feed.next_event().await {
            Some(FeedEvent::Loading) => continue,
            Some(FeedEvent::Loaded(list)) => return list,
            other => panic!("expected a list, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_feed_pages_through_popular_films() {
    let api = TestApi::start(3).await;
    let mut feed = Feed::with_delays(api.client(), PageRequest::popular(), delays());

    feed.reload();
    assert!(feed.next_event().await.unwrap().is_loading());
    let list = next_list(&mut feed).await;
    assert_eq!(list.len(), PAGE_SIZE);

    feed.next_page();
    let list = next_list(&mut feed).await;
    assert_eq!(list.len(), 2 * PAGE_SIZE);

    feed.next_page();
    let list = next_list(&mut feed).await;
    assert_eq!(list.len(), 3 * PAGE_SIZE);
    assert!(!list.has_more_content());
    assert_eq!(list[2 * PAGE_SIZE].id, film_id(2, 0));
}

#[tokio::test]
async fn test_search_restarts_feed() {
    let api = TestApi::start(5).await;
    let mut feed = Feed::with_delays(api.client(), PageRequest::popular(), delays());

    feed.reload();
    next_list(&mut feed).await;
    feed.next_page();
    assert_eq!(next_list(&mut feed).await.page_count(), 2);

    feed.search("matrix");
    let list = next_list(&mut feed).await;
    assert_eq!(list.page_count(), 1);

    let requests = api.state.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(
        requests[2],
        "/3/search/movie?api_key=test-key&query=matrix&page=1"
    );
}

#[tokio::test]
async fn test_failed_feed_reports_error() {
    let api = TestApi::start(2).await;
    let mut feed: Feed<Film> = Feed::with_delays(api.client_with_key(None), PageRequest::upcoming(), delays());

    feed.reload();
    assert!(feed.next_event().await.unwrap().is_loading());
    assert!(matches!(feed.next_event().await, Some(FeedEvent::Failed(_))));
}
