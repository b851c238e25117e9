//! Debounced, restartable feeds of catalog pages.
//!
//! A [`Feed`] owns at most one pagination session at a time. Reloads and
//! searches restart it from page 0 after a quiet period; next-page requests
//! are debounced separately and forwarded to the live session's trigger.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::{NEXT_PAGE_DEBOUNCE, RELOAD_DEBOUNCE};
use crate::error::SessionError;
use crate::models::PaginatedList;
use crate::session::{NextPageTrigger, PaginationSession, SessionHandle};
use crate::transport::{PageFetcher, PageRequest, SearchParameters};

/// Forwards the latest pushed value once no new value arrived for `delay`.
pub struct Debouncer<V> {
    input: mpsc::UnboundedSender<V>,
}

impl<V: Send + 'static> Debouncer<V> {
    pub fn spawn(delay: Duration, output: mpsc::UnboundedSender<V>) -> Self {
        let (input, mut pushed) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(mut latest) = pushed.recv().await {
                loop {
                    tokio::select! {
                        next = pushed.recv() => match next {
                            Some(value) => latest = value,
                            None => {
                                output.send(latest).ok();
                                return;
                            }
                        },
                        _ = tokio::time::sleep(delay) => break,
                    }
                }
                if output.send(latest).is_err() {
                    return;
                }
            }
        });

        Self { input }
    }

    pub fn push(&self, value: V) {
        self.input.send(value).ok();
    }
}

/// What a feed reports to its consumer.
#[derive(Debug)]
pub enum FeedEvent<T> {
    /// A (re)started session is fetching its first page.
    Loading,
    Loaded(PaginatedList<T>),
    Failed(SessionError),
}

impl<T> FeedEvent<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, FeedEvent::Loading)
    }
}

/// A debounced request to restart the feed from page 0.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Restart {
    Reload(PageRequest),
    Search(String),
}

/// Quiet periods applied to feed inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedDelays {
    pub reload: Duration,
    pub next_page: Duration,
}

impl Default for FeedDelays {
    fn default() -> Self {
        Self {
            reload: RELOAD_DEBOUNCE,
            next_page: NEXT_PAGE_DEBOUNCE,
        }
    }
}

/// A catalog listing driven by reload, search and next-page inputs.
pub struct Feed<T> {
    request: PageRequest,
    restarts: Debouncer<Restart>,
    next_pages: Debouncer<()>,
    events: mpsc::UnboundedReceiver<FeedEvent<T>>,
    token: CancellationToken,
}

impl<T> Feed<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a feed whose reloads fetch `request`.
    ///
    /// Nothing is fetched until the first [`reload`](Self::reload) or
    /// [`search`](Self::search).
    pub fn new<F>(fetcher: Arc<F>, request: PageRequest) -> Self
    where
        F: PageFetcher<T> + ?Sized + 'static,
    {
        Self::with_delays(fetcher, request, FeedDelays::default())
    }

    pub fn with_delays<F>(fetcher: Arc<F>, request: PageRequest, delays: FeedDelays) -> Self
    where
        F: PageFetcher<T> + ?Sized + 'static,
    {
        let (restart_tx, restart_rx) = mpsc::unbounded_channel();
        let (next_tx, next_rx) = mpsc::unbounded_channel();
        let (event_tx, events) = mpsc::unbounded_channel();
        let token = CancellationToken::new();

        tokio::spawn(drive(fetcher, restart_rx, next_rx, event_tx, token.clone()));

        Self {
            request,
            restarts: Debouncer::spawn(delays.reload, restart_tx),
            next_pages: Debouncer::spawn(delays.next_page, next_tx),
            events,
            token,
        }
    }

    pub fn request(&self) -> &PageRequest {
        &self.request
    }

    /// Restarts the feed's own request from page 0.
    pub fn reload(&self) {
        self.restarts.push(Restart::Reload(self.request.for_page(0)));
    }

    /// Restarts the feed as a title search for `query`.
    ///
    /// Once debounced, a query equal to the one the current listing was
    /// searched with is ignored.
    pub fn search(&self, query: &str) {
        self.restarts.push(Restart::Search(query.to_string()));
    }

    /// Asks the live session for its next page.
    pub fn next_page(&self) {
        self.next_pages.push(());
    }

    /// Next event, or `None` once the feed has shut down.
    pub async fn next_event(&mut self) -> Option<FeedEvent<T>> {
        self.events.recv().await
    }
}

impl<T> Drop for Feed<T> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn drive<T, F>(
    fetcher: Arc<F>,
    mut restarts: mpsc::UnboundedReceiver<Restart>,
    mut next_pages: mpsc::UnboundedReceiver<()>,
    events: mpsc::UnboundedSender<FeedEvent<T>>,
    token: CancellationToken,
) where
    T: Clone + Send + Sync + 'static,
    F: PageFetcher<T> + ?Sized + 'static,
{
    let trigger = NextPageTrigger::new();
    let mut session: Option<SessionHandle<T>> = None;
    // Query of the listing currently shown, if it is a search.
    let mut live_query: Option<String> = None;

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            restart = restarts.recv() => {
                let request = match restart {
                    Some(Restart::Reload(request)) => {
                        live_query = None;
                        request
                    }
                    Some(Restart::Search(query)) => {
                        if live_query.as_deref() == Some(query.as_str()) {
                            debug!("Ignoring repeated search for {:?}", query);
                            continue;
                        }
                        let request = PageRequest::search(SearchParameters::new(query.as_str()));
                        live_query = Some(query);
                        request
                    }
                    None => break,
                };
                debug!("Restarting feed for {}", request.endpoint().path());
                // Dropping the previous handle cancels its session.
                drop(session.take());
                if events.send(FeedEvent::Loading).is_err() {
                    break;
                }
                session = Some(PaginationSession::start(fetcher.clone(), request, trigger.clone()));
            }
            fired = next_pages.recv() => {
                if fired.is_none() {
                    break;
                }
                trigger.fire();
            }
            emission = next_emission(&mut session) => {
                let event = match emission {
                    Some(Ok(list)) => FeedEvent::Loaded(list),
                    Some(Err(e)) => {
                        // a failed search may be retried with the same query
                        live_query = None;
                        FeedEvent::Failed(e)
                    }
                    None => {
                        session = None;
                        continue;
                    }
                };
                if events.send(event).is_err() {
                    break;
                }
            }
        }
    }
}

async fn next_emission<T: Send + 'static>(
    session: &mut Option<SessionHandle<T>>,
) -> Option<Result<PaginatedList<T>, SessionError>> {
    match session {
        Some(handle) => handle.next().await,
        None => std::future::pending().await,
    }
}
