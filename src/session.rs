//! Fetch-with-continuation sessions.
//!
//! A session fetches page 0, folds it into a [`PaginatedList`], emits a
//! snapshot and then parks until the caller fires its [`NextPageTrigger`].
//! Each fire while parked fetches and emits the next page, until the server
//! reports no further pages, a fetch fails, or the session is cancelled.

use std::sync::Arc;
use tokio::sync::{mpsc, watch, Notify};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{SessionError, SessionResult};
use crate::models::PaginatedList;
use crate::transport::{PageFetcher, PageRequest};

/// Observable state of a pagination session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Spawned, nothing requested yet.
    Idle,
    /// A request for the given page is in flight.
    Fetching(usize),
    /// A snapshot was emitted and more pages exist; waiting for a trigger.
    AwaitingNext,
    /// The last page was emitted.
    Completed,
    /// A fetch or pagination error was emitted.
    Failed,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Failed | SessionStatus::Cancelled
        )
    }
}

/// Caller-side signal asking a session for its next page.
///
/// Fires only reach sessions currently awaiting a trigger; a fire at any
/// other time is dropped rather than queued.
#[derive(Debug, Clone, Default)]
pub struct NextPageTrigger {
    notify: Arc<Notify>,
}

impl NextPageTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fire(&self) {
        self.notify.notify_waiters();
    }
}

type Emission<T> = SessionResult<PaginatedList<T>>;

/// Background state machine behind a [`SessionHandle`].
pub struct PaginationSession<T, F: ?Sized> {
    fetcher: Arc<F>,
    request: PageRequest,
    trigger: NextPageTrigger,
    list: PaginatedList<T>,
    status: watch::Sender<SessionStatus>,
    output: mpsc::Sender<Emission<T>>,
    token: CancellationToken,
}

impl<T, F> PaginationSession<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: PageFetcher<T> + ?Sized + 'static,
{
    /// Spawns a session starting at `request`'s page.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(fetcher: Arc<F>, request: PageRequest, trigger: NextPageTrigger) -> SessionHandle<T> {
        let (output, emissions) = mpsc::channel(1);
        let (status, status_rx) = watch::channel(SessionStatus::Idle);
        let token = CancellationToken::new();

        let session = Self {
            fetcher,
            request,
            trigger,
            list: PaginatedList::empty(),
            status,
            output,
            token: token.clone(),
        };
        tokio::spawn(session.run());

        SessionHandle {
            emissions,
            status: status_rx,
            token,
        }
    }

    async fn run(mut self) {
        let mut page_index = self.request.page_index();

        loop {
            self.transition(SessionStatus::Fetching(page_index));
            let request = self.request.for_page(page_index);

            let fetched = tokio::select! {
                biased;
                _ = self.token.cancelled() => {
                    self.transition(SessionStatus::Cancelled);
                    return;
                }
                result = self.fetcher.fetch_page(&request) => result,
            };

            let page = match fetched {
                Ok(page) => page,
                Err(e) => return self.fail(e.into()).await,
            };
            let has_next_page = page.has_next_page();
            let next_page_index = page.next_page_index();

            if let Err(e) = self.list.append(page) {
                return self.fail(e.into()).await;
            }

            if !has_next_page {
                self.transition(SessionStatus::Completed);
                self.emit(Ok(self.list.clone())).await;
                return;
            }

            // Register for the trigger before the caller can see the list.
            let notify = self.trigger.notify.clone();
            let notified = notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            self.transition(SessionStatus::AwaitingNext);
            if !self.emit(Ok(self.list.clone())).await {
                return;
            }

            tokio::select! {
                biased;
                _ = self.token.cancelled() => {
                    self.transition(SessionStatus::Cancelled);
                    return;
                }
                _ = notified => {}
            }
            page_index = next_page_index;
        }
    }

    async fn fail(&self, error: SessionError) {
        debug!("Pagination session failed: {}", error);
        self.transition(SessionStatus::Failed);
        self.emit(Err(error)).await;
    }

    /// Delivers an emission; returns `false` if the session was cancelled
    /// or the handle is gone.
    async fn emit(&self, item: Emission<T>) -> bool {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                self.transition(SessionStatus::Cancelled);
                false
            }
            sent = self.output.send(item) => sent.is_ok(),
        }
    }

    fn transition(&self, next: SessionStatus) {
        self.status.send_if_modified(|current| {
            if current.is_terminal() || *current == next {
                return false;
            }
            debug!("Pagination session {:?} -> {:?}", current, next);
            *current = next;
            true
        });
    }
}

/// Caller's end of a pagination session.
///
/// Dropping the handle cancels the session.
pub struct SessionHandle<T> {
    emissions: mpsc::Receiver<Emission<T>>,
    status: watch::Receiver<SessionStatus>,
    token: CancellationToken,
}

impl<T: Send + 'static> SessionHandle<T> {
    /// Next snapshot, or `None` once the session has ended or was cancelled.
    ///
    /// An `Err` is always the last item.
    pub async fn next(&mut self) -> Option<Emission<T>> {
        if self.token.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            item = self.emissions.recv() => item,
        }
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    /// A receiver following every status change.
    pub fn watch_status(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    /// Waits until the session reaches a terminal status.
    pub async fn finished(&self) -> SessionStatus {
        let mut status = self.status.clone();
        let reached = status.wait_for(SessionStatus::is_terminal).await.map(|s| *s);
        reached.unwrap_or_else(|_| *status.borrow())
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Turns the handle into a stream of snapshots.
    pub fn into_stream(self) -> impl futures::Stream<Item = Emission<T>> {
        futures::stream::unfold(self, |mut handle| async move {
            let item = handle.next().await?;
            Some((item, handle))
        })
    }
}

impl<T> Drop for SessionHandle<T> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
