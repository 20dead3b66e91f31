// src/crawler/engine.rs
// =============================================================================
// The crawl engine: one coordinating task per crawl.
//
// How it works:
// 1. dispatch() creates the frontier (seeded with the start address), spawns
//    the coordinating task and hands back a Crawl handle right away
// 2. The task loops over tokio::select!, reacting to ONE ready event per turn:
//    - issue fetch:  nothing in flight, something pending, queue not full
//    - fetch done:   queue the item, add its unseen links to the frontier
//    - deliver item: the consumer has room for the head of the queue
//    - close:        a cancel request (from the handle or from the loop itself)
// 3. When nothing is pending, queued or in flight, the loop posts a close
//    request to itself and exits on the next turn
//
// Guarantees:
// - At most one fetch in flight, so fetches never overlap
// - Every address is fetched at most once (see frontier.rs)
// - New fetches stop while `capacity` items wait for the consumer
// - Items reach the consumer in the order their fetches finished
//
// select! picks randomly among ready branches, so there is no fixed priority
// between issuing, completing and delivering.
// =============================================================================

use super::fetcher::{FetchError, Fetcher};
use super::frontier::{Frontier, Pending};
use super::item::Item;
use super::retry::RetryPolicy;
use crate::config::{ConfigError, CrawlConfig};
use futures::{FutureExt, Stream};
use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

// A close request carries the channel the loop answers on
type CloseRequest = oneshot::Sender<Option<FetchError>>;

/// Starts crawls with a shared fetcher and configuration.
pub struct Dispatcher<F> {
    fetcher: Arc<F>,
    config: CrawlConfig,
    retry: Arc<dyn RetryPolicy>,
}

impl<F: Fetcher> Dispatcher<F> {
    /// Dispatcher with the default configuration
    pub fn new(fetcher: F) -> Self {
        let config = CrawlConfig::default();
        Self {
            fetcher: Arc::new(fetcher),
            retry: Arc::new(config.retry.clone()),
            config,
        }
    }

    /// Dispatcher with a custom configuration, checked up front
    pub fn with_config(fetcher: F, config: CrawlConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            fetcher: Arc::new(fetcher),
            retry: Arc::new(config.retry.clone()),
            config,
        })
    }

    /// Replaces the retry policy taken from the configuration
    pub fn with_retry_policy<P: RetryPolicy + 'static>(mut self, policy: P) -> Self {
        self.retry = Arc::new(policy);
        self
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Starts crawling from `seed` and returns immediately.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn dispatch(&self, seed: &str, depth: usize) -> Crawl {
        let id = Uuid::new_v4();
        let max_level = self.config.enforce_depth.then_some(depth);

        let (items_tx, items_rx) = mpsc::channel(1);
        let (closing_tx, closing_rx) = mpsc::unbounded_channel();

        let engine = Engine {
            fetcher: Arc::clone(&self.fetcher),
            retry: Arc::clone(&self.retry),
            frontier: Frontier::new(seed, max_level),
            queue: VecDeque::new(),
            capacity: self.config.capacity,
            in_flight: None,
            last_error: None,
            stats: Stats::default(),
        };

        info!(%id, seed, depth, capacity = self.config.capacity, "dispatching crawl");
        let span = tracing::info_span!("crawl", %id);
        let task = tokio::spawn(
            engine
                .run(items_tx, closing_tx.clone(), closing_rx)
                .instrument(span),
        );

        Crawl {
            id,
            seed: seed.to_string(),
            depth,
            results: Mutex::new(Some(Results { rx: items_rx })),
            closing: closing_tx,
            task: tokio::sync::Mutex::new(TaskState::Running(task)),
        }
    }
}

/// Starts a crawl with the default configuration.
pub fn dispatch<F: Fetcher>(fetcher: F, seed: &str, depth: usize) -> Crawl {
    Dispatcher::new(fetcher).dispatch(seed, depth)
}

enum TaskState {
    Running(JoinHandle<Option<FetchError>>),
    Stopped(Option<FetchError>),
}

/// Handle to one running (or finished) crawl.
///
/// Dropping the handle does not stop the crawl: it keeps going until its
/// frontier is exhausted, as long as someone drains the results.
pub struct Crawl {
    id: Uuid,
    seed: String,
    depth: usize,
    results: Mutex<Option<Results>>,
    closing: mpsc::UnboundedSender<CloseRequest>,
    task: tokio::sync::Mutex<TaskState>,
}

impl Crawl {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// The depth the crawl was started with
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Takes the result stream. Only the first call gets it.
    pub fn results(&self) -> Option<Results> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// True once the coordinating task has exited
    pub fn is_finished(&self) -> bool {
        self.closing.is_closed()
    }

    /// Stops the crawl and waits until the coordinating task has exited.
    ///
    /// Returns the last fetch error the crawl gave up on, if any. Calling it
    /// again, or after the crawl finished on its own, returns the same value.
    pub async fn cancel(&self) -> Option<FetchError> {
        let (reply_tx, reply_rx) = oneshot::channel();

        // Sending fails once the loop is gone; the join below still applies
        let reply = match self.closing.send(reply_tx) {
            Ok(()) => reply_rx.await.ok(),
            Err(_) => None,
        };

        let outcome = self.join().await;
        reply.unwrap_or(outcome)
    }

    async fn join(&self) -> Option<FetchError> {
        let mut task = self.task.lock().await;
        let outcome = match &mut *task {
            TaskState::Stopped(outcome) => return outcome.clone(),
            TaskState::Running(handle) => handle.await.unwrap_or_else(|e| {
                warn!(id = %self.id, error = %e, "crawl task did not exit cleanly");
                None
            }),
        };
        *task = TaskState::Stopped(outcome.clone());
        outcome
    }
}

/// The crawl's output: items in the order their fetches completed.
///
/// Ends when the crawl finishes or is cancelled.
#[derive(Debug)]
pub struct Results {
    rx: mpsc::Receiver<Item>,
}

impl Results {
    pub async fn recv(&mut self) -> Option<Item> {
        self.rx.recv().await
    }
}

impl Stream for Results {
    type Item = Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Item>> {
        self.rx.poll_recv(cx)
    }
}

struct FetchOutcome {
    pending: Pending,
    result: Result<Item, FetchError>,
}

struct InFlight {
    url: String,
    task: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct Stats {
    fetched: usize,
    failed: usize,
    delivered: usize,
}

// State owned exclusively by the coordinating task
struct Engine<F> {
    fetcher: Arc<F>,
    retry: Arc<dyn RetryPolicy>,
    frontier: Frontier,
    queue: VecDeque<Item>,
    capacity: usize,
    in_flight: Option<InFlight>,
    last_error: Option<FetchError>,
    stats: Stats,
}

impl<F: Fetcher> Engine<F> {
    async fn run(
        mut self,
        items: mpsc::Sender<Item>,
        closing_tx: mpsc::UnboundedSender<CloseRequest>,
        mut closing_rx: mpsc::UnboundedReceiver<CloseRequest>,
    ) -> Option<FetchError> {
        let (done_tx, mut done_rx) = mpsc::channel::<FetchOutcome>(1);
        let mut self_close_sent = false;

        loop {
            let can_issue = self.in_flight.is_none()
                && self.frontier.has_pending()
                && self.queue.len() < self.capacity;
            let can_deliver = !self.queue.is_empty();

            if !self_close_sent
                && !can_issue
                && !can_deliver
                && self.in_flight.is_none()
                && !self.frontier.has_pending()
            {
                debug!("nothing left to do, requesting close");
                // Nobody waits for the reply to our own request
                let (reply, _) = oneshot::channel();
                let _ = closing_tx.send(reply);
                self_close_sent = true;
            }

            tokio::select! {
                request = closing_rx.recv() => {
                    if let Some(reply) = request {
                        let _ = reply.send(self.last_error.clone());
                    }
                    break;
                }

                _ = std::future::ready(()), if can_issue => {
                    self.issue(&done_tx);
                }

                Some(outcome) = done_rx.recv(), if self.in_flight.is_some() => {
                    self.complete(outcome);
                }

                permit = items.reserve(), if can_deliver => match permit {
                    Ok(permit) => {
                        if let Some(item) = self.queue.pop_front() {
                            permit.send(item);
                            self.stats.delivered += 1;
                        }
                    }
                    Err(_) => {
                        info!("result stream dropped, stopping crawl");
                        break;
                    }
                },
            }
        }

        self.shutdown();
        self.last_error
    }

    fn issue(&mut self, done: &mpsc::Sender<FetchOutcome>) {
        let Some(next) = self.frontier.next() else {
            return;
        };
        debug!(url = %next.url, level = next.level, "fetching");

        let fetcher = Arc::clone(&self.fetcher);
        let retry = Arc::clone(&self.retry);
        let done = done.clone();
        let url = next.url.clone();

        let task = tokio::spawn(
            async move {
                // A panicking fetcher fails this address instead of leaving
                // the slot occupied forever
                let result = AssertUnwindSafe(fetch_with_retry(
                    fetcher.as_ref(),
                    retry.as_ref(),
                    &next.url,
                ))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    Err(FetchError::Panicked {
                        url: next.url.clone(),
                        message: panic_message(panic.as_ref()),
                    })
                });
                // The loop may have exited meanwhile
                let _ = done
                    .send(FetchOutcome {
                        pending: next,
                        result,
                    })
                    .await;
            }
            .in_current_span(),
        );

        self.in_flight = Some(InFlight { url, task });
    }

    fn complete(&mut self, outcome: FetchOutcome) {
        self.in_flight = None;
        let FetchOutcome { pending, result } = outcome;

        match result {
            Ok(item) => {
                self.stats.fetched += 1;
                let queued = self.frontier.discover(&item.links, pending.level);
                debug!(
                    url = %pending.url,
                    links = item.links.len(),
                    queued,
                    "fetched"
                );
                self.queue.push_back(item);
            }
            Err(error) => {
                self.stats.failed += 1;
                warn!(url = %pending.url, %error, "fetch failed, dropping address");
                self.last_error = Some(error);
            }
        }
    }

    fn shutdown(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            debug!(url = %in_flight.url, "aborting in-flight fetch");
            in_flight.task.abort();
        }
        info!(
            fetched = self.stats.fetched,
            failed = self.stats.failed,
            delivered = self.stats.delivered,
            undelivered = self.queue.len(),
            unvisited = self.frontier.pending_len(),
            "crawl stopped"
        );
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "fetcher panicked".to_string()
    }
}

async fn fetch_with_retry<F: Fetcher>(
    fetcher: &F,
    retry: &dyn RetryPolicy,
    url: &str,
) -> Result<Item, FetchError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match fetcher.fetch(url).await {
            Ok(item) => return Ok(item),
            Err(error) => match retry.backoff(attempt, &error) {
                Some(delay) => {
                    debug!(url, attempt, ?delay, %error, "retrying fetch");
                    tokio::time::sleep(delay).await;
                }
                None => return Err(error),
            },
        }
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is tokio::select!?
//    - Waits on several futures at once and runs the branch of whichever
//      finishes first
//    - `, if condition` switches a branch off for this turn (like only
//      offering a fetch when nothing is in flight)
//    - When several are ready it picks one at random
//
// 2. Why does the loop send itself a close request instead of just breaking?
//    - External cancel() calls and the loop's own "I'm done" go through the
//      same channel, so both are handled in exactly one place
//    - An unbounded channel never blocks the sender, so the loop can't
//      deadlock on its own request
//
// 3. Why mpsc::Sender::reserve() before sending?
//    - reserve() waits until the consumer has room, WITHOUT taking the item
//      out of our queue yet
//    - If another branch wins the select, the item simply stays queued
//
// 4. What does abort() on a JoinHandle do?
//    - Cancels the spawned task at its next .await
//    - We use it so a fetch that never returns can't outlive its crawl
// -----------------------------------------------------------------------------
