//! Debounced search suggestions for a single search box.
//!
//! Each connected search box gets its own actor. Keystrokes re-arm a quiet
//! timer; when it expires the latest query is searched once. Every keystroke
//! or clear bumps a generation counter, and a search result is applied only
//! when its generation is still current, so a slow response for an older
//! query can never replace the list for a newer one.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use crate::models::{MovieSuggestion, SuggestionUpdate};
use crate::tmdb::MetadataApi;

pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(300);
pub const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Clone, Copy)]
pub struct DebounceConfig {
    pub delay: Duration,
    pub min_chars: usize,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay: DEBOUNCE_DELAY,
            min_chars: MIN_QUERY_CHARS,
        }
    }
}

#[derive(Debug)]
enum Command {
    Input(String),
    Clear,
}

struct SearchDone {
    generation: u64,
    query: String,
    suggestions: Vec<MovieSuggestion>,
}

/// Sending side of a debouncer. Dropping every clone stops the actor and
/// aborts any search still in flight.
#[derive(Clone)]
pub struct DebounceHandle {
    sender: mpsc::UnboundedSender<Command>,
}

impl DebounceHandle {
    /// Records the current value of the search box. Returns `false` once the
    /// actor has stopped.
    pub fn input(&self, query: impl Into<String>) -> bool {
        self.sender.send(Command::Input(query.into())).is_ok()
    }

    /// Drops the pending query, cancels the in-flight search and publishes an
    /// empty list.
    pub fn clear(&self) -> bool {
        self.sender.send(Command::Clear).is_ok()
    }
}

pub struct SuggestionDebouncer;

impl SuggestionDebouncer {
    pub fn spawn(
        metadata: Arc<dyn MetadataApi>,
        config: DebounceConfig,
    ) -> (DebounceHandle, mpsc::UnboundedReceiver<SuggestionUpdate>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let runner = Runner {
            metadata,
            config,
            updates: update_tx,
            done_tx,
            pending: None,
            generation: 0,
            in_flight: None,
        };
        tokio::spawn(runner.run(cmd_rx, done_rx));
        (DebounceHandle { sender: cmd_tx }, update_rx)
    }
}

struct Runner {
    metadata: Arc<dyn MetadataApi>,
    config: DebounceConfig,
    updates: mpsc::UnboundedSender<SuggestionUpdate>,
    done_tx: mpsc::UnboundedSender<SearchDone>,
    pending: Option<(String, Instant)>,
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
}

impl Runner {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut done_rx: mpsc::UnboundedReceiver<SearchDone>,
    ) {
        loop {
            let deadline = self.pending.as_ref().map(|(_, at)| *at);
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(Command::Input(query)) => self.on_input(query),
                    Some(Command::Clear) => {
                        if !self.on_clear() {
                            break;
                        }
                    }
                    None => break,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if !self.fire() {
                        break;
                    }
                }
                Some(done) = done_rx.recv() => {
                    if !self.on_search_done(done) {
                        break;
                    }
                }
            }
        }
        self.cancel_in_flight();
        debug!("Suggestion debouncer stopped");
    }

    fn on_input(&mut self, query: String) {
        self.generation += 1;
        self.cancel_in_flight();
        self.pending = Some((query, Instant::now() + self.config.delay));
    }

    fn on_clear(&mut self) -> bool {
        self.generation += 1;
        self.cancel_in_flight();
        self.pending = None;
        self.publish(String::new(), Vec::new())
    }

    fn fire(&mut self) -> bool {
        let Some((query, _)) = self.pending.take() else {
            return true;
        };
        if query.chars().count() < self.config.min_chars {
            return self.publish(query, Vec::new());
        }

        debug!("Searching suggestions for '{}' (generation {})", query, self.generation);
        let metadata = self.metadata.clone();
        let done_tx = self.done_tx.clone();
        let generation = self.generation;
        self.in_flight = Some(tokio::spawn(async move {
            let suggestions = metadata.search_movies(&query).await;
            let _ = done_tx.send(SearchDone {
                generation,
                query,
                suggestions,
            });
        }));
        true
    }

    fn on_search_done(&mut self, done: SearchDone) -> bool {
        if done.generation != self.generation {
            debug!(
                "Discarding stale suggestions for '{}' (generation {} < {})",
                done.query, done.generation, self.generation
            );
            return true;
        }
        self.in_flight = None;
        self.publish(done.query, done.suggestions)
    }

    /// Returns `false` when nobody is listening any more.
    fn publish(&self, query: String, suggestions: Vec<MovieSuggestion>) -> bool {
        self.updates
            .send(SuggestionUpdate {
                seq: self.generation,
                query,
                suggestions,
            })
            .is_ok()
    }

    fn cancel_in_flight(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}
