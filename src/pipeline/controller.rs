//! Bounded worker pool over an ordered chunk list
//!
//! `run_all` spawns up to `concurrency` tokio tasks that pull chunks from a
//! shared queue, run the worker on each, and send `(position, value)` back
//! over a channel. The caller's task collects results into one slot per
//! chunk, so output order never depends on completion order.

use crate::data::Chunk;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub concurrency: usize,
    /// Pause after each chunk while more chunks are queued
    pub pacing: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            concurrency: 2,
            pacing: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkSlot<T> {
    Done(T),
    /// The run was cancelled before this chunk's result was collected
    Cancelled,
    /// The worker task handling this chunk panicked
    Lost,
}

impl<T> ChunkSlot<T> {
    pub fn done(&self) -> Option<&T> {
        match self {
            ChunkSlot::Done(value) => Some(value),
            ChunkSlot::Cancelled | ChunkSlot::Lost => None,
        }
    }
}

#[derive(Debug)]
pub struct RunOutcome<T> {
    /// One slot per input chunk, in chunk order
    pub slots: Vec<ChunkSlot<T>>,
    pub cancelled: bool,
}

impl<T> RunOutcome<T> {
    pub fn completed(&self) -> usize {
        self.slots.iter().filter(|s| s.done().is_some()).count()
    }

    /// All values in chunk order, or `None` if any slot is missing
    pub fn into_values(self) -> Option<Vec<T>> {
        self.slots
            .into_iter()
            .map(|slot| match slot {
                ChunkSlot::Done(value) => Some(value),
                ChunkSlot::Cancelled | ChunkSlot::Lost => None,
            })
            .collect()
    }
}

/// Run `worker` over every chunk with at most `options.concurrency` in flight
///
/// `on_progress` is called from the caller's task after every collected
/// result. Once `cancel` fires no new chunk is started, in-flight work is
/// dropped, and the function returns with unfinished slots `Cancelled`.
/// A panicking worker is logged and its chunk left `Lost`; the remaining
/// workers keep draining the queue.
pub async fn run_all<T, W, Fut, P>(
    chunks: Vec<Chunk>,
    options: RunOptions,
    worker: W,
    mut on_progress: P,
    cancel: &CancellationToken,
) -> RunOutcome<T>
where
    T: Send + 'static,
    W: Fn(Chunk) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = T> + Send + 'static,
    P: FnMut(Progress) + Send,
{
    let total = chunks.len();
    let mut slots: Vec<Option<T>> = (0..total).map(|_| None).collect();
    if total == 0 {
        return RunOutcome {
            slots: Vec::new(),
            cancelled: cancel.is_cancelled(),
        };
    }

    let worker_count = options.concurrency.clamp(1, total);
    debug!(chunks = total, workers = worker_count, "Starting worker pool");

    let queue: Arc<Mutex<VecDeque<(usize, Chunk)>>> =
        Arc::new(Mutex::new(chunks.into_iter().enumerate().collect()));
    let worker = Arc::new(worker);
    let (tx, mut rx) = mpsc::unbounded_channel::<(usize, T)>();

    let mut workers = JoinSet::new();
    for _ in 0..worker_count {
        let queue = Arc::clone(&queue);
        let worker = Arc::clone(&worker);
        let tx = tx.clone();
        let cancel = cancel.clone();
        let pacing = options.pacing;

        workers.spawn(async move {
            loop {
                if cancel.is_cancelled() {
                    break;
                }
                let next = queue.lock().await.pop_front();
                let Some((position, chunk)) = next else {
                    break;
                };

                let value = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    value = (*worker)(chunk) => value,
                };
                if tx.send((position, value)).is_err() {
                    break;
                }

                if !pacing.is_zero() && !queue.lock().await.is_empty() {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(pacing) => {}
                    }
                }
            }
        });
    }
    drop(tx);

    let mut completed = 0;
    let mut cancelled = false;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                cancelled = true;
                break;
            }
            message = rx.recv() => match message {
                Some((position, value)) => {
                    slots[position] = Some(value);
                    completed += 1;
                    on_progress(Progress { completed, total });
                }
                None => break,
            },
        }
    }

    if cancelled {
        debug!(completed, total, "Worker pool cancelled");
        workers.abort_all();
    } else {
        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                error!(completed, total, "Translation worker failed: {}", err);
            }
        }
    }

    RunOutcome {
        slots: slots
            .into_iter()
            .map(|slot| match slot {
                Some(value) => ChunkSlot::Done(value),
                None if cancelled => ChunkSlot::Cancelled,
                None => ChunkSlot::Lost,
            })
            .collect(),
        cancelled,
    }
}
