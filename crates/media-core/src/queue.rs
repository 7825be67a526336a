//! Serialized task execution.
//!
//! A bounded FIFO channel feeding exactly one consumer task. Every accepted
//! task eventually runs, in submission order, and at most one runs at a
//! time; this is what keeps concurrent sender mutations from racing each
//! other on a stale transaction id. Task failures are logged and never stop
//! the worker.

use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Default intake capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 128;

/// A queued unit of work.
pub type QueuedTask = BoxFuture<'static, MediaResult<()>>;

/// Bounded FIFO task queue with a single worker.
#[derive(Debug)]
pub struct TaskQueue {
    task_tx: mpsc::Sender<QueuedTask>,
}

/// Cloneable submission handle onto a [`TaskQueue`].
///
/// The worker keeps draining as long as any handle (or the queue itself)
/// is alive.
#[derive(Debug, Clone)]
pub struct QueueHandle {
    task_tx: mpsc::Sender<QueuedTask>,
}

impl TaskQueue {
    /// Start a queue with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Start a queue with the given intake capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (task_tx, mut task_rx) = mpsc::channel::<QueuedTask>(capacity);
        tokio::spawn(async move {
            while let Some(task) = task_rx.recv().await {
                if let Err(error) = task.await {
                    warn!(%error, "queued task failed");
                }
            }
            debug!("task queue drained, worker exiting");
        });
        Self { task_tx }
    }

    /// A submission handle for detached producers.
    pub fn handle(&self) -> QueueHandle {
        QueueHandle {
            task_tx: self.task_tx.clone(),
        }
    }

    /// Submit a task, waiting for intake capacity.
    pub async fn run(&self, task: QueuedTask) -> MediaResult<()> {
        submit(&self.task_tx, task).await
    }

    /// Submit a task without waiting.
    pub fn try_run(&self, task: QueuedTask) -> MediaResult<()> {
        try_submit(&self.task_tx, task)
    }

    /// Stop intake. Tasks already accepted still run to completion; the
    /// one executing is never cancelled.
    pub fn close(self) {
        drop(self.task_tx);
    }
}

impl QueueHandle {
    /// Submit a task, waiting for intake capacity.
    pub async fn run(&self, task: QueuedTask) -> MediaResult<()> {
        submit(&self.task_tx, task).await
    }

    /// Submit a task without waiting.
    pub fn try_run(&self, task: QueuedTask) -> MediaResult<()> {
        try_submit(&self.task_tx, task)
    }
}

async fn submit(task_tx: &mpsc::Sender<QueuedTask>, task: QueuedTask) -> MediaResult<()> {
    task_tx.send(task).await.map_err(|_| MediaError::QueueClosed)
}

fn try_submit(task_tx: &mpsc::Sender<QueuedTask>, task: QueuedTask) -> MediaResult<()> {
    task_tx.try_send(task).map_err(|error| match error {
        TrySendError::Full(_) => MediaError::QueueFull,
        TrySendError::Closed(_) => MediaError::QueueClosed,
    })
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
