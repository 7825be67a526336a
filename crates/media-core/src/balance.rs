//! The reactive balance controller.
//!
//! Subscribes to the dispatcher's main-cam control event, stashes the
//! latest directive, and funnels every directive through the single-worker
//! task queue as one balance task: plan a fresh encoding target, then apply
//! it to the sender with a minimal mutation. Directives are processed in
//! arrival order and never interleave; a failed task is logged and
//! superseded by the next directive, never retried.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use wscall_signaling_core::events::{EventEmitter, SignalingEvent};

use crate::applier::{apply, TargetParameters};
use crate::bandwidth::BandwidthTable;
use crate::error::{MediaError, MediaResult};
use crate::planner::{plan_target, MainCamDirective};
use crate::ports::ConnectionPort;
use crate::queue::{QueuedTask, TaskQueue, DEFAULT_QUEUE_CAPACITY};

/// Controller configuration.
#[derive(Debug, Clone)]
pub struct BalanceOptions {
    /// Directives are ignored while the negotiated codec contains this
    /// substring, case-insensitively.
    pub ignore_codec_substring: Option<String>,
    /// Intake capacity of the balance queue.
    pub queue_capacity: usize,
}

impl Default for BalanceOptions {
    fn default() -> Self {
        Self {
            ignore_codec_substring: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Why a balance task did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The connection has no outgoing video sender.
    NoVideoSender,
    /// The video sender has no attached track.
    NoVideoTrack,
    /// The negotiated codec matches the configured ignore substring.
    IgnoredCodec,
}

/// Result of one balance pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceOutcome {
    /// The pipeline ran; `is_changed` tells whether the sender was written.
    Applied {
        /// Whether the sender was actually written to.
        is_changed: bool,
    },
    /// The pass short-circuited without touching the sender.
    Skipped(SkipReason),
}

/// Run one balance pass against a connection.
///
/// Skips without error when there is nothing to drive; a rejected sender
/// write propagates out.
pub async fn run_balance(
    connection: &dyn ConnectionPort,
    table: &BandwidthTable,
    options: &BalanceOptions,
    directive: &MainCamDirective,
) -> MediaResult<BalanceOutcome> {
    let Some(sender) = connection.video_sender() else {
        debug!("balance skipped, no video sender");
        return Ok(BalanceOutcome::Skipped(SkipReason::NoVideoSender));
    };
    let Some(track) = sender.track() else {
        debug!("balance skipped, sender has no track");
        return Ok(BalanceOutcome::Skipped(SkipReason::NoVideoTrack));
    };
    let codec = connection.video_codec();
    if let Some(fragment) = options.ignore_codec_substring.as_deref() {
        if !fragment.is_empty() && codec.to_lowercase().contains(&fragment.to_lowercase()) {
            debug!(%codec, "balance skipped, codec is ignored");
            return Ok(BalanceOutcome::Skipped(SkipReason::IgnoredCodec));
        }
    }

    let target = plan_target(directive, &track.settings(), &codec, table);
    let applied = apply(sender.as_ref(), &TargetParameters::from(target)).await?;
    Ok(BalanceOutcome::Applied {
        is_changed: applied.is_changed,
    })
}

struct ControllerState {
    connection: RwLock<Option<Arc<dyn ConnectionPort>>>,
    last_directive: Mutex<Option<MainCamDirective>>,
    table: BandwidthTable,
    options: BalanceOptions,
}

/// Serializes bandwidth balancing against the outgoing video sender.
pub struct BalanceController {
    state: Arc<ControllerState>,
    queue: Mutex<Option<TaskQueue>>,
    subscription: Mutex<Option<JoinHandle<()>>>,
}

impl BalanceController {
    /// Create a controller over the given bandwidth table.
    pub fn new(table: BandwidthTable, options: BalanceOptions) -> Self {
        Self {
            state: Arc::new(ControllerState {
                connection: RwLock::new(None),
                last_directive: Mutex::new(None),
                table,
                options,
            }),
            queue: Mutex::new(None),
            subscription: Mutex::new(None),
        }
    }

    /// Attach the established media connection.
    pub fn set_connection(&self, connection: Arc<dyn ConnectionPort>) {
        *self.state.connection.write() = Some(connection);
    }

    /// Detach the media connection.
    pub fn clear_connection(&self) {
        *self.state.connection.write() = None;
    }

    /// The most recent directive, if any arrived since the last
    /// [`BalanceController::unsubscribe`].
    pub fn last_directive(&self) -> Option<MainCamDirective> {
        self.state.last_directive.lock().clone()
    }

    /// Start reacting to main-cam control events from the given surface.
    ///
    /// Each directive is stashed and enqueued in arrival order. A second
    /// call replaces the previous registration.
    pub fn subscribe(&self, events: &EventEmitter) {
        let handle = {
            let mut queue_slot = self.queue.lock();
            queue_slot
                .get_or_insert_with(|| TaskQueue::with_capacity(self.state.options.queue_capacity))
                .handle()
        };
        let mut receiver = events.subscribe_receiver();
        let state = self.state.clone();
        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(SignalingEvent::MainCamControl {
                        main_cam,
                        resolution_main_cam,
                    }) => {
                        let directive = MainCamDirective {
                            main_cam,
                            resolution_main_cam,
                        };
                        *state.last_directive.lock() = Some(directive.clone());
                        let task = balance_task(state.clone(), directive);
                        if handle.run(task).await.is_err() {
                            debug!("balance queue closed, detaching directive handler");
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "directive handler lagged behind the emitter");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        if let Some(previous) = self.subscription.lock().replace(task) {
            previous.abort();
        }
    }

    /// Stop reacting to directives.
    ///
    /// Detaches the handler, stops queue intake, and clears the stashed
    /// directive. Tasks already accepted still drain; an executing task is
    /// never cancelled.
    pub fn unsubscribe(&self) {
        if let Some(task) = self.subscription.lock().take() {
            task.abort();
        }
        if let Some(queue) = self.queue.lock().take() {
            queue.close();
        }
        *self.state.last_directive.lock() = None;
    }

    /// Re-run balancing with the stashed directive.
    ///
    /// Fails fast when no connection is attached; this is the one fatal,
    /// non-queued case. The task itself is queued like any other.
    pub fn balance(&self) -> MediaResult<()> {
        if self.state.connection.read().is_none() {
            return Err(MediaError::NoConnection);
        }
        let directive = self
            .state
            .last_directive
            .lock()
            .clone()
            .unwrap_or_default();
        let mut queue_slot = self.queue.lock();
        let queue = queue_slot
            .get_or_insert_with(|| TaskQueue::with_capacity(self.state.options.queue_capacity));
        queue.try_run(balance_task(self.state.clone(), directive))
    }
}

impl Drop for BalanceController {
    fn drop(&mut self) {
        if let Some(task) = self.subscription.lock().take() {
            task.abort();
        }
    }
}

fn balance_task(state: Arc<ControllerState>, directive: MainCamDirective) -> QueuedTask {
    Box::pin(async move {
        let connection = state.connection.read().clone();
        let Some(connection) = connection else {
            return Err(MediaError::NoConnection);
        };
        let outcome =
            run_balance(connection.as_ref(), &state.table, &state.options, &directive).await?;
        debug!(?outcome, "balance task completed");
        Ok(())
    })
}
