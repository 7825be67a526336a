//! Typed signaling events and the broadcast event surface.
//!
//! Every inbound protocol message is translated into one or more
//! [`SignalingEvent`]s by the dispatcher; consumers never see raw headers.
//! The emitter is a thin typed layer over a tokio broadcast channel, so any
//! number of subscribers can observe the event flow independently.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{trace, warn};

use crate::headers::{License, MainCamCommand};

/// Events published by the protocol dispatcher.
///
/// Each variant is produced by exactly one dispatch branch; unknown inbound
/// content is logged and dropped rather than surfaced here.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalingEvent {
    /// The server confirmed room entry.
    EnterRoom {
        /// Room identifier, when announced.
        room: Option<String>,
        /// Local participant display name, when announced.
        participant_name: Option<String>,
    },
    /// Channel lists announced alongside room entry (both present).
    Channels {
        /// Input channel list.
        input_channels: String,
        /// Output channel list.
        output_channels: String,
    },
    /// Channel lists delivered through the NOTIFY envelope.
    ChannelsNotify {
        /// Input channel list, when present in the envelope.
        input_channels: Option<String>,
        /// Output channel list, when present in the envelope.
        output_channels: Option<String>,
    },
    /// A webcast started for a conference.
    WebcastStarted {
        /// Conference identifier.
        conference: String,
        /// Webcast type, when announced.
        kind: Option<String>,
    },
    /// A webcast stopped for a conference.
    WebcastStopped {
        /// Conference identifier.
        conference: String,
        /// Webcast type, when announced.
        kind: Option<String>,
    },
    /// The local account was added to the moderator list.
    ModeratorsAdded {
        /// Conference identifier.
        conference: String,
    },
    /// The local account was removed from the moderator list.
    ModeratorsRemoved {
        /// Conference identifier.
        conference: String,
    },
    /// A participation request was accepted.
    ParticipationAccepted {
        /// Conference identifier.
        conference: String,
    },
    /// A participation request was rejected.
    ParticipationCancelled {
        /// Conference identifier.
        conference: String,
    },
    /// This participant was moved into the webcast stream.
    MovedToWebcast {
        /// Conference identifier.
        conference: String,
    },
    /// This participant was moved to the spectator set.
    MoveToSpectators {
        /// Whether the move carries no dedicated audio stream.
        is_synthetic: bool,
        /// Audio stream identity, when one accompanies the move.
        audio_id: Option<String>,
    },
    /// Spectator move without an accompanying audio identity.
    MoveToSpectatorsSynthetic,
    /// Spectator move with an accompanying audio identity.
    MoveToSpectatorsWithAudioId {
        /// Audio stream identity.
        audio_id: String,
    },
    /// This participant was moved back to the participant set.
    MoveToParticipants,
    /// The server-side account changed.
    AccountChanged,
    /// The server-side account was deleted.
    AccountDeleted,
    /// A conference participant token was issued.
    ConferenceTokenIssued {
        /// Conference identifier.
        conference: String,
        /// Participant identifier.
        participant: String,
        /// Issued token.
        jwt: String,
    },
    /// Moderator started the local camera.
    AdminStartMainCam {
        /// Whether an immediate media-state resync is demanded.
        is_sync_forced: bool,
    },
    /// Moderator stopped the local camera.
    AdminStopMainCam {
        /// Whether an immediate media-state resync is demanded.
        is_sync_forced: bool,
    },
    /// Moderator started the local mic.
    AdminStartMic {
        /// Whether an immediate media-state resync is demanded.
        is_sync_forced: bool,
    },
    /// Moderator stopped the local mic.
    AdminStopMic {
        /// Whether an immediate media-state resync is demanded.
        is_sync_forced: bool,
    },
    /// The server demands an immediate media-state resync.
    AdminForceSyncMediaState {
        /// Whether the resync flag was set.
        is_sync_forced: bool,
    },
    /// Generic main-cam control directive; drives the bandwidth balancer.
    MainCamControl {
        /// Decoded command, `None` when the header matched no member.
        main_cam: Option<MainCamCommand>,
        /// Raw resolution cap string, when announced.
        resolution_main_cam: Option<String>,
    },
    /// License profile in effect for this participant.
    UseLicense(License),
    /// A second remote stream with shared content is available.
    ShareContentAvailable,
    /// The shared content stream ended.
    ShareContentEnded,
    /// The local presentation must stop.
    MustStopShare,
}

/// Discriminant of a [`SignalingEvent`], for filtering and waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum EventKind {
    EnterRoom,
    Channels,
    ChannelsNotify,
    WebcastStarted,
    WebcastStopped,
    ModeratorsAdded,
    ModeratorsRemoved,
    ParticipationAccepted,
    ParticipationCancelled,
    MovedToWebcast,
    MoveToSpectators,
    MoveToSpectatorsSynthetic,
    MoveToSpectatorsWithAudioId,
    MoveToParticipants,
    AccountChanged,
    AccountDeleted,
    ConferenceTokenIssued,
    AdminStartMainCam,
    AdminStopMainCam,
    AdminStartMic,
    AdminStopMic,
    AdminForceSyncMediaState,
    MainCamControl,
    UseLicense,
    ShareContentAvailable,
    ShareContentEnded,
    MustStopShare,
}

impl SignalingEvent {
    /// Discriminant of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            SignalingEvent::EnterRoom { .. } => EventKind::EnterRoom,
            SignalingEvent::Channels { .. } => EventKind::Channels,
            SignalingEvent::ChannelsNotify { .. } => EventKind::ChannelsNotify,
            SignalingEvent::WebcastStarted { .. } => EventKind::WebcastStarted,
            SignalingEvent::WebcastStopped { .. } => EventKind::WebcastStopped,
            SignalingEvent::ModeratorsAdded { .. } => EventKind::ModeratorsAdded,
            SignalingEvent::ModeratorsRemoved { .. } => EventKind::ModeratorsRemoved,
            SignalingEvent::ParticipationAccepted { .. } => EventKind::ParticipationAccepted,
            SignalingEvent::ParticipationCancelled { .. } => EventKind::ParticipationCancelled,
            SignalingEvent::MovedToWebcast { .. } => EventKind::MovedToWebcast,
            SignalingEvent::MoveToSpectators { .. } => EventKind::MoveToSpectators,
            SignalingEvent::MoveToSpectatorsSynthetic => EventKind::MoveToSpectatorsSynthetic,
            SignalingEvent::MoveToSpectatorsWithAudioId { .. } => {
                EventKind::MoveToSpectatorsWithAudioId
            }
            SignalingEvent::MoveToParticipants => EventKind::MoveToParticipants,
            SignalingEvent::AccountChanged => EventKind::AccountChanged,
            SignalingEvent::AccountDeleted => EventKind::AccountDeleted,
            SignalingEvent::ConferenceTokenIssued { .. } => EventKind::ConferenceTokenIssued,
            SignalingEvent::AdminStartMainCam { .. } => EventKind::AdminStartMainCam,
            SignalingEvent::AdminStopMainCam { .. } => EventKind::AdminStopMainCam,
            SignalingEvent::AdminStartMic { .. } => EventKind::AdminStartMic,
            SignalingEvent::AdminStopMic { .. } => EventKind::AdminStopMic,
            SignalingEvent::AdminForceSyncMediaState { .. } => EventKind::AdminForceSyncMediaState,
            SignalingEvent::MainCamControl { .. } => EventKind::MainCamControl,
            SignalingEvent::UseLicense(_) => EventKind::UseLicense,
            SignalingEvent::ShareContentAvailable => EventKind::ShareContentAvailable,
            SignalingEvent::ShareContentEnded => EventKind::ShareContentEnded,
            SignalingEvent::MustStopShare => EventKind::MustStopShare,
        }
    }
}

/// Event stream type
pub type EventStream = BroadcastStream<SignalingEvent>;

/// Handle to a registered event handler.
///
/// Dropping the guard (or calling [`SubscriptionGuard::off`]) detaches the
/// handler; the task it aborts is the only resource it owns.
#[derive(Debug)]
pub struct SubscriptionGuard {
    handle: JoinHandle<()>,
}

impl SubscriptionGuard {
    /// Detach the handler.
    pub fn off(self) {
        self.handle.abort();
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Typed event emitter for the signaling layer.
#[derive(Clone)]
pub struct EventEmitter {
    sender: broadcast::Sender<SignalingEvent>,
}

impl EventEmitter {
    /// Create a new event emitter with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event.
    pub fn emit(&self, event: SignalingEvent) {
        trace!(kind = ?event.kind(), "emitting signaling event");
        // Ignore send errors (no receivers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to events as a stream.
    pub fn subscribe(&self) -> EventStream {
        BroadcastStream::new(self.sender.subscribe())
    }

    /// Subscribe to events as a raw broadcast receiver.
    ///
    /// Dispatch is synchronous, so a receiver obtained before dispatching
    /// can drain the resulting events with `try_recv`.
    pub fn subscribe_receiver(&self) -> broadcast::Receiver<SignalingEvent> {
        self.sender.subscribe()
    }

    /// Register a handler for every event.
    ///
    /// The handler runs on a dedicated task until the guard is dropped.
    pub fn on<F>(&self, handler: F) -> SubscriptionGuard
    where
        F: Fn(SignalingEvent) + Send + Sync + 'static,
    {
        let mut receiver = self.sender.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => handler(event),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "event handler lagged behind the emitter");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        SubscriptionGuard { handle }
    }

    /// Register a handler for one event kind.
    pub fn on_kind<F>(&self, kind: EventKind, handler: F) -> SubscriptionGuard
    where
        F: Fn(SignalingEvent) + Send + Sync + 'static,
    {
        self.on(move |event| {
            if event.kind() == kind {
                handler(event);
            }
        })
    }

    /// Wait for the next event of the given kind.
    ///
    /// Subscribes at call time; events emitted earlier are not observed.
    /// Returns `None` when the emitter is dropped.
    pub async fn wait(&self, kind: EventKind) -> Option<SignalingEvent> {
        self.wait_any(&[kind]).await
    }

    /// Wait for the next event matching any of the given kinds.
    pub async fn wait_any(&self, kinds: &[EventKind]) -> Option<SignalingEvent> {
        let mut receiver = self.sender.subscribe();
        loop {
            match receiver.recv().await {
                Ok(event) if kinds.contains(&event.kind()) => return Some(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "event waiter lagged behind the emitter");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Get the number of active receivers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(256)
    }
}
