//! Protocol event dispatcher.
//!
//! Bridges the raw SIP layer to the typed event surface. Two inbound
//! channels exist: out-of-dialog SIP events carrying a NOTIFY envelope, and
//! in-dialog INFO messages dispatched on their declared content-type.
//! Dispatch is synchronous and ordered per inbound message; anything the
//! closed switches do not recognize is logged and dropped.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::events::{EventEmitter, SignalingEvent};
use crate::headers::{
    self, ContentKind, HeaderField, MainCamCommand, MediaSyncFlag, MicCommand, ParticipantState,
};
use crate::notify::{parse_notify, NotifyCommand};

/// Side of the dialog that produced an INFO message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Originator {
    /// Sent by this client; never dispatched.
    Local,
    /// Sent by the far end.
    Remote,
}

/// Raw header access on an inbound SIP message.
///
/// Implemented by the host SIP stack; this crate never parses SIP syntax
/// itself.
pub trait HeaderAccess {
    /// Raw value of the named header, if present.
    fn header(&self, name: &str) -> Option<&str>;
}

/// One inbound message from the session layer.
#[derive(Debug)]
pub enum SessionEvent<R> {
    /// An out-of-dialog SIP event.
    OutOfDialog {
        /// The inbound request.
        request: R,
    },
    /// An in-dialog INFO message.
    Info {
        /// Which side of the dialog sent it.
        originator: Originator,
        /// The inbound request.
        request: R,
    },
}

/// Source of inbound session events.
///
/// The host session layer implements this to feed the dispatch pump; see
/// [`EventDispatcher::run`].
#[async_trait]
pub trait SessionSource: Send {
    /// Request type giving raw header access.
    type Request: HeaderAccess + Send;

    /// Next inbound event, or `None` when the session is over.
    async fn next_event(&mut self) -> Option<SessionEvent<Self::Request>>;
}

/// Decodes inbound messages and publishes typed [`SignalingEvent`]s.
#[derive(Clone)]
pub struct EventDispatcher {
    emitter: EventEmitter,
}

impl EventDispatcher {
    /// Create a dispatcher with a default-capacity emitter.
    pub fn new() -> Self {
        Self::with_emitter(EventEmitter::default())
    }

    /// Create a dispatcher publishing through the given emitter.
    pub fn with_emitter(emitter: EventEmitter) -> Self {
        Self { emitter }
    }

    /// The event surface this dispatcher publishes to.
    pub fn events(&self) -> EventEmitter {
        self.emitter.clone()
    }

    /// Drain a session source until it closes.
    ///
    /// Dispatch itself stays synchronous; this pump only awaits the source.
    pub async fn run<S: SessionSource>(&self, mut source: S) {
        while let Some(event) = source.next_event().await {
            match event {
                SessionEvent::OutOfDialog { request } => self.dispatch_sip_event(&request),
                SessionEvent::Info {
                    originator,
                    request,
                } => self.dispatch_info(originator, &request),
            }
        }
        debug!("session source closed, dispatch pump exiting");
    }

    /// Dispatch an out-of-dialog SIP event.
    ///
    /// Reads the NOTIFY header; an absent header produces nothing.
    pub fn dispatch_sip_event(&self, request: &dyn HeaderAccess) {
        // The envelope is JSON; it is parsed from the raw header value, not
        // the lower-casing codec, so `cmd` literals keep their casing.
        if let Some(payload) = request.header(HeaderField::Notify.name()) {
            self.dispatch_notify_payload(payload);
        }
    }

    /// Dispatch an in-dialog INFO message.
    ///
    /// Locally-originated messages are ignored entirely; remote ones are
    /// routed by their decoded content-type.
    pub fn dispatch_info(&self, originator: Originator, request: &dyn HeaderAccess) {
        if originator == Originator::Local {
            return;
        }
        let raw_kind = request.header(HeaderField::ContentType.name());
        let Some(kind) = headers::decode_content_kind(raw_kind) else {
            debug!(content_type = ?raw_kind, "dropping info with unknown content-type");
            return;
        };
        match kind {
            ContentKind::EnterRoom => self.handle_enter_room(request),
            ContentKind::Notify => self.dispatch_sip_event(request),
            ContentKind::MainCam => self.handle_main_cam(request),
            ContentKind::Mic => self.handle_mic(request),
            ContentKind::UseLicense => self.handle_use_license(request),
            ContentKind::ParticipantState => self.handle_participant_state(request),
            ContentKind::ShareState => self.handle_share_state(request),
        }
    }

    fn dispatch_notify_payload(&self, payload: &str) {
        let Some(command) = parse_notify(payload) else {
            return;
        };
        let event = match command {
            NotifyCommand::Channels {
                input_channels,
                output_channels,
            } => SignalingEvent::ChannelsNotify {
                input_channels,
                output_channels,
            },
            NotifyCommand::WebcastStarted { conference, kind } => {
                SignalingEvent::WebcastStarted { conference, kind }
            }
            NotifyCommand::WebcastStopped { conference, kind } => {
                SignalingEvent::WebcastStopped { conference, kind }
            }
            NotifyCommand::AddedToListModerators { conference } => {
                SignalingEvent::ModeratorsAdded { conference }
            }
            NotifyCommand::RemovedFromListModerators { conference } => {
                SignalingEvent::ModeratorsRemoved { conference }
            }
            NotifyCommand::ParticipationRequestAccepted { conference } => {
                SignalingEvent::ParticipationAccepted { conference }
            }
            NotifyCommand::ParticipationRequestRejected { conference } => {
                SignalingEvent::ParticipationCancelled { conference }
            }
            NotifyCommand::ParticipantMovedToWebcast { conference } => {
                SignalingEvent::MovedToWebcast { conference }
            }
            NotifyCommand::AccountChanged => SignalingEvent::AccountChanged,
            NotifyCommand::AccountDeleted => SignalingEvent::AccountDeleted,
            NotifyCommand::ConferenceParticipantTokenIssued {
                conference,
                participant,
                jwt,
            } => SignalingEvent::ConferenceTokenIssued {
                conference,
                participant,
                jwt,
            },
        };
        self.emitter.emit(event);
    }

    fn handle_enter_room(&self, request: &dyn HeaderAccess) {
        let room = self.text_header(request, HeaderField::Room);
        let participant_name = self.text_header(request, HeaderField::ParticipantName);
        self.emitter.emit(SignalingEvent::EnterRoom {
            room,
            participant_name,
        });

        // Channels ride along only when both lists are announced.
        let input_channels = self.text_header(request, HeaderField::InputChannels);
        let output_channels = self.text_header(request, HeaderField::OutputChannels);
        if let (Some(input_channels), Some(output_channels)) = (input_channels, output_channels) {
            self.emitter.emit(SignalingEvent::Channels {
                input_channels,
                output_channels,
            });
        }
    }

    fn handle_main_cam(&self, request: &dyn HeaderAccess) {
        let command =
            headers::decode_main_cam_command(request.header(HeaderField::MainCam.name()));
        let sync_header_present = request.header(HeaderField::MediaSync.name()).is_some();
        let is_sync_forced = self.is_sync_forced(request);

        match command {
            Some(MainCamCommand::AdminStart) => {
                self.emitter
                    .emit(SignalingEvent::AdminStartMainCam { is_sync_forced });
                return;
            }
            Some(MainCamCommand::AdminStop) => {
                self.emitter
                    .emit(SignalingEvent::AdminStopMainCam { is_sync_forced });
                return;
            }
            Some(MainCamCommand::Resume | MainCamCommand::Pause) if sync_header_present => {
                self.emitter
                    .emit(SignalingEvent::AdminForceSyncMediaState { is_sync_forced });
            }
            _ => {}
        }

        let resolution_main_cam = self.text_header(request, HeaderField::MainCamResolution);
        self.emitter.emit(SignalingEvent::MainCamControl {
            main_cam: command,
            resolution_main_cam,
        });
    }

    fn handle_mic(&self, request: &dyn HeaderAccess) {
        let is_sync_forced = self.is_sync_forced(request);
        // No generic fallback here; only the two admin commands dispatch.
        match headers::decode_mic_command(request.header(HeaderField::Mic.name())) {
            Some(MicCommand::AdminStart) => self
                .emitter
                .emit(SignalingEvent::AdminStartMic { is_sync_forced }),
            Some(MicCommand::AdminStop) => self
                .emitter
                .emit(SignalingEvent::AdminStopMic { is_sync_forced }),
            None => {
                debug!("dropping mic info with unknown command");
            }
        }
    }

    fn handle_use_license(&self, request: &dyn HeaderAccess) {
        match headers::decode_license(request.header(HeaderField::UseLicense.name())) {
            Some(license) => self.emitter.emit(SignalingEvent::UseLicense(license)),
            None => warn!("dropping use-license info with unknown license"),
        }
    }

    fn handle_participant_state(&self, request: &dyn HeaderAccess) {
        let state =
            headers::decode_participant_state(request.header(HeaderField::ParticipantState.name()));
        match state {
            Some(ParticipantState::Spectator) => {
                let audio_id = self.text_header(request, HeaderField::AudioId);
                match audio_id {
                    None => {
                        self.emitter.emit(SignalingEvent::MoveToSpectatorsSynthetic);
                        self.emitter.emit(SignalingEvent::MoveToSpectators {
                            is_synthetic: true,
                            audio_id: None,
                        });
                    }
                    Some(audio_id) => {
                        self.emitter.emit(SignalingEvent::MoveToSpectatorsWithAudioId {
                            audio_id: audio_id.clone(),
                        });
                        self.emitter.emit(SignalingEvent::MoveToSpectators {
                            is_synthetic: false,
                            audio_id: Some(audio_id),
                        });
                    }
                }
            }
            Some(ParticipantState::Participant) => {
                self.emitter.emit(SignalingEvent::MoveToParticipants);
            }
            Some(ParticipantState::SpectatorOverSfu) | None => {
                debug!(?state, "dropping participant-state info without a branch");
            }
        }
    }

    fn handle_share_state(&self, request: &dyn HeaderAccess) {
        use headers::ShareState;
        match headers::decode_share_state(request.header(HeaderField::ShareState.name())) {
            Some(ShareState::CanReceiveContent) => {
                self.emitter.emit(SignalingEvent::ShareContentAvailable)
            }
            Some(ShareState::ContentEnd) => self.emitter.emit(SignalingEvent::ShareContentEnded),
            Some(ShareState::MustStopPresentation) => {
                self.emitter.emit(SignalingEvent::MustStopShare)
            }
            None => debug!("dropping share-state info with unknown state"),
        }
    }

    fn text_header(&self, request: &dyn HeaderAccess, field: HeaderField) -> Option<String> {
        headers::decode_text(field, request.header(field.name()))
    }

    fn is_sync_forced(&self, request: &dyn HeaderAccess) -> bool {
        matches!(
            headers::decode_media_sync(request.header(HeaderField::MediaSync.name())),
            Some(MediaSyncFlag::Forced)
        )
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
