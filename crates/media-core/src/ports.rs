//! Injected host boundaries.
//!
//! The balancing loop never touches engine globals. The host WebRTC stack
//! (a browser binding or a native engine) satisfies these traits and hands
//! them in; tests satisfy them with in-memory fakes.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::MediaResult;
use crate::parameters::SendParameters;

/// A video frame size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Current capture settings of a video track.
///
/// Dimensions are optional; the host may not know them yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackSettings {
    /// Capture width in pixels, when known.
    pub width: Option<u32>,
    /// Capture height in pixels, when known.
    pub height: Option<u32>,
}

/// An outgoing video track.
pub trait TrackPort: Send + Sync {
    /// Current capture settings.
    fn settings(&self) -> TrackSettings;
}

/// An RTP sender owned by the host engine.
///
/// Reads are cheap and synchronous; the write suspends and may be rejected
/// by the host, e.g. when a stale transaction id races another writer.
#[async_trait]
pub trait SenderPort: Send + Sync {
    /// Read the sender's current parameters. Every read returns a fresh
    /// snapshot; the host may have mutated the state since the last one.
    fn parameters(&self) -> SendParameters;

    /// Apply new parameters to the sender.
    async fn apply_parameters(&self, parameters: SendParameters) -> MediaResult<()>;

    /// The track currently attached to this sender, if any.
    fn track(&self) -> Option<Arc<dyn TrackPort>>;
}

/// The established media connection.
pub trait ConnectionPort: Send + Sync {
    /// The outgoing video sender, if one was negotiated.
    fn video_sender(&self) -> Option<Arc<dyn SenderPort>>;

    /// Negotiated outgoing video codec identifier, empty when unknown.
    fn video_codec(&self) -> String;
}
