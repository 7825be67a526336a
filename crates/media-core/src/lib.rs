//! # Media Core - Reactive Video-Bandwidth Control Loop
//!
//! This crate keeps the outgoing camera's encoding parameters in step with
//! the latest server directive:
//!
//! - **Bandwidth table** - width/codec to bitrate lookup with a configured
//!   floor ([`bandwidth`])
//! - **Planner** - codec- and resolution-aware bitrate/scale computation
//!   that never upscales ([`planner`])
//! - **Applier** - idempotent, minimal-mutation application of encoding
//!   parameters to the shared sender resource ([`applier`])
//! - **Balance controller** - subscribes to the dispatcher's main-cam
//!   event and serializes every mutation attempt through a single-worker
//!   FIFO queue ([`balance`])
//!
//! The host WebRTC engine stays behind the injected [`ports`] traits; this
//! crate is the sender's only writer and never issues overlapping writes,
//! which is what keeps the host from rejecting mutations raced on a stale
//! transaction id.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wscall_media_core::{BalanceController, BalanceOptions, BandwidthTable, ConnectionPort};
//! use wscall_signaling_core::EventDispatcher;
//!
//! # fn connect() -> Arc<dyn ConnectionPort> { unimplemented!() }
//! #[tokio::main]
//! async fn main() {
//!     let dispatcher = EventDispatcher::new();
//!     let controller = BalanceController::new(
//!         BandwidthTable::default(),
//!         BalanceOptions::default(),
//!     );
//!     controller.set_connection(connect());
//!     controller.subscribe(&dispatcher.events());
//!     // Every main-cam directive now re-plans and re-applies the
//!     // outgoing encoding parameters, one at a time, in arrival order.
//! }
//! ```

#![warn(missing_docs)]

pub mod applier;
pub mod balance;
pub mod bandwidth;
pub mod error;
pub mod parameters;
pub mod planner;
pub mod ports;
pub mod queue;

pub use applier::{apply, AppliedParameters, TargetEncoding, TargetParameters};
pub use balance::{run_balance, BalanceController, BalanceOptions, BalanceOutcome, SkipReason};
pub use bandwidth::{BandwidthProfile, BandwidthStep, BandwidthTable, CodecMultiplier};
pub use error::{MediaError, MediaResult};
pub use parameters::{
    CodecParameters, DegradationPreference, EncodingParameters, HeaderExtensionParameters,
    RtcpParameters, SendParameters,
};
pub use planner::{
    parse_resolution, plan_target, scale_resolution_and_bitrate, EncodingTarget, MainCamDirective,
    PAUSED_SCALE_FACTOR,
};
pub use ports::{ConnectionPort, SenderPort, TrackPort, TrackSettings, VideoSize};
pub use queue::{QueueHandle, QueuedTask, TaskQueue, DEFAULT_QUEUE_CAPACITY};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
