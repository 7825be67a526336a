//! # Signaling Core - Protocol Event Decoding for a SIP-over-WebSocket Client
//!
//! This crate is the signaling-event decoding layer of a calling client. A
//! call-control server sends protocol-extension headers inside SIP INFO and
//! NOTIFY messages; this crate decodes them and republishes them as a closed
//! set of strongly-typed events:
//!
//! - **Header codec** - type-safe decoding of header values despite
//!   inconsistent casing and absent values ([`headers`])
//! - **NOTIFY envelope** - the JSON command envelope carried in a dedicated
//!   header ([`notify`])
//! - **Event dispatcher** - routes decoded headers and envelopes to typed
//!   events ([`dispatcher`])
//! - **Event surface** - a broadcast-backed typed publish/subscribe API
//!   ([`events`])
//!
//! ## Quick Start
//!
//! ```rust
//! use wscall_signaling_core::{EventDispatcher, EventKind, HeaderAccess, Originator};
//!
//! struct Request(Vec<(String, String)>);
//!
//! impl HeaderAccess for Request {
//!     fn header(&self, name: &str) -> Option<&str> {
//!         self.0
//!             .iter()
//!             .find(|(key, _)| key.eq_ignore_ascii_case(name))
//!             .map(|(_, value)| value.as_str())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let dispatcher = EventDispatcher::new();
//!     let mut events = dispatcher.events().subscribe_receiver();
//!
//!     let request = Request(vec![
//!         ("content-type".into(), "application/conference.enter-room".into()),
//!         ("x-room".into(), "1234".into()),
//!     ]);
//!     dispatcher.dispatch_info(Originator::Remote, &request);
//!
//!     let event = events.try_recv().unwrap();
//!     assert_eq!(event.kind(), EventKind::EnterRoom);
//! }
//! ```
//!
//! Transport, session establishment, and SDP negotiation are out of scope;
//! the host stack hands raw header access to this crate through the
//! [`HeaderAccess`] and [`SessionSource`] boundary traits.

#![warn(missing_docs)]

pub mod dispatcher;
pub mod events;
pub mod headers;
pub mod notify;

pub use dispatcher::{EventDispatcher, HeaderAccess, Originator, SessionEvent, SessionSource};
pub use events::{EventEmitter, EventKind, EventStream, SignalingEvent, SubscriptionGuard};
pub use headers::{
    ContentKind, HeaderField, HeaderValue, License, MainCamCommand, MediaSyncFlag, MicCommand,
    ParticipantState, ShareState, VideoCodecKind,
};
pub use notify::NotifyCommand;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
