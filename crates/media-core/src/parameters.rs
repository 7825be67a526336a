//! RTP send parameter model.
//!
//! A plain-data mirror of the host engine's sender parameters, carrying
//! exactly the fields the diff engine inspects. The opaque `transaction_id`
//! must round-trip unmodified between a read and the following write or the
//! host rejects the mutation.

use serde::{Deserialize, Serialize};

/// Snapshot of an RTP sender's current parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SendParameters {
    /// Opaque host transaction id; never modified by this crate.
    pub transaction_id: Option<String>,
    /// Per-layer encoding parameters.
    pub encodings: Vec<EncodingParameters>,
    /// Negotiated send codecs.
    pub codecs: Vec<CodecParameters>,
    /// Negotiated RTP header extensions.
    pub header_extensions: Vec<HeaderExtensionParameters>,
    /// RTCP parameters.
    pub rtcp: RtcpParameters,
    /// Preferred degradation behavior under constrained bandwidth.
    pub degradation_preference: Option<DegradationPreference>,
}

/// Parameters for one encoding layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingParameters {
    /// RTP stream restriction id, for simulcast layers.
    pub rid: Option<String>,
    /// Whether this encoding is being sent.
    pub active: bool,
    /// Bitrate cap in bits per second.
    pub max_bitrate: Option<u64>,
    /// Framerate cap in frames per second.
    pub max_framerate: Option<f64>,
    /// Resolution downscale factor; `1.0` sends at capture resolution.
    pub scale_resolution_down_by: Option<f64>,
}

impl Default for EncodingParameters {
    fn default() -> Self {
        Self {
            rid: None,
            active: true,
            max_bitrate: None,
            max_framerate: None,
            scale_resolution_down_by: None,
        }
    }
}

/// One negotiated send codec.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodecParameters {
    /// RTP payload type.
    pub payload_type: u8,
    /// Codec MIME type, e.g. `video/vp8`.
    pub mime_type: String,
    /// Clock rate in Hz.
    pub clock_rate: u32,
    /// Channel count, for audio codecs.
    pub channels: Option<u16>,
    /// SDP `a=fmtp` line for this codec.
    pub sdp_fmtp_line: Option<String>,
}

/// One negotiated RTP header extension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderExtensionParameters {
    /// Extension URI.
    pub uri: String,
    /// Negotiated extension id.
    pub id: u16,
    /// Whether the extension is encrypted.
    pub encrypted: bool,
}

/// RTCP parameters attached to the sender.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RtcpParameters {
    /// Canonical name carried in RTCP SDES.
    pub cname: Option<String>,
    /// Whether reduced-size RTCP is in use.
    pub reduced_size: bool,
}

/// Preferred degradation behavior under constrained bandwidth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DegradationPreference {
    /// Prefer dropping resolution to keep framerate.
    MaintainFramerate,
    /// Prefer dropping framerate to keep resolution.
    MaintainResolution,
    /// Let the engine balance both.
    Balanced,
}
