//! NOTIFY command envelope.
//!
//! Asynchronous room events arrive as a JSON object carried in a dedicated
//! header, discriminated by a `cmd` field. The envelope is a closed union:
//! unknown commands and malformed JSON are logged and dropped, never
//! surfaced as errors.

use serde::Deserialize;
use tracing::warn;

/// A decoded NOTIFY envelope.
///
/// `cmd` literals are matched exactly; the server emits them with the
/// casing preserved here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "cmd")]
pub enum NotifyCommand {
    /// Channel lists changed. Both fields are optional; an empty envelope
    /// still decodes.
    #[serde(rename = "channels")]
    Channels {
        /// Input channel list.
        #[serde(default, rename = "inputChannels")]
        input_channels: Option<String>,
        /// Output channel list.
        #[serde(default, rename = "outputChannels")]
        output_channels: Option<String>,
    },
    /// A webcast started.
    #[serde(rename = "WebcastStarted")]
    WebcastStarted {
        /// Conference identifier.
        conference: String,
        /// Webcast type.
        #[serde(default, rename = "type")]
        kind: Option<String>,
    },
    /// A webcast stopped.
    #[serde(rename = "WebcastStopped")]
    WebcastStopped {
        /// Conference identifier.
        conference: String,
        /// Webcast type.
        #[serde(default, rename = "type")]
        kind: Option<String>,
    },
    /// The local account joined the moderator list.
    #[serde(rename = "addedToListModerators")]
    AddedToListModerators {
        /// Conference identifier.
        conference: String,
    },
    /// The local account left the moderator list.
    #[serde(rename = "removedFromListModerators")]
    RemovedFromListModerators {
        /// Conference identifier.
        conference: String,
    },
    /// A participation request was accepted.
    #[serde(rename = "ParticipationRequestAccepted")]
    ParticipationRequestAccepted {
        /// Conference identifier.
        conference: String,
    },
    /// A participation request was rejected.
    #[serde(rename = "ParticipationRequestRejected")]
    ParticipationRequestRejected {
        /// Conference identifier.
        conference: String,
    },
    /// This participant was moved into the webcast.
    #[serde(rename = "ParticipantMovedToWebcast")]
    ParticipantMovedToWebcast {
        /// Conference identifier.
        conference: String,
    },
    /// The server-side account changed.
    #[serde(rename = "accountChanged")]
    AccountChanged,
    /// The server-side account was deleted.
    #[serde(rename = "accountDeleted")]
    AccountDeleted,
    /// A participant token was issued.
    #[serde(rename = "ConferenceParticipantTokenIssued")]
    ConferenceParticipantTokenIssued {
        /// Conference identifier.
        conference: String,
        /// Participant identifier.
        participant: String,
        /// Issued token.
        jwt: String,
    },
}

/// Parse a NOTIFY envelope.
///
/// Malformed JSON and unknown `cmd` values are logged and dropped.
pub fn parse_notify(payload: &str) -> Option<NotifyCommand> {
    match serde_json::from_str(payload) {
        Ok(command) => Some(command),
        Err(error) => {
            warn!(%error, "dropping undecodable notify envelope");
            None
        }
    }
}
