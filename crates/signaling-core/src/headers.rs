//! Protocol-extension header codec.
//!
//! The call-control server annotates SIP INFO/NOTIFY messages with custom
//! headers whose values arrive with inconsistent casing and are frequently
//! absent. Every header name maps to exactly one decode category - verbatim
//! lower-cased text, a bounded number, or a closed enum - and decoding never
//! fails: absent or invalid input yields `None`, not an error.

/// Decode category of a header field.
///
/// Each [`HeaderField`] belongs to exactly one category; the mapping is
/// static and never ambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// The lower-cased value verbatim (inner whitespace preserved).
    Text,
    /// A finite number; `NaN` and infinities are rejected.
    Numeric,
    /// Case-insensitive match against a closed member set.
    Enum,
}

/// The closed set of protocol-extension header fields this client decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderField {
    /// Declared payload kind of an in-dialog INFO message.
    ContentType,
    /// Room identifier announced on enter-room.
    Room,
    /// Display name of the local participant.
    ParticipantName,
    /// Input channel list announced on enter-room.
    InputChannels,
    /// Output channel list announced on enter-room.
    OutputChannels,
    /// Main-cam command from the server.
    MainCam,
    /// Resolution cap for the outgoing camera, as a `"WxH"` string.
    MainCamResolution,
    /// Mic command from the server.
    Mic,
    /// Media-sync flag (`'1'` forces an immediate media-state resync).
    MediaSync,
    /// Participant role directed by the server.
    ParticipantState,
    /// License profile in effect for this participant.
    UseLicense,
    /// Content-share state announced by the server.
    ShareState,
    /// JSON command envelope carried on NOTIFY-style messages.
    Notify,
    /// Audio stream identity accompanying a spectator move.
    AudioId,
    /// Free-form media-state label.
    MediaState,
    /// Flag asking the client to enable a media device.
    EnableMediaDevice,
    /// Direction hint for the negotiated tracks.
    TracksDirection,
    /// Video codec label.
    VideoCodec,
    /// Numeric media type discriminator.
    MediaType,
    /// Numeric main-cam state reported by the server.
    MainCamState,
    /// Numeric mic state reported by the server.
    MicState,
    /// Incoming bitrate available to this client, in bps.
    AvailableIncomingBitrate,
    /// Number of negotiated audio tracks.
    AudioTrackCount,
    /// Number of negotiated video tracks.
    VideoTrackCount,
}

impl HeaderField {
    /// Every field, for name lookup.
    pub const ALL: [HeaderField; 24] = [
        HeaderField::ContentType,
        HeaderField::Room,
        HeaderField::ParticipantName,
        HeaderField::InputChannels,
        HeaderField::OutputChannels,
        HeaderField::MainCam,
        HeaderField::MainCamResolution,
        HeaderField::Mic,
        HeaderField::MediaSync,
        HeaderField::ParticipantState,
        HeaderField::UseLicense,
        HeaderField::ShareState,
        HeaderField::Notify,
        HeaderField::AudioId,
        HeaderField::MediaState,
        HeaderField::EnableMediaDevice,
        HeaderField::TracksDirection,
        HeaderField::VideoCodec,
        HeaderField::MediaType,
        HeaderField::MainCamState,
        HeaderField::MicState,
        HeaderField::AvailableIncomingBitrate,
        HeaderField::AudioTrackCount,
        HeaderField::VideoTrackCount,
    ];

    /// Wire name of the header carrying this field.
    pub fn name(&self) -> &'static str {
        match self {
            HeaderField::ContentType => "content-type",
            HeaderField::Room => "x-room",
            HeaderField::ParticipantName => "x-participant-name",
            HeaderField::InputChannels => "x-input-channels",
            HeaderField::OutputChannels => "x-output-channels",
            HeaderField::MainCam => "x-main-cam",
            HeaderField::MainCamResolution => "x-main-cam-resolution",
            HeaderField::Mic => "x-mic",
            HeaderField::MediaSync => "x-media-sync",
            HeaderField::ParticipantState => "x-participant-state",
            HeaderField::UseLicense => "x-use-license",
            HeaderField::ShareState => "x-share-state",
            HeaderField::Notify => "x-notify",
            HeaderField::AudioId => "x-audio-id",
            HeaderField::MediaState => "x-media-state",
            HeaderField::EnableMediaDevice => "x-enable-media-device",
            HeaderField::TracksDirection => "x-tracks-direction",
            HeaderField::VideoCodec => "x-video-codec",
            HeaderField::MediaType => "x-media-type",
            HeaderField::MainCamState => "x-main-cam-state",
            HeaderField::MicState => "x-mic-state",
            HeaderField::AvailableIncomingBitrate => "x-available-incoming-bitrate",
            HeaderField::AudioTrackCount => "x-audio-track-count",
            HeaderField::VideoTrackCount => "x-video-track-count",
        }
    }

    /// Static decode category of this field.
    pub fn category(&self) -> Category {
        match self {
            HeaderField::Room
            | HeaderField::ParticipantName
            | HeaderField::InputChannels
            | HeaderField::OutputChannels
            | HeaderField::MainCamResolution
            | HeaderField::Notify
            | HeaderField::AudioId
            | HeaderField::MediaState
            | HeaderField::EnableMediaDevice
            | HeaderField::TracksDirection => Category::Text,
            HeaderField::MediaType
            | HeaderField::MainCamState
            | HeaderField::MicState
            | HeaderField::AvailableIncomingBitrate
            | HeaderField::AudioTrackCount
            | HeaderField::VideoTrackCount => Category::Numeric,
            HeaderField::ContentType
            | HeaderField::MainCam
            | HeaderField::Mic
            | HeaderField::MediaSync
            | HeaderField::ParticipantState
            | HeaderField::UseLicense
            | HeaderField::ShareState
            | HeaderField::VideoCodec => Category::Enum,
        }
    }

    /// Look a field up by its wire name, case-insensitively.
    pub fn from_name(name: &str) -> Option<HeaderField> {
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.name().eq_ignore_ascii_case(name))
    }
}

/// Declared payload kind of an in-dialog INFO message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// The server confirmed room entry.
    EnterRoom,
    /// Main-cam control directive.
    MainCam,
    /// Mic control directive.
    Mic,
    /// License profile announcement.
    UseLicense,
    /// Participant role change.
    ParticipantState,
    /// JSON command envelope.
    Notify,
    /// Content-share state change.
    ShareState,
}

impl ContentKind {
    const ALL: [ContentKind; 7] = [
        ContentKind::EnterRoom,
        ContentKind::MainCam,
        ContentKind::Mic,
        ContentKind::UseLicense,
        ContentKind::ParticipantState,
        ContentKind::Notify,
        ContentKind::ShareState,
    ];

    /// Canonical wire value.
    pub fn as_wire(&self) -> &'static str {
        match self {
            ContentKind::EnterRoom => "application/conference.enter-room",
            ContentKind::MainCam => "application/conference.main-cam",
            ContentKind::Mic => "application/conference.mic",
            ContentKind::UseLicense => "application/conference.use-license",
            ContentKind::ParticipantState => "application/conference.participant-state",
            ContentKind::Notify => "application/conference.notify",
            ContentKind::ShareState => "application/conference.share-state",
        }
    }

    /// Case-insensitive match against the member set.
    pub fn from_wire(value: &str) -> Option<ContentKind> {
        Self::ALL
            .iter()
            .copied()
            .find(|member| member.as_wire().eq_ignore_ascii_case(value))
    }
}

/// Main-cam command from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MainCamCommand {
    /// Pause the outgoing camera.
    Pause,
    /// Resume the outgoing camera.
    Resume,
    /// Cap the outgoing camera at the resolution named alongside.
    MaxResolution,
    /// Moderator stopped the camera.
    AdminStop,
    /// Moderator started the camera.
    AdminStart,
}

impl MainCamCommand {
    const ALL: [MainCamCommand; 5] = [
        MainCamCommand::Pause,
        MainCamCommand::Resume,
        MainCamCommand::MaxResolution,
        MainCamCommand::AdminStop,
        MainCamCommand::AdminStart,
    ];

    /// Canonical wire value.
    pub fn as_wire(&self) -> &'static str {
        match self {
            MainCamCommand::Pause => "PAUSEMAINCAM",
            MainCamCommand::Resume => "RESUMEMAINCAM",
            MainCamCommand::MaxResolution => "MAXMAINCAMRESOLUTION",
            MainCamCommand::AdminStop => "ADMINSTOPMAINCAM",
            MainCamCommand::AdminStart => "ADMINSTARTMAINCAM",
        }
    }

    /// Case-insensitive match against the member set.
    pub fn from_wire(value: &str) -> Option<MainCamCommand> {
        Self::ALL
            .iter()
            .copied()
            .find(|member| member.as_wire().eq_ignore_ascii_case(value))
    }
}

/// Mic command from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MicCommand {
    /// Moderator started the mic.
    AdminStart,
    /// Moderator stopped the mic.
    AdminStop,
}

impl MicCommand {
    const ALL: [MicCommand; 2] = [MicCommand::AdminStart, MicCommand::AdminStop];

    /// Canonical wire value.
    pub fn as_wire(&self) -> &'static str {
        match self {
            MicCommand::AdminStart => "ADMINSTARTMIC",
            MicCommand::AdminStop => "ADMINSTOPMIC",
        }
    }

    /// Case-insensitive match against the member set.
    pub fn from_wire(value: &str) -> Option<MicCommand> {
        Self::ALL
            .iter()
            .copied()
            .find(|member| member.as_wire().eq_ignore_ascii_case(value))
    }
}

/// Media-sync flag accompanying admin directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaSyncFlag {
    /// The server demands an immediate, non-negotiable resync.
    Forced,
    /// No forced resync.
    NotForced,
}

impl MediaSyncFlag {
    const ALL: [MediaSyncFlag; 2] = [MediaSyncFlag::Forced, MediaSyncFlag::NotForced];

    /// Canonical wire value.
    pub fn as_wire(&self) -> &'static str {
        match self {
            MediaSyncFlag::Forced => "1",
            MediaSyncFlag::NotForced => "0",
        }
    }

    /// Case-insensitive match against the member set.
    pub fn from_wire(value: &str) -> Option<MediaSyncFlag> {
        Self::ALL
            .iter()
            .copied()
            .find(|member| member.as_wire().eq_ignore_ascii_case(value))
    }
}

/// Participant role directed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticipantState {
    /// Watch-only member of the room.
    Spectator,
    /// Full participant.
    Participant,
    /// Spectator routed over the SFU (decoded but not dispatched).
    SpectatorOverSfu,
}

impl ParticipantState {
    const ALL: [ParticipantState; 3] = [
        ParticipantState::Spectator,
        ParticipantState::Participant,
        ParticipantState::SpectatorOverSfu,
    ];

    /// Canonical wire value.
    pub fn as_wire(&self) -> &'static str {
        match self {
            ParticipantState::Spectator => "SPECTATOR",
            ParticipantState::Participant => "PARTICIPANT",
            ParticipantState::SpectatorOverSfu => "SPECTATOROVERSFU",
        }
    }

    /// Case-insensitive match against the member set.
    pub fn from_wire(value: &str) -> Option<ParticipantState> {
        Self::ALL
            .iter()
            .copied()
            .find(|member| member.as_wire().eq_ignore_ascii_case(value))
    }
}

/// License profile in effect for this participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum License {
    /// Audio only.
    Audio,
    /// Audio and video.
    Video,
    /// Audio plus presentation sharing.
    AudioPlusPresentation,
}

impl License {
    const ALL: [License; 3] = [License::Audio, License::Video, License::AudioPlusPresentation];

    /// Canonical wire value.
    pub fn as_wire(&self) -> &'static str {
        match self {
            License::Audio => "AUDIO",
            License::Video => "VIDEO",
            License::AudioPlusPresentation => "AUDIOPLUSPRESENTATION",
        }
    }

    /// Case-insensitive match against the member set.
    pub fn from_wire(value: &str) -> Option<License> {
        Self::ALL
            .iter()
            .copied()
            .find(|member| member.as_wire().eq_ignore_ascii_case(value))
    }
}

/// Content-share state announced by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShareState {
    /// A second remote stream with shared content is available.
    CanReceiveContent,
    /// The shared content stream ended.
    ContentEnd,
    /// The local presentation must stop.
    MustStopPresentation,
}

impl ShareState {
    const ALL: [ShareState; 3] = [
        ShareState::CanReceiveContent,
        ShareState::ContentEnd,
        ShareState::MustStopPresentation,
    ];

    /// Canonical wire value.
    pub fn as_wire(&self) -> &'static str {
        match self {
            ShareState::CanReceiveContent => "YOUCANRECEIVECONTENT",
            ShareState::ContentEnd => "CONTENTEND",
            ShareState::MustStopPresentation => "MUSTSTOPPRESENTATION",
        }
    }

    /// Case-insensitive match against the member set.
    pub fn from_wire(value: &str) -> Option<ShareState> {
        Self::ALL
            .iter()
            .copied()
            .find(|member| member.as_wire().eq_ignore_ascii_case(value))
    }
}

/// Well-known video codec labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoCodecKind {
    /// VP8
    Vp8,
    /// VP9
    Vp9,
    /// H.264
    H264,
    /// H.265 / HEVC
    H265,
    /// AV1
    Av1,
}

impl VideoCodecKind {
    const ALL: [VideoCodecKind; 5] = [
        VideoCodecKind::Vp8,
        VideoCodecKind::Vp9,
        VideoCodecKind::H264,
        VideoCodecKind::H265,
        VideoCodecKind::Av1,
    ];

    /// Canonical wire value.
    pub fn as_wire(&self) -> &'static str {
        match self {
            VideoCodecKind::Vp8 => "video/vp8",
            VideoCodecKind::Vp9 => "video/vp9",
            VideoCodecKind::H264 => "video/h264",
            VideoCodecKind::H265 => "video/h265",
            VideoCodecKind::Av1 => "video/av1",
        }
    }

    /// Case-insensitive match against the member set.
    pub fn from_wire(value: &str) -> Option<VideoCodecKind> {
        Self::ALL
            .iter()
            .copied()
            .find(|member| member.as_wire().eq_ignore_ascii_case(value))
    }
}

/// A successfully decoded header value.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    /// A text-category value, lower-cased verbatim.
    Text(String),
    /// A finite numeric value.
    Numeric(f64),
    /// Content-type of an in-dialog INFO message.
    ContentKind(ContentKind),
    /// Main-cam command.
    MainCam(MainCamCommand),
    /// Mic command.
    Mic(MicCommand),
    /// Media-sync flag.
    MediaSync(MediaSyncFlag),
    /// Participant role.
    ParticipantState(ParticipantState),
    /// License profile.
    License(License),
    /// Content-share state.
    ShareState(ShareState),
    /// Video codec label.
    VideoCodec(VideoCodecKind),
}

/// Decode one header value.
///
/// Absent, empty, or whitespace-only input yields `None`. Otherwise the
/// value is lower-cased and decoded by the field's static category. Invalid
/// numbers (`NaN`, infinities) and unmatched enum values also yield `None`;
/// this function never fails.
pub fn decode(field: HeaderField, raw: Option<&str>) -> Option<HeaderValue> {
    let raw = raw?;
    if raw.trim().is_empty() {
        return None;
    }
    let value = raw.to_lowercase();
    match field.category() {
        Category::Text => Some(HeaderValue::Text(value)),
        Category::Numeric => {
            let number: f64 = value.trim().parse().ok()?;
            number.is_finite().then_some(HeaderValue::Numeric(number))
        }
        Category::Enum => decode_enum(field, &value),
    }
}

/// Decode a header addressed by wire name instead of field.
///
/// Unknown names decode to `None`; this is the explicit default branch for
/// headers outside the category table.
pub fn decode_by_name(name: &str, raw: Option<&str>) -> Option<HeaderValue> {
    let field = HeaderField::from_name(name)?;
    decode(field, raw)
}

fn decode_enum(field: HeaderField, value: &str) -> Option<HeaderValue> {
    match field {
        HeaderField::ContentType => ContentKind::from_wire(value).map(HeaderValue::ContentKind),
        HeaderField::MainCam => MainCamCommand::from_wire(value).map(HeaderValue::MainCam),
        HeaderField::Mic => MicCommand::from_wire(value).map(HeaderValue::Mic),
        HeaderField::MediaSync => MediaSyncFlag::from_wire(value).map(HeaderValue::MediaSync),
        HeaderField::ParticipantState => {
            ParticipantState::from_wire(value).map(HeaderValue::ParticipantState)
        }
        HeaderField::UseLicense => License::from_wire(value).map(HeaderValue::License),
        HeaderField::ShareState => ShareState::from_wire(value).map(HeaderValue::ShareState),
        HeaderField::VideoCodec => VideoCodecKind::from_wire(value).map(HeaderValue::VideoCodec),
        // Text/numeric fields never dispatch here.
        _ => None,
    }
}

/// Decode a text-category field into its lower-cased string.
pub fn decode_text(field: HeaderField, raw: Option<&str>) -> Option<String> {
    match decode(field, raw) {
        Some(HeaderValue::Text(value)) => Some(value),
        _ => None,
    }
}

/// Decode a numeric-category field into its finite value.
pub fn decode_numeric(field: HeaderField, raw: Option<&str>) -> Option<f64> {
    match decode(field, raw) {
        Some(HeaderValue::Numeric(value)) => Some(value),
        _ => None,
    }
}

/// Decode the content-type header.
pub fn decode_content_kind(raw: Option<&str>) -> Option<ContentKind> {
    match decode(HeaderField::ContentType, raw) {
        Some(HeaderValue::ContentKind(kind)) => Some(kind),
        _ => None,
    }
}

/// Decode the main-cam command header.
pub fn decode_main_cam_command(raw: Option<&str>) -> Option<MainCamCommand> {
    match decode(HeaderField::MainCam, raw) {
        Some(HeaderValue::MainCam(command)) => Some(command),
        _ => None,
    }
}

/// Decode the mic command header.
pub fn decode_mic_command(raw: Option<&str>) -> Option<MicCommand> {
    match decode(HeaderField::Mic, raw) {
        Some(HeaderValue::Mic(command)) => Some(command),
        _ => None,
    }
}

/// Decode the media-sync header.
pub fn decode_media_sync(raw: Option<&str>) -> Option<MediaSyncFlag> {
    match decode(HeaderField::MediaSync, raw) {
        Some(HeaderValue::MediaSync(flag)) => Some(flag),
        _ => None,
    }
}

/// Decode the participant-state header.
pub fn decode_participant_state(raw: Option<&str>) -> Option<ParticipantState> {
    match decode(HeaderField::ParticipantState, raw) {
        Some(HeaderValue::ParticipantState(state)) => Some(state),
        _ => None,
    }
}

/// Decode the use-license header.
pub fn decode_license(raw: Option<&str>) -> Option<License> {
    match decode(HeaderField::UseLicense, raw) {
        Some(HeaderValue::License(license)) => Some(license),
        _ => None,
    }
}

/// Decode the share-state header.
pub fn decode_share_state(raw: Option<&str>) -> Option<ShareState> {
    match decode(HeaderField::ShareState, raw) {
        Some(HeaderValue::ShareState(state)) => Some(state),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_blank_values_decode_to_none() {
        for field in HeaderField::ALL {
            assert_eq!(decode(field, None), None);
            assert_eq!(decode(field, Some("")), None);
            assert_eq!(decode(field, Some("   ")), None);
        }
    }

    #[test]
    fn text_values_are_lowercased_with_whitespace_preserved() {
        assert_eq!(
            decode(HeaderField::Room, Some("  Room-42  ")),
            Some(HeaderValue::Text("  room-42  ".into()))
        );
        assert_eq!(
            decode_text(HeaderField::ParticipantName, Some("Alice")),
            Some("alice".into())
        );
    }

    #[test]
    fn numeric_values_reject_nan_and_infinity() {
        for raw in ["NaN", "nan", "Infinity", "-Infinity", "inf", "ten"] {
            assert_eq!(decode(HeaderField::MediaType, Some(raw)), None);
        }
    }

    #[test]
    fn numeric_values_accept_zero_negative_and_decimal() {
        assert_eq!(decode_numeric(HeaderField::MediaType, Some("0")), Some(0.0));
        assert_eq!(decode_numeric(HeaderField::MicState, Some("-5")), Some(-5.0));
        assert_eq!(
            decode_numeric(HeaderField::AvailableIncomingBitrate, Some("1500.5")),
            Some(1500.5)
        );
    }

    #[test]
    fn enum_match_is_case_insensitive() {
        for raw in ["pausemaincam", "PAUSEMAINCAM", "PaUsEmAiNcAm"] {
            assert_eq!(
                decode_main_cam_command(Some(raw)),
                Some(MainCamCommand::Pause)
            );
        }
        assert_eq!(decode_main_cam_command(Some("dropmaincam")), None);
    }

    #[test]
    fn enum_decode_returns_canonical_member() {
        let command = decode_main_cam_command(Some("resumemaincam")).unwrap();
        assert_eq!(command.as_wire(), "RESUMEMAINCAM");

        let kind = decode_content_kind(Some("APPLICATION/CONFERENCE.MAIN-CAM")).unwrap();
        assert_eq!(kind, ContentKind::MainCam);
    }

    #[test]
    fn media_sync_flag_is_binary() {
        assert_eq!(decode_media_sync(Some("1")), Some(MediaSyncFlag::Forced));
        assert_eq!(decode_media_sync(Some("0")), Some(MediaSyncFlag::NotForced));
        assert_eq!(decode_media_sync(Some("2")), None);
    }

    #[test]
    fn unknown_header_name_decodes_to_none() {
        assert_eq!(decode_by_name("x-unknown", Some("anything")), None);
        assert_eq!(
            decode_by_name("X-ROOM", Some("Main")),
            Some(HeaderValue::Text("main".into()))
        );
    }

    #[test]
    fn every_field_has_exactly_one_category() {
        // The table is closed; from_name must round-trip every member.
        for field in HeaderField::ALL {
            assert_eq!(HeaderField::from_name(field.name()), Some(field));
            let _ = field.category();
        }
    }

    #[test]
    fn video_codec_labels_decode() {
        assert_eq!(
            decode(HeaderField::VideoCodec, Some("VIDEO/VP9")),
            Some(HeaderValue::VideoCodec(VideoCodecKind::Vp9))
        );
        assert_eq!(decode(HeaderField::VideoCodec, Some("video/mjpeg")), None);
    }

    #[test]
    fn participant_state_includes_sfu_spectator() {
        assert_eq!(
            decode_participant_state(Some("spectatoroversfu")),
            Some(ParticipantState::SpectatorOverSfu)
        );
    }
}
