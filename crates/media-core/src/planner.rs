//! Resolution and bitrate planning.
//!
//! Turns the latest server directive plus the track's current capture state
//! into an encoding target. Targets are computed fresh for every balance
//! task and never cached; the scale factor never drops below `1.0`, so the
//! sender is never asked to upscale.

use tracing::debug;

use wscall_signaling_core::headers::MainCamCommand;

use crate::bandwidth::BandwidthTable;
use crate::ports::{TrackSettings, VideoSize};

/// Scale factor applied while the camera is paused; effectively blanks the
/// outgoing picture without renegotiating the track.
pub const PAUSED_SCALE_FACTOR: f64 = 200.0;

/// The latest main-cam directive from the server.
///
/// Each inbound directive supersedes the previous one wholesale; fields are
/// never merged across messages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MainCamDirective {
    /// Decoded command, `None` when the header matched no member.
    pub main_cam: Option<MainCamCommand>,
    /// Raw resolution cap string, e.g. `"1280x720"`.
    pub resolution_main_cam: Option<String>,
}

/// Target encoding parameters for the outgoing video sender.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodingTarget {
    /// Resolution downscale factor, always `>= 1.0`.
    pub scale_resolution_down_by: f64,
    /// Bitrate cap in bits per second, always at or above the table floor.
    pub max_bitrate: u64,
}

/// Parse a `"WxH"` resolution string.
///
/// Anything that is not two positive integers around a single `x` is
/// unusable and yields `None`.
pub fn parse_resolution(value: &str) -> Option<VideoSize> {
    let (width, height) = value.trim().split_once(['x', 'X'])?;
    let width: u32 = width.trim().parse().ok()?;
    let height: u32 = height.trim().parse().ok()?;
    (width > 0 && height > 0).then_some(VideoSize { width, height })
}

/// Compute the downscale factor and bitrate for a target frame size.
///
/// Unknown capture dimensions contribute a factor of `1.0`; the result is
/// clamped so the sender never upscales.
pub fn scale_resolution_and_bitrate(
    settings: &TrackSettings,
    target: VideoSize,
    codec: &str,
    table: &BandwidthTable,
) -> EncodingTarget {
    let scale_by_width = settings
        .width
        .map(|width| width as f64 / target.width as f64)
        .unwrap_or(1.0);
    let scale_by_height = settings
        .height
        .map(|height| height as f64 / target.height as f64)
        .unwrap_or(1.0);
    EncodingTarget {
        scale_resolution_down_by: scale_by_width.max(scale_by_height).max(1.0),
        max_bitrate: table.lookup(target.width, codec),
    }
}

/// Map the latest directive onto an encoding target.
///
/// Pause downgrades hard; a resolution cap plans against the requested
/// size; everything else (resume, admin commands, no directive, unknown
/// values, unusable resolution strings) keeps full resolution and derives
/// the bitrate from the track's own current width.
pub fn plan_target(
    directive: &MainCamDirective,
    settings: &TrackSettings,
    codec: &str,
    table: &BandwidthTable,
) -> EncodingTarget {
    match directive.main_cam {
        Some(MainCamCommand::Pause) => {
            debug!("planning paused downgrade");
            EncodingTarget {
                scale_resolution_down_by: PAUSED_SCALE_FACTOR,
                max_bitrate: table.minimum(codec),
            }
        }
        Some(MainCamCommand::MaxResolution) => {
            match directive
                .resolution_main_cam
                .as_deref()
                .and_then(parse_resolution)
            {
                Some(target) => {
                    debug!(width = target.width, height = target.height, "planning resolution cap");
                    scale_resolution_and_bitrate(settings, target, codec, table)
                }
                None => bitrate_by_current_resolution(settings, codec, table),
            }
        }
        _ => bitrate_by_current_resolution(settings, codec, table),
    }
}

fn bitrate_by_current_resolution(
    settings: &TrackSettings,
    codec: &str,
    table: &BandwidthTable,
) -> EncodingTarget {
    let width = settings.width.unwrap_or(0);
    EncodingTarget {
        scale_resolution_down_by: 1.0,
        max_bitrate: table.lookup(width, codec),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hd_settings() -> TrackSettings {
        TrackSettings {
            width: Some(1280),
            height: Some(720),
        }
    }

    #[test]
    fn resolution_string_parses_loosely() {
        assert_eq!(
            parse_resolution("1280x720"),
            Some(VideoSize { width: 1280, height: 720 })
        );
        assert_eq!(
            parse_resolution(" 640X360 "),
            Some(VideoSize { width: 640, height: 360 })
        );
        assert_eq!(parse_resolution("1280"), None);
        assert_eq!(parse_resolution("0x720"), None);
        assert_eq!(parse_resolution("widexhigh"), None);
    }

    #[test]
    fn scale_never_drops_below_one() {
        let table = BandwidthTable::default();
        let small = TrackSettings {
            width: Some(320),
            height: Some(180),
        };
        let target = scale_resolution_and_bitrate(
            &small,
            VideoSize { width: 1280, height: 720 },
            "video/vp8",
            &table,
        );
        assert_eq!(target.scale_resolution_down_by, 1.0);

        let unknown = TrackSettings::default();
        let target = scale_resolution_and_bitrate(
            &unknown,
            VideoSize { width: 640, height: 360 },
            "video/vp8",
            &table,
        );
        assert_eq!(target.scale_resolution_down_by, 1.0);
    }

    #[test]
    fn downscale_uses_the_larger_axis_ratio() {
        let table = BandwidthTable::default();
        let target = scale_resolution_and_bitrate(
            &hd_settings(),
            VideoSize { width: 640, height: 180 },
            "video/vp8",
            &table,
        );
        // Height must shrink 4x, width only 2x.
        assert_eq!(target.scale_resolution_down_by, 4.0);
        assert_eq!(target.max_bitrate, 600_000);
    }

    #[test]
    fn pause_plans_hard_downgrade() {
        let table = BandwidthTable::default();
        let directive = MainCamDirective {
            main_cam: Some(MainCamCommand::Pause),
            resolution_main_cam: None,
        };
        let target = plan_target(&directive, &hd_settings(), "video/vp8", &table);
        assert_eq!(target.scale_resolution_down_by, PAUSED_SCALE_FACTOR);
        assert_eq!(target.max_bitrate, table.minimum("video/vp8"));
    }

    #[test]
    fn resume_and_admin_commands_plan_by_current_width() {
        let table = BandwidthTable::default();
        for command in [
            Some(MainCamCommand::Resume),
            Some(MainCamCommand::AdminStart),
            Some(MainCamCommand::AdminStop),
            None,
        ] {
            let directive = MainCamDirective {
                main_cam: command,
                resolution_main_cam: None,
            };
            let target = plan_target(&directive, &hd_settings(), "video/vp8", &table);
            assert_eq!(target.scale_resolution_down_by, 1.0);
            assert_eq!(target.max_bitrate, 2_000_000);
        }
    }

    #[test]
    fn max_resolution_plans_against_requested_size() {
        let table = BandwidthTable::default();
        let directive = MainCamDirective {
            main_cam: Some(MainCamCommand::MaxResolution),
            resolution_main_cam: Some("640x360".into()),
        };
        let target = plan_target(&directive, &hd_settings(), "video/vp8", &table);
        assert_eq!(target.scale_resolution_down_by, 2.0);
        assert_eq!(target.max_bitrate, 600_000);
    }

    #[test]
    fn max_resolution_without_usable_string_falls_back() {
        let table = BandwidthTable::default();
        for resolution in [None, Some("garbage".to_string()), Some("0x0".to_string())] {
            let directive = MainCamDirective {
                main_cam: Some(MainCamCommand::MaxResolution),
                resolution_main_cam: resolution,
            };
            let target = plan_target(&directive, &hd_settings(), "video/vp8", &table);
            assert_eq!(target.scale_resolution_down_by, 1.0);
            assert_eq!(target.max_bitrate, 2_000_000);
        }
    }

    #[test]
    fn unknown_track_width_plans_at_the_ladder_floor() {
        let table = BandwidthTable::default();
        let directive = MainCamDirective::default();
        let target = plan_target(&directive, &TrackSettings::default(), "video/vp8", &table);
        assert_eq!(target.scale_resolution_down_by, 1.0);
        assert_eq!(target.max_bitrate, 250_000);
    }
}
