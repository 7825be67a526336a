//! Width-to-bitrate lookup.
//!
//! A monotonic non-decreasing step function from target video width to a
//! base bitrate, scaled per codec and clamped to a floor. The exact steps
//! and multipliers are deployment configuration, shipped alongside the
//! client rather than hardcoded here; the defaults below match a common
//! single-stream camera ladder.

use serde::{Deserialize, Serialize};

/// One step of the width-to-bitrate ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandwidthStep {
    /// Largest width this step covers, in pixels.
    pub width: u32,
    /// Base bitrate for this step, in bits per second.
    pub bitrate: u64,
}

/// Per-codec bitrate multiplier.
///
/// Matched case-insensitively as a substring of the negotiated codec
/// identifier, so `"vp9"` covers `video/VP9` and `vp9-profile-2` alike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecMultiplier {
    /// Substring of the codec identifier.
    pub codec: String,
    /// Multiplier applied to the base bitrate.
    pub multiplier: f64,
}

/// Deployment bandwidth configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandwidthProfile {
    /// Width-to-bitrate ladder.
    pub steps: Vec<BandwidthStep>,
    /// Floor applied to every lookup, in bits per second.
    pub minimum_bitrate: u64,
    /// Per-codec multipliers; codecs without an entry use `1.0`.
    pub codec_multipliers: Vec<CodecMultiplier>,
}

impl Default for BandwidthProfile {
    fn default() -> Self {
        Self {
            steps: vec![
                BandwidthStep { width: 320, bitrate: 250_000 },
                BandwidthStep { width: 640, bitrate: 600_000 },
                BandwidthStep { width: 960, bitrate: 1_200_000 },
                BandwidthStep { width: 1280, bitrate: 2_000_000 },
                BandwidthStep { width: 1920, bitrate: 4_000_000 },
            ],
            minimum_bitrate: 100_000,
            codec_multipliers: vec![
                CodecMultiplier { codec: "vp9".into(), multiplier: 0.7 },
                CodecMultiplier { codec: "av1".into(), multiplier: 0.6 },
                CodecMultiplier { codec: "h265".into(), multiplier: 0.7 },
                CodecMultiplier { codec: "hevc".into(), multiplier: 0.7 },
            ],
        }
    }
}

/// Width/codec to bitrate lookup table.
#[derive(Debug, Clone)]
pub struct BandwidthTable {
    profile: BandwidthProfile,
}

impl BandwidthTable {
    /// Build a table from a profile.
    ///
    /// Steps are sorted by width and their bitrates raised to a running
    /// maximum, so the resulting function is monotonic non-decreasing even
    /// if the profile was not.
    pub fn new(mut profile: BandwidthProfile) -> Self {
        profile.steps.sort_by_key(|step| step.width);
        let mut floor = 0;
        for step in &mut profile.steps {
            floor = floor.max(step.bitrate);
            step.bitrate = floor;
        }
        Self { profile }
    }

    /// Base bitrate for a target width, scaled for the codec and clamped to
    /// the floor.
    ///
    /// The step whose width first covers the target is chosen; targets wider
    /// than the ladder use the top step.
    pub fn lookup(&self, width: u32, codec: &str) -> u64 {
        let base = self
            .profile
            .steps
            .iter()
            .find(|step| width <= step.width)
            .or_else(|| self.profile.steps.last())
            .map(|step| step.bitrate)
            .unwrap_or(self.profile.minimum_bitrate);
        self.scale(base, codec).max(self.minimum(codec))
    }

    /// Floor bitrate for the codec.
    pub fn minimum(&self, codec: &str) -> u64 {
        self.scale(self.profile.minimum_bitrate, codec)
    }

    fn scale(&self, bitrate: u64, codec: &str) -> u64 {
        let codec = codec.to_lowercase();
        let multiplier = self
            .profile
            .codec_multipliers
            .iter()
            .find(|entry| codec.contains(&entry.codec.to_lowercase()))
            .map(|entry| entry.multiplier)
            .unwrap_or(1.0);
        (bitrate as f64 * multiplier).round() as u64
    }
}

impl Default for BandwidthTable {
    fn default() -> Self {
        Self::new(BandwidthProfile::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_picks_first_covering_step() {
        let table = BandwidthTable::default();
        assert_eq!(table.lookup(320, "video/vp8"), 250_000);
        assert_eq!(table.lookup(321, "video/vp8"), 600_000);
        assert_eq!(table.lookup(1280, "video/vp8"), 2_000_000);
    }

    #[test]
    fn lookup_above_the_ladder_uses_top_step() {
        let table = BandwidthTable::default();
        assert_eq!(table.lookup(3840, "video/vp8"), 4_000_000);
    }

    #[test]
    fn efficient_codecs_scale_down() {
        let table = BandwidthTable::default();
        assert_eq!(table.lookup(1280, "video/VP9"), 1_400_000);
        assert_eq!(table.lookup(1280, "av1-profile-0"), 1_200_000);
    }

    #[test]
    fn floor_applies_after_scaling() {
        let table = BandwidthTable::new(BandwidthProfile {
            steps: vec![BandwidthStep { width: 320, bitrate: 120_000 }],
            minimum_bitrate: 100_000,
            ..BandwidthProfile::default()
        });
        // 120k * 0.6 = 72k, above the equally-scaled av1 floor of 60k.
        assert_eq!(table.lookup(100, "av1"), 72_000);
        assert_eq!(table.minimum("av1"), 60_000);
        assert_eq!(table.minimum("vp8"), 100_000);
    }

    #[test]
    fn table_is_monotonic_even_from_an_unsorted_profile() {
        let table = BandwidthTable::new(BandwidthProfile {
            steps: vec![
                BandwidthStep { width: 640, bitrate: 500_000 },
                BandwidthStep { width: 320, bitrate: 800_000 },
            ],
            minimum_bitrate: 1,
            codec_multipliers: vec![],
        });
        assert_eq!(table.lookup(320, ""), 800_000);
        // The wider step is raised to the running maximum.
        assert_eq!(table.lookup(640, ""), 800_000);
    }

    #[test]
    fn empty_ladder_falls_back_to_the_floor() {
        let table = BandwidthTable::new(BandwidthProfile {
            steps: vec![],
            minimum_bitrate: 90_000,
            codec_multipliers: vec![],
        });
        assert_eq!(table.lookup(1280, "video/vp8"), 90_000);
    }

    #[test]
    fn profile_deserializes_with_defaults() {
        let profile: BandwidthProfile = serde_json::from_str("{}").unwrap();
        assert_eq!(profile, BandwidthProfile::default());

        let profile: BandwidthProfile = serde_json::from_str(
            r#"{"steps":[{"width":640,"bitrate":700000}],"minimum_bitrate":50000}"#,
        )
        .unwrap();
        assert_eq!(profile.steps.len(), 1);
        assert_eq!(profile.minimum_bitrate, 50_000);
    }
}
