//! Minimal-mutation parameter application.
//!
//! The sender's parameter state is owned by the host engine and may change
//! between reads, so every apply starts from a fresh snapshot. The write is
//! issued only when the merged parameters differ structurally from that
//! snapshot; an unchanged state never touches the host, which both avoids
//! redundant renegotiation and stays clear of the host's rejection path for
//! writes that race a stale transaction id.

use tracing::{debug, trace};

use crate::error::MediaResult;
use crate::parameters::{DegradationPreference, EncodingParameters, SendParameters};
use crate::planner::EncodingTarget;
use crate::ports::SenderPort;

/// Target fields for one encoding layer.
///
/// Unset fields leave the sender's existing values untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TargetEncoding {
    /// Bitrate cap in bits per second.
    pub max_bitrate: Option<u64>,
    /// Resolution downscale factor.
    pub scale_resolution_down_by: Option<f64>,
}

/// Partial parameter target to merge onto the sender's state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetParameters {
    /// Per-layer targets; the sender's encoding list is padded up to this
    /// length, never truncated.
    pub encodings: Vec<TargetEncoding>,
    /// Degradation preference to install, when set.
    pub degradation_preference: Option<DegradationPreference>,
}

impl From<EncodingTarget> for TargetParameters {
    fn from(target: EncodingTarget) -> Self {
        Self {
            encodings: vec![TargetEncoding {
                max_bitrate: Some(target.max_bitrate),
                scale_resolution_down_by: Some(target.scale_resolution_down_by),
            }],
            degradation_preference: None,
        }
    }
}

/// Result of one apply pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedParameters {
    /// Whether the sender was actually written to.
    pub is_changed: bool,
    /// The parameters now in effect.
    pub parameters: SendParameters,
}

/// Merge the target onto a fresh snapshot and write it back if anything
/// changed.
///
/// A rejected write propagates to the caller; nothing is retried here.
pub async fn apply(
    sender: &dyn SenderPort,
    target: &TargetParameters,
) -> MediaResult<AppliedParameters> {
    let mut parameters_current = sender.parameters();
    let parameters_initial = parameters_current.clone();

    merge_target(&mut parameters_current, target);

    let is_changed = differs(&parameters_initial, &parameters_current);
    if is_changed {
        debug!("sender parameters changed, applying");
        sender.apply_parameters(parameters_current.clone()).await?;
    } else {
        trace!("sender parameters unchanged, skipping apply");
    }
    Ok(AppliedParameters {
        is_changed,
        parameters: parameters_current,
    })
}

fn merge_target(parameters: &mut SendParameters, target: &TargetParameters) {
    if parameters.encodings.len() < target.encodings.len() {
        parameters
            .encodings
            .resize_with(target.encodings.len(), EncodingParameters::default);
    }
    for (encoding, target_encoding) in parameters.encodings.iter_mut().zip(&target.encodings) {
        if let Some(max_bitrate) = target_encoding.max_bitrate {
            encoding.max_bitrate = Some(max_bitrate);
        }
        if let Some(scale) = target_encoding.scale_resolution_down_by {
            encoding.scale_resolution_down_by = Some(scale);
        }
    }
    if let Some(preference) = target.degradation_preference {
        parameters.degradation_preference = Some(preference);
    }
}

/// Structural diff over the groups the host engine actually renegotiates
/// on. The transaction id is excluded; it round-trips as-is.
fn differs(initial: &SendParameters, current: &SendParameters) -> bool {
    initial.codecs != current.codecs
        || initial.header_extensions != current.header_extensions
        || initial.encodings != current.encodings
        || initial.rtcp.cname != current.rtcp.cname
        || initial.rtcp.reduced_size != current.rtcp.reduced_size
        || initial.degradation_preference != current.degradation_preference
}
