//! Splice planning.
//!
//! The instruction always describes the original placeholder window. The
//! synthesized clip rarely has the same length, so [`SplicePlan`] carries both
//! durations and leaves the reconciliation to the compositor through a
//! [`CompositePolicy`].

use serde::{Deserialize, Serialize};

use crate::error::SpliceError;
use crate::types::PlaceholderSpan;

/// Where to cut the source track, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpliceInstruction {
    /// Keep the source up to here.
    pub before_end: f64,
    /// Resume the source from here.
    pub after_start: f64,
    /// Length of the removed window.
    pub replacement_duration: f64,
}

/// Computes the splice window for a placeholder span.
///
/// `clip_duration` is checked but does not influence the result.
pub fn plan_splice(span: &PlaceholderSpan, clip_duration: f64) -> Result<SpliceInstruction, SpliceError> {
    span.validate()?;
    if !clip_duration.is_finite() || clip_duration <= 0.0 {
        return Err(SpliceError::InvalidClipDuration(clip_duration));
    }
    Ok(SpliceInstruction {
        before_end: span.start,
        after_start: span.end,
        replacement_duration: span.end - span.start,
    })
}

/// A splice instruction together with the clip it will carry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplicePlan {
    pub instruction: SpliceInstruction,
    pub clip_duration: f64,
}

impl SplicePlan {
    pub fn new(span: &PlaceholderSpan, clip_duration: f64) -> Result<Self, SpliceError> {
        Ok(Self {
            instruction: plan_splice(span, clip_duration)?,
            clip_duration,
        })
    }

    /// Clip length minus window length. Positive when the name runs long.
    pub fn drift(&self) -> f64 {
        self.clip_duration - self.instruction.replacement_duration
    }

    /// Factor to apply to the clip's playback length to fit the window.
    pub fn stretch_ratio(&self) -> f64 {
        self.instruction.replacement_duration / self.clip_duration
    }
}

/// How the compositor reconciles a clip with its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompositePolicy {
    /// Time-stretch the clip to the window length.
    #[default]
    Stretch,
    /// Play the clip as is; fill any shortfall with silence and shift the
    /// remainder of the source by any overrun.
    PadSilence,
    /// Cut the clip to the window and crossfade the edges.
    CrossfadeTrim,
}

impl std::fmt::Display for CompositePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CompositePolicy::Stretch => "stretch",
            CompositePolicy::PadSilence => "pad-silence",
            CompositePolicy::CrossfadeTrim => "crossfade-trim",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for CompositePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stretch" => Ok(CompositePolicy::Stretch),
            "pad-silence" => Ok(CompositePolicy::PadSilence),
            "crossfade-trim" => Ok(CompositePolicy::CrossfadeTrim),
            other => Err(format!("unknown composite policy {:?}", other)),
        }
    }
}

/// Payload handed to the external compositor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeJob {
    pub base_media: String,
    pub clip_ref: String,
    pub instruction: SpliceInstruction,
    pub clip_duration: f64,
    pub policy: CompositePolicy,
}

impl CompositeJob {
    pub fn new(
        base_media: impl Into<String>,
        clip_ref: impl Into<String>,
        plan: &SplicePlan,
        policy: CompositePolicy,
    ) -> Self {
        Self {
            base_media: base_media.into(),
            clip_ref: clip_ref.into(),
            instruction: plan.instruction,
            clip_duration: plan.clip_duration,
            policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_uses_span_not_clip() {
        let span = PlaceholderSpan::new(1.2, 1.9, 0.95);
        let a = plan_splice(&span, 0.4).unwrap();
        let b = plan_splice(&span, 1.3).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.before_end, 1.2);
        assert_eq!(a.after_start, 1.9);
        assert!((a.replacement_duration - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_plan_is_idempotent() {
        let span = PlaceholderSpan::new(0.0, 0.25, 0.95);
        assert_eq!(plan_splice(&span, 0.5), plan_splice(&span, 0.5));
    }

    #[test]
    fn test_plan_rejects_bad_input() {
        let zero = PlaceholderSpan::new(2.0, 2.0, 0.95);
        assert_eq!(
            plan_splice(&zero, 0.5),
            Err(SpliceError::InvalidSpan { start: 2.0, end: 2.0 })
        );
        let ok = PlaceholderSpan::new(1.0, 2.0, 0.95);
        assert!(matches!(
            plan_splice(&ok, 0.0),
            Err(SpliceError::InvalidClipDuration(_))
        ));
        assert!(plan_splice(&ok, f64::INFINITY).is_err());
    }

    #[test]
    fn test_plan_drift() {
        let plan = SplicePlan::new(&PlaceholderSpan::new(1.0, 1.5, 0.95), 0.75).unwrap();
        assert!((plan.drift() - 0.25).abs() < 1e-12);
        assert!((plan.stretch_ratio() - 0.5 / 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_instruction_wire_shape() {
        let inst = plan_splice(&PlaceholderSpan::new(1.0, 1.5, 0.95), 0.6).unwrap();
        let json = serde_json::to_value(inst).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"beforeEnd": 1.0, "afterStart": 1.5, "replacementDuration": 0.5})
        );
    }

    #[test]
    fn test_composite_job() {
        let plan = SplicePlan::new(&PlaceholderSpan::new(1.0, 1.5, 0.95), 0.6).unwrap();
        let job = CompositeJob::new("videos/base.mp4", "clips/alice.mp3", &plan, "pad-silence".parse().unwrap());
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["policy"], "pad-silence");
        assert_eq!(json["baseMedia"], "videos/base.mp4");
        assert_eq!(json["clipDuration"], 0.6);
        assert!("zoom".parse::<CompositePolicy>().is_err());
    }
}
