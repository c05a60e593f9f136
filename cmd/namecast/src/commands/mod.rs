//! CLI commands module.

mod config;
mod detect;
mod personalize;
mod plan;
mod quality;
mod synthesize;
mod util;
mod variant;
mod voice;

pub use config::ConfigCommand;
pub use detect::DetectCommand;
pub use personalize::PersonalizeCommand;
pub use plan::PlanCommand;
pub use quality::QualityCommand;
pub use synthesize::SynthesizeCommand;
pub use variant::VariantCommand;
pub use voice::VoiceCommand;

pub(crate) use util::*;
