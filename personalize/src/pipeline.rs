//! End-to-end personalization.
//!
//! Once per project the source recording is analysed and its placeholder span
//! persisted. Afterwards any number of prospects can be personalized against
//! that span, one at a time or as a bounded concurrent batch.

use std::sync::Arc;

use futures::{StreamExt, stream};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::PersonalizeConfig;
use crate::detect::{Detection, Detector, Transcriber};
use crate::error::PersonalizeError;
use crate::retry::retry;
use crate::splice::{CompositeJob, CompositePolicy, SplicePlan};
use crate::store::{SpanStore, StoredSpan};
use crate::synth::{SynthesisEngine, VoiceCloner, VoiceLibrary, VoiceSynthesizer};
use crate::types::{PlaceholderSpan, Prospect, Recording, SynthesizedClip, VoiceProfile};

/// Result of personalizing for one prospect.
#[derive(Debug, Clone)]
pub struct PersonalizedClip {
    pub prospect_id: String,
    pub clip: SynthesizedClip,
    pub plan: SplicePlan,
}

/// Outcome of one prospect in a batch.
#[derive(Debug)]
pub struct BatchItem {
    pub prospect_id: String,
    pub result: Result<PersonalizedClip, PersonalizeError>,
}

/// Summary line for a finished batch item, suitable for JSON output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub prospect_id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&BatchItem> for BatchSummary {
    fn from(item: &BatchItem) -> Self {
        match &item.result {
            Ok(p) => Self {
                prospect_id: item.prospect_id.clone(),
                ok: true,
                clip_duration: Some(p.clip.duration),
                error: None,
            },
            Err(e) => Self {
                prospect_id: item.prospect_id.clone(),
                ok: false,
                clip_duration: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Drives detection, synthesis and splice planning for projects.
pub struct Personalizer {
    config: PersonalizeConfig,
    detector: Detector,
    synthesis: SynthesisEngine,
    voices: Option<VoiceLibrary>,
    spans: SpanStore,
}

impl Personalizer {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        synthesizer: Arc<dyn VoiceSynthesizer>,
        spans: SpanStore,
        config: PersonalizeConfig,
    ) -> Self {
        Self {
            detector: Detector::from_config(transcriber, &config),
            synthesis: SynthesisEngine::from_config(synthesizer, &config),
            voices: None,
            spans,
            config,
        }
    }

    /// Enables voice cloning and lookup.
    pub fn with_voice_library(mut self, cloner: Arc<dyn VoiceCloner>) -> Self {
        self.voices = Some(VoiceLibrary::from_config(cloner, &self.config));
        self
    }

    pub fn config(&self) -> &PersonalizeConfig {
        &self.config
    }

    pub fn spans(&self) -> &SpanStore {
        &self.spans
    }

    /// Detects the placeholder in a project's recording and stores its span,
    /// replacing any earlier one.
    ///
    /// On [`Detection::NotFound`] the project's stored span is cleared.
    pub async fn setup_project(
        &self,
        project_id: &str,
        recording: &Recording,
    ) -> Result<Detection, PersonalizeError> {
        let detection = self.detect(project_id, recording).await?;
        match &detection {
            Detection::Found(span) => {
                let stored = self.spans.put(project_id, *span)?;
                info!(project_id, version = stored.version, start = span.start, end = span.end, "placeholder span stored");
            }
            Detection::NotFound { .. } => {
                self.spans.clear(project_id)?;
                info!(project_id, "placeholder span cleared");
            }
        }
        Ok(detection)
    }

    /// Like [`Self::setup_project`], but only replaces a span whose version is
    /// still `expected`. A [`Detection::NotFound`] leaves the stored span as
    /// it is; callers holding a version decide themselves whether to clear it.
    pub async fn setup_project_if_version(
        &self,
        project_id: &str,
        expected: Option<u64>,
        recording: &Recording,
    ) -> Result<(Detection, Option<StoredSpan>), PersonalizeError> {
        let detection = self.detect(project_id, recording).await?;
        let stored = match &detection {
            Detection::Found(span) => Some(self.spans.put_if_version(project_id, expected, *span)?),
            Detection::NotFound { .. } => None,
        };
        Ok((detection, stored))
    }

    async fn detect(&self, project_id: &str, recording: &Recording) -> Result<Detection, PersonalizeError> {
        let detection = retry(&self.config.retry, || self.detector.detect_placeholder(recording)).await?;
        if let Detection::NotFound { transcript } = &detection {
            warn!(project_id, transcript = %transcript, "placeholder not found");
        }
        Ok(detection)
    }

    /// Clones a voice from a sample recording.
    pub async fn create_voice_profile(
        &self,
        name: &str,
        sample: &Recording,
    ) -> Result<VoiceProfile, PersonalizeError> {
        let voices = self.voice_library()?;
        Ok(retry(&self.config.retry, || voices.clone_voice(name, sample)).await?)
    }

    /// Resolves a voice id to a profile, failing fast for unknown voices.
    pub async fn resolve_voice(&self, voice_id: &str) -> Result<VoiceProfile, PersonalizeError> {
        let voices = self.voice_library()?;
        Ok(retry(&self.config.retry, || voices.lookup(voice_id)).await?)
    }

    fn voice_library(&self) -> Result<&VoiceLibrary, PersonalizeError> {
        self.voices
            .as_ref()
            .ok_or_else(|| PersonalizeError::Unsupported("voice cloning is not configured".to_string()))
    }

    /// The project's stored placeholder span.
    pub fn span(&self, project_id: &str) -> Result<PlaceholderSpan, PersonalizeError> {
        match self.spans.get(project_id)? {
            Some(stored) => Ok(stored.span),
            None => Err(PersonalizeError::NoPlaceholder {
                project_id: project_id.to_string(),
            }),
        }
    }

    /// Synthesizes the prospect's name and plans its splice.
    pub async fn personalize(
        &self,
        project_id: &str,
        prospect: &Prospect,
        voice: &VoiceProfile,
    ) -> Result<PersonalizedClip, PersonalizeError> {
        let span = self.span(project_id)?;
        self.personalize_with_span(&span, prospect, voice).await
    }

    /// Personalizes every prospect with at most `batch_concurrency` in flight.
    ///
    /// Results come back in input order; one prospect failing does not affect
    /// the others. A missing span fails the whole batch up front.
    pub async fn personalize_batch(
        &self,
        project_id: &str,
        prospects: &[Prospect],
        voice: &VoiceProfile,
    ) -> Result<Vec<BatchItem>, PersonalizeError> {
        let span = self.span(project_id)?;
        let span = &span;
        let concurrency = self.config.batch_concurrency.max(1);
        info!(project_id, prospects = prospects.len(), concurrency, "personalizing batch");

        let items: Vec<BatchItem> = stream::iter(prospects)
            .map(|prospect| async move {
                BatchItem {
                    prospect_id: prospect.id.clone(),
                    result: self.personalize_with_span(span, prospect, voice).await,
                }
            })
            .buffered(concurrency)
            .collect()
            .await;

        let failed = items.iter().filter(|i| i.result.is_err()).count();
        if failed > 0 {
            warn!(project_id, failed, total = items.len(), "batch finished with failures");
        }
        Ok(items)
    }

    async fn personalize_with_span(
        &self,
        span: &PlaceholderSpan,
        prospect: &Prospect,
        voice: &VoiceProfile,
    ) -> Result<PersonalizedClip, PersonalizeError> {
        let style = self.config.style;
        let clip = retry(&self.config.retry, || {
            self.synthesis.synthesize(&prospect.first_name, voice, &style)
        })
        .await?;
        let plan = SplicePlan::new(span, clip.duration)?;
        info!(
            prospect_id = %prospect.id,
            clip_duration = clip.duration,
            window = plan.instruction.replacement_duration,
            drift = plan.drift(),
            "prospect personalized"
        );
        Ok(PersonalizedClip {
            prospect_id: prospect.id.clone(),
            clip,
            plan,
        })
    }

    /// Builds the compositor payload for a personalized clip.
    pub fn composite_job(
        base_media: &str,
        clip_ref: &str,
        plan: &SplicePlan,
        policy: CompositePolicy,
    ) -> CompositeJob {
        CompositeJob::new(base_media, clip_ref, plan, policy)
    }
}
