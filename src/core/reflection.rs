// src/core/reflection.rs — Generate/reflect loop controller

use std::path::PathBuf;
use std::sync::Arc;

use super::history::BoundedHistory;
use super::prompts;
use super::transcript::TranscriptLog;
use super::types::*;
use crate::infra::errors::ReflectError;
use crate::provider::completion::ResilientCompletion;
use crate::provider::retry::RetryConfig;
use crate::provider::{Message, ModelProvider};
use crate::util::preview;

/// Stop detection is plain substring containment. A critique that quotes the
/// marker anywhere, even mid-sentence, ends the loop.
pub fn contains_stop_marker(reflection: &str, marker: &str) -> bool {
    reflection.contains(marker)
}

/// Drives one generator and one critic against the same model until the
/// critic emits the stop marker or the step budget runs out.
pub struct ReflectionAgent {
    completion: ResilientCompletion,
    model: String,
    config: ReflectionConfig,
    /// When set, completions are buffered and written here once per run.
    transcript_dir: Option<PathBuf>,
    on_progress: Option<Box<dyn Fn(ProgressEvent) + Send + Sync>>,
}

impl ReflectionAgent {
    pub fn new(provider: Arc<dyn ModelProvider>, model: impl Into<String>, retry: RetryConfig) -> Self {
        Self {
            completion: ResilientCompletion::new(provider, retry),
            model: model.into(),
            config: ReflectionConfig::default(),
            transcript_dir: None,
            on_progress: None,
        }
    }

    pub fn with_config(mut self, config: ReflectionConfig) -> Self {
        self.config = config;
        self
    }

    /// Sampling limits applied to both roles.
    pub fn with_sampling(mut self, max_tokens: Option<u32>, temperature: Option<f32>) -> Self {
        self.completion = self.completion.with_sampling(max_tokens, temperature);
        self
    }

    /// Buffer every completion and write the transcript into `dir` at the end
    /// of each run.
    pub fn with_transcript(mut self, dir: impl Into<PathBuf>) -> Self {
        self.transcript_dir = Some(dir.into());
        self
    }

    /// Set a callback for real-time progress events.
    pub fn with_progress(mut self, cb: impl Fn(ProgressEvent) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Box::new(cb));
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(ref cb) = self.on_progress {
            cb(event);
        }
    }

    async fn complete_tagged(
        &self,
        tag: CompletionTag,
        history: &BoundedHistory,
        transcript: Option<&mut TranscriptLog>,
    ) -> Result<String, ReflectError> {
        let response = self.completion.complete(&self.model, history.messages()).await?;
        tracing::debug!(tag = %tag, preview = %preview(&response, 80), "completion");
        if let Some(log) = transcript {
            log.record(tag, &response);
        }
        self.emit(ProgressEvent::Completion {
            tag,
            content: response.clone(),
        });
        Ok(response)
    }

    async fn generate(
        &self,
        history: &BoundedHistory,
        transcript: Option<&mut TranscriptLog>,
    ) -> Result<String, ReflectError> {
        self.complete_tagged(CompletionTag::Generation, history, transcript)
            .await
    }

    async fn reflect(
        &self,
        history: &BoundedHistory,
        transcript: Option<&mut TranscriptLog>,
    ) -> Result<String, ReflectError> {
        self.complete_tagged(CompletionTag::Reflection, history, transcript)
            .await
    }

    /// Run the loop and return the last generation.
    ///
    /// Errors from the provider (after retries) abort the run. In transcript
    /// mode the partial transcript is still written on that path; a write
    /// failure there is logged and the original error is returned.
    pub async fn run(&self, request: ReflectionRequest) -> Result<ReflectionOutcome, ReflectError> {
        if request.steps == 0 {
            return Err(ReflectError::Config(
                "step budget must be at least 1".into(),
            ));
        }
        self.config.validate()?;

        let mut state = LoopState::new();
        let mut transcript = self.transcript_dir.as_ref().map(|_| TranscriptLog::new());

        let result = self
            .drive(&request, &mut state, transcript.as_mut())
            .await;

        let transcript_path = match (transcript, &self.transcript_dir) {
            (Some(log), Some(dir)) => match (log.flush(dir, &self.model), &result) {
                (Ok(path), _) => Some(path),
                (Err(e), Ok(_)) => return Err(e),
                (Err(flush_err), Err(run_err)) => {
                    tracing::warn!("Could not save partial transcript: {flush_err} (run failed: {run_err})");
                    None
                }
            },
            _ => None,
        };

        let stop = result?;
        tracing::debug!(
            phase = ?state.phase,
            last_reflection = %preview(state.reflection.as_deref().unwrap_or(""), 80),
            "loop finished"
        );
        self.emit(ProgressEvent::Complete {
            steps: state.step,
            stop,
        });

        Ok(ReflectionOutcome {
            output: state.generation.take().unwrap_or_default(),
            steps: state.step,
            stop,
            transcript_path,
        })
    }

    async fn drive(
        &self,
        request: &ReflectionRequest,
        state: &mut LoopState,
        mut transcript: Option<&mut TranscriptLog>,
    ) -> Result<StopReason, ReflectError> {
        let capacity = self.config.history_capacity;
        let eviction_index = self.config.eviction_index;

        // Slot 0 holds the system prompt in both histories and is never evicted.
        let mut generation_history = BoundedHistory::new(
            [
                Message::system(prompts::generation_system_prompt(
                    &request.generation_prompt,
                )),
                Message::user(request.user_message.clone()),
            ],
            capacity,
            eviction_index,
        );
        let mut reflection_history = BoundedHistory::new(
            [Message::system(prompts::reflection_system_prompt(
                &request.reflection_prompt,
                &self.config.stop_marker,
            ))],
            capacity,
            eviction_index,
        );

        for step in 1..=request.steps {
            state.step = step;
            state.phase = Phase::Generating;
            self.emit(ProgressEvent::StepStart {
                step,
                max_steps: request.steps,
            });
            tracing::debug!(step, max_steps = request.steps, "generating");

            let completion = self
                .generate(&generation_history, transcript.as_deref_mut())
                .await?;
            // The generator's answer is the critic's input.
            generation_history.append(Message::assistant(completion.clone()))?;
            reflection_history.append(Message::user(completion.clone()))?;
            state.generation = Some(completion);

            state.phase = Phase::Reflecting;
            tracing::debug!(step, "reflecting");
            let reflection = self
                .reflect(&reflection_history, transcript.as_deref_mut())
                .await?;

            if contains_stop_marker(&reflection, &self.config.stop_marker) {
                tracing::info!(step, "Stop marker found, ending reflection loop");
                if let Some(log) = transcript.as_deref_mut() {
                    log.record_stop();
                }
                self.emit(ProgressEvent::StopMarkerFound { step });
                state.reflection = Some(reflection);
                state.phase = Phase::Done(StopReason::StopMarker);
                return Ok(StopReason::StopMarker);
            }

            // And the critique becomes the generator's next user turn.
            generation_history.append(Message::user(reflection.clone()))?;
            reflection_history.append(Message::assistant(reflection.clone()))?;
            state.reflection = Some(reflection);
        }

        tracing::debug!(steps = request.steps, "step budget exhausted");
        state.phase = Phase::Done(StopReason::StepBudgetExhausted);
        Ok(StopReason::StepBudgetExhausted)
    }
}
