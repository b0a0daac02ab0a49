// src/core/types.rs — Core domain types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::history::Capacity;
use crate::infra::config::ReflectionSection;
use crate::infra::errors::ReflectError;

/// Literal substring a critique emits to accept the latest candidate.
pub const STOP_MARKER: &str = "<OK>";

/// Which role produced a completion. Drives transcript headings and
/// console colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionTag {
    Generation,
    Reflection,
    Default,
}

impl CompletionTag {
    /// Heading used in transcripts and console blocks.
    pub fn label(&self) -> &'static str {
        match self {
            CompletionTag::Generation => "GENERATION",
            CompletionTag::Reflection => "REFLECTION",
            CompletionTag::Default => "DEFAULT",
        }
    }
}

impl std::fmt::Display for CompletionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// How a run reached `Done`. Neither variant is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    StopMarker,
    StepBudgetExhausted,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::StopMarker => write!(f, "stop marker"),
            StopReason::StepBudgetExhausted => write!(f, "step budget exhausted"),
        }
    }
}

/// Loop phase, advanced once per completion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Generating,
    Reflecting,
    Done(StopReason),
}

/// Transient per-run state.
#[derive(Debug, Clone)]
pub struct LoopState {
    pub step: usize,
    pub phase: Phase,
    pub generation: Option<String>,
    pub reflection: Option<String>,
}

impl LoopState {
    pub fn new() -> Self {
        Self {
            step: 0,
            phase: Phase::Generating,
            generation: None,
            reflection: None,
        }
    }
}

impl Default for LoopState {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one `run`. `output` is always the last generation; the
/// transcript location is reported alongside it, never instead of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionOutcome {
    pub output: String,
    pub steps: usize,
    pub stop: StopReason,
    pub transcript_path: Option<PathBuf>,
}

/// Inputs to `run` beyond the shared agent configuration.
#[derive(Debug, Clone)]
pub struct ReflectionRequest {
    pub user_message: String,
    pub steps: usize,
    pub generation_prompt: String,
    pub reflection_prompt: String,
}

impl ReflectionRequest {
    pub fn new(user_message: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            steps: 5,
            generation_prompt: String::new(),
            reflection_prompt: String::new(),
        }
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_generation_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.generation_prompt = prompt.into();
        self
    }

    pub fn with_reflection_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.reflection_prompt = prompt.into();
        self
    }
}

/// History shape and stop detection shared by both roles.
#[derive(Debug, Clone)]
pub struct ReflectionConfig {
    pub history_capacity: Capacity,
    pub eviction_index: usize,
    pub stop_marker: String,
}

impl Default for ReflectionConfig {
    fn default() -> Self {
        Self {
            history_capacity: Capacity::Bounded(3),
            eviction_index: 1,
            stop_marker: STOP_MARKER.into(),
        }
    }
}

impl ReflectionConfig {
    /// Checked before the first request of a run.
    ///
    /// An empty marker matches every critique. An eviction index at or past a
    /// bounded capacity would only fail once the history first overflows.
    pub fn validate(&self) -> Result<(), ReflectError> {
        if self.stop_marker.trim().is_empty() {
            return Err(ReflectError::Config("stop marker must not be empty".into()));
        }
        if let Capacity::Bounded(capacity) = self.history_capacity {
            if self.eviction_index >= capacity {
                return Err(ReflectError::Config(format!(
                    "eviction index {} must be below history capacity {}",
                    self.eviction_index, capacity
                )));
            }
        }
        Ok(())
    }
}

impl From<&ReflectionSection> for ReflectionConfig {
    fn from(section: &ReflectionSection) -> Self {
        Self {
            // 0 in the config file means "never evict".
            history_capacity: if section.history_capacity == 0 {
                Capacity::Unbounded
            } else {
                Capacity::Bounded(section.history_capacity)
            },
            eviction_index: section.eviction_index,
            stop_marker: section.stop_marker.clone(),
        }
    }
}

/// Events emitted while a run progresses.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    StepStart { step: usize, max_steps: usize },
    Completion { tag: CompletionTag, content: String },
    StopMarkerFound { step: usize },
    Complete { steps: usize, stop: StopReason },
}
