// src/core/transcript.rs — Per-run transcript buffer
//
// Accumulates one tagged block per completion and is written to disk exactly
// once, when the run ends. `flush` consumes the buffer so a second write is
// impossible.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use super::types::CompletionTag;
use crate::infra::errors::ReflectError;

pub const STOP_NOTICE: &str = "\n\nStop Sequence found. Stopping the reflection loop ... \n\n";

#[derive(Debug, Clone, Default)]
pub struct TranscriptLog {
    blocks: Vec<String>,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, tag: CompletionTag, content: &str) {
        self.blocks.push(format!("\n\n{}\n\n{}", tag.label(), content));
    }

    pub fn record_stop(&mut self) {
        self.blocks.push(STOP_NOTICE.to_string());
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// All blocks concatenated in call order.
    pub fn render(&self) -> String {
        self.blocks.concat()
    }

    /// Write the transcript to `<dir>/<model>_<YYYYmmdd_HHMMSS>.log`.
    pub fn flush(self, dir: &Path, model: &str) -> Result<PathBuf, ReflectError> {
        self.flush_at(dir, model, Local::now())
    }

    fn flush_at(
        self,
        dir: &Path,
        model: &str,
        timestamp: DateTime<Local>,
    ) -> Result<PathBuf, ReflectError> {
        std::fs::create_dir_all(dir)?;

        let stem = file_stem(model, &timestamp);
        let mut path = dir.join(format!("{stem}.log"));
        let mut n = 1;
        while path.exists() {
            path = dir.join(format!("{stem}_{n}.log"));
            n += 1;
        }

        std::fs::write(&path, self.render())?;
        tracing::info!(path = %path.display(), blocks = self.blocks.len(), "Transcript saved");
        Ok(path)
    }
}

/// Model ids may contain path separators (`org/model`); keep the name flat.
fn file_stem(model: &str, timestamp: &DateTime<Local>) -> String {
    let model: String = model
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    format!("{}_{}", model, timestamp.format("%Y%m%d_%H%M%S"))
}
