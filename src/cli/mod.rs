// src/cli/mod.rs — CLI definition (clap derive)

pub mod progress;
pub mod run;

use clap::Parser;

use crate::infra::config::Config;

#[derive(Parser)]
#[command(
    name = "reflect",
    about = "Generate an answer, critique it, and revise until the critic is satisfied",
    version
)]
pub struct Cli {
    /// Message for the generator
    #[arg(trailing_var_arg = true)]
    pub message: Vec<String>,

    /// Max generate/reflect cycles
    #[arg(short, long)]
    pub steps: Option<usize>,

    /// Model identifier sent to the endpoint
    #[arg(short, long)]
    pub model: Option<String>,

    /// Use the local OpenAI-compatible endpoint instead of the hosted API
    #[arg(long)]
    pub local: bool,

    /// Write completions to a transcript file instead of the console
    #[arg(long)]
    pub save_logs: bool,

    /// Transcript directory (implies --save-logs)
    #[arg(long)]
    pub log_dir: Option<String>,

    /// Extra instructions prepended to the generator's base prompt
    #[arg(short = 'g', long, default_value = "")]
    pub generation_prompt: String,

    /// Extra instructions prepended to the critic's base prompt
    #[arg(short = 'r', long, default_value = "")]
    pub reflection_prompt: String,

    /// Read the message from stdin
    #[arg(long)]
    pub stdin: bool,

    /// Suppress progress output (only emit final result)
    #[arg(short, long)]
    pub quiet: bool,

    /// Config file path
    #[arg(long)]
    pub config: Option<String>,
}

impl Cli {
    /// Fold command-line flags over the loaded config.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(steps) = self.steps {
            config.reflection.steps = steps;
        }
        if let Some(ref model) = self.model {
            config.model.name = model.clone();
        }
        if self.local {
            config.model.local = true;
        }
        if self.save_logs {
            config.transcript.save = true;
        }
        if let Some(ref dir) = self.log_dir {
            config.transcript.save = true;
            config.transcript.dir = Some(dir.clone());
        }
    }
}
