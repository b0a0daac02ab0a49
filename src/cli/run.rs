// src/cli/run.rs — Default command: run the reflection loop

use crate::core::reflection::ReflectionAgent;
use crate::core::types::{ReflectionConfig, ReflectionRequest};
use crate::infra::config::Config;
use crate::provider::resolver;
use crate::provider::retry::RetryConfig;
use crate::util::preview;

/// Build the provider and agent from config, run one loop, print the result.
pub async fn run_reflection(
    request: ReflectionRequest,
    config: &Config,
    quiet: bool,
) -> anyhow::Result<()> {
    let (provider, model_ref) = resolver::build_provider(&config.model)?;

    let mut agent = ReflectionAgent::new(
        provider,
        model_ref.model.clone(),
        RetryConfig::from(&config.retry),
    )
    .with_config(ReflectionConfig::from(&config.reflection))
    .with_sampling(config.model.max_tokens, config.model.temperature);

    if config.transcript.save {
        agent = agent.with_transcript(config.transcript.resolved_dir());
    } else if !quiet {
        // Buffered runs keep the console quiet; the transcript has the blocks.
        agent = agent.with_progress(super::progress::terminal_progress());
    }

    if !quiet {
        eprintln!(
            "[reflect] {} | model: {} | steps: {}",
            preview(&request.user_message, 60),
            model_ref,
            request.steps,
        );
    }

    let outcome = agent.run(request).await?;

    println!("{}", outcome.output);

    if let Some(ref path) = outcome.transcript_path {
        eprintln!("Transcript saved: {}", path.display());
    }
    tracing::debug!(steps = outcome.steps, stop = %outcome.stop, "run finished");

    Ok(())
}
