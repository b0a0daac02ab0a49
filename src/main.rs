// src/main.rs — reflect entry point

use clap::Parser;

use reflection_agent::cli::Cli;
use reflection_agent::core::types::ReflectionRequest;
use reflection_agent::infra::config::Config;
use reflection_agent::infra::logger;

#[tokio::main]
async fn main() {
    // Initialize logging (respects RUST_LOG)
    logger::init_logging("warn");

    if let Err(e) = run().await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // A missing .env is fine; the environment may already carry the key.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            tracing::warn!("Could not load .env: {e}");
        }
    }

    let cli = Cli::parse();

    let mut config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };
    cli.apply_overrides(&mut config);

    let message = build_message(&cli)?;
    let request = ReflectionRequest::new(message)
        .with_steps(config.reflection.steps)
        .with_generation_prompt(cli.generation_prompt.clone())
        .with_reflection_prompt(cli.reflection_prompt.clone());

    reflection_agent::cli::run::run_reflection(request, &config, cli.quiet).await
}

/// Build the user message from CLI args and/or stdin.
///
/// Positional words form the message. With `--stdin`, or when stdin is piped,
/// the piped text is appended after the words (or used alone).
fn build_message(cli: &Cli) -> anyhow::Result<String> {
    use std::io::IsTerminal;

    let has_args = !cli.message.is_empty();
    let stdin_is_pipe = !std::io::stdin().is_terminal();

    if cli.stdin || (stdin_is_pipe && !has_args) {
        let content = read_stdin()?;
        if has_args {
            return Ok(format!("{}\n\n---\n\n{}", cli.message.join(" "), content));
        }
        return Ok(content);
    }

    if has_args {
        return Ok(cli.message.join(" "));
    }

    anyhow::bail!("No message provided. Usage: reflect <message> (see --help)")
}

fn read_stdin() -> anyhow::Result<String> {
    use std::io::Read;
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    if buf.trim().is_empty() {
        anyhow::bail!("No input received on stdin");
    }
    Ok(buf)
}
