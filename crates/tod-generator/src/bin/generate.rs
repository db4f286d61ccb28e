//! CLI for generating a single card.
//!
//! # Usage
//!
//! ```bash
//! # A spicy question from Gemini
//! GEMINI_API_KEY=... cargo run -p tod-generator --bin tod-generate -- \
//!     --type question --level spicy
//!
//! # A task from Claude, one attempt only
//! CLAUDE_API_KEY=... cargo run -p tod-generator --bin tod-generate -- \
//!     --type dare --level introductory --provider claude --attempts-max 1
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tod_core::{CardRequest, MemoryDedupStore, CATEGORY_CHARS_MAX_DEFAULT};
use tod_generator::{
    load_assets, CardGenerator, GeneratorConfig, Provider, ProviderKind, ProviderSettings,
    TokioPause,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tod-generate")]
#[command(version, about = "Generate one couples truth-or-dare card")]
struct Args {
    /// Content type: question/truth or task/dare
    #[arg(long = "type")]
    content_type: String,

    /// Difficulty: introductory, spicy or bold_sexy
    #[arg(long)]
    level: String,

    /// Free-text category
    #[arg(long, default_value = "general")]
    category: String,

    /// Provider: gemini or claude
    #[arg(long, default_value = "gemini")]
    provider: String,

    /// Maximum provider calls
    #[arg(long)]
    attempts_max: Option<u32>,

    /// Rule set override (TOML)
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Fallback catalog override (TOML)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Print only the card
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let request = CardRequest::parse(
        &args.content_type,
        &args.level,
        &args.category,
        CATEGORY_CHARS_MAX_DEFAULT,
    )?;

    let kind = ProviderKind::parse(&args.provider)
        .ok_or_else(|| anyhow!("Unknown provider: {}", args.provider))?;
    let settings = ProviderSettings::from_env(kind);
    let provider = Provider::from_settings(&settings)
        .with_context(|| format!("Make sure {} is set", kind.api_key_env()))?;

    let (validator, catalog) = load_assets(args.rules.as_deref(), args.catalog.as_deref())?;

    let mut config = GeneratorConfig::default();
    if let Some(max) = args.attempts_max {
        config.attempts_max = max.max(1);
    }

    let generator = CardGenerator::new(provider, TokioPause, validator, catalog, config);
    let dedup = MemoryDedupStore::new();

    if !args.quiet {
        println!("Couples Truth-or-Dare Generator");
        println!("===============================");
        println!();
        println!("Type: {}", request.content_type.name());
        println!("Level: {}", request.difficulty_level.name());
        println!("Category: {}", request.category);
        println!("Provider: {}", kind.name());
        println!();
    }

    let outcome = generator.generate(&request, &dedup).await;

    if args.quiet {
        println!("{}", outcome.card.text);
    } else {
        println!("{}", outcome.format_summary());
        println!("Card:");
        println!("=====");
        println!();
        println!("{}", outcome.card.text);
    }

    Ok(())
}
