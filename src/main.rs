use clap::Parser;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use readmeservice::{logging, Config, ReadmeGenerator, RepositoryReference, Result};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about = "Generate a README for a public GitHub repository")]
struct Cli {
    /// Repository URL or owner/name
    url: String,

    /// Write the README to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file (defaults to <config dir>/readmeservice/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the composed prompt and skip the model call
    #[arg(long)]
    prompt_only: bool,

    /// Log level when RUST_LOG is unset, overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "error:".red().bold(), e.public_message());
        eprintln!("{}", e.to_string().dimmed());
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    logging::init(config.log_level_or(cli.log_level.as_deref()))?;

    let generator = ReadmeGenerator::from_config(&config)?;
    let reference = RepositoryReference::parse(&cli.url)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = if cli.prompt_only {
        spinner.set_message(format!("Inspecting {}", reference));
        generator.build_prompt(&reference).await
    } else {
        spinner.set_message(format!("Generating README for {}", reference));
        generator.generate(&cli.url).await
    };
    spinner.finish_and_clear();
    let text = result?;

    match cli.output {
        Some(path) => {
            tokio::fs::write(&path, &text).await?;
            eprintln!("{} {}", "Saved".green().bold(), path.display());
        }
        None => println!("{}", text),
    }

    Ok(())
}
