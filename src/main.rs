use clap::Parser;
use log::{info, warn};
use std::io::{self, IsTerminal, Read};
use std::sync::Arc;

mod clipboard;
mod config;
mod controller;
mod credentials;
mod error;
mod generation;
mod headless;
mod logger;
mod orchestrator;
mod prompt;
mod providers;
mod ui;

use clipboard::SystemClipboard;
use config::Config;
use controller::UIController;
use credentials::EnvCredential;
use headless::OutputFormat;
use logger::LogSink;
use orchestrator::RequestOrchestrator;
use providers::GeminiProvider;

#[derive(Parser)]
#[command(name = "spec_generator", version, about)]
struct Args {
    /// Generate once, print the result and exit instead of opening the interactive UI
    #[arg(long)]
    headless: bool,
    /// Print the headless result as JSON
    #[arg(long, requires = "headless")]
    json: bool,
    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<String>,
    /// Gemini model to use, overriding the config file
    #[arg(short, long)]
    model: Option<String>,
    /// Write the effective configuration to this path and exit
    #[arg(long, value_name = "PATH")]
    write_config: Option<String>,
    /// Product description (read from stdin in headless mode when omitted)
    #[arg(trailing_var_arg = true)]
    description: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let loaded = Config::load(args.config.as_deref())?;
    let mut config = loaded.config;
    config.merge_with_args(args.model.as_deref());

    if let Some(path) = &args.write_config {
        config.save(shellexpand::tilde(path).as_ref())?;
        println!("Configuration written to {}", path);
        return Ok(());
    }

    colored::control::set_override(config.ui.colorful && (args.headless || io::stdout().is_terminal()));
    let log_path = config.ui.log_path();
    if args.headless {
        logger::init(args.verbose, LogSink::Stderr);
    } else {
        logger::init(args.verbose, LogSink::File(&log_path));
    }
    for (path, e) in &loaded.skipped {
        warn!("Skipped config file {}: {:#}", path.display(), e);
    }
    match &loaded.source {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => info!("No config file found, using defaults"),
    }
    info!("Using model {} at {}", config.gemini.model, config.gemini.base_url);

    let credentials = Arc::new(EnvCredential::new(&config.gemini.api_key_env));
    let generator = Arc::new(GeminiProvider::new(&config.gemini.base_url, credentials));
    let orchestrator = Arc::new(RequestOrchestrator::new(generator, &config.gemini.model));
    let mut controller = UIController::new(Box::new(SystemClipboard::new()));

    let mut description = args.description.join(" ");
    if args.headless {
        if description.is_empty() && !io::stdin().is_terminal() {
            io::stdin().read_to_string(&mut description)?;
        }
        let format = if args.json { OutputFormat::Json } else { OutputFormat::Terminal };
        return headless::run_once(&mut controller, &orchestrator, &description, format).await;
    }

    controller.set_description(description);
    let mut terminal_ui = ui::TerminalUI::new(controller, orchestrator);
    terminal_ui.run().await
}
