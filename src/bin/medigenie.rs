use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::*;
use medigenie::config::Config;
use medigenie::consultation::{
    AgeGroup, BloodPressure, ConsultationRequest, DurationDays, Gender, Severity, Symptom,
    Temperature,
};
use medigenie::secret_store::{self, SecretStore};
use medigenie::web::{views, Server};
use medigenie::Bridge;
use spinners::{Spinner, Spinners};

/// Command line arguments for the MediGenie CLI
#[derive(Parser)]
#[clap(
    name = "medigenie",
    about = "AI health assistant: collect symptoms, ask Gemini for a short recommendation"
)]
struct CliArgs {
    #[command(subcommand)]
    command: Option<Command>,

    /// Model name to use
    #[arg(long, global = true)]
    model: Option<String>,

    /// API key for Google Gemini (overrides GOOGLE_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Base URL for the API
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the consultation form over HTTP (default)
    Serve {
        /// Address to listen on
        #[arg(long)]
        addr: Option<String>,
    },
    /// Fill in the form from flags and print the recommendation
    Ask {
        /// Symptom, repeatable (e.g. --symptom fever --symptom sore-throat)
        #[arg(long = "symptom")]
        symptoms: Vec<Symptom>,
        #[arg(long, default_value = "child")]
        age: AgeGroup,
        #[arg(long, default_value = "male")]
        gender: Gender,
        /// Temperature in °F, clamped to 95.0-110.0
        #[arg(long, default_value_t = 98.6, allow_negative_numbers = true)]
        temperature: f64,
        #[arg(long, default_value = "low")]
        bp: BloodPressure,
        /// Duration of symptoms in days, clamped to 1-30
        #[arg(long, default_value_t = 5, allow_negative_numbers = true)]
        duration: i64,
        /// Severity, clamped to 1-5
        #[arg(long, default_value_t = 3, allow_negative_numbers = true)]
        severity: i64,
        /// Print the prompt without calling the service
        #[arg(long)]
        dry_run: bool,
    },
    /// Manage the stored Google API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    /// Store a key in ~/.medigenie/secrets.json
    Set { value: String },
    /// Show the stored key, masked
    Get,
    /// Remove the stored key
    Delete,
}

fn build_config(args: &CliArgs) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = Config::from_env()?;
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(key) = &args.api_key {
        config.api_key = Some(key.clone());
    }
    if let Some(url) = &args.base_url {
        config.base_url = Some(url.clone());
    }
    if args.timeout.is_some() {
        config.timeout_seconds = args.timeout;
    }
    Ok(config)
}

fn run_key(action: KeyAction) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut store = SecretStore::new()?;
    match action {
        KeyAction::Set { value } => {
            store.set(secret_store::GOOGLE_API_KEY, &value)?;
            println!(
                "{} Key stored in {}",
                "✓".bright_green(),
                store.path().display()
            );
        }
        KeyAction::Get => match store.get(secret_store::GOOGLE_API_KEY) {
            Some(value) => println!("GOOGLE_API_KEY: {}", secret_store::mask(value)),
            None => println!("{} No key stored", "!".bright_yellow()),
        },
        KeyAction::Delete => {
            store.delete(secret_store::GOOGLE_API_KEY)?;
            println!("{} Key deleted", "✓".bright_green());
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_ask(
    config: &Config,
    request: ConsultationRequest,
    dry_run: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let bridge = Bridge::from_config(config)?;

    if dry_run {
        print!("{}", bridge.prompt_for(&request));
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", "Entered Patient Details".bright_cyan());
    for (label, value) in views::details(&request) {
        println!("- {} {}", format!("{}:", label).bold(), value);
    }
    println!("{}", "─".repeat(50).bright_black());

    let mut sp = Spinner::new(Spinners::Dots12, "Consulting AI...".bright_magenta().to_string());
    let result = bridge.get_recommendation(&request).await;
    sp.stop();
    print!("\r\x1B[K");

    match result {
        Ok(reply) => {
            println!("{}", "AI Recommendation".bright_green());
            println!("{}", reply.text);
            println!("{}", "─".repeat(50).bright_black());
            println!("{}", views::FOOTER.bright_black());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".bright_red(), e);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Main entry point for the MediGenie CLI
#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Before logging so RUST_LOG can come from .env too.
    medigenie::config::load_dotenv();
    medigenie::init_logging();
    let mut args = CliArgs::parse();

    match args.command.take() {
        Some(Command::Key { action }) => run_key(action),
        Some(Command::Ask {
            symptoms,
            age,
            gender,
            temperature,
            bp,
            duration,
            severity,
            dry_run,
        }) => {
            let request = ConsultationRequest {
                age_group: age,
                gender,
                temperature: Temperature::clamped(temperature),
                blood_pressure: bp,
                duration_days: DurationDays::clamped(duration),
                severity: Severity::clamped(severity),
                ..Default::default()
            }
            .with_symptoms(symptoms);
            run_ask(&build_config(&args)?, request, dry_run).await
        }
        Some(Command::Serve { addr }) => serve(build_config(&args)?, addr).await,
        None => serve(build_config(&args)?, None).await,
    }
}

async fn serve(
    config: Config,
    addr: Option<String>,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let addr = addr.unwrap_or_else(|| config.addr.clone());
    let bridge = Bridge::from_config(&config)?;
    println!(
        "{} serving on {}",
        "MediGenie".bright_cyan(),
        format!("http://{}", addr).bright_green()
    );
    Server::new(bridge).run(&addr).await?;
    Ok(ExitCode::SUCCESS)
}
