use std::fs;
use std::io::Read;

use clap::Parser;
use kosei_cli::cli_args::{CheckArgs, Cli, Command, SecretCommand};
use kosei_core::coordinator::CheckOptions;
use kosei_core::logging::{LoggingDestination, init_logging};
use kosei_core::openrouter::OpenRouterClient;
use kosei_core::{default_csv_filename, load_config, save_config, to_csv, to_text_report};
use rpassword::prompt_password;

#[tokio::main]
async fn main() {
    if let Err(err) = init_logging(LoggingDestination::FileAndStderr) {
        eprintln!("Warning: logging unavailable: {err}");
    }

    let cli = Cli::parse();
    if let Err(err) = dispatch(cli).await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

async fn dispatch(cli: Cli) -> Result<(), String> {
    match cli.command {
        Some(Command::Secret(cmd)) => {
            if !cli.check.is_empty() {
                return Err(
                    "Proofreading flags cannot be combined with secret management commands.".into(),
                );
            }
            handle_secret_command(cmd)
        }
        None => run_proofread(cli.check).await,
    }
}

async fn run_proofread(args: CheckArgs) -> Result<(), String> {
    let load = load_config();
    for warning in &load.warnings {
        eprintln!("Warning: {warning}");
    }
    let config = load.config;

    let text = read_input(args.infile.as_deref())?;

    let options = CheckOptions {
        local: args.local.unwrap_or(config.checks.local),
        remote: args.ai.unwrap_or(config.checks.remote),
        max_line_chars: args.max_line_chars.unwrap_or(config.checks.max_line_chars),
    };

    let client = if options.remote {
        let model = args.model.unwrap_or_else(|| config.review.model.clone());
        match config.review.resolve_api_key() {
            Ok(Some(api_key)) => Some(OpenRouterClient::new(api_key, model)),
            Ok(None) => {
                eprintln!(
                    "Warning: AI review requested but no API key is configured. \
                     Set one with `kosei secret set-open-router-key` or OPENROUTER_API_KEY."
                );
                None
            }
            Err(err) => {
                eprintln!("Warning: could not read the stored API key: {err}");
                None
            }
        }
    } else {
        None
    };

    let outcome = kosei_core::run_check(&text, options, client.as_ref()).await;

    if let Some(err) = &outcome.remote_error {
        eprintln!("Warning: AI review unavailable: {err}");
    }

    print!("{}", to_text_report(&outcome.summary, &outcome.findings));

    if let Some(csv_arg) = args.csv {
        let path = if csv_arg.trim().is_empty() {
            default_csv_filename()
        } else {
            shellexpand::tilde(&csv_arg).into_owned()
        };
        fs::write(&path, to_csv(&outcome.findings))
            .map_err(|err| format!("Failed to write {path}: {err}"))?;
        println!("CSVを保存しました: {path}");
    }

    Ok(())
}

fn read_input(infile: Option<&str>) -> Result<String, String> {
    match infile {
        Some(path) if path != "-" => {
            let expanded = shellexpand::tilde(path).into_owned();
            fs::read_to_string(&expanded).map_err(|err| format!("Failed to read {expanded}: {err}"))
        }
        _ => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|err| format!("Failed to read stdin: {err}"))?;
            Ok(buffer)
        }
    }
}

fn handle_secret_command(command: SecretCommand) -> Result<(), String> {
    let load = load_config();
    for warning in &load.warnings {
        eprintln!("Warning: {warning}");
    }
    let mut config = load.config;

    match command {
        SecretCommand::SetOpenRouterKey { key } => {
            let value = match key {
                Some(v) => v,
                None => prompt_password("Enter OpenRouter API key: ")
                    .map_err(|err| format!("Failed to read API key: {err}"))?,
            };
            config
                .review
                .set_api_key(&value)
                .map_err(|err| err.to_string())?;
            save_config(&config).map_err(|err| err.to_string())?;
            println!("OpenRouter API key saved securely.");
            Ok(())
        }
        SecretCommand::ClearOpenRouterKey => {
            config
                .review
                .clear_api_key()
                .map_err(|err| err.to_string())?;
            save_config(&config).map_err(|err| err.to_string())?;
            println!("Cleared saved OpenRouter API key.");
            Ok(())
        }
        SecretCommand::Status => {
            if config.review.has_api_key() {
                println!("An OpenRouter API key is stored.");
            } else {
                println!("No OpenRouter API key is stored.");
            }
            Ok(())
        }
    }
}
