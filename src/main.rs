use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ez_commit::config::{ConfigStore, Field};
use ez_commit::openai::MessageGenerator;
use ez_commit::ui::{self, TerminalPrompter};
use ez_commit::workflow::{CommitWorkflow, Outcome};
use ez_commit::{git, EzCommitError};

/// Generate commit messages from git diffs using OpenAI.
#[derive(Parser)]
#[command(name = "ez-commit", author, version, about, long_about = None)]
struct Cli {
    /// Preview the commit message without committing
    #[arg(long)]
    preview: bool,

    /// Use this configuration file instead of the default location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Manage ez-commit configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Set the OpenAI API key
    SetApiKey { key: String },
    /// Set the model (e.g. gpt-4, gpt-4o-mini)
    SetModel { model: String },
    /// Set the temperature (0.0 to 1.0) for response generation
    SetTemperature {
        #[arg(allow_hyphen_values = true)]
        temperature: String,
    },
    /// Set the maximum number of tokens to generate
    SetMaxTokens { max_tokens: String },
    /// Edit the system prompt in your editor
    EditPrompt,
    /// Show current configuration (the API key is masked)
    Show,
    /// Open the configuration file in your editor
    Edit,
    /// Reset the configuration to defaults
    Reset,
    /// Print the configuration file location
    Path,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            ui::display_error(&format!("{:#}", err));
            let code = err
                .downcast_ref::<EzCommitError>()
                .map(EzCommitError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "ez_commit=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let store = match cli.config {
        Some(path) => ConfigStore::new(path),
        None => ConfigStore::open_default()?,
    };

    match cli.command {
        Some(Command::Config { action }) => {
            configure(&store, action)?;
            Ok(ExitCode::SUCCESS)
        }
        None => commit(&store, cli.preview).await,
    }
}

async fn commit(store: &ConfigStore, preview: bool) -> Result<ExitCode> {
    let settings = store.get()?;
    let repo = git::open_repository().context("Not a git repository")?;
    let generator = MessageGenerator::new(&settings)?;

    let outcome = CommitWorkflow::new(&repo, &generator, TerminalPrompter)
        .preview(preview)
        .run()
        .await?;

    match outcome {
        Outcome::Previewed { .. } => Ok(ExitCode::SUCCESS),
        Outcome::Committed { oid, .. } => {
            ui::display_success(&format!("Changes committed successfully! ({:.7})", oid));
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Aborted => {
            ui::display_info("Commit cancelled.");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn configure(store: &ConfigStore, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::SetApiKey { key } => {
            store.set(Field::ApiKey, &key)?;
            ui::display_success("API key updated successfully!");
        }
        ConfigAction::SetModel { model } => {
            let settings = store.set(Field::Model, &model)?;
            ui::display_success(&format!("Model updated to: {}", settings.model));
        }
        ConfigAction::SetTemperature { temperature } => {
            let settings = store.set(Field::Temperature, &temperature)?;
            ui::display_success(&format!("Temperature updated to: {}", settings.temperature));
        }
        ConfigAction::SetMaxTokens { max_tokens } => {
            let settings = store.set(Field::MaxTokens, &max_tokens)?;
            ui::display_success(&format!("Max tokens updated to: {}", settings.max_tokens));
        }
        ConfigAction::EditPrompt => {
            ui::display_info("Opening editor to modify system prompt...");
            store.edit_prompt()?;
            ui::display_success("System prompt updated successfully!");
        }
        ConfigAction::Show => {
            let settings = store.get()?;
            ui::display_config(&settings);
        }
        ConfigAction::Edit => {
            ui::display_info(&format!("Opening config file: {}", store.path().display()));
            store.edit()?;
            ui::display_success("Configuration updated successfully!");
        }
        ConfigAction::Reset => {
            ui::display_config(&store.get()?);
            if ui::confirm("Reset to the default configuration?")? {
                let settings = store.reset()?;
                ui::display_success("Configuration reset to defaults.");
                ui::display_config(&settings);
            } else {
                ui::display_info("Reset cancelled.");
            }
        }
        ConfigAction::Path => println!("{}", store.path().display()),
    }
    Ok(())
}
