use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{ClientError, ControllerOptions, HttpApi, SessionController};
use shared::domain::AiMode;
use storage::Storage;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod config;
mod renderer;

use renderer::{settings_summary, ConsoleRenderer};

#[derive(Parser, Debug)]
#[command(name = "assistant-cli", about = "Terminal client for the personal assistant API")]
struct Cli {
    /// Config file; defaults to ./assistant.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    server_url: Option<String>,
    #[arg(long, global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "ASSISTANT_PASSWORD", hide_env_values = true, default_value = "")]
        password: String,
    },
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "ASSISTANT_PASSWORD", hide_env_values = true, default_value = "")]
        password: String,
        #[arg(long, default_value = "")]
        full_name: String,
    },
    Logout,
    Status,
    /// Sends each message in turn; reads one message per stdin line when none are given.
    Chat { messages: Vec<String> },
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    Show,
    Set {
        #[arg(long)]
        ai_mode: Option<AiMode>,
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        telegram_bot_token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = config::load_settings(cli.config.as_deref())?;
    if let Some(server_url) = cli.server_url {
        settings.server_url = server_url;
    }
    if let Some(database_url) = cli.database_url {
        settings.database_url = database_url;
    }
    let database_url = config::normalize_database_url(&settings.database_url);
    let api = HttpApi::new(&settings.server_url).context("invalid server url")?;
    info!(server_url = %api.base_url(), database_url = %database_url, "cli: starting");

    let storage = Storage::new(&database_url)
        .await
        .context("failed to open client state")?;
    let controller = SessionController::new(
        api,
        Arc::new(storage),
        Arc::new(ConsoleRenderer),
        ControllerOptions {
            toast_duration: settings.toast_duration(),
            main_view_delay: settings.main_view_delay(),
        },
    )
    .await
    .context("failed to restore session")?;
    controller.start().await;

    run(cli.command, &controller).await
}

async fn run(command: Command, controller: &SessionController) -> Result<ExitCode> {
    match command {
        Command::Login { username, password } => {
            Ok(exit_code(controller.login(&username, &password).await))
        }
        Command::Register {
            email,
            password,
            full_name,
        } => {
            controller.show_register_form().await;
            Ok(exit_code(
                controller.register(&full_name, &email, &password).await,
            ))
        }
        Command::Logout => {
            controller.logout().await.context("failed to log out")?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Status => status(controller).await,
        Command::Chat { messages } => chat(controller, messages).await,
        Command::Settings { action } => settings(controller, action).await,
    }
}

async fn status(controller: &SessionController) -> Result<ExitCode> {
    if !controller.is_authenticated().await {
        println!("signed out");
        return Ok(ExitCode::SUCCESS);
    }
    match controller.whoami().await {
        Ok(profile) => {
            match profile.full_name.as_deref().filter(|name| !name.is_empty()) {
                Some(name) => println!("signed in as {} ({name})", profile.email),
                None => println!("signed in as {}", profile.email),
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("session could not be verified: {err}");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn chat(controller: &SessionController, messages: Vec<String>) -> Result<ExitCode> {
    if !controller.is_authenticated().await {
        return Ok(report_failure(&ClientError::Unauthenticated));
    }

    if !messages.is_empty() {
        for message in messages {
            if let Err(err) = controller.send_chat(&message).await {
                return Ok(report_failure(&err));
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if let Err(err) = controller.send_chat(&line).await {
            return Ok(report_failure(&err));
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn settings(controller: &SessionController, action: SettingsAction) -> Result<ExitCode> {
    if !controller.is_authenticated().await {
        return Ok(report_failure(&ClientError::Unauthenticated));
    }
    // The form must hold the server values before any edit, since saving
    // always sends every field. `start` has usually fetched them already.
    if !controller.settings_synced().await && controller.load_settings().await.is_none() {
        eprintln!("could not load settings from the server");
        return Ok(ExitCode::FAILURE);
    }

    match action {
        SettingsAction::Show => {}
        SettingsAction::Set {
            ai_mode,
            api_key,
            telegram_bot_token,
        } => {
            if let Some(mode) = ai_mode {
                controller.set_ai_mode(mode).await;
            }
            if let Some(api_key) = api_key {
                controller.set_api_key(&api_key).await;
            }
            if let Some(token) = telegram_bot_token {
                controller.set_telegram_bot_token(&token).await;
            }
            if let Err(err) = controller.save_settings().await {
                return Ok(report_failure(&err));
            }
        }
    }

    let form = controller.settings_form().await;
    let bot = controller.bot_status().await;
    println!("{}", settings_summary(&form, bot.as_ref()));
    Ok(ExitCode::SUCCESS)
}

fn exit_code<T>(result: Result<T, ClientError>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => report_failure(&err),
    }
}

fn report_failure(err: &ClientError) -> ExitCode {
    match err {
        ClientError::Unauthenticated => {
            eprintln!("not signed in; run `assistant-cli login` first")
        }
        ClientError::AlreadyAuthenticated => {
            eprintln!("already signed in; run `assistant-cli logout` first")
        }
        // Everything else has already been rendered as a toast or alert.
        _ => debug!(error = %err, "cli: command failed"),
    }
    ExitCode::FAILURE
}
