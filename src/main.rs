//! DeepVision Contact - website contact form submission
//!
//! Sends the contact form to the hosted form intake service and, once the
//! intake accepts it, hands the visitor over to a pre-filled chat conversation.
//! - Validates the draft locally before anything is sent
//! - Reports intake rejections and network failures without retrying
//! - Runs as a one-shot command, an interactive prompt, or a local web page

mod api_routes;
mod compose;
mod config;
mod controller;
mod form;
mod handoff;
mod intake;
mod server;

use crate::config::Config;
use crate::controller::SubmissionController;
use crate::form::{DraftRecord, Field};
use crate::handoff::{BrowserLauncher, ChatHandoff, DeferredLauncher, LinkLauncher};
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::io::{self, IsTerminal};

const DEFAULT_UI_PORT: u16 = 3000;

/// DeepVision Contact - send a message to the DeepVision Solution team
#[derive(Parser)]
#[command(name = "deepvision-contact")]
#[command(author = "DeepVision Solution")]
#[command(version)]
#[command(about = "Send the website contact form and continue the conversation in chat")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill in the contact form interactively (default)
    Compose {
        /// Do not open the chat link after a successful submission
        #[arg(long, default_value_t = false)]
        no_open: bool,
    },

    /// Submit the contact form in one go
    Submit {
        #[command(flatten)]
        fields: DraftArgs,

        /// Do not open the chat link after a successful submission
        #[arg(long, default_value_t = false)]
        no_open: bool,
    },

    /// Print the chat link for a message without submitting it
    Link {
        #[command(flatten)]
        fields: DraftArgs,
    },

    /// Start the local contact page
    Ui {
        /// Port to run the server on
        #[arg(short, long, default_value_t = DEFAULT_UI_PORT)]
        port: u16,

        /// Do not auto-open the browser
        #[arg(long, default_value_t = false)]
        no_open: bool,
    },

    /// Show configuration and data paths
    Config,
}

#[derive(Args)]
struct DraftArgs {
    /// Your name
    #[arg(short, long, default_value = "")]
    name: String,

    /// Email address we should reply to
    #[arg(short, long, default_value = "")]
    email: String,

    /// Phone number
    #[arg(short, long, default_value = "")]
    phone: String,

    /// What the message is about
    #[arg(short, long, default_value = "")]
    subject: String,

    /// The message itself
    #[arg(short, long, default_value = "")]
    message: String,
}

impl From<DraftArgs> for DraftRecord {
    fn from(args: DraftArgs) -> Self {
        DraftRecord::reset()
            .update(Field::Name, args.name)
            .update(Field::Email, args.email)
            .update(Field::Phone, args.phone)
            .update(Field::Subject, args.subject)
            .update(Field::Message, args.message)
    }
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Some(Commands::Compose { no_open }) => run_compose(&config, no_open)?,
        None => {
            if !io::stdin().is_terminal() {
                println!(
                    "{}",
                    "No terminal attached. Use `deepvision-contact submit --help` for one-shot submission."
                        .bright_yellow()
                );
                return Ok(());
            }
            run_compose(&config, false)?;
        }
        Some(Commands::Submit { fields, no_open }) => {
            let rt = tokio::runtime::Runtime::new()?;
            let controller = SubmissionController::from_config(&config, launcher_for(no_open));
            compose::run_quick_submit(&rt, &controller, fields.into())?;
        }
        Some(Commands::Link { fields }) => {
            let handoff = ChatHandoff::from_config(&config.chat);
            println!("{}", handoff.url(&fields.into()));
        }
        Some(Commands::Ui { port, no_open }) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(server::start_server(&config, port, !no_open))?;
        }
        Some(Commands::Config) => {
            show_config_info()?;
        }
    }

    Ok(())
}

fn run_compose(config: &Config, no_open: bool) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let controller = SubmissionController::from_config(config, launcher_for(no_open));
    compose::run_compose_flow(&rt, &controller, &mut io::stdin().lock())
}

fn launcher_for(no_open: bool) -> Box<dyn LinkLauncher> {
    if no_open {
        Box::new(DeferredLauncher)
    } else {
        Box::new(BrowserLauncher)
    }
}

/// Logs go to stderr so they never mix with prompts.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("deepvision_contact=info,warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn show_config_info() -> Result<()> {
    println!("{}", "DeepVision Contact Configuration\n".bright_cyan().bold());

    match config::get_config_path() {
        Ok(path) => {
            println!("{} {}", "Config file:".bright_yellow(), path.bright_white());
            if std::path::Path::new(&path).exists() {
                println!("  {} {}", "Status:".bright_cyan(), "Exists".bright_green());
            } else {
                println!(
                    "  {} {}",
                    "Status:".bright_cyan(),
                    "Not created yet (will use defaults)".bright_yellow()
                );
            }
        }
        Err(e) => {
            println!(
                "{} Could not determine config path: {}",
                "Error:".bright_red(),
                e
            );
        }
    }

    let cfg = match config::init_config() {
        Ok(cfg) => cfg,
        Err(err) => {
            println!(
                "  {} {}",
                "Note:".bright_yellow(),
                format!("Could not create config file yet: {}", err).bright_black()
            );
            Config::load().unwrap_or_default()
        }
    };

    let intake = intake::IntakeClient::from_config(&cfg);
    println!("\n{}", "Intake settings:".bright_white().bold());
    println!(
        "  {} {}",
        "Endpoint:".bright_cyan(),
        intake.endpoint().bright_white()
    );
    println!(
        "  {} {}",
        "Timeout:".bright_cyan(),
        cfg.intake
            .timeout_seconds
            .map(|s| format!("{s}s"))
            .unwrap_or_else(|| "transport default".to_string())
            .bright_white()
    );
    println!(
        "  {} {}",
        "Verify SSL:".bright_cyan(),
        cfg.intake.verify_ssl.to_string().bright_white()
    );

    println!("\n{}", "Chat handoff:".bright_white().bold());
    println!(
        "  {} {}",
        "Link preview:".bright_cyan(),
        ChatHandoff::from_config(&cfg.chat)
            .url(&DraftRecord::reset())
            .bright_white()
    );
    println!(
        "  {} {}",
        "Open after success:".bright_cyan(),
        cfg.chat.open_after_success.to_string().bright_white()
    );

    println!("\n{}", "Form:".bright_white().bold());
    println!(
        "  {} {:?}",
        "Phone field:".bright_cyan(),
        cfg.form.phone
    );

    Ok(())
}
