//! Main Entrypoint for the Interview CLI
//!
//! This binary is responsible for:
//! 1. Parsing arguments and loading configuration from the environment.
//! 2. Initializing logging.
//! 3. Building the generation client and the interview orchestrator.
//! 4. Driving the setup -> answer loop -> feedback flow on the terminal.
//!
//! It is a consumer of the orchestrator's presentation contract: it invokes
//! the operations, re-renders from the session state after each one, and
//! displays returned errors without ever inspecting transcript internals.

use anyhow::Context;
use clap::Parser;
use interview_cli::config::Config;
use interview_core::{
    Interview, InterviewError, Level, Phase, RetryPolicy, Session, Speaker,
    client::{DEFAULT_BASE_URL, GeminiClient},
};
use std::io::{self, Write};
use std::sync::Arc;
use tracing::info;

/// Scripted mock-interview practice against the Gemini API.
#[derive(Parser, Debug)]
#[command(name = "interview", version, about)]
struct Args {
    /// Job role to interview for (prompted interactively when omitted).
    #[arg(long)]
    role: Option<String>,

    /// Candidate level: fresher, intermediate, or experienced.
    #[arg(long, default_value = "fresher")]
    level: Level,

    /// Override the model from the environment configuration.
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();

    let model = args.model.unwrap_or_else(|| config.model.clone());
    info!(model = %model, "configuration loaded");

    if config.api_key.is_none() {
        println!("Warning: no API key found. Set the GEMINI_API_KEY environment variable.");
    }

    let client = Arc::new(GeminiClient::with_options(
        config.api_key,
        model,
        DEFAULT_BASE_URL,
        RetryPolicy::default(),
    ));
    let mut interview = Interview::new(client);

    let role = match args.role {
        Some(role) => role,
        None => loop {
            match read_line("Job role (e.g. Software Engineer): ")? {
                Some(role) if !role.trim().is_empty() => break role,
                Some(_) => println!("Please enter a job role to begin."),
                None => return Ok(()),
            }
        },
    };

    println!();
    println!(
        "Mock interview for the {} role ({} level).",
        role.trim(),
        args.level
    );
    println!("Type END INTERVIEW at any time to finish and get feedback.");
    println!();

    interview
        .start(&role, args.level)
        .await
        .context("could not start the interview")?;
    print_latest_question(interview.session());

    while interview.session().phase() == Phase::Running {
        let Some(answer) = read_line("Your answer: ")? else {
            // stdin closed; wrap up and ask for the evaluation.
            println!();
            if let Err(err) = interview.end().await {
                println!("Error: {err}");
            }
            break;
        };
        match interview.submit_answer(&answer).await {
            Ok(()) => {
                if interview.session().phase() == Phase::Running {
                    print_latest_question(interview.session());
                }
            }
            Err(err @ InterviewError::EmptyAnswer) => println!("{err}"),
            Err(err) => println!("Error: {err}"),
        }
    }

    if let Some(feedback) = interview.session().feedback() {
        println!();
        println!("--- Performance Evaluation ---");
        println!();
        println!("{feedback}");
    }

    Ok(())
}

/// Prints the most recent interviewer question.
fn print_latest_question(session: &Session) {
    if let Some(exchange) = session
        .visible_exchanges()
        .filter(|exchange| exchange.speaker == Speaker::Interviewer)
        .last()
    {
        println!("{}", exchange.text);
        println!();
    }
}

/// Reads one line from stdin, stripped of the trailing newline; `None` on EOF.
fn read_line(prompt: &str) -> anyhow::Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush().context("failed to flush stdout")?;
    let mut line = String::new();
    let bytes = io::stdin()
        .read_line(&mut line)
        .context("failed to read stdin")?;
    if bytes == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
