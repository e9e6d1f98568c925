//! gavel - chat with the auction agents through the supervisor

mod chat;
mod commands;
mod config;
mod session;
mod utils;

use chat::{ChatReply, ChatSessions};
use clap::Parser;
use gavel_agent::{ConversationState, LastAgent, Orchestrator, OrchestratorEvent, Route};
use gavel_ai::AgentKind;
use session::SessionLog;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

/// gavel - auction assistant backed by an API agent and a SQL agent
#[derive(Parser, Debug)]
#[command(name = "gavel")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// User id sent to the agents (default: config user_id, then "1")
    #[arg(short, long)]
    user_id: Option<String>,

    /// Run in non-interactive mode with a single message
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// API agent endpoint (overrides config and GAVEL_API_AGENT_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// SQL agent endpoint (overrides config and GAVEL_SQL_AGENT_URL)
    #[arg(long)]
    sql_url: Option<String>,

    /// Email forwarded to the agents (overrides config [user].email)
    #[arg(long)]
    email: Option<String>,

    /// Username forwarded to the agents (overrides config [user].username)
    #[arg(long)]
    username: Option<String>,

    /// First name forwarded to the agents (overrides config [user].first_name)
    #[arg(long)]
    first_name: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Resume a previous chat by ID
    #[arg(long)]
    resume: Option<String>,

    /// List saved chats
    #[arg(long)]
    sessions: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

const FAILURE_MESSAGE: &str = "Sorry, neither agent could handle that request right now.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so replies on stdout stay clean
    let filter = if args.verbose {
        EnvFilter::new("gavel_cli=debug,gavel_agent=debug,gavel_ai=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // List sessions and exit
    if args.sessions {
        return list_sessions();
    }

    let cfg = config::Config::load();

    let orchestrator = match build_orchestrator(&cfg, args.api_url, args.sql_url) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            eprintln!("Set the agent URLs with --api-url/--sql-url, the");
            eprintln!("GAVEL_API_AGENT_URL/GAVEL_SQL_AGENT_URL variables, or: gavel --init-config");
            std::process::exit(1);
        }
    };

    let user_id = args
        .user_id
        .or(cfg.user_id.clone())
        .unwrap_or_else(|| "1".to_string());

    let profile = cfg
        .user
        .clone()
        .with_overrides(args.email, args.username, args.first_name);

    let chats = ChatSessions::new();

    // Non-interactive mode
    if let Some(command) = args.command {
        let chat_id = chats.create(profile.new_chat(user_id));
        return run_command(&chats, &chat_id, &command, &orchestrator).await;
    }

    // Resume or start a transcript-backed chat
    let (chat_id, log) = if let Some(ref id) = args.resume {
        match SessionLog::load(id) {
            Ok((log, saved_user, messages)) => {
                println!("Resuming chat {} ({} messages)", id, messages.len());
                let state = ConversationState::restore(saved_user.clone(), messages)
                    .with_metadata(profile.new_chat(saved_user).metadata());
                chats.insert(id.clone(), state);
                (id.clone(), Some(log))
            }
            Err(e) => {
                eprintln!("Error loading session: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        let chat_id = chats.create(profile.new_chat(user_id.clone()));
        let log = open_log(&chat_id, &user_id);
        (chat_id, log)
    };

    run_interactive(&chats, chat_id, log, &profile, &orchestrator).await
}

fn build_orchestrator(
    cfg: &config::Config,
    api_url: Option<String>,
    sql_url: Option<String>,
) -> Result<Orchestrator, gavel_ai::Error> {
    let api = cfg.api_agent.build(AgentKind::Api, api_url)?;
    let sql = cfg.sql_agent.build(AgentKind::Sql, sql_url)?;
    tracing::debug!(api = %api.endpoint(), sql = %sql.endpoint(), "Agents configured");

    Ok(Orchestrator::new(Arc::new(api), Arc::new(sql)).with_classifier(cfg.fallback.classifier()))
}

fn open_log(chat_id: &str, user_id: &str) -> Option<SessionLog> {
    match SessionLog::create(chat_id, user_id) {
        Ok(log) => Some(log),
        Err(e) => {
            tracing::warn!("Transcript disabled: {}", e);
            None
        }
    }
}

/// Print stage progress from supervisor events
fn spawn_progress(mut receiver: broadcast::Receiver<OrchestratorEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(OrchestratorEvent::StageEnd {
                    agent,
                    error: Some(error),
                    ..
                }) => {
                    eprintln!("[{} agent failed: {}]", agent, error.message);
                }
                Ok(OrchestratorEvent::FallbackDecision {
                    route: Route::ContinueToSql,
                    matched,
                }) => {
                    if matched.is_empty() {
                        eprintln!("[Asking the sql agent...]");
                    } else {
                        eprintln!("[Asking the sql agent ({})...]", matched.join(", "));
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn print_reply(reply: &ChatReply) {
    if !reply.answered && reply.error.is_some() {
        println!("{}", FAILURE_MESSAGE);
        return;
    }

    match reply.last_agent_used {
        LastAgent::Api => println!("[api] {}", reply.message),
        LastAgent::Sql => println!("[sql] {}", reply.message),
        LastAgent::None => println!("{}", reply.message),
    }
}

async fn run_command(
    chats: &ChatSessions,
    chat_id: &str,
    command: &str,
    orchestrator: &Orchestrator,
) -> anyhow::Result<()> {
    println!("gavel> {}", command);
    println!();

    let progress = spawn_progress(orchestrator.subscribe());
    let reply = chats.send(chat_id, command, orchestrator).await?;

    // Wait a bit for final events
    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    progress.abort();

    print_reply(&reply);
    Ok(())
}

async fn run_interactive(
    chats: &ChatSessions,
    mut chat_id: String,
    mut log: Option<SessionLog>,
    profile: &config::UserProfile,
    orchestrator: &Orchestrator,
) -> anyhow::Result<()> {
    use std::io::{self, Write};

    let progress = spawn_progress(orchestrator.subscribe());

    // Show minimal startup info (only if TTY)
    if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        eprintln!("gavel chat: {}", chat_id.chars().take(8).collect::<String>());
        eprintln!("Type /help for commands.");
        eprintln!();
    }

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        // Handle slash commands
        if input.starts_with('/') {
            let state = chats.state(&chat_id)?;
            let history = chats.history(&chat_id)?;
            if let Some(result) = commands::execute_command(input, &state, &history) {
                match result {
                    commands::CommandResult::Clear => {
                        let user_id = state.user_id().to_string();
                        chat_id = chats.create(profile.new_chat(user_id.clone()));
                        log = open_log(&chat_id, &user_id);
                        println!("Cleared conversation.");
                    }
                    commands::CommandResult::Exit => {
                        break;
                    }
                    commands::CommandResult::Message(msg) => {
                        println!("{}", msg);
                    }
                    commands::CommandResult::Unknown(cmd) => {
                        println!("Unknown command: /{}", cmd);
                        println!("Type /help for available commands.");
                    }
                }
                continue;
            }
        }

        let before = chats.state(&chat_id)?.messages().len();
        let reply = chats.send(&chat_id, input, orchestrator).await?;
        print_reply(&reply);

        if let Some(log) = log.as_mut() {
            let state = chats.state(&chat_id)?;
            for message in &state.messages()[before..] {
                if let Err(e) = log.append_message(message) {
                    tracing::warn!(chat_id = %chat_id, "Failed to save message: {}", e);
                }
            }
        }
    }

    progress.abort();
    if let Some(log) = log {
        eprintln!("Chat saved. Resume with: gavel --resume {}", log.id());
    }
    Ok(())
}

fn list_sessions() -> anyhow::Result<()> {
    let sessions = SessionLog::list_sessions()?;

    if sessions.is_empty() {
        println!("No saved chats found.");
        return Ok(());
    }

    println!("Saved chats:\n");
    for info in sessions {
        println!(
            "  {}  {}  user {}  ({} messages)",
            info.id,
            info.created_at_display(),
            info.user_id,
            info.message_count
        );
    }
    println!("\nResume with: gavel --resume <id>");

    Ok(())
}
