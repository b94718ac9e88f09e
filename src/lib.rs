pub mod agent;
pub mod cli;
pub mod config;
pub mod defense;
pub mod guardrails;
pub mod history;
pub mod llm;
pub mod metrics;
pub mod models;
pub mod validator;

use agent::Session;
use cli::console::Console;
use cli::Args;
use config::prompt::{ load_persona, Persona };
use guardrails::InputGate;
use log::info;
use metrics::InteractionLog;
use std::error::Error;
use tokio::io::BufReader;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let llm_config = args.llm_config()?;

    info!("--- Core Configuration ---");
    info!("Chat LLM Type: {}", llm_config.llm_type);
    info!("Chat Model: {}", args.model.as_deref().unwrap_or("(provider default)"));
    info!("Chat Base URL: {}", args.base_url.as_deref().unwrap_or("(provider default)"));
    info!("Temperature: {}", args.temperature);
    info!("Persona Path: {}", args.persona_path.as_deref().unwrap_or("(built-in)"));
    info!("History Policy: {:?}", args.history_policy());
    info!("Metrics Path: {}", args.metrics_path);
    info!("-------------------------");

    let persona = match &args.persona_path {
        Some(path) => load_persona(path)?,
        None => Persona::default(),
    };
    let provider = llm::chat::new_client(&llm_config)?;
    let session = Session::with_options(persona, provider, InputGate::default(), args.session_options());

    let mut console = Console::new(session, InteractionLog::new(&args.metrics_path));
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    console.run(stdin, &mut stdout).await?;

    Ok(())
}
