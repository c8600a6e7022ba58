//! `leadchat chat`: Single-message or interactive chat with the persona.
//!
//! Uses the same assembly and reply interpretation as the `/chat` endpoint.
//! In interactive mode the transcript is kept locally and sent as history.

use leadchat_config::AppConfig;
use leadchat_core::conversation::{ConversationRequest, interpret_reply};
use leadchat_core::message::Turn;
use leadchat_core::persona::PersonaConfig;
use leadchat_core::provider::Provider;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    OPENAI_API_KEY   = 'sk-...'");
        eprintln!("    LEADCHAT_API_KEY = 'sk-...'   (takes precedence)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let provider = leadchat_providers::build_from_config(&config)?;
    let persona = config.persona.to_persona();

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let reply = ask(provider.as_ref(), &persona, &msg, Vec::new()).await;
        eprint!("\r              \r");
        println!("{}", reply?);
        return Ok(());
    }

    println!();
    println!("  Provider:  {}", provider.name());
    println!("  Model:     {}", persona.model);
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut history: Vec<Turn> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  You > ");
    use std::io::Write;
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line == "exit" || line == "quit" {
            break;
        }
        if !line.is_empty() {
            eprint!("  ...");
            match ask(provider.as_ref(), &persona, &line, history.clone()).await {
                Ok(reply) => {
                    eprint!("\r     \r");
                    println!();
                    for text in reply.lines() {
                        println!("  Assistant > {text}");
                    }
                    println!();
                    history.push(Turn::user(&line));
                    history.push(Turn::assistant(&reply));
                }
                Err(e) => {
                    warn!(error = %e, "Chat turn failed");
                    eprint!("\r     \r");
                    eprintln!("  [Error] {e}");
                    println!();
                }
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Goodbye! 👋");
    println!();

    Ok(())
}

async fn ask(
    provider: &dyn Provider,
    persona: &PersonaConfig,
    message: &str,
    history: Vec<Turn>,
) -> Result<String, Box<dyn std::error::Error>> {
    let request = ConversationRequest::new(message).with_history(history);
    request.validate()?;
    debug!(history = request.history.len(), "Sending chat turn");
    let response = provider.complete(request.to_provider_request(persona)).await?;
    Ok(interpret_reply(&response))
}
