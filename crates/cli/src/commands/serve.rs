//! `leadchat serve`: Start the widget HTTP endpoints.

use leadchat_config::AppConfig;
use tracing::info;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("💬 LeadChat Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Endpoints: /api/chat, /api/save-lead (also under /.netlify/functions)");
    println!(
        "   Thank-you emails: {}",
        if config.email.is_enabled() { "enabled" } else { "disabled" }
    );

    let database_url = config.leads.database_url();
    let storage = database_url.split(':').next().unwrap_or_default();
    info!(
        port = config.gateway.port,
        model = %config.persona.model,
        storage,
        "Starting LeadChat gateway"
    );
    leadchat_gateway::start(config).await?;

    Ok(())
}
