//! `leadchat stats`: Print dashboard statistics.

use leadchat_config::AppConfig;
use leadchat_core::lead::collect_stats;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let store = leadchat_leads::open_store(&config.leads).await?;

    let stats = collect_stats(store.as_ref(), chrono::Utc::now()).await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}
