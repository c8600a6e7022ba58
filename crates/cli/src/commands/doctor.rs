//! `leadchat doctor`: Diagnose configuration and storage.

use leadchat_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 LeadChat Doctor — Diagnostics");
    println!("================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found");
    } else {
        println!("  ⚠️  No config file — using defaults (run `leadchat onboard`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid (model {})", config.persona.model);
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Fix the config before running further checks.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured for {}", config.provider.name);
    } else {
        println!("  ❌ No API key — set OPENAI_API_KEY or api_key in config.toml");
        issues += 1;
    }

    match leadchat_leads::open_store(&config.leads).await {
        Ok(store) => match store.health_check().await {
            Ok(true) => println!("  ✅ Lead store reachable ({})", store.name()),
            Ok(false) => {
                println!("  ❌ Lead store unhealthy ({})", store.name());
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Lead store check failed: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Cannot open lead store: {e}");
            issues += 1;
        }
    }

    if config.email.is_enabled() {
        println!("  ✅ Thank-you emails enabled (from {})", config.email.from);
    } else {
        println!("  ℹ️  Thank-you emails disabled (set RESEND_API_KEY to enable)");
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
