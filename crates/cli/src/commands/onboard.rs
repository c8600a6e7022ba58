//! `leadchat onboard`: First-time setup.

use leadchat_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("💬 LeadChat — First-Time Setup");
    println!("==============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Set OPENAI_API_KEY (or api_key in {})", config_path.display());
        println!("   2. Optionally set RESEND_API_KEY and FROM_EMAIL for thank-you emails");
        println!("   3. Run: leadchat serve\n");
    }

    println!(
        "   Leads are stored at: {}",
        leadchat_config::LeadsConfig::default().database_url()
    );
    println!("\n🎉 Setup complete! Run `leadchat chat` to talk to the persona.\n");

    Ok(())
}
