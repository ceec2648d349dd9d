use anyhow::{Context, Result};
use clap::Subcommand;

use crate::cli::output::get_formatter;
use crate::models::{CHAT_API_KEY_VAR, Config, EMBEDDING_API_KEY_VAR, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Write a config file with default values")]
    Init {
        #[arg(long, short = 'f', help = "Force overwrite existing config")]
        force: bool,
    },
    #[command(about = "Show current configuration")]
    Show,
    #[command(about = "Show the configuration file path")]
    Path,
}

pub async fn handle_config(cmd: ConfigCommand, format: OutputFormat, _verbose: bool) -> Result<()> {
    match cmd {
        ConfigCommand::Init { force } => handle_init(force, format),
        ConfigCommand::Show => handle_show(format),
        ConfigCommand::Path => handle_path(),
    }
}

fn handle_init(force: bool, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let path = Config::config_path()
        .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;

    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    Config::default().save().context("failed to write config")?;
    print!(
        "{}",
        formatter.format_message(&format!("Created config at: {}", path.display()))
    );

    Ok(())
}

fn handle_show(format: OutputFormat) -> Result<()> {
    let config = Config::load()?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("# Config: {}", path.display());
        } else {
            println!("# Config (defaults, no file at): {}", path.display());
        }
        println!();
    }

    print!("{}", toml::to_string_pretty(&config)?);
    println!();

    // The file never holds credentials; report where they come from.
    let key_status = |var: &str| {
        if std::env::var(var).map(|v| !v.is_empty()).unwrap_or(false) {
            "set"
        } else {
            "not set"
        }
    };
    println!("# {} = {}", EMBEDDING_API_KEY_VAR, key_status(EMBEDDING_API_KEY_VAR));
    println!("# {} = {}", CHAT_API_KEY_VAR, key_status(CHAT_API_KEY_VAR));

    Ok(())
}

fn handle_path() -> Result<()> {
    let path = Config::config_path()
        .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;

    if path.exists() {
        println!("Config (active): {}", path.display());
    } else {
        println!("Config (would be): {}", path.display());
    }

    Ok(())
}
