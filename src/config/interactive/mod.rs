
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input};

use super::{Config, GeminiConfig};

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🔧 Notes AI Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Gemini Configuration").bold().yellow());
    eprintln!("Configure the Generative Language API used for embeddings, answers, and reminder extraction.");
    eprintln!();

    configure_gemini(&mut config.gemini)?;

    if !config.gemini.has_api_key() {
        eprintln!();
        eprintln!(
            "{}",
            style("⚠ No API key set. AI features will fail until one is configured.").yellow()
        );
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Gemini Settings:").bold().yellow());
    let api_key_display = if config.gemini.has_api_key() {
        "configured"
    } else {
        "not set"
    };
    eprintln!("  API Key: {}", style(api_key_display).cyan());
    eprintln!("  Model: {}", style(&config.gemini.model).cyan());
    eprintln!(
        "  Embedding Model: {}",
        style(&config.gemini.embedding_model).cyan()
    );
    eprintln!("  API Base URL: {}", style(&config.gemini.api_base_url).cyan());
    eprintln!("  Timeout: {}s", style(config.gemini.timeout_seconds).cyan());

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );
    eprintln!(
        "Database: {}",
        style(config.database_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    Config::load().map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Ok(Config::default())
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_gemini(gemini: &mut GeminiConfig) -> Result<()> {
    let api_key: String = Input::new()
        .with_prompt("Gemini API key (leave empty to skip)")
        .default(gemini.api_key.clone())
        .allow_empty(true)
        .interact_text()?;

    let model: String = Input::new()
        .with_prompt("Completion model")
        .default(gemini.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let embedding_model: String = Input::new()
        .with_prompt("Embedding model")
        .default(gemini.embedding_model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let timeout_seconds: u64 = Input::new()
        .with_prompt("Request timeout in seconds")
        .default(gemini.timeout_seconds)
        .validate_with(|input: &u64| -> Result<(), &str> {
            if *input == 0 || *input > 300 {
                Err("Timeout must be between 1 and 300 seconds")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    gemini.set_api_key(api_key);
    gemini.set_model(model)?;
    gemini.set_embedding_model(embedding_model)?;
    gemini.set_timeout_seconds(timeout_seconds)?;

    Ok(())
}
