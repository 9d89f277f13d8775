//! Config command handler.

use super::CmdResult;
use parley::config::ParleyConfig;
use parley::observability::LoggingConfig;

/// Config command.
pub fn cmd_config(config: &ParleyConfig, show: bool, verbose: bool) -> CmdResult {
    if !show {
        println!("Use 'parley config --show' to display the active configuration.");
        return Ok(());
    }

    println!("Current Configuration");
    println!("=====================");
    println!();
    println!("Data Directory: {}", config.data_dir.display());
    println!("Storage Backend: {}", config.storage.backend.as_str());
    println!();

    println!("Seed Message:");
    println!("  Role: {}", config.seed.role);
    println!("  Content: {}", config.seed.content);
    println!();

    println!("Server:");
    println!("  Address: {}:{}", config.server.host, config.server.port);
    println!();

    let logging = LoggingConfig::from_settings(&config.logging, verbose);
    println!("Logging:");
    println!("  Format: {:?}", logging.format);
    println!("  Filter: {}", logging.filter);
    println!(
        "  File: {}",
        logging
            .file
            .as_ref()
            .map_or_else(|| "(stderr)".to_string(), |p| p.display().to_string())
    );
    println!();

    println!("Completion:");
    println!("  Endpoint: {}", config.completion.endpoint);
    println!("  Model: {}", config.completion.model);
    println!("  Temperature: {}", config.completion.temperature);
    Ok(())
}
