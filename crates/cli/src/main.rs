use std::path::Path;

use adsync_core::config::AdSyncConfig;
use adsync_core::logging;
use clap::Parser;

mod commands;

#[derive(Parser)]
#[command(
    name = "adsync",
    about = "Add every user account of an AD organizational unit to a security group",
    version
)]
struct Cli {
    /// Path to configuration file (TOML, or JSON when ending in .json)
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Clone, Copy)]
enum Commands {
    /// Add missing accounts to the group (default)
    Sync,
    /// Bind to the directory server and exit
    TestConnection,
}

fn load_config(path: &str) -> anyhow::Result<AdSyncConfig> {
    let config = AdSyncConfig::load(Path::new(path))
        .map_err(|e| anyhow::anyhow!("unable to read config file {path}: {e}"))?;
    config.validate()?;
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    logging::init(&config.logging)?;

    match cli.command.unwrap_or(Commands::Sync) {
        Commands::Sync => commands::sync::run(&config).await,
        Commands::TestConnection => commands::test_connection::run(&config).await,
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn cli_parse_defaults() {
        let cli = Cli::parse_from(["adsync"]);
        assert_eq!(cli.config, "config.toml");
        assert!(cli.command.is_none());
    }

    #[test]
    fn cli_parse_custom_config() {
        let cli = Cli::parse_from(["adsync", "--config", "/etc/adsync/config.json", "sync"]);
        assert_eq!(cli.config, "/etc/adsync/config.json");
        assert!(matches!(cli.command, Some(Commands::Sync)));
    }

    #[test]
    fn cli_parse_test_connection() {
        let cli = Cli::parse_from(["adsync", "test-connection"]);
        assert!(matches!(cli.command, Some(Commands::TestConnection)));
    }

    #[test]
    fn cli_rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["adsync", "remove-members"]).is_err());
    }

    #[test]
    fn load_config_requires_file() {
        let result = load_config("/nonexistent/config.toml");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("unable to read config file"));
    }

    #[test]
    fn load_config_rejects_incomplete_file() {
        let dir = std::env::temp_dir().join("adsync_cli_test_incomplete");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[activedirectory]\nhost = \"dc01\"\n").unwrap();

        let result = load_config(path.to_str().unwrap());
        assert!(result.unwrap_err().to_string().contains("activedirectory.domain"));

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(&dir).ok();
    }
}
