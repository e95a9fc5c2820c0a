use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// CLI for treehouse
#[derive(Parser, Debug)]
#[command(name = "treehouse", version, about = "Development control tool")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Directory containing the treehouse config file
    #[arg(short, long, global = true, default_value = "configs")]
    pub config_dir: PathBuf,

    /// Mode to run (e.g. dev, prod)
    #[arg(short, long, global = true, default_value = "dev")]
    pub mode: String,

    /// Only show output of this service
    #[arg(short, long, global = true)]
    pub focus: Option<String>,

    /// Hide output of this service
    #[arg(long, global = true)]
    pub mute: Option<String>,

    /// Default seconds between health probes
    #[arg(long, global = true, value_name = "SECONDS")]
    pub health_interval: Option<u64>,

    /// Default seconds before a health check gives up
    #[arg(long, global = true, value_name = "SECONDS")]
    pub health_timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start all core services
    Start,
    /// Run a single service, tracking health for it alone
    Spm {
        /// Service to focus on
        service: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["treehouse", "start"]).unwrap();
        assert_eq!(cli.global.config_dir, PathBuf::from("configs"));
        assert_eq!(cli.global.mode, "dev");
        assert!(cli.global.focus.is_none());
        assert!(matches!(cli.command, Commands::Start));
    }

    #[test]
    fn test_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "treehouse", "spm", "api", "-c", "conf", "-m", "prod", "--health-timeout", "5",
        ])
        .unwrap();
        assert_eq!(cli.global.config_dir, PathBuf::from("conf"));
        assert_eq!(cli.global.mode, "prod");
        assert_eq!(cli.global.health_timeout, Some(5));
        assert!(matches!(cli.command, Commands::Spm { service } if service == "api"));
    }

    #[test]
    fn test_spm_requires_service() {
        assert!(Cli::try_parse_from(["treehouse", "spm"]).is_err());
    }
}
