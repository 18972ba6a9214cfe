//! CLI argument definitions using clap.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// Reusable gateway connection arguments
#[derive(Debug, Clone, Default, Args)]
pub struct GatewayArgs {
    /// Gateway IP address, or use ECOWITT_IP env var (discovered when omitted)
    #[arg(short, long, env = "ECOWITT_IP")]
    pub ip: Option<IpAddr>,

    /// Gateway API port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Socket timeout in seconds
    #[arg(short = 'T', long)]
    pub timeout: Option<f64>,

    /// Attempts per command before giving up
    #[arg(long)]
    pub max_tries: Option<u32>,
}

/// Reusable output format arguments
#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Output format (defaults to the config file setting, then text)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Parser)]
#[command(name = "ecowitt")]
#[command(author, version, about = "CLI for Ecowitt weather station gateways", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as JSON (shorthand for --format json)
    #[arg(long, global = true)]
    pub json: bool,

    /// Output compact JSON (no pretty-printing)
    #[arg(long, global = true)]
    pub compact: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true, env = "ECOWITT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Broadcast a discovery request and list responding gateways
    Discover {
        /// Seconds to wait for replies
        #[arg(short, long)]
        timeout: Option<f64>,

        /// Broadcast address to send the request to
        #[arg(long)]
        broadcast: Option<IpAddr>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Listen for the beacons gateways send periodically
    Listen {
        /// Seconds to listen for
        #[arg(short, long)]
        period: Option<f64>,

        /// UDP port to listen on
        #[arg(short = 'P', long)]
        port: Option<u16>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Read live sensor data
    #[command(name = "live-data", alias = "read")]
    LiveData {
        #[command(flatten)]
        gateway: GatewayArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List paired sensors with their battery and signal state
    Sensors {
        #[command(flatten)]
        gateway: GatewayArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Include slots that are searching or disabled
        #[arg(short, long)]
        all: bool,
    },

    /// Show the gateway firmware version
    Firmware {
        #[command(flatten)]
        gateway: GatewayArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show the gateway MAC address
    Mac {
        #[command(flatten)]
        gateway: GatewayArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show system parameters (frequency, sensor type, clock)
    #[command(name = "system-params")]
    SystemParams {
        #[command(flatten)]
        gateway: GatewayArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show rain data
    Rain {
        #[command(flatten)]
        gateway: GatewayArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Read the traditional rain totals instead of the full rain response
        #[arg(long)]
        totals: bool,
    },

    /// Show gain and offset calibration
    Calibration {
        #[command(flatten)]
        gateway: GatewayArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Also show soil moisture calibration
        #[arg(long)]
        soil: bool,
    },

    /// Show sensor offsets
    Offsets {
        #[command(flatten)]
        gateway: GatewayArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Which offsets to show
        #[arg(value_enum, default_value = "all")]
        kind: OffsetKind,
    },

    /// Show weather service upload settings
    Services {
        #[command(flatten)]
        gateway: GatewayArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Offset groups the gateway reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OffsetKind {
    All,
    /// Multi-channel temperature and humidity
    Mulch,
    /// Multi-channel temperature only
    MulchT,
    Pm25,
    Co2,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the config file location
    Path,
    /// Print the effective configuration
    Show,
    /// Write a config file with default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set the default gateway address
    SetIp {
        /// Gateway IP address
        ip: IpAddr,
    },
    /// Remove the default gateway address
    UnsetIp,
}

impl Cli {
    /// Resolve the output format: `--json` wins, then the subcommand flag,
    /// then the configured default.
    pub fn resolve_format(&self, flag: Option<OutputFormat>, configured: Option<OutputFormat>) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            flag.or(configured).unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_live_data_with_gateway() {
        let cli = Cli::try_parse_from([
            "ecowitt",
            "live-data",
            "--ip",
            "192.168.1.20",
            "--port",
            "45001",
            "--format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Commands::LiveData { gateway, output } => {
                assert_eq!(gateway.ip, Some("192.168.1.20".parse().unwrap()));
                assert_eq!(gateway.port, Some(45001));
                assert_eq!(output.format, Some(OutputFormat::Json));
            }
            _ => panic!("expected live-data"),
        }
    }

    #[test]
    fn test_read_alias() {
        let cli = Cli::try_parse_from(["ecowitt", "read"]).unwrap();
        assert!(matches!(cli.command, Commands::LiveData { .. }));
    }

    #[test]
    fn test_invalid_ip_rejected() {
        let result = Cli::try_parse_from(["ecowitt", "firmware", "--ip", "not-an-ip"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_offsets_kind() {
        let cli = Cli::try_parse_from(["ecowitt", "offsets", "mulch-t"]).unwrap();
        match cli.command {
            Commands::Offsets { kind, .. } => assert_eq!(kind, OffsetKind::MulchT),
            _ => panic!("expected offsets"),
        }
    }

    #[test]
    fn test_resolve_format() {
        let cli = Cli::try_parse_from(["ecowitt", "mac"]).unwrap();
        assert_eq!(cli.resolve_format(None, None), OutputFormat::Text);
        assert_eq!(
            cli.resolve_format(None, Some(OutputFormat::Csv)),
            OutputFormat::Csv
        );
        assert_eq!(
            cli.resolve_format(Some(OutputFormat::Text), Some(OutputFormat::Csv)),
            OutputFormat::Text
        );

        let cli = Cli::try_parse_from(["ecowitt", "--json", "mac"]).unwrap();
        assert_eq!(
            cli.resolve_format(Some(OutputFormat::Text), None),
            OutputFormat::Json
        );
    }
}
