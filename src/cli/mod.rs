pub mod commands;
pub mod console;
pub mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::core::models::service_profile::ExportFormat;

/// Search CloudTrail for KMS and S3 activity and keep a local log of it.
#[derive(Parser, Debug)]
#[command(name = "trailwatch", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// AWS profile to use [default: default]
    #[arg(long, global = true, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// AWS region to query [default: us-east-1]
    #[arg(long, global = true, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Directory for daily log files [default: ~/aws-monitor-logs]
    #[arg(long, global = true)]
    pub output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode: only show errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to alternative config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search KMS key activity
    Kms {
        /// KMS key ID, ARN or alias to look for
        #[arg(long)]
        key: Option<String>,

        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Search S3 bucket activity
    S3 {
        /// S3 bucket name to look for
        #[arg(long)]
        bucket: Option<String>,

        #[command(flatten)]
        scan: ScanArgs,
    },

    /// List the AWS profiles found on this machine
    Profiles,
}

/// Time range, filters and export options shared by every service command.
#[derive(Args, Debug, Clone, Default)]
pub struct ScanArgs {
    /// Relative range ending now: 30m, 2h (max 24h)
    #[arg(long, value_name = "DURATION")]
    pub last_n: Option<String>,

    /// Range start: "YYYY-MM-DD HH:mm:ss", "YYYY-MM-DD HH:mm" or "YYYY-MM-DD" (UTC)
    #[arg(long)]
    pub start: Option<String>,

    /// Range end, same formats as --start. A bare date covers the whole day
    #[arg(long)]
    pub end: Option<String>,

    /// Event name to match, e.g. Decrypt or PutObject (case-insensitive)
    #[arg(long)]
    pub event: Option<String>,

    /// User name to match (case-insensitive)
    #[arg(long)]
    pub user: Option<String>,

    /// Operation name to match (case-sensitive)
    #[arg(long)]
    pub operation: Option<String>,

    /// Only show events that failed
    #[arg(long, conflicts_with = "success_only")]
    pub errors_only: bool,

    /// Only show events that succeeded
    #[arg(long)]
    pub success_only: bool,

    /// Scan every event of the service without any filter
    #[arg(long)]
    pub all: bool,

    /// Write matches to this file instead of the daily log
    #[arg(long)]
    pub export_file: Option<PathBuf>,

    /// Format of the written records [default: text]
    #[arg(long, value_enum)]
    pub export_format: Option<FormatArg>,
}

/// `--export-format` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Human-readable blocks separated by a dashed line
    Text,
    /// Pretty-printed JSON objects, one after another
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => ExportFormat::Text,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_args(argv: &[&str]) -> ScanArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Kms { scan, .. } | Commands::S3 { scan, .. } => scan,
            Commands::Profiles => panic!("expected a scan command"),
        }
    }

    #[test]
    fn export_format_flag_maps_to_export_format() {
        let args = scan_args(&["trailwatch", "kms", "--last-n", "1h", "--export-format", "json"]);
        assert_eq!(args.export_format, Some(FormatArg::Json));
        assert_eq!(args.export_format.map(ExportFormat::from), Some(ExportFormat::Json));

        let args = scan_args(&["trailwatch", "s3", "--last-n", "1h", "--export-format", "text"]);
        assert_eq!(args.export_format.map(ExportFormat::from), Some(ExportFormat::Text));
    }

    #[test]
    fn export_format_defaults_to_unset() {
        let args = scan_args(&["trailwatch", "kms", "--last-n", "1h"]);
        assert_eq!(args.export_format, None);
    }

    #[test]
    fn export_format_rejects_unknown_values() {
        assert!(Cli::try_parse_from(["trailwatch", "kms", "--export-format", "xml"]).is_err());
    }
}
