//! Command-line and environment configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::validation::MAX_EXPORT_SIZE;

/// Default port for the design service.
pub const DEFAULT_PORT: u16 = 9474;

/// Default export width in pixels (2x the on-screen canvas).
pub const DEFAULT_EXPORT_SIZE: u32 = 768;

/// T-Shirt Studio design service.
#[derive(Debug, Parser)]
#[command(name = "tshirt-studio", version, about, args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Subcommand; defaults to `serve`.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Options for the default `serve` command.
    #[command(flatten)]
    pub serve: ServeArgs,
}

impl Cli {
    /// The command to run, falling back to `serve` with top-level options.
    #[must_use]
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP service.
    Serve(ServeArgs),
    /// Flatten a scene JSON file to `tshirt-design.png`.
    Render(RenderArgs),
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Options for the HTTP service.
#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Port to listen on.
    #[arg(long, env = "TSHIRT_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind.
    #[arg(long, env = "TSHIRT_BIND", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub bind: IpAddr,

    /// Address that receives design submissions.
    #[arg(long, env = "SELLER_EMAIL", default_value = "seller@localhost")]
    pub seller_email: String,

    /// Sender address on outgoing submissions.
    #[arg(long, env = "EMAIL_USER", default_value = "studio@localhost")]
    pub sender_email: String,

    /// Write submissions into this outbox directory instead of only logging them.
    #[arg(long, env = "TSHIRT_OUTBOX")]
    pub outbox_dir: Option<PathBuf>,

    /// Log output format.
    #[arg(long, env = "RUST_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Width in pixels of exported designs.
    #[arg(
        long,
        env = "TSHIRT_EXPORT_SIZE",
        default_value_t = DEFAULT_EXPORT_SIZE,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_EXPORT_SIZE))
    )]
    pub export_size: u32,
}

impl ServeArgs {
    /// Socket address to listen on.
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

/// Options for the offline render command.
#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    /// Scene JSON file.
    #[arg(long)]
    pub scene: PathBuf,

    /// Directory that receives `tshirt-design.png`.
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// Width in pixels of the exported design.
    #[arg(long, env = "TSHIRT_EXPORT_SIZE", default_value_t = DEFAULT_EXPORT_SIZE)]
    pub export_size: u32,

    /// Log output format.
    #[arg(long, env = "RUST_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::try_parse_from(["tshirt-studio", "--port", "8080"]).expect("parse");
        match cli.into_command() {
            Command::Serve(args) => {
                assert_eq!(args.port, 8080);
                assert_eq!(args.export_size, DEFAULT_EXPORT_SIZE);
                assert_eq!(args.socket_addr().ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
            }
            Command::Render(_) => panic!("expected serve"),
        }
    }

    #[test]
    fn test_export_size_is_bounded() {
        assert!(Cli::try_parse_from(["tshirt-studio", "--export-size", "100000"]).is_err());
        assert!(Cli::try_parse_from(["tshirt-studio", "--export-size", "0"]).is_err());
        let cli = Cli::try_parse_from(["tshirt-studio", "--export-size", "4096"]).expect("parse");
        match cli.into_command() {
            Command::Serve(args) => assert_eq!(args.export_size, MAX_EXPORT_SIZE),
            Command::Render(_) => panic!("expected serve"),
        }
    }

    #[test]
    fn test_render_subcommand() {
        let cli = Cli::try_parse_from([
            "tshirt-studio",
            "render",
            "--scene",
            "design.json",
            "--out",
            "build",
            "--log-format",
            "json",
        ])
        .expect("parse");
        match cli.into_command() {
            Command::Render(args) => {
                assert_eq!(args.scene, PathBuf::from("design.json"));
                assert_eq!(args.out, PathBuf::from("build"));
                assert_eq!(args.log_format, LogFormat::Json);
            }
            Command::Serve(_) => panic!("expected render"),
        }
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
