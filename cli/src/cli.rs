//! # CLI Interface
//!
//! Command-line structure for `quill`, built with `clap` derive. Global
//! options pick the gateway, network and log format; subcommands build and
//! submit transactions or query their status.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Quill wallet command line.
///
/// Builds manifests, signs and notarizes them with a local key, submits
/// them to a gateway and waits for the ledger's verdict.
#[derive(Parser, Debug)]
#[command(name = "quill", about = "Quill wallet command line", version, propagate_version = true)]
pub struct QuillCli {
    /// Gateway base URL.
    #[arg(
        long,
        global = true,
        env = "QUILL_GATEWAY_URL",
        default_value = "http://127.0.0.1:3333"
    )]
    pub gateway_url: String,

    /// Network id the wallet operates on (1 = mainnet, 2 = stokenet).
    #[arg(long, global = true, env = "QUILL_NETWORK_ID", default_value_t = 2)]
    pub network_id: u8,

    /// Log output format: "pretty" or "json".
    #[arg(long, global = true, env = "QUILL_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// JSON client config file (lock fee, tip, poll strategy).
    #[arg(long, short = 'c', global = true, env = "QUILL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print Prometheus metrics to stdout after the command finishes.
    #[arg(long, global = true)]
    pub print_metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a fresh signing key and print its account address.
    Keygen,
    /// Request free test funds from the network faucet.
    Faucet(FaucetArgs),
    /// Send a fungible resource to one or more accounts.
    Transfer(TransferArgs),
    /// Wait for the verdict on an already-submitted transaction.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

/// Signing key shared by every submitting command.
#[derive(Args, Debug)]
pub struct KeyArgs {
    /// Hex-encoded Ed25519 secret key of the paying account.
    #[arg(long = "key", env = "QUILL_SIGNING_KEY", hide_env_values = true)]
    pub key: String,
}

#[derive(Args, Debug)]
pub struct FaucetArgs {
    #[command(flatten)]
    pub key: KeyArgs,

    /// Account receiving the funds. Defaults to the key's own account.
    #[arg(long)]
    pub to: Option<String>,
}

#[derive(Args, Debug)]
pub struct TransferArgs {
    #[command(flatten)]
    pub key: KeyArgs,

    /// Resource address to send. Defaults to the network's native token.
    #[arg(long)]
    pub resource: Option<String>,

    /// Amount sent to each recipient.
    #[arg(long)]
    pub amount: String,

    /// Recipient account. Repeat for several recipients.
    #[arg(long = "to", required = true)]
    pub to: Vec<String>,

    /// Require the recipients' signature (plain deposit instead of
    /// try-deposit-or-abort).
    #[arg(long)]
    pub signature_required: bool,

    /// Plain-text message attached to the transaction.
    #[arg(long)]
    pub message: Option<String>,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Transaction id (hex).
    pub tx_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        QuillCli::command().debug_assert();
    }

    #[test]
    fn transfer_accepts_many_recipients() {
        let cli = QuillCli::try_parse_from([
            "quill",
            "transfer",
            "--key",
            "00",
            "--amount",
            "1.5",
            "--to",
            "a",
            "--to",
            "b",
        ])
        .unwrap();
        match cli.command {
            Commands::Transfer(args) => {
                assert_eq!(args.to, vec!["a", "b"]);
                assert_eq!(args.amount, "1.5");
                assert!(!args.signature_required);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.network_id, 2);
    }

    #[test]
    fn global_options_after_subcommand() {
        let cli = QuillCli::try_parse_from(["quill", "status", "abcd", "--log-format", "json"])
            .unwrap();
        assert_eq!(cli.log_format, "json");
        assert!(matches!(
            cli.command,
            Commands::Status(StatusArgs { ref tx_id }) if tx_id == "abcd"
        ));
    }
}
