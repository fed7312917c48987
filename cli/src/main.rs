// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Quill Wallet CLI
//!
//! Entry point for the `quill` binary. Parses arguments, initializes
//! logging, wires a `TransactionClient` to the HTTP gateway and an
//! in-memory key store, and runs one command:
//!
//! - `keygen`   — generate a signing key and print its account
//! - `faucet`   — request test funds
//! - `transfer` — send a fungible resource to one or more accounts
//! - `status`   — wait for the verdict on a submitted transaction
//! - `version`  — print build version information

mod cli;
mod logging;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::sync::Arc;

use quill_protocol::client::{SubmitOptions, TransactionClient};
use quill_protocol::config::ClientConfig;
use quill_protocol::crypto::keys::Keypair;
use quill_protocol::error::TransactionApprovalFailure;
use quill_protocol::gateway::HttpGateway;
use quill_protocol::manifest::address::Address;
use quill_protocol::manifest::decimal::Decimal;
use quill_protocol::manifest::poet::{self, FungibleTransfer};
use quill_protocol::metrics::ClientMetrics;
use quill_protocol::network::{known_addresses, NetworkId};
use quill_protocol::transaction::{TransactionId, TransactionMessage};
use quill_protocol::wallet::InMemoryKeyStore;

use cli::{Commands, QuillCli};
use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = QuillCli::parse();
    logging::init_logging(
        "quill=info,quill_protocol=info",
        LogFormat::from_str_lossy(&cli.log_format),
    );
    let network = NetworkId(cli.network_id);

    match &cli.command {
        Commands::Keygen => keygen(network),
        Commands::Version => {
            print_version();
            Ok(())
        }
        Commands::Faucet(args) => {
            let session = Session::open(&cli, Some(args.key.key.as_str()))?;
            let to = match &args.to {
                Some(to) => parse_address(to)?,
                None => session.account()?,
            };
            let manifest = poet::faucet(to).map_err(describe)?;
            let options = SubmitOptions {
                lock_fee: false,
                ..SubmitOptions::default()
            };
            let result = session.client.sign_and_submit_with(&manifest, options).await;
            session.finish(result, cli.print_metrics)
        }
        Commands::Transfer(args) => {
            let session = Session::open(&cli, Some(args.key.key.as_str()))?;
            let from = session.account()?;
            let resource = match &args.resource {
                Some(r) => parse_address(r)?,
                None => known_addresses(network).native_token,
            };
            let amount: Decimal = args
                .amount
                .parse()
                .with_context(|| format!("invalid amount: {}", args.amount))?;
            let legs = args
                .to
                .iter()
                .map(|to| {
                    Ok(FungibleTransfer {
                        to: parse_address(to)?,
                        resource,
                        amount,
                        signature_required: args.signature_required,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let manifest = poet::transfer(from, &legs, &[]).map_err(describe)?;
            tracing::debug!("manifest:\n{manifest}");
            let options = SubmitOptions {
                message: args
                    .message
                    .clone()
                    .map(TransactionMessage::PlainText)
                    .unwrap_or_default(),
                ..SubmitOptions::default()
            };
            let result = session.client.sign_and_submit_with(&manifest, options).await;
            session.finish(result, cli.print_metrics)
        }
        Commands::Status(args) => {
            let session = Session::open(&cli, None)?;
            let tx_id: TransactionId = args
                .tx_id
                .parse()
                .with_context(|| format!("invalid transaction id: {}", args.tx_id))?;
            let result = session.client.resume_polling(tx_id).await;
            session.finish(result, cli.print_metrics)
        }
    }
}

/// Client, key store and metrics for one command run.
struct Session {
    client: TransactionClient,
    account: Option<Address>,
    metrics: ClientMetrics,
}

impl Session {
    fn open(cli: &QuillCli, key: Option<&str>) -> Result<Self> {
        let network = NetworkId(cli.network_id);
        let config = match &cli.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                ClientConfig::from_json(&text)
                    .with_context(|| format!("invalid config {}", path.display()))?
            }
            None => ClientConfig::default(),
        };

        let store = Arc::new(InMemoryKeyStore::new(network));
        let account = match key {
            Some(key) => {
                let keypair = Keypair::from_hex(key).context("invalid signing key")?;
                Some(store.add_account(keypair))
            }
            None => None,
        };

        let gateway = Arc::new(HttpGateway::new(cli.gateway_url.clone())?);
        let metrics = ClientMetrics::new()?;
        let client = TransactionClient::new(store, gateway.clone(), gateway, config)
            .with_metrics(metrics.clone());

        tracing::info!(network = %network, gateway = %cli.gateway_url, "session opened");
        Ok(Self {
            client,
            account,
            metrics,
        })
    }

    /// The account controlled by the session key.
    fn account(&self) -> Result<Address> {
        self.account
            .ok_or_else(|| anyhow!("this command needs a signing key"))
    }

    fn finish(
        &self,
        result: Result<TransactionId, TransactionApprovalFailure>,
        print_metrics: bool,
    ) -> Result<()> {
        if print_metrics {
            print!("{}", self.metrics.gather_text()?);
        }
        let tx_id = result.map_err(describe)?;
        println!("{tx_id}");
        Ok(())
    }
}

fn parse_address(s: &str) -> Result<Address> {
    s.parse().with_context(|| format!("invalid address: {s}"))
}

/// Turn a pipeline failure into a one-line report with its category.
fn describe(failure: TransactionApprovalFailure) -> anyhow::Error {
    let category = failure.wallet_error_type();
    match failure.dapp_message() {
        Some(extra) => anyhow!("{failure} [{category}] {extra}"),
        None => anyhow!("{failure} [{category}]"),
    }
}

fn keygen(network: NetworkId) -> Result<()> {
    let keypair = Keypair::generate();
    let public_key = keypair.public_key();
    let account = Address::virtual_account(&public_key, network);

    println!("Signing key : {}", hex::encode(keypair.to_bytes()));
    println!("Public key  : {public_key}");
    println!("Account     : {account}");
    println!("Network     : {} ({})", network.name(), network);
    Ok(())
}

fn print_version() {
    println!("quill          {}", env!("CARGO_PKG_VERSION"));
    println!("tx version     {}", quill_protocol::config::TRANSACTION_VERSION);
}
