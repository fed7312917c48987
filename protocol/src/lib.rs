// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Quill Protocol — Transaction Engine
//!
//! Everything a wallet does between "the user approved this manifest" and
//! "the ledger committed it": fee locking, signer resolution, header
//! construction, compilation, signing, notarization, submission and status
//! polling.
//!
//! ## Architecture
//!
//! - **manifest** — Instruction AST, values, addresses, builder and templates.
//! - **transaction** — Header, fee injection, signers, intent and notarization.
//! - **gateway** — Ledger collaborators, HTTP adapter, poller, submission states.
//! - **wallet** — Key store contract and signer handles.
//! - **client** — The `TransactionClient` that runs the whole pipeline.
//! - **error** — The failure taxonomy and its wallet error categories.
//! - **crypto** — Hashing and Ed25519 keys.
//! - **network** — Network ids and well-known addresses.
//! - **metrics** — Prometheus counters for the pipeline.
//! - **config** — Protocol constants and client tunables.
//!
//! ## Design Philosophy
//!
//! 1. Every stage returns a typed failure. Nothing is recovered silently.
//! 2. Manifests are values: amending one returns a new one.
//! 3. A notarized transaction is submitted once. Only polling retries.
//! 4. Randomness and I/O come in through traits so tests can script them.

pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod gateway;
pub mod manifest;
pub mod metrics;
pub mod network;
pub mod transaction;
pub mod wallet;

pub use client::{PreparedTransaction, SubmitOptions, TransactionClient};
pub use config::ClientConfig;
pub use error::{TransactionApprovalFailure, WalletErrorType};
pub use manifest::{ManifestBuilder, TransactionManifest};
pub use network::NetworkId;
pub use transaction::TransactionId;
