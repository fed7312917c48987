//! # Transaction Approval Failures
//!
//! One closed enum for everything that can go wrong between "here is a
//! manifest" and "the ledger committed it". Each pipeline stage fails with
//! its own variant; module-level errors are folded in at the stage boundary
//! with their message kept as `reason`.
//!
//! User interfaces do not care which stage broke, only what kind of
//! trouble it was, so every variant maps to one [`WalletErrorType`]. The
//! mapping is an exhaustive match; a new variant needs a category before
//! it compiles.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::network::NetworkId;
use crate::transaction::intent::TransactionId;

/// Why a transaction could not be approved, submitted, or confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionApprovalFailure {
    #[error("failed to get the current ledger epoch: {reason}")]
    GetEpoch { reason: String },

    #[error("wallet is on network {wallet_network}, request targets network {request_network}")]
    WrongNetwork {
        wallet_network: NetworkId,
        request_network: NetworkId,
    },

    #[error("failed to convert manifest: {reason}")]
    ConvertManifest { reason: String },

    #[error("failed to build transaction header: {reason}")]
    BuildTransactionHeader { reason: String },

    #[error("no account available to lock the transaction fee")]
    FailedToFindAccountToLockFee,

    #[error("failed to compile transaction intent: {reason}")]
    CompileTransactionIntent { reason: String },

    #[error("failed to sign intent with account signers: {reason}")]
    SignIntentWithAccountSigners { reason: String },

    #[error("failed to prepare notarized transaction: {reason}")]
    PrepareNotarizedTransaction { reason: String },

    #[error("failed to compile notarized transaction intent: {reason}")]
    CompileNotarizedTransactionIntent { reason: String },

    #[error("failed to submit notarized transaction: {reason}")]
    SubmitNotarizedTransaction { reason: String },

    #[error("transaction {tx_id} was already submitted")]
    InvalidTxDuplicate { tx_id: TransactionId },

    #[error("gave up polling status of transaction {tx_id}")]
    FailedToPollTxStatus { tx_id: TransactionId },

    #[error("transaction {tx_id} was rejected by the gateway")]
    GatewayRejected { tx_id: TransactionId },

    #[error("transaction {tx_id} was committed with a failure")]
    GatewayCommittedFailure { tx_id: TransactionId },
}

/// Coarse failure categories shown to users and reported to dApps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WalletErrorType {
    FailedToPrepareTransaction,
    FailedToCompileTransaction,
    FailedToSignTransaction,
    FailedToSubmitTransaction,
    FailedToPollSubmittedTransaction,
    FailedToFindAccountWithEnoughFundsToLockFee,
    SubmittedTransactionWasDuplicate,
    SubmittedTransactionHasFailedTransactionStatus,
    SubmittedTransactionHasRejectedTransactionStatus,
    WrongNetwork,
}

impl WalletErrorType {
    pub const ALL: [WalletErrorType; 10] = [
        WalletErrorType::FailedToPrepareTransaction,
        WalletErrorType::FailedToCompileTransaction,
        WalletErrorType::FailedToSignTransaction,
        WalletErrorType::FailedToSubmitTransaction,
        WalletErrorType::FailedToPollSubmittedTransaction,
        WalletErrorType::FailedToFindAccountWithEnoughFundsToLockFee,
        WalletErrorType::SubmittedTransactionWasDuplicate,
        WalletErrorType::SubmittedTransactionHasFailedTransactionStatus,
        WalletErrorType::SubmittedTransactionHasRejectedTransactionStatus,
        WalletErrorType::WrongNetwork,
    ];

    /// Stable snake_case name, used as a metrics label.
    pub fn as_str(self) -> &'static str {
        match self {
            WalletErrorType::FailedToPrepareTransaction => "failed_to_prepare_transaction",
            WalletErrorType::FailedToCompileTransaction => "failed_to_compile_transaction",
            WalletErrorType::FailedToSignTransaction => "failed_to_sign_transaction",
            WalletErrorType::FailedToSubmitTransaction => "failed_to_submit_transaction",
            WalletErrorType::FailedToPollSubmittedTransaction => {
                "failed_to_poll_submitted_transaction"
            }
            WalletErrorType::FailedToFindAccountWithEnoughFundsToLockFee => {
                "failed_to_find_account_with_enough_funds_to_lock_fee"
            }
            WalletErrorType::SubmittedTransactionWasDuplicate => {
                "submitted_transaction_was_duplicate"
            }
            WalletErrorType::SubmittedTransactionHasFailedTransactionStatus => {
                "submitted_transaction_has_failed_transaction_status"
            }
            WalletErrorType::SubmittedTransactionHasRejectedTransactionStatus => {
                "submitted_transaction_has_rejected_transaction_status"
            }
            WalletErrorType::WrongNetwork => "wrong_network",
        }
    }
}

impl fmt::Display for WalletErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TransactionApprovalFailure {
    /// The user-facing category of this failure.
    pub fn wallet_error_type(&self) -> WalletErrorType {
        use TransactionApprovalFailure as F;
        use WalletErrorType as W;
        match self {
            F::GetEpoch { .. } => W::FailedToPrepareTransaction,
            F::WrongNetwork { .. } => W::WrongNetwork,
            F::ConvertManifest { .. } => W::FailedToPrepareTransaction,
            F::BuildTransactionHeader { .. } => W::FailedToPrepareTransaction,
            F::FailedToFindAccountToLockFee => W::FailedToFindAccountWithEnoughFundsToLockFee,
            F::CompileTransactionIntent { .. } => W::FailedToCompileTransaction,
            F::SignIntentWithAccountSigners { .. } => W::FailedToSignTransaction,
            F::PrepareNotarizedTransaction { .. } => W::FailedToSignTransaction,
            F::CompileNotarizedTransactionIntent { .. } => W::FailedToCompileTransaction,
            F::SubmitNotarizedTransaction { .. } => W::FailedToSubmitTransaction,
            F::InvalidTxDuplicate { .. } => W::SubmittedTransactionWasDuplicate,
            F::FailedToPollTxStatus { .. } => W::FailedToPollSubmittedTransaction,
            F::GatewayRejected { .. } => W::SubmittedTransactionHasRejectedTransactionStatus,
            F::GatewayCommittedFailure { .. } => W::SubmittedTransactionHasFailedTransactionStatus,
        }
    }

    /// Extra context line for the requesting dApp, where there is one.
    pub fn dapp_message(&self) -> Option<String> {
        use TransactionApprovalFailure as F;
        match self {
            F::InvalidTxDuplicate { tx_id }
            | F::FailedToPollTxStatus { tx_id }
            | F::GatewayRejected { tx_id }
            | F::GatewayCommittedFailure { tx_id } => Some(format!("TXID: {tx_id}")),
            F::WrongNetwork {
                wallet_network,
                request_network,
            } => Some(format!(
                "Wallet is using network ID: {wallet_network}, request sent specified network ID: {request_network}"
            )),
            F::GetEpoch { .. }
            | F::ConvertManifest { .. }
            | F::BuildTransactionHeader { .. }
            | F::FailedToFindAccountToLockFee
            | F::CompileTransactionIntent { .. }
            | F::SignIntentWithAccountSigners { .. }
            | F::PrepareNotarizedTransaction { .. }
            | F::CompileNotarizedTransactionIntent { .. }
            | F::SubmitNotarizedTransaction { .. } => None,
        }
    }

    /// The transaction this failure is about, once one was submitted.
    pub fn tx_id(&self) -> Option<TransactionId> {
        use TransactionApprovalFailure as F;
        match self {
            F::InvalidTxDuplicate { tx_id }
            | F::FailedToPollTxStatus { tx_id }
            | F::GatewayRejected { tx_id }
            | F::GatewayCommittedFailure { tx_id } => Some(*tx_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> TransactionId {
        TransactionId::of(b"intent")
    }

    #[test]
    fn categories() {
        use TransactionApprovalFailure as F;
        use WalletErrorType as W;
        let reason = || "x".to_string();
        let cases = [
            (F::GetEpoch { reason: reason() }, W::FailedToPrepareTransaction),
            (F::ConvertManifest { reason: reason() }, W::FailedToPrepareTransaction),
            (F::BuildTransactionHeader { reason: reason() }, W::FailedToPrepareTransaction),
            (F::CompileTransactionIntent { reason: reason() }, W::FailedToCompileTransaction),
            (F::SignIntentWithAccountSigners { reason: reason() }, W::FailedToSignTransaction),
            (F::PrepareNotarizedTransaction { reason: reason() }, W::FailedToSignTransaction),
            (F::SubmitNotarizedTransaction { reason: reason() }, W::FailedToSubmitTransaction),
            (F::InvalidTxDuplicate { tx_id: id() }, W::SubmittedTransactionWasDuplicate),
            (F::FailedToPollTxStatus { tx_id: id() }, W::FailedToPollSubmittedTransaction),
            (
                F::GatewayRejected { tx_id: id() },
                W::SubmittedTransactionHasRejectedTransactionStatus,
            ),
            (
                F::GatewayCommittedFailure { tx_id: id() },
                W::SubmittedTransactionHasFailedTransactionStatus,
            ),
            (F::FailedToFindAccountToLockFee, W::FailedToFindAccountWithEnoughFundsToLockFee),
        ];
        for (failure, expected) in cases {
            assert_eq!(failure.wallet_error_type(), expected, "{failure}");
        }
    }

    #[test]
    fn dapp_messages() {
        let dup = TransactionApprovalFailure::InvalidTxDuplicate { tx_id: id() };
        assert_eq!(dup.dapp_message(), Some(format!("TXID: {}", id())));
        assert_eq!(dup.tx_id(), Some(id()));

        let wrong = TransactionApprovalFailure::WrongNetwork {
            wallet_network: NetworkId(2),
            request_network: NetworkId(1),
        };
        assert_eq!(
            wrong.dapp_message().unwrap(),
            "Wallet is using network ID: 2, request sent specified network ID: 1"
        );
        assert_eq!(wrong.wallet_error_type(), WalletErrorType::WrongNetwork);

        let epoch = TransactionApprovalFailure::GetEpoch {
            reason: "timeout".into(),
        };
        assert_eq!(epoch.dapp_message(), None);
        assert_eq!(epoch.tx_id(), None);
    }

    #[test]
    fn category_names_are_unique() {
        let mut names: Vec<_> = WalletErrorType::ALL.iter().map(|w| w.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), WalletErrorType::ALL.len());
    }

    #[test]
    fn category_serializes_camel_case() {
        let json =
            serde_json::to_string(&WalletErrorType::SubmittedTransactionWasDuplicate).unwrap();
        assert_eq!(json, "\"submittedTransactionWasDuplicate\"");
    }
}
