// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::time::Duration;

use crate::blockchain::ChainClientError;
use crate::notify::NoticeKind;

/// Everything that can stop a gated action.
///
/// None of these escape the gateway boundary: [`crate::gateway::Gateway`]
/// turns each into a notification and a negative return value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("Wallet not connected. Connect your wallet to continue.")]
    WalletNotConnected,

    #[error("No wallet connector available. Install a wallet to continue.")]
    NoConnectorAvailable,

    #[error("Wallet connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Blockchain client unavailable. Could not reach the network.")]
    ChainClientUnavailable,

    #[error("Access denied: an access token is required to {0}.")]
    AccessDenied(&'static str),

    #[error("A {0} is already in flight for this target.")]
    AlreadyInFlight(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Transaction {hash} was not confirmed within {}s.", .timeout.as_secs())]
    ConfirmationTimeout { hash: String, timeout: Duration },

    #[error("Stopped waiting for transaction {0}.")]
    Cancelled(String),

    #[error("Transaction confirmed, but the {0} event could not be found.")]
    EventNotFound(&'static str),

    #[error("Transaction confirmed, but {matches} {event} events were emitted.")]
    EventAmbiguous { event: &'static str, matches: usize },

    #[error("Transaction confirmed, but the access token could not be verified.")]
    TokenNotVerified,

    #[error("Sign in to continue.")]
    NotAuthenticated,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Profile store error: {0}")]
    Store(String),

    #[error(transparent)]
    Chain(#[from] ChainClientError),
}

impl GatewayError {
    /// How the error is presented to the user.
    ///
    /// Confirmed-but-unknown outcomes are softer than outright failures.
    pub fn notice_kind(&self) -> NoticeKind {
        match self {
            GatewayError::EventNotFound(_)
            | GatewayError::EventAmbiguous { .. }
            | GatewayError::TokenNotVerified => NoticeKind::Warning,
            _ => NoticeKind::Destructive,
        }
    }

    /// Whether the transaction reached the chain and was confirmed.
    pub fn is_confirmed_on_chain(&self) -> bool {
        matches!(
            self,
            GatewayError::EventNotFound(_)
                | GatewayError::EventAmbiguous { .. }
                | GatewayError::TokenNotVerified
        )
    }
}
