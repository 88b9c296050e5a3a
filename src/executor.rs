// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Transaction Executor
//!
//! Submits state-changing contract calls and holds the caller until the
//! transaction is mined.
//!
//! ## Protocol
//!
//! 1. [`TransactionExecutor::preflight`]: wallet connected, then chain client
//!    available. Callers add their own business precondition after this.
//! 2. Submit, obtain the hash, notify "submitted, awaiting confirmation".
//! 3. Poll for the receipt every `receipt_poll_interval` until it arrives,
//!    `confirmation_timeout` elapses, or the shutdown token fires.
//! 4. Return the receipt. Callers notify the final outcome.
//!
//! A caller never sees success before the receipt is observed, and a failed
//! transaction is never retried here.
//!
//! Overlapping submissions of the same kind against the same target are
//! rejected with [`GatewayError::AlreadyInFlight`].

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use alloy::primitives::{Address, TxHash};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::blockchain::{ChainBackend, ContractCall, TxReceipt};
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::notify::{NoticeKind, Notifier};
use crate::wallet::WalletView;

/// What a transaction does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TxKind {
    MintToken,
    CreateProject,
    BuyShares,
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TxKind::MintToken => "mint-token",
            TxKind::CreateProject => "create-project",
            TxKind::BuyShares => "buy-shares",
        };
        f.write_str(label)
    }
}

/// Terminal state of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxOutcome {
    Confirmed,
    Failed,
}

/// An on-chain write from submission to its terminal outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    hash: TxHash,
    kind: TxKind,
    submitted_at: DateTime<Utc>,
    outcome: Option<TxOutcome>,
}

impl PendingTransaction {
    pub fn new(hash: TxHash, kind: TxKind) -> Self {
        Self {
            hash,
            kind,
            submitted_at: Utc::now(),
            outcome: None,
        }
    }

    pub fn hash(&self) -> TxHash {
        self.hash
    }

    pub fn kind(&self) -> TxKind {
        self.kind
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn outcome(&self) -> Option<TxOutcome> {
        self.outcome
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    /// Record the terminal outcome. Returns `false` if one was already set.
    pub fn resolve(&mut self, outcome: TxOutcome) -> bool {
        if self.outcome.is_some() {
            return false;
        }
        self.outcome = Some(outcome);
        true
    }
}

/// A call to submit, tagged for in-flight tracking.
#[derive(Debug, Clone)]
pub struct TxRequest {
    pub kind: TxKind,
    /// Identifies what the call acts on (project id, minting address, uri)
    pub target: String,
    pub call: ContractCall,
}

impl TxRequest {
    pub fn new(kind: TxKind, target: impl Into<String>, call: ContractCall) -> Self {
        Self {
            kind,
            target: target.into(),
            call,
        }
    }
}

/// Result of a successful preflight: who sends, and through which client.
#[derive(Clone)]
pub struct Preflight {
    pub from: Address,
    pub backend: Arc<dyn ChainBackend>,
}

/// A transaction that reached [`TxOutcome::Confirmed`].
#[derive(Debug, Clone)]
pub struct ConfirmedTransaction {
    pub transaction: PendingTransaction,
    pub receipt: TxReceipt,
}

type InFlightKey = (TxKind, String);

#[derive(Default)]
struct InFlightRegistry {
    active: Arc<Mutex<HashSet<InFlightKey>>>,
}

impl InFlightRegistry {
    fn acquire(&self, kind: TxKind, target: &str) -> Result<InFlightGuard, GatewayError> {
        let key = (kind, target.to_string());
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(key.clone()) {
            return Err(GatewayError::AlreadyInFlight(kind.to_string()));
        }
        Ok(InFlightGuard {
            active: Arc::clone(&self.active),
            key,
        })
    }

    fn is_active(&self, kind: TxKind, target: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(kind, target.to_string()))
    }
}

struct InFlightGuard {
    active: Arc<Mutex<HashSet<InFlightKey>>>,
    key: InFlightKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// Submits calls and waits for their confirmation.
pub struct TransactionExecutor {
    wallet: WalletView,
    backend: Option<Arc<dyn ChainBackend>>,
    notifier: Arc<dyn Notifier>,
    in_flight: InFlightRegistry,
    confirmation_timeout: Duration,
    poll_interval: Duration,
    shutdown: CancellationToken,
}

impl TransactionExecutor {
    pub fn new(
        wallet: WalletView,
        backend: Option<Arc<dyn ChainBackend>>,
        notifier: Arc<dyn Notifier>,
        config: &GatewayConfig,
    ) -> Self {
        Self {
            wallet,
            backend,
            notifier,
            in_flight: InFlightRegistry::default(),
            confirmation_timeout: config.confirmation_timeout,
            poll_interval: config.receipt_poll_interval,
            shutdown: CancellationToken::new(),
        }
    }

    /// Abandon confirmation waits when `shutdown` fires.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn backend(&self) -> Option<&Arc<dyn ChainBackend>> {
        self.backend.as_ref()
    }

    /// Whether a transaction of `kind` against `target` is being processed.
    pub fn is_in_flight(&self, kind: TxKind, target: &str) -> bool {
        self.in_flight.is_active(kind, target)
    }

    /// Check the generic preconditions, in order.
    pub fn preflight(&self) -> Result<Preflight, GatewayError> {
        let from = self
            .wallet
            .address()
            .ok_or(GatewayError::WalletNotConnected)?;
        let backend = self
            .backend
            .clone()
            .ok_or(GatewayError::ChainClientUnavailable)?;
        Ok(Preflight { from, backend })
    }

    /// Submit `request` and wait until it is confirmed.
    pub async fn execute(
        &self,
        preflight: &Preflight,
        request: TxRequest,
    ) -> Result<ConfirmedTransaction, GatewayError> {
        let _guard = self.in_flight.acquire(request.kind, &request.target)?;

        let hash = preflight
            .backend
            .send_transaction(preflight.from, &request.call)
            .await
            .map_err(|e| {
                tracing::warn!(kind = %request.kind, target = %request.target, error = %e, "Transaction submission failed");
                GatewayError::TransactionFailed(e.to_string())
            })?;

        let mut transaction = PendingTransaction::new(hash, request.kind);
        tracing::info!(
            kind = %request.kind,
            target = %request.target,
            tx_hash = %hash,
            value = %request.call.value,
            "Transaction submitted"
        );
        self.notifier.notify(
            NoticeKind::Info,
            &format!(
                "Transaction submitted. Awaiting confirmation... ({})",
                preflight.backend.network().tx_url(&hash)
            ),
        );

        let receipt = self
            .wait_for_confirmation(preflight.backend.as_ref(), hash)
            .await
            .inspect_err(|e| {
                tracing::warn!(tx_hash = %hash, error = %e, "Confirmation wait ended without a receipt")
            })?;

        if !receipt.success {
            transaction.resolve(TxOutcome::Failed);
            tracing::warn!(tx_hash = %hash, block = ?receipt.block_number, "Transaction reverted");
            return Err(GatewayError::TransactionFailed(format!(
                "{hash:#x} reverted on chain"
            )));
        }

        transaction.resolve(TxOutcome::Confirmed);
        tracing::info!(
            kind = %request.kind,
            tx_hash = %hash,
            block = ?receipt.block_number,
            logs = receipt.logs.len(),
            "Transaction confirmed"
        );

        Ok(ConfirmedTransaction {
            transaction,
            receipt,
        })
    }

    /// Poll for the receipt, bounded by the confirmation timeout.
    async fn wait_for_confirmation(
        &self,
        backend: &dyn ChainBackend,
        hash: TxHash,
    ) -> Result<TxReceipt, GatewayError> {
        let poll = async {
            loop {
                match backend.transaction_receipt(hash).await {
                    Ok(Some(receipt)) => return receipt,
                    Ok(None) => {}
                    // Transient RPC errors do not end the wait; the timeout does.
                    Err(e) => tracing::debug!(tx_hash = %hash, error = %e, "Receipt poll failed"),
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        };

        tokio::select! {
            result = tokio::time::timeout(self.confirmation_timeout, poll) => {
                result.map_err(|_| GatewayError::ConfirmationTimeout {
                    hash: format!("{hash:#x}"),
                    timeout: self.confirmation_timeout,
                })
            }
            _ = self.shutdown.cancelled() => Err(GatewayError::Cancelled(format!("{hash:#x}"))),
        }
    }
}
