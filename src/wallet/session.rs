// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet session: the single source of truth for "is a wallet connected,
//! to which address, on which network".
//!
//! [`WalletSession`] is the only writer. Everyone else holds a
//! [`WalletView`], a read-only handle that can also wait for changes.

use std::sync::Arc;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::blockchain::NetworkConfig;
use crate::error::GatewayError;
use crate::notify::{NoticeKind, Notifier};

use super::connector::WalletConnector;

/// Connection status of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Snapshot of the externally connected account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WalletAccount {
    pub status: ConnectionStatus,
    pub address: Option<Address>,
    pub chain_id: Option<u64>,
}

impl WalletAccount {
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn connected(address: Address, chain_id: u64) -> Self {
        Self {
            status: ConnectionStatus::Connected,
            address: Some(address),
            chain_id: Some(chain_id),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected && self.address.is_some()
    }

    pub fn is_connecting(&self) -> bool {
        self.status == ConnectionStatus::Connecting
    }

    /// Address, but only while connected.
    pub fn connected_address(&self) -> Option<Address> {
        if self.is_connected() {
            self.address
        } else {
            None
        }
    }
}

/// Owner of the wallet connection state.
pub struct WalletSession {
    connectors: Vec<Arc<dyn WalletConnector>>,
    state: watch::Sender<WalletAccount>,
    notifier: Arc<dyn Notifier>,
}

impl WalletSession {
    pub fn new(connectors: Vec<Arc<dyn WalletConnector>>, notifier: Arc<dyn Notifier>) -> Self {
        let (state, _) = watch::channel(WalletAccount::disconnected());
        Self {
            connectors,
            state,
            notifier,
        }
    }

    /// A read-only handle on the session state.
    pub fn view(&self) -> WalletView {
        WalletView {
            rx: self.state.subscribe(),
        }
    }

    pub fn snapshot(&self) -> WalletAccount {
        *self.state.borrow()
    }

    /// Activate the first available connector.
    ///
    /// No retries. On failure the previous state is restored and the error
    /// is returned to the caller; a notification is emitted either way.
    pub async fn connect(&self) -> Result<WalletAccount, GatewayError> {
        let previous = self.snapshot();
        if previous.is_connected() {
            return Ok(previous);
        }
        if previous.is_connecting() {
            let err = GatewayError::AlreadyInFlight("wallet connection".to_string());
            self.notifier.notify(NoticeKind::Destructive, &err.to_string());
            return Err(err);
        }

        let Some(connector) = self.connectors.first() else {
            let err = GatewayError::NoConnectorAvailable;
            self.notifier.notify(NoticeKind::Destructive, &err.to_string());
            return Err(err);
        };

        self.state.send_modify(|state| state.status = ConnectionStatus::Connecting);
        tracing::debug!(connector = connector.name(), "Activating wallet connector");

        match connector.activate().await {
            Ok(account) => {
                let snapshot = WalletAccount::connected(account.address, account.chain_id);
                self.state.send_replace(snapshot);

                if NetworkConfig::by_chain_id(account.chain_id).is_none() {
                    tracing::warn!(
                        chain_id = account.chain_id,
                        "Wallet connected to an unsupported network"
                    );
                }
                tracing::info!(
                    address = %account.address,
                    chain_id = account.chain_id,
                    connector = connector.name(),
                    "Wallet connected"
                );
                self.notifier.notify(
                    NoticeKind::Success,
                    &format!("Wallet connected: {}", account.address),
                );
                Ok(snapshot)
            }
            Err(err) => {
                self.state.send_replace(previous);
                tracing::warn!(error = %err, connector = connector.name(), "Wallet connection failed");
                self.notifier.notify(NoticeKind::Destructive, &err.to_string());
                Err(err)
            }
        }
    }

    /// Drop the connection. Consumers must clear derived state.
    pub fn disconnect(&self) {
        let previous = self.state.send_replace(WalletAccount::disconnected());
        if previous.is_connected() {
            tracing::info!(address = ?previous.address, "Wallet disconnected");
        }
    }

    /// The wallet switched accounts; `None` means it locked or revoked access.
    pub fn on_account_changed(&self, address: Option<Address>) {
        match address {
            Some(address) => {
                self.state.send_if_modified(|state| {
                    if !state.is_connected() || state.address == Some(address) {
                        return false;
                    }
                    tracing::info!(from = ?state.address, to = %address, "Wallet account changed");
                    state.address = Some(address);
                    true
                });
            }
            None => self.disconnect(),
        }
    }

    /// The wallet switched networks.
    pub fn on_chain_changed(&self, chain_id: u64) {
        self.state.send_if_modified(|state| {
            if !state.is_connected() || state.chain_id == Some(chain_id) {
                return false;
            }
            tracing::info!(from = ?state.chain_id, to = chain_id, "Wallet network changed");
            state.chain_id = Some(chain_id);
            true
        });
    }
}

/// Read-only view of the wallet session.
#[derive(Clone)]
pub struct WalletView {
    rx: watch::Receiver<WalletAccount>,
}

impl WalletView {
    pub fn snapshot(&self) -> WalletAccount {
        *self.rx.borrow()
    }

    pub fn address(&self) -> Option<Address> {
        self.snapshot().connected_address()
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.snapshot().chain_id
    }

    pub fn is_connected(&self) -> bool {
        self.snapshot().is_connected()
    }

    pub fn is_connecting(&self) -> bool {
        self.snapshot().is_connecting()
    }

    /// Wait for the next state change and return the new snapshot.
    ///
    /// Returns `None` once the session has been dropped.
    pub async fn changed(&mut self) -> Option<WalletAccount> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}
