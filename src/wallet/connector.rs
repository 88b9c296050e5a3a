// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet connectors.
//!
//! A connector is whatever the environment offers to activate an account:
//! a browser extension, a hardware device, or a local key. The session only
//! ever uses the first one available.

use alloy::{network::EthereumWallet, primitives::Address, signers::local::PrivateKeySigner};
use async_trait::async_trait;

use crate::blockchain::ChainClientError;
use crate::error::GatewayError;

use super::signing::{signer_from_hex, signer_from_pem};

/// Account and network reported by a connector after activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectedAccount {
    pub address: Address,
    pub chain_id: u64,
}

/// A way of activating an external account.
#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Display name (e.g. "Injected", "Local key").
    fn name(&self) -> &str;

    /// Ask the wallet to expose an account. May wait on user approval.
    async fn activate(&self) -> Result<ConnectedAccount, GatewayError>;
}

/// Connector backed by a private key held by this process.
pub struct LocalKeyConnector {
    signer: PrivateKeySigner,
    chain_id: u64,
}

impl LocalKeyConnector {
    pub fn new(signer: PrivateKeySigner, chain_id: u64) -> Self {
        Self { signer, chain_id }
    }

    pub fn from_hex(private_key_hex: &str, chain_id: u64) -> Result<Self, ChainClientError> {
        Ok(Self::new(signer_from_hex(private_key_hex)?, chain_id))
    }

    pub fn from_pem(pem_bytes: &[u8], chain_id: u64) -> Result<Self, ChainClientError> {
        Ok(Self::new(signer_from_pem(pem_bytes)?, chain_id))
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Wallet filler for a provider that should sign as this key.
    pub fn wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

#[async_trait]
impl WalletConnector for LocalKeyConnector {
    fn name(&self) -> &str {
        "Local key"
    }

    async fn activate(&self) -> Result<ConnectedAccount, GatewayError> {
        Ok(ConnectedAccount {
            address: self.signer.address(),
            chain_id: self.chain_id,
        })
    }
}
