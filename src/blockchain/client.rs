// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain client for the platform contracts.
//!
//! [`ChainBackend`] is the seam every gateway component talks to: a handful
//! of read-only contract queries, transaction submission and receipt lookup.
//! [`AlloyBackend`] implements it over an alloy HTTP provider.

use alloy::{
    network::{EthereumWallet, ReceiptResponse},
    primitives::{Address, TxHash, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
};
use async_trait::async_trait;

use super::contracts::{IAccessToken, IProjectShares};
use super::types::{ContractAddresses, ContractCall, NetworkConfig, ProjectInfo, TxReceipt};

/// Read and write access to the platform contracts on one network.
#[async_trait]
pub trait ChainBackend: Send + Sync {
    /// Network this backend is bound to.
    fn network(&self) -> &NetworkConfig;

    /// Deployed contract addresses.
    fn contracts(&self) -> &ContractAddresses;

    /// Access-token `balanceOf(owner)`.
    async fn access_token_balance(&self, owner: Address) -> Result<U256, ChainClientError>;

    /// Access-token `tokenOfOwnerByIndex(owner, index)`.
    async fn access_token_of_owner_by_index(
        &self,
        owner: Address,
        index: U256,
    ) -> Result<U256, ChainClientError>;

    /// Project contract `balanceOf(account, projectId)`.
    async fn share_balance(&self, account: Address, project_id: U256)
        -> Result<U256, ChainClientError>;

    /// Project contract `getProjectInfo(projectId)`.
    async fn project_info(&self, project_id: U256) -> Result<ProjectInfo, ChainClientError>;

    /// Sign and broadcast a call from `from`, returning the transaction hash.
    async fn send_transaction(
        &self,
        from: Address,
        call: &ContractCall,
    ) -> Result<TxHash, ChainClientError>;

    /// Receipt for a transaction, or `None` while it is not yet mined.
    async fn transaction_receipt(&self, hash: TxHash)
        -> Result<Option<TxReceipt>, ChainClientError>;
}

/// [`ChainBackend`] over an alloy HTTP provider.
pub struct AlloyBackend {
    /// Network configuration
    network: NetworkConfig,
    /// Deployed contract addresses
    contracts: ContractAddresses,
    /// Alloy provider, with a wallet filler when a signer was supplied
    provider: DynProvider,
}

impl AlloyBackend {
    /// Create a backend for `network`, optionally overriding its RPC URL.
    ///
    /// Without a wallet the backend can still read, but every
    /// [`ChainBackend::send_transaction`] is rejected by the node.
    pub fn new(
        network: NetworkConfig,
        rpc_url: Option<&str>,
        contracts: ContractAddresses,
        wallet: Option<EthereumWallet>,
    ) -> Result<Self, ChainClientError> {
        let url: url::Url = rpc_url
            .unwrap_or(network.rpc_url)
            .parse()
            .map_err(|e: url::ParseError| ChainClientError::InvalidRpcUrl(e.to_string()))?;

        let provider = match wallet {
            Some(wallet) => ProviderBuilder::new().wallet(wallet).connect_http(url).erased(),
            None => ProviderBuilder::new().connect_http(url).erased(),
        };

        Ok(Self {
            network,
            contracts,
            provider,
        })
    }
}

#[async_trait]
impl ChainBackend for AlloyBackend {
    fn network(&self) -> &NetworkConfig {
        &self.network
    }

    fn contracts(&self) -> &ContractAddresses {
        &self.contracts
    }

    async fn access_token_balance(&self, owner: Address) -> Result<U256, ChainClientError> {
        let contract = IAccessToken::new(self.contracts.access_token, self.provider.clone());
        contract
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| ChainClientError::ContractError(e.to_string()))
    }

    async fn access_token_of_owner_by_index(
        &self,
        owner: Address,
        index: U256,
    ) -> Result<U256, ChainClientError> {
        let contract = IAccessToken::new(self.contracts.access_token, self.provider.clone());
        contract
            .tokenOfOwnerByIndex(owner, index)
            .call()
            .await
            .map_err(|e| ChainClientError::ContractError(e.to_string()))
    }

    async fn share_balance(
        &self,
        account: Address,
        project_id: U256,
    ) -> Result<U256, ChainClientError> {
        let contract = IProjectShares::new(self.contracts.project, self.provider.clone());
        contract
            .balanceOf(account, project_id)
            .call()
            .await
            .map_err(|e| ChainClientError::ContractError(e.to_string()))
    }

    async fn project_info(&self, project_id: U256) -> Result<ProjectInfo, ChainClientError> {
        let contract = IProjectShares::new(self.contracts.project, self.provider.clone());
        let info = contract
            .getProjectInfo(project_id)
            .call()
            .await
            .map_err(|e| ChainClientError::ContractError(e.to_string()))?;

        Ok(ProjectInfo {
            creator: info.creator,
            total_shares: info.totalShares,
            available_shares: info.availableShares,
            price_per_share: info.pricePerShare,
            creation_date: info.creationDate,
        })
    }

    async fn send_transaction(
        &self,
        from: Address,
        call: &ContractCall,
    ) -> Result<TxHash, ChainClientError> {
        let tx = TransactionRequest::default()
            .from(from)
            .to(call.to)
            .input(call.input.clone().into())
            .value(call.value);

        let pending = self.provider.send_transaction(tx).await.map_err(|e| {
            ChainClientError::TransactionFailed(format!("Failed to send: {e}"))
        })?;

        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> Result<Option<TxReceipt>, ChainClientError> {
        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| ChainClientError::RpcError(format!("Failed to get receipt: {e}")))?;

        Ok(receipt.map(|r| TxReceipt {
            tx_hash: hash,
            block_number: r.block_number(),
            success: r.status(),
            logs: r.inner.logs().iter().map(|log| log.inner.clone()).collect(),
        }))
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainClientError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Contract error: {0}")]
    ContractError(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
}
