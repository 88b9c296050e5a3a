// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use alloy::primitives::{Address, Bytes, Log, TxHash, U256};
use serde::{Deserialize, Serialize};

/// EVM network configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Short key used in configuration (`mainnet`, `sepolia`)
    pub key: &'static str,
    /// Network name for display
    pub name: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// Default public RPC endpoint URL
    pub rpc_url: &'static str,
    /// Block explorer URL
    pub explorer_url: &'static str,
    /// Native currency symbol
    pub native_symbol: &'static str,
}

/// Ethereum Mainnet configuration.
pub const ETH_MAINNET: NetworkConfig = NetworkConfig {
    key: "mainnet",
    name: "Ethereum Mainnet",
    chain_id: 1,
    rpc_url: "https://eth.merkle.io",
    explorer_url: "https://etherscan.io",
    native_symbol: "ETH",
};

/// Ethereum Sepolia Testnet configuration.
pub const ETH_SEPOLIA: NetworkConfig = NetworkConfig {
    key: "sepolia",
    name: "Sepolia Testnet",
    chain_id: 11_155_111,
    rpc_url: "https://sepolia.drpc.org",
    explorer_url: "https://sepolia.etherscan.io",
    native_symbol: "ETH",
};

/// Statically declared networks the platform can run against.
pub const SUPPORTED_NETWORKS: [NetworkConfig; 2] = [ETH_MAINNET, ETH_SEPOLIA];

impl NetworkConfig {
    /// Look up a supported network by its configuration key.
    pub fn by_key(key: &str) -> Option<NetworkConfig> {
        let key = key.trim().to_ascii_lowercase();
        SUPPORTED_NETWORKS.into_iter().find(|n| n.key == key)
    }

    /// Look up a supported network by chain id.
    pub fn by_chain_id(chain_id: u64) -> Option<NetworkConfig> {
        SUPPORTED_NETWORKS
            .into_iter()
            .find(|n| n.chain_id == chain_id)
    }

    /// Explorer link for a transaction hash.
    pub fn tx_url(&self, hash: &TxHash) -> String {
        format!("{}/tx/{hash:#x}", self.explorer_url)
    }
}

/// Deployed addresses of the two platform contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
    /// Access-token (ERC-721) contract
    pub access_token: Address,
    /// Project/shares (ERC-1155) contract
    pub project: Address,
}

/// Price of minting one access token: 0.1 native units (1e17 wei).
pub const ACCESS_TOKEN_MINT_PRICE: U256 = U256::from_limbs([100_000_000_000_000_000, 0, 0, 0]);

/// Decimals of the native currency on every supported network.
pub const NATIVE_DECIMALS: u8 = 18;

/// On-chain project state as returned by `getProjectInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Address that created the project
    pub creator: Address,
    /// Total shares issued
    pub total_shares: U256,
    /// Shares still for sale
    pub available_shares: U256,
    /// Price of one share in wei
    pub price_per_share: U256,
    /// Creation timestamp (unix seconds)
    pub creation_date: U256,
}

/// An encoded state-changing call ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    /// Target contract
    pub to: Address,
    /// ABI-encoded calldata
    pub input: Bytes,
    /// Native value attached to payable calls
    pub value: U256,
}

/// Transaction receipt after confirmation.
#[derive(Debug, Clone)]
pub struct TxReceipt {
    /// Transaction hash
    pub tx_hash: TxHash,
    /// Block number where the transaction was included
    pub block_number: Option<u64>,
    /// Whether the transaction executed successfully
    pub success: bool,
    /// Logs emitted by the transaction, in emission order
    pub logs: Vec<Log>,
}
