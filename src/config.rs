// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! [`GatewayConfig`] loaded from them at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `KDAO_NETWORK` | Network key (`mainnet` or `sepolia`) | `sepolia` |
//! | `KDAO_RPC_URL` | RPC endpoint override | Network default |
//! | `KDAO_ACCESS_TOKEN_ADDRESS` | Access-token contract address | Platform deployment |
//! | `KDAO_PROJECT_ADDRESS` | Project/shares contract address | Platform deployment |
//! | `KDAO_CONFIRMATION_TIMEOUT_SECS` | Upper bound on a confirmation wait | `300` |
//! | `KDAO_RECEIPT_POLL_MS` | Receipt polling interval | `2000` |
//! | `KDAO_FIAT_DELAY_MS` | Simulated fiat processing delay | `2000` |
//! | `KDAO_PRIVATE_KEY` | Hex private key for the local connector (binary only) | None |
//! | `KDAO_KEY_PEM` | Path to a PEM private key (binary only) | None |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::Address;

use crate::blockchain::{ContractAddresses, NetworkConfig, ETH_SEPOLIA};

pub const NETWORK_ENV: &str = "KDAO_NETWORK";
pub const RPC_URL_ENV: &str = "KDAO_RPC_URL";
pub const ACCESS_TOKEN_ADDRESS_ENV: &str = "KDAO_ACCESS_TOKEN_ADDRESS";
pub const PROJECT_ADDRESS_ENV: &str = "KDAO_PROJECT_ADDRESS";
pub const CONFIRMATION_TIMEOUT_ENV: &str = "KDAO_CONFIRMATION_TIMEOUT_SECS";
pub const RECEIPT_POLL_ENV: &str = "KDAO_RECEIPT_POLL_MS";
pub const FIAT_DELAY_ENV: &str = "KDAO_FIAT_DELAY_MS";
pub const PRIVATE_KEY_ENV: &str = "KDAO_PRIVATE_KEY";
pub const KEY_PEM_ENV: &str = "KDAO_KEY_PEM";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Access-token contract of the platform deployment.
pub const DEFAULT_ACCESS_TOKEN_ADDRESS: &str = "0x123456789abcdef123456789abcdef123456789a";

/// Project/shares contract of the platform deployment.
pub const DEFAULT_PROJECT_ADDRESS: &str = "0xabcdef123456789abcdef123456789abcdef1234";

pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_FIAT_DELAY: Duration = Duration::from_millis(2000);

/// Resolved gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub network: NetworkConfig,
    pub rpc_url: Option<String>,
    pub contracts: ContractAddresses,
    pub confirmation_timeout: Duration,
    pub receipt_poll_interval: Duration,
    pub fiat_delay: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            network: ETH_SEPOLIA,
            rpc_url: None,
            contracts: ContractAddresses {
                access_token: Address::from_str(DEFAULT_ACCESS_TOKEN_ADDRESS)
                    .unwrap_or(Address::ZERO),
                project: Address::from_str(DEFAULT_PROJECT_ADDRESS).unwrap_or(Address::ZERO),
            },
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            receipt_poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
            fiat_delay: DEFAULT_FIAT_DELAY,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let network = match get(NETWORK_ENV) {
            Some(raw) => NetworkConfig::by_key(&raw).ok_or(ConfigError::UnsupportedNetwork(raw))?,
            None => defaults.network,
        };

        let rpc_url = match get(RPC_URL_ENV) {
            Some(raw) => {
                url::Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid {
                    key: RPC_URL_ENV,
                    reason: e.to_string(),
                })?;
                Some(raw.trim().to_string())
            }
            None => None,
        };

        let contracts = ContractAddresses {
            access_token: parse_address(ACCESS_TOKEN_ADDRESS_ENV, get(ACCESS_TOKEN_ADDRESS_ENV))?
                .unwrap_or(defaults.contracts.access_token),
            project: parse_address(PROJECT_ADDRESS_ENV, get(PROJECT_ADDRESS_ENV))?
                .unwrap_or(defaults.contracts.project),
        };

        let confirmation_timeout = parse_u64(CONFIRMATION_TIMEOUT_ENV, get(CONFIRMATION_TIMEOUT_ENV))?
            .map(Duration::from_secs)
            .unwrap_or(defaults.confirmation_timeout);
        let receipt_poll_interval = parse_u64(RECEIPT_POLL_ENV, get(RECEIPT_POLL_ENV))?
            .map(Duration::from_millis)
            .unwrap_or(defaults.receipt_poll_interval);
        let fiat_delay = parse_u64(FIAT_DELAY_ENV, get(FIAT_DELAY_ENV))?
            .map(Duration::from_millis)
            .unwrap_or(defaults.fiat_delay);

        if confirmation_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: CONFIRMATION_TIMEOUT_ENV,
                reason: "must be greater than zero".to_string(),
            });
        }
        if receipt_poll_interval.is_zero() {
            return Err(ConfigError::Invalid {
                key: RECEIPT_POLL_ENV,
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            network,
            rpc_url,
            contracts,
            confirmation_timeout,
            receipt_poll_interval,
            fiat_delay,
        })
    }
}

fn parse_address(key: &'static str, raw: Option<String>) -> Result<Option<Address>, ConfigError> {
    raw.map(|value| {
        Address::from_str(value.trim()).map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        })
    })
    .transpose()
}

fn parse_u64(key: &'static str, raw: Option<String>) -> Result<Option<u64>, ConfigError> {
    raw.map(|value| {
        value.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        })
    })
    .transpose()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Unsupported network `{0}` (expected `mainnet` or `sepolia`)")]
    UnsupportedNetwork(String),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
