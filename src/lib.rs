// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Kick DAO Gateway - wallet-gated access and transaction workflow
//!
//! This crate sits between the crowdfunding platform and its two EVM
//! contracts: an access-token (ERC-721) contract and a project/shares
//! (ERC-1155) contract.
//!
//! ## Modules
//!
//! - `wallet` - Wallet session (single writer) and connectors
//! - `access` - Access-token gate and its per-account cache
//! - `executor` - Confirmed transaction submission
//! - `events` - Event extraction from confirmed receipts
//! - `profile` - Wallet address sync into the user profile
//! - `investments` - Investment ledger
//! - `projects` - Project registration and its off-chain records
//! - `gateway` - The facade tying everything together
//! - `purchase` - Share purchase flow (wallet or card)
//! - `blockchain` - Networks, contract bindings and the chain client

pub mod access;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod events;
pub mod executor;
pub mod gateway;
pub mod investments;
pub mod notify;
pub mod profile;
pub mod projects;
pub mod purchase;
pub mod wallet;

#[cfg(test)]
mod testing;
