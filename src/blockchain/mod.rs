// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain integration for the platform contracts.
//!
//! This module provides functionality for:
//! - Declaring the supported EVM networks
//! - Encoding calls to the access-token and project/shares contracts
//! - Querying contract state and broadcasting transactions
//! - Converting native amounts to and from base units

pub mod client;
pub mod contracts;
pub mod types;
pub mod units;

pub use client::{AlloyBackend, ChainBackend, ChainClientError};
pub use types::*;
pub use units::{format_amount, parse_amount, share_cost};
