// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet connection state and connectors.

pub mod connector;
pub mod session;
pub mod signing;

pub use connector::{ConnectedAccount, LocalKeyConnector, WalletConnector};
pub use session::{ConnectionStatus, WalletAccount, WalletSession, WalletView};
