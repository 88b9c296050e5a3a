// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Extract structured results from the logs of a confirmed transaction.
//!
//! A log matches when it was emitted by the expected contract, carries the
//! event's signature topic and decodes against the event's ABI. Exactly one
//! match is required; zero or several are reported as soft failures since
//! the transaction itself is already confirmed.

use alloy::primitives::Address;
use alloy::sol_types::SolEvent;

use crate::blockchain::contracts::IProjectShares::{ProjectCreated, SharesPurchased};
use crate::blockchain::TxReceipt;
use crate::error::GatewayError;

pub struct EventResolver {
    emitter: Address,
}

impl EventResolver {
    /// Resolver for events emitted by `emitter`.
    pub fn new(emitter: Address) -> Self {
        Self { emitter }
    }

    /// The unique `E` emitted by the expected contract in `receipt`.
    pub fn resolve<E: SolEvent>(&self, receipt: &TxReceipt) -> Result<E, GatewayError> {
        let name = event_name::<E>();
        let mut matches = receipt
            .logs
            .iter()
            .filter(|log| log.address == self.emitter)
            .filter(|log| log.data.topics().first() == Some(&E::SIGNATURE_HASH))
            .filter_map(|log| match E::decode_log_data(&log.data) {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::debug!(event = name, error = %e, "Skipping undecodable log");
                    None
                }
            });

        let event = matches.next().ok_or(GatewayError::EventNotFound(name))?;
        let extra = matches.count();
        if extra > 0 {
            return Err(GatewayError::EventAmbiguous {
                event: name,
                matches: extra + 1,
            });
        }
        Ok(event)
    }

    pub fn resolve_project_created(&self, receipt: &TxReceipt) -> Result<ProjectCreated, GatewayError> {
        self.resolve(receipt)
    }

    pub fn resolve_shares_purchased(
        &self,
        receipt: &TxReceipt,
    ) -> Result<SharesPurchased, GatewayError> {
        self.resolve(receipt)
    }
}

/// `ProjectCreated(uint256,...)` -> `ProjectCreated`
fn event_name<E: SolEvent>() -> &'static str {
    E::SIGNATURE.split('(').next().unwrap_or(E::SIGNATURE)
}
