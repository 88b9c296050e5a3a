// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Share purchase flow: pay by wallet or by (simulated) card, then record
//! the investment.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use crate::blockchain::{format_amount, parse_amount, share_cost, NATIVE_DECIMALS};
use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::investments::{InvestmentRecord, PaymentMethod};
use crate::notify::NoticeKind;
use crate::profile::Identity;

/// What the buyer asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub project_id: u64,
    pub project_name: String,
    /// Price of one share in native units
    pub price_per_share: String,
    /// Shares still available
    pub max_shares: u64,
    pub quantity: u64,
}

impl PurchaseRequest {
    /// Quantity clamped to `[1, max_shares]`.
    pub fn clamped_quantity(&self) -> u64 {
        self.quantity.clamp(1, self.max_shares.max(1))
    }
}

impl Gateway {
    /// Run a purchase and record it. `true` once the investment is recorded.
    pub async fn purchase_shares(
        &self,
        identity: Option<&Identity>,
        request: &PurchaseRequest,
        method: PaymentMethod,
    ) -> bool {
        match self.try_purchase_shares(identity, request, method).await {
            Ok(record) => {
                self.notifier().notify(
                    NoticeKind::Success,
                    &format!(
                        "You now own {} shares of {}.",
                        record.shares, record.project_name
                    ),
                );
                true
            }
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    pub async fn try_purchase_shares(
        &self,
        identity: Option<&Identity>,
        request: &PurchaseRequest,
        method: PaymentMethod,
    ) -> Result<InvestmentRecord, GatewayError> {
        let identity = identity.ok_or(GatewayError::NotAuthenticated)?;
        if request.max_shares == 0 {
            return Err(GatewayError::InvalidRequest(format!(
                "{} has no shares left",
                request.project_name
            )));
        }
        let quantity = request.clamped_quantity();
        let price = parse_amount(&request.price_per_share, NATIVE_DECIMALS)?;
        let total = share_cost(price, quantity)?;

        let tx_hash = match method {
            PaymentMethod::Crypto => Some(self.pay_with_wallet(request, quantity).await?),
            PaymentMethod::Fiat => {
                self.pay_with_card(request, quantity, total).await;
                None
            }
        };

        let record = InvestmentRecord::new(
            identity.user_id.clone(),
            request.project_id,
            request.project_name.clone(),
            total,
            quantity,
            method,
            tx_hash,
        );
        self.ledger().record(record.clone()).await?;
        tracing::info!(
            user_id = %identity.user_id,
            project_id = request.project_id,
            shares = quantity,
            method = ?method,
            "Investment completed"
        );
        Ok(record)
    }

    async fn pay_with_wallet(
        &self,
        request: &PurchaseRequest,
        quantity: u64,
    ) -> Result<String, GatewayError> {
        if !self.wallet().is_connected() {
            self.session().connect().await?;
        }
        // Gate and submission happen in the buy itself
        let confirmed = self
            .try_buy_project_shares(request.project_id, quantity, &request.price_per_share)
            .await?;
        Ok(format!("{:#x}", confirmed.transaction.hash()))
    }

    /// Stand-in for a card processor: wait, then accept.
    async fn pay_with_card(&self, request: &PurchaseRequest, quantity: u64, total: U256) {
        tracing::info!(
            project_id = request.project_id,
            shares = quantity,
            total = %format_amount(total, NATIVE_DECIMALS),
            "Processing card payment"
        );
        tokio::time::sleep(self.config().fiat_delay).await;
        self.notifier()
            .notify(NoticeKind::Info, "Payment processed successfully.");
    }
}
