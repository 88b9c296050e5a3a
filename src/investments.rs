// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Investment records kept alongside on-chain share purchases.
//!
//! The chain remains the authority on share balances; the ledger only
//! remembers who bought what, how and when, for portfolio views.

use std::collections::HashMap;

use alloy::primitives::U256;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::GatewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Crypto,
    Fiat,
}

/// One completed investment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentRecord {
    pub id: String,
    pub user_id: String,
    pub project_id: u64,
    pub project_name: String,
    /// Amount paid, in wei
    pub amount_wei: String,
    pub shares: u64,
    pub payment_method: PaymentMethod,
    /// Transaction hash for crypto payments
    pub tx_hash: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl InvestmentRecord {
    pub fn new(
        user_id: impl Into<String>,
        project_id: u64,
        project_name: impl Into<String>,
        amount: U256,
        shares: u64,
        payment_method: PaymentMethod,
        tx_hash: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            project_id,
            project_name: project_name.into(),
            amount_wei: amount.to_string(),
            shares,
            payment_method,
            tx_hash,
            timestamp: Utc::now(),
        }
    }

    /// Amount paid; zero if the stored value is malformed.
    pub fn amount(&self) -> U256 {
        U256::from_str_radix(&self.amount_wei, 10).unwrap_or_default()
    }
}

/// Per-project totals for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInvestment {
    pub project_id: u64,
    pub project_name: String,
    pub total_amount_wei: String,
    pub total_shares: u64,
}

#[async_trait]
pub trait InvestmentLedger: Send + Sync {
    async fn record(&self, record: InvestmentRecord) -> Result<(), GatewayError>;

    /// A user's investments, newest first.
    async fn user_investments(&self, user_id: &str) -> Result<Vec<InvestmentRecord>, GatewayError>;

    /// Every investment in a project, newest first.
    async fn project_investors(
        &self,
        project_id: u64,
    ) -> Result<Vec<InvestmentRecord>, GatewayError>;
}

/// Total a user has invested across all projects.
pub async fn total_invested(
    ledger: &dyn InvestmentLedger,
    user_id: &str,
) -> Result<U256, GatewayError> {
    Ok(ledger
        .user_investments(user_id)
        .await?
        .iter()
        .fold(U256::ZERO, |total, record| total.saturating_add(record.amount())))
}

/// A user's investments grouped by project, most recently invested first.
pub async fn investments_by_project(
    ledger: &dyn InvestmentLedger,
    user_id: &str,
) -> Result<Vec<ProjectInvestment>, GatewayError> {
    let mut order = Vec::new();
    let mut totals: HashMap<u64, (String, U256, u64)> = HashMap::new();

    for record in ledger.user_investments(user_id).await? {
        let entry = totals.entry(record.project_id).or_insert_with(|| {
            order.push(record.project_id);
            (record.project_name.clone(), U256::ZERO, 0)
        });
        entry.1 = entry.1.saturating_add(record.amount());
        entry.2 = entry.2.saturating_add(record.shares);
    }

    Ok(order
        .into_iter()
        .filter_map(|project_id| {
            totals
                .remove(&project_id)
                .map(|(project_name, amount, shares)| ProjectInvestment {
                    project_id,
                    project_name,
                    total_amount_wei: amount.to_string(),
                    total_shares: shares,
                })
        })
        .collect())
}

/// Ledger kept in memory.
#[derive(Default)]
pub struct InMemoryInvestmentLedger {
    records: RwLock<Vec<InvestmentRecord>>,
}

#[async_trait]
impl InvestmentLedger for InMemoryInvestmentLedger {
    async fn record(&self, record: InvestmentRecord) -> Result<(), GatewayError> {
        tracing::debug!(
            user_id = %record.user_id,
            project_id = record.project_id,
            shares = record.shares,
            method = ?record.payment_method,
            "Investment recorded"
        );
        self.records.write().await.push(record);
        Ok(())
    }

    async fn user_investments(&self, user_id: &str) -> Result<Vec<InvestmentRecord>, GatewayError> {
        let mut records: Vec<_> = self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }

    async fn project_investors(
        &self,
        project_id: u64,
    ) -> Result<Vec<InvestmentRecord>, GatewayError> {
        let mut records: Vec<_> = self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }
}
