// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Project registration: create the project on chain, then keep an
//! off-chain record of it for listings and detail pages.
//!
//! The record is written once the creation transaction is confirmed, even
//! if the on-chain project id could not be recovered from its events.

use alloy::primitives::U256;
use async_trait::async_trait;
use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::blockchain::{format_amount, parse_amount, NATIVE_DECIMALS};
use crate::error::GatewayError;
use crate::gateway::{validate_project, Gateway};
use crate::notify::NoticeKind;
use crate::profile::Identity;

/// A funding milestone as entered by the creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub title: String,
    pub description: String,
    /// Amount released at this milestone, in native units
    pub amount: String,
}

/// What the creator filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub name: String,
    pub category: String,
    pub description: String,
    pub cover_image: String,
    /// Funding goal in native units
    pub funding_goal: String,
    pub total_shares: u64,
    /// Months from registration until the funding deadline
    pub execution_months: u32,
    pub milestones: Vec<Milestone>,
}

impl ProjectDraft {
    /// JSON metadata used as the on-chain project uri.
    pub fn metadata_uri(&self) -> Result<String, GatewayError> {
        serde_json::to_string(&serde_json::json!({
            "name": self.name,
            "description": self.description,
            "image": self.cover_image,
            "category": self.category,
        }))
        .map_err(|e| GatewayError::InvalidRequest(format!("project metadata: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMilestone {
    pub title: String,
    pub description: String,
    pub amount_wei: String,
    pub completed: bool,
}

/// Off-chain record of a registered project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: String,
    pub creator_id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub cover_image: String,
    pub funding_goal_wei: String,
    pub price_per_share_wei: String,
    pub total_shares: u64,
    pub shares_remaining: u64,
    pub deadline: DateTime<Utc>,
    pub milestones: Vec<StoredMilestone>,
    /// `None` when creation was confirmed but its id could not be resolved
    pub on_chain_project_id: Option<u64>,
    pub tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ProjectRecord {
    pub fn price_per_share(&self) -> U256 {
        U256::from_str_radix(&self.price_per_share_wei, 10).unwrap_or_default()
    }
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn create(&self, record: ProjectRecord) -> Result<(), GatewayError>;

    async fn get(&self, id: &str) -> Result<Option<ProjectRecord>, GatewayError>;

    async fn by_on_chain_id(&self, project_id: u64) -> Result<Option<ProjectRecord>, GatewayError>;

    /// Every project, newest first.
    async fn list(&self) -> Result<Vec<ProjectRecord>, GatewayError>;
}

/// Project store kept in memory.
#[derive(Default)]
pub struct InMemoryProjectStore {
    records: RwLock<Vec<ProjectRecord>>,
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn create(&self, record: ProjectRecord) -> Result<(), GatewayError> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id == record.id) {
            return Err(GatewayError::Store(format!("project {} already exists", record.id)));
        }
        tracing::debug!(id = %record.id, on_chain_id = ?record.on_chain_project_id, "Project recorded");
        records.push(record);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<ProjectRecord>, GatewayError> {
        Ok(self.records.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn by_on_chain_id(&self, project_id: u64) -> Result<Option<ProjectRecord>, GatewayError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|r| r.on_chain_project_id == Some(project_id))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<ProjectRecord>, GatewayError> {
        let mut records = self.records.read().await.clone();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

/// Funding goal, per-share price and milestones in wei.
struct Pricing {
    goal: U256,
    price: U256,
    milestones: Vec<StoredMilestone>,
}

fn price_draft(draft: &ProjectDraft) -> Result<Pricing, GatewayError> {
    if draft.name.trim().is_empty() {
        return Err(GatewayError::InvalidRequest("project name is empty".to_string()));
    }
    let goal = parse_amount(&draft.funding_goal, NATIVE_DECIMALS)?;
    if goal.is_zero() {
        return Err(GatewayError::InvalidRequest(
            "funding goal must be greater than zero".to_string(),
        ));
    }
    let price = goal
        .checked_div(U256::from(draft.total_shares))
        .unwrap_or_default();
    if price.is_zero() {
        return Err(GatewayError::InvalidRequest(format!(
            "funding goal is too small for {} shares",
            draft.total_shares
        )));
    }

    let milestones = draft
        .milestones
        .iter()
        .map(|m| {
            // Blank amounts count as zero
            let amount = if m.amount.trim().is_empty() {
                U256::ZERO
            } else {
                parse_amount(&m.amount, NATIVE_DECIMALS)?
            };
            Ok(StoredMilestone {
                title: m.title.clone(),
                description: m.description.clone(),
                amount_wei: amount.to_string(),
                completed: false,
            })
        })
        .collect::<Result<Vec<_>, GatewayError>>()?;

    Ok(Pricing {
        goal,
        price,
        milestones,
    })
}

impl Gateway {
    /// Register a project; `None` if nothing was recorded.
    pub async fn register_project(
        &self,
        identity: Option<&Identity>,
        draft: &ProjectDraft,
    ) -> Option<ProjectRecord> {
        match self.try_register_project(identity, draft).await {
            Ok(record) => {
                match record.on_chain_project_id {
                    Some(id) => self.notifier().notify(
                        NoticeKind::Success,
                        &format!("Project created successfully! ID: {id}"),
                    ),
                    None => self.notifier().notify(
                        NoticeKind::Warning,
                        "Project saved, but its on-chain id could not be confirmed.",
                    ),
                }
                Some(record)
            }
            Err(e) => {
                self.report(&e);
                None
            }
        }
    }

    /// Create the project on chain, then record it.
    ///
    /// A confirmed creation whose id cannot be resolved is still recorded,
    /// with no on-chain id. Any earlier failure records nothing.
    pub async fn try_register_project(
        &self,
        identity: Option<&Identity>,
        draft: &ProjectDraft,
    ) -> Result<ProjectRecord, GatewayError> {
        let identity = identity.ok_or(GatewayError::NotAuthenticated)?;
        let preflight = self.gated_preflight("create projects").await?;

        let uri = draft.metadata_uri()?;
        validate_project(&uri, draft.total_shares)?;
        let pricing = price_draft(draft)?;
        let now = Utc::now();
        let deadline = now
            .checked_add_months(Months::new(draft.execution_months))
            .ok_or_else(|| GatewayError::InvalidRequest("deadline out of range".to_string()))?;

        let (on_chain_project_id, tx_hash) = match self
            .submit_project(&preflight, &uri, draft.total_shares, pricing.price)
            .await
        {
            Ok(created) => (
                Some(created.project_id),
                Some(format!("{:#x}", created.tx_hash)),
            ),
            Err(e) if e.is_confirmed_on_chain() => {
                tracing::warn!(name = %draft.name, error = %e, "Project created without a resolvable id");
                (None, None)
            }
            Err(e) => return Err(e),
        };

        let record = ProjectRecord {
            id: Uuid::new_v4().to_string(),
            creator_id: identity.user_id.clone(),
            name: draft.name.trim().to_string(),
            category: draft.category.clone(),
            description: draft.description.clone(),
            cover_image: draft.cover_image.clone(),
            funding_goal_wei: pricing.goal.to_string(),
            price_per_share_wei: pricing.price.to_string(),
            total_shares: draft.total_shares,
            shares_remaining: draft.total_shares,
            deadline,
            milestones: pricing.milestones,
            on_chain_project_id,
            tx_hash,
            created_at: now,
        };
        self.projects().create(record.clone()).await?;
        tracing::info!(
            id = %record.id,
            on_chain_id = ?record.on_chain_project_id,
            price_per_share = %format_amount(pricing.price, NATIVE_DECIMALS),
            "Project registered"
        );
        Ok(record)
    }
}
