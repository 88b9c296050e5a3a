// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Keep the authenticated user's stored profile pointing at the wallet
//! they actually connected.
//!
//! Whenever the session reports a connected address that differs from the
//! one on file, the profile is updated with the new address and the
//! `ethereum` wallet type. Matching addresses cause no write.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::error::GatewayError;
use crate::wallet::{WalletAccount, WalletView};

/// Wallet type recorded for every connected account.
pub const ETHEREUM_WALLET_TYPE: &str = "ethereum";

/// The authenticated platform user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Stored user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub wallet_address: Option<String>,
    pub wallet_type: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            email: None,
            wallet_address: None,
            wallet_type: None,
            updated_at: Utc::now(),
        }
    }

    /// The stored wallet address, if it parses.
    pub fn wallet(&self) -> Option<Address> {
        self.wallet_address
            .as_deref()
            .and_then(|raw| Address::from_str(raw.trim()).ok())
    }
}

/// Persistence for user profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>, GatewayError>;

    /// Set (or, with `None`, clear) the wallet fields of a profile.
    async fn set_wallet_info(
        &self,
        user_id: &str,
        wallet_address: Option<&str>,
        wallet_type: Option<&str>,
    ) -> Result<(), GatewayError>;
}

/// Profile store kept in memory.
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<String, UserProfile>>,
    writes: AtomicUsize,
}

impl InMemoryProfileStore {
    pub async fn insert(&self, profile: UserProfile) {
        self.profiles
            .write()
            .await
            .insert(profile.user_id.clone(), profile);
    }

    /// Number of wallet writes performed so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>, GatewayError> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }

    async fn set_wallet_info(
        &self,
        user_id: &str,
        wallet_address: Option<&str>,
        wallet_type: Option<&str>,
    ) -> Result<(), GatewayError> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .entry(user_id.to_string())
            .or_insert_with(|| UserProfile::new(user_id));
        profile.wallet_address = wallet_address.map(str::to_string);
        profile.wallet_type = wallet_type.map(str::to_string);
        profile.updated_at = Utc::now();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// What a reconciliation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The profile now records this address.
    Updated(Address),
    /// The profile already recorded the connected address.
    InSync,
    /// No identity, no profile or no connected wallet.
    Skipped,
}

pub struct ProfileSync {
    store: Arc<dyn ProfileStore>,
}

impl ProfileSync {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    /// The address to write, if the stored profile is out of date.
    ///
    /// A stored value that does not parse as an address counts as different.
    pub fn pending_update(profile: &UserProfile, account: &WalletAccount) -> Option<Address> {
        let connected = account.connected_address()?;
        match profile.wallet() {
            Some(stored) if stored == connected => None,
            _ => Some(connected),
        }
    }

    /// Write the connected address to the profile if it differs.
    pub async fn reconcile(
        &self,
        identity: Option<&Identity>,
        profile: Option<&UserProfile>,
        account: &WalletAccount,
    ) -> Result<SyncOutcome, GatewayError> {
        let (Some(identity), Some(profile)) = (identity, profile) else {
            return Ok(SyncOutcome::Skipped);
        };
        if !account.is_connected() {
            return Ok(SyncOutcome::Skipped);
        }
        let Some(address) = Self::pending_update(profile, account) else {
            return Ok(SyncOutcome::InSync);
        };

        self.store
            .set_wallet_info(
                &identity.user_id,
                Some(&address.to_checksum(None)),
                Some(ETHEREUM_WALLET_TYPE),
            )
            .await?;
        tracing::info!(user_id = %identity.user_id, address = %address, "Profile wallet updated");
        Ok(SyncOutcome::Updated(address))
    }

    /// Load the stored profile and reconcile it with `account`.
    pub async fn sync_identity(
        &self,
        identity: &Identity,
        account: &WalletAccount,
    ) -> Result<SyncOutcome, GatewayError> {
        let profile = self.store.load_profile(&identity.user_id).await?;
        self.reconcile(Some(identity), profile.as_ref(), account)
            .await
    }

    /// Remove the wallet from the profile. Only done on explicit request;
    /// disconnecting never clears the profile.
    pub async fn clear_wallet(&self, identity: &Identity) -> Result<(), GatewayError> {
        self.store
            .set_wallet_info(&identity.user_id, None, None)
            .await?;
        tracing::info!(user_id = %identity.user_id, "Profile wallet cleared");
        Ok(())
    }

    /// Reconcile on every wallet change until `shutdown` fires.
    pub async fn watch(
        self: Arc<Self>,
        identity: Identity,
        mut view: WalletView,
        shutdown: CancellationToken,
    ) {
        let mut account = view.snapshot();
        loop {
            if account.is_connected() {
                if let Err(e) = self.sync_identity(&identity, &account).await {
                    tracing::warn!(user_id = %identity.user_id, error = %e, "Profile sync failed");
                }
            }

            tokio::select! {
                changed = view.changed() => match changed {
                    Some(next) => account = next,
                    None => return,
                },
                _ = shutdown.cancelled() => {
                    tracing::debug!("Profile sync watcher shutting down");
                    return;
                }
            }
        }
    }
}
