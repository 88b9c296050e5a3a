// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Access Token Gate
//!
//! Holding at least one platform access token (an ERC-721 on the access
//! contract) is the prerequisite for creating projects and buying shares.
//!
//! The gate answers "does the connected account hold a token, and which one",
//! caches the answer per `(chain, address)` and can mint a token for the
//! connected account.
//!
//! Query failures are never surfaced: they read as "no token". Absence of a
//! check for the current account also reads as "no token".

mod cache;

pub use cache::AccessTokenCache;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::blockchain::contracts::mint_access_token_call;
use crate::blockchain::ChainBackend;
use crate::error::GatewayError;
use crate::executor::{TransactionExecutor, TxKind, TxRequest};
use crate::notify::{NoticeKind, Notifier};
use crate::wallet::WalletView;

const CACHE_CAPACITY: usize = 64;
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Access-token state of one account. A token id is only known when a
/// token is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AccessToken {
    held: bool,
    token_id: Option<U256>,
}

impl AccessToken {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn held(token_id: U256) -> Self {
        Self {
            held: true,
            token_id: Some(token_id),
        }
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn token_id(&self) -> Option<U256> {
        self.token_id
    }
}

/// Decrements the in-progress check count when dropped.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct AccessTokenGate {
    wallet: WalletView,
    backend: Option<Arc<dyn ChainBackend>>,
    executor: Arc<TransactionExecutor>,
    notifier: Arc<dyn Notifier>,
    cache: AccessTokenCache,
    loading: AtomicUsize,
}

impl AccessTokenGate {
    pub fn new(
        wallet: WalletView,
        backend: Option<Arc<dyn ChainBackend>>,
        executor: Arc<TransactionExecutor>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            wallet,
            backend,
            executor,
            notifier,
            cache: AccessTokenCache::new(CACHE_CAPACITY, CACHE_TTL),
            loading: AtomicUsize::new(0),
        }
    }

    /// Last known state for the connected account, without querying.
    ///
    /// `none` while disconnected or before the account was checked.
    pub fn current(&self) -> AccessToken {
        self.cached().unwrap_or_default()
    }

    pub fn has_access_token(&self) -> bool {
        self.current().is_held()
    }

    /// Whether a check is in progress.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst) > 0
    }

    /// State for the connected account: cached if known, queried otherwise.
    pub async fn access_state(&self) -> AccessToken {
        match self.cached() {
            Some(token) => token,
            None => self.check_access_token().await,
        }
    }

    /// Query the chain for the connected account's access token.
    ///
    /// Reads the balance, then the first token id. Never fails: a missing
    /// wallet, a missing client or any query error yields `none`, and a
    /// query error also drops the cached state of the account.
    pub async fn check_access_token(&self) -> AccessToken {
        let account = self.wallet.snapshot();
        let Some(address) = account.connected_address() else {
            return AccessToken::none();
        };
        let Some(backend) = self.backend.as_ref() else {
            tracing::debug!("No chain client; access token check skipped");
            return AccessToken::none();
        };
        let chain_id = account.chain_id.unwrap_or_default();

        let _loading = LoadingGuard::enter(&self.loading);
        let token = match query_access_token(backend.as_ref(), address).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(address = %address, error = %e, "Access token check failed");
                // Fail closed: a failed check replaces whatever was known.
                self.cache.invalidate(chain_id, address);
                return AccessToken::none();
            }
        };

        // The account may have changed while the queries were in flight.
        if self.wallet.address() == Some(address) {
            self.cache.put(chain_id, address, token);
        }
        tracing::debug!(address = %address, held = token.is_held(), token_id = ?token.token_id(), "Access token checked");
        token
    }

    /// Forget every cached check.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Mint an access token for the connected account and verify it arrived.
    pub async fn try_mint_access_token(&self) -> Result<AccessToken, GatewayError> {
        let preflight = self.executor.preflight()?;
        let contracts = preflight.backend.contracts();
        let request = TxRequest::new(
            TxKind::MintToken,
            preflight.from.to_string(),
            mint_access_token_call(contracts, preflight.from),
        );

        self.executor.execute(&preflight, request).await?;

        if let Some(chain_id) = self.wallet.chain_id() {
            self.cache.invalidate(chain_id, preflight.from);
        }
        let token = self.check_access_token().await;
        if !token.is_held() {
            tracing::warn!(address = %preflight.from, "Mint confirmed but no access token found");
            return Err(GatewayError::TokenNotVerified);
        }
        Ok(token)
    }

    /// Mint an access token; `true` only once possession is verified.
    pub async fn mint_access_token(&self) -> bool {
        match self.try_mint_access_token().await {
            Ok(token) => {
                let message = match token.token_id() {
                    Some(id) => format!("Access token #{id} acquired. You now have access to the platform!"),
                    None => "Access token acquired. You now have access to the platform!".to_string(),
                };
                self.notifier.notify(NoticeKind::Success, &message);
                true
            }
            Err(e) => {
                self.notifier.notify(e.notice_kind(), &e.to_string());
                false
            }
        }
    }

    /// Re-check whenever the connected account or network changes.
    ///
    /// Runs until `shutdown` fires or the wallet session is dropped.
    pub async fn watch(self: Arc<Self>, shutdown: CancellationToken) {
        let mut view = self.wallet.clone();
        if view.is_connected() {
            self.check_access_token().await;
        }

        loop {
            tokio::select! {
                changed = view.changed() => match changed {
                    Some(account) if account.is_connected() => {
                        self.check_access_token().await;
                    }
                    Some(_) => {}
                    None => return,
                },
                _ = shutdown.cancelled() => {
                    tracing::debug!("Access token watcher shutting down");
                    return;
                }
            }
        }
    }

    fn cached(&self) -> Option<AccessToken> {
        let account = self.wallet.snapshot();
        let address = account.connected_address()?;
        self.cache.get(account.chain_id.unwrap_or_default(), address)
    }
}

async fn query_access_token(
    backend: &dyn ChainBackend,
    owner: Address,
) -> Result<AccessToken, crate::blockchain::ChainClientError> {
    let balance = backend.access_token_balance(owner).await?;
    if balance.is_zero() {
        return Ok(AccessToken::none());
    }
    let token_id = backend
        .access_token_of_owner_by_index(owner, U256::ZERO)
        .await?;
    Ok(AccessToken::held(token_id))
}
