// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Access & Transaction Gateway
//!
//! The one object the application talks to. It owns the wallet session and
//! wires the access gate, transaction executor, event resolver, profile sync,
//! investment ledger and project store around it.
//!
//! ## Boundary
//!
//! Every gated action comes in two forms:
//!
//! - `try_*` returns a [`GatewayError`] and emits only progress notices.
//! - The plain form converts any error into a notification and returns a
//!   negative value (`false`, `None`, `0`). Nothing escapes as an error.
//!
//! ## Preconditions
//!
//! Checked in order before anything is submitted: wallet connected, chain
//! client available, access token held.

use std::sync::Arc;

use alloy::primitives::{Address, TxHash, U256};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::access::{AccessToken, AccessTokenGate};
use crate::blockchain::contracts::{buy_shares_call, create_project_call};
use crate::blockchain::{parse_amount, share_cost, ChainBackend, ProjectInfo, NATIVE_DECIMALS};
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::events::EventResolver;
use crate::executor::{ConfirmedTransaction, Preflight, TransactionExecutor, TxKind, TxRequest};
use crate::investments::{InMemoryInvestmentLedger, InvestmentLedger};
use crate::notify::{NoticeKind, Notifier, TracingNotifier};
use crate::profile::{Identity, InMemoryProfileStore, ProfileStore, ProfileSync, SyncOutcome};
use crate::projects::{InMemoryProjectStore, ProjectStore};
use crate::wallet::{WalletAccount, WalletConnector, WalletSession, WalletView};

/// A project created on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedProject {
    pub project_id: u64,
    pub creator: Address,
    pub tx_hash: TxHash,
}

pub struct Gateway {
    config: GatewayConfig,
    session: WalletSession,
    backend: Option<Arc<dyn ChainBackend>>,
    notifier: Arc<dyn Notifier>,
    executor: Arc<TransactionExecutor>,
    gate: Arc<AccessTokenGate>,
    resolver: EventResolver,
    profiles: Arc<ProfileSync>,
    ledger: Arc<dyn InvestmentLedger>,
    projects: Arc<dyn ProjectStore>,
}

impl Gateway {
    pub fn builder(config: GatewayConfig) -> GatewayBuilder {
        GatewayBuilder::new(config)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    pub fn wallet(&self) -> WalletView {
        self.session.view()
    }

    pub fn gate(&self) -> &Arc<AccessTokenGate> {
        &self.gate
    }

    pub fn executor(&self) -> &Arc<TransactionExecutor> {
        &self.executor
    }

    pub fn ledger(&self) -> &Arc<dyn InvestmentLedger> {
        &self.ledger
    }

    pub fn profiles(&self) -> &Arc<ProfileSync> {
        &self.profiles
    }

    pub fn projects(&self) -> &Arc<dyn ProjectStore> {
        &self.projects
    }

    pub(crate) fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Report an error at the boundary.
    pub(crate) fn report(&self, err: &GatewayError) {
        self.notifier.notify(err.notice_kind(), &err.to_string());
    }

    // -- wallet --

    /// Connect the wallet. The session notifies the outcome itself.
    pub async fn connect_wallet(&self) -> bool {
        self.session.connect().await.is_ok()
    }

    /// Disconnect and forget every derived access state.
    pub fn disconnect_wallet(&self) {
        self.session.disconnect();
        self.gate.clear();
    }

    // -- access token --

    pub async fn check_access_token(&self) -> AccessToken {
        self.gate.check_access_token().await
    }

    pub fn has_access_token(&self) -> bool {
        self.gate.has_access_token()
    }

    pub async fn mint_access_token(&self) -> bool {
        self.gate.mint_access_token().await
    }

    // -- project contract --

    /// Create a project and recover its id from the `ProjectCreated` event.
    ///
    /// `price_per_share` is in native units (e.g. `"0.05"`).
    pub async fn try_create_project(
        &self,
        uri: &str,
        total_shares: u64,
        price_per_share: &str,
    ) -> Result<CreatedProject, GatewayError> {
        let preflight = self.gated_preflight("create projects").await?;
        validate_project(uri, total_shares)?;
        let price = parse_amount(price_per_share, NATIVE_DECIMALS)?;
        self.submit_project(&preflight, uri, total_shares, price).await
    }

    /// Submit `createProject` for a caller that already passed the gate.
    pub(crate) async fn submit_project(
        &self,
        preflight: &Preflight,
        uri: &str,
        total_shares: u64,
        price: U256,
    ) -> Result<CreatedProject, GatewayError> {
        let call = create_project_call(
            preflight.backend.contracts(),
            uri,
            U256::from(total_shares),
            price,
        );
        let confirmed = self
            .executor
            .execute(preflight, TxRequest::new(TxKind::CreateProject, uri, call))
            .await?;

        let event = self.resolver.resolve_project_created(&confirmed.receipt)?;
        let project_id = u64::try_from(event.projectId)
            .map_err(|_| GatewayError::EventNotFound("ProjectCreated"))?;

        tracing::info!(project_id, creator = %event.creator, "Project created");
        Ok(CreatedProject {
            project_id,
            creator: event.creator,
            tx_hash: confirmed.transaction.hash(),
        })
    }

    /// Create a project; `None` if it failed or its id could not be recovered.
    pub async fn create_project(
        &self,
        uri: &str,
        total_shares: u64,
        price_per_share: &str,
    ) -> Option<u64> {
        match self.try_create_project(uri, total_shares, price_per_share).await {
            Ok(created) => {
                self.notifier.notify(
                    NoticeKind::Success,
                    &format!("Project created successfully! ID: {}", created.project_id),
                );
                Some(created.project_id)
            }
            Err(e) => {
                self.report(&e);
                None
            }
        }
    }

    /// Buy `amount` shares at `price_per_share` native units each.
    pub async fn try_buy_project_shares(
        &self,
        project_id: u64,
        amount: u64,
        price_per_share: &str,
    ) -> Result<ConfirmedTransaction, GatewayError> {
        let preflight = self.gated_preflight("invest in projects").await?;

        if amount == 0 {
            return Err(GatewayError::InvalidRequest(
                "share amount must be greater than zero".to_string(),
            ));
        }
        let price = parse_amount(price_per_share, NATIVE_DECIMALS)?;
        let cost = share_cost(price, amount)?;

        let call = buy_shares_call(
            preflight.backend.contracts(),
            U256::from(project_id),
            U256::from(amount),
            cost,
        );
        let confirmed = self
            .executor
            .execute(
                &preflight,
                TxRequest::new(TxKind::BuyShares, project_id.to_string(), call),
            )
            .await?;

        match self.resolver.resolve_shares_purchased(&confirmed.receipt) {
            Ok(event) => tracing::info!(
                project_id,
                buyer = %event.buyer,
                amount = %event.amount,
                "Shares purchased"
            ),
            Err(e) => tracing::warn!(project_id, error = %e, "Purchase confirmed without a readable SharesPurchased event"),
        }
        Ok(confirmed)
    }

    pub async fn buy_project_shares(&self, project_id: u64, amount: u64, price_per_share: &str) -> bool {
        match self
            .try_buy_project_shares(project_id, amount, price_per_share)
            .await
        {
            Ok(_) => {
                self.notifier.notify(
                    NoticeKind::Success,
                    &format!("Successfully purchased {amount} shares of project {project_id}!"),
                );
                true
            }
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    /// Shares of `project_id` held by `account`, or by the connected wallet.
    ///
    /// `0` when there is no account or client, or when the read fails.
    pub async fn get_project_shares(&self, project_id: u64, account: Option<Address>) -> u64 {
        let Some(account) = account.or_else(|| self.session.view().address()) else {
            return 0;
        };
        let Some(backend) = self.backend.as_ref() else {
            return 0;
        };
        match backend.share_balance(account, U256::from(project_id)).await {
            Ok(balance) => u64::try_from(balance).unwrap_or_else(|_| {
                tracing::warn!(project_id, account = %account, balance = %balance, "Share balance exceeds u64; reporting u64::MAX");
                u64::MAX
            }),
            Err(e) => {
                tracing::warn!(project_id, account = %account, error = %e, "Share balance query failed");
                0
            }
        }
    }

    pub async fn get_project_info(&self, project_id: u64) -> Result<ProjectInfo, GatewayError> {
        let backend = self
            .backend
            .as_ref()
            .ok_or(GatewayError::ChainClientUnavailable)?;
        Ok(backend.project_info(U256::from(project_id)).await?)
    }

    // -- profile --

    /// Reconcile the stored profile of `identity` with the connected wallet.
    pub async fn sync_profile(&self, identity: &Identity) -> Result<SyncOutcome, GatewayError> {
        self.profiles
            .sync_identity(identity, &self.session.snapshot())
            .await
    }

    /// Spawn the background watchers. They stop when `shutdown` fires.
    pub fn spawn_watchers(
        &self,
        identity: Option<Identity>,
        shutdown: CancellationToken,
    ) -> Vec<JoinHandle<()>> {
        let mut handles = vec![tokio::spawn(self.gate.clone().watch(shutdown.clone()))];
        if let Some(identity) = identity {
            handles.push(tokio::spawn(self.profiles.clone().watch(
                identity,
                self.session.view(),
                shutdown,
            )));
        }
        handles
    }

    pub fn snapshot(&self) -> WalletAccount {
        self.session.snapshot()
    }

    pub(crate) async fn gated_preflight(&self, action: &'static str) -> Result<Preflight, GatewayError> {
        let preflight = self.executor.preflight()?;
        if !self.gate.access_state().await.is_held() {
            tracing::info!(address = %preflight.from, action, "Access token required");
            return Err(GatewayError::AccessDenied(action));
        }
        Ok(preflight)
    }
}

pub(crate) fn validate_project(uri: &str, total_shares: u64) -> Result<(), GatewayError> {
    if uri.trim().is_empty() {
        return Err(GatewayError::InvalidRequest("project uri is empty".to_string()));
    }
    if total_shares == 0 {
        return Err(GatewayError::InvalidRequest(
            "total shares must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Assembles a [`Gateway`]. Unset collaborators default to in-memory stores
/// and a [`TracingNotifier`].
pub struct GatewayBuilder {
    config: GatewayConfig,
    connectors: Vec<Arc<dyn WalletConnector>>,
    backend: Option<Arc<dyn ChainBackend>>,
    notifier: Arc<dyn Notifier>,
    profile_store: Arc<dyn ProfileStore>,
    ledger: Arc<dyn InvestmentLedger>,
    projects: Arc<dyn ProjectStore>,
    shutdown: CancellationToken,
}

impl GatewayBuilder {
    fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            connectors: Vec::new(),
            backend: None,
            notifier: Arc::new(TracingNotifier),
            profile_store: Arc::new(InMemoryProfileStore::default()),
            ledger: Arc::new(InMemoryInvestmentLedger::default()),
            projects: Arc::new(InMemoryProjectStore::default()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Add a wallet connector. The first one added is used.
    pub fn connector(mut self, connector: Arc<dyn WalletConnector>) -> Self {
        self.connectors.push(connector);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn ChainBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn profile_store(mut self, store: Arc<dyn ProfileStore>) -> Self {
        self.profile_store = store;
        self
    }

    pub fn ledger(mut self, ledger: Arc<dyn InvestmentLedger>) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn project_store(mut self, store: Arc<dyn ProjectStore>) -> Self {
        self.projects = store;
        self
    }

    /// Token that abandons pending confirmation waits.
    pub fn shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn build(self) -> Gateway {
        let session = WalletSession::new(self.connectors, self.notifier.clone());
        let executor = Arc::new(
            TransactionExecutor::new(
                session.view(),
                self.backend.clone(),
                self.notifier.clone(),
                &self.config,
            )
            .with_shutdown(self.shutdown),
        );
        let gate = Arc::new(AccessTokenGate::new(
            session.view(),
            self.backend.clone(),
            executor.clone(),
            self.notifier.clone(),
        ));
        let resolver = EventResolver::new(self.config.contracts.project);

        Gateway {
            config: self.config,
            session,
            backend: self.backend,
            notifier: self.notifier,
            executor,
            gate,
            resolver,
            profiles: Arc::new(ProfileSync::new(self.profile_store)),
            ledger: self.ledger,
            projects: self.projects,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::contracts::IProjectShares;
    use crate::profile::UserProfile;
    use crate::testing::{user, Harness};
    use alloy::primitives::Log;
    use alloy::sol_types::{SolCall, SolEvent};

    #[tokio::test]
    async fn no_access_token_without_wallet() {
        let h = Harness::new();
        h.backend.set(|chain| chain.grant_token(user(), 1));
        assert!(!h.gateway.has_access_token());
        assert!(!h.gateway.check_access_token().await.is_held());
    }

    #[tokio::test]
    async fn repeated_checks_agree() {
        let h = Harness::new().connected().await;
        h.backend.set(|chain| chain.grant_token(user(), 9));
        let first = h.gateway.check_access_token().await;
        let second = h.gateway.check_access_token().await;
        assert_eq!(first, second);
        assert_eq!(first.token_id(), Some(U256::from(9)));
    }

    #[tokio::test]
    async fn buy_without_wallet_is_denied_without_submission() {
        let h = Harness::new();
        assert!(!h.gateway.buy_project_shares(1, 5, "100").await);
        assert!(h.backend.sent().is_empty());
        assert_eq!(h.backend.reads(), 0);
        assert_eq!(
            h.notifier.last(),
            Some((
                NoticeKind::Destructive,
                GatewayError::WalletNotConnected.to_string()
            ))
        );
    }

    #[tokio::test]
    async fn buy_without_token_is_denied_without_submission() {
        let h = Harness::new().connected().await;
        assert!(!h.gateway.buy_project_shares(7, 3, "50").await);
        assert!(h.backend.sent().is_empty());
        assert_eq!(
            h.notifier.last().map(|(_, m)| m),
            Some(GatewayError::AccessDenied("invest in projects").to_string())
        );
    }

    #[tokio::test]
    async fn missing_client_is_reported_after_wallet() {
        let h = Harness::without_backend().connected().await;
        let err = h.gateway.try_buy_project_shares(1, 1, "1").await.unwrap_err();
        assert_eq!(err, GatewayError::ChainClientUnavailable);
    }

    #[tokio::test]
    async fn create_without_token_returns_none_without_submission() {
        let h = Harness::new().connected().await;
        assert_eq!(h.gateway.create_project("uri", 1000, "10").await, None);
        assert!(h.backend.sent().is_empty());
        assert_eq!(
            h.notifier.kinds(),
            vec![NoticeKind::Destructive]
        );
    }

    #[tokio::test]
    async fn create_returns_id_from_event() {
        let h = Harness::new().with_access().await;

        assert_eq!(h.gateway.create_project("ipfs://p", 1000, "10").await, Some(42));

        let sent = h.backend.sent();
        assert_eq!(sent.len(), 1);
        let args = IProjectShares::createProjectCall::abi_decode(&sent[0].1.input).unwrap();
        assert_eq!(args.uri, "ipfs://p");
        assert_eq!(args.totalShares, U256::from(1000));
        assert_eq!(args.pricePerShare, parse_amount("10", 18).unwrap());
        assert_eq!(
            h.notifier.kinds(),
            vec![NoticeKind::Info, NoticeKind::Success]
        );
    }

    #[tokio::test]
    async fn create_without_event_returns_none_as_warning() {
        let h = Harness::new().with_access().await;
        h.backend.set(|chain| chain.project_created_events = 0);

        assert_eq!(h.gateway.create_project("uri", 1000, "10").await, None);
        assert_eq!(h.backend.sent().len(), 1);
        assert_eq!(
            h.notifier.kinds(),
            vec![NoticeKind::Info, NoticeKind::Warning]
        );
    }

    #[tokio::test]
    async fn create_with_two_events_is_ambiguous() {
        let h = Harness::new().with_access().await;
        h.backend.set(|chain| chain.project_created_events = 2);

        let err = h
            .gateway
            .try_create_project("uri", 1000, "10")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GatewayError::EventAmbiguous {
                event: "ProjectCreated",
                matches: 2
            }
        );
        assert!(err.is_confirmed_on_chain());
    }

    #[tokio::test]
    async fn create_rejects_invalid_input_before_submission() {
        let h = Harness::new().with_access().await;
        assert!(matches!(
            h.gateway.try_create_project(" ", 10, "1").await,
            Err(GatewayError::InvalidRequest(_))
        ));
        assert!(matches!(
            h.gateway.try_create_project("uri", 0, "1").await,
            Err(GatewayError::InvalidRequest(_))
        ));
        assert!(matches!(
            h.gateway.try_create_project("uri", 10, "ten").await,
            Err(GatewayError::Chain(_))
        ));
        assert!(h.backend.sent().is_empty());
    }

    #[tokio::test]
    async fn buy_attaches_total_cost_and_confirms() {
        let h = Harness::new().with_access().await;

        assert!(h.gateway.buy_project_shares(7, 3, "50").await);

        let sent = h.backend.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.value, parse_amount("150", 18).unwrap());
        let args = IProjectShares::buySharesCall::abi_decode(&sent[0].1.input).unwrap();
        assert_eq!(args.projectId, U256::from(7));
        assert_eq!(args.amount, U256::from(3));

        assert_eq!(
            h.notifier.kinds(),
            vec![NoticeKind::Info, NoticeKind::Success]
        );
        assert_eq!(h.gateway.get_project_shares(7, None).await, 3);
    }

    #[tokio::test]
    async fn buy_succeeds_without_purchase_event() {
        let h = Harness::new().with_access().await;
        h.backend.set(|chain| chain.emit_purchase_event = false);
        assert!(h.gateway.buy_project_shares(7, 1, "1").await);
    }

    #[tokio::test]
    async fn reverted_buy_returns_false() {
        let h = Harness::new().with_access().await;
        h.backend.set(|chain| chain.revert = true);
        assert!(!h.gateway.buy_project_shares(7, 1, "1").await);
        assert_eq!(
            h.notifier.kinds(),
            vec![NoticeKind::Info, NoticeKind::Destructive]
        );
    }

    #[tokio::test]
    async fn address_change_requeries_access() {
        let h = Harness::new().with_access().await;
        let reads = h.backend.reads();

        h.gateway
            .session()
            .on_account_changed(Some(Address::repeat_byte(0x0b)));
        assert!(!h.gateway.has_access_token());
        assert!(!h.gateway.check_access_token().await.is_held());
        assert!(h.backend.reads() > reads);

        // The new account is denied without submitting anything
        assert!(!h.gateway.buy_project_shares(7, 1, "1").await);
        assert!(h.backend.sent().is_empty());
    }

    #[tokio::test]
    async fn failed_access_recheck_closes_the_gate() {
        let h = Harness::new().with_access().await;
        assert!(h.gateway.has_access_token());

        h.backend.set(|chain| chain.fail_reads = true);
        assert!(!h.gateway.check_access_token().await.is_held());
        assert!(!h.gateway.has_access_token());

        assert!(!h.gateway.buy_project_shares(7, 1, "1").await);
        assert!(h.backend.sent().is_empty());
        assert_eq!(
            h.notifier.last().map(|(_, m)| m),
            Some(GatewayError::AccessDenied("invest in projects").to_string())
        );
    }

    #[tokio::test]
    async fn create_ignores_events_from_other_contracts() {
        let h = Harness::new().with_access().await;
        let foreign = IProjectShares::ProjectCreated {
            projectId: U256::from(7),
            creator: user(),
            totalShares: U256::from(1),
            pricePerShare: U256::from(1),
        };
        h.backend.set(|chain| {
            chain.extra_logs.push(Log {
                address: Address::repeat_byte(0x33),
                data: foreign.encode_log_data(),
            })
        });

        assert_eq!(h.gateway.create_project("uri", 10, "1").await, Some(42));
    }

    #[tokio::test]
    async fn oversized_share_balance_saturates() {
        let h = Harness::new();
        h.backend.set(|chain| {
            chain
                .share_balances
                .insert((user(), U256::from(7)), U256::from(u64::MAX) + U256::from(1));
        });
        assert_eq!(h.gateway.get_project_shares(7, Some(user())).await, u64::MAX);
    }

    #[tokio::test]
    async fn disconnect_clears_access() {
        let h = Harness::new().with_access().await;
        h.gateway.disconnect_wallet();
        assert!(!h.gateway.has_access_token());
        assert!(!h.gateway.snapshot().is_connected());
    }

    #[tokio::test]
    async fn share_reads_fall_back_to_zero() {
        let h = Harness::new();
        assert_eq!(h.gateway.get_project_shares(7, None).await, 0);

        h.backend.set(|chain| {
            chain
                .share_balances
                .insert((Address::repeat_byte(0x0b), U256::from(7)), U256::from(12));
        });
        assert_eq!(
            h.gateway
                .get_project_shares(7, Some(Address::repeat_byte(0x0b)))
                .await,
            12
        );

        h.backend.set(|chain| chain.fail_reads = true);
        assert_eq!(
            h.gateway
                .get_project_shares(7, Some(Address::repeat_byte(0x0b)))
                .await,
            0
        );
    }

    #[tokio::test]
    async fn project_info_round_trips_created_project() {
        let h = Harness::new().with_access().await;
        let id = h.gateway.create_project("uri", 500, "0.5").await.unwrap();

        let info = h.gateway.get_project_info(id).await.unwrap();
        assert_eq!(info.creator, user());
        assert_eq!(info.total_shares, U256::from(500));
        assert_eq!(info.price_per_share, parse_amount("0.5", 18).unwrap());

        assert!(h.gateway.get_project_info(999).await.is_err());
        assert_eq!(
            Harness::without_backend().gateway.get_project_info(1).await,
            Err(GatewayError::ChainClientUnavailable)
        );
    }

    #[tokio::test]
    async fn sync_profile_records_connected_wallet() {
        let h = Harness::new().connected().await;
        h.profiles.insert(UserProfile::new("user-1")).await;

        let outcome = h.gateway.sync_profile(&Identity::new("user-1")).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Updated(user()));
    }
}
