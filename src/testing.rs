// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{Address, Log, TxHash, U256};
use alloy::sol_types::{SolCall, SolEvent};
use async_trait::async_trait;

use crate::blockchain::contracts::{IAccessToken, IProjectShares};
use crate::blockchain::{
    ChainBackend, ChainClientError, ContractAddresses, ContractCall, NetworkConfig, ProjectInfo,
    TxReceipt, ETH_SEPOLIA,
};
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::investments::InMemoryInvestmentLedger;
use crate::notify::{NoticeKind, Notifier};
use crate::profile::InMemoryProfileStore;
use crate::projects::InMemoryProjectStore;
use crate::wallet::{ConnectedAccount, WalletConnector, WalletSession};

pub(crate) fn user() -> Address {
    Address::repeat_byte(0x0a)
}

pub(crate) fn mock_contracts() -> ContractAddresses {
    ContractAddresses {
        access_token: Address::repeat_byte(0x11),
        project: Address::repeat_byte(0x22),
    }
}

/// Chain state and knobs behind [`MockBackend`].
pub(crate) struct MockChain {
    pub token_balances: HashMap<Address, U256>,
    pub token_ids: HashMap<Address, U256>,
    pub share_balances: HashMap<(Address, U256), U256>,
    pub projects: HashMap<U256, ProjectInfo>,
    /// Every read fails
    pub fail_reads: bool,
    /// Every submission is rejected
    pub fail_sends: bool,
    /// Submitted transactions revert
    pub revert: bool,
    /// Receipt polls answered with "not mined" before the receipt appears
    pub pending_polls: u32,
    /// Receipts never appear
    pub never_confirm: bool,
    /// Token id granted by a successful mint; `None` leaves the balance alone
    pub mint_grants: Option<U256>,
    /// ProjectCreated logs emitted by one createProject
    pub project_created_events: u64,
    pub next_project_id: u64,
    pub emit_purchase_event: bool,
    /// Logs prepended to every receipt
    pub extra_logs: Vec<Log>,
    pub sent: Vec<(Address, ContractCall)>,
    pub reads: usize,
    pub receipt_polls: usize,
    receipts: HashMap<TxHash, (TxReceipt, u32)>,
    nonce: u8,
}

impl Default for MockChain {
    fn default() -> Self {
        Self {
            token_balances: HashMap::new(),
            token_ids: HashMap::new(),
            share_balances: HashMap::new(),
            projects: HashMap::new(),
            fail_reads: false,
            fail_sends: false,
            revert: false,
            pending_polls: 0,
            never_confirm: false,
            mint_grants: Some(U256::from(1)),
            project_created_events: 1,
            next_project_id: 42,
            emit_purchase_event: true,
            extra_logs: Vec::new(),
            sent: Vec::new(),
            reads: 0,
            receipt_polls: 0,
            receipts: HashMap::new(),
            nonce: 0,
        }
    }
}

impl MockChain {
    pub fn grant_token(&mut self, owner: Address, token_id: u64) {
        self.token_balances.insert(owner, U256::from(1));
        self.token_ids.insert(owner, U256::from(token_id));
    }

    fn read(&mut self) -> Result<(), ChainClientError> {
        self.reads += 1;
        if self.fail_reads {
            return Err(ChainClientError::ContractError("execution reverted".to_string()));
        }
        Ok(())
    }

    fn apply(&mut self, from: Address, call: &ContractCall, contracts: &ContractAddresses) -> Vec<Log> {
        let mut logs = self.extra_logs.clone();
        if self.revert || call.input.len() < 4 {
            return logs;
        }
        let selector = &call.input[..4];

        if call.to == contracts.access_token && selector == IAccessToken::safeMintCall::SELECTOR.as_slice() {
            if let Some(token_id) = self.mint_grants {
                *self.token_balances.entry(from).or_default() += U256::from(1);
                self.token_ids.entry(from).or_insert(token_id);
            }
        } else if call.to == contracts.project
            && selector == IProjectShares::createProjectCall::SELECTOR.as_slice()
        {
            if let Ok(args) = IProjectShares::createProjectCall::abi_decode(&call.input) {
                for _ in 0..self.project_created_events {
                    let project_id = U256::from(self.next_project_id);
                    self.next_project_id += 1;
                    self.projects.insert(
                        project_id,
                        ProjectInfo {
                            creator: from,
                            total_shares: args.totalShares,
                            available_shares: args.totalShares,
                            price_per_share: args.pricePerShare,
                            creation_date: U256::from(1_700_000_000u64),
                        },
                    );
                    let event = IProjectShares::ProjectCreated {
                        projectId: project_id,
                        creator: from,
                        totalShares: args.totalShares,
                        pricePerShare: args.pricePerShare,
                    };
                    logs.push(Log {
                        address: contracts.project,
                        data: event.encode_log_data(),
                    });
                }
            }
        } else if call.to == contracts.project && selector == IProjectShares::buySharesCall::SELECTOR.as_slice()
        {
            if let Ok(args) = IProjectShares::buySharesCall::abi_decode(&call.input) {
                *self
                    .share_balances
                    .entry((from, args.projectId))
                    .or_default() += args.amount;
                if self.emit_purchase_event {
                    let event = IProjectShares::SharesPurchased {
                        projectId: args.projectId,
                        buyer: from,
                        amount: args.amount,
                    };
                    logs.push(Log {
                        address: contracts.project,
                        data: event.encode_log_data(),
                    });
                }
            }
        }
        logs
    }
}

/// In-memory [`ChainBackend`] that mines every submission after a
/// configurable number of polls.
pub(crate) struct MockBackend {
    network: NetworkConfig,
    contracts: ContractAddresses,
    chain: Mutex<MockChain>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            network: ETH_SEPOLIA,
            contracts: mock_contracts(),
            chain: Mutex::new(MockChain::default()),
        })
    }

    pub fn set(&self, f: impl FnOnce(&mut MockChain)) {
        f(&mut self.chain.lock().unwrap());
    }

    pub fn sent(&self) -> Vec<(Address, ContractCall)> {
        self.chain.lock().unwrap().sent.clone()
    }

    pub fn reads(&self) -> usize {
        self.chain.lock().unwrap().reads
    }

    pub fn receipt_polls(&self) -> usize {
        self.chain.lock().unwrap().receipt_polls
    }
}

#[async_trait]
impl ChainBackend for MockBackend {
    fn network(&self) -> &NetworkConfig {
        &self.network
    }

    fn contracts(&self) -> &ContractAddresses {
        &self.contracts
    }

    async fn access_token_balance(&self, owner: Address) -> Result<U256, ChainClientError> {
        let mut chain = self.chain.lock().unwrap();
        chain.read()?;
        Ok(chain.token_balances.get(&owner).copied().unwrap_or_default())
    }

    async fn access_token_of_owner_by_index(
        &self,
        owner: Address,
        _index: U256,
    ) -> Result<U256, ChainClientError> {
        let mut chain = self.chain.lock().unwrap();
        chain.read()?;
        chain
            .token_ids
            .get(&owner)
            .copied()
            .ok_or_else(|| ChainClientError::ContractError("index out of bounds".to_string()))
    }

    async fn share_balance(
        &self,
        account: Address,
        project_id: U256,
    ) -> Result<U256, ChainClientError> {
        let mut chain = self.chain.lock().unwrap();
        chain.read()?;
        Ok(chain
            .share_balances
            .get(&(account, project_id))
            .copied()
            .unwrap_or_default())
    }

    async fn project_info(&self, project_id: U256) -> Result<ProjectInfo, ChainClientError> {
        let mut chain = self.chain.lock().unwrap();
        chain.read()?;
        chain
            .projects
            .get(&project_id)
            .cloned()
            .ok_or_else(|| ChainClientError::ContractError("unknown project".to_string()))
    }

    async fn send_transaction(
        &self,
        from: Address,
        call: &ContractCall,
    ) -> Result<TxHash, ChainClientError> {
        let mut chain = self.chain.lock().unwrap();
        if chain.fail_sends {
            return Err(ChainClientError::TransactionFailed(
                "User denied transaction signature".to_string(),
            ));
        }
        chain.nonce += 1;
        let hash = TxHash::with_last_byte(chain.nonce);
        chain.sent.push((from, call.clone()));

        let logs = chain.apply(from, call, &self.contracts);
        let receipt = TxReceipt {
            tx_hash: hash,
            block_number: Some(100 + u64::from(chain.nonce)),
            success: !chain.revert,
            logs,
        };
        let pending = chain.pending_polls;
        chain.receipts.insert(hash, (receipt, pending));
        Ok(hash)
    }

    async fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> Result<Option<TxReceipt>, ChainClientError> {
        let mut chain = self.chain.lock().unwrap();
        chain.receipt_polls += 1;
        if chain.never_confirm {
            return Ok(None);
        }
        match chain.receipts.get_mut(&hash) {
            Some((_, remaining)) if *remaining > 0 => {
                *remaining -= 1;
                Ok(None)
            }
            Some((receipt, _)) => Ok(Some(receipt.clone())),
            None => Ok(None),
        }
    }
}

/// Connector with a scripted activation result.
pub(crate) struct MockConnector {
    result: Result<ConnectedAccount, GatewayError>,
}

impl MockConnector {
    pub fn ok(address: Address, chain_id: u64) -> Arc<dyn WalletConnector> {
        Arc::new(Self {
            result: Ok(ConnectedAccount { address, chain_id }),
        })
    }

    pub fn rejecting(reason: &str) -> Arc<dyn WalletConnector> {
        Arc::new(Self {
            result: Err(GatewayError::ConnectionFailed(reason.to_string())),
        })
    }
}

#[async_trait]
impl WalletConnector for MockConnector {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn activate(&self) -> Result<ConnectedAccount, GatewayError> {
        self.result.clone()
    }
}

/// Notifier that remembers everything it was told.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    notices: Mutex<Vec<(NoticeKind, String)>>,
}

impl RecordingNotifier {
    pub fn kinds(&self) -> Vec<NoticeKind> {
        self.notices.lock().unwrap().iter().map(|(k, _)| *k).collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn last(&self) -> Option<(NoticeKind, String)> {
        self.notices.lock().unwrap().last().cloned()
    }

    pub fn clear(&self) {
        self.notices.lock().unwrap().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        self.notices.lock().unwrap().push((kind, message.to_string()));
    }
}

/// Session for [`user`] on Sepolia, optionally already connected.
///
/// The notifier is cleared after connecting.
pub(crate) async fn connected_session(
    connected: bool,
    notifier: Arc<RecordingNotifier>,
) -> WalletSession {
    let session = WalletSession::new(
        vec![MockConnector::ok(user(), ETH_SEPOLIA.chain_id)],
        notifier.clone(),
    );
    if connected {
        session.connect().await.unwrap();
        notifier.clear();
    }
    session
}

pub(crate) fn fast_config() -> GatewayConfig {
    GatewayConfig {
        contracts: mock_contracts(),
        confirmation_timeout: Duration::from_millis(200),
        receipt_poll_interval: Duration::from_millis(2),
        fiat_delay: Duration::from_millis(5),
        ..GatewayConfig::default()
    }
}

/// A gateway wired to mocks.
pub(crate) struct Harness {
    pub gateway: Gateway,
    pub backend: Arc<MockBackend>,
    pub notifier: Arc<RecordingNotifier>,
    pub profiles: Arc<InMemoryProfileStore>,
    pub ledger: Arc<InMemoryInvestmentLedger>,
    pub projects: Arc<InMemoryProjectStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(true)
    }

    /// Harness whose gateway has no chain client.
    pub fn without_backend() -> Self {
        Self::build(false)
    }

    fn build(with_backend: bool) -> Self {
        let backend = MockBackend::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let profiles = Arc::new(InMemoryProfileStore::default());
        let ledger = Arc::new(InMemoryInvestmentLedger::default());
        let projects = Arc::new(InMemoryProjectStore::default());

        let mut builder = Gateway::builder(fast_config())
            .connector(MockConnector::ok(user(), ETH_SEPOLIA.chain_id))
            .notifier(notifier.clone())
            .profile_store(profiles.clone())
            .ledger(ledger.clone())
            .project_store(projects.clone());
        if with_backend {
            builder = builder.backend(backend.clone());
        }

        Self {
            gateway: builder.build(),
            backend,
            notifier,
            profiles,
            ledger,
            projects,
        }
    }

    /// Connect the wallet and forget the connection notice.
    pub async fn connected(self) -> Self {
        assert!(self.gateway.connect_wallet().await);
        self.notifier.clear();
        self
    }

    /// Connect and give [`user`] an access token.
    pub async fn with_access(self) -> Self {
        self.backend.set(|chain| chain.grant_token(user(), 1));
        let harness = self.connected().await;
        assert!(harness.gateway.check_access_token().await.is_held());
        harness
    }
}
