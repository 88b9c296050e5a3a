// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use kickdao_gateway::blockchain::AlloyBackend;
use kickdao_gateway::config::{GatewayConfig, KEY_PEM_ENV, LOG_FORMAT_ENV, PRIVATE_KEY_ENV};
use kickdao_gateway::gateway::Gateway;
use kickdao_gateway::wallet::LocalKeyConnector;

#[derive(Parser)]
#[command(name = "kickdao-gateway", version, about = "Kick DAO access and transaction gateway")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show the network, the local account and its access token
    Status,
    /// Mint an access token for the local account
    Mint,
    /// Shares of a project held by an account (default: the local account)
    Shares {
        project_id: u64,
        #[arg(long)]
        account: Option<String>,
    },
    /// On-chain state of a project
    Project { project_id: u64 },
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli.command.unwrap_or(Command::Status)).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, "kickdao-gateway failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.pretty().init();
    }
}

/// Local-key connector from `KDAO_PRIVATE_KEY` or the PEM file at `KDAO_KEY_PEM`.
fn load_connector(chain_id: u64) -> Result<Option<LocalKeyConnector>, BoxError> {
    if let Ok(hex) = std::env::var(PRIVATE_KEY_ENV) {
        return Ok(Some(LocalKeyConnector::from_hex(hex.trim(), chain_id)?));
    }
    if let Ok(path) = std::env::var(KEY_PEM_ENV) {
        let pem = std::fs::read(path.trim())?;
        return Ok(Some(LocalKeyConnector::from_pem(&pem, chain_id)?));
    }
    Ok(None)
}

async fn run(command: Command) -> Result<bool, BoxError> {
    let config = GatewayConfig::from_env()?;
    let connector = load_connector(config.network.chain_id)?;
    let backend = AlloyBackend::new(
        config.network.clone(),
        config.rpc_url.as_deref(),
        config.contracts,
        connector.as_ref().map(LocalKeyConnector::wallet),
    )?;
    tracing::info!(
        network = config.network.name,
        access_token = %config.contracts.access_token,
        project = %config.contracts.project,
        "Gateway configured"
    );

    let shutdown = CancellationToken::new();
    let mut builder = Gateway::builder(config)
        .backend(Arc::new(backend))
        .shutdown(shutdown.clone());
    if let Some(connector) = connector {
        builder = builder.connector(Arc::new(connector));
    }
    let gateway = builder.build();

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted; abandoning pending waits");
            ctrl_c.cancel();
        }
    });

    match command {
        Command::Status => {
            let connected = gateway.connect_wallet().await;
            let token = gateway.check_access_token().await;
            let account = gateway.snapshot();
            let status = serde_json::json!({
                "network": gateway.config().network.name,
                "chainId": gateway.config().network.chain_id,
                "connected": connected,
                "address": account.address.map(|a| a.to_checksum(None)),
                "accessToken": {
                    "held": token.is_held(),
                    "tokenId": token.token_id().map(|id| id.to_string()),
                },
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(true)
        }
        Command::Mint => {
            if !gateway.connect_wallet().await {
                return Ok(false);
            }
            Ok(gateway.mint_access_token().await)
        }
        Command::Shares {
            project_id,
            account,
        } => {
            let account = match account {
                Some(raw) => Some(Address::from_str(raw.trim())?),
                None => {
                    gateway.connect_wallet().await;
                    None
                }
            };
            let shares = gateway.get_project_shares(project_id, account).await;
            println!("{shares}");
            Ok(true)
        }
        Command::Project { project_id } => {
            let info = gateway.get_project_info(project_id).await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(true)
        }
    }
}
