// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Platform contract interfaces and call encoding.

use alloy::{
    primitives::{Address, U256},
    sol,
    sol_types::SolCall,
};

use super::types::{ContractAddresses, ContractCall, ACCESS_TOKEN_MINT_PRICE};

// Access-token (ERC-721 enumerable) interface
sol! {
    #[sol(rpc)]
    interface IAccessToken {
        function balanceOf(address owner) external view returns (uint256);
        function ownerOf(uint256 tokenId) external view returns (address);
        function tokenOfOwnerByIndex(address owner, uint256 index) external view returns (uint256);
        function tokenURI(uint256 tokenId) external view returns (string);
        function totalSupply() external view returns (uint256);
        function safeMint(address to) external payable;

        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
    }
}

// Project/shares (ERC-1155) interface
sol! {
    #[sol(rpc)]
    interface IProjectShares {
        function balanceOf(address account, uint256 id) external view returns (uint256);
        function createProject(string uri, uint256 totalShares, uint256 pricePerShare) external returns (uint256);
        function buyShares(uint256 projectId, uint256 amount) external payable;
        function getProjectInfo(uint256 projectId) external view returns (
            address creator,
            uint256 totalShares,
            uint256 availableShares,
            uint256 pricePerShare,
            uint256 creationDate
        );
        function getProjectURI(uint256 projectId) external view returns (string);

        event ProjectCreated(uint256 indexed projectId, address indexed creator, uint256 totalShares, uint256 pricePerShare);
        event SharesPurchased(uint256 indexed projectId, address indexed buyer, uint256 amount);
    }
}

/// `safeMint(to)` with the fixed mint price attached.
pub fn mint_access_token_call(contracts: &ContractAddresses, to: Address) -> ContractCall {
    ContractCall {
        to: contracts.access_token,
        input: IAccessToken::safeMintCall { to }.abi_encode().into(),
        value: ACCESS_TOKEN_MINT_PRICE,
    }
}

/// `createProject(uri, totalShares, pricePerShare)`; not payable.
pub fn create_project_call(
    contracts: &ContractAddresses,
    uri: &str,
    total_shares: U256,
    price_per_share: U256,
) -> ContractCall {
    ContractCall {
        to: contracts.project,
        input: IProjectShares::createProjectCall {
            uri: uri.to_string(),
            totalShares: total_shares,
            pricePerShare: price_per_share,
        }
        .abi_encode()
        .into(),
        value: U256::ZERO,
    }
}

/// `buyShares(projectId, amount)` paying `cost` wei.
pub fn buy_shares_call(
    contracts: &ContractAddresses,
    project_id: U256,
    amount: U256,
    cost: U256,
) -> ContractCall {
    ContractCall {
        to: contracts.project,
        input: IProjectShares::buySharesCall {
            projectId: project_id,
            amount,
        }
        .abi_encode()
        .into(),
        value: cost,
    }
}
