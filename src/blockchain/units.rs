// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Conversion between human-readable native amounts and base units (wei).

use alloy::primitives::U256;

use super::client::ChainClientError;

/// Parse a human-readable amount into base units.
///
/// # Arguments
/// * `amount` - Amount as a string (e.g., "0.1", "50")
/// * `decimals` - Number of decimals of the currency (18 for ETH)
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, ChainClientError> {
    let amount = amount.trim();
    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (amount, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(ChainClientError::InvalidAmount(
            "Amount is empty".to_string(),
        ));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ChainClientError::InvalidAmount(format!(
            "Invalid amount format: {amount}"
        )));
    }
    if fraction.len() > decimals as usize {
        return Err(ChainClientError::InvalidAmount(format!(
            "Too many decimal places (max {decimals})"
        )));
    }

    let whole = if whole.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(whole, 10)
            .map_err(|_| ChainClientError::InvalidAmount("Invalid whole number".to_string()))?
    };

    // Pad with zeros to match decimals
    let padded = format!("{fraction:0<width$}", width = decimals as usize);
    let fraction = if padded.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(&padded, 10)
            .map_err(|_| ChainClientError::InvalidAmount("Invalid decimal".to_string()))?
    };

    let multiplier = U256::from(10u64).pow(U256::from(decimals));
    whole
        .checked_mul(multiplier)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(|| ChainClientError::InvalidAmount("Amount overflow".to_string()))
}

/// Format base units as a human-readable amount.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
        let trimmed = decimal_str.trim_end_matches('0');
        format!("{whole}.{trimmed}")
    }
}

/// Total cost of `amount` shares at `price_per_share` (already in base units).
pub fn share_cost(price_per_share: U256, amount: u64) -> Result<U256, ChainClientError> {
    price_per_share
        .checked_mul(U256::from(amount))
        .ok_or_else(|| ChainClientError::InvalidAmount("Share cost overflow".to_string()))
}
