// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LRU cache of access-token checks.
//!
//! Keyed by `(chain id, address)` so that switching accounts or networks
//! never reuses a result that belongs to another identity.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use alloy::primitives::Address;
use lru::LruCache;

use super::AccessToken;

type CacheKey = (u64, Address);

struct CacheEntry {
    token: AccessToken,
    inserted_at: Instant,
}

/// In-process LRU cache of access-token state per account.
pub struct AccessTokenCache {
    cache: Mutex<LruCache<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl AccessTokenCache {
    /// Create a cache holding at most `capacity` accounts for `ttl` each.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            ttl,
        }
    }

    /// Cached state for an account. Returns `None` if not cached or expired.
    pub fn get(&self, chain_id: u64, address: Address) -> Option<AccessToken> {
        let key = (chain_id, address);
        let mut cache = self.cache.lock().ok()?;
        if let Some(entry) = cache.get(&key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.token);
            }
            cache.pop(&key);
        }
        None
    }

    pub fn put(&self, chain_id: u64, address: Address, token: AccessToken) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                (chain_id, address),
                CacheEntry {
                    token,
                    inserted_at: Instant::now(),
                },
            );
        }
    }

    pub fn invalidate(&self, chain_id: u64, address: Address) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.pop(&(chain_id, address));
        }
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }
}
