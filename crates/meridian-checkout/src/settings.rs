//! # Settings Cache
//!
//! An explicitly injected, explicitly invalidated cache over the settings
//! repository. Services read the VAT rate through this cache on every
//! totals computation; `reset_cache` is the invalidation hook for admin
//! updates and test isolation.
//!
//! No global state: each cache instance is constructed with its
//! repository and handed to the services that need it.

use std::sync::Mutex;

use tracing::debug;

use crate::error::EngineResult;
use meridian_core::{Settings, VatRate};
use meridian_db::SettingsRepository;

/// Cached view of the persisted runtime settings.
#[derive(Debug)]
pub struct SettingsCache {
    repo: SettingsRepository,
    cached: Mutex<Option<Settings>>,
}

impl SettingsCache {
    /// Creates a cache over a settings repository. Nothing is loaded
    /// until first use.
    pub fn new(repo: SettingsRepository) -> Self {
        SettingsCache {
            repo,
            cached: Mutex::new(None),
        }
    }

    /// Returns the current settings, loading them on first use.
    pub async fn settings(&self) -> EngineResult<Settings> {
        {
            let cached = self.cached.lock().expect("settings cache poisoned");
            if let Some(settings) = cached.as_ref() {
                return Ok(settings.clone());
            }
        }

        // The guard is released across the await; a racing loader just
        // repeats the same read.
        let settings = self.repo.get().await?;
        debug!(vat_rate = %settings.vat_rate, "Settings loaded into cache");

        let mut cached = self.cached.lock().expect("settings cache poisoned");
        *cached = Some(settings.clone());
        Ok(settings)
    }

    /// Returns the current VAT rate.
    pub async fn vat_rate(&self) -> EngineResult<VatRate> {
        Ok(VatRate::new(self.settings().await?.vat_rate))
    }

    /// Returns the low-stock report threshold.
    pub async fn low_stock_threshold(&self) -> EngineResult<i64> {
        Ok(self.settings().await?.low_stock_threshold)
    }

    /// Drops the cached settings; the next read hits the repository.
    ///
    /// Call after an administrative settings update, and between tests
    /// that change rates.
    pub fn reset_cache(&self) {
        debug!("Settings cache reset");
        let mut cached = self.cached.lock().expect("settings cache poisoned");
        *cached = None;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_db::{Database, DbConfig};
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_cache_serves_stale_until_reset() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let cache = SettingsCache::new(db.settings());

        // Prime the cache with the seeded 15% rate
        assert_eq!(
            cache.vat_rate().await.unwrap().as_decimal(),
            Decimal::new(15, 2)
        );

        // Change the persisted rate; the cache still serves the old one
        db.settings().update(Decimal::new(21, 2), 5).await.unwrap();
        assert_eq!(
            cache.vat_rate().await.unwrap().as_decimal(),
            Decimal::new(15, 2)
        );

        // Invalidation makes the new rate visible
        cache.reset_cache();
        assert_eq!(
            cache.vat_rate().await.unwrap().as_decimal(),
            Decimal::new(21, 2)
        );
    }

    #[tokio::test]
    async fn test_threshold_reads_through_cache() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let cache = SettingsCache::new(db.settings());

        assert_eq!(cache.low_stock_threshold().await.unwrap(), 5);
    }
}
