//! Cache duration policies.

use std::time::Duration;

/// How long a cached upstream response stays usable.
///
/// An entry younger than `max_age` is fresh. Between `max_age` and
/// `max_age + stale_while_revalidate` it is served stale while a refresh runs
/// in the background. After that it is evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStrategy {
    /// Time an entry is served without revalidation.
    pub max_age: Duration,
    /// Additional time a stale entry may be served while revalidating.
    pub stale_while_revalidate: Duration,
    /// Never store responses.
    pub no_store: bool,
}

/// Freshness of a cache entry relative to its strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
    Expired,
}

impl CacheStrategy {
    /// One hour fresh, then up to 23 hours stale-while-revalidate.
    #[must_use]
    pub const fn long() -> Self {
        Self {
            max_age: Duration::from_secs(3600),
            stale_while_revalidate: Duration::from_secs(82_800),
            no_store: false,
        }
    }

    /// One second fresh, then up to 9 seconds stale-while-revalidate.
    #[must_use]
    pub const fn short() -> Self {
        Self {
            max_age: Duration::from_secs(1),
            stale_while_revalidate: Duration::from_secs(9),
            no_store: false,
        }
    }

    /// Bypass the cache entirely.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_age: Duration::ZERO,
            stale_while_revalidate: Duration::ZERO,
            no_store: true,
        }
    }

    /// Total lifetime of an entry in the store.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.max_age.saturating_add(self.stale_while_revalidate)
    }

    /// Classify an entry of the given age.
    #[must_use]
    pub fn freshness(&self, age: Duration) -> Freshness {
        if age < self.max_age {
            Freshness::Fresh
        } else if age < self.ttl() {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }
}
