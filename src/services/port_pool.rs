//! Port assignment for running deployments.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Hands out ports from a fixed inclusive range, lowest free port first.
///
/// A port stays leased until released, so no two live deployments share one.
#[derive(Debug)]
pub struct PortPool {
    range: RangeInclusive<u16>,
    leased: Mutex<BTreeSet<u16>>,
}

impl PortPool {
    pub fn new(start: u16, end: u16) -> Self {
        Self {
            range: start..=end,
            leased: Mutex::new(BTreeSet::new()),
        }
    }

    /// Lease the lowest free port, or `None` when the range is exhausted.
    pub fn acquire(&self) -> Option<u16> {
        let mut leased = self.lock();
        let port = self.range.clone().find(|port| !leased.contains(port))?;
        leased.insert(port);
        debug!(port, "Leased deployment port");
        Some(port)
    }

    /// Lease the lowest free port as a guard that returns it to the pool
    /// when dropped, unless [`PortLease::keep`] is called.
    pub fn lease(self: &Arc<Self>) -> Option<PortLease> {
        let port = self.acquire()?;
        Some(PortLease {
            pool: Arc::clone(self),
            port,
            kept: false,
        })
    }

    /// Mark a port as in use, e.g. one held by a deployment that was already
    /// running before startup. Returns false if it was out of range or taken.
    pub fn reserve(&self, port: u16) -> bool {
        if !self.range.contains(&port) {
            warn!(port, "Ignoring reservation outside the port range");
            return false;
        }
        self.lock().insert(port)
    }

    pub fn release(&self, port: u16) {
        if self.lock().remove(&port) {
            debug!(port, "Released deployment port");
        }
    }

    pub fn leased_count(&self) -> usize {
        self.lock().len()
    }

    pub fn capacity(&self) -> usize {
        self.range.clone().count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeSet<u16>> {
        // The set is always left consistent, so a poisoned lock is still usable.
        self.leased.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// A port taken from a [`PortPool`] that is given back on drop.
#[derive(Debug)]
pub struct PortLease {
    pool: Arc<PortPool>,
    port: u16,
    kept: bool,
}

impl PortLease {
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Keep the port leased past the guard's lifetime.
    pub fn keep(mut self) -> u16 {
        self.kept = true;
        self.port
    }
}

impl Drop for PortLease {
    fn drop(&mut self) {
        if !self.kept {
            self.pool.release(self.port);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_lowest_free_port_first() {
        let pool = PortPool::new(8100, 8102);
        assert_eq!(pool.acquire(), Some(8100));
        assert_eq!(pool.acquire(), Some(8101));
        pool.release(8100);
        assert_eq!(pool.acquire(), Some(8100));
        assert_eq!(pool.acquire(), Some(8102));
        assert_eq!(pool.acquire(), None);
    }

    #[test]
    fn test_reserve() {
        let pool = PortPool::new(8100, 8101);
        assert!(pool.reserve(8100));
        assert!(!pool.reserve(8100));
        assert!(!pool.reserve(9000));
        assert_eq!(pool.acquire(), Some(8101));
        assert_eq!(pool.leased_count(), 2);
        assert_eq!(pool.capacity(), 2);
    }

    #[test]
    fn test_lease_returns_port_on_drop() {
        let pool = Arc::new(PortPool::new(8100, 8100));
        let lease = pool.lease().unwrap();
        assert_eq!(lease.port(), 8100);
        assert!(pool.lease().is_none());
        drop(lease);

        let kept = pool.lease().unwrap().keep();
        assert_eq!(kept, 8100);
        assert_eq!(pool.leased_count(), 1);
    }

    proptest! {
        #[test]
        fn acquired_ports_are_distinct_and_in_range(start in 1024u16..60000, len in 1u16..64, takes in 0usize..80) {
            let end = start + len - 1;
            let pool = PortPool::new(start, end);
            let mut seen = BTreeSet::new();
            for _ in 0..takes {
                match pool.acquire() {
                    Some(port) => {
                        prop_assert!((start..=end).contains(&port));
                        prop_assert!(seen.insert(port));
                    }
                    None => prop_assert_eq!(seen.len(), usize::from(len)),
                }
            }
        }
    }
}
