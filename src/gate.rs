use dashmap::DashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_BLOCK_WINDOW: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockedEntry {
    pub count: u32,
    pub since: Instant,
}

/// Failed secret attempts per source IP.
///
/// Entries are never removed; a block simply lapses once `block_window`
/// has passed since the last failure, and `count` keeps growing across the
/// whole life of the process.
#[derive(Debug)]
pub struct ConnectionGate {
    entries: DashMap<String, BlockedEntry>,
    block_window: Duration,
}

impl ConnectionGate {
    pub fn new(block_window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            block_window,
        }
    }

    /// Key used for a peer: its IP without the port.
    pub fn key(addr: &SocketAddr) -> String {
        addr.ip().to_canonical().to_string()
    }

    pub fn is_blocked(&self, ip: &str) -> bool {
        match self.entries.get(ip) {
            // A window too large to represent never lapses
            Some(entry) => entry
                .since
                .checked_add(self.block_window)
                .map_or(true, |end| Instant::now() < end),
            None => false,
        }
    }

    /// Returns the updated failure count for `ip`.
    pub fn record_failure(&self, ip: &str) -> u32 {
        let now = Instant::now();
        self.entries
            .entry(ip.to_string())
            .and_modify(|entry| {
                entry.count += 1;
                entry.since = now;
            })
            .or_insert(BlockedEntry { count: 1, since: now })
            .count
    }

    pub fn entry(&self, ip: &str) -> Option<BlockedEntry> {
        self.entries.get(ip).map(|entry| *entry)
    }
}

impl Default for ConnectionGate {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_key_strips_port() {
        let v4: SocketAddr = "10.1.2.3:5555".parse().unwrap();
        let v6: SocketAddr = "[::1]:5555".parse().unwrap();
        let mapped: SocketAddr = "[::ffff:10.1.2.3]:6000".parse().unwrap();

        assert_eq!(ConnectionGate::key(&v4), "10.1.2.3");
        assert_eq!(ConnectionGate::key(&v6), "::1");
        assert_eq!(ConnectionGate::key(&mapped), "10.1.2.3");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_ip_is_not_blocked() {
        let gate = ConnectionGate::default();
        assert!(!gate.is_blocked("10.0.0.1"));
        assert!(gate.entry("10.0.0.1").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_block_lapses_after_window() {
        let gate = ConnectionGate::default();

        assert_eq!(gate.record_failure("10.0.0.1"), 1);
        assert!(gate.is_blocked("10.0.0.1"));
        assert!(!gate.is_blocked("10.0.0.2"));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(gate.is_blocked("10.0.0.1"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!gate.is_blocked("10.0.0.1"));

        // Entry survives expiry
        assert_eq!(gate.entry("10.0.0.1").unwrap().count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_refreshes_window_and_counts() {
        let gate = ConnectionGate::new(Duration::from_secs(60));

        gate.record_failure("10.0.0.1");
        tokio::time::advance(Duration::from_secs(50)).await;
        assert_eq!(gate.record_failure("10.0.0.1"), 2);

        tokio::time::advance(Duration::from_secs(50)).await;
        assert!(gate.is_blocked("10.0.0.1"));

        tokio::time::advance(Duration::from_secs(100)).await;
        assert!(!gate.is_blocked("10.0.0.1"));
        assert_eq!(gate.record_failure("10.0.0.1"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrepresentable_window_never_lapses() {
        let gate = ConnectionGate::new(Duration::from_secs(u64::MAX / 60 * 60));

        gate.record_failure("10.0.0.3");
        tokio::time::advance(Duration::from_secs(365 * 24 * 3600)).await;
        assert!(gate.is_blocked("10.0.0.3"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_failures_are_all_counted() {
        let gate = Arc::new(ConnectionGate::default());

        let handles: Vec<_> = (0..64)
            .map(|_| {
                let gate = gate.clone();
                tokio::spawn(async move {
                    gate.record_failure("10.0.0.9");
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(gate.entry("10.0.0.9").unwrap().count, 64);
    }
}
