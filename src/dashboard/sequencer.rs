use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Proof that a request was issued. Only the latest ticket per key is current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    key: String,
    seq: u64,
}

impl RequestTicket {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Hands out increasing sequence numbers so late responses to superseded
/// requests can be dropped instead of overwriting newer state.
pub struct RequestSequencer {
    next: AtomicU64,
    latest: DashMap<String, u64>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            latest: DashMap::new(),
        }
    }

    pub fn issue(&self, key: &str) -> RequestTicket {
        let seq = self.next.fetch_add(1, Ordering::Relaxed);
        self.latest.insert(key.to_string(), seq);
        RequestTicket {
            key: key.to_string(),
            seq,
        }
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.latest
            .get(&ticket.key)
            .is_some_and(|latest| *latest == ticket.seq)
    }
}

impl Default for RequestSequencer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_ticket_supersedes() {
        let sequencer = RequestSequencer::new();
        let first = sequencer.issue("btc-100k");
        let second = sequencer.issue("btc-100k");

        assert!(second.seq() > first.seq());
        assert!(!sequencer.is_current(&first));
        assert!(sequencer.is_current(&second));
    }

    #[test]
    fn test_keys_are_independent() {
        let sequencer = RequestSequencer::new();
        let btc = sequencer.issue("btc-100k");
        let eth = sequencer.issue("eth-etf");

        assert!(sequencer.is_current(&btc));
        assert!(sequencer.is_current(&eth));
        assert_eq!(eth.key(), "eth-etf");
    }
}
