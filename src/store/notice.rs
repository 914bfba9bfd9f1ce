use std::time::{Duration, Instant};

/// Dismiss delay for error notices
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(5);

/// A user-facing error message that dismisses itself after a while
#[derive(Debug, Clone)]
pub struct ErrorNotice {
    message: String,
    raised_at: Instant,
}

impl ErrorNotice {
    pub fn new(message: String) -> Self {
        Self {
            message,
            raised_at: Instant::now(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.raised_at.elapsed() >= ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_notice_expires() {
        let notice = ErrorNotice::new("Network Error".to_string());
        assert!(!notice.is_expired(DEFAULT_NOTICE_TTL));

        thread::sleep(Duration::from_millis(60));
        assert!(notice.is_expired(Duration::from_millis(50)));
    }
}
