//! Signal construction tuning.

// ---------------------------------------------------------------------------
// SignalConfig
// ---------------------------------------------------------------------------

/// Configuration for a signal's notification channel.
#[derive(Debug, Clone)]
pub struct SignalConfig {
    /// Broadcast channel buffer capacity. Subscribers that fall more than
    /// this many events behind skip the missed events.
    pub channel_capacity: usize,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = SignalConfig::default();
        assert_eq!(config.channel_capacity, 256);
    }
}
