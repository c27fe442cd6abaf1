//! Game configuration loaded from the environment.

use std::net::SocketAddr;
use std::time::Duration;

/// Timings and limits for every session run by this process
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub max_players: usize,
    /// Target number of matchups per player and round
    pub matchups_per_player: usize,
    /// Length of the collection phase
    pub response_timeout: Duration,
    /// Lead time of the last reminder before the collection deadline
    pub last_reminder_lead: Duration,
    /// Upper bound on how long a single poll stays open
    pub poll_timeout: Duration,
    /// How often an open poll is checked for completion
    pub poll_check_interval: Duration,
    pub fallback_answer: String,
    pub no_prompts_notice: String,
    pub prompts_path: String,
    pub bind_addr: SocketAddr,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_players: 8,
            matchups_per_player: 2,
            response_timeout: Duration::from_secs(30),
            last_reminder_lead: Duration::from_secs(10),
            poll_timeout: Duration::from_secs(10),
            poll_check_interval: Duration::from_secs(1),
            fallback_answer: "❌ No response".to_string(),
            no_prompts_notice: "⚠️ No prompts available (check data/prompts.txt).".to_string(),
            prompts_path: "data/prompts.txt".to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 6573)),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    non_empty_var(key).and_then(|v| v.parse().ok())
}

impl GameConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_players: parsed_var("MAX_PLAYERS").unwrap_or(defaults.max_players),
            matchups_per_player: parsed_var("MATCHUPS_PER_PLAYER")
                .unwrap_or(defaults.matchups_per_player),
            response_timeout: parsed_var("RESPONSE_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.response_timeout),
            last_reminder_lead: parsed_var("LAST_REMINDER_TIME")
                .map(Duration::from_secs)
                .unwrap_or(defaults.last_reminder_lead),
            poll_timeout: parsed_var("POLL_TIMING")
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_timeout),
            poll_check_interval: parsed_var("POLL_CHECK_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_check_interval),
            fallback_answer: non_empty_var("FALLBACK_ANSWER").unwrap_or(defaults.fallback_answer),
            no_prompts_notice: defaults.no_prompts_notice,
            prompts_path: non_empty_var("PROMPTS_PATH").unwrap_or(defaults.prompts_path),
            bind_addr: parsed_var("BIND_ADDR").unwrap_or(defaults.bind_addr),
        }
    }

    /// Offset of the half-time reminder from the start of collection
    pub fn first_reminder_at(&self) -> Duration {
        self.response_timeout / 2
    }

    /// Offset of the last reminder from the start of collection
    pub fn last_reminder_at(&self) -> Duration {
        self.response_timeout.saturating_sub(self.last_reminder_lead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.max_players, 8);
        assert_eq!(config.matchups_per_player, 2);
        assert_eq!(config.response_timeout, Duration::from_secs(30));
        assert_eq!(config.first_reminder_at(), Duration::from_secs(15));
        assert_eq!(config.last_reminder_at(), Duration::from_secs(20));
    }

    #[test]
    fn test_last_reminder_never_negative() {
        let config = GameConfig {
            response_timeout: Duration::from_secs(5),
            last_reminder_lead: Duration::from_secs(10),
            ..GameConfig::default()
        };
        assert_eq!(config.last_reminder_at(), Duration::ZERO);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        std::env::set_var("MAX_PLAYERS", "4");
        std::env::set_var("RESPONSE_TIMEOUT", "60");
        std::env::set_var("POLL_TIMING", " ");
        let config = GameConfig::from_env();
        std::env::remove_var("MAX_PLAYERS");
        std::env::remove_var("RESPONSE_TIMEOUT");
        std::env::remove_var("POLL_TIMING");

        assert_eq!(config.max_players, 4);
        assert_eq!(config.response_timeout, Duration::from_secs(60));
        assert_eq!(config.poll_timeout, Duration::from_secs(10));
    }

    #[test]
    #[serial]
    fn test_from_env_ignores_garbage() {
        std::env::set_var("MATCHUPS_PER_PLAYER", "lots");
        let config = GameConfig::from_env();
        std::env::remove_var("MATCHUPS_PER_PLAYER");

        assert_eq!(config.matchups_per_player, 2);
    }
}
