use std::env;
use std::time::Duration;

use crate::room_manager::TimingConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub word_list_path: String,
    pub grace_ms: u64,
    pub pacing_ms: u64,
}

impl Config {
    pub fn new() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("Invalid PORT"),
            word_list_path: env::var("WORD_LIST_PATH")
                .unwrap_or_else(|_| "./words.txt".to_string()),
            grace_ms: env::var("ROUND_GRACE_MS")
                .unwrap_or_else(|_| "1500".to_string())
                .parse()
                .expect("Invalid ROUND_GRACE_MS"),
            pacing_ms: env::var("ROUND_PACING_MS")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .expect("Invalid ROUND_PACING_MS"),
        }
    }

    pub fn timing(&self) -> TimingConfig {
        TimingConfig {
            grace: Duration::from_millis(self.grace_ms),
            pacing: Duration::from_millis(self.pacing_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
