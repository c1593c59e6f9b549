use std::time::Duration;

use clap::Args;

pub const DEFAULT_ALL_CLASSES_MARKER: &str = "Todas";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Runtime knobs of the aggregation engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Authorized-class value that opens a virtual session to every class.
    /// `None` counts only sessions that name the class explicitly.
    pub all_classes_marker: Option<String>,
    /// Zero disables caching.
    pub cache_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            all_classes_marker: Some(DEFAULT_ALL_CLASSES_MARKER.to_string()),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct DatabaseArgs {
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,
    #[arg(long, env = "GRADEBOOK_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Args)]
pub struct EngineArgs {
    #[arg(long, env = "GRADEBOOK_ALL_CLASSES_MARKER", default_value = DEFAULT_ALL_CLASSES_MARKER)]
    pub all_classes_marker: String,
    /// Only count virtual sessions that name the class explicitly
    #[arg(long, env = "GRADEBOOK_IGNORE_ALL_CLASSES_MARKER")]
    pub ignore_all_classes_marker: bool,
    #[arg(long, env = "GRADEBOOK_CACHE_TTL_SECS", default_value_t = DEFAULT_CACHE_TTL_SECS)]
    pub cache_ttl_secs: u64,
}

impl From<&EngineArgs> for EngineConfig {
    fn from(args: &EngineArgs) -> Self {
        let marker = args.all_classes_marker.trim();
        Self {
            all_classes_marker: (!args.ignore_all_classes_marker && !marker.is_empty())
                .then(|| marker.to_string()),
            cache_ttl: Duration::from_secs(args.cache_ttl_secs),
        }
    }
}
