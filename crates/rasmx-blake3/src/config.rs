//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{HashError, Result};

/// Upper bound on dedicated worker threads
pub const MAX_WORKER_THREADS: usize = 512;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Dedicated worker threads; 0 shares rayon's global pool
    #[serde(default)]
    pub worker_threads: usize,
    /// Inputs at least this long take the parallel subtree path
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
    /// Name prefix for dedicated worker threads
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
}

// Default values

fn default_parallel_threshold() -> usize {
    128 * 1024 // 128 KiB
}

fn default_thread_name() -> String {
    "rasmx-hash".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            parallel_threshold: default_parallel_threshold(),
            thread_name: default_thread_name(),
        }
    }
}

impl EngineConfig {
    /// Use a dedicated pool of `threads` workers (0 = shared pool).
    #[must_use]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    /// Set the input size from which hashing goes parallel.
    ///
    /// `usize::MAX` keeps every input on the sequential path.
    #[must_use]
    pub fn with_parallel_threshold(mut self, bytes: usize) -> Self {
        self.parallel_threshold = bytes;
        self
    }

    /// Set the worker thread name prefix.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// True if a dedicated pool will be built.
    #[must_use]
    pub fn uses_dedicated_pool(&self) -> bool {
        self.worker_threads > 0
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns [`HashError::InvalidConfig`] if the thread count is above
    /// [`MAX_WORKER_THREADS`] or the thread name is empty.
    pub fn validate(&self) -> Result<()> {
        if self.worker_threads > MAX_WORKER_THREADS {
            return Err(HashError::InvalidConfig(format!(
                "worker_threads must be at most {MAX_WORKER_THREADS}, got {}",
                self.worker_threads
            )));
        }

        if self.thread_name.trim().is_empty() {
            return Err(HashError::InvalidConfig(
                "thread_name must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.worker_threads, 0);
        assert_eq!(config.parallel_threshold, 128 * 1024);
        assert_eq!(config.thread_name, "rasmx-hash");
        assert!(!config.uses_dedicated_pool());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = EngineConfig::default()
            .with_worker_threads(4)
            .with_parallel_threshold(1024)
            .with_thread_name("hash-worker");

        assert!(config.uses_dedicated_pool());
        assert_eq!(config.worker_threads, 4);
        assert_eq!(config.parallel_threshold, 1024);
        assert_eq!(config.thread_name, "hash-worker");
    }

    #[test]
    fn test_validate_too_many_threads() {
        let config = EngineConfig::default().with_worker_threads(MAX_WORKER_THREADS + 1);
        assert!(matches!(
            config.validate(),
            Err(HashError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_empty_thread_name() {
        let config = EngineConfig::default().with_thread_name("  ");
        assert!(config.validate().is_err());
    }
}
