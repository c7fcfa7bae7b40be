//! Runtime configuration for a search run.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::matcher::{Pattern, PatternError};

/// Tor v3 vanity onion address generator
#[derive(Parser, Debug, Clone)]
#[command(name = "ovgen", version, about)]
pub struct Cli {
    /// Pattern to search for: a regex over [a-z2-7], anchored at the
    /// start of the address (a leading ^ is added if missing)
    pub pattern: String,

    /// Stop after this many matching addresses have been found
    pub count: i64,

    /// Number of worker threads (default: number of CPU cores)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Output directory for match record files
    #[arg(short, long, default_value = ".")]
    pub dst: PathBuf,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("count must be a positive integer, got {0}")]
    InvalidCount(i64),

    #[error("'{0}' is not a directory")]
    NotADirectory(String),
}

/// Validated, immutable parameters for one search run.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub pattern: Pattern,
    pub target: usize,
    pub workers: usize,
}

impl Cli {
    /// Validate the raw arguments into a [`SearchConfig`]. All pattern
    /// and count errors surface here, before any worker is spawned.
    pub fn validate(&self) -> Result<SearchConfig, ConfigError> {
        let pattern = Pattern::compile(&self.pattern)?;
        if self.count <= 0 {
            return Err(ConfigError::InvalidCount(self.count));
        }
        if !self.dst.is_dir() {
            return Err(ConfigError::NotADirectory(self.dst.display().to_string()));
        }
        Ok(SearchConfig {
            pattern,
            target: self.count as usize,
            workers: self.workers.unwrap_or_else(num_cpus::get).max(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(pattern: &str, count: i64) -> Cli {
        Cli {
            pattern: pattern.into(),
            count,
            workers: Some(2),
            dst: std::env::temp_dir(),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = cli("ab", 3).validate().unwrap();
        assert_eq!(config.target, 3);
        assert_eq!(config.workers, 2);
        assert_eq!(config.pattern.anchored(), "^ab");
    }

    #[test]
    fn test_bad_count() {
        assert!(matches!(
            cli("ab", 0).validate(),
            Err(ConfigError::InvalidCount(0))
        ));
        assert!(matches!(
            cli("ab", -4).validate(),
            Err(ConfigError::InvalidCount(-4))
        ));
    }

    #[test]
    fn test_bad_pattern() {
        assert!(matches!(
            cli("[", 1).validate(),
            Err(ConfigError::Pattern(_))
        ));
    }

    #[test]
    fn test_bad_dst() {
        let mut args = cli("ab", 1);
        args.dst = PathBuf::from("/definitely/not/a/dir");
        assert!(matches!(
            args.validate(),
            Err(ConfigError::NotADirectory(_))
        ));
    }
}
