//! Board configuration from the environment.

use board_core::ResourceKind;
use storage::StorageConfig;

use crate::error::{BoardError, Result};

pub const DEFAULT_PAGE_SIZE: usize = 24;

#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub kind: ResourceKind,
    pub page_size: usize,
    /// Generate the default layout when nothing is stored yet.
    pub seed: bool,
    pub storage: StorageConfig,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            kind: ResourceKind::Bay,
            page_size: DEFAULT_PAGE_SIZE,
            seed: true,
            storage: StorageConfig::memory(),
        }
    }
}

impl BoardConfig {
    /// Build a config from environment variables.
    ///
    /// - `BOARD_KIND`: `bay` or `bin` (default: bay)
    /// - `BOARD_PAGE_SIZE`: rows per page (default: 24)
    /// - `BOARD_SEED`: seed an empty store (default: true)
    /// - plus the `STORAGE_*` variables read by [`StorageConfig::from_env`]
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok(), StorageConfig::from_env()?)
    }

    /// Same as [`BoardConfig::from_env`] with an explicit variable source.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>, storage: StorageConfig) -> Result<Self> {
        let var = |name: &str| get(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let kind = match var("BOARD_KIND") {
            Some(v) => v
                .parse::<ResourceKind>()
                .map_err(|e| BoardError::InvalidConfig(format!("BOARD_KIND: {e}")))?,
            None => ResourceKind::Bay,
        };

        let page_size = match var("BOARD_PAGE_SIZE") {
            Some(v) => match v.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(BoardError::InvalidConfig(format!(
                        "BOARD_PAGE_SIZE={v} (expected a positive integer)"
                    )));
                }
            },
            None => DEFAULT_PAGE_SIZE,
        };

        let seed = match var("BOARD_SEED") {
            Some(v) => parse_flag("BOARD_SEED", &v)?,
            None => true,
        };

        Ok(Self {
            kind,
            page_size,
            seed,
            storage,
        })
    }
}

/// `true/false`, `1/0`, `yes/no`.
fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Ok(true),
        "0" | "false" | "no" | "n" => Ok(false),
        _ => Err(BoardError::InvalidConfig(format!(
            "invalid boolean for {name}={value} (expected true/false)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<BoardConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BoardConfig::from_vars(|name| vars.get(name).cloned(), StorageConfig::memory())
    }

    #[test]
    fn defaults_when_unset() -> Result<()> {
        let cfg = config(&[])?;
        assert_eq!(cfg.kind, ResourceKind::Bay);
        assert_eq!(cfg.page_size, DEFAULT_PAGE_SIZE);
        assert!(cfg.seed);
        Ok(())
    }

    #[test]
    fn reads_overrides() -> Result<()> {
        let cfg = config(&[("BOARD_KIND", "bins"), ("BOARD_PAGE_SIZE", "10"), ("BOARD_SEED", "no")])?;
        assert_eq!(cfg.kind, ResourceKind::Bin);
        assert_eq!(cfg.page_size, 10);
        assert!(!cfg.seed);
        Ok(())
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config(&[("BOARD_PAGE_SIZE", "0")]),
            Err(BoardError::InvalidConfig(_))
        ));
        assert!(matches!(
            config(&[("BOARD_KIND", "shelf")]),
            Err(BoardError::InvalidConfig(_))
        ));
        assert!(matches!(
            config(&[("BOARD_SEED", "maybe")]),
            Err(BoardError::InvalidConfig(_))
        ));
    }
}
