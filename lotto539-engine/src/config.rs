use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::backtest::BacktestConfig;
use crate::error::{EngineError, EngineResult};
use crate::recommend::RecommendConfig;
use crate::scoring::ScoreWeights;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub recommend: RecommendConfig,
    pub scoring: ScoreWeights,
    pub backtest: BacktestConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> EngineResult<()> {
        self.recommend.validate()?;
        self.backtest.validate()?;
        if self.scoring.hot_window == 0 {
            return Err(EngineError::InvalidConfig("scoring.hot_window doit être > 0".into()));
        }
        Ok(())
    }
}

pub fn save_config(config: &EngineConfig, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)
        .with_context(|| format!("Impossible d'écrire {:?}", path))?;
    Ok(())
}

/// Charge et valide une configuration ; les champs absents prennent leur valeur par défaut.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {:?}", path))?;
    let config: EngineConfig = serde_json::from_str(&json)
        .with_context(|| format!("JSON invalide dans {:?}", path))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!((config.recommend.affinity_weight - 1.2).abs() < 1e-10);
        assert!((config.recommend.miss_weight - 0.3).abs() < 1e-10);
        assert_eq!(config.recommend.window, 30);
        assert_eq!(config.backtest.span, 100);
        assert_eq!(config.scoring.base, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lotto539.json");

        let mut config = EngineConfig::default();
        config.recommend.miss_weight = 0.5;
        config.backtest.span = 60;
        save_config(&config, &path).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "recommend": { "affinity_weight": 0.8 } }"#).unwrap();

        let loaded = load_config(&path).unwrap();
        assert!((loaded.recommend.affinity_weight - 0.8).abs() < 1e-10);
        assert_eq!(loaded.recommend.window, 30);
        assert_eq!(loaded.scoring, ScoreWeights::default());
    }

    #[test]
    fn test_load_rejects_out_of_domain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "recommend": { "miss_weight": 3.0 } }"#).unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_config(Path::new("/nonexistent/lotto539.json")).is_err());
    }
}
