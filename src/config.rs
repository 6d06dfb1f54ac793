//! Service configuration. Loaded from a JSON file; any missing section falls
//! back to its default.

use crate::gate::{Label, LabelMapping};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_PATH_ENV: &str = "CLICKGUARD_CONFIG_PATH";

const SESSION_LOG_FILE: &str = "click_logs.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Data directory (session log)
    pub data_dir: PathBuf,
    /// Classifier backend and output mapping
    pub model: ModelConfig,
    /// Feature extraction parameters
    pub features: FeaturesConfig,
    /// Labeled training corpus
    pub corpus: CorpusConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// JSON-described logistic model
    Logistic,
    /// ONNX classifier (requires the `onnx` feature)
    Onnx,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub kind: ModelKind,
    pub path: PathBuf,
    /// How the classifier's 0/1 output maps onto labels
    pub label_mapping: LabelMapping,
    /// Score at or above which a probability output counts as class 1
    pub score_threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Aligned coordinate/timestamp pairs a training session needs
    pub min_aligned_samples: usize,
    /// Stand-in for a zero time delta between samples (ms)
    pub zero_dt_epsilon_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledFile {
    pub path: PathBuf,
    pub label: Label,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// One JSON array file per label class
    pub files: Vec<LabeledFile>,
    /// Feature table written by `build-corpus`
    pub output: PathBuf,
    /// Append per-step velocity/acceleration columns to the export
    pub include_kinematics: bool,
    /// Worker threads; 0 uses the available parallelism
    pub workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".clickguard"),
            model: ModelConfig::default(),
            features: FeaturesConfig::default(),
            corpus: CorpusConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kind: ModelKind::Logistic,
            path: PathBuf::from("model.json"),
            label_mapping: LabelMapping::default(),
            score_threshold: 0.5,
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            min_aligned_samples: 5,
            zero_dt_epsilon_ms: 0.001,
        }
    }
}

impl FeaturesConfig {
    /// Configured epsilon, or the default when it is not a positive number.
    pub fn zero_dt_epsilon(&self) -> f64 {
        if self.zero_dt_epsilon_ms.is_finite() && self.zero_dt_epsilon_ms > 0.0 {
            self.zero_dt_epsilon_ms
        } else {
            Self::default().zero_dt_epsilon_ms
        }
    }
}

impl Default for CorpusConfig {
    fn default() -> Self {
        let raw = PathBuf::from("data/raw/mouse_movements");
        Self {
            files: vec![
                LabeledFile {
                    path: raw.join("humans/mouse_movements_humans.json"),
                    label: Label::Human,
                },
                LabeledFile {
                    path: raw.join("bots/mouse_movements_advanced_bots.json"),
                    label: Label::Bot,
                },
                LabeledFile {
                    path: raw.join("bots/mouse_movements_moderate_bots.json"),
                    label: Label::Bot,
                },
            ],
            output: PathBuf::from("data/processed/features.csv"),
            include_kinematics: false,
            workers: 0,
        }
    }
}

impl CorpusConfig {
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl AppConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<AppConfig>(&data) {
                    return c;
                }
            }
        }
        Self::default()
    }

    pub fn session_log_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_LOG_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"model": {"label_mapping": "zero_is_human"}, "features": {"min_aligned_samples": 8}}"#,
        )
        .unwrap();
        let c = AppConfig::load(&path);
        assert_eq!(c.model.label_mapping, LabelMapping::ZeroIsHuman);
        assert_eq!(c.model.kind, ModelKind::Logistic);
        assert_eq!(c.features.min_aligned_samples, 8);
        assert_eq!(c.features.zero_dt_epsilon_ms, 0.001);
        assert_eq!(c.corpus.files.len(), 3);
    }

    #[test]
    fn invalid_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(AppConfig::load(&path).features.min_aligned_samples, 5);
    }

    #[test]
    fn non_positive_epsilon_uses_default() {
        let c = FeaturesConfig {
            min_aligned_samples: 5,
            zero_dt_epsilon_ms: 0.0,
        };
        assert_eq!(c.zero_dt_epsilon(), 0.001);
    }
}
