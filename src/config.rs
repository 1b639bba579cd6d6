use std::path::PathBuf;

use clap::Parser;

use crate::artifacts::{ArtifactPaths, DEFAULT_BUNDLE_FILE, DEFAULT_MODEL_FILE, DEFAULT_SCALER_FILE};

/// Student dropout risk API.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "dropout_risk", version, about = "Jaya Jaya Institut student dropout risk API")]
pub struct Config {
    /// Directory holding the exported model artifacts.
    #[arg(long, env = "DROPOUT_ARTIFACT_DIR", default_value = ".")]
    pub artifact_dir: PathBuf,

    /// Combined bundle file name, relative to the artifact directory.
    #[arg(long, default_value = DEFAULT_BUNDLE_FILE)]
    pub bundle_file: String,

    /// Standalone model file name.
    #[arg(long, default_value = DEFAULT_MODEL_FILE)]
    pub model_file: String,

    /// Standalone scaler file name.
    #[arg(long, default_value = DEFAULT_SCALER_FILE)]
    pub scaler_file: String,

    #[arg(long, env = "DROPOUT_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(short, long, env = "DROPOUT_PORT", default_value_t = 8080)]
    pub port: u16,
}

impl Config {
    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            bundle: self.artifact_dir.join(&self.bundle_file),
            model: self.artifact_dir.join(&self.model_file),
            scaler: self.artifact_dir.join(&self.scaler_file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_artifact_defaults() {
        let config = Config::try_parse_from(["dropout_risk"]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.artifact_paths(), ArtifactPaths::in_dir("."));
    }

    #[test]
    fn test_overrides() {
        let config = Config::try_parse_from([
            "dropout_risk",
            "--artifact-dir",
            "/srv/models",
            "--model-file",
            "lr.json",
            "-p",
            "9000",
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.artifact_paths().model, PathBuf::from("/srv/models/lr.json"));
        assert_eq!(
            config.artifact_paths().bundle,
            PathBuf::from("/srv/models").join(DEFAULT_BUNDLE_FILE)
        );
    }
}
