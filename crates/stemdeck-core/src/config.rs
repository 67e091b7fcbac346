//! Configuration management for stemdeck

use crate::error::ConfigError;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    pub storage: StorageConfig,
    pub download: DownloadConfig,
    pub separation: SeparationConfig,
    pub transcode: TranscodeConfig,
    pub limits: LimitsConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Path to FFmpeg binary (auto-detected if not set)
    pub ffmpeg: Option<PathBuf>,
    /// Path to demucs binary (auto-detected if not set)
    pub demucs: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for staging files and separation output
    pub work_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// URL-to-MP3 conversion endpoint
    pub endpoint: String,
    /// Access token for the conversion endpoint; kept out of the source
    /// tree on purpose (set STEMDECK_DOWNLOAD__ACCESS_TOKEN)
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeparationConfig {
    /// Demucs model name, also the directory key under `separated/`
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeConfig {
    /// libmp3lame VBR quality (`-qscale:a`), 0 = best
    pub quality: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub download_timeout_secs: u64,
    pub separate_timeout_secs: u64,
    pub transcode_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig {
                ffmpeg: None,
                demucs: None,
            },
            storage: StorageConfig {
                work_dir: PathBuf::from("."),
            },
            download: DownloadConfig {
                endpoint: "https://www.clipto.com/api/youtube/mp3".to_string(),
                access_token: None,
            },
            separation: SeparationConfig {
                model: "htdemucs".to_string(),
            },
            transcode: TranscodeConfig { quality: 2 },
            limits: LimitsConfig {
                download_timeout_secs: 120,
                separate_timeout_secs: 1800,
                transcode_timeout_secs: 300,
            },
            server: ServerConfig {
                bind: "127.0.0.1".to_string(),
                port: 8750,
            },
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Load from default config directory
        if let Some(config_dir) = dirs::config_dir() {
            let default_config = config_dir.join("stemdeck/config.toml");
            if default_config.exists() {
                figment = figment.merge(Toml::file(&default_config));
            }
        }

        // Load from specified config file
        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment, e.g. STEMDECK_DOWNLOAD__ACCESS_TOKEN
        figment = figment.merge(Env::prefixed("STEMDECK_").split("__"));

        figment
            .extract()
            .map_err(|e| ConfigError::LoadError(e.to_string()))
    }

    /// Get FFmpeg path, auto-detecting if not configured
    pub fn ffmpeg_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.paths.ffmpeg {
            Ok(path.clone())
        } else {
            which::which("ffmpeg")
                .map_err(|_| ConfigError::InvalidValue("ffmpeg not found in PATH".to_string()))
        }
    }

    /// Get demucs path, auto-detecting if not configured
    pub fn demucs_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.paths.demucs {
            Ok(path.clone())
        } else {
            which::which("demucs")
                .map_err(|_| ConfigError::InvalidValue("demucs not found in PATH".to_string()))
        }
    }

    /// Directory downloaded MP3s are staged in before separation
    pub fn staging_dir(&self) -> PathBuf {
        self.storage.work_dir.join("src")
    }

    /// Directory processed results live in, one subdirectory per track
    pub fn separated_root(&self) -> PathBuf {
        self.storage
            .work_dir
            .join("separated")
            .join(&self.separation.model)
    }
}

impl LimitsConfig {
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn separate_timeout(&self) -> Duration {
        Duration::from_secs(self.separate_timeout_secs)
    }

    pub fn transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.transcode_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let config = Config::default();
        assert_eq!(config.staging_dir(), PathBuf::from("./src"));
        assert_eq!(
            config.separated_root(),
            PathBuf::from("./separated/htdemucs")
        );
        assert_eq!(config.separation.model, "htdemucs");
        assert_eq!(config.transcode.quality, 2);
    }

    #[test]
    fn test_token_defaults_to_unset() {
        // The endpoint ships with the binary; the credential never does.
        let config = Config::default();
        assert!(config.download.access_token.is_none());
        assert!(!config.download.endpoint.is_empty());
    }
}
