use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{ConfigError, Result};

/// Environment variable naming the settings file.
pub const CONFIG_FILE_ENV: &str = "FIGMA_ARCHIVE_CONFIG";
/// Environment variable holding an access token for the remote buckets.
pub const ACCESS_TOKEN_ENV: &str = "FIGMA_ACCESS_TOKEN";

pub const DEFAULT_FILES_URL: &str = "https://figma-community-files.s3.us-west-1.amazonaws.com";
pub const DEFAULT_IMAGES_URL: &str = "https://figma-community-images.s3.us-west-1.amazonaws.com";

fn default_files_url() -> String {
    DEFAULT_FILES_URL.into()
}

fn default_images_url() -> String {
    DEFAULT_IMAGES_URL.into()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Local roots of an on-disk archive.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ArchivePaths {
    pub files: PathBuf,
    pub images: PathBuf,
}

/// Bucket base URLs and transport settings of the remote archive.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RemoteEndpoints {
    #[serde(default = "default_files_url")]
    pub files: String,
    #[serde(default = "default_images_url")]
    pub images: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for RemoteEndpoints {
    fn default() -> Self {
        Self {
            files: default_files_url(),
            images: default_images_url(),
            timeout_secs: default_timeout_secs(),
            token: None,
        }
    }
}

impl RemoteEndpoints {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Both bucket URLs must parse and the timeout must be non-zero.
    pub fn validate(&self) -> Result<()> {
        for url in [&self.files, &self.images] {
            Url::parse(url).map_err(|source| ConfigError::InvalidUrl {
                url: url.clone(),
                source,
            })?;
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                reason: "remote.timeout_secs must be greater than 0".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl ArchivePaths {
    /// Both roots must be existing directories.
    pub fn validate(&self) -> Result<()> {
        for (name, root) in [("files", &self.files), ("images", &self.images)] {
            if !root.is_dir() {
                return Err(ConfigError::Invalid {
                    reason: format!("paths.{name} is not a directory: {}", root.display()),
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Which backend a client is built on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Archive(ArchivePaths),
    Remote(RemoteEndpoints),
}

#[derive(Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Present: read from disk. Absent: read from the remote buckets.
    #[serde(default)]
    pub paths: Option<ArchivePaths>,
    #[serde(default)]
    pub remote: RemoteEndpoints,
}

impl ClientConfig {
    pub fn archive(files: impl Into<PathBuf>, images: impl Into<PathBuf>) -> Self {
        Self {
            paths: Some(ArchivePaths {
                files: files.into(),
                images: images.into(),
            }),
            ..Default::default()
        }
    }

    pub fn parse(contents: &str) -> Result<ClientConfig> {
        Ok(toml::from_str(contents).map_err(ConfigError::from)?)
    }

    pub fn load(settings_file: &Path) -> Result<ClientConfig> {
        let contents = read_to_string(settings_file).map_err(|e| ConfigError::ReadFile {
            path: settings_file.display().to_string(),
            source: e,
        })?;
        Self::parse(&contents)
    }

    pub fn backend(&self) -> BackendConfig {
        match &self.paths {
            Some(paths) => BackendConfig::Archive(paths.clone()),
            None => BackendConfig::Remote(self.remote.clone()),
        }
    }

    /// Checks the settings of the selected backend.
    pub fn validate(&self) -> Result<()> {
        match self.backend() {
            BackendConfig::Archive(paths) => paths.validate(),
            BackendConfig::Remote(remote) => remote.validate(),
        }
    }
}

/// Loads settings from the process environment.
pub fn load() -> Result<ClientConfig> {
    load_with(|key| std::env::var(key).ok())
}

/// Loads settings with `env` standing in for the process environment.
///
/// The file named by `FIGMA_ARCHIVE_CONFIG` is read if set, otherwise
/// `settings.toml` in the working directory if it exists, otherwise the
/// defaults apply. `FIGMA_ACCESS_TOKEN` overrides the configured token.
pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<ClientConfig> {
    let mut settings = match env(CONFIG_FILE_ENV) {
        Some(settings_file) => ClientConfig::load(Path::new(&settings_file))?,
        None if Path::new("settings.toml").exists() => {
            ClientConfig::load(Path::new("settings.toml"))?
        }
        None => ClientConfig::default(),
    };

    if let Some(token) = env(ACCESS_TOKEN_ENV) {
        settings.remote.token = Some(token);
    }

    settings.validate()?;

    match settings.backend() {
        BackendConfig::Archive(paths) => tracing::info!(
            files = %paths.files.display(),
            images = %paths.images.display(),
            "using archive backend"
        ),
        BackendConfig::Remote(remote) => tracing::info!(
            files = %remote.files,
            images = %remote.images,
            "using remote backend"
        ),
    }
    Ok(settings)
}
