//! CLI configuration, a JSON file in the platform config directory

use anyhow::{anyhow, bail, Context, Result};
use cvt_batch_system::ControllerConfig;
use cvt_transforms::TargetFormat;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const CONFIG_FILE: &str = "cvt.json";

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
	/// Config schema version
	pub version: u32,

	/// Logging level, `RUST_LOG` takes precedence
	#[serde(default = "default_log_level")]
	pub log_level: String,

	/// Converter executable, used exactly as given
	#[serde(default)]
	pub converter_path: Option<PathBuf>,

	/// Output format used when `--format` is not passed
	#[serde(default)]
	pub default_format: TargetFormat,

	/// Whether the converter audits drawings while converting
	#[serde(default = "default_audit")]
	pub audit: bool,

	/// Batch controller tunables
	#[serde(default)]
	pub batch: ControllerConfig,
}

fn default_log_level() -> String {
	"warn".to_string()
}

const fn default_audit() -> bool {
	true
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			version: Self::target_version(),
			log_level: default_log_level(),
			converter_path: None,
			default_format: TargetFormat::default(),
			audit: default_audit(),
			batch: ControllerConfig::default(),
		}
	}
}

impl AppConfig {
	pub const fn target_version() -> u32 {
		1
	}

	/// Config file location when `--config` is not given
	pub fn default_path() -> Result<PathBuf> {
		ProjectDirs::from("", "", "cvt")
			.map(|dirs| dirs.config_dir().join(CONFIG_FILE))
			.ok_or_else(|| anyhow!("Could not determine config directory"))
	}

	/// Load the config at `path`, writing a default one there if it does not exist yet
	pub fn load_from(path: &Path) -> Result<Self> {
		if !path.exists() {
			let config = Self::default();
			config.save_to(path)?;
			return Ok(config);
		}

		let json = fs::read_to_string(path)
			.with_context(|| format!("Failed to read config {}", path.display()))?;
		let config: Self = serde_json::from_str(&json)
			.with_context(|| format!("Invalid config {}", path.display()))?;

		if config.version > Self::target_version() {
			bail!(
				"Config {} has version {}, this build understands up to {}",
				path.display(),
				config.version,
				Self::target_version()
			);
		}

		Ok(config)
	}

	/// Save the config to `path`, creating its directory
	pub fn save_to(&self, path: &Path) -> Result<()> {
		if let Some(dir) = path.parent() {
			fs::create_dir_all(dir)?;
		}

		let json = serde_json::to_string_pretty(self)?;
		fs::write(path, json)?;
		info!("Saved config to {:?}", path);
		Ok(())
	}
}
