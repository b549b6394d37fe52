//! Connection configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use shifter_proto::DEFAULT_MAX_FRAME_LEN;

/// Environment variable overriding [`ClientConfig::host`].
pub const HOST_ENV: &str = "SHIFTER_HOST";
/// Environment variable overriding [`ClientConfig::port`].
pub const PORT_ENV: &str = "SHIFTER_PORT";

/// Errors while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// The config file could not be read.
	#[error("failed to read {path}: {source}")]
	Read {
		/// File that failed.
		path: PathBuf,
		/// Underlying error.
		source: std::io::Error,
	},
	/// The config file is not valid TOML for [`ClientConfig`].
	#[error("invalid config: {0}")]
	Parse(#[from] toml::de::Error),
	/// An environment override could not be parsed.
	#[error("invalid value {value:?} for {var}")]
	Env {
		/// Variable name.
		var: &'static str,
		/// Offending value.
		value: String,
	},
}

/// Static connection parameters for the scheduling server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
	/// Server host name or address.
	pub host: String,
	/// Server TCP port.
	pub port: u16,
	/// Connect deadline in milliseconds.
	pub connect_timeout_ms: u64,
	/// Per-frame read deadline in milliseconds.
	pub read_timeout_ms: u64,
	/// Per-frame write deadline in milliseconds.
	pub write_timeout_ms: u64,
	/// Largest accepted `json + attachment` size in bytes.
	pub max_frame_len: usize,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".into(),
			port: 5556,
			connect_timeout_ms: 5_000,
			read_timeout_ms: 30_000,
			write_timeout_ms: 30_000,
			max_frame_len: DEFAULT_MAX_FRAME_LEN,
		}
	}
}

impl ClientConfig {
	/// Create a configuration for `host:port` with default timeouts.
	pub fn new(host: impl Into<String>, port: u16) -> Self {
		Self {
			host: host.into(),
			port,
			..Self::default()
		}
	}

	/// Set the connect deadline.
	pub fn connect_timeout(mut self, timeout: Duration) -> Self {
		self.connect_timeout_ms = timeout.as_millis() as u64;
		self
	}

	/// Set the read deadline.
	pub fn read_timeout(mut self, timeout: Duration) -> Self {
		self.read_timeout_ms = timeout.as_millis() as u64;
		self
	}

	/// Set the write deadline.
	pub fn write_timeout(mut self, timeout: Duration) -> Self {
		self.write_timeout_ms = timeout.as_millis() as u64;
		self
	}

	/// Set the frame size limit.
	pub fn max_frame_len(mut self, len: usize) -> Self {
		self.max_frame_len = len;
		self
	}

	/// `host:port` string.
	pub fn addr(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}

	/// Connect deadline.
	pub fn connect_deadline(&self) -> Duration {
		Duration::from_millis(self.connect_timeout_ms)
	}

	/// Read deadline.
	pub fn read_deadline(&self) -> Duration {
		Duration::from_millis(self.read_timeout_ms)
	}

	/// Write deadline.
	pub fn write_deadline(&self) -> Duration {
		Duration::from_millis(self.write_timeout_ms)
	}

	/// Parse a TOML document. Missing keys keep their defaults.
	pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(text)?)
	}

	/// Load defaults, then `path` if given, then environment overrides.
	pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
		let config = match path {
			Some(path) => {
				let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
					path: path.to_path_buf(),
					source,
				})?;
				Self::from_toml_str(&text)?
			}
			None => Self::default(),
		};
		config.with_overrides(|var| std::env::var(var).ok())
	}

	/// Apply `SHIFTER_HOST` / `SHIFTER_PORT` style overrides from `lookup`.
	pub fn with_overrides(mut self, lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
		if let Some(host) = lookup(HOST_ENV).filter(|h| !h.trim().is_empty()) {
			self.host = host.trim().to_owned();
		}
		if let Some(port) = lookup(PORT_ENV) {
			self.port = port.trim().parse().map_err(|_| ConfigError::Env { var: PORT_ENV, value: port })?;
		}
		Ok(self)
	}
}
