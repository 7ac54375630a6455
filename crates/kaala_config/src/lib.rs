//! TOML configuration for the kaala tools.
//!
//! One file gathers the typed configs of the library crates, one section
//! each. Every field has a default, so an empty file is a valid config.
//!
//! ```toml
//! [timeline]
//! horizon_years = 120.0
//! depth = 3
//!
//! [ephemeris]
//! epoch = "2000-01-01T12:00:00Z"
//! ayanamsha = 23.85
//!
//! [dasha]
//! systems = ["Vimshottari", "Yogini"]
//!
//! [solar_return]
//! method = "bisection"
//!
//! [transits]
//! step_minutes = 30.0
//! orb_deg = 0.5
//! ```

use std::path::{Path, PathBuf};

use kaala_dasha::dasha::{ALL_DASHA_SYSTEMS, DashaSystem, TimelineConfig};
use kaala_search::{EphemerisConfig, IngressConfig, SolarReturnConfig, TransitConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Errors from loading or validating a configuration file.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which dasha systems reports include by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashaSelection {
    pub systems: Vec<String>,
}

impl Default for DashaSelection {
    fn default() -> Self {
        Self {
            systems: ALL_DASHA_SYSTEMS.iter().map(|s| s.name().to_string()).collect(),
        }
    }
}

impl DashaSelection {
    /// Parsed systems, in file order.
    pub fn resolve(&self) -> Result<Vec<DashaSystem>, ConfigError> {
        self.systems
            .iter()
            .map(|name| {
                DashaSystem::from_name(name).map_err(|e| ConfigError::Invalid(format!("[dasha] {e}")))
            })
            .collect()
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KaalaConfig {
    pub timeline: TimelineConfig,
    pub ephemeris: EphemerisConfig,
    pub dasha: DashaSelection,
    pub solar_return: SolarReturnConfig,
    pub transits: TransitConfig,
    pub ingresses: IngressConfig,
}

impl KaalaConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// `from_file` when a path is given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sections: [(&str, Result<(), &'static str>); 5] = [
            ("timeline", self.timeline.validate()),
            ("ephemeris", self.ephemeris.validate()),
            ("solar_return", self.solar_return.validate()),
            ("transits", self.transits.validate()),
            ("ingresses", self.ingresses.validate()),
        ];
        for (section, result) in sections {
            result.map_err(|msg| ConfigError::Invalid(format!("[{section}] {msg}")))?;
        }
        self.dasha.resolve()?;
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}
