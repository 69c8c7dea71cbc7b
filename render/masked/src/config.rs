//! User adjustable renderer options, stored as RON in the user config dir

use std::error::Error;
use std::fmt;
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use nanoserde::{DeRon, SerRon};

const LOG_TAG: &str = "RenderConfig";
const CONFIG_DIR: &str = "room4doom";
const CONFIG_FILE: &str = "masked.ron";

/// Particle count used when the config asks for zero
pub const DEFAULT_PARTICLES: usize = 4000;
/// Fewest particles the pool is ever created with
pub const MIN_PARTICLES: usize = 100;

#[derive(Debug)]
pub enum ConfigError {
    NoConfigDir,
    Io(std::io::Error),
    Parse(String),
}

impl Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoConfigDir => write!(f, "Could not find a user config directory"),
            ConfigError::Io(e) => write!(f, "Config file error: {e}"),
            ConfigError::Parse(e) => write!(f, "Could not parse config: {e}"),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

#[derive(Debug, Clone, PartialEq, DeRon, SerRon)]
pub struct RenderConfig {
    /// Size of the particle pool, `0` picks the default
    pub num_particles: usize,
    /// Draw particles at all
    pub particles: bool,
    /// Weapon sprite opacity, `0.0` hides the weapon
    pub draw_player_sprites: f32,
    /// Invulnerability tints the weapon only, rather than the whole palette
    pub soft_invuln_effect: bool,
    /// Blend thing positions between tics
    pub interpolation: bool,
    /// Starting size of the vissprite pool
    pub initial_vissprites: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            num_particles: 0,
            particles: true,
            draw_player_sprites: 1.0,
            soft_invuln_effect: true,
            interpolation: true,
            initial_vissprites: crate::pool::MAXVISSPRITES,
        }
    }
}

impl RenderConfig {
    /// R_InitParticles sizing
    pub fn particle_capacity(&self) -> usize {
        match self.num_particles {
            0 => DEFAULT_PARTICLES,
            n => n.max(MIN_PARTICLES),
        }
    }

    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let mut path = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        Ok(path)
    }

    pub fn from_ron(data: &str) -> Result<Self, ConfigError> {
        RenderConfig::deserialize_ron(data).map_err(|e| ConfigError::Parse(format!("{e:?}")))
    }

    /// Read a config, or write out the defaults if there isn't one yet
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = RenderConfig::default();
            config.write(path)?;
            info!(target: LOG_TAG, "Created default config at {path:?}");
            return Ok(config);
        }

        let mut file = OpenOptions::new().read(true).open(path)?;
        let mut buf = String::new();
        file.read_to_string(&mut buf)?;
        match RenderConfig::from_ron(&buf) {
            Ok(config) => {
                info!(target: LOG_TAG, "Loaded config file");
                Ok(config)
            }
            Err(e) => {
                warn!(target: LOG_TAG, "{e}, using defaults");
                Ok(RenderConfig::default())
            }
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            create_dir_all(dir)?;
        }
        let mut file = File::create(path)?;
        file.write_all(self.serialize_ron().as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{RenderConfig, DEFAULT_PARTICLES, MIN_PARTICLES};
    use nanoserde::SerRon;

    #[test]
    fn particle_capacity_limits() {
        let mut config = RenderConfig::default();
        assert_eq!(config.particle_capacity(), DEFAULT_PARTICLES);
        config.num_particles = 12;
        assert_eq!(config.particle_capacity(), MIN_PARTICLES);
        config.num_particles = 2500;
        assert_eq!(config.particle_capacity(), 2500);
    }

    #[test]
    fn ron_round_trip_keeps_values() {
        let config = RenderConfig {
            num_particles: 300,
            particles: false,
            draw_player_sprites: 0.5,
            soft_invuln_effect: false,
            interpolation: false,
            initial_vissprites: 64,
        };
        let text = config.serialize_ron();
        assert_eq!(RenderConfig::from_ron(&text).unwrap(), config);
    }

    #[test]
    fn bad_ron_is_an_error() {
        assert!(RenderConfig::from_ron("(num_particles: nope)").is_err());
    }

    #[test]
    fn load_creates_missing_file() {
        let mut path = std::env::temp_dir();
        path.push(format!("masked-config-test-{}", std::process::id()));
        path.push("masked.ron");
        let _ = std::fs::remove_file(&path);

        let config = RenderConfig::load_or_create(&path).unwrap();
        assert_eq!(config, RenderConfig::default());
        assert!(path.exists());
        let again = RenderConfig::load_or_create(&path).unwrap();
        assert_eq!(again, config);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
