// src/config.rs

use crate::error::{RenderError, Result};
use crate::physics::{BondingOptions, CellSettings, Orientation};
use crate::render::RenderOptions;
use crate::rendering::{LabelOptions, RenderStyle};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

// --- Main Config Struct ---
// Every option record of a render, with the defaults used when a field or
// the whole file is missing.

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub cell: CellSettings,

    #[serde(default)]
    pub bonding: BondingOptions,

    #[serde(default)]
    pub style: RenderStyle,

    #[serde(default)]
    pub orientation: Orientation,

    #[serde(default)]
    pub labels: LabelOptions,

    #[serde(default)]
    pub render: RenderOptions,
}

impl Config {
    /// Loads config from standard OS location (e.g., ~/.config/crender/settings.json).
    /// A broken file there falls back to defaults with a warning.
    pub fn load() -> Self {
        let path = Self::path();
        if !path.exists() {
            log::info!("No config found at {:?}. Using defaults.", path);
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("Ignoring config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Loads an explicitly requested config file; any failure is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => RenderError::NotFound {
                path: path.to_path_buf(),
            },
            _ => RenderError::Io(e),
        })?;
        let cfg = serde_json::from_reader(BufReader::new(file))?;
        log::info!("Config loaded from {:?}", path);
        Ok(cfg)
    }

    /// Saves config to standard OS location
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        log::info!("Config saved to {:?}", path);
        Ok(())
    }

    pub fn path() -> PathBuf {
        if let Some(proj) = ProjectDirs::from("org", "crystal-render", "crender") {
            proj.config_dir().join("settings.json")
        } else {
            PathBuf::from("settings.json")
        }
    }
}
