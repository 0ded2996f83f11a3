use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::backend::ensure_config_dir;
use crate::ai::OpponentWeights;
use crate::game::rules::{DAMAGE_PER_LOSS, INITIAL_HEALTH};

/// Health parameters applied to new matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSettings {
    pub initial_health: u32,
    pub damage_per_loss: u32,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            initial_health: INITIAL_HEALTH,
            damage_per_loss: DAMAGE_PER_LOSS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Message catalogue; the system locale is used when absent
    pub language: Option<String>,
    pub rules: RuleSettings,
    pub opponent: OpponentWeights,
}

pub const SETTINGS_FILE: &str = "settings.json";

fn settings_path() -> io::Result<PathBuf> {
    let mut p = ensure_config_dir()?;
    p.push(SETTINGS_FILE);
    Ok(p)
}

/// Settings from the platform config directory, defaults if missing or corrupt.
pub fn load_settings() -> Settings {
    match settings_path() {
        Ok(p) => load_settings_from(&p),
        Err(_) => Settings::default(),
    }
}

pub fn load_settings_from(path: &Path) -> Settings {
    if !path.is_file() {
        return Settings::default();
    }
    match File::open(path).and_then(|mut f| {
        let mut s = String::new();
        f.read_to_string(&mut s)?;
        let cfg: Settings =
            serde_json::from_str(&s).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(cfg)
    }) {
        Ok(cfg) => cfg,
        Err(e) => {
            log::warn!("using default settings, {} is unreadable: {}", path.display(), e);
            Settings::default()
        }
    }
}

pub fn save_settings(s: &Settings) -> io::Result<()> {
    save_settings_to(s, &settings_path()?)
}

pub fn save_settings_to(s: &Settings, path: &Path) -> io::Result<()> {
    let data =
        serde_json::to_string_pretty(s).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    let mut f = File::create(path)?;
    f.write_all(data.as_bytes())?;
    Ok(())
}
