//! Configuration – reads/writes `~/.medrem/config.toml`.

use medrem_store::DEFAULT_SLOT_KEY;
use medrem_vitals::Thresholds;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted user configuration stored in `~/.medrem/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database holding the reminder slot.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Key the reminder list is stored under.
    #[serde(default = "default_slot_key")]
    pub slot_key: String,

    #[serde(default = "default_max_heart_rate")]
    pub max_heart_rate: f32,

    #[serde(default = "default_max_glucose")]
    pub max_glucose_mg_dl: f32,

    #[serde(default = "default_max_systolic")]
    pub max_systolic_bp: f32,

    #[serde(default = "default_max_diastolic")]
    pub max_diastolic_bp: f32,
}

fn default_db_path() -> String {
    data_dir_for_home(&home_dir())
        .join("reminders.db")
        .to_string_lossy()
        .into_owned()
}
fn default_slot_key() -> String {
    DEFAULT_SLOT_KEY.to_string()
}
fn default_max_heart_rate() -> f32 {
    Thresholds::default().max_heart_rate
}
fn default_max_glucose() -> f32 {
    Thresholds::default().max_glucose_mg_dl
}
fn default_max_systolic() -> f32 {
    Thresholds::default().max_systolic_bp
}
fn default_max_diastolic() -> f32 {
    Thresholds::default().max_diastolic_bp
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            slot_key: default_slot_key(),
            max_heart_rate: default_max_heart_rate(),
            max_glucose_mg_dl: default_max_glucose(),
            max_systolic_bp: default_max_systolic(),
            max_diastolic_bp: default_max_diastolic(),
        }
    }
}

impl Config {
    /// Vitals thresholds for the insight engine.
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            max_heart_rate: self.max_heart_rate,
            max_glucose_mg_dl: self.max_glucose_mg_dl,
            max_systolic_bp: self.max_systolic_bp,
            max_diastolic_bp: self.max_diastolic_bp,
        }
    }
}

fn home_dir() -> String {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string())
}

/// `~/.medrem` relative to the given home directory.
pub(crate) fn data_dir_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".medrem")
}

/// Return the path to `~/.medrem/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(&home_dir())
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    data_dir_for_home(home).join("config.toml")
}

/// Load the config from a specific path.  Returns `None` if the file does
/// not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(cfg))
}

/// Apply `MEDREM_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `MEDREM_DB_PATH` | `db_path` |
/// | `MEDREM_SLOT_KEY` | `slot_key` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("MEDREM_DB_PATH")
        && !v.trim().is_empty()
    {
        cfg.db_path = v;
    }
    if let Ok(v) = std::env::var("MEDREM_SLOT_KEY")
        && !v.trim().is_empty()
    {
        cfg.slot_key = v;
    }
}

/// Load the config for this session.  On first run the defaults are written
/// to disk; the returned flag is `true` in that case.  Env overrides are
/// applied last and never saved.
pub fn load_or_init() -> Result<(Config, bool), String> {
    let path = config_path();
    let (mut cfg, created) = match load_from(&path)? {
        Some(cfg) => (cfg, false),
        None => {
            let cfg = Config::default();
            save_to(&cfg, &path)?;
            (cfg, true)
        }
    };
    apply_env_overrides(&mut cfg);
    Ok((cfg, created))
}

/// Save the config to a specific path, creating the parent directory.
pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        // Restrict the config directory to the owner only (rwx------) on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
