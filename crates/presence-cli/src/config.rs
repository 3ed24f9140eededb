//! Configuration vault – reads/writes `~/.presence/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Persisted rig configuration stored in `~/.presence/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// WebSocket port for the remote command server.
    #[serde(default = "default_server_port")]
    pub server_port: u16,

    /// Milliseconds between control-loop ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Start sessions with mouse-look control enabled.
    #[serde(default)]
    pub mouse_look_default: bool,

    /// Puzzle unlock endpoint.
    #[serde(default = "default_puzzle_url")]
    pub puzzle_url: String,

    /// API key for the puzzle service (stored as plain text – the vault
    /// restricts file permissions on `~/.presence/config.toml`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub puzzle_api_key: String,

    /// LAN address of the room's smart bulb.
    #[serde(default = "default_bulb_addr")]
    pub bulb_addr: String,

    /// Bulb controller invocation, program first.
    #[serde(default = "default_lights_controller")]
    pub lights_controller: Vec<String>,

    /// Audio player program for sound beds and effects.
    #[serde(default = "default_sound_player")]
    pub sound_player: String,

    /// Directory holding the wav samples.
    #[serde(default = "default_sound_dir")]
    pub sound_dir: String,

    /// Text-to-speech program.
    #[serde(default = "default_tts_program")]
    pub tts_program: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server_port", &self.server_port)
            .field("tick_interval_ms", &self.tick_interval_ms)
            .field("mouse_look_default", &self.mouse_look_default)
            .field("puzzle_url", &self.puzzle_url)
            .field(
                "puzzle_api_key",
                if self.puzzle_api_key.is_empty() { &"<not set>" } else { &"<redacted>" },
            )
            .field("bulb_addr", &self.bulb_addr)
            .field("lights_controller", &self.lights_controller)
            .field("sound_player", &self.sound_player)
            .field("sound_dir", &self.sound_dir)
            .field("tts_program", &self.tts_program)
            .finish()
    }
}

fn default_server_port() -> u16 {
    5000
}
fn default_tick_interval_ms() -> u64 {
    100
}
fn default_puzzle_url() -> String {
    "https://game.playperception.com/game/attemptunlockround/".to_string()
}
fn default_bulb_addr() -> String {
    "192.168.1.106".to_string()
}
fn default_lights_controller() -> Vec<String> {
    vec!["flux_led".to_string()]
}
fn default_sound_player() -> String {
    "ffplay".to_string()
}
fn default_sound_dir() -> String {
    "sounds".to_string()
}
fn default_tts_program() -> String {
    "espeak-ng".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: default_server_port(),
            tick_interval_ms: default_tick_interval_ms(),
            mouse_look_default: false,
            puzzle_url: default_puzzle_url(),
            puzzle_api_key: String::new(),
            bulb_addr: default_bulb_addr(),
            lights_controller: default_lights_controller(),
            sound_player: default_sound_player(),
            sound_dir: default_sound_dir(),
            tts_program: default_tts_program(),
        }
    }
}

/// Return the path to `~/.presence/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
/// Extracted for testability without mutating environment variables.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".presence").join("config.toml")
}

/// Load the config from disk. Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Defaults with the `PRESENCE_*` overrides applied. Used when no config
/// file exists yet (or it failed to load), so the env overrides work on a
/// fresh install too.
pub fn default_with_env() -> Config {
    let mut cfg = Config::default();
    apply_env_overrides(&mut cfg);
    cfg
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `PRESENCE_*` environment variable overrides to `cfg`.
///
/// Supported variables:
///
/// | Variable | Config field |
/// |---|---|
/// | `PRESENCE_SERVER_PORT` | `server_port` |
/// | `PRESENCE_PUZZLE_URL` | `puzzle_url` |
/// | `PRESENCE_PUZZLE_API_KEY` | `puzzle_api_key` |
/// | `PRESENCE_BULB_ADDR` | `bulb_addr` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("PRESENCE_SERVER_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.server_port = port;
    }
    if let Ok(v) = std::env::var("PRESENCE_PUZZLE_URL") {
        cfg.puzzle_url = v;
    }
    if let Ok(v) = std::env::var("PRESENCE_PUZZLE_API_KEY") {
        cfg.puzzle_api_key = v;
    }
    if let Ok(v) = std::env::var("PRESENCE_BULB_ADDR") {
        cfg.bulb_addr = v;
    }
}

/// Save the config to disk, creating `~/.presence/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
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
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    // Write the file with owner-only read/write (rw-------) on Unix.
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
