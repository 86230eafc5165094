//! Configuration for minitube.
//!
//! Loaded from JSON at `--config <path>` (or `$MINITUBE_CONFIG`), else
//! `~/.config/minitube/config.json`. Every field is optional.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial device the Minitel is wired to.
    pub port: PathBuf,
    /// Speed the terminal is at when we connect.
    pub initial_baud_rate: u32,
    /// Speed to switch the terminal to.
    pub baud_rate: u32,
    pub player_socket: PathBuf,
    pub player_command: String,
    pub ytdlp_command: String,
    /// Format selector handed to yt-dlp.
    pub video_format: String,
    pub download_dir: PathBuf,
    /// LIRC name of the VCR remote.
    pub ir_remote: String,
    pub max_results: usize,
    pub logo_image: PathBuf,
    pub tape_image: PathBuf,
    /// Time the VCR needs between the record key and the tape moving.
    pub record_delay_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: PathBuf::from("/dev/ttyAMA0"),
            initial_baud_rate: 1200,
            baud_rate: 4800,
            player_socket: PathBuf::from("vlc_socket"),
            player_command: "cvlc".to_string(),
            ytdlp_command: "yt-dlp".to_string(),
            video_format: minitel_media::ytdlp::DEFAULT_FORMAT.to_string(),
            download_dir: PathBuf::from("."),
            ir_remote: "LG_VCR_REMOTE".to_string(),
            max_results: 7,
            logo_image: PathBuf::from("assets/logo.png"),
            tape_image: PathBuf::from("assets/vhs.png"),
            record_delay_secs: 2,
        }
    }
}

impl Config {
    /// Where to look for the config file, given an explicit `--config`
    /// argument and an environment lookup.
    pub fn resolve_path(
        explicit: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Option<PathBuf> {
        if explicit.is_some() {
            return explicit;
        }
        let base = env("XDG_CONFIG_HOME")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .or_else(|| env("HOME").map(|home| PathBuf::from(home).join(".config")))?;
        Some(base.join("minitube").join("config.json"))
    }

    /// Load from the resolved location, falling back to defaults.
    pub fn load(explicit: Option<PathBuf>) -> Self {
        let Some(path) = Self::resolve_path(explicit, |key| std::env::var(key).ok()) else {
            log::warn!("Could not determine config directory, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// A missing file gives defaults; an unreadable one is logged and gives
    /// defaults too.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            log::info!("No config file at {}, using defaults", path.display());
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse {}: {e}, using defaults", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read {}: {e}, using defaults", path.display());
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("minitube-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, PathBuf::from("/dev/ttyAMA0"));
        assert_eq!(config.initial_baud_rate, 1200);
        assert_eq!(config.baud_rate, 4800);
        assert_eq!(config.max_results, 7);
        assert_eq!(config.record_delay_secs, 2);
    }

    #[test]
    fn test_explicit_path_wins() {
        let env = env_of(&[("XDG_CONFIG_HOME", "/xdg"), ("HOME", "/home/u")]);
        let path = Config::resolve_path(Some(PathBuf::from("/tmp/c.json")), env);
        assert_eq!(path, Some(PathBuf::from("/tmp/c.json")));
    }

    #[test]
    fn test_xdg_then_home() {
        let env = env_of(&[("XDG_CONFIG_HOME", "/xdg"), ("HOME", "/home/u")]);
        assert_eq!(
            Config::resolve_path(None, env),
            Some(PathBuf::from("/xdg/minitube/config.json"))
        );

        let env = env_of(&[("HOME", "/home/u")]);
        assert_eq!(
            Config::resolve_path(None, env),
            Some(PathBuf::from("/home/u/.config/minitube/config.json"))
        );

        assert_eq!(Config::resolve_path(None, env_of(&[])), None);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let path = scratch_file("partial.json", r#"{"port": "/dev/ttyUSB0", "max_results": 5}"#);
        let config = Config::load_from(&path);
        assert_eq!(config.port, PathBuf::from("/dev/ttyUSB0"));
        assert_eq!(config.max_results, 5);
        assert_eq!(config.baud_rate, 4800);
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let path = scratch_file("broken.json", "{ port: ");
        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/minitube/config.json"));
        assert_eq!(config, Config::default());
    }
}
