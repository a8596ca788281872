use std::path::PathBuf;

use serde::Deserialize;

use weft_core::Subdivision;

/// Embedded defaults; a user config merged over them if present.
const DEFAULT_CONFIG: &str = include_str!("../weft.toml");

/// Raw TOML shape of the config file.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    engine: EngineSection,
    #[serde(default)]
    editor: EditorSection,
}

#[derive(Debug, Default, Deserialize)]
struct EngineSection {
    /// UDP address of the preview synth server.
    osc_addr: Option<String>,
    /// External engine tempo, cycles per second.
    cycles_per_second: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct EditorSection {
    /// Startup quantize grid: "1/4", "1/8", "1/8t", "1/16", "1/16t", "1/32".
    quantize: Option<String>,
    pattern_cycles: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub osc_addr: String,
    pub cycles_per_second: f64,
    pub quantize: Subdivision,
    pub pattern_cycles: u32,
}

impl Config {
    /// Embedded defaults, then the user's config file layered on top.
    pub fn load() -> Self {
        Self::load_from(user_config_path().as_deref())
    }

    fn load_from(user_path: Option<&std::path::Path>) -> Self {
        let mut raw: RawConfig = toml::from_str(DEFAULT_CONFIG).unwrap_or(RawConfig {
            engine: EngineSection::default(),
            editor: EditorSection::default(),
        });
        if let Some(path) = user_path {
            if let Ok(contents) = std::fs::read_to_string(path) {
                match toml::from_str::<RawConfig>(&contents) {
                    Ok(user) => merge(&mut raw, user),
                    Err(e) => log::warn!("ignoring malformed {}: {}", path.display(), e),
                }
            }
        }
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Self {
        Self {
            osc_addr: raw
                .engine
                .osc_addr
                .unwrap_or_else(|| "127.0.0.1:57120".to_string()),
            cycles_per_second: raw.engine.cycles_per_second.unwrap_or(0.5),
            quantize: raw
                .editor
                .quantize
                .as_deref()
                .and_then(parse_quantize)
                .unwrap_or_default(),
            pattern_cycles: raw.editor.pattern_cycles.unwrap_or(1),
        }
    }
}

fn merge(base: &mut RawConfig, user: RawConfig) {
    if user.engine.osc_addr.is_some() {
        base.engine.osc_addr = user.engine.osc_addr;
    }
    if user.engine.cycles_per_second.is_some() {
        base.engine.cycles_per_second = user.engine.cycles_per_second;
    }
    if user.editor.quantize.is_some() {
        base.editor.quantize = user.editor.quantize;
    }
    if user.editor.pattern_cycles.is_some() {
        base.editor.pattern_cycles = user.editor.pattern_cycles;
    }
}

fn parse_quantize(s: &str) -> Option<Subdivision> {
    Subdivision::ALL.iter().copied().find(|q| q.label() == s)
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("weft").join("weft.toml"))
}

/// Directory for logs and other per-user files, created on demand.
pub fn data_dir() -> Option<PathBuf> {
    let dir = dirs::config_dir()?.join("weft");
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_parse() {
        let raw: RawConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        let config = Config::from_raw(raw);
        assert!(config.cycles_per_second > 0.0);
        assert!(config.pattern_cycles >= 1);
    }

    #[test]
    fn quantize_labels_round_trip() {
        for q in Subdivision::ALL {
            assert_eq!(parse_quantize(q.label()), Some(q));
        }
        assert_eq!(parse_quantize("1/13"), None);
    }

    #[test]
    fn user_values_override_defaults() {
        let mut base: RawConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        let user: RawConfig =
            toml::from_str("[editor]\nquantize = \"1/16\"\npattern_cycles = 4\n").unwrap();
        merge(&mut base, user);
        let config = Config::from_raw(base);
        assert_eq!(config.quantize, Subdivision::Sixteenth);
        assert_eq!(config.pattern_cycles, 4);
    }

    #[test]
    fn user_file_is_layered_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weft.toml");
        std::fs::write(&path, "[engine]\ncycles_per_second = 0.75\n").unwrap();
        let config = Config::load_from(Some(&path));
        assert_eq!(config.cycles_per_second, 0.75);
        // Untouched keys keep their embedded defaults
        assert_eq!(config.quantize, Subdivision::Eighth);
    }

    #[test]
    fn missing_or_malformed_user_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Config::load_from(Some(&dir.path().join("nope.toml")));
        assert_eq!(missing.osc_addr, "127.0.0.1:57120");

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "not toml [[[").unwrap();
        let config = Config::load_from(Some(&bad));
        assert_eq!(config.osc_addr, "127.0.0.1:57120");
    }
}
