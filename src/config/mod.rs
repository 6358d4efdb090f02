use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub url: Option<String>,
    pub url_file: Option<String>,
    pub wordlist: Option<String>,
    #[serde(alias = "workers")]
    pub threads: Option<usize>,
    pub timeout: Option<u64>,
    pub user_agent: Option<String>,
    pub no_title: Option<bool>,
    pub no_color: Option<bool>,
    pub progress: Option<bool>,
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

// `~` and `~/...` resolve against $HOME, falling back to %USERPROFILE%
pub fn expand_tilde(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with(is_separator) => rest,
        _ => return PathBuf::from(path),
    };
    match ["HOME", "USERPROFILE"].into_iter().find_map(env::var_os) {
        Some(home) => PathBuf::from(home).join(rest.trim_start_matches(is_separator)),
        None => PathBuf::from(path),
    }
}

pub fn expand_tilde_string(path: &str) -> String {
    expand_tilde(path).to_string_lossy().to_string()
}

pub fn parse_config(contents: &str) -> Result<ConfigFile, serde_yaml::Error> {
    if contents.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str::<ConfigFile>(contents)
}

pub fn load_config(path: &PathBuf) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}
