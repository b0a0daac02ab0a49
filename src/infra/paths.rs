// src/infra/paths.rs — XDG-compliant path management
//
// All paths respect the REFLECT_HOME environment variable for isolation.
// When REFLECT_HOME is set, config and data live under that directory.
// When unset, config uses ~/.reflect/ and data uses XDG_DATA_HOME/reflection-agent.

use directories::ProjectDirs;
use std::path::PathBuf;

/// Returns the REFLECT_HOME override, if set.
fn reflect_home() -> Option<PathBuf> {
    std::env::var_os("REFLECT_HOME").map(PathBuf::from)
}

/// Home directory, falling back to the working directory when none is known.
pub fn dirs_home() -> PathBuf {
    directories::BaseDirs::new()
        .map(|b| b.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration directory: $REFLECT_HOME/ or ~/.reflect/
pub fn config_dir() -> PathBuf {
    if let Some(home) = reflect_home() {
        return home;
    }
    dirs_home().join(".reflect")
}

/// Data directory: $REFLECT_HOME/data/ or ~/.local/share/reflection-agent/
pub fn data_dir() -> PathBuf {
    if let Some(home) = reflect_home() {
        return home.join("data");
    }
    ProjectDirs::from("", "", "reflection-agent")
        .map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(|| config_dir().join("data"))
}

/// Transcript directory used when no `[transcript] dir` is configured.
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}
