//! Path utilities for plugin locations
//!
//! Everything the plugin reads lives under its install root, never under
//! the host process's working directory.

use std::path::{Component, Path, PathBuf};

/// Name of the configuration file at the plugin root
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Default plugin root: the directory holding the running executable
pub fn default_plugin_root() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the path to config.yaml under a plugin root
pub fn get_config_path(plugin_root: &Path) -> PathBuf {
    plugin_root.join(CONFIG_FILE_NAME)
}

/// Resolve a configured model path against the plugin root.
///
/// Absolute configured paths are kept as-is. The result is absolute and
/// lexically normalized.
pub fn resolve_model_path(plugin_root: &Path, configured: &str) -> PathBuf {
    let joined = plugin_root.join(configured);
    let absolute = std::path::absolute(&joined).unwrap_or(joined);
    normalize_path(&absolute)
}

/// Lexically normalize a path: drop `.`, collapse `name/..`, merge
/// repeated separators. Never touches the filesystem.
///
/// `..` directly under a root is dropped; leading `..` of a relative path
/// is kept. An empty result becomes `.`.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component> = Vec::new();

    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(comp),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}
