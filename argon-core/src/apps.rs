//! Application display-name lookup
//!
//! Resolves a caller's application id to the name desktop shells show for
//! it, by scanning XDG application directories for a matching `.desktop`
//! entry. Used only to label the consent dialog; a missing entry falls
//! back to the raw id.

use std::fs;
use std::path::PathBuf;

use tracing::debug;

/// Resolve an application id to a display name
pub fn display_name(app_id: &str) -> String {
    if app_id.is_empty() {
        return app_id.to_string();
    }
    for dir in desktop_dirs() {
        let path = dir.join(format!("{app_id}.desktop"));
        let Ok(contents) = fs::read_to_string(&path) else {
            continue;
        };
        if let Some(name) = parse_desktop_name(&contents) {
            debug!(app_id, name, "resolved application name");
            return name;
        }
    }
    app_id.to_string()
}

fn desktop_dirs() -> Vec<PathBuf> {
    let mut dirs_list = Vec::new();
    if let Some(data) = dirs::data_dir() {
        dirs_list.push(data.join("applications"));
    }
    dirs_list.push(PathBuf::from("/usr/local/share/applications"));
    dirs_list.push(PathBuf::from("/usr/share/applications"));
    dirs_list
}

/// Extract the display name from a desktop entry
///
/// `X-GNOME-FullName` wins over `Name` when both are present.
fn parse_desktop_name(contents: &str) -> Option<String> {
    let mut in_entry = false;
    let mut name = None;
    for line in contents.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_entry = line == "[Desktop Entry]";
            continue;
        }
        if !in_entry {
            continue;
        }
        if let Some(value) = line.strip_prefix("X-GNOME-FullName=") {
            return Some(value.trim().to_string());
        }
        if name.is_none() {
            if let Some(value) = line.strip_prefix("Name=") {
                name = Some(value.trim().to_string());
            }
        }
    }
    name.filter(|n| !n.is_empty())
}
