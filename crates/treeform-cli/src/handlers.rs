//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand,
//! plus the file helpers they share.

mod check;
mod completions;
mod map;

pub use check::handle_check;
pub use completions::handle_completions;
pub use map::handle_map;

use crate::error::{Error, ErrorContext, Result};
use is_terminal::IsTerminal;
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, error};
use treeform_core::Format;

/// Fail with `FileNotFound` unless `path` exists
pub(crate) fn ensure_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        error!("File not found: {}", path.display());
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Read an input file, or stdin when no path is given
pub(crate) fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            ensure_exists(path)?;
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Reading {}", path.display()))?;
            debug!(path = %path.display(), bytes = text.len(), "Input read");
            Ok(text)
        }
        None => {
            if std::io::stdin().is_terminal() {
                return Err(Error::invalid_args(
                    "no INPUT file given and stdin is a terminal",
                ));
            }
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            debug!(bytes = text.len(), "Input read from stdin");
            Ok(text)
        }
    }
}

/// Write `value` to `path` as YAML or pretty JSON, following the extension
pub(crate) fn save_to_file<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let content = match Format::from_path(path) {
        Format::Yaml => serde_yaml::to_string(value)?,
        Format::Json => serde_json::to_string_pretty(value)?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}
