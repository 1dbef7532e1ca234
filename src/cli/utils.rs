//! Convenience helpers shared across command handlers.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use deckpress::{Record, TemplateRegistry};

/// Resolve plain-text input for commands that accept either inline strings or files.
pub fn read_text_arg(text: Option<String>, from: Option<PathBuf>) -> Result<String> {
    if let Some(t) = text {
        return Ok(t);
    }
    if let Some(path) = from {
        if path.as_os_str() == "-" {
            return read_stdin();
        }
        return fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    read_stdin()
}

/// Read the entire stdin stream into memory.
pub fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("failed to read from stdin")?;
    Ok(buffer)
}

/// Persist a string either to a file or stdout when `-` is provided.
pub fn write_output(path: &Path, content: &str) -> Result<()> {
    if path.as_os_str() == "-" {
        io::stdout().write_all(content.as_bytes())?;
        return Ok(());
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

/// Parse a single JSON object into a card record.
pub fn parse_record(raw: &str) -> Result<Record> {
    serde_json::from_str(raw.trim()).context("failed to parse record JSON object")
}

/// Built-in templates, with replacements loaded from `dir` when given.
pub fn load_registry(overrides: Option<&Path>) -> Result<TemplateRegistry> {
    let mut registry = TemplateRegistry::builtin();
    if let Some(dir) = overrides {
        let loaded = registry.load_overrides(dir)?;
        println!("Loaded {} template override(s) from {}", loaded, dir.display());
    }
    Ok(registry)
}
