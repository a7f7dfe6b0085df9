// Serialization utilities for the stack library

use crate::library::PersistenceError;
use crate::library::types::{FormatVersion, StackLibrary};
use std::fs;
use std::path::{Path, PathBuf};

/// Serialize the library to pretty JSON
pub fn encode_library(library: &StackLibrary) -> Result<String, PersistenceError> {
    serde_json::to_string_pretty(library).map_err(|e| {
        PersistenceError::Serialization(format!("Failed to serialize stack library: {}", e))
    })
}

/// Deserialize, version-check and validate a library
///
/// A single bad stack rejects the whole file.
pub fn decode_library(json: &str) -> Result<StackLibrary, PersistenceError> {
    let library: StackLibrary = serde_json::from_str(json).map_err(|e| {
        PersistenceError::Serialization(format!("Failed to deserialize stack library: {}", e))
    })?;

    if !library.version.is_compatible() {
        return Err(PersistenceError::UnsupportedVersion {
            found: library.version,
            expected: FormatVersion::current(),
        });
    }

    for stack in &library.stacks {
        stack
            .validate()
            .map_err(|e| PersistenceError::Invalid(format!("{:?}: {}", stack.name, e)))?;
    }

    Ok(library)
}

/// Read a library file
pub fn read_library(path: &Path) -> Result<StackLibrary, PersistenceError> {
    let json = fs::read_to_string(path).map_err(|e| {
        PersistenceError::FileSystem(format!("Failed to read {}: {}", path.display(), e))
    })?;
    decode_library(&json)
}

/// Write a library file through a temporary sibling, then rename it into place
pub fn write_library(library: &StackLibrary, path: &Path) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| {
            PersistenceError::FileSystem(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let json = encode_library(library)?;
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, json).map_err(|e| {
        PersistenceError::FileSystem(format!("Failed to write {}: {}", temp_path.display(), e))
    })?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Copy an unreadable library aside before it gets overwritten
pub fn create_backup(path: &Path) -> Result<PathBuf, PersistenceError> {
    let backup_path = path.with_extension("json.backup");
    fs::copy(path, &backup_path).map_err(|e| {
        PersistenceError::FileSystem(format!("Failed to create backup: {}", e))
    })?;
    Ok(backup_path)
}
