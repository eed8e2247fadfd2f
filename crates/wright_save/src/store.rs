//! On-disk assembly store
//!
//! Keeps one file per assembly under a base directory, either as compact
//! binary or human-readable JSON. The file name is the assembly name.

use std::fs;
use std::path::{Path, PathBuf};

use crate::records::{AssemblyRecord, SaveError};

/// Storage format for assembly files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreFormat {
    /// JSON (human readable)
    Json,
    /// Binary (compact)
    #[default]
    Binary,
}

impl StoreFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Binary => "ship",
        }
    }
}

/// Reads and writes assembly records under a base directory.
#[derive(Debug, Clone)]
pub struct AssemblyStore {
    dir: PathBuf,
    format: StoreFormat,
}

impl AssemblyStore {
    /// Create a store rooted at the given directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            format: StoreFormat::default(),
        }
    }

    /// Set the storage format (builder pattern)
    pub fn with_format(mut self, format: StoreFormat) -> Self {
        self.format = format;
        self
    }

    /// Base directory of this store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ensure the base directory exists
    pub fn ensure_dir(&self) -> Result<(), SaveError> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, self.format.extension()))
    }

    /// Check if an assembly with this name is stored
    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).exists()
    }

    /// Write a record, overwriting any previous assembly with that name.
    pub fn write(&self, record: &AssemblyRecord) -> Result<(), SaveError> {
        self.ensure_dir()?;

        let bytes = match self.format {
            StoreFormat::Json => serde_json::to_vec_pretty(record)
                .map_err(|err| SaveError::Serialization(err.to_string()))?,
            StoreFormat::Binary => bincode::serialize(record)
                .map_err(|err| SaveError::Serialization(err.to_string()))?,
        };

        let path = self.path_for(&record.name);
        fs::write(&path, bytes)?;
        log::info!("wrote assembly '{}' to {:?}", record.name, path);
        Ok(())
    }

    /// Read a stored record by name.
    pub fn read(&self, name: &str) -> Result<AssemblyRecord, SaveError> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(SaveError::NotFound(name.to_string()));
        }

        let bytes = fs::read(&path)?;
        let record: AssemblyRecord = match self.format {
            StoreFormat::Json => serde_json::from_slice(&bytes)
                .map_err(|err| SaveError::Deserialization(err.to_string()))?,
            StoreFormat::Binary => bincode::deserialize(&bytes)
                .map_err(|err| SaveError::Deserialization(err.to_string()))?,
        };

        if record.name != name {
            log::warn!(
                "assembly file {:?} contains record named '{}'",
                path,
                record.name
            );
        }
        Ok(record)
    }

    /// Delete a stored assembly. Deleting a missing name is not an error.
    pub fn delete(&self, name: &str) -> Result<(), SaveError> {
        let path = self.path_for(name);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// Names of all stored assemblies, sorted.
    pub fn list_names(&self) -> Result<Vec<String>, SaveError> {
        self.ensure_dir()?;

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let matches_format = path
                .extension()
                .map(|ext| ext == self.format.extension())
                .unwrap_or(false);
            if !matches_format {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }

        names.sort_unstable();
        Ok(names)
    }
}
