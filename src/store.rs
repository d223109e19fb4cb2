//! Persisted Component and Assembly stores.
//!
//! Each store is one JSON document mapping names to step lists, loaded
//! wholesale at startup and rewritten in full on every save. The engine owns
//! two of these: `components.json` and `assemblies.json`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{RepriseError, Result};
use crate::step::Step;

/// One persisted name → `Step[]` document.
///
/// A `BTreeMap` keeps the serialized document deterministically ordered, so
/// repeated full rewrites stay diff-friendly.
#[derive(Debug, Clone)]
pub struct StepStore {
    path: PathBuf,
    entries: BTreeMap<String, Vec<Step>>,
}

impl StepStore {
    /// Load a store from disk. A missing file is an empty store; a file
    /// that exists but does not parse is an error naming the path.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            return Ok(Self {
                path,
                entries: BTreeMap::new(),
            });
        }

        let content = fs::read_to_string(&path)?;
        let entries: BTreeMap<String, Vec<Step>> =
            serde_json::from_str(&content).map_err(|e| RepriseError::StoreParseError {
                path: path.clone(),
                message: e.to_string(),
            })?;

        Ok(Self { path, entries })
    }

    /// Save the whole document to disk using atomic write.
    ///
    /// Uses the write-to-temp-then-rename pattern so a crash mid-write never
    /// leaves a truncated document behind.
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| RepriseError::StoreParseError {
                path: self.path.clone(),
                message: format!("Failed to serialize store: {}", e),
            })?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, &self.path)?;

        Ok(())
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or replace an entry. Does not persist; call [`save`](Self::save).
    pub fn insert(&mut self, name: impl Into<String>, steps: Vec<Step>) {
        self.entries.insert(name.into(), steps);
    }

    /// Remove an entry, returning its steps if it existed.
    pub fn remove(&mut self, name: &str) -> Option<Vec<Step>> {
        self.entries.remove(name)
    }

    /// Look up an entry's steps.
    pub fn get(&self, name: &str) -> Option<&[Step]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Stored names in sorted order; a read-only snapshot safe to hand to
    /// another thread while a run is active.
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First free name derived from `base`: `base`, then `base_1`, `base_2`,
    /// and so on.
    pub fn unique_name(&self, base: &str) -> String {
        if !self.contains(base) {
            return base.to_string();
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}_{}", base, n);
            if !self.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}
