//! Long-term memory — a flat JSON object persisted as a single file.
//!
//! The whole map is the unit of persistence: [`LongTermMemory::save`] writes
//! `<file>.tmp` and renames it over the target, so a crash mid-write leaves
//! the previous file intact.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct LongTermMemory {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl LongTermMemory {
    /// Read `path` as a JSON object. A missing file yields an empty map.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => parse_object(&path, &raw)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no long-term memory file, starting empty");
                Map::new()
            }
            Err(e) => {
                return Err(AppError::Memory(format!(
                    "cannot read {}: {e}",
                    path.display()
                )));
            }
        };
        info!(path = %path.display(), entries = entries.len(), "long-term memory loaded");
        Ok(Self { path, entries })
    }

    /// Overwrite the backing file with the current map.
    pub fn save(&self) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(&self.entries)
            .map_err(|e| AppError::Memory(format!("serialize failed: {e}")))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        info!(path = %self.path.display(), entries = self.entries.len(), "long-term memory saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.entries
    }
}

fn parse_object(path: &Path, raw: &str) -> Result<Map<String, Value>, AppError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(AppError::Memory(format!(
            "{} must hold a JSON object, found {}",
            path.display(),
            json_kind(&other)
        ))),
        Err(e) => Err(AppError::Memory(format!("parse error in {}: {e}", path.display()))),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
