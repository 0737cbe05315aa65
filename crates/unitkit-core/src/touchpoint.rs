//! Touchpoint metadata handed through to the execution engine.
//!
//! Instruction bodies are opaque here. The only behaviour this crate owns is
//! the textual merge applied when several sources contribute instructions
//! under the same key.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use unitkit_schema::Version;

use crate::CoreError;

/// Which execution engine interprets a unit's instructions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TouchpointType {
    id: String,
    version: Version,
}

impl TouchpointType {
    /// Create a touchpoint type.
    ///
    /// Prefer [`UnitFactory::touchpoint_type`](crate::UnitFactory::touchpoint_type),
    /// which deduplicates allocations.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyField`] if `id` is empty.
    pub fn new(id: impl Into<String>, version: Version) -> Result<Self, CoreError> {
        let id = id.into();
        if id.is_empty() {
            return Err(CoreError::EmptyField("touchpoint type id"));
        }
        Ok(Self { id, version })
    }

    /// Engine identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Engine version.
    pub fn version(&self) -> &Version {
        &self.version
    }
}

impl fmt::Display for TouchpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.id, self.version)
    }
}

/// One instruction: a script body plus the imports it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TouchpointInstruction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    import_attribute: Option<String>,
}

impl TouchpointInstruction {
    /// An instruction with a body and no imports.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            import_attribute: None,
        }
    }

    /// Set the import attribute.
    pub fn with_import(mut self, import: impl Into<String>) -> Self {
        self.import_attribute = Some(import.into());
        self
    }

    /// Script text.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Comma-separated imports.
    pub fn import_attribute(&self) -> Option<&str> {
        self.import_attribute.as_deref()
    }

    /// Append `other` after `self`: bodies join with `;`, imports with `,`.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            body: append(self.body.as_deref(), other.body.as_deref(), ';'),
            import_attribute: append(
                self.import_attribute.as_deref(),
                other.import_attribute.as_deref(),
                ',',
            ),
        }
    }
}

/// Joins with `separator` unless `existing` is empty or already ends with it.
fn append(existing: Option<&str>, addition: Option<&str>, separator: char) -> Option<String> {
    match (existing, addition) {
        (None | Some(""), None) => existing.map(str::to_string),
        (None | Some(""), Some(add)) => Some(add.to_string()),
        (Some(base), None) => Some(base.to_string()),
        (Some(base), Some(add)) => {
            let mut joined = String::with_capacity(base.len() + add.len() + 1);
            joined.push_str(base);
            if !base.ends_with(separator) {
                joined.push(separator);
            }
            joined.push_str(add);
            Some(joined)
        }
    }
}

/// Instructions keyed by phase (e.g. `install`, `configure`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TouchpointData {
    instructions: BTreeMap<String, TouchpointInstruction>,
}

impl TouchpointData {
    /// Empty instruction set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the instruction under `key`.
    pub fn with_instruction(
        mut self,
        key: impl Into<String>,
        instruction: TouchpointInstruction,
    ) -> Self {
        self.instructions.insert(key.into(), instruction);
        self
    }

    /// Instruction under `key`.
    pub fn instruction(&self, key: &str) -> Option<&TouchpointInstruction> {
        self.instructions.get(key)
    }

    /// All instructions, ordered by key.
    pub fn instructions(&self) -> &BTreeMap<String, TouchpointInstruction> {
        &self.instructions
    }

    /// Whether there are no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Merge `other` into a copy of `self`.
    ///
    /// Shared keys are joined textually (see
    /// [`TouchpointInstruction::merge`]); other keys pass through. Merging
    /// the same non-empty data twice duplicates it.
    pub fn merge(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.merge_in(other);
        merged
    }

    pub(crate) fn merge_in(&mut self, other: &Self) {
        for (key, addition) in &other.instructions {
            match self.instructions.get_mut(key) {
                Some(existing) => *existing = existing.merge(addition),
                None => {
                    self.instructions.insert(key.clone(), addition.clone());
                }
            }
        }
    }
}

/// Capacity used when no configuration overrides it.
pub const DEFAULT_TOUCHPOINT_CACHE_CAPACITY: usize = 8;

#[derive(Debug)]
struct Ring {
    entries: Vec<Arc<TouchpointType>>,
    next: usize,
}

/// Bounded rotating cache of recently built touchpoint types.
///
/// Correctness never depends on a hit: a miss or a lost race only costs an
/// extra allocation of an equal value.
#[derive(Debug)]
pub(crate) struct TouchpointTypeCache {
    capacity: usize,
    ring: Mutex<Ring>,
}

impl TouchpointTypeCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ring: Mutex::new(Ring {
                entries: Vec::with_capacity(capacity),
                next: 0,
            }),
        }
    }

    pub(crate) fn get_or_insert(
        &self,
        id: &str,
        version: &Version,
    ) -> Result<Arc<TouchpointType>, CoreError> {
        // Cached entries are plain values, so a poisoned lock is still usable.
        let mut ring = self.ring.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(hit) = ring
            .entries
            .iter()
            .find(|t| t.id == id && &t.version == version)
        {
            return Ok(Arc::clone(hit));
        }

        let created = Arc::new(TouchpointType::new(id, version.clone())?);
        if self.capacity == 0 {
            return Ok(created);
        }

        if ring.entries.len() < self.capacity {
            ring.entries.push(Arc::clone(&created));
        } else {
            let slot = ring.next;
            tracing::trace!(evicted = %ring.entries[slot], "touchpoint type cache full");
            ring.entries[slot] = Arc::clone(&created);
            ring.next = (slot + 1) % self.capacity;
        }
        Ok(created)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.ring
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }
}
