//! Document addressing for structure-preserving patches.
//!
//! A [`DocPath`] is the exact address of a JSON node, captured at extraction
//! time and replayed by the patch applier. The applier never relocates a
//! target by key-guessing: it follows the recorded steps, so a patch lands on
//! the same leaf the extractor read or fails loudly.
//!
//! Paths serialise as a flat mixed array, `["project", "structures", 3]`,
//! which is what the edit-batch file format uses.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One step into a JSON document: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathStep {
    Index(usize),
    Key(String),
}

/// An absolute address inside a JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocPath(Vec<PathStep>);

impl DocPath {
    pub fn root() -> Self {
        DocPath(Vec::new())
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.0.push(PathStep::Key(key.into()));
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.0.push(PathStep::Index(index));
        self
    }

    /// This path extended by every step of `rel`.
    pub fn join(&self, rel: &DocPath) -> DocPath {
        let mut steps = self.0.clone();
        steps.extend(rel.0.iter().cloned());
        DocPath(steps)
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Follow the path through `value`, `None` if any step is absent or the
    /// shape disagrees (key step into an array, index step into an object).
    pub fn resolve<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        let mut current = value;
        for step in &self.0 {
            current = match step {
                PathStep::Key(k) => current.as_object()?.get(k)?,
                PathStep::Index(i) => current.as_array()?.get(*i)?,
            };
        }
        Some(current)
    }

    /// Mutable counterpart of [`resolve`](Self::resolve).
    pub fn resolve_mut<'a>(&self, value: &'a mut Value) -> Option<&'a mut Value> {
        let mut current = value;
        for step in &self.0 {
            current = match step {
                PathStep::Key(k) => current.as_object_mut()?.get_mut(k)?,
                PathStep::Index(i) => current.as_array_mut()?.get_mut(*i)?,
            };
        }
        Some(current)
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("$");
        }
        for (i, step) in self.0.iter().enumerate() {
            match step {
                PathStep::Key(k) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(k)?;
                }
                PathStep::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}
