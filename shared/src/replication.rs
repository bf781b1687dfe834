//! Single-writer replicated values.
//!
//! The authoritative node writes with [`Replicated::set`], which yields a
//! [`Change`] to push to every participant. Mirrors feed received updates into
//! [`Replicated::observe`], which yields the same [`Change`] so every node runs
//! an identical reaction to it. Revisions give per-value ordering: an update
//! older than the last applied one is dropped.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::PlayerId;

/// A node taking part in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Node {
    Server,
    Participant(PlayerId),
}

/// A state diff for one replicated value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Change<T> {
    pub previous: T,
    pub current: T,
    pub revision: u32,
}

#[derive(Debug, Clone)]
pub struct Replicated<T> {
    owner: Node,
    value: T,
    revision: u32,
    label: &'static str,
}

impl<T: Copy + PartialEq> Replicated<T> {
    pub fn new(owner: Node, label: &'static str, initial: T) -> Self {
        Self {
            owner,
            value: initial,
            revision: 0,
            label,
        }
    }

    pub fn get(&self) -> T {
        self.value
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn owner(&self) -> Node {
        self.owner
    }

    /// Writes a new value on behalf of `writer`.
    ///
    /// Only the owner may write; anyone else gets `AuthorityViolation` and the
    /// value is left untouched. Writing the current value is not a change.
    pub fn set(&mut self, writer: Node, value: T) -> Result<Option<Change<T>>, CoreError> {
        if writer != self.owner {
            return Err(CoreError::AuthorityViolation {
                writer,
                target: self.label,
            });
        }
        if value == self.value {
            return Ok(None);
        }
        let previous = self.value;
        self.value = value;
        self.revision = self.revision.wrapping_add(1);
        Ok(Some(Change {
            previous,
            current: value,
            revision: self.revision,
        }))
    }

    /// Applies an update received from the owner.
    pub fn observe(&mut self, revision: u32, value: T) -> Option<Change<T>> {
        if revision <= self.revision {
            return None;
        }
        let previous = self.value;
        self.value = value;
        self.revision = revision;
        if previous == value {
            return None;
        }
        Some(Change {
            previous,
            current: value,
            revision,
        })
    }
}
