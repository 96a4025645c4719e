use chrono::{DateTime, Utc};
use std::fmt;

pub const BRANCH_PREFIX: &str = "refs/heads/";
pub const TAG_PREFIX: &str = "refs/tags/";

/// A symbolic git reference. Replaced wholesale, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    name: String,
}

impl Reference {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Full name, e.g. `refs/heads/main`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display name with the well-known prefixes stripped.
    pub fn short(&self) -> &str {
        self.name
            .strip_prefix(BRANCH_PREFIX)
            .or_else(|| self.name.strip_prefix(TAG_PREFIX))
            .or_else(|| self.name.strip_prefix("refs/remotes/"))
            .unwrap_or(&self.name)
    }

    pub fn is_branch(&self) -> bool {
        self.name.starts_with(BRANCH_PREFIX)
    }

    pub fn is_tag(&self) -> bool {
        self.name.starts_with(TAG_PREFIX)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntryKind {
    Dir,
    Submodule,
    File,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Dir => write!(f, "d"),
            EntryKind::Submodule => write!(f, "m"),
            EntryKind::File => write!(f, "-"),
        }
    }
}

/// One entry of a tree listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    pub size: u64,
}

/// Commit summary for the log list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub id: String,
    pub summary: String,
    pub message: String,
    pub author: String,
    pub date: DateTime<Utc>,
}

impl Commit {
    pub fn short_id(&self) -> &str {
        &self.id[..7.min(self.id.len())]
    }
}

/// A commit with its patch against the first parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitDiff {
    pub commit: Commit,
    pub patch: String,
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
}

/// A branch or tag together with the commit it points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefEntry {
    pub reference: Reference,
    pub target: String,
    pub summary: String,
    pub date: DateTime<Utc>,
}
