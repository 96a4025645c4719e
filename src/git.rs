use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use git2::{ErrorCode, ObjectType, Sort};

use crate::error::Result;
use crate::types::{Commit, CommitDiff, EntryKind, RefEntry, Reference, TreeEntry};

/// Case-insensitive glob used to find a repository's README.
pub const README_PATTERN: &str = "[rR][eE][aA][dD][mM][eE]*";

const DEFAULT_DESCRIPTION: &str = "Unnamed repository;";

/// The repository being browsed. Read-only from the view's point of view.
#[async_trait]
pub trait Repository: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
    /// Human friendly name, may be empty.
    fn project_name(&self) -> &str;
    /// May be empty.
    fn description(&self) -> &str;

    /// Resolve HEAD. `None` means the repository has no commits yet.
    async fn head(&self) -> Result<Option<Reference>>;

    /// First file at the root of `reference`'s tree whose name matches `pattern`,
    /// as `(contents, path)`.
    async fn latest_file(
        &self,
        reference: &Reference,
        pattern: &str,
    ) -> Result<Option<(String, String)>>;

    async fn tree(&self, reference: &Reference, path: &str) -> Result<Vec<TreeEntry>>;
    async fn file(&self, reference: &Reference, path: &str) -> Result<String>;
    async fn commit_count(&self, reference: &Reference) -> Result<usize>;
    async fn commits(&self, reference: &Reference, skip: usize, limit: usize)
        -> Result<Vec<Commit>>;
    async fn diff(&self, commit_id: &str) -> Result<CommitDiff>;
    async fn references(&self, prefix: &str) -> Result<Vec<RefEntry>>;
}

/// README contents and path for `reference`. A missing README yields empty strings.
pub async fn readme(repo: &dyn Repository, reference: &Reference) -> Result<(String, String)> {
    Ok(repo
        .latest_file(reference, README_PATTERN)
        .await?
        .unwrap_or_default())
}

/// Shell-style glob match supporting `*`, `?` and `[...]` classes.
pub fn glob_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();
    match_from(&pattern, &name)
}

fn match_from(p: &[char], n: &[char]) -> bool {
    match p.first() {
        None => n.is_empty(),
        Some('*') => (0..=n.len()).any(|i| match_from(&p[1..], &n[i..])),
        Some('?') => !n.is_empty() && match_from(&p[1..], &n[1..]),
        Some('[') => match n.first() {
            Some(&c) => match match_class(&p[1..], c) {
                Some((true, len)) => match_from(&p[1 + len..], &n[1..]),
                Some((false, _)) => false,
                // unterminated class, treat '[' literally
                None => c == '[' && match_from(&p[1..], &n[1..]),
            },
            None => false,
        },
        Some(&c) => n.first() == Some(&c) && match_from(&p[1..], &n[1..]),
    }
}

/// Match `c` against the class body following `[`. Returns whether it matched and
/// how many pattern chars the class used, including the closing `]`.
fn match_class(class: &[char], c: char) -> Option<(bool, usize)> {
    let mut i = 0;
    let negate = matches!(class.first(), Some('!') | Some('^'));
    if negate {
        i += 1;
    }

    let mut matched = false;
    let mut first = true;
    while i < class.len() {
        let lo = class[i];
        if lo == ']' && !first {
            return Some((matched != negate, i + 1));
        }
        first = false;
        if i + 2 < class.len() && class[i + 1] == '-' && class[i + 2] != ']' {
            if lo <= c && c <= class[i + 2] {
                matched = true;
            }
            i += 3;
        } else {
            if lo == c {
                matched = true;
            }
            i += 1;
        }
    }
    None
}

/// A repository on the local filesystem.
///
/// Only the path and metadata are kept; every operation reopens the repository on
/// a blocking thread so the handle stays `Send + Sync`.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    path: PathBuf,
    name: String,
    project_name: String,
    description: String,
}

impl LocalRepository {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let repo = git2::Repository::discover(path.as_ref())?;
        let root = repo.workdir().unwrap_or_else(|| repo.path());
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let name = name.strip_suffix(".git").unwrap_or(&name).to_string();

        let description = std::fs::read_to_string(repo.path().join("description"))
            .map(|d| d.trim().to_string())
            .unwrap_or_default();
        let description = if description.starts_with(DEFAULT_DESCRIPTION) {
            String::new()
        } else {
            description
        };

        let project_name = repo
            .config()
            .and_then(|c| c.get_string("rove.project-name"))
            .unwrap_or_default();

        Ok(Self {
            path: repo.path().to_path_buf(),
            name,
            project_name,
            description,
        })
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&git2::Repository) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let repo = git2::Repository::open(&path)?;
            f(&repo)
        })
        .await?
    }
}

fn to_datetime(time: git2::Time) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(time.seconds(), 0).unwrap_or_default()
}

fn to_commit(commit: &git2::Commit) -> Commit {
    Commit {
        id: commit.id().to_string(),
        summary: commit.summary().unwrap_or("").to_string(),
        message: commit.message().unwrap_or("").to_string(),
        author: commit.author().name().unwrap_or("Unknown").to_string(),
        date: to_datetime(commit.time()),
    }
}

fn peel_commit<'r>(repo: &'r git2::Repository, reference: &Reference) -> Result<git2::Commit<'r>> {
    Ok(repo.revparse_single(reference.name())?.peel_to_commit()?)
}

fn subtree<'r>(
    repo: &'r git2::Repository,
    reference: &Reference,
    path: &str,
) -> Result<git2::Tree<'r>> {
    let tree = peel_commit(repo, reference)?.tree()?;
    if path.is_empty() {
        return Ok(tree);
    }
    let entry = tree.get_path(Path::new(path))?;
    Ok(entry.to_object(repo)?.peel_to_tree()?)
}

fn blob_text(blob: &git2::Blob) -> String {
    if blob.is_binary() {
        return format!("Binary file ({} bytes)", blob.size());
    }
    String::from_utf8_lossy(blob.content()).to_string()
}

#[async_trait]
impl Repository for LocalRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn project_name(&self) -> &str {
        &self.project_name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn head(&self) -> Result<Option<Reference>> {
        self.blocking(|repo| match repo.head() {
            Ok(head) => Ok(Some(Reference::new(head.name().unwrap_or("HEAD")))),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        })
        .await
    }

    async fn latest_file(
        &self,
        reference: &Reference,
        pattern: &str,
    ) -> Result<Option<(String, String)>> {
        let reference = reference.clone();
        let pattern = pattern.to_string();
        self.blocking(move |repo| {
            let tree = subtree(repo, &reference, "")?;
            for entry in tree.iter() {
                if entry.kind() != Some(ObjectType::Blob) {
                    continue;
                }
                let Some(name) = entry.name() else {
                    continue;
                };
                if !glob_match(&pattern, name) {
                    continue;
                }
                let object = entry.to_object(repo)?;
                if let Some(blob) = object.as_blob() {
                    return Ok(Some((blob_text(blob), name.to_string())));
                }
            }
            Ok(None)
        })
        .await
    }

    async fn tree(&self, reference: &Reference, path: &str) -> Result<Vec<TreeEntry>> {
        let reference = reference.clone();
        let path = path.trim_matches('/').to_string();
        self.blocking(move |repo| {
            let tree = subtree(repo, &reference, &path)?;
            let mut entries: Vec<TreeEntry> = tree
                .iter()
                .map(|entry| {
                    let name = entry.name().unwrap_or("").to_string();
                    let kind = match entry.kind() {
                        Some(ObjectType::Tree) => EntryKind::Dir,
                        Some(ObjectType::Commit) => EntryKind::Submodule,
                        _ => EntryKind::File,
                    };
                    let size = if kind == EntryKind::File {
                        entry
                            .to_object(repo)
                            .ok()
                            .and_then(|o| o.as_blob().map(|b| b.size() as u64))
                            .unwrap_or(0)
                    } else {
                        0
                    };
                    let full = if path.is_empty() {
                        name.clone()
                    } else {
                        format!("{}/{}", path, name)
                    };
                    TreeEntry {
                        name,
                        path: full,
                        kind,
                        size,
                    }
                })
                .collect();
            entries.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.name.cmp(&b.name)));
            Ok(entries)
        })
        .await
    }

    async fn file(&self, reference: &Reference, path: &str) -> Result<String> {
        let reference = reference.clone();
        let path = path.to_string();
        self.blocking(move |repo| {
            let tree = subtree(repo, &reference, "")?;
            let blob = tree
                .get_path(Path::new(&path))?
                .to_object(repo)?
                .peel_to_blob()?;
            Ok(blob_text(&blob))
        })
        .await
    }

    async fn commit_count(&self, reference: &Reference) -> Result<usize> {
        let reference = reference.clone();
        self.blocking(move |repo| {
            let commit = peel_commit(repo, &reference)?;
            let mut revwalk = repo.revwalk()?;
            revwalk.push(commit.id())?;
            Ok(revwalk.count())
        })
        .await
    }

    async fn commits(
        &self,
        reference: &Reference,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Commit>> {
        let reference = reference.clone();
        self.blocking(move |repo| {
            let commit = peel_commit(repo, &reference)?;
            let mut revwalk = repo.revwalk()?;
            revwalk.push(commit.id())?;
            revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
            let commits = revwalk
                .skip(skip)
                .take(limit)
                .filter_map(|oid| {
                    let oid = oid.ok()?;
                    let commit = repo.find_commit(oid).ok()?;
                    Some(to_commit(&commit))
                })
                .collect();
            Ok(commits)
        })
        .await
    }

    async fn diff(&self, commit_id: &str) -> Result<CommitDiff> {
        let commit_id = commit_id.to_string();
        self.blocking(move |repo| {
            let commit = repo.find_commit(git2::Oid::from_str(&commit_id)?)?;
            let tree = commit.tree()?;
            let parent_tree = if commit.parent_count() > 0 {
                Some(commit.parent(0)?.tree()?)
            } else {
                None
            };
            let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;
            let stats = diff.stats()?;

            let mut patch = String::new();
            diff.print(git2::DiffFormat::Patch, |_delta, _hunk, line| {
                if matches!(line.origin(), '+' | '-' | ' ') {
                    patch.push(line.origin());
                }
                patch.push_str(&String::from_utf8_lossy(line.content()));
                true
            })?;

            Ok(CommitDiff {
                commit: to_commit(&commit),
                patch,
                files_changed: stats.files_changed(),
                insertions: stats.insertions(),
                deletions: stats.deletions(),
            })
        })
        .await
    }

    async fn references(&self, prefix: &str) -> Result<Vec<RefEntry>> {
        let glob = format!("{}*", prefix);
        self.blocking(move |repo| {
            let mut refs = Vec::new();
            for reference in repo.references_glob(&glob)? {
                let reference = reference?;
                let Some(name) = reference.name() else {
                    continue;
                };
                let name = name.to_string();
                let Ok(commit) = reference.peel_to_commit() else {
                    continue;
                };
                refs.push(RefEntry {
                    reference: Reference::new(name),
                    target: commit.id().to_string()[..7].to_string(),
                    summary: commit.summary().unwrap_or("").to_string(),
                    date: to_datetime(commit.time()),
                });
            }
            refs.sort_by(|a, b| a.reference.name().cmp(b.reference.name()));
            Ok(refs)
        })
        .await
    }
}
