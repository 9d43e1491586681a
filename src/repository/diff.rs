use super::HistoryRepository;
use crate::error::Result;
use git2::{Delta, DiffFindOptions, DiffOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Kind of file-level change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
}

/// One changed path between two commits
///
/// `old_path` is absent for additions and `new_path` for deletions; renames carry both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub kind: ChangeKind,
    pub old_path: Option<String>,
    pub new_path: Option<String>,
}

impl FileChange {
    /// The same change seen from the child towards the parent
    pub fn reversed(&self) -> Self {
        let kind = match self.kind {
            ChangeKind::Added => ChangeKind::Deleted,
            ChangeKind::Deleted => ChangeKind::Added,
            other => other,
        };
        Self {
            kind,
            old_path: self.new_path.clone(),
            new_path: self.old_path.clone(),
        }
    }

    /// Whether this change applies to `path` as it existed before the change
    pub fn touches(&self, path: &str) -> bool {
        self.old_path.as_deref() == Some(path)
    }
}

/// Computes file-level changes of commits through a [`HistoryRepository`]
///
/// Nothing is cached; walks are short and tree diffs are cheap.
pub struct CommitDiffWalker<'a> {
    repo: &'a HistoryRepository,
}

impl<'a> CommitDiffWalker<'a> {
    pub fn new(repo: &'a HistoryRepository) -> Self {
        Self { repo }
    }

    /// Changes introduced by `commit_id` relative to its first parent
    ///
    /// A root commit is diffed against the empty tree.
    pub fn changes(&self, commit_id: &str) -> Result<Vec<FileChange>> {
        let parent = self.repo.parent_of(commit_id)?;
        self.changes_between(parent.as_deref(), commit_id)
    }

    /// Changes between an explicit parent and child, with rename detection
    pub fn changes_between(&self, parent: Option<&str>, child: &str) -> Result<Vec<FileChange>> {
        let child_tree = self.repo.find_commit(child)?.tree()?;
        let parent_tree = match parent {
            Some(id) => Some(self.repo.find_commit(id)?.tree()?),
            None => None,
        };

        let mut diff_opts = DiffOptions::new();
        diff_opts.context_lines(0).ignore_whitespace(false);

        let mut diff = self.repo.git().diff_tree_to_tree(
            parent_tree.as_ref(),
            Some(&child_tree),
            Some(&mut diff_opts),
        )?;

        let mut find_opts = DiffFindOptions::new();
        find_opts.renames(true);
        diff.find_similar(Some(&mut find_opts))?;

        let mut changes = Vec::new();
        for delta in diff.deltas() {
            let old_path = delta.old_file().path().map(path_string);
            let new_path = delta.new_file().path().map(path_string);

            let change = match delta.status() {
                Delta::Added | Delta::Copied => FileChange {
                    kind: ChangeKind::Added,
                    old_path: None,
                    new_path,
                },
                Delta::Deleted => FileChange {
                    kind: ChangeKind::Deleted,
                    old_path,
                    new_path: None,
                },
                Delta::Modified | Delta::Typechange => FileChange {
                    kind: ChangeKind::Modified,
                    old_path,
                    new_path,
                },
                Delta::Renamed => FileChange {
                    kind: ChangeKind::Renamed,
                    old_path,
                    new_path,
                },
                _ => continue,
            };
            changes.push(change);
        }

        tracing::trace!(
            "Diffed {} against {:?}: {} changes",
            child,
            parent,
            changes.len()
        );
        Ok(changes)
    }
}

fn path_string(path: &Path) -> String {
    path.display().to_string()
}
