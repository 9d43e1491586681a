//! Version-control access for the history mapper
//!
//! [`HistoryRepository`] keeps a private bare mirror of the caller's repository so that
//! revisions can be resolved and file contents read at any commit without touching the
//! caller's work tree. [`CommitDiffWalker`] reports the file-level changes of a commit.

/// File-level changes between a commit and its first parent
pub mod diff;

pub use diff::{ChangeKind, CommitDiffWalker, FileChange};

use crate::error::{RepositoryError, Result};
use git2::{Commit, ObjectType, Oid, Repository, TreeWalkMode, TreeWalkResult};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const MIRROR_HEAD_REF: &str = "refs/history-mapper/head";

/// How to get from one commit to another along first-parent edges
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkPlan {
    /// Both commits are the same
    Stay,
    /// Towards descendants; commits after the start, ending with the target
    Forward(Vec<String>),
    /// Towards ancestors; commits after the start, ending with the target
    Backward(Vec<String>),
}

impl WalkPlan {
    /// Number of single-commit steps in the walk
    pub fn len(&self) -> usize {
        match self {
            WalkPlan::Stay => 0,
            WalkPlan::Forward(path) | WalkPlan::Backward(path) => path.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A read-only view of a source repository backed by a private bare mirror
///
/// The mirror lives in its own directory for the lifetime of this value. Call
/// [`HistoryRepository::dispose`] to close the handle and remove the directory;
/// dropping without disposing still removes it, but errors go unreported.
pub struct HistoryRepository {
    source_path: PathBuf,
    // Declared before `mirror_dir` so the handle closes before the directory is removed
    mirror: Repository,
    mirror_dir: TempDir,
}

impl HistoryRepository {
    /// Mirror the repository containing `source` into a fresh directory under `mirror_root`
    pub fn initialize<P: AsRef<Path>>(source: P, mirror_root: &Path) -> Result<Self> {
        let source = source.as_ref();
        let failed = |reason: String| RepositoryError::InitializationFailed {
            path: source.display().to_string(),
            reason,
        };

        let source_repo =
            Repository::discover(source).map_err(|e| failed(e.message().to_string()))?;
        let source_path = source_repo
            .workdir()
            .unwrap_or_else(|| source_repo.path())
            .to_path_buf();

        std::fs::create_dir_all(mirror_root)
            .map_err(|e| failed(format!("Failed to create mirror root: {}", e)))?;
        let mirror_dir = tempfile::Builder::new()
            .prefix("mirror-")
            .tempdir_in(mirror_root)
            .map_err(|e| failed(format!("Failed to create mirror directory: {}", e)))?;

        let mirror = Repository::init_bare(mirror_dir.path())
            .map_err(|e| failed(e.message().to_string()))?;
        fetch_mirror(&source_repo, &mirror).map_err(|e| failed(e.message().to_string()))?;
        sync_head(&source_repo, &mirror).map_err(|e| failed(e.message().to_string()))?;

        tracing::info!(
            "Mirrored {} into {}",
            source_path.display(),
            mirror_dir.path().display()
        );

        Ok(Self {
            source_path,
            mirror,
            mirror_dir,
        })
    }

    /// Root of the mirrored source repository (work tree, or git dir when bare)
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Directory holding the private mirror
    pub fn mirror_path(&self) -> &Path {
        self.mirror_dir.path()
    }

    /// Resolve a revision (`<hash>`, `HEAD`, `ref^1`, `ref~N`, branch or tag) to a full commit id
    pub fn resolve_commit(&self, rev: &str) -> Result<String> {
        let unknown = || RepositoryError::UnknownRevision(rev.to_string());
        let object = self.mirror.revparse_single(rev).map_err(|_| unknown())?;
        let commit = object.peel_to_commit().map_err(|_| unknown())?;
        Ok(commit.id().to_string())
    }

    /// File contents as of a commit
    pub fn read_file(&self, commit_id: &str, path: &str) -> Result<String> {
        let not_found = || RepositoryError::FileNotFoundAtCommit {
            path: path.to_string(),
            commit: commit_id.to_string(),
        };

        let tree = self.find_commit(commit_id)?.tree()?;
        let entry = tree.get_path(Path::new(path)).map_err(|_| not_found())?;
        let object = entry.to_object(&self.mirror)?;
        let blob = object.as_blob().ok_or_else(not_found)?;

        Ok(String::from_utf8_lossy(blob.content()).into_owned())
    }

    /// Every file path in the commit's tree, sorted
    pub fn list_files(&self, commit_id: &str) -> Result<Vec<String>> {
        let tree = self.find_commit(commit_id)?.tree()?;
        let mut files = Vec::new();

        tree.walk(TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() == Some(ObjectType::Blob)
                && let Some(name) = entry.name()
            {
                files.push(format!("{}{}", root, name));
            }
            TreeWalkResult::Ok
        })?;

        files.sort();
        Ok(files)
    }

    /// First parent of a commit, or `None` for a root commit
    pub fn parent_of(&self, commit_id: &str) -> Result<Option<String>> {
        let commit = self.find_commit(commit_id)?;
        Ok(commit.parent_id(0).ok().map(|oid| oid.to_string()))
    }

    /// Commits reachable from any mirrored ref that list `commit_id` as a parent
    pub fn children_of(&self, commit_id: &str) -> Result<Vec<String>> {
        let target = self.find_commit(commit_id)?.id();

        let mut revwalk = self.mirror.revwalk()?;
        revwalk.push_glob("*")?;
        // Unborn or missing HEAD just contributes nothing
        let _ = revwalk.push_head();
        revwalk.hide(target)?;

        let mut children = Vec::new();
        for oid in revwalk {
            let commit = self.mirror.find_commit(oid?)?;
            if commit.parent_ids().any(|parent| parent == target) {
                children.push(commit.id().to_string());
            }
        }

        children.sort();
        Ok(children)
    }

    /// Plan a linear first-parent walk between two resolved commits
    ///
    /// Forward walks follow, at every step, the child lying on `to`'s first-parent chain.
    pub fn plan_walk(&self, from: &str, to: &str, max_steps: usize) -> Result<WalkPlan> {
        if from == to {
            return Ok(WalkPlan::Stay);
        }

        if let Some(path) = self.first_parent_path(from, to, max_steps)? {
            return Ok(WalkPlan::Backward(path));
        }

        if let Some(mut path) = self.first_parent_path(to, from, max_steps)? {
            path.pop();
            path.reverse();
            path.push(to.to_string());
            return Ok(WalkPlan::Forward(path));
        }

        Err(RepositoryError::NoLinearPath {
            from: from.to_string(),
            to: to.to_string(),
        }
        .into())
    }

    /// Close the mirror handle and delete its directory
    pub fn dispose(self) -> Result<()> {
        let HistoryRepository {
            source_path,
            mirror,
            mirror_dir,
        } = self;

        drop(mirror);
        let path = mirror_dir.path().to_path_buf();
        mirror_dir.close()?;

        tracing::info!(
            "Removed mirror {} of {}",
            path.display(),
            source_path.display()
        );
        Ok(())
    }

    pub(crate) fn git(&self) -> &Repository {
        &self.mirror
    }

    pub(crate) fn find_commit(&self, commit_id: &str) -> Result<Commit<'_>> {
        let unknown = || RepositoryError::UnknownRevision(commit_id.to_string());
        let oid = Oid::from_str(commit_id).map_err(|_| unknown())?;
        let commit = self.mirror.find_commit(oid).map_err(|_| unknown())?;
        Ok(commit)
    }

    /// Commits after `start` along first parents, ending at `goal`, if reachable
    fn first_parent_path(
        &self,
        start: &str,
        goal: &str,
        max_steps: usize,
    ) -> Result<Option<Vec<String>>> {
        let mut path = Vec::new();
        let mut current = start.to_string();

        for _ in 0..max_steps {
            match self.parent_of(&current)? {
                Some(parent) => {
                    path.push(parent.clone());
                    if parent == goal {
                        return Ok(Some(path));
                    }
                    current = parent;
                }
                None => return Ok(None),
            }
        }

        tracing::debug!(
            "Gave up looking for {} from {} after {} steps",
            goal,
            start,
            max_steps
        );
        Ok(None)
    }
}

fn fetch_mirror(source: &Repository, mirror: &Repository) -> std::result::Result<(), git2::Error> {
    let url = source.path().to_string_lossy().into_owned();
    let mut remote = mirror.remote_anonymous(&url)?;

    let mut refspecs = vec!["+refs/*:refs/*".to_string()];
    if source.head_detached().unwrap_or(false) {
        refspecs.push(format!("+HEAD:{}", MIRROR_HEAD_REF));
    }

    remote.fetch(&refspecs, None, None)?;
    Ok(())
}

fn sync_head(source: &Repository, mirror: &Repository) -> std::result::Result<(), git2::Error> {
    if source.head_detached().unwrap_or(false) {
        let oid = source.head()?.target().ok_or_else(|| {
            git2::Error::from_str("Detached HEAD does not point at a commit")
        })?;
        return mirror.set_head_detached(oid);
    }

    // Symbolic HEAD, possibly unborn
    let head = source.find_reference("HEAD")?;
    match head.symbolic_target() {
        Some(target) => mirror.set_head(target),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use std::fs;

    fn commit_file(repo: &Repository, path: &str, content: &str, message: &str) -> String {
        let workdir = repo.workdir().unwrap();
        let full_path = workdir.join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full_path, content).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(path)).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

        let signature = Signature::now("Test", "test@test.com").unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&Commit<'_>> = parent.iter().collect();

        repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .unwrap()
            .to_string()
    }

    fn init_source() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_initialize_and_resolve() {
        let (source_dir, source) = init_source();
        let first = commit_file(&source, "a.txt", "one", "first");
        let second = commit_file(&source, "a.txt", "two", "second");
        let mirrors = TempDir::new().unwrap();

        let repo = HistoryRepository::initialize(source_dir.path(), mirrors.path()).unwrap();

        assert!(repo.mirror_path().starts_with(mirrors.path()));
        assert_eq!(repo.resolve_commit("HEAD").unwrap(), second);
        assert_eq!(repo.resolve_commit("HEAD~1").unwrap(), first);
        assert_eq!(repo.resolve_commit("HEAD^1").unwrap(), first);
        assert_eq!(repo.resolve_commit(&second[..10]).unwrap(), second);

        repo.dispose().unwrap();
    }

    #[test]
    fn test_initialize_rejects_non_repository() {
        let not_a_repo = TempDir::new().unwrap();
        let mirrors = TempDir::new().unwrap();

        let result = HistoryRepository::initialize(not_a_repo.path().join("nowhere"), mirrors.path());
        assert!(matches!(
            result,
            Err(crate::error::MapperError::Repository(
                RepositoryError::InitializationFailed { .. }
            ))
        ));
    }

    #[test]
    fn test_unknown_revision() {
        let (source_dir, source) = init_source();
        commit_file(&source, "a.txt", "one", "first");
        let mirrors = TempDir::new().unwrap();
        let repo = HistoryRepository::initialize(source_dir.path(), mirrors.path()).unwrap();

        let err = repo.resolve_commit("no-such-branch").unwrap_err();
        assert!(matches!(
            err,
            crate::error::MapperError::Repository(RepositoryError::UnknownRevision(_))
        ));
        assert!(repo.resolve_commit("HEAD~5").is_err());
    }

    #[test]
    fn test_read_file_and_missing_file() {
        let (source_dir, source) = init_source();
        let first = commit_file(&source, "src/a.txt", "one", "first");
        let second = commit_file(&source, "src/b.txt", "bee", "second");
        let mirrors = TempDir::new().unwrap();
        let repo = HistoryRepository::initialize(source_dir.path(), mirrors.path()).unwrap();

        assert_eq!(repo.read_file(&first, "src/a.txt").unwrap(), "one");
        assert_eq!(repo.read_file(&second, "src/b.txt").unwrap(), "bee");

        let err = repo.read_file(&first, "src/b.txt").unwrap_err();
        assert!(err.is_file_not_found());

        // A directory is not a file
        assert!(repo.read_file(&second, "src").unwrap_err().is_file_not_found());

        assert_eq!(
            repo.list_files(&second).unwrap(),
            vec!["src/a.txt".to_string(), "src/b.txt".to_string()]
        );
    }

    #[test]
    fn test_parents_children_and_walk_plan() {
        let (source_dir, source) = init_source();
        let c1 = commit_file(&source, "a.txt", "1", "c1");
        let c2 = commit_file(&source, "a.txt", "2", "c2");
        let c3 = commit_file(&source, "a.txt", "3", "c3");
        let mirrors = TempDir::new().unwrap();
        let repo = HistoryRepository::initialize(source_dir.path(), mirrors.path()).unwrap();

        assert_eq!(repo.parent_of(&c1).unwrap(), None);
        assert_eq!(repo.parent_of(&c3).unwrap(), Some(c2.clone()));
        assert_eq!(repo.children_of(&c1).unwrap(), vec![c2.clone()]);
        assert!(repo.children_of(&c3).unwrap().is_empty());

        assert_eq!(repo.plan_walk(&c2, &c2, 10).unwrap(), WalkPlan::Stay);
        assert_eq!(
            repo.plan_walk(&c1, &c3, 10).unwrap(),
            WalkPlan::Forward(vec![c2.clone(), c3.clone()])
        );
        assert_eq!(
            repo.plan_walk(&c3, &c1, 10).unwrap(),
            WalkPlan::Backward(vec![c2.clone(), c1.clone()])
        );

        // Step cap too small to connect the commits
        assert!(matches!(
            repo.plan_walk(&c3, &c1, 1),
            Err(crate::error::MapperError::Repository(
                RepositoryError::NoLinearPath { .. }
            ))
        ));
    }

    #[test]
    fn test_dispose_removes_mirror() {
        let (source_dir, source) = init_source();
        commit_file(&source, "a.txt", "1", "c1");
        let mirrors = TempDir::new().unwrap();
        let repo = HistoryRepository::initialize(source_dir.path(), mirrors.path()).unwrap();

        let mirror_path = repo.mirror_path().to_path_buf();
        assert!(mirror_path.exists());

        repo.dispose().unwrap();
        assert!(!mirror_path.exists());
    }

    #[test]
    fn test_mirror_is_independent_of_source() {
        let (source_dir, source) = init_source();
        let first = commit_file(&source, "a.txt", "1", "c1");
        let mirrors = TempDir::new().unwrap();
        let repo = HistoryRepository::initialize(source_dir.path(), mirrors.path()).unwrap();

        // Later commits in the source are not visible until a new mirror is made
        commit_file(&source, "a.txt", "2", "c2");
        assert_eq!(repo.resolve_commit("HEAD").unwrap(), first);
    }
}
