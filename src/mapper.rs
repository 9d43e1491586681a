//! Mapping a method's qualified name from one commit to another
//!
//! [`HistoryMapper`] walks the first-parent line between two commits one commit at a
//! time. At each step it looks at the file currently declaring the tracked method; if
//! the file changed, the method's body tokens are matched against the methods the file
//! declares afterwards.

use crate::config::MapperConfig;
use crate::error::{Result, TokenizerError, ValidationError};
use crate::matching::MethodMatcher;
use crate::repository::{ChangeKind, CommitDiffWalker, FileChange, HistoryRepository, WalkPlan};
use crate::tokenizer::Tokenizer;
use crate::types::{ArtifactQualifiedName, ArtifactType, TokenizedMethod};
use std::collections::HashSet;
use std::path::Path;

/// The tracked method as resolved at one commit
#[derive(Debug, Clone)]
struct Tracked {
    commit_id: String,
    path: String,
    method: TokenizedMethod,
    /// Every method of `path` at `commit_id`, `method` included
    file_methods: Vec<TokenizedMethod>,
}

impl Tracked {
    fn name(&self) -> ArtifactQualifiedName {
        ArtifactQualifiedName::method(self.method.identifier(), self.commit_id.as_str())
    }

    /// Same method and file, one commit further
    fn carried_to(self, commit_id: &str) -> Self {
        Self {
            commit_id: commit_id.to_string(),
            ..self
        }
    }
}

/// Tracks method identity across a repository's history
///
/// Owns a private mirror of the repository for its whole lifetime; call
/// [`HistoryMapper::dispose`] when done. Lookups take `&self` but one instance should
/// not be shared by concurrent callers.
pub struct HistoryMapper<T: Tokenizer> {
    repository: HistoryRepository,
    tokenizer: T,
    matcher: MethodMatcher,
    config: MapperConfig,
}

impl<T: Tokenizer> HistoryMapper<T> {
    /// Mirror the repository at `source` and prepare for lookups
    pub fn initialize<P: AsRef<Path>>(source: P, tokenizer: T, config: MapperConfig) -> Result<Self> {
        config.validate()?;

        let repository = HistoryRepository::initialize(source, &config.mirror.root)?;
        let matcher = MethodMatcher::new(&config.matching);

        tracing::info!(
            "History mapper ready for {} (min_similarity={}, follow_moves={})",
            repository.source_path().display(),
            config.matching.min_similarity,
            config.matching.follow_moves
        );

        Ok(Self {
            repository,
            tokenizer,
            matcher,
            config,
        })
    }

    pub fn repository(&self) -> &HistoryRepository {
        &self.repository
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn matcher(&self) -> &MethodMatcher {
        &self.matcher
    }

    /// Identifier of the method `old` refers to, as of `target_commit_id`
    ///
    /// Returns `Ok(None)` when the method cannot be followed to the target. With
    /// `best_effort`, a lost method yields its last resolved name instead, stamped with
    /// the last commit it was resolved at.
    pub fn get_method_qualified_name(
        &self,
        old: &ArtifactQualifiedName,
        target_commit_id: &str,
        best_effort: bool,
    ) -> Result<Option<ArtifactQualifiedName>> {
        if old.artifact_type != ArtifactType::Method {
            return Err(ValidationError::UnsupportedArtifactType(old.artifact_type.to_string()).into());
        }
        if old.identifier.trim().is_empty() {
            return Err(ValidationError::Empty("method identifier".to_string()).into());
        }

        let from = self.repository.resolve_commit(&old.commit_id)?;
        let to = self.repository.resolve_commit(target_commit_id)?;
        if from == to {
            return Ok(Some(old.clone()));
        }

        let Some(mut tracked) = self.locate(&old.identifier, &from)? else {
            tracing::info!("{} is not declared at {}", old.identifier, from);
            return Ok(None);
        };

        let plan = self.repository.plan_walk(&from, &to, self.config.walk.max_steps)?;
        tracing::debug!(
            "Mapping {} from {} to {} in {} steps",
            old.identifier,
            from,
            to,
            plan.len()
        );

        let (steps, backward) = match plan {
            WalkPlan::Stay => (Vec::new(), false),
            WalkPlan::Forward(steps) => (steps, false),
            WalkPlan::Backward(steps) => (steps, true),
        };

        let walker = CommitDiffWalker::new(&self.repository);
        for next in steps {
            let changes = if backward {
                walker
                    .changes_between(Some(next.as_str()), &tracked.commit_id)?
                    .iter()
                    .map(FileChange::reversed)
                    .collect()
            } else {
                walker.changes_between(Some(tracked.commit_id.as_str()), &next)?
            };

            match self.step(&tracked, &next, &changes)? {
                Some(resolved) => {
                    tracing::debug!(
                        "{} -> {} in {} at {}",
                        tracked.method.identifier(),
                        resolved.method.identifier(),
                        resolved.path,
                        next
                    );
                    tracked = resolved;
                }
                None => {
                    tracing::info!(
                        "Lost track of {} at {} (last resolved at {})",
                        tracked.method.identifier(),
                        next,
                        tracked.commit_id
                    );
                    return Ok(best_effort.then(|| tracked.name()));
                }
            }
        }

        Ok(Some(tracked.name()))
    }

    /// Methods declared by `path` at revision `rev`, stamped with the resolved commit
    pub fn methods_at(&self, rev: &str, path: &str) -> Result<Vec<TokenizedMethod>> {
        let commit_id = self.repository.resolve_commit(rev)?;
        self.tokenize_file(&commit_id, path)
    }

    /// Close the repository mirror and remove it from disk
    pub fn dispose(self) -> Result<()> {
        self.repository.dispose()
    }

    /// Resolve one commit step; `None` means identity was lost
    fn step(&self, tracked: &Tracked, next: &str, changes: &[FileChange]) -> Result<Option<Tracked>> {
        let Some(change) = changes.iter().find(|change| change.touches(&tracked.path)) else {
            return Ok(Some(tracked.clone().carried_to(next)));
        };

        if change.kind != ChangeKind::Deleted {
            let new_path = change.new_path.as_deref().unwrap_or(&tracked.path);
            let candidates = match self.tokenize_file(next, new_path) {
                Ok(methods) => methods,
                Err(e) if e.is_file_not_found() => Vec::new(),
                Err(e) => return Err(e),
            };

            if let Some(found) =
                self.matcher
                    .find_match(&tracked.method, &tracked.file_methods, &candidates)
            {
                let method = found.clone();
                return Ok(Some(Tracked {
                    commit_id: next.to_string(),
                    path: new_path.to_string(),
                    method,
                    file_methods: candidates,
                }));
            }
        }

        if self.config.matching.follow_moves {
            return self.follow_move(tracked, next, change, changes);
        }
        Ok(None)
    }

    /// Look for the method among methods that appeared in other files of the same step
    ///
    /// Methods that left any changed file compete for the new arrivals, so lookalike
    /// methods moved together end up in distinct places.
    fn follow_move(
        &self,
        tracked: &Tracked,
        next: &str,
        own_change: &FileChange,
        changes: &[FileChange],
    ) -> Result<Option<Tracked>> {
        let mut files: Vec<(String, Vec<TokenizedMethod>)> = Vec::new();
        let mut departed = Vec::new();
        let mut arrived = Vec::new();
        let mut origins = Vec::new();

        for change in changes {
            let own = change == own_change;

            let before = match change.old_path.as_deref() {
                _ if own => tracked.file_methods.clone(),
                Some(old_path) if self.tokenizer.supports(old_path) => {
                    match self.tokenize_file(&tracked.commit_id, old_path) {
                        Ok(methods) => methods,
                        Err(e) => {
                            tracing::debug!("Skipping {} while following moves: {}", old_path, e);
                            continue;
                        }
                    }
                }
                _ => Vec::new(),
            };

            let new_path = match change.new_path.as_deref() {
                Some(path) if change.kind != ChangeKind::Deleted && self.tokenizer.supports(path) => {
                    Some(path)
                }
                _ => None,
            };
            let after = match new_path {
                Some(path) => match self.tokenize_file(next, path) {
                    Ok(methods) => methods,
                    Err(e) if own => {
                        tracing::debug!("{} unreadable at {}: {}", path, next, e);
                        Vec::new()
                    }
                    Err(e) => {
                        tracing::debug!("Skipping {} while following moves: {}", path, e);
                        continue;
                    }
                },
                None => Vec::new(),
            };

            let before_names: HashSet<&str> = before.iter().map(|m| m.identifier()).collect();
            let after_names: HashSet<&str> = after.iter().map(|m| m.identifier()).collect();

            departed.extend(
                before
                    .iter()
                    .filter(|m| !after_names.contains(m.identifier()))
                    .cloned(),
            );

            let (Some(path), false) = (new_path, own) else {
                continue;
            };
            let file_index = files.len();
            for method in after.iter().filter(|m| !before_names.contains(m.identifier())) {
                arrived.push(method.clone());
                origins.push(file_index);
            }
            files.push((path.to_string(), after));
        }

        let Some((index, score)) = self
            .matcher
            .find_moved(&tracked.method, &departed, &arrived)
        else {
            return Ok(None);
        };

        let (path, file_methods) = files.swap_remove(origins[index]);
        tracing::debug!(
            "{} moved from {} to {} (score {:.2})",
            tracked.method.identifier(),
            tracked.path,
            path,
            score
        );

        Ok(Some(Tracked {
            commit_id: next.to_string(),
            path,
            method: arrived.swap_remove(index),
            file_methods,
        }))
    }

    /// Find the file declaring `identifier` at `commit_id`
    ///
    /// Files whose stem appears among the identifier's segments are tried first.
    fn locate(&self, identifier: &str, commit_id: &str) -> Result<Option<Tracked>> {
        let name = ArtifactQualifiedName::method(identifier, commit_id);
        let segments = name.path_segments();
        let stem_matches = |path: &str| {
            Path::new(path)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .is_some_and(|stem| segments.contains(&stem))
        };

        let (preferred, others): (Vec<String>, Vec<String>) = self
            .repository
            .list_files(commit_id)?
            .into_iter()
            .filter(|path| self.tokenizer.supports(path))
            .partition(|path| stem_matches(path));

        for path in preferred.into_iter().chain(others) {
            let methods = match self.tokenize_file(commit_id, &path) {
                Ok(methods) => methods,
                Err(e) => {
                    tracing::debug!("Skipping {} while locating {}: {}", path, identifier, e);
                    continue;
                }
            };

            if let Some(method) = methods.iter().find(|m| m.identifier() == identifier) {
                tracing::debug!("Found {} in {} at {}", identifier, path, commit_id);
                return Ok(Some(Tracked {
                    commit_id: commit_id.to_string(),
                    path,
                    method: method.clone(),
                    file_methods: methods,
                }));
            }
        }

        Ok(None)
    }

    fn tokenize_file(&self, commit_id: &str, path: &str) -> Result<Vec<TokenizedMethod>> {
        let source = self.repository.read_file(commit_id, path)?;
        let methods = self
            .tokenizer
            .get_methods(path, &source)
            .map_err(|e| TokenizerError::Failed {
                file: path.to_string(),
                reason: format!("{:#}", e),
            })?;

        Ok(methods
            .into_iter()
            .map(|method| method.with_commit(commit_id))
            .collect())
    }
}
