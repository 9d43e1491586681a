//! Shared fixtures for integration tests
#![allow(dead_code)]

use anyhow::Result;
use git2::{Commit, Repository, Signature};
use history_mapper::config::MapperConfig;
use history_mapper::mapper::HistoryMapper;
use history_mapper::tokenizer::Tokenizer;
use history_mapper::types::TokenizedMethod;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Tokenizer for `.src` files where each line reads `Identifier => tok tok tok`
///
/// A line with nothing after `=>` declares a method with an empty body. A line reading
/// `!unparsable` makes the whole file fail to tokenize.
pub struct ScriptedTokenizer;

impl Tokenizer for ScriptedTokenizer {
    fn get_methods(&self, filename: &str, source_code: &str) -> Result<Vec<TokenizedMethod>> {
        anyhow::ensure!(self.supports(filename), "not a .src file: {}", filename);
        anyhow::ensure!(
            !source_code.lines().any(|line| line.trim() == "!unparsable"),
            "unparsable source in {}",
            filename
        );

        let methods = source_code
            .lines()
            .filter_map(|line| line.split_once("=>"))
            .map(|(identifier, body)| {
                let mut tokens: Vec<String> = body.split_whitespace().map(str::to_string).collect();
                if tokens.is_empty() {
                    tokens.push(String::new());
                }
                TokenizedMethod::new(identifier.trim(), tokens)
            })
            .collect();
        Ok(methods)
    }

    fn supports(&self, filename: &str) -> bool {
        filename.ends_with(".src")
    }
}

/// A throwaway git repository built commit by commit
pub struct FixtureRepo {
    pub dir: TempDir,
    pub repo: Repository,
}

impl FixtureRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write (`Some`) or delete (`None`) files and commit on HEAD
    pub fn commit(&self, files: &[(&str, Option<&str>)], message: &str) -> String {
        let mut index = self.repo.index().unwrap();

        for (path, content) in files {
            let full_path = self.path().join(path);
            match content {
                Some(content) => {
                    if let Some(parent) = full_path.parent() {
                        fs::create_dir_all(parent).unwrap();
                    }
                    fs::write(&full_path, content).unwrap();
                    index.add_path(Path::new(path)).unwrap();
                }
                None => {
                    fs::remove_file(&full_path).unwrap();
                    index.remove_path(Path::new(path)).unwrap();
                }
            }
        }
        index.write().unwrap();
        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();

        let signature = Signature::now("Test", "test@test.com").unwrap();
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&Commit<'_>> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .unwrap()
            .to_string()
    }
}

/// Default configuration with mirrors under `mirrors`
pub fn config_in(mirrors: &TempDir) -> MapperConfig {
    let mut config = MapperConfig::default();
    config.mirror.root = mirrors.path().to_path_buf();
    config
}

pub fn scripted_mapper(fixture: &FixtureRepo, config: MapperConfig) -> HistoryMapper<ScriptedTokenizer> {
    HistoryMapper::initialize(fixture.path(), ScriptedTokenizer, config).unwrap()
}
