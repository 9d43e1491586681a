//! Method matching across one change
//!
//! Given the methods of a file before a change and the candidate methods after it,
//! decides which candidate (if any) is the continuation of a given old method.
//! Matching is one-to-one: a candidate claimed by a better-fitting sibling cannot
//! also be the continuation of the method being tracked.

pub mod similarity;

pub use similarity::{lcs_length, similarity};

use crate::config::MatchingConfig;
use crate::types::TokenizedMethod;
use std::cmp::Ordering;

/// Scored (old method, candidate) pair considered during assignment
#[derive(Debug, Clone, Copy)]
struct ScoredPair {
    score: f64,
    same_name: bool,
    source: usize,
    candidate: usize,
}

impl ScoredPair {
    /// Highest score first, then same simple name, then source order
    fn rank(&self, other: &Self) -> Ordering {
        other
            .score
            .partial_cmp(&self.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.same_name.cmp(&self.same_name))
            .then_with(|| self.source.cmp(&other.source))
            .then_with(|| self.candidate.cmp(&other.candidate))
    }
}

/// Decides method continuity using LCS similarity of body tokens
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    min_similarity: f64,
}

impl Default for MethodMatcher {
    fn default() -> Self {
        Self::new(&MatchingConfig::default())
    }
}

impl MethodMatcher {
    pub fn new(config: &MatchingConfig) -> Self {
        Self::with_threshold(config.min_similarity)
    }

    pub fn with_threshold(min_similarity: f64) -> Self {
        Self { min_similarity }
    }

    pub fn min_similarity(&self) -> f64 {
        self.min_similarity
    }

    /// Similarity of two methods' body tokens
    pub fn similarity(&self, old: &TokenizedMethod, new: &TokenizedMethod) -> f64 {
        similarity(&old.tokens, &new.tokens)
    }

    /// Find the continuation of `old` among `candidates`
    ///
    /// `old_file` holds every method of the file `old` came from (including `old`);
    /// its other methods compete for candidates so a renamed method is not confused
    /// with an unchanged sibling. Returns `None` when `old` has no continuation.
    pub fn find_match<'c>(
        &self,
        old: &TokenizedMethod,
        old_file: &[TokenizedMethod],
        candidates: &'c [TokenizedMethod],
    ) -> Option<&'c TokenizedMethod> {
        if candidates.is_empty() {
            return None;
        }

        let (sources, own_index) = sources_with(old, old_file);

        // A file with one method whose replacement also has one method
        if sources.len() == 1 && candidates.len() == 1 {
            return candidates.first();
        }

        if old.is_degenerate() {
            return self.match_degenerate(old, &sources, candidates);
        }

        self.assign(&sources, own_index, candidates)
            .and_then(|pair| candidates.get(pair.candidate))
    }

    /// Find where `old` went when it left its file
    ///
    /// `departed` holds every method that disappeared from its file in the same
    /// change and `arrived` every method new to some other file. Departed methods
    /// compete for arrivals one-to-one, so two lookalike methods moved together keep
    /// distinct destinations. Returns the index into `arrived` and the score.
    pub fn find_moved(
        &self,
        old: &TokenizedMethod,
        departed: &[TokenizedMethod],
        arrived: &[TokenizedMethod],
    ) -> Option<(usize, f64)> {
        if old.is_degenerate() || arrived.is_empty() {
            return None;
        }

        let (sources, own_index) = sources_with(old, departed);
        self.assign(&sources, own_index, arrived)
            .map(|pair| (pair.candidate, pair.score))
    }

    /// Greedy one-to-one assignment; returns the pair won by `sources[own_index]`
    fn assign(
        &self,
        sources: &[&TokenizedMethod],
        own_index: usize,
        candidates: &[TokenizedMethod],
    ) -> Option<ScoredPair> {
        let mut pairs = Vec::new();
        for (source_index, source) in sources.iter().enumerate() {
            if source.is_degenerate() {
                continue;
            }
            for (candidate_index, candidate) in candidates.iter().enumerate() {
                if let Some(pair) = self.score(source, candidate, source_index, candidate_index) {
                    pairs.push(pair);
                }
            }
        }

        if !pairs.iter().any(|pair| pair.source == own_index) {
            return None;
        }

        pairs.sort_by(ScoredPair::rank);

        let mut source_taken = vec![false; sources.len()];
        let mut candidate_taken = vec![false; candidates.len()];
        for pair in pairs {
            if source_taken[pair.source] || candidate_taken[pair.candidate] {
                continue;
            }
            if pair.source == own_index {
                return Some(pair);
            }
            source_taken[pair.source] = true;
            candidate_taken[pair.candidate] = true;
        }

        None
    }

    fn score(
        &self,
        source: &TokenizedMethod,
        candidate: &TokenizedMethod,
        source_index: usize,
        candidate_index: usize,
    ) -> Option<ScoredPair> {
        if candidate.is_degenerate() {
            return None;
        }

        let score = self.similarity(source, candidate);
        (score >= self.min_similarity).then(|| ScoredPair {
            score,
            same_name: source.simple_name() == candidate.simple_name(),
            source: source_index,
            candidate: candidate_index,
        })
    }

    /// Token similarity is meaningless for empty bodies, so only identifiers decide
    fn match_degenerate<'c>(
        &self,
        old: &TokenizedMethod,
        sources: &[&TokenizedMethod],
        candidates: &'c [TokenizedMethod],
    ) -> Option<&'c TokenizedMethod> {
        let degenerate: Vec<&TokenizedMethod> =
            candidates.iter().filter(|c| c.is_degenerate()).collect();

        if let Some(same) = degenerate
            .iter()
            .find(|candidate| candidate.identifier() == old.identifier())
        {
            return Some(*same);
        }

        // Candidates keeping a sibling's identifier belong to that sibling
        let unclaimed: Vec<&TokenizedMethod> = degenerate
            .into_iter()
            .filter(|candidate| {
                !sources.iter().any(|source| {
                    !is_same_method(source, old) && source.identifier() == candidate.identifier()
                })
            })
            .collect();

        match unclaimed.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}

/// `old_file` as references, with `old` appended if absent, and `old`'s position
fn sources_with<'a>(
    old: &'a TokenizedMethod,
    old_file: &'a [TokenizedMethod],
) -> (Vec<&'a TokenizedMethod>, usize) {
    let mut sources: Vec<&TokenizedMethod> = old_file.iter().collect();
    let own_index = match sources.iter().position(|m| is_same_method(m, old)) {
        Some(index) => index,
        None => {
            sources.push(old);
            sources.len() - 1
        }
    };
    (sources, own_index)
}

fn is_same_method(a: &TokenizedMethod, b: &TokenizedMethod) -> bool {
    a.identifier() == b.identifier() && a.tokens == b.tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(identifier: &str, body: &str) -> TokenizedMethod {
        let tokens = if body.is_empty() {
            vec![String::new()]
        } else {
            body.split_whitespace().map(str::to_string).collect()
        };
        TokenizedMethod::new(identifier, tokens)
    }

    fn matcher() -> MethodMatcher {
        MethodMatcher::default()
    }

    #[test]
    fn test_default_threshold() {
        assert_eq!(matcher().min_similarity(), 0.5);
    }

    #[test]
    fn test_single_method_file_matches_single_candidate() {
        let old = method("A.run()", "a b c d");
        let candidates = vec![method("A.start()", "x y z")];

        let found = matcher().find_match(&old, std::slice::from_ref(&old), &candidates);
        assert_eq!(found.unwrap().identifier(), "A.start()");
    }

    #[test]
    fn test_rename_with_unchanged_body() {
        let old = method("GetterMethod.getStr()", "return str ;");
        let old_file = vec![old.clone()];
        let candidates = vec![method("GetterMethod.getStr2()", "return str ;")];

        let found = matcher().find_match(&old, &old_file, &candidates);
        assert_eq!(found.unwrap().identifier(), "GetterMethod.getStr2()");
    }

    #[test]
    fn test_disambiguates_by_content() {
        let first = method("A.first()", "int x = 1 ; return x ;");
        let second = method("A.second()", "while ( true ) { loop ( ) ; }");
        let old_file = vec![first.clone(), second.clone()];
        let candidates = vec![
            method("A.alpha()", "while ( true ) { loop ( ) ; }"),
            method("A.beta()", "int x = 1 ; return x ;"),
        ];

        let m = matcher();
        assert_eq!(
            m.find_match(&first, &old_file, &candidates).unwrap().identifier(),
            "A.beta()"
        );
        assert_eq!(
            m.find_match(&second, &old_file, &candidates).unwrap().identifier(),
            "A.alpha()"
        );
    }

    #[test]
    fn test_deleted_method_has_no_match() {
        let kept = method("A.kept()", "return 1 ;");
        let removed = method("A.removed()", "foo . bar ( baz ) ;");
        let old_file = vec![kept.clone(), removed.clone()];
        let candidates = vec![method("A.kept()", "return 1 ;")];

        assert!(matcher().find_match(&removed, &old_file, &candidates).is_none());
    }

    #[test]
    fn test_sibling_claims_its_exact_copy() {
        // Both old methods resemble the one candidate; the exact copy wins it
        let exact = method("A.exact()", "a b c d e f");
        let similar = method("A.similar()", "a b c d x y");
        let old_file = vec![exact.clone(), similar.clone()];
        let candidates = vec![method("A.exact()", "a b c d e f"), method("A.other()", "q r s")];

        assert!(matcher().find_match(&similar, &old_file, &candidates).is_none());
    }

    #[test]
    fn test_below_threshold_is_rejected() {
        let old = method("A.run()", "a b c d e f g h");
        let old_file = vec![old.clone(), method("A.other()", "z")];
        let candidates = vec![method("A.run()", "a b x y z w v u")];

        assert!(matcher().find_match(&old, &old_file, &candidates).is_none());
        assert!(
            MethodMatcher::with_threshold(0.2)
                .find_match(&old, &old_file, &candidates)
                .is_some()
        );
    }

    #[test]
    fn test_same_name_breaks_ties() {
        let old = method("A.run()", "a b c");
        let old_file = vec![old.clone(), method("A.other()", "z z z")];
        let candidates = vec![method("A.walk()", "a b c"), method("A.run()", "a b c")];

        let found = matcher().find_match(&old, &old_file, &candidates);
        assert_eq!(found.unwrap().identifier(), "A.run()");
    }

    #[test]
    fn test_degenerate_prefers_identical_identifier() {
        let old = method("A.noop()", "");
        let old_file = vec![old.clone(), method("A.work()", "a b c")];
        let candidates = vec![
            method("A.other()", ""),
            method("A.noop()", ""),
            method("A.work()", "a b c"),
        ];

        let found = matcher().find_match(&old, &old_file, &candidates);
        assert_eq!(found.unwrap().identifier(), "A.noop()");
    }

    #[test]
    fn test_degenerate_unique_candidate() {
        let old = method("A.noop()", "");
        let old_file = vec![old.clone(), method("A.work()", "a b c")];
        let candidates = vec![method("A.idle()", ""), method("A.work()", "a b c")];

        let found = matcher().find_match(&old, &old_file, &candidates);
        assert_eq!(found.unwrap().identifier(), "A.idle()");
    }

    #[test]
    fn test_degenerate_ambiguous_candidates() {
        let old = method("A.noop()", "");
        let old_file = vec![old.clone(), method("A.work()", "a b c")];
        let candidates = vec![method("A.idle()", ""), method("A.rest()", "")];

        assert!(matcher().find_match(&old, &old_file, &candidates).is_none());
    }

    #[test]
    fn test_degenerate_ignores_sibling_identifiers() {
        let old = method("A.getB()", "");
        let old_file = vec![method("A.getA()", ""), old.clone()];
        let candidates = vec![method("A.getA()", ""), method("A.getB2()", "")];

        let found = matcher().find_match(&old, &old_file, &candidates);
        assert_eq!(found.unwrap().identifier(), "A.getB2()");
    }

    #[test]
    fn test_degenerate_never_matches_by_tokens() {
        let old = method("A.noop()", "");
        let old_file = vec![old.clone(), method("A.work()", "a b c")];
        let candidates = vec![method("A.work()", "a b c"), method("A.more()", "d e f")];

        assert!(matcher().find_match(&old, &old_file, &candidates).is_none());
    }

    #[test]
    fn test_empty_candidates() {
        let old = method("A.run()", "a");
        assert!(matcher().find_match(&old, &[], &[]).is_none());
    }

    #[test]
    fn test_old_missing_from_file_list() {
        let old = method("A.run()", "a b c");
        let candidates = vec![method("A.go()", "a b c")];

        let found = matcher().find_match(&old, &[], &candidates);
        assert_eq!(found.unwrap().identifier(), "A.go()");
    }

    #[test]
    fn test_deterministic() {
        let old = method("A.run()", "a b c d");
        let old_file = vec![old.clone(), method("A.x()", "a b c e")];
        let candidates = vec![
            method("A.p()", "a b c d"),
            method("A.q()", "a b c d"),
            method("A.r()", "a b c e"),
        ];

        let m = matcher();
        let first = m.find_match(&old, &old_file, &candidates).map(|c| c.identifier().to_string());
        for _ in 0..10 {
            let again = m.find_match(&old, &old_file, &candidates).map(|c| c.identifier().to_string());
            assert_eq!(again, first);
        }
        assert_eq!(first.as_deref(), Some("A.p()"));
    }

    #[test]
    fn test_find_moved() {
        let old = method("A.moved()", "a b c d");
        let arrived = vec![
            method("B.unrelated()", "x y z"),
            method("B.close()", "a b c x"),
            method("B.moved()", "a b c d"),
        ];

        let (index, score) = matcher().find_moved(&old, &[], &arrived).unwrap();
        assert_eq!(index, 2);
        assert!((score - 1.0).abs() < 1e-9);

        assert!(matcher().find_moved(&method("A.noop()", ""), &[], &arrived).is_none());
        assert!(matcher().find_moved(&old, &[], &arrived[..1]).is_none());
    }

    #[test]
    fn test_lookalike_moves_keep_distinct_destinations() {
        let lines = method("Io.readLines()", "open file read lines close file");
        let bytes = method("Io.readBytes()", "open file read bytes close file");
        let departed = vec![lines.clone(), bytes.clone()];
        let arrived = vec![
            method("Text.read()", "open file read lines close file"),
            method("Bytes.read()", "open file read bytes into buffer close stream"),
        ];

        // Text.read() is the closest arrival for both, but readLines claims it first
        assert!(matcher().similarity(&bytes, &arrived[0]) > matcher().similarity(&bytes, &arrived[1]));

        let (lines_to, _) = matcher().find_moved(&lines, &departed, &arrived).unwrap();
        let (bytes_to, _) = matcher().find_moved(&bytes, &departed, &arrived).unwrap();
        assert_eq!(arrived[lines_to].identifier(), "Text.read()");
        assert_eq!(arrived[bytes_to].identifier(), "Bytes.read()");
    }

    #[test]
    fn test_single_move_needs_threshold() {
        // No one-method shortcut when following moves
        let old = method("A.run()", "a b c d");
        let arrived = vec![method("B.other()", "w x y z")];

        assert!(matcher().find_moved(&old, std::slice::from_ref(&old), &arrived).is_none());
    }
}
