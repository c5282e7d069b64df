//! Window identity matching.
//!
//! A window captured earlier has no stable OS-independent key, so at restore
//! time it has to be re-located among the live windows using fuzzy signals.
//! Scoring is pluggable through [`WindowScorer`]; the default
//! [`TitleHeuristicScorer`] adds up three signals:
//!
//! 1. **Title** (first applicable rule wins):
//!    exact (case-sensitive or not) → `exact_title_score`;
//!    substring either way (case-insensitive) → `partial_title_score`;
//!    character-set Jaccard similarity > 0.70 → `partial_title_score × sim`;
//!    whitespace-token overlap → `common × partial_title_score / target_tokens`,
//!    where `common` counts candidate tokens (repeats included) found in the target.
//! 2. **Application**: identical `app_name` → `same_app_score`.
//! 3. **Size**: width and height within 10% of the target's → `same_size_score`.
//!
//! A candidate scoring below `minimum_score` is never returned.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::Window;

const JACCARD_THRESHOLD: f64 = 0.70;
const SIZE_TOLERANCE: f64 = 0.10;

/// Scoring weights and the acceptance threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub exact_title_score: i32,
    pub partial_title_score: i32,
    pub same_app_score: i32,
    pub same_size_score: i32,
    pub minimum_score: i32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            exact_title_score: 100,
            partial_title_score: 50,
            same_app_score: 50,
            same_size_score: 10,
            minimum_score: 60,
        }
    }
}

/// A similarity strategy between a captured window and a live one.
///
/// Implementations must be deterministic: the same pair always yields the
/// same score.
pub trait WindowScorer: Send + Sync {
    fn score(&self, target: &Window, candidate: &Window) -> i32;
}

/// The default title/application/size heuristic.
#[derive(Debug, Clone, Default)]
pub struct TitleHeuristicScorer {
    config: MatchConfig,
}

impl TitleHeuristicScorer {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    fn title_score(&self, target: &str, candidate: &str) -> i32 {
        if target == candidate {
            return self.config.exact_title_score;
        }

        let target_lower = target.to_lowercase();
        let candidate_lower = candidate.to_lowercase();

        if target_lower == candidate_lower {
            return self.config.exact_title_score;
        }

        // An empty target is a substring of everything, so it skips this rule.
        // An empty candidate is still a substring of a non-empty target.
        if !target_lower.is_empty()
            && (candidate_lower.contains(&target_lower) || target_lower.contains(&candidate_lower))
        {
            return self.config.partial_title_score;
        }

        let similarity = char_jaccard(&target_lower, &candidate_lower);
        if similarity > JACCARD_THRESHOLD {
            return (f64::from(self.config.partial_title_score) * similarity).floor() as i32;
        }

        let target_tokens: HashSet<String> = target
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();
        if target_tokens.is_empty() {
            return 0;
        }
        // Both counts include repeats: "a - b - c" has five tokens, and each
        // "-" in the candidate counts once per occurrence.
        let target_token_count = target.split_whitespace().count() as i32;
        let common = candidate
            .split_whitespace()
            .filter(|t| target_tokens.contains(&t.to_lowercase()))
            .count() as i32;

        common * self.config.partial_title_score / target_token_count
    }
}

impl WindowScorer for TitleHeuristicScorer {
    fn score(&self, target: &Window, candidate: &Window) -> i32 {
        let mut score = self.title_score(&target.title, &candidate.title);

        if target.app_name == candidate.app_name {
            score += self.config.same_app_score;
        }

        if similar_size(target, candidate) {
            score += self.config.same_size_score;
        }

        score
    }
}

/// Jaccard similarity of the distinct-character sets of two strings.
fn char_jaccard(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let set_a: HashSet<char> = a.chars().collect();
    let set_b: HashSet<char> = b.chars().collect();
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.len() + set_b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// Relative difference of one dimension against the target's; a zero-sized
/// target dimension only matches another zero.
fn within_tolerance(target: u32, candidate: u32) -> bool {
    if target == 0 {
        return candidate == 0;
    }
    let diff = (f64::from(target) - f64::from(candidate)).abs();
    diff / f64::from(target) <= SIZE_TOLERANCE
}

fn similar_size(target: &Window, candidate: &Window) -> bool {
    within_tolerance(target.width, candidate.width)
        && within_tolerance(target.height, candidate.height)
}

/// The engine's verdict for one target window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub window: Window,
    pub score: i32,
}

/// Resolves captured windows against a pool of live candidates.
///
/// Stateless between calls; one instance can serve any number of
/// restore/validate operations.
pub struct WindowMatcher {
    scorer: Box<dyn WindowScorer>,
    minimum_score: i32,
}

impl WindowMatcher {
    /// Matcher using [`TitleHeuristicScorer`] with the given weights.
    pub fn new(config: MatchConfig) -> Self {
        Self {
            scorer: Box::new(TitleHeuristicScorer::new(config)),
            minimum_score: config.minimum_score,
        }
    }

    /// Matcher using a custom scoring strategy.
    pub fn with_scorer(scorer: Box<dyn WindowScorer>, minimum_score: i32) -> Self {
        Self {
            scorer,
            minimum_score,
        }
    }

    pub fn minimum_score(&self) -> i32 {
        self.minimum_score
    }

    pub fn score(&self, target: &Window, candidate: &Window) -> i32 {
        self.scorer.score(target, candidate)
    }

    /// Highest-scoring candidate at or above the threshold.
    ///
    /// Ties keep the first candidate seen, so callers must pass candidates in
    /// a stable order for deterministic results.
    pub fn find_best_match(&self, target: &Window, candidates: &[Window]) -> Option<MatchResult> {
        let mut best: Option<(usize, i32)> = None;

        for (idx, candidate) in candidates.iter().enumerate() {
            let score = self.scorer.score(target, candidate);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((idx, score)),
            }
        }

        best.filter(|(_, score)| *score >= self.minimum_score)
            .map(|(idx, score)| MatchResult {
                window: candidates[idx].clone(),
                score,
            })
    }

    /// Greedy one-to-one assignment, keyed by target title.
    ///
    /// Targets are processed in the order given; each takes its best match
    /// from the candidates still available, and every candidate sharing the
    /// winner's identity (title + application + width) leaves the pool.
    /// Assignment quality therefore depends on target order: an early target
    /// can claim a window a later one would have scored higher on. Targets
    /// sharing a title collapse onto the last one matched.
    pub fn match_all(&self, targets: &[Window], candidates: &[Window]) -> HashMap<String, MatchResult> {
        let mut available: Vec<Window> = candidates.to_vec();
        let mut results = HashMap::new();

        for target in targets {
            if let Some(found) = self.find_best_match(target, &available) {
                available.retain(|w| !w.same_identity(&found.window));
                results.insert(target.title.clone(), found);
            }
        }

        results
    }
}

impl Default for WindowMatcher {
    fn default() -> Self {
        Self::new(MatchConfig::default())
    }
}
