//! Quality gate heuristics.
//!
//! Evaluator replies are free text with no contractual structure, so a gate
//! reduces them to a binary verdict by plain substring inspection:
//! - Script gate: a literal `Score: N` marker with N in 1..=7 means rework
//! - Media gates: the keyword `suggest` in any letter case means rework
//!
//! Both heuristics are crude on purpose. They mirror what the evaluator
//! prompts ask for and nothing more.

/// Outcome of a quality gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Artifact accepted; move forward
    Pass,

    /// Artifact rejected; loop back
    NeedsRework,
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// Strategy that turns evaluator text into a verdict
pub trait QualityGate: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Inspect evaluator output
    fn verdict(&self, response: &str) -> Verdict;
}

/// Rejects text carrying an explicit low-score marker
#[derive(Debug, Clone)]
pub struct ScoreGate {
    /// Literal marker preceding the score digits
    pub marker: String,

    /// Highest score that still needs rework
    pub max_failing_score: u32,
}

impl Default for ScoreGate {
    fn default() -> Self {
        Self {
            marker: "Score: ".to_string(),
            max_failing_score: 7,
        }
    }
}

impl ScoreGate {
    /// Scores found after every occurrence of the marker.
    ///
    /// Only the digit run directly after the marker counts, so `Score: 10`
    /// reads as 10 rather than matching a `Score: 1` prefix.
    pub fn scores(&self, response: &str) -> Vec<u32> {
        response
            .match_indices(self.marker.as_str())
            .filter_map(|(idx, _)| {
                let rest = &response[idx + self.marker.len()..];
                let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse().ok()
            })
            .collect()
    }
}

impl QualityGate for ScoreGate {
    fn name(&self) -> &str {
        "score"
    }

    fn verdict(&self, response: &str) -> Verdict {
        let low = self
            .scores(response)
            .into_iter()
            .any(|score| (1..=self.max_failing_score).contains(&score));

        if low {
            Verdict::NeedsRework
        } else {
            Verdict::Pass
        }
    }
}

/// Rejects text that mentions a keyword, ignoring case
#[derive(Debug, Clone)]
pub struct KeywordGate {
    pub keyword: String,
}

impl Default for KeywordGate {
    fn default() -> Self {
        Self {
            keyword: "suggest".to_string(),
        }
    }
}

impl QualityGate for KeywordGate {
    fn name(&self) -> &str {
        "keyword"
    }

    fn verdict(&self, response: &str) -> Verdict {
        if response
            .to_lowercase()
            .contains(&self.keyword.to_lowercase())
        {
            Verdict::NeedsRework
        } else {
            Verdict::Pass
        }
    }
}

/// Which gate to apply, for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateKind {
    Script,
    Media,
}

impl GateKind {
    pub fn build(self) -> Box<dyn QualityGate> {
        match self {
            GateKind::Script => Box::new(ScoreGate::default()),
            GateKind::Media => Box::new(KeywordGate::default()),
        }
    }
}
