//! Rank titles derived from a bake score.

use thiserror::Error;

/// Errors raised when building a custom [`RankTable`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RankTableError {
    #[error("rank table is empty")]
    Empty,

    #[error("rank table has no floor entry at threshold 0")]
    MissingFloor,

    #[error("rank thresholds must be strictly ascending (found {previous} before {next})")]
    NotAscending { previous: u64, next: u64 },
}

/// One title and the score at which it unlocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankEntry {
    pub threshold: u64,
    pub title: String,
}

const DEFAULT_RANKS: [(u64, &str); 9] = [
    (0, "Floury Beginner"),
    (20, "Amateur Baker"),
    (100, "Pastry Apprentice"),
    (300, "Dough Master"),
    (700, "Dessert Virtuoso"),
    (1400, "Oven Overlord"),
    (3000, "Legendary Patissier"),
    (6000, "Yeast Beast"),
    (12000, "Celestial Confectioner"),
];

/// Ordered, immutable threshold table.
#[derive(Debug, Clone)]
pub struct RankTable {
    entries: Vec<RankEntry>,
}

impl RankTable {
    /// Build a table, checking that thresholds ascend and start at 0.
    pub fn new(entries: Vec<RankEntry>) -> Result<Self, RankTableError> {
        let first = entries.first().ok_or(RankTableError::Empty)?;
        if first.threshold != 0 {
            return Err(RankTableError::MissingFloor);
        }
        for pair in entries.windows(2) {
            if pair[0].threshold >= pair[1].threshold {
                return Err(RankTableError::NotAscending {
                    previous: pair[0].threshold,
                    next: pair[1].threshold,
                });
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[RankEntry] {
        &self.entries
    }

    /// Title of the highest threshold not exceeding `score`.
    pub fn title_for(&self, score: u64) -> &str {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.threshold <= score)
            .or_else(|| self.entries.first())
            .map(|entry| entry.title.as_str())
            .unwrap_or_default()
    }

    /// Score at which the next title unlocks, or `None` at the top rank.
    pub fn next_threshold(&self, score: u64) -> Option<u64> {
        self.entries
            .iter()
            .map(|entry| entry.threshold)
            .find(|threshold| *threshold > score)
    }
}

impl Default for RankTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_RANKS
                .iter()
                .map(|(threshold, title)| RankEntry {
                    threshold: *threshold,
                    title: (*title).to_string(),
                })
                .collect(),
        }
    }
}
