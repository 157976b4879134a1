//! Linear-scan cosine ranker
//!
//! Scores every candidate against the query and keeps the best `top_n`.
//! Sorting is stable, so equal scores keep their scan order and the output is
//! fully deterministic for a given input.

use reframe_core::{Error, Example, ExamplePair, RetrievalConfig, RetrievalResult, Result, Vector};
use std::cmp::Ordering;

/// Rank `candidates` by cosine similarity to `query`.
///
/// Fails with `DimensionMismatch` when a candidate's embedding length differs
/// from the query's, or when `top_n` is zero. Returns at
/// most `top_n` results; an empty candidate set gives an empty result.
pub fn rank<I>(query: &Vector, candidates: I, top_n: usize) -> Result<RetrievalResult>
where
    I: IntoIterator<Item = Example>,
{
    try_rank(query, candidates.into_iter().map(Ok), top_n)
}

/// Like [`rank`], over a fallible candidate stream such as a store scan.
///
/// The first candidate error aborts the ranking.
pub fn try_rank<I>(query: &Vector, candidates: I, top_n: usize) -> Result<RetrievalResult>
where
    I: IntoIterator<Item = Result<Example>>,
{
    // a zero-sized request is a precondition failure like a length mismatch
    if top_n == 0 {
        return Err(Error::DimensionMismatch {
            expected: 1,
            actual: 0,
        });
    }

    let mut scored: Vec<(ExamplePair, f32)> = Vec::new();
    for candidate in candidates {
        let candidate = candidate?;
        if candidate.embedding.dim() != query.dim() {
            return Err(Error::DimensionMismatch {
                expected: query.dim(),
                actual: candidate.embedding.dim(),
            });
        }
        let score = query.cosine_similarity(&candidate.embedding);
        scored.push((candidate.into_pair(), score));
    }

    // stable: ties keep scan order
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(top_n);

    let (examples, scores) = scored.into_iter().unzip();
    Ok(RetrievalResult { examples, scores })
}

/// Ranker bound to a retrieval configuration
#[derive(Debug, Clone)]
pub struct Ranker {
    config: RetrievalConfig,
}

impl Ranker {
    pub fn new(config: RetrievalConfig) -> Self {
        Self { config }
    }

    pub fn top_n(&self) -> usize {
        self.config.top_n
    }

    /// Rank a store scan with the configured `top_n`
    pub fn rank_scan<I>(&self, query: &Vector, candidates: I) -> Result<RetrievalResult>
    where
        I: IntoIterator<Item = Result<Example>>,
    {
        try_rank(query, candidates, self.config.top_n)
    }
}
