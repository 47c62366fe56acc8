//! Lexical ranking with Okapi BM25.
//!
//! The ranking model is built from scratch over exactly the candidate set
//! handed to [`Ranker::rank`] (the whole corpus, or one document's chunks when
//! retrieval is scoped). Scores are therefore only comparable within a single
//! call.
//!
//! # Scoring
//!
//! For a query term `q` and a chunk `D`:
//!
//! ```text
//! idf(q)      = ln(N - n(q) + 0.5) - ln(n(q) + 0.5)
//! score(D, q) = idf(q) · f(q, D) · (k1 + 1) / (f(q, D) + k1 · (1 - b + b · |D| / avgdl))
//! ```
//!
//! Terms that appear in more than half the chunks get a negative idf; those
//! are replaced by `epsilon × mean(idf)` so common words still contribute a
//! small positive amount. Repeated query terms are counted once per
//! occurrence.
//!
//! # Ordering
//!
//! Results are sorted by descending score with a stable sort, so chunks with
//! equal scores keep their candidate order. Nothing is filtered by relevance:
//! `top_k` is the only truncation.

use std::collections::HashMap;

use crate::models::{RetrievedChunk, StoredChunk};
use crate::text::tokenize;

/// BM25 tuning parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
    pub epsilon: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: 1.5,
            b: 0.75,
            epsilon: 0.25,
        }
    }
}

/// A BM25 model over a fixed, tokenized corpus.
#[derive(Debug, Clone)]
pub struct Bm25 {
    params: Bm25Params,
    doc_freqs: Vec<HashMap<String, usize>>,
    doc_lens: Vec<usize>,
    avgdl: f64,
    idf: HashMap<String, f64>,
}

impl Bm25 {
    pub fn new(corpus: &[Vec<String>], params: Bm25Params) -> Self {
        let mut doc_freqs = Vec::with_capacity(corpus.len());
        let mut doc_lens = Vec::with_capacity(corpus.len());
        let mut containing: HashMap<String, usize> = HashMap::new();
        // Terms in first-seen order; the idf mean is summed in this order so
        // rebuilding over the same corpus gives bit-identical scores.
        let mut terms: Vec<String> = Vec::new();
        let mut total_len = 0usize;

        for doc in corpus {
            let mut freqs: HashMap<String, usize> = HashMap::new();
            for token in doc {
                let count = freqs.entry(token.clone()).or_insert(0);
                *count += 1;
                if *count > 1 {
                    continue;
                }
                let df = containing.entry(token.clone()).or_insert(0);
                if *df == 0 {
                    terms.push(token.clone());
                }
                *df += 1;
            }
            total_len += doc.len();
            doc_lens.push(doc.len());
            doc_freqs.push(freqs);
        }

        let n = corpus.len() as f64;
        let avgdl = if corpus.is_empty() {
            0.0
        } else {
            total_len as f64 / n
        };

        let mut idf: HashMap<String, f64> = HashMap::with_capacity(terms.len());
        let mut idf_sum = 0.0;
        let mut negative: Vec<String> = Vec::new();
        for term in terms {
            let df = containing[&term] as f64;
            let value = (n - df + 0.5).ln() - (df + 0.5).ln();
            idf_sum += value;
            if value < 0.0 {
                negative.push(term.clone());
            }
            idf.insert(term, value);
        }

        if !idf.is_empty() {
            let floor = params.epsilon * (idf_sum / idf.len() as f64);
            for term in negative {
                idf.insert(term, floor);
            }
        }

        Self {
            params,
            doc_freqs,
            doc_lens,
            avgdl,
            idf,
        }
    }

    /// Number of chunks in the model.
    pub fn len(&self) -> usize {
        self.doc_lens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_lens.is_empty()
    }

    /// Inverse document frequency of `term`, or 0 if it never occurs.
    pub fn idf(&self, term: &str) -> f64 {
        self.idf.get(term).copied().unwrap_or(0.0)
    }

    /// Score every corpus entry against the query terms, in corpus order.
    pub fn scores(&self, query: &[String]) -> Vec<f64> {
        let Bm25Params { k1, b, .. } = self.params;
        let mut scores = vec![0.0; self.len()];

        for term in query {
            let idf = self.idf(term);
            if idf == 0.0 {
                continue;
            }
            for (i, freqs) in self.doc_freqs.iter().enumerate() {
                let tf = freqs.get(term).copied().unwrap_or(0) as f64;
                if tf == 0.0 {
                    continue;
                }
                let len_ratio = if self.avgdl > 0.0 {
                    self.doc_lens[i] as f64 / self.avgdl
                } else {
                    0.0
                };
                scores[i] += idf * (tf * (k1 + 1.0)) / (tf + k1 * (1.0 - b + b * len_ratio));
            }
        }

        scores
    }
}

/// Scores and orders candidate chunks for a query.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ranker {
    params: Bm25Params,
}

impl Ranker {
    pub fn new(params: Bm25Params) -> Self {
        Self { params }
    }

    /// Rank `candidates` against `query` and keep at most `top_k`.
    ///
    /// Empty candidates or `top_k <= 0` give an empty result. A query with
    /// no word characters is still scored (every chunk gets 0).
    pub fn rank(&self, query: &str, candidates: Vec<StoredChunk>, top_k: i64) -> Vec<RetrievedChunk> {
        if candidates.is_empty() || top_k <= 0 {
            return Vec::new();
        }

        let corpus: Vec<Vec<String>> = candidates.iter().map(|c| tokenize(&c.text)).collect();
        let model = Bm25::new(&corpus, self.params);
        let scores = model.scores(&tokenize(query));

        let mut ranked: Vec<RetrievedChunk> = candidates
            .into_iter()
            .zip(scores)
            .map(|(chunk, score)| RetrievedChunk::from_stored(chunk, score))
            .collect();

        // sort_by is stable: equal scores keep candidate order
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(top_k as usize);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(doc: i64, idx: i64, text: &str) -> StoredChunk {
        StoredChunk {
            document_id: doc,
            chunk_index: idx,
            text: text.to_string(),
        }
    }

    fn toks(s: &str) -> Vec<String> {
        tokenize(s)
    }

    #[test]
    fn test_idf_rare_term_positive() {
        let corpus = vec![toks("apple banana"), toks("cherry date"), toks("elder fig")];
        let model = Bm25::new(&corpus, Bm25Params::default());
        // ln(3 - 1 + 0.5) - ln(1 + 0.5)
        let expected = 2.5f64.ln() - 1.5f64.ln();
        assert!((model.idf("apple") - expected).abs() < 1e-12);
        assert_eq!(model.idf("missing"), 0.0);
    }

    #[test]
    fn test_negative_idf_replaced_by_epsilon_floor() {
        // "common" appears in 2 of 3 chunks → raw idf is negative
        let corpus = vec![toks("common x"), toks("common y"), toks("z w")];
        let model = Bm25::new(&corpus, Bm25Params::default());
        let rare = 2.5f64.ln() - 1.5f64.ln();
        let raw_common = 1.5f64.ln() - 2.5f64.ln();
        let mean = (raw_common + 4.0 * rare) / 5.0;
        assert!((model.idf("common") - 0.25 * mean).abs() < 1e-12);
        assert!(model.idf("common") > 0.0);
    }

    #[test]
    fn test_scores_known_value() {
        let corpus = vec![toks("apple banana"), toks("cherry date"), toks("elder fig")];
        let model = Bm25::new(&corpus, Bm25Params::default());
        let scores = model.scores(&toks("apple"));
        // tf = 1, |D| = avgdl → denominator = 1 + k1
        let idf = 2.5f64.ln() - 1.5f64.ln();
        assert!((scores[0] - idf).abs() < 1e-12);
        assert_eq!(scores[1], 0.0);
        assert_eq!(scores[2], 0.0);
    }

    #[test]
    fn test_repeated_query_terms_count_twice() {
        let corpus = vec![toks("apple banana"), toks("cherry date"), toks("elder fig")];
        let model = Bm25::new(&corpus, Bm25Params::default());
        let once = model.scores(&toks("apple"))[0];
        let twice = model.scores(&toks("apple apple"))[0];
        assert!((twice - 2.0 * once).abs() < 1e-12);
    }

    #[test]
    fn test_rebuilds_give_identical_scores() {
        let corpus: Vec<Vec<String>> = (0..40)
            .map(|i| {
                tokenize(&format!(
                    "chunk {} shares common words plus term{} and term{} rare{}",
                    i,
                    i % 7,
                    i % 11,
                    i
                ))
            })
            .collect();
        let query = tokenize("common term3 term5 rare17 words");
        let first: Vec<u64> = Bm25::new(&corpus, Bm25Params::default())
            .scores(&query)
            .iter()
            .map(|s| s.to_bits())
            .collect();
        for _ in 0..50 {
            let again: Vec<u64> = Bm25::new(&corpus, Bm25Params::default())
                .scores(&query)
                .iter()
                .map(|s| s.to_bits())
                .collect();
            assert_eq!(again, first);
        }
    }

    #[test]
    fn test_empty_corpus_model() {
        let model = Bm25::new(&[], Bm25Params::default());
        assert!(model.is_empty());
        assert!(model.scores(&toks("anything")).is_empty());
    }

    #[test]
    fn test_rank_full_half_none() {
        let ranker = Ranker::default();
        let candidates = vec![
            chunk(1, 0, "alpha only here"),
            chunk(1, 1, "alpha beta both terms"),
            chunk(1, 2, "gamma nothing relevant"),
        ];
        let ranked = ranker.rank("alpha beta", candidates, 10);
        let order: Vec<i64> = ranked.iter().map(|r| r.chunk_index).collect();
        assert_eq!(order, vec![1, 0, 2]);
        assert!(ranked[2].score <= ranked[1].score);
        assert_eq!(ranked[2].score, 0.0);
    }

    #[test]
    fn test_rank_ties_keep_candidate_order() {
        let ranker = Ranker::default();
        let candidates = vec![
            chunk(1, 0, "zeta one"),
            chunk(2, 0, "needle here"),
            chunk(3, 0, "zeta two"),
            chunk(4, 0, "needle here"),
            chunk(5, 0, "zeta three"),
        ];
        let ranked = ranker.rank("needle", candidates, 10);
        let order: Vec<i64> = ranked.iter().map(|r| r.document_id).collect();
        assert_eq!(order, vec![2, 4, 1, 3, 5]);
        assert_eq!(ranked[0].score, ranked[1].score);
    }

    #[test]
    fn test_rank_truncates_to_top_k() {
        let ranker = Ranker::default();
        let candidates = (0..10).map(|i| chunk(1, i, "same text")).collect();
        assert_eq!(ranker.rank("text", candidates, 3).len(), 3);
    }

    #[test]
    fn test_rank_empty_candidates() {
        assert!(Ranker::default().rank("query", Vec::new(), 8).is_empty());
    }

    #[test]
    fn test_rank_non_positive_top_k() {
        let candidates = vec![chunk(1, 0, "alpha")];
        assert!(Ranker::default().rank("alpha", candidates.clone(), 0).is_empty());
        assert!(Ranker::default().rank("alpha", candidates, -3).is_empty());
    }

    #[test]
    fn test_rank_query_without_terms() {
        let candidates = vec![chunk(1, 0, "alpha"), chunk(1, 1, "beta")];
        let ranked = Ranker::default().rank("?!", candidates, 8);
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|r| r.score == 0.0));
        assert_eq!(ranked[0].chunk_index, 0);
    }

    #[test]
    fn test_rank_is_case_insensitive() {
        let candidates = vec![
            chunk(1, 0, "nothing"),
            chunk(1, 1, "DEPLOYMENT Guide"),
            chunk(1, 2, "unrelated"),
        ];
        let ranked = Ranker::default().rank("deployment", candidates, 1);
        assert_eq!(ranked[0].chunk_index, 1);
    }
}
