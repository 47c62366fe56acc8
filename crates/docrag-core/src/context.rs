//! Context-window assembly under character budgets.
//!
//! Packs already-ranked chunks into one text block for a downstream
//! generator. Each chunk is prefixed with a `[doc=<id> chunk=<index>]` tag;
//! a fixed overhead per chunk is reserved for that tag when computing the
//! remaining budget.
//!
//! All lengths are counted in characters, not bytes, so truncation never
//! splits a UTF-8 sequence.

use crate::models::RetrievedChunk;

/// Characters reserved per chunk for its source tag.
pub const DEFAULT_TAG_OVERHEAD: usize = 50;

/// Budget settings for [`ContextAssembler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextBudget {
    /// Global budget for the whole block.
    pub max_chars: usize,
    /// Per-chunk cap, applied before the global budget. `0` disables it.
    pub per_chunk_cap: usize,
    /// Characters reserved for each chunk's tag.
    pub tag_overhead: usize,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self {
            max_chars: 4000,
            per_chunk_cap: 1200,
            tag_overhead: DEFAULT_TAG_OVERHEAD,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContextAssembler {
    budget: ContextBudget,
}

impl ContextAssembler {
    pub fn new(budget: ContextBudget) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> ContextBudget {
        self.budget
    }

    /// Assemble with the configured global budget.
    pub fn assemble(&self, chunks: &[RetrievedChunk]) -> String {
        self.assemble_with_limit(chunks, self.budget.max_chars)
    }

    /// Assemble with an explicit global budget, keeping the configured
    /// per-chunk cap and tag overhead.
    ///
    /// Packing stops at the first chunk whose remaining budget (after
    /// reserving the tag overhead) is not positive, even if a later chunk
    /// would be shorter.
    pub fn assemble_with_limit(&self, chunks: &[RetrievedChunk], max_chars: usize) -> String {
        let overhead = self.budget.tag_overhead;
        let mut parts: Vec<String> = Vec::new();
        let mut total: usize = 0;

        for chunk in chunks {
            let text = chunk.text.trim();
            if text.is_empty() {
                continue;
            }

            let used = total.saturating_add(overhead);
            if used >= max_chars {
                break;
            }
            let budget = max_chars - used;

            let mut text = text;
            if self.budget.per_chunk_cap > 0 {
                text = truncate_chars(text, self.budget.per_chunk_cap);
            }
            let text = truncate_chars(text, budget);

            parts.push(format!(
                "[doc={} chunk={}] {}",
                chunk.document_id, chunk.chunk_index, text
            ));
            total = total.saturating_add(text.chars().count() + 1);
        }

        parts.join("\n\n")
    }
}

/// Longest prefix of `s` with at most `max` characters.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retrieved(doc: i64, idx: i64, text: &str) -> RetrievedChunk {
        RetrievedChunk {
            document_id: doc,
            chunk_index: idx,
            text: text.to_string(),
            score: 1.0,
        }
    }

    fn assembler(max_chars: usize, per_chunk_cap: usize) -> ContextAssembler {
        ContextAssembler::new(ContextBudget {
            max_chars,
            per_chunk_cap,
            tag_overhead: DEFAULT_TAG_OVERHEAD,
        })
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(ContextAssembler::default().assemble(&[]), "");
    }

    #[test]
    fn test_blank_chunks_skipped() {
        let chunks = vec![retrieved(1, 0, "   "), retrieved(1, 1, "real text")];
        assert_eq!(
            ContextAssembler::default().assemble(&chunks),
            "[doc=1 chunk=1] real text"
        );
    }

    #[test]
    fn test_only_blank_chunks_gives_empty_string() {
        let chunks = vec![retrieved(1, 0, ""), retrieved(1, 1, "\n\t")];
        assert_eq!(ContextAssembler::default().assemble(&chunks), "");
    }

    #[test]
    fn test_global_budget_stops_after_first_chunk() {
        let text = "x".repeat(80);
        let chunks = vec![
            retrieved(1, 0, &text),
            retrieved(1, 1, &text),
            retrieved(1, 2, &text),
        ];
        let out = assembler(100, 1000).assemble(&chunks);
        assert_eq!(out.matches("[doc=").count(), 1);
        // First chunk truncated to 100 - 0 - 50 = 50 chars
        assert_eq!(out, format!("[doc=1 chunk=0] {}", "x".repeat(50)));
        let tag_len = "[doc=1 chunk=0] ".len();
        assert!(out.chars().count() <= 100 + tag_len);
    }

    #[test]
    fn test_per_chunk_cap_applied_first() {
        let chunks = vec![retrieved(7, 3, &"y".repeat(2000))];
        let out = assembler(5000, 1200).assemble(&chunks);
        let body = out.strip_prefix("[doc=7 chunk=3] ").unwrap();
        assert_eq!(body.chars().count(), 1200);
    }

    #[test]
    fn test_cap_disabled_when_zero() {
        let chunks = vec![retrieved(1, 0, &"z".repeat(2000))];
        let out = assembler(5000, 0).assemble(&chunks);
        let body = out.strip_prefix("[doc=1 chunk=0] ").unwrap();
        assert_eq!(body.chars().count(), 2000);
    }

    #[test]
    fn test_chunks_joined_by_blank_line() {
        let chunks = vec![retrieved(1, 0, "first"), retrieved(2, 5, "second")];
        let out = ContextAssembler::default().assemble(&chunks);
        assert_eq!(out, "[doc=1 chunk=0] first\n\n[doc=2 chunk=5] second");
    }

    #[test]
    fn test_running_total_counts_separator() {
        // After a 49-char chunk the total is 50; the next budget is 200 - 50 - 50 = 100.
        let chunks = vec![
            retrieved(1, 0, &"a".repeat(49)),
            retrieved(1, 1, &"b".repeat(150)),
        ];
        let out = assembler(200, 0).assemble_with_limit(&chunks, 200);
        let second = out.split("\n\n").nth(1).unwrap();
        let body = second.strip_prefix("[doc=1 chunk=1] ").unwrap();
        assert_eq!(body.len(), 100);
    }

    #[test]
    fn test_explicit_limit_overrides_configured() {
        let chunks = vec![retrieved(1, 0, &"c".repeat(500))];
        let out = ContextAssembler::default().assemble_with_limit(&chunks, 60);
        assert_eq!(out, format!("[doc=1 chunk=0] {}", "c".repeat(10)));
    }

    #[test]
    fn test_huge_limit_is_unbounded() {
        let chunks = vec![retrieved(1, 0, "alpha"), retrieved(2, 0, "beta")];
        let expected = "[doc=1 chunk=0] alpha\n\n[doc=2 chunk=0] beta";
        let a = ContextAssembler::default();
        assert_eq!(a.assemble_with_limit(&chunks, usize::MAX), expected);
        assert_eq!(a.assemble_with_limit(&chunks, i64::MAX as usize + 1), expected);
    }

    #[test]
    fn test_huge_overhead_does_not_wrap() {
        let a = ContextAssembler::new(ContextBudget {
            max_chars: 4000,
            per_chunk_cap: 0,
            tag_overhead: usize::MAX,
        });
        assert_eq!(a.assemble(&[retrieved(1, 0, "text")]), "");
    }

    #[test]
    fn test_budget_below_overhead_gives_empty() {
        let chunks = vec![retrieved(1, 0, "anything")];
        assert_eq!(assembler(50, 1200).assemble(&chunks), "");
    }

    #[test]
    fn test_multibyte_truncation() {
        let chunks = vec![retrieved(1, 0, &"ñ".repeat(100))];
        let out = assembler(60, 0).assemble(&chunks);
        let body = out.strip_prefix("[doc=1 chunk=0] ").unwrap();
        assert_eq!(body.chars().count(), 10);
    }

    #[test]
    fn test_never_exceeds_budget_plus_overhead() {
        let chunks: Vec<RetrievedChunk> = (0..20)
            .map(|i| retrieved(1, i, &"w ".repeat(300)))
            .collect();
        let out = assembler(1000, 400).assemble(&chunks);
        let n_chunks = out.matches("[doc=").count();
        assert!(out.chars().count() <= 1000 + n_chunks * DEFAULT_TAG_OVERHEAD);
    }
}
