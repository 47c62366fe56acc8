//! PDF text extraction with ordered fallback strategies.
//!
//! An [`Extractor`] holds a list of [`PageExtractor`] strategies and returns
//! the first one whose normalized output is non-empty:
//!
//! 1. [`LopdfPages`]: structured page-by-page extraction with `lopdf`.
//! 2. [`PdfExtractPages`]: the `pdf-extract` text layout engine.
//! 3. [`TesseractOcr`]: rasterize pages with `pdftoppm` and recognize them
//!    with `tesseract` (only when OCR is enabled).
//!
//! Failures never escape: a page that fails contributes an empty string,
//! a strategy that fails (or panics) contributes nothing, and when every
//! strategy comes back empty the result is `""`. Callers treat that as a
//! document with no retrievable content, not as an error.

mod ocr;
mod pdf;

use std::panic::{catch_unwind, AssertUnwindSafe};

use docrag_core::text::normalize_whitespace;

use crate::config::OcrConfig;

pub use ocr::TesseractOcr;
pub use pdf::{LopdfPages, PdfExtractPages};

/// A strategy-level extraction failure. Always recovered by [`Extractor`].
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("PDF parse failed: {0}")]
    Parse(String),
    #[error("{0} panicked")]
    Panic(&'static str),
    #[error("{tool} failed: {message}")]
    Tool { tool: String, message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One way of turning PDF bytes into per-page text.
pub trait PageExtractor: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Text of every page, in page order.
    ///
    /// Implementations swallow per-page failures and return an empty string
    /// for that page. An `Err` means the strategy could not run at all.
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractError>;
}

/// Result of running the strategy chain.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extraction {
    /// Normalized text; empty when no strategy produced anything.
    pub text: String,
    /// Name of the strategy that produced `text`.
    pub strategy: Option<&'static str>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Ordered chain of extraction strategies.
pub struct Extractor {
    strategies: Vec<Box<dyn PageExtractor>>,
}

impl Extractor {
    pub fn new(strategies: Vec<Box<dyn PageExtractor>>) -> Self {
        Self { strategies }
    }

    /// The default chain: lopdf, pdf-extract, then OCR when enabled.
    pub fn from_config(ocr: &OcrConfig) -> Self {
        let mut strategies: Vec<Box<dyn PageExtractor>> =
            vec![Box::new(LopdfPages), Box::new(PdfExtractPages::new())];
        if ocr.enabled {
            strategies.push(Box::new(TesseractOcr::from_config(ocr)));
        }
        Self::new(strategies)
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run strategies in order and return the first non-empty normalized text.
    pub fn extract(&self, bytes: &[u8]) -> Extraction {
        for strategy in &self.strategies {
            let name = strategy.name();
            let outcome = catch_unwind(AssertUnwindSafe(|| strategy.extract_pages(bytes)))
                .unwrap_or(Err(ExtractError::Panic(name)));

            match outcome {
                Ok(pages) => {
                    let text = join_pages(&pages);
                    if !text.is_empty() {
                        tracing::info!(
                            strategy = name,
                            pages = pages.len(),
                            chars = text.len(),
                            "text extracted"
                        );
                        return Extraction {
                            text,
                            strategy: Some(name),
                        };
                    }
                    tracing::debug!(strategy = name, pages = pages.len(), "strategy produced no text");
                }
                Err(e) => {
                    tracing::debug!(strategy = name, error = %e, "strategy failed");
                }
            }
        }

        tracing::warn!(
            strategies = ?self.strategy_names(),
            "no strategy produced text; the document may be scanned or protected"
        );
        Extraction::default()
    }
}

/// Concatenate pages in order, newline-separated, then normalize.
fn join_pages(pages: &[String]) -> String {
    normalize_whitespace(&pages.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Stub strategy returning canned pages and counting its calls.
    struct Canned {
        name: &'static str,
        result: fn() -> Result<Vec<String>, ExtractError>,
        calls: Arc<AtomicUsize>,
    }

    impl PageExtractor for Canned {
        fn name(&self) -> &'static str {
            self.name
        }

        fn extract_pages(&self, _bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    struct Panics;

    impl PageExtractor for Panics {
        fn name(&self) -> &'static str {
            "panics"
        }

        fn extract_pages(&self, _bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
            panic!("broken font table");
        }
    }

    fn canned(
        name: &'static str,
        result: fn() -> Result<Vec<String>, ExtractError>,
    ) -> (Box<dyn PageExtractor>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let strategy = Canned {
            name,
            result,
            calls: Arc::clone(&calls),
        };
        (Box::new(strategy), calls)
    }

    fn fails() -> Result<Vec<String>, ExtractError> {
        Err(ExtractError::Parse("bad xref".to_string()))
    }

    fn blank_pages() -> Result<Vec<String>, ExtractError> {
        Ok(vec!["  ".to_string(), "\n".to_string()])
    }

    fn ocr_pages() -> Result<Vec<String>, ExtractError> {
        Ok(vec![
            "Texto  escaneado\n".to_string(),
            String::new(),
            "segunda\tpágina".to_string(),
        ])
    }

    fn good_pages() -> Result<Vec<String>, ExtractError> {
        Ok(vec!["first page".to_string()])
    }

    #[test]
    fn test_first_non_empty_strategy_wins() {
        let (a, a_calls) = canned("primary", good_pages);
        let (b, b_calls) = canned("secondary", ocr_pages);
        let extraction = Extractor::new(vec![a, b]).extract(b"%PDF");
        assert_eq!(extraction.text, "first page");
        assert_eq!(extraction.strategy, Some("primary"));
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_falls_back_to_ocr() {
        let (a, _) = canned("lopdf", fails);
        let (b, _) = canned("pdf-extract", blank_pages);
        let (c, _) = canned("ocr", ocr_pages);
        let extraction = Extractor::new(vec![a, b, c]).extract(b"%PDF");
        assert_eq!(extraction.text, "Texto escaneado segunda página");
        assert_eq!(extraction.strategy, Some("ocr"));
    }

    #[test]
    fn test_all_strategies_empty() {
        let (a, _) = canned("lopdf", fails);
        let (b, _) = canned("pdf-extract", blank_pages);
        let (c, _) = canned("ocr", fails);
        let extraction = Extractor::new(vec![a, b, c]).extract(b"garbage");
        assert!(extraction.is_empty());
        assert_eq!(extraction.text, "");
        assert!(extraction.strategy.is_none());
    }

    #[test]
    fn test_panicking_strategy_is_skipped() {
        let (b, _) = canned("fallback", good_pages);
        let extraction = Extractor::new(vec![Box::new(Panics), b]).extract(b"%PDF");
        assert_eq!(extraction.strategy, Some("fallback"));
    }

    #[test]
    fn test_no_strategies() {
        assert!(Extractor::new(Vec::new()).extract(b"%PDF").is_empty());
    }

    #[test]
    fn test_default_chain_order() {
        let mut ocr = OcrConfig::default();
        assert_eq!(
            Extractor::from_config(&ocr).strategy_names(),
            vec!["lopdf", "pdf-extract", "ocr"]
        );
        ocr.enabled = false;
        assert_eq!(
            Extractor::from_config(&ocr).strategy_names(),
            vec!["lopdf", "pdf-extract"]
        );
    }

    #[test]
    fn test_unparseable_bytes_without_ocr() {
        let mut ocr = OcrConfig::default();
        ocr.enabled = false;
        let extraction = Extractor::from_config(&ocr).extract(b"definitely not a pdf");
        assert!(extraction.is_empty());
    }
}
