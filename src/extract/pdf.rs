//! Text-layer strategies backed by `lopdf` and `pdf-extract`.

use std::panic::{catch_unwind, AssertUnwindSafe};

use lopdf::Document;

use super::{ExtractError, PageExtractor};

/// Page-by-page extraction from the PDF's structured content streams.
pub struct LopdfPages;

impl PageExtractor for LopdfPages {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
        let doc = Document::load_mem(bytes).map_err(|e| ExtractError::Parse(e.to_string()))?;

        let pages = doc
            .get_pages()
            .keys()
            .map(|&page| {
                catch_unwind(AssertUnwindSafe(|| doc.extract_text(&[page])))
                    .ok()
                    .and_then(|r| r.ok())
                    .unwrap_or_else(|| {
                        tracing::debug!(page, "lopdf could not read page");
                        String::new()
                    })
            })
            .collect();
        Ok(pages)
    }
}

type WholeFn = fn(&[u8]) -> Result<Vec<String>, pdf_extract::OutputError>;
type PageFn = fn(&[u8]) -> Result<String, pdf_extract::OutputError>;

/// Extraction through the `pdf-extract` layout engine.
///
/// The whole document is tried first. If that fails, every page is split
/// into its own single-page document and extracted in isolation so one
/// broken page costs only its own text.
pub struct PdfExtractPages {
    whole: WholeFn,
    page: PageFn,
}

impl PdfExtractPages {
    pub fn new() -> Self {
        Self {
            whole: pdf_extract::extract_text_from_mem_by_pages,
            page: pdf_extract::extract_text_from_mem,
        }
    }
}

impl Default for PdfExtractPages {
    fn default() -> Self {
        Self::new()
    }
}

impl PageExtractor for PdfExtractPages {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
        match catch_unwind(AssertUnwindSafe(|| (self.whole)(bytes))) {
            Ok(Ok(pages)) => return Ok(pages),
            Ok(Err(e)) => tracing::debug!(error = %e, "pdf-extract failed on whole document"),
            Err(_) => tracing::debug!("pdf-extract panicked on whole document"),
        }

        let doc = Document::load_mem(bytes).map_err(|e| ExtractError::Parse(e.to_string()))?;
        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        Ok(page_numbers
            .iter()
            .map(|&page| self.isolate_page(&doc, &page_numbers, page).unwrap_or_default())
            .collect())
    }
}

impl PdfExtractPages {
    /// Extract a single page by saving it as a standalone document.
    fn isolate_page(&self, doc: &Document, all_pages: &[u32], keep: u32) -> Option<String> {
        let mut single = doc.clone();
        let others: Vec<u32> = all_pages.iter().copied().filter(|&p| p != keep).collect();
        single.delete_pages(&others);

        let mut buf = Vec::new();
        if let Err(e) = single.save_to(&mut buf) {
            tracing::debug!(page = keep, error = %e, "could not isolate page");
            return None;
        }

        match catch_unwind(AssertUnwindSafe(|| (self.page)(&buf))) {
            Ok(Ok(text)) => Some(text),
            Ok(Err(e)) => {
                tracing::debug!(page = keep, error = %e, "pdf-extract failed on page");
                None
            }
            Err(_) => {
                tracing::debug!(page = keep, "pdf-extract panicked on page");
                None
            }
        }
    }
}
