//! OCR fallback: rasterize with `pdftoppm`, recognize with `tesseract`.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::OcrConfig;

use super::{ExtractError, PageExtractor};

/// Runs the poppler and tesseract command-line tools over a temporary copy
/// of the PDF. Each page image is recognized separately; a page tesseract
/// cannot read yields an empty string.
pub struct TesseractOcr {
    pdftoppm: PathBuf,
    tesseract: PathBuf,
    languages: String,
    dpi: u32,
}

impl TesseractOcr {
    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            pdftoppm: config.pdftoppm.clone(),
            tesseract: config.tesseract.clone(),
            languages: config.languages.clone(),
            dpi: config.dpi,
        }
    }

    fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
        let prefix = out_dir.join("page");
        let output = Command::new(&self.pdftoppm)
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(pdf)
            .arg(&prefix)
            .output()
            .map_err(|e| tool_error(&self.pdftoppm, e.to_string()))?;

        let images = page_images(out_dir)?;
        if images.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(tool_error(
                &self.pdftoppm,
                format!("no page images produced (status {}): {}", output.status, stderr.trim()),
            ));
        }
        if !output.status.success() {
            tracing::debug!(status = %output.status, "pdftoppm exited non-zero but produced images");
        }
        Ok(images)
    }

    fn recognize(&self, image: &Path) -> String {
        let result = Command::new(&self.tesseract)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .output();

        match result {
            Ok(output) if output.status.success() => {
                String::from_utf8_lossy(&output.stdout).into_owned()
            }
            Ok(output) => {
                tracing::debug!(
                    image = %image.display(),
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "tesseract failed on page"
                );
                String::new()
            }
            Err(e) => {
                tracing::debug!(image = %image.display(), error = %e, "could not run tesseract");
                String::new()
            }
        }
    }
}

impl PageExtractor for TesseractOcr {
    fn name(&self) -> &'static str {
        "ocr"
    }

    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
        let dir = tempfile::Builder::new().prefix("docrag-ocr-").tempdir()?;
        let pdf = dir.path().join("input.pdf");
        std::fs::write(&pdf, bytes)?;

        let images = self.rasterize(&pdf, dir.path())?;
        tracing::debug!(pages = images.len(), dpi = self.dpi, "running OCR");
        Ok(images.iter().map(|image| self.recognize(image)).collect())
    }
}

fn tool_error(tool: &Path, message: String) -> ExtractError {
    ExtractError::Tool {
        tool: tool.display().to_string(),
        message,
    }
}

/// `page-N.png` files in `dir`, ordered by page number.
///
/// pdftoppm zero-pads `N` to the width of the page count, so lexical order
/// is not reliable across documents; sort on the parsed number instead.
fn page_images(dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    let mut pages: Vec<(u32, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(n) = page_number(&path) {
            pages.push((n, path));
        }
    }
    pages.sort_by_key(|(n, _)| *n);
    Ok(pages.into_iter().map(|(_, p)| p).collect())
}

fn page_number(path: &Path) -> Option<u32> {
    if path.extension().and_then(|e| e.to_str()) != Some("png") {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix("page-")?
        .parse()
        .ok()
}
