//! Plain-text result output.
//!
//! Each page becomes one line of space-separated strings followed by a blank
//! line. The sink is flushed after every page so partial runs leave complete
//! pages behind.

use super::result::PageResult;
use crate::core::{OCRError, OcrResult, ProcessingStage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Separator written after every page, including empty ones.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Appends page results to a text sink.
#[derive(Debug)]
pub struct ResultWriter<W: Write> {
    sink: W,
    pages_written: usize,
}

impl ResultWriter<BufWriter<File>> {
    /// Creates (or truncates) the output file.
    pub fn create(path: impl AsRef<Path>) -> OcrResult<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            OCRError::stage_error(
                ProcessingStage::Output,
                format!("failed to create output file {}", path.display()),
                e,
            )
        })?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> ResultWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            pages_written: 0,
        }
    }

    /// Writes one page and flushes.
    pub fn write_page(&mut self, page: &PageResult) -> OcrResult<()> {
        write!(self.sink, "{}{}", page, PAGE_SEPARATOR)
            .and_then(|_| self.sink.flush())
            .map_err(|e| {
                OCRError::stage_error(
                    ProcessingStage::Output,
                    format!("failed to write results for page {}", page.page_index),
                    e,
                )
            })?;
        self.pages_written += 1;
        Ok(())
    }

    pub fn pages_written(&self) -> usize {
        self.pages_written
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}
