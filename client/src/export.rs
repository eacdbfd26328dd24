//! Save rendered feedback reports as PDF files.
//!
//! DESIGN
//! ======
//! The batch layout is probed once in [`ReportExporter::new`] and reused for
//! every export. Files are written to a hidden temporary sibling first and
//! renamed into place, so a failed export never leaves a partial PDF under
//! the final name.

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;

use std::path::{Path, PathBuf};

use forms::report::pdf::to_pdf_bytes;
use forms::report::{BatchRenderer, BatchStrategy, Document, RenderCapabilities, batch_filename, single_filename};
use forms::{ExportError, FeedbackRecord, now_ms, report};
use time::OffsetDateTime;

use crate::config::ClientConfig;

#[derive(Debug, Clone)]
pub struct ReportExporter {
    dir: PathBuf,
    renderer: BatchRenderer,
}

impl ReportExporter {
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_capabilities(&config.export_dir, RenderCapabilities::with_tables(config.export_tables))
    }

    #[must_use]
    pub fn with_capabilities(dir: &Path, capabilities: RenderCapabilities) -> Self {
        let renderer = BatchRenderer::probe(capabilities);
        tracing::debug!(layout = renderer.name(), dir = %dir.display(), "report exporter ready");
        Self { dir: dir.to_path_buf(), renderer }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn strategy(&self) -> BatchStrategy {
        self.renderer.strategy()
    }

    /// Write a one-page report for `record`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::MissingDirectory`] or [`ExportError::Io`].
    pub async fn export_single(&self, record: &FeedbackRecord) -> Result<PathBuf, ExportError> {
        let doc = report::render_single(record, OffsetDateTime::now_utc());
        self.save(&single_filename(&record.name, now_ms()), &doc).await
    }

    /// Write one report covering every record of `form_type`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::EmptyBatch`] when `records` is empty, otherwise
    /// [`ExportError::MissingDirectory`] or [`ExportError::Io`].
    pub async fn export_group(&self, form_type: &str, records: &[FeedbackRecord]) -> Result<PathBuf, ExportError> {
        let doc = self.renderer.render(form_type, records, OffsetDateTime::now_utc())?;
        self.save(&batch_filename(form_type, now_ms()), &doc).await
    }

    async fn save(&self, file_name: &str, doc: &Document) -> Result<PathBuf, ExportError> {
        match tokio::fs::metadata(&self.dir).await {
            Ok(meta) if meta.is_dir() => {}
            _ => return Err(ExportError::MissingDirectory(self.dir.clone())),
        }

        let path = self.dir.join(file_name);
        let tmp = self.dir.join(format!(".{file_name}.tmp"));
        let bytes = to_pdf_bytes(doc);

        let written = match tokio::fs::write(&tmp, &bytes).await {
            Ok(()) => tokio::fs::rename(&tmp, &path).await,
            Err(e) => Err(e),
        };
        if let Err(source) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            tracing::warn!(path = %path.display(), error = %source, "report write failed");
            return Err(ExportError::Io { path, source });
        }

        tracing::info!(path = %path.display(), pages = doc.page_count(), bytes = bytes.len(), "report saved");
        Ok(path)
    }
}
