// Progress reporting for file transfers.

/// Progress information for uploads and downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferProgress {
    /// Bytes transferred so far
    pub done: u64,
    /// Total bytes to transfer, when the remote side announced it
    pub total: Option<u64>,
    /// Name of the file being transferred
    pub filename: String,
}

impl TransferProgress {
    pub fn new(done: u64, total: Option<u64>, filename: impl Into<String>) -> Self {
        Self {
            done,
            total,
            filename: filename.into(),
        }
    }

    /// Progress as a percentage (0.0 to 100.0).
    ///
    /// With an unknown total this stays at 0 until the transfer reports
    /// completion, so a sequence of reports never goes backwards.
    pub fn percent(&self) -> f64 {
        match self.total {
            Some(0) => 100.0,
            Some(total) => ((self.done as f64 / total as f64) * 100.0).min(100.0),
            None => 0.0,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.total, Some(total) if self.done >= total)
    }
}

/// Callback invoked once per transferred chunk.
pub type ProgressCallback<'a> = &'a mut dyn FnMut(&TransferProgress);
