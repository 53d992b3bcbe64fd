// Transfers between the current remote folder and the local filesystem.
//
// Downloads stream the remote body in fixed-size chunks and report progress
// after each one. Native documents (the ones with no byte content of their
// own) go through the export endpoint in a format picked from a hint.
//
// A download that fails partway leaves the partially written target file
// on disk; nothing is rolled back.

use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::cursor::DirectoryCursor;
use crate::entry::Entry;
use crate::error::{BrowseError, Result};
use crate::progress::{ProgressCallback, TransferProgress};
use crate::remote::{FileMetadata, RemoteClient};

/// Content type given to uploaded files.
pub const DEFAULT_UPLOAD_MIME_TYPE: &str = "text/plain";

/// Default target for `record_names`.
pub const DEFAULT_RECORD_FILE: &str = "filenames.txt";

const CHUNK_SIZE: usize = 64 * 1024;

/// Concrete format a native document is exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Pdf,
    WordDocument,
    Spreadsheet,
    Presentation,
}

impl ExportFormat {
    /// Parse a format hint such as `-pdf`, `docs`, `-excel` or `powerpoint`.
    /// The leading dash is optional and case is ignored.
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.trim_start_matches('-').to_ascii_lowercase().as_str() {
            "pdf" => Some(ExportFormat::Pdf),
            "docs" | "docx" | "word" => Some(ExportFormat::WordDocument),
            "excel" | "xlsx" | "sheets" => Some(ExportFormat::Spreadsheet),
            "powerpoint" | "pptx" | "slides" => Some(ExportFormat::Presentation),
            _ => None,
        }
    }

    /// Format for an optional hint; missing or unknown hints mean PDF.
    pub fn from_hint_or_default(hint: Option<&str>) -> Self {
        hint.and_then(Self::from_hint).unwrap_or_default()
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::WordDocument => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Spreadsheet => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Presentation => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
        }
    }
}

/// Outcome of a finished download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub target: PathBuf,
    pub bytes: u64,
    /// Set when the entry was exported rather than fetched directly.
    pub exported_as: Option<&'static str>,
}

/// Upload/download against the cursor's current folder.
pub struct TransferManager<'a, C> {
    cursor: &'a mut DirectoryCursor<C>,
}

impl<'a, C: RemoteClient> TransferManager<'a, C> {
    pub fn new(cursor: &'a mut DirectoryCursor<C>) -> Self {
        Self { cursor }
    }

    /// Download `name` from the current folder into `target` (or a local
    /// file called `name`).
    pub fn download(
        &self,
        name: &str,
        format_hint: Option<&str>,
        target: Option<&Path>,
        progress: ProgressCallback<'_>,
    ) -> Result<DownloadReport> {
        let entry = self.cursor.lookup(name)?;
        if entry.is_folder() {
            return Err(BrowseError::IsFolder(name.to_string()));
        }

        let target = match target {
            Some(target) => target.to_path_buf(),
            None => default_target(&entry.name)?,
        };
        let mut file = File::create(&target)?;

        let client = self.cursor.client();
        let (stream, exported_as) = if entry.is_native_document() {
            let mime_type = ExportFormat::from_hint_or_default(format_hint).mime_type();
            (client.export_bytes(&entry.id, mime_type), Some(mime_type))
        } else {
            (client.fetch_bytes(&entry.id), None)
        };

        let result = stream.and_then(|mut stream| {
            let total = stream.total();
            copy_in_chunks(&mut stream, &mut file, total, &entry.name, progress)
        });
        let bytes = match result {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(name, target = %target.display(), error = %err, "download failed");
                return Err(err);
            }
        };

        info!(name, target = %target.display(), bytes, "download complete");
        Ok(DownloadReport {
            target,
            bytes,
            exported_as,
        })
    }

    /// Upload the local file at `local_path` into the current folder.
    ///
    /// The new entry is added to the current listing so it shows up in
    /// `ls` without another remote listing call.
    pub fn upload(&mut self, local_path: &Path, progress: ProgressCallback<'_>) -> Result<Entry> {
        let not_found = || BrowseError::FileNotFound(local_path.display().to_string());
        if !local_path.is_file() {
            return Err(not_found());
        }
        let name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(not_found)?;

        let metadata = FileMetadata {
            name,
            mime_type: DEFAULT_UPLOAD_MIME_TYPE.to_string(),
            parent_id: self.cursor.current_folder_id().to_string(),
        };
        let created = self
            .cursor
            .client()
            .create_file(&metadata, local_path, progress)
            .inspect_err(|err| warn!(path = %local_path.display(), error = %err, "upload failed"))?;

        let entry = Entry::new(created.id, metadata.name, metadata.mime_type);
        info!(name = %entry.name, id = %entry.id, folder = %metadata.parent_id, "upload complete");
        self.cursor.insert_into_current(entry.clone());
        Ok(entry)
    }

    /// Write the current folder's names, one per line, to `target`.
    pub fn record_names(&self, target: Option<&Path>) -> Result<PathBuf> {
        let target = target.map_or_else(|| PathBuf::from(DEFAULT_RECORD_FILE), Path::to_path_buf);
        let content = self
            .cursor
            .current_listing()
            .names()
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(&target, content)?;
        Ok(target)
    }
}

/// Local file name for a download with no `--to`: the last `/` or `\`
/// separated component of the remote name, so remote names never pick a
/// directory.
fn default_target(name: &str) -> Result<PathBuf> {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if last.is_empty() || last == "." || last == ".." {
        return Err(BrowseError::InvalidTarget(name.to_string()));
    }
    Ok(PathBuf::from(last))
}

/// Copy `reader` into `writer` chunk by chunk, reporting progress after
/// every chunk. Read failures are remote failures; write failures are local.
fn copy_in_chunks<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    total: Option<u64>,
    filename: &str,
    progress: ProgressCallback<'_>,
) -> Result<u64> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut done = 0u64;
    let mut last = TransferProgress::new(0, total, filename);

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(BrowseError::Transfer {
                    status: None,
                    detail: e.to_string(),
                })
            }
        };
        writer.write_all(&buf[..n])?;
        done += n as u64;
        last = TransferProgress::new(done, total, filename);
        progress(&last);
    }
    writer.flush()?;

    if !last.is_complete() {
        progress(&TransferProgress::new(done, Some(done), filename));
    }
    Ok(done)
}
