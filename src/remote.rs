// The remote side as the browsing core sees it: list a folder one page at a
// time, open byte streams for files, and create new files. `ApiClient`
// implements this over HTTP; tests use an in-memory fake.

use std::fmt;
use std::io::Read;
use std::path::Path;

use crate::entry::Entry;
use crate::error::Result;
use crate::progress::ProgressCallback;

/// One page of a folder listing.
#[derive(Debug, Default)]
pub struct ListPage {
    pub entries: Vec<Entry>,
    /// Continuation token; `None` on the last page.
    pub next_page_token: Option<String>,
}

/// Readable body of a download, plus its announced size.
pub struct ByteStream {
    reader: Box<dyn Read>,
    total: Option<u64>,
}

impl ByteStream {
    pub fn new(reader: impl Read + 'static, total: Option<u64>) -> Self {
        Self {
            reader: Box::new(reader),
            total,
        }
    }

    /// Total size in bytes if the remote side reported one.
    pub fn total(&self) -> Option<u64> {
        self.total
    }
}

impl Read for ByteStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

impl fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteStream").field("total", &self.total).finish()
    }
}

/// Metadata for a file about to be created remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub name: String,
    pub mime_type: String,
    /// Folder the new file is created in.
    pub parent_id: String,
}

/// Operations the browsing core needs from the remote storage service.
pub trait RemoteClient {
    /// List one page of the direct children of `folder_id`.
    fn list_children(&self, folder_id: &str, page_token: Option<&str>) -> Result<ListPage>;

    /// Open the raw bytes of a regular file.
    fn fetch_bytes(&self, file_id: &str) -> Result<ByteStream>;

    /// Open a native document converted to `mime_type`.
    fn export_bytes(&self, file_id: &str, mime_type: &str) -> Result<ByteStream>;

    /// Upload `local_path` as a new file, reporting progress per chunk.
    /// Returns the entry the remote side created.
    fn create_file(
        &self,
        metadata: &FileMetadata,
        local_path: &Path,
        progress: ProgressCallback<'_>,
    ) -> Result<Entry>;
}

impl<T: RemoteClient + ?Sized> RemoteClient for &T {
    fn list_children(&self, folder_id: &str, page_token: Option<&str>) -> Result<ListPage> {
        (**self).list_children(folder_id, page_token)
    }

    fn fetch_bytes(&self, file_id: &str) -> Result<ByteStream> {
        (**self).fetch_bytes(file_id)
    }

    fn export_bytes(&self, file_id: &str, mime_type: &str) -> Result<ByteStream> {
        (**self).export_bytes(file_id, mime_type)
    }

    fn create_file(
        &self,
        metadata: &FileMetadata,
        local_path: &Path,
        progress: ProgressCallback<'_>,
    ) -> Result<Entry> {
        (**self).create_file(metadata, local_path, progress)
    }
}
