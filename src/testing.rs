// In-memory stand-in for the remote service, shared by the unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io::{self, Read};
use std::path::Path;

use crate::entry::{Entry, FOLDER_MIME_TYPE};
use crate::error::{BrowseError, Result};
use crate::progress::{ProgressCallback, TransferProgress};
use crate::remote::{ByteStream, FileMetadata, ListPage, RemoteClient};

#[derive(Default)]
pub(crate) struct MockClient {
    pages: HashMap<String, Vec<Vec<Entry>>>,
    contents: HashMap<String, Vec<u8>>,
    broken: HashSet<String>,
    list_calls: RefCell<Vec<String>>,
    exports: RefCell<Vec<(String, String)>>,
    created: RefCell<Vec<FileMetadata>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `entries` for `folder_id` as a single page.
    pub fn folder(self, folder_id: &str, entries: Vec<Entry>) -> Self {
        self.paged_folder(folder_id, vec![entries])
    }

    pub fn paged_folder(mut self, folder_id: &str, pages: Vec<Vec<Entry>>) -> Self {
        self.pages.insert(folder_id.to_string(), pages);
        self
    }

    pub fn content(mut self, file_id: &str, bytes: &[u8]) -> Self {
        self.contents.insert(file_id.to_string(), bytes.to_vec());
        self
    }

    /// Streams for `file_id` fail after the first chunk.
    pub fn broken(mut self, file_id: &str) -> Self {
        self.broken.insert(file_id.to_string());
        self
    }

    pub fn list_calls(&self) -> Vec<String> {
        self.list_calls.borrow().clone()
    }

    pub fn list_calls_for(&self, folder_id: &str) -> usize {
        self.list_calls
            .borrow()
            .iter()
            .filter(|id| id.as_str() == folder_id)
            .count()
    }

    pub fn exports(&self) -> Vec<(String, String)> {
        self.exports.borrow().clone()
    }

    pub fn created(&self) -> Vec<FileMetadata> {
        self.created.borrow().clone()
    }

    fn stream(&self, file_id: &str, bytes: Vec<u8>) -> ByteStream {
        let total = Some(bytes.len() as u64);
        if self.broken.contains(file_id) {
            ByteStream::new(BrokenReader { data: bytes, served: false }, total)
        } else {
            ByteStream::new(io::Cursor::new(bytes), total)
        }
    }
}

pub(crate) fn folder(id: &str, name: &str) -> Entry {
    Entry::new(id, name, FOLDER_MIME_TYPE)
}

pub(crate) fn file(id: &str, name: &str, mime_type: &str) -> Entry {
    Entry::new(id, name, mime_type)
}

/// Hands out half of its data, then fails.
struct BrokenReader {
    data: Vec<u8>,
    served: bool,
}

impl Read for BrokenReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.served {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"));
        }
        self.served = true;
        let n = (self.data.len() / 2).min(buf.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        Ok(n)
    }
}

impl RemoteClient for MockClient {
    fn list_children(&self, folder_id: &str, page_token: Option<&str>) -> Result<ListPage> {
        self.list_calls.borrow_mut().push(folder_id.to_string());
        let pages = self
            .pages
            .get(folder_id)
            .ok_or_else(|| BrowseError::Remote(format!("File not found: {folder_id}")))?;
        let index: usize = page_token.map_or(0, |t| t.parse().unwrap_or(0));
        let entries = pages.get(index).cloned().unwrap_or_default();
        let next_page_token = (index + 1 < pages.len()).then(|| (index + 1).to_string());
        Ok(ListPage {
            entries,
            next_page_token,
        })
    }

    fn fetch_bytes(&self, file_id: &str) -> Result<ByteStream> {
        let bytes = self.contents.get(file_id).cloned().ok_or_else(|| BrowseError::Transfer {
            status: Some(404),
            detail: format!("File not found: {file_id}"),
        })?;
        Ok(self.stream(file_id, bytes))
    }

    fn export_bytes(&self, file_id: &str, mime_type: &str) -> Result<ByteStream> {
        self.exports
            .borrow_mut()
            .push((file_id.to_string(), mime_type.to_string()));
        let bytes = format!("{file_id} as {mime_type}").into_bytes();
        Ok(self.stream(file_id, bytes))
    }

    fn create_file(
        &self,
        metadata: &FileMetadata,
        local_path: &Path,
        progress: ProgressCallback<'_>,
    ) -> Result<Entry> {
        let bytes = std::fs::read(local_path)?;
        let total = bytes.len() as u64;
        progress(&TransferProgress::new(total, Some(total), metadata.name.clone()));

        let mut created = self.created.borrow_mut();
        created.push(metadata.clone());
        Ok(Entry::new(
            format!("new-{}", created.len()),
            metadata.name.clone(),
            metadata.mime_type.clone(),
        ))
    }
}
