// Remote file/folder records and the per-folder listing table.

use serde::Deserialize;
use std::collections::BTreeMap;

/// MIME type the remote service uses to mark folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Prefix shared by documents that only exist on the remote side and must
/// be exported to a concrete format before they can be downloaded.
pub const NATIVE_DOCUMENT_PREFIX: &str = "application/vnd.google-apps";

/// Whether an entry is a folder or a file. Computed once from the MIME type
/// when the entry is ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Folder,
    File,
}

impl EntryKind {
    pub fn from_mime_type(mime_type: &str) -> Self {
        if mime_type == FOLDER_MIME_TYPE {
            EntryKind::Folder
        } else {
            EntryKind::File
        }
    }
}

/// One remote file or folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Opaque remote identifier.
    pub id: String,
    /// Display name, unique within the listing it belongs to.
    pub name: String,
    pub kind: EntryKind,
    /// Raw remote MIME type, kept for export decisions.
    pub mime_type: String,
}

impl Entry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        Self {
            id: id.into(),
            name: name.into(),
            kind: EntryKind::from_mime_type(&mime_type),
            mime_type,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }

    /// True for documents that have no byte content of their own
    /// (spreadsheets, slides, ...) and need the export path.
    pub fn is_native_document(&self) -> bool {
        self.mime_type.starts_with(NATIVE_DOCUMENT_PREFIX)
    }
}

/// File resource as returned by the remote API. Missing fields default to
/// empty strings; a missing MIME type is treated as a plain file.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileResource {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
}

impl From<FileResource> for Entry {
    fn from(res: FileResource) -> Self {
        Entry::new(res.id, res.name, res.mime_type)
    }
}

/// The resolved children of one folder, keyed by display name.
///
/// Two remote items with the same name collapse into one key: the entry
/// inserted last wins and the other one is hidden from this listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    entries: BTreeMap<String, Entry>,
}

impl DirectoryListing {
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Insert an entry, replacing any entry with the same name.
    pub fn insert(&mut self, entry: Entry) -> Option<Entry> {
        self.entries.insert(entry.name.clone(), entry)
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    /// Entries in display order (sorted by name).
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Extend<Entry> for DirectoryListing {
    fn extend<I: IntoIterator<Item = Entry>>(&mut self, iter: I) {
        for entry in iter {
            self.insert(entry);
        }
    }
}

impl FromIterator<Entry> for DirectoryListing {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        let mut listing = DirectoryListing::new();
        listing.extend(iter);
        listing
    }
}
