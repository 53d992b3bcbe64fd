// Library root
// -----------
// This crate exposes the browsing core behind the `gdrive-cli` binary.
//
// Module responsibilities:
// - `entry`, `nav`, `cache`, `cursor`: the directory-state model. A
//   navigation stack over a remote API with no working directory, plus a
//   per-folder listing cache so each folder is listed at most once.
// - `transfer`, `progress`: uploads and downloads against the current
//   folder, including export of native documents.
// - `remote`, `api`: the `RemoteClient` seam and its HTTP implementation.
// - `command`, `shell`, `ui`, `auth`, `config`: the interactive program
//   around the core.
pub mod api;
pub mod auth;
pub mod cache;
pub mod command;
pub mod config;
pub mod cursor;
pub mod entry;
pub mod error;
pub mod nav;
pub mod progress;
pub mod remote;
pub mod shell;
pub mod transfer;
pub mod ui;

#[cfg(test)]
mod testing;

pub use cursor::{CdOutcome, DirectoryCursor};
pub use entry::{DirectoryListing, Entry, EntryKind};
pub use error::{BrowseError, Result};
pub use remote::RemoteClient;
pub use transfer::{ExportFormat, TransferManager};
