// Error types for the browsing core. Every operation on the cursor, the
// cache and the transfer manager returns one of these instead of printing
// or panicking, so the interactive loop decides what to show the user.

use thiserror::Error;

/// Errors produced by the browsing core.
///
/// None of these are fatal to a session: the cursor stays where it was and
/// the loop keeps accepting commands.
#[derive(Error, Debug)]
pub enum BrowseError {
    /// No entry with this name in the current folder.
    #[error("File/Folder does not exist: {0}")]
    NotFound(String),

    /// `cd` target exists but is a file.
    #[error("Folder does not exist: {0}")]
    NotAFolder(String),

    /// Download target is a folder.
    #[error("{0} is a folder and cannot be downloaded")]
    IsFolder(String),

    /// Remote name has no usable last path component to save under.
    #[error("{0} cannot be saved under its own name; use --to=<file>")]
    InvalidTarget(String),

    /// Local upload source is missing.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Tried to move above the root folder.
    #[error("Already at root")]
    AlreadyAtRoot,

    /// Remote side failed during a byte transfer. Any partially written
    /// target file is left on disk.
    #[error("Transfer failed: {detail}")]
    Transfer { status: Option<u16>, detail: String },

    /// Listing call returned an error status or a body that could not be
    /// used. Failed byte transfers, upload sessions included, are `Transfer`.
    #[error("Remote error: {0}")]
    Remote(String),

    /// Network request error.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Local filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for browsing operations.
pub type Result<T> = std::result::Result<T, BrowseError>;
