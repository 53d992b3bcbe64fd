// Directory cursor: the current-directory abstraction. It owns the remote
// client, the navigation stack and the folder cache, and is the only thing
// that mutates the latter two.

use tracing::info;

use crate::cache::{fetch_full_listing, FolderCache};
use crate::entry::{DirectoryListing, Entry, EntryKind};
use crate::error::{BrowseError, Result};
use crate::nav::{NavigationStack, ROOT_ID};
use crate::remote::RemoteClient;

static EMPTY_LISTING: DirectoryListing = DirectoryListing::new();

/// What a successful `change_directory` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CdOutcome {
    /// Descended into a child folder.
    Entered,
    /// Moved up one level.
    Left,
    /// `..` at root; nothing changed.
    AlreadyAtRoot,
}

/// Current position in the remote tree plus the cached listings seen so far.
pub struct DirectoryCursor<C> {
    client: C,
    stack: NavigationStack,
    cache: FolderCache,
}

impl<C: RemoteClient> DirectoryCursor<C> {
    /// Start at the root folder, fetching its listing.
    pub fn open(client: C) -> Result<Self> {
        let mut cursor = Self {
            client,
            stack: NavigationStack::new(),
            cache: FolderCache::new(),
        };
        cursor.resolve(ROOT_ID)?;
        Ok(cursor)
    }

    /// Move into the child folder `name`, or one level up for `..`.
    ///
    /// On any error the cursor stays in the folder it was in. The target
    /// listing is resolved before the stack changes, so a failed fetch
    /// leaves no half-entered folder behind.
    pub fn change_directory(&mut self, name: &str) -> Result<CdOutcome> {
        if name == ".." {
            let parent_id = match self.stack.parent() {
                Some(parent) => parent.folder_id.clone(),
                None => return Ok(CdOutcome::AlreadyAtRoot),
            };
            self.resolve(&parent_id)?;
            self.stack.pop();
            info!(path = %self.current_path(), "left folder");
            return Ok(CdOutcome::Left);
        }

        let entry = self.lookup(name)?;
        if !entry.is_folder() {
            return Err(BrowseError::NotAFolder(name.to_string()));
        }
        let (folder_id, display_name) = (entry.id.clone(), entry.name.clone());

        self.resolve(&folder_id)?;
        self.stack.push(display_name, folder_id);
        info!(path = %self.current_path(), "entered folder");
        Ok(CdOutcome::Entered)
    }

    /// Names and kinds of the current folder's children, sorted by name.
    pub fn list(&self) -> Vec<(&str, EntryKind)> {
        self.current_listing()
            .entries()
            .map(|e| (e.name.as_str(), e.kind))
            .collect()
    }

    pub fn lookup(&self, name: &str) -> Result<&Entry> {
        self.current_listing()
            .get(name)
            .ok_or_else(|| BrowseError::NotFound(name.to_string()))
    }

    pub fn current_path(&self) -> String {
        self.stack.path_string()
    }

    pub fn current_folder_id(&self) -> &str {
        &self.stack.current().folder_id
    }

    pub fn current_listing(&self) -> &DirectoryListing {
        self.cache
            .get(self.current_folder_id())
            .unwrap_or(&EMPTY_LISTING)
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    #[cfg(test)]
    pub(crate) fn stack(&self) -> &NavigationStack {
        &self.stack
    }

    #[cfg(test)]
    pub(crate) fn cache(&self) -> &FolderCache {
        &self.cache
    }

    /// Add an entry to the current folder's listing without re-fetching it.
    pub(crate) fn insert_into_current(&mut self, entry: Entry) {
        let folder_id = self.stack.current().folder_id.clone();
        if let Some(listing) = self.cache.get_mut(&folder_id) {
            listing.insert(entry);
        }
    }

    fn resolve(&mut self, folder_id: &str) -> Result<&DirectoryListing> {
        let client = &self.client;
        self.cache
            .get_or_fetch(folder_id, |id| fetch_full_listing(client, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{file, folder, MockClient};

    fn sample_client() -> MockClient {
        MockClient::new()
            .folder(
                "root",
                vec![
                    folder("f-reports", "Reports"),
                    folder("f-photos", "Photos"),
                    file("d-notes", "notes.txt", "text/plain"),
                ],
            )
            .folder(
                "f-reports",
                vec![
                    folder("f-q1", "Q1"),
                    file("d-summary", "Summary", "application/vnd.google-apps.document"),
                ],
            )
            .folder("f-q1", vec![file("d-jan", "jan.csv", "text/csv")])
            .folder("f-photos", vec![])
    }

    #[test]
    fn open_lists_root_once() {
        let cursor = DirectoryCursor::open(sample_client()).unwrap();
        assert_eq!(cursor.current_path(), "root");
        assert_eq!(cursor.client().list_calls(), vec!["root".to_string()]);
        assert_eq!(
            cursor.list(),
            vec![
                ("Photos", EntryKind::Folder),
                ("Reports", EntryKind::Folder),
                ("notes.txt", EntryKind::File),
            ]
        );
    }

    #[test]
    fn reports_scenario() {
        let mut cursor = DirectoryCursor::open(sample_client()).unwrap();

        assert_eq!(cursor.change_directory("Reports").unwrap(), CdOutcome::Entered);
        assert_eq!(cursor.current_path(), "root/Reports");
        let names: Vec<&str> = cursor.list().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Q1", "Summary"]);
        let _ = cursor.list();
        assert_eq!(cursor.client().list_calls_for("f-reports"), 1);

        assert_eq!(cursor.change_directory("..").unwrap(), CdOutcome::Left);
        assert_eq!(cursor.current_path(), "root");
    }

    #[test]
    fn revisiting_folders_uses_the_cache() {
        let mut cursor = DirectoryCursor::open(sample_client()).unwrap();
        for _ in 0..3 {
            cursor.change_directory("Reports").unwrap();
            cursor.change_directory("Q1").unwrap();
            cursor.change_directory("..").unwrap();
            cursor.change_directory("..").unwrap();
        }

        let client = cursor.client();
        assert_eq!(client.list_calls_for("root"), 1);
        assert_eq!(client.list_calls_for("f-reports"), 1);
        assert_eq!(client.list_calls_for("f-q1"), 1);
        assert_eq!(cursor.cache().len(), 3);
    }

    #[test]
    fn up_at_root_is_a_no_op() {
        let mut cursor = DirectoryCursor::open(sample_client()).unwrap();
        assert_eq!(cursor.change_directory("..").unwrap(), CdOutcome::AlreadyAtRoot);
        assert_eq!(cursor.current_path(), "root");
        assert_eq!(cursor.client().list_calls().len(), 1);
        assert_eq!(cursor.cache().len(), 1);
    }

    #[test]
    fn missing_folder_leaves_state_unchanged() {
        let mut cursor = DirectoryCursor::open(sample_client()).unwrap();
        cursor.change_directory("Reports").unwrap();

        let err = cursor.change_directory("Nope").unwrap_err();
        assert!(matches!(err, BrowseError::NotFound(ref n) if n == "Nope"));
        assert_eq!(cursor.current_path(), "root/Reports");
        assert_eq!(cursor.stack().depth(), 2);
        assert_eq!(cursor.cache().len(), 2);
        assert_eq!(cursor.client().list_calls().len(), 2);
    }

    #[test]
    fn cd_into_file_is_rejected() {
        let mut cursor = DirectoryCursor::open(sample_client()).unwrap();
        let err = cursor.change_directory("notes.txt").unwrap_err();
        assert!(matches!(err, BrowseError::NotAFolder(_)));
        assert_eq!(cursor.current_path(), "root");
        assert_eq!(cursor.cache().len(), 1);
    }

    #[test]
    fn failed_listing_does_not_move_the_cursor() {
        let client = MockClient::new().folder("root", vec![folder("f-gone", "Gone")]);
        let mut cursor = DirectoryCursor::open(client).unwrap();

        let err = cursor.change_directory("Gone").unwrap_err();
        assert!(matches!(err, BrowseError::Remote(_)));
        assert_eq!(cursor.current_path(), "root");
        assert!(!cursor.cache().contains("f-gone"));
    }

    #[test]
    fn path_tracks_pushed_names() {
        let mut cursor = DirectoryCursor::open(sample_client()).unwrap();
        cursor.change_directory("Reports").unwrap();
        cursor.change_directory("Q1").unwrap();
        assert_eq!(cursor.current_path(), "root/Reports/Q1");
        assert_eq!(cursor.current_folder_id(), "f-q1");
        assert_eq!(cursor.lookup("jan.csv").unwrap().id, "d-jan");

        cursor.change_directory("..").unwrap();
        cursor.change_directory("..").unwrap();
        cursor.change_directory("Photos").unwrap();
        assert_eq!(cursor.current_path(), "root/Photos");
        assert!(cursor.list().is_empty());
    }

    #[test]
    fn lookup_only_sees_the_current_folder() {
        let mut cursor = DirectoryCursor::open(sample_client()).unwrap();
        assert!(cursor.lookup("Q1").is_err());
        cursor.change_directory("Reports").unwrap();
        assert!(cursor.lookup("notes.txt").is_err());
        assert!(cursor.lookup("Q1").unwrap().is_folder());
    }
}
