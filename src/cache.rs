// Per-folder listing cache. A folder is listed remotely the first time it
// is visited; afterwards the stored listing is served for the rest of the
// session. There is no eviction or invalidation.

use std::collections::HashMap;

use tracing::debug;

use crate::entry::DirectoryListing;
use crate::error::Result;
use crate::remote::RemoteClient;

/// Map from folder id to its fully resolved listing.
#[derive(Debug, Default)]
pub struct FolderCache {
    listings: HashMap<String, DirectoryListing>,
}

impl FolderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached listing for `folder_id`, calling `fetch` only on a
    /// miss. A failed fetch stores nothing.
    pub fn get_or_fetch<F>(&mut self, folder_id: &str, fetch: F) -> Result<&DirectoryListing>
    where
        F: FnOnce(&str) -> Result<DirectoryListing>,
    {
        if !self.listings.contains_key(folder_id) {
            debug!(folder_id, "listing cache miss");
            let listing = fetch(folder_id)?;
            self.listings.insert(folder_id.to_string(), listing);
        } else {
            debug!(folder_id, "listing cache hit");
        }
        Ok(&self.listings[folder_id])
    }

    pub fn get(&self, folder_id: &str) -> Option<&DirectoryListing> {
        self.listings.get(folder_id)
    }

    pub(crate) fn get_mut(&mut self, folder_id: &str) -> Option<&mut DirectoryListing> {
        self.listings.get_mut(folder_id)
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, folder_id: &str) -> bool {
        self.listings.contains_key(folder_id)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.listings.len()
    }
}

/// List every child of `folder_id`, following continuation tokens until the
/// remote side reports the last page.
pub fn fetch_full_listing<C>(client: &C, folder_id: &str) -> Result<DirectoryListing>
where
    C: RemoteClient + ?Sized,
{
    let mut listing = DirectoryListing::new();
    let mut page_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = client.list_children(folder_id, page_token.as_deref())?;
        pages += 1;
        listing.extend(page.entries);
        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    debug!(folder_id, pages, entries = listing.len(), "fetched folder listing");
    Ok(listing)
}
