// Navigation stack: the path from the root folder to the current folder.
// The remote API has no notion of a working directory, so this is where
// "where am I" lives.

/// Identifier and display name of the root folder.
pub const ROOT_ID: &str = "root";

/// One step of the path: a folder's display name and its remote id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationFrame {
    pub display_name: String,
    pub folder_id: String,
}

impl NavigationFrame {
    pub fn new(display_name: impl Into<String>, folder_id: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            folder_id: folder_id.into(),
        }
    }

    pub fn root() -> Self {
        Self::new(ROOT_ID, ROOT_ID)
    }
}

/// Stack of frames, bottom first. Never empty: the root frame is pushed on
/// construction and cannot be popped.
#[derive(Debug, Clone)]
pub struct NavigationStack {
    frames: Vec<NavigationFrame>,
}

impl NavigationStack {
    pub fn new() -> Self {
        Self {
            frames: vec![NavigationFrame::root()],
        }
    }

    pub fn push(&mut self, display_name: impl Into<String>, folder_id: impl Into<String>) {
        self.frames.push(NavigationFrame::new(display_name, folder_id));
    }

    /// Drop the current frame. Returns `false` and leaves the stack alone
    /// when only the root frame is left.
    pub fn pop(&mut self) -> bool {
        if self.is_at_root() {
            return false;
        }
        self.frames.pop();
        true
    }

    pub fn current(&self) -> &NavigationFrame {
        // frames always holds the root frame
        &self.frames[self.frames.len() - 1]
    }

    /// Frame below the current one; `None` at root.
    pub fn parent(&self) -> Option<&NavigationFrame> {
        self.frames.len().checked_sub(2).map(|i| &self.frames[i])
    }

    pub fn is_at_root(&self) -> bool {
        self.frames.len() == 1
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Display names from root to current, joined with `/`.
    pub fn path_string(&self) -> String {
        self.frames
            .iter()
            .map(|f| f.display_name.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl Default for NavigationStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_root() {
        let stack = NavigationStack::new();
        assert!(stack.is_at_root());
        assert_eq!(stack.current(), &NavigationFrame::root());
        assert_eq!(stack.path_string(), "root");
        assert!(stack.parent().is_none());
    }

    #[test]
    fn root_frame_cannot_be_popped() {
        let mut stack = NavigationStack::new();
        assert!(!stack.pop());
        assert!(!stack.pop());
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.path_string(), "root");
    }

    #[test]
    fn path_follows_pushes_and_pops() {
        let mut stack = NavigationStack::new();
        stack.push("Reports", "f1");
        stack.push("2024 Q1", "f2");
        assert_eq!(stack.path_string(), "root/Reports/2024 Q1");
        assert_eq!(stack.current().folder_id, "f2");
        assert_eq!(stack.parent().unwrap().folder_id, "f1");

        assert!(stack.pop());
        assert_eq!(stack.path_string(), "root/Reports");
        assert!(stack.pop());
        assert!(!stack.pop());
        assert_eq!(stack.path_string(), "root");
    }
}
