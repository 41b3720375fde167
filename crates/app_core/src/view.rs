//! Boundary types shared with the external view

use crate::Icon;
use app_fs::{Entry, EntryKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Id stamped on every emitted listing; grows by one per directory change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

/// An entry with its resolved icon
#[derive(Debug, Clone)]
pub struct Node {
    pub entry: Entry,
    /// `None` renders without a glyph
    pub icon: Option<Arc<Icon>>,
    pub generation: Generation,
}

impl Node {
    /// A selection of this node made through `source`
    pub fn select(&self, source: InputSource) -> Selection {
        Selection {
            generation: self.generation,
            entry: self.entry.clone(),
            source,
        }
    }
}

/// What the view renders for one directory
#[derive(Debug, Clone)]
pub struct NodeListing {
    pub directory: PathBuf,
    pub generation: Generation,
    pub nodes: Vec<Node>,
    pub partial_failure: bool,
    pub status: Option<String>,
}

impl NodeListing {
    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn find(&self, display_name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.entry.display_name == display_name)
    }
}

/// How a node was picked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// Click, Enter, keyboard navigation
    Primary,
    /// Right click or menu key: opens the context action, never navigates
    Secondary,
}

/// A selection event coming back from the view
#[derive(Debug, Clone)]
pub struct Selection {
    pub generation: Generation,
    pub entry: Entry,
    pub source: InputSource,
}

/// Actions offered on a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextAction {
    CopyPath,
}

impl ContextAction {
    pub fn label(self) -> &'static str {
        match self {
            ContextAction::CopyPath => "Copy path to clipboard",
        }
    }
}

/// Node targeted by a secondary input action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextTarget {
    pub kind: EntryKind,
    pub path: PathBuf,
}

impl ContextTarget {
    pub fn actions(&self) -> &'static [ContextAction] {
        &[ContextAction::CopyPath]
    }
}

/// The external view, status display and preview collaborators
pub trait BrowserView {
    fn show_listing(&mut self, listing: &NodeListing);

    fn preview_file(&mut self, path: &Path);

    fn show_unsupported(&mut self);

    /// Fire-and-forget status line
    fn set_status(&mut self, message: &str);

    fn offer_context_menu(&mut self, target: &ContextTarget);
}
