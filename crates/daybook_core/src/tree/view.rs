//! Journal tree rendering and interaction.
//!
//! # Responsibility
//! - Project [`TreeEntry`] arrays into collapsible folder/journal elements.
//! - Keep folder open/closed and selection state outside of the elements so
//!   a full rebuild can re-apply it.
//! - Report journal selection to the editor through [`JournalViewer`].
//!
//! # Invariants
//! - Element ids are `<root>/<segment>/.../<segment>` and unique per tree.
//! - An element is hidden iff one of its ancestor folders is closed.
//! - At most one journal element is selected.
//! - Rendering never mutates [`TreeViewState`].

use crate::model::journal::{Journal, PATH_SEPARATOR};
use crate::repo::snapshot_repo::SnapshotStorage;
use crate::store::collection::SubscriptionId;
use crate::store::journal_store::{JournalStore, JournalStoreError};
use crate::tree::builder::{build_tree, TreeEntry};
use log::{debug, info};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// Default id prefix of the top-level tree container.
pub const DEFAULT_TREE_ROOT: &str = "tree";

/// Errors from tree view construction and interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeViewError {
    /// Root prefix is blank or contains `/`.
    InvalidRoot(String),
    /// No element has this id.
    UnknownNode(String),
}

impl Display for TreeViewError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRoot(root) => write!(f, "invalid tree root prefix `{root}`"),
            Self::UnknownNode(id) => write!(f, "tree node not found: {id}"),
        }
    }
}

impl Error for TreeViewError {}

/// Expansion state of a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderState {
    Open,
    Closed,
}

impl FolderState {
    /// `-` for open folders, `+` for closed ones.
    pub fn glyph(self) -> char {
        match self {
            Self::Open => '-',
            Self::Closed => '+',
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Open => Self::Closed,
            Self::Closed => Self::Open,
        }
    }
}

/// Kind of a rendered element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeElementKind {
    Folder(FolderState),
    Journal,
}

/// UI state that survives rebuilds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeViewState {
    open_folders: BTreeSet<String>,
    selected: Option<String>,
}

impl TreeViewState {
    /// Folders are closed unless explicitly opened.
    pub fn folder_state(&self, id: &str) -> FolderState {
        if self.open_folders.contains(id) {
            FolderState::Open
        } else {
            FolderState::Closed
        }
    }

    pub fn set_folder_state(&mut self, id: &str, state: FolderState) {
        match state {
            FolderState::Open => {
                self.open_folders.insert(id.to_string());
            }
            FolderState::Closed => {
                self.open_folders.remove(id);
            }
        }
    }

    /// Id of the selected journal element.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Selects `id`, replacing any previous selection.
    pub fn select(&mut self, id: &str) {
        self.selected = Some(id.to_string());
    }

    pub fn open_folders(&self) -> impl Iterator<Item = &str> {
        self.open_folders.iter().map(String::as_str)
    }

    fn retain_existing(&mut self, folders: &BTreeSet<String>, journals: &BTreeSet<String>) {
        self.open_folders.retain(|id| folders.contains(id));
        if self
            .selected
            .as_ref()
            .is_some_and(|id| !journals.contains(id))
        {
            self.selected = None;
        }
    }
}

/// One rendered folder or journal button with its container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeElement {
    pub id: String,
    pub name: String,
    pub kind: TreeElementKind,
    /// Button text: `"+ name"` / `"- name"` for folders, `name` for journals.
    pub label: String,
    pub hidden: bool,
    pub selected: bool,
    pub children: Vec<TreeElement>,
}

impl TreeElement {
    pub fn glyph(&self) -> Option<char> {
        match self.kind {
            TreeElementKind::Folder(state) => Some(state.glyph()),
            TreeElementKind::Journal => None,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, TreeElementKind::Folder(_))
    }

    /// Depth-first search for `id` in this element and its descendants.
    pub fn find(&self, id: &str) -> Option<&TreeElement> {
        if self.id == id {
            return Some(self);
        }
        find_in(&self.children, id)
    }

    /// Every descendant, depth-first.
    pub fn descendants(&self) -> Vec<&TreeElement> {
        let mut out = Vec::new();
        collect_descendants(&self.children, &mut out);
        out
    }
}

/// Mounting point that rendered elements are appended to.
pub trait TreeMount {
    fn append(&mut self, element: TreeElement);
}

impl TreeMount for Vec<TreeElement> {
    fn append(&mut self, element: TreeElement) {
        self.push(element);
    }
}

impl TreeMount for TreeElement {
    fn append(&mut self, element: TreeElement) {
        self.children.push(element);
    }
}

/// Receives the journal path chosen in the tree (the editor's `set_path`).
pub trait JournalViewer {
    fn set_path(&mut self, path: &str);
}

/// Viewer that records every path it is asked to show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingViewer {
    pub paths: Vec<String>,
}

impl RecordingViewer {
    /// Most recently shown path.
    pub fn current(&self) -> Option<&str> {
        self.paths.last().map(String::as_str)
    }
}

impl JournalViewer for RecordingViewer {
    fn set_path(&mut self, path: &str) {
        self.paths.push(path.to_string());
    }
}

/// Renders `entries` into `mount`, ids prefixed with `tree_path`.
///
/// Elements at this level are visible; deeper elements follow `state`.
pub fn render_entries<M: TreeMount + ?Sized>(
    entries: &[TreeEntry],
    mount: &mut M,
    tree_path: &str,
    state: &TreeViewState,
) {
    render_level(entries, mount, tree_path, false, state);
}

fn render_level<M: TreeMount + ?Sized>(
    entries: &[TreeEntry],
    mount: &mut M,
    tree_path: &str,
    hidden: bool,
    state: &TreeViewState,
) {
    for entry in entries {
        let id = format!("{tree_path}{PATH_SEPARATOR}{}", entry.name);
        let element = match &entry.children {
            Some(children) => {
                let folder_state = state.folder_state(&id);
                let mut folder = TreeElement {
                    label: format!("{} {}", folder_state.glyph(), entry.name),
                    kind: TreeElementKind::Folder(folder_state),
                    ..blank_element(&id, &entry.name, hidden)
                };
                let children_hidden = hidden || folder_state == FolderState::Closed;
                render_level(children, &mut folder, &id, children_hidden, state);
                folder
            }
            None => TreeElement {
                label: entry.name.clone(),
                kind: TreeElementKind::Journal,
                selected: state.selected() == Some(id.as_str()),
                ..blank_element(&id, &entry.name, hidden)
            },
        };
        mount.append(element);
    }
}

fn blank_element(id: &str, name: &str, hidden: bool) -> TreeElement {
    TreeElement {
        id: id.to_string(),
        name: name.to_string(),
        kind: TreeElementKind::Journal,
        label: String::new(),
        hidden,
        selected: false,
        children: Vec::new(),
    }
}

/// Outcome of activating a tree element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeActivation {
    /// A folder was toggled into `state`.
    Folder { id: String, state: FolderState },
    /// A journal was selected; `path` was sent to the viewer.
    Journal { id: String, path: String },
}

/// Interactive journal tree bound to one viewer.
pub struct TreeView<V: JournalViewer> {
    root: String,
    entries: Vec<TreeEntry>,
    elements: Vec<TreeElement>,
    state: TreeViewState,
    viewer: V,
    deferred: Rc<RefCell<Option<Vec<String>>>>,
}

impl<V: JournalViewer> TreeView<V> {
    /// Creates an empty view using `root` as id prefix.
    pub fn new(root: impl Into<String>, viewer: V) -> Result<Self, TreeViewError> {
        let root = root.into();
        if root.trim().is_empty() || root.contains(PATH_SEPARATOR) {
            return Err(TreeViewError::InvalidRoot(root));
        }
        Ok(Self {
            root,
            entries: Vec::new(),
            elements: Vec::new(),
            state: TreeViewState::default(),
            viewer,
            deferred: Rc::new(RefCell::new(None)),
        })
    }

    /// Discards all elements and rebuilds them from `paths`.
    ///
    /// Open folders and the selection are re-applied when their ids still
    /// exist; stale ids are dropped from the state.
    pub fn rebuild<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        self.entries = build_tree(paths).to_entries();

        let mut folders = BTreeSet::new();
        let mut journals = BTreeSet::new();
        collect_ids(&self.entries, &self.root, &mut folders, &mut journals);
        self.state.retain_existing(&folders, &journals);

        self.render();
        debug!(
            "event=tree_rebuild module=tree status=ok folders={} journals={}",
            folders.len(),
            journals.len()
        );
    }

    /// Handles a click on the element `id`.
    ///
    /// Folders toggle between open and closed. Journals become the single
    /// selection and their path (root prefix stripped) goes to the viewer.
    pub fn activate(&mut self, id: &str) -> Result<TreeActivation, TreeViewError> {
        self.sync();
        let kind = self
            .find(id)
            .map(|element| element.kind)
            .ok_or_else(|| TreeViewError::UnknownNode(id.to_string()))?;

        let activation = match kind {
            TreeElementKind::Folder(current) => {
                let next = current.toggled();
                self.state.set_folder_state(id, next);
                self.render();
                TreeActivation::Folder {
                    id: id.to_string(),
                    state: next,
                }
            }
            TreeElementKind::Journal => {
                self.state.select(id);
                self.render();
                let path = self.strip_root(id).to_string();
                info!("event=tree_select module=tree status=ok path={path}");
                self.viewer.set_path(&path);
                TreeActivation::Journal {
                    id: id.to_string(),
                    path,
                }
            }
        };

        self.sync();
        Ok(activation)
    }

    /// Applies a journal change that arrived while the view was borrowed.
    ///
    /// Returns whether a rebuild ran.
    pub fn sync(&mut self) -> bool {
        let pending = self.deferred.borrow_mut().take();
        match pending {
            Some(paths) => {
                self.rebuild(paths);
                true
            }
            None => false,
        }
    }

    /// Returns whether a journal change is waiting for [`TreeView::sync`].
    pub fn has_pending_rebuild(&self) -> bool {
        self.deferred.borrow().is_some()
    }

    /// Journal path of the current selection, root prefix stripped.
    pub fn selected_path(&self) -> Option<&str> {
        self.state.selected().map(|id| self.strip_root(id))
    }

    pub fn find(&self, id: &str) -> Option<&TreeElement> {
        find_in(&self.elements, id)
    }

    pub fn elements(&self) -> &[TreeElement] {
        &self.elements
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn state(&self) -> &TreeViewState {
        &self.state
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn viewer(&self) -> &V {
        &self.viewer
    }

    fn render(&mut self) {
        let mut elements = Vec::new();
        render_entries(&self.entries, &mut elements, &self.root, &self.state);
        self.elements = elements;
    }

    fn strip_root<'a>(&self, id: &'a str) -> &'a str {
        id.strip_prefix(self.root.as_str())
            .and_then(|rest| rest.strip_prefix(PATH_SEPARATOR))
            .unwrap_or(id)
    }
}

/// Keeps `view` in sync with `journals`: rebuilds now and on every change.
///
/// A change that arrives while the view is borrowed is kept pending. It is
/// applied when an activation finishes (the viewer saving a journal from
/// inside [`TreeView::activate`]), on the next activation, or by
/// [`TreeView::sync`]. Callers that edit journals while holding a borrow of
/// the view must call `sync` once the borrow ends.
pub fn attach_tree_view<S, V>(
    journals: &mut JournalStore<S>,
    view: &Rc<RefCell<TreeView<V>>>,
) -> SubscriptionId
where
    S: SnapshotStorage,
    V: JournalViewer + 'static,
{
    let deferred = {
        let mut current = view.borrow_mut();
        current.rebuild(journals.paths());
        Rc::clone(&current.deferred)
    };

    let view = Rc::clone(view);
    journals.subscribe(move |items: &[Journal]| {
        let paths = items.iter().map(|journal| journal.path.clone()).collect::<Vec<_>>();
        match view.try_borrow_mut() {
            Ok(mut current) => current.rebuild(paths),
            Err(_) => {
                debug!("event=tree_rebuild module=tree status=deferred");
                *deferred.borrow_mut() = Some(paths);
            }
        }
    })
}

/// Deletes the journal selected in `view`, returning its path.
///
/// The view borrow is released before the store write, so an attached view
/// rebuilds right away and drops the stale selection.
pub fn delete_selected_journal<S, V>(
    journals: &mut JournalStore<S>,
    view: &Rc<RefCell<TreeView<V>>>,
) -> Result<Option<String>, JournalStoreError>
where
    S: SnapshotStorage,
    V: JournalViewer,
{
    let selected = {
        let mut current = view.borrow_mut();
        current.sync();
        current.selected_path().map(str::to_string)
    };
    let Some(path) = selected else {
        return Ok(None);
    };
    journals.delete(&path)?;
    info!("event=tree_delete_selected module=tree status=ok path={path}");
    Ok(Some(path))
}

fn find_in<'a>(elements: &'a [TreeElement], id: &str) -> Option<&'a TreeElement> {
    elements.iter().find_map(|element| element.find(id))
}

fn collect_descendants<'a>(elements: &'a [TreeElement], out: &mut Vec<&'a TreeElement>) {
    for element in elements {
        out.push(element);
        collect_descendants(&element.children, out);
    }
}

fn collect_ids(
    entries: &[TreeEntry],
    tree_path: &str,
    folders: &mut BTreeSet<String>,
    journals: &mut BTreeSet<String>,
) {
    for entry in entries {
        let id = format!("{tree_path}{PATH_SEPARATOR}{}", entry.name);
        match &entry.children {
            Some(children) => {
                collect_ids(children, &id, folders, journals);
                folders.insert(id);
            }
            None => {
                journals.insert(id);
            }
        }
    }
}
