//! Persistence collaborators.
//!
//! The editor and the menu forms never talk to storage directly; they go
//! through the traits here:
//!
//! | Trait | Operations |
//! |-------|-----------|
//! | [`ContentStore`] | create / update / delete / get / list content documents |
//! | [`MenuStore`] | list / create / update / delete at each menu level |
//! | [`ImageStore`] | upload image bytes, get back the path to store in section data |
//!
//! [`SiteStore`] implements the first two in memory and persists to a single
//! `site.json`. [`DirImageStore`] implements uploads as content-addressed
//! files in a directory. A remote backend would implement the same traits.
//!
//! ## `site.json`
//!
//! ```json
//! {
//!   "menus":        { "nextId": 3, "rows": [ { "id": 1, "title": "Services", "path": "/services" } ] },
//!   "megaMenus":    { "nextId": 1, "rows": [] },
//!   "subMegaMenus": { "nextId": 1, "rows": [] },
//!   "contents":     { "nextId": 2, "rows": [ { "id": 1, "title": "Home", "sections": [], "menuId": 1 } ] }
//! }
//! ```
//!
//! Loading goes through [`crate::normalize::normalize_site`], so documents
//! whose `sections` or `data` were stored double-encoded come back
//! structured.

use crate::document::ContentDocument;
use crate::menu::{
    MegaMenu, MegaMenuFields, Menu, MenuError, MenuFields, MenuLevel, MenuNode, MenuTree,
    SubMegaMenu, SubMegaMenuFields,
};
use crate::normalize::normalize_site;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("content {0} not found")]
    NotFound(u64),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which documents to list.
///
/// The most specific id present wins: a sub mega menu id beats a mega menu
/// id, which beats a menu id. With no ids every document matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentFilter {
    pub menu_id: Option<u64>,
    pub mega_menu_id: Option<u64>,
    pub sub_mega_menu_id: Option<u64>,
}

impl ContentFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn menu(id: u64) -> Self {
        Self {
            menu_id: Some(id),
            ..Self::default()
        }
    }

    pub fn mega_menu(id: u64) -> Self {
        Self {
            mega_menu_id: Some(id),
            ..Self::default()
        }
    }

    pub fn sub_mega_menu(id: u64) -> Self {
        Self {
            sub_mega_menu_id: Some(id),
            ..Self::default()
        }
    }

    /// The level and id actually used for matching.
    pub fn scope(&self) -> Option<(MenuLevel, u64)> {
        match (self.sub_mega_menu_id, self.mega_menu_id, self.menu_id) {
            (Some(id), _, _) => Some((MenuLevel::SubMegaMenu, id)),
            (None, Some(id), _) => Some((MenuLevel::MegaMenu, id)),
            (None, None, Some(id)) => Some((MenuLevel::Menu, id)),
            (None, None, None) => None,
        }
    }

    pub fn matches(&self, doc: &ContentDocument) -> bool {
        match self.scope() {
            None => true,
            Some((MenuLevel::SubMegaMenu, id)) => doc.sub_mega_menu_id == Some(id),
            Some((MenuLevel::MegaMenu, id)) => doc.mega_menu_id == Some(id),
            Some((MenuLevel::Menu, id)) => doc.menu_id == Some(id),
        }
    }
}

impl From<crate::menu::Selection> for ContentFilter {
    fn from(sel: crate::menu::Selection) -> Self {
        Self {
            menu_id: sel.menu_id,
            mega_menu_id: sel.mega_menu_id,
            sub_mega_menu_id: sel.sub_mega_menu_id,
        }
    }
}

/// Content document persistence.
pub trait ContentStore {
    /// Store a new document and return its assigned id.
    fn create_content(&mut self, doc: &ContentDocument) -> Result<u64, StoreError>;
    fn update_content(&mut self, id: u64, doc: &ContentDocument) -> Result<(), StoreError>;
    fn delete_content(&mut self, id: u64) -> Result<(), StoreError>;
    fn get_content(&self, id: u64) -> Result<ContentDocument, StoreError>;
    fn list_content(&self, filter: &ContentFilter) -> Result<Vec<ContentDocument>, StoreError>;
}

/// Menu persistence, one set of operations per level.
pub trait MenuStore {
    fn list_menus(&self) -> Vec<Menu>;
    fn create_menu(&mut self, fields: MenuFields) -> Result<Menu, MenuError>;
    fn update_menu(&mut self, id: u64, fields: MenuFields) -> Result<Menu, MenuError>;
    fn delete_menu(&mut self, id: u64) -> Result<(), MenuError>;

    fn list_mega_menus(&self, menu_id: u64) -> Vec<MegaMenu>;
    fn create_mega_menu(&mut self, fields: MegaMenuFields) -> Result<MegaMenu, MenuError>;
    fn update_mega_menu(&mut self, id: u64, fields: MegaMenuFields)
    -> Result<MegaMenu, MenuError>;
    fn delete_mega_menu(&mut self, id: u64) -> Result<(), MenuError>;

    fn list_sub_mega_menus(&self, menu_id: u64, mega_menu_id: u64) -> Vec<SubMegaMenu>;
    fn create_sub_mega_menu(&mut self, fields: SubMegaMenuFields)
    -> Result<SubMegaMenu, MenuError>;
    fn update_sub_mega_menu(
        &mut self,
        id: u64,
        fields: SubMegaMenuFields,
    ) -> Result<SubMegaMenu, MenuError>;
    fn delete_sub_mega_menu(&mut self, id: u64) -> Result<(), MenuError>;
}

impl MenuStore for MenuTree {
    fn list_menus(&self) -> Vec<Menu> {
        MenuTree::list_menus(self)
    }
    fn create_menu(&mut self, fields: MenuFields) -> Result<Menu, MenuError> {
        MenuTree::create_menu(self, fields)
    }
    fn update_menu(&mut self, id: u64, fields: MenuFields) -> Result<Menu, MenuError> {
        MenuTree::update_menu(self, id, fields)
    }
    fn delete_menu(&mut self, id: u64) -> Result<(), MenuError> {
        MenuTree::delete_menu(self, id)
    }
    fn list_mega_menus(&self, menu_id: u64) -> Vec<MegaMenu> {
        MenuTree::list_mega_menus(self, menu_id)
    }
    fn create_mega_menu(&mut self, fields: MegaMenuFields) -> Result<MegaMenu, MenuError> {
        MenuTree::create_mega_menu(self, fields)
    }
    fn update_mega_menu(
        &mut self,
        id: u64,
        fields: MegaMenuFields,
    ) -> Result<MegaMenu, MenuError> {
        MenuTree::update_mega_menu(self, id, fields)
    }
    fn delete_mega_menu(&mut self, id: u64) -> Result<(), MenuError> {
        MenuTree::delete_mega_menu(self, id)
    }
    fn list_sub_mega_menus(&self, menu_id: u64, mega_menu_id: u64) -> Vec<SubMegaMenu> {
        MenuTree::list_sub_mega_menus(self, menu_id, mega_menu_id)
    }
    fn create_sub_mega_menu(
        &mut self,
        fields: SubMegaMenuFields,
    ) -> Result<SubMegaMenu, MenuError> {
        MenuTree::create_sub_mega_menu(self, fields)
    }
    fn update_sub_mega_menu(
        &mut self,
        id: u64,
        fields: SubMegaMenuFields,
    ) -> Result<SubMegaMenu, MenuError> {
        MenuTree::update_sub_mega_menu(self, id, fields)
    }
    fn delete_sub_mega_menu(&mut self, id: u64) -> Result<(), MenuError> {
        MenuTree::delete_sub_mega_menu(self, id)
    }
}

/// Stored documents plus their id counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTable {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    rows: Vec<ContentDocument>,
}

impl Default for ContentTable {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: Vec::new(),
        }
    }
}

impl ContentTable {
    pub fn rows(&self) -> &[ContentDocument] {
        &self.rows
    }

    fn allocate_id(&mut self) -> u64 {
        let max = self.rows.iter().filter_map(|d| d.id).max().unwrap_or(0);
        let id = self.next_id.max(max + 1);
        self.next_id = id + 1;
        id
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.rows.iter().position(|d| d.id == Some(id))
    }
}

/// In-memory site data: the menu tree and every content document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteStore {
    #[serde(flatten)]
    pub menus: MenuTree,
    pub contents: ContentTable,
}

/// Something in the stored data that a reader should look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    /// A section with a tag or payload this build can't interpret.
    OpaqueSection {
        content_id: Option<u64>,
        index: usize,
        tag: String,
    },
    /// A document placed under a menu node that no longer exists.
    DanglingPlacement {
        content_id: Option<u64>,
        level: MenuLevel,
        id: u64,
    },
    /// A menu node whose parent was deleted.
    OrphanedNode {
        level: MenuLevel,
        id: u64,
        parent_level: MenuLevel,
        parent_id: u64,
    },
    /// A sub mega menu whose mega menu now hangs under a different menu.
    MismatchedParent {
        id: u64,
        menu_id: u64,
        mega_menu_id: u64,
        mega_menu_parent: u64,
    },
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let doc = |id: &Option<u64>| match id {
            Some(id) => format!("content {id}"),
            None => "unsaved content".to_string(),
        };
        match self {
            Issue::OpaqueSection {
                content_id,
                index,
                tag,
            } => write!(
                f,
                "{}: section {} has unsupported type `{}` (kept, not rendered)",
                doc(content_id),
                index + 1,
                tag
            ),
            Issue::DanglingPlacement {
                content_id,
                level,
                id,
            } => write!(f, "{}: placed under missing {} {}", doc(content_id), level, id),
            Issue::OrphanedNode {
                level,
                id,
                parent_level,
                parent_id,
            } => write!(f, "{level} {id}: parent {parent_level} {parent_id} is missing"),
            Issue::MismatchedParent {
                id,
                menu_id,
                mega_menu_id,
                mega_menu_parent,
            } => write!(
                f,
                "{} {id}: under {} {menu_id}, but {} {mega_menu_id} belongs to {} {mega_menu_parent}",
                MenuLevel::SubMegaMenu,
                MenuLevel::Menu,
                MenuLevel::MegaMenu,
                MenuLevel::Menu
            ),
        }
    }
}

impl SiteStore {
    /// Parse site data, decoding double-encoded values first.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Ok(serde_json::from_value(normalize_site(value))?)
    }

    /// Load `path`, or an empty store if the file doesn't exist yet.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "no site data yet, starting empty");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let store = Self::from_json(&content)?;
        debug!(
            path = %path.display(),
            contents = store.contents.rows.len(),
            menus = store.menus.menus.rows().len(),
            "loaded site data"
        );
        Ok(store)
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!(path = %path.display(), "saved site data");
        Ok(())
    }

    pub fn documents(&self) -> &[ContentDocument] {
        self.contents.rows()
    }

    /// Report opaque sections, dangling placements and orphaned menu nodes.
    pub fn audit(&self) -> Vec<Issue> {
        let mut issues = Vec::new();
        let tree = &self.menus;

        for mega in tree.mega_menus.rows() {
            if tree.menu(mega.menu_id).is_none() {
                issues.push(Issue::OrphanedNode {
                    level: MenuLevel::MegaMenu,
                    id: mega.id(),
                    parent_level: MenuLevel::Menu,
                    parent_id: mega.menu_id,
                });
            }
        }
        for sub in tree.sub_mega_menus.rows() {
            if tree.menu(sub.menu_id).is_none() {
                issues.push(Issue::OrphanedNode {
                    level: MenuLevel::SubMegaMenu,
                    id: sub.id(),
                    parent_level: MenuLevel::Menu,
                    parent_id: sub.menu_id,
                });
            }
            match tree.mega_menu(sub.mega_menu_id) {
                None => issues.push(Issue::OrphanedNode {
                    level: MenuLevel::SubMegaMenu,
                    id: sub.id(),
                    parent_level: MenuLevel::MegaMenu,
                    parent_id: sub.mega_menu_id,
                }),
                Some(mega) if mega.menu_id != sub.menu_id => {
                    issues.push(Issue::MismatchedParent {
                        id: sub.id(),
                        menu_id: sub.menu_id,
                        mega_menu_id: mega.id(),
                        mega_menu_parent: mega.menu_id,
                    })
                }
                Some(_) => {}
            }
        }

        for doc in self.contents.rows() {
            let checks = [
                (MenuLevel::Menu, doc.menu_id, doc.menu_id.map(|id| tree.menu(id).is_some())),
                (
                    MenuLevel::MegaMenu,
                    doc.mega_menu_id,
                    doc.mega_menu_id.map(|id| tree.mega_menu(id).is_some()),
                ),
                (
                    MenuLevel::SubMegaMenu,
                    doc.sub_mega_menu_id,
                    doc.sub_mega_menu_id.map(|id| tree.sub_mega_menu(id).is_some()),
                ),
            ];
            for (level, id, exists) in checks {
                if let (Some(id), Some(false)) = (id, exists) {
                    issues.push(Issue::DanglingPlacement {
                        content_id: doc.id,
                        level,
                        id,
                    });
                }
            }
            for (index, tag) in doc.opaque_sections() {
                issues.push(Issue::OpaqueSection {
                    content_id: doc.id,
                    index,
                    tag: tag.to_string(),
                });
            }
        }
        issues
    }
}

impl ContentStore for SiteStore {
    fn create_content(&mut self, doc: &ContentDocument) -> Result<u64, StoreError> {
        let id = self.contents.allocate_id();
        let mut stored = doc.clone();
        stored.id = Some(id);
        self.contents.rows.push(stored);
        debug!(id, title = %doc.title, "created content");
        Ok(id)
    }

    fn update_content(&mut self, id: u64, doc: &ContentDocument) -> Result<(), StoreError> {
        let pos = self.contents.position(id).ok_or(StoreError::NotFound(id))?;
        let mut stored = doc.clone();
        stored.id = Some(id);
        self.contents.rows[pos] = stored;
        debug!(id, title = %doc.title, "updated content");
        Ok(())
    }

    fn delete_content(&mut self, id: u64) -> Result<(), StoreError> {
        let pos = self.contents.position(id).ok_or(StoreError::NotFound(id))?;
        self.contents.rows.remove(pos);
        debug!(id, "deleted content");
        Ok(())
    }

    fn get_content(&self, id: u64) -> Result<ContentDocument, StoreError> {
        self.contents
            .position(id)
            .map(|pos| self.contents.rows[pos].clone())
            .ok_or(StoreError::NotFound(id))
    }

    fn list_content(&self, filter: &ContentFilter) -> Result<Vec<ContentDocument>, StoreError> {
        Ok(self
            .contents
            .rows
            .iter()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect())
    }
}

// ============================================================================
// Image uploads
// ============================================================================

/// Accepts image bytes and returns the path to store in section data.
///
/// The bytes are opaque here; nothing decodes or inspects them.
pub trait ImageStore {
    fn upload(&mut self, file_name: &str, bytes: &[u8]) -> Result<String, StoreError>;
}

/// Stores uploads in a directory under their SHA-256 hash, so uploading the
/// same file twice yields the same path.
#[derive(Debug, Clone)]
pub struct DirImageStore {
    dir: PathBuf,
    url_prefix: String,
}

impl DirImageStore {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Lower-cased extension of `file_name`, or `bin` when there is none.
fn upload_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| "bin".to_string())
}

impl ImageStore for DirImageStore {
    fn upload(&mut self, file_name: &str, bytes: &[u8]) -> Result<String, StoreError> {
        let digest = Sha256::digest(bytes);
        let stored_name = format!("{:x}.{}", digest, upload_extension(file_name));
        fs::create_dir_all(&self.dir)?;
        let target = self.dir.join(&stored_name);
        if !target.exists() {
            fs::write(&target, bytes)?;
        }
        debug!(file_name, stored = %stored_name, bytes = bytes.len(), "stored upload");
        Ok(format!(
            "{}/{}",
            self.url_prefix.trim_end_matches('/'),
            stored_name
        ))
    }
}
