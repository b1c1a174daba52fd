//! The three-level navigation hierarchy.
//!
//! ```text
//! Menu            /services
//! └── MegaMenu    /services/design
//!     └── SubMegaMenu  /services/design/branding
//! ```
//!
//! Each level is an independent CRUD resource held in a [`MenuTree`]. Child
//! records point at their parents by id; deleting a parent does not cascade,
//! so orphaned children are possible and are reported by
//! [`crate::store::SiteStore::audit`] rather than removed.
//!
//! ## Paths
//!
//! Every node has a [`NavPath`]: lower-cased on input, starting with `/`,
//! made of `a-z`, `0-9`, `-` and `/`, with no `//` and no trailing slash
//! (except the root `/` itself).
//!
//! ## Forms
//!
//! Create and update take a `*Fields` value (what the admin form submits).
//! Validation runs before anything is stored and collects every field error
//! into [`FormErrors`], so a bad path doesn't hide an empty title.
//!
//! ## Selection
//!
//! [`Selection`] is the cascading menu / mega-menu / sub-menu picker state.
//! Choosing a different parent clears everything below it.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

static PATH_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^/[a-z0-9\-/]*$").ok());

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path is required")]
    Empty,
    #[error("path must start with '/'")]
    MissingLeadingSlash,
    #[error("path may only contain a-z, 0-9, '-' and '/' (found {0:?})")]
    InvalidCharacter(char),
    #[error("path must not contain '//'")]
    DoubleSlash,
    #[error("path must not end with '/'")]
    TrailingSlash,
}

/// A validated, lower-cased navigation path such as `/about/team`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NavPath(String);

impl NavPath {
    /// Lower-case and validate a user-entered path.
    pub fn parse(input: &str) -> Result<Self, PathError> {
        let path = input.trim().to_lowercase();
        if path.is_empty() {
            return Err(PathError::Empty);
        }
        if !path.starts_with('/') {
            return Err(PathError::MissingLeadingSlash);
        }
        let matches = PATH_PATTERN
            .as_ref()
            .map(|re| re.is_match(&path))
            .unwrap_or(false);
        if !matches {
            let bad = path
                .chars()
                .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '/'))
                .unwrap_or('?');
            return Err(PathError::InvalidCharacter(bad));
        }
        if path.contains("//") {
            return Err(PathError::DoubleSlash);
        }
        if path.len() > 1 && path.ends_with('/') {
            return Err(PathError::TrailingSlash);
        }
        Ok(Self(path))
    }

    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Path segments, empty for the root.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }
}

impl TryFrom<String> for NavPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        NavPath::parse(&value)
    }
}

impl From<NavPath> for String {
    fn from(path: NavPath) -> Self {
        path.0
    }
}

impl fmt::Display for NavPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Field-level validation errors for one form submission.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("{}", self.summary())]
pub struct FormErrors {
    fields: BTreeMap<&'static str, String>,
}

impl FormErrors {
    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.insert(field, message.into());
    }

    /// Message for one field, if it failed.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    fn summary(&self) -> String {
        self.fields
            .iter()
            .map(|(field, msg)| format!("{field}: {msg}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Depth in the navigation hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MenuLevel {
    Menu,
    MegaMenu,
    SubMegaMenu,
}

impl fmt::Display for MenuLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MenuLevel::Menu => "menu",
            MenuLevel::MegaMenu => "mega menu",
            MenuLevel::SubMegaMenu => "sub mega menu",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MenuError {
    #[error("invalid {level}: {errors}")]
    Validation { level: MenuLevel, errors: FormErrors },
    #[error("{level} {id} not found")]
    NotFound { level: MenuLevel, id: u64 },
}

fn invalid(level: MenuLevel, errors: FormErrors) -> MenuError {
    MenuError::Validation { level, errors }
}

impl MenuError {
    /// Field errors when this is a validation failure.
    pub fn form_errors(&self) -> Option<&FormErrors> {
        match self {
            MenuError::Validation { errors, .. } => Some(errors),
            MenuError::NotFound { .. } => None,
        }
    }
}

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    pub id: u64,
    pub title: String,
    pub path: NavPath,
    #[serde(default)]
    pub enable_quick_link: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MegaMenu {
    pub id: u64,
    pub title: String,
    pub path: NavPath,
    pub menu_id: u64,
    #[serde(default)]
    pub enable_quick_link: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubMegaMenu {
    pub id: u64,
    pub title: String,
    pub path: NavPath,
    pub menu_id: u64,
    pub mega_menu_id: u64,
    #[serde(default)]
    pub enable_quick_link: bool,
}

/// Common view of a node at any level.
pub trait MenuNode {
    const LEVEL: MenuLevel;

    fn id(&self) -> u64;
    fn title(&self) -> &str;
    fn path(&self) -> &NavPath;
    fn quick_link(&self) -> bool;
}

impl MenuNode for Menu {
    const LEVEL: MenuLevel = MenuLevel::Menu;

    fn id(&self) -> u64 {
        self.id
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn path(&self) -> &NavPath {
        &self.path
    }
    fn quick_link(&self) -> bool {
        self.enable_quick_link
    }
}

impl MenuNode for MegaMenu {
    const LEVEL: MenuLevel = MenuLevel::MegaMenu;

    fn id(&self) -> u64 {
        self.id
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn path(&self) -> &NavPath {
        &self.path
    }
    fn quick_link(&self) -> bool {
        self.enable_quick_link
    }
}

impl MenuNode for SubMegaMenu {
    const LEVEL: MenuLevel = MenuLevel::SubMegaMenu;

    fn id(&self) -> u64 {
        self.id
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn path(&self) -> &NavPath {
        &self.path
    }
    fn quick_link(&self) -> bool {
        self.enable_quick_link
    }
}

// ============================================================================
// Form fields
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuFields {
    pub title: String,
    pub path: String,
    pub enable_quick_link: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MegaMenuFields {
    pub menu_id: Option<u64>,
    pub title: String,
    pub path: String,
    pub enable_quick_link: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubMegaMenuFields {
    pub menu_id: Option<u64>,
    pub mega_menu_id: Option<u64>,
    pub title: String,
    pub path: String,
    pub enable_quick_link: bool,
}

/// Title and path checks shared by all three forms.
fn validate_common(title: &str, path: &str, errors: &mut FormErrors) -> Option<NavPath> {
    if title.trim().is_empty() {
        errors.insert("title", "title is required");
    }
    match NavPath::parse(path) {
        Ok(p) => Some(p),
        Err(e) => {
            errors.insert("path", e.to_string());
            None
        }
    }
}

// ============================================================================
// Storage
// ============================================================================

/// Rows of one level plus its id counter. Ids are never reused, so children
/// of a deleted parent can't silently re-attach to a new record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table<T> {
    #[serde(default)]
    next_id: u64,
    rows: Vec<T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: Vec::new(),
        }
    }
}

impl<T: MenuNode + Clone> Table<T> {
    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn get(&self, id: u64) -> Option<&T> {
        self.rows.iter().find(|r| r.id() == id)
    }

    fn allocate_id(&mut self) -> u64 {
        let max = self.rows.iter().map(MenuNode::id).max().unwrap_or(0);
        let id = self.next_id.max(max + 1);
        self.next_id = id + 1;
        id
    }

    fn insert(&mut self, row: T) -> T {
        self.rows.push(row.clone());
        row
    }

    fn replace(&mut self, row: T) -> Result<T, MenuError> {
        let id = row.id();
        let slot = self
            .rows
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or(MenuError::NotFound { level: T::LEVEL, id })?;
        *slot = row.clone();
        Ok(row)
    }

    fn remove(&mut self, id: u64) -> Result<T, MenuError> {
        let pos = self
            .rows
            .iter()
            .position(|r| r.id() == id)
            .ok_or(MenuError::NotFound { level: T::LEVEL, id })?;
        Ok(self.rows.remove(pos))
    }
}

/// All three navigation levels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MenuTree {
    pub menus: Table<Menu>,
    pub mega_menus: Table<MegaMenu>,
    pub sub_mega_menus: Table<SubMegaMenu>,
}

impl MenuTree {
    pub fn menu(&self, id: u64) -> Option<&Menu> {
        self.menus.get(id)
    }

    pub fn mega_menu(&self, id: u64) -> Option<&MegaMenu> {
        self.mega_menus.get(id)
    }

    pub fn sub_mega_menu(&self, id: u64) -> Option<&SubMegaMenu> {
        self.sub_mega_menus.get(id)
    }

    /// All menus, in creation order.
    pub fn list_menus(&self) -> Vec<Menu> {
        self.menus.rows().to_vec()
    }

    /// Mega menus under `menu_id`.
    pub fn list_mega_menus(&self, menu_id: u64) -> Vec<MegaMenu> {
        self.mega_menus
            .rows()
            .iter()
            .filter(|m| m.menu_id == menu_id)
            .cloned()
            .collect()
    }

    /// Sub mega menus under `(menu_id, mega_menu_id)`.
    pub fn list_sub_mega_menus(&self, menu_id: u64, mega_menu_id: u64) -> Vec<SubMegaMenu> {
        self.sub_mega_menus
            .rows()
            .iter()
            .filter(|s| s.menu_id == menu_id && s.mega_menu_id == mega_menu_id)
            .cloned()
            .collect()
    }

    pub fn create_menu(&mut self, fields: MenuFields) -> Result<Menu, MenuError> {
        let path = self.validate_menu(&fields)?;
        let menu = Menu {
            id: self.menus.allocate_id(),
            title: fields.title.trim().to_string(),
            path,
            enable_quick_link: fields.enable_quick_link,
        };
        debug!(id = menu.id, path = %menu.path, "created menu");
        Ok(self.menus.insert(menu))
    }

    pub fn update_menu(&mut self, id: u64, fields: MenuFields) -> Result<Menu, MenuError> {
        if self.menus.get(id).is_none() {
            return Err(MenuError::NotFound {
                level: MenuLevel::Menu,
                id,
            });
        }
        let path = self.validate_menu(&fields)?;
        self.menus.replace(Menu {
            id,
            title: fields.title.trim().to_string(),
            path,
            enable_quick_link: fields.enable_quick_link,
        })
    }

    pub fn delete_menu(&mut self, id: u64) -> Result<(), MenuError> {
        self.menus.remove(id)?;
        debug!(id, "deleted menu");
        Ok(())
    }

    pub fn create_mega_menu(&mut self, fields: MegaMenuFields) -> Result<MegaMenu, MenuError> {
        let (menu_id, path) = self.validate_mega_menu(&fields)?;
        let mega = MegaMenu {
            id: self.mega_menus.allocate_id(),
            title: fields.title.trim().to_string(),
            path,
            menu_id,
            enable_quick_link: fields.enable_quick_link,
        };
        debug!(id = mega.id, menu_id, path = %mega.path, "created mega menu");
        Ok(self.mega_menus.insert(mega))
    }

    pub fn update_mega_menu(
        &mut self,
        id: u64,
        fields: MegaMenuFields,
    ) -> Result<MegaMenu, MenuError> {
        if self.mega_menus.get(id).is_none() {
            return Err(MenuError::NotFound {
                level: MenuLevel::MegaMenu,
                id,
            });
        }
        let (menu_id, path) = self.validate_mega_menu(&fields)?;
        self.mega_menus.replace(MegaMenu {
            id,
            title: fields.title.trim().to_string(),
            path,
            menu_id,
            enable_quick_link: fields.enable_quick_link,
        })
    }

    pub fn delete_mega_menu(&mut self, id: u64) -> Result<(), MenuError> {
        self.mega_menus.remove(id)?;
        debug!(id, "deleted mega menu");
        Ok(())
    }

    pub fn create_sub_mega_menu(
        &mut self,
        fields: SubMegaMenuFields,
    ) -> Result<SubMegaMenu, MenuError> {
        let (menu_id, mega_menu_id, path) = self.validate_sub_mega_menu(&fields)?;
        let sub = SubMegaMenu {
            id: self.sub_mega_menus.allocate_id(),
            title: fields.title.trim().to_string(),
            path,
            menu_id,
            mega_menu_id,
            enable_quick_link: fields.enable_quick_link,
        };
        debug!(id = sub.id, menu_id, mega_menu_id, path = %sub.path, "created sub mega menu");
        Ok(self.sub_mega_menus.insert(sub))
    }

    pub fn update_sub_mega_menu(
        &mut self,
        id: u64,
        fields: SubMegaMenuFields,
    ) -> Result<SubMegaMenu, MenuError> {
        if self.sub_mega_menus.get(id).is_none() {
            return Err(MenuError::NotFound {
                level: MenuLevel::SubMegaMenu,
                id,
            });
        }
        let (menu_id, mega_menu_id, path) = self.validate_sub_mega_menu(&fields)?;
        self.sub_mega_menus.replace(SubMegaMenu {
            id,
            title: fields.title.trim().to_string(),
            path,
            menu_id,
            mega_menu_id,
            enable_quick_link: fields.enable_quick_link,
        })
    }

    pub fn delete_sub_mega_menu(&mut self, id: u64) -> Result<(), MenuError> {
        self.sub_mega_menus.remove(id)?;
        debug!(id, "deleted sub mega menu");
        Ok(())
    }

    /// Nodes with quick links enabled, across all levels, as `(title, path)`.
    pub fn quick_links(&self) -> Vec<(&str, &NavPath)> {
        fn collect<'a, T: MenuNode>(rows: &'a [T], out: &mut Vec<(&'a str, &'a NavPath)>) {
            out.extend(
                rows.iter()
                    .filter(|r| r.quick_link())
                    .map(|r| (r.title(), r.path())),
            );
        }
        let mut out = Vec::new();
        collect(self.menus.rows(), &mut out);
        collect(self.mega_menus.rows(), &mut out);
        collect(self.sub_mega_menus.rows(), &mut out);
        out
    }

    fn validate_menu(&self, fields: &MenuFields) -> Result<NavPath, MenuError> {
        let mut errors = FormErrors::default();
        let path = validate_common(&fields.title, &fields.path, &mut errors);
        match path {
            Some(path) if errors.is_empty() => Ok(path),
            _ => Err(invalid(MenuLevel::Menu, errors)),
        }
    }

    fn validate_mega_menu(&self, fields: &MegaMenuFields) -> Result<(u64, NavPath), MenuError> {
        let mut errors = FormErrors::default();
        let path = validate_common(&fields.title, &fields.path, &mut errors);
        let menu_id = self.check_menu_parent(fields.menu_id, &mut errors);
        match (menu_id, path) {
            (Some(menu_id), Some(path)) if errors.is_empty() => Ok((menu_id, path)),
            _ => Err(invalid(MenuLevel::MegaMenu, errors)),
        }
    }

    fn validate_sub_mega_menu(
        &self,
        fields: &SubMegaMenuFields,
    ) -> Result<(u64, u64, NavPath), MenuError> {
        let mut errors = FormErrors::default();
        let path = validate_common(&fields.title, &fields.path, &mut errors);
        let menu_id = self.check_menu_parent(fields.menu_id, &mut errors);
        let mega_menu_id = match fields.mega_menu_id {
            None => {
                errors.insert("megaMenuId", "select a mega menu");
                None
            }
            Some(id) => match self.mega_menu(id) {
                None => {
                    errors.insert("megaMenuId", format!("mega menu {id} does not exist"));
                    None
                }
                Some(mega) if menu_id.is_some_and(|m| m != mega.menu_id) => {
                    errors.insert(
                        "megaMenuId",
                        format!("mega menu {id} does not belong to the selected menu"),
                    );
                    None
                }
                Some(_) => Some(id),
            },
        };
        match (menu_id, mega_menu_id, path) {
            (Some(menu_id), Some(mega_menu_id), Some(path)) if errors.is_empty() => {
                Ok((menu_id, mega_menu_id, path))
            }
            _ => Err(invalid(MenuLevel::SubMegaMenu, errors)),
        }
    }

    fn check_menu_parent(&self, menu_id: Option<u64>, errors: &mut FormErrors) -> Option<u64> {
        match menu_id {
            None => {
                errors.insert("menuId", "select a menu");
                None
            }
            Some(id) if self.menu(id).is_none() => {
                errors.insert("menuId", format!("menu {id} does not exist"));
                None
            }
            Some(id) => Some(id),
        }
    }
}

// ============================================================================
// Selection
// ============================================================================

/// Cascading picker state: which menu, mega menu and sub mega menu are chosen.
///
/// Immutable; [`Selection::select`] returns the next state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub menu_id: Option<u64>,
    pub mega_menu_id: Option<u64>,
    pub sub_mega_menu_id: Option<u64>,
}

impl Selection {
    /// Choose `id` at `level`. Picking a different value clears every level
    /// below it; re-picking the current value changes nothing.
    pub fn select(self, level: MenuLevel, id: Option<u64>) -> Self {
        match level {
            MenuLevel::Menu if self.menu_id != id => Selection {
                menu_id: id,
                mega_menu_id: None,
                sub_mega_menu_id: None,
            },
            MenuLevel::MegaMenu if self.mega_menu_id != id => Selection {
                mega_menu_id: id,
                sub_mega_menu_id: None,
                ..self
            },
            MenuLevel::SubMegaMenu => Selection {
                sub_mega_menu_id: id,
                ..self
            },
            _ => self,
        }
    }
}
