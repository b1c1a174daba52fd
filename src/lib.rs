//! # Simple CMS
//!
//! The content core of a small CMS: page content authored as an ordered list
//! of typed sections, a three-level navigation tree, an editing session that
//! persists through a store it doesn't own, and an HTML renderer for the
//! public site.
//!
//! # Architecture
//!
//! ```text
//! site.json ──normalize──► SiteStore ──► EditorSession ──save──► SiteStore ──► site.json
//!                            │  menus       │    ▲
//!                            │              ▼    │ Reorder
//!                            │            Preview (borrows the session's sections)
//!                            ▼
//!                         render ──► dist/
//! ```
//!
//! A page is a [`document::ContentDocument`]: a title, a list of
//! [`section::Section`]s and an optional place in the menu tree. The editor
//! builds and changes documents through pure list operations; the preview
//! reads the same list and proposes reorders; the renderer turns stored
//! documents into HTML pages at the path of the menu node they hang under.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`section`] | Section types, per-type payloads, and the registry (tag → defaults + renderer) |
//! | [`document`] | `ContentDocument` and pure add/remove/update/move operations over sections |
//! | [`editor`] | Editing session state machine: edits, two-phase save and load |
//! | [`menu`] | Menu → MegaMenu → SubMegaMenu CRUD, path validation, cascading selection |
//! | [`preview`] | Borrowed view over an editor's sections with drag reordering |
//! | [`normalize`] | Decoding of double-encoded JSON, applied once on load |
//! | [`store`] | `ContentStore` / `MenuStore` / `ImageStore` traits and the file-backed `SiteStore` |
//! | [`render`] | Maud HTML for sections, navigation and pages; parallel site rendering |
//! | [`config`] | `config.toml` loading, validation, merging, and CSS generation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Sections Are a Sum Type
//!
//! Each registered tag is an enum variant carrying only its own fields, so
//! renderers and editors match exhaustively instead of guessing at shapes.
//! Anything that can't be interpreted, whether an unknown tag from a newer
//! schema or a payload that doesn't fit its tag, becomes
//! [`section::Section::Opaque`] and round-trips untouched.
//!
//! ## One Image Grid Shape
//!
//! Image grids are stored as a variable-length `images` list. The fixed
//! `image1`, `image2`, `image3` form is still accepted on input and migrated;
//! the editor addresses tiles by those slot names.
//!
//! ## Normalize Once
//!
//! Stored data can come back with nested JSON encoded as strings. That is
//! undone in exactly one place, [`normalize`], when data enters the crate,
//! and only where the schema expects an object or array: user text that
//! happens to look like JSON stays text. Nothing downstream re-parses strings.
//!
//! ## Failed Saves Lose Nothing
//!
//! The editor refuses edits while a save is in flight, so the snapshot sent
//! to the store is the document on screen. A failed save returns to
//! `Editing` with the document exactly as it was, ready for a retry.

pub mod config;
pub mod document;
pub mod editor;
pub mod menu;
pub mod normalize;
pub mod output;
pub mod preview;
pub mod render;
pub mod section;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;
