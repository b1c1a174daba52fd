//! Content editing session.
//!
//! An [`EditorSession`] owns the working copy of one [`ContentDocument`] and
//! walks it through four states:
//!
//! ```text
//!            edit                begin_save            complete_save(Ok)
//! Empty ──────────────► Editing ────────────► Saving ─────────────────► Saved
//!                         ▲                     │                         │
//!                         └─── complete_save(Err)                         │
//!                         └──────────────────── edit ─────────────────────┘
//! ```
//!
//! Edits are rejected with [`EditorError::SaveInFlight`] while a save is in
//! flight, so the snapshot handed to the store is always the document the
//! user sees, and a failed save puts the session back in `Editing` with the
//! title and sections exactly as they were.
//!
//! Saving and loading are split into a `begin_*` step that hands out a ticket
//! and a `complete_*` step that applies the store's response. Callers that
//! talk to a store synchronously use [`EditorSession::save`] and
//! [`EditorSession::load`], which run both steps.
//!
//! Every edit bumps a revision counter. A load response is applied only if
//! nothing changed since the load was issued, so a slow response can't
//! overwrite newer local edits.
//!
//! Sections have no identity of their own. The session keeps a parallel list
//! of synthetic keys (one per section, assigned on insert, never reused) so a
//! preview can track entries across reorders.

use crate::document::{self, ContentDocument, DocumentError};
use crate::menu::Selection;
use crate::section::{
    HeroData, HeroSliderData, ImageGridData, ListData, Section, SectionType, TextData,
};
use crate::store::{ContentStore, StoreError};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("{0}")]
    Validation(String),
    #[error("content {0} no longer exists; it will be saved as new content")]
    NotFound(u64),
    #[error("store unavailable: {0}")]
    TransientIo(String),
    #[error("{0}")]
    SchemaMismatch(String),
    #[error("a save is already in progress")]
    SaveInFlight,
    #[error("index {index} is out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },
}

impl From<DocumentError> for EditorError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::IndexOutOfRange { index, len } => {
                EditorError::IndexOutOfRange { index, len }
            }
            other => EditorError::SchemaMismatch(other.to_string()),
        }
    }
}

impl EditorError {
    /// Map a store failure for content `id` onto the editor taxonomy.
    fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => EditorError::NotFound(id),
            other => EditorError::TransientIo(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Empty,
    Editing,
    Saving,
    Saved,
}

/// Move the section at `from` to `to`. Produced by the preview's drag
/// handling, applied with [`EditorSession::reorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reorder {
    pub from: usize,
    pub to: usize,
}

/// A save that has been started. Carries the snapshot to send.
#[derive(Debug)]
pub struct SaveTicket {
    document: ContentDocument,
}

impl SaveTicket {
    pub fn document(&self) -> &ContentDocument {
        &self.document
    }

    /// True when the store should create a new record rather than update.
    pub fn is_create(&self) -> bool {
        self.document.id.is_none()
    }
}

#[derive(Debug)]
pub enum SaveRequest {
    Started(SaveTicket),
    /// A save is already running; nothing new was started.
    AlreadyInFlight,
}

/// What the store did with a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created(u64),
    Updated,
}

/// A load that has been started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub id: u64,
    revision: u64,
}

#[derive(Debug, Clone)]
pub struct EditorSession {
    document: ContentDocument,
    keys: Vec<u64>,
    next_key: u64,
    state: EditorState,
    revision: u64,
    last_error: Option<EditorError>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    pub fn new() -> Self {
        Self {
            document: ContentDocument::default(),
            keys: Vec::new(),
            next_key: 1,
            state: EditorState::Empty,
            revision: 0,
            last_error: None,
        }
    }

    /// Start a session on an existing document.
    pub fn open(document: ContentDocument) -> Self {
        let mut session = Self::new();
        session.replace_document(document);
        session
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn document(&self) -> &ContentDocument {
        &self.document
    }

    pub fn title(&self) -> &str {
        &self.document.title
    }

    pub fn sections(&self) -> &[Section] {
        &self.document.sections
    }

    /// Synthetic keys, one per section, in section order.
    pub fn section_keys(&self) -> &[u64] {
        &self.keys
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The error from the most recent failed save, load or delete.
    pub fn last_error(&self) -> Option<&EditorError> {
        self.last_error.as_ref()
    }

    pub fn is_saving(&self) -> bool {
        self.state == EditorState::Saving
    }

    // ------------------------------------------------------------------
    // Edits
    // ------------------------------------------------------------------

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), EditorError> {
        self.guard()?;
        self.document.title = title.into();
        self.touch();
        Ok(())
    }

    /// Append a section of `kind` with its default payload. Returns its index.
    pub fn add_section(&mut self, kind: SectionType) -> Result<usize, EditorError> {
        self.guard()?;
        self.document.sections = document::append(&self.document.sections, kind);
        let key = self.allocate_key();
        self.keys.push(key);
        self.touch();
        debug!(kind = %kind, key, "added section");
        Ok(self.document.sections.len() - 1)
    }

    /// Remove the section at `index`. Works for opaque sections too.
    pub fn remove_section(&mut self, index: usize) -> Result<Section, EditorError> {
        self.guard()?;
        let removed = self
            .document
            .sections
            .get(index)
            .cloned()
            .ok_or(EditorError::IndexOutOfRange {
                index,
                len: self.document.sections.len(),
            })?;
        self.document.sections = document::remove_at(&self.document.sections, index)?;
        self.keys.remove(index);
        self.touch();
        debug!(index, tag = removed.tag(), "removed section");
        Ok(removed)
    }

    /// Replace the raw payload at `index`, keeping the tag.
    pub fn edit_section_data(&mut self, index: usize, data: Value) -> Result<(), EditorError> {
        self.apply(|sections| document::update_data_at(sections, index, data))
    }

    pub fn edit_hero(&mut self, index: usize, data: HeroData) -> Result<(), EditorError> {
        self.replace_typed(index, Section::Hero(data))
    }

    pub fn edit_hero_slider(
        &mut self,
        index: usize,
        data: HeroSliderData,
    ) -> Result<(), EditorError> {
        self.replace_typed(index, Section::HeroSlider(data))
    }

    pub fn edit_image_grid(&mut self, index: usize, data: ImageGridData) -> Result<(), EditorError> {
        self.replace_typed(index, Section::ImageGrid(data))
    }

    pub fn edit_list(&mut self, index: usize, data: ListData) -> Result<(), EditorError> {
        self.replace_typed(index, Section::List(data))
    }

    pub fn edit_text(&mut self, index: usize, data: TextData) -> Result<(), EditorError> {
        self.replace_typed(index, Section::Text(data))
    }

    pub fn add_slide(&mut self, index: usize) -> Result<(), EditorError> {
        self.apply(|sections| document::append_slide(sections, index))
    }

    pub fn remove_slide(&mut self, index: usize, slide: usize) -> Result<(), EditorError> {
        self.apply(|sections| document::remove_slide(sections, index, slide))
    }

    pub fn edit_slide(
        &mut self,
        index: usize,
        slide: usize,
        data: HeroData,
    ) -> Result<(), EditorError> {
        self.apply(|sections| document::update_slide(sections, index, slide, data))
    }

    pub fn add_list_item(
        &mut self,
        index: usize,
        item: impl Into<String>,
    ) -> Result<(), EditorError> {
        self.apply(|sections| document::append_item(sections, index, item))
    }

    pub fn remove_list_item(&mut self, index: usize, item: usize) -> Result<(), EditorError> {
        self.apply(|sections| document::remove_item(sections, index, item))
    }

    pub fn edit_list_item(
        &mut self,
        index: usize,
        item: usize,
        text: impl Into<String>,
    ) -> Result<(), EditorError> {
        self.apply(|sections| document::update_item(sections, index, item, text))
    }

    /// Set a grid tile's image by slot name (`image1`, `image2`, ...).
    pub fn set_grid_slot(
        &mut self,
        index: usize,
        slot: &str,
        src: impl Into<String>,
    ) -> Result<(), EditorError> {
        self.apply(|sections| document::set_grid_slot(sections, index, slot, src))
    }

    pub fn reorder(&mut self, reorder: Reorder) -> Result<(), EditorError> {
        self.guard()?;
        let Reorder { from, to } = reorder;
        self.document.sections = document::move_to(&self.document.sections, from, to)?;
        self.keys = document::moved(&self.keys, from, to)?;
        self.touch();
        debug!(from, to, "reordered sections");
        Ok(())
    }

    /// Place the document under the chosen menu nodes.
    pub fn place(&mut self, selection: Selection) -> Result<(), EditorError> {
        self.guard()?;
        self.document.menu_id = selection.menu_id;
        self.document.mega_menu_id = selection.mega_menu_id;
        self.document.sub_mega_menu_id = selection.sub_mega_menu_id;
        self.touch();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Save
    // ------------------------------------------------------------------

    /// Snapshot the document and enter `Saving`.
    ///
    /// A blank document or one without a title is rejected with
    /// [`EditorError::Validation`] and the state is left alone.
    pub fn begin_save(&mut self) -> Result<SaveRequest, EditorError> {
        if self.state == EditorState::Saving {
            debug!("save requested while one is in flight");
            return Ok(SaveRequest::AlreadyInFlight);
        }
        if self.document.title.trim().is_empty() {
            let err = EditorError::Validation("title is required".to_string());
            self.last_error = Some(err.clone());
            return Err(err);
        }
        self.state = EditorState::Saving;
        debug!(id = ?self.document.id, "save started");
        Ok(SaveRequest::Started(SaveTicket {
            document: self.document.clone(),
        }))
    }

    /// Apply the store's response to a save started with [`begin_save`].
    ///
    /// A created document clears the working copy; an updated one is kept.
    /// On failure the session returns to `Editing` with the document as it
    /// was, and a `NotFound` drops the id so the next save creates.
    ///
    /// [`begin_save`]: EditorSession::begin_save
    pub fn complete_save(
        &mut self,
        ticket: SaveTicket,
        result: Result<SaveOutcome, StoreError>,
    ) -> Result<SaveOutcome, EditorError> {
        if self.state != EditorState::Saving {
            warn!(id = ?ticket.document.id, "save response with no save in flight");
        }
        match result {
            Ok(SaveOutcome::Created(id)) => {
                info!(id, title = %ticket.document.title, "content created");
                self.reset();
                self.state = EditorState::Saved;
                Ok(SaveOutcome::Created(id))
            }
            Ok(SaveOutcome::Updated) => {
                info!(id = ?self.document.id, title = %self.document.title, "content updated");
                self.state = EditorState::Saved;
                self.last_error = None;
                Ok(SaveOutcome::Updated)
            }
            Err(err) => {
                let err = EditorError::from_store(err);
                if matches!(err, EditorError::NotFound(_)) {
                    self.document.id = None;
                }
                warn!(error = %err, "save failed");
                self.state = EditorState::Editing;
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Save through `store`, creating or updating depending on whether the
    /// document has an id.
    pub fn save(&mut self, store: &mut dyn ContentStore) -> Result<SaveOutcome, EditorError> {
        let ticket = match self.begin_save()? {
            SaveRequest::Started(ticket) => ticket,
            SaveRequest::AlreadyInFlight => return Err(EditorError::SaveInFlight),
        };
        let result = match ticket.document.id {
            Some(id) => store
                .update_content(id, &ticket.document)
                .map(|()| SaveOutcome::Updated),
            None => store
                .create_content(&ticket.document)
                .map(SaveOutcome::Created),
        };
        self.complete_save(ticket, result)
    }

    // ------------------------------------------------------------------
    // Load / delete
    // ------------------------------------------------------------------

    /// Issue a load of content `id`. A later edit or load makes this ticket
    /// stale.
    pub fn begin_load(&mut self, id: u64) -> Result<LoadTicket, EditorError> {
        self.guard()?;
        self.revision += 1;
        Ok(LoadTicket {
            id,
            revision: self.revision,
        })
    }

    /// Apply a load response. Returns `Ok(false)` when the response was
    /// stale and discarded.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<ContentDocument, StoreError>,
    ) -> Result<bool, EditorError> {
        if ticket.revision != self.revision || self.state == EditorState::Saving {
            debug!(id = ticket.id, "discarding stale load response");
            return Ok(false);
        }
        match result {
            Ok(document) => {
                debug!(id = ticket.id, sections = document.sections.len(), "loaded content");
                self.replace_document(document);
                Ok(true)
            }
            Err(err) => {
                let err = EditorError::from_store(err);
                if matches!(err, EditorError::NotFound(_)) && self.document.id == Some(ticket.id) {
                    self.document.id = None;
                }
                warn!(id = ticket.id, error = %err, "load failed");
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    pub fn load(&mut self, store: &dyn ContentStore, id: u64) -> Result<(), EditorError> {
        let ticket = self.begin_load(id)?;
        self.complete_load(ticket, store.get_content(id)).map(|_| ())
    }

    /// Delete the stored document and reset the session.
    pub fn delete(&mut self, store: &mut dyn ContentStore) -> Result<(), EditorError> {
        self.guard()?;
        let id = self
            .document
            .id
            .ok_or_else(|| EditorError::Validation("content has not been saved".to_string()))?;
        match store.delete_content(id) {
            Ok(()) => {
                info!(id, "content deleted");
                self.reset();
                Ok(())
            }
            Err(err) => {
                let err = EditorError::from_store(err);
                if matches!(err, EditorError::NotFound(_)) {
                    self.document.id = None;
                }
                warn!(id, error = %err, "delete failed");
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn guard(&self) -> Result<(), EditorError> {
        if self.state == EditorState::Saving {
            return Err(EditorError::SaveInFlight);
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.state = EditorState::Editing;
    }

    fn allocate_key(&mut self) -> u64 {
        let key = self.next_key;
        self.next_key += 1;
        key
    }

    /// Run a length-preserving document operation over the sections.
    fn apply(
        &mut self,
        f: impl FnOnce(&[Section]) -> Result<Vec<Section>, DocumentError>,
    ) -> Result<(), EditorError> {
        self.guard()?;
        self.document.sections = f(&self.document.sections)?;
        self.touch();
        Ok(())
    }

    fn replace_typed(&mut self, index: usize, section: Section) -> Result<(), EditorError> {
        self.guard()?;
        let len = self.document.sections.len();
        let current = self
            .document
            .sections
            .get(index)
            .ok_or(EditorError::IndexOutOfRange { index, len })?;
        if current.kind() != section.kind() {
            return Err(EditorError::SchemaMismatch(format!(
                "section {index} is `{}`, not `{}`",
                current.tag(),
                section.tag()
            )));
        }
        self.document.sections = document::replaced(&self.document.sections, index, section)?;
        self.touch();
        Ok(())
    }

    fn replace_document(&mut self, document: ContentDocument) {
        let keys: Vec<u64> = (0..document.sections.len())
            .map(|_| self.allocate_key())
            .collect();
        self.keys = keys;
        self.state = if document.is_blank() {
            EditorState::Empty
        } else {
            EditorState::Editing
        };
        self.document = document;
        self.revision += 1;
        self.last_error = None;
    }

    /// Clear the working copy. Keys keep counting so they are never reused.
    fn reset(&mut self) {
        self.document = ContentDocument::default();
        self.keys.clear();
        self.state = EditorState::Empty;
        self.revision += 1;
        self.last_error = None;
    }
}
