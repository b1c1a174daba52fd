//! The section document model.
//!
//! A [`ContentDocument`] is a page title plus an ordered list of [`Section`]s,
//! optionally placed under a menu, mega-menu or sub-mega-menu.
//!
//! Every list operation here is pure: it takes a slice and returns a new
//! `Vec`, leaving the input untouched. The editor and the preview both read
//! the same list, so nothing is ever mutated in place behind a reader's back.
//!
//! | Operation | Result |
//! |-----------|--------|
//! | [`append`] | new section of the given type, registry defaults, at the end |
//! | [`remove_at`] | entry at `index` removed |
//! | [`update_data_at`] | payload at `index` replaced, tag kept, no validation |
//! | [`move_to`] | entry moved from `from` to `to`, others shifted by one |
//!
//! The same append / remove / update-at-index pattern applies one level
//! deeper to list-valued payload fields: hero slider slides, list items and
//! image grid tiles (addressed by slot name, `image1`, `image2`, ...).

use crate::normalize::normalize_document;
use crate::section::{GridImage, HeroData, MAX_GRID_SLOTS, Section, SectionType, grid_slot_index};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("index {index} is out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("section {index} is `{found}`, expected `{expected}`")]
    WrongSectionType {
        index: usize,
        expected: SectionType,
        found: String,
    },
    #[error("unknown image grid slot `{0}` (expected image1 to image{max})", max = MAX_GRID_SLOTS)]
    UnknownSlot(String),
}

/// A page: title plus ordered sections, with an optional menu placement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mega_menu_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_mega_menu_id: Option<u64>,
}

/// Where a document hangs in the menu tree, by its most specific id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    Unplaced,
    Menu(u64),
    MegaMenu(u64),
    SubMegaMenu(u64),
}

impl ContentDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Parse a document from JSON, decoding double-encoded fields first.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Build a document from an already-parsed value, decoding
    /// double-encoded fields first.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(normalize_document(value))
    }

    /// True when there is no title and no sections.
    pub fn is_blank(&self) -> bool {
        self.title.is_empty() && self.sections.is_empty()
    }

    pub fn placement(&self) -> Placement {
        match (self.sub_mega_menu_id, self.mega_menu_id, self.menu_id) {
            (Some(id), _, _) => Placement::SubMegaMenu(id),
            (None, Some(id), _) => Placement::MegaMenu(id),
            (None, None, Some(id)) => Placement::Menu(id),
            (None, None, None) => Placement::Unplaced,
        }
    }

    /// Indices and tags of sections this build cannot interpret.
    pub fn opaque_sections(&self) -> Vec<(usize, &str)> {
        self.sections
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_opaque())
            .map(|(i, s)| (i, s.tag()))
            .collect()
    }
}

// ============================================================================
// Generic list helpers
// ============================================================================

fn check_index(index: usize, len: usize) -> Result<(), DocumentError> {
    if index < len {
        Ok(())
    } else {
        Err(DocumentError::IndexOutOfRange { index, len })
    }
}

/// `items` with `item` appended.
pub fn appended<T: Clone>(items: &[T], item: T) -> Vec<T> {
    let mut out = items.to_vec();
    out.push(item);
    out
}

/// `items` without the entry at `index`.
pub fn removed<T: Clone>(items: &[T], index: usize) -> Result<Vec<T>, DocumentError> {
    check_index(index, items.len())?;
    let mut out = items.to_vec();
    out.remove(index);
    Ok(out)
}

/// `items` with the entry at `index` replaced.
pub fn replaced<T: Clone>(items: &[T], index: usize, item: T) -> Result<Vec<T>, DocumentError> {
    check_index(index, items.len())?;
    let mut out = items.to_vec();
    out[index] = item;
    Ok(out)
}

/// `items` with the entry at `from` re-inserted at `to`.
pub fn moved<T: Clone>(items: &[T], from: usize, to: usize) -> Result<Vec<T>, DocumentError> {
    check_index(from, items.len())?;
    check_index(to, items.len())?;
    let mut out = items.to_vec();
    if from != to {
        let item = out.remove(from);
        out.insert(to, item);
    }
    Ok(out)
}

// ============================================================================
// Section list operations
// ============================================================================

/// Append a new section of `kind` carrying the registry's default payload.
pub fn append(sections: &[Section], kind: SectionType) -> Vec<Section> {
    appended(sections, kind.default_section())
}

pub fn remove_at(sections: &[Section], index: usize) -> Result<Vec<Section>, DocumentError> {
    removed(sections, index)
}

/// Replace the payload at `index`, keeping its tag.
///
/// The payload is not validated against the tag's schema. One that doesn't
/// fit turns the section opaque under the same tag rather than failing.
pub fn update_data_at(
    sections: &[Section],
    index: usize,
    data: Value,
) -> Result<Vec<Section>, DocumentError> {
    check_index(index, sections.len())?;
    let updated = Section::from_parts(sections[index].tag(), data);
    replaced(sections, index, updated)
}

pub fn move_to(sections: &[Section], from: usize, to: usize) -> Result<Vec<Section>, DocumentError> {
    moved(sections, from, to)
}

/// Clone the section at `index`, apply `f`, and return the list with the
/// result swapped in.
fn with_section(
    sections: &[Section],
    index: usize,
    f: impl FnOnce(&mut Section) -> Result<(), DocumentError>,
) -> Result<Vec<Section>, DocumentError> {
    check_index(index, sections.len())?;
    let mut section = sections[index].clone();
    f(&mut section)?;
    replaced(sections, index, section)
}

fn wrong_type(index: usize, expected: SectionType, found: &Section) -> DocumentError {
    DocumentError::WrongSectionType {
        index,
        expected,
        found: found.tag().to_string(),
    }
}

// ============================================================================
// Nested list operations
// ============================================================================

/// Append an empty slide to the hero slider at `index`.
pub fn append_slide(sections: &[Section], index: usize) -> Result<Vec<Section>, DocumentError> {
    with_section(sections, index, |section| match section {
        Section::HeroSlider(d) => {
            d.hero_images = appended(&d.hero_images, HeroData::default());
            Ok(())
        }
        other => Err(wrong_type(index, SectionType::HeroSlider, other)),
    })
}

pub fn remove_slide(
    sections: &[Section],
    index: usize,
    slide: usize,
) -> Result<Vec<Section>, DocumentError> {
    with_section(sections, index, |section| match section {
        Section::HeroSlider(d) => {
            d.hero_images = removed(&d.hero_images, slide)?;
            Ok(())
        }
        other => Err(wrong_type(index, SectionType::HeroSlider, other)),
    })
}

pub fn update_slide(
    sections: &[Section],
    index: usize,
    slide: usize,
    data: HeroData,
) -> Result<Vec<Section>, DocumentError> {
    with_section(sections, index, |section| match section {
        Section::HeroSlider(d) => {
            d.hero_images = replaced(&d.hero_images, slide, data)?;
            Ok(())
        }
        other => Err(wrong_type(index, SectionType::HeroSlider, other)),
    })
}

/// Append `item` to the list section at `index`.
pub fn append_item(
    sections: &[Section],
    index: usize,
    item: impl Into<String>,
) -> Result<Vec<Section>, DocumentError> {
    let item = item.into();
    with_section(sections, index, |section| match section {
        Section::List(d) => {
            d.items = appended(&d.items, item);
            Ok(())
        }
        other => Err(wrong_type(index, SectionType::List, other)),
    })
}

pub fn remove_item(
    sections: &[Section],
    index: usize,
    item: usize,
) -> Result<Vec<Section>, DocumentError> {
    with_section(sections, index, |section| match section {
        Section::List(d) => {
            d.items = removed(&d.items, item)?;
            Ok(())
        }
        other => Err(wrong_type(index, SectionType::List, other)),
    })
}

pub fn update_item(
    sections: &[Section],
    index: usize,
    item: usize,
    text: impl Into<String>,
) -> Result<Vec<Section>, DocumentError> {
    let text = text.into();
    with_section(sections, index, |section| match section {
        Section::List(d) => {
            d.items = replaced(&d.items, item, text)?;
            Ok(())
        }
        other => Err(wrong_type(index, SectionType::List, other)),
    })
}

/// Set the image path of a grid tile addressed by slot name (`image1`, ...).
///
/// Slots past the current tile count grow the grid with empty tiles.
pub fn set_grid_slot(
    sections: &[Section],
    index: usize,
    slot: &str,
    src: impl Into<String>,
) -> Result<Vec<Section>, DocumentError> {
    let position =
        grid_slot_index(slot).ok_or_else(|| DocumentError::UnknownSlot(slot.to_string()))?;
    let src = src.into();
    with_section(sections, index, |section| match section {
        Section::ImageGrid(d) => {
            if d.images.len() <= position {
                d.images.resize(position + 1, GridImage::default());
            }
            d.images[position].src = src;
            Ok(())
        }
        other => Err(wrong_type(index, SectionType::ImageGrid, other)),
    })
}

pub fn append_grid_image(
    sections: &[Section],
    index: usize,
    image: GridImage,
) -> Result<Vec<Section>, DocumentError> {
    with_section(sections, index, |section| match section {
        Section::ImageGrid(d) => {
            d.images = appended(&d.images, image);
            Ok(())
        }
        other => Err(wrong_type(index, SectionType::ImageGrid, other)),
    })
}

pub fn remove_grid_image(
    sections: &[Section],
    index: usize,
    tile: usize,
) -> Result<Vec<Section>, DocumentError> {
    with_section(sections, index, |section| match section {
        Section::ImageGrid(d) => {
            d.images = removed(&d.images, tile)?;
            Ok(())
        }
        other => Err(wrong_type(index, SectionType::ImageGrid, other)),
    })
}
