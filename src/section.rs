//! Section types and the section type registry.
//!
//! A page is an ordered list of [`Section`]s. Each section has a type tag
//! (`hero`, `heroSlider`, `imageGrid`, `list`, `text`) and a `data` payload
//! whose shape depends on the tag. On the wire a section looks like:
//!
//! ```json
//! { "type": "hero", "data": { "image": "", "heading": "", "subheading": "", "redirectPath": "" } }
//! ```
//!
//! In Rust the tag and the payload are one value: each registered tag is an
//! enum variant carrying only its own schema's fields. Sections that cannot be
//! interpreted (an unregistered tag from a newer schema version, or a payload
//! that doesn't fit its tag) become [`Section::Opaque`]. Opaque sections
//! round-trip unchanged, are skipped by renderers, and can still be removed
//! and reordered by the editor.
//!
//! ## Registry
//!
//! [`SectionType`] is the registry: for every registered tag it knows the
//! default payload inserted by [`crate::document::append`] and the
//! [`Renderer`] used by the public site and the editor preview. Lookups by tag
//! string ([`SectionType::parse`], [`renderer_for`]) return `None` for unknown
//! tags instead of failing.

use crate::render;
use maud::Markup;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Renders one section to HTML. Returns `None` when the section is not of the
/// renderer's type.
pub type Renderer = fn(&Section) -> Option<Markup>;

/// Registered section type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionType {
    Hero,
    HeroSlider,
    ImageGrid,
    List,
    Text,
}

impl SectionType {
    /// Every registered type, in the order the editor offers them.
    pub const ALL: [SectionType; 5] = [
        SectionType::Hero,
        SectionType::HeroSlider,
        SectionType::ImageGrid,
        SectionType::List,
        SectionType::Text,
    ];

    /// Wire tag for this type.
    pub fn tag(self) -> &'static str {
        match self {
            SectionType::Hero => "hero",
            SectionType::HeroSlider => "heroSlider",
            SectionType::ImageGrid => "imageGrid",
            SectionType::List => "list",
            SectionType::Text => "text",
        }
    }

    /// Human label shown in the editor's "add section" menu.
    pub fn label(self) -> &'static str {
        match self {
            SectionType::Hero => "Hero",
            SectionType::HeroSlider => "Hero Slider",
            SectionType::ImageGrid => "Image Grid",
            SectionType::List => "List",
            SectionType::Text => "Text",
        }
    }

    /// Look up a wire tag. Unknown tags return `None`.
    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.tag() == tag)
    }

    /// A fresh section of this type with its default payload.
    pub fn default_section(self) -> Section {
        match self {
            SectionType::Hero => Section::Hero(HeroData::default()),
            SectionType::HeroSlider => Section::HeroSlider(HeroSliderData::default()),
            SectionType::ImageGrid => Section::ImageGrid(ImageGridData::default()),
            SectionType::List => Section::List(ListData::default()),
            SectionType::Text => Section::Text(TextData::default()),
        }
    }

    /// The default payload as it appears on the wire.
    pub fn default_data(self) -> Value {
        self.default_section().data()
    }

    /// Renderer registered for this type.
    pub fn renderer(self) -> Renderer {
        match self {
            SectionType::Hero => render::hero_renderer,
            SectionType::HeroSlider => render::hero_slider_renderer,
            SectionType::ImageGrid => render::image_grid_renderer,
            SectionType::List => render::list_renderer,
            SectionType::Text => render::text_renderer,
        }
    }

    fn decode(self, data: Value) -> Result<Section, serde_json::Error> {
        // A missing payload means "all defaults", not a schema mismatch.
        let data = match data {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        Ok(match self {
            SectionType::Hero => Section::Hero(serde_json::from_value(data)?),
            SectionType::HeroSlider => Section::HeroSlider(serde_json::from_value(data)?),
            SectionType::ImageGrid => Section::ImageGrid(serde_json::from_value(data)?),
            SectionType::List => Section::List(serde_json::from_value(data)?),
            SectionType::Text => Section::Text(serde_json::from_value(data)?),
        })
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Renderer for a wire tag, or `None` if the tag is not registered.
pub fn renderer_for(tag: &str) -> Option<Renderer> {
    SectionType::parse(tag).map(SectionType::renderer)
}

/// Full-width banner: one image with a heading, subheading and a link target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeroData {
    pub image: String,
    pub heading: String,
    pub subheading: String,
    pub redirect_path: String,
}

/// A rotating set of hero banners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeroSliderData {
    pub hero_images: Vec<HeroData>,
}

impl Default for HeroSliderData {
    fn default() -> Self {
        Self {
            hero_images: vec![HeroData::default()],
        }
    }
}

/// One tile of an image grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridImage {
    pub src: String,
    pub title: String,
    pub description: String,
}

/// Number of tiles a new image grid starts with (`image1`..`image3`).
pub const DEFAULT_GRID_SLOTS: usize = 3;

/// Highest addressable fixed slot (`image24`).
pub const MAX_GRID_SLOTS: usize = 24;

/// An image grid.
///
/// The canonical form is variable-arity (`images: [...]`). Payloads written
/// by older editors use fixed slots (`image1`, `image2`, `image3`) holding
/// bare image paths; those are migrated into `images` when deserialized, so
/// `{"image2": "/b.jpg"}` becomes three tiles with only the second filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ImageGridWire", rename_all = "camelCase")]
pub struct ImageGridData {
    pub title: String,
    pub description: String,
    pub images: Vec<GridImage>,
    pub caption: String,
}

impl Default for ImageGridData {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            images: vec![GridImage::default(); DEFAULT_GRID_SLOTS],
            caption: String::new(),
        }
    }
}

/// Accepts both image grid shapes.
#[derive(Default, Deserialize)]
#[serde(default)]
struct ImageGridWire {
    title: String,
    description: String,
    caption: String,
    images: Option<Vec<GridImage>>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl From<ImageGridWire> for ImageGridData {
    fn from(wire: ImageGridWire) -> Self {
        let images = match wire.images {
            Some(images) => images,
            None => {
                let mut slots: Vec<(usize, String)> = wire
                    .rest
                    .into_iter()
                    .filter_map(|(key, value)| match (grid_slot_index(&key), value) {
                        (Some(idx), Value::String(src)) => Some((idx, src)),
                        _ => None,
                    })
                    .collect();
                slots.sort_by_key(|(idx, _)| *idx);
                let len = slots
                    .last()
                    .map(|(idx, _)| idx + 1)
                    .unwrap_or(0)
                    .max(DEFAULT_GRID_SLOTS);
                let mut images = vec![GridImage::default(); len];
                for (idx, src) in slots {
                    images[idx].src = src;
                }
                images
            }
        };
        Self {
            title: wire.title,
            description: wire.description,
            images,
            caption: wire.caption,
        }
    }
}

/// Zero-based position of a fixed grid slot name (`image1` → 0).
///
/// Returns `None` for anything that isn't `image` followed by a number in
/// `1..=MAX_GRID_SLOTS`. Out-of-range slot keys in stored grids are dropped
/// on migration.
pub fn grid_slot_index(slot: &str) -> Option<usize> {
    let number: usize = slot.strip_prefix("image")?.parse().ok()?;
    (1..=MAX_GRID_SLOTS)
        .contains(&number)
        .then(|| number - 1)
}

/// A titled bullet list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListData {
    pub title: String,
    pub items: Vec<String>,
}

/// A titled block of markdown text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextData {
    pub title: String,
    pub content: String,
}

/// One block of page content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSection", into = "RawSection")]
pub enum Section {
    Hero(HeroData),
    HeroSlider(HeroSliderData),
    ImageGrid(ImageGridData),
    List(ListData),
    Text(TextData),
    /// A section this build cannot interpret, kept verbatim.
    Opaque { tag: String, data: Value },
}

impl Section {
    /// Build a section from a wire tag and payload.
    ///
    /// Never fails: unknown tags and payloads that don't match the tag's
    /// schema produce [`Section::Opaque`] with the tag preserved.
    pub fn from_parts(tag: &str, data: Value) -> Self {
        match SectionType::parse(tag) {
            Some(kind) => kind
                .decode(data.clone())
                .unwrap_or_else(|_| Section::Opaque {
                    tag: tag.to_string(),
                    data,
                }),
            None => Section::Opaque {
                tag: tag.to_string(),
                data,
            },
        }
    }

    /// Registered type, or `None` for opaque sections.
    pub fn kind(&self) -> Option<SectionType> {
        match self {
            Section::Hero(_) => Some(SectionType::Hero),
            Section::HeroSlider(_) => Some(SectionType::HeroSlider),
            Section::ImageGrid(_) => Some(SectionType::ImageGrid),
            Section::List(_) => Some(SectionType::List),
            Section::Text(_) => Some(SectionType::Text),
            Section::Opaque { .. } => None,
        }
    }

    /// Wire tag, including the preserved tag of opaque sections.
    pub fn tag(&self) -> &str {
        match self {
            Section::Opaque { tag, .. } => tag,
            other => other.kind().map(SectionType::tag).unwrap_or_default(),
        }
    }

    /// Payload as it appears on the wire.
    pub fn data(&self) -> Value {
        let data = match self {
            Section::Hero(d) => serde_json::to_value(d),
            Section::HeroSlider(d) => serde_json::to_value(d),
            Section::ImageGrid(d) => serde_json::to_value(d),
            Section::List(d) => serde_json::to_value(d),
            Section::Text(d) => serde_json::to_value(d),
            Section::Opaque { data, .. } => return data.clone(),
        };
        data.unwrap_or_default()
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, Section::Opaque { .. })
    }

    /// Short human summary used by CLI listings and preview placeholders.
    pub fn summary(&self) -> String {
        match self {
            Section::Hero(d) => d.heading.clone(),
            Section::HeroSlider(d) => format!("{} slides", d.hero_images.len()),
            Section::ImageGrid(d) => {
                let filled = d.images.iter().filter(|i| !i.src.is_empty()).count();
                format!("{} ({}/{} images)", d.title, filled, d.images.len())
            }
            Section::List(d) => format!("{} ({} items)", d.title, d.items.len()),
            Section::Text(d) => d.title.clone(),
            Section::Opaque { tag, .. } => format!("unsupported section `{tag}`"),
        }
    }
}

/// Wire form of a section.
#[derive(Serialize, Deserialize)]
struct RawSection {
    #[serde(rename = "type")]
    tag: String,
    #[serde(default)]
    data: Value,
}

impl From<RawSection> for Section {
    fn from(raw: RawSection) -> Self {
        Section::from_parts(&raw.tag, raw.data)
    }
}

impl From<Section> for RawSection {
    fn from(section: Section) -> Self {
        RawSection {
            tag: section.tag().to_string(),
            data: section.data(),
        }
    }
}
