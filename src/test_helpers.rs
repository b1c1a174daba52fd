//! Shared test utilities for the simple-cms test suite.
//!
//! Builders for sections, documents and a small menu tree, so tests read as
//! the scenario they check rather than as struct literals.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tree = sample_menu_tree();
//! assert_eq!(tree.list_mega_menus(1).len(), 2);
//!
//! let store = sample_site_store();
//! let doc = find_document(&store, "Design");
//! assert_eq!(doc.mega_menu_id, Some(1));
//! ```
//!
//! The sample tree:
//!
//! ```text
//! 1 Services       /services
//!   1 Design       /services/design
//!     1 Branding   /services/design/branding
//!   2 Development  /services/development
//! 2 About          /about
//! ```

use crate::document::ContentDocument;
use crate::menu::{MegaMenuFields, MenuFields, MenuTree, SubMegaMenuFields};
use crate::section::{HeroData, ListData, Section, TextData};
use crate::store::{ContentStore, SiteStore};

// =========================================================================
// Sections
// =========================================================================

pub fn text_section(title: &str, content: &str) -> Section {
    Section::Text(TextData {
        title: title.to_string(),
        content: content.to_string(),
    })
}

pub fn hero_section(heading: &str) -> Section {
    Section::Hero(HeroData {
        heading: heading.to_string(),
        ..HeroData::default()
    })
}

pub fn list_section(title: &str, items: &[&str]) -> Section {
    Section::List(ListData {
        title: title.to_string(),
        items: items.iter().map(|s| s.to_string()).collect(),
    })
}

/// A mixed section list: hero, list, two text sections.
pub fn sample_sections() -> Vec<Section> {
    vec![
        hero_section("Welcome"),
        list_section("Why us", &["fast", "friendly"]),
        text_section("Intro", "Hello **world**"),
        text_section("Outro", "Bye"),
    ]
}

pub fn sample_document() -> ContentDocument {
    ContentDocument {
        sections: sample_sections(),
        ..ContentDocument::new("About")
    }
}

// =========================================================================
// Menus
// =========================================================================

pub fn menu_fields(title: &str, path: &str) -> MenuFields {
    MenuFields {
        title: title.to_string(),
        path: path.to_string(),
        enable_quick_link: false,
    }
}

/// The tree shown in the module docs. Panics if any create fails.
pub fn sample_menu_tree() -> MenuTree {
    let mut tree = MenuTree::default();
    let services = tree
        .create_menu(menu_fields("Services", "/services"))
        .unwrap();
    let design = tree
        .create_mega_menu(MegaMenuFields {
            menu_id: Some(services.id),
            title: "Design".to_string(),
            path: "/services/design".to_string(),
            enable_quick_link: false,
        })
        .unwrap();
    tree.create_mega_menu(MegaMenuFields {
        menu_id: Some(services.id),
        title: "Development".to_string(),
        path: "/services/development".to_string(),
        enable_quick_link: false,
    })
    .unwrap();
    tree.create_sub_mega_menu(SubMegaMenuFields {
        menu_id: Some(services.id),
        mega_menu_id: Some(design.id),
        title: "Branding".to_string(),
        path: "/services/design/branding".to_string(),
        enable_quick_link: false,
    })
    .unwrap();
    tree.create_menu(menu_fields("About", "/about")).unwrap();
    tree
}

// =========================================================================
// Stores
// =========================================================================

/// Sample tree plus three documents:
///
/// 1. "Our services" under menu 1
/// 2. "Design" under mega menu 1
/// 3. "Landing", unplaced
pub fn sample_site_store() -> SiteStore {
    let mut store = SiteStore {
        menus: sample_menu_tree(),
        ..SiteStore::default()
    };
    let services = ContentDocument {
        menu_id: Some(1),
        sections: vec![
            hero_section("Services"),
            text_section("What we do", "Design and development."),
        ],
        ..ContentDocument::new("Our services")
    };
    let design = ContentDocument {
        menu_id: Some(1),
        mega_menu_id: Some(1),
        sections: vec![list_section("Offer", &["Logos", "Websites"])],
        ..ContentDocument::new("Design")
    };
    let landing = ContentDocument {
        sections: sample_sections(),
        ..ContentDocument::new("Landing")
    };
    for doc in [services, design, landing] {
        store.create_content(&doc).unwrap();
    }
    store
}

/// Find a stored document by title. Panics with the available titles if
/// none matches.
pub fn find_document<'a>(store: &'a SiteStore, title: &str) -> &'a ContentDocument {
    store
        .documents()
        .iter()
        .find(|d| d.title == title)
        .unwrap_or_else(|| {
            let titles: Vec<&str> = store.documents().iter().map(|d| d.title.as_str()).collect();
            panic!("document '{}' not found. Available: {:?}", title, titles)
        })
}
