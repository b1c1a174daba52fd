//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Output leads with what an entity *is* (positional index + title), with
//! ids, paths and files shown as secondary context after `→` or on indented
//! lines. The same menu node or page looks the same in every command.
//!
//! # Output Format
//!
//! ## List
//!
//! ```text
//! Menus
//! 001 Services → /services
//!     Page: Our services (content 1)
//!     001 Design → /services/design
//!         Page: Design (content 2)
//!         001 Branding → /services/design/branding
//! 002 About → /about
//!
//! Unplaced
//!     001 Landing (content 3)
//! ```
//!
//! ## Page
//!
//! ```text
//! Content 1: Our services
//!     Placement: menu 1
//!     001 hero Welcome
//!     002 carousel (unsupported, kept)
//! ```
//!
//! ## Render
//!
//! ```text
//! 001 Our services → services/index.html
//! 002 Landing → pages/3/index.html
//!     skipped section: carousel
//! Index → index.html
//!
//! Skipped
//!     Second services page (content 4): /services is already used by content 1
//!
//! Rendered 2 pages, copied 5 uploads
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::document::{ContentDocument, Placement};
use crate::menu::{FormErrors, MenuNode};
use crate::render::RenderSummary;
use crate::store::{Issue, SiteStore};

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `Title (content N)`, or `Title (unsaved)`.
fn page_label(doc: &ContentDocument) -> String {
    let title = if doc.title.is_empty() {
        "(untitled)"
    } else {
        doc.title.as_str()
    };
    match doc.id {
        Some(id) => format!("{} (content {})", title, id),
        None => format!("{} (unsaved)", title),
    }
}

fn node_line<T: MenuNode>(depth: usize, position: usize, node: &T) -> String {
    let quick = if node.quick_link() { " [quick link]" } else { "" };
    format!(
        "{}{} {} \u{2192} {}{}",
        indent(depth),
        format_index(position),
        node.title(),
        node.path(),
        quick
    )
}

// ============================================================================
// list
// ============================================================================

/// Format the menu tree with the pages placed under each node.
pub fn format_site(store: &SiteStore) -> Vec<String> {
    let tree = &store.menus;
    let docs = store.documents();
    let pages_at = |placement: Placement, depth: usize| -> Vec<String> {
        docs.iter()
            .filter(|d| d.placement() == placement)
            .map(|d| format!("{}Page: {}", indent(depth), page_label(d)))
            .collect()
    };

    let mut lines = vec!["Menus".to_string()];
    let menus = tree.list_menus();
    if menus.is_empty() {
        lines.push("    (none)".to_string());
    }
    for (i, menu) in menus.iter().enumerate() {
        lines.push(node_line(0, i + 1, menu));
        lines.extend(pages_at(Placement::Menu(menu.id), 1));
        for (j, mega) in tree.list_mega_menus(menu.id).iter().enumerate() {
            lines.push(node_line(1, j + 1, mega));
            lines.extend(pages_at(Placement::MegaMenu(mega.id), 2));
            for (k, sub) in tree
                .list_sub_mega_menus(menu.id, mega.id)
                .iter()
                .enumerate()
            {
                lines.push(node_line(2, k + 1, sub));
                lines.extend(pages_at(Placement::SubMegaMenu(sub.id), 3));
            }
        }
    }

    let unplaced: Vec<&ContentDocument> = docs
        .iter()
        .filter(|d| d.placement() == Placement::Unplaced)
        .collect();
    if !unplaced.is_empty() {
        lines.push(String::new());
        lines.push("Unplaced".to_string());
        for (i, doc) in unplaced.iter().enumerate() {
            lines.push(format!("    {} {}", format_index(i + 1), page_label(doc)));
        }
    }

    lines
}

pub fn print_site(store: &SiteStore) {
    for line in format_site(store) {
        println!("{}", line);
    }
}

// ============================================================================
// page
// ============================================================================

/// Format one document: header, placement and one line per section.
pub fn format_document(doc: &ContentDocument) -> Vec<String> {
    let header = match doc.id {
        Some(id) => format!("Content {}: {}", id, doc.title),
        None => format!("New content: {}", doc.title),
    };
    let placement = match doc.placement() {
        Placement::Unplaced => "unplaced".to_string(),
        Placement::Menu(id) => format!("menu {}", id),
        Placement::MegaMenu(id) => format!("mega menu {}", id),
        Placement::SubMegaMenu(id) => format!("sub mega menu {}", id),
    };

    let mut lines = vec![header, format!("    Placement: {}", placement)];
    if doc.sections.is_empty() {
        lines.push("    (no sections)".to_string());
    }
    for (i, section) in doc.sections.iter().enumerate() {
        let line = if section.is_opaque() {
            format!("{} {} (unsupported, kept)", format_index(i + 1), section.tag())
        } else {
            let summary = section.summary();
            if summary.is_empty() {
                format!("{} {}", format_index(i + 1), section.tag())
            } else {
                format!("{} {} {}", format_index(i + 1), section.tag(), summary)
            }
        };
        lines.push(format!("    {}", line));
    }
    lines
}

pub fn print_document(doc: &ContentDocument) {
    for line in format_document(doc) {
        println!("{}", line);
    }
}

// ============================================================================
// check
// ============================================================================

pub fn format_audit(issues: &[Issue]) -> Vec<String> {
    if issues.is_empty() {
        return vec!["No issues found".to_string()];
    }
    let mut lines = vec![format!("{} issue(s)", issues.len())];
    lines.extend(issues.iter().map(|issue| format!("    {}", issue)));
    lines
}

pub fn print_audit(issues: &[Issue]) {
    for line in format_audit(issues) {
        println!("{}", line);
    }
}

/// Field-level errors from a menu form, one per line.
pub fn format_form_errors(errors: &FormErrors) -> Vec<String> {
    errors
        .fields()
        .map(|(field, message)| format!("    {}: {}", field, message))
        .collect()
}

// ============================================================================
// render
// ============================================================================

pub fn format_render(summary: &RenderSummary) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, page) in summary.pages.iter().enumerate() {
        lines.push(format!(
            "{} {} \u{2192} {}",
            format_index(i + 1),
            page.title,
            page.file.display()
        ));
        for tag in &page.skipped_sections {
            lines.push(format!("    skipped section: {}", tag));
        }
    }
    if summary.generated_index {
        lines.push("Index \u{2192} index.html".to_string());
    }

    if !summary.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for skipped in &summary.skipped {
            let id = skipped
                .content_id
                .map_or_else(String::new, |id| format!(" (content {})", id));
            lines.push(format!("    {}{}: {}", skipped.title, id, skipped.reason));
        }
    }

    lines.push(String::new());
    let noun = if summary.pages.len() == 1 { "page" } else { "pages" };
    if summary.copied_uploads > 0 {
        lines.push(format!(
            "Rendered {} {}, copied {} uploads",
            summary.pages.len(),
            noun,
            summary.copied_uploads
        ));
    } else {
        lines.push(format!("Rendered {} {}", summary.pages.len(), noun));
    }
    lines
}

pub fn print_render(summary: &RenderSummary) {
    for line in format_render(summary) {
        println!("{}", line);
    }
}
