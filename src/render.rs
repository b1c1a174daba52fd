//! HTML rendering for the public site and the editor preview.
//!
//! Takes stored content documents and the menu tree and produces static HTML
//! pages. Each registered section type has a renderer, looked up through the
//! registry in [`crate::section`]; sections without one (opaque sections)
//! are skipped silently.
//!
//! ## Routing
//!
//! A page lives at the path of the most specific menu node it is placed
//! under. Unplaced pages, and pages whose menu node no longer exists, live
//! under `/pages/<id>`. When two pages claim the same path the first one in
//! the store wins and the other is reported as skipped.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html                 # Page placed at "/", or a page index
//! ├── services/
//! │   ├── index.html             # Page placed under the "Services" menu
//! │   └── design/
//! │       └── index.html         # Page placed under a mega menu
//! ├── pages/
//! │   └── 7/
//! │       └── index.html         # Unplaced page
//! └── uploads/                   # Copied from the site's upload directory
//! ```
//!
//! ## CSS
//!
//! `static/style.css` is embedded at compile time. Color and layout variables
//! generated from `config.toml` are prepended, and the result is inlined in
//! every page.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Text section bodies are markdown, converted with pulldown-cmark.

use crate::config::{self, SiteConfig};
use crate::document::{ContentDocument, Placement};
use crate::menu::{MenuNode, MenuTree, NavPath};
use crate::section::{HeroData, HeroSliderData, ImageGridData, ListData, Section, TextData};
use crate::store::SiteStore;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const CSS_STATIC: &str = include_str!("../static/style.css");

/// Full stylesheet for a site: config variables followed by the base styles.
pub fn site_css(config: &SiteConfig) -> String {
    format!(
        "{}\n\n{}\n\n{}",
        config::generate_color_css(&config.colors),
        config::generate_theme_css(&config.theme),
        CSS_STATIC
    )
}

// ============================================================================
// Section renderers
// ============================================================================

/// Render one section through the registry. `None` for opaque sections.
pub fn render_section(section: &Section) -> Option<Markup> {
    section.kind().and_then(|kind| (kind.renderer())(section))
}

/// Render sections in order, skipping any without a renderer.
pub fn render_sections(sections: &[Section]) -> Markup {
    html! {
        @for section in sections {
            @if let Some(markup) = render_section(section) {
                (markup)
            }
        }
    }
}

pub fn hero_renderer(section: &Section) -> Option<Markup> {
    match section {
        Section::Hero(data) => Some(render_hero(data)),
        _ => None,
    }
}

pub fn hero_slider_renderer(section: &Section) -> Option<Markup> {
    match section {
        Section::HeroSlider(data) => Some(render_hero_slider(data)),
        _ => None,
    }
}

pub fn image_grid_renderer(section: &Section) -> Option<Markup> {
    match section {
        Section::ImageGrid(data) => Some(render_image_grid(data)),
        _ => None,
    }
}

pub fn list_renderer(section: &Section) -> Option<Markup> {
    match section {
        Section::List(data) => Some(render_list(data)),
        _ => None,
    }
}

pub fn text_renderer(section: &Section) -> Option<Markup> {
    match section {
        Section::Text(data) => Some(render_text(data)),
        _ => None,
    }
}

/// Image, heading, subheading and link shared by heroes and slides.
fn hero_body(data: &HeroData) -> Markup {
    html! {
        @if !data.image.is_empty() {
            img.hero-image src=(data.image) alt=(data.heading);
        }
        div.hero-text {
            @if !data.heading.is_empty() {
                h2 { (data.heading) }
            }
            @if !data.subheading.is_empty() {
                p.subheading { (data.subheading) }
            }
            @if !data.redirect_path.is_empty() {
                a.hero-link href=(data.redirect_path) { "Learn more" }
            }
        }
    }
}

fn render_hero(data: &HeroData) -> Markup {
    html! {
        section.section.hero {
            (hero_body(data))
        }
    }
}

fn render_hero_slider(data: &HeroSliderData) -> Markup {
    html! {
        section.section.hero-slider {
            div.slides {
                @for (idx, slide) in data.hero_images.iter().enumerate() {
                    div.slide data-slide=(idx + 1) {
                        (hero_body(slide))
                    }
                }
            }
        }
    }
}

fn render_image_grid(data: &ImageGridData) -> Markup {
    html! {
        section.section.image-grid {
            @if !data.title.is_empty() {
                h2 { (data.title) }
            }
            @if !data.description.is_empty() {
                p.description { (data.description) }
            }
            div.grid {
                // Empty slots are placeholders in the editor, not tiles.
                @for image in data.images.iter().filter(|i| !i.src.is_empty()) {
                    figure {
                        img src=(image.src) alt=(image.title) loading="lazy";
                        @if !image.title.is_empty() || !image.description.is_empty() {
                            figcaption {
                                @if !image.title.is_empty() {
                                    strong { (image.title) }
                                }
                                @if !image.description.is_empty() {
                                    " " (image.description)
                                }
                            }
                        }
                    }
                }
            }
            @if !data.caption.is_empty() {
                p.caption { (data.caption) }
            }
        }
    }
}

fn render_list(data: &ListData) -> Markup {
    html! {
        section.section.list {
            @if !data.title.is_empty() {
                h2 { (data.title) }
            }
            ul {
                @for item in &data.items {
                    li { (item) }
                }
            }
        }
    }
}

fn render_text(data: &TextData) -> Markup {
    html! {
        section.section.text {
            @if !data.title.is_empty() {
                h2 { (data.title) }
            }
            div.text-body {
                (PreEscaped(markdown_to_html(&data.content)))
            }
        }
    }
}

fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new(markdown);
    let mut out = String::new();
    md_html::push_html(&mut out, parser);
    out
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
pub fn base_document(title: &str, css: &str, body_class: Option<&str>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(css)) }
            }
            body class=[body_class] {
                (content)
            }
        }
    }
}

/// Renders the site header: site title plus navigation
fn site_header(site_title: &str, nav: Markup) -> Markup {
    html! {
        header.site-header {
            a.site-title href="/" { (site_title) }
            (nav)
        }
    }
}

/// True when `current` is `path` or lies below it. The root only matches
/// itself.
fn is_current(path: &NavPath, current: &str) -> bool {
    if path.is_root() {
        return current == "/";
    }
    let path = path.as_str();
    current == path
        || current
            .strip_prefix(path)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Renders the three-level navigation and the quick links bar.
pub fn render_nav(tree: &MenuTree, home_label: &str, current_path: &str) -> Markup {
    let quick_links = tree.quick_links();
    html! {
        nav.site-nav {
            ul {
                li class=[(current_path == "/").then_some("current")] {
                    a href="/" { (home_label) }
                }
                @for menu in tree.list_menus() {
                    (nav_item(&menu, current_path, html! {
                        @let megas = tree.list_mega_menus(menu.id);
                        @if !megas.is_empty() {
                            ul.mega-menu {
                                @for mega in &megas {
                                    (nav_item(mega, current_path, html! {
                                        @let subs = tree.list_sub_mega_menus(menu.id, mega.id);
                                        @if !subs.is_empty() {
                                            ul.sub-mega-menu {
                                                @for sub in &subs {
                                                    (nav_item(sub, current_path, html! {}))
                                                }
                                            }
                                        }
                                    }))
                                }
                            }
                        }
                    }))
                }
            }
        }
        @if !quick_links.is_empty() {
            nav.quick-links {
                ul {
                    @for (title, path) in &quick_links {
                        li { a href=(path.as_str()) { (title) } }
                    }
                }
            }
        }
    }
}

fn nav_item<T: MenuNode>(node: &T, current_path: &str, children: Markup) -> Markup {
    html! {
        li class=[is_current(node.path(), current_path).then_some("current")] {
            a href=(node.path().as_str()) { (node.title()) }
            (children)
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

/// URL path of a stored document, or `None` for a document never saved.
pub fn page_route(doc: &ContentDocument, tree: &MenuTree) -> Option<String> {
    let node_path = match doc.placement() {
        Placement::Menu(id) => tree.menu(id).map(|n| n.path.clone()),
        Placement::MegaMenu(id) => tree.mega_menu(id).map(|n| n.path.clone()),
        Placement::SubMegaMenu(id) => tree.sub_mega_menu(id).map(|n| n.path.clone()),
        Placement::Unplaced => None,
    };
    match node_path {
        Some(path) => Some(path.into()),
        None => doc.id.map(|id| format!("/pages/{id}")),
    }
}

/// Output file for a route, relative to the output directory.
pub fn route_file(route: &str) -> PathBuf {
    let trimmed = route.trim_matches('/');
    if trimmed.is_empty() {
        PathBuf::from("index.html")
    } else {
        Path::new(trimmed).join("index.html")
    }
}

/// Renders a content page.
pub fn render_page(
    doc: &ContentDocument,
    tree: &MenuTree,
    config: &SiteConfig,
    css: &str,
    route: &str,
) -> Markup {
    let nav = render_nav(tree, &config.site.home_label, route);
    let page_title = if doc.title.is_empty() {
        config.site.title.clone()
    } else {
        format!("{} | {}", doc.title, config.site.title)
    };

    let content = html! {
        (site_header(&config.site.title, nav))
        main.page {
            @if !doc.title.is_empty() {
                header.page-header {
                    h1 { (doc.title) }
                }
            }
            (render_sections(&doc.sections))
        }
    };

    base_document(&page_title, css, None, content)
}

/// Renders the fallback home page: a list of every rendered page.
fn render_page_index(
    pages: &[RenderedPage],
    tree: &MenuTree,
    config: &SiteConfig,
    css: &str,
) -> Markup {
    let nav = render_nav(tree, &config.site.home_label, "/");
    let content = html! {
        (site_header(&config.site.title, nav))
        main.page.page-index {
            header.page-header {
                h1 { (config.site.title) }
            }
            ul {
                @for page in pages {
                    li { a href=(page.route) { (page.title) } }
                }
            }
        }
    };
    base_document(&config.site.title, css, None, content)
}

// ============================================================================
// Site rendering
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub content_id: Option<u64>,
    pub title: String,
    pub route: String,
    /// Written file, relative to the output directory.
    pub file: PathBuf,
    /// Sections left out because no renderer handles their tag.
    pub skipped_sections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPage {
    pub content_id: Option<u64>,
    pub title: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub pages: Vec<RenderedPage>,
    pub skipped: Vec<SkippedPage>,
    /// True when no page was placed at `/` and a page index was written.
    pub generated_index: bool,
    pub copied_uploads: usize,
}

/// Render every stored document into `output_dir`.
///
/// Pages are rendered in parallel on the global rayon pool. The upload
/// directory (`site_dir/<uploads.dir>`), if present, is copied to the path
/// named by `uploads.url_prefix`.
pub fn render_site(
    store: &SiteStore,
    config: &SiteConfig,
    site_dir: &Path,
    output_dir: &Path,
) -> Result<RenderSummary, RenderError> {
    let css = site_css(config);
    let tree = &store.menus;
    let mut summary = RenderSummary::default();

    // Routing is sequential so "first document wins" is deterministic.
    let mut claimed: HashMap<String, Option<u64>> = HashMap::new();
    let mut planned = Vec::new();
    for doc in store.documents() {
        let Some(route) = page_route(doc, tree) else {
            summary.skipped.push(SkippedPage {
                content_id: doc.id,
                title: doc.title.clone(),
                reason: "never saved".to_string(),
            });
            continue;
        };
        if let Some(owner) = claimed.get(&route) {
            let owner = owner.map_or_else(|| "another page".to_string(), |id| format!("content {id}"));
            warn!(id = ?doc.id, route = %route, "path already rendered, skipping");
            summary.skipped.push(SkippedPage {
                content_id: doc.id,
                title: doc.title.clone(),
                reason: format!("{route} is already used by {owner}"),
            });
            continue;
        }
        claimed.insert(route.clone(), doc.id);
        planned.push((doc, route));
    }

    fs::create_dir_all(output_dir)?;

    let pages: Vec<RenderedPage> = planned
        .par_iter()
        .map(|(doc, route)| -> Result<RenderedPage, RenderError> {
            let html = render_page(doc, tree, config, &css, route);
            let file = route_file(route);
            let target = output_dir.join(&file);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, html.into_string())?;
            debug!(id = ?doc.id, file = %file.display(), "rendered page");
            Ok(RenderedPage {
                content_id: doc.id,
                title: doc.title.clone(),
                route: route.clone(),
                file,
                skipped_sections: doc
                    .opaque_sections()
                    .into_iter()
                    .map(|(_, tag)| tag.to_string())
                    .collect(),
            })
        })
        .collect::<Result<_, _>>()?;
    summary.pages = pages;

    if !claimed.contains_key("/") {
        let index = render_page_index(&summary.pages, tree, config, &css);
        fs::write(output_dir.join("index.html"), index.into_string())?;
        summary.generated_index = true;
    }

    let uploads_src = site_dir.join(&config.uploads.dir);
    if uploads_src.is_dir() {
        let uploads_dst = output_dir.join(config.uploads.url_prefix.trim_matches('/'));
        fs::create_dir_all(&uploads_dst)?;
        summary.copied_uploads = copy_dir_recursive(&uploads_src, &uploads_dst)?;
    }

    info!(
        pages = summary.pages.len(),
        skipped = summary.skipped.len(),
        output = %output_dir.display(),
        "site rendered"
    );
    Ok(summary)
}

/// Copy a directory tree, returning the number of files copied.
fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<usize> {
    let mut copied = 0;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copied += copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
            copied += 1;
        }
    }
    Ok(copied)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::MenuFields;
    use crate::section::{GridImage, SectionType};
    use crate::test_helpers::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn render(section: &Section) -> String {
        render_section(section).unwrap().into_string()
    }

    // =========================================================================
    // Sections
    // =========================================================================

    #[test]
    fn every_registered_type_renders_its_default() {
        for kind in SectionType::ALL {
            assert!(
                render_section(&kind.default_section()).is_some(),
                "{kind} has no renderer"
            );
        }
    }

    #[test]
    fn renderer_ignores_other_types() {
        assert!(hero_renderer(&text_section("a", "b")).is_none());
        assert!(text_renderer(&hero_section("Hi")).is_none());
    }

    #[test]
    fn hero_renders_fields() {
        let html = render(&Section::Hero(HeroData {
            image: "/uploads/a.jpg".into(),
            heading: "Welcome".into(),
            subheading: "to the site".into(),
            redirect_path: "/about".into(),
        }));
        assert!(html.contains(r#"src="/uploads/a.jpg""#));
        assert!(html.contains("<h2>Welcome</h2>"));
        assert!(html.contains("to the site"));
        assert!(html.contains(r#"href="/about""#));
    }

    #[test]
    fn empty_hero_has_no_image_or_link() {
        let html = render(&SectionType::Hero.default_section());
        assert!(!html.contains("<img"));
        assert!(!html.contains("hero-link"));
    }

    #[test]
    fn slider_renders_each_slide() {
        let html = render(&Section::HeroSlider(HeroSliderData {
            hero_images: vec![
                HeroData {
                    heading: "One".into(),
                    ..HeroData::default()
                },
                HeroData {
                    heading: "Two".into(),
                    ..HeroData::default()
                },
            ],
        }));
        assert_eq!(html.matches("class=\"slide\"").count(), 2);
        assert!(html.contains(r#"data-slide="2""#));
    }

    #[test]
    fn image_grid_skips_empty_slots() {
        let html = render(&Section::ImageGrid(ImageGridData {
            title: "Work".into(),
            images: vec![
                GridImage::default(),
                GridImage {
                    src: "/uploads/b.jpg".into(),
                    title: "B".into(),
                    description: String::new(),
                },
                GridImage::default(),
            ],
            caption: "All rights reserved".into(),
            ..ImageGridData::default()
        }));
        assert_eq!(html.matches("<figure>").count(), 1);
        assert!(html.contains("/uploads/b.jpg"));
        assert!(html.contains("All rights reserved"));
    }

    #[test]
    fn list_renders_items() {
        let html = render(&Section::List(ListData {
            title: "Why".into(),
            items: vec!["fast".into(), "cheap".into()],
        }));
        assert!(html.contains("<li>fast</li>"));
        assert!(html.contains("<li>cheap</li>"));
    }

    #[test]
    fn text_content_is_markdown() {
        let html = render(&text_section("Intro", "Some **bold** text"));
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<h2>Intro</h2>"));
    }

    #[test]
    fn unknown_section_is_skipped() {
        let sections = vec![
            hero_section("Hello"),
            Section::from_parts("carousel", json!({"slides": []})),
            text_section("After", "body"),
        ];
        assert!(render_section(&sections[1]).is_none());
        let html = render_sections(&sections).into_string();
        assert!(html.contains("Hello"));
        assert!(html.contains("After"));
        assert!(!html.contains("carousel"));
    }

    #[test]
    fn html_escape_in_maud() {
        let html = render(&Section::List(ListData {
            title: "<script>alert('xss')</script>".into(),
            items: vec![],
        }));
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    #[test]
    fn nav_renders_all_levels() {
        let html = render_nav(&sample_menu_tree(), "Home", "/").into_string();
        assert!(html.contains("Services"));
        assert!(html.contains(r#"href="/services/design""#));
        assert!(html.contains("Branding"));
        assert!(html.contains("mega-menu"));
        assert!(html.contains("sub-mega-menu"));
        assert!(!html.contains("quick-links"));
    }

    #[test]
    fn nav_marks_current_branch() {
        let html = render_nav(&sample_menu_tree(), "Home", "/services/design").into_string();
        // Services and Design are current; Home is not.
        assert_eq!(html.matches(r#"class="current""#).count(), 2);
    }

    #[test]
    fn nav_prefix_match_respects_segments() {
        let path = NavPath::parse("/about").unwrap();
        assert!(is_current(&path, "/about"));
        assert!(is_current(&path, "/about/team"));
        assert!(!is_current(&path, "/aboutus"));
        assert!(!is_current(&NavPath::root(), "/about"));
    }

    #[test]
    fn nav_shows_quick_links() {
        let mut tree = sample_menu_tree();
        tree.create_menu(MenuFields {
            title: "Contact".into(),
            path: "/contact".into(),
            enable_quick_link: true,
        })
        .unwrap();
        let html = render_nav(&tree, "Home", "/").into_string();
        assert!(html.contains("quick-links"));
    }

    // =========================================================================
    // Pages and routing
    // =========================================================================

    #[test]
    fn route_follows_most_specific_placement() {
        let tree = sample_menu_tree();
        let doc = ContentDocument {
            id: Some(4),
            menu_id: Some(1),
            mega_menu_id: Some(1),
            ..ContentDocument::new("Design")
        };
        assert_eq!(page_route(&doc, &tree).as_deref(), Some("/services/design"));

        let unplaced = ContentDocument {
            id: Some(4),
            ..ContentDocument::new("Loose")
        };
        assert_eq!(page_route(&unplaced, &tree).as_deref(), Some("/pages/4"));

        let dangling = ContentDocument {
            id: Some(5),
            menu_id: Some(99),
            ..ContentDocument::new("Lost")
        };
        assert_eq!(page_route(&dangling, &tree).as_deref(), Some("/pages/5"));

        assert_eq!(page_route(&ContentDocument::new("Draft"), &tree), None);
    }

    #[test]
    fn route_file_paths() {
        assert_eq!(route_file("/"), PathBuf::from("index.html"));
        assert_eq!(
            route_file("/services/design"),
            PathBuf::from("services/design/index.html")
        );
    }

    #[test]
    fn page_includes_title_and_sections() {
        let doc = sample_document();
        let config = SiteConfig::default();
        let html = render_page(&doc, &sample_menu_tree(), &config, "", "/about").into_string();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(&format!("<title>{} | Simple CMS</title>", doc.title)));
        assert!(html.contains("site-header"));
    }

    #[test]
    fn base_document_applies_body_class() {
        let doc = base_document("Test", "", Some("preview"), html! { p { "x" } }).into_string();
        assert!(doc.contains(r#"<body class="preview">"#));
    }

    #[test]
    fn site_css_has_variables_and_base_styles() {
        let css = site_css(&SiteConfig::default());
        assert!(css.contains("--color-bg: #ffffff"));
        assert!(css.contains("--hero-height:"));
        assert!(css.contains(".image-grid"));
    }

    // =========================================================================
    // render_site
    // =========================================================================

    #[test]
    fn render_site_writes_pages() {
        let site = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let store = sample_site_store();
        let summary = render_site(&store, &SiteConfig::default(), site.path(), out.path()).unwrap();

        assert_eq!(summary.pages.len(), store.documents().len());
        for page in &summary.pages {
            assert!(out.path().join(&page.file).exists(), "{:?}", page.file);
        }
        let services = fs::read_to_string(out.path().join("services/index.html")).unwrap();
        assert!(services.contains("Our services"));
    }

    #[test]
    fn render_site_generates_index_without_home_page() {
        let out = TempDir::new().unwrap();
        let site = TempDir::new().unwrap();
        let summary =
            render_site(&sample_site_store(), &SiteConfig::default(), site.path(), out.path())
                .unwrap();
        assert!(summary.generated_index);
        let index = fs::read_to_string(out.path().join("index.html")).unwrap();
        assert!(index.contains("page-index"));
    }

    #[test]
    fn render_site_skips_path_collisions() {
        let out = TempDir::new().unwrap();
        let site = TempDir::new().unwrap();
        let mut store = sample_site_store();
        let mut dup = ContentDocument::new("Second services page");
        dup.menu_id = Some(1);
        crate::store::ContentStore::create_content(&mut store, &dup).unwrap();

        let summary = render_site(&store, &SiteConfig::default(), site.path(), out.path()).unwrap();
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].title, "Second services page");
        assert!(summary.skipped[0].reason.contains("/services"));
    }

    #[test]
    fn render_site_reports_opaque_sections_and_copies_uploads() {
        let out = TempDir::new().unwrap();
        let site = TempDir::new().unwrap();
        fs::create_dir_all(site.path().join("uploads")).unwrap();
        fs::write(site.path().join("uploads/a.jpg"), b"jpg").unwrap();

        let mut store = SiteStore::default();
        let mut doc = ContentDocument::new("Home");
        doc.sections = vec![
            Section::from_parts("carousel", json!({})),
            text_section("Hi", "there"),
        ];
        crate::store::ContentStore::create_content(&mut store, &doc).unwrap();

        let summary = render_site(&store, &SiteConfig::default(), site.path(), out.path()).unwrap();
        assert_eq!(summary.pages[0].skipped_sections, vec!["carousel"]);
        assert_eq!(summary.copied_uploads, 1);
        assert!(out.path().join("uploads/a.jpg").exists());
    }
}
