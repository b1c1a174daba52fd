//! Site configuration module.
//!
//! Handles loading, validating, and merging the `config.toml` that lives in a
//! site directory next to its `site.json`. User values are merged over stock
//! defaults, so a config file only needs the keys it wants to change.
//!
//! ## Config File Location
//!
//! ```text
//! my-site/
//! ├── config.toml     # Optional, overrides stock defaults
//! ├── site.json       # Menus and content documents
//! └── uploads/        # Uploaded images (content-addressed)
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "Simple CMS"      # Used in <title> and the header
//! home_label = "Home"       # Label of the home link in the navigation
//! data_file = "site.json"   # Menus + content, relative to the site directory
//!
//! [uploads]
//! dir = "uploads"           # Where uploaded images are stored
//! url_prefix = "/uploads"   # Public path prefix written into section data
//!
//! [theme]
//! content_width = "72rem"   # Max width of the page body
//! section_gap = "3rem"      # Vertical space between sections
//! grid_gap = "1rem"         # Gap between image grid tiles
//!
//! [theme.hero_height]
//! size = "60vh"
//! min = "20rem"
//! max = "40rem"
//!
//! [theme.page_padding]
//! size = "4vw"
//! min = "1rem"
//! max = "3rem"
//!
//! [colors.light]
//! background = "#ffffff"
//! text = "#111111"
//! text_muted = "#666666"    # Nav, captions, subheadings
//! border = "#e0e0e0"
//! link = "#333333"
//! link_hover = "#000000"
//!
//! [colors.dark]
//! background = "#0a0a0a"
//! text = "#eeeeee"
//! text_muted = "#999999"
//! border = "#333333"
//! link = "#cccccc"
//! link_hover = "#ffffff"
//!
//! [render]
//! max_processes = 4         # Max parallel page renderers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site identity and data location.
    pub site: SiteSection,
    /// Image upload storage.
    pub uploads: UploadsConfig,
    /// Color schemes for light and dark modes.
    pub colors: ColorConfig,
    /// Layout settings.
    pub theme: ThemeConfig,
    /// Parallel rendering settings.
    pub render: RenderConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.title.trim().is_empty() {
            return Err(ConfigError::Validation("site.title must not be empty".into()));
        }
        if self.site.data_file.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site.data_file must not be empty".into(),
            ));
        }
        if !self.uploads.url_prefix.starts_with('/') {
            return Err(ConfigError::Validation(
                "uploads.url_prefix must start with '/'".into(),
            ));
        }
        if self.render.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "render.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    pub title: String,
    pub home_label: String,
    /// Site data file, relative to the site directory.
    pub data_file: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: "Simple CMS".to_string(),
            home_label: "Home".to_string(),
            data_file: "site.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadsConfig {
    /// Upload directory, relative to the site directory.
    pub dir: String,
    /// Public path prefix of uploaded files.
    pub url_prefix: String,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: "uploads".to_string(),
            url_prefix: "/uploads".to_string(),
        }
    }
}

/// Parallel rendering settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Maximum number of pages rendered in parallel.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &RenderConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// A responsive CSS size expressed as `clamp(min, size, max)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClampSize {
    /// Preferred/fluid value, typically viewport-relative (e.g. `"4vw"`).
    pub size: String,
    pub min: String,
    pub max: String,
}

impl ClampSize {
    fn new(size: &str, min: &str, max: &str) -> Self {
        Self {
            size: size.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }

    /// Render as a CSS `clamp()` expression.
    pub fn to_css(&self) -> String {
        format!("clamp({}, {}, {})", self.min, self.size, self.max)
    }
}

/// Layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThemeConfig {
    /// Height of hero banners and slides.
    pub hero_height: ClampSize,
    /// Horizontal padding of the page body.
    pub page_padding: ClampSize,
    /// Max width of the page body (CSS value).
    pub content_width: String,
    /// Vertical space between sections (CSS value).
    pub section_gap: String,
    /// Gap between image grid tiles (CSS value).
    pub grid_gap: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            hero_height: ClampSize::new("60vh", "20rem", "40rem"),
            page_padding: ClampSize::new("4vw", "1rem", "3rem"),
            content_width: "72rem".to_string(),
            section_gap: "3rem".to_string(),
            grid_gap: "1rem".to_string(),
        }
    }
}

/// Color configuration for light and dark modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    pub light: ColorScheme,
    pub dark: ColorScheme,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            light: ColorScheme::default_light(),
            dark: ColorScheme::default_dark(),
        }
    }
}

/// Individual color scheme (light or dark).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    pub background: String,
    pub text: String,
    /// Muted/secondary text color (nav, captions, subheadings).
    pub text_muted: String,
    pub border: String,
    pub link: String,
    pub link_hover: String,
}

impl ColorScheme {
    pub fn default_light() -> Self {
        Self {
            background: "#ffffff".to_string(),
            text: "#111111".to_string(),
            text_muted: "#666666".to_string(),
            border: "#e0e0e0".to_string(),
            link: "#333333".to_string(),
            link_hover: "#000000".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#0a0a0a".to_string(),
            text: "#eeeeee".to_string(),
            text_muted: "#999999".to_string(),
            border: "#333333".to_string(),
            link: "#cccccc".to_string(),
            link_hover: "#ffffff".to_string(),
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`, the base layer
/// for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a site directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(site_dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = site_dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given site directory.
pub fn load_config(site_dir: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(site_dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple CMS Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file in the site directory, next to site.json.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
# Shown in the page <title> and the site header.
title = "Simple CMS"

# Label of the home link in the navigation.
home_label = "Home"

# Menus and content documents, relative to the site directory.
data_file = "site.json"

# ---------------------------------------------------------------------------
# Uploads
# ---------------------------------------------------------------------------
[uploads]
# Directory uploaded images are stored in, relative to the site directory.
dir = "uploads"

# Public path prefix written into section data (must start with '/').
url_prefix = "/uploads"

# ---------------------------------------------------------------------------
# Theme / layout
# ---------------------------------------------------------------------------
[theme]
# Max width of the page body (CSS value).
content_width = "72rem"

# Vertical space between sections (CSS value).
section_gap = "3rem"

# Gap between image grid tiles (CSS value).
grid_gap = "1rem"

# Height of hero banners, as CSS clamp(min, size, max).
[theme.hero_height]
size = "60vh"
min = "20rem"
max = "40rem"

# Horizontal page padding, as CSS clamp(min, size, max).
[theme.page_padding]
size = "4vw"
min = "1rem"
max = "3rem"

# ---------------------------------------------------------------------------
# Colors - Light mode (prefers-color-scheme: light)
# ---------------------------------------------------------------------------
[colors.light]
background = "#ffffff"
text = "#111111"
text_muted = "#666666"    # Nav, captions, subheadings
border = "#e0e0e0"
link = "#333333"
link_hover = "#000000"

# ---------------------------------------------------------------------------
# Colors - Dark mode (prefers-color-scheme: dark)
# ---------------------------------------------------------------------------
[colors.dark]
background = "#0a0a0a"
text = "#eeeeee"
text_muted = "#999999"
border = "#333333"
link = "#cccccc"
link_hover = "#ffffff"

# ---------------------------------------------------------------------------
# Rendering
# ---------------------------------------------------------------------------
[render]
# Maximum pages rendered in parallel.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

/// Generate CSS custom properties from color config: light values on
/// `:root`, dark values under `prefers-color-scheme: dark`.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    format!(
        ":root {{\n{}}}\n\n@media (prefers-color-scheme: dark) {{\n    :root {{\n{}    }}\n}}",
        color_declarations(&colors.light, 1),
        color_declarations(&colors.dark, 2),
    )
}

fn color_declarations(scheme: &ColorScheme, depth: usize) -> String {
    let pad = "    ".repeat(depth);
    [
        ("bg", &scheme.background),
        ("text", &scheme.text),
        ("text-muted", &scheme.text_muted),
        ("border", &scheme.border),
        ("link", &scheme.link),
        ("link-hover", &scheme.link_hover),
    ]
    .iter()
    .map(|(name, value)| format!("{pad}--color-{name}: {value};\n"))
    .collect()
}

/// Generate CSS custom properties from theme config.
pub fn generate_theme_css(theme: &ThemeConfig) -> String {
    format!(
        r#":root {{
    --hero-height: {hero_height};
    --page-padding: {page_padding};
    --content-width: {content_width};
    --section-gap: {section_gap};
    --grid-gap: {grid_gap};
}}"#,
        hero_height = theme.hero_height.to_css(),
        page_padding = theme.page_padding.to_css(),
        content_width = theme.content_width,
        section_gap = theme.section_gap,
        grid_gap = theme.grid_gap,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = SiteConfig::default();
        assert_eq!(config.site.title, "Simple CMS");
        assert_eq!(config.site.data_file, "site.json");
        assert_eq!(config.uploads.url_prefix, "/uploads");
        assert_eq!(config.colors.light.background, "#ffffff");
        assert_eq!(config.colors.dark.background, "#0a0a0a");
        assert_eq!(
            config.theme.hero_height.to_css(),
            "clamp(20rem, 60vh, 40rem)"
        );
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[colors.light]
background = "#fafafa"

[site]
title = "Acme"
"##;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.colors.light.background, "#fafafa");
        assert_eq!(config.site.title, "Acme");
        // Defaults preserved
        assert_eq!(config.colors.light.text, "#111111");
        assert_eq!(config.site.home_label, "Home");
        assert_eq!(config.uploads.dir, "uploads");
    }

    #[test]
    fn color_css_has_light_and_dark_blocks() {
        let mut colors = ColorConfig::default();
        colors.dark.link = "#88f".to_string();

        let css = generate_color_css(&colors);
        let (light, dark) = css.split_once("@media (prefers-color-scheme: dark)").unwrap();
        assert!(light.contains("    --color-bg: #ffffff;"));
        assert!(light.contains("--color-link-hover: #000000;"));
        assert!(dark.contains("        --color-link: #88f;"));
        assert!(dark.contains("--color-text-muted: #999999;"));
    }

    #[test]
    fn generate_theme_css_includes_variables() {
        let css = generate_theme_css(&ThemeConfig::default());
        assert!(css.contains("--hero-height: clamp(20rem, 60vh, 40rem)"));
        assert!(css.contains("--page-padding: clamp(1rem, 4vw, 3rem)"));
        assert!(css.contains("--content-width: 72rem"));
        assert!(css.contains("--grid-gap: 1rem"));
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.site.title, "Simple CMS");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r##"
[uploads]
dir = "media"
url_prefix = "/media"

[colors.dark]
link = "#88f"
"##,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.uploads.dir, "media");
        assert_eq!(config.uploads.url_prefix, "/media");
        assert_eq!(config.colors.dark.link, "#88f");
        assert_eq!(config.colors.dark.background, "#0a0a0a");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
[uploads]
url_prefix = "uploads"
"#,
        )
        .unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    // =========================================================================
    // Render config tests
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&RenderConfig::default()), cores);
        assert_eq!(
            effective_threads(&RenderConfig {
                max_processes: Some(99999)
            }),
            cores
        );
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = RenderConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn parse_render_config() {
        let config: SiteConfig = toml::from_str("[render]\nmax_processes = 4\n").unwrap();
        assert_eq!(config.render.max_processes, Some(4));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_overrides_site_keys_and_keeps_the_rest() {
        let overlay: toml::Value = toml::from_str(
            r#"
[site]
title = "Acme"

[uploads]
url_prefix = "/media"
"#,
        )
        .unwrap();
        let merged = merge_toml(stock_defaults_value().unwrap(), overlay);
        let site = merged.get("site").unwrap();
        assert_eq!(site.get("title").unwrap().as_str(), Some("Acme"));
        assert_eq!(site.get("data_file").unwrap().as_str(), Some("site.json"));
        let uploads = merged.get("uploads").unwrap();
        assert_eq!(uploads.get("url_prefix").unwrap().as_str(), Some("/media"));
        assert_eq!(uploads.get("dir").unwrap().as_str(), Some("uploads"));
    }

    #[test]
    fn theme_override_merges_inside_clamp() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
[theme]
content_width = "60rem"

[theme.hero_height]
min = "12rem"
"#,
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.theme.hero_height.to_css(), "clamp(12rem, 60vh, 40rem)");

        let css = generate_theme_css(&config.theme);
        assert!(css.contains("--content-width: 60rem;"));
        assert!(css.contains("--hero-height: clamp(12rem, 60vh, 40rem);"));
        assert!(css.contains("--section-gap: 3rem;"));
    }

    // =========================================================================
    // Unknown key rejection / validation
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("[site]\ntitel = \"x\"\n");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("[images]\nquality = 90\n");
        assert!(result.is_err());
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = SiteConfig::default();
        config.site.title = "  ".into();
        assert!(config.validate().is_err());

        let mut config = SiteConfig::default();
        config.render.max_processes = Some(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_processes"));
    }

    #[test]
    fn resolve_config_with_overlay() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str("[site]\nhome_label = \"Start\"\n").unwrap();
        let config = resolve_config(base, Some(overlay)).unwrap();
        assert_eq!(config.site.home_label, "Start");
        assert_eq!(config.site.title, "Simple CMS");
    }

    // =========================================================================
    // stock config
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config.site.title, "Simple CMS");
        assert_eq!(config.uploads.url_prefix, "/uploads");
        assert_eq!(config.theme.grid_gap, "1rem");
        assert_eq!(config.colors.dark.background, "#0a0a0a");
        assert_eq!(config.render.max_processes, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let content = stock_config_toml();
        for section in [
            "[site]",
            "[uploads]",
            "[theme]",
            "[theme.hero_height]",
            "[theme.page_padding]",
            "[colors.light]",
            "[colors.dark]",
            "[render]",
        ] {
            assert!(content.contains(section), "missing {section}");
        }
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value().unwrap();
        assert!(val.is_table());
        for key in ["site", "uploads", "colors", "theme", "render"] {
            assert!(val.get(key).is_some(), "missing {key}");
        }
    }
}
