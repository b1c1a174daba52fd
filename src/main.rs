use clap::{Args, Parser, Subcommand, ValueEnum};
use simple_cms::config::{self, SiteConfig};
use simple_cms::document::ContentDocument;
use simple_cms::editor::{EditorError, EditorSession, Reorder, SaveOutcome};
use simple_cms::menu::{
    MegaMenuFields, MenuError, MenuFields, MenuLevel, MenuTree, Selection, SubMegaMenuFields,
};
use simple_cms::section::SectionType;
use simple_cms::store::{ContentFilter, ContentStore, DirImageStore, ImageStore, SiteStore};
use simple_cms::{output, render};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "simple-cms")]
#[command(about = "Section-based page content and menus for small sites")]
#[command(long_about = "\
Section-based page content and menus for small sites

A site directory holds everything:

  my-site/
  ├── config.toml     # Optional, see 'simple-cms gen-config'
  ├── site.json       # Menus and content documents
  └── uploads/        # Uploaded images

Pages are lists of sections (hero, heroSlider, imageGrid, list, text) and
hang under a Menu, MegaMenu or SubMegaMenu. 'render' writes one HTML page per
document at the path of its menu node.

Set RUST_LOG (e.g. RUST_LOG=simple_cms=debug) for detailed logs.")]
#[command(version)]
struct Cli {
    /// Site directory
    #[arg(long, default_value = ".", global = true)]
    site: PathBuf,

    /// Output directory for `render`
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate config and site data, report problems
    Check,
    /// Show the menu tree with the pages placed under it
    List,
    /// Render every page to static HTML
    Render,
    /// Print a stock config.toml with all options documented
    GenConfig,
    /// Manage menu nodes
    #[command(subcommand)]
    Menu(MenuCommand),
    /// Manage pages
    #[command(subcommand)]
    Page(PageCommand),
    /// Store an image and print the path to use in section data
    Upload {
        /// Image file
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LevelArg {
    Menu,
    Mega,
    Sub,
}

impl From<LevelArg> for MenuLevel {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Menu => MenuLevel::Menu,
            LevelArg::Mega => MenuLevel::MegaMenu,
            LevelArg::Sub => MenuLevel::SubMegaMenu,
        }
    }
}

/// Where in the menu tree something goes.
#[derive(Args, Clone, Copy, Default)]
struct PlacementArgs {
    /// Parent menu id
    #[arg(long)]
    menu_id: Option<u64>,
    /// Parent mega menu id
    #[arg(long)]
    mega_menu_id: Option<u64>,
    /// Sub mega menu id (pages only)
    #[arg(long)]
    sub_mega_menu_id: Option<u64>,
}

impl PlacementArgs {
    fn selection(self) -> Selection {
        Selection::default()
            .select(MenuLevel::Menu, self.menu_id)
            .select(MenuLevel::MegaMenu, self.mega_menu_id)
            .select(MenuLevel::SubMegaMenu, self.sub_mega_menu_id)
    }
}

#[derive(Subcommand)]
enum MenuCommand {
    /// Create a menu node
    Add {
        level: LevelArg,
        #[arg(long)]
        title: String,
        #[arg(long)]
        path: String,
        #[arg(long)]
        quick_link: bool,
        #[command(flatten)]
        parent: PlacementArgs,
    },
    /// Delete a menu node (children and pages are kept)
    Remove { level: LevelArg, id: u64 },
}

#[derive(Subcommand)]
enum PageCommand {
    /// Create a page from default sections
    New {
        #[arg(long)]
        title: String,
        /// Section types to add, in order
        #[arg(long = "section", value_parser = parse_section_type)]
        sections: Vec<SectionType>,
        #[command(flatten)]
        placement: PlacementArgs,
    },
    /// Show one page and its sections
    Show { id: u64 },
    /// Create or update a page from a JSON document
    Import { file: PathBuf },
    /// Move a section within a page (1-based positions)
    Move {
        id: u64,
        #[arg(value_parser = parse_position)]
        from: usize,
        #[arg(value_parser = parse_position)]
        to: usize,
    },
    /// Delete a page
    Remove { id: u64 },
}

fn parse_section_type(tag: &str) -> Result<SectionType, String> {
    SectionType::parse(tag).ok_or_else(|| {
        let known: Vec<&str> = SectionType::ALL.iter().map(|t| t.tag()).collect();
        format!("unknown section type `{}` (expected one of {})", tag, known.join(", "))
    })
}

/// A 1-based section position, returned 0-based.
fn parse_position(arg: &str) -> Result<usize, String> {
    match arg.parse::<usize>() {
        Ok(0) => Err("positions start at 1".to_string()),
        Ok(n) => Ok(n - 1),
        Err(e) => Err(e.to_string()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let site_config = config::load_config(&cli.site)?;
    let data_path = cli.site.join(&site_config.site.data_file);
    let mut store = SiteStore::load(&data_path)?;

    match cli.command {
        Command::GenConfig => {}
        Command::Check => {
            println!("==> Checking {}", cli.site.display());
            let issues = store.audit();
            output::print_audit(&issues);
            if issues.is_empty() {
                println!("==> Site is valid");
            }
        }
        Command::List => {
            output::print_site(&store);
        }
        Command::Render => {
            init_thread_pool(&site_config.render);
            println!("==> Rendering {} → {}", cli.site.display(), cli.output.display());
            let summary = render::render_site(&store, &site_config, &cli.site, &cli.output)?;
            output::print_render(&summary);
        }
        Command::Menu(cmd) => {
            run_menu(cmd, &mut store.menus)?;
            store.save(&data_path)?;
        }
        Command::Page(cmd) => {
            if run_page(cmd, &mut store)? {
                store.save(&data_path)?;
            }
        }
        Command::Upload { file } => {
            let bytes = std::fs::read(&file)?;
            let mut images = uploads(&cli.site, &site_config);
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let path = images.upload(&name, &bytes)?;
            println!("{}", path);
        }
    }

    Ok(())
}

fn run_menu(cmd: MenuCommand, tree: &mut MenuTree) -> Result<(), Box<dyn std::error::Error>> {
    let result = match cmd {
        MenuCommand::Add {
            level,
            title,
            path,
            quick_link,
            parent,
        } => match MenuLevel::from(level) {
            MenuLevel::Menu => tree
                .create_menu(MenuFields {
                    title,
                    path,
                    enable_quick_link: quick_link,
                })
                .map(|m| println!("Created menu {}: {} → {}", m.id, m.title, m.path)),
            MenuLevel::MegaMenu => tree
                .create_mega_menu(MegaMenuFields {
                    menu_id: parent.menu_id,
                    title,
                    path,
                    enable_quick_link: quick_link,
                })
                .map(|m| println!("Created mega menu {}: {} → {}", m.id, m.title, m.path)),
            MenuLevel::SubMegaMenu => tree
                .create_sub_mega_menu(SubMegaMenuFields {
                    menu_id: parent.menu_id,
                    mega_menu_id: parent.mega_menu_id,
                    title,
                    path,
                    enable_quick_link: quick_link,
                })
                .map(|m| println!("Created sub mega menu {}: {} → {}", m.id, m.title, m.path)),
        },
        MenuCommand::Remove { level, id } => match MenuLevel::from(level) {
            MenuLevel::Menu => tree.delete_menu(id),
            MenuLevel::MegaMenu => tree.delete_mega_menu(id),
            MenuLevel::SubMegaMenu => tree.delete_sub_mega_menu(id),
        }
        .map(|()| println!("Removed {} {}", MenuLevel::from(level), id)),
    };

    if let Err(MenuError::Validation { level, errors }) = &result {
        println!("Invalid {}:", level);
        for line in output::format_form_errors(errors) {
            println!("{}", line);
        }
    }
    Ok(result?)
}

/// Run a page command. Returns whether the store changed.
fn run_page(cmd: PageCommand, store: &mut SiteStore) -> Result<bool, Box<dyn std::error::Error>> {
    match cmd {
        PageCommand::New {
            title,
            sections,
            placement,
        } => {
            let mut editor = EditorSession::new();
            editor.set_title(title)?;
            for kind in sections {
                editor.add_section(kind)?;
            }
            editor.place(placement.selection())?;
            report_save(editor.save(store)?);
            Ok(true)
        }
        PageCommand::Show { id } => {
            output::print_document(&store.get_content(id)?);
            Ok(false)
        }
        PageCommand::Import { file } => {
            let json = std::fs::read_to_string(&file)?;
            let doc = ContentDocument::from_json(&json)?;
            let mut editor = EditorSession::open(doc);
            let outcome = match editor.save(store) {
                // The id no longer exists; the session dropped it, so this creates.
                Err(EditorError::NotFound(_)) => editor.save(store)?,
                other => other?,
            };
            report_save(outcome);
            Ok(true)
        }
        PageCommand::Move { id, from, to } => {
            let mut editor = EditorSession::new();
            editor.load(&*store, id)?;
            editor.reorder(Reorder { from, to })?;
            report_save(editor.save(store)?);
            output::print_document(editor.document());
            Ok(true)
        }
        PageCommand::Remove { id } => {
            let mut editor = EditorSession::new();
            editor.load(&*store, id)?;
            editor.delete(store)?;
            println!("Removed content {}", id);
            let remaining = store.list_content(&ContentFilter::all())?.len();
            println!("{} page(s) left", remaining);
            Ok(true)
        }
    }
}

fn report_save(outcome: SaveOutcome) {
    match outcome {
        SaveOutcome::Created(id) => println!("Created content {}", id),
        SaveOutcome::Updated => println!("Updated content"),
    }
}

fn uploads(site: &Path, config: &SiteConfig) -> DirImageStore {
    DirImageStore::new(site.join(&config.uploads.dir), config.uploads.url_prefix.clone())
}

/// Log to stderr so stdout stays the command's output. `RUST_LOG` wins over
/// `-v` when set.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on render config.
///
/// Caps at the number of available CPU cores; the config can lower it, never raise it.
fn init_thread_pool(render: &config::RenderConfig) {
    let threads = config::effective_threads(render);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
