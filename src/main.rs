use clap::{Parser, Subcommand};
use pagetree::cache::{self, CacheOutcome, FileCacheStore};
use pagetree::config::{self, IndexConfig};
use pagetree::content::FrontMatterParser;
use pagetree::output;
use pagetree::page_types::PageTypes;
use pagetree::tree::Tree;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pagetree")]
#[command(about = "Index content folders into an ordered, routable page tree")]
#[command(long_about = "\
Index content folders into an ordered, routable page tree

Every folder under the content root is a page. A page file inside it
(default.md, blog.md, ...) supplies the title, date and ordering; folders
without one are kept for their children but cannot be requested.

Content structure:

  site/
  ├── pagetree.toml                # Index config (optional)
  └── pages/
      ├── 01.home/default.md       # Numbered = visible, route /home (and /)
      ├── 02.blog/blog.md          # [order] by = \"date\", dir = \"desc\"
      │   ├── 01.first-post/item.md
      │   └── _sidebar/hero.md     # Hidden prefix = modular, never routed
      └── archive/                 # No page file = not routable
          └── 2020/item.md         # ...children still are: /archive/2020

Run 'pagetree gen-config' to generate a documented pagetree.toml.")]
#[command(version)]
struct Cli {
    /// Site directory (holds pagetree.toml and the content root)
    #[arg(long, default_value = ".", global = true)]
    site: PathBuf,

    /// Rebuild the tree without reading or writing the cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index the content root and print the page tree
    Index,
    /// Print the route table
    Routes,
    /// Resolve a URL through routes, redirects and aliases
    Resolve {
        url: String,
        /// Also return pages that are not routable
        #[arg(long)]
        all: bool,
    },
    /// List the children of a route in order
    Children {
        route: String,
        /// Ordering strategy (defaults to the page's own)
        #[arg(long)]
        order_by: Option<String>,
        /// asc or desc (defaults to the page's own)
        #[arg(long)]
        order_dir: Option<String>,
    },
    /// List page types found in a templates directory
    Types {
        #[arg(long, default_value = "templates")]
        templates: PathBuf,
        #[arg(long, default_value = ".html")]
        ext: String,
    },
    /// Print a stock pagetree.toml with all options documented
    GenConfig,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "pagetree=debug" } else { "pagetree=warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Config plus the page tree, from the cache when allowed.
fn open(
    site: &Path,
    no_cache: bool,
) -> Result<(IndexConfig, Tree, CacheOutcome), Box<dyn std::error::Error>> {
    let config = config::load_config(site)?;
    let root = config.content_root(site);
    let (tree, outcome) = if no_cache {
        let tree = cache::rebuild(&root, &config, &FrontMatterParser)?;
        (tree, CacheOutcome::Disabled)
    } else {
        let mut store = FileCacheStore::new(config.cache_dir(site));
        cache::load_tree(&root, &config, &FrontMatterParser, &mut store)?
    };
    Ok((config, tree, outcome))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Index => {
            let (config, tree, outcome) = open(&cli.site, cli.no_cache)?;
            output::print_index_output(&tree, &config.content_root(&cli.site), outcome);
        }
        Command::Routes => {
            let (config, tree, _) = open(&cli.site, cli.no_cache)?;
            output::print_routes(&tree, &config.content_root(&cli.site));
        }
        Command::Resolve { url, all } => {
            let (config, tree, _) = open(&cli.site, cli.no_cache)?;
            let result = tree.dispatch(&url, all, &config.routing);
            output::print_dispatch(&url, &result, &config.content_root(&cli.site));
        }
        Command::Children {
            route,
            order_by,
            order_dir,
        } => {
            let (config, tree, _) = open(&cli.site, cli.no_cache)?;
            let page = tree
                .dispatch(&route, true, &config.routing)
                .page()
                .ok_or_else(|| format!("no page at {route}"))?;
            let mut children = tree.children(&page.path);
            if order_by.is_some() || order_dir.is_some() {
                let by = order_by.as_deref().unwrap_or(&page.order_by);
                let dir = order_dir.as_deref().unwrap_or(&page.order_dir);
                children.order(by, dir, None)?;
            }
            output::print_collection(&children);
        }
        Command::Types { templates, ext } => {
            let dir = if templates.is_absolute() {
                templates
            } else {
                cli.site.join(templates)
            };
            output::print_types(&PageTypes::scan(&dir, &ext)?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
