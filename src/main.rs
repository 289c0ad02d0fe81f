//! # Folio CLI (`folio`)
//!
//! The `folio` binary inspects and serves a portfolio content tree. It
//! lists and filters projects, resolves single records, auto-links
//! technology names in markup, validates content and starts the JSON API.
//!
//! ## Usage
//!
//! ```bash
//! folio --config ./folio.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `folio projects` | Filtered, searched, paginated project listing |
//! | `folio project <slug>` | One project with its client, technologies and tags |
//! | `folio clients` | All clients |
//! | `folio technologies` | All technologies |
//! | `folio tags` | All tags, including ones only referenced by projects |
//! | `folio filters` | Filter vocabulary as JSON |
//! | `folio link <file>` | Auto-link technology names in an HTML fragment |
//! | `folio check` | Report unparseable records and missing assets |
//! | `folio serve` | Start the JSON HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! # Projects built with React, second page
//! folio projects --technology react --page 2
//!
//! # Fuzzy search, machine readable
//! folio projects --search "storefront" --json
//!
//! # Validate content before deploying
//! folio check
//! ```
//!
//! Logs go to stderr and honor `RUST_LOG` (default `folio=info`).

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use folio::check::{check_content, Severity};
use folio::config::{self, Config};
use folio::filter::ProjectFilter;
use folio::graph::ContentGraph;
use folio::models::Project;
use folio::paginate::{Page, Paginated};
use folio::server;

/// Folio: content resolution, filtering and auto-linking for an agency
/// portfolio site.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file.
#[derive(Parser)]
#[command(
    name = "folio",
    about = "Content resolution, filtering and auto-linking for an agency portfolio",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Relative `content.root` and `site.public_root` entries are resolved
    /// against the directory holding this file.
    #[arg(long, global = true, default_value = "./folio.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List published projects, newest first.
    ///
    /// One categorical filter applies at a time, in the order technology,
    /// category, industry, client. A search query reorders the result by
    /// relevance.
    Projects {
        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        technology: Option<String>,

        /// Category key, e.g. `web-app`.
        #[arg(long)]
        category: Option<String>,

        /// Industry key, e.g. `retail-and-consumer`.
        #[arg(long)]
        industry: Option<String>,

        #[arg(long)]
        client: Option<String>,

        #[arg(long)]
        tag: Option<String>,

        /// 1-based page number. Out-of-range pages fall back to the
        /// nearest valid page.
        #[arg(long, default_value = "1")]
        page: usize,

        /// Print the page as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show one published project.
    Project {
        slug: String,

        #[arg(long)]
        json: bool,
    },

    /// List clients.
    Clients {
        #[arg(long)]
        json: bool,
    },

    /// List technologies.
    Technologies {
        #[arg(long)]
        json: bool,
    },

    /// List tags.
    Tags {
        #[arg(long)]
        json: bool,
    },

    /// Print the filter vocabulary (technologies, categories, industries,
    /// clients and project summaries) as JSON.
    Filters,

    /// Auto-link technology names in an HTML fragment and print the result.
    Link {
        /// Fragment file. Use `-` for stdin.
        file: PathBuf,
    },

    /// Validate every content file and report problems.
    ///
    /// Exits non-zero when any record fails to parse.
    Check {
        #[arg(long)]
        json: bool,
    },

    /// Start the JSON HTTP API on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("folio=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    let graph = ContentGraph::from_config(&cfg);

    match cli.command {
        Commands::Projects {
            search,
            technology,
            category,
            industry,
            client,
            tag,
            page,
            json,
        } => {
            let filter = ProjectFilter {
                search,
                technology,
                category,
                industry,
                client,
                tag,
            };
            let listing = project_page(&graph, &cfg, &filter, page)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                print_listing(&listing);
            }
        }
        Commands::Project { slug, json } => {
            let Some(project) = graph.project(&slug) else {
                bail!("project not found: {}", slug);
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&project)?);
            } else {
                print_project(&graph, &project);
            }
        }
        Commands::Clients { json } => {
            let clients = graph.all_clients()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&clients)?);
            } else {
                for c in &clients {
                    println!("{:<24} {}", c.slug, c.name);
                }
                println!("\n{} clients", clients.len());
            }
        }
        Commands::Technologies { json } => {
            let technologies = graph.all_technologies()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&technologies)?);
            } else {
                for t in &technologies {
                    println!("{:<24} {}", t.slug, t.name);
                }
                println!("\n{} technologies", technologies.len());
            }
        }
        Commands::Tags { json } => {
            let tags = graph.all_tags()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tags)?);
            } else {
                for t in &tags {
                    println!("{:<24} {}", t.slug, t.name);
                }
                println!("\n{} tags", tags.len());
            }
        }
        Commands::Filters => {
            let vocab = graph.filter_vocabulary()?;
            println!("{}", serde_json::to_string_pretty(&vocab)?);
        }
        Commands::Link { file } => {
            let fragment = if file.as_os_str() == "-" {
                std::io::read_to_string(std::io::stdin()).context("Failed to read stdin")?
            } else {
                std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?
            };
            println!("{}", graph.autolink_fragment(&fragment)?);
        }
        Commands::Check { json } => {
            let report = check_content(&graph, &cfg.site.public_root)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for issue in &report.issues {
                    let level = match issue.severity {
                        Severity::Error => "error",
                        Severity::Warning => "warning",
                    };
                    println!(
                        "{:<8} {}/{}: {}",
                        level, issue.collection, issue.slug, issue.message
                    );
                }
                println!(
                    "\nChecked {} records: {} errors, {} warnings",
                    report.checked,
                    report.errors(),
                    report.issues.len() - report.errors()
                );
            }
            if report.errors() > 0 {
                bail!("{} content errors", report.errors());
            }
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}

/// The requested page, or the page it clamps to.
fn project_page(
    graph: &ContentGraph,
    cfg: &Config,
    filter: &ProjectFilter,
    page: usize,
) -> anyhow::Result<Page<Project>> {
    match graph.project_listing(filter, cfg, page)? {
        Paginated::Page(listing) => Ok(listing),
        Paginated::Redirect { page: clamped } => {
            tracing::warn!(requested = page, "page out of range, showing page {}", clamped);
            match graph.project_listing(filter, cfg, clamped)? {
                Paginated::Page(listing) => Ok(listing),
                Paginated::Redirect { page } => bail!("page {} did not resolve", page),
            }
        }
    }
}

fn print_listing(listing: &Page<Project>) {
    if listing.is_empty() {
        println!("No projects found.");
        return;
    }
    for p in &listing.items {
        let techs: Vec<&str> = p.technologies.iter().map(|t| t.name.as_str()).collect();
        println!("{}  {:<32} {}", p.date, p.title, p.client.name);
        if !techs.is_empty() {
            println!("            {}", techs.join(", "));
        }
    }
    println!(
        "\nPage {} of {} ({} projects)",
        listing.current_page, listing.total_pages, listing.total_items
    );
}

fn print_project(graph: &ContentGraph, p: &Project) {
    println!("{}", p.title);
    println!("  slug:     {}", p.slug);
    println!("  client:   {}", p.client.name);
    println!("  date:     {}", p.date);
    if let Some(updated) = p.update_date {
        println!("  updated:  {}", updated);
    }
    if let Some(category) = &p.category {
        println!("  category: {}", category);
    }
    if let Some(industry) = &p.industry {
        println!("  industry: {}", industry);
    }
    let techs: Vec<&str> = p.technologies.iter().map(|t| t.name.as_str()).collect();
    if !techs.is_empty() {
        println!("  built with: {}", techs.join(", "));
    }
    let tags: Vec<String> = graph.project_tags(p).into_iter().map(|t| t.name).collect();
    if !tags.is_empty() {
        println!("  tags:     {}", tags.join(", "));
    }
    if !p.iterations.is_empty() {
        println!("  iterations:");
        for it in &p.iterations {
            println!("    {}  {}", it.date, it.title);
        }
    }
    if !p.overview.is_empty() {
        println!("\n{}", p.overview);
    }
}
