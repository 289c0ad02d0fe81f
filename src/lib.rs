//! # Folio
//!
//! Content resolution, filtering and auto-linking for an agency portfolio
//! site.
//!
//! Projects, clients, technologies and tags live as front-matter files on
//! disk. Folio loads them on demand, resolves the references between them,
//! and answers the listing, search and pagination queries page renderers
//! need. Nothing is cached: every call reads the files again.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌────────────┐   ┌──────────┐
//! │ content/     │──▶│   Loaders    │──▶│ Filter +   │──▶│ Paginate │
//! │ front-matter │   │ (graph.rs)   │   │ search     │   │          │
//! └──────────────┘   └──────┬───────┘   └────────────┘   └────┬─────┘
//!                           │                                 │
//!                           ▼                                 ▼
//!                    ┌─────────────┐                   ┌────────────┐
//!                    │ Auto-linker │                   │ CLI / HTTP │
//!                    │ (markup)    │                   │  (folio)   │
//!                    └─────────────┘                   └────────────┘
//! ```
//!
//! ## Content layout
//!
//! ```text
//! content/
//! ├── clients/acme.mdx
//! ├── technologies/react.mdx
//! ├── tags/fintech.mdx
//! └── projects/
//!     └── shop/
//!         ├── index.mdx        # primary file
//!         └── 2024-relaunch.mdx # iteration
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`frontmatter`] | Front-matter splitting and typed parsing |
//! | [`models`] | Content records |
//! | [`collection`] | Flat-file collections (clients, technologies, tags) |
//! | [`projects`] | Project loading and reference resolution |
//! | [`graph`] | Collection and relationship queries |
//! | [`filter`] | Categorical filters |
//! | [`search`] | Weighted fuzzy search |
//! | [`paginate`] | Page slicing with redirect outcome |
//! | [`markup`] | Markup tree parse/render |
//! | [`autolink`] | Technology auto-linker |
//! | [`urls`] | URL, key and asset path helpers |
//! | [`check`] | Content validation report |
//! | [`server`] | JSON HTTP API |

pub mod autolink;
pub mod check;
pub mod collection;
pub mod config;
pub mod filter;
pub mod frontmatter;
pub mod graph;
pub mod markup;
pub mod models;
pub mod paginate;
pub mod projects;
pub mod search;
pub mod server;
pub mod urls;
