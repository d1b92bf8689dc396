//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Read configuration from this file
//! - `--data-dir <path>`: Override the configured data directory

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::types::{Confidence, LineageType, ProductName, ProductStatus, Semver};

/// Meshline - a data product registry and lineage graph engine
#[derive(Parser, Debug)]
#[command(name = "meshline")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the standard locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the configured data directory
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage data products in the catalog
    #[command(subcommand)]
    Product(ProductCommand),

    /// Record and explore lineage between products
    #[command(subcommand)]
    Lineage(LineageCommand),

    /// Aggregate statistics over the registry
    #[command(subcommand)]
    Stats(StatsCommand),

    /// Show registry status and counts
    Status,
}

/// Product catalog commands.
#[derive(Subcommand, Debug)]
pub enum ProductCommand {
    /// Register a new data product
    #[command(
        long_about = "Register a new data product.\n\n\
            The name becomes the product's permanent identity key and must be \
            unique across the registry. Names are limited to 100 characters of \
            ASCII letters, digits, '_' and '-'.",
        after_help = "\
EXAMPLES:
    # Minimal registration
    meshline product register orders --domain sales \\
        --owner sales-team@example.com --description 'Raw sales orders'

    # With schema, tags and an explicit version
    meshline product register orders --domain sales \\
        --owner sales-team@example.com --description 'Raw sales orders' \\
        --schema '{\"order_id\": \"int64\"}' --tag finance --tag pii --version 2.0.0"
    )]
    Register {
        /// Product name (identity key)
        name: ProductName,

        /// Business domain the product belongs to
        #[arg(long)]
        domain: String,

        /// Owning contact
        #[arg(long)]
        owner: String,

        /// Human-readable description
        #[arg(long)]
        description: String,

        /// Schema payload as a JSON object
        #[arg(long, value_name = "JSON")]
        schema: Option<String>,

        /// Declared version (MAJOR.MINOR.PATCH, defaults to 1.0.0)
        #[arg(long)]
        version: Option<Semver>,

        /// Lifecycle status (active, deprecated, inactive)
        #[arg(long)]
        status: Option<ProductStatus>,

        /// Tag to attach; repeat for multiple tags
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },

    /// Show a product by name
    Get {
        /// Product name
        name: ProductName,
    },

    /// List products, optionally filtered
    List {
        /// Only products in this domain (case-insensitive)
        #[arg(long)]
        domain: Option<String>,

        /// Only products with this status
        #[arg(long)]
        status: Option<ProductStatus>,

        /// Only products carrying this tag
        #[arg(long)]
        tag: Option<String>,

        /// Number of matching products to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Maximum number of products to return
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },

    /// Apply a partial update to a product
    #[command(
        long_about = "Apply a partial update to a product.\n\n\
            Only the fields you pass are changed; everything else keeps its \
            current value. The name itself can never be changed. Passing --tag \
            replaces the whole tag set."
    )]
    Update {
        /// Product name
        name: ProductName,

        /// New business domain
        #[arg(long)]
        domain: Option<String>,

        /// New owning contact
        #[arg(long)]
        owner: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// Replacement schema payload as a JSON object
        #[arg(long, value_name = "JSON")]
        schema: Option<String>,

        /// New lifecycle status
        #[arg(long)]
        status: Option<ProductStatus>,

        /// New declared version
        #[arg(long)]
        version: Option<Semver>,

        /// Replacement tag; repeat for multiple tags
        #[arg(long = "tag", value_name = "TAG")]
        tags: Option<Vec<String>>,
    },

    /// Delete a product
    #[command(
        long_about = "Delete a product from the catalog.\n\n\
            Lineage edges that reference the product are kept as historical \
            record; they are reported as usual by lineage queries."
    )]
    Delete {
        /// Product name
        name: ProductName,
    },
}

/// Lineage graph commands.
#[derive(Subcommand, Debug)]
pub enum LineageCommand {
    /// Record a lineage edge between two products
    #[command(
        long_about = "Record a directed lineage edge (source -> target).\n\n\
            Neither endpoint has to be registered in the catalog: lineage may \
            be declared ahead of formal registration.",
        after_help = "\
EXAMPLES:
    meshline lineage add --source orders --target daily-report \\
        --transformation 'daily aggregation' --type aggregated --confidence 0.9"
    )]
    Add {
        /// Upstream product name
        #[arg(long)]
        source: ProductName,

        /// Downstream product name
        #[arg(long)]
        target: ProductName,

        /// Description of the transformation
        #[arg(long)]
        transformation: String,

        /// Relationship kind (direct, derived, aggregated)
        #[arg(long = "type", value_name = "TYPE")]
        lineage_type: Option<LineageType>,

        /// Confidence score in [0.0, 1.0], defaults to 1.0
        #[arg(long)]
        confidence: Option<Confidence>,

        /// Metadata payload as a JSON object
        #[arg(long, value_name = "JSON")]
        metadata: Option<String>,
    },

    /// Query lineage edges, optionally filtered
    Query {
        /// Only edges with this source
        #[arg(long)]
        source: Option<ProductName>,

        /// Only edges with this target
        #[arg(long)]
        target: Option<ProductName>,

        /// Only edges of this kind
        #[arg(long = "type", value_name = "TYPE")]
        lineage_type: Option<LineageType>,

        /// Number of matching edges to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Maximum number of edges to return
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },

    /// All products that transitively feed into a product
    Upstream {
        /// Product name to start from
        name: ProductName,

        /// Bound the traversal to this many hops
        #[arg(long, value_name = "HOPS")]
        max_depth: Option<usize>,
    },

    /// All products transitively derived from a product
    Downstream {
        /// Product name to start from
        name: ProductName,

        /// Bound the traversal to this many hops
        #[arg(long, value_name = "HOPS")]
        max_depth: Option<usize>,
    },
}

/// Analytics commands.
#[derive(Subcommand, Debug)]
pub enum StatsCommand {
    /// Product counts grouped by domain
    Domains,

    /// Aggregate lineage edge statistics
    Lineage,
}
