//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Category taxonomy engine: ordered category trees, node lifecycle, and module-configuration overlays
#[derive(Parser, Debug)]
#[command(name = "catree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (repeat for more: -d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Snapshot file (overrides store_path from config)
    #[arg(long, global = true, env = "CATREE_STORE", value_hint = ValueHint::FilePath)]
    pub store: Option<PathBuf>,

    /// Directory holding a local .catree.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage categories
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },

    /// Manage the nodes of a category tree
    Node {
        #[command(subcommand)]
        command: NodeCommands,
    },

    /// Show or set module configuration
    Module {
        #[command(subcommand)]
        command: ModuleCommands,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// Create a category with its module skeleton
    Add {
        name: String,
        #[arg(short = 'D', long, default_value = "")]
        description: String,
    },

    /// Delete a category with its tree
    Delete { id: String },

    /// Rename a category or change its description
    Edit {
        id: String,
        name: String,
        #[arg(short = 'D', long, default_value = "")]
        description: String,
    },

    /// Set the required flag
    Required {
        id: String,
        #[arg(action = clap::ArgAction::Set)]
        required: bool,
    },

    /// Activate or deactivate a category
    Using {
        id: String,
        #[arg(action = clap::ArgAction::Set)]
        using: bool,
    },

    /// Set sort weights, e.g. `order <id>=1 <id>=2`
    Order {
        #[arg(required = true, value_parser = parse_order)]
        orders: Vec<(String, u64)>,
    },

    /// List categories
    List {
        /// Filter by name
        #[arg(short, long)]
        keyword: Option<String>,
    },

    /// Show one category
    Show { id: String },

    /// Check whether a category name is taken
    Check {
        name: String,
        /// Ignore this category
        #[arg(long)]
        exclude: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum NodeCommands {
    /// Add a node (last child of its parent)
    Add {
        category: String,
        name: String,
        /// Parent node (default: root)
        #[arg(short, long)]
        parent: Option<String>,
        #[arg(long, default_value = "")]
        owner: String,
        #[arg(long, default_value = "")]
        owner_uid: String,
        #[arg(long)]
        required: Option<bool>,
        #[arg(long)]
        selected: Option<bool>,
    },

    /// Delete a node and its subtree
    Delete { category: String, node: String },

    /// Rename a node or change owner and flags
    Edit {
        category: String,
        node: String,
        name: String,
        #[arg(long, default_value = "")]
        owner: String,
        #[arg(long, default_value = "")]
        owner_uid: String,
        #[arg(long)]
        required: Option<bool>,
        #[arg(long)]
        selected: Option<bool>,
    },

    /// Move a node under a new parent, before a sibling
    Move {
        category: String,
        node: String,
        /// Destination parent ("0" for root)
        dest: String,
        /// Sibling to place the node before (default: last)
        #[arg(short, long)]
        before: Option<String>,
    },

    /// List children of a node
    List {
        category: String,
        #[arg(short, long)]
        parent: Option<String>,
        #[arg(short, long)]
        keyword: Option<String>,
        /// Include all descendants
        #[arg(short, long)]
        recursive: bool,
    },

    /// Show the category tree
    Tree {
        category: String,
        #[arg(short, long)]
        keyword: Option<String>,
    },

    /// Check whether a sibling name is taken
    Check {
        category: String,
        name: String,
        #[arg(short, long)]
        parent: Option<String>,
        /// Ignore this node
        #[arg(long)]
        exclude: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ModuleCommands {
    /// Show module configuration of active categories
    Show {
        #[arg(short, long)]
        keyword: Option<String>,
    },

    /// Replace module configuration from a JSON items file
    Set {
        category: String,
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,

    /// Print a config template
    Template,
}

fn parse_order(s: &str) -> Result<(String, u64), String> {
    let (id, weight) = s
        .split_once('=')
        .ok_or_else(|| format!("expected <id>=<weight>, got {s}"))?;
    let weight = weight
        .parse::<u64>()
        .map_err(|e| format!("invalid weight in {s}: {e}"))?;
    Ok((id.to_string(), weight))
}
