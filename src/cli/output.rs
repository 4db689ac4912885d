//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;
use serde::Serialize;
use termtree::Tree;

use crate::application::services::{CategoryView, ModuleView, NodeListItem};
use crate::cli::error::{CliError, CliResult};
use crate::domain::{CategoryType, NodeTree, ScopeState};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print completed action (green label)
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Print plain output (no color, for data)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Print a value as pretty JSON
pub fn json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::Usage(format!("serialize output: {e}")))?;
    println!("{}", text);
    Ok(())
}

fn flag(on: bool, label: &str) -> String {
    if on {
        label.green().to_string()
    } else {
        label.dimmed().to_string()
    }
}

fn scope_flags(states: &[ScopeState]) -> String {
    states
        .iter()
        .map(|s| {
            let mark = match (s.selected, s.required) {
                (true, true) => "required",
                (true, false) => "selected",
                _ => "off",
            };
            format!("{}={}", s.scope.label(), mark)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// One line per category: name, id, flags and module state
pub fn category_line(view: &CategoryView) {
    let c = &view.category;
    let kind = match c.kind {
        CategoryType::System => "system".yellow().to_string(),
        CategoryType::Customize => "custom".normal().to_string(),
    };
    println!(
        "{:>3} {} ({}) [{}] {} {}",
        c.sort_weight,
        c.name.bold(),
        c.id.dimmed(),
        kind,
        flag(c.using, "using"),
        flag(c.required, "required"),
    );
    detail(&scope_flags(&view.modules));
}

/// One line per listed node, with its ancestor path
pub fn node_line(item: &NodeListItem) {
    let name = match item.highlight {
        Some((start, end)) => format!(
            "{}{}{}",
            &item.node.name[..start],
            item.node.name[start..end].yellow().bold(),
            &item.node.name[end..]
        ),
        None => item.node.name.clone(),
    };
    let path = if item.path.is_empty() {
        String::new()
    } else {
        format!("{} / ", item.path.join(" / ")).dimmed().to_string()
    };
    println!(
        "{}{} ({}){}",
        path,
        name,
        item.node.id.dimmed(),
        if item.expansion { " +" } else { "" }
    );
}

fn node_label(tree: &NodeTree) -> String {
    let name = if tree.hit {
        tree.node.name.yellow().bold().to_string()
    } else {
        tree.node.name.clone()
    };
    let mut marks = Vec::new();
    if tree.node.selected {
        marks.push("selected");
    }
    if tree.node.required {
        marks.push("required");
    }
    if marks.is_empty() {
        format!("{} ({})", name, tree.node.id.dimmed())
    } else {
        format!("{} ({}) [{}]", name, tree.node.id.dimmed(), marks.join(","))
    }
}

/// Convert a nested node view into a printable termtree.
pub fn to_termtree(tree: &NodeTree) -> Tree<String> {
    let mut out = Tree::new(node_label(tree));
    for child in &tree.children {
        out.push(to_termtree(child));
    }
    out
}

/// Print a forest
pub fn forest(trees: &[NodeTree]) {
    for tree in trees {
        print!("{}", to_termtree(tree));
    }
}

/// Print one module of a category with its sub-tree
pub fn module(view: &ModuleView) {
    println!(
        "  {} {} {}",
        view.label.bold(),
        flag(view.selected, "selected"),
        flag(view.required, "required")
    );
    for tree in &view.tree {
        for line in to_termtree(tree).to_string().lines() {
            println!("    {}", line);
        }
    }
}
