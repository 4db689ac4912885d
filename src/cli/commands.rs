//! Command dispatch: maps parsed arguments onto service calls

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::{ListQuery, ModuleUpdate, NewNode, NodeEdit};
use crate::cli::args::{
    CategoryCommands, Cli, Commands, ConfigCommands, ModuleCommands, NodeCommands,
};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{CategoryOrder, Owner};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Run the parsed command line.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Some(Commands::Config { command }) => execute_config(cli, command),
        Some(Commands::Category { command }) => execute_category(cli, command),
        Some(Commands::Node { command }) => execute_node(cli, command),
        Some(Commands::Module { command }) => execute_module(cli, command),
        None => Err(CliError::Usage(
            "no command given, see --help".to_string(),
        )),
    }
}

fn config_dir(cli: &Cli) -> CliResult<PathBuf> {
    match &cli.config_dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir()
            .map_err(|e| InfraError::io("get current directory", e).into()),
    }
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let dir = config_dir(cli)?;
    let mut settings = Settings::load(Some(&dir))?;
    if let Some(store) = &cli.store {
        settings.store_path = store.clone();
    }
    debug!("load_settings: store={}", settings.store_path.display());
    Ok(settings)
}

fn container(cli: &Cli) -> CliResult<ServiceContainer> {
    Ok(ServiceContainer::new(load_settings(cli)?)?)
}

#[instrument(level = "debug", skip(cli))]
fn execute_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::warning("no global config directory on this platform"),
            }
            output::action("local", &local_config_path(&config_dir(cli)?).display());
            output::action("store", &load_settings(cli)?.store_path.display());
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}

#[instrument(level = "debug", skip(cli))]
fn execute_category(cli: &Cli, command: &CategoryCommands) -> CliResult<()> {
    let services = container(cli)?;
    let categories = &services.categories;
    match command {
        CategoryCommands::Add { name, description } => {
            let category = categories.add(name, description)?;
            if cli.json {
                return output::json(&category);
            }
            output::success(&format!("created {} ({})", category.name, category.id));
        }
        CategoryCommands::Delete { id } => {
            categories.delete(id)?;
            output::success(&format!("deleted {}", id));
        }
        CategoryCommands::Edit {
            id,
            name,
            description,
        } => {
            categories.edit(id, name, description)?;
            output::success(&format!("updated {}", id));
        }
        CategoryCommands::Required { id, required } => {
            categories.edit_required(id, *required)?;
            output::success(&format!("{} required={}", id, required));
        }
        CategoryCommands::Using { id, using } => {
            categories.edit_using(id, *using)?;
            output::success(&format!("{} using={}", id, using));
        }
        CategoryCommands::Order { orders } => {
            let orders: Vec<CategoryOrder> = orders
                .iter()
                .map(|(id, sort_weight)| CategoryOrder {
                    id: id.clone(),
                    sort_weight: *sort_weight,
                })
                .collect();
            categories.batch_edit(&orders)?;
            output::success(&format!("reordered {} categories", orders.len()));
        }
        CategoryCommands::List { keyword } => {
            let views = categories.get_all(keyword.as_deref())?;
            if cli.json {
                return output::json(&views);
            }
            views.iter().for_each(output::category_line);
        }
        CategoryCommands::Show { id } => {
            let view = categories.get(id)?;
            if cli.json {
                return output::json(&view);
            }
            output::category_line(&view);
            if !view.category.description.is_empty() {
                output::detail(&view.category.description);
            }
        }
        CategoryCommands::Check { name, exclude } => {
            let taken = categories.name_exists(name, exclude.as_deref())?;
            if cli.json {
                return output::json(&taken);
            }
            output::info(&taken);
        }
    }
    Ok(())
}

#[instrument(level = "debug", skip(cli))]
fn execute_node(cli: &Cli, command: &NodeCommands) -> CliResult<()> {
    let services = container(cli)?;
    let tree = &services.tree;
    match command {
        NodeCommands::Add {
            category,
            name,
            parent,
            owner,
            owner_uid,
            required,
            selected,
        } => {
            let node = tree.add(
                category,
                NewNode {
                    parent_id: parent.clone(),
                    name: name.clone(),
                    owner: Owner::new(owner.as_str(), owner_uid.as_str()),
                    required: *required,
                    selected: *selected,
                },
            )?;
            if cli.json {
                return output::json(&node);
            }
            output::success(&format!("added {} ({})", node.name, node.id));
        }
        NodeCommands::Delete { category, node } => {
            let removed = tree.delete(category, node)?;
            output::success(&format!("deleted {} node(s)", removed));
        }
        NodeCommands::Edit {
            category,
            node,
            name,
            owner,
            owner_uid,
            required,
            selected,
        } => {
            tree.edit(
                category,
                node,
                NodeEdit {
                    name: name.clone(),
                    owner: Owner::new(owner.as_str(), owner_uid.as_str()),
                    required: *required,
                    selected: *selected,
                },
            )?;
            output::success(&format!("updated {}", node));
        }
        NodeCommands::Move {
            category,
            node,
            dest,
            before,
        } => {
            tree.reorder(category, node, dest, before.as_deref())?;
            output::success(&format!("moved {}", node));
        }
        NodeCommands::List {
            category,
            parent,
            keyword,
            recursive,
        } => {
            let query = ListQuery {
                parent_id: parent.clone(),
                keyword: keyword.clone(),
                recursive: *recursive,
            };
            let items = tree.list(category, &query)?;
            if cli.json {
                return output::json(&items);
            }
            items.iter().for_each(output::node_line);
        }
        NodeCommands::Tree { category, keyword } => {
            let forest = tree.list_tree(category, keyword.as_deref())?;
            if cli.json {
                return output::json(&forest);
            }
            output::forest(&forest);
        }
        NodeCommands::Check {
            category,
            name,
            parent,
            exclude,
        } => {
            let taken =
                tree.name_exists(category, parent.as_deref(), exclude.as_deref(), name)?;
            if cli.json {
                return output::json(&taken);
            }
            output::info(&taken);
        }
    }
    Ok(())
}

#[instrument(level = "debug", skip(cli))]
fn execute_module(cli: &Cli, command: &ModuleCommands) -> CliResult<()> {
    let services = container(cli)?;
    let modules = &services.modules;
    match command {
        ModuleCommands::Show { keyword } => {
            let configs = modules.get(keyword.as_deref())?;
            if cli.json {
                return output::json(&configs);
            }
            for config in &configs {
                output::header(&format!("{} ({})", config.name, config.category_id));
                config.modules.iter().for_each(output::module);
            }
        }
        ModuleCommands::Set { category, file } => {
            let items = read_items(file)?;
            modules.update(category, &items)?;
            output::success(&format!("updated modules of {}", category));
        }
    }
    Ok(())
}

fn read_items(path: &Path) -> CliResult<Vec<ModuleUpdate>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| InfraError::io(format!("read {}", path.display()), e))?;
    serde_json::from_str(&content)
        .map_err(|e| CliError::InvalidArgs(format!("{}: {}", path.display(), e)))
}
