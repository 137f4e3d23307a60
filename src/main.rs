mod cli;

use std::fs::OpenOptions;

use anyhow::{bail, Context, Result};
use clap::Parser;

use grouptree::config::Config;
use grouptree::filter::filter_forest;
use grouptree::options::{build_options, filter_options};
use grouptree::output;
use grouptree::paths;
use grouptree::perms::{Action, FormPermissions};
use grouptree::snapshot;
use grouptree::tui;

use cli::{Cli, Command};

const LOG_ENV: &str = "GROUPTREE_LOG";

fn setup_logging() {
    let env = env_logger::Env::default().filter_or(LOG_ENV, "warn");
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Stderr)
        .init();
}

/// The browser owns the terminal, so it only logs when given a file.
fn setup_browse_logging(log_file: Option<&str>) -> Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {path}"))?;

    let env = env_logger::Env::default().filter_or(LOG_ENV, "info");
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_secs()
        .init();
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Command::Browse { log_file, .. } => setup_browse_logging(log_file.as_deref())?,
        _ => setup_logging(),
    }

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Tree {
            file,
            profile,
            search,
            max_depth,
            json,
        } => {
            let fields = config.field_map(profile.as_deref())?;
            let outcome = snapshot::load_forest(&file, &fields, config.max_depth(max_depth))?;
            if !outcome.warnings.is_empty() {
                eprint!("{}", output::format_warnings(&outcome.warnings));
            }
            let forest = filter_forest(&outcome.forest, search.as_deref().unwrap_or(""));
            if json {
                println!("{}", serde_json::to_string_pretty(&*forest)?);
            } else if forest.is_empty() {
                eprintln!("No groups found");
            } else {
                print!("{}", output::format_forest(&forest));
            }
        }

        Command::Options {
            file,
            profile,
            search,
            json,
        } => {
            let fields = config.field_map(profile.as_deref())?;
            let raw = snapshot::read_snapshot(&file)?;
            let options = build_options(&raw, &fields);
            let shown = filter_options(&options, search.as_deref().unwrap_or(""));
            if json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else if shown.is_empty() {
                eprintln!("No options found");
            } else {
                print!("{}", output::format_options(&shown));
            }
        }

        Command::Perms {
            file,
            form,
            role,
            action,
            json,
        } => {
            let records = snapshot::read_snapshot(&file)?;
            let perms = FormPermissions::resolve(role.as_deref(), &records, &form);
            if json {
                println!("{}", serde_json::to_string_pretty(&perms)?);
            } else {
                print!("{}", output::format_permissions(&form, &perms));
            }
            if let Some(action) = action {
                let action = Action::parse(&action)?;
                if !perms.allows(action) {
                    bail!("'{action}' is not allowed on form '{form}'");
                }
            }
        }

        Command::Profiles => {
            let default = config.default_profile();
            for name in config.profile_names() {
                let fields = config.field_map(Some(&name))?;
                let marker = if name == default { " (default)" } else { "" };
                println!("{name}{marker}");
                println!("  name:     {}", fields.name_fields.join(", "));
                println!("  id:       {}", fields.id_fields.join(", "));
                println!("  children: {}", fields.children_field);
                if let Some(parent) = &fields.parent_field {
                    println!("  parent:   {parent}");
                }
            }
        }

        Command::Browse {
            file,
            profile,
            max_depth,
            poll_interval,
            perms,
            form,
            role,
            log_file: _,
        } => {
            if paths::is_stdin(&file) {
                bail!("browse needs a snapshot file to watch, not stdin");
            }
            let fields = config.field_map(profile.as_deref())?;
            let permissions = match (perms, form) {
                (Some(perms), Some(form)) => {
                    let records = snapshot::read_snapshot(&perms)?;
                    Some(FormPermissions::resolve(role.as_deref(), &records, &form))
                }
                _ => None,
            };
            tui::run(
                &file,
                fields,
                config.max_depth(max_depth),
                permissions,
                poll_interval,
            )?;
        }
    }

    Ok(())
}
