use colored::*;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use pfs::{
    fs::{VolumeError, VolumeSet},
    utils::format_timestamp,
};
use std::{error::Error, path::Path};

use crate::shell::ShellState;

#[derive(Debug)]
pub enum Command {
    Help,
    Open(String),
    Put(String),
    Get(String),
    Rm(String),
    Dir,
    Putr(String, String),
    Df,
    Kill,
    Exit,
}

pub fn execute_command(cmd: &Command, state: &mut ShellState) -> Result<(), Box<dyn Error>> {
    match cmd {
        Command::Help => print_help(),
        Command::Open(name) => {
            let set = VolumeSet::open_or_create_set(&state.base_path, name)?;
            println!(
                "📂 Opened {} ({} volume(s) in {})",
                name.cyan(),
                set.volumes().len(),
                state.base_path.display()
            );
            state.current = Some(set);
        }
        Command::Put(arg) => {
            let (dir, file_name) = split_source(arg)?;
            let set = current_set(state)?;
            match set.put(dir, file_name)? {
                Some(created) => println!(
                    "📝 Stored {} in new volume {}",
                    file_name.green(),
                    created.name.yellow()
                ),
                None => println!("📝 Stored {}", file_name.green()),
            }
        }
        Command::Get(name) => {
            let set = current_set(state)?;
            let bytes = set
                .get(name)
                .ok_or_else(|| VolumeError::NotFound(name.clone()))?;
            std::fs::write(name, &bytes)?;
            println!(
                "📖 Wrote {} ({} bytes) to the working directory",
                name.cyan(),
                bytes.len()
            );
        }
        Command::Rm(name) => {
            current_set(state)?.remove(name)?;
            println!("❌ Deleted {}", name.red());
        }
        Command::Dir => {
            let set = current_set(state)?;
            let mut rows: Vec<_> = set.list_all().collect();
            rows.sort_by(|a, b| a.name.cmp(b.name));
            if rows.is_empty() {
                println!("{}", "(no files)".bright_black());
            }
            for row in rows {
                let cb = row.control_block;
                println!(
                    "📄  {:<20} {:>6} bytes  {}  {:<24} {}",
                    row.name,
                    cb.size,
                    format_timestamp(cb.created_at),
                    cb.remarks,
                    format!("[{}]", row.volume).bright_black()
                );
            }
        }
        Command::Putr(name, remarks) => {
            current_set(state)?.set_remarks(name, remarks)?;
            println!("✏️  Updated remarks of {}", name.cyan());
        }
        Command::Df => {
            let set = current_set(state)?;
            let style = ProgressStyle::with_template(
                "{msg:<16} [{bar:40.green/black}] {pos:>2}/{len} blocks",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

            for usage in set.usage() {
                let pb = ProgressBar::new(usage.total_blocks as u64);
                pb.set_style(style.clone());
                pb.set_message(usage.name);
                pb.set_position(usage.used_blocks as u64);
                pb.abandon();
            }
        }
        Command::Kill => {
            let set = current_set(state)?;
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Delete all {} volume(s) of '{}'?",
                    set.volumes().len(),
                    set.base_name()
                ))
                .default(false)
                .interact()?;
            if confirmed {
                if let Some(set) = state.current.take() {
                    let name = set.base_name().to_string();
                    set.destroy()?;
                    println!("🗑️ Destroyed {}", name.red());
                }
            }
        }
        Command::Exit => println!("{}", "👋 Exiting PFS shell...".yellow().bold()),
    }

    Ok(())
}

fn current_set(state: &mut ShellState) -> Result<&mut VolumeSet, Box<dyn Error>> {
    state
        .current
        .as_mut()
        .ok_or_else(|| "no volume set is open, use 'open <name>' first".into())
}

/// `dir/name` -> (dir, name)；没有目录部分时使用当前目录
fn split_source(arg: &str) -> Result<(&Path, &str), Box<dyn Error>> {
    let path = Path::new(arg);
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| format!("'{}' does not name a file", arg))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok((dir, file_name))
}

fn print_help() {
    println!("{}", "📘 PFS Commands".bright_cyan().bold());
    println!(
        "{}",
        "
  open <name>             Open (or create) a volume set
  put <path>              Store a host file (at most 10240 bytes)
  get <name>              Copy a stored file into the working directory
  rm <name>               Remove a stored file
  dir                     List stored files
  putr <name> <remarks>   Set the remarks of a stored file
  df                      Show block usage per volume
  kill                    Delete every volume of the open set
  help                    Show this help message
  exit                    Quit the shell
"
        .bright_black()
    );
}
