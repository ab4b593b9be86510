pub mod command;
pub mod logger;
pub mod parse;

use crate::shell::{command::execute_command, parse::parse_command};
use colored::*;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use pfs::fs::VolumeSet;
use reedline::{
    DefaultCompleter, DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal,
};
use std::{io::stdout, path::PathBuf};

pub struct ShellConfig {
    pub base_path: PathBuf,   // 卷文件所在目录
    pub open: Option<String>, // 启动时打开的卷集合
}

/// shell 持有的全部状态：当前打开的卷集合由这里显式保存
pub struct ShellState {
    pub base_path: PathBuf,
    pub current: Option<VolumeSet>,
}

const COMMANDS: [&str; 10] = [
    "help", "open", "put", "get", "rm", "dir", "putr", "df", "kill", "exit",
];

pub fn start_shell(config: ShellConfig) {
    print_banner();

    let username = whoami::username();
    let hostname = whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_string());

    let mut state = ShellState {
        base_path: config.base_path,
        current: None,
    };

    if let Some(name) = config.open {
        if let Err(e) = execute_command(&command::Command::Open(name), &mut state) {
            println!("{} {}", "❌ Error:".red().bold(), e);
        }
    }

    println!(
        "{}",
        "Type 'help' for available commands. Use ↑↓ for history, Tab for auto-completion.\n"
            .bright_black()
    );

    let history_path = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".pfs_history");

    let mut line_editor = Reedline::create();
    match FileBackedHistory::with_file(100, history_path) {
        Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
        Err(e) => println!("{} {}", "⚠️  History disabled:".yellow(), e),
    }

    let completer =
        DefaultCompleter::new_with_wordlen(COMMANDS.iter().map(|c| c.to_string()).collect(), 2);
    line_editor = line_editor.with_completer(Box::new(completer));

    loop {
        let set_name = state
            .current
            .as_ref()
            .map(|set| set.base_name().to_string())
            .unwrap_or_else(|| "-".to_string());
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic(format!("{}@{}:{}", username, hostname, set_name)),
            DefaultPromptSegment::Basic("PFS".to_string()),
        );

        match line_editor.read_line(&prompt) {
            Ok(Signal::Success(buffer)) => {
                let trimmed = buffer.trim();
                if trimmed.is_empty() {
                    continue;
                }

                match parse_command(trimmed) {
                    Some(cmd) => {
                        if let Err(e) = execute_command(&cmd, &mut state) {
                            println!("{} {}", "❌ Error:".red().bold(), e);
                        }
                        if matches!(cmd, command::Command::Exit) {
                            break;
                        }
                    }
                    None => println!(
                        "{}",
                        "⚠️  Unknown command or missing argument. Type 'help' for command list."
                            .yellow()
                    ),
                }
            }
            Ok(Signal::CtrlC) => {
                println!();
                continue;
            }
            Ok(Signal::CtrlD) => {
                println!("{}", "Exiting PFS...".yellow());
                break;
            }
            #[allow(unreachable_patterns)]
            Ok(_) => continue,
            Err(e) => {
                println!("Error reading line: {}", e);
                break;
            }
        }
    }

    println!("{}", "GoodBye!".bright_yellow());
}

fn print_banner() {
    let mut stdout = stdout();
    let _ = execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print(format!("PFS volume shell v{}\n", env!("CARGO_PKG_VERSION"))),
        ResetColor
    );
}
