use clap::Parser;
use std::path::PathBuf;

use crate::shell::{start_shell, ShellConfig};

mod shell;

#[derive(Parser, Debug)]
#[command(name = "pfs", version, about = "Interactive shell over block-based volume files")]
struct Args {
    /// Directory holding the volume files
    #[arg(short, long, default_value_os_t = std::env::temp_dir())]
    base_path: PathBuf,

    /// Volume set to open at start-up
    #[arg(short, long)]
    open: Option<String>,

    /// Print debug logging from the storage engine
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    shell::logger::init(args.verbose);

    start_shell(ShellConfig {
        base_path: args.base_path,
        open: args.open,
    });
}
