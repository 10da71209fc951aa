use std::path::PathBuf;

use clap::Parser;

mod commands;
mod repl;

#[derive(Parser)]
#[command(version, about, arg_required_else_help(true))]
struct Cli {
    /// Path to the apk file to analyze
    apk: PathBuf,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(err) = repl::run(&cli.apk) {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}
