use std::path::Path;

use anyhow::{Context, Result};
use apkshell::Apk;
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::commands;

const PROMPT: &str = "apkshell> ";

pub(crate) fn clear_screen() {
    use std::io::Write;

    print!("\x1b[2J\x1b[1;1H");
    let _ = std::io::stdout().flush();
}

pub(crate) fn run(path: &Path) -> Result<()> {
    clear_screen();
    print!("{}", "a p k s h e l l ".bright_red());
    println!(
        "{}",
        "- interactive reverse engineering shell for Android applications".bright_cyan()
    );
    println!();

    let apk =
        Apk::new(path).with_context(|| format!("got error while parsing apk: {:?}", path))?;

    let mut editor = DefaultEditor::new()?;

    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };

        let line = line.trim().to_owned();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(&line);

        let (verb, arg) = match line.split_once(' ') {
            Some((verb, arg)) => (verb, arg.trim()),
            None => (line.as_str(), ""),
        };

        match (verb, arg) {
            ("exit" | "quit", _) => break,
            ("help" | "?", _) => commands::help(),

            ("manifest", _) => commands::manifest(&apk),
            ("is_debuggable", _) => commands::is_debuggable(&apk),
            ("entry_points" | "ep", _) => commands::entry_points(&apk, false),
            ("entry_points_extended" | "epe", _) => commands::entry_points(&apk, true),
            ("permissions" | "perms", _) => commands::permissions(&apk),
            ("activities", _) => commands::activities(&apk),
            ("services", _) => commands::services(&apk),
            ("receivers", _) => commands::receivers(&apk),

            ("classes", _) => commands::classes(&apk),
            ("class_info" | "class", arg) if !arg.is_empty() => commands::class_info(&apk, arg),
            ("class_info" | "class", _) => {
                println!("{}", "Invalid class path".bright_red());
            }
            ("find_class", arg) if !arg.is_empty() => commands::find_class(&apk, arg),

            ("methods" | "funcs", _) => commands::methods(&apk),
            ("find_method" | "find_func", arg) if !arg.is_empty() => {
                commands::find_method(&apk, arg)
            }
            ("disassemble" | "dis", arg) if !arg.is_empty() => commands::disassemble(&apk, arg),
            ("disassemble" | "dis", _) => {
                println!("{}", "Invalid method path".bright_red());
            }

            ("certificate", _) => commands::certificate(&apk),
            ("creation_date", _) => commands::creation_date(&apk),
            ("revoke_date", _) => commands::revoke_date(&apk),

            ("libs", _) => commands::libs(&apk),
            ("dump_libs", _) => commands::dump_libs(&apk, None),
            ("dump_lib", arg) if !arg.is_empty() => commands::dump_libs(&apk, Some(arg)),
            ("libs_hash" | "libh", _) => commands::libs_hash(&apk),

            ("strings" | "strs", _) => commands::strings(&apk),
            ("interesting_strings", _) => commands::interesting_strings(&apk),
            ("string" | "str", arg) if !arg.is_empty() => commands::search_string(&apk, arg),

            ("language" | "lang", _) => commands::language(&apk),

            ("cls" | "clr" | "clear", _) => clear_screen(),

            _ => {
                println!("{}", format!("Invalid command: {}", line).red());
                commands::help();
            }
        }
    }

    println!("{}", "----------- EOF -----------".bright_green());
    Ok(())
}
