//! Vine CLI

use vinec::commands::{create, run_file, run_repl};

fn main() {
    vinec::init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1) else {
        run_repl();
        return;
    };

    match command.as_str() {
        "run" => {
            let Some(path) = args.get(2) else {
                eprintln!("Usage: vine run <file.vine | project-dir>");
                std::process::exit(1);
            };
            run_file(path);
        }
        "repl" => run_repl(),
        "create" => {
            let Some(name) = args.get(2) else {
                eprintln!("Usage: vine create <name>");
                std::process::exit(1);
            };
            create(name);
        }
        "help" | "--help" | "-h" => print_usage(),
        "version" | "--version" | "-V" => {
            println!("vine {}", env!("CARGO_PKG_VERSION"));
        }
        path if !path.starts_with('-') => run_file(path),
        _ => {
            eprintln!("Unknown option: {command}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("Vine language");
    println!();
    println!("Usage: vine [command] [args]");
    println!();
    println!("Commands:");
    println!("  <path>           Run a script, or the main file of a project directory");
    println!("  run <path>       Same as above");
    println!("  repl             Start the interactive REPL (default without arguments)");
    println!("  create <name>    Scaffold a new project in ./<name>");
    println!("  help             Show this message");
    println!("  version          Show version information");
    println!();
    println!("Environment:");
    println!("  RUST_LOG         Enable tracing, e.g. RUST_LOG=vine_eval=debug");
    println!("  VINE_LOG_TREE    Render tracing spans as a tree");
}
