//! The `create` command: scaffold a new project.

use std::path::Path;

use crate::project::{create_project, PROJECT_FILE};

/// Create project `name` in the current directory.
pub fn create(name: &str) {
    match create_project(Path::new("."), name) {
        Ok(dir) => {
            println!("Created project {name}");
            println!("  {}", dir.join(PROJECT_FILE).display());
            println!("  {}", dir.join("src").join("main.vine").display());
            println!();
            println!("Run it with: vine {name}");
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
