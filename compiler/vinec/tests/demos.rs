//! Runs every script under `demos/` and compares what it prints, followed
//! by the first error if the script fails, against the sibling `.out` file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use vine_eval::buffer_handler;
use vinec::commands::{execute_path, RunError};

fn demos_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos")
}

fn run_demo(script: &Path) -> String {
    let printer = buffer_handler();
    let result = execute_path(script, Arc::clone(&printer));
    let mut out = printer.output();
    match result {
        Ok(_) => {}
        Err(RunError::Program { diagnostic, .. }) => {
            out.push_str(&diagnostic.to_string());
            out.push('\n');
        }
        Err(err) => panic!("{}: {err}", script.display()),
    }
    out
}

fn demo_scripts() -> Vec<PathBuf> {
    let mut scripts: Vec<PathBuf> = fs::read_dir(demos_dir())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "vine"))
        .collect();
    scripts.sort();
    scripts
}

#[test]
fn demos_match_golden_output() {
    let scripts = demo_scripts();
    assert!(!scripts.is_empty(), "no demos found");

    for script in scripts {
        let golden = script.with_extension("out");
        let expected = fs::read_to_string(&golden)
            .unwrap_or_else(|err| panic!("{}: {err}", golden.display()));
        assert_eq!(run_demo(&script), expected, "{}", script.display());
    }
}

#[test]
fn every_demo_has_golden_output() {
    for script in demo_scripts() {
        assert!(
            script.with_extension("out").is_file(),
            "{} has no .out file",
            script.display()
        );
    }
}
