//! Running project directories and multi-file programs from disk.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use vine_eval::{buffer_handler, Value};
use vinec::commands::{execute_path, RunError};
use vinec::project::{create_project, ProjectError, PROJECT_FILE};

fn run(path: &Path) -> (Result<Value, RunError>, String) {
    let printer = buffer_handler();
    let result = execute_path(path, Arc::clone(&printer));
    (result, printer.output())
}

fn write(path: &Path, text: &str) {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).unwrap();
    }
    fs::write(path, text).unwrap();
}

#[test]
fn scaffolded_project_runs() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = create_project(tmp.path(), "hello").unwrap();

    let (result, out) = run(&dir);
    assert!(result.is_ok());
    assert_eq!(out, "Hello, World!\n");
}

#[test]
fn project_main_entry() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("app");
    write(&dir.join(PROJECT_FILE), "name: app\nmain: boot.vine\n");
    write(&dir.join("boot.vine"), "print(\"booted\")\n");

    let (result, out) = run(&dir);
    assert!(result.is_ok());
    assert_eq!(out, "booted\n");
}

#[test]
fn imports_from_root_and_relative() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("app");
    write(&dir.join(PROJECT_FILE), "name: app\n");
    write(
        &dir.join("shared/config.vine"),
        "expose cst greeting = \"hi\"\n",
    );
    write(
        &dir.join("src/util/text.vine"),
        "use \"@/shared/config\" pick greeting\nexpose fn shout(who): greeting + \" \" + who + \"!\" end\n",
    );
    write(
        &dir.join("src/main.vine"),
        "use \"util/text\" as text\nprint(text.shout(\"vine\"))\n",
    );

    let (result, out) = run(&dir);
    assert!(result.is_ok(), "{:?}", result.err());
    assert_eq!(out, "hi vine!\n");
}

#[test]
fn import_outside_root_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("app");
    write(&dir.join(PROJECT_FILE), "name: app\n");
    write(&tmp.path().join("secret.vine"), "expose cst key = 1\n");
    write(&dir.join("src/main.vine"), "use \"../../secret\" as s\n");

    let (result, _) = run(&dir);
    let Err(RunError::Program { diagnostic, .. }) = result else {
        panic!("expected a program error");
    };
    assert!(diagnostic.message.contains("outside the workspace"), "{diagnostic}");
}

#[test]
fn error_reports_entry_source() {
    let tmp = tempfile::tempdir().unwrap();
    let script = tmp.path().join("bad.vine");
    write(&script, "let a = 1\nlet a = 2\n");

    let (result, _) = run(&script);
    let Err(RunError::Program {
        diagnostic, text, ..
    }) = result
    else {
        panic!("expected a program error");
    };
    assert_eq!(text, "let a = 1\nlet a = 2\n");
    let location = diagnostic.location.unwrap();
    assert_eq!((location.line, location.column), (2, 1));
}

#[test]
fn syntax_error_is_a_program_error() {
    let tmp = tempfile::tempdir().unwrap();
    let script = tmp.path().join("broken.vine");
    write(&script, "if true:\n  print(1)\n");

    let (result, out) = run(&script);
    assert!(matches!(result, Err(RunError::Program { .. })));
    assert_eq!(out, "");
}

#[test]
fn missing_script() {
    let tmp = tempfile::tempdir().unwrap();
    let (result, _) = run(&tmp.path().join("nope.vine"));
    assert!(matches!(
        result,
        Err(RunError::Project(ProjectError::NotFound { .. }))
    ));
}

#[test]
fn directory_without_project_file() {
    let tmp = tempfile::tempdir().unwrap();
    let (result, _) = run(tmp.path());
    assert!(matches!(
        result,
        Err(RunError::Project(ProjectError::MissingConfig { .. }))
    ));
}
