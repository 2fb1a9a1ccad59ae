use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

const MATH_H: &str = "\
/* adds two numbers. returns: the sum. */
int add(int a /* first term */, int b /* second term */);

/* subtracts b from a. */
int sub(int a, int b);
";

fn c2man() -> Command {
    Command::new(env!("CARGO_BIN_EXE_c2man"))
}

fn write_source(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("failed to write source");
    path
}

fn run(args: &[&str], file: &Path) -> Output {
    c2man()
        .args(args)
        .arg(file)
        .output()
        .expect("failed to run c2man")
}

fn run_stdin(args: &[&str], input: &str) -> Output {
    let mut child = c2man()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run c2man");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn pages_written_to_stdout() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "math.h", MATH_H);

    let output = run(&["-o", "-"], &file);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let text = stdout(&output);
    let pages: Vec<_> = text.split('\x0c').collect();
    assert_eq!(pages.len(), 2);
    assert!(pages[0].contains(".TH \"add\" 3"));
    assert!(pages[0].contains("add \\- adds two numbers."));
    assert!(pages[0].contains(".SH \"RETURNS\"\nThe sum.\n"));
    assert!(pages[0].contains("sub(3)"));
    assert!(pages[1].contains(".TH \"sub\" 3"));
}

#[test]
fn pages_written_to_output_directory() {
    let dir = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let file = write_source(&dir, "math.h", MATH_H);

    let output = run(&["-o", out.path().to_str().unwrap(), "-T", "h"], &file);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("generating: "));

    let add = fs::read_to_string(out.path().join("add.html")).unwrap();
    assert!(add.contains("<h1>SYNOPSIS</h1>"));
    assert!(add.contains("<a href=\"sub.html\">sub</a>"));
    assert!(out.path().join("sub.html").exists());
}

#[test]
fn grouped_pages_named_after_input_file() {
    let dir = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let file = write_source(&dir, "math.h", MATH_H);

    let output = run(
        &["-o", out.path().to_str().unwrap(), "-G", "arithmetic", "-n", "-l", "f"],
        &file,
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("linking: "));

    let page = fs::read_to_string(out.path().join("math.3")).unwrap();
    assert!(page.contains("add,\nsub \\- arithmetic\n"));
    let stub = fs::read_to_string(out.path().join("sub.3")).unwrap();
    assert!(stub.contains(".so "));
}

#[test]
fn source_read_from_stdin() {
    let output = run_stdin(&["-o", "-", "-T", "l"], MATH_H);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with("\\documentclass{article}"));
    assert!(text.contains("\\section*{NAME}"));
}

#[test]
fn input_name_requires_input_file() {
    let output = run_stdin(&["-n", "-g"], MATH_H);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("cannot name output after input file"));
}

#[test]
fn semantic_errors_prevent_output() {
    let dir = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let file = write_source(&dir, "k.c", "/* x */\nint f(a)\nint b;\n{ }\n");

    let output = run(&["-o", out.path().to_str().unwrap()], &file);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("k.c:3: declared argument \"b\" is missing"), "stderr: {err}");
    assert!(err.contains("error: 1 error found"));
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn unknown_driver_option_rejected() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "math.h", MATH_H);

    let output = run(&["-o", "-", "-T", "n,x"], &file);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("nroff output takes no option 'x'"));

    let output = run(&["-o", "-", "-T", "t,z"], &file);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("s<n>"));

    let output = run(&["-o", "-", "-T", "q"], &file);
    assert!(!output.status.success());
}

#[test]
fn dump_ir_prints_json() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "math.h", MATH_H);

    let output = run(&["--dump-ir"], &file);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let ir: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let pages = ir["pages"].as_array().unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0]["declarator"]["name"], "add");
}

#[test]
fn config_file_sets_defaults() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "math.h", MATH_H);
    let config = write_source(
        &dir,
        "c2man.yaml",
        "format: texinfo\nexcluded_sections:\n  - SEE ALSO\noutput_dir: \"-\"\n",
    );

    let output = run(&["--config", config.to_str().unwrap()], &file);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("@node add"));
    assert!(!text.contains("SEE ALSO"));

    let output = run(&["--config", config.to_str().unwrap(), "-T", "a"], &file);
    assert!(stdout(&output).contains("    FUNCTION\n"));
}
