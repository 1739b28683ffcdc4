// End-to-end tests of the obsidian binary

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn obsidian(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_obsidian"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run obsidian")
}

/// Write `source` to a per-test file under the system temp directory.
fn source_file(name: &str, source: &str) -> PathBuf {
    let file = format!("obsidian-cli-{}-{}.ob", std::process::id(), name);
    let path = std::env::temp_dir().join(file);
    fs::write(&path, source).expect("failed to write test source");
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn unterminated_string_is_fatal() {
    let path = source_file("unterminated", "\"abc");
    let output = obsidian(&[path.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains(":1:1: Lexical Error: Unterminated string literal"), "{}", err);
    assert!(err.contains("    1 | \"abc\n      | ^\n"), "{}", err);
    assert!(err.contains("obsidian: parsing failed"));
}

#[test]
fn prints_syntax_tree() {
    let path = source_file("tree", "i64 x = 3;\nprintln(x);\n");
    let output = obsidian(&[path.to_str().unwrap()]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "Block\n  VarDecl: i64 x = IntLiteral: 3\n  Println\n    Identifier: x\n"
    );
}

#[test]
fn check_mode_is_silent() {
    let path = source_file("check", "fn main() { return; }");
    let output = obsidian(&["--check", path.to_str().unwrap()]);

    assert!(output.status.success());
    assert!(stdout(&output).is_empty());
}

#[test]
fn syntax_error_exits_non_zero() {
    let path = source_file("syntax", "x = 1");
    let output = obsidian(&[path.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Syntax Error: Expected ';' after expression"));
}

#[test]
fn deep_nesting_is_reported_not_fatal() {
    let depth = 20_000;
    let source = format!("x = {}1{};", "(".repeat(depth), ")".repeat(depth));
    let path = source_file("deep", &source);
    let output = obsidian(&["--check", path.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("Syntax Error: Expression nested too deeply"), "{}", err);
    assert!(err.ends_with("obsidian: parsing failed\n"), "{}", err);
}

#[test]
fn pretty_errors_count_columns_in_characters() {
    let path = source_file("pretty", "string s = \"éééé\";\nx = 1 $;");
    let output = obsidian(&["--error-format", "pretty", path.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains(":2:7"), "{}", err);
    assert!(err.contains("Unexpected character '$'"), "{}", err);
}

#[test]
fn dumps_tokens() {
    let path = source_file("tokens", "if (a <= 2)");
    let output = obsidian(&["--dump-tokens", path.to_str().unwrap()]);

    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "1:1 If 'if'\n\
         1:4 LeftParen '('\n\
         1:5 Identifier 'a'\n\
         1:7 LessEqual '<='\n\
         1:10 IntLiteral '2'\n\
         1:11 RightParen ')'\n"
    );
}

#[test]
fn token_dump_reports_lexical_errors() {
    let path = source_file("bad-token", "a $ b");
    let output = obsidian(&["--dump-tokens", path.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output).lines().count(), 3);
    assert!(stderr(&output).contains("Unexpected character '$'"));
}

#[test]
fn prints_version() {
    let output = obsidian(&["--version"]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("obsidian version 0.1.0 ("));
}

#[test]
fn prints_help_topics() {
    let output = obsidian(&["--help"]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("Usage: obsidian [options] file..."));

    let output = obsidian(&["--help=optimizers"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("-O<number>"));

    let output = obsidian(&["--help=warnings"]);
    assert!(output.status.success());
}

#[test]
fn rejects_unknown_help_topic() {
    let output = obsidian(&["--help=colors"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stderr(&output),
        "obsidian: error: unrecognized argument to '--help=' option: 'colors'\n"
    );
}

#[test]
fn requires_an_input_file() {
    let output = obsidian(&[]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stderr(&output), "obsidian: error: no input file\n");
}

#[test]
fn reports_unreadable_file() {
    let output = obsidian(&["/nonexistent/obsidian/input.ob"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output)
        .starts_with("obsidian: error: cannot read '/nonexistent/obsidian/input.ob'"));
}
