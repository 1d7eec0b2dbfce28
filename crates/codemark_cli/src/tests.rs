//! Unit tests for the `codemark` CLI entrypoint module.

use super::{file_key, parse_choice, run, Cli, Cmd, TerminalHost};
use clap::Parser;
use codemark_core::{Config, Host, NoticeLevel, PickItem, Position, Range, Workspace};
use serde_json::Value;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temp dir"),
        }
    }

    fn db(&self) -> String {
        self.dir
            .path()
            .join("state.redb")
            .to_string_lossy()
            .to_string()
    }

    fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).expect("write source");
        path
    }

    fn run(&self, args: &[&str], input: &str) -> (bool, String) {
        let db = self.db();
        let mut argv = vec!["codemark", "--db", db.as_str()];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).expect("parse args");
        let mut output = Vec::new();
        let ok = run(cli, Cursor::new(input.to_string()), &mut output).expect("run");
        (ok, String::from_utf8(output).expect("utf8 output"))
    }

    fn workspace(&self) -> Workspace {
        let config = Config {
            db_path: self.db(),
            ..Config::default()
        };
        Workspace::open(config).expect("open workspace")
    }
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("utf8 path")
}

#[test]
fn parses_ranges_and_positions() {
    let cli = Cli::try_parse_from(["codemark", "toggle", "src/lib.rs", "3:4-5:0", "--color", "#00FF0066"])
        .expect("parse");
    match cli.command {
        Cmd::Toggle { file, range, color } => {
            assert_eq!(file, PathBuf::from("src/lib.rs"));
            assert_eq!(range, Range::from_coords(3, 4, 5, 0));
            assert_eq!(color.as_deref(), Some("#00FF0066"));
        }
        other => panic!("unexpected command: {:?}", other),
    }

    let cli = Cli::try_parse_from(["codemark", "remove", "a.rs", "7:2"]).expect("parse");
    assert!(matches!(
        cli.command,
        Cmd::Remove { position, .. } if position == Position::new(7, 2)
    ));

    assert!(Cli::try_parse_from(["codemark", "remove", "a.rs", "seven"]).is_err());
    assert!(Cli::try_parse_from(["codemark", "clear", "a.rs", "--all"]).is_err());
    assert!(Cli::try_parse_from(["codemark", "import", "x.json", "--merge", "--replace"]).is_err());
}

#[test]
fn parse_choice_is_one_based_and_bounded() {
    assert_eq!(parse_choice("1", 3), Some(0));
    assert_eq!(parse_choice(" 3 ", 3), Some(2));
    assert_eq!(parse_choice("0", 3), None);
    assert_eq!(parse_choice("4", 3), None);
    assert_eq!(parse_choice("", 3), None);
}

#[test]
fn terminal_host_reads_answers_and_treats_eof_as_cancel() {
    let mut output = Vec::new();
    let mut host = TerminalHost::new(Cursor::new("first note\n2\n"), &mut output);
    let items = [PickItem::new("Current File"), PickItem::new("All Files")];

    assert_eq!(
        host.prompt_text("Edit comment", Some("old")).as_deref(),
        Some("first note")
    );
    assert_eq!(host.pick("Clear highlights from...", &items), Some(1));
    assert_eq!(host.prompt_text("Edit comment", None), None);
    host.notify(NoticeLevel::Error, "No active editor");
    assert_eq!(host.errors, 1);
    drop(host);

    let printed = String::from_utf8(output).expect("utf8");
    assert!(printed.contains("Edit comment [old]:"));
    assert!(printed.contains("  2) All Files"));
    assert!(printed.contains("error: No active editor"));
}

#[test]
fn preset_picks_skip_the_menu() {
    let mut output = Vec::new();
    let mut host = TerminalHost::new(Cursor::new(""), &mut output);
    host.picks.push_back(5);
    host.picks.push_back(0);
    let items = [PickItem::new("only")];

    assert_eq!(host.pick("choose", &items), None);
    assert_eq!(host.pick("choose", &items), Some(0));
    drop(host);
    assert!(output.is_empty());
}

#[test]
fn toggle_list_and_untoggle() {
    let sandbox = Sandbox::new();
    let source = sandbox.file("main.rs", "fn main() {\n    run();\n}\n");

    let (ok, out) = sandbox.run(&["toggle", path_arg(&source), "1:4-1:10"], "");
    assert!(ok);
    assert!(out.contains("Highlight added!"));

    let (_, out) = sandbox.run(&["--json", "list"], "");
    let listed: Value = serde_json::from_str(&out).expect("json list");
    assert_eq!(listed[0]["label"], "main.rs:2");
    assert_eq!(listed[0]["preview"], "run();");
    assert_eq!(listed[0]["comment"], "(no comment)");

    let (ok, out) = sandbox.run(&["toggle", path_arg(&source), "1:0-1:6"], "");
    assert!(ok);
    assert!(out.contains("Removed 1 highlight(s)"));
    assert!(sandbox.workspace().store().is_empty());
}

#[test]
fn add_reads_comment_and_color_from_input() {
    let sandbox = Sandbox::new();
    let source = sandbox.file("lib.rs", "pub fn answer() -> u32 {\n    42\n}\n");

    let (ok, _) = sandbox.run(&["add", path_arg(&source), "0:7-0:13"], "why 42?\n4\n");
    assert!(ok);

    let workspace = sandbox.workspace();
    let stored = &workspace.store().by_file(&file_key(&source))[0];
    assert_eq!(stored.text, "answer");
    assert_eq!(stored.comment.as_deref(), Some("why 42?"));
    assert_eq!(stored.color, "#00FFFF66");
}

#[test]
fn add_cancelled_on_eof_changes_nothing() {
    let sandbox = Sandbox::new();
    let source = sandbox.file("lib.rs", "pub fn answer() {}\n");

    let (ok, _) = sandbox.run(&["add", path_arg(&source), "0:7-0:13"], "");
    assert!(ok);
    assert!(sandbox.workspace().store().is_empty());
}

#[test]
fn edit_moves_highlights_below_the_change() {
    let sandbox = Sandbox::new();
    let source = sandbox.file("notes.txt", "one\ntwo\nthree\n");
    sandbox.run(&["add", path_arg(&source), "2:0-2:5", "--color", "#FFA50066"], "");

    let (ok, out) = sandbox.run(&["edit", path_arg(&source), "0:0-0:0", "zero\nhalf\n"], "");
    assert!(ok);
    assert!(out.contains("Moved 1 highlight(s)"));
    assert_eq!(
        std::fs::read_to_string(&source).expect("read"),
        "zero\nhalf\none\ntwo\nthree\n"
    );

    let workspace = sandbox.workspace();
    let stored = &workspace.store().by_file(&file_key(&source))[0];
    assert_eq!(stored.range, Range::from_coords(4, 0, 4, 5));
    assert_eq!(stored.text, "three");
}

#[test]
fn comment_remove_and_clear() {
    let sandbox = Sandbox::new();
    let source = sandbox.file("a.rs", "let a = 1;\nlet b = 2;\n");
    sandbox.run(&["add", path_arg(&source), "0:0-0:10", "-c", "#FFFF0066"], "");
    sandbox.run(&["add", path_arg(&source), "1:0-1:10", "-c", "#FFFF0066"], "");

    let (_, out) = sandbox.run(&["comment", path_arg(&source), "0:2", "--text", "first"], "");
    assert!(out.contains("Comment updated"));

    let (ok, out) = sandbox.run(&["remove", path_arg(&source), "1:3"], "");
    assert!(ok);
    assert!(out.contains("Highlight removed"));

    let workspace = sandbox.workspace();
    let remaining = workspace.store().by_file(&file_key(&source));
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].comment.as_deref(), Some("first"));
    drop(workspace);

    let (ok, out) = sandbox.run(&["clear", "--all"], "");
    assert!(ok);
    assert!(out.contains("All highlights cleared"));
    assert!(sandbox.workspace().store().is_empty());
}

#[test]
fn export_then_import_into_fresh_state() {
    let sandbox = Sandbox::new();
    let source = sandbox.file("a.rs", "alpha\nbeta\n");
    sandbox.run(&["add", path_arg(&source), "0:0-0:5", "-c", "#00FF0066"], "");
    let export = sandbox.dir.path().join("out.json");

    let (ok, out) = sandbox.run(&["export", path_arg(&export)], "");
    assert!(ok);
    assert!(out.contains("Exported 1 highlights"));

    let target = Sandbox::new();
    let (ok, out) = target.run(&["import", path_arg(&export), "--replace"], "");
    assert!(ok);
    assert!(out.contains("Imported 1 highlights"));
    assert_eq!(
        target.workspace().store().as_map(),
        sandbox.workspace().store().as_map()
    );
}

#[test]
fn malformed_import_reports_error() {
    let sandbox = Sandbox::new();
    let bad = sandbox.file("bad.json", "{\"highlights\": 3}");

    let (ok, out) = sandbox.run(&["import", path_arg(&bad), "--merge"], "");
    assert!(!ok);
    assert!(out.contains("error: Invalid highlights file format"));
}

#[test]
fn jump_prints_location() {
    let sandbox = Sandbox::new();
    let source = sandbox.file("a.rs", "alpha\nbeta\n");
    sandbox.run(&["add", path_arg(&source), "1:1-1:3", "-c", "#00FF0066"], "");
    let id = sandbox.workspace().store().by_file(&file_key(&source))[0].id.clone();

    let (ok, out) = sandbox.run(&["jump", path_arg(&source), id.as_str()], "");
    assert!(ok);
    assert!(out.contains(&format!("{}:2:2", file_key(&source))));
}

#[test]
fn files_groups_by_file() {
    let sandbox = Sandbox::new();
    let a = sandbox.file("a.rs", "alpha\n");
    let b = sandbox.file("b.rs", "beta\n");
    sandbox.run(&["add", path_arg(&a), "0:0-0:5", "-c", "#FF00FF66"], "");
    sandbox.run(&["add", path_arg(&b), "0:0-0:4", "-c", "#FF00FF66"], "");

    let (_, out) = sandbox.run(&["--json", "files"], "");
    let files: Value = serde_json::from_str(&out).expect("json files");
    assert_eq!(files[0]["label"], "a.rs (1)");
    assert_eq!(files[1]["label"], "b.rs (1)");
    assert_eq!(files[1]["highlights"][0]["color"], "Pink");
}
