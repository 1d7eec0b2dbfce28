//! Command-line front end for codemark workspaces.

use anyhow::Context;
use clap::{Parser, Subcommand};
use codemark_core::commands::PickItem;
use codemark_core::reconcile::DocumentText;
use codemark_core::{
    query, Command, Commands, Config, EditorContext, HighlightRef, Host, NoticeLevel, Position,
    Range, TextBuffer, TextEdit, Workspace,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "codemark", about = "Persistent code highlights", version)]
struct Cli {
    /// State database path (can also be set via CODEMARK_DB_PATH)
    #[arg(long, env = "CODEMARK_DB_PATH")]
    db: Option<String>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Highlight a range, or remove highlights it overlaps
    Toggle {
        file: PathBuf,
        range: Range,
        #[arg(short, long)]
        color: Option<String>,
    },
    /// Highlight a range, prompting for comment and color
    Add {
        file: PathBuf,
        range: Range,
        /// Skip the prompts and use this color
        #[arg(short, long)]
        color: Option<String>,
    },
    /// Remove the highlight containing a position
    Remove { file: PathBuf, position: Position },
    /// Clear highlights of one file, or of every file
    Clear {
        file: Option<PathBuf>,
        #[arg(long, conflicts_with = "file")]
        all: bool,
    },
    /// List highlights, most recent first
    List {
        /// Choose one and print its location
        #[arg(long)]
        pick: bool,
    },
    /// Show highlighted files and their highlights
    Files,
    /// Edit the comment of the highlight at a position
    Comment {
        file: PathBuf,
        position: Position,
        /// New comment; prompts when omitted
        #[arg(short, long)]
        text: Option<String>,
    },
    /// Write every highlight to a JSON document
    Export { path: Option<PathBuf> },
    /// Load highlights from a JSON document
    Import {
        path: PathBuf,
        /// Drop existing highlights first
        #[arg(long, conflicts_with = "merge")]
        replace: bool,
        #[arg(long)]
        merge: bool,
    },
    /// Print the location of a highlight
    Jump { file: PathBuf, id: String },
    /// Replace a range of a file and move highlights to follow
    Edit {
        file: PathBuf,
        range: Range,
        text: String,
    },
}

/// Host backed by a line-oriented terminal.
///
/// Answers given on the command line are consumed before reading input.
struct TerminalHost<R, W> {
    editor: Option<EditorContext>,
    input: R,
    output: W,
    texts: VecDeque<String>,
    picks: VecDeque<usize>,
    save_path: Option<PathBuf>,
    open_path: Option<PathBuf>,
    errors: usize,
}

impl<R: BufRead, W: Write> TerminalHost<R, W> {
    fn new(input: R, output: W) -> Self {
        Self {
            editor: None,
            input,
            output,
            texts: VecDeque::new(),
            picks: VecDeque::new(),
            save_path: None,
            open_path: None,
            errors: 0,
        }
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(err) => {
                tracing::warn!("Failed to read answer: {}", err);
                None
            }
        }
    }

    fn say(&mut self, line: &str) {
        if let Err(err) = writeln!(self.output, "{}", line) {
            tracing::warn!("Failed to write output: {}", err);
        }
    }
}

impl<R: BufRead, W: Write> Host for TerminalHost<R, W> {
    fn active_editor(&self) -> Option<EditorContext> {
        self.editor.clone()
    }

    fn prompt_text(&mut self, prompt: &str, initial: Option<&str>) -> Option<String> {
        if let Some(answer) = self.texts.pop_front() {
            return Some(answer);
        }
        match initial {
            Some(initial) => self.say(&format!("{} [{}]:", prompt, initial)),
            None => self.say(&format!("{}:", prompt)),
        }
        self.read_line()
    }

    fn pick(&mut self, placeholder: &str, items: &[PickItem]) -> Option<usize> {
        if let Some(index) = self.picks.pop_front() {
            return (index < items.len()).then_some(index);
        }
        self.say(placeholder);
        for (index, item) in items.iter().enumerate() {
            let mut line = format!("  {}) {}", index + 1, item.label);
            if let Some(description) = &item.description {
                line.push_str("  ");
                line.push_str(description);
            }
            self.say(&line);
            if let Some(detail) = &item.detail {
                self.say(&format!("       {}", detail));
            }
        }
        let answer = self.read_line()?;
        parse_choice(&answer, items.len())
    }

    fn save_location(&mut self, default_name: &str) -> Option<PathBuf> {
        Some(
            self.save_path
                .take()
                .unwrap_or_else(|| PathBuf::from(default_name)),
        )
    }

    fn open_location(&mut self) -> Option<PathBuf> {
        self.open_path.take()
    }

    fn notify(&mut self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => self.say(message),
            NoticeLevel::Warning => self.say(&format!("warning: {}", message)),
            NoticeLevel::Error => {
                self.errors += 1;
                self.say(&format!("error: {}", message));
            }
        }
    }

    fn reveal(&mut self, file_path: &str, range: Range) {
        self.say(&format!(
            "{}:{}:{}  ({})",
            file_path,
            range.start.line + 1,
            range.start.character + 1,
            range
        ));
    }
}

/// 1-based menu choice to an index.
fn parse_choice(answer: &str, len: usize) -> Option<usize> {
    let choice: usize = answer.trim().parse().ok()?;
    (1..=len).contains(&choice).then(|| choice - 1)
}

/// Stable identity for a file: canonical when it exists, as given otherwise.
fn file_key(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .to_string()
}

fn load_buffer(path: &Path) -> anyhow::Result<TextBuffer> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(TextBuffer::new(&text))
}

fn editor_for(path: &Path, selection: Range) -> anyhow::Result<EditorContext> {
    let buffer = load_buffer(path)?;
    Ok(EditorContext::new(
        file_key(path),
        selection,
        buffer.text_in(&selection),
    ))
}

fn cursor_at(path: &Path, position: Position) -> EditorContext {
    EditorContext::new(file_key(path), Range::empty(position), "")
}

fn list_output(workspace: &Workspace, json: bool) -> anyhow::Result<String> {
    let entries = query::list_entries(workspace.store());
    if json {
        let values: Vec<Value> = entries
            .iter()
            .map(|entry| {
                json!({
                    "label": entry.label,
                    "preview": entry.description,
                    "comment": entry.detail,
                    "filePath": entry.file_path,
                    "id": entry.id,
                })
            })
            .collect();
        return Ok(serde_json::to_string_pretty(&values)?);
    }
    let rows: Vec<String> = entries
        .iter()
        .map(|entry| {
            format!(
                "{:<24} {}\n    {}  [{}]",
                entry.label, entry.description, entry.detail, entry.id
            )
        })
        .collect();
    Ok(rows.join("\n"))
}

fn files_output(workspace: &Workspace, json: bool) -> anyhow::Result<String> {
    let summaries = query::file_summaries(workspace.store());
    if json {
        let values: Vec<Value> = summaries
            .iter()
            .map(|summary| {
                let items: Vec<Value> = query::tree_items(workspace.store(), &summary.file_path)
                    .into_iter()
                    .map(|item| {
                        json!({
                            "id": item.id,
                            "label": item.label,
                            "color": item.description,
                            "hasComment": item.has_comment,
                            "tooltip": item.tooltip,
                        })
                    })
                    .collect();
                json!({
                    "filePath": summary.file_path,
                    "label": summary.label(),
                    "highlights": items,
                })
            })
            .collect();
        return Ok(serde_json::to_string_pretty(&values)?);
    }
    let mut lines = Vec::new();
    for summary in &summaries {
        lines.push(format!("{}  {}", summary.label(), summary.file_path));
        for item in query::tree_items(workspace.store(), &summary.file_path) {
            let marker = if item.has_comment { "*" } else { " " };
            lines.push(format!("  {} {:<8} {}", marker, item.description, item.label));
        }
    }
    Ok(lines.join("\n"))
}

/// Replace `range` in `path` and reconcile stored highlights with the edit.
fn edit_file(
    workspace: &mut Workspace,
    path: &Path,
    range: Range,
    text: String,
) -> anyhow::Result<String> {
    let mut buffer = load_buffer(path)?;
    let edit = TextEdit::new(range, text);
    if !buffer.apply(&edit) {
        return Ok("No change".to_string());
    }
    std::fs::write(path, buffer.to_string())
        .with_context(|| format!("failed to write {}", path.display()))?;
    let outcome = workspace.apply_edits(&file_key(path), &[edit], &buffer)?;
    Ok(format!(
        "Moved {} highlight(s), refreshed {}",
        outcome.shifted, outcome.refreshed
    ))
}

/// Execute one invocation.
///
/// # Returns
/// `true` when the command finished without reporting an error.
fn run<R: BufRead, W: Write>(cli: Cli, input: R, mut output: W) -> anyhow::Result<bool> {
    let mut config = Config::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    tracing::debug!(db = %config.db_path, "opening workspace");
    let mut workspace = Workspace::open(config).context("failed to open highlight state")?;

    let command = match cli.command {
        Cmd::List { pick: false } => {
            let text = list_output(&workspace, cli.json)?;
            if !text.is_empty() {
                writeln!(output, "{}", text)?;
            }
            return Ok(true);
        }
        Cmd::Files => {
            let text = files_output(&workspace, cli.json)?;
            if !text.is_empty() {
                writeln!(output, "{}", text)?;
            }
            return Ok(true);
        }
        Cmd::Edit { file, range, text } => {
            let summary = edit_file(&mut workspace, &file, range, text)?;
            writeln!(output, "{}", summary)?;
            return Ok(true);
        }
        other => other,
    };

    let mut host = TerminalHost::new(input, output);
    let command = match command {
        Cmd::Toggle { file, range, color } => {
            host.editor = Some(editor_for(&file, range)?);
            Command::Toggle { color }
        }
        Cmd::Add { file, range, color } => {
            host.editor = Some(editor_for(&file, range)?);
            match color {
                Some(color) => Command::AddWithColor(color),
                None => Command::Add,
            }
        }
        Cmd::Remove { file, position } => {
            host.editor = Some(cursor_at(&file, position));
            Command::Remove
        }
        Cmd::Clear { file, all } => {
            if let Some(file) = file {
                host.editor = Some(cursor_at(&file, Position::new(0, 0)));
                host.picks.push_back(0);
            } else if all {
                host.picks.push_back(1);
            }
            Command::Clear
        }
        Cmd::List { .. } => Command::List,
        Cmd::Comment {
            file,
            position,
            text,
        } => {
            host.editor = Some(cursor_at(&file, position));
            host.texts.extend(text);
            Command::EditComment { target: None }
        }
        Cmd::Export { path } => {
            host.save_path = path;
            Command::Export
        }
        Cmd::Import {
            path,
            replace,
            merge,
        } => {
            host.open_path = Some(path);
            if replace {
                host.picks.push_back(1);
            } else if merge {
                host.picks.push_back(0);
            }
            Command::Import
        }
        Cmd::Jump { file, id } => Command::JumpTo(HighlightRef::new(file_key(&file), id)),
        Cmd::Files | Cmd::Edit { .. } => return Ok(true),
    };

    let mut commands = Commands::new(workspace);
    let ok = commands.dispatch(&mut host, command);
    Ok(ok && host.errors == 0)
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "codemark=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let stdin = io::stdin();
    let ok = run(cli, stdin.lock(), io::stdout())?;
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests;
