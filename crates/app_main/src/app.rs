//! Terminal host
//!
//! Renders listings as numbered lines on stdout and turns typed commands
//! back into selections for the navigation engine.

use anyhow::Result;
use app_core::{
    synthesize, ArmedTimer, BrowserConfig, BrowserView, ChannelScheduler, ContextAction,
    ContextTarget, IconKind, IconSize, InputSource, NavigationEngine, NodeListing, Selection,
};
use app_fs::{DirectoryLister, EntryKind, StdDirectorySource};
use crossbeam_channel::{select, unbounded};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const HELP: &str = "\
Commands:
  <n>        open entry n
  m <n>      actions for entry n
  c <n>      copy the path of entry n
  cd <path>  change directory
  u          go up
  r          refresh
  h          help
  q          quit";

/// A line typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open(usize),
    Menu(usize),
    Copy(usize),
    ChangeDirectory(PathBuf),
    Up,
    Refresh,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        match (head, rest) {
            ("q" | "quit" | "exit", "") => Some(Command::Quit),
            ("h" | "help" | "?", "") => Some(Command::Help),
            ("u" | "up", "") => Some(Command::Up),
            ("r" | "refresh", "") => Some(Command::Refresh),
            ("m", n) => n.parse().ok().map(Command::Menu),
            ("c", n) => n.parse().ok().map(Command::Copy),
            ("cd", path) if !path.is_empty() => Some(Command::ChangeDirectory(PathBuf::from(path))),
            (n, "") => n.parse().ok().map(Command::Open),
            _ => None,
        }
    }
}

/// Line-oriented view writing to any sink
pub struct TerminalView<W: Write> {
    out: W,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn print_help(&mut self) {
        self.line(HELP);
    }

    pub fn prompt(&mut self) {
        let written = write!(self.out, "> ").and_then(|_| self.out.flush());
        if let Err(e) = written {
            tracing::debug!("Terminal write failed: {}", e);
        }
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text) {
            tracing::debug!("Terminal write failed: {}", e);
        }
    }
}

impl<W: Write> BrowserView for TerminalView<W> {
    fn show_listing(&mut self, listing: &NodeListing) {
        self.line(&format!("== {} ==", listing.directory.display()));
        for (i, node) in listing.nodes.iter().enumerate() {
            let marker = match (node.entry.kind, node.icon.is_some()) {
                (_, false) => '?',
                (EntryKind::ParentPseudoEntry, _) => '^',
                (EntryKind::Directory, _) => '+',
                (EntryKind::File, _) => '-',
            };
            let status = node.entry.cloud_status.for_display();
            let badge = if status.is_cloud_only() {
                format!("  [{}]", status.description())
            } else {
                String::new()
            };
            self.line(&format!("{:>4} {} {}{}", i, marker, node.entry.display_name, badge));
        }
    }

    fn preview_file(&mut self, path: &Path) {
        self.line(&format!("Preview: {}", path.display()));
    }

    fn show_unsupported(&mut self) {
        self.line("Unsupported file type");
    }

    fn set_status(&mut self, message: &str) {
        self.line(&format!("[status] {}", message));
    }

    fn offer_context_menu(&mut self, target: &ContextTarget) {
        self.line(&format!("Actions for {}:", target.path.display()));
        for action in target.actions() {
            self.line(&format!("  {}", action.label()));
        }
    }
}

/// Apply one command. Returns false when the session should end.
pub fn dispatch<W: Write>(engine: &mut NavigationEngine<TerminalView<W>>, command: Command) -> bool {
    match command {
        Command::Open(n) => {
            if let Some(selection) = selection_at(engine, n, InputSource::Primary) {
                let outcome = engine.select_entry(selection);
                tracing::debug!("Open {} -> {:?}", n, outcome);
            }
        }
        Command::Menu(n) => {
            if let Some(selection) = selection_at(engine, n, InputSource::Secondary) {
                engine.select_entry(selection);
            }
        }
        Command::Copy(n) => {
            if let Some(selection) = selection_at(engine, n, InputSource::Secondary) {
                let target = ContextTarget {
                    kind: selection.entry.kind,
                    path: selection.entry.path,
                };
                engine.run_context_action(ContextAction::CopyPath, &target);
            }
        }
        Command::ChangeDirectory(path) => {
            let outcome = engine.request_directory(&path, false);
            tracing::debug!("cd {} -> {:?}", path.display(), outcome);
        }
        Command::Up => {
            engine.go_up();
        }
        Command::Refresh => {
            engine.refresh();
        }
        Command::Help => engine.view_mut().print_help(),
        Command::Quit => return false,
    }
    true
}

fn selection_at<W: Write>(
    engine: &mut NavigationEngine<TerminalView<W>>,
    index: usize,
    source: InputSource,
) -> Option<Selection> {
    let selection = engine
        .state()
        .listing()
        .and_then(|listing| listing.node(index))
        .map(|node| node.select(source));

    if selection.is_none() {
        engine.view_mut().set_status(&format!("No entry {}", index));
    }
    selection
}

/// Interactive session on stdin/stdout
pub fn run(config: &BrowserConfig) -> Result<()> {
    let (scheduler, timers) = ChannelScheduler::channel();
    let view = TerminalView::new(std::io::stdout());
    let mut engine = NavigationEngine::from_config(config, view, Box::new(scheduler))?;

    if let Some(icon) = engine.refresh_icon() {
        tracing::debug!("Refresh glyph ready ({}x{})", icon.width(), icon.height());
    }

    let (input_tx, input_rx) = unbounded::<String>();
    std::thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if input_tx.send(line).is_err() {
                    break;
                }
            }
        })?;

    let loader_rx = engine
        .loader_results()
        .cloned()
        .unwrap_or_else(crossbeam_channel::never);

    engine.view_mut().print_help();
    engine.start(&config.resolve_initial_directory());
    engine.view_mut().prompt();

    let mut armed: Option<ArmedTimer> = None;
    loop {
        if armed.is_none() {
            armed = timers.pop();
        }
        let timer_rx = armed
            .as_ref()
            .map(|timer| timer.fires.clone())
            .unwrap_or_else(crossbeam_channel::never);

        select! {
            recv(timer_rx) -> _ => {
                if let Some(timer) = armed.take() {
                    engine.on_timer(timer.event);
                }
            }
            recv(loader_rx) -> listing => {
                if let Ok(listing) = listing {
                    if engine.accept_loaded(listing) {
                        engine.view_mut().prompt();
                    }
                }
            }
            recv(input_rx) -> line => {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    engine.view_mut().prompt();
                    continue;
                }
                match Command::parse(&line) {
                    Some(command) => {
                        if !dispatch(&mut engine, command) {
                            break;
                        }
                    }
                    None => engine.view_mut().set_status(&format!("Unknown command: {}", line.trim())),
                }
                engine.view_mut().prompt();
            }
        }
    }

    tracing::info!("Session ended");
    Ok(())
}

/// Print the listing of `dir` as JSON
pub fn print_listing(dir: &Path, config: &BrowserConfig) -> Result<()> {
    let lister = DirectoryLister::new(Arc::new(StdDirectorySource), config.cloud_probe());
    let dir = app_fs::normalize_path(&std::path::absolute(dir)?);
    if !lister.is_directory(&dir) {
        anyhow::bail!(app_fs::not_found_message(&dir));
    }

    let listing = lister.list(&dir);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &listing)?;
    writeln!(out)?;
    Ok(())
}

/// Write every synthesized glyph at both sizes as PNG. Returns the file count.
pub fn dump_icons(dir: &Path) -> Result<usize> {
    std::fs::create_dir_all(dir)?;

    let kinds = [
        (IconKind::UpArrow, "up_arrow"),
        (IconKind::Refresh, "refresh"),
        (IconKind::Folder, "folder"),
        (IconKind::Document, "document"),
    ];
    let mut written = 0;
    for (kind, name) in kinds {
        for size in [IconSize::Small, IconSize::Large] {
            let path = dir.join(format!("{}_{}.png", name, size.pixels()));
            synthesize(kind, size).save_png(&path)?;
            tracing::debug!("Wrote {:?}", path);
            written += 1;
        }
    }
    Ok(written)
}
