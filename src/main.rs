use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    style::{self, Color, Print},
    terminal, ExecutableCommand, QueueableCommand,
};
use rand::thread_rng;
use tracing_subscriber::EnvFilter;

use termraider::assets::{self, Loader};
use termraider::display::{TermFrontend, TermInput};
use termraider::level::{play_level, LevelOutcome};
use termraider::save::SaveState;

const TICK: Duration = Duration::from_millis(33); // ≈30 ticks/sec

fn save_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".termraider_save")
}

// ── Menu ──────────────────────────────────────────────────────────────────────

fn draw_menu<W: Write>(
    out: &mut W,
    maps: &[String],
    save: &SaveState,
    selected: usize,
    notice: Option<&str>,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let (width, _) = terminal::size()?;
    let cx = width / 2;

    let title = "T E R M R A I D E R";
    out.queue(cursor::MoveTo(
        cx.saturating_sub(title.chars().count() as u16 / 2),
        1,
    ))?;
    out.queue(style::SetForegroundColor(Color::Cyan))?;
    out.queue(Print(title))?;

    out.queue(cursor::MoveTo(4, 3))?;
    out.queue(style::SetForegroundColor(Color::White))?;
    out.queue(Print("Select a map:"))?;

    for (i, name) in maps.iter().enumerate() {
        out.queue(cursor::MoveTo(4, 5 + i as u16))?;
        let marker = if i == selected { "> " } else { "  " };
        let done = if save.is_complete(name) { " *" } else { "" };
        out.queue(style::SetForegroundColor(if i == selected {
            Color::Yellow
        } else {
            Color::Grey
        }))?;
        out.queue(Print(format!("{marker}{name}{done}")))?;
    }

    if let Some(notice) = notice {
        out.queue(cursor::MoveTo(4, 6 + maps.len() as u16))?;
        out.queue(style::SetForegroundColor(Color::Red))?;
        out.queue(Print(notice))?;
    }

    out.queue(cursor::MoveTo(4, 8 + maps.len() as u16))?;
    out.queue(style::SetForegroundColor(Color::DarkGrey))?;
    out.queue(Print("↑ ↓ : Choose   ENTER : Play   Q : Quit   (* = complete)"))?;

    out.queue(style::ResetColor)?;
    out.flush()
}

fn run<W: Write>(root: &str, out: &mut W) -> Result<()> {
    let mut save = SaveState::load(save_path());
    let maps = assets::list_maps(root).context("listing maps")?;
    anyhow::ensure!(!maps.is_empty(), "no maps found under {root}/maps");

    let mut selected = 0usize;
    let mut notice: Option<String> = None;
    loop {
        draw_menu(out, &maps, &save, selected, notice.as_deref())?;
        if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
            if kind == KeyEventKind::Release {
                continue;
            }
            match code {
                KeyCode::Up | KeyCode::Char('k') => selected = selected.saturating_sub(1),
                KeyCode::Down | KeyCode::Char('j') => {
                    selected = (selected + 1).min(maps.len().saturating_sub(1))
                }
                KeyCode::Enter | KeyCode::Char(' ') => {
                    notice = start_level(root, &maps[selected], &mut save)?;
                }
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                _ => {}
            }
        }
    }
}

fn start_level(root: &str, name: &str, save: &mut SaveState) -> Result<Option<String>> {
    let mut loader = Loader::new(root);
    let map = match loader.map(name) {
        Ok(map) => map,
        Err(err) => {
            tracing::error!(name, %err, "failed to load map");
            return Ok(Some(format!("Could not load \"{name}\"; see the log.")));
        }
    };
    let catalog = loader.into_catalog();
    let mut frontend = TermFrontend::new(BufWriter::new(stdout()));
    let mut input = TermInput;
    let outcome = play_level(
        &map,
        &catalog,
        save,
        &mut frontend,
        &mut input,
        TICK,
        &mut thread_rng(),
    )?;
    Ok(match outcome {
        LevelOutcome::Locked => Some(format!(
            "\"{}\" is locked; beat its prerequisite first.",
            map.name
        )),
        LevelOutcome::Won | LevelOutcome::Aborted => None,
    })
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    // Stdout is in raw mode while the game runs, so diagnostics go to a file.
    let log = File::create("termraider.log").context("creating log file")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(log))
        .with_ansi(false)
        .init();

    let root = std::env::args().nth(1).unwrap_or_else(|| "data".to_string());

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    let result = run(&root, &mut out);

    // Always restore the terminal
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}
