use std::io::Write;

use anyhow::Result;

use crate::book::Book;
use crate::engine::achievements::Achievement;
use crate::engine::stats::Statistics;
use crate::session::SessionSummary;
use crate::store::schema::{DailyStat, FavoriteEntry, WrongEntry};

pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const GREEN: &str = "\x1b[32m";
pub const RED: &str = "\x1b[31m";
pub const YELLOW: &str = "\x1b[33m";
pub const RESET: &str = "\x1b[0m";

const BAR_WIDTH: usize = 20;

fn bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

pub fn books(out: &mut impl Write, books: &[Book], current: &str) -> Result<()> {
    for book in books {
        let marker = if book.id == current { "*" } else { " " };
        let progress = book.progress();
        let custom = if book.is_custom() { " (custom)" } else { "" };
        writeln!(
            out,
            "{marker} {BOLD}{:<12}{RESET} {}{custom}  [{}] {}/{}",
            book.id,
            book.name,
            bar(progress.percent()),
            progress.current,
            progress.total
        )?;
    }
    Ok(())
}

pub fn wrong_words(out: &mut impl Write, entries: &[WrongEntry]) -> Result<()> {
    if entries.is_empty() {
        writeln!(out, "No wrong words.")?;
        return Ok(());
    }
    for entry in entries {
        let word = &entry.word;
        writeln!(
            out,
            "{:<10} {:>4}  {BOLD}{}{RESET}  {}  {DIM}x{} last {}{RESET}",
            word.book,
            word.rank,
            word.headword,
            word.translation,
            entry.wrong_count,
            entry.last_wrong.format("%Y-%m-%d %H:%M")
        )?;
    }
    Ok(())
}

pub fn favorites(out: &mut impl Write, entries: &[FavoriteEntry]) -> Result<()> {
    if entries.is_empty() {
        writeln!(out, "No favorites yet.")?;
        return Ok(());
    }
    for entry in entries {
        let word = &entry.word;
        writeln!(
            out,
            "{:<10} {:>4}  {BOLD}{}{RESET}  {}  {DIM}{}{RESET}",
            word.book,
            word.rank,
            word.headword,
            word.translation,
            entry.added_at.format("%Y-%m-%d")
        )?;
    }
    Ok(())
}

pub fn statistics(
    out: &mut impl Write,
    stats: &Statistics,
    recent: &[DailyStat],
    achievements: &[Achievement],
) -> Result<()> {
    let today = &stats.today;
    writeln!(out, "{BOLD}Today{RESET}")?;
    writeln!(
        out,
        "  learned {}  correct {}  wrong {}  accuracy {:.0}%  time {}m",
        today.learned,
        today.correct,
        today.wrong,
        stats.today_accuracy,
        today.duration_secs / 60
    )?;
    writeln!(out, "{BOLD}Overall{RESET}")?;
    writeln!(
        out,
        "  {} words over {} days, streak {} days",
        stats.total_learned, stats.total_days, stats.streak_days
    )?;

    if !recent.is_empty() {
        writeln!(out, "{BOLD}Recent days{RESET}")?;
        for day in recent {
            writeln!(
                out,
                "  {}  {:>4} learned  {:>4} correct  {:>4} wrong",
                day.date, day.learned, day.correct, day.wrong
            )?;
        }
    }

    writeln!(out, "{BOLD}Achievements{RESET}")?;
    for achievement in achievements {
        let def = achievement.def;
        match achievement.unlocked_at {
            Some(at) if achievement.unlocked => writeln!(
                out,
                "  {GREEN}[x]{RESET} {}  {DIM}{} ({}){RESET}",
                def.name,
                def.description,
                at.format("%Y-%m-%d")
            )?,
            _ => writeln!(out, "  [ ] {}  {DIM}{}{RESET}", def.name, def.description)?,
        }
    }
    Ok(())
}

pub fn summary(out: &mut impl Write, summary: &SessionSummary) -> Result<()> {
    let heading = if summary.partial {
        "Session ended"
    } else {
        "Session complete"
    };
    writeln!(out)?;
    writeln!(out, "{BOLD}{heading}{RESET}")?;
    writeln!(
        out,
        "  {}/{} answered  {GREEN}{} correct{RESET}  {RED}{} wrong{RESET}  accuracy {:.0}%  {}s",
        summary.answered,
        summary.total_words,
        summary.correct,
        summary.wrong,
        summary.accuracy,
        summary.elapsed_secs
    )?;
    Ok(())
}
