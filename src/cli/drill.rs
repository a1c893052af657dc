use std::io::{BufRead, Write};

use anyhow::Result;
use rand::Rng;

use crate::app::App;
use crate::engine::evaluator::{Rejection, Submission};
use crate::session::{
    AdvanceOutcome, AnswerResult, QuestionKind, QuestionView, Session, SessionSummary, Stage,
};
use crate::store::{StatStore, WordStore};

use super::report::{BOLD, DIM, GREEN, RED, RESET, YELLOW};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Command {
    Answer(Submission),
    Next,
    Favorite,
    FlagWrong,
    Quit,
}

fn parse_command(line: &str, view: &QuestionView) -> Option<Command> {
    let line = line.trim();
    match line {
        ":q" | ":quit" => return Some(Command::Quit),
        ":fav" => return Some(Command::Favorite),
        ":wrong" => return Some(Command::FlagWrong),
        ":skip" => return Some(Command::Answer(Submission::Skip)),
        _ => {}
    }

    match &view.kind {
        QuestionKind::Card => line.is_empty().then_some(Command::Next),
        QuestionKind::Spelling => Some(Command::Answer(Submission::Text(line.to_string()))),
        QuestionKind::Choice { .. } => {
            option_index(line).map(|i| Command::Answer(Submission::Choice(i)))
        }
    }
}

/// `1`-based number or `a`-based letter.
fn option_index(input: &str) -> Option<usize> {
    if let Ok(n) = input.parse::<usize>() {
        return n.checked_sub(1);
    }
    let mut chars = input.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => {
            Some((c.to_ascii_lowercase() as u8 - b'a') as usize)
        }
        _ => None,
    }
}

fn render(out: &mut impl Write, view: &QuestionView) -> Result<()> {
    let stage = match view.stage {
        Stage::Review => "review",
        Stage::Quiz => "quiz",
    };
    writeln!(out)?;
    writeln!(
        out,
        "{DIM}[{stage} {}/{}]{RESET} {BOLD}{}{RESET}",
        view.position + 1,
        view.total,
        view.prompt
    )?;
    match &view.kind {
        QuestionKind::Card => {
            let word = &view.word;
            if !word.phonetic.is_empty() {
                writeln!(out, "  {DIM}{}{RESET}", word.phonetic)?;
            }
            if let Some(kana) = &word.kana {
                writeln!(out, "  {DIM}{}{RESET}", kana.katakana)?;
            }
            if let Some(reveal) = &view.reveal {
                writeln!(out, "  {reveal}")?;
            }
            if !word.phrase.is_empty() {
                writeln!(out, "  {DIM}{} / {}{RESET}", word.phrase, word.phrase_translation)?;
            }
            writeln!(out, "{DIM}enter: next  :fav  :wrong  :quit{RESET}")?;
        }
        QuestionKind::Choice { options } => {
            for (i, option) in options.iter().enumerate() {
                writeln!(out, "  {}) {option}", i + 1)?;
            }
        }
        QuestionKind::Spelling => writeln!(out, "{DIM}type the word, or :skip{RESET}")?,
    }
    write!(out, "> ")?;
    out.flush()?;
    Ok(())
}

fn describe(rejection: Rejection) -> &'static str {
    match rejection {
        Rejection::EmptySubmission => "type an answer first",
        Rejection::NoSuchOption => "no such option",
        Rejection::WrongKind => "that is not a valid answer here",
        Rejection::AlreadyAnswered => "already answered",
        Rejection::NotAwaitingAnswer => "nothing to answer",
    }
}

/// Run `session` to completion against line-based input. End of input acts
/// like `:quit`.
pub fn run<S, R>(
    app: &mut App<S, R>,
    session: &mut Session,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<Option<SessionSummary>>
where
    S: WordStore + StatStore,
    R: Rng,
{
    if session.is_empty() {
        writeln!(out, "Nothing left to learn here. The book is complete.")?;
        return Ok(None);
    }

    let mut line = String::new();
    while let Some(view) = app.current_question(session)? {
        render(out, &view)?;

        line.clear();
        let command = if input.read_line(&mut line)? == 0 {
            Command::Quit
        } else {
            match parse_command(&line, &view) {
                Some(command) => command,
                None => {
                    writeln!(out, "{YELLOW}?{RESET}")?;
                    continue;
                }
            }
        };

        let word = &view.word;
        match command {
            Command::Quit => return Ok(app.end_early(session)?),
            Command::Favorite => {
                let on = app.toggle_favorite(&word.book, word.rank)?;
                let note = if on {
                    "added to favorites"
                } else {
                    "removed from favorites"
                };
                writeln!(out, "{note}")?;
            }
            Command::FlagWrong => {
                app.flag_wrong(word)?;
                writeln!(out, "added to wrong words")?;
            }
            Command::Next => {
                if let AdvanceOutcome::Complete(summary) = app.advance(session)? {
                    return Ok(Some(summary));
                }
            }
            Command::Answer(submission) => match app.submit_answer(session, submission)? {
                AnswerResult::Rejected(rejection) => {
                    writeln!(out, "{YELLOW}{}{RESET}", describe(rejection))?;
                }
                AnswerResult::Scored {
                    correct,
                    answer,
                    word,
                    unlocked,
                    ..
                } => {
                    if correct {
                        writeln!(out, "{GREEN}correct{RESET}")?;
                        if session.mode().is_recognition() {
                            app.mark_mastered(&word.book, word.rank)?;
                        }
                    } else {
                        writeln!(out, "{RED}wrong{RESET}, answer: {BOLD}{answer}{RESET}")?;
                    }
                    for def in unlocked {
                        writeln!(out, "{YELLOW}achievement unlocked: {}{RESET}", def.name)?;
                    }
                    if let AdvanceOutcome::Complete(summary) = app.advance(session)? {
                        return Ok(Some(summary));
                    }
                }
            },
        }
    }
    Ok(None)
}
