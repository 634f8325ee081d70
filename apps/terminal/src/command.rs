//! Parsing of typed commands.

use crate::error::{AppError, Result};
use crate::render::format_overview;
use quiz_core::{
    share_url, token_from_link, BatchSize, Clock, Orchestrator, Phase, ProgressStore, Renderer,
    SharedProgress,
};

pub const HELP: &str = "\
Commands:
  1-4              pick an option
  <enter>          continue after an answer
  s                skip this word
  n / p            next / previous word
  r [word]         review wrong answers, optionally starting with one word
  c / x            continue / exit review
  b <n>            go to batch n
  size <n|all>     change batch size (resets progress)
  reset            reset the current batch
  reset-all        clear all progress
  restart          start again from batch 1
  share            print a share link
  load <link>      load progress from a share link
  mode pinyin|english
  translation on|off
  auto on|off
  sound on|off
  stats            show statistics
  save             save now
  q                quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Zero-based option index.
    Answer(usize),
    Advance,
    Skip,
    Next,
    Previous,
    Review(Option<String>),
    ContinueReview,
    ExitReview,
    /// Zero-based batch index.
    GoToBatch(usize),
    BatchSize(BatchSize),
    ResetBatch,
    ResetAll,
    Restart,
    Share,
    Load(String),
    PinyinMode(bool),
    ShowTranslation(bool),
    AutoAdvance(bool),
    Sound(bool),
    Stats,
    Save,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let arg = (!rest.is_empty()).then_some(rest);

        let command = match (word.to_ascii_lowercase().as_str(), arg) {
            ("", None) => Self::Advance,
            (n, None) if n.len() == 1 && n.as_bytes()[0].is_ascii_digit() => {
                match n.parse::<usize>() {
                    Ok(choice @ 1..) => Self::Answer(choice - 1),
                    _ => return Err(AppError::UnknownCommand(line.to_string())),
                }
            }
            ("s" | "skip", None) => Self::Skip,
            ("n" | "next", None) => Self::Next,
            ("p" | "prev", None) => Self::Previous,
            ("r" | "review", headword) => Self::Review(headword.map(str::to_string)),
            ("c" | "continue", None) => Self::ContinueReview,
            ("x" | "exit", None) => Self::ExitReview,
            ("b" | "batch", Some(n)) => match n.parse::<usize>() {
                Ok(n @ 1..) => Self::GoToBatch(n - 1),
                _ => return Err(AppError::Usage("b <batch number>")),
            },
            ("b" | "batch", None) => return Err(AppError::Usage("b <batch number>")),
            ("size", Some(size)) => {
                Self::BatchSize(BatchSize::parse(size).ok_or(AppError::Usage("size <n|all>"))?)
            }
            ("size", None) => return Err(AppError::Usage("size <n|all>")),
            ("reset", None) => Self::ResetBatch,
            ("reset-all", None) => Self::ResetAll,
            ("restart", None) => Self::Restart,
            ("share", None) => Self::Share,
            ("load", Some(link)) => Self::Load(link.to_string()),
            ("load", None) => return Err(AppError::Usage("load <link>")),
            ("mode", Some(mode)) => match mode.to_ascii_lowercase().as_str() {
                "pinyin" => Self::PinyinMode(true),
                "english" => Self::PinyinMode(false),
                _ => return Err(AppError::Usage("mode pinyin|english")),
            },
            ("translation", value) => {
                Self::ShowTranslation(switch(value).ok_or(AppError::Usage("translation on|off"))?)
            }
            ("auto", value) => Self::AutoAdvance(switch(value).ok_or(AppError::Usage("auto on|off"))?),
            ("sound", value) => Self::Sound(switch(value).ok_or(AppError::Usage("sound on|off"))?),
            ("stats", None) => Self::Stats,
            ("save", None) => Self::Save,
            ("help" | "h" | "?", None) => Self::Help,
            ("q" | "quit", None) => Self::Quit,
            _ => return Err(AppError::UnknownCommand(line.to_string())),
        };
        Ok(command)
    }
}

/// What the input loop should do after a command.
#[derive(Debug)]
pub enum Flow {
    Continue,
    Say(String),
    /// Ask before replacing current progress with shared progress.
    Confirm(SharedProgress),
    Quit,
}

pub fn execute<S, R, C>(
    quiz: &mut Orchestrator<S, R, C>,
    command: Command,
    share_base: &str,
) -> Result<Flow>
where
    S: ProgressStore,
    R: Renderer,
    C: Clock,
{
    match command {
        Command::Answer(index) => {
            quiz.answer(index)?;
        }
        Command::Advance => {
            // Enter only means something while feedback is showing
            if matches!(quiz.state().phase(), Phase::Answered { .. }) {
                quiz.advance()?;
            }
        }
        Command::Skip => {
            quiz.skip()?;
        }
        Command::Next => {
            if !quiz.step_forward()? {
                return Ok(Flow::Say("Already at the last word.".to_string()));
            }
        }
        Command::Previous => {
            if !quiz.step_back()? {
                return Ok(Flow::Say("Already at the first word.".to_string()));
            }
        }
        Command::Review(None) => quiz.enter_review()?,
        Command::Review(Some(headword)) => quiz.enter_review_with(&headword)?,
        Command::ContinueReview => quiz.continue_review()?,
        Command::ExitReview => quiz.exit_review()?,
        Command::GoToBatch(batch_index) => quiz.go_to_batch(batch_index)?,
        Command::BatchSize(size) => quiz.change_batch_size(size)?,
        Command::ResetBatch => quiz.reset_batch()?,
        Command::ResetAll => quiz.reset_all()?,
        Command::Restart => quiz.restart()?,
        Command::Share => {
            let token = quiz.share_token()?;
            return Ok(Flow::Say(format!(
                "Share this link:\n{}",
                share_url(share_base, &token)
            )));
        }
        Command::Load(link) => {
            let token = token_from_link(&link).ok_or(AppError::Usage("load <link>"))?;
            return Ok(Flow::Confirm(quiz.decode_share(&token)?));
        }
        Command::PinyinMode(on) => quiz.set_pinyin_mode(on)?,
        Command::ShowTranslation(on) => quiz.set_show_translation(on)?,
        Command::AutoAdvance(on) => quiz.set_auto_advance(on)?,
        Command::Sound(on) => quiz.set_sound(on)?,
        Command::Stats => return Ok(Flow::Say(format_overview(&quiz.overview()))),
        Command::Save => {
            quiz.save()?;
            return Ok(Flow::Say("Progress saved.".to_string()));
        }
        Command::Help => return Ok(Flow::Say(HELP.to_string())),
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

/// Question asked before shared progress replaces the current one.
pub fn confirm_prompt(shared: &SharedProgress, vocabulary_len: usize) -> String {
    let mut prompt = format!(
        "Load shared progress? Batch {}, word {}, {} word(s) to review",
        shared.batch_index + 1,
        shared.position + 1,
        shared.review_queue.len()
    );
    if let Some(timestamp) = shared.timestamp {
        prompt.push_str(&format!(", saved {}", timestamp.format("%Y-%m-%d %H:%M UTC")));
    }
    prompt.push('.');
    if shared.total_words != 0 && shared.total_words != vocabulary_len {
        prompt.push_str(&format!(
            " It was made with a list of {} words, this one has {vocabulary_len}.",
            shared.total_words
        ));
    }
    prompt.push_str(" This replaces your current progress. [y/N]");
    prompt
}

pub fn is_yes(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn switch(value: Option<&str>) -> Option<bool> {
    match value?.to_ascii_lowercase().as_str() {
        "on" => Some(true),
        "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_answers_are_zero_based() {
        assert_eq!(Command::parse("1").unwrap(), Command::Answer(0));
        assert_eq!(Command::parse(" 4 ").unwrap(), Command::Answer(3));
        assert!(matches!(Command::parse("0"), Err(AppError::UnknownCommand(_))));
    }

    #[test]
    fn test_navigation() {
        assert_eq!(Command::parse("").unwrap(), Command::Advance);
        assert_eq!(Command::parse("s").unwrap(), Command::Skip);
        assert_eq!(Command::parse("n").unwrap(), Command::Next);
        assert_eq!(Command::parse("P").unwrap(), Command::Previous);
        assert_eq!(Command::parse("b 3").unwrap(), Command::GoToBatch(2));
        assert!(matches!(Command::parse("b 0"), Err(AppError::Usage(_))));
        assert!(matches!(Command::parse("b"), Err(AppError::Usage(_))));
    }

    #[test]
    fn test_review_commands() {
        assert_eq!(Command::parse("r").unwrap(), Command::Review(None));
        assert_eq!(
            Command::parse("r  朋友 ").unwrap(),
            Command::Review(Some("朋友".to_string()))
        );
        assert_eq!(Command::parse("c").unwrap(), Command::ContinueReview);
        assert_eq!(Command::parse("x").unwrap(), Command::ExitReview);
    }

    #[test]
    fn test_settings() {
        assert_eq!(Command::parse("size all").unwrap(), Command::BatchSize(BatchSize::All));
        assert_eq!(
            Command::parse("size 20").unwrap(),
            Command::BatchSize(BatchSize::Fixed(20))
        );
        assert_eq!(Command::parse("mode english").unwrap(), Command::PinyinMode(false));
        assert_eq!(Command::parse("translation off").unwrap(), Command::ShowTranslation(false));
        assert_eq!(Command::parse("auto ON").unwrap(), Command::AutoAdvance(true));
        assert_eq!(Command::parse("sound off").unwrap(), Command::Sound(false));
        assert!(matches!(Command::parse("sound"), Err(AppError::Usage(_))));
        assert!(matches!(Command::parse("mode loud"), Err(AppError::Usage(_))));
    }

    #[test]
    fn test_confirmation_answers() {
        assert!(is_yes(" Y "));
        assert!(is_yes("yes"));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
    }

    #[test]
    fn test_sharing_and_misc() {
        assert_eq!(
            Command::parse("load https://quiz.example/?p=abc").unwrap(),
            Command::Load("https://quiz.example/?p=abc".to_string())
        );
        assert_eq!(Command::parse("reset-all").unwrap(), Command::ResetAll);
        assert_eq!(Command::parse("q").unwrap(), Command::Quit);
        assert!(matches!(Command::parse("dance"), Err(AppError::UnknownCommand(_))));
        assert!(matches!(Command::parse("stats now"), Err(AppError::UnknownCommand(_))));
    }
}
