//! Plain-text rendering of quiz frames and events.

use quiz_core::{
    BatchStatus, Overview, Phase, QuizEvent, QuizMode, QuizView, Renderer,
};
use std::io::Write;

const BELL: &str = "\x07";

/// Writes frames to any `Write` sink, usually stdout.
pub struct TerminalRenderer<W: Write> {
    out: W,
    title: String,
    subtitle: String,
    bell_pending: bool,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            out,
            title: title.into(),
            subtitle: subtitle.into(),
            bell_pending: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn header(&mut self) {
        let text = format!("{}\n{}\n", self.title, self.subtitle);
        self.write(&text);
    }

    /// Print a line outside the regular frame.
    pub fn message(&mut self, text: &str) {
        self.write(&format!("{text}\n"));
    }

    fn write(&mut self, text: &str) {
        if let Err(e) = self
            .out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush())
        {
            tracing::debug!(error = %e, "terminal write failed");
        }
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render(&mut self, view: &QuizView) {
        let mut frame = String::new();
        frame.push('\n');
        frame.push_str(&status_line(view));
        frame.push('\n');

        if view.mode == QuizMode::Review {
            frame.push_str(&format!(
                "Review mode: {} word(s) to practise\n",
                view.review_count
            ));
        }

        match view.phase {
            Phase::AllBatchesComplete => {
                frame.push_str("All batches complete! `restart`, `b <n>` or `r` to review.\n");
            }
            Phase::ReviewComplete => {
                frame.push_str("Review round complete. `c` to keep reviewing, `x` to go back.\n");
            }
            Phase::Answering | Phase::Answered { .. } => {
                if let Some(question) = &view.question {
                    frame.push_str(&format!("\n    {}\n\n", question.word.headword));
                    for (i, option) in question.options.iter().enumerate() {
                        let mark = match &view.feedback {
                            Some(f) if i == f.correct_index => "✓",
                            Some(f) if i == f.selected => "✗",
                            _ => " ",
                        };
                        let label = view.settings.option_label(&option.entry).replace('\n', " / ");
                        frame.push_str(&format!("  {mark} {}) {label}\n", i + 1));
                    }
                }
                if let Some(feedback) = &view.feedback {
                    frame.push('\n');
                    match &feedback.correction {
                        Some(correction) => {
                            frame.push_str(&format!("Wrong. Correct answer: {correction}\n"))
                        }
                        None => frame.push_str("Correct!\n"),
                    }
                    if !view.settings.auto_advance {
                        frame.push_str("Press Enter to continue.\n");
                    }
                }
            }
        }

        if self.bell_pending && view.feedback.is_some() {
            if view.settings.sound_enabled {
                frame.push_str(BELL);
            }
            self.bell_pending = false;
        }
        self.write(&frame);
    }

    fn notify(&mut self, event: &QuizEvent) {
        let text = match event {
            QuizEvent::Answered(outcome) => {
                self.bell_pending = !outcome.was_correct;
                return;
            }
            QuizEvent::BatchComplete {
                batch_index,
                stats,
                next_batch,
            } => format!(
                "Batch {} complete: {}/{} correct ({}%). Starting batch {}.",
                batch_index + 1,
                stats.correct,
                stats.total,
                stats.accuracy,
                next_batch + 1
            ),
            QuizEvent::AllBatchesComplete { batch_index, stats } => format!(
                "Final batch {} complete: {}/{} correct ({}%).",
                batch_index + 1,
                stats.correct,
                stats.total,
                stats.accuracy
            ),
            QuizEvent::ReviewComplete {
                counters,
                remaining,
            } => format!(
                "Review round done: {} correct, {} wrong. {remaining} word(s) left to review.",
                counters.correct, counters.wrong
            ),
            QuizEvent::ProgressRestored => "Welcome back! Progress restored.".to_string(),
            QuizEvent::ProgressDiscarded(e) => {
                format!("Saved progress could not be read ({e}). Starting fresh.")
            }
            QuizEvent::SharedProgressLoaded => "Shared progress loaded.".to_string(),
            QuizEvent::ProgressReset => "All progress cleared.".to_string(),
        };
        self.message(&text);
    }
}

fn status_line(view: &QuizView) -> String {
    let mut line = match view.mode {
        QuizMode::Normal => format!("Batch {}/{}", view.batch_index + 1, view.total_batches),
        QuizMode::Review => "Review".to_string(),
    };
    if let Some(question) = &view.question {
        line.push_str(&format!("  Word {}/{}", question.position + 1, question.total));
    }
    line.push_str(&format!(
        "  ✓ {}  ✗ {}  ({}%)",
        view.counters.correct,
        view.counters.wrong,
        view.counters.accuracy()
    ));
    if view.mode == QuizMode::Normal && view.review_count > 0 {
        line.push_str(&format!("  To review: {}", view.review_count));
    }
    line
}

/// Statistics screen text.
pub fn format_overview(overview: &Overview) -> String {
    let mut text = format!(
        "Batches completed: {}/{}\nWords to review: {}\nOverall accuracy: {}%\n",
        overview.completed, overview.total_batches, overview.review_count, overview.accuracy
    );
    for (i, status) in overview.batches.iter().enumerate() {
        let cell = match status {
            BatchStatus::Current => "current".to_string(),
            BatchStatus::Completed {
                accuracy: Some(accuracy),
            } => format!("done {accuracy}%"),
            BatchStatus::Completed { accuracy: None } => "done".to_string(),
            BatchStatus::NotStarted => "-".to_string(),
        };
        text.push_str(&format!("  {:>3}  {cell}\n", i + 1));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quiz_core::{
        AnswerOutcome, BatchStats, Counters, Feedback, Question, QuizOption, QuizSettings,
        VocabularyEntry,
    };

    fn renderer() -> TerminalRenderer<Vec<u8>> {
        TerminalRenderer::new(Vec::new(), "HSK 4 Quiz", "Match Chinese characters to their meanings")
    }

    fn output(renderer: TerminalRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    fn view(feedback: Option<Feedback>) -> QuizView {
        let entry = |h: &str, p: &str, t: &str| QuizOption {
            entry: VocabularyEntry::new(h, p, t),
            is_correct: h == "爱",
        };
        QuizView {
            question: Some(Question {
                word: VocabularyEntry::new("爱", "ài", "love"),
                options: vec![
                    entry("八", "bā", "eight"),
                    entry("爱", "ài", "love"),
                    entry("爸爸", "bàba", "father"),
                    entry("杯子", "bēizi", "cup"),
                ],
                position: 2,
                total: 50,
            }),
            phase: if feedback.is_some() {
                Phase::Answered {
                    was_correct: false,
                    removed: false,
                }
            } else {
                Phase::Answering
            },
            feedback,
            mode: QuizMode::Normal,
            batch_index: 1,
            total_batches: 12,
            counters: Counters {
                correct: 3,
                wrong: 1,
                total_answered: 4,
            },
            review_count: 1,
            settings: QuizSettings {
                pinyin_mode: false,
                ..QuizSettings::default()
            },
        }
    }

    fn wrong_feedback() -> Feedback {
        Feedback {
            selected: 0,
            correct_index: 1,
            was_correct: false,
            correction: Some("love".to_string()),
        }
    }

    #[test]
    fn test_question_frame() {
        let mut r = renderer();
        r.render(&view(None));
        let text = output(r);

        assert!(text.contains("Batch 2/12  Word 3/50  ✓ 3  ✗ 1  (75%)  To review: 1"));
        assert!(text.contains("    爱\n"));
        assert!(text.contains("    1) eight\n"));
        assert!(text.contains("    4) cup\n"));
        assert!(!text.contains(BELL));
    }

    #[test]
    fn test_feedback_marks_and_bell() {
        let mut r = renderer();
        r.notify(&QuizEvent::Answered(AnswerOutcome {
            was_correct: false,
            word: VocabularyEntry::new("爱", "ài", "love"),
            review_queue_len: 1,
        }));
        r.render(&view(Some(wrong_feedback())));
        // a settings re-render does not ring again
        r.render(&view(Some(wrong_feedback())));
        let text = output(r);

        assert!(text.contains("  ✗ 1) eight\n"));
        assert!(text.contains("  ✓ 2) love\n"));
        assert!(text.contains("Wrong. Correct answer: love\n"));
        assert_eq!(text.matches(BELL).count(), 1);
    }

    #[test]
    fn test_bell_respects_sound_setting() {
        let mut r = renderer();
        r.notify(&QuizEvent::Answered(AnswerOutcome {
            was_correct: false,
            word: VocabularyEntry::new("爱", "ài", "love"),
            review_queue_len: 1,
        }));
        let mut quiet = view(Some(wrong_feedback()));
        quiet.settings.sound_enabled = false;
        quiet.settings.auto_advance = false;
        r.render(&quiet);
        let text = output(r);

        assert!(!text.contains(BELL));
        assert!(text.contains("Press Enter to continue."));
    }

    #[test]
    fn test_events() {
        let mut r = renderer();
        r.notify(&QuizEvent::BatchComplete {
            batch_index: 0,
            stats: BatchStats {
                correct: 45,
                total: 50,
                accuracy: 90,
            },
            next_batch: 1,
        });
        r.notify(&QuizEvent::ProgressReset);
        let text = output(r);

        assert_eq!(
            text,
            "Batch 1 complete: 45/50 correct (90%). Starting batch 2.\nAll progress cleared.\n"
        );
    }

    #[test]
    fn test_complete_phase_has_no_question() {
        let mut r = renderer();
        let mut done = view(None);
        done.question = None;
        done.phase = Phase::AllBatchesComplete;
        r.render(&done);
        let text = output(r);

        assert!(text.contains("All batches complete!"));
        assert!(!text.contains("1)"));
    }

    #[test]
    fn test_format_overview() {
        let overview = Overview {
            total_batches: 3,
            completed: 1,
            review_count: 2,
            accuracy: 80,
            batches: vec![
                BatchStatus::Completed { accuracy: Some(80) },
                BatchStatus::Current,
                BatchStatus::NotStarted,
            ],
        };
        assert_eq!(
            format_overview(&overview),
            "Batches completed: 1/3\nWords to review: 2\nOverall accuracy: 80%\n    1  done 80%\n    2  current\n    3  -\n"
        );
    }
}
