//! Line-based terminal front-end for a running quiz.

use std::fmt::Write as _;

use services::{OptionMark, QuizPlayer, QuizResult, SessionSnapshot, SessionState};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// What the player typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Choose(usize),
    Next,
    Quit,
    Unknown,
}

fn parse_input(line: &str) -> Input {
    match line.trim() {
        "" | "n" | "next" => Input::Next,
        "q" | "quit" => Input::Quit,
        other => match other.parse::<usize>() {
            Ok(n @ 1..=4) => Input::Choose(n - 1),
            _ => Input::Unknown,
        },
    }
}

/// Countdown lines are printed sparsely so they do not bury the question.
fn announce_remaining(secs: u32) -> bool {
    secs <= 5 || secs % 10 == 0
}

#[derive(Default)]
struct Renderer {
    last: Option<(SessionState, usize)>,
}

impl Renderer {
    fn render(&mut self, snap: &SessionSnapshot) -> String {
        let view = (snap.state, snap.question_index);
        let changed = self.last != Some(view);
        self.last = Some(view);

        let mut out = String::new();
        match snap.state {
            SessionState::Idle => {}
            SessionState::ShowingQuestion if changed => {
                let _ = writeln!(
                    out,
                    "\nQuestion {}/{}  ({}s)",
                    snap.question_number(),
                    snap.total_questions,
                    snap.remaining_secs
                );
                if let Some(query) = &snap.question {
                    let _ = writeln!(out, "{query}");
                }
                for option in &snap.options {
                    let _ = writeln!(out, "  {}) {}", option.order() + 1, option.text());
                }
                out.push_str("Answer 1-4, q to quit: ");
            }
            SessionState::ShowingQuestion => {
                if announce_remaining(snap.remaining_secs) {
                    let _ = writeln!(out, "  {}s left", snap.remaining_secs);
                }
            }
            SessionState::Revealed if changed => {
                if snap.remaining_secs == 0 {
                    out.push_str("\nTime is up!\n");
                }
                for option in &snap.options {
                    let mark = match option.mark() {
                        OptionMark::Correct => "✓",
                        OptionMark::IncorrectSelected => "✗",
                        OptionMark::Neutral | OptionMark::Unselected => " ",
                    };
                    let _ = writeln!(out, " {mark} {}) {}", option.order() + 1, option.text());
                }
                let _ = writeln!(out, "Correct so far: {}", snap.correct_count);
                out.push_str("Enter for next question, q to quit: ");
            }
            SessionState::Revealed => {}
            SessionState::Finished => {
                if changed {
                    if let Some(result) = &snap.result {
                        let _ = writeln!(out, "\n{result}");
                    }
                }
            }
        }
        out
    }
}

async fn emit<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> std::io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    out.write_all(text.as_bytes()).await?;
    out.flush().await
}

fn apply(player: &QuizPlayer, snap: &SessionSnapshot, input: Input) -> Option<&'static str> {
    match input {
        Input::Choose(slot) => {
            let Some(option) = snap.options.iter().find(|o| o.order() == slot) else {
                return Some("no such option\n");
            };
            if !player.submit_answer(option.id()) {
                return Some("already answered\n");
            }
            None
        }
        Input::Next => {
            if snap.state == SessionState::Revealed {
                player.advance();
            }
            None
        }
        Input::Quit => {
            player.end();
            None
        }
        Input::Unknown => Some("type 1-4, Enter or q\n"),
    }
}

/// Run `player` against stdin/stdout until the quiz finishes or input ends.
///
/// # Errors
///
/// Returns an I/O error if the terminal cannot be read or written.
pub async fn play(player: &QuizPlayer) -> std::io::Result<QuizResult> {
    let mut updates = player.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut renderer = Renderer::default();

    let mut snap = updates.borrow_and_update().clone();
    emit(&mut stdout, &renderer.render(&snap)).await?;

    while snap.state != SessionState::Finished {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                snap = updates.borrow_and_update().clone();
                emit(&mut stdout, &renderer.render(&snap)).await?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::debug!("stdin closed, ending quiz");
                    break;
                };
                if let Some(message) = apply(player, &snap, parse_input(&line)) {
                    emit(&mut stdout, message).await?;
                }
            }
        }
    }

    let result = player.end();
    if renderer.last.map(|(state, _)| state) != Some(SessionState::Finished) {
        emit(&mut stdout, &format!("\n{result}\n")).await?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_maps_to_actions() {
        assert_eq!(parse_input("1"), Input::Choose(0));
        assert_eq!(parse_input(" 4 "), Input::Choose(3));
        assert_eq!(parse_input("5"), Input::Unknown);
        assert_eq!(parse_input("0"), Input::Unknown);
        assert_eq!(parse_input(""), Input::Next);
        assert_eq!(parse_input("n"), Input::Next);
        assert_eq!(parse_input("q"), Input::Quit);
        assert_eq!(parse_input("maybe"), Input::Unknown);
    }

    #[test]
    fn countdown_announcements_are_sparse() {
        assert!(announce_remaining(30));
        assert!(announce_remaining(20));
        assert!(!announce_remaining(17));
        assert!(announce_remaining(3));
    }

    #[test]
    fn finished_snapshot_prints_score_once() {
        let mut renderer = Renderer::default();
        let snap = SessionSnapshot {
            state: SessionState::Finished,
            total_questions: 2,
            correct_count: 1,
            result: Some(QuizResult::new(1, 2)),
            ..SessionSnapshot::default()
        };
        assert_eq!(renderer.render(&snap), "\nScore: 1/2 (50.0%)\n");
        assert_eq!(renderer.render(&snap), "");
    }
}
