use std::fmt;
use std::sync::Arc;

use quiz_core::model::{Question, QuestionPack};

use super::options::{AnswerOption, OptionId, shuffled_options};
use crate::error::SessionError;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    #[default]
    Idle,
    ShowingQuestion,
    Revealed,
    Finished,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::ShowingQuestion => "showing-question",
            SessionState::Revealed => "revealed",
            SessionState::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// What a countdown tick did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not counting down (answered, revealed, finished or idle).
    Ignored,
    Running { remaining_secs: u32 },
    /// Time ran out; the question is now revealed.
    Expired,
}

//
// ─── RESULT ────────────────────────────────────────────────────────────────────
//

/// Final score of a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuizResult {
    pub correct: u32,
    pub total: u32,
    /// `correct / total`, 0 for an empty session.
    pub fraction: f64,
    /// Percentage rounded to one decimal place.
    pub percentage: f64,
}

impl QuizResult {
    #[must_use]
    pub fn new(correct: u32, total: u32) -> Self {
        let fraction = if total == 0 {
            0.0
        } else {
            f64::from(correct) / f64::from(total)
        };
        let percentage = (fraction * 1000.0).round() / 10.0;
        Self {
            correct,
            total,
            fraction,
            percentage,
        }
    }
}

impl fmt::Display for QuizResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Score: {}/{} ({:.1}%)",
            self.correct, self.total, self.percentage
        )
    }
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Everything a presentation layer needs to render the session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub pack_name: Option<String>,
    pub question_index: usize,
    pub total_questions: usize,
    pub question: Option<String>,
    pub options: Vec<AnswerOption>,
    pub remaining_secs: u32,
    pub correct_count: u32,
    pub result: Option<QuizResult>,
}

impl SessionSnapshot {
    /// 1-based number of the current question, for display.
    #[must_use]
    pub fn question_number(&self) -> usize {
        (self.question_index + 1).min(self.total_questions)
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One playthrough of a pack.
///
/// Pure state machine: time only moves when `tick` is called, so the caller
/// decides what a second is. `QuizPlayer` wires it to a real countdown.
pub struct QuizSession {
    state: SessionState,
    pack_name: Option<String>,
    time_limit_secs: u32,
    questions: Arc<[Question]>,
    index: usize,
    remaining_secs: u32,
    correct_count: u32,
    answered: bool,
    options: Vec<AnswerOption>,
    result: Option<QuizResult>,
}

impl QuizSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            pack_name: None,
            time_limit_secs: 0,
            questions: Arc::from(Vec::new()),
            index: 0,
            remaining_secs: 0,
            correct_count: 0,
            answered: false,
            options: Vec::new(),
            result: None,
        }
    }

    /// Start playing `pack` from its first question.
    ///
    /// The question list is copied, so later edits to the pack do not affect
    /// this session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyPack` if the pack has no questions and
    /// `SessionError::AlreadyStarted` unless the session is idle. The session
    /// is left untouched in both cases.
    pub fn start(&mut self, pack: &QuestionPack) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::AlreadyStarted);
        }
        if pack.questions().is_empty() {
            return Err(SessionError::EmptyPack);
        }

        self.pack_name = Some(pack.name().to_owned());
        self.time_limit_secs = pack.time_limit_secs();
        self.questions = Arc::from(pack.questions());
        self.index = 0;
        self.correct_count = 0;
        self.result = None;
        self.show_current();
        Ok(())
    }

    /// Lock in an answer for the current question.
    ///
    /// Returns `true` if this call revealed the question. Submitting while not
    /// showing a question, after the question was answered, or with an option
    /// of another question does nothing.
    pub fn submit_answer(&mut self, option: OptionId) -> bool {
        if self.state != SessionState::ShowingQuestion || self.answered {
            return false;
        }
        if option.question_index() != self.index {
            return false;
        }
        let Some(selected) = self.options.iter().find(|o| o.id() == option) else {
            return false;
        };

        if selected.is_correct() {
            self.correct_count += 1;
        }
        self.reveal(Some(option));
        true
    }

    /// One second of countdown.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state != SessionState::ShowingQuestion || self.answered {
            return TickOutcome::Ignored;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.reveal(None);
            return TickOutcome::Expired;
        }
        TickOutcome::Running {
            remaining_secs: self.remaining_secs,
        }
    }

    /// Move past a revealed question. Returns `true` if the session moved.
    pub fn advance(&mut self) -> bool {
        if self.state != SessionState::Revealed {
            return false;
        }
        self.index += 1;
        if self.index >= self.questions.len() {
            self.finish();
        } else {
            self.show_current();
        }
        true
    }

    /// Finish the session now and return the score so far.
    ///
    /// Calling this on a finished session returns the stored result.
    pub fn end(&mut self) -> QuizResult {
        match self.result {
            Some(result) => result,
            None => self.finish(),
        }
    }

    // Accessors
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn pack_name(&self) -> Option<&str> {
        self.pack_name.as_deref()
    }

    #[must_use]
    pub fn question_index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            SessionState::ShowingQuestion | SessionState::Revealed => {
                self.questions.get(self.index)
            }
            SessionState::Idle | SessionState::Finished => None,
        }
    }

    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.answered
    }

    #[must_use]
    pub fn result(&self) -> Option<QuizResult> {
        self.result
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            pack_name: self.pack_name.clone(),
            question_index: self.index,
            total_questions: self.questions.len(),
            question: self.current_question().map(|q| q.query().to_owned()),
            options: self.options.clone(),
            remaining_secs: self.remaining_secs,
            correct_count: self.correct_count,
            result: self.result,
        }
    }

    fn show_current(&mut self) {
        let question = &self.questions[self.index];
        self.options = shuffled_options(question, self.index, &mut rand::rng());
        self.remaining_secs = self.time_limit_secs;
        self.answered = false;
        self.state = SessionState::ShowingQuestion;
    }

    fn reveal(&mut self, selected: Option<OptionId>) {
        self.answered = true;
        for option in &mut self.options {
            option.reveal(selected);
        }
        self.state = SessionState::Revealed;
    }

    fn finish(&mut self) -> QuizResult {
        let total = u32::try_from(self.questions.len()).unwrap_or(u32::MAX);
        let result = QuizResult::new(self.correct_count, total);
        self.result = Some(result);
        self.options.clear();
        self.answered = false;
        self.state = SessionState::Finished;
        result
    }
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("state", &self.state)
            .field("pack_name", &self.pack_name)
            .field("index", &self.index)
            .field("questions_len", &self.questions.len())
            .field("remaining_secs", &self.remaining_secs)
            .field("correct_count", &self.correct_count)
            .field("answered", &self.answered)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
