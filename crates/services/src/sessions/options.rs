use rand::Rng;
use rand::seq::SliceRandom;

use quiz_core::model::Question;

/// Identifies one presented option of one question.
///
/// The question index is part of the id, so a selection made for an earlier
/// question never matches an option of the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OptionId {
    question: usize,
    slot: usize,
}

impl OptionId {
    #[must_use]
    pub fn new(question: usize, slot: usize) -> Self {
        Self { question, slot }
    }

    #[must_use]
    pub fn question_index(&self) -> usize {
        self.question
    }

    /// Display position of the option (0-based).
    #[must_use]
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// Visual state of an option.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OptionMark {
    #[default]
    Unselected,
    Correct,
    IncorrectSelected,
    Neutral,
}

/// One of the four answers shown for the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    id: OptionId,
    text: String,
    is_correct: bool,
    mark: OptionMark,
}

impl AnswerOption {
    #[must_use]
    pub fn id(&self) -> OptionId {
        self.id
    }

    #[must_use]
    pub fn order(&self) -> usize {
        self.id.slot
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    #[must_use]
    pub fn mark(&self) -> OptionMark {
        self.mark
    }

    pub(crate) fn reveal(&mut self, selected: Option<OptionId>) {
        self.mark = if self.is_correct {
            OptionMark::Correct
        } else if selected == Some(self.id) {
            OptionMark::IncorrectSelected
        } else {
            OptionMark::Neutral
        };
    }
}

/// Builds the options for `question` in a uniformly random order.
pub(crate) fn shuffled_options<R: Rng + ?Sized>(
    question: &Question,
    question_index: usize,
    rng: &mut R,
) -> Vec<AnswerOption> {
    let mut answers: Vec<&str> = question.answers().collect();
    answers.shuffle(rng);
    answers
        .into_iter()
        .enumerate()
        .map(|(slot, text)| AnswerOption {
            id: OptionId::new(question_index, slot),
            text: text.to_owned(),
            is_correct: question.is_correct(text),
            mark: OptionMark::Unselected,
        })
        .collect()
}
