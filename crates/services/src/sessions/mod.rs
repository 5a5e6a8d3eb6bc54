//! Playing a question pack: the session state machine and its real-time
//! driver.

mod countdown;
mod options;
mod player;
mod quiz;

pub use crate::error::SessionError;
pub use options::{AnswerOption, OptionId, OptionMark};
pub use player::{PlayerOptions, QuizPlayer};
pub use quiz::{QuizResult, QuizSession, SessionSnapshot, SessionState, TickOutcome};
