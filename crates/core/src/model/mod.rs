mod category;
mod ids;
mod pack;
mod question;

pub use ids::{CategoryId, PackId, ParseIdError};

pub use category::{Category, CategoryError};
pub use pack::{
    DEFAULT_TIME_LIMIT_SECS, Difficulty, PackError, PackSummary, ParseDifficultyError,
    QuestionPack,
};
pub use question::{INCORRECT_ANSWER_COUNT, Question, QuestionError};
