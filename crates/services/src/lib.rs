#![forbid(unsafe_code)]

pub mod app_services;
pub mod category_service;
pub mod default_pack;
pub mod error;
pub mod pack_service;
pub mod sessions;

pub use quiz_core::Clock;

pub use app_services::{AppServices, Backend};
pub use category_service::CategoryService;
pub use error::{AppServicesError, CategoryServiceError, PackServiceError, SessionError};
pub use pack_service::{PackOptions, PackService};

pub use sessions::{
    AnswerOption, OptionId, OptionMark, PlayerOptions, QuizPlayer, QuizResult, QuizSession,
    SessionSnapshot, SessionState, TickOutcome,
};
