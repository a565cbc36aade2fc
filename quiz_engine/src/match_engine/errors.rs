use thiserror::Error;

use crate::{
    db_types::QuestionError,
    match_engine::{LifelineType, MatchStatus},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("A match cannot start with an empty deck")]
    EmptyDeck,
    #[error("The deck contains an invalid question. {0}")]
    InvalidQuestion(#[from] QuestionError),
    #[error("The match is not in progress. Current status: {0}")]
    NotPlaying(MatchStatus),
    #[error("There is no current question to act on")]
    NoCurrentQuestion,
    #[error("Option {option} does not exist. The question has {count} options")]
    OptionOutOfRange { option: usize, count: usize },
    #[error("The current question has already been answered")]
    AlreadyAnswered,
    #[error("The {0} lifeline has already been used in this match")]
    LifelineUsed(LifelineType),
}
