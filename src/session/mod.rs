pub mod result;
pub mod state;

pub use result::{AdvanceOutcome, AnswerResult, QuestionKind, QuestionView, SessionSummary};
pub use state::{Phase, Session, SessionSource, Stage};
