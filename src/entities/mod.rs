//! Domain entity model: the mutable in-memory representations of users,
//! learning objects, and outcomes, with taxonomy-constrained mutators.

pub mod learning_object;
pub mod learning_outcome;
pub mod outcome;
pub mod standard_outcome;
pub mod taxonomy;
pub mod user;

pub use learning_object::{LearningGoal, LearningObject};
pub use learning_outcome::{AssessmentPlan, InstructionalStrategy, LearningOutcome};
pub use outcome::Outcome;
pub use standard_outcome::StandardOutcome;
pub use user::User;
