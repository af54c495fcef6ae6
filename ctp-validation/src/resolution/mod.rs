pub mod history;
pub mod strategies;

pub use history::{HistoricalCase, LearningHistory, MAX_HISTORY};
pub use strategies::{resolve, Resolution, ResolutionStrategy};
