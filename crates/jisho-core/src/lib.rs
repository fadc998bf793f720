pub mod outcome;
pub mod preprocess;
pub mod progress;

pub use outcome::{FailureKind, StageOutcome};
pub use preprocess::{DefaultPreprocessor, Preprocessor};
pub use progress::{Stage, StatusReporter, UpdateStatus};
