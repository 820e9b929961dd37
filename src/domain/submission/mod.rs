// Submission domain module
// Contains the submission aggregate root, its status value object and domain events

#![allow(clippy::module_inception)]

pub mod events;
pub mod submission;
pub mod value_objects;

// Re-export main types for convenience
pub use events::SubmissionEvent;
pub use submission::Submission;
pub use value_objects::SubmissionStatus;
