pub mod course;
pub mod error;
pub mod value;

// Re-export the core types to provide a clean public API.
pub use course::CourseSection;
pub use error::CoreError;
pub use value::{Row, SqlValue};
