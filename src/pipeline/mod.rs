pub mod extraction;
pub mod processor; // Extract → sort → classify → score

pub use processor::{Assessment, CultureProcessor, ProcessError};
