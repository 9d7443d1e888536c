pub mod error;
pub mod models;
pub mod prompt_composer;
pub mod services;
pub mod session;
pub mod technique;

pub use error::{LabError, LabResult};
