//! Configuration module

mod data;
mod settings;

pub use data::{load_context, read_file, DataFormat};
pub use settings::RenderConfig;
