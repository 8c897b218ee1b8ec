pub mod categorize;
pub mod convert;
pub mod diagnostics;
pub mod error;
pub mod models;
pub mod projection;
pub mod reader;
pub mod writers;
pub use convert::{convert, convert_file};
