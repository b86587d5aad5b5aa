pub mod catalog;
pub mod config;
pub mod detect;
pub mod error;
pub mod framework;
pub mod ident;
pub mod io;
pub mod merge;
pub mod paths;
pub mod pipeline;
pub mod plan;
pub mod project;
pub mod prompt;
pub mod resolve;
pub mod scaffold;
pub mod template;

pub use error::{Result, ScaffoldError};
