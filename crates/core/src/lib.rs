//! Attribute rules engine. Keep this crate free of IO and string parsing.

pub mod activation;
pub mod attributes;
pub mod config;
pub mod effects;
pub mod engine;
pub mod error;
pub mod holder;
pub mod rules;

pub use activation::*;
pub use attributes::*;
pub use config::*;
pub use effects::*;
pub use engine::*;
pub use error::*;
pub use holder::*;
pub use rules::*;
