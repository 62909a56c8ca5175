//! Expression compiler and data loading for effect holders.

mod effect_dsl;
pub mod error;
pub mod load;
pub mod schema;

pub use effect_dsl::{compile_activation, compile_effect};
pub use error::*;
pub use load::*;
pub use schema::*;
