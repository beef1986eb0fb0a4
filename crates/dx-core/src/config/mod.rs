pub mod context;
pub mod settings;

pub use settings::*;
