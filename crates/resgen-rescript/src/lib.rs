pub mod components;
pub mod endpoints;
pub mod generator;
pub mod keywords;
pub mod schemas;
pub mod types;
pub mod unions;

pub use generator::{generate, generate_with_forks, RescriptGenerator};
