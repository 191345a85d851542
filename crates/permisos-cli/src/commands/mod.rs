//! Subcommand implementations

pub mod generate;
pub mod inspect;
pub mod transform;
