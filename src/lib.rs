// library crate for suprform
// the binary in main.rs is a thin CLI over these modules

pub mod binding;
pub mod cli;
pub mod conditions;
pub mod config;
pub mod form;
