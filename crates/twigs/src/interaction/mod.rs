//! Terminal interaction
//!
//! `CliAdapter` implements the core `InteractionAdapter` trait on top of
//! dialoguer, indicatif and crossterm.

mod cli_adapter;

pub use cli_adapter::CliAdapter;
