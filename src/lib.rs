//! Generate structured test cases from user stories with an LLM.
//!
//! The pipeline is: [`utils::build_prompt`] builds a chat request, a
//! [`utils::ChatBackend`] answers it, [`utils::parse_response`] turns the reply
//! into [`models::TestCase`] records, and [`utils::render`] formats them.

pub mod commands;
pub mod config;
pub mod error;
pub mod generator;
pub mod models;
pub mod utils;

pub use error::{GeneratorError, Result};
