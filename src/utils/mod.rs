pub mod client;
pub mod display;
pub mod file_operations;
pub mod parser;
pub mod prompt;
pub mod render;

pub use client::{ChatBackend, OpenAiClient};
pub use file_operations::*;
pub use parser::{parse_response, parse_response_with, ParseOptions};
pub use prompt::{build_prompt, ChatRequest};
pub use render::{render, OutputFormat};
