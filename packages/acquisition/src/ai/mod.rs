//! Text-generation provider implementations.

pub mod openai;

pub use openai::OpenAiGenerator;
