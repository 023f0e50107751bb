//! Generative AI collaborators

pub mod gemini;

pub use gemini::{GeminiClient, GeminiConfig};
