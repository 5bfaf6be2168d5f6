//! Text Transformation Pipeline
//!
//! Language detection, prompt construction, generation through the cached
//! model, and response cleanup for the translator and prompt optimizer.

pub mod language;
pub mod parser;
pub mod prompts;
pub mod transform;


pub use language::{detect_language, Language};
pub use parser::extract_fenced_block;
pub use transform::{PromptOptimizer, Translator};
