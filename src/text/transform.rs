//! Translation and prompt rewriting on top of the cached model

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::TextError;
use crate::providers::{ChatMessage, GenerationParams, MAX_NEW_TOKENS};
use crate::state::ModelProvider;
use crate::text::language::{detect_language, Language};
use crate::text::parser::extract_fenced_block;
use crate::text::prompts::{
    optimizer_user_prompt, translator_user_prompt, KONTEXT_SYSTEM_PROMPT, TRANSLATOR_GUIDANCE,
    TRANSLATOR_SYSTEM_PROMPT,
};

/// Sampling temperature for prompt rewriting
pub const OPTIMIZER_TEMPERATURE: f64 = 0.8;

/// Chinese/Japanese → English translation
#[derive(Clone)]
pub struct Translator {
    models: Arc<ModelProvider>,
}

impl Translator {
    pub fn new(models: Arc<ModelProvider>) -> Self {
        Self { models }
    }

    /// Translate `text` to English.
    ///
    /// English input comes back unchanged and unclassifiable input gets a
    /// fixed guidance string; both are `Ok`.
    pub fn translate(&self, text: &str) -> Result<String, TextError> {
        let model = self.models.get_model().map_err(TextError::from)?;

        let lang = detect_language(text, Language::None);
        match lang {
            Language::None => return Ok(TRANSLATOR_GUIDANCE.to_string()),
            Language::English => return Ok(text.to_string()),
            Language::Chinese | Language::Japanese => {}
        }
        debug!(target: "iat::text", "Translating {} text ({} chars)", lang, text.chars().count());

        let messages = [
            ChatMessage::system(TRANSLATOR_SYSTEM_PROMPT),
            ChatMessage::user(translator_user_prompt(lang.code(), text)),
        ];
        let response = model
            .generate(&messages, &GenerationParams::greedy(MAX_NEW_TOKENS))
            .map_err(|e| {
                warn!(target: "iat::text", "Translation failed: {}", e);
                TextError::from(e)
            })?;
        Ok(response.trim().to_string())
    }
}

/// Rewrites free-form edit requests into Flux Kontext style English prompts
#[derive(Clone)]
pub struct PromptOptimizer {
    models: Arc<ModelProvider>,
}

impl PromptOptimizer {
    pub fn new(models: Arc<ModelProvider>) -> Self {
        Self { models }
    }

    /// Rewrite `text` as an image-editing prompt.
    ///
    /// The detected language only phrases the request; every input is
    /// sent to the model.
    pub fn optimize_prompt(&self, text: &str) -> Result<String, TextError> {
        let model = self.models.get_model().map_err(TextError::from)?;

        let lang = detect_language(text, Language::English);
        debug!(target: "iat::text", "Optimizing {} prompt ({} chars)", lang, text.chars().count());

        let messages = [
            ChatMessage::system(KONTEXT_SYSTEM_PROMPT),
            ChatMessage::user(optimizer_user_prompt(lang.code(), text)),
        ];
        let params = GenerationParams::sampled(MAX_NEW_TOKENS, OPTIMIZER_TEMPERATURE);
        let response = model.generate(&messages, &params).map_err(|e| {
            warn!(target: "iat::text", "Prompt optimization failed: {}", e);
            TextError::from(e)
        })?;

        Ok(extract_fenced_block(&response))
    }
}
