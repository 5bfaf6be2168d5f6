//! Chat template rendering
//!
//! Uses the Jinja `chat_template` shipped in the model's
//! `tokenizer_config.json`. Models without one, or templates that fail to
//! render, fall back to plain ChatML.

use std::path::Path;

use minijinja::{context, Environment, Error as TemplateError, ErrorKind, State, Value as TemplateValue};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ModelError;
use crate::providers::ChatMessage;

const TEMPLATE_NAME: &str = "chat";

/// Renders role-tagged messages into a model-ready prompt
pub struct ChatTemplate {
    env: Option<Environment<'static>>,
    bos_token: Option<String>,
    eos_token: Option<String>,
}

impl std::fmt::Debug for ChatTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatTemplate")
            .field("jinja", &self.env.is_some())
            .field("bos_token", &self.bos_token)
            .field("eos_token", &self.eos_token)
            .finish()
    }
}

impl ChatTemplate {
    /// Built-in ChatML layout
    pub fn chatml() -> Self {
        Self {
            env: None,
            bos_token: None,
            eos_token: Some("<|im_end|>".to_string()),
        }
    }

    /// Load from `<model_dir>/tokenizer_config.json`, ChatML if absent
    pub fn from_model_dir(model_dir: &Path) -> Result<Self, ModelError> {
        let path = model_dir.join("tokenizer_config.json");
        if !path.is_file() {
            debug!(target: "iat::model", "No tokenizer_config.json, using ChatML");
            return Ok(Self::chatml());
        }
        let json = std::fs::read_to_string(&path)
            .map_err(|e| ModelError::load_failed(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Build from tokenizer_config.json contents
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let config: Value = serde_json::from_str(json)
            .map_err(|e| ModelError::load_failed(format!("Invalid tokenizer config JSON: {}", e)))?;

        let bos_token = special_token(&config, "bos_token");
        let eos_token = special_token(&config, "eos_token").or_else(|| Some("<|im_end|>".to_string()));

        let env = match template_source(&config) {
            Some(source) => Some(build_environment(source)?),
            None => None,
        };

        Ok(Self {
            env,
            bos_token,
            eos_token,
        })
    }

    pub fn eos_token(&self) -> Option<&str> {
        self.eos_token.as_deref()
    }

    /// Render `messages` followed by the assistant generation prompt
    pub fn render(&self, messages: &[ChatMessage]) -> String {
        let Some(env) = &self.env else {
            return format_chatml(messages);
        };

        let rendered = env.get_template(TEMPLATE_NAME).and_then(|tmpl| {
            tmpl.render(context!(
                messages => messages,
                add_generation_prompt => true,
                bos_token => self.bos_token.as_deref().unwrap_or(""),
                eos_token => self.eos_token.as_deref().unwrap_or(""),
            ))
        });

        match rendered {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(target: "iat::model", "Chat template render failed, using ChatML: {}", e);
                format_chatml(messages)
            }
        }
    }
}

fn build_environment(source: String) -> Result<Environment<'static>, ModelError> {
    let mut env = Environment::new();
    env.set_recursion_limit(100);
    env.add_function("raise_exception", |msg: String| -> Result<String, TemplateError> {
        Err(TemplateError::new(ErrorKind::InvalidOperation, msg))
    });
    env.set_unknown_method_callback(string_method);
    env.add_template_owned(TEMPLATE_NAME, source)
        .map_err(|e| ModelError::load_failed(format!("Invalid chat template syntax: {}", e)))?;
    Ok(env)
}

/// Python `str` methods that Hugging Face templates call on message content
fn string_method(
    _state: &State,
    value: &TemplateValue,
    method: &str,
    args: &[TemplateValue],
) -> Result<TemplateValue, TemplateError> {
    let Some(s) = value.as_str() else {
        return Err(TemplateError::from(ErrorKind::UnknownMethod));
    };
    let arg = args.first().and_then(TemplateValue::as_str);
    let required = || {
        arg.ok_or_else(|| {
            TemplateError::new(ErrorKind::InvalidOperation, format!("{} requires a string argument", method))
        })
    };

    let result = match method {
        "startswith" => TemplateValue::from(s.starts_with(required()?)),
        "endswith" => TemplateValue::from(s.ends_with(required()?)),
        "strip" => match arg {
            Some(chars) => TemplateValue::from(s.trim_matches(|c| chars.contains(c))),
            None => TemplateValue::from(s.trim()),
        },
        "lstrip" => match arg {
            Some(chars) => TemplateValue::from(s.trim_start_matches(|c| chars.contains(c))),
            None => TemplateValue::from(s.trim_start()),
        },
        "rstrip" => match arg {
            Some(chars) => TemplateValue::from(s.trim_end_matches(|c| chars.contains(c))),
            None => TemplateValue::from(s.trim_end()),
        },
        "split" => {
            let parts: Vec<TemplateValue> = match arg {
                Some(sep) => s.split(sep).map(TemplateValue::from).collect(),
                None => s.split_whitespace().map(TemplateValue::from).collect(),
            };
            TemplateValue::from(parts)
        }
        _ => return Err(TemplateError::from(ErrorKind::UnknownMethod)),
    };
    Ok(result)
}

/// `chat_template` is either a string or a list of named templates
fn template_source(config: &Value) -> Option<String> {
    match config.get("chat_template")? {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let named = |name: &str| {
                items.iter().find_map(|item| {
                    (item.get("name")?.as_str()? == name)
                        .then(|| item.get("template")?.as_str().map(str::to_string))
                        .flatten()
                })
            };
            named("default").or_else(|| {
                items
                    .first()
                    .and_then(|item| item.get("template")?.as_str().map(str::to_string))
            })
        }
        _ => None,
    }
}

/// Special tokens appear as plain strings or as `{"content": ...}` objects
fn special_token(config: &Value, key: &str) -> Option<String> {
    match config.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj.get("content")?.as_str().map(str::to_string),
        _ => None,
    }
}

/// ChatML layout used by Qwen models
pub fn format_chatml(messages: &[ChatMessage]) -> String {
    let mut formatted = String::new();
    for msg in messages {
        formatted.push_str(&format!("<|im_start|>{}\n{}<|im_end|>\n", msg.role, msg.content));
    }
    formatted.push_str("<|im_start|>assistant\n");
    formatted
}
