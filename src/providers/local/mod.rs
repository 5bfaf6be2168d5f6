//! Local Provider Module
//!
//! Provides local Qwen inference via Candle.

mod client;
mod template;

pub use client::{QwenLoader, QwenModel};
pub use template::{format_chatml, ChatTemplate};
