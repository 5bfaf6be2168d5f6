//! Local Qwen model using Candle ML Framework
//!
//! Loads a Hugging Face style Qwen2 checkpoint (config.json, safetensors
//! shards, tokenizer.json, tokenizer_config.json) and runs chat generation.
//! Supports CUDA (NVIDIA), Metal (Apple), and CPU fallback.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::qwen2::{Config, ModelForCausalLM};
use parking_lot::Mutex;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::template::ChatTemplate;
use crate::error::ModelError;
use crate::hardware::DeviceKind;
use crate::providers::{ChatMessage, GenerationParams, ModelLoader, Sampling, TextGenerator};

/// Loaded model and tokenizer
struct LoadedModel {
    model: ModelForCausalLM,
    tokenizer: Tokenizer,
    template: ChatTemplate,
    device: Device,
    eos_token_ids: Vec<u32>,
    rng: StdRng,
}

/// Qwen causal LM with its tokenizer, loaded together so neither exists
/// without the other
pub struct QwenModel {
    name: String,
    inner: Mutex<LoadedModel>,
}

impl QwenModel {
    /// Synchronous model loading
    pub fn load(model_dir: &Path, device_kind: DeviceKind, seed: u64) -> Result<Self, ModelError> {
        let device = device_kind.open()?;
        debug!(target: "iat::model", "Using device: {:?}", device);

        let config_path = model_dir.join("config.json");
        let config_text = std::fs::read_to_string(&config_path)
            .map_err(|e| ModelError::load_failed(format!("Failed to read {}: {}", config_path.display(), e)))?;
        let config: Config = serde_json::from_str(&config_text)
            .map_err(|e| ModelError::load_failed(format!("Failed to parse model config: {}", e)))?;

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| ModelError::load_failed(format!("Failed to load tokenizer: {}", e)))?;
        let template = ChatTemplate::from_model_dir(model_dir)?;

        let weight_files = find_weight_files(model_dir)?;
        debug!(target: "iat::model", "Weight files: {:?}", weight_files);

        let dtype = if device.is_cuda() { DType::BF16 } else { DType::F32 };
        // Safety: the shards are memory-mapped read-only and must not be
        // modified while the model is alive.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&weight_files, dtype, &device)
                .map_err(|e| ModelError::load_failed(format!("Failed to load safetensors: {}", e)))?
        };
        let model = ModelForCausalLM::new(&config, vb)
            .map_err(|e| ModelError::load_failed(format!("Failed to build model: {}", e)))?;

        let eos_token_ids = collect_eos_ids(model_dir, &tokenizer, &template);
        if eos_token_ids.is_empty() {
            return Err(ModelError::load_failed("No end-of-sequence token found in tokenizer"));
        }

        let name = model_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "qwen".to_string());

        info!(target: "iat::model", "Model weights loaded: {} ({} layers)", name, config.num_hidden_layers);

        Ok(Self {
            name,
            inner: Mutex::new(LoadedModel {
                model,
                tokenizer,
                template,
                device,
                eos_token_ids,
                rng: StdRng::seed_from_u64(seed),
            }),
        })
    }
}

impl TextGenerator for QwenModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, messages: &[ChatMessage], params: &GenerationParams) -> Result<String, ModelError> {
        let mut loaded = self.inner.lock();
        let prompt = loaded.template.render(messages);
        loaded.generate_sync(&prompt, params)
    }
}

impl LoadedModel {
    /// Generate text (blocking). Returns only the decoded new tokens.
    fn generate_sync(&mut self, prompt: &str, params: &GenerationParams) -> Result<String, ModelError> {
        let encoding = self
            .tokenizer
            .encode(prompt, false)
            .map_err(|e| ModelError::inference_failed(format!("Tokenization failed: {}", e)))?;
        let generated = self.generate_ids(encoding.get_ids().to_vec(), params)?;

        let text = self
            .tokenizer
            .decode(&generated, true)
            .map_err(|e| ModelError::inference_failed(format!("Decoding failed: {}", e)))?;
        Ok(text.trim().to_string())
    }

    /// Token loop over the KV cache. The returned ids exclude the prompt
    /// and the stop token.
    fn generate_ids(&mut self, prompt_ids: Vec<u32>, params: &GenerationParams) -> Result<Vec<u32>, ModelError> {
        if prompt_ids.is_empty() {
            return Err(ModelError::inference_failed("Prompt encoded to zero tokens"));
        }
        self.model.clear_kv_cache();

        // Single sequence: no padding, so the EOS-as-pad convention reduces
        // to stopping at EOS.
        let mut generated: Vec<u32> = Vec::new();
        let mut input = prompt_ids;
        let mut offset = 0;

        for _ in 0..params.max_new_tokens {
            let logits = self
                .next_logits(&input, offset)
                .map_err(|e| ModelError::inference_failed(format!("Forward pass failed: {}", e)))?;
            offset += input.len();

            let next_token = self
                .sample(&logits, params.sampling)
                .map_err(|e| ModelError::inference_failed(format!("Sampling failed: {}", e)))?;

            if self.eos_token_ids.contains(&next_token) {
                break;
            }
            generated.push(next_token);
            input = vec![next_token];
        }

        debug!(target: "iat::model", "Generated {} tokens", generated.len());
        Ok(generated)
    }

    /// Logits for the position after `input`, as a 1-D f32 tensor
    fn next_logits(&mut self, input: &[u32], offset: usize) -> candle_core::Result<Tensor> {
        let input = Tensor::new(input, &self.device)?.unsqueeze(0)?;
        let logits = self.model.forward(&input, offset)?;
        logits.squeeze(0)?.squeeze(0)?.to_dtype(DType::F32)
    }

    fn sample(&mut self, logits: &Tensor, sampling: Sampling) -> candle_core::Result<u32> {
        match sampling {
            Sampling::Temperature(temperature) if temperature > 0.0 => {
                let scaled = (logits / temperature)?;
                let probs = candle_nn::ops::softmax(&scaled, 0)?;
                let probs: Vec<f32> = probs.to_vec1()?;
                let dist = WeightedIndex::new(&probs).map_err(|e| candle_core::Error::Msg(e.to_string()))?;
                Ok(dist.sample(&mut self.rng) as u32)
            }
            _ => logits.argmax(0)?.to_scalar::<u32>(),
        }
    }
}

/// Safetensors shards from the index file, or every `.safetensors` file
fn find_weight_files(model_dir: &Path) -> Result<Vec<PathBuf>, ModelError> {
    let index_path = model_dir.join("model.safetensors.index.json");
    if index_path.is_file() {
        let text = std::fs::read_to_string(&index_path)
            .map_err(|e| ModelError::load_failed(format!("Failed to read weight index: {}", e)))?;
        let index: Value = serde_json::from_str(&text)
            .map_err(|e| ModelError::load_failed(format!("Invalid weight index: {}", e)))?;
        let weight_map = index
            .get("weight_map")
            .and_then(Value::as_object)
            .ok_or_else(|| ModelError::load_failed("Weight index has no weight_map"))?;

        let shards: BTreeSet<&str> = weight_map.values().filter_map(Value::as_str).collect();
        return Ok(shards.into_iter().map(|shard| model_dir.join(shard)).collect());
    }

    let single = model_dir.join("model.safetensors");
    if single.is_file() {
        return Ok(vec![single]);
    }

    let entries = std::fs::read_dir(model_dir)
        .map_err(|e| ModelError::load_failed(format!("Failed to list model directory: {}", e)))?;
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.extension().map_or(false, |ext| ext == "safetensors"))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(ModelError::load_failed(format!(
            "No safetensors weights found in {}",
            model_dir.display()
        )));
    }
    Ok(files)
}

/// End-of-sequence ids from generation_config.json, the tokenizer config,
/// and the usual Qwen stop tokens
fn collect_eos_ids(model_dir: &Path, tokenizer: &Tokenizer, template: &ChatTemplate) -> Vec<u32> {
    let mut ids: Vec<u32> = Vec::new();

    let generation_config = std::fs::read_to_string(model_dir.join("generation_config.json"))
        .ok()
        .and_then(|text| serde_json::from_str::<Value>(&text).ok());
    if let Some(eos) = generation_config.as_ref().and_then(|cfg| cfg.get("eos_token_id")) {
        match eos {
            Value::Number(n) => ids.extend(n.as_u64().map(|id| id as u32)),
            Value::Array(items) => ids.extend(items.iter().filter_map(Value::as_u64).map(|id| id as u32)),
            _ => {}
        }
    }

    let named = template.eos_token().into_iter().chain(["<|im_end|>", "<|endoftext|>"]);
    for token in named {
        if let Some(id) = tokenizer.token_to_id(token) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids
}

/// Default [`ModelLoader`] building a [`QwenModel`]
#[derive(Debug, Clone, Copy, Default)]
pub struct QwenLoader;

impl ModelLoader for QwenLoader {
    fn load(&self, model_dir: &Path, device: DeviceKind, seed: u64) -> Result<Arc<dyn TextGenerator>, ModelError> {
        let model = QwenModel::load(model_dir, device, seed)?;
        Ok(Arc::new(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_nn::Activation;
    use std::collections::HashMap;
    use tempfile::tempdir;
    use tokenizers::models::wordlevel::WordLevel;
    use tokenizers::pre_tokenizers::whitespace::Whitespace;

    const VOCAB: usize = 16;

    /// Whitespace-split vocabulary: w0..w15 with a few named slots
    fn tiny_tokenizer() -> Tokenizer {
        let mut vocab: HashMap<String, u32> = (0..VOCAB as u32).map(|i| (format!("w{}", i), i)).collect();
        vocab.retain(|_, id| !matches!(*id, 5 | 13 | 14));
        vocab.insert("hello".into(), 5);
        vocab.insert("<|im_end|>".into(), 13);
        vocab.insert("[UNK]".into(), 14);

        let model = WordLevel::builder()
            .vocab(vocab)
            .unk_token("[UNK]".into())
            .build()
            .unwrap();
        let mut tokenizer = Tokenizer::new(model);
        tokenizer.with_pre_tokenizer(Some(Whitespace::default()));
        tokenizer
    }

    fn tiny_config() -> Config {
        Config {
            vocab_size: VOCAB,
            hidden_size: 8,
            intermediate_size: 16,
            num_hidden_layers: 2,
            num_attention_heads: 2,
            num_key_value_heads: 1,
            max_position_embeddings: 128,
            sliding_window: 128,
            max_window_layers: 2,
            tie_word_embeddings: true,
            rope_theta: 10_000.0,
            rms_norm_eps: 1e-6,
            use_sliding_window: false,
            hidden_act: Activation::Silu,
        }
    }

    fn tiny_model(eos_token_ids: Vec<u32>, seed: u64) -> LoadedModel {
        let device = Device::Cpu;
        let vb = VarBuilder::zeros(DType::F32, &device);
        LoadedModel {
            model: ModelForCausalLM::new(&tiny_config(), vb).unwrap(),
            tokenizer: tiny_tokenizer(),
            template: ChatTemplate::chatml(),
            device,
            eos_token_ids,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[test]
    fn test_generation_respects_token_budget() {
        let mut model = tiny_model(vec![], 42);
        let prompt = vec![1, 2, 3, 4, 5, 6];

        let ids = model.generate_ids(prompt.clone(), &GenerationParams::greedy(4)).unwrap();
        assert_eq!(ids.len(), 4);

        let ids = model.generate_ids(prompt, &GenerationParams::greedy(0)).unwrap();
        assert!(ids.is_empty());
    }

    #[test]
    fn test_generation_stops_at_eos() {
        let mut model = tiny_model(vec![], 42);
        let first = model.generate_ids(vec![1, 2], &GenerationParams::greedy(3)).unwrap();

        // The greedy token becomes the stop token: nothing is emitted
        model.eos_token_ids = vec![first[0]];
        let ids = model.generate_ids(vec![1, 2], &GenerationParams::greedy(3)).unwrap();
        assert!(ids.is_empty());

        let mut model = tiny_model((0..VOCAB as u32).collect(), 7);
        let ids = model
            .generate_ids(vec![1, 2], &GenerationParams::sampled(8, 0.8))
            .unwrap();
        assert!(ids.is_empty());
    }

    #[test]
    fn test_greedy_is_deterministic() {
        let mut model = tiny_model(vec![], 42);
        let a = model.generate_ids(vec![3, 1, 4], &GenerationParams::greedy(5)).unwrap();
        let b = model.generate_ids(vec![3, 1, 4], &GenerationParams::greedy(5)).unwrap();
        assert_eq!(a, b);
        assert!(a.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let params = GenerationParams::sampled(8, 0.8);
        let a = tiny_model(vec![], 7).generate_ids(vec![1, 2, 3], &params).unwrap();
        let b = tiny_model(vec![], 7).generate_ids(vec![1, 2, 3], &params).unwrap();
        assert_eq!(a.len(), 8);
        assert_eq!(a, b);
        assert!(a.iter().all(|id| (*id as usize) < VOCAB));
    }

    #[test]
    fn test_empty_prompt_is_inference_error() {
        let mut model = tiny_model(vec![], 42);
        let err = model.generate_ids(vec![], &GenerationParams::greedy(4)).unwrap_err();
        assert_eq!(err.kind, crate::error::ModelErrorKind::InferenceFailed);
    }

    #[test]
    fn test_generate_returns_only_new_text() {
        let qwen = QwenModel {
            name: "tiny".into(),
            inner: Mutex::new(tiny_model(vec![13], 42)),
        };
        let messages = [ChatMessage::system("w1 w2"), ChatMessage::user("hello hello hello")];

        let out = qwen.generate(&messages, &GenerationParams::greedy(4)).unwrap();
        assert_eq!(out.split_whitespace().count(), 4);
        assert!(!out.contains("hello"));
        assert!(!out.contains("w1 w2"));
    }

    #[test]
    fn test_collect_eos_ids_merges_sources() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("generation_config.json"), r#"{"eos_token_id": [7, 9]}"#).unwrap();

        let ids = collect_eos_ids(dir.path(), &tiny_tokenizer(), &ChatTemplate::chatml());
        assert_eq!(ids, vec![7, 9, 13]);

        let empty = tempdir().unwrap();
        std::fs::write(empty.path().join("generation_config.json"), r#"{"eos_token_id": 13}"#).unwrap();
        assert_eq!(collect_eos_ids(empty.path(), &tiny_tokenizer(), &ChatTemplate::chatml()), vec![13]);
    }

    #[test]
    fn test_weight_files_from_index() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("model.safetensors.index.json"),
            r#"{"weight_map": {"a": "model-00002-of-00002.safetensors", "b": "model-00001-of-00002.safetensors", "c": "model-00001-of-00002.safetensors"}}"#,
        )
        .unwrap();

        let files = find_weight_files(dir.path()).unwrap();
        assert_eq!(
            files,
            vec![
                dir.path().join("model-00001-of-00002.safetensors"),
                dir.path().join("model-00002-of-00002.safetensors"),
            ]
        );
    }

    #[test]
    fn test_weight_files_single_and_missing() {
        let dir = tempdir().unwrap();
        assert!(find_weight_files(dir.path()).is_err());

        std::fs::write(dir.path().join("model.safetensors"), b"").unwrap();
        assert_eq!(
            find_weight_files(dir.path()).unwrap(),
            vec![dir.path().join("model.safetensors")]
        );
    }

    #[test]
    fn test_load_empty_directory_fails_cleanly() {
        let dir = tempdir().unwrap();
        let err = QwenLoader.load(dir.path(), DeviceKind::Cpu, 42).err().unwrap();
        assert_eq!(err.kind, crate::error::ModelErrorKind::LoadFailed);
    }
}
