//! Command-line host for the IAT nodes.
//!
//! Lists node schemas, runs a node with JSON inputs, or calls the Qwen
//! translator and prompt optimizer directly.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;

use iat_nodes::bitmap::ImageTensor;
use iat_nodes::setup::paths::default_plugin_root;
use iat_nodes::text::{PromptOptimizer, Translator};
use iat_nodes::{init_logging, IatResult, NodeValue, Plugin};

#[derive(Parser, Debug)]
#[command(name = "iat-nodes")]
#[command(about = "IAT image and text nodes with a local Qwen translator")]
#[command(version)]
struct CliArgs {
    /// Plugin root holding config.yaml and the model directory
    #[arg(long, global = true, env = "IAT_PLUGIN_ROOT")]
    plugin_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every node schema as JSON
    List,
    /// Run one node
    Run {
        /// Node class key, e.g. "ImageSize by IAT"
        class_name: String,
        /// Inputs as a JSON object; missing keys take their defaults
        #[arg(long, default_value = "{}")]
        inputs: String,
        /// Write image outputs as PNG files into this directory
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Translate Chinese or Japanese text to English
    Translate { text: String },
    /// Rewrite an edit request as a Flux Kontext prompt
    Optimize { text: String },
}

fn main() -> ExitCode {
    init_logging();
    let args = CliArgs::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(target: "iat::cli", "{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> IatResult<()> {
    let root = args.plugin_root.unwrap_or_else(default_plugin_root);
    let plugin = Plugin::load(root);

    match args.command {
        Command::List => {
            let schemas = plugin.registry().schemas();
            println!("{}", serde_json::to_string_pretty(&schemas)?);
        }
        Command::Run {
            class_name,
            inputs,
            out_dir,
        } => {
            let json: serde_json::Value = serde_json::from_str(&inputs)?;
            let outputs = plugin
                .registry()
                .execute_json(plugin.context(), &class_name, &json)?;
            for (index, value) in outputs.iter().enumerate() {
                print_output(index, value, out_dir.as_deref())?;
            }
        }
        Command::Translate { text } => {
            let translator = Translator::new(plugin.context().models().clone());
            let output = translator
                .translate(&text)
                .unwrap_or_else(|e| e.host_message("翻译失败"));
            println!("{}", output);
        }
        Command::Optimize { text } => {
            let optimizer = PromptOptimizer::new(plugin.context().models().clone());
            let output = optimizer
                .optimize_prompt(&text)
                .unwrap_or_else(|e| e.host_message("优化失败"));
            println!("{}", output);
        }
    }
    Ok(())
}

fn print_output(index: usize, value: &NodeValue, out_dir: Option<&Path>) -> IatResult<()> {
    match value {
        NodeValue::Image(image) => {
            let [b, h, w, c] = image.shape();
            match out_dir {
                Some(dir) => {
                    let path = save_png(image, dir, index)?;
                    println!("[{}] IMAGE {}x{}x{}x{} -> {}", index, b, h, w, c, path.display());
                }
                None => println!("[{}] IMAGE {}x{}x{}x{}", index, b, h, w, c),
            }
        }
        NodeValue::String(s) => println!("[{}] STRING {}", index, s),
        NodeValue::Int(v) => println!("[{}] INT {}", index, v),
        NodeValue::Float(v) => println!("[{}] FLOAT {}", index, v),
        NodeValue::Boolean(v) => println!("[{}] BOOLEAN {}", index, v),
    }
    Ok(())
}

fn save_png(image: &ImageTensor, dir: &Path, index: usize) -> IatResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("output_{}.png", index));
    let frame = image.first_frame()?;
    frame.save(&path)?;
    Ok(path)
}
