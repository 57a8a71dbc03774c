//! # Command-Line Interface
//!
//! `show`, `examples`, `export` and `serve` subcommands over the walkthrough
//! pipeline.

use crate::config::{ConfigError, WalkthroughConfig};
use crate::export::{export_safetensors, ExportError};
use crate::pipeline::{build_tokenizer, Visualizer, EXAMPLE_TEXTS};
use crate::render;
use crate::stage::Stage;
use crate::ui::routes::run_server;
use crate::vocab::VocabError;
use clap::{Parser, Subcommand};
use log::info;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Step through a transformer forward pass, one stage at a time", long_about = None)]
pub struct CliArgs {
    /// JSON config file; missing fields keep their defaults.
    #[clap(long, global = true, value_parser)]
    pub config: Option<PathBuf>,
    /// JSON `{token: id}` vocabulary replacing the built-in one.
    #[clap(long, global = true, value_parser)]
    pub vocab: Option<PathBuf>,
    #[clap(long, global = true, value_parser)]
    pub max_seq_len: Option<usize>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print one stage, or all of them, for a piece of text.
    Show {
        #[clap(long, value_parser)]
        text: String,
        /// Stage to print; every stage when omitted.
        #[clap(long, value_enum)]
        stage: Option<Stage>,
        #[clap(long, value_parser)]
        seed: Option<u64>,
        /// Also list where the token at this position attends.
        #[clap(long, value_parser)]
        focus: Option<usize>,
        /// Emit the whole walkthrough as JSON instead of text.
        #[clap(long)]
        json: bool,
    },
    /// List the built-in example texts.
    Examples,
    /// Write the walkthrough tensors to a .safetensors file.
    Export {
        #[clap(long, value_parser)]
        text: String,
        #[clap(long, value_parser)]
        output: PathBuf,
        #[clap(long, value_parser)]
        seed: Option<u64>,
    },
    /// Run the web UI.
    Serve {
        #[clap(long, value_parser, default_value = "127.0.0.1")]
        host: String,
        #[clap(long, value_parser, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error")]
    Config(#[from] ConfigError),
    #[error("vocabulary error")]
    Vocab(#[from] VocabError),
    #[error("export error")]
    Export(#[from] ExportError),
    #[error("failed to encode JSON output")]
    Json(#[from] serde_json::Error),
    #[error("IO error")]
    Io(#[from] io::Error),
    #[error("focus position {position} is outside the sequence (length {len})")]
    FocusOutOfRange { position: usize, len: usize },
}

/// Config file (or defaults) with the command-line overrides applied.
pub fn resolve_config(args: &CliArgs) -> Result<WalkthroughConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => WalkthroughConfig::load(path)?,
        None => WalkthroughConfig::default(),
    };
    if let Some(vocab) = &args.vocab {
        config.vocab_path = Some(vocab.clone());
    }
    if let Some(max_seq_len) = args.max_seq_len {
        config.max_seq_len = max_seq_len;
    }
    config.validate()?;
    Ok(config)
}

pub fn run_cli() -> Result<(), CliError> {
    let args = CliArgs::parse();
    let stdout = io::stdout();
    run(args, &mut stdout.lock())
}

/// Executes `args`, writing user-facing output to `out`.
pub fn run<W: Write>(args: CliArgs, out: &mut W) -> Result<(), CliError> {
    let config = resolve_config(&args)?;
    let tokenizer = build_tokenizer(&config)?;

    match args.command {
        Command::Show { text, stage, seed, focus, json } => {
            let mut viz = session(config, tokenizer, seed);
            let walkthrough = viz.update(&text).clone();
            if let Some(position) = focus {
                if position >= walkthrough.sequence.len() {
                    return Err(CliError::FocusOutOfRange { position, len: walkthrough.sequence.len() });
                }
            }

            if json {
                serde_json::to_writer_pretty(&mut *out, &walkthrough.report())?;
                writeln!(out)?;
                return Ok(());
            }

            match stage {
                Some(stage) => write!(out, "{}", render::stage(&walkthrough, stage))?,
                None => write!(out, "{}", render::walkthrough(&walkthrough))?,
            }
            if let Some(position) = focus {
                if let Some(f) = walkthrough.focus(position) {
                    writeln!(out)?;
                    write!(out, "{}", render::focus(&f, walkthrough.sequence.tokens()))?;
                }
                if let Some(views) = viz.head_views(position) {
                    writeln!(out)?;
                    write!(out, "{}", render::head_views(&views))?;
                }
            }
        }
        Command::Examples => {
            for (i, text) in EXAMPLE_TEXTS.iter().enumerate() {
                writeln!(out, "{}. {}", i + 1, text)?;
            }
        }
        Command::Export { text, output, seed } => {
            let mut viz = session(config, tokenizer, seed);
            let walkthrough = viz.update(&text);
            export_safetensors(walkthrough, &output)?;
            writeln!(out, "Wrote {} tokens to {}", walkthrough.sequence.len(), output.display())?;
        }
        Command::Serve { host, port } => {
            info!("Serving walkthrough UI (max_seq_len = {})", config.max_seq_len);
            actix_web::rt::System::new().block_on(run_server(config, tokenizer, &host, port))?;
        }
    }
    Ok(())
}

fn session(config: WalkthroughConfig, tokenizer: crate::tokenizer::WordPieceTokenizer, seed: Option<u64>) -> Visualizer {
    match seed {
        Some(seed) => Visualizer::with_seed(config, tokenizer, seed),
        None => Visualizer::new(config, tokenizer),
    }
}
