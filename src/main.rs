//! `cartoonize` CLI - turn photos into cartoons.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cartoonize::image::{PathSource, PromptSource};
use cartoonize::model::ModelStore;
use cartoonize::notify::ConsoleNotifier;
use cartoonize::{Action, Config, Controller, ModelVariant};

/// Turn photos into cartoons with a pre-trained White-box CartoonGAN model.
#[derive(Parser, Debug)]
#[command(name = "cartoonize")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    options: Options,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Options {
    /// Directory holding the ONNX model files.
    #[arg(long, global = true, value_name = "DIR")]
    models_dir: Option<PathBuf>,

    /// Base URL to download missing model files from.
    #[arg(long, global = true, value_name = "URL")]
    model_url: Option<String>,

    /// Model build used for conversion.
    #[arg(long, global = true, value_enum, default_value_t = ModelVariant::Int8)]
    variant: ModelVariant,

    /// Pictures directory; saved images go to its CartoonImages subdirectory.
    #[arg(long, global = true, value_name = "DIR")]
    pictures_dir: Option<PathBuf>,

    /// Output JPEG quality (1-100).
    #[arg(short, long, global = true, default_value = "100", value_name = "INT")]
    quality: u8,

    /// Model input size in pixels.
    #[arg(long, global = true, default_value = "512", value_name = "INT")]
    size: u32,

    /// Command run with each saved file to register it with a media index.
    #[arg(long, global = true, value_name = "CMD")]
    media_command: Option<String>,

    /// Write the preview to this PNG file.
    #[arg(long, global = true, value_name = "PATH")]
    preview: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Select an image, cartoonize it and save the result.
    Run {
        /// Input image path.
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// How many times to apply the model.
        #[arg(long, default_value = "1", value_name = "INT")]
        passes: u32,

        /// Do not save the result.
        #[arg(long)]
        no_save: bool,
    },
    /// Interactive session: select, convert and save one command at a time.
    Shell,
    /// List model variants and whether their files are present.
    Models,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.options.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("cartoonize={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&cli) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(cli: &Cli) -> Result<()> {
    let config = build_config(&cli.options);

    match &cli.command {
        Command::Run {
            input,
            passes,
            no_save,
        } => run_once(config, input, *passes, *no_save),
        Command::Shell => shell(config),
        Command::Models => list_models(&config),
    }
}

fn build_config(options: &Options) -> Config {
    let defaults = Config::default();

    Config {
        models_dir: options
            .models_dir
            .clone()
            .unwrap_or_else(|| defaults.models_dir.clone()),
        model_base_url: options.model_url.clone(),
        variant: options.variant,
        model_input_size: options.size,
        jpeg_quality: options.quality,
        pictures_dir: options
            .pictures_dir
            .clone()
            .or_else(|| defaults.pictures_dir.clone()),
        media_scan_command: options.media_command.clone(),
        preview_path: options.preview.clone(),
        ..defaults
    }
}

fn run_once(config: Config, input: &Path, passes: u32, no_save: bool) -> Result<()> {
    // Validate input file exists
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let mut controller = Controller::new(config).context("Failed to initialize pipeline")?;

    controller
        .select(&mut PathSource::new(input))
        .context("Failed to load image")?;

    for pass in 1..=passes {
        tracing::info!("Cartoonizing (pass {pass}/{passes})...");
        controller.convert().context("Failed to cartoonize image")?;
        controller.preview_mut().pump();
    }

    if no_save {
        return Ok(());
    }

    let saved = controller.save().context("Failed to save image")?;
    println!("Successfully processed {} -> {}", input.display(), saved.display());

    Ok(())
}

const SHELL_HELP: &str = "\
commands:
  select [PATH]  pick an image (no path: prompt, empty answer cancels)
  convert        cartoonize the displayed image
  save           save the displayed image
  state          show the pipeline state
  help           show this help
  quit           exit";

fn shell(config: Config) -> Result<()> {
    let mut controller = Controller::new(config).context("Failed to initialize pipeline")?;
    let mut notifier = ConsoleNotifier;
    let stdin = io::stdin();

    println!("{SHELL_HELP}");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let rest: Vec<&str> = words.collect();

        match command {
            "select" if rest.is_empty() => {
                let mut picker = PromptSource::new(stdin.lock(), io::stdout());
                controller.handle(Action::Select(&mut picker), &mut notifier);
            }
            "select" => {
                let mut picker = PathSource::new(rest.join(" "));
                controller.handle(Action::Select(&mut picker), &mut notifier);
            }
            "convert" => {
                controller.handle(Action::Convert, &mut notifier);
            }
            "save" => {
                controller.handle(Action::Save, &mut notifier);
            }
            "state" => println!("{}", controller.state()),
            "help" => println!("{SHELL_HELP}"),
            "quit" | "exit" => break,
            other => println!("unknown command {other:?}, try `help`"),
        }
    }

    Ok(())
}

fn list_models(config: &Config) -> Result<()> {
    let store = ModelStore::new(&config.models_dir, config.model_base_url.clone())
        .context("Failed to open model directory")?;

    println!("models in {}:", store.dir().display());
    for variant in ModelVariant::ALL {
        let marker = if store.is_cached(variant) { "present" } else { "missing" };
        let default = if variant == config.variant { " (selected)" } else { "" };
        println!("  {:<5} {:<32} {marker}{default}", variant.label(), variant.filename());
    }

    Ok(())
}
