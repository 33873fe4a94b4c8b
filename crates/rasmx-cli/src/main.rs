//! rasmx CLI
//!
//! BLAKE3 digests of files, stdin and strings, plus a throughput benchmark.

mod bench;
mod config;
mod progress;

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use rasmx_blake3::{Digest, Engine, Hasher};

use bench::BenchOptions;
use config::Config;

/// rasmx - BLAKE3 hashing
#[derive(Parser)]
#[command(name = "rasmx")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print BLAKE3 digests
    Hash {
        /// Files to hash; `-` or nothing reads stdin
        files: Vec<PathBuf>,

        /// Hash this string instead of reading input
        #[arg(short, long, conflicts_with = "files")]
        string: Option<String>,

        /// Hash on the engine's worker pool and await the result
        #[arg(long = "async")]
        use_async: bool,

        /// Feed input through the streaming hasher instead of reading it whole
        #[arg(long, conflicts_with = "use_async")]
        stream: bool,

        /// Write the 32 raw digest bytes instead of hex
        #[arg(long)]
        raw: bool,
    },

    /// Measure hashing throughput
    Bench {
        /// Size of the random buffer in MiB
        #[arg(long, default_value_t = 100)]
        size_mb: usize,

        /// Iterations of the small-input loop
        #[arg(long, default_value_t = 100_000)]
        iterations: u64,
    },

    /// Show the effective configuration
    Config {
        /// Write the default configuration to the config path
        #[arg(long)]
        init: bool,
    },
}

/// One thing to hash
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Stdin,
    File(PathBuf),
    Text(String),
}

impl Input {
    fn name(&self) -> String {
        match self {
            Self::Stdin => "-".to_string(),
            Self::File(path) => path.display().to_string(),
            Self::Text(text) => format!("{text:?}"),
        }
    }

    fn read_all(&self) -> io::Result<Vec<u8>> {
        match self {
            Self::Stdin => {
                let mut data = Vec::new();
                io::stdin().lock().read_to_end(&mut data)?;
                Ok(data)
            }
            Self::File(path) => std::fs::read(path),
            Self::Text(text) => Ok(text.clone().into_bytes()),
        }
    }

    fn stream_into(&self, hasher: &mut Hasher) -> io::Result<u64> {
        match self {
            Self::Stdin => hasher.update_reader(io::stdin().lock()),
            Self::File(path) => hasher.update_reader(File::open(path)?),
            Self::Text(text) => hasher.update_reader(text.as_bytes()),
        }
    }
}

fn collect_inputs(files: Vec<PathBuf>, string: Option<String>) -> Vec<Input> {
    if let Some(text) = string {
        return vec![Input::Text(text)];
    }
    if files.is_empty() {
        return vec![Input::Stdin];
    }
    files
        .into_iter()
        .map(|path| {
            if path.as_os_str() == "-" {
                Input::Stdin
            } else {
                Input::File(path)
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default()?,
    };

    // Validate configuration
    config.validate()?;

    // Initialize logging (stderr, so digests on stdout stay clean)
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.to_lowercase()
    };
    tracing_subscriber::fmt()
        .with_env_filter(level.as_str())
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Hash {
            files,
            string,
            use_async,
            stream,
            raw,
        } => {
            let engine = Engine::new(config.engine.clone())?;
            let inputs = collect_inputs(files, string);
            hash_inputs(&engine, &inputs, use_async, stream, raw).await?;
        }
        Commands::Bench {
            size_mb,
            iterations,
        } => {
            let engine = Engine::new(config.engine.clone())?;
            tracing::info!(size_mb, iterations, "starting benchmark");
            let report = bench::run(
                &engine,
                BenchOptions {
                    size_mb,
                    iterations,
                },
            )
            .await?;
            bench::print_report(&report);
        }
        Commands::Config { init } => {
            show_config(&config, cli.config, init)?;
        }
    }

    Ok(())
}

/// Hash every input and print one line per digest
async fn hash_inputs(
    engine: &Engine,
    inputs: &[Input],
    use_async: bool,
    stream: bool,
    raw: bool,
) -> anyhow::Result<()> {
    if raw && inputs.len() != 1 {
        anyhow::bail!("--raw needs exactly one input, got {}", inputs.len());
    }

    let mut stdout = io::stdout().lock();
    for input in inputs {
        let digest = hash_input(engine, input, use_async, stream).await?;
        if raw {
            stdout.write_all(digest.as_bytes())?;
        } else {
            writeln!(stdout, "{digest}  {}", input.name())?;
        }
    }
    stdout.flush()?;

    Ok(())
}

async fn hash_input(
    engine: &Engine,
    input: &Input,
    use_async: bool,
    stream: bool,
) -> anyhow::Result<Digest> {
    if stream {
        let mut hasher = Hasher::new();
        let bytes = input.stream_into(&mut hasher)?;
        tracing::debug!(input = %input.name(), bytes, "streamed input");
        return Ok(hasher.finalize()?);
    }

    let data = input.read_all()?;
    tracing::debug!(input = %input.name(), bytes = data.len(), use_async, "hashing input");

    let digest = if use_async {
        engine.hash_async(data).await?
    } else {
        engine.hash(&data)
    };
    Ok(digest)
}

/// Print or initialize configuration
fn show_config(config: &Config, path: Option<PathBuf>, init: bool) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(Config::default_path);

    if init {
        if path.exists() {
            anyhow::bail!("Config file already exists: {}", path.display());
        }
        Config::default().save(&path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
