use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ragclarify::{
    load_dotenv, AppConfig, IngestOptions, IngestPipeline, IngestReport, Session, Source,
    TokenVerifier,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Turn documents and web pages into chunks ready for a RAG index.
#[derive(Parser, Debug)]
#[command(name = "ragclarify", version, about = "Document to RAG chunk preparation")]
struct CliArgs {
    /// App token issued for your user
    #[arg(long, env = "RAGCLARIFY_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Maximum characters per chunk (at least 512; default from RAGCLARIFY_CHUNK_SIZE)
    #[arg(long, global = true)]
    chunk_size: Option<usize>,

    /// Attach each separator to the start of the following piece
    #[arg(long, global = true)]
    keep_separator: Option<bool>,

    /// Where download files are written (default: $DATA_DIR/ragclarify)
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,

    /// What to print to stdout after processing
    #[arg(long, value_enum, default_value = "none", global = true)]
    print: PrintMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract and split a local file
    Split { file: PathBuf },

    /// Fetch a web page through the reader service and split it
    Fetch { url: String },

    /// Re-split edited plain text
    Resplit {
        text_file: PathBuf,

        /// Document name to label the chunks with
        #[arg(long)]
        name: Option<String>,
    },

    /// List the file extensions with a dedicated extractor
    Formats,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PrintMode {
    None,
    Text,
    Json,
}

fn main() -> Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ragclarify=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let config = AppConfig::from_env();
    info!(?config, "Loaded configuration");

    let pipeline = IngestPipeline::from_config(&config).context("failed to build pipeline")?;

    if let Command::Formats = args.command {
        print_formats(&pipeline);
        return Ok(());
    }

    let options = IngestOptions::new(
        args.chunk_size.unwrap_or(config.chunk_size),
        args.keep_separator.unwrap_or(config.keep_separator),
    )
    .context("invalid chunk size")?;

    let verifier = TokenVerifier::from_secret(config.app_secret.as_deref())
        .context("cannot verify app tokens")?;
    let mut session = Session::new();
    let uid = session
        .authenticate(args.api_key.as_deref(), &verifier)
        .context("authentication failed")?
        .to_string();

    let start_time = Instant::now();
    let report = match &args.command {
        Command::Split { file } => {
            let source = Source::from_path(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            pipeline.process(&mut session, source, &options)?
        }
        Command::Fetch { url } => {
            let source = pipeline
                .fetch(&session, url)
                .with_context(|| format!("failed to fetch {}", url))?;
            pipeline.process(&mut session, source, &options)?
        }
        Command::Resplit { text_file, name } => {
            let text = std::fs::read_to_string(text_file)
                .with_context(|| format!("failed to read {}", text_file.display()))?;
            if let Some(name) = name {
                session.set_content_name(name.as_str());
            }
            pipeline.reprocess(&mut session, &text, &options)?
        }
        Command::Formats => return Ok(()),
    };

    print_report(&uid, &report, &options, start_time);

    let out_dir = match &args.out_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            dir.clone()
        }
        None => config
            .data_dir(Some("ragclarify"))
            .context("failed to create data directory")?,
    };
    write_downloads(&session, &out_dir)?;

    match args.print {
        PrintMode::None => {}
        PrintMode::Text => {
            if let Some(download) = session.text_download() {
                println!("{}", download.data);
            }
        }
        PrintMode::Json => {
            if let Some(download) = session.json_download()? {
                println!("{}", download.data);
            }
        }
    }

    Ok(())
}

fn print_formats(pipeline: &IngestPipeline) {
    let registry = pipeline.registry();
    println!("Extensions ({}):", registry.extractor_count());
    for ext in registry.registered_extensions() {
        println!("  .{:<6} {}", ext, registry.select(&format!("file.{}", ext)).name());
    }
    println!("Name suffixes:");
    for suffix in registry.registered_suffixes() {
        println!("  {:<24} {}", suffix, registry.select(suffix).name());
    }
    println!("Anything else: fallback (printable text)");
}

fn print_report(uid: &str, report: &IngestReport, options: &IngestOptions, start_time: Instant) {
    eprintln!("✓ {} [{}] for {}", report.name, report.extractor, uid);
    eprintln!(
        "  {} chars -> {} chunks (size {}, keep separator {}) [{:.2}s]",
        report.char_count,
        report.chunk_count,
        options.chunk_size(),
        options.keep_separator(),
        start_time.elapsed().as_secs_f64()
    );
    eprintln!("  sha256 {}", report.digest);
}

fn write_downloads(session: &Session, out_dir: &Path) -> Result<()> {
    let text = session.text_download();
    let json = session
        .json_download()
        .context("failed to serialize chunk records")?;

    for download in text.into_iter().chain(json) {
        let path = download
            .write_to(out_dir)
            .with_context(|| format!("failed to write {}", download.file_name))?;
        eprintln!("  wrote {}", path.display());
    }
    Ok(())
}
