//! lexical2pt: CLI tool to convert Lexical rich text to Portable Text or HTML

mod config;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing_subscriber::EnvFilter;

use config::{CONFIG_FILE_NAME, Config};
use lexical2pt_core::lexical_ast::{parse_value, root_children};
use lexical2pt_core::{GlobalKeys, HtmlRenderer, RenderMode, SequentialKeys, convert_report};

/// Suffix of Portable Text outputs, so they are not picked up as inputs again
const PORTABLE_TEXT_SUFFIX: &str = ".pt.json";

#[derive(Parser, Debug)]
#[command(name = "lexical2pt")]
#[command(about = "Convert Lexical rich text JSON to Portable Text or HTML")]
#[command(version)]
#[command(after_help = "Examples:
  lexical2pt page.json                  # Convert to page.pt.json
  lexical2pt page.json -f html          # Render to page.html
  lexical2pt page.json -f html -o -     # Render to stdout
  lexical2pt content/ -o out/ -r -j4    # Convert a directory tree with 4 jobs
  lexical2pt --init                     # Write a sample _lexical2pt.toml")]
struct Cli {
    /// Input Lexical JSON file or directory
    #[arg(required_unless_present_any = ["init", "schema"])]
    input: Option<PathBuf>,

    /// Output file or directory ("-" for stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (default: json)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Render HTML without presentational classes
    #[arg(long)]
    plain: bool,

    /// Generate deterministic keys instead of salted ones
    #[arg(long)]
    stable_keys: bool,

    /// Write compact instead of pretty-printed JSON
    #[arg(long)]
    compact: bool,

    /// Number of parallel jobs (defaults to number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Process directories recursively
    #[arg(short, long)]
    recursive: bool,

    /// Configuration file (default: _lexical2pt.toml next to the input)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a sample configuration file and exit
    #[arg(long, conflicts_with = "schema")]
    init: bool,

    /// Print the configuration JSON schema and exit
    #[arg(long)]
    schema: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only show errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Portable Text blocks as JSON
    Json,
    /// Rendered HTML fragment
    Html,
}

impl OutputFormat {
    fn from_config(value: &str) -> Result<Self> {
        match value {
            "json" => Ok(OutputFormat::Json),
            "html" => Ok(OutputFormat::Html),
            other => anyhow::bail!(
                "Invalid output format in config: {} (expected \"json\" or \"html\")",
                other
            ),
        }
    }

    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "pt.json",
            OutputFormat::Html => "html",
        }
    }
}

/// Effective settings after merging CLI flags over the config file
#[derive(Debug)]
struct Settings {
    format: OutputFormat,
    pretty: bool,
    stable_keys: bool,
    key_prefix: String,
    renderer: HtmlRenderer,
}

impl Settings {
    fn resolve(cli: &Cli, config: &Config) -> Result<Self> {
        let format = match (cli.format, config.output.format.as_deref()) {
            (Some(format), _) => format,
            (None, Some(value)) => OutputFormat::from_config(value)?,
            (None, None) => OutputFormat::Json,
        };

        let mode = match (cli.plain, config.output.mode.as_deref()) {
            (true, _) | (false, Some("plain")) => RenderMode::Plain,
            (false, Some("styled") | None) => RenderMode::Styled,
            (false, Some(other)) => anyhow::bail!(
                "Invalid HTML mode in config: {} (expected \"styled\" or \"plain\")",
                other
            ),
        };

        let mut renderer = HtmlRenderer::new(mode);
        if mode == RenderMode::Styled {
            for (style, class) in &config.styles {
                renderer = renderer.with_style_class(style, class.as_str());
            }
            for (mark, class) in &config.marks {
                renderer = renderer.with_mark_class(mark, class.as_str());
            }
        }

        Ok(Settings {
            format,
            pretty: !cli.compact && config.output.pretty.unwrap_or(true),
            stable_keys: cli.stable_keys || config.keys.stable.unwrap_or(false),
            key_prefix: config.keys.prefix.clone().unwrap_or_else(|| "k".to_string()),
            renderer,
        })
    }

    /// Core conversion function
    fn convert(&self, source: &str) -> Result<String> {
        let document = parse_value(source).context("Invalid Lexical document")?;
        if root_children(&document).is_none() {
            tracing::warn!("Document has no root.children array, output is empty");
        }

        let conversion = if self.stable_keys {
            convert_report(&document, &mut SequentialKeys::new(self.key_prefix.as_str()))
        } else {
            convert_report(&document, &mut GlobalKeys)
        };
        if !conversion.skipped.is_empty() {
            tracing::warn!(
                skipped = conversion.skipped.len(),
                "Some top-level nodes could not be converted"
            );
        }

        let json = match self.format {
            OutputFormat::Json if self.pretty => serde_json::to_string_pretty(&conversion.blocks),
            OutputFormat::Json => serde_json::to_string(&conversion.blocks),
            OutputFormat::Html => return Ok(self.renderer.render(&conversion.blocks)),
        };
        json.context("Failed to serialize blocks")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if cli.schema {
        println!("{}", Config::json_schema_string()?);
        return Ok(());
    }
    if cli.init {
        return write_sample_config(cli.output.as_deref(), cli.quiet);
    }

    let Some(input) = cli.input.as_deref() else {
        anyhow::bail!("No input given");
    };

    let config = load_config(cli.config.as_deref(), input)?;
    let settings = Settings::resolve(&cli, &config)?;

    if input.is_file() {
        convert_file(input, cli.output.as_deref(), &settings, cli.quiet)?;
    } else if input.is_dir() {
        convert_directory(
            input,
            cli.output.as_deref(),
            cli.recursive,
            cli.jobs,
            &settings,
            cli.quiet,
        )?;
    } else {
        anyhow::bail!("Input path does not exist: {}", input.display());
    }

    Ok(())
}

/// Install the log subscriber. Logs go to stderr so stdout stays usable for
/// converted output.
fn init_tracing(verbose: bool, quiet: bool) {
    // --verbose enables INFO level, --quiet ERROR, otherwise RUST_LOG or WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load the explicit config file, or look for one next to the input
fn load_config(explicit: Option<&Path>, input: &Path) -> Result<Config> {
    if let Some(path) = explicit {
        tracing::info!(path = %path.display(), "Using config file");
        return Config::load(path);
    }

    let dir = if input.is_dir() {
        input
    } else {
        input.parent().unwrap_or(Path::new("."))
    };
    match Config::load_from_dir(dir)? {
        Some(config) => {
            tracing::info!(path = %dir.join(CONFIG_FILE_NAME).display(), "Using config file");
            Ok(config)
        }
        None => Ok(Config::default()),
    }
}

/// Write `Config::sample()` to `output` (default: `_lexical2pt.toml`)
fn write_sample_config(output: Option<&Path>, quiet: bool) -> Result<()> {
    let path = output.unwrap_or(Path::new(CONFIG_FILE_NAME));
    if path.exists() {
        anyhow::bail!("Config file already exists: {}", path.display());
    }

    let content = Config::sample().to_toml_with_schema()?;
    fs::write(path, content).with_context(|| format!("Failed to write: {}", path.display()))?;

    if !quiet {
        println!("{}", path.display());
    }
    Ok(())
}

fn is_stdout(path: &Path) -> bool {
    path == Path::new("-")
}

/// Convert a single Lexical JSON file
fn convert_file(
    input: &Path,
    output: Option<&Path>,
    settings: &Settings,
    quiet: bool,
) -> Result<()> {
    if output.is_some_and(is_stdout) {
        tracing::info!(input = %input.display(), "Converting to stdout");
        let content = fs::read_to_string(input)
            .with_context(|| format!("Failed to read: {}", input.display()))?;
        let converted = settings
            .convert(&content)
            .with_context(|| format!("Failed to convert: {}", input.display()))?;
        println!("{}", converted);
        return Ok(());
    }

    let output_path = match output {
        Some(p) => p.to_path_buf(),
        None => input.with_extension(settings.format.extension()),
    };

    tracing::info!(
        input = %input.display(),
        output = %output_path.display(),
        "Converting"
    );

    convert_file_inner(input, &output_path, settings)?;

    if !quiet {
        println!("{}", output_path.display());
    }

    Ok(())
}

/// Convert a directory of Lexical JSON files
fn convert_directory(
    input: &Path,
    output: Option<&Path>,
    recursive: bool,
    jobs: Option<usize>,
    settings: &Settings,
    quiet: bool,
) -> Result<()> {
    if output.is_some_and(is_stdout) {
        anyhow::bail!("Cannot write a directory conversion to stdout");
    }
    let output_dir = output.unwrap_or(input);

    let files = collect_json_files(input, recursive)?;

    if files.is_empty() {
        if !quiet {
            eprintln!("No .json files found in {}", input.display());
        }
        return Ok(());
    }

    tracing::info!(count = files.len(), dir = %input.display(), "Found Lexical files");

    // Configure thread pool if jobs specified
    if let Some(n) = jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    // Atomic counters for thread-safe progress tracking
    let success = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    // Parallel conversion
    let errors: Vec<_> = files
        .par_iter()
        .filter_map(|file| {
            let relative = file.strip_prefix(input).unwrap_or(file);
            let output_file = output_dir
                .join(relative)
                .with_extension(settings.format.extension());

            match convert_file_inner(file, &output_file, settings) {
                Ok(()) => {
                    success.fetch_add(1, Ordering::Relaxed);
                    if !quiet {
                        println!("{}", output_file.display());
                    }
                    None
                }
                Err(e) => {
                    failed.fetch_add(1, Ordering::Relaxed);
                    Some((file.clone(), e))
                }
            }
        })
        .collect();

    // Report errors
    for (file, e) in &errors {
        eprintln!("Error converting {}: {:#}", file.display(), e);
    }

    let success_count = success.load(Ordering::Relaxed);
    let failed_count = failed.load(Ordering::Relaxed);

    if !quiet {
        eprintln!("Converted {} files, {} failed", success_count, failed_count);
    }

    if failed_count > 0 {
        anyhow::bail!("{} files failed to convert", failed_count);
    }

    Ok(())
}

/// Inner conversion function that doesn't print (for parallel use)
fn convert_file_inner(input: &Path, output: &Path, settings: &Settings) -> Result<()> {
    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read: {}", input.display()))?;

    let converted = settings
        .convert(&content)
        .with_context(|| format!("Failed to convert: {}", input.display()))?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(output, &converted)
        .with_context(|| format!("Failed to write: {}", output.display()))?;

    Ok(())
}

/// Collect all Lexical .json files in a directory, skipping Portable Text
/// outputs
fn collect_json_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() {
            let is_json = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            let is_output = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(PORTABLE_TEXT_SUFFIX));
            if is_json && !is_output {
                files.push(path);
            }
        } else if path.is_dir() && recursive {
            files.extend(collect_json_files(&path, recursive)?);
        }
    }

    files.sort();
    Ok(files)
}
