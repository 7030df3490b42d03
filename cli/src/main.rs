//! unfold CLI - document model normalization tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use unfold::{
    detect_schema_from_path, doc_id_from_path, normalize_file, process_batch, resolve_file,
    strip_payloads, AssetOptions, BreadcrumbScan, ContextOptions, JsonFormat, NormalizeOptions,
    NormalizeStats, NormalizedDocument, ResolveOptions,
};

#[derive(Parser)]
#[command(name = "unfold")]
#[command(author = "iyulab")]
#[command(version)]
#[command(
    about = "Normalize document-model JSON into an element map, reading order, and breadcrumbs",
    long_about = None
)]
struct Cli {
    /// Input document model (JSON)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Flags shared by every subcommand.
#[derive(Args, Clone)]
struct Settings {
    /// Log filter (e.g., "warn", "unfold=debug")
    #[arg(long, global = true, env = "UNFOLD_LOG", default_value = "warn")]
    log_level: String,

    /// Maximum reference resolution passes
    #[arg(long, global = true, env = "UNFOLD_MAX_PASSES", default_value = "4")]
    max_passes: usize,

    /// Context characters on each side of an element
    #[arg(long, global = true, env = "UNFOLD_CONTEXT_CHARS", default_value = "100")]
    context_chars: usize,

    /// Also substitute parent and children references
    #[arg(long, global = true)]
    resolve_structure: bool,

    /// Breadcrumb strategy
    #[arg(long, global = true, value_enum, default_value = "forward")]
    scan: ScanMode,

    /// Sort the sequence by position on the page
    #[arg(long, global = true)]
    sort_by_position: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write every artifact
    Convert {
        /// Input document model
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Sibling field that also receives asset paths
        #[arg(long)]
        link_field: Option<String>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Write the resolved element map
    Map {
        /// Input document model
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Replace inline payloads with a placeholder
        #[arg(long)]
        strip: bool,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Write the reading-order sequence
    #[command(alias = "seq")]
    Sequence {
        /// Input document model
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Print the breadcrumb of every element in reading order
    Breadcrumbs {
        /// Input document model
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print JSON instead of a listing
        #[arg(long)]
        json: bool,
    },

    /// Print the breadcrumb and surrounding text of one element
    Context {
        /// Input document model
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Element identifier (e.g., "#/pictures/0")
        #[arg(value_name = "ID")]
        element: String,
    },

    /// Externalize inline images and write the rewritten element map
    Assets {
        /// Input document model
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Document id used in asset paths (defaults to the file name)
        #[arg(long)]
        doc_id: Option<String>,

        /// Sibling field that also receives asset paths
        #[arg(long)]
        link_field: Option<String>,
    },

    /// Show document information
    Info {
        /// Input document model
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Normalize many documents in parallel
    Batch {
        /// Input document models
        #[arg(value_name = "FILES", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory (one subdirectory per document)
        #[arg(short, long, value_name = "DIR", default_value = "unfold_output")]
        output: PathBuf,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ScanMode {
    /// Single forward pass over the sequence
    Forward,
    /// Backward scan from each element
    Backward,
}

impl From<ScanMode> for BreadcrumbScan {
    fn from(mode: ScanMode) -> Self {
        match mode {
            ScanMode::Forward => BreadcrumbScan::Forward,
            ScanMode::Backward => BreadcrumbScan::Backward,
        }
    }
}

impl Settings {
    fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions::new()
            .with_resolve(self.resolve_options())
            .with_context(
                ContextOptions::new()
                    .with_max_chars(self.context_chars)
                    .with_scan(self.scan.into()),
            )
            .with_position_sort(self.sort_by_position)
    }

    fn resolve_options(&self) -> ResolveOptions {
        let options = if self.resolve_structure {
            ResolveOptions::full()
        } else {
            ResolveOptions::structural()
        };
        options.with_max_passes(self.max_passes)
    }
}

fn json_format(compact: bool) -> JsonFormat {
    if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    }
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.settings.log_level.as_str()),
    )
    .init();

    let settings = &cli.settings;
    let result = match cli.command {
        Some(Commands::Convert {
            input,
            output,
            link_field,
            compact,
        }) => cmd_convert(settings, &input, output.as_deref(), link_field, compact),
        Some(Commands::Map {
            input,
            output,
            strip,
            compact,
        }) => cmd_map(settings, &input, output.as_deref(), strip, compact),
        Some(Commands::Sequence {
            input,
            output,
            compact,
        }) => cmd_sequence(settings, &input, output.as_deref(), compact),
        Some(Commands::Breadcrumbs { input, json }) => cmd_breadcrumbs(settings, &input, json),
        Some(Commands::Context { input, element }) => cmd_context(settings, &input, &element),
        Some(Commands::Assets {
            input,
            output,
            doc_id,
            link_field,
        }) => cmd_assets(settings, &input, output.as_deref(), doc_id, link_field),
        Some(Commands::Info { input }) => cmd_info(settings, &input),
        Some(Commands::Batch {
            inputs,
            output,
            compact,
        }) => cmd_batch(settings, &inputs, &output, compact),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: convert if input is provided
            if let Some(input) = cli.input.as_deref() {
                cmd_convert(settings, input, cli.output.as_deref(), None, false)
            } else {
                println!("{}", "Usage: unfold <FILE> [OUTPUT]".yellow());
                println!("       unfold --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn default_output_dir(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    PathBuf::from(format!("{}_output", stem))
}

fn write_or_print(output: Option<&Path>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn print_warnings(doc: &NormalizedDocument) {
    for warning in doc.warnings() {
        let id = warning.element_id.as_deref().unwrap_or("-");
        eprintln!(
            "{}: [{}] {} {}",
            "Warning".yellow().bold(),
            warning.code,
            id,
            warning.message
        );
    }
}

fn print_stats(stats: &NormalizeStats) {
    println!("{}", "Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Elements".bold(), stats.element_count);
    println!("{}: {}", "Sequence".bold(), stats.sequence_length);
    println!("{}: {}", "Headings".bold(), stats.heading_count);
    println!("{}: {}", "Tables".bold(), stats.table_count);
    println!("{}: {}", "Pictures".bold(), stats.picture_count);
    println!("{}: {}", "Furniture".bold(), stats.furniture_count);
    println!(
        "{}: {} resolved, {} unresolved ({} cycles) in {} passes",
        "References".bold(),
        stats.resolved_count,
        stats.unresolved_count,
        stats.cycles_broken,
        stats.passes
    );
    println!(
        "{}: {} written, {} reused, {} failed",
        "Assets".bold(),
        stats.assets_written,
        stats.assets_reused,
        stats.assets_failed
    );
    if stats.fallback_count > 0 {
        println!(
            "{}: {}",
            "Page-order fallback".bold(),
            stats.fallback_count
        );
    }
}

fn cmd_convert(
    settings: &Settings,
    input: &Path,
    output: Option<&Path>,
    link_field: Option<String>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| default_output_dir(input));
    fs::create_dir_all(&output_dir)?;

    let pb = ProgressBar::new(3);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Loading document...");
    let info = detect_schema_from_path(input)?;
    log::info!("Detected {}", info);
    pb.inc(1);

    pb.set_message("Normalizing...");
    let doc_id = doc_id_from_path(input);
    let mut assets = AssetOptions::new(&output_dir, doc_id.clone());
    if let Some(field) = link_field {
        assets = assets.with_link_field(field);
    }
    let options = settings.normalize_options().with_assets(assets);
    let doc = normalize_file(input, &options)?;
    pb.inc(1);

    pb.set_message("Writing artifacts...");
    let written = doc.write_to(&output_dir, json_format(compact))?;
    pb.inc(1);

    pb.finish_with_message("Done!");

    println!("\n{}", "Output files:".green().bold());
    for path in &written {
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        println!("  {} {}", "├─".dimmed(), name);
    }
    println!(
        "  {} {}/images/ ({} files)",
        "└─".dimmed(),
        doc_id,
        doc.assets.written.len()
    );
    println!();

    print_stats(&doc.stats);
    print_warnings(&doc);

    Ok(())
}

fn cmd_map(
    settings: &Settings,
    input: &Path,
    output: Option<&Path>,
    strip: bool,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let resolution = resolve_file(input, &settings.resolve_options())?;

    let json = if strip {
        let value = serde_json::to_value(&resolution.elements)?;
        unfold::output::to_json(&strip_payloads(&value), json_format(compact))?
    } else {
        unfold::output::to_json(&resolution.elements, json_format(compact))?
    };

    write_or_print(output, &json)
}

fn cmd_sequence(
    settings: &Settings,
    input: &Path,
    output: Option<&Path>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = settings.normalize_options().with_annotations(false);
    let doc = normalize_file(input, &options)?;

    if doc.sequence.is_fallback() {
        log::info!("{}: no usable containment tree", input.display());
    }

    let json = unfold::output::to_json(&doc.sequence, json_format(compact))?;
    write_or_print(output, &json)
}

fn cmd_breadcrumbs(
    settings: &Settings,
    input: &Path,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = settings.normalize_options().with_annotations(false);
    let doc = normalize_file(input, &options)?;

    if json {
        let entries: Vec<serde_json::Value> = doc
            .sequence
            .iter()
            .zip(&doc.breadcrumbs)
            .map(|(element, crumb)| serde_json::json!({"id": element.id, "breadcrumb": crumb}))
            .collect();
        println!("{}", unfold::output::to_json(&entries, JsonFormat::Pretty)?);
        return Ok(());
    }

    for (position, (element, crumb)) in doc.sequence.iter().zip(&doc.breadcrumbs).enumerate() {
        println!(
            "{:>5}  {:<20} {}",
            position.to_string().dimmed(),
            element.id,
            crumb
        );
    }

    Ok(())
}

fn cmd_context(
    settings: &Settings,
    input: &Path,
    element: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = normalize_file(input, &settings.normalize_options())?;

    let annotation = doc
        .annotation_of(element)
        .ok_or_else(|| format!("element {} is not in the reading order", element))?;

    println!("{}", "Element Context".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Element".bold(), annotation.element_id);
    println!("{}: {}", "Position".bold(), annotation.position);
    if let Some(ref label) = annotation.label {
        println!("{}: {}", "Label".bold(), label);
    }
    if let Some(page) = annotation.page_no {
        println!("{}: {}", "Page".bold(), page);
    }
    println!("{}: {}", "Breadcrumb".bold(), annotation.breadcrumb);
    if let Some(ref caption) = annotation.caption {
        println!("{}: {}", "Caption".bold(), caption);
    }
    println!("{}: {}", "Before".bold(), annotation.context_before);
    println!("{}: {}", "After".bold(), annotation.context_after);

    Ok(())
}

fn cmd_assets(
    settings: &Settings,
    input: &Path,
    output: Option<&Path>,
    doc_id: Option<String>,
    link_field: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    let doc_id = doc_id.unwrap_or_else(|| doc_id_from_path(input));

    let mut assets = AssetOptions::new(&output_dir, doc_id.clone());
    if let Some(field) = link_field {
        assets = assets.with_link_field(field);
    }
    let options = settings
        .normalize_options()
        .with_assets(assets)
        .with_annotations(false);
    let doc = normalize_file(input, &options)?;

    for asset in &doc.assets.written {
        println!(
            "{} {} ({} bytes)",
            "Extracted".green(),
            asset.relative_path,
            asset.size
        );
    }

    let map_path = output_dir.join(format!("{}.json", doc_id));
    let json = unfold::output::to_json(&doc.elements, JsonFormat::Pretty)?;
    fs::write(&map_path, json)?;
    println!("{} {}", "Saved to".green(), map_path.display());

    println!(
        "\n{} {} images extracted, {} reused",
        "Done!".green().bold(),
        doc.assets.written.len(),
        doc.assets.reused
    );
    print_warnings(&doc);

    Ok(())
}

fn cmd_info(settings: &Settings, input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let schema = detect_schema_from_path(input)?;
    let options = settings.normalize_options().with_annotations(false);
    let doc = normalize_file(input, &options)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), schema);
    if let Some(ref name) = doc.info.name {
        println!("{}: {}", "Name".bold(), name);
    }
    if let Some(ref title) = doc.info.title {
        println!("{}: {}", "Title".bold(), title);
    }
    println!("{}: {}", "Pages".bold(), doc.info.page_count);
    println!("{}: {}", "Collections".bold(), schema.collections.join(", "));
    println!(
        "{}: {}",
        "Containment tree".bold(),
        if schema.has_body { "Yes" } else { "No" }
    );

    println!();
    print_stats(&doc.stats);

    Ok(())
}

fn cmd_batch(
    settings: &Settings,
    inputs: &[PathBuf],
    output: &Path,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(output)?;

    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Normalizing {} documents...", inputs.len()));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    // Document ids are filled in per input
    let options = settings
        .normalize_options()
        .with_assets(AssetOptions::new(output, String::new()));
    let results = process_batch(inputs, &options);
    pb.finish_and_clear();

    let mut totals = NormalizeStats::default();
    let mut failures = 0;

    for (path, result) in results {
        match result {
            Ok(doc) => {
                let dir = output.join(doc_id_from_path(&path));
                doc.write_to(&dir, json_format(compact))?;
                println!("{} {} -> {}", "Normalized".green(), path.display(), dir.display());
                print_warnings(&doc);
                totals.merge(&doc.stats);
            }
            Err(e) => {
                eprintln!("{} {}: {}", "Failed".red(), path.display(), e);
                failures += 1;
            }
        }
    }

    println!();
    print_stats(&totals);
    println!(
        "\n{} {} documents, {} failed",
        "Done!".green().bold(),
        totals.document_count,
        failures
    );

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "unfold".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Document model normalization tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/unfold".dimmed());
    println!("License: MIT");
}
