use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use location_catalog::config::{DEFAULT_ATTACH_THRESHOLD, DEFAULT_CANONICAL_THRESHOLD};
use location_catalog::scanner::{load_catalog, load_references, scan_corpus, write_catalog};
use location_catalog::{
    Catalog, CatalogError, LocationGroup, MatchConfig, build_catalog, extend_catalog,
    seed_from_references,
};
use tracing_subscriber::EnvFilter;

const OUTPUT_DIR: &str = "output";
const CATALOG_FILE: &str = "locations.json";

#[derive(Parser)]
#[command(
    name = "location_catalog",
    about = "Deduplicated location catalog from episodic scripts and breakdowns"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args, Clone)]
struct MatchArgs {
    /// Minimum similarity to bind a group to a reference name
    #[arg(long, default_value_t = DEFAULT_CANONICAL_THRESHOLD)]
    canonical_threshold: f64,
    /// Minimum similarity to attach a new mention to an existing group
    #[arg(long, default_value_t = DEFAULT_ATTACH_THRESHOLD)]
    attach_threshold: f64,
    /// Disable the substring-containment parent/child fallback
    #[arg(long)]
    no_containment: bool,
}

impl MatchArgs {
    fn config(&self) -> MatchConfig {
        MatchConfig {
            canonical_threshold: self.canonical_threshold,
            attach_threshold: self.attach_threshold,
            containment_fallback: !self.no_containment,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Build a catalog from scratch → output/locations.json
    Extract {
        /// Corpus directory, or a JSON file of episodes
        #[arg(default_value = ".")]
        corpus: PathBuf,
        /// Reference list of authoritative location names (JSON)
        #[arg(long)]
        references: Option<PathBuf>,
        #[arg(long, default_value = OUTPUT_DIR)]
        output: PathBuf,
        #[command(flatten)]
        matching: MatchArgs,
    },
    /// Attach new episodes to an existing catalog or a reference list
    Attach {
        corpus: PathBuf,
        /// Existing catalog to extend
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Seed the catalog from a reference list instead
        #[arg(long)]
        references: Option<PathBuf>,
        #[arg(long, default_value = OUTPUT_DIR)]
        output: PathBuf,
        #[command(flatten)]
        matching: MatchArgs,
    },
    /// Print the cached catalog as a tree
    Show {
        #[arg(long, default_value = OUTPUT_DIR)]
        output: PathBuf,
        /// Number of locations to print
        #[arg(long, default_value_t = 25)]
        top: usize,
    },
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Command::Extract {
            corpus,
            references,
            output,
            matching,
        }) => run_extract(&corpus, references.as_deref(), &output, &matching.config()),
        Some(Command::Attach {
            corpus,
            catalog,
            references,
            output,
            matching,
        }) => run_attach(
            &corpus,
            catalog.as_deref(),
            references.as_deref(),
            &output,
            &matching.config(),
        ),
        Some(Command::Show { output, top }) => run_show(&output, top),
        // Default: extract from current directory
        None => run_extract(
            Path::new("."),
            None,
            Path::new(OUTPUT_DIR),
            &MatchConfig::default(),
        ),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ═══════════════════════════════════════════════════════════════════════
//  EXTRACT / ATTACH
// ═══════════════════════════════════════════════════════════════════════

fn run_extract(
    corpus: &Path,
    references: Option<&Path>,
    output: &Path,
    config: &MatchConfig,
) -> Result<(), CatalogError> {
    eprintln!("Scanning corpus at: {}", corpus.display());
    let episodes = scan_corpus(corpus)?;
    eprintln!("Found {} episodes", episodes.len());

    let references = match references {
        Some(path) => load_references(path)?,
        None => Vec::new(),
    };

    let catalog = build_catalog(&episodes, &references, config);
    print_report(&catalog);
    write_output(output, &catalog.groups)
}

fn run_attach(
    corpus: &Path,
    catalog: Option<&Path>,
    references: Option<&Path>,
    output: &Path,
    config: &MatchConfig,
) -> Result<(), CatalogError> {
    let base = match (catalog, references) {
        (Some(path), _) => load_catalog(path)?,
        (None, Some(path)) => seed_from_references(&load_references(path)?).groups,
        (None, None) => return Err(CatalogError::NoBaseCatalog),
    };
    eprintln!("Base catalog: {} locations", base.len());

    let episodes = scan_corpus(corpus)?;
    eprintln!("Found {} episodes", episodes.len());

    let (catalog, report) = extend_catalog(base, &episodes, config);
    print_report(&catalog);
    eprintln!(
        "\nAttached {} mention(s) to {} location(s); dropped {}",
        report.attached,
        report.touched.len(),
        report.dropped
    );
    write_output(output, &catalog.groups)
}

fn write_output(output: &Path, groups: &[LocationGroup]) -> Result<(), CatalogError> {
    let path = output.join(CATALOG_FILE);
    let bytes = write_catalog(&path, groups)?;
    eprintln!("\n  {} ({} bytes)", path.display(), bytes);
    Ok(())
}

fn print_report(catalog: &Catalog) {
    let stats = &catalog.stats;
    eprintln!("\n══════════════════════════════════════════");
    eprintln!("  LOCATION CATALOG");
    eprintln!("══════════════════════════════════════════");
    eprintln!("  Mentions:       {}", stats.mentions);
    eprintln!("  Locations:      {}", stats.groups);
    eprintln!("  Sub-locations:  {}", stats.sub_locations);
    eprintln!("  Bound to refs:  {}", stats.bound_groups);

    if catalog.groups.is_empty() {
        eprintln!("\nNo locations found.");
        return;
    }

    eprintln!("\nMost used (first 10):");
    for g in catalog.groups.iter().take(10) {
        eprintln!(
            "  {:<32} {:>3} ep  {:>4} sc  {}",
            g.parent_location_name,
            g.total_episodes,
            g.total_scenes,
            reference_label(g)
        );
    }
}

fn reference_label(g: &LocationGroup) -> String {
    match &g.canonical_reference_name {
        Some(name) => format!("→ {name} ({:.2})", g.confidence),
        None => "(unbound)".to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  SHOW MODE: render the cached catalog
// ═══════════════════════════════════════════════════════════════════════

fn run_show(output: &Path, top: usize) -> Result<(), CatalogError> {
    let path = output.join(CATALOG_FILE);
    let groups = load_catalog(&path)?;

    for g in groups.iter().take(top) {
        println!(
            "{} {} [{} ep, {} sc, eps {}-{}] {}",
            g.location_type.slug_prefix(),
            g.parent_location_name,
            g.total_episodes,
            g.total_scenes,
            g.first_used_episode,
            g.last_used_episode,
            reference_label(g)
        );
        let last = g.sub_locations.len().saturating_sub(1);
        for (i, sub) in g.sub_locations.iter().enumerate() {
            let connector = if i == last { "└─ " } else { "├─ " };
            println!("{connector}{} ({} sc)", sub.name, sub.total_scenes);
        }
    }

    if groups.len() > top {
        eprintln!("\n... and {} more", groups.len() - top);
    }
    Ok(())
}
