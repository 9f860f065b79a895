use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use xaba::store::{AssemblyStore, StorePaths};

#[derive(Parser)]
#[command(name = "xaba", version, about = "Inspect, unpack and repack XABA assembly blobs")]
struct Cli {
    /// Path of the input assemblies.manifest file
    #[arg(short, long, global = true)]
    manifest: Option<PathBuf>,
    /// Path of the input assemblies.blob file
    #[arg(short, long, global = true)]
    blob: Option<PathBuf>,
    /// Increase verbosity (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List assemblies in the blob
    List,
    /// Unpack all or the named assemblies
    Unpack {
        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
        /// Assembly names, with or without `.dll`
        names: Vec<String>,
    },
    /// Replace assemblies in the blob and write a new one
    Replace {
        /// Path of the output blob
        #[arg(short, long)]
        output: PathBuf,
        /// Replacement files; `Foo.dll` or `Foo` replaces assembly `Foo`
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("XABA_LOG")
                .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let paths = StorePaths::resolve(cli.manifest.as_deref(), cli.blob.as_deref())?;

    match cli.command {

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List => {
            let store = AssemblyStore::open(&paths)?;
            match cli.verbose {
                0 => {
                    println!("{:>4} {}", "idx", "name");
                    for e in store.list() {
                        println!("{:>4} {}", e.blob_idx, e.name);
                    }
                }
                1 => {
                    println!("{:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {}",
                             "idx", "doffset", "compsz", "origsz", "configsz", "dbgsz", "name");
                    for e in store.list() {
                        println!("{:>8} {:>8x} {:>8} {:>8} {:>8} {:>8} {}",
                            e.blob_idx, e.data_offset, e.data_size, e.original_size,
                            e.config_size, e.debug_size, e.name);
                    }
                }
                _ => dump(&store)?,
            }
        }

        // ── Unpack ───────────────────────────────────────────────────────────
        Commands::Unpack { output, names } => {
            let store = AssemblyStore::open(&paths)?;
            for path in store.unpack(&output, &names)? {
                if cli.verbose > 0 {
                    println!("  unpacked  {}", path.display());
                }
            }
        }

        // ── Replace ──────────────────────────────────────────────────────────
        Commands::Replace { output, files } => {
            let mut store = AssemblyStore::open(&paths)?;
            let replaced = store.replace_files(&files)?;
            store.save(&output)?;
            if cli.verbose > 0 {
                println!("Replaced {replaced} assemblies → {}", output.display());
            }
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

/// Every record of both files, one JSON object per line.
fn dump(store: &AssemblyStore) -> Result<(), serde_json::Error> {
    fn section<T: Serialize>(title: &str, rows: &[T]) -> Result<(), serde_json::Error> {
        println!("[.] {title}:");
        for (i, row) in rows.iter().enumerate() {
            println!("{i:5}: {}", serde_json::to_string(row)?);
        }
        println!();
        Ok(())
    }

    let blob = store.container();
    section("manifest", store.manifest().assemblies())?;
    println!("[.] blob file header:");
    println!("    {}", serde_json::to_string(&blob.file_header)?);
    println!();
    section("assembly descriptors", &blob.descriptors)?;
    section("hash32 entries", &blob.hash32_entries)?;
    section("hash64 entries", &blob.hash64_entries)?;
    section("data entries", &blob.data_entries)
}
