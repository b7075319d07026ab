#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::io::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use assemblystore::orchestrator::{self, Outcome};
use assemblystore::prelude::*;

mod discover;
mod logging;
mod menu;

fn prompt(label: &str) -> Result<String> {
    print!("{label}: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn store_basename(path: &std::path::Path) -> String {
    path.file_stem().map(|stem| stem.to_string_lossy().into_owned()).unwrap_or_else(|| "store".to_string())
}

fn process_blob(blob_path: &std::path::Path, manifest: &Manifest, output_dir: &std::path::Path) -> Result<Vec<Outcome>> {
    let basename = store_basename(blob_path);
    let is_primary = discover::is_primary_store(blob_path);
    let data = std::fs::read(blob_path).with_context(|| format!("reading {}", blob_path.display()))?;

    match AssemblyStoreFile::parse(data.clone(), is_primary) {
        Ok(store) => {
            log::info!("parsed {} as an AssemblyStore ({} descriptors)", blob_path.display(), store.descriptors.len());
            Ok(orchestrator::extract_store(&store, &basename, manifest, output_dir))
        }
        Err(Error::NotAnAssemblyStore) => {
            log::warn!("{} is not a recognized AssemblyStore; falling back to recovery", blob_path.display());
            let blob_id = 0;
            Ok(orchestrator::extract_via_recovery(&data, Some(manifest), blob_id, &basename, output_dir))
        }
        Err(error) => {
            log::error!("skipping {}: {error}", blob_path.display());
            Ok(Vec::new())
        }
    }
}

fn run(input_dir: PathBuf, output_dir: PathBuf, verbose: usize) -> Result<()> {
    let (log_file, log_path) = logging::create_conversion_log(&output_dir)?;
    logging::init(verbose, log_file);
    log::info!("writing conversion log to {}", log_path.display());

    let inputs = discover::discover(&input_dir).with_context(|| format!("scanning {}", input_dir.display()))?;

    let manifest = match &inputs.manifest {
        Some(path) => {
            let contents = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            Manifest::parse(&contents)
        }
        None => {
            log::warn!("no assemblies.manifest found under {}; every store falls back to recovery", input_dir.display());
            Manifest::default()
        }
    };

    let mut written = 0usize;
    let mut invalid = 0usize;
    let mut skipped = 0usize;

    for blob_path in &inputs.blobs {
        for outcome in process_blob(blob_path, &manifest, &output_dir)? {
            match outcome {
                Outcome::Written { path } => {
                    log::info!("wrote {}", path.display());
                    written += 1;
                }
                Outcome::WrittenInvalid { path } => {
                    log::warn!("wrote {} (failed validation even after repair)", path.display());
                    invalid += 1;
                }
                Outcome::Skipped { error } => {
                    log::warn!("skipped a descriptor: {error}");
                    skipped += 1;
                }
            }
        }
    }

    log::info!("done: {written} written, {invalid} invalid, {skipped} skipped");
    Ok(())
}

fn main() -> Result<()> {
    let args: menu::Arguments = argp::parse_args_or_exit(argp::DEFAULT);
    let verbose = args.verbose;

    let input_dir = match args.input_dir {
        Some(dir) => dir,
        None => prompt("Input directory")?,
    };
    let output_dir = match args.output_dir {
        Some(dir) => dir,
        None => prompt("Output directory")?,
    };

    run(PathBuf::from(input_dir), PathBuf::from(output_dir), verbose)
}
