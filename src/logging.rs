//! Logger setup: colored level output on stderr plus a line-atomic, mutex-guarded mirror to the
//! per-run conversion log file, per §5's resource model contract.

use std::fs::File;
use std::io::Write as _;
use std::path::Path;
use std::sync::{Arc, Mutex};

use env_logger::Builder;
use log::{Level, LevelFilter};
use owo_colors::OwoColorize;

fn color_level(level: Level) -> String {
    match level {
        Level::Error => level.red().to_string(),
        Level::Warn => level.yellow().to_string(),
        Level::Info => level.green().to_string(),
        Level::Debug => level.blue().to_string(),
        Level::Trace => level.purple().to_string(),
    }
}

const fn level_filter(verbose: usize) -> LevelFilter {
    match verbose {
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        5 => LevelFilter::Trace,
        _ => LevelFilter::Off,
    }
}

/// Creates `<output_dir>/conversion_log_<YYYYMMDD_HHMMSS>.txt`, creating `output_dir` if needed.
pub fn create_conversion_log(output_dir: &Path) -> std::io::Result<(Arc<Mutex<File>>, std::path::PathBuf)> {
    std::fs::create_dir_all(output_dir)?;
    let name = format!("conversion_log_{}.txt", assemblystore_core::time::log_filename_timestamp());
    let path = output_dir.join(name);
    let file = File::create(&path)?;
    Ok((Arc::new(Mutex::new(file)), path))
}

/// Installs the process-wide logger at `verbose` severity, mirroring every record (stripped of
/// color) to `log_file` under its mutex.
pub fn init(verbose: usize, log_file: Arc<Mutex<File>>) {
    if verbose == 0 {
        return;
    }

    Builder::new()
        .format(move |buf, record| {
            let timestamp = assemblystore_core::time::current_time();
            let plain_line = format!("[{timestamp}] {} {}", record.level(), record.args());
            if let Ok(mut file) = log_file.lock() {
                let _ = writeln!(file, "{plain_line}");
            }

            writeln!(buf, "[{timestamp}] {} {}", color_level(record.level()), record.args())
        })
        .filter(None, level_filter(verbose))
        .init();
}
