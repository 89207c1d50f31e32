//! Log directory archiving.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

/// Zip every file under `log_dir` (recursively) except names on the
/// denylist, into a timestamped archive under `archive_dir`. Archive
/// entries are flat file names.
///
/// # Errors
///
/// Returns an error if the log directory cannot be walked or the archive
/// cannot be written.
pub async fn archive_logs(
    log_dir: PathBuf,
    denylist: Vec<String>,
    archive_dir: PathBuf,
) -> Result<PathBuf> {
    tokio::task::spawn_blocking(move || build_archive(&log_dir, &denylist, &archive_dir))
        .await
        .context("archive task failed")?
}

fn build_archive(log_dir: &Path, denylist: &[String], archive_dir: &Path) -> Result<PathBuf> {
    let mut files = Vec::new();
    collect_files(log_dir, &mut files)
        .with_context(|| format!("walking {}", log_dir.display()))?;

    let archive_path = archive_dir.join(format!("logs_{}.zip", Utc::now().timestamp()));
    let file = File::create(&archive_path)
        .with_context(|| format!("creating {}", archive_path.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in files {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if denylist.iter().any(|denied| denied == name) {
            continue;
        }
        zip.start_file(name, options)
            .with_context(|| format!("adding {name} to archive"))?;
        let mut source =
            File::open(&path).with_context(|| format!("opening {}", path.display()))?;
        io::copy(&mut source, &mut zip)
            .with_context(|| format!("compressing {}", path.display()))?;
    }

    zip.finish().context("finalizing archive")?;
    Ok(archive_path)
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}
