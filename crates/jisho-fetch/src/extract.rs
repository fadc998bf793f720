use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};

use jisho_core::StageOutcome;
use tokio_util::sync::CancellationToken;

use crate::{FetchError, finish_partial, partial_path};

const COPY_CHUNK: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Tar,
    Zip,
}

impl ArchiveFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".tgz") || name.ends_with(".tar.gz") {
            Some(ArchiveFormat::TarGz)
        } else if name.ends_with(".tar") {
            Some(ArchiveFormat::Tar)
        } else if name.ends_with(".zip") {
            Some(ArchiveFormat::Zip)
        } else {
            None
        }
    }
}

/// Unpack the one top-level `.json` member of `archive` into `output`.
///
/// Blocking; run it on the blocking pool. Zero or several candidate members
/// fail with [`FetchError::Archive`].
pub fn extract_single_entry(
    archive: &Path,
    output: &Path,
    cancel: &CancellationToken,
) -> Result<StageOutcome<PathBuf>, FetchError> {
    let format = ArchiveFormat::from_path(archive).ok_or_else(|| {
        FetchError::Archive(format!("unsupported archive format: {}", archive.display()))
    })?;

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!("Extracting {} ({:?})", archive.display(), format);

    let partial = partial_path(output);
    let result = match format {
        ArchiveFormat::TarGz => File::open(archive)
            .map_err(FetchError::from)
            .and_then(|f| {
                let gz = flate2::read::GzDecoder::new(BufReader::new(f));
                extract_tar(gz, &partial, cancel)
            }),
        ArchiveFormat::Tar => File::open(archive)
            .map_err(FetchError::from)
            .and_then(|f| extract_tar(BufReader::new(f), &partial, cancel)),
        ArchiveFormat::Zip => extract_zip(archive, &partial, cancel),
    };

    if let Ok(StageOutcome::Completed(member)) = &result {
        tracing::info!("Extracted {} to {}", member, output.display());
    }

    finish_partial(&partial, output, result)
}

/// A direct child of the archive root named `*.json`
fn is_top_level_json(path: &Path) -> bool {
    let mut parts = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir));

    match (parts.next(), parts.next()) {
        (Some(Component::Normal(name)), None) => name
            .to_str()
            .is_some_and(|n| n.to_ascii_lowercase().ends_with(".json")),
        _ => false,
    }
}

fn extract_tar<R: Read>(
    reader: R,
    partial: &Path,
    cancel: &CancellationToken,
) -> Result<StageOutcome<String>, FetchError> {
    let mut archive = tar::Archive::new(reader);
    let mut extracted: Option<String> = None;

    // Tar is sequential: the member is streamed out when seen, and the rest of
    // the archive is still scanned so a second candidate fails the extraction.
    for entry in archive.entries().map_err(FetchError::archive)? {
        if cancel.is_cancelled() {
            return Ok(StageOutcome::Cancelled);
        }

        let mut entry = entry.map_err(FetchError::archive)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry.path().map_err(FetchError::archive)?.into_owned();
        if !is_top_level_json(&path) {
            continue;
        }

        let name = path.to_string_lossy().into_owned();
        if let Some(first) = &extracted {
            return Err(FetchError::Archive(format!(
                "expected exactly one JSON member, found {first} and {name}"
            )));
        }

        if copy_cancellable(&mut entry, partial, cancel)?.is_cancelled() {
            return Ok(StageOutcome::Cancelled);
        }
        extracted = Some(name);
    }

    extracted
        .map(StageOutcome::Completed)
        .ok_or_else(|| FetchError::Archive("archive contains no top-level JSON member".into()))
}

fn extract_zip(
    archive: &Path,
    partial: &Path,
    cancel: &CancellationToken,
) -> Result<StageOutcome<String>, FetchError> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(BufReader::new(file)).map_err(FetchError::archive)?;

    let mut candidates = Vec::new();
    for i in 0..zip.len() {
        let member = zip.by_index(i).map_err(FetchError::archive)?;
        if member.is_file() && is_top_level_json(Path::new(member.name())) {
            candidates.push((i, member.name().to_string()));
        }
    }

    let (index, name) = match candidates.as_slice() {
        [] => {
            return Err(FetchError::Archive(
                "archive contains no top-level JSON member".into(),
            ));
        }
        [single] => single.clone(),
        [first, second, ..] => {
            return Err(FetchError::Archive(format!(
                "expected exactly one JSON member, found {} and {}",
                first.1, second.1
            )));
        }
    };

    let mut member = zip.by_index(index).map_err(FetchError::archive)?;
    Ok(copy_cancellable(&mut member, partial, cancel)?.map(|_| name))
}

/// Copy in fixed chunks, checking the token between chunks
fn copy_cancellable<R: Read>(
    reader: &mut R,
    destination: &Path,
    cancel: &CancellationToken,
) -> Result<StageOutcome<u64>, FetchError> {
    let mut writer = BufWriter::with_capacity(128 * 1024, File::create(destination)?);
    let mut buf = vec![0u8; COPY_CHUNK];
    let mut copied = 0u64;

    loop {
        if cancel.is_cancelled() {
            return Ok(StageOutcome::Cancelled);
        }

        let n = reader.read(&mut buf).map_err(FetchError::archive)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n])?;
        copied += n as u64;
    }

    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(StageOutcome::Completed(copied))
}
