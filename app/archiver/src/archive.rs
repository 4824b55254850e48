use std::io;
use std::path::Path;
use std::path::PathBuf;

use chrono::DateTime;
use chrono::TimeDelta;
use chrono::Utc;
use framework::exception;
use framework::exception::CoreRsResult;
use framework::exception::Severity;
use framework::log;
use tokio::fs;
use tokio::fs::File;
use tracing::debug;
use tracing::info;
use tracing::warn;
use uuid::Uuid;

use crate::storage::Folder;
use crate::storage::UPLOAD_FAILED;
use crate::storage::UploadReceipt;

#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub is_regular_file: bool,
    // none if attributes can not be read
    pub last_modified: Option<DateTime<Utc>>,
}

/// Moves regular files older than `min_age` from `directory` into `folder`.
///
/// Returns names of archived files in directory enumeration order. With `preserve`, files are
/// uploaded but neither deleted nor returned. Nothing is touched if the folder is not writable.
pub async fn archive<F>(directory: &Path, folder: &F, min_age: TimeDelta, preserve: bool) -> Vec<String>
where
    F: Folder,
{
    let mut archived = Vec::new();

    let probe_name = Uuid::new_v4().to_string();
    if let Err(e) = folder.can_upload(&probe_name, 0).await {
        log::log_exception(&exception!(
            message = format!("cannot upload to folder, folder_id={}", folder.id()),
            source = e
        ));
        return archived;
    }

    let Some(cutoff) = Utc::now().checked_sub_signed(min_age) else {
        warn!("min age is out of range, nothing to archive, min_age={min_age}");
        return archived;
    };

    let candidates = match scan(directory).await {
        Ok(candidates) => candidates,
        Err(e) => {
            log::log_exception(&e);
            return archived;
        }
    };
    let eligible = select(&candidates, cutoff);
    debug!(
        candidate_files = candidates.len(),
        eligible_files = eligible.len(),
        "stats"
    );

    for path in eligible {
        let Some(name) = path.file_name().map(|name| name.to_string_lossy().into_owned()) else {
            continue;
        };

        let receipt = match transfer(folder, path, &name).await {
            Ok(receipt) => receipt,
            Err(e) => {
                log::log_exception(&exception!(
                    severity = Severity::Warn,
                    code = UPLOAD_FAILED,
                    message = format!("failed to archive file, name={name}"),
                    source = e
                ));
                continue;
            }
        };
        debug!(file_id = receipt.file_id, "uploaded file, name={}", receipt.name);

        if preserve {
            info!("uploaded file, keep original, name={name}");
            continue;
        }

        // remote copy exists, report as archived even if local copy can not be removed
        if let Err(err) = remove_if_exists(path).await {
            warn!("failed to delete archived file, path={}, error={err}", path.to_string_lossy());
        }
        info!("archived file, name={name}");
        archived.push(name);
    }

    debug!(archived_files = archived.len(), "stats");
    archived
}

pub async fn scan(directory: &Path) -> CoreRsResult<Vec<CandidateFile>> {
    let mut entries = fs::read_dir(directory).await.map_err(|err| {
        exception!(
            message = format!("failed to read directory, directory={}", directory.to_string_lossy()),
            source = err
        )
    })?;

    let mut candidates = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => candidates.push(candidate(entry.path()).await),
            Ok(None) => break,
            Err(err) => {
                warn!(
                    "failed to read directory entry, stop scanning, directory={}, error={err}",
                    directory.to_string_lossy()
                );
                break;
            }
        }
    }
    Ok(candidates)
}

async fn candidate(path: PathBuf) -> CandidateFile {
    // follows symlinks, a link to a regular file is archived as that file
    match fs::metadata(&path).await {
        Ok(metadata) => CandidateFile {
            is_regular_file: metadata.is_file(),
            last_modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            path,
        },
        Err(err) => {
            debug!("failed to read attributes, path={}, error={err}", path.to_string_lossy());
            CandidateFile {
                path,
                is_regular_file: false,
                last_modified: None,
            }
        }
    }
}

pub fn select(candidates: &[CandidateFile], cutoff: DateTime<Utc>) -> Vec<&Path> {
    candidates
        .iter()
        .filter(|candidate| {
            candidate.is_regular_file && candidate.last_modified.is_some_and(|modified| modified <= cutoff)
        })
        .map(|candidate| candidate.path.as_path())
        .collect()
}

// file handle is moved into upload and closed when it returns, success or not
async fn transfer<F>(folder: &F, path: &Path, name: &str) -> CoreRsResult<UploadReceipt>
where
    F: Folder,
{
    let file = File::open(path).await.map_err(|err| {
        exception!(
            message = format!("failed to open file, path={}", path.to_string_lossy()),
            source = err
        )
    })?;
    folder.upload(file, name).await
}

async fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path).await {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}
