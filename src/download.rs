use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::api::ZoomClient;
use crate::error::DownloadError;
use crate::recording::{Recording, with_suffix};

const PART_SUFFIX: &str = ".part";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub path: PathBuf,
    pub bytes: u64,
}

#[derive(Debug)]
pub struct DownloadOutcome {
    pub recording_id: String,
    pub result: Result<SavedFile, DownloadError>,
}

#[derive(Debug, Default)]
pub struct DownloadReport {
    pub outcomes: Vec<DownloadOutcome>,
}

impl DownloadReport {
    pub fn saved(&self) -> impl Iterator<Item = &SavedFile> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &DownloadError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.recording_id.as_str(), e)))
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn log_summary(&self) {
        let saved = self.saved().count();
        let bytes: u64 = self.saved().map(|f| f.bytes).sum();
        let failed = self.outcomes.len() - saved;

        if failed == 0 {
            tracing::info!("Finished! {saved} recordings saved ({bytes} bytes)");
            return;
        }

        tracing::warn!(
            "Finished with errors: {saved} of {} recordings saved, {failed} failed",
            self.outcomes.len()
        );
        for (id, err) in self.failures() {
            tracing::warn!("  {id}: {err}");
        }
    }
}

/// Download every recording in order, carrying on past individual failures
pub async fn download_all(
    client: &mut ZoomClient,
    recordings: &[Recording],
    dir: &Path,
) -> DownloadReport {
    let mut report = DownloadReport::default();
    let mut taken = HashSet::new();

    for recording in recordings {
        tracing::trace!(metadata = %recording.raw, "Recording {}", recording.id);
        let name = claim_name(recording, &mut taken);
        let result = download_recording(client, recording, dir, &name).await;
        match &result {
            Ok(saved) => tracing::info!("Saved {} ({} bytes)", saved.path.display(), saved.bytes),
            Err(err) => tracing::warn!("Skipping recording {}: {err}", recording.id),
        }
        report.outcomes.push(DownloadOutcome {
            recording_id: recording.id.clone(),
            result,
        });
    }

    report
}

fn claim_name(recording: &Recording, taken: &mut HashSet<String>) -> String {
    let name = recording.file_name();
    if taken.insert(name.clone()) {
        return name;
    }

    let mut attempt = 1;
    loop {
        let suffix = match attempt {
            1 => recording.id.clone(),
            n => format!("{}_{n}", recording.id),
        };
        let candidate = with_suffix(&name, &suffix);
        if taken.insert(candidate.clone()) {
            tracing::warn!(
                "{name} is already used by another recording, saving {} as {candidate}",
                recording.id
            );
            return candidate;
        }
        attempt += 1;
    }
}

/// Stream one recording into `dir/name`, replacing any file already there
pub async fn download_recording(
    client: &mut ZoomClient,
    recording: &Recording,
    dir: &Path,
    name: &str,
) -> Result<SavedFile, DownloadError> {
    fs::create_dir_all(dir).await.map_err(|source| DownloadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(name);
    let part = part_path(&path);

    let res = client.get_media(&recording.download_url).await?;
    let expected = res.content_length();

    let bytes = match write_body(res, &part).await {
        Ok(bytes) => bytes,
        Err(err) => {
            discard(&part).await;
            return Err(err);
        }
    };

    finalize(&part, path, expected, bytes).await
}

async fn finalize(
    part: &Path,
    path: PathBuf,
    expected: Option<u64>,
    bytes: u64,
) -> Result<SavedFile, DownloadError> {
    if let Some(expected) = expected.filter(|&len| len != bytes) {
        discard(part).await;
        return Err(DownloadError::Truncated {
            expected,
            actual: bytes,
        });
    }

    if let Err(source) = fs::rename(part, &path).await {
        discard(part).await;
        return Err(DownloadError::Io { path, source });
    }

    Ok(SavedFile { path, bytes })
}

// file is closed when this returns
async fn write_body(mut res: reqwest::Response, part: &Path) -> Result<u64, DownloadError> {
    let io_err = |source: std::io::Error| DownloadError::Io {
        path: part.to_path_buf(),
        source,
    };

    let mut file = File::create(part).await.map_err(io_err)?;
    let mut written = 0u64;
    while let Some(chunk) = res.chunk().await.map_err(DownloadError::Request)? {
        file.write_all(&chunk).await.map_err(io_err)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(io_err)?;

    Ok(written)
}

async fn discard(part: &Path) {
    match fs::remove_file(part).await {
        Err(err) if err.kind() != std::io::ErrorKind::NotFound => {
            tracing::debug!("Could not remove {}: {err}", part.display());
        }
        _ => {}
    }
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(PART_SUFFIX);
    PathBuf::from(name)
}
