use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;
use walkdir::WalkDir;

use crate::export::{FileDescriptor, load_export};
use crate::fetch::Fetcher;
use crate::logging::LogSink;
use crate::{AppError, Result};

/// Export documents mapped to the files downloaded from each, in discovery order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    exports: Vec<(PathBuf, Vec<PathBuf>)>,
    index: HashMap<PathBuf, usize>,
}

impl DownloadReport {
    /// Record the downloads of one export, replacing any earlier record for it.
    pub fn insert(&mut self, export_path: PathBuf, downloaded: Vec<PathBuf>) {
        match self.index.get(&export_path) {
            Some(&i) => {
                if let Some((_, existing)) = self.exports.get_mut(i) {
                    *existing = downloaded;
                }
            }
            None => {
                self.index.insert(export_path.clone(), self.exports.len());
                self.exports.push((export_path, downloaded));
            }
        }
    }

    pub fn get(&self, export_path: &Path) -> Option<&[PathBuf]> {
        let &i = self.index.get(export_path)?;
        self.exports.get(i).map(|(_, d)| d.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[PathBuf])> {
        self.exports
            .iter()
            .map(|(p, d)| (p.as_path(), d.as_slice()))
    }

    pub fn merge(&mut self, other: DownloadReport) {
        for (export_path, downloaded) in other.exports {
            self.insert(export_path, downloaded);
        }
    }

    /// Number of export documents processed.
    pub fn len(&self) -> usize {
        self.exports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }

    pub fn total_downloaded(&self) -> usize {
        self.exports.iter().map(|(_, d)| d.len()).sum()
    }
}

/// Outcome of processing every input path given on the command line.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub report: DownloadReport,
    pub skipped_inputs: usize,
}

pub struct Downloader<F, S> {
    token: String,
    fetcher: F,
    sink: S,
    dry_run: bool,
}

impl<F: Fetcher, S: LogSink> Downloader<F, S> {
    pub fn new(token: impl Into<String>, fetcher: F, sink: S) -> Self {
        Self {
            token: token.into(),
            fetcher,
            sink,
            dry_run: false,
        }
    }

    /// Compute and log destinations without creating directories or fetching.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Dispatch each input to the single-export downloader or the tree walker.
    /// Inputs that are neither a file nor a directory are skipped.
    pub fn run(&self, inputs: &[PathBuf], output_dir: &Path) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for input in inputs {
            if input.is_file() {
                let downloaded = self.download_from_export(input, output_dir)?;
                summary.report.insert(input.clone(), downloaded);
            } else if input.is_dir() {
                let report = self.download_from_export_directory(input, output_dir)?;
                summary.report.merge(report);
            } else {
                self.sink.warning(&format!(
                    "Skipping {}, not a directory or file.",
                    input.display()
                ));
                summary.skipped_inputs += 1;
            }
        }

        Ok(summary)
    }

    /// Download every attachment referenced by one export document into
    /// `output_dir`.
    ///
    /// Descriptors that cannot be downloaded are logged and left out of the
    /// returned list. A document that cannot be read or parsed is an error.
    pub fn download_from_export(&self, export_path: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = load_export(export_path)?;

        let mut downloaded = Vec::new();
        for entry in &entries {
            for reason in &entry.rejected_files {
                self.sink.warning(&format!(
                    "Skipping unreadable file entry in {}: {}",
                    export_path.display(),
                    reason
                ));
            }

            for file in entry.files.iter().flatten() {
                if let Some(path) = self.download_file(file, output_dir)? {
                    downloaded.push(path);
                }
            }
        }

        Ok(downloaded)
    }

    /// Walk `export_root` for JSON files and download their attachments into
    /// the matching subdirectory of `base_output_dir`.
    pub fn download_from_export_directory(
        &self,
        export_root: &Path,
        base_output_dir: &Path,
    ) -> Result<DownloadReport> {
        let mut report = DownloadReport::default();

        for entry in WalkDir::new(export_root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    self.sink.warning(&format!("Skipping unreadable entry: {}", e));
                    continue;
                }
            };

            let path = entry.path();
            if !is_json_file(path) {
                continue;
            }

            let output_dir = mirrored_output_dir(export_root, base_output_dir, path);

            self.sink.info(&format!("Processing {}", path.display()));

            // A parse failure here ends the whole walk.
            let downloaded = self.download_from_export(path, &output_dir)?;
            report.insert(path.to_path_buf(), downloaded);
        }

        Ok(report)
    }

    fn download_file(&self, file: &FileDescriptor, output_dir: &Path) -> Result<Option<PathBuf>> {
        let (url, name) = match (file.download_url(), file.name()) {
            (None, _) => {
                self.sink.warning(&format!(
                    "Cannot download entry with id={}: no \"url_private_download\" key.",
                    file.id().unwrap_or("unknown")
                ));
                return Ok(None);
            }
            (Some(url), None) => {
                self.sink.warning(&format!(
                    "Cannot download file with URL {}, no \"name\" key.",
                    url
                ));
                return Ok(None);
            }
            (Some(url), Some(name)) => (url, name),
        };

        let Some(file_name) = Path::new(name).file_name() else {
            self.sink.warning(&format!(
                "Cannot download file with URL {}, unusable name {:?}.",
                url, name
            ));
            return Ok(None);
        };
        let file_path = output_dir.join(file_name);

        if self.dry_run {
            self.sink.info(&format!(
                "Would download {} to {}",
                name,
                file_path.display()
            ));
            return Ok(Some(file_path));
        }

        fs::create_dir_all(output_dir).map_err(|e| AppError::CreateDir {
            path: output_dir.display().to_string(),
            source: e,
        })?;

        let fetched = match self.fetcher.fetch(url, &self.token) {
            Ok(fetched) => fetched,
            Err(e) => {
                self.sink.error(&format!("Failed to download {}: {}", name, e));
                return Ok(None);
            }
        };

        if fetched.status != 200 {
            self.sink.error(&format!(
                "Failed to download {}: status code = {}",
                name, fetched.status
            ));
            return Ok(None);
        }

        let file_path = if file_path.exists() {
            unique_path(&file_path)
        } else {
            file_path
        };

        fs::write(&file_path, &fetched.body).map_err(|e| AppError::WriteFile {
            path: file_path.display().to_string(),
            source: e,
        })?;

        self.sink
            .info(&format!("Downloaded {} to {}", name, file_path.display()));

        Ok(Some(file_path))
    }
}

fn is_json_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        && path.is_file()
}

/// `base_output_dir` joined with the path of `file`'s directory relative to
/// `export_root`.
fn mirrored_output_dir(export_root: &Path, base_output_dir: &Path, file: &Path) -> PathBuf {
    let relative = file
        .parent()
        .and_then(|dir| dir.strip_prefix(export_root).ok())
        .unwrap_or_else(|| Path::new(""));

    if relative.as_os_str().is_empty() {
        base_output_dir.to_path_buf()
    } else {
        base_output_dir.join(relative)
    }
}

/// `report.pdf` becomes `report_<uuid>.pdf`, retried until nothing exists there.
fn unique_path(path: &Path) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default();

    loop {
        let mut name = OsString::from(stem);
        name.push("_");
        name.push(Uuid::new_v4().to_string());
        if let Some(ext) = path.extension() {
            name.push(".");
            name.push(ext);
        }

        let candidate = path.with_file_name(name);
        if !candidate.exists() {
            return candidate;
        }
    }
}
