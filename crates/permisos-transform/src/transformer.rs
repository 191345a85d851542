//! Directory and jar transformation
//!
//! Inputs are indexed first so that every patcher sees the full set of
//! known classes, then class units are patched in parallel on a dedicated
//! rayon pool. Outputs are written to a sibling `.tmp` file and renamed into
//! place.

use crate::error::{TransformError, TransformResult};
use crate::patcher::{BinaryPatcher, ClassIndex};
use permisos_compiler::Config;
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const CLASS_SUFFIX: &str = ".class";
const JAR_EXTENSION: &str = "jar";

/// Settings for one transformer run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOptions {
    /// Field descriptor of the marker annotation
    pub marker_descriptor: String,
    /// Prefix of generated type names
    pub prefix: String,
    /// Copy units that were not rewritten (directory inputs only)
    pub copy_non_transformed: bool,
    /// Worker threads
    pub workers: usize,
}

impl TransformOptions {
    /// Options derived from `permisos.toml`
    pub fn from_config(config: &Config) -> Self {
        Self {
            marker_descriptor: config.marker_descriptor(),
            prefix: config.prefix.clone(),
            copy_non_transformed: config.copy_non_transformed,
            workers: config.worker_count(),
        }
    }
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// What a run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformSummary {
    /// Class units examined
    pub scanned: usize,
    /// Units rewritten, by relative path or entry name, sorted
    pub transformed: Vec<String>,
    /// Units copied through unchanged
    pub copied: usize,
}

/// One class unit read from an input
struct Unit {
    name: String,
    bytes: Vec<u8>,
}

/// Applies the [`BinaryPatcher`] to whole inputs
#[derive(Debug)]
pub struct ClassTransformer {
    options: TransformOptions,
    index: ClassIndex,
}

impl ClassTransformer {
    /// Create a transformer with an empty class index
    pub fn new(options: TransformOptions) -> Self {
        Self {
            options,
            index: ClassIndex::new(),
        }
    }

    /// The class index built so far
    pub fn index(&self) -> &ClassIndex {
        &self.index
    }

    /// Add every class under `path` (directory or jar) to the index
    pub fn index_path(&mut self, path: &Path) -> TransformResult<()> {
        if path.is_dir() {
            for (relative, _) in walk(path)? {
                if let Some(internal) = relative.strip_suffix(CLASS_SUFFIX) {
                    self.index.insert(internal);
                }
            }
        } else if is_jar(path) {
            let archive = open_jar(path)?;
            for entry in archive.file_names() {
                if let Some(internal) = entry.strip_suffix(CLASS_SUFFIX) {
                    self.index.insert(internal);
                }
            }
        } else {
            return Err(TransformError::UnsupportedInput(path.to_path_buf()));
        }
        tracing::debug!(path = %path.display(), classes = self.index.len(), "indexed");
        Ok(())
    }

    /// Transform `input` into `output`
    ///
    /// `input` must already be indexed along with its classpath. A directory
    /// input produces a directory; a jar input produces a jar.
    pub fn transform(&self, input: &Path, output: &Path) -> TransformResult<TransformSummary> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.workers.max(1))
            .build()?;
        if input.is_dir() {
            pool.install(|| self.transform_directory(input, output))
        } else if is_jar(input) {
            pool.install(|| self.transform_jar(input, output))
        } else {
            Err(TransformError::UnsupportedInput(input.to_path_buf()))
        }
    }

    fn patcher(&self) -> BinaryPatcher<'_> {
        BinaryPatcher::new(&self.options.marker_descriptor, &self.options.prefix, &self.index)
    }

    fn transform_directory(&self, input: &Path, output: &Path) -> TransformResult<TransformSummary> {
        let files = walk(input)?;
        let patcher = self.patcher();
        let copy = self.options.copy_non_transformed;

        let outcomes = files
            .par_iter()
            .map(|(relative, path)| -> TransformResult<Outcome> {
                let destination = output.join(relative);
                if !relative.ends_with(CLASS_SUFFIX) {
                    if copy {
                        publish(&destination, &read(path)?)?;
                        return Ok(Outcome::Copied);
                    }
                    return Ok(Outcome::Other);
                }
                let bytes = read(path)?;
                match patcher.transform_class(&bytes, relative)? {
                    Some(patched) => {
                        publish(&destination, &patched)?;
                        Ok(Outcome::Transformed(relative.clone()))
                    }
                    None if copy => {
                        publish(&destination, &bytes)?;
                        Ok(Outcome::CopiedClass)
                    }
                    None => Ok(Outcome::Unchanged),
                }
            })
            .collect::<TransformResult<Vec<_>>>()?;

        Ok(summarize(outcomes))
    }

    fn transform_jar(&self, input: &Path, output: &Path) -> TransformResult<TransformSummary> {
        let mut archive = open_jar(input)?;

        let mut units = Vec::new();
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| TransformError::archive(input, e))?;
            if entry.is_dir() || !entry.name().ends_with(CLASS_SUFFIX) {
                continue;
            }
            let mut bytes = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut bytes)
                .map_err(|e| TransformError::io(input, e))?;
            units.push(Unit {
                name: entry.name().to_string(),
                bytes,
            });
        }
        let scanned = units.len();

        let patcher = self.patcher();
        let rewritten = units
            .par_iter()
            .map(|unit| {
                patcher
                    .transform_class(&unit.bytes, &unit.name)
                    .map(|patched| patched.map(|bytes| (unit.name.clone(), bytes)))
            })
            .collect::<TransformResult<Vec<_>>>()?;
        let mut rewritten: Vec<(String, Vec<u8>)> = rewritten.into_iter().flatten().collect();
        rewritten.sort_by(|a, b| a.0.cmp(&b.0));

        let tmp = tmp_path(output);
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|e| TransformError::io(parent, e))?;
        }
        let file = File::create(&tmp).map_err(|e| TransformError::io(&tmp, e))?;
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        let mut copied = 0;
        for i in 0..archive.len() {
            let entry = archive
                .by_index_raw(i)
                .map_err(|e| TransformError::archive(input, e))?;
            let name = entry.name().to_string();
            match rewritten.binary_search_by(|(n, _)| n.as_str().cmp(&name)) {
                Ok(position) => {
                    drop(entry);
                    writer
                        .start_file(name.as_str(), options)
                        .map_err(|e| TransformError::archive(output, e))?;
                    writer
                        .write_all(&rewritten[position].1)
                        .map_err(|e| TransformError::io(output, e))?;
                }
                Err(_) => {
                    writer
                        .raw_copy_file(entry)
                        .map_err(|e| TransformError::archive(output, e))?;
                    copied += 1;
                }
            }
        }
        let file = writer
            .finish()
            .map_err(|e| TransformError::archive(output, e))?;
        file.sync_all().map_err(|e| TransformError::io(&tmp, e))?;
        fs::rename(&tmp, output).map_err(|e| TransformError::io(output, e))?;

        Ok(TransformSummary {
            scanned,
            transformed: rewritten.into_iter().map(|(name, _)| name).collect(),
            copied,
        })
    }
}

enum Outcome {
    Transformed(String),
    CopiedClass,
    Copied,
    Unchanged,
    Other,
}

fn summarize(outcomes: Vec<Outcome>) -> TransformSummary {
    let mut summary = TransformSummary::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Transformed(name) => {
                summary.scanned += 1;
                summary.transformed.push(name);
            }
            Outcome::CopiedClass => {
                summary.scanned += 1;
                summary.copied += 1;
            }
            Outcome::Copied => summary.copied += 1,
            Outcome::Unchanged => summary.scanned += 1,
            Outcome::Other => {}
        }
    }
    summary.transformed.sort();
    summary
}

fn is_jar(path: &Path) -> bool {
    path.is_file() && path.extension().map_or(false, |e| e == JAR_EXTENSION)
}

fn open_jar(path: &Path) -> TransformResult<zip::ZipArchive<File>> {
    let file = File::open(path).map_err(|e| TransformError::io(path, e))?;
    zip::ZipArchive::new(file).map_err(|e| TransformError::archive(path, e))
}

fn read(path: &Path) -> TransformResult<Vec<u8>> {
    fs::read(path).map_err(|e| TransformError::io(path, e))
}

/// Every regular file under `root` as (`/`-separated relative path, absolute path), sorted
fn walk(root: &Path) -> TransformResult<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir).map_err(|e| TransformError::io(&dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| TransformError::io(&dir, e))?.path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            files.push((relative, path));
        }
    }
    files.sort();
    Ok(files)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `bytes` to `path` through a temporary file and rename
fn publish(path: &Path, bytes: &[u8]) -> TransformResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| TransformError::io(parent, e))?;
    }
    let tmp = tmp_path(path);
    let mut file = File::create(&tmp).map_err(|e| TransformError::io(&tmp, e))?;
    file.write_all(bytes).map_err(|e| TransformError::io(&tmp, e))?;
    file.sync_all().map_err(|e| TransformError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| TransformError::io(path, e))
}
