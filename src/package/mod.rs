//! Interchange archives for sharing components and assemblies.
//!
//! A package is a zip with `metadata.json` (descriptive fields), `data.json`
//! (the step sequence), and an `images/` directory holding every reference
//! image the steps click on. Export stages the layout in a scratch
//! directory, zips it into a temp file next to the destination, and renames
//! it into place, so a failed export never leaves a partial archive.
//! Import unpacks into a scratch directory and only touches the store after
//! the steps have parsed; a missing `metadata.json` degrades to empty
//! fields, a missing `data.json` fails the import.

pub mod manifest;

pub use manifest::{PackageKind, PackageMeta, FORMAT_VERSION};

use std::fs::{self, File};
use std::io::{Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::Utc;
use tempfile::{NamedTempFile, TempDir};
use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::{RepriseError, Result};
use crate::step::Step;
use crate::store::StepStore;

/// Descriptive fields supplied at export time.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub author: String,
    pub description: String,
    pub price: i64,
}

/// What an import stored.
#[derive(Debug, Clone)]
pub struct ImportReport {
    /// Name the item was stored under, after collision resolution.
    pub name: String,
    pub kind: PackageKind,
    /// Metadata as found in the archive, or empty placeholders.
    pub meta: PackageMeta,
    pub steps: Vec<Step>,
    pub images_imported: usize,
}

/// Export steps as a package archive at `out_path`.
pub fn export_package(
    kind: PackageKind,
    name: &str,
    steps: &[Step],
    opts: &ExportOptions,
    out_path: &Path,
) -> Result<()> {
    let parent = match out_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    // Stage next to the destination so the final rename stays on one
    // filesystem.
    let mut staged =
        NamedTempFile::new_in(parent).map_err(|e| write_error(out_path, e.to_string()))?;
    write_archive(staged.as_file_mut(), kind, name, steps, opts)
        .map_err(|e| write_error(out_path, format!("{:#}", e)))?;
    staged
        .persist(out_path)
        .map_err(|e| write_error(out_path, e.to_string()))?;

    info!("exported {} '{}' to {}", kind, name, out_path.display());
    Ok(())
}

/// Export steps as in-memory archive bytes, e.g. for a marketplace upload.
pub fn export_package_bytes(
    kind: PackageKind,
    name: &str,
    steps: &[Step],
    opts: &ExportOptions,
) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    write_archive(&mut cursor, kind, name, steps, opts)
        .map_err(|e| write_error(Path::new("<memory>"), format!("{:#}", e)))?;
    Ok(cursor.into_inner())
}

/// Import a package archive into `store`, copying its images under
/// `images_dir` and rewriting image steps to the new locations.
///
/// The stored name is `rename` if given, else the archive's metadata name,
/// else the archive's file stem; a taken name gets a numeric suffix.
pub fn import_package(
    archive: &Path,
    kind: PackageKind,
    rename: Option<&str>,
    store: &mut StepStore,
    images_dir: &Path,
) -> Result<ImportReport> {
    let file = File::open(archive).map_err(|e| read_error(archive, e.to_string()))?;
    let fallback = archive
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("imported")
        .to_string();
    import_from(file, archive, &fallback, kind, rename, store, images_dir)
}

/// Import archive bytes, e.g. a marketplace download.
pub fn import_package_bytes(
    bytes: &[u8],
    kind: PackageKind,
    rename: Option<&str>,
    store: &mut StepStore,
    images_dir: &Path,
) -> Result<ImportReport> {
    import_from(
        Cursor::new(bytes),
        Path::new("<download>"),
        "download",
        kind,
        rename,
        store,
        images_dir,
    )
}

fn import_from<R: Read + Seek>(
    reader: R,
    origin: &Path,
    fallback_name: &str,
    kind: PackageKind,
    rename: Option<&str>,
    store: &mut StepStore,
    images_dir: &Path,
) -> Result<ImportReport> {
    let scratch = TempDir::new()?;
    let mut zip = ZipArchive::new(reader).map_err(|e| read_error(origin, e.to_string()))?;
    zip.extract(scratch.path())
        .map_err(|e| read_error(origin, e.to_string()))?;

    // Steps are the one mandatory part.
    let data = fs::read_to_string(scratch.path().join("data.json"))
        .map_err(|_| read_error(origin, "data.json is missing"))?;
    let mut steps: Vec<Step> = serde_json::from_str(&data)
        .map_err(|e| read_error(origin, format!("data.json is invalid: {}", e)))?;

    let meta = read_metadata(scratch.path(), origin, kind);

    let (image_names, created) = stage_images(&scratch.path().join("images"), images_dir)?;
    rewrite_image_steps(&mut steps, &image_names, images_dir);

    let requested = rename
        .map(str::to_string)
        .or_else(|| (!meta.name.is_empty()).then(|| meta.name.clone()))
        .unwrap_or_else(|| fallback_name.to_string());
    let name = store.unique_name(&requested);
    if name != requested {
        info!("'{}' is already taken; storing as '{}'", requested, name);
    }

    store.insert(name.clone(), steps.clone());
    if let Err(err) = store.save() {
        // Leave the store exactly as it was before the import.
        store.remove(&name);
        for path in created {
            let _ = fs::remove_file(path);
        }
        return Err(err);
    }

    info!(
        "imported {} '{}' ({} steps, {} images) from {}",
        kind,
        name,
        steps.len(),
        image_names.len(),
        origin.display()
    );
    Ok(ImportReport {
        name,
        kind,
        meta,
        steps,
        images_imported: image_names.len(),
    })
}

/// Metadata is best-effort: absent or unreadable falls back to empty
/// placeholders, and a kind mismatch defers to the caller's choice.
fn read_metadata(scratch: &Path, origin: &Path, kind: PackageKind) -> PackageMeta {
    let text = match fs::read_to_string(scratch.join("metadata.json")) {
        Ok(text) => text,
        Err(_) => {
            warn!(
                "{} has no metadata.json; importing without descriptive fields",
                origin.display()
            );
            return PackageMeta::missing(kind);
        }
    };
    match serde_json::from_str::<PackageMeta>(&text) {
        Ok(meta) => {
            if meta.kind != kind {
                warn!(
                    "{} declares a {} but is being imported as a {}",
                    origin.display(),
                    meta.kind,
                    kind
                );
            }
            meta
        }
        Err(err) => {
            warn!(
                "metadata.json in {} is invalid: {}; importing without it",
                origin.display(),
                err
            );
            PackageMeta::missing(kind)
        }
    }
}

/// Copy staged images into `images_dir` by basename, overwriting same-named
/// files. Returns the imported basenames and the paths that did not exist
/// before, which the caller may remove to undo the import. On a copy
/// failure everything this call created is removed before returning.
fn stage_images(staged: &Path, images_dir: &Path) -> Result<(Vec<String>, Vec<PathBuf>)> {
    if !staged.is_dir() {
        return Ok((Vec::new(), Vec::new()));
    }
    fs::create_dir_all(images_dir)?;

    let mut imported = Vec::new();
    let mut created: Vec<PathBuf> = Vec::new();
    let outcome = (|| -> std::io::Result<()> {
        for entry in fs::read_dir(staged)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let dest = images_dir.join(&file_name);
            let existed = dest.exists();
            fs::copy(entry.path(), &dest)?;
            if !existed {
                created.push(dest);
            }
            if let Some(name) = file_name.to_str() {
                imported.push(name.to_string());
            }
        }
        Ok(())
    })();

    match outcome {
        Ok(()) => Ok((imported, created)),
        Err(err) => {
            for path in created {
                let _ = fs::remove_file(path);
            }
            Err(RepriseError::Io(err))
        }
    }
}

/// Point click-by-image steps at the copies under `images_dir`. Steps whose
/// image was not in the archive keep their original path.
fn rewrite_image_steps(steps: &mut [Step], imported: &[String], images_dir: &Path) {
    for step in steps {
        if let Step::ClickByImage(path) = step {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if imported.iter().any(|i| i == name) {
                    *path = images_dir.join(name);
                }
            }
        }
    }
}

fn write_archive<W: Write + Seek>(
    writer: &mut W,
    kind: PackageKind,
    name: &str,
    steps: &[Step],
    opts: &ExportOptions,
) -> anyhow::Result<()> {
    let scratch = TempDir::new()?;

    let meta = PackageMeta {
        kind,
        name: name.to_string(),
        version: FORMAT_VERSION.to_string(),
        export_date: Some(Utc::now()),
        author: opts.author.clone(),
        description: opts.description.clone(),
        price: opts.price,
    };
    fs::write(
        scratch.path().join("metadata.json"),
        serde_json::to_vec_pretty(&meta)?,
    )?;
    fs::write(
        scratch.path().join("data.json"),
        serde_json::to_vec_pretty(steps)?,
    )?;

    let images_dir = scratch.path().join("images");
    let mut image_names = Vec::new();
    for source in collect_images(steps) {
        let basename = source
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .with_context(|| format!("image path {} has no usable file name", source.display()))?;
        if image_names.is_empty() {
            fs::create_dir_all(&images_dir)?;
        }
        fs::copy(&source, images_dir.join(&basename))
            .with_context(|| format!("image {} referenced by a step is missing", source.display()))?;
        image_names.push(basename);
    }

    let mut zip = ZipWriter::new(writer);
    append_entry(&mut zip, &scratch.path().join("metadata.json"), "metadata.json")?;
    append_entry(&mut zip, &scratch.path().join("data.json"), "data.json")?;
    for name in &image_names {
        append_entry(&mut zip, &images_dir.join(name), &format!("images/{}", name))?;
    }
    zip.finish()?;
    Ok(())
}

fn append_entry<W: Write + Seek>(
    zip: &mut ZipWriter<&mut W>,
    source: &Path,
    entry: &str,
) -> anyhow::Result<()> {
    zip.start_file(entry, SimpleFileOptions::default())?;
    zip.write_all(&fs::read(source)?)?;
    Ok(())
}

/// Image paths referenced by the steps, deduplicated by basename; the first
/// occurrence of a basename wins.
fn collect_images(steps: &[Step]) -> Vec<PathBuf> {
    let mut seen: Vec<std::ffi::OsString> = Vec::new();
    let mut paths = Vec::new();
    for step in steps {
        if let Step::ClickByImage(path) = step {
            let Some(name) = path.file_name() else {
                continue;
            };
            if seen.iter().any(|s| s == name) {
                continue;
            }
            seen.push(name.to_os_string());
            paths.push(path.clone());
        }
    }
    paths
}

fn read_error(path: &Path, message: impl Into<String>) -> RepriseError {
    RepriseError::PackageReadError {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

fn write_error(path: &Path, message: impl Into<String>) -> RepriseError {
    RepriseError::PackageWriteError {
        path: path.to_path_buf(),
        message: message.into(),
    }
}
