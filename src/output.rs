use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};

use anyhow::Context;
use tracing::info;
use zip::ZipArchive;

use crate::{
    crx::{decode, CrxPackage},
    store::{fetch_package, ExtensionId, FetchConfig, HttpClient, UpdateRequest},
};

#[derive(Debug, Clone)]
pub struct SaveOptions {
    pub output_dir: PathBuf,
    /// Defaults to `<id>.zip`; `.zip` is appended when missing.
    pub file_name: Option<String>,
    pub keep_crx: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        SaveOptions {
            output_dir: PathBuf::from("downloads"),
            file_name: None,
            keep_crx: false,
        }
    }
}

#[derive(Debug)]
pub struct SavedPackage {
    pub zip_path: PathBuf,
    /// Set when the intermediate `.crx` was kept.
    pub crx_path: Option<PathBuf>,
    pub package: CrxPackage,
}

pub fn format_size(size_bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size_bytes < KB {
        format!("{} B", size_bytes)
    } else if size_bytes < MB {
        format!("{:.1} KB", size_bytes as f64 / KB as f64)
    } else if size_bytes < GB {
        format!("{:.1} MB", size_bytes as f64 / MB as f64)
    } else {
        format!("{:.1} GB", size_bytes as f64 / GB as f64)
    }
}

fn zip_file_name(id: &ExtensionId, file_name: Option<&str>) -> String {
    match file_name {
        Some(name) if name.ends_with(".zip") => name.to_string(),
        Some(name) => format!("{}.zip", name),
        None => format!("{}.zip", id),
    }
}

/// Writes `raw` as `<id>.crx`, decodes it, and writes the zip beside it.
///
/// If decoding or writing the zip fails the `.crx` is removed as well; a
/// [`crate::crx::DecodeError`] can be recovered with `downcast_ref`.
pub fn save_package(
    raw: &[u8],
    id: &ExtensionId,
    options: &SaveOptions,
) -> anyhow::Result<SavedPackage> {
    fs::create_dir_all(&options.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            options.output_dir.display()
        )
    })?;

    let crx_path = options.output_dir.join(format!("{}.crx", id));
    let zip_path = options
        .output_dir
        .join(zip_file_name(id, options.file_name.as_deref()));

    fs::write(&crx_path, raw)
        .with_context(|| format!("Failed to write {}", crx_path.display()))?;
    info!(
        "CRX file saved: {} ({})",
        crx_path.display(),
        format_size(raw.len() as u64)
    );

    let package = match decode_to_file(raw, &zip_path) {
        Ok(package) => package,
        Err(err) => {
            info!("Cleaning up CRX file after error: {}", crx_path.display());
            fs::remove_file(&crx_path).ok();
            return Err(err);
        }
    };

    let crx_path = if options.keep_crx {
        Some(crx_path)
    } else {
        info!("Cleaning up CRX file: {}", crx_path.display());
        fs::remove_file(&crx_path)
            .with_context(|| format!("Failed to remove {}", crx_path.display()))?;
        None
    };

    Ok(SavedPackage {
        zip_path,
        crx_path,
        package,
    })
}

fn decode_to_file(raw: &[u8], zip_path: &Path) -> anyhow::Result<CrxPackage> {
    let package = decode(raw)?;

    fs::write(zip_path, &package.zip)
        .with_context(|| format!("Failed to write {}", zip_path.display()))?;

    Ok(package)
}

/// Fetches `id` from the update service and hands the bytes to [`save_package`].
pub fn download_and_save<C: HttpClient + ?Sized>(
    client: &C,
    id: &ExtensionId,
    request: &UpdateRequest,
    fetch: &FetchConfig,
    options: &SaveOptions,
) -> anyhow::Result<SavedPackage> {
    let url = request.download_url(id);
    info!("Downloading extension {}", id);

    let raw = fetch_package(client, &url, fetch)
        .with_context(|| format!("Download failed for {}", id))?;

    save_package(&raw, id, options)
}

/// Converts a local CRX file. The zip goes to `output`, or next to `crx_path`
/// with its extension replaced.
pub fn convert_file(
    crx_path: &Path,
    output: Option<&Path>,
) -> anyhow::Result<(PathBuf, CrxPackage)> {
    let data = fs::read(crx_path)
        .with_context(|| format!("Failed to read {}", crx_path.display()))?;

    let package = decode(&data)?;

    let zip_path = match output {
        Some(path) => path.to_path_buf(),
        None => crx_path.with_extension("zip"),
    };

    if let Some(parent) = zip_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(&zip_path, &package.zip)
        .with_context(|| format!("Failed to write {}", zip_path.display()))?;

    Ok((zip_path, package))
}

pub fn extract_to_directory(zip_data: &[u8], extract_to: &Path) -> anyhow::Result<()> {
    let cursor = Cursor::new(zip_data);
    let mut archive = ZipArchive::new(cursor).context("Payload is not a readable zip archive")?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let outpath = match file.enclosed_name() {
            Some(path) => extract_to.join(path),
            None => continue,
        };

        if file.name().ends_with('/') {
            fs::create_dir_all(&outpath)?;
        } else {
            if let Some(p) = outpath.parent() {
                if !p.exists() {
                    fs::create_dir_all(p)?;
                }
            }
            let mut outfile = fs::File::create(&outpath)?;
            std::io::copy(&mut file, &mut outfile)?;
        }
    }

    Ok(())
}
