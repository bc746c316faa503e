#![allow(dead_code)]

use std::{
    fs,
    io::{Cursor, Write},
    path::{Path, PathBuf},
};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

pub const MANIFEST: &str = r#"{"manifest_version": 3, "name": "Test Extension", "version": "1.0.0"}"#;

/// A small extension archive with a nested directory.
pub fn build_extension_zip() -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let files: [(&str, &[u8]); 4] = [
        ("manifest.json", MANIFEST.as_bytes()),
        ("background.js", b"chrome.runtime.onInstalled.addListener(() => {});"),
        ("popup.html", b"<html><body>popup</body></html>"),
        ("icons/icon16.png", &[0x89, b'P', b'N', b'G', 0, 1, 2, 3]),
    ];

    writer
        .add_directory("icons/", options)
        .expect("Failed to add directory");

    for (name, contents) in files {
        writer
            .start_file(name, options)
            .expect("Failed to start zip entry");
        writer.write_all(contents).expect("Failed to write zip entry");
    }

    writer.finish().expect("Failed to finish zip").into_inner()
}

pub fn wrap_crx2(key: &[u8], signature: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut data = b"Cr24".to_vec();
    data.extend_from_slice(&2u32.to_le_bytes());
    data.extend_from_slice(&(key.len() as u32).to_le_bytes());
    data.extend_from_slice(&(signature.len() as u32).to_le_bytes());
    data.extend_from_slice(key);
    data.extend_from_slice(signature);
    data.extend_from_slice(payload);
    data
}

pub fn wrap_crx3(header: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut data = b"Cr24".to_vec();
    data.extend_from_slice(&3u32.to_le_bytes());
    data.extend_from_slice(&(header.len() as u32).to_le_bytes());
    data.extend_from_slice(header);
    data.extend_from_slice(payload);
    data
}

/// Writes a CRX3 test extension into `dir` and returns its path.
pub fn write_test_crx(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let data = wrap_crx3(&[0x12; 64], &build_extension_zip());
    fs::write(&path, data).expect("Failed to write test CRX");
    path
}

pub fn collect_all_files(dir: &Path) -> Vec<PathBuf> {
    fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() {
                    files.push(path);
                } else if path.is_dir() {
                    walk_dir(&path, files);
                }
            }
        }
    }

    let mut files = Vec::new();
    walk_dir(dir, &mut files);
    files.sort();
    files
}
