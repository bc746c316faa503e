mod common;

use common::{build_extension_zip, collect_all_files, write_test_crx, wrap_crx2, MANIFEST};
use crx_fetch::{
    crx::{decode, ContainerFormat, DecodeError},
    output::{convert_file, extract_to_directory, save_package, SaveOptions},
    store::ExtensionId,
};
use std::fs;
use tempfile::TempDir;
use zip::ZipArchive;

const EXTENSION_ID: &str = "gppongmhjkpfnbhagpmjfkannfbllamg";

fn extension_id() -> ExtensionId {
    ExtensionId::parse(EXTENSION_ID).expect("Test ID should be valid")
}

#[test]
fn test_end_to_end_crx_extraction() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let crx_path = write_test_crx(temp_dir.path(), "test-extension.crx");

    let (zip_path, package) = convert_file(&crx_path, None).expect("Failed to convert CRX file");

    assert_eq!(zip_path, temp_dir.path().join("test-extension.zip"));
    assert_eq!(package.format, ContainerFormat::Crx3);
    assert_eq!(fs::read(&zip_path).unwrap(), build_extension_zip());

    let extract_dir = temp_dir.path().join("test-extension");
    extract_to_directory(&package.zip, &extract_dir).expect("Failed to extract ZIP contents");

    let manifest = fs::read_to_string(extract_dir.join("manifest.json"))
        .expect("Should be able to read manifest.json");
    assert_eq!(manifest, MANIFEST);
    assert!(extract_dir.join("icons").is_dir());
    assert!(extract_dir.join("icons/icon16.png").is_file());
}

#[test]
fn test_extraction_matches_archive_sizes() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let data = wrap_crx2(b"public-key", b"signature", &build_extension_zip());
    let package = decode(&data).expect("Failed to parse crx");

    let extract_path = temp_dir.path().join("my-extension");
    extract_to_directory(&package.zip, &extract_path).expect("Failed to extract zip contents");

    let mut archive =
        ZipArchive::new(std::io::Cursor::new(package.zip.as_bytes())).expect("Should read zip");

    for i in 0..archive.len() {
        let file = archive.by_index(i).expect("Should be able to read zip entry");
        let Some(file_path) = file.enclosed_name() else {
            continue;
        };
        let extracted = extract_path.join(file_path);

        if file.name().ends_with('/') {
            assert!(extracted.is_dir(), "{} should exist", extracted.display());
        } else {
            let size = fs::metadata(&extracted)
                .expect("Should be able to get file metadata")
                .len();
            assert_eq!(size, file.size(), "size mismatch for {}", extracted.display());
        }
    }
}

#[test]
fn test_convert_to_explicit_output() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let crx_path = write_test_crx(temp_dir.path(), "ext.crx");
    let output = temp_dir.path().join("out/nested/ext.zip");

    let (zip_path, _) = convert_file(&crx_path, Some(output.as_path())).expect("Failed to convert");

    assert_eq!(zip_path, output);
    assert!(output.is_file());
}

#[test]
fn test_convert_rejects_non_crx_contents() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let crx_path = temp_dir.path().join("broken.crx");
    fs::write(&crx_path, b"definitely not an extension").unwrap();

    let err = convert_file(&crx_path, None).unwrap_err();

    assert_eq!(
        err.downcast_ref::<DecodeError>(),
        Some(&DecodeError::NotAContainer)
    );
    assert!(!temp_dir.path().join("broken.zip").exists());
}

#[test]
fn test_save_package_cleans_up_crx() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let options = SaveOptions {
        output_dir: temp_dir.path().join("downloads"),
        file_name: Some("wappalyzer".to_string()),
        keep_crx: false,
    };
    let data = wrap_crx2(b"key", b"sig", &build_extension_zip());

    let saved = save_package(&data, &extension_id(), &options).expect("Failed to save package");

    assert_eq!(saved.zip_path, options.output_dir.join("wappalyzer.zip"));
    assert!(saved.crx_path.is_none());
    assert_eq!(
        collect_all_files(&options.output_dir),
        vec![options.output_dir.join("wappalyzer.zip")]
    );
}

#[test]
fn test_save_package_keeps_crx_when_asked() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let options = SaveOptions {
        output_dir: temp_dir.path().to_path_buf(),
        file_name: None,
        keep_crx: true,
    };
    let data = wrap_crx2(b"key", b"sig", &build_extension_zip());

    let saved = save_package(&data, &extension_id(), &options).expect("Failed to save package");

    let crx_path = saved.crx_path.expect("CRX path should be reported");
    assert_eq!(crx_path, temp_dir.path().join(format!("{EXTENSION_ID}.crx")));
    assert_eq!(fs::read(&crx_path).unwrap(), data);
    assert_eq!(
        saved.zip_path,
        temp_dir.path().join(format!("{EXTENSION_ID}.zip"))
    );
}

#[test]
fn test_save_package_writes_nothing_on_unsupported_version() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let options = SaveOptions {
        output_dir: temp_dir.path().join("downloads"),
        ..SaveOptions::default()
    };
    let mut data = b"Cr24\x04\x00\x00\x00".to_vec();
    data.extend_from_slice(&build_extension_zip());

    let err = save_package(&data, &extension_id(), &options).unwrap_err();

    assert_eq!(
        err.downcast_ref::<DecodeError>(),
        Some(&DecodeError::UnsupportedVersion(4))
    );
    assert!(collect_all_files(&options.output_dir).is_empty());
}

#[test]
fn test_multiple_extractions_are_identical() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let package = decode(&wrap_crx2(b"k", b"s", &build_extension_zip())).unwrap();

    let first = temp_dir.path().join("extraction1");
    let second = temp_dir.path().join("nested/extraction2");
    extract_to_directory(&package.zip, &first).unwrap();
    extract_to_directory(&package.zip, &second).unwrap();

    let relative = |root: &std::path::Path| -> Vec<(String, Vec<u8>)> {
        collect_all_files(root)
            .into_iter()
            .map(|path| {
                let name = path.strip_prefix(root).unwrap().to_string_lossy().to_string();
                let contents = fs::read(&path).unwrap();
                (name, contents)
            })
            .collect()
    };

    let first_files = relative(first.as_path());
    assert_eq!(first_files.len(), 4);
    assert_eq!(first_files, relative(second.as_path()));
}

#[test]
fn test_extract_rejects_invalid_zip() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    assert!(extract_to_directory(b"PK\x03\x04garbage", temp_dir.path()).is_err());
}
