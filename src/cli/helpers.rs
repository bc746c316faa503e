use super::errors::CrxCliError;
use crate::Cli;
use clap::{error::ErrorKind, CommandFactory};
use crx_fetch::{
    crx::{CrxPackage, Integrity},
    output::format_size,
};
use std::path::Path;

const LISTED_ENTRIES: usize = 10;

pub fn exit_with_error(error: CrxCliError) -> ! {
    let mut cmd = Cli::command();
    cmd.error(ErrorKind::from(error.clone()), error.to_string()).exit()
}

pub fn print_summary(package: &CrxPackage, zip_path: &Path) {
    match &package.integrity {
        Integrity::Valid { entries } => {
            println!("Successfully converted to ZIP with {} files", entries.len());
            println!("Files in extension:");
            for name in entries.iter().take(LISTED_ENTRIES) {
                println!("  - {}", name);
            }
            if entries.len() > LISTED_ENTRIES {
                println!("  ... and {} more files", entries.len() - LISTED_ENTRIES);
            }
        }
        Integrity::Suspect(reason) => {
            println!(
                "Warning: {} doesn't appear to be a valid ZIP file ({})",
                zip_path.display(),
                reason
            );
        }
    }

    println!("ZIP file size: {}", format_size(package.zip.len() as u64));
}
