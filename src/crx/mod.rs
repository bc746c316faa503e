//! CRX container decoding.
//!
//! A CRX file is a small binary header in front of a zip archive. Two header
//! layouts exist:
//!
//! ```text
//! CRX2: "Cr24" | version=2 (u32 LE) | key len (u32 LE) | sig len (u32 LE) | key | sig | zip
//! CRX3: "Cr24" | version=3 (u32 LE) | header len (u32 LE) | CrxFileHeader | zip
//! ```
//!
//! [`decode`] never trusts the header blindly. Absurd length fields fall back
//! to a scan for a zip signature, bare zips pass through unchanged, and CRX3
//! payloads that are themselves CRX files are unwrapped up to
//! [`MAX_NESTING_DEPTH`] layers.

pub mod constants;
pub mod errors;
pub mod helpers;
pub mod types;

pub use constants::{MAX_HEADER_FIELD_LENGTH, MAX_NESTING_DEPTH};
pub use errors::DecodeError;
pub use helpers::{check_integrity, decode, find_zip_offset, sniff};
pub use types::{
    ContainerFormat, ContainerHeader, Crx2Header, Crx3Header, CrxPackage, DecodedZip, Integrity,
};
