use std::ops::Deref;

use super::constants::{CRX2_HEADER_SIZE, CRX3_HEADER_SIZE};

/// Layout detected from the leading bytes of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    PlainZip,
    Crx2,
    Crx3,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crx2Header {
    pub public_key_length: u32,
    pub signature_length: u32,
}

impl Crx2Header {
    pub fn payload_offset(&self) -> usize {
        CRX2_HEADER_SIZE + self.public_key_length as usize + self.signature_length as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crx3Header {
    pub header_length: u32,
}

impl Crx3Header {
    pub fn payload_offset(&self) -> usize {
        CRX3_HEADER_SIZE + self.header_length as usize
    }
}

/// Header material of the layer the zip payload was taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerHeader {
    Crx2 {
        public_key: Vec<u8>,
        signature: Vec<u8>,
    },
    /// The CRX3 `CrxFileHeader` protobuf, left undecoded.
    Crx3 { signed_header: Vec<u8> },
}

/// Zip bytes cut from the tail of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedZip(Vec<u8>);

impl DecodedZip {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl From<&[u8]> for DecodedZip {
    fn from(bytes: &[u8]) -> Self {
        DecodedZip(bytes.to_vec())
    }
}

impl Deref for DecodedZip {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for DecodedZip {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Outcome of opening the payload as a zip archive. Advisory only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Integrity {
    Valid { entries: Vec<String> },
    Suspect(String),
}

impl Integrity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Integrity::Valid { .. })
    }
}

#[derive(Debug, Clone)]
pub struct CrxPackage {
    /// Format of the outermost layer.
    pub format: ContainerFormat,
    /// Number of CRX layers unwrapped; zero for bare or scanned zips.
    pub layers: usize,
    /// Absolute offset of `zip` within the decoded input.
    pub payload_offset: usize,
    /// `None` when the header was bypassed by a signature scan.
    pub header: Option<ContainerHeader>,
    pub zip: DecodedZip,
    pub integrity: Integrity,
}
