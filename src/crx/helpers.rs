use std::{
    io::{self, Cursor},
    ops::Range,
};

use tracing::{debug, warn};
use zip::ZipArchive;

use super::{
    constants::{
        CRX2_HEADER_SIZE, CRX2_PUBLIC_KEY_LENGTH_RANGE, CRX2_SIGNATURE_LENGTH_RANGE,
        CRX3_HEADER_LENGTH_RANGE, CRX3_HEADER_SIZE, CRX_MAGIC_VALUE, CRX_VERSION_OFFSET,
        MAGIC_VALUE_RANGE, MAX_HEADER_FIELD_LENGTH, MAX_NESTING_DEPTH, MIN_CONTAINER_SIZE,
        ZIP_LOCAL_FILE_SIGNATURE, ZIP_SIGNATURES,
    },
    errors::DecodeError,
    types::{
        ContainerFormat, ContainerHeader, Crx2Header, Crx3Header, CrxPackage, DecodedZip,
        Integrity,
    },
};

/// Where the payload of one layer starts and what was learned on the way.
struct Unwrapped {
    offset: usize,
    layers: usize,
    header: Option<ContainerHeader>,
}

impl Unwrapped {
    fn scanned(offset: usize, layers: usize) -> Self {
        Unwrapped {
            offset,
            layers,
            header: None,
        }
    }
}

pub fn get_slice_from_range(data: &[u8], range: Range<usize>) -> Result<&[u8], DecodeError> {
    if data.len() < range.end {
        return Err(DecodeError::Truncated {
            needed: range.end,
            actual: data.len(),
        });
    }

    Ok(&data[range])
}

fn read_u32_le(data: &[u8], range: Range<usize>) -> Result<u32, DecodeError> {
    let slice = get_slice_from_range(data, range)?;

    let mut word = [0u8; 4];
    word.copy_from_slice(slice);

    Ok(u32::from_le_bytes(word))
}

pub fn is_valid_crx(data: &[u8]) -> bool {
    data.get(MAGIC_VALUE_RANGE) == Some(&CRX_MAGIC_VALUE[..])
}

/// Classifies a package from its first 4 to 8 bytes.
pub fn sniff(data: &[u8]) -> ContainerFormat {
    if data.starts_with(&ZIP_LOCAL_FILE_SIGNATURE) {
        return ContainerFormat::PlainZip;
    }

    if data.len() < MIN_CONTAINER_SIZE || !is_valid_crx(data) {
        return ContainerFormat::Unknown;
    }

    match data[CRX_VERSION_OFFSET] {
        2 => ContainerFormat::Crx2,
        3 => ContainerFormat::Crx3,
        _ => ContainerFormat::Unknown,
    }
}

/// Offset of the earliest zip signature anywhere in `data`.
pub fn find_zip_offset(data: &[u8]) -> Option<usize> {
    data.windows(4)
        .position(|window| ZIP_SIGNATURES.iter().any(|signature| window == signature))
}

fn scan_for_zip(data: &[u8]) -> Result<usize, DecodeError> {
    match find_zip_offset(data) {
        Some(offset) => {
            debug!(offset, "found zip signature");
            Ok(offset)
        }
        None => Err(DecodeError::NotAContainer),
    }
}

pub fn read_crx2_header(data: &[u8]) -> Result<Crx2Header, DecodeError> {
    get_slice_from_range(data, 0..CRX2_HEADER_SIZE)?;

    Ok(Crx2Header {
        public_key_length: read_u32_le(data, CRX2_PUBLIC_KEY_LENGTH_RANGE)?,
        signature_length: read_u32_le(data, CRX2_SIGNATURE_LENGTH_RANGE)?,
    })
}

pub fn read_crx3_header(data: &[u8]) -> Result<Crx3Header, DecodeError> {
    get_slice_from_range(data, 0..CRX3_HEADER_SIZE)?;

    Ok(Crx3Header {
        header_length: read_u32_le(data, CRX3_HEADER_LENGTH_RANGE)?,
    })
}

fn check_payload_offset(data: &[u8], offset: usize) -> Result<(), DecodeError> {
    if offset >= data.len() {
        return Err(DecodeError::Corrupted {
            offset,
            len: data.len(),
        });
    }

    Ok(())
}

fn unwrap_crx2(data: &[u8]) -> Result<Unwrapped, DecodeError> {
    let header = read_crx2_header(data)?;

    debug!(
        public_key_length = header.public_key_length,
        signature_length = header.signature_length,
        "CRX2 header"
    );

    if header.public_key_length > MAX_HEADER_FIELD_LENGTH
        || header.signature_length > MAX_HEADER_FIELD_LENGTH
    {
        warn!("unusual CRX2 key/signature lengths, searching for zip signature");
        return Ok(Unwrapped::scanned(scan_for_zip(data)?, 1));
    }

    let offset = header.payload_offset();
    check_payload_offset(data, offset)?;

    let key_end = CRX2_HEADER_SIZE + header.public_key_length as usize;

    Ok(Unwrapped {
        offset,
        layers: 1,
        header: Some(ContainerHeader::Crx2 {
            public_key: data[CRX2_HEADER_SIZE..key_end].to_vec(),
            signature: data[key_end..offset].to_vec(),
        }),
    })
}

fn unwrap_crx3(data: &[u8], depth: usize) -> Result<Unwrapped, DecodeError> {
    let header = read_crx3_header(data)?;

    debug!(header_length = header.header_length, depth, "CRX3 header");

    if header.header_length > MAX_HEADER_FIELD_LENGTH {
        warn!("unusual CRX3 header length, searching for zip signature");
        return Ok(Unwrapped::scanned(scan_for_zip(data)?, 1));
    }

    let offset = header.payload_offset();
    check_payload_offset(data, offset)?;

    let payload = &data[offset..];

    if is_valid_crx(payload) {
        if depth >= MAX_NESTING_DEPTH {
            return Err(DecodeError::TooDeeplyNested {
                limit: MAX_NESTING_DEPTH,
            });
        }

        debug!(offset, "found nested CRX, unwrapping inner container");
        let inner = unwrap(payload, depth + 1)?;

        return Ok(Unwrapped {
            offset: offset + inner.offset,
            layers: inner.layers + 1,
            header: inner.header,
        });
    }

    Ok(Unwrapped {
        offset,
        layers: 1,
        header: Some(ContainerHeader::Crx3 {
            signed_header: data[CRX3_HEADER_SIZE..offset].to_vec(),
        }),
    })
}

/// `depth` is the 1-based index of the CRX layer starting at `data[0]`.
fn unwrap(data: &[u8], depth: usize) -> Result<Unwrapped, DecodeError> {
    match sniff(data) {
        ContainerFormat::PlainZip => Ok(Unwrapped::scanned(0, 0)),
        ContainerFormat::Crx2 => unwrap_crx2(data),
        ContainerFormat::Crx3 => unwrap_crx3(data, depth),
        ContainerFormat::Unknown => {
            if data.len() >= MIN_CONTAINER_SIZE && is_valid_crx(data) {
                return Err(DecodeError::UnsupportedVersion(data[CRX_VERSION_OFFSET]));
            }

            Ok(Unwrapped::scanned(scan_for_zip(data)?, 0))
        }
    }
}

/// Opens `zip` as an archive and reads every entry through, so a CRC
/// mismatch in the entry data is caught as well as a broken directory.
pub fn check_integrity(zip: &[u8]) -> Integrity {
    let mut archive = match ZipArchive::new(Cursor::new(zip)) {
        Ok(archive) => archive,
        Err(err) => return Integrity::Suspect(err.to_string()),
    };

    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut file = match archive.by_index(i) {
            Ok(file) => file,
            Err(err) => return Integrity::Suspect(err.to_string()),
        };

        if let Err(err) = io::copy(&mut file, &mut io::sink()) {
            return Integrity::Suspect(format!("bad entry {}: {}", file.name(), err));
        }

        entries.push(file.name().to_owned());
    }

    Integrity::Valid { entries }
}

/// Extracts the zip payload from a CRX2/CRX3 container, a bare zip, or any
/// buffer with an embedded zip signature.
pub fn decode(data: &[u8]) -> Result<CrxPackage, DecodeError> {
    let format = sniff(data);
    let unwrapped = unwrap(data, 1)?;

    let zip = DecodedZip::from(&data[unwrapped.offset..]);
    let integrity = check_integrity(&zip);

    match &integrity {
        Integrity::Valid { entries } => {
            debug!(entries = entries.len(), "payload opened as zip archive");
        }
        Integrity::Suspect(reason) => {
            warn!(%reason, "payload does not appear to be a valid zip archive");
        }
    }

    Ok(CrxPackage {
        format,
        layers: unwrapped.layers,
        payload_offset: unwrapped.offset,
        header: unwrapped.header,
        zip,
        integrity,
    })
}
