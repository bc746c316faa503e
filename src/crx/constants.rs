use std::ops::Range;

/// "Cr24"
pub const CRX_MAGIC_VALUE: [u8; 4] = [0x43, 0x72, 0x32, 0x34];
pub const MAGIC_VALUE_RANGE: Range<usize> = 0..4;
pub const CRX_VERSION_OFFSET: usize = 4;

pub const CRX2_PUBLIC_KEY_LENGTH_RANGE: Range<usize> = 8..12;
pub const CRX2_SIGNATURE_LENGTH_RANGE: Range<usize> = 12..16;
pub const CRX2_HEADER_SIZE: usize = 16;

pub const CRX3_HEADER_LENGTH_RANGE: Range<usize> = 8..12;
pub const CRX3_HEADER_SIZE: usize = 12;

/// Magic plus the version word; anything shorter cannot be a CRX.
pub const MIN_CONTAINER_SIZE: usize = 8;

/// Length fields above this are treated as corrupt and the payload is located
/// by scanning for a zip signature instead.
pub const MAX_HEADER_FIELD_LENGTH: u32 = 10_000;

/// Maximum number of CRX layers unwrapped by a single decode.
pub const MAX_NESTING_DEPTH: usize = 8;

pub const ZIP_LOCAL_FILE_SIGNATURE: [u8; 4] = *b"PK\x03\x04";
pub const ZIP_END_OF_CENTRAL_DIRECTORY_SIGNATURE: [u8; 4] = *b"PK\x05\x06";
pub const ZIP_SPANNED_SIGNATURE: [u8; 4] = *b"PK\x07\x08";

pub const ZIP_SIGNATURES: [[u8; 4]; 3] = [
    ZIP_LOCAL_FILE_SIGNATURE,
    ZIP_END_OF_CENTRAL_DIRECTORY_SIGNATURE,
    ZIP_SPANNED_SIGNATURE,
];
