//! Constants from the binary layout of DEX files
//!
//! [0]: https://source.android.com/docs/core/runtime/dex-format

/// `dex\n` followed by three version digits and a null byte
pub const MAGIC_PREFIX: [u8; 4] = *b"dex\n";

pub const HEADER_SIZE: u32 = 0x70;
pub const ENDIAN_CONSTANT: u32 = 0x1234_5678;

/// Absent index (eg. `superclass_idx` of `java/lang/Object`)
pub const NO_INDEX: u32 = 0xFFFF_FFFF;

/// Header fields after the magic, by byte offset
pub mod header {
    pub const CHECKSUM: usize = 8;
    pub const SIGNATURE: usize = 12;
    pub const FILE_SIZE: usize = 32;
    pub const ENDIAN_TAG: usize = 40;
    pub const MAP_OFF: usize = 52;
    pub const STRING_IDS: usize = 56;
    pub const TYPE_IDS: usize = 64;
    pub const PROTO_IDS: usize = 72;
    pub const FIELD_IDS: usize = 80;
    pub const METHOD_IDS: usize = 88;
    pub const CLASS_DEFS: usize = 96;
}

/// Item types used in the map list
pub mod item_type {
    pub const HEADER_ITEM: u16 = 0x0000;
    pub const STRING_ID_ITEM: u16 = 0x0001;
    pub const TYPE_ID_ITEM: u16 = 0x0002;
    pub const PROTO_ID_ITEM: u16 = 0x0003;
    pub const FIELD_ID_ITEM: u16 = 0x0004;
    pub const METHOD_ID_ITEM: u16 = 0x0005;
    pub const CLASS_DEF_ITEM: u16 = 0x0006;
    pub const METHOD_HANDLE_ITEM: u16 = 0x0008;
    pub const MAP_LIST: u16 = 0x1000;
    pub const TYPE_LIST: u16 = 0x1001;
    pub const ANNOTATION_SET_REF_LIST: u16 = 0x1002;
    pub const ANNOTATION_SET_ITEM: u16 = 0x1003;
    pub const CLASS_DATA_ITEM: u16 = 0x2000;
    pub const CODE_ITEM: u16 = 0x2001;
    pub const STRING_DATA_ITEM: u16 = 0x2002;
    pub const ANNOTATION_ITEM: u16 = 0x2004;
    pub const ENCODED_ARRAY_ITEM: u16 = 0x2005;
    pub const ANNOTATIONS_DIRECTORY_ITEM: u16 = 0x2006;
}

/// Type tags of encoded values (low five bits of the header byte)
pub mod value_type {
    pub const BYTE: u8 = 0x00;
    pub const SHORT: u8 = 0x02;
    pub const CHAR: u8 = 0x03;
    pub const INT: u8 = 0x04;
    pub const LONG: u8 = 0x06;
    pub const FLOAT: u8 = 0x10;
    pub const DOUBLE: u8 = 0x11;
    pub const METHOD_TYPE: u8 = 0x15;
    pub const METHOD_HANDLE: u8 = 0x16;
    pub const STRING: u8 = 0x17;
    pub const TYPE: u8 = 0x18;
    pub const FIELD: u8 = 0x19;
    pub const METHOD: u8 = 0x1a;
    pub const ENUM: u8 = 0x1b;
    pub const ARRAY: u8 = 0x1c;
    pub const ANNOTATION: u8 = 0x1d;
    pub const NULL: u8 = 0x1e;
    pub const BOOLEAN: u8 = 0x1f;
}
