//! The fixed 32-byte container header and magic-driven endianness detection.

use crate::binary::BinaryError;
use crate::model::FormatVersion;

/// Size, in bytes, of the fixed header.
pub const HEADER_SIZE: usize = 32;

/// The forward magic for version 1, little-endian.
const MAGIC_V1_LE: &[u8; 4] = b"MSG1";
/// The historic forward magic for version 1, little-endian.
const MAGIC_V1_LE_LEGACY: &[u8; 4] = b"MSG0";
/// The reversed magic for version 1, big-endian.
const MAGIC_V1_BE: &[u8; 4] = b"1GSM";

/// The fixed 32-byte container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Offset `0x00`.
    pub file_type: u8,
    /// Offset `0x01`.
    pub is_compressed: bool,
    /// Offset `0x02`, 16-bit signed metadata.
    pub user_id: i16,
    /// Offset `0x04`.
    pub file_size: i32,
    /// Offset `0x08`, the raw 4-byte magic as stored on disk (not
    /// byte-swapped; endianness is inferred from it, not applied to it).
    pub magic: [u8; 4],
    /// Offset `0x0C`, opaque.
    pub field_0c: i32,
    /// Offset `0x10`.
    pub relocation_table_offset: i32,
    /// Offset `0x14`.
    pub relocation_table_size: i32,
    /// Offset `0x18`.
    pub window_count: i32,
    /// Offset `0x1C`.
    pub is_relocated: bool,
    /// Offset `0x1E`, opaque.
    pub field_1e: i16,
}

impl Header {
    /// Determines the [`FormatVersion`] implied by `magic`, or `None` if it
    /// matches neither the forward nor the reversed magic.
    #[must_use]
    pub fn format_version_for_magic(magic: &[u8; 4]) -> Option<FormatVersion> {
        if magic == MAGIC_V1_LE || magic == MAGIC_V1_LE_LEGACY {
            Some(FormatVersion::V1LittleEndian)
        } else if magic == MAGIC_V1_BE {
            Some(FormatVersion::V1BigEndian)
        } else {
            None
        }
    }

    /// Parses a [`Header`] from the first [`HEADER_SIZE`] bytes of `data`,
    /// returning it along with the [`FormatVersion`] its magic implies.
    ///
    /// # Errors
    ///
    /// Returns [`BinaryError::StreamTooSmall`] if `data` is shorter than
    /// [`HEADER_SIZE`], or [`BinaryError::InvalidHeaderMagic`] if the magic
    /// matches neither known form.
    pub fn parse(data: &[u8]) -> Result<(Self, FormatVersion), BinaryError> {
        if data.len() < HEADER_SIZE {
            return Err(BinaryError::StreamTooSmall);
        }
        let magic: [u8; 4] = data[0x08..0x0C].try_into().expect("slice is 4 bytes");
        let version =
            Self::format_version_for_magic(&magic).ok_or(BinaryError::InvalidHeaderMagic)?;
        let le = version.is_little_endian();
        let header = Self {
            file_type: data[0x00],
            is_compressed: data[0x01] != 0,
            user_id: read_i16(data, 0x02, le),
            file_size: read_i32(data, 0x04, le),
            magic,
            field_0c: read_i32(data, 0x0C, le),
            relocation_table_offset: read_i32(data, 0x10, le),
            relocation_table_size: read_i32(data, 0x14, le),
            window_count: read_i32(data, 0x18, le),
            is_relocated: read_i16(data, 0x1C, le) != 0,
            field_1e: read_i16(data, 0x1E, le),
        };
        Ok((header, version))
    }

    /// Serializes this header into exactly [`HEADER_SIZE`] bytes, using the
    /// endianness implied by `version`.
    #[must_use]
    pub fn write(&self, version: FormatVersion) -> [u8; HEADER_SIZE] {
        let le = version.is_little_endian();
        let mut out = [0u8; HEADER_SIZE];
        out[0x00] = self.file_type;
        out[0x01] = u8::from(self.is_compressed);
        write_i16(&mut out, 0x02, self.user_id, le);
        write_i32(&mut out, 0x04, self.file_size, le);
        out[0x08..0x0C].copy_from_slice(&self.magic);
        write_i32(&mut out, 0x0C, self.field_0c, le);
        write_i32(&mut out, 0x10, self.relocation_table_offset, le);
        write_i32(&mut out, 0x14, self.relocation_table_size, le);
        write_i32(&mut out, 0x18, self.window_count, le);
        write_i16(&mut out, 0x1C, i16::from(self.is_relocated), le);
        write_i16(&mut out, 0x1E, self.field_1e, le);
        out
    }

    /// Returns the canonical magic bytes for `version`.
    #[must_use]
    pub const fn magic_for(version: FormatVersion) -> [u8; 4] {
        match version {
            FormatVersion::V1LittleEndian => *MAGIC_V1_LE,
            FormatVersion::V1BigEndian => *MAGIC_V1_BE,
        }
    }
}

fn read_i16(data: &[u8], offset: usize, little_endian: bool) -> i16 {
    let bytes: [u8; 2] = data[offset..offset + 2].try_into().expect("2 bytes");
    if little_endian {
        i16::from_le_bytes(bytes)
    } else {
        i16::from_be_bytes(bytes)
    }
}

fn read_i32(data: &[u8], offset: usize, little_endian: bool) -> i32 {
    let bytes: [u8; 4] = data[offset..offset + 4].try_into().expect("4 bytes");
    if little_endian {
        i32::from_le_bytes(bytes)
    } else {
        i32::from_be_bytes(bytes)
    }
}

fn write_i16(out: &mut [u8], offset: usize, value: i16, little_endian: bool) {
    let bytes = if little_endian {
        value.to_le_bytes()
    } else {
        value.to_be_bytes()
    };
    out[offset..offset + 2].copy_from_slice(&bytes);
}

fn write_i32(out: &mut [u8], offset: usize, value: i32, little_endian: bool) {
    let bytes = if little_endian {
        value.to_le_bytes()
    } else {
        value.to_be_bytes()
    };
    out[offset..offset + 4].copy_from_slice(&bytes);
}

/// Reads a big-endian-or-little-endian `u16` at `offset`, per `version`.
/// Shared by [`crate::binary::reader`] and [`crate::binary::writer`] for the
/// window table, speaker table, and per-window bodies, which use the same
/// endianness as the header they follow.
pub(crate) fn read_u16(data: &[u8], offset: usize, version: crate::model::FormatVersion) -> u16 {
    read_i16(data, offset, version.is_little_endian()) as u16
}

pub(crate) fn read_i16_at(data: &[u8], offset: usize, version: crate::model::FormatVersion) -> i16 {
    read_i16(data, offset, version.is_little_endian())
}

pub(crate) fn read_i32_at(data: &[u8], offset: usize, version: crate::model::FormatVersion) -> i32 {
    read_i32(data, offset, version.is_little_endian())
}

pub(crate) fn write_u16_at(out: &mut [u8], offset: usize, value: u16, version: crate::model::FormatVersion) {
    write_i16(out, offset, value as i16, version.is_little_endian());
}

pub(crate) fn write_i16_at(out: &mut [u8], offset: usize, value: i16, version: crate::model::FormatVersion) {
    write_i16(out, offset, value, version.is_little_endian());
}

pub(crate) fn write_i32_at(out: &mut [u8], offset: usize, value: i32, version: crate::model::FormatVersion) {
    write_i32(out, offset, value, version.is_little_endian());
}
