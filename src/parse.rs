use byteorder::{ByteOrder, LittleEndian};

/// Get the [u8] at index `offset` from `data`, or `None` past the end.
///
/// Mutates `offset` to the index after the byte.
pub fn get_u8(data: &[u8], offset: &mut usize) -> Option<u8> {
    let byte: u8 = *data.get(*offset)?;
    *offset += 1;
    Some(byte)
}

/// Get `len` bytes starting at index `offset` from `data`,
/// or `None` if fewer than `len` remain.
///
/// Mutates `offset` to the index after the bytes.
pub fn get_bytes<'a>(data: &'a [u8], offset: &mut usize, len: usize) -> Option<&'a [u8]> {
    let end: usize = offset.checked_add(len)?;
    let bytes: &[u8] = data.get(*offset..end)?;
    *offset = end;
    Some(bytes)
}

/// Get 4 bytes (as a little-endian [i32]) at index `offset` from `data`.
///
/// Mutates `offset` to the index after the bytes.
pub fn get_i32(data: &[u8], offset: &mut usize) -> Option<i32> {
    get_bytes(data, offset, 4).map(LittleEndian::read_i32)
}
