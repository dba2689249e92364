use crate::constants::{
    ADDITIONAL_INFO_MASK, IMMEDIATE_THRESHOLD, TYPE_BYTES, TYPE_MAP, TYPE_MASK, TYPE_TEXT,
    TYPE_UNSIGNED, UINT16_FOLLOWS, UINT32_FOLLOWS, UINT64_FOLLOWS, UINT8_FOLLOWS,
};
use crate::error::CborError;

/// Cursor over a byte slice that decodes one self-delimiting item at a time.
///
/// A `Reader` never panics on malformed input; every read is bounds-checked
/// against the slice it was built from and returns [`CborError`] on failure,
/// leaving the cursor at whatever offset it reached.
pub struct Reader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    /// Current read position.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CborError> {
        if n > self.remaining() {
            return Err(CborError::BufferUnderrun {
                needed: n,
                available: self.remaining(),
            });
        }
        let slice = &self.buf[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    fn read_initial(&mut self) -> Result<(u8, u8), CborError> {
        let b = self.take(1)?[0];
        Ok((b & TYPE_MASK, b & ADDITIONAL_INFO_MASK))
    }

    fn read_length_from_info(&mut self, info: u8) -> Result<usize, CborError> {
        if info < IMMEDIATE_THRESHOLD {
            return Ok(info as usize);
        }
        match info {
            UINT8_FOLLOWS => Ok(self.take(1)?[0] as usize),
            UINT16_FOLLOWS => {
                let b = self.take(2)?;
                Ok(((b[0] as usize) << 8) | b[1] as usize)
            }
            _ => Err(CborError::InvalidAdditionalInfo(info)),
        }
    }

    fn read_uint_from_info(&mut self, info: u8) -> Result<u64, CborError> {
        if info < IMMEDIATE_THRESHOLD {
            return Ok(info as u64);
        }
        match info {
            UINT8_FOLLOWS => Ok(self.take(1)?[0] as u64),
            UINT16_FOLLOWS => {
                let b = self.take(2)?;
                Ok(((b[0] as u64) << 8) | b[1] as u64)
            }
            UINT32_FOLLOWS => {
                let b = self.take(4)?;
                Ok(((b[0] as u64) << 24)
                    | ((b[1] as u64) << 16)
                    | ((b[2] as u64) << 8)
                    | b[3] as u64)
            }
            UINT64_FOLLOWS => {
                let b = self.take(8)?;
                let mut value = 0u64;
                for &byte in b {
                    value = (value << 8) | byte as u64;
                }
                Ok(value)
            }
            _ => Err(CborError::InvalidAdditionalInfo(info)),
        }
    }

    /// Read an unsigned integer item.
    pub fn read_uint(&mut self) -> Result<u64, CborError> {
        let (ty, info) = self.read_initial()?;
        if ty != TYPE_UNSIGNED {
            return Err(CborError::TypeMismatch {
                expected: TYPE_UNSIGNED,
                found: ty,
            });
        }
        self.read_uint_from_info(info)
    }

    /// Read a byte string item whose length must equal `expected_len`.
    ///
    /// Fields in this format are always fixed-width (hashes, OIDs), so the
    /// length is known ahead of time and checked rather than trusted.
    pub fn read_bytes_exact(&mut self, expected_len: usize) -> Result<Vec<u8>, CborError> {
        let (ty, info) = self.read_initial()?;
        if ty != TYPE_BYTES {
            return Err(CborError::TypeMismatch {
                expected: TYPE_BYTES,
                found: ty,
            });
        }
        let len = self.read_length_from_info(info)?;
        if len != expected_len {
            return Err(CborError::LengthMismatch {
                expected: expected_len,
                actual: len,
            });
        }
        Ok(self.take(len)?.to_vec())
    }

    /// Read a text string item, rejecting anything that would not fit in
    /// `max_len` bytes once decoded.
    pub fn read_text(&mut self, max_len: usize) -> Result<String, CborError> {
        let (ty, info) = self.read_initial()?;
        if ty != TYPE_TEXT {
            return Err(CborError::TypeMismatch {
                expected: TYPE_TEXT,
                found: ty,
            });
        }
        let len = self.read_length_from_info(info)?;
        if len >= max_len {
            return Err(CborError::TextTooLong { len, max: max_len });
        }
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CborError::InvalidUtf8)
    }

    /// Read the header of a small fixed-size map, returning its field count.
    ///
    /// The count is carried directly in the additional-info bits: headers
    /// with a follow-on length (as a long map would need) are rejected as
    /// an invalid additional-info value.
    pub fn read_map_header(&mut self) -> Result<u8, CborError> {
        let (ty, info) = self.read_initial()?;
        if ty != TYPE_MAP {
            return Err(CborError::TypeMismatch {
                expected: TYPE_MAP,
                found: ty,
            });
        }
        if info >= IMMEDIATE_THRESHOLD {
            return Err(CborError::InvalidAdditionalInfo(info));
        }
        Ok(info)
    }
}
