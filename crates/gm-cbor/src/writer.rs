use crate::constants::{
    MAX_MAP_FIELDS, MAX_STRING_LEN, TYPE_BYTES, TYPE_MAP, TYPE_TEXT, TYPE_UNSIGNED,
    UINT16_FOLLOWS, UINT32_FOLLOWS, UINT64_FOLLOWS, UINT8_FOLLOWS,
};
use crate::error::CborError;

/// Accumulates a self-delimiting byte stream one item at a time.
///
/// Unlike the reader this never fails on a bounds check: the backing buffer
/// grows as needed. The only failure modes are a length that does not fit
/// the format (oversized strings, oversized map headers).
#[derive(Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    fn write_length_header(&mut self, type_byte: u8, len: usize) -> Result<(), CborError> {
        if (len as u64) < 24 {
            self.buf.push(type_byte | len as u8);
        } else if len <= u8::MAX as usize {
            self.buf.push(type_byte | UINT8_FOLLOWS);
            self.buf.push(len as u8);
        } else if len <= MAX_STRING_LEN {
            self.buf.push(type_byte | UINT16_FOLLOWS);
            self.buf.push((len >> 8) as u8);
            self.buf.push(len as u8);
        } else {
            return Err(CborError::LengthOverflow(len));
        }
        Ok(())
    }

    /// Write an unsigned integer item.
    pub fn write_uint(&mut self, value: u64) -> Result<(), CborError> {
        if value < 24 {
            self.buf.push(TYPE_UNSIGNED | value as u8);
        } else if value <= u8::MAX as u64 {
            self.buf.push(TYPE_UNSIGNED | UINT8_FOLLOWS);
            self.buf.push(value as u8);
        } else if value <= u16::MAX as u64 {
            self.buf.push(TYPE_UNSIGNED | UINT16_FOLLOWS);
            self.buf.push((value >> 8) as u8);
            self.buf.push(value as u8);
        } else if value <= u32::MAX as u64 {
            self.buf.push(TYPE_UNSIGNED | UINT32_FOLLOWS);
            self.buf.push((value >> 24) as u8);
            self.buf.push((value >> 16) as u8);
            self.buf.push((value >> 8) as u8);
            self.buf.push(value as u8);
        } else {
            self.buf.push(TYPE_UNSIGNED | UINT64_FOLLOWS);
            for shift in (0..8).rev() {
                self.buf.push((value >> (shift * 8)) as u8);
            }
        }
        Ok(())
    }

    /// Write a byte string item.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), CborError> {
        self.write_length_header(TYPE_BYTES, data.len())?;
        self.buf.extend_from_slice(data);
        Ok(())
    }

    /// Write a text string item.
    pub fn write_text(&mut self, text: &str) -> Result<(), CborError> {
        self.write_length_header(TYPE_TEXT, text.len())?;
        self.buf.extend_from_slice(text.as_bytes());
        Ok(())
    }

    /// Write a small fixed-size map header. `field_count` must not exceed
    /// [`MAX_MAP_FIELDS`]: the count is packed directly into the
    /// additional-info bits with no follow-on length byte.
    pub fn write_map_header(&mut self, field_count: u8) -> Result<(), CborError> {
        if field_count > MAX_MAP_FIELDS {
            return Err(CborError::TooManyFields(field_count as usize));
        }
        self.buf.push(TYPE_MAP | field_count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Reader;

    #[test]
    fn uint_round_trips_across_all_widths() {
        for value in [0u64, 23, 24, 255, 256, 65535, 65536, u32::MAX as u64, u64::MAX] {
            let mut w = Writer::new();
            w.write_uint(value).unwrap();
            let mut r = Reader::new(w.as_slice());
            assert_eq!(r.read_uint().unwrap(), value);
        }
    }

    #[test]
    fn bytes_round_trip() {
        let data = vec![0xAB; 300];
        let mut w = Writer::new();
        w.write_bytes(&data).unwrap();
        let mut r = Reader::new(w.as_slice());
        assert_eq!(r.read_bytes_exact(300).unwrap(), data);
    }

    #[test]
    fn text_round_trip() {
        let mut w = Writer::new();
        w.write_text("hello, git-mind").unwrap();
        let mut r = Reader::new(w.as_slice());
        assert_eq!(r.read_text(64).unwrap(), "hello, git-mind");
    }

    #[test]
    fn map_header_round_trips() {
        let mut w = Writer::new();
        w.write_map_header(15).unwrap();
        let mut r = Reader::new(w.as_slice());
        assert_eq!(r.read_map_header().unwrap(), 15);
    }

    #[test]
    fn map_header_rejects_too_many_fields() {
        let mut w = Writer::new();
        assert!(matches!(
            w.write_map_header(24),
            Err(CborError::TooManyFields(24))
        ));
    }
}
