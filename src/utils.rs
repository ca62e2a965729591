use crate::error::{Error, Result};

pub fn read_u8(data: &[u8], pos: &mut usize) -> Result<u8> {
    if *pos >= data.len() {
        return Err(Error::Decode("unexpected end of data reading u8".to_string()));
    }

    let value = data[*pos];
    *pos += 1;
    Ok(value)
}

pub fn read_u16(data: &[u8], pos: &mut usize) -> Result<u16> {
    if *pos + 2 > data.len() {
        return Err(Error::Decode("unexpected end of data reading u16".to_string()));
    }

    let value = u16::from_be_bytes([data[*pos], data[*pos + 1]]);
    *pos += 2;
    Ok(value)
}

pub fn read_u24(data: &[u8], pos: &mut usize) -> Result<u32> {
    if *pos + 3 > data.len() {
        return Err(Error::Decode("unexpected end of data reading u24".to_string()));
    }

    let value = u32::from_be_bytes([0, data[*pos], data[*pos + 1], data[*pos + 2]]);
    *pos += 3;
    Ok(value)
}

pub fn read_bytes<'a>(data: &'a [u8], pos: &mut usize, len: usize) -> Result<&'a [u8]> {
    if *pos + len > data.len() {
        return Err(Error::Decode(format!(
            "unexpected end of data reading {} bytes",
            len
        )));
    }

    let bytes = &data[*pos..*pos + len];
    *pos += len;
    Ok(bytes)
}

pub fn read_vector_u8<'a>(data: &'a [u8], pos: &mut usize) -> Result<&'a [u8]> {
    let len = read_u8(data, pos)? as usize;
    read_bytes(data, pos, len)
}

pub fn read_vector_u16<'a>(data: &'a [u8], pos: &mut usize) -> Result<&'a [u8]> {
    let len = read_u16(data, pos)? as usize;
    read_bytes(data, pos, len)
}

pub fn read_vector_u24<'a>(data: &'a [u8], pos: &mut usize) -> Result<&'a [u8]> {
    let len = read_u24(data, pos)? as usize;
    read_bytes(data, pos, len)
}

/// Fails unless the full input was consumed. Handshake message bodies carry
/// an explicit length; trailing garbage is a decode error, not padding.
pub fn expect_consumed(data: &[u8], pos: usize) -> Result<()> {
    if pos != data.len() {
        return Err(Error::Decode(format!(
            "{} trailing bytes after message body",
            data.len() - pos
        )));
    }
    Ok(())
}

pub fn write_u8(vec: &mut Vec<u8>, value: u8) {
    vec.push(value);
}

pub fn write_u16(vec: &mut Vec<u8>, value: u16) {
    vec.extend_from_slice(&value.to_be_bytes());
}

pub fn write_u24(vec: &mut Vec<u8>, value: u32) {
    debug_assert!(value <= 0xFF_FFFF);
    let bytes = value.to_be_bytes();
    vec.extend_from_slice(&bytes[1..4]);
}

pub fn write_vector_u8(vec: &mut Vec<u8>, data: &[u8]) {
    debug_assert!(data.len() <= 255);
    write_u8(vec, data.len() as u8);
    vec.extend_from_slice(data);
}

pub fn write_vector_u16(vec: &mut Vec<u8>, data: &[u8]) {
    debug_assert!(data.len() <= 65535);
    write_u16(vec, data.len() as u16);
    vec.extend_from_slice(data);
}

pub fn write_vector_u24(vec: &mut Vec<u8>, data: &[u8]) {
    debug_assert!(data.len() <= 0xFF_FFFF);
    write_u24(vec, data.len() as u32);
    vec.extend_from_slice(data);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_scalars() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC];
        let mut pos = 0;

        assert_eq!(read_u8(&data, &mut pos).unwrap(), 0x12);
        assert_eq!(read_u16(&data, &mut pos).unwrap(), 0x3456);
        assert_eq!(read_u24(&data, &mut pos).unwrap(), 0x789ABC);
        assert_eq!(pos, 6);

        assert!(read_u8(&data, &mut pos).is_err());
    }

    #[test]
    fn test_read_vectors() {
        let data = [0x02, 0xAA, 0xBB, 0x00, 0x03, 0xCC, 0xDD, 0xEE];
        let mut pos = 0;

        assert_eq!(read_vector_u8(&data, &mut pos).unwrap(), &[0xAA, 0xBB]);
        assert_eq!(read_vector_u16(&data, &mut pos).unwrap(), &[0xCC, 0xDD, 0xEE]);
        assert_eq!(pos, 8);
        assert!(expect_consumed(&data, pos).is_ok());
    }

    #[test]
    fn test_truncated_vector() {
        let data = [0x05, 0xAA];
        let mut pos = 0;
        assert!(read_vector_u8(&data, &mut pos).is_err());
    }

    #[test]
    fn test_write_roundtrip() {
        let mut vec = Vec::new();
        write_u8(&mut vec, 0x12);
        write_u16(&mut vec, 0x3456);
        write_u24(&mut vec, 0x789ABC);
        write_vector_u8(&mut vec, &[0x01]);
        write_vector_u16(&mut vec, &[0x02, 0x03]);

        assert_eq!(
            vec,
            [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0x01, 0x01, 0x00, 0x02, 0x02, 0x03]
        );
    }

    #[test]
    fn test_expect_consumed_trailing() {
        let data = [0x00, 0x01];
        assert!(expect_consumed(&data, 1).is_err());
        assert!(expect_consumed(&data, 2).is_ok());
    }
}
