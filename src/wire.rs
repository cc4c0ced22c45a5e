//! Fixed-width big-endian integer primitives shared by the wire formats,
//! plus the fill-or-EOF block reader the streaming paths are built on.

use std::io::{self, Read, Write};

pub(crate) fn write_u8<W: Write>(out: &mut W, value: u8) -> io::Result<()> {
    out.write_all(&[value])
}

pub(crate) fn write_u16<W: Write>(out: &mut W, value: u16) -> io::Result<()> {
    out.write_all(&value.to_be_bytes())
}

pub(crate) fn write_u32<W: Write>(out: &mut W, value: u32) -> io::Result<()> {
    out.write_all(&value.to_be_bytes())
}

pub(crate) fn read_u8<R: Read>(input: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    input.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub(crate) fn read_u16<R: Read>(input: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    input.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

pub(crate) fn read_u32<R: Read>(input: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// Reads until `buf` is full or the stream ends, whichever comes first.
/// Returns the number of bytes actually placed in `buf`; anything short of
/// `buf.len()` means end of stream.
pub(crate) fn read_fill<R: Read + ?Sized>(input: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Reads a single byte, or `None` at end of stream.
pub(crate) fn read_byte<R: Read + ?Sized>(input: &mut R) -> io::Result<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match input.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u16_round_trip() {
        let mut buf = Vec::new();
        write_u16(&mut buf, 0xBEEF).unwrap();
        assert_eq!(buf, [0xBE, 0xEF]);
        assert_eq!(read_u16(&mut &buf[..]).unwrap(), 0xBEEF);
    }

    #[test]
    fn test_u32_round_trip() {
        let mut buf = Vec::new();
        write_u32(&mut buf, 0xDEAD_BEEF).unwrap();
        assert_eq!(buf, [0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(read_u32(&mut &buf[..]).unwrap(), 0xDEAD_BEEF);
    }

    #[test]
    fn test_read_fill_short_input() {
        let data = [1u8, 2, 3];
        let mut buf = [0u8; 8];
        let n = read_fill(&mut &data[..], &mut buf).unwrap();
        assert_eq!(n, 3);
        assert_eq!(&buf[..3], &data);
    }

    #[test]
    fn test_read_fill_exact_input() {
        let data = [7u8; 16];
        let mut buf = [0u8; 16];
        assert_eq!(read_fill(&mut &data[..], &mut buf).unwrap(), 16);
        assert_eq!(buf, data);
    }

    #[test]
    fn test_read_byte_until_eof() {
        let data = [9u8, 8];
        let mut input = &data[..];
        assert_eq!(read_byte(&mut input).unwrap(), Some(9));
        assert_eq!(read_byte(&mut input).unwrap(), Some(8));
        assert_eq!(read_byte(&mut input).unwrap(), None);
    }

    #[test]
    fn test_read_u32_truncated() {
        let data = [0u8, 1];
        let err = read_u32(&mut &data[..]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
