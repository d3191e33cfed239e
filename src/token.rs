use std::io::{self, ErrorKind, Read, Write};

use crate::error::{LzError, Result};

/// Bytes per token on the wire: offset, length, literal.
pub const TOKEN_SIZE: usize = 3;
/// Largest value an offset or length field can carry.
pub const MAX_FIELD: usize = u8::MAX as usize;

/// One compression unit: copy `length` bytes from `offset` bytes back, then
/// emit `literal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub offset: u8,
    pub length: u8,
    pub literal: u8,
}

impl Token {
    /// Builds a token, failing if either field does not fit in one byte.
    pub fn new(offset: usize, length: usize, literal: u8) -> Result<Self> {
        if offset > MAX_FIELD || length > MAX_FIELD {
            return Err(LzError::WindowInvariantViolation(format!(
                "token fields out of range (offset={}, length={})",
                offset, length
            )));
        }
        Ok(Self {
            offset: offset as u8,
            length: length as u8,
            literal,
        })
    }

    /// A token with no back-reference.
    pub fn literal(byte: u8) -> Self {
        Self {
            offset: 0,
            length: 0,
            literal: byte,
        }
    }

    pub fn is_literal(&self) -> bool {
        self.length == 0
    }

    pub fn to_bytes(self) -> [u8; TOKEN_SIZE] {
        [self.offset, self.length, self.literal]
    }

    pub fn from_bytes(bytes: [u8; TOKEN_SIZE]) -> Self {
        Self {
            offset: bytes[0],
            length: bytes[1],
            literal: bytes[2],
        }
    }

    pub fn write_to(&self, writer: &mut impl Write) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }
}

/// Reads tokens from a byte stream until it ends on a token boundary.
pub struct TokenReader<R> {
    reader: R,
    bytes_read: u64,
    done: bool,
}

impl<R: Read> TokenReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            bytes_read: 0,
            done: false,
        }
    }

    /// Number of bytes consumed from the underlying reader.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Reads the next token, or `None` at a clean end of stream.
    pub fn read_token(&mut self) -> Result<Option<Token>> {
        let mut buf = [0u8; TOKEN_SIZE];
        let mut filled = 0;
        while filled < TOKEN_SIZE {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.bytes_read += filled as u64;

        match filled {
            0 => Ok(None),
            TOKEN_SIZE => Ok(Some(Token::from_bytes(buf))),
            trailing => Err(LzError::TruncatedStream { trailing }),
        }
    }
}

impl<R: Read> Iterator for TokenReader<R> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.read_token();
        if !matches!(next, Ok(Some(_))) {
            self.done = true;
        }
        next.transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Alternates between an interrupted read and a single byte.
    struct Stutter<'a> {
        data: &'a [u8],
        interrupt: bool,
    }

    impl Read for Stutter<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::new(ErrorKind::Interrupted, "signal"));
            }
            match self.data.split_first() {
                Some((&byte, rest)) if !buf.is_empty() => {
                    buf[0] = byte;
                    self.data = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    #[test]
    fn test_wire_layout() {
        let token = Token::new(2, 5, b'x').unwrap();
        assert_eq!(token.to_bytes(), [2, 5, b'x']);
        assert_eq!(Token::from_bytes([2, 5, b'x']), token);
    }

    #[test]
    fn test_new_rejects_wide_fields() {
        assert!(Token::new(256, 0, 0).is_err());
        assert!(Token::new(0, 300, 0).is_err());
        assert!(Token::new(255, 255, 0).is_ok());
    }

    #[test]
    fn test_reader_reads_whole_tokens() {
        let data = vec![0, 0, b'A', 0, 0, b'B', 2, 2, b'A'];
        let tokens: Vec<Token> = TokenReader::new(Cursor::new(data))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::literal(b'A'),
                Token::literal(b'B'),
                Token::new(2, 2, b'A').unwrap(),
            ]
        );
    }

    #[test]
    fn test_reader_empty_stream() {
        let mut reader = TokenReader::new(Cursor::new(Vec::new()));
        assert!(reader.read_token().unwrap().is_none());
        assert_eq!(reader.bytes_read(), 0);
    }

    #[test]
    fn test_reader_truncated_stream() {
        let data = vec![0, 0, b'A', 1, 1];
        let mut reader = TokenReader::new(Cursor::new(data));
        assert_eq!(reader.next().unwrap().unwrap(), Token::literal(b'A'));
        match reader.next() {
            Some(Err(LzError::TruncatedStream { trailing })) => assert_eq!(trailing, 2),
            other => panic!("expected truncated stream, got {:?}", other),
        }
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_reader_retries_interrupted_short_reads() {
        let data = [0, 0, b'A', 1, 3, b'B', 7];
        let mut reader = TokenReader::new(Stutter {
            data: &data,
            interrupt: false,
        });
        assert_eq!(reader.read_token().unwrap(), Some(Token::literal(b'A')));
        assert_eq!(reader.read_token().unwrap(), Some(Token::new(1, 3, b'B').unwrap()));
        assert!(matches!(
            reader.read_token(),
            Err(LzError::TruncatedStream { trailing: 1 })
        ));
        assert_eq!(reader.bytes_read(), 7);
    }

    #[test]
    fn test_reader_surfaces_io_errors() {
        struct Unplugged;

        impl Read for Unplugged {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(ErrorKind::BrokenPipe, "unplugged"))
            }
        }

        let mut reader = TokenReader::new(Unplugged);
        assert!(matches!(
            reader.next(),
            Some(Err(LzError::Io(ref e))) if e.kind() == ErrorKind::BrokenPipe
        ));
        assert!(reader.next().is_none());
    }
}
