// rust-xmpp
// Copyright (c) 2014 Florian Zeitz
//
// This project is MIT licensed.
// Please see the COPYING file for more information.

use std::io;
use std::io::Read;
use std::mem;
use std::str;

fn invalid_utf8() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, "stream did not contain valid UTF-8")
}

/// Reads whatever text is currently available without splitting a character.
///
/// An empty string means the peer closed the stream.
pub trait ReadString {
    fn read_str(&mut self) -> io::Result<String>;
}

/// Decodes UTF-8 from a byte stream.
///
/// The start of a character that is cut off at the end of a read stays
/// buffered here, so a read that times out in the middle of a character
/// loses nothing.
pub struct StrReader<R> {
    inner: R,
    pending: Vec<u8>,
}

impl<R: Read> StrReader<R> {
    pub fn new(inner: R) -> StrReader<R> {
        StrReader {
            inner,
            pending: Vec::new(),
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Any bytes still waiting for the rest of their character are dropped.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Splits off the longest complete UTF-8 prefix of the buffered bytes.
    fn take_decoded(&mut self) -> io::Result<Option<String>> {
        let valid = match str::from_utf8(&self.pending) {
            Ok(s) => s.len(),
            Err(e) if e.valid_up_to() > 0 => e.valid_up_to(),
            Err(e) if e.error_len().is_some() => return Err(invalid_utf8()),
            Err(_) => 0,
        };
        if valid == 0 {
            return Ok(None);
        }

        let rest = self.pending.split_off(valid);
        let text = mem::replace(&mut self.pending, rest);
        String::from_utf8(text).map(Some).map_err(|_| invalid_utf8())
    }
}

impl<R: Read> ReadString for StrReader<R> {
    fn read_str(&mut self) -> io::Result<String> {
        let mut buf = [0; 4096];
        loop {
            if let Some(text) = self.take_decoded()? {
                return Ok(text);
            }

            let n = match self.inner.read(&mut buf) {
                Ok(n) => n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if n == 0 {
                if self.pending.is_empty() {
                    return Ok(String::new());
                }
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream ended inside a UTF-8 sequence",
                ));
            }
            self.pending.extend_from_slice(&buf[..n]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Hands out the underlying bytes in fixed-size pieces.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl<'a> Read for Trickle<'a> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(self.data.len()).min(buf.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    /// Plays back a script of reads, `None` standing for a timed-out read.
    struct Scripted(VecDeque<Option<&'static [u8]>>);

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.pop_front() {
                Some(Some(data)) => {
                    buf[..data.len()].copy_from_slice(data);
                    Ok(data.len())
                }
                Some(None) => Err(io::ErrorKind::WouldBlock.into()),
                None => Ok(0),
            }
        }
    }

    fn read_all<R: Read>(reader: &mut StrReader<R>) -> io::Result<String> {
        let mut out = String::new();
        loop {
            let s = reader.read_str()?;
            if s.is_empty() {
                return Ok(out);
            }
            out.push_str(&s);
        }
    }

    #[test]
    fn reads_ascii() {
        let mut reader = StrReader::new(&b"<presence/>"[..]);
        assert_eq!(reader.read_str().unwrap(), "<presence/>");
        assert_eq!(reader.read_str().unwrap(), "");
    }

    #[test]
    fn characters_split_across_reads_are_joined() {
        let text = "<body>Grüße, 世界 🎉</body>";
        for step in 1..5 {
            let mut reader = StrReader::new(Trickle { data: text.as_bytes(), step });
            assert_eq!(read_all(&mut reader).unwrap(), text, "step {}", step);
        }
    }

    #[test]
    fn timeout_inside_a_character_keeps_its_start() {
        let mut reader = StrReader::new(Scripted(VecDeque::from(vec![
            Some(&b"<body>\xc3"[..]),
            None,
            Some(&b"\xa9</body>"[..]),
        ])));

        assert_eq!(reader.read_str().unwrap(), "<body>");
        let err = reader.read_str().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
        assert_eq!(reader.read_str().unwrap(), "é</body>");
        assert_eq!(reader.read_str().unwrap(), "");
    }

    #[test]
    fn invalid_bytes_are_rejected() {
        let mut reader = StrReader::new(&b"ok\xff\xfe"[..]);
        assert_eq!(reader.read_str().unwrap(), "ok");
        let err = reader.read_str().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn truncated_character_is_an_error() {
        let mut reader = StrReader::new(&"€".as_bytes()[..2]);
        let err = reader.read_str().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
