// rust-xmpp
// Copyright (c) 2014-2015 Florian Zeitz
//
// This project is MIT licensed.
// Please see the COPYING file for more information.

use std::fmt;
use std::io;

/// Anything that can be written onto an XMPP stream.
///
/// The serialized form is the `Display` output, which is also what gets
/// traced as outgoing traffic.
pub trait XmppSend: fmt::Display {
    /// Renders the whole element first so it leaves in a single write.
    fn xmpp_send<W: io::Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(self.to_string().as_bytes())?;
        w.flush()
    }
}

impl XmppSend for xml::Element {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        writes: Vec<Vec<u8>>,
        flushes: usize,
    }

    impl io::Write for Recorder {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes.push(buf.to_vec());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn element_goes_out_in_one_write() {
        let e: xml::Element = "<message xmlns='jabber:client' to='dut@localhost' type='chat'>\
                               <body>Hello</body></message>"
            .parse()
            .unwrap();
        let mut out = Recorder::default();
        e.xmpp_send(&mut out).unwrap();

        assert_eq!(out.writes.len(), 1);
        assert_eq!(String::from_utf8(out.writes[0].clone()).unwrap(), e.to_string());
        assert_eq!(out.flushes, 1);
    }
}
