// rust-xmpp
// Copyright (c) 2014-2015 Florian Zeitz
//
// This project is MIT licensed.
// Please see the COPYING file for more information.

use std::io;
use std::io::Write;
use std::mem;
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use openssl::ssl::{SslConnector, SslMethod, SslStream, SslVerifyMode};

use crate::error::{Error, Result};
use crate::read_str::{ReadString, StrReader};

pub enum XmppSocket {
    Tcp(StrReader<TcpStream>),
    Tls(StrReader<SslStream<TcpStream>>),
    NoSock,
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "no socket")
}

impl XmppSocket {
    pub fn connect(host: &str, port: u16) -> io::Result<XmppSocket> {
        let stream = TcpStream::connect((host, port))?;
        stream.set_nodelay(true)?;
        Ok(XmppSocket::Tcp(StrReader::new(stream)))
    }

    pub fn is_open(&self) -> bool {
        !matches!(*self, XmppSocket::NoSock)
    }

    pub fn is_tls(&self) -> bool {
        matches!(*self, XmppSocket::Tls(_))
    }

    pub fn starttls(&mut self, domain: &str, verify: bool) -> Result<()> {
        let socket = mem::replace(self, XmppSocket::NoSock);
        let sock = match socket {
            // Nothing may follow <proceed/> before the handshake
            XmppSocket::Tcp(reader) => reader.into_inner(),
            other => {
                *self = other;
                return Err(Error::Tls("no socket, or TLS already negotiated".into()));
            }
        };

        let mut builder = SslConnector::builder(SslMethod::tls())
            .map_err(|e| Error::Tls(format!("could not create SSL context: {}", e)))?;
        if !verify {
            builder.set_verify(SslVerifyMode::NONE);
        }
        let ssl = builder
            .build()
            .connect(domain, sock)
            .map_err(|e| Error::Tls(e.to_string()))?;
        *self = XmppSocket::Tls(StrReader::new(ssl));
        Ok(())
    }

    fn tcp(&self) -> io::Result<&TcpStream> {
        match *self {
            XmppSocket::Tcp(ref stream) => Ok(stream.get_ref()),
            XmppSocket::Tls(ref stream) => Ok(stream.get_ref().get_ref()),
            XmppSocket::NoSock => Err(not_connected()),
        }
    }

    /// `None` blocks until data arrives.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        // A zero duration is rejected by the OS layer
        let timeout = timeout.map(|t| t.max(Duration::from_millis(1)));
        self.tcp()?.set_read_timeout(timeout)
    }

    pub fn shutdown(&mut self) {
        if let Ok(tcp) = self.tcp() {
            let _ = tcp.shutdown(Shutdown::Both);
        }
        *self = XmppSocket::NoSock;
    }
}

impl Write for XmppSocket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match *self {
            XmppSocket::Tcp(ref mut stream) => stream.get_mut().write(buf),
            XmppSocket::Tls(ref mut stream) => stream.get_mut().write(buf),
            XmppSocket::NoSock => Err(not_connected()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match *self {
            XmppSocket::Tcp(ref mut stream) => stream.get_mut().flush(),
            XmppSocket::Tls(ref mut stream) => stream.get_mut().flush(),
            XmppSocket::NoSock => Err(not_connected()),
        }
    }
}

impl ReadString for XmppSocket {
    fn read_str(&mut self) -> io::Result<String> {
        match *self {
            XmppSocket::Tcp(ref mut stream) => stream.read_str(),
            XmppSocket::Tls(ref mut stream) => stream.read_str(),
            XmppSocket::NoSock => Err(not_connected()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;

    #[test]
    fn no_socket_errors_instead_of_panicking() {
        let mut sock = XmppSocket::NoSock;
        assert!(!sock.is_open());
        assert_eq!(sock.write(b"x").unwrap_err().kind(), io::ErrorKind::NotConnected);
        assert_eq!(sock.read_str().unwrap_err().kind(), io::ErrorKind::NotConnected);
        assert!(sock.starttls("localhost", true).is_err());
        assert!(!sock.is_open());
    }

    #[test]
    fn tcp_round_trip_and_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut sock = XmppSocket::connect("127.0.0.1", port).unwrap();
        let (mut peer, _) = listener.accept().unwrap();

        sock.write_all(b"<presence/>").unwrap();
        sock.flush().unwrap();
        let mut buf = [0; 11];
        peer.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"<presence/>");

        sock.set_read_timeout(Some(Duration::ZERO)).unwrap();
        let err = sock.read_str().unwrap_err();
        assert!(matches!(
            err.kind(),
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
        ));

        peer.write_all("héllo".as_bytes()).unwrap();
        sock.set_read_timeout(None).unwrap();
        let mut got = String::new();
        while got.len() < "héllo".len() {
            got.push_str(&sock.read_str().unwrap());
        }
        assert_eq!(got, "héllo");
        assert!(!sock.is_tls());

        sock.shutdown();
        assert!(!sock.is_open());
    }
}
