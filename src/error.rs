// rust-xmpp
// Copyright (c) 2015 Florian Zeitz
//
// This project is MIT licensed.
// Please see the COPYING file for more information.

use std::io;

use thiserror::Error;

use crate::auth::SaslError;
use crate::jid::JidError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("could not connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TLS negotiation failed: {0}")]
    Tls(String),

    #[error(transparent)]
    Sasl(#[from] SaslError),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("resource binding failed: {0}")]
    Bind(String),

    #[error("stream error from server: {condition}{}", describe(.text))]
    Stream {
        condition: String,
        text: Option<String>,
    },

    #[error("malformed XML from server: {0}")]
    Xml(String),

    #[error(transparent)]
    Jid(#[from] JidError),

    #[error("not connected")]
    NotConnected,
}

impl Error {
    /// True for failures that leave the session unusable without reconnecting.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            Error::Connect { .. } | Error::Io(_) | Error::Stream { .. } | Error::NotConnected
        )
    }
}

fn describe(text: &Option<String>) -> String {
    match *text {
        Some(ref text) => format!(" ({})", text),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_error_message_includes_text() {
        let err = Error::Stream {
            condition: "host-unknown".into(),
            text: Some("no such domain".into()),
        };
        assert_eq!(
            err.to_string(),
            "stream error from server: host-unknown (no such domain)"
        );

        let err = Error::Stream {
            condition: "conflict".into(),
            text: None,
        };
        assert_eq!(err.to_string(), "stream error from server: conflict");
    }

    #[test]
    fn auth_failures_are_not_disconnects() {
        assert!(!Error::Auth("not-authorized".into()).is_disconnect());
        assert!(Error::NotConnected.is_disconnect());
    }
}
