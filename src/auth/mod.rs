// rust-xmpp
// Copyright (c) 2014 Florian Zeitz
//
// This project is MIT licensed.
// Please see the COPYING file for more information.

use thiserror::Error;

pub use self::plain::PlainAuth;
pub use self::scram::ScramAuth;

pub mod plain;
pub mod scram;

#[derive(Error, Debug)]
pub enum SaslError {
    #[error("SCRAM: {0}")]
    Scram(&'static str),
    #[error("SASL: server sent invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("SASL: cryptographic operation failed: {0}")]
    Crypto(#[from] openssl::error::ErrorStack),
}

pub trait Authenticator {
    fn mechanism(&self) -> &'static str;
    fn initial(&mut self) -> Result<Vec<u8>, SaslError>;
    fn continuation(&mut self, _data: &[u8]) -> Result<Vec<u8>, SaslError> {
        Ok(Vec::new())
    }
}

/// Mechanisms we implement, most preferred first.
const PREFERENCE: &[&str] = &["SCRAM-SHA-1", "PLAIN"];

/// Picks the best mechanism the server offers and sets it up for `username`.
pub fn select(
    offered: &[String],
    username: &str,
    password: &str,
) -> Option<Box<dyn Authenticator>> {
    let mech = PREFERENCE
        .iter()
        .find(|mech| offered.iter().any(|o| o == *mech))?;
    let auth: Box<dyn Authenticator> = match *mech {
        "SCRAM-SHA-1" => Box::new(ScramAuth::new(username.into(), password.into(), None)),
        _ => Box::new(PlainAuth::new(username.into(), password.into(), None)),
    };
    Some(auth)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offered(mechs: &[&str]) -> Vec<String> {
        mechs.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn prefers_scram_over_plain() {
        let auth = select(&offered(&["PLAIN", "SCRAM-SHA-1"]), "td", "astral").unwrap();
        assert_eq!(auth.mechanism(), "SCRAM-SHA-1");
    }

    #[test]
    fn falls_back_to_plain() {
        let auth = select(&offered(&["DIGEST-MD5", "PLAIN"]), "td", "astral").unwrap();
        assert_eq!(auth.mechanism(), "PLAIN");
    }

    #[test]
    fn nothing_in_common() {
        assert!(select(&offered(&["EXTERNAL", "GSSAPI"]), "td", "astral").is_none());
    }
}
