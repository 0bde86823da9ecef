// rust-xmpp
// Copyright (c) 2014 Florian Zeitz
//
// This project is MIT licensed.
// Please see the COPYING file for more information.

use super::{Authenticator, SaslError};

/// RFC 4616
pub struct PlainAuth {
    authcid: String,
    authzid: Option<String>,
    passwd: String,
}

impl PlainAuth {
    pub fn new(authcid: String, passwd: String, authzid: Option<String>) -> PlainAuth {
        PlainAuth {
            authcid,
            passwd,
            authzid,
        }
    }
}

impl Authenticator for PlainAuth {
    fn mechanism(&self) -> &'static str {
        "PLAIN"
    }

    fn initial(&mut self) -> Result<Vec<u8>, SaslError> {
        let mut data: Vec<u8> = Vec::new();
        if let Some(ref authzid) = self.authzid {
            data.extend(authzid.bytes());
        }
        data.push(0);
        data.extend(self.authcid.bytes());
        data.push(0);
        data.extend(self.passwd.bytes());
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_response_layout() {
        let mut auth = PlainAuth::new("td".into(), "astral".into(), None);
        assert_eq!(auth.initial().unwrap(), b"\0td\0astral".to_vec());
        assert_eq!(base64::encode(auth.initial().unwrap()), "AHRkAGFzdHJhbA==");
    }

    #[test]
    fn authzid_is_prefixed() {
        let mut auth = PlainAuth::new("td".into(), "astral".into(), Some("admin@localhost".into()));
        assert_eq!(auth.initial().unwrap(), b"admin@localhost\0td\0astral".to_vec());
    }

    #[test]
    fn success_payload_is_ignored() {
        let mut auth = PlainAuth::new("td".into(), "astral".into(), None);
        assert!(auth.continuation(b"anything").unwrap().is_empty());
    }
}
