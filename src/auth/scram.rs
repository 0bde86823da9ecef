// rust-xmpp
// Copyright (c) 2014 Florian Zeitz
//
// This project is MIT licensed.
// Please see the COPYING file for more information.

use std::str;

use openssl::hash::{hash, MessageDigest};
use openssl::pkcs5::pbkdf2_hmac;
use openssl::pkey::PKey;
use openssl::rand::rand_bytes;
use openssl::sign::Signer;

use super::{Authenticator, SaslError};

macro_rules! check (
    ($e:expr, $s:expr) => (match $e { Some(s) => s, None => return Err(SaslError::Scram($s)) })
);

enum State {
    Initial,
    WaitFirst(String, String),
    WaitFinal(Vec<u8>),
    Finished,
}

/// RFC 5802, without channel binding.
pub struct ScramAuth {
    authcid: String,
    authzid: Option<String>,
    passwd: String,
    nonce: Option<String>,
    state: State,
}

fn gen_nonce() -> Result<String, SaslError> {
    let mut nonce = vec![0; 64];
    rand_bytes(&mut nonce)?;

    for c in nonce.iter_mut() {
        // Restrict output to printable ASCII, excluding '~'
        *c = (*c % (b'~' - b'!')) + b'!';
        // Map occurences of ',' to '~'
        if *c == b',' {
            *c = b'~'
        }
    }
    Ok(nonce.into_iter().map(char::from).collect())
}

fn hmac_sha1(key: &[u8], data: &[u8]) -> Result<Vec<u8>, SaslError> {
    let pkey = PKey::hmac(key)?;
    let mut signer = Signer::new(MessageDigest::sha1(), &pkey)?;
    Ok(signer.sign_oneshot_to_vec(data)?)
}

fn parse_server_first(data: &str) -> Result<(&str, Vec<u8>, u32), SaslError> {
    let mut nonce = None;
    let mut salt = None;
    let mut iter: Option<u32> = None;
    for sub in data.split(',') {
        if let Some(r) = sub.strip_prefix("r=") {
            nonce = Some(r);
        } else if let Some(s) = sub.strip_prefix("s=") {
            salt = Some(base64::decode(s)?);
        } else if let Some(i) = sub.strip_prefix("i=") {
            iter = match i.parse().ok() {
                None => return Err(SaslError::Scram("Iteration count is not a number")),
                it => it,
            };
        } else if sub.starts_with("m=") {
            return Err(SaslError::Scram("Unsupported mandatory extension found"));
        }
    }

    let nonce = check!(nonce, "No nonce found");
    let salt = check!(salt, "No salt found");
    let iter = check!(iter, "No iteration count found");
    if iter == 0 {
        return Err(SaslError::Scram("Iteration count must be positive"));
    }

    Ok((nonce, salt, iter))
}

impl ScramAuth {
    pub fn new(authcid: String, passwd: String, authzid: Option<String>) -> ScramAuth {
        ScramAuth {
            authcid,
            passwd,
            authzid,
            nonce: None,
            state: State::Initial,
        }
    }

    /// Uses a fixed client nonce instead of a random one.
    #[cfg(test)]
    fn with_nonce(mut self, nonce: &str) -> ScramAuth {
        self.nonce = Some(nonce.into());
        self
    }

    fn handle_server_first(&mut self, data: &[u8]) -> Result<Vec<u8>, SaslError> {
        let sha1 = MessageDigest::sha1();

        let data = check!(str::from_utf8(data).ok(), "Server sent non-UTF-8 data");
        let (nonce, salt, iter) = parse_server_first(data)?;

        let client_first_message_bare = match self.state {
            State::WaitFirst(ref cnonce, ref bare) => {
                if !nonce.starts_with(cnonce.as_str()) {
                    return Err(SaslError::Scram("Server replied with invalid nonce"));
                }
                bare.clone()
            }
            _ => return Err(SaslError::Scram("Unexpected server-first-message")),
        };

        let gs2header = match self.authzid {
            Some(ref authzid) => base64::encode(format!("n,a={},", authzid)),
            None => base64::encode(b"n,,"),
        };

        let mut result: Vec<u8> = Vec::new();
        // Add c=<base64(GS2Header+channelBindingData)>
        result.extend("c=".bytes());
        result.extend(gs2header.bytes());
        // Add r=<nonce>
        result.extend(",r=".bytes());
        result.extend(nonce.bytes());

        // SaltedPassword := Hi(Normalize(password), salt, i)
        let mut salted_passwd = [0; 20];
        pbkdf2_hmac(self.passwd.as_bytes(), &salt, iter as usize, sha1, &mut salted_passwd)?;

        /*
         * AuthMessage := client-first-message-bare + "," +
         *		  server-first-message + "," +
         *		  client-final-message-without-proof
         */
        let mut auth_message = Vec::new();
        auth_message.extend(client_first_message_bare.bytes());
        auth_message.push(b',');
        auth_message.extend(data.bytes());
        auth_message.push(b',');
        auth_message.extend(result.iter().cloned());

        // ClientKey := HMAC(SaltedPassword, "Client Key")
        let client_key = hmac_sha1(&salted_passwd, b"Client Key")?;

        // StoredKey := H(ClientKey)
        let stored_key = hash(sha1, &client_key)?;

        // ClientSignature := HMAC(StoredKey, AuthMessage)
        let client_signature = hmac_sha1(&stored_key, &auth_message)?;
        // ServerKey := HMAC(SaltedPassword, "Server Key")
        let server_key = hmac_sha1(&salted_passwd, b"Server Key")?;
        // ServerSignature := HMAC(ServerKey, AuthMessage)
        let server_signature = hmac_sha1(&server_key, &auth_message)?;
        // ClientProof := ClientKey XOR ClientSignature
        let client_proof: Vec<u8> = client_key
            .iter()
            .zip(client_signature.iter())
            .map(|(x, y)| *x ^ *y)
            .collect();

        // Add p=<base64(ClientProof)>
        result.extend(",p=".bytes());
        result.extend(base64::encode(client_proof).bytes());

        self.state = State::WaitFinal(server_signature);

        Ok(result)
    }

    fn handle_server_final(&mut self, data: &[u8]) -> Result<Vec<u8>, SaslError> {
        let data = check!(str::from_utf8(data).ok(), "Server sent non-UTF-8 data");
        let verifier = match data.strip_prefix("v=") {
            Some(v) => base64::decode(v)?,
            None => return Err(SaslError::Scram("Server didn't send a verifier")),
        };

        match self.state {
            State::WaitFinal(ref server_signature) if *server_signature == verifier => (),
            State::WaitFinal(_) => return Err(SaslError::Scram("Server sent invalid verifier")),
            _ => return Err(SaslError::Scram("Unexpected server-final-message")),
        }

        self.state = State::Finished;

        Ok(Vec::new())
    }
}

impl Authenticator for ScramAuth {
    fn mechanism(&self) -> &'static str {
        "SCRAM-SHA-1"
    }

    fn initial(&mut self) -> Result<Vec<u8>, SaslError> {
        let gs2header = match self.authzid {
            Some(ref a) => format!("n,a={},", a),
            None => "n,,".to_string(),
        };

        let cnonce = match self.nonce {
            Some(ref nonce) => nonce.clone(),
            None => gen_nonce()?,
        };

        let client_first_message_bare = format!("n={},r={}", self.authcid, cnonce);

        let mut ret = Vec::new();
        ret.extend(gs2header.bytes());
        ret.extend(client_first_message_bare.bytes());

        self.state = State::WaitFirst(cnonce, client_first_message_bare);

        Ok(ret)
    }

    fn continuation(&mut self, data: &[u8]) -> Result<Vec<u8>, SaslError> {
        match self.state {
            State::Initial => self.initial(),
            State::WaitFirst(..) => self.handle_server_first(data),
            State::WaitFinal(_) => self.handle_server_final(data),
            State::Finished => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test vector from RFC 5802, section 5
    const CNONCE: &str = "fyko+d2lbbFgONRv9qkxdawL";
    const SERVER_FIRST: &[u8] =
        b"r=fyko+d2lbbFgONRv9qkxdawL3rfcNHYJY1ZVvWVs7j,s=QSXCR+Q6sek8bf92,i=4096";
    const CLIENT_FINAL: &[u8] =
        b"c=biws,r=fyko+d2lbbFgONRv9qkxdawL3rfcNHYJY1ZVvWVs7j,p=v0X8v3Bz2T0CJGbJQyF0X+HI4Ts=";
    const SERVER_FINAL: &[u8] = b"v=rmF9pqV8S7suAoZWja4dJRkFsKQ=";

    fn rfc_auth() -> ScramAuth {
        ScramAuth::new("user".into(), "pencil".into(), None).with_nonce(CNONCE)
    }

    #[test]
    fn rfc5802_exchange() {
        let mut auth = rfc_auth();
        assert_eq!(auth.initial().unwrap(), b"n,,n=user,r=fyko+d2lbbFgONRv9qkxdawL".to_vec());
        assert_eq!(auth.continuation(SERVER_FIRST).unwrap(), CLIENT_FINAL.to_vec());
        assert!(auth.continuation(SERVER_FINAL).unwrap().is_empty());
    }

    #[test]
    fn wrong_server_signature_is_rejected() {
        let mut auth = rfc_auth();
        auth.initial().unwrap();
        auth.continuation(SERVER_FIRST).unwrap();
        let err = auth.continuation(b"v=AAAAAAAAAAAAAAAAAAAAAAAAAAA=").unwrap_err();
        assert!(matches!(err, SaslError::Scram("Server sent invalid verifier")));
    }

    #[test]
    fn server_nonce_must_extend_ours() {
        let mut auth = rfc_auth();
        auth.initial().unwrap();
        let err = auth.continuation(b"r=somethingelse,s=QSXCR+Q6sek8bf92,i=4096").unwrap_err();
        assert!(matches!(err, SaslError::Scram("Server replied with invalid nonce")));
    }

    #[test]
    fn mandatory_extensions_are_refused() {
        let err = parse_server_first("m=ext,r=abc,s=QSXCR+Q6sek8bf92,i=1").unwrap_err();
        assert!(matches!(err, SaslError::Scram(_)));
    }

    #[test]
    fn random_nonce_is_printable_without_commas() {
        let nonce = gen_nonce().unwrap();
        assert_eq!(nonce.len(), 64);
        assert!(nonce.bytes().all(|c| (b'!'..=b'~').contains(&c) && c != b','));
    }
}
