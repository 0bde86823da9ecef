// rust-xmpp
// Copyright (c) 2015 Florian Zeitz
//
// This project is MIT licensed.
// Please see the COPYING file for more information.

/// Client-to-server port, RFC 6120 14.7.
pub const DEFAULT_PORT: u16 = 5222;

/// Where and how to open a client stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// The XMPP domain, sent as the stream's `to`.
    pub domain: String,
    /// Host to dial instead of the domain itself.
    pub host: Option<String>,
    pub port: u16,
    /// Negotiate STARTTLS when the server offers it.
    pub starttls: bool,
    pub verify_certificates: bool,
    /// Resource to request at bind time; the server picks one when unset.
    pub resource: Option<String>,
}

impl ConnectionConfig {
    pub fn new(domain: &str) -> ConnectionConfig {
        ConnectionConfig {
            domain: domain.to_string(),
            host: None,
            port: DEFAULT_PORT,
            starttls: true,
            verify_certificates: true,
            resource: None,
        }
    }

    pub fn host(mut self, host: Option<String>) -> ConnectionConfig {
        self.host = host;
        self
    }

    pub fn port(mut self, port: u16) -> ConnectionConfig {
        self.port = port;
        self
    }

    pub fn starttls(mut self, enabled: bool) -> ConnectionConfig {
        self.starttls = enabled;
        self
    }

    pub fn verify_certificates(mut self, verify: bool) -> ConnectionConfig {
        self.verify_certificates = verify;
        self
    }

    pub fn resource(mut self, resource: Option<String>) -> ConnectionConfig {
        self.resource = resource;
        self
    }

    pub fn address(&self) -> (&str, u16) {
        (self.host.as_deref().unwrap_or(&self.domain), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dials_domain_by_default() {
        let config = ConnectionConfig::new("localhost");
        assert_eq!(config.address(), ("localhost", 5222));
        assert!(config.starttls);
        assert!(config.verify_certificates);
    }

    #[test]
    fn host_override() {
        let config = ConnectionConfig::new("example.org")
            .host(Some("10.0.0.7".into()))
            .port(5322);
        assert_eq!(config.address(), ("10.0.0.7", 5322));
        assert_eq!(config.domain, "example.org");
    }
}
