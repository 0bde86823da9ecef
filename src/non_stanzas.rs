// rust-xmpp
// Copyright (c) 2015 Florian Zeitz
//
// This project is MIT licensed.
// Please see the COPYING file for more information.

use std::fmt;

use crate::ns;
use crate::xmpp_send::XmppSend;

#[derive(Debug)]
pub struct StreamStart<'a> {
    pub to: &'a str,
}

impl<'a> fmt::Display for StreamStart<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "<?xml version='1.0'?>\n\
             <stream:stream xmlns:stream='{}' xmlns='{}' version='1.0' to='{}'>",
            ns::STREAMS,
            ns::JABBER_CLIENT,
            xml::escape(self.to)
        )
    }
}

impl<'a> XmppSend for StreamStart<'a> {}

#[derive(Debug)]
pub struct StreamEnd;

impl fmt::Display for StreamEnd {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "</stream:stream>")
    }
}

impl XmppSend for StreamEnd {}

#[derive(Debug)]
pub struct StartTls;

impl fmt::Display for StartTls {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<starttls xmlns='{}'/>", ns::FEATURE_TLS)
    }
}

impl XmppSend for StartTls {}

#[derive(Debug)]
pub struct AuthStart<'a> {
    pub mech: &'a str,
    pub data: &'a str,
}

impl<'a> fmt::Display for AuthStart<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // RFC 6120 6.4.2: an empty initial response is sent as "="
        let data = if self.data.is_empty() { "=" } else { self.data };
        write!(
            f,
            "<auth mechanism='{}' xmlns='{}'>{}</auth>",
            self.mech,
            ns::FEATURE_SASL,
            data
        )
    }
}

impl<'a> XmppSend for AuthStart<'a> {}

#[derive(Debug)]
pub struct AuthResponse<'a> {
    pub data: &'a str,
}

impl<'a> fmt::Display for AuthResponse<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<response xmlns='{}'>{}</response>", ns::FEATURE_SASL, self.data)
    }
}

impl<'a> XmppSend for AuthResponse<'a> {}

/// Stream error conditions, RFC 6120 4.9.3.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamCondition {
    BadFormat,
    BadNamespacePrefix,
    Conflict,
    ConnectionTimeout,
    HostGone,
    HostUnknown,
    ImproperAddressing,
    InternalServerError,
    InvalidFrom,
    InvalidId,
    InvalidNamespace,
    InvalidXml,
    NotAuthorized,
    NotWellFormed,
    PolicyViolation,
    RemoteConnectionFailed,
    Reset,
    ResourceConstraint,
    RestrictedXml,
    SeeOtherHost(String),
    SystemShutdown,
    UndefinedCondition,
    UnsupportedEncoding,
    UnsupportedStanzaType,
    UnsupportedVersion,
}

impl StreamCondition {
    pub fn name(&self) -> &'static str {
        match *self {
            StreamCondition::BadFormat => "bad-format",
            StreamCondition::BadNamespacePrefix => "bad-namespace-prefix",
            StreamCondition::Conflict => "conflict",
            StreamCondition::ConnectionTimeout => "connection-timeout",
            StreamCondition::HostGone => "host-gone",
            StreamCondition::HostUnknown => "host-unknown",
            StreamCondition::ImproperAddressing => "improper-addressing",
            StreamCondition::InternalServerError => "internal-server-error",
            StreamCondition::InvalidFrom => "invalid-from",
            StreamCondition::InvalidId => "invalid-id",
            StreamCondition::InvalidNamespace => "invalid-namespace",
            StreamCondition::InvalidXml => "invalid-xml",
            StreamCondition::NotAuthorized => "not-authorized",
            StreamCondition::NotWellFormed => "not-well-formed",
            StreamCondition::PolicyViolation => "policy-violation",
            StreamCondition::RemoteConnectionFailed => "remote-connection-failed",
            StreamCondition::Reset => "reset",
            StreamCondition::ResourceConstraint => "resource-constraint",
            StreamCondition::RestrictedXml => "restricted-xml",
            StreamCondition::SeeOtherHost(_) => "see-other-host",
            StreamCondition::SystemShutdown => "system-shutdown",
            StreamCondition::UndefinedCondition => "undefined-condition",
            StreamCondition::UnsupportedEncoding => "unsupported-encoding",
            StreamCondition::UnsupportedStanzaType => "unsupported-stanza-type",
            StreamCondition::UnsupportedVersion => "unsupported-version",
        }
    }

    /// Reads the condition out of an incoming `<stream:error/>`.
    ///
    /// Unknown conditions map to `undefined-condition`, as RFC 6120 asks.
    pub fn from_element(error: &xml::Element) -> (StreamCondition, Option<String>) {
        let mut cond = StreamCondition::UndefinedCondition;
        let mut text = None;
        for child in &error.children {
            let child = match *child {
                xml::Xml::ElementNode(ref e) => e,
                _ => continue,
            };
            if child.ns.as_deref() != Some(ns::STREAM_ERRORS) {
                continue;
            }
            if child.name == "text" {
                text = Some(child.content_str());
            } else {
                cond = StreamCondition::from_name(&child.name, child.content_str());
            }
        }
        (cond, text)
    }

    fn from_name(name: &str, content: String) -> StreamCondition {
        match name {
            "bad-format" => StreamCondition::BadFormat,
            "bad-namespace-prefix" => StreamCondition::BadNamespacePrefix,
            "conflict" => StreamCondition::Conflict,
            "connection-timeout" => StreamCondition::ConnectionTimeout,
            "host-gone" => StreamCondition::HostGone,
            "host-unknown" => StreamCondition::HostUnknown,
            "improper-addressing" => StreamCondition::ImproperAddressing,
            "internal-server-error" => StreamCondition::InternalServerError,
            "invalid-from" => StreamCondition::InvalidFrom,
            "invalid-id" => StreamCondition::InvalidId,
            "invalid-namespace" => StreamCondition::InvalidNamespace,
            "invalid-xml" => StreamCondition::InvalidXml,
            "not-authorized" => StreamCondition::NotAuthorized,
            "not-well-formed" => StreamCondition::NotWellFormed,
            "policy-violation" => StreamCondition::PolicyViolation,
            "remote-connection-failed" => StreamCondition::RemoteConnectionFailed,
            "reset" => StreamCondition::Reset,
            "resource-constraint" => StreamCondition::ResourceConstraint,
            "restricted-xml" => StreamCondition::RestrictedXml,
            "see-other-host" => StreamCondition::SeeOtherHost(content),
            "system-shutdown" => StreamCondition::SystemShutdown,
            "unsupported-encoding" => StreamCondition::UnsupportedEncoding,
            "unsupported-stanza-type" => StreamCondition::UnsupportedStanzaType,
            "unsupported-version" => StreamCondition::UnsupportedVersion,
            _ => StreamCondition::UndefinedCondition,
        }
    }
}

impl fmt::Display for StreamCondition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let StreamCondition::SeeOtherHost(ref host) = *self {
            return write!(
                f,
                "<see-other-host xmlns='{}'>{}</see-other-host>",
                ns::STREAM_ERRORS,
                xml::escape(host)
            );
        }
        write!(f, "<{} xmlns='{}'/>", self.name(), ns::STREAM_ERRORS)
    }
}

#[derive(Debug)]
pub struct StreamError<'a> {
    pub cond: StreamCondition,
    pub text: Option<&'a str>,
}

impl<'a> fmt::Display for StreamError<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<stream:error>{}", self.cond)?;
        if let Some(text) = self.text {
            write!(f, "<text xmlns='{}'>{}</text>", ns::STREAM_ERRORS, xml::escape(text))?;
        }
        write!(f, "</stream:error>")
    }
}

impl<'a> XmppSend for StreamError<'a> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> xml::Element {
        s.parse().unwrap()
    }

    #[test]
    fn stream_header_escapes_domain() {
        let header = StreamStart { to: "a'b" }.to_string();
        assert!(header.starts_with("<?xml version='1.0'?>\n<stream:stream "));
        assert!(header.ends_with("to='a&apos;b'>"));
    }

    #[test]
    fn empty_initial_response_is_an_equals_sign() {
        let auth = AuthStart { mech: "PLAIN", data: "" }.to_string();
        assert_eq!(
            auth,
            "<auth mechanism='PLAIN' xmlns='urn:ietf:params:xml:ns:xmpp-sasl'>=</auth>"
        );
    }

    #[test]
    fn outgoing_stream_error() {
        let err = StreamError { cond: StreamCondition::NotWellFormed, text: None };
        assert_eq!(
            err.to_string(),
            "<stream:error><not-well-formed xmlns='urn:ietf:params:xml:ns:xmpp-streams'/>\
             </stream:error>"
        );
    }

    #[test]
    fn incoming_condition_and_text() {
        let error = parse(
            "<error xmlns='http://etherx.jabber.org/streams'>\
             <host-unknown xmlns='urn:ietf:params:xml:ns:xmpp-streams'/>\
             <text xmlns='urn:ietf:params:xml:ns:xmpp-streams'>no such host</text>\
             </error>",
        );
        let (cond, text) = StreamCondition::from_element(&error);
        assert_eq!(cond, StreamCondition::HostUnknown);
        assert_eq!(text.as_deref(), Some("no such host"));
    }

    #[test]
    fn see_other_host_keeps_target() {
        let error = parse(
            "<error xmlns='http://etherx.jabber.org/streams'>\
             <see-other-host xmlns='urn:ietf:params:xml:ns:xmpp-streams'>other.example</see-other-host>\
             </error>",
        );
        let (cond, _) = StreamCondition::from_element(&error);
        assert_eq!(cond, StreamCondition::SeeOtherHost("other.example".into()));
        assert_eq!(cond.name(), "see-other-host");
    }

    #[test]
    fn unknown_condition_is_undefined() {
        let error = parse(
            "<error xmlns='http://etherx.jabber.org/streams'>\
             <made-up xmlns='urn:ietf:params:xml:ns:xmpp-streams'/></error>",
        );
        assert_eq!(StreamCondition::from_element(&error).0, StreamCondition::UndefinedCondition);
    }
}
