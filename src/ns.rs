// rust-xmpp
// Copyright (c) 2014 Florian Zeitz
//
// This project is MIT licensed.
// Please see the COPYING file for more information.

pub const JABBER_CLIENT: &str = "jabber:client";
pub const JABBER_SERVER: &str = "jabber:server";
pub const STREAMS: &str = "http://etherx.jabber.org/streams";

pub const FEATURE_BIND: &str = "urn:ietf:params:xml:ns:xmpp-bind";
pub const FEATURE_SASL: &str = "urn:ietf:params:xml:ns:xmpp-sasl";
pub const FEATURE_SESSION: &str = "urn:ietf:params:xml:ns:xmpp-session";
pub const FEATURE_TLS: &str = "urn:ietf:params:xml:ns:xmpp-tls";

pub const STANZA_ERRORS: &str = "urn:ietf:params:xml:ns:xmpp-stanzas";
pub const STREAM_ERRORS: &str = "urn:ietf:params:xml:ns:xmpp-streams";

// XEP-0199
pub const PING: &str = "urn:xmpp:ping";
