// rust-xmpp
// Copyright (c) 2014-2015 Florian Zeitz
//
// This project is MIT licensed.
// Please see the COPYING file for more information.

#![crate_name = "xmpp"]
#![crate_type = "lib"]

use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use crate::auth::{Authenticator, SaslError};
use crate::non_stanzas::{
    AuthResponse, AuthStart, StartTls, StreamCondition, StreamEnd, StreamError, StreamStart,
};
use crate::read_str::ReadString;
use crate::stanzas::{AStanza, Iq, IqType, Message, Presence, Stanza};
use crate::xmpp_socket::XmppSocket;

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod jid;
pub mod ns;
pub mod sendmessage;
pub mod stanzas;
mod non_stanzas;
mod read_str;
mod xmpp_send;
mod xmpp_socket;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "cli")]
pub mod logging;

pub use crate::client::Client;
pub use crate::config::ConnectionConfig;
pub use crate::error::{Error, Result};
pub use crate::jid::Jid;
pub use crate::xmpp_send::XmppSend;

/// Something that happened on the stream.
#[derive(Debug)]
pub enum Event {
    /// Stream features (and TLS, if any) are negotiated; SASL may start.
    ReadyToAuthenticate,
    Authenticated,
    /// A resource is bound and stanzas may be exchanged.
    Online(Jid),
    Message(Message),
    Presence(Presence),
    /// A `get` or `set` addressed to us, which needs an answer.
    IqRequest(Iq),
    IqResponse(Iq),
    StreamClosed,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    Disconnected,
    Negotiating,
    TlsRequested,
    AwaitingAuth,
    Authenticating,
    Binding,
    Session,
    Online,
    Closing,
}

#[derive(Clone)]
struct Credentials {
    username: String,
    password: String,
}

struct XmppHandler {
    config: ConnectionConfig,
    socket: XmppSocket,
    state: State,
    credentials: Option<Credentials>,
    authenticator: Option<Box<dyn Authenticator>>,
    mechanisms: Vec<String>,
    authenticated: bool,
    session_required: bool,
    // id of the bind or session iq we are waiting on
    awaiting: Option<String>,
    jid: Option<Jid>,
    next_id: u64,
    restart: bool,
}

/// A blocking client-to-server XMPP stream.
///
/// Incoming data is fed through an incremental XML parser; every top-level
/// element is either consumed by the negotiation logic or surfaced as an
/// [`Event`].
pub struct XmppStream {
    parser: xml::Parser,
    builder: xml::ElementBuilder,
    handler: XmppHandler,
    pending: VecDeque<Event>,
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

fn decode_sasl(data: &str) -> Result<Vec<u8>> {
    let data = data.trim();
    if data.is_empty() || data == "=" {
        return Ok(Vec::new());
    }
    Ok(base64::decode(data).map_err(SaslError::from)?)
}

/// Name of the first defined condition below `elem`, looking one level into
/// an `<error/>` child for stanza errors.
fn condition_name(elem: &xml::Element, namespace: &str) -> Option<String> {
    let scope = elem.get_child("error", elem.ns.as_deref()).unwrap_or(elem);
    scope.children.iter().find_map(|child| match *child {
        xml::Xml::ElementNode(ref e) if e.ns.as_deref() == Some(namespace) && e.name != "text" => {
            Some(e.name.clone())
        }
        _ => None,
    })
}

impl XmppStream {
    pub fn new(config: ConnectionConfig) -> XmppStream {
        XmppStream {
            parser: xml::Parser::new(),
            builder: xml::ElementBuilder::new(),
            handler: XmppHandler {
                config,
                socket: XmppSocket::NoSock,
                state: State::Disconnected,
                credentials: None,
                authenticator: None,
                mechanisms: Vec::new(),
                authenticated: false,
                session_required: false,
                awaiting: None,
                jid: None,
                next_id: 0,
                restart: false,
            },
            pending: VecDeque::new(),
        }
    }

    /// Opens the TCP connection and negotiates up to the point where SASL
    /// can begin, upgrading to TLS on the way when possible.
    pub fn connect(&mut self) -> Result<()> {
        self.reset();

        let (host, port) = self.handler.config.address();
        let host = host.to_string();
        debug!(%host, port, "connecting");
        self.handler.socket = XmppSocket::connect(&host, port)
            .map_err(|source| Error::Connect { host, port, source })?;
        self.handler.start_stream()?;

        loop {
            match self.handle()? {
                Event::ReadyToAuthenticate => return Ok(()),
                Event::StreamClosed => {
                    return Err(Error::Io(io::Error::new(
                        io::ErrorKind::ConnectionAborted,
                        "server closed the stream during negotiation",
                    )))
                }
                event => debug!(?event, "ignoring event during negotiation"),
            }
        }
    }

    /// Runs SASL, then binds a resource. Returns the full JID of the session.
    pub fn authenticate(&mut self, username: &str, password: &str) -> Result<Jid> {
        self.handler.credentials = Some(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        });
        self.handler.begin_auth()?;

        loop {
            match self.handle()? {
                Event::Online(jid) => return Ok(jid),
                Event::StreamClosed => {
                    return Err(Error::Auth(
                        "server closed the stream during authentication".into(),
                    ))
                }
                event => debug!(?event, "ignoring event during authentication"),
            }
        }
    }

    /// Connects again from scratch with the credentials of the last
    /// `authenticate` call.
    pub fn reconnect(&mut self) -> Result<Jid> {
        let credentials = self
            .handler
            .credentials
            .clone()
            .ok_or_else(|| Error::Auth("no credentials to re-authenticate with".into()))?;
        info!(domain = %self.handler.config.domain, "reconnecting");
        self.connect()?;
        self.authenticate(&credentials.username, &credentials.password)
    }

    pub fn is_connected(&self) -> bool {
        self.handler.socket.is_open()
            && !matches!(self.handler.state, State::Disconnected | State::Closing)
    }

    /// The bound JID, once online.
    pub fn jid(&self) -> Option<&Jid> {
        self.handler.jid.as_ref()
    }

    pub fn next_id(&mut self) -> String {
        self.handler.make_id("sm")
    }

    pub fn send<T: XmppSend>(&mut self, data: &T) -> Result<()> {
        self.handler.send(data)
    }

    /// Blocks until the next event.
    pub fn handle(&mut self) -> Result<Event> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(event);
            }
            if !self.handler.socket.is_open() {
                return Err(Error::NotConnected);
            }

            let string = match self.handler.socket.read_str() {
                Ok(s) => s,
                Err(e) => {
                    if !is_timeout(&e) {
                        self.handler.drop_connection();
                    }
                    return Err(e.into());
                }
            };
            if string.is_empty() {
                debug!("connection closed by server");
                self.handler.drop_connection();
                return Ok(Event::StreamClosed);
            }
            self.feed(&string)?;
        }
    }

    /// Like [`handle`](XmppStream::handle), but gives up after `timeout`.
    pub fn process(&mut self, timeout: Duration) -> Result<Option<Event>> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }
        self.handler.socket.set_read_timeout(Some(timeout))?;
        let result = self.handle();
        // The socket may be gone by now
        let _ = self.handler.socket.set_read_timeout(None);

        match result {
            Ok(event) => Ok(Some(event)),
            Err(Error::Io(ref e)) if is_timeout(e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Ends the stream, waiting up to `timeout` for the server to do the same.
    pub fn close(&mut self, timeout: Duration) -> Result<()> {
        if !self.handler.socket.is_open() {
            return Ok(());
        }
        self.handler.close_stream()?;

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.process(remaining) {
                Ok(Some(Event::StreamClosed)) | Ok(None) => break,
                Ok(Some(event)) => trace!(?event, "discarding event while closing"),
                Err(e) => {
                    debug!(error = %e, "error while closing");
                    break;
                }
            }
        }
        self.handler.drop_connection();
        Ok(())
    }

    fn reset(&mut self) {
        self.parser = xml::Parser::new();
        self.builder = xml::ElementBuilder::new();
        self.pending.clear();
        self.handler.reset();
    }

    fn feed(&mut self, data: &str) -> Result<()> {
        self.parser.feed_str(data);

        let builder = &mut self.builder;
        let handler = &mut self.handler;
        let pending = &mut self.pending;
        for event in &mut self.parser {
            match event {
                Ok(xml::Event::ElementStart(xml::StartTag {
                    ref name,
                    ns: Some(ref namespace),
                    ref prefix,
                    ..
                })) if *name == "stream" && *namespace == ns::STREAMS => {
                    trace!("In: stream start");
                    // Children are built against the prefix the server chose
                    *builder = xml::ElementBuilder::new();
                    match *prefix {
                        Some(ref prefix) => {
                            builder.set_default_ns(ns::JABBER_CLIENT.to_string());
                            builder.define_prefix(prefix.clone(), ns::STREAMS.to_string());
                        }
                        None => builder.set_default_ns(ns::STREAMS.to_string()),
                    }
                }
                Ok(xml::Event::ElementEnd(xml::EndTag {
                    ref name,
                    ns: Some(ref namespace),
                    ..
                })) if *name == "stream" && *namespace == ns::STREAMS => {
                    trace!("In: stream end");
                    handler.close_stream()?;
                    handler.drop_connection();
                    pending.push_back(Event::StreamClosed);
                    break;
                }
                Err(e) => {
                    handler.fail_not_well_formed();
                    return Err(Error::Xml(e.to_string()));
                }
                event => match builder.handle_event(event) {
                    Some(Ok(e)) => {
                        if let Some(event) = handler.handle_element(e)? {
                            pending.push_back(event);
                        }
                        if handler.restart {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        handler.fail_not_well_formed();
                        return Err(Error::Xml(e.to_string()));
                    }
                    None => (),
                },
            }
        }

        if self.handler.restart {
            // The server starts over with a fresh document
            self.handler.restart = false;
            self.parser = xml::Parser::new();
            self.builder = xml::ElementBuilder::new();
        }
        Ok(())
    }
}

impl XmppHandler {
    fn reset(&mut self) {
        self.socket.shutdown();
        self.state = State::Disconnected;
        self.authenticator = None;
        self.mechanisms.clear();
        self.authenticated = false;
        self.session_required = false;
        self.awaiting = None;
        self.jid = None;
        self.restart = false;
    }

    fn make_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }

    fn bare_jid(&self) -> Jid {
        match self.credentials {
            Some(ref c) => Jid::new(&c.username, &self.config.domain),
            None => Jid::domain(&self.config.domain),
        }
    }

    fn start_stream(&mut self) -> Result<()> {
        let domain = self.config.domain.clone();
        self.send(&StreamStart { to: &domain })?;
        self.state = State::Negotiating;
        Ok(())
    }

    fn close_stream(&mut self) -> Result<()> {
        if self.state == State::Closing || !self.socket.is_open() {
            return Ok(());
        }
        self.state = State::Closing;
        self.send(&StreamEnd)
    }

    fn drop_connection(&mut self) {
        self.socket.shutdown();
        self.state = State::Disconnected;
    }

    fn fail_not_well_formed(&mut self) {
        warn!("server sent malformed XML, closing the stream");
        let error = StreamError {
            cond: StreamCondition::NotWellFormed,
            text: None,
        };
        let _ = self.send(&error);
        let _ = self.close_stream();
        self.drop_connection();
    }

    fn send<T: XmppSend>(&mut self, data: &T) -> Result<()> {
        trace!("Out: {}", data);
        data.xmpp_send(&mut self.socket)?;
        Ok(())
    }

    fn begin_auth(&mut self) -> Result<()> {
        if self.state != State::AwaitingAuth {
            return Err(Error::NotConnected);
        }
        let credentials = self.credentials.clone().ok_or(Error::NotConnected)?;
        let mut auth = auth::select(&self.mechanisms, &credentials.username, &credentials.password)
            .ok_or_else(|| {
                Error::Auth(format!(
                    "no supported SASL mechanism offered ({})",
                    self.mechanisms.join(", ")
                ))
            })?;

        let mech = auth.mechanism();
        debug!(mechanism = mech, user = %credentials.username, "starting SASL");
        let data = base64::encode(auth.initial()?);
        self.authenticator = Some(auth);
        self.state = State::Authenticating;
        self.send(&AuthStart { mech, data: &data })
    }

    fn handle_element(&mut self, e: xml::Element) -> Result<Option<Event>> {
        trace!("In: {}", e);
        let namespace = e.ns.clone();
        match namespace.as_deref() {
            Some(ns::STREAMS) if e.name == "features" => self.handle_features(&e),
            Some(ns::STREAMS) if e.name == "error" => {
                let (cond, text) = StreamCondition::from_element(&e);
                warn!(condition = cond.name(), "stream error from server");
                let _ = self.close_stream();
                self.drop_connection();
                Err(Error::Stream {
                    condition: cond.name().into(),
                    text,
                })
            }
            Some(ns::FEATURE_TLS) => self.handle_starttls(&e),
            Some(ns::FEATURE_SASL) => self.handle_sasl(&e),
            _ => match AStanza::from_element(e) {
                Ok(stanza) => self.handle_stanza(stanza),
                Err(e) => {
                    debug!(name = %e.name, "ignoring unknown element");
                    Ok(None)
                }
            },
        }
    }

    fn handle_features(&mut self, features: &xml::Element) -> Result<Option<Event>> {
        if !self.authenticated {
            // StartTLS
            if let Some(starttls) = features.get_child("starttls", Some(ns::FEATURE_TLS)) {
                if !self.socket.is_tls() {
                    if self.config.starttls {
                        self.state = State::TlsRequested;
                        self.send(&StartTls)?;
                        return Ok(None);
                    }
                    if starttls.get_child("required", Some(ns::FEATURE_TLS)).is_some() {
                        return Err(Error::Tls("server requires STARTTLS, but it is disabled".into()));
                    }
                }
            }

            // Auth mechanisms
            if let Some(mechs) = features.get_child("mechanisms", Some(ns::FEATURE_SASL)) {
                self.mechanisms = mechs
                    .get_children("mechanism", Some(ns::FEATURE_SASL))
                    .into_iter()
                    .map(|mech| mech.content_str().trim().to_string())
                    .collect();
                debug!(mechanisms = ?self.mechanisms, "server offers SASL");
                self.state = State::AwaitingAuth;
                return Ok(Some(Event::ReadyToAuthenticate));
            }

            return Err(Error::Auth("server offered no SASL mechanisms".into()));
        }

        // Session establishment is only needed when not marked optional
        self.session_required = features
            .get_child("session", Some(ns::FEATURE_SESSION))
            .map_or(false, |s| s.get_child("optional", Some(ns::FEATURE_SESSION)).is_none());

        // Bind
        if features.get_child("bind", Some(ns::FEATURE_BIND)).is_some() {
            return self.handle_bind();
        }

        let jid = self.bare_jid();
        self.jid = Some(jid.clone());
        self.state = State::Online;
        Ok(Some(Event::Online(jid)))
    }

    fn handle_starttls(&mut self, starttls: &xml::Element) -> Result<Option<Event>> {
        match &starttls.name[..] {
            "proceed" if self.state == State::TlsRequested => {
                debug!("negotiating TLS");
                self.socket
                    .starttls(&self.config.domain, self.config.verify_certificates)?;
                self.restart = true;
                self.start_stream()?;
                Ok(None)
            }
            "failure" => {
                self.drop_connection();
                Err(Error::Tls("server refused STARTTLS".into()))
            }
            _ => Ok(None),
        }
    }

    fn handle_sasl(&mut self, sasl: &xml::Element) -> Result<Option<Event>> {
        match &sasl.name[..] {
            "challenge" => {
                let challenge = decode_sasl(&sasl.content_str())?;
                let auth = self
                    .authenticator
                    .as_mut()
                    .ok_or_else(|| Error::Auth("unexpected SASL challenge".into()))?;
                let data = base64::encode(auth.continuation(&challenge)?);
                self.send(&AuthResponse { data: &data })?;
                Ok(None)
            }
            "success" => {
                let additional = decode_sasl(&sasl.content_str())?;
                if let Some(mut auth) = self.authenticator.take() {
                    auth.continuation(&additional)?;
                }
                self.authenticated = true;
                info!(user = ?self.credentials.as_ref().map(|c| &c.username), "authenticated");
                self.restart = true;
                self.start_stream()?;
                Ok(Some(Event::Authenticated))
            }
            "failure" => {
                self.authenticator = None;
                let condition = condition_name(sasl, ns::FEATURE_SASL)
                    .unwrap_or_else(|| "unknown SASL failure".into());
                let text = sasl
                    .get_child("text", Some(ns::FEATURE_SASL))
                    .map(|t| t.content_str());
                Err(Error::Auth(match text {
                    Some(text) => format!("{} ({})", condition, text),
                    None => condition,
                }))
            }
            _ => Ok(None),
        }
    }

    fn handle_bind(&mut self) -> Result<Option<Event>> {
        let id = self.make_id("bind");
        let mut bind_iq = Iq::new(IqType::Set, id.clone());
        {
            let bind = bind_iq.tag(xml::Element::new(
                "bind".into(),
                Some(ns::FEATURE_BIND.into()),
                vec![],
            ));
            if let Some(ref resource) = self.config.resource {
                bind.tag(xml::Element::new(
                    "resource".into(),
                    Some(ns::FEATURE_BIND.into()),
                    vec![],
                ))
                .text(resource.clone());
            }
        }
        self.awaiting = Some(id);
        self.state = State::Binding;
        self.send(&bind_iq)?;
        Ok(None)
    }

    fn handle_session(&mut self) -> Result<Option<Event>> {
        let id = self.make_id("sess");
        let mut session_iq = Iq::new(IqType::Set, id.clone());
        session_iq.tag(xml::Element::new(
            "session".into(),
            Some(ns::FEATURE_SESSION.into()),
            vec![],
        ));
        self.awaiting = Some(id);
        self.state = State::Session;
        self.send(&session_iq)?;
        Ok(None)
    }

    fn handle_stanza(&mut self, stanza: AStanza) -> Result<Option<Event>> {
        match stanza {
            AStanza::Iq(iq) => {
                if matches!(self.state, State::Binding | State::Session)
                    && iq.id().is_some()
                    && iq.id() == self.awaiting.as_deref()
                {
                    return self.handle_bind_reply(iq);
                }
                match iq.stanza_type() {
                    Some(ty) if ty.is_request() => Ok(Some(Event::IqRequest(iq))),
                    _ => Ok(Some(Event::IqResponse(iq))),
                }
            }
            AStanza::Message(message) => Ok(Some(Event::Message(message))),
            AStanza::Presence(presence) => Ok(Some(Event::Presence(presence))),
        }
    }

    fn handle_bind_reply(&mut self, iq: Iq) -> Result<Option<Event>> {
        self.awaiting = None;
        if iq.stanza_type() != Some(IqType::Result) {
            let condition = condition_name(&iq, ns::STANZA_ERRORS)
                .unwrap_or_else(|| "unknown error".into());
            return Err(Error::Bind(condition));
        }

        if self.state == State::Binding {
            let jid = match iq
                .get_child("bind", Some(ns::FEATURE_BIND))
                .and_then(|bind| bind.get_child("jid", Some(ns::FEATURE_BIND)))
            {
                Some(jid) => jid.content_str().trim().parse()?,
                None => self.bare_jid(),
            };
            if jid.bare() != self.bare_jid() {
                warn!(%jid, expected = %self.bare_jid(), "server bound a different account");
            }
            self.jid = Some(jid);
            if self.session_required {
                return self.handle_session();
            }
        }

        self.state = State::Online;
        let jid = self.jid.clone().unwrap_or_else(|| self.bare_jid());
        info!(%jid, "online");
        Ok(Some(Event::Online(jid)))
    }
}
