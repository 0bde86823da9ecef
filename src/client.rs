// rust-xmpp
// Copyright (c) 2015 Florian Zeitz
//
// This project is MIT licensed.
// Please see the COPYING file for more information.

use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::error::Result;
use crate::jid::Jid;
use crate::ns;
use crate::stanzas::{DefinedCondition, Iq, Message, MessageType, Presence, PresenceType, Stanza};
use crate::{Event, XmppStream};

/// What a simple sending client needs from a session.
pub trait Client {
    fn connect(&mut self) -> Result<()>;
    fn authenticate(&mut self, username: &str, password: &str) -> Result<()>;
    /// Announces initial (available) presence.
    fn send_presence(&mut self) -> Result<()>;
    /// Handles at most one incoming event, waiting up to `timeout` for it.
    fn process_one(&mut self, timeout: Duration) -> Result<()>;
    fn is_connected(&self) -> bool;
    fn reconnect_and_reauth(&mut self) -> Result<()>;
    fn send_message(&mut self, to: &Jid, body: &str, kind: MessageType) -> Result<()>;
    fn close(&mut self, timeout: Duration) -> Result<()>;
}

/// The answer to an incoming `get` or `set`: pings are acknowledged, a
/// request without a payload is malformed, anything else is refused.
fn reply_to(iq: &Iq) -> Iq {
    match iq.payload() {
        Some(("ping", Some(ns::PING))) => iq.result_reply(),
        None => iq.error_reply(DefinedCondition::BadRequest, None),
        payload => {
            debug!(?payload, "refusing unsupported request");
            iq.error_reply(DefinedCondition::ServiceUnavailable, None)
        }
    }
}

impl Client for XmppStream {
    fn connect(&mut self) -> Result<()> {
        XmppStream::connect(self)
    }

    fn authenticate(&mut self, username: &str, password: &str) -> Result<()> {
        XmppStream::authenticate(self, username, password).map(|_| ())
    }

    fn send_presence(&mut self) -> Result<()> {
        let id = self.next_id();
        self.send(&Presence::new(PresenceType::Available, id))
    }

    fn process_one(&mut self, timeout: Duration) -> Result<()> {
        let event = match self.process(timeout) {
            Ok(Some(event)) => event,
            Ok(None) => return Ok(()),
            Err(e) if e.is_disconnect() => {
                warn!(error = %e, "connection lost");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        match event {
            Event::IqRequest(iq) => self.send(&reply_to(&iq)),
            Event::Message(message) => {
                debug!(from = ?message.from(), body = ?message.body(), "incoming message");
                Ok(())
            }
            Event::StreamClosed => {
                info!("server closed the stream");
                Ok(())
            }
            event => {
                trace!(?event, "processed");
                Ok(())
            }
        }
    }

    fn is_connected(&self) -> bool {
        XmppStream::is_connected(self)
    }

    fn reconnect_and_reauth(&mut self) -> Result<()> {
        self.reconnect().map(|_| ())
    }

    fn send_message(&mut self, to: &Jid, body: &str, kind: MessageType) -> Result<()> {
        let id = self.next_id();
        self.send(&Message::with_body(kind, to, body, id))
    }

    fn close(&mut self, timeout: Duration) -> Result<()> {
        XmppStream::close(self, timeout)
    }
}
