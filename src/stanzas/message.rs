// rust-xmpp
// Copyright (c) 2014-2015 Florian Zeitz
//
// This project is MIT licensed.
// Please see the COPYING file for more information.

use crate::jid::Jid;
use crate::ns;

use super::{Stanza, StanzaType};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MessageType {
    Normal,
    Headline,
    Chat,
    Groupchat,
    Error,
}

impl StanzaType for MessageType {
    fn attr_string(&self) -> Option<&'static str> {
        Some(match *self {
            MessageType::Normal => "normal",
            MessageType::Headline => "headline",
            MessageType::Chat => "chat",
            MessageType::Groupchat => "groupchat",
            MessageType::Error => "error",
        })
    }

    fn from_attr(ty: Option<&str>) -> Option<MessageType> {
        match ty.unwrap_or("normal") {
            "normal" => Some(MessageType::Normal),
            "headline" => Some(MessageType::Headline),
            "chat" => Some(MessageType::Chat),
            "groupchat" => Some(MessageType::Groupchat),
            "error" => Some(MessageType::Error),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Message {
    elem: xml::Element,
}

impl_Stanza!("message", Message, MessageType);

impl Message {
    pub fn new(ty: MessageType, id: String) -> Message {
        let ty = ty.attr_string().unwrap_or("normal");
        Message {
            elem: xml::Element::new(
                "message".into(),
                Some(ns::JABBER_CLIENT.into()),
                vec![("type".into(), None, ty.into()), ("id".into(), None, id)],
            ),
        }
    }

    /// A message of kind `ty` carrying `body`, addressed to `to`.
    pub fn with_body(ty: MessageType, to: &Jid, body: &str, id: String) -> Message {
        let mut message = Message::new(ty, id);
        message.set_to(Some(to.to_string()));
        message.set_body(body);
        message
    }

    pub fn body(&self) -> Option<String> {
        self.elem
            .get_child("body", Some(ns::JABBER_CLIENT))
            .map(|body| body.content_str())
    }

    pub fn set_body(&mut self, body: &str) {
        self.elem
            .tag(xml::Element::new("body".into(), Some(ns::JABBER_CLIENT.into()), vec![]))
            .text(body.into());
    }
}
