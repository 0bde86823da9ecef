// rust-xmpp
// Copyright (c) 2014 Florian Zeitz
//
// This project is MIT licensed.
// Please see the COPYING file for more information.

use crate::ns;

use super::{Stanza, StanzaType};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PresenceType {
    Error,
    Probe,
    Subscribe,
    Subscribed,
    Unavailable,
    Unsubscribe,
    Unsubscribed,
    Available,
}

impl StanzaType for PresenceType {
    // Available presence carries no type attribute
    fn attr_string(&self) -> Option<&'static str> {
        match *self {
            PresenceType::Error => Some("error"),
            PresenceType::Probe => Some("probe"),
            PresenceType::Subscribe => Some("subscribe"),
            PresenceType::Subscribed => Some("subscribed"),
            PresenceType::Unavailable => Some("unavailable"),
            PresenceType::Unsubscribe => Some("unsubscribe"),
            PresenceType::Unsubscribed => Some("unsubscribed"),
            PresenceType::Available => None,
        }
    }

    fn from_attr(ty: Option<&str>) -> Option<PresenceType> {
        match ty {
            None => Some(PresenceType::Available),
            Some("error") => Some(PresenceType::Error),
            Some("probe") => Some(PresenceType::Probe),
            Some("subscribe") => Some(PresenceType::Subscribe),
            Some("subscribed") => Some(PresenceType::Subscribed),
            Some("unavailable") => Some(PresenceType::Unavailable),
            Some("unsubscribe") => Some(PresenceType::Unsubscribe),
            Some("unsubscribed") => Some(PresenceType::Unsubscribed),
            Some(_) => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Presence {
    elem: xml::Element,
}

impl_Stanza!("presence", Presence, PresenceType);

impl Presence {
    pub fn new(ty: PresenceType, id: String) -> Presence {
        let mut presence = Presence {
            elem: xml::Element::new(
                "presence".into(),
                Some(ns::JABBER_CLIENT.into()),
                vec![("id".into(), None, id)],
            ),
        };
        presence.set_stanza_type(ty);
        presence
    }
}
