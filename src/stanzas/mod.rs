// rust-xmpp
// Copyright (c) 2014-2015 Florian Zeitz
//
// This project is MIT licensed.
// Please see the COPYING file for more information.

use crate::ns;

pub use self::iq::Iq;
pub use self::iq::IqType;
pub use self::message::Message;
pub use self::message::MessageType;
pub use self::presence::Presence;
pub use self::presence::PresenceType;

/// The stanza error conditions this client answers with (RFC 6120 8.3.3).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DefinedCondition {
    /// A request without exactly one payload.
    BadRequest,
    /// A request for something this client does not offer.
    ServiceUnavailable,
}

impl DefinedCondition {
    pub fn name(&self) -> &'static str {
        match *self {
            DefinedCondition::BadRequest => "bad-request",
            DefinedCondition::ServiceUnavailable => "service-unavailable",
        }
    }

    fn error_type(&self) -> &'static str {
        match *self {
            DefinedCondition::BadRequest => "modify",
            DefinedCondition::ServiceUnavailable => "cancel",
        }
    }
}

pub trait StanzaType: Sized {
    /// The `type` attribute, or `None` for the kind that leaves it out.
    fn attr_string(&self) -> Option<&'static str>;
    /// Reads the `type` attribute; `None` on input means it is absent.
    fn from_attr(ty: Option<&str>) -> Option<Self>;
}

fn set_or_remove(elem: &mut xml::Element, name: &str, value: Option<String>) {
    match value {
        Some(value) => {
            elem.set_attribute(name.into(), None, value);
        }
        None => {
            elem.remove_attribute(name, None);
        }
    }
}

/// A top-level `iq`, `message` or `presence` element.
pub trait Stanza: Sized {
    type Ty: StanzaType;
    const NAME: &'static str;

    fn wrap(elem: xml::Element) -> Self;
    fn element(&self) -> &xml::Element;
    fn element_mut(&mut self) -> &mut xml::Element;

    /// Hands `e` back unchanged if it is not this kind of stanza.
    fn from_element(e: xml::Element) -> Result<Self, xml::Element> {
        let client_ns = matches!(
            e.ns.as_deref(),
            Some(ns::JABBER_CLIENT) | Some(ns::JABBER_SERVER)
        );
        if client_ns && e.name == Self::NAME {
            Ok(Self::wrap(e))
        } else {
            Err(e)
        }
    }

    fn to(&self) -> Option<&str> {
        self.element().get_attribute("to", None)
    }

    fn from(&self) -> Option<&str> {
        self.element().get_attribute("from", None)
    }

    fn id(&self) -> Option<&str> {
        self.element().get_attribute("id", None)
    }

    fn stanza_type(&self) -> Option<Self::Ty> {
        Self::Ty::from_attr(self.element().get_attribute("type", None))
    }

    fn set_to(&mut self, to: Option<String>) {
        set_or_remove(self.element_mut(), "to", to);
    }

    fn set_stanza_type(&mut self, ty: Self::Ty) {
        set_or_remove(self.element_mut(), "type", ty.attr_string().map(str::to_string));
    }

    /// An error stanza answering this one, sent back to its sender.
    fn error_reply(&self, cond: DefinedCondition, text: Option<&str>) -> Self {
        let id = self.id().unwrap_or("").to_string();
        let mut reply = Self::wrap(xml::Element::new(
            Self::NAME.into(),
            Some(ns::JABBER_CLIENT.into()),
            vec![("type".into(), None, "error".into()), ("id".into(), None, id)],
        ));
        {
            let error = reply.element_mut().tag(xml::Element::new(
                "error".into(),
                Some(ns::JABBER_CLIENT.into()),
                vec![("type".into(), None, cond.error_type().into())],
            ));
            error.tag_stay(xml::Element::new(
                cond.name().into(),
                Some(ns::STANZA_ERRORS.into()),
                vec![],
            ));
            if let Some(text) = text {
                error
                    .tag(xml::Element::new(
                        "text".into(),
                        Some(ns::STANZA_ERRORS.into()),
                        vec![],
                    ))
                    .text(text.into());
            }
        }
        reply.set_to(self.from().map(str::to_string));
        reply
    }
}

macro_rules! impl_Stanza(
    ($name: expr, $kind: ident, $ty: ty) => (
        impl $crate::stanzas::Stanza for $kind {
            type Ty = $ty;
            const NAME: &'static str = $name;

            fn wrap(elem: xml::Element) -> $kind {
                $kind { elem }
            }

            fn element(&self) -> &xml::Element {
                &self.elem
            }

            fn element_mut(&mut self) -> &mut xml::Element {
                &mut self.elem
            }
        }

        impl ::std::ops::Deref for $kind {
            type Target = xml::Element;
            fn deref(&self) -> &xml::Element {
                &self.elem
            }
        }

        impl ::std::ops::DerefMut for $kind {
            fn deref_mut(&mut self) -> &mut xml::Element {
                &mut self.elem
            }
        }

        impl ::std::fmt::Display for $kind {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                self.elem.fmt(f)
            }
        }

        impl $crate::xmpp_send::XmppSend for $kind {}
    );
);

// Has to be after impl_Stanza!
mod iq;
mod message;
mod presence;

/// An incoming stanza of any kind.
#[derive(Clone, Debug)]
pub enum AStanza {
    Iq(Iq),
    Message(Message),
    Presence(Presence),
}

impl AStanza {
    pub fn from_element(e: xml::Element) -> Result<AStanza, xml::Element> {
        match &e.name[..] {
            "iq" => Iq::from_element(e).map(AStanza::Iq),
            "message" => Message::from_element(e).map(AStanza::Message),
            "presence" => Presence::from_element(e).map(AStanza::Presence),
            _ => Err(e),
        }
    }
}
