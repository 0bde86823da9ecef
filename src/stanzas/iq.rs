// rust-xmpp
// Copyright (c) 2014-2015 Florian Zeitz
//
// This project is MIT licensed.
// Please see the COPYING file for more information.

use crate::ns;

use super::{Stanza, StanzaType};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IqType {
    Set,
    Get,
    Result,
    Error,
}

impl IqType {
    pub fn is_request(&self) -> bool {
        matches!(*self, IqType::Get | IqType::Set)
    }
}

impl StanzaType for IqType {
    fn attr_string(&self) -> Option<&'static str> {
        Some(match *self {
            IqType::Set => "set",
            IqType::Get => "get",
            IqType::Result => "result",
            IqType::Error => "error",
        })
    }

    fn from_attr(ty: Option<&str>) -> Option<IqType> {
        match ty? {
            "get" => Some(IqType::Get),
            "set" => Some(IqType::Set),
            "result" => Some(IqType::Result),
            "error" => Some(IqType::Error),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Iq {
    elem: xml::Element,
}

impl_Stanza!("iq", Iq, IqType);

impl Iq {
    pub fn new(ty: IqType, id: String) -> Iq {
        let ty = ty.attr_string().unwrap_or("get");
        Iq {
            elem: xml::Element::new(
                "iq".into(),
                Some(ns::JABBER_CLIENT.into()),
                vec![("type".into(), None, ty.into()), ("id".into(), None, id)],
            ),
        }
    }

    /// The empty `result` answering this request.
    pub fn result_reply(&self) -> Iq {
        let mut reply = Iq::new(IqType::Result, self.id().unwrap_or("").into());
        reply.set_to(self.from().map(|x| x.into()));
        reply
    }

    /// The element name and namespace of the payload, if any.
    pub fn payload(&self) -> Option<(&str, Option<&str>)> {
        self.elem.children.iter().find_map(|child| match *child {
            xml::Xml::ElementNode(ref e) => Some((&e.name[..], e.ns.as_deref())),
            _ => None,
        })
    }
}
