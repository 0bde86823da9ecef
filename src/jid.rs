// rust-xmpp
// Copyright (c) 2015 Florian Zeitz
//
// This project is MIT licensed.
// Please see the COPYING file for more information.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum JidError {
    #[error("JID has an empty domain")]
    EmptyDomain,
    #[error("JID has an empty localpart before '@'")]
    EmptyNode,
    #[error("JID has an empty resource after '/'")]
    EmptyResource,
}

/// An XMPP address of the form `[node@]domain[/resource]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Jid {
    pub node: Option<String>,
    pub domain: String,
    pub resource: Option<String>,
}

impl Jid {
    /// Builds the bare address `node@domain`.
    pub fn new(node: &str, domain: &str) -> Jid {
        Jid {
            node: Some(node.to_string()),
            domain: domain.to_string(),
            resource: None,
        }
    }

    pub fn domain(domain: &str) -> Jid {
        Jid {
            node: None,
            domain: domain.to_string(),
            resource: None,
        }
    }

    pub fn bare(&self) -> Jid {
        Jid {
            node: self.node.clone(),
            domain: self.domain.clone(),
            resource: None,
        }
    }
}

impl FromStr for Jid {
    type Err = JidError;

    fn from_str(s: &str) -> Result<Jid, JidError> {
        // The resource may itself contain '@' and '/', so split it off first.
        let (rest, resource) = match s.find('/') {
            Some(idx) => (&s[..idx], Some(&s[idx + 1..])),
            None => (s, None),
        };
        let (node, domain) = match rest.find('@') {
            Some(idx) => (Some(&rest[..idx]), &rest[idx + 1..]),
            None => (None, rest),
        };

        if domain.is_empty() {
            return Err(JidError::EmptyDomain);
        }
        if node == Some("") {
            return Err(JidError::EmptyNode);
        }
        if resource == Some("") {
            return Err(JidError::EmptyResource);
        }

        Ok(Jid {
            node: node.map(str::to_string),
            domain: domain.to_string(),
            resource: resource.map(str::to_string),
        })
    }
}

impl fmt::Display for Jid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(ref node) = self.node {
            write!(f, "{}@", node)?;
        }
        f.write_str(&self.domain)?;
        if let Some(ref resource) = self.resource {
            write!(f, "/{}", resource)?;
        }
        Ok(())
    }
}
