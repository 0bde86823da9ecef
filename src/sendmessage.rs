// rust-xmpp
// Copyright (c) 2015 Florian Zeitz
//
// This project is MIT licensed.
// Please see the COPYING file for more information.

//! Send one chat message to a user, a given number of times.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::Client;
use crate::error::Error;
use crate::jid::Jid;
use crate::stanzas::MessageType;

/// Password of the test accounts this tool logs in with.
pub const DEFAULT_PASSWORD: &str = "astral";

#[derive(Error, Debug)]
pub enum SendError {
    #[error("could not connect to the server")]
    Connect(#[source] Error),

    #[error("could not authenticate user {user}")]
    Auth {
        user: String,
        #[source]
        source: Error,
    },

    #[error(transparent)]
    Session(#[from] Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendJob {
    pub domain: String,
    /// Sending user, without the domain.
    pub from: String,
    /// Receiving user, without the domain.
    pub to: String,
    pub body: String,
    pub times: u32,
    pub password: String,
}

impl SendJob {
    pub fn new(domain: &str, from: &str, to: &str, body: &str) -> SendJob {
        SendJob {
            domain: domain.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            body: body.to_string(),
            times: 1,
            password: DEFAULT_PASSWORD.to_string(),
        }
    }

    pub fn times(mut self, times: u32) -> SendJob {
        self.times = times;
        self
    }

    pub fn password(mut self, password: &str) -> SendJob {
        self.password = password.to_string();
        self
    }

    pub fn recipient(&self) -> Jid {
        Jid::new(&self.to, &self.domain)
    }
}

/// How long to wait for incoming traffic at each step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollConfig {
    pub after_presence: Duration,
    pub after_send: Duration,
    pub close_wait: Duration,
}

impl Default for PollConfig {
    fn default() -> PollConfig {
        PollConfig {
            after_presence: Duration::from_secs(1),
            after_send: Duration::ZERO,
            close_wait: Duration::from_secs(1),
        }
    }
}

/// Runs the whole exchange and returns how many messages went out.
///
/// The connection is re-established at most once, and only if it dropped
/// right after the initial presence.
pub fn run<C: Client + ?Sized>(
    client: &mut C,
    job: &SendJob,
    polls: &PollConfig,
) -> Result<u32, SendError> {
    let recipient = job.recipient();

    client.connect().map_err(SendError::Connect)?;
    client
        .authenticate(&job.from, &job.password)
        .map_err(|source| SendError::Auth {
            user: job.from.clone(),
            source,
        })?;

    client.send_presence()?;
    client.process_one(polls.after_presence)?;
    if !client.is_connected() {
        warn!("disconnected after initial presence, reconnecting");
        client.reconnect_and_reauth()?;
    }

    for n in 1..=job.times {
        client.send_message(&recipient, &job.body, MessageType::Chat)?;
        client.process_one(polls.after_send)?;
        debug!(n, to = %recipient, "message sent");
    }
    info!(count = job.times, to = %recipient, "done sending");

    if let Err(e) = client.close(polls.close_wait) {
        warn!(error = %e, "could not close the stream cleanly");
    }
    Ok(job.times)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipient_gets_the_domain_appended() {
        let job = SendJob::new("localhost", "td", "dut", "Hello");
        assert_eq!(job.recipient().to_string(), "dut@localhost");
        assert_eq!(job.times, 1);
        assert_eq!(job.password, "astral");
    }

    #[test]
    fn builder_overrides() {
        let job = SendJob::new("example.org", "td", "dut", "Hi")
            .times(1000)
            .password("secret");
        assert_eq!(job.times, 1000);
        assert_eq!(job.password, "secret");
    }

    #[test]
    fn error_messages() {
        let err = SendError::Connect(Error::NotConnected);
        assert_eq!(err.to_string(), "could not connect to the server");

        let err = SendError::Auth {
            user: "td".into(),
            source: Error::Auth("not-authorized".into()),
        };
        assert_eq!(err.to_string(), "could not authenticate user td");
    }
}
