// rust-xmpp
// Copyright (c) 2015 Florian Zeitz
//
// This project is MIT licensed.
// Please see the COPYING file for more information.

use std::ffi::OsString;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::Parser;

use crate::config::{ConnectionConfig, DEFAULT_PORT};
use crate::sendmessage::{PollConfig, SendJob, DEFAULT_PASSWORD};

pub const USAGE: &str = "Usage: sendmessage <domain> <from> <to> <message> [times]\n\
                         Example: sendmessage localhost td dut Hello 1000";

#[derive(Debug, Clone, Parser)]
#[command(name = "sendmessage")]
#[command(about = "Log in to an XMPP server and send a chat message, optionally many times")]
pub struct Cli {
    /// Server domain
    pub domain: String,

    /// Sending user, without the domain
    pub from: String,

    /// Receiving user; the domain is appended
    pub to: String,

    /// Message body
    pub message: String,

    /// How many times to send the message
    #[arg(default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub times: u32,

    #[arg(long, env = "SENDMESSAGE_PASSWORD", default_value = DEFAULT_PASSWORD, hide_env_values = true)]
    pub password: String,

    /// Host to connect to instead of the domain
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Never negotiate TLS
    #[arg(long)]
    pub no_starttls: bool,

    /// Accept any server certificate
    #[arg(long)]
    pub insecure: bool,

    /// Resource to bind
    #[arg(long)]
    pub resource: Option<String>,

    /// Milliseconds to wait for incoming traffic after each message
    #[arg(long, default_value_t = 0)]
    pub poll_ms: u64,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Cli {
    pub fn try_parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Cli::try_parse_from(args)
    }

    pub fn job(&self) -> SendJob {
        SendJob::new(&self.domain, &self.from, &self.to, &self.message)
            .times(self.times)
            .password(&self.password)
    }

    pub fn connection(&self) -> ConnectionConfig {
        ConnectionConfig::new(&self.domain)
            .host(self.host.clone())
            .port(self.port)
            .starttls(!self.no_starttls)
            .verify_certificates(!self.insecure)
            .resource(self.resource.clone())
    }

    pub fn polls(&self) -> PollConfig {
        PollConfig {
            after_send: Duration::from_millis(self.poll_ms),
            ..PollConfig::default()
        }
    }
}

/// Too few positional arguments; answered with [`USAGE`] rather than clap's
/// own report.
pub fn is_usage_error(err: &clap::Error) -> bool {
    err.kind() == ErrorKind::MissingRequiredArgument
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_args(std::iter::once("sendmessage").chain(args.iter().copied()))
    }

    #[test]
    fn four_arguments_send_once() {
        let cli = parse(&["localhost", "td", "dut", "Hello"]).unwrap();
        let job = cli.job();
        assert_eq!(job, SendJob::new("localhost", "td", "dut", "Hello"));
        assert_eq!(job.recipient().to_string(), "dut@localhost");
    }

    #[test]
    fn fifth_argument_is_the_count() {
        let cli = parse(&["localhost", "td", "dut", "Hello", "3"]).unwrap();
        assert_eq!(cli.job().times, 3);
    }

    #[test]
    fn too_few_arguments_is_a_usage_error() {
        for args in [&[][..], &["localhost"][..], &["localhost", "td", "dut"][..]] {
            let err = parse(args).unwrap_err();
            assert!(is_usage_error(&err), "{:?}: {}", args, err);
        }
    }

    #[test]
    fn count_must_be_positive() {
        let err = parse(&["localhost", "td", "dut", "Hello", "0"]).unwrap_err();
        assert!(!is_usage_error(&err));
        assert!(parse(&["localhost", "td", "dut", "Hello", "many"]).is_err());
    }

    #[test]
    fn connection_options() {
        let cli = parse(&[
            "example.org",
            "td",
            "dut",
            "Hello",
            "--host",
            "127.0.0.1",
            "--port",
            "15222",
            "--no-starttls",
            "--insecure",
        ])
        .unwrap();
        let config = cli.connection();
        assert_eq!(config.address(), ("127.0.0.1", 15222));
        assert_eq!(config.domain, "example.org");
        assert!(!config.starttls);
        assert!(!config.verify_certificates);
    }

    #[test]
    fn usage_text_has_two_lines() {
        assert_eq!(USAGE.lines().count(), 2);
        assert!(USAGE.starts_with("Usage: sendmessage <domain> <from> <to> <message> [times]"));
    }
}
