// rust-xmpp
// Copyright (c) 2015 Florian Zeitz
//
// This project is MIT licensed.
// Please see the COPYING file for more information.

use std::process;

use anyhow::Result;
use xmpp::cli::{self, Cli};
use xmpp::logging;
use xmpp::sendmessage;
use xmpp::XmppStream;

fn main() -> Result<()> {
    let cli = match Cli::try_parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) if cli::is_usage_error(&e) => {
            println!("{}", cli::USAGE);
            process::exit(1);
        }
        Err(e) => e.exit(),
    };

    logging::init_cli_logger(cli.verbose);
    tracing::debug!(domain = %cli.domain, from = %cli.from, to = %cli.to, times = cli.times, "starting");

    let mut stream = XmppStream::new(cli.connection());
    let sent = sendmessage::run(&mut stream, &cli.job(), &cli.polls())?;
    tracing::info!("sent {} message(s) to {}", sent, cli.job().recipient());
    Ok(())
}
