use std::thread;
use std::time::{Duration, Instant};

use chrono::{Local, Utc};
use clap::Args;
use tracing::debug;

use super::{open_session, status::print_status, CommandResult};

#[derive(Args)]
pub struct WatchArgs {
    /// Stop after this many ticks (runs until interrupted when omitted)
    #[arg(long)]
    ticks: Option<u64>,
}

/// Live view: redraw the countdown every tick and re-read the shared
/// record every poll interval.
pub fn run(args: WatchArgs) -> CommandResult {
    let (config, mut session) = open_session()?;
    let tick = Duration::from_secs(config.timing.tick_interval_secs);
    let poll = Duration::from_secs(config.timing.poll_interval_secs);

    print_status(&session.status(Local::now()));

    let mut last_poll = Instant::now();
    let mut count = 0u64;
    while args.ticks.map_or(true, |limit| count < limit) {
        thread::sleep(tick);
        count += 1;

        if last_poll.elapsed() >= poll {
            last_poll = Instant::now();
            let before = session.global().total_grass;
            session.refresh_global(Local::now());
            let after = session.global().total_grass;
            debug!(before, after, "polled global record");
            if after != before {
                println!();
                print_status(&session.status(Local::now()));
                continue;
            }
        }

        println!("boss      {}", session.countdown(Utc::now()));
    }
    Ok(())
}
