use chrono::Local;
use clap::Args;
use niumaxing_core::{FeedOutcome, FeedReceipt};
use serde::Serialize;

use super::{open_session, print_json, CommandResult};

#[derive(Args)]
pub struct FeedArgs {
    /// Number of feed actions to perform
    #[arg(long, default_value = "1")]
    times: u32,
    /// Print the outcome of every action as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct FeedReport {
    fed: u32,
    grass_added: u64,
    criticals: u32,
    limit_reached: bool,
    outcomes: Vec<FeedOutcome>,
}

pub fn run(args: FeedArgs) -> CommandResult {
    let (_, mut session) = open_session()?;

    let mut outcomes = Vec::new();
    for _ in 0..args.times {
        let outcome = session.feed(Local::now());
        let stop = outcome == FeedOutcome::LimitReached;
        if !args.json {
            print_outcome(&outcome, session.settings().rules.daily_limit);
        }
        outcomes.push(outcome);
        if stop {
            break;
        }
    }

    if args.json {
        let receipts: Vec<&FeedReceipt> = outcomes.iter().filter_map(FeedOutcome::receipt).collect();
        return print_json(&FeedReport {
            fed: receipts.len() as u32,
            grass_added: receipts.iter().map(|r| r.increment).sum(),
            criticals: receipts.iter().filter(|r| r.critical).count() as u32,
            limit_reached: outcomes.last() == Some(&FeedOutcome::LimitReached),
            outcomes,
        });
    }

    Ok(())
}

fn print_outcome(outcome: &FeedOutcome, daily_limit: u32) {
    match outcome {
        FeedOutcome::Fed(receipt) => {
            let crit = if receipt.critical { " CRITICAL!" } else { "" };
            println!(
                "+{}{crit}  total {}  today {}/{}",
                receipt.increment, receipt.total_after, receipt.today_count, daily_limit
            );
            if let Some(evolution) = receipt.evolution {
                println!(
                    "evolved: {} -> {}. {}",
                    evolution.from,
                    evolution.to,
                    evolution.to.description()
                );
            }
        }
        FeedOutcome::LimitReached => {
            println!("daily limit of {daily_limit} reached, come back tomorrow");
        }
    }
}
