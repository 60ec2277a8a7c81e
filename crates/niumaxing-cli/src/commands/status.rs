use chrono::Local;
use clap::Args;
use niumaxing_core::StatusView;

use super::{open_session, print_json, story, CommandResult};

#[derive(Args)]
pub struct StatusArgs {
    /// Print the status as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: StatusArgs) -> CommandResult {
    let (_, mut session) = open_session()?;
    let status = session.status(Local::now());

    if args.json {
        return print_json(&status);
    }

    story::show_once(session.persistence());
    print_status(&status);
    Ok(())
}

pub fn print_status(status: &StatusView) {
    println!("{} ({})", status.stage_label, status.stage.description());
    match status.next_stage {
        Some(next) => println!(
            "progress  {:>5.1}% to {} at {}",
            status.progress_percent,
            next,
            next.threshold()
        ),
        None => println!("progress  max level"),
    }
    println!("grass     {} total, {} daily", status.total_grass, status.daily_total);
    println!(
        "you       {} fed, {}/{} today{}",
        status.my_total,
        status.today_count,
        status.daily_limit,
        if status.can_feed { "" } else { " (limit reached)" }
    );
    println!(
        "store     {}",
        if status.shared_store { "shared" } else { "this device only" }
    );
    if status.countdown.is_over() {
        println!("boss      the battle has begun");
    } else {
        println!("boss      {}", status.countdown);
    }
    if let Some(notice) = status.evolution {
        println!("evolved   {} -> {}", notice.from, notice.to);
    }
}
