use chrono::Utc;
use clap::Args;
use serde_json::json;

use super::{open_session, print_json, CommandResult};

#[derive(Args)]
pub struct CountdownArgs {
    /// Print the remaining time as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: CountdownArgs) -> CommandResult {
    let (_, session) = open_session()?;
    let countdown = session.countdown(Utc::now());

    if args.json {
        return print_json(&json!({
            "target": session.settings().boss_fight_at,
            "over": countdown.is_over(),
            "remaining": countdown,
        }));
    }

    if countdown.is_over() {
        println!("the battle has begun");
    } else {
        println!("{countdown}");
    }
    Ok(())
}
