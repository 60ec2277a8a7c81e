use clap::Args;
use niumaxing_core::{LocalStore, Persistence};

use super::{open_session, CommandResult};

const TITLE: &str = "- Hero's Legend: The Defense of Planet Niuma -";

const STORY: &[&str] = &[
    "Star Lord BOSS has invaded at the head of a terrifying mechanical legion, \
     and the once peaceful planet Niuma is in mortal danger!",
    "An ancient prophecy has survived the ages: when darkness covers the land, \
     only if every niuma stands together and feeds grass each day will the \
     mightiest Niuma Warrior wake from its sleep in the star core.",
    "\"Every feeding pours starlight into the warrior; every step it grows is \
     a step our civilization takes towards victory.\"",
    "The bell of the year-end battle is about to ring! Brave niumas, lend your \
     fingertips, raise the mightiest warrior, strike back at planet BOSS and \
     defend our home!",
];

#[derive(Args)]
pub struct StoryArgs {
    /// Forget that the story was shown so `status` shows it again
    #[arg(long)]
    reset: bool,
}

pub fn run(args: StoryArgs) -> CommandResult {
    let (_, session) = open_session()?;
    let persistence = session.persistence();

    if args.reset {
        persistence.reset_story();
        println!("story will show again on next status");
        return Ok(());
    }

    print_story();
    persistence.mark_story_seen();
    Ok(())
}

/// Print the story if it has not been shown on this device yet.
pub fn show_once<L: LocalStore>(persistence: &Persistence<L>) {
    if !persistence.story_seen() {
        print_story();
        println!();
        persistence.mark_story_seen();
    }
}

fn print_story() {
    println!("{TITLE}");
    for paragraph in STORY {
        println!();
        println!("{paragraph}");
    }
}
