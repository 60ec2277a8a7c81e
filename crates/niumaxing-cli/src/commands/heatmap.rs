use chrono::Local;
use clap::Args;
use niumaxing_core::heatmap::{
    heatmap, summarize, HeatLevel, HeatmapSummary, HeatmapWeek, MAX_WEEKS,
};
use serde::Serialize;

use super::{open_session, print_json, CommandResult};

#[derive(Args)]
pub struct HeatmapArgs {
    /// Number of weeks to show (defaults to the configured value)
    #[arg(long)]
    weeks: Option<u32>,
    /// Print the grid as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct HeatmapReport {
    weeks: Vec<HeatmapWeek>,
    summary: HeatmapSummary,
}

pub fn run(args: HeatmapArgs) -> CommandResult {
    let (config, session) = open_session()?;
    let weeks = args.weeks.unwrap_or(config.heatmap.weeks);
    if !(1..=MAX_WEEKS).contains(&weeks) {
        return Err(format!("weeks must be between 1 and {MAX_WEEKS}").into());
    }

    let grid = heatmap(&session.user().history, Local::now().date_naive(), weeks);
    let summary = summarize(&grid);

    if args.json {
        return print_json(&HeatmapReport {
            weeks: grid,
            summary,
        });
    }

    for day in 0..7 {
        let row: String = grid.iter().map(|week| glyph(week.days[day].level)).collect();
        println!("{row}");
    }
    println!();
    println!(
        "{} active days, {} grass, streak {}",
        summary.active_days, summary.total, summary.current_streak
    );
    if let Some(best) = summary.best_day {
        println!("best day {best}");
    }
    Ok(())
}

const GLYPHS: [char; 5] = ['.', '░', '▒', '▓', '█'];

fn glyph(level: HeatLevel) -> char {
    GLYPHS[usize::from(level.as_u8())]
}
