use chrono::{Local, NaiveDate};
use clap::Subcommand;
use focusbar_core::{Database, HistoryStore};
use serde::Serialize;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Work intervals logged today (or on --date)
    Today {
        /// Day to count instead of today (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Serialize)]
struct DayCount {
    date: NaiveDate,
    completed: u64,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        StatsAction::Today { date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let stats = DayCount {
                date,
                completed: db.count_for_date(date)?,
            };
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}
