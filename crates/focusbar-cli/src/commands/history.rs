use chrono::{Local, NaiveDate};
use clap::Args;
use focusbar_core::Database;

#[derive(Args)]
pub struct HistoryArgs {
    /// Day to list (YYYY-MM-DD), defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Print entries as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: HistoryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let entries = db.entries_for_date(date)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{date}: {} work interval(s)", entries.len());
    for (i, entry) in entries.iter().enumerate() {
        println!("  {:>2}. started {}", i + 1, entry.start_time);
    }
    Ok(())
}
