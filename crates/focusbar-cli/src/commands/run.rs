//! Interactive terminal host.
//!
//! A tokio runtime runs two producers, an interval ticker and a stdin line
//! reader, feeding one channel. The main thread is the only owner of the
//! session controller and drains that channel with `blocking_recv`. While the
//! completion prompt waits for an answer it reads from the same channel and
//! drops ticks.

use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::time::Duration;

use clap::Args;
use focusbar_core::storage::KeysConfig;
use focusbar_core::{
    CompletionPrompt, Config, Database, Event, IntervalKind, RestChoice, SessionController,
    SystemClock, TickOutcome, WorkChoice,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{Instant, MissedTickBehavior};

use crate::readout;

#[derive(Args)]
pub struct RunArgs {
    /// Interval to arm at startup: work, short-rest or long-rest
    #[arg(long)]
    start: Option<IntervalKind>,
    /// Print events as JSON lines instead of the progress bar
    #[arg(long)]
    json: bool,
}

#[derive(Debug)]
enum Input {
    /// Whole seconds elapsed since the previous tick.
    Tick(u64),
    Line(String),
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostCommand {
    Select(IntervalKind),
    Status,
    Quit,
}

struct Keymap {
    bindings: Vec<(String, HostCommand)>,
}

impl Keymap {
    fn new(keys: &KeysConfig) -> Self {
        Self {
            bindings: vec![
                (keys.work.clone(), HostCommand::Select(IntervalKind::Work)),
                (keys.short_rest.clone(), HostCommand::Select(IntervalKind::ShortRest)),
                (keys.long_rest.clone(), HostCommand::Select(IntervalKind::LongRest)),
                (keys.status.clone(), HostCommand::Status),
                (keys.quit.clone(), HostCommand::Quit),
            ],
        }
    }

    /// Keys are matched exactly, so `r` and `R` stay distinct.
    fn lookup(&self, line: &str) -> Option<HostCommand> {
        let token = line.trim();
        self.bindings
            .iter()
            .find(|(key, _)| key == token)
            .map(|(_, command)| *command)
    }

    fn help(&self) -> String {
        self.bindings
            .iter()
            .map(|(key, command)| match command {
                HostCommand::Select(kind) => format!("{key}={kind}"),
                HostCommand::Status => format!("{key}=status"),
                HostCommand::Quit => format!("{key}=quit"),
            })
            .collect::<Vec<_>>()
            .join("  ")
    }
}

/// Asks on stdout, answers come from stdin lines on the shared channel.
struct TerminalPrompt<'a> {
    rx: &'a mut UnboundedReceiver<Input>,
    closed: bool,
    dropped_secs: u64,
}

impl<'a> TerminalPrompt<'a> {
    fn new(rx: &'a mut UnboundedReceiver<Input>) -> Self {
        Self {
            rx,
            closed: false,
            dropped_secs: 0,
        }
    }

    /// `None` once stdin is gone.
    fn ask<T>(&mut self, question: &str, options: &[T]) -> Option<T>
    where
        T: Copy + FromStr + fmt::Display,
    {
        println!();
        println!("{question}");
        for (i, option) in options.iter().enumerate() {
            println!("  {}) {option}", i + 1);
        }

        loop {
            match self.rx.blocking_recv() {
                Some(Input::Tick(secs)) => self.dropped_secs += secs,
                Some(Input::Line(line)) => {
                    let answer = line.trim();
                    if let Ok(n) = answer.parse::<usize>() {
                        if (1..=options.len()).contains(&n) {
                            return Some(options[n - 1]);
                        }
                    }
                    if let Ok(choice) = answer.parse::<T>() {
                        return Some(choice);
                    }
                    println!("answer 1-{} or one of the names above", options.len());
                }
                Some(Input::Closed) | None => {
                    self.closed = true;
                    return None;
                }
            }
        }
    }
}

impl CompletionPrompt for TerminalPrompt<'_> {
    fn ask_work_completion(&mut self) -> WorkChoice {
        self.ask("Work interval finished. What next?", &WorkChoice::ALL)
            .unwrap_or_default()
    }

    fn ask_rest_completion(&mut self, finished: IntervalKind) -> RestChoice {
        let question = format!("{finished} finished. What next?");
        self.ask(&question, &RestChoice::ALL).unwrap_or_default()
    }
}

async fn tick_source(period: Duration, tx: UnboundedSender<Input>) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    interval.tick().await;

    let mut last = Instant::now();
    let mut carry = Duration::ZERO;
    loop {
        interval.tick().await;
        let now = Instant::now();
        carry += now.duration_since(last);
        last = now;

        // A late wakeup hands over all the seconds it owes in one tick.
        let whole = carry.as_secs();
        if whole == 0 {
            continue;
        }
        carry -= Duration::from_secs(whole);
        if tx.send(Input::Tick(whole)).is_err() {
            break;
        }
    }
}

async fn read_lines(tx: UnboundedSender<Input>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(Input::Line(line)).is_err() {
                    return;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed");
                break;
            }
        }
    }
    let _ = tx.send(Input::Closed);
}

struct Screen {
    json: bool,
}

impl Screen {
    fn events(&self, events: Vec<Event>) -> Result<(), serde_json::Error> {
        if self.json {
            for event in events {
                println!("{}", serde_json::to_string(&event)?);
            }
        }
        Ok(())
    }

    fn line(&self, controller: &SessionController<Database, SystemClock>) {
        if self.json {
            return;
        }
        print!(
            "\r{}",
            readout::format_line(
                controller.current_kind(),
                controller.progress_fraction(),
                controller.today_count(),
            )
        );
        let _ = std::io::stdout().flush();
    }
}

pub fn run(args: RunArgs, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let initial = args.start.unwrap_or(config.timer.initial_interval);
    let mut controller = SessionController::start(db, SystemClock, initial)?;
    let keymap = Keymap::new(&config.keys);
    let screen = Screen { json: args.json };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    runtime.spawn(tick_source(
        Duration::from_millis(config.timer.tick_interval_ms),
        tx.clone(),
    ));
    runtime.spawn(read_lines(tx));

    if !args.json {
        println!("{}", keymap.help());
    }
    screen.events(controller.drain_events())?;
    screen.line(&controller);

    while let Some(input) = rx.blocking_recv() {
        match input {
            Input::Tick(secs) => {
                let mut prompt = TerminalPrompt::new(&mut rx);
                let outcome = controller.on_tick(secs, &mut prompt);
                let (closed, dropped_secs) = (prompt.closed, prompt.dropped_secs);

                if let TickOutcome::Completed(transition) = &outcome {
                    if dropped_secs > 0 {
                        tracing::debug!(dropped_secs, "ticks dropped while prompting");
                    }
                    if let Some(warning) = transition.record.warning() {
                        eprintln!("\nwarning: work interval not logged: {warning}");
                    }
                }
                if closed {
                    break;
                }
            }
            Input::Line(line) => match keymap.lookup(&line) {
                Some(HostCommand::Select(kind)) => controller.select_interval(kind),
                Some(HostCommand::Status) => {
                    println!();
                    println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
                }
                Some(HostCommand::Quit) => break,
                None if line.trim().is_empty() => {}
                None => {
                    if let Err(e) = controller.select_interval_named(&line) {
                        eprintln!("\n{e}");
                    }
                }
            },
            Input::Closed => break,
        }

        screen.events(controller.drain_events())?;
        screen.line(&controller);
    }

    if !args.json {
        println!();
    }
    runtime.shutdown_background();
    Ok(())
}
