//! `recur` CLI — classify, describe, build and project recurrence rules from the
//! command line.
//!
//! ## Usage
//!
//! ```sh
//! # Which picker would show this rule?
//! recur classify "FREQ=MONTHLY;BYDAY=TU;BYSETPOS=2"
//!
//! # Human-readable description (or JSON with --json)
//! recur describe "FREQ=YEARLY;BYMONTH=1,3;BYMONTHDAY=15,20"
//!
//! # Build a rule the way the pickers do
//! recur build weekly --days MO,WE
//! recur build yearly --dates 2024-03-15,2024-03-20
//! recur build interval --freq monthly --interval 2 --weekdays TU --occurrences 2
//!
//! # Next occurrence(s)
//! recur next "FREQ=WEEKLY;BYDAY=MO" --from 2024-01-15
//! recur next "FREQ=DAILY" --count 5
//!
//! # Quick-entry text
//! recur parse "every other week at 5pm"
//! ```
//!
//! Diagnostics go to stderr through `tracing`; set `RUST_LOG=debug` for more.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use recurrence_engine::descriptor::weekday_from_code;
use recurrence_engine::oracle::{today_in, upcoming};
use recurrence_engine::{
    build_daily, build_interval, build_monthly, build_weekly, build_yearly, classify, describe,
    parse_schedule, Frequency, IntervalConfig, MonthDaySet, NextOccurrence, PatternType,
    RRuleOracle, RecurrenceDescriptor, WeekdaySet,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recur", version, about = "Recurrence rule toolkit for task scheduling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// IANA timezone used to resolve "today"
    #[arg(long, global = true, env = "RECUR_TIMEZONE", default_value = "UTC")]
    timezone: String,

    /// Override today's date (YYYY-MM-DD)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the pattern kind of an RRULE (daily, weekly, monthly, yearly, interval)
    Classify {
        /// RRULE text, with or without the "RRULE:" prefix
        rule: String,
    },
    /// Describe an RRULE in plain English
    Describe {
        rule: String,
        /// Print rule, kind and description as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build an RRULE from picker selections
    Build {
        #[command(subcommand)]
        pattern: BuildCommand,
    },
    /// Print the next occurrence date(s) of an RRULE
    Next {
        rule: String,
        /// Reference date (defaults to today)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Number of upcoming dates to list, starting on the reference date
        #[arg(long)]
        count: Option<u16>,
        /// Allow the reference date itself (first-time attachment)
        #[arg(long)]
        initial: bool,
    },
    /// Extract date, time and recurrence from quick-entry text (JSON output)
    Parse { text: String },
}

#[derive(Subcommand)]
enum BuildCommand {
    /// Every N days
    Daily {
        #[arg(long, default_value_t = 1)]
        interval: u32,
    },
    /// Weekly on the given weekday codes (same weekday as the due date when omitted)
    Weekly {
        /// Comma-separated codes, e.g. MO,WE
        #[arg(long, value_delimiter = ',')]
        days: Vec<String>,
    },
    /// Monthly on the given day numbers (-1 = last day)
    Monthly {
        /// Comma-separated days, e.g. 1,15,-1
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        days: Vec<i8>,
    },
    /// Yearly on the selected dates (only the first is kept across months)
    Yearly {
        /// Comma-separated dates, e.g. 2024-03-15,2024-03-20
        #[arg(long, value_delimiter = ',')]
        dates: Vec<NaiveDate>,
    },
    /// Custom interval rule
    Interval {
        #[arg(long, value_enum, default_value_t = FrequencyArg::Weekly)]
        freq: FrequencyArg,
        #[arg(long, default_value_t = 1)]
        interval: u32,
        #[arg(long, value_enum, default_value_t = PatternArg::Weekday)]
        pattern: PatternArg,
        /// Comma-separated weekday codes
        #[arg(long, value_delimiter = ',')]
        weekdays: Vec<String>,
        /// Comma-separated set positions (weekday pattern) or day numbers (day pattern)
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        occurrences: Vec<i8>,
        /// Comma-separated months (yearly only)
        #[arg(long, value_delimiter = ',')]
        months: Vec<u8>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FrequencyArg {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl From<FrequencyArg> for Frequency {
    fn from(arg: FrequencyArg) -> Self {
        match arg {
            FrequencyArg::Daily => Frequency::Daily,
            FrequencyArg::Weekly => Frequency::Weekly,
            FrequencyArg::Monthly => Frequency::Monthly,
            FrequencyArg::Yearly => Frequency::Yearly,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PatternArg {
    Day,
    Weekday,
}

impl From<PatternArg> for PatternType {
    fn from(arg: PatternArg) -> Self {
        match arg {
            PatternArg::Day => PatternType::Day,
            PatternArg::Weekday => PatternType::Weekday,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Classify { rule } => {
            let d = parse_rule(&rule)?;
            println!("{}", classify(&d));
        }
        Commands::Describe { rule, json } => {
            let d = parse_rule(&rule)?;
            if json {
                let value = serde_json::json!({
                    "rule": d.to_string(),
                    "kind": classify(&d),
                    "description": describe(&d),
                    "descriptor": d,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{}", describe(&d));
            }
        }
        Commands::Build { pattern } => {
            let d = build(pattern)?;
            println!("{}", d);
        }
        Commands::Next {
            rule,
            from,
            count,
            initial,
        } => {
            let from = match from {
                Some(date) => date,
                None => resolve_today(cli.today, &cli.timezone)?,
            };
            match count {
                Some(count) => {
                    let dates = upcoming(&rule, from, count)
                        .with_context(|| format!("Failed to expand rule: {}", rule))?;
                    for date in dates {
                        println!("{}", date);
                    }
                }
                None => {
                    let next = RRuleOracle
                        .next_due_date(&rule, from, initial)
                        .with_context(|| format!("Failed to compute next occurrence: {}", rule))?;
                    match next {
                        Some(date) => println!("{}", date),
                        None => println!("none"),
                    }
                }
            }
        }
        Commands::Parse { text } => {
            let today = resolve_today(cli.today, &cli.timezone)?;
            let parsed = parse_schedule(&text, today);
            let value = serde_json::json!({
                "applicable": parsed.is_applicable(),
                "date": parsed.date,
                "time": parsed.time,
                "recurring": parsed.recurring.as_ref().map(|d| d.to_string()),
                "description": parsed.recurring.as_ref().map(describe),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}

/// Log to stderr so stdout stays machine-readable. `RUST_LOG` overrides the
/// default `warn` level.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn resolve_today(today: Option<NaiveDate>, timezone: &str) -> Result<NaiveDate> {
    let today = match today {
        Some(date) => date,
        None => today_in(timezone).with_context(|| format!("Failed to resolve today in {}", timezone))?,
    };
    debug!(%today, timezone, "resolved today");
    Ok(today)
}

fn parse_rule(rule: &str) -> Result<RecurrenceDescriptor> {
    rule.parse()
        .with_context(|| format!("Failed to parse rule: {}", rule))
}

fn weekdays(codes: &[String]) -> Result<WeekdaySet> {
    codes
        .iter()
        .map(|code| {
            weekday_from_code(code.trim())
                .with_context(|| format!("Unknown weekday code: '{}'. Use SU, MO, TU, WE, TH, FR or SA", code))
        })
        .collect()
}

fn build(pattern: BuildCommand) -> Result<RecurrenceDescriptor> {
    let d = match pattern {
        BuildCommand::Daily { interval } => build_daily(interval),
        BuildCommand::Weekly { days } => build_weekly(&weekdays(&days)?),
        BuildCommand::Monthly { days } => {
            let mut selected = MonthDaySet::new();
            for day in days {
                selected.toggle(day).context("Invalid month day")?;
            }
            build_monthly(&selected)
        }
        BuildCommand::Yearly { dates } => build_yearly(&dates).descriptor,
        BuildCommand::Interval {
            freq,
            interval,
            pattern,
            weekdays: codes,
            occurrences,
            months,
        } => {
            let mut config = IntervalConfig::new();
            config.set_frequency(freq.into());
            config.set_interval(interval);
            if !config.set_pattern_type(pattern.into()) {
                anyhow::bail!("The day pattern is not available for weekly rules");
            }
            for day in weekdays(&codes)?.as_slice() {
                config.toggle_weekday(*day);
            }
            for value in occurrences {
                config
                    .toggle_occurrence(value)
                    .context("Invalid occurrence")?;
            }
            for month in months {
                config.toggle_month(month).context("Invalid month")?;
            }
            build_interval(&config).context("Failed to build interval rule")?
        }
    };
    Ok(d)
}
