use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gtd", about = concat!("gtd v", env!("CARGO_PKG_VERSION"), " - recurrence and hierarchy rules for GTD tasks"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Engine options file (default: ./gtd.toml if present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<String>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the next occurrences of a repeat pattern
    Next(NextArgs),
    /// Compute the hide-until date for a hide pattern
    Hide(HideArgs),
    /// Compute the alarm time for an alarm pattern
    Alarm(AlarmArgs),
    /// Classify a pattern string and print its canonical form
    Pattern(PatternArgs),
    /// Build a canonical pattern string from its parts
    Build(BuildCmd),
    /// Complete a task in a task file
    Complete(CompleteArgs),
    /// Add a task to a task file
    Add(AddArgs),
    /// Move a task under another parent in a task file
    Mv(MvArgs),
    /// Change a task's type in a task file
    Retype(RetypeArgs),
}

// ---------------------------------------------------------------------------
// Pattern evaluation args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct NextArgs {
    /// Repeat pattern, e.g. "Every 2 weeks" or "The last Fri every 1 months"
    pub pattern: String,
    /// Anchor date (YYYY-MM-DD, YYYY-MM-DD HH:MM)
    pub date: String,
    /// Number of occurrences to list (1-1000)
    #[arg(long, short = 'n', default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..=1000))]
    pub count: u16,
}

#[derive(Args)]
pub struct HideArgs {
    /// Hide pattern, e.g. "1 week before due"
    pub pattern: String,
    /// Due date
    #[arg(long)]
    pub due: Option<String>,
    /// Start date
    #[arg(long)]
    pub start: Option<String>,
}

#[derive(Args)]
pub struct AlarmArgs {
    /// Alarm pattern, e.g. "due" or "1.5 hours"
    pub pattern: String,
    /// Due date
    #[arg(long)]
    pub due: String,
}

#[derive(Args)]
pub struct PatternArgs {
    /// Pattern string to classify
    pub pattern: String,
}

// ---------------------------------------------------------------------------
// Builder args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct BuildCmd {
    #[command(subcommand)]
    pub action: BuildAction,
}

#[derive(Subcommand)]
pub enum BuildAction {
    /// Every <N> <unit>
    Every {
        num: u32,
        /// day, week, month or year
        unit: String,
    },
    /// Every <day>, <day>...
    Weekdays {
        /// Three-letter day names (Mon..Sun)
        #[arg(required = true)]
        days: Vec<String>,
    },
    /// The <ordinal> <day> every <N> months
    Nth {
        /// first, second, third, fourth, fifth or last
        ordinal: String,
        /// Three-letter day name
        weekday: String,
        /// Month interval
        #[arg(default_value_t = 1)]
        months: u32,
    },
    /// <N> <unit> before due|start
    Hide {
        num: u32,
        /// day, week or month
        unit: String,
        /// due or start
        #[arg(default_value = "due")]
        anchor: String,
    },
    /// <N> <unit> (before the due date)
    Alarm {
        amount: f64,
        /// minute, hour or day
        unit: String,
    },
}

// ---------------------------------------------------------------------------
// Task file args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct CompleteArgs {
    /// Task file (JSON array of tasks)
    pub file: String,
    /// Task ID
    pub id: u64,
    /// Completion time (default: now)
    #[arg(long)]
    pub at: Option<String>,
    /// Save the result back to the file
    #[arg(long, short = 'w')]
    pub write: bool,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task file (JSON array of tasks)
    pub file: String,
    /// Task title
    pub title: String,
    /// Parent task ID
    #[arg(long)]
    pub parent: Option<u64>,
    /// Task type (task, project, checklist, call, email, sms, return-call)
    #[arg(long = "type", default_value = "task")]
    pub task_type: String,
    /// Due date
    #[arg(long)]
    pub due: Option<String>,
    /// Repeat pattern
    #[arg(long)]
    pub repeat: Option<String>,
    /// Save the result back to the file
    #[arg(long, short = 'w')]
    pub write: bool,
}

#[derive(Args)]
pub struct MvArgs {
    /// Task file (JSON array of tasks)
    pub file: String,
    /// Task ID
    pub id: u64,
    /// New parent task ID
    #[arg(long, conflicts_with = "root", required_unless_present = "root")]
    pub parent: Option<u64>,
    /// Make it a top-level task
    #[arg(long)]
    pub root: bool,
    /// Save the result back to the file
    #[arg(long, short = 'w')]
    pub write: bool,
}

#[derive(Args)]
pub struct RetypeArgs {
    /// Task file (JSON array of tasks)
    pub file: String,
    /// Task ID
    pub id: u64,
    /// New type
    pub task_type: String,
    /// Save the result back to the file
    #[arg(long, short = 'w')]
    pub write: bool,
}
