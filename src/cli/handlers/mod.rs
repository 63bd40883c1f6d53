use std::path::Path;

use chrono::{Local, NaiveDateTime};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io::load_config_or_default;
use crate::io::task_file::{load_tasks, save_tasks};
use crate::model::config::EngineConfig;
use crate::model::task::{Task, TaskId, TaskType};
use crate::model::tree::TaskTree;
use crate::ops::complete::{Completion, complete};
use crate::ops::dates::advance;
use crate::ops::derive::{Derivation, update_alarm, update_hide};
use crate::ops::hierarchy::{change_parent, change_type, create_task};
use crate::parse::{
    AlarmPattern, AlarmUnit, HideAnchor, HidePattern, HideUnit, Ordinal, PatternError,
    PeriodUnit, RepeatPattern, parse_datetime, parse_day3,
};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let config_path = cli.config.as_deref().map(Path::new);

    match cli.command {
        // Pattern evaluation (no task file)
        Commands::Next(args) => cmd_next(args, json),
        Commands::Hide(args) => cmd_hide(args, json),
        Commands::Alarm(args) => cmd_alarm(args, json),
        Commands::Pattern(args) => cmd_pattern(args, json),
        Commands::Build(cmd) => cmd_build(cmd.action, json),

        // Task file operations
        Commands::Complete(args) => {
            let config = load_config_or_default(config_path)?;
            cmd_complete(args, &config, json)
        }
        Commands::Add(args) => {
            let config = load_config_or_default(config_path)?;
            cmd_add(args, &config, json)
        }
        Commands::Mv(args) => cmd_mv(args, json),
        Commands::Retype(args) => cmd_retype(args, json),
    }
}

// ---------------------------------------------------------------------------
// Pattern evaluation
// ---------------------------------------------------------------------------

fn cmd_next(args: NextArgs, json: bool) -> CmdResult {
    let pattern = RepeatPattern::parse(&args.pattern)?;
    if !pattern.is_date_rule() {
        return Err(format!("'{}' does not describe dates on its own", pattern).into());
    }
    let anchor = parse_datetime(&args.date)?;

    let mut occurrences = Vec::new();
    let mut current = anchor;
    for _ in 0..args.count {
        current = advance(current, &pattern)?;
        occurrences.push(current);
    }

    if json {
        let output = OccurrencesJson {
            pattern: pattern.to_string(),
            anchor,
            occurrences,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for date in occurrences {
            println!("{}", format_datetime(date));
        }
    }
    Ok(())
}

fn cmd_hide(args: HideArgs, json: bool) -> CmdResult {
    let mut task = Task::new("");
    task.due_date = parse_optional_date(args.due.as_deref())?;
    task.start_date = parse_optional_date(args.start.as_deref())?;
    task.hide_pattern = Some(args.pattern.clone());

    let status = update_hide(&mut task)?;
    print_derived(&args.pattern, status, task.hide_until, json)
}

fn cmd_alarm(args: AlarmArgs, json: bool) -> CmdResult {
    let mut task = Task::new("");
    task.due_date = Some(parse_datetime(&args.due)?);
    task.alarm_pattern = Some(args.pattern.clone());

    let status = update_alarm(&mut task)?;
    print_derived(&args.pattern, status, task.alarm, json)
}

fn print_derived(
    pattern: &str,
    status: Derivation,
    value: Option<NaiveDateTime>,
    json: bool,
) -> CmdResult {
    if json {
        let output = DerivedJson {
            pattern: pattern.to_string(),
            status: derivation_label(status),
            value,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        match value {
            Some(value) => println!("{}", format_datetime(value)),
            None => println!("({})", derivation_label(status)),
        }
    }
    Ok(())
}

fn cmd_pattern(args: PatternArgs, json: bool) -> CmdResult {
    let mut matches = Vec::new();
    let mut errors = Vec::new();

    match RepeatPattern::parse(&args.pattern) {
        Ok(p) => matches.push(PatternKindJson {
            kind: "repeat",
            canonical: p.to_string(),
        }),
        Err(e) => errors.push(e),
    }
    match HidePattern::parse(&args.pattern) {
        Ok(p) => matches.push(PatternKindJson {
            kind: "hide",
            canonical: p.to_string(),
        }),
        Err(e) => errors.push(e),
    }
    match AlarmPattern::parse(&args.pattern) {
        Ok(p) => matches.push(PatternKindJson {
            kind: "alarm",
            canonical: p.to_string(),
        }),
        Err(e) => errors.push(e),
    }

    if matches.is_empty() {
        // A number problem says more than "unrecognized"
        let err = errors
            .iter()
            .find(|e| !matches!(e, PatternError::Unknown(_)))
            .or(errors.first())
            .cloned()
            .unwrap_or_else(|| PatternError::Unknown(args.pattern.clone()));
        return Err(err.into());
    }

    if json {
        let output = PatternJson {
            input: args.pattern,
            matches,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for m in matches {
            println!("{}: {}", m.kind, m.canonical);
        }
    }
    Ok(())
}

fn cmd_build(action: BuildAction, json: bool) -> CmdResult {
    // Built strings go back through their parser to reject out-of-range counts
    let pattern = match action {
        BuildAction::Every { num, unit } => {
            let unit = PeriodUnit::from_label(&unit)
                .ok_or_else(|| format!("unknown unit '{}' (expected day, week, month or year)", unit))?;
            RepeatPattern::parse(&RepeatPattern::every(num, unit).to_string())?.to_string()
        }
        BuildAction::Weekdays { days } => {
            let days = days
                .iter()
                .map(|d| parse_day3(d).ok_or_else(|| format!("unknown day '{}' (expected Mon..Sun)", d)))
                .collect::<Result<Vec<_>, _>>()?;
            RepeatPattern::every_weekdays(days).to_string()
        }
        BuildAction::Nth {
            ordinal,
            weekday,
            months,
        } => {
            let ordinal = Ordinal::from_label(&ordinal)
                .ok_or_else(|| format!("unknown ordinal '{}' (expected first..fifth or last)", ordinal))?;
            let weekday = parse_day3(&weekday)
                .ok_or_else(|| format!("unknown day '{}' (expected Mon..Sun)", weekday))?;
            let built = RepeatPattern::nth_weekday(ordinal, weekday, months);
            RepeatPattern::parse(&built.to_string())?.to_string()
        }
        BuildAction::Hide { num, unit, anchor } => {
            let unit = HideUnit::from_label(&unit)
                .ok_or_else(|| format!("unknown unit '{}' (expected day, week or month)", unit))?;
            let anchor = HideAnchor::from_label(&anchor)
                .ok_or_else(|| format!("unknown anchor '{}' (expected due or start)", anchor))?;
            HidePattern::parse(&HidePattern::before(num, unit, anchor).to_string())?.to_string()
        }
        BuildAction::Alarm { amount, unit } => {
            let unit = AlarmUnit::from_label(&unit)
                .ok_or_else(|| format!("unknown unit '{}' (expected minute, hour or day)", unit))?;
            AlarmPattern::parse(&AlarmPattern::before(amount, unit).to_string())?.to_string()
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&BuiltJson { pattern })?);
    } else {
        println!("{}", pattern);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Task file operations
// ---------------------------------------------------------------------------

fn cmd_complete(args: CompleteArgs, config: &EngineConfig, json: bool) -> CmdResult {
    let path = Path::new(&args.file);
    let mut tree = load_tasks(path)?;
    let at = match args.at.as_deref() {
        Some(at) => parse_datetime(at)?,
        None => Local::now().naive_local(),
    };

    let id = TaskId(args.id);
    let outcome = complete(&mut tree, id, at, config)?;
    let new_task = match outcome {
        Completion::Recurred(next) => Some(next),
        _ => None,
    };
    finish(path, &tree, describe_completion(id, &outcome), new_task, args.write, json)
}

fn cmd_add(args: AddArgs, config: &EngineConfig, json: bool) -> CmdResult {
    let path = Path::new(&args.file);
    let mut tree = load_tasks(path)?;

    let task_type = parse_task_type(&args.task_type)?;
    let mut task = Task::new(args.title).with_type(task_type);
    task.due_date = parse_optional_date(args.due.as_deref())?;
    task.repeat_pattern = args.repeat;

    let id = create_task(&mut tree, task, args.parent.map(TaskId), config)?;
    finish(path, &tree, format!("added #{}", id), Some(id), args.write, json)
}

fn cmd_mv(args: MvArgs, json: bool) -> CmdResult {
    let path = Path::new(&args.file);
    let mut tree = load_tasks(path)?;

    let id = TaskId(args.id);
    let parent = if args.root { None } else { args.parent.map(TaskId) };
    change_parent(&mut tree, id, parent)?;
    let summary = match parent {
        Some(parent) => format!("moved #{} under #{}", id, parent),
        None => format!("moved #{} to top level", id),
    };
    finish(path, &tree, summary, None, args.write, json)
}

fn cmd_retype(args: RetypeArgs, json: bool) -> CmdResult {
    let path = Path::new(&args.file);
    let mut tree = load_tasks(path)?;

    let id = TaskId(args.id);
    let task_type = parse_task_type(&args.task_type)?;
    change_type(&mut tree, id, task_type)?;
    let actual = tree.task(id)?.task_type;
    let summary = if actual == task_type {
        format!("#{} is now a {}", id, actual)
    } else {
        format!("#{} stays a {} under its parent", id, actual)
    };
    finish(path, &tree, summary, None, args.write, json)
}

/// Print what changed and optionally save the tree back.
fn finish(
    path: &Path,
    tree: &TaskTree,
    summary: String,
    new_task: Option<TaskId>,
    write: bool,
    json: bool,
) -> CmdResult {
    if write {
        save_tasks(path, tree)?;
    }
    let changed: Vec<&Task> = tree
        .dirty_ids()
        .into_iter()
        .filter_map(|id| tree.get(id))
        .collect();

    if json {
        let output = ChangeJson {
            summary,
            new_task,
            saved: write,
            changed,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", summary);
        for task in changed {
            println!("  {}", format_task_line(task));
        }
        if !write {
            println!("(not saved; pass --write to update {})", path.display());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_optional_date(s: Option<&str>) -> Result<Option<NaiveDateTime>, Box<dyn std::error::Error>> {
    Ok(s.map(parse_datetime).transpose()?)
}

fn parse_task_type(s: &str) -> Result<TaskType, String> {
    TaskType::from_label(s).ok_or_else(|| {
        format!(
            "unknown task type '{}' (expected task, project, checklist, checklist_item, call, email, sms or return_call)",
            s
        )
    })
}
