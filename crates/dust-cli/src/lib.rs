//! Command line front end: resolves configuration, populates a guide worker
//! and renders its replies.

pub mod cli_args;
pub mod render;

use serde_json::{Value, json};
use tracing::info;

use dust_core::config::{GuideConfig, SourceLocation, load_config};
use dust_core::{
    CampId, Command as GuideCommand, DataManager, DatasetSource, DirectorySource, HttpSource,
    Reply, WorkerHandle, spawn,
};

pub use cli_args::{Cli, Command, GlobalArgs};

/// Run one invocation and return what should be printed.
pub async fn run(cli: Cli) -> Result<String, String> {
    let load = load_config(cli.global.config.as_deref());
    let mut warnings = load.warnings;
    let mut config = load.config;
    cli.global.apply(&mut config, &mut warnings);
    for warning in warnings {
        eprintln!("Warning: {warning}");
    }

    let command = cli.command.unwrap_or(Command::Summary);
    let json = cli.global.json;
    match config.source_location() {
        SourceLocation::Http(url) => {
            let source = HttpSource::new(url).map_err(|err| err.to_string())?;
            execute(source, &config, command, json).await
        }
        SourceLocation::Directory(dir) => {
            execute(DirectorySource::new(dir), &config, command, json).await
        }
    }
}

/// Populate a worker from `source` and answer `command`.
pub async fn execute<S: DatasetSource>(
    source: S,
    config: &GuideConfig,
    command: Command,
    json: bool,
) -> Result<String, String> {
    let dataset = config.dataset.name.clone();
    let (handle, _task) = spawn(DataManager::new(source, config.normalize_options()));

    let populated = handle
        .request(GuideCommand::Populate {
            dataset: dataset.clone(),
            hide_locations: config.dataset.hide_locations,
        })
        .await;
    let count = match populated {
        Reply::Count(count) => count,
        Reply::Failed { reason } | Reply::Rejected { reason } => {
            return Err(format!("Could not load dataset '{dataset}': {reason}"));
        }
        other => return Err(format!("Unexpected reply to populate: {other:?}")),
    };
    info!(%dataset, count, "Dataset ready");

    match command {
        Command::Summary => summary(&handle, &dataset, count, json).await,
        Command::Call { operation, args } => {
            let args = args.iter().map(|raw| parse_call_argument(raw)).collect();
            let value = handle.call(&operation, args).await;
            to_pretty_json(&value)
        }
        other => {
            let Some(request) = guide_command(&other) else {
                return Err(format!("Nothing to run for {other:?}"));
            };
            let reply = handle.request(request).await;
            match reply {
                Reply::Failed { reason } | Reply::Rejected { reason } => Err(reason),
                reply if json => to_pretty_json(&reply),
                reply => Ok(render::render_reply(&reply)),
            }
        }
    }
}

/// The engine request behind a listing subcommand.
pub fn guide_command(command: &Command) -> Option<GuideCommand> {
    let request = match command {
        Command::Events {
            query,
            day,
            category,
        } => GuideCommand::FindEvents {
            query: query.clone(),
            day: *day,
            category: category.clone(),
        },
        Command::Camps { query } => GuideCommand::FindCamps {
            query: query.clone(),
        },
        Command::CampEvents { id } => GuideCommand::GetCampEvents {
            camp: CampId::from(id.as_str()),
        },
        Command::Art { query } => GuideCommand::FindArts {
            query: query.clone(),
        },
        Command::Days => GuideCommand::GetDays,
        Command::Categories => GuideCommand::GetCategories,
        Command::Summary | Command::Call { .. } => return None,
    };
    Some(request)
}

/// JSON when it parses, otherwise the raw text as a string.
pub fn parse_call_argument(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

async fn summary(
    handle: &WorkerHandle,
    dataset: &str,
    count: usize,
    json: bool,
) -> Result<String, String> {
    let days = match handle.request(GuideCommand::GetDays).await {
        Reply::Days(days) => days,
        other => return Err(format!("Unexpected reply to getDays: {other:?}")),
    };
    let categories = match handle.request(GuideCommand::GetCategories).await {
        Reply::Categories(categories) => categories,
        other => return Err(format!("Unexpected reply to getCategories: {other:?}")),
    };

    if json {
        return to_pretty_json(&json!({
            "dataset": dataset,
            "count": count,
            "days": days,
            "categories": categories,
        }));
    }

    let day_list: Vec<String> = days
        .iter()
        .map(|day| format!("{} {}", day.name, day.day_of_month))
        .collect();
    Ok(format!(
        "Dataset {dataset}: {count} events and camps\nDays: {}\nCategories: {}\n",
        day_list.join(", "),
        categories.join(", ")
    ))
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value)
        .map(|text| text + "\n")
        .map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn listing_commands_map_to_requests() {
        let command = Command::Events {
            query: "tea".to_string(),
            day: NaiveDate::from_ymd_opt(2024, 8, 26),
            category: String::new(),
        };
        assert_eq!(
            guide_command(&command),
            Some(GuideCommand::FindEvents {
                query: "tea".to_string(),
                day: NaiveDate::from_ymd_opt(2024, 8, 26),
                category: String::new(),
            })
        );
        assert_eq!(
            guide_command(&Command::CampEvents {
                id: "c7".to_string()
            }),
            Some(GuideCommand::GetCampEvents {
                camp: CampId::from("c7")
            })
        );
        assert_eq!(guide_command(&Command::Summary), None);
    }

    #[test]
    fn call_arguments_fall_back_to_strings() {
        assert_eq!(parse_call_argument("42"), json!(42));
        assert_eq!(parse_call_argument("[\"e1\"]"), json!(["e1"]));
        assert_eq!(parse_call_argument("null"), Value::Null);
        assert_eq!(parse_call_argument("tea"), json!("tea"));
    }
}
