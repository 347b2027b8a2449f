use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use dust_core::config::GuideConfig;

/// Browse a festival guide dataset from the terminal.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// What to show; defaults to `summary`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand, PartialEq)]
pub enum Command {
    /// Counts, days and categories of the dataset.
    Summary,
    /// Search events.
    Events {
        /// Case-insensitive text found in the title or description.
        #[arg(short, long, default_value = "")]
        query: String,
        /// Only events live on this day (YYYY-MM-DD).
        #[arg(short, long, value_name = "DATE")]
        day: Option<NaiveDate>,
        /// Exact category label.
        #[arg(short, long, default_value = "")]
        category: String,
    },
    /// Search camps by name or location.
    Camps {
        #[arg(short, long, default_value = "")]
        query: String,
    },
    /// Events hosted by one camp.
    CampEvents {
        #[arg(value_name = "CAMP_ID")]
        id: String,
    },
    /// Search art by name.
    Art {
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Days with at least one event.
    Days,
    /// Event categories.
    Categories,
    /// Run a raw operation, e.g. `call findEvents '"tea"' null '""'`.
    Call {
        operation: String,
        /// Positional arguments as JSON; anything that is not JSON is sent as a string.
        #[arg(value_name = "ARG_JSON")]
        args: Vec<String>,
    },
}

#[derive(Debug, Clone, Args, Default)]
pub struct GlobalArgs {
    /// Configuration file (defaults to the platform config directory).
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Dataset name, e.g. `ttitd-2024`.
    #[arg(long, global = true)]
    pub dataset: Option<String>,

    /// Fetch documents below this URL.
    #[arg(long, global = true, conflicts_with = "data_dir", value_hint = ValueHint::Url)]
    pub base_url: Option<String>,

    /// Read documents from this directory.
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub data_dir: Option<String>,

    /// Hide camp and art locations.
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub hide_locations: bool,

    /// IANA time zone used for days and local times.
    #[arg(long, global = true, value_name = "ZONE")]
    pub time_zone: Option<String>,

    /// Print replies as JSON.
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub json: bool,
}

impl GlobalArgs {
    /// Layer the command line on top of the loaded configuration.
    pub fn apply(&self, config: &mut GuideConfig, warnings: &mut Vec<String>) {
        if let Some(dataset) = &self.dataset {
            config.dataset.name = dataset.clone();
        }
        if let Some(url) = &self.base_url {
            config.source.base_url = Some(url.clone());
            config.source.data_dir = None;
        }
        if let Some(dir) = &self.data_dir {
            config.source.data_dir = Some(dir.clone());
        }
        if self.hide_locations {
            config.dataset.hide_locations = true;
        }
        if let Some(zone) = &self.time_zone {
            if zone.parse::<chrono_tz::Tz>().is_ok() {
                config.dataset.time_zone = zone.clone();
            } else {
                warnings.push(format!(
                    "Unknown time zone '{zone}'. Keeping {}.",
                    config.dataset.time_zone
                ));
            }
        }
    }
}
