//! Operation-name + argument-list entry point to the engine.
//!
//! The set of operations is closed: every call is parsed into a [`Command`]
//! before it reaches the engine, and every outcome, including failures, comes
//! back as a [`Reply`] value so nothing faults across a message boundary.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::engine::{Engine, EventView};
use crate::error::{GuideError, Result};
use crate::loader::{DatasetSource, load_dataset, load_points};
use crate::model::{
    Art, ArtId, Camp, CampId, Day, Event, EventId, Pin, RawDataset,
};
use crate::normalize::NormalizeOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", content = "arguments", rename_all = "camelCase")]
pub enum Command {
    Populate {
        dataset: String,
        hide_locations: bool,
    },
    SetDataset {
        dataset: String,
        data: RawDataset,
        hide_locations: bool,
    },
    GetDays,
    GetPoints,
    GetCategories,
    GetEvents {
        offset: usize,
        count: usize,
    },
    GetCamps {
        offset: usize,
        count: usize,
    },
    GetEventList {
        ids: Vec<EventId>,
    },
    GetCampList {
        ids: Vec<CampId>,
    },
    GetArtList {
        ids: Vec<ArtId>,
    },
    FindEvent {
        id: EventId,
    },
    FindCamp {
        id: CampId,
    },
    FindArt {
        id: ArtId,
    },
    FindEvents {
        query: String,
        day: Option<NaiveDate>,
        category: String,
    },
    FindCamps {
        query: String,
    },
    FindArts {
        query: Option<String>,
    },
    GetCampEvents {
        camp: CampId,
    },
    CheckEvents {
        now: Option<DateTime<Utc>>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Reply {
    Count(usize),
    Flag(bool),
    Events(Vec<EventView>),
    Event(Option<EventView>),
    Camps(Vec<Camp>),
    Camp(Option<Camp>),
    Art(Vec<Art>),
    ArtPiece(Option<Art>),
    Days(Vec<Day>),
    Categories(Vec<String>),
    Points(Vec<Pin>),
    Unsupported { operation: String },
    Rejected { reason: String },
    Failed { reason: String },
}

struct Arguments<'a> {
    operation: &'a str,
    values: Vec<Value>,
}

impl<'a> Arguments<'a> {
    fn present(&self, index: usize) -> Option<&Value> {
        self.values.get(index).filter(|value| !value.is_null())
    }

    fn decode<T: DeserializeOwned>(&self, value: &Value, name: &str) -> Result<T> {
        serde_json::from_value(value.clone())
            .map_err(|err| GuideError::invalid_argument(self.operation, format!("{name}: {err}")))
    }

    fn required<T: DeserializeOwned>(&self, index: usize, name: &str) -> Result<T> {
        let value = self.present(index).ok_or_else(|| {
            GuideError::invalid_argument(self.operation, format!("missing argument '{name}'"))
        })?;
        self.decode(value, name)
    }

    fn optional<T: DeserializeOwned>(&self, index: usize, name: &str) -> Result<Option<T>> {
        self.present(index)
            .map(|value| self.decode(value, name))
            .transpose()
    }

    /// A calendar day given either as `YYYY-MM-DD` or as an RFC 3339 instant,
    /// in which case the date as written is used.
    fn day(&self, index: usize) -> Result<Option<NaiveDate>> {
        let Some(value) = self.present(index) else {
            return Ok(None);
        };
        let text = value.as_str().ok_or_else(|| {
            GuideError::invalid_argument(self.operation, format!("day must be a string, got {value}"))
        })?;
        if text.is_empty() {
            return Ok(None);
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Ok(Some(date));
        }
        DateTime::parse_from_rfc3339(text)
            .map(|instant| Some(instant.date_naive()))
            .map_err(|_| GuideError::invalid_argument(self.operation, format!("'{text}' is not a date")))
    }
}

impl Command {
    /// Parse the positional form used across a message boundary, e.g.
    /// `("findEvents", ["tea", "2024-08-26", ""])`.
    pub fn from_call(operation: &str, values: Vec<Value>) -> Result<Self> {
        let args = Arguments { operation, values };
        let command = match operation {
            "populate" => Command::Populate {
                dataset: args.required(0, "dataset")?,
                hide_locations: args.optional(1, "hideLocations")?.unwrap_or(false),
            },
            "setDataset" => {
                let events: Vec<Event> = args.optional(1, "events")?.unwrap_or_default();
                let camps: Vec<Camp> = args.optional(2, "camps")?.unwrap_or_default();
                let art: Vec<Art> = args.optional(3, "art")?.unwrap_or_default();
                Command::SetDataset {
                    dataset: args.required(0, "dataset")?,
                    data: RawDataset { events, camps, art },
                    hide_locations: args.optional(4, "hideLocations")?.unwrap_or(false),
                }
            }
            "getDays" => Command::GetDays,
            "getPotties" | "getPoints" => Command::GetPoints,
            "getCategories" => Command::GetCategories,
            "getEvents" => Command::GetEvents {
                offset: args.required(0, "offset")?,
                count: args.required(1, "count")?,
            },
            "getCamps" => Command::GetCamps {
                offset: args.required(0, "offset")?,
                count: args.required(1, "count")?,
            },
            "getEventList" => Command::GetEventList {
                ids: args.required(0, "ids")?,
            },
            "getCampList" => Command::GetCampList {
                ids: args.required(0, "ids")?,
            },
            "getArtList" => Command::GetArtList {
                ids: args.required(0, "ids")?,
            },
            "findEvent" => Command::FindEvent {
                id: args.required(0, "id")?,
            },
            "findCamp" => Command::FindCamp {
                id: args.required(0, "id")?,
            },
            "findArt" => Command::FindArt {
                id: args.required(0, "id")?,
            },
            "findEvents" => Command::FindEvents {
                query: args.optional(0, "query")?.unwrap_or_default(),
                day: args.day(1)?,
                category: args.optional(2, "category")?.unwrap_or_default(),
            },
            "findCamps" => Command::FindCamps {
                query: args.optional(0, "query")?.unwrap_or_default(),
            },
            "findArts" => Command::FindArts {
                query: args.optional(0, "query")?,
            },
            "getCampEvents" => Command::GetCampEvents {
                camp: args.required(0, "campId")?,
            },
            "checkEvents" => Command::CheckEvents {
                now: args.optional(0, "now")?,
            },
            other => return Err(GuideError::UnknownOperation(other.to_string())),
        };
        Ok(command)
    }
}

/// Owns the engine and the source it is populated from.
pub struct DataManager<S> {
    source: S,
    engine: Engine,
    dataset: String,
    options: NormalizeOptions,
    clock: fn() -> DateTime<Utc>,
}

impl<S: DatasetSource> DataManager<S> {
    pub fn new(source: S, options: NormalizeOptions) -> Self {
        Self {
            source,
            engine: Engine::new(options),
            dataset: String::new(),
            options,
            clock: Utc::now,
        }
    }

    /// Replace the wall clock used to evaluate populations.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Fetch and normalize `dataset`. Fetch and parse errors are returned
    /// untouched and leave the previous population in place.
    pub async fn populate(&mut self, dataset: &str, hide_locations: bool) -> Result<usize> {
        let raw = load_dataset(&self.source, dataset).await?;
        self.set_dataset(dataset, raw, hide_locations)
    }

    /// Normalize already loaded collections as `dataset`.
    pub fn set_dataset(
        &mut self,
        dataset: &str,
        raw: RawDataset,
        hide_locations: bool,
    ) -> Result<usize> {
        let options = NormalizeOptions {
            hide_locations,
            ..self.options
        };
        let count = self.engine.populate(raw, options, (self.clock)())?;
        self.dataset = dataset.to_string();
        info!(dataset, count, "Dataset populated");
        Ok(count)
    }

    pub async fn points(&self) -> Result<Vec<Pin>> {
        load_points(&self.source, &self.dataset).await
    }

    pub async fn handle(&mut self, command: Command) -> Reply {
        match command {
            Command::Populate {
                dataset,
                hide_locations,
            } => failed_or(self.populate(&dataset, hide_locations).await, Reply::Count),
            Command::SetDataset {
                dataset,
                data,
                hide_locations,
            } => failed_or(self.set_dataset(&dataset, data, hide_locations), Reply::Count),
            Command::GetDays => Reply::Days(self.engine.days()),
            Command::GetPoints => failed_or(self.points().await, Reply::Points),
            Command::GetCategories => Reply::Categories(self.engine.categories().to_vec()),
            Command::GetEvents { offset, count } => {
                Reply::Events(self.engine.events_page(offset, count))
            }
            Command::GetCamps { offset, count } => Reply::Camps(self.engine.camps_page(offset, count)),
            Command::GetEventList { ids } => Reply::Events(self.engine.event_list(&ids)),
            Command::GetCampList { ids } => Reply::Camps(self.engine.camp_list(&ids)),
            Command::GetArtList { ids } => Reply::Art(self.engine.art_list(&ids)),
            Command::FindEvent { id } => Reply::Event(self.engine.find_event(&id)),
            Command::FindCamp { id } => Reply::Camp(self.engine.find_camp(&id)),
            Command::FindArt { id } => Reply::ArtPiece(self.engine.find_art(&id)),
            Command::FindEvents {
                query,
                day,
                category,
            } => Reply::Events(self.engine.find_events(&query, day, &category)),
            Command::FindCamps { query } => Reply::Camps(self.engine.find_camps(&query)),
            Command::FindArts { query } => Reply::Art(self.engine.find_arts(query.as_deref())),
            Command::GetCampEvents { camp } => Reply::Events(self.engine.camp_events(&camp)),
            Command::CheckEvents { now } => {
                let now = now.unwrap_or_else(self.clock);
                Reply::Flag(self.engine.check_events(now))
            }
        }
    }

    /// Parse and run a positional call. Unknown operations and bad arguments
    /// are logged and answered, never raised.
    pub async fn call(&mut self, operation: &str, args: Vec<Value>) -> Reply {
        match Command::from_call(operation, args) {
            Ok(command) => self.handle(command).await,
            Err(GuideError::UnknownOperation(operation)) => {
                warn!(%operation, "Unknown operation");
                Reply::Unsupported { operation }
            }
            Err(err) => {
                warn!(%operation, error = %err, "Rejected call");
                Reply::Rejected {
                    reason: err.to_string(),
                }
            }
        }
    }
}

fn failed_or<T>(result: Result<T>, wrap: fn(T) -> Reply) -> Reply {
    match result {
        Ok(value) => wrap(value),
        Err(err) => {
            warn!(error = %err, "Operation failed");
            Reply::Failed {
                reason: err.to_string(),
            }
        }
    }
}
