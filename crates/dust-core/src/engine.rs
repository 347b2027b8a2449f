//! Resident state of one populated dataset.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::model::{Art, Camp, Event, EventState, RawDataset, UNKNOWN_TIME};
use crate::normalize::{NormalizeOptions, classify, describe_event, normalize};
use crate::timestring::TimeStringCache;

/// An event together with everything derived for it, as handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    #[serde(flatten)]
    pub state: EventState,
}

/// Normalized catalog, derived state and the time-string cache of the
/// current population epoch.
#[derive(Debug)]
pub struct Engine {
    pub(crate) events: Vec<Event>,
    pub(crate) states: Vec<EventState>,
    pub(crate) camps: Vec<Camp>,
    pub(crate) art: Vec<Art>,
    pub(crate) categories: Vec<String>,
    pub(crate) days: BTreeSet<NaiveDate>,
    pub(crate) all_events_old: bool,
    pub(crate) now: DateTime<Utc>,
    pub(crate) options: NormalizeOptions,
    pub(crate) cache: TimeStringCache,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(NormalizeOptions::default())
    }
}

impl Engine {
    pub fn new(options: NormalizeOptions) -> Self {
        Self {
            events: Vec::new(),
            states: Vec::new(),
            camps: Vec::new(),
            art: Vec::new(),
            categories: Vec::new(),
            days: BTreeSet::new(),
            all_events_old: false,
            now: DateTime::<Utc>::UNIX_EPOCH,
            options,
            cache: TimeStringCache::new(),
        }
    }

    /// Replace all resident state with a normalized copy of `raw`.
    ///
    /// On error the previous population stays in place. Returns the number of
    /// retained events plus camps.
    pub fn populate(
        &mut self,
        raw: RawDataset,
        options: NormalizeOptions,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let normalized = normalize(raw, &options, now, &mut self.cache)?;
        self.events = normalized.events;
        self.states = normalized.states;
        self.camps = normalized.camps;
        self.art = normalized.art;
        self.categories = normalized.categories;
        self.days = normalized.days;
        self.all_events_old = normalized.all_events_old;
        self.now = now;
        self.options = options;
        Ok(self.events.len() + self.camps.len())
    }

    /// Re-evaluate old/happening flags and relative display strings at `now`,
    /// starting a fresh cache epoch. Returns whether any occurrence is still
    /// live; a dataset in permissive mode keeps everything visible and
    /// reports `false`.
    pub fn check_events(&mut self, now: DateTime<Utc>) -> bool {
        self.now = now;
        self.cache.clear();
        let tz = self.options.time_zone;
        let mut live = false;

        for state in self.states.iter_mut() {
            for occurrence in state.occurrences.iter_mut() {
                let (Some(start), Some(end)) = (occurrence.start, occurrence.end) else {
                    continue;
                };
                if !self.all_events_old {
                    let (old, happening) = classify(start, end, now);
                    occurrence.old = old;
                    occurrence.happening = happening;
                    live |= !old;
                }
                occurrence.long_time_string = Some(
                    self.cache
                        .describe(start, end, None, now, tz)
                        .map(|described| described.long)
                        .unwrap_or_else(|| UNKNOWN_TIME.to_string()),
                );
            }
            state.old = state.occurrences.iter().all(|o| o.old);
            state.happening = state.occurrences.iter().any(|o| o.happening);
            let (described, _) =
                describe_event(&state.occurrences, None, now, tz, &mut self.cache);
            state.time_string = described.short;
            state.long_time_string = described.long;
        }

        info!(live, all_events_old = self.all_events_old, "Event flags re-evaluated");
        live
    }

    pub fn all_events_old(&self) -> bool {
        self.all_events_old
    }

    /// Evaluation instant of the current epoch.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn time_zone(&self) -> Tz {
        self.options.time_zone
    }

    pub fn cache(&self) -> &TimeStringCache {
        &self.cache
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn camp_count(&self) -> usize {
        self.camps.len()
    }

    pub fn art_count(&self) -> usize {
        self.art.len()
    }

    pub(crate) fn view(&self, index: usize) -> EventView {
        EventView {
            event: self.events[index].clone(),
            state: self.states[index].clone(),
        }
    }
}
