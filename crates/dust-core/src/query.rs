//! Read operations over a populated [`Engine`].
//!
//! Lookups of unknown ids produce `None` or an empty list. The only writes are
//! to transient display fields: search results get display strings relative
//! to the searched day, and art lookups reset image readiness.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::engine::{Engine, EventView};
use crate::model::{Art, ArtId, Camp, CampId, Day, EventId, EventState};
use crate::normalize::{compare_names, describe_event};
use crate::timestring::weekday_name;

impl Engine {
    /// Events in insertion order starting at `offset`.
    pub fn events_page(&self, offset: usize, count: usize) -> Vec<EventView> {
        (offset..self.events.len())
            .take(count)
            .map(|index| self.view(index))
            .collect()
    }

    /// Camps in name order starting at `offset`.
    pub fn camps_page(&self, offset: usize, count: usize) -> Vec<Camp> {
        self.camps.iter().skip(offset).take(count).cloned().collect()
    }

    pub fn event_list(&self, ids: &[EventId]) -> Vec<EventView> {
        let wanted: HashSet<&EventId> = ids.iter().collect();
        let mut result: Vec<EventView> = (0..self.events.len())
            .filter(|&index| wanted.contains(&self.events[index].uid))
            .map(|index| self.view(index))
            .collect();
        sort_by_start(&mut result);
        result
    }

    pub fn camp_list(&self, ids: &[CampId]) -> Vec<Camp> {
        let wanted: HashSet<&CampId> = ids.iter().collect();
        let mut result: Vec<Camp> = self
            .camps
            .iter()
            .filter(|camp| wanted.contains(&camp.uid))
            .cloned()
            .collect();
        result.sort_by(|a, b| compare_names(&a.name, &b.name));
        result
    }

    pub fn art_list(&self, ids: &[ArtId]) -> Vec<Art> {
        let wanted: HashSet<&ArtId> = ids.iter().collect();
        let mut result: Vec<Art> = self
            .art
            .iter()
            .filter(|piece| wanted.contains(&piece.uid))
            .cloned()
            .collect();
        result.sort_by(|a, b| compare_names(&a.name, &b.name));
        result
    }

    pub fn find_event(&self, id: &EventId) -> Option<EventView> {
        self.events
            .iter()
            .position(|event| &event.uid == id)
            .map(|index| self.view(index))
    }

    pub fn find_camp(&self, id: &CampId) -> Option<Camp> {
        self.camps.iter().find(|camp| &camp.uid == id).cloned()
    }

    /// Look up one art piece, marking its images as needing re-validation.
    pub fn find_art(&mut self, id: &ArtId) -> Option<Art> {
        let piece = self.art.iter_mut().find(|piece| &piece.uid == id)?;
        for image in piece.images.iter_mut() {
            image.ready = false;
        }
        Some(piece.clone())
    }

    /// Events matching `query` in title or description, in `category` (empty
    /// matches all) and live on `day` (absent matches all).
    ///
    /// Display strings of matched events are rewritten relative to `day`.
    /// With a day, results are ordered by the start of the occurrence shown
    /// for that day; otherwise by the earliest start.
    pub fn find_events(
        &mut self,
        query: &str,
        day: Option<NaiveDate>,
        category: &str,
    ) -> Vec<EventView> {
        let terms = query.trim().to_lowercase();
        let tz = self.options.time_zone;
        let mut matched = Vec::new();

        for index in 0..self.events.len() {
            let event = &self.events[index];
            let state = &self.states[index];
            let text_match = terms.is_empty()
                || event.title.to_lowercase().contains(&terms)
                || event.description.to_lowercase().contains(&terms);
            let category_match = category.is_empty() || event.event_type.label == category;
            if !(text_match && category_match && live_on_day(state, day, tz)) {
                continue;
            }

            let (described, shown_start) =
                describe_event(&state.occurrences, day, self.now, tz, &mut self.cache);
            let state = &mut self.states[index];
            state.time_string = described.short;
            state.long_time_string = described.long;
            let sort_key = if day.is_some() { shown_start } else { state.start };
            matched.push((index, sort_key));
        }

        matched.sort_by(|a, b| compare_starts(a.1, b.1));
        matched.into_iter().map(|(index, _)| self.view(index)).collect()
    }

    /// Events hosted by `camp`, earliest first.
    pub fn camp_events(&self, camp: &CampId) -> Vec<EventView> {
        let mut result: Vec<EventView> = (0..self.events.len())
            .filter(|&index| self.events[index].hosted_by_camp.as_ref() == Some(camp))
            .map(|index| self.view(index))
            .collect();
        sort_by_start(&mut result);
        result
    }

    pub fn find_camps(&self, query: &str) -> Vec<Camp> {
        let terms = query.trim().to_lowercase();
        let mut result: Vec<Camp> = self
            .camps
            .iter()
            .filter(|camp| {
                camp.name.to_lowercase().contains(&terms)
                    || camp
                        .location_string
                        .as_deref()
                        .is_some_and(|location| location.to_lowercase().contains(&terms))
            })
            .cloned()
            .collect();
        result.sort_by(|a, b| compare_names(&a.name, &b.name));
        result
    }

    /// Art whose name contains `query`; everything when the query is absent
    /// or empty.
    pub fn find_arts(&self, query: Option<&str>) -> Vec<Art> {
        let terms = query.map(|q| q.trim().to_lowercase()).unwrap_or_default();
        if terms.is_empty() {
            return self.art.clone();
        }
        self.art
            .iter()
            .filter(|piece| piece.name.to_lowercase().contains(&terms))
            .cloned()
            .collect()
    }

    /// Calendar days with at least one occurrence start, ascending.
    pub fn days(&self) -> Vec<Day> {
        self.days
            .iter()
            .map(|date| Day {
                name: weekday_name(date.weekday())[..3].to_string(),
                day_of_month: date.day().to_string(),
                date: *date,
            })
            .collect()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }
}

fn live_on_day(state: &EventState, day: Option<NaiveDate>, tz: chrono_tz::Tz) -> bool {
    let Some(day) = day else {
        return true;
    };
    state.occurrences.iter().any(|occurrence| {
        let (Some(start), Some(end)) = (occurrence.start, occurrence.end) else {
            return false;
        };
        !occurrence.old
            && (start.with_timezone(&tz).date_naive() == day
                || end.with_timezone(&tz).date_naive() == day)
    })
}

fn compare_starts(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn sort_by_start(events: &mut [EventView]) {
    events.sort_by(|a, b| compare_starts(a.state.start, b.state.start));
}
