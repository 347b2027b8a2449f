//! One-shot normalization of a freshly loaded dataset.
//!
//! Raw collections go in; a normalized catalog comes out together with the
//! derived per-event state the query engine reads. Nothing here looks at the
//! wall clock: the evaluation instant is always passed in.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use crate::error::{GuideError, Result};
use crate::model::{
    Art, ArtId, Camp, CampId, Event, EventState, LOCATION_UNAVAILABLE, Occurrence,
    OccurrenceState, RawDataset, TimeString, UNKNOWN_TIME,
};
use crate::timestring::TimeStringCache;

#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    /// Replace every camp and art location with the unavailable sentinel.
    pub hide_locations: bool,
    /// Zone that defines calendar days and local midnight.
    pub time_zone: Tz,
    /// Abort the whole population on the first malformed occurrence instead
    /// of skipping it.
    pub strict: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            hide_locations: false,
            time_zone: Tz::UTC,
            strict: false,
        }
    }
}

/// Output of [`normalize`]: the normalized catalog plus derived state.
///
/// `states` is aligned index-for-index with `events`.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub events: Vec<Event>,
    pub camps: Vec<Camp>,
    pub art: Vec<Art>,
    pub states: Vec<EventState>,
    pub categories: Vec<String>,
    pub days: BTreeSet<NaiveDate>,
    /// Every occurrence had already ended at evaluation time, so the whole
    /// dataset is being shown as not-old/not-happening.
    pub all_events_old: bool,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    /// End as published, before correction.
    raw_end: DateTime<Utc>,
}

pub fn normalize(
    raw: RawDataset,
    options: &NormalizeOptions,
    now: DateTime<Utc>,
    cache: &mut TimeStringCache,
) -> Result<Normalized> {
    let started = Instant::now();
    cache.clear();
    let tz = options.time_zone;

    let RawDataset {
        mut events,
        camps,
        mut art,
    } = raw;

    let mut camps: Vec<Camp> = camps.into_iter().filter(has_description_or_location).collect();
    camps.sort_by_cached_key(|camp| name_key(&camp.name));
    art.sort_by_cached_key(|piece| name_key(&piece.name));

    let mut camp_names: HashMap<CampId, String> = HashMap::with_capacity(camps.len());
    let mut camp_locations: HashMap<CampId, String> = HashMap::with_capacity(camps.len());
    for camp in camps.iter_mut() {
        let location = apply_location_rule(&mut camp.location_string, options.hide_locations);
        camp_names.insert(camp.uid.clone(), camp.name.clone());
        camp_locations.insert(camp.uid.clone(), location);
    }

    let mut art_names: HashMap<ArtId, String> = HashMap::with_capacity(art.len());
    for piece in art.iter_mut() {
        apply_location_rule(&mut piece.location_string, options.hide_locations);
        art_names.insert(piece.uid.clone(), piece.name.clone());
    }

    let mut windows: Vec<Vec<Option<Window>>> = Vec::with_capacity(events.len());
    for event in &events {
        let mut parsed = Vec::with_capacity(event.occurrence_set.len());
        for occurrence in &event.occurrence_set {
            match parse_occurrence(occurrence, tz) {
                Some((start, end)) => {
                    let corrected = correct_end(start, end, tz);
                    parsed.push(Some(Window {
                        start,
                        end: corrected,
                        raw_end: end,
                    }));
                }
                None => {
                    let value = format!("{} / {}", occurrence.start_time, occurrence.end_time);
                    if options.strict {
                        return Err(GuideError::MalformedOccurrence {
                            event: event.uid.clone(),
                            value,
                        });
                    }
                    warn!(event = %event.uid, %value, "Skipping occurrence with unparseable timestamps");
                    parsed.push(None);
                }
            }
        }
        windows.push(parsed);
    }

    // Judged on the published ends, before correction.
    // TODO: confirm with product whether archived datasets should keep this
    // reclassification or show their content as ended.
    let all_events_old = !windows
        .iter()
        .flatten()
        .flatten()
        .any(|window| window.raw_end >= now);

    let mut states = Vec::with_capacity(events.len());
    let mut categories = BTreeSet::new();
    let mut days = BTreeSet::new();

    for (event, event_windows) in events.iter_mut().zip(windows) {
        if !event.event_type.label.is_empty() {
            categories.insert(event.event_type.label.clone());
        }

        let (camp, location) = resolve_location(event, &camp_names, &camp_locations, &art_names);
        if camp.is_none() {
            debug!(event = %event.uid, title = %event.title, "Event has no resolvable location");
        }

        if event.print_description.is_empty() {
            event.print_description = event.description.clone();
        }

        let mut occurrences = Vec::with_capacity(event_windows.len());
        for (occurrence, window) in event.occurrence_set.iter_mut().zip(event_windows) {
            let Some(window) = window else {
                occurrences.push(OccurrenceState {
                    start: None,
                    end: None,
                    old: false,
                    happening: false,
                    long_time_string: None,
                });
                continue;
            };

            days.insert(window.start.with_timezone(&tz).date_naive());
            if window.end != window.raw_end {
                occurrence.end_time = window.end.with_timezone(&tz).to_rfc3339();
            }

            let (old, happening) = if all_events_old {
                (false, false)
            } else {
                classify(window.start, window.end, now)
            };
            let long = cache
                .describe(window.start, window.end, None, now, tz)
                .map(|described| described.long)
                .unwrap_or_else(|| UNKNOWN_TIME.to_string());

            occurrences.push(OccurrenceState {
                start: Some(window.start),
                end: Some(window.end),
                old,
                happening,
                long_time_string: Some(long),
            });
        }

        let (time_string, _) = describe_event(&occurrences, None, now, tz, cache);
        states.push(EventState {
            camp,
            location,
            start: occurrences.iter().filter_map(|state| state.start).min(),
            time_string: time_string.short,
            long_time_string: time_string.long,
            old: occurrences.iter().all(|state| state.old),
            happening: occurrences.iter().any(|state| state.happening),
            occurrences,
        });
    }

    cache.clear();

    info!(
        events = events.len(),
        camps = camps.len(),
        art = art.len(),
        all_events_old,
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "Dataset normalized"
    );

    Ok(Normalized {
        events,
        camps,
        art,
        states,
        categories: categories.into_iter().collect(),
        days,
        all_events_old,
    })
}

/// Clamp an overlong window onto the start's calendar day and pull a
/// midnight end back to 23:59 of that day. Returns the corrected end.
pub fn correct_end(start: DateTime<Utc>, end: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let start_day = start.with_timezone(&tz).date_naive();
    let mut local_end = end.with_timezone(&tz);

    if (end - start).abs() > Duration::hours(24) {
        if let Some(clamped) = local_at(tz, start_day, local_end.hour(), local_end.minute()) {
            local_end = clamped;
        }
    }

    if local_end.hour() == 0 && local_end.minute() == 0 {
        if let Some(before_midnight) = local_at(tz, start_day, 23, 59) {
            local_end = before_midnight;
        }
    }

    local_end.with_timezone(&Utc)
}

/// `(old, happening)` for a window evaluated at `now`. Never both true.
pub fn classify(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> (bool, bool) {
    let old = end < now;
    let happening = !old && start < now;
    (old, happening)
}

/// Parse a published timestamp. RFC 3339 is expected; offset-less values are
/// read as wall-clock time in `tz`.
pub fn parse_timestamp(value: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .ok()
        .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
}

/// Short/long description of an event, taken from its first resolvable
/// occurrence, together with that occurrence's start.
pub(crate) fn describe_event(
    occurrences: &[OccurrenceState],
    reference_day: Option<NaiveDate>,
    now: DateTime<Utc>,
    tz: Tz,
    cache: &mut TimeStringCache,
) -> (TimeString, Option<DateTime<Utc>>) {
    for occurrence in occurrences {
        let (Some(start), Some(end)) = (occurrence.start, occurrence.end) else {
            continue;
        };
        if let Some(described) = cache.describe(start, end, reference_day, now, tz) {
            return (described, Some(start));
        }
    }
    (TimeString::unknown(), None)
}

/// Case-insensitive name ordering with the original spelling as tiebreak.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    name_key(a).cmp(&name_key(b))
}

fn name_key(name: &str) -> (String, String) {
    (name.to_lowercase(), name.to_string())
}

fn parse_occurrence(occurrence: &Occurrence, tz: Tz) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = parse_timestamp(&occurrence.start_time, tz)?;
    let end = parse_timestamp(&occurrence.end_time, tz)?;
    Some((start, end))
}

/// Wall-clock times skipped by a DST gap resolve to the same reading one hour
/// later.
fn local_at(tz: Tz, day: NaiveDate, hour: u32, minute: u32) -> Option<DateTime<Tz>> {
    let naive = day.and_hms_opt(hour, minute, 0)?;
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|text| !text.trim().is_empty())
}

fn has_description_or_location(camp: &Camp) -> bool {
    non_empty(&camp.description) || non_empty(&camp.location_string)
}

fn apply_location_rule(location: &mut Option<String>, hide: bool) -> String {
    if hide || !non_empty(location) {
        *location = Some(LOCATION_UNAVAILABLE.to_string());
    }
    location.clone().unwrap_or_else(|| LOCATION_UNAVAILABLE.to_string())
}

fn resolve_location(
    event: &Event,
    camp_names: &HashMap<CampId, String>,
    camp_locations: &HashMap<CampId, String>,
    art_names: &HashMap<ArtId, String>,
) -> (Option<String>, Option<String>) {
    if let Some(camp_id) = &event.hosted_by_camp {
        if let Some(name) = camp_names.get(camp_id) {
            return (Some(name.clone()), camp_locations.get(camp_id).cloned());
        }
    }
    if let Some(text) = event.other_location.as_deref() {
        if !text.trim().is_empty() {
            return (Some(text.to_string()), None);
        }
    }
    if let Some(art_id) = &event.located_at_art {
        if let Some(name) = art_names.get(art_id) {
            return (Some(name.clone()), None);
        }
    }
    (None, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{art, at, camp, event, event_at_camp, occurrence};
    use chrono::TimeZone;

    fn run(raw: RawDataset, options: NormalizeOptions, now: DateTime<Utc>) -> Normalized {
        let mut cache = TimeStringCache::new();
        normalize(raw, &options, now, &mut cache).expect("normalize")
    }

    fn before(day: u32) -> DateTime<Utc> {
        at(2024, 8, day, 0, 0)
    }

    #[test]
    fn scenario_a_short_overnight_window_is_unchanged() {
        let start = at(2024, 8, 26, 22, 0);
        let end = at(2024, 8, 27, 1, 0);
        assert_eq!(correct_end(start, end, Tz::UTC), end);
    }

    #[test]
    fn scenario_b_long_window_is_clamped_to_start_day() {
        let start = at(2024, 8, 26, 9, 0);
        let end = at(2024, 8, 28, 9, 0);
        let corrected = correct_end(start, end, Tz::UTC);
        assert_eq!(corrected, at(2024, 8, 26, 9, 0));
        assert_eq!(corrected - start, Duration::zero());
    }

    #[test]
    fn clamp_preserves_end_hour_and_minute() {
        let start = at(2024, 8, 26, 10, 0);
        let end = at(2024, 8, 29, 17, 45);
        assert_eq!(correct_end(start, end, Tz::UTC), at(2024, 8, 26, 17, 45));
    }

    #[test]
    fn scenario_c_midnight_end_becomes_2359() {
        let start = at(2024, 8, 26, 20, 0);
        let end = at(2024, 8, 27, 0, 0);
        assert_eq!(correct_end(start, end, Tz::UTC), at(2024, 8, 26, 23, 59));
    }

    #[test]
    fn midnight_is_local_to_dataset_zone() {
        let tz: Tz = "America/Los_Angeles".parse().expect("zone");
        let start = tz
            .with_ymd_and_hms(2024, 8, 26, 21, 0, 0)
            .single()
            .expect("valid")
            .with_timezone(&Utc);
        let end = tz
            .with_ymd_and_hms(2024, 8, 27, 0, 0, 0)
            .single()
            .expect("valid")
            .with_timezone(&Utc);
        let expected = tz
            .with_ymd_and_hms(2024, 8, 26, 23, 59, 0)
            .single()
            .expect("valid")
            .with_timezone(&Utc);
        assert_eq!(correct_end(start, end, tz), expected);
        // Midnight UTC is mid-afternoon in Los Angeles and stays untouched.
        assert_eq!(correct_end(start, end, Tz::UTC), end);
    }

    #[test]
    fn classify_never_reports_old_and_happening() {
        let start = at(2024, 8, 26, 10, 0);
        let end = at(2024, 8, 26, 12, 0);
        for hour in 8..15 {
            let (old, happening) = classify(start, end, at(2024, 8, 26, hour, 0));
            assert!(!(old && happening));
        }
        assert_eq!(classify(start, end, at(2024, 8, 26, 11, 0)), (false, true));
        assert_eq!(classify(start, end, at(2024, 8, 26, 13, 0)), (true, false));
        assert_eq!(classify(start, end, at(2024, 8, 26, 9, 0)), (false, false));
    }

    #[test]
    fn event_flags_aggregate_occurrences() {
        let mut early_and_late = event("e1", "Yoga", "Workshop");
        early_and_late.occurrence_set = vec![
            occurrence(at(2024, 8, 25, 9, 0), at(2024, 8, 25, 10, 0)),
            occurrence(at(2024, 8, 26, 11, 0), at(2024, 8, 26, 13, 0)),
        ];
        let mut finished = event("e2", "Brunch", "Food");
        finished.occurrence_set = vec![occurrence(at(2024, 8, 24, 9, 0), at(2024, 8, 24, 10, 0))];

        let raw = RawDataset {
            events: vec![early_and_late, finished],
            ..RawDataset::default()
        };
        let normalized = run(raw, NormalizeOptions::default(), at(2024, 8, 26, 12, 0));
        assert!(!normalized.all_events_old);

        for state in &normalized.states {
            assert_eq!(state.old, state.occurrences.iter().all(|o| o.old));
            assert_eq!(state.happening, state.occurrences.iter().any(|o| o.happening));
            for occurrence in &state.occurrences {
                assert!(!(occurrence.old && occurrence.happening));
            }
        }
        assert!(!normalized.states[0].old);
        assert!(normalized.states[0].happening);
        assert!(normalized.states[1].old);
        assert!(!normalized.states[1].happening);
        assert_eq!(normalized.states[0].start, Some(at(2024, 8, 25, 9, 0)));
    }

    #[test]
    fn occurrence_end_is_rewritten_after_correction() {
        let mut long = event("e1", "Art car parade", "Parade");
        long.occurrence_set = vec![occurrence(at(2024, 8, 26, 9, 0), at(2024, 8, 28, 11, 0))];
        let raw = RawDataset {
            events: vec![long],
            ..RawDataset::default()
        };
        let normalized = run(raw, NormalizeOptions::default(), before(20));
        let state = &normalized.states[0].occurrences[0];
        assert_eq!(state.end, Some(at(2024, 8, 26, 11, 0)));
        let rewritten = parse_timestamp(&normalized.events[0].occurrence_set[0].end_time, Tz::UTC);
        assert_eq!(rewritten, Some(at(2024, 8, 26, 11, 0)));
        assert!(state.end.zip(state.start).is_some_and(|(e, s)| e - s <= Duration::hours(24)));
    }

    #[test]
    fn scenario_d_hidden_locations_use_sentinel() {
        let raw = RawDataset {
            events: vec![event_at_camp("e1", "Tea", "c1")],
            camps: vec![
                camp("c1", "Camp Tea", Some("A tea house"), Some("7:30 & E")),
                camp("c2", "Camp Nowhere", Some("No address"), None),
            ],
            art: vec![art("a1", "Temple", Some("12:00 & 2500'"))],
        };
        let options = NormalizeOptions {
            hide_locations: true,
            ..NormalizeOptions::default()
        };
        let normalized = run(raw, options, before(20));
        for camp in &normalized.camps {
            assert_eq!(camp.location_string.as_deref(), Some(LOCATION_UNAVAILABLE));
        }
        for piece in &normalized.art {
            assert_eq!(piece.location_string.as_deref(), Some(LOCATION_UNAVAILABLE));
        }
        assert_eq!(normalized.states[0].location.as_deref(), Some(LOCATION_UNAVAILABLE));
    }

    #[test]
    fn missing_locations_use_sentinel_without_hiding() {
        let raw = RawDataset {
            camps: vec![
                camp("c1", "Camp Tea", Some("A tea house"), Some("7:30 & E")),
                camp("c2", "Camp Nowhere", Some("No address"), None),
            ],
            art: vec![art("a1", "Temple", None)],
            ..RawDataset::default()
        };
        let normalized = run(raw, NormalizeOptions::default(), before(20));
        let tea = normalized.camps.iter().find(|c| c.uid.as_str() == "c1").expect("c1");
        assert_eq!(tea.location_string.as_deref(), Some("7:30 & E"));
        let nowhere = normalized.camps.iter().find(|c| c.uid.as_str() == "c2").expect("c2");
        assert_eq!(nowhere.location_string.as_deref(), Some(LOCATION_UNAVAILABLE));
        assert_eq!(normalized.art[0].location_string.as_deref(), Some(LOCATION_UNAVAILABLE));
    }

    #[test]
    fn scenario_e_stale_dataset_enters_permissive_mode() {
        let mut first = event("e1", "Sunrise set", "Music");
        first.occurrence_set = vec![occurrence(at(2019, 8, 26, 5, 0), at(2019, 8, 26, 8, 0))];
        let mut second = event("e2", "Burn", "Ceremony");
        second.occurrence_set = vec![
            occurrence(at(2019, 8, 31, 20, 0), at(2019, 8, 31, 23, 0)),
            occurrence(at(2019, 9, 1, 20, 0), at(2019, 9, 1, 23, 0)),
        ];
        let raw = RawDataset {
            events: vec![first, second],
            ..RawDataset::default()
        };
        let normalized = run(raw, NormalizeOptions::default(), at(2024, 8, 26, 12, 0));
        assert!(normalized.all_events_old);
        for state in &normalized.states {
            assert!(!state.old);
            assert!(!state.happening);
            assert!(state.occurrences.iter().all(|o| !o.old && !o.happening));
        }
    }

    #[test]
    fn clamped_window_still_running_keeps_dataset_current() {
        let mut parade = event("e1", "Art car parade", "Parade");
        parade.occurrence_set = vec![occurrence(at(2024, 8, 26, 9, 0), at(2024, 8, 28, 11, 0))];
        let raw = RawDataset {
            events: vec![parade],
            ..RawDataset::default()
        };
        let normalized = run(raw, NormalizeOptions::default(), at(2024, 8, 27, 12, 0));
        assert!(!normalized.all_events_old);
        let state = &normalized.states[0].occurrences[0];
        assert_eq!(state.end, Some(at(2024, 8, 26, 11, 0)));
        assert!(state.old);
        assert!(!state.happening);
        assert!(normalized.states[0].old);
    }

    #[test]
    fn clamp_into_dst_gap_stays_within_a_day() {
        let tz: Tz = "America/Los_Angeles".parse().expect("zone");
        // 01:00 PST on the spring-forward day; 02:30 does not exist locally.
        let start = tz
            .with_ymd_and_hms(2024, 3, 10, 1, 0, 0)
            .single()
            .expect("valid")
            .with_timezone(&Utc);
        let end = tz
            .with_ymd_and_hms(2024, 3, 12, 2, 30, 0)
            .single()
            .expect("valid")
            .with_timezone(&Utc);
        let corrected = correct_end(start, end, tz);
        let expected = tz
            .with_ymd_and_hms(2024, 3, 10, 3, 30, 0)
            .single()
            .expect("valid")
            .with_timezone(&Utc);
        assert_eq!(corrected, expected);
        assert!(corrected - start <= Duration::hours(24));
    }

    #[test]
    fn camps_without_description_or_location_are_dropped_and_sorted() {
        let raw = RawDataset {
            camps: vec![
                camp("c1", "zebra camp", Some("stripes"), None),
                camp("c2", "Empty", None, None),
                camp("c3", "Alpha", None, Some("9:00 & A")),
                camp("c4", "blank", Some("  "), Some("")),
            ],
            art: vec![art("a1", "wave", None), art("a2", "Arch", None)],
            ..RawDataset::default()
        };
        let normalized = run(raw, NormalizeOptions::default(), before(20));
        let names: Vec<_> = normalized.camps.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "zebra camp"]);
        let art_names: Vec<_> = normalized.art.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(art_names, vec!["Arch", "wave"]);
    }

    #[test]
    fn location_precedence_prefers_camp_then_text_then_art() {
        let mut hosted = event_at_camp("e1", "Tea", "c1");
        hosted.other_location = Some("Center Camp".to_string());
        let mut text = event("e2", "Talk", "Talk");
        text.other_location = Some("Center Camp".to_string());
        text.located_at_art = Some(ArtId::from("a1"));
        let mut at_art = event("e3", "Vigil", "Ritual");
        at_art.located_at_art = Some(ArtId::from("a1"));
        let nowhere = event("e4", "Mystery", "Other");
        let orphan = event_at_camp("e5", "Ghost", "missing");

        let raw = RawDataset {
            events: vec![hosted, text, at_art, nowhere, orphan],
            camps: vec![camp("c1", "Camp Tea", Some("tea"), Some("7:30 & E"))],
            art: vec![art("a1", "Temple", Some("12:00"))],
        };
        let normalized = run(raw, NormalizeOptions::default(), before(20));
        let camps: Vec<_> = normalized.states.iter().map(|s| s.camp.as_deref()).collect();
        assert_eq!(
            camps,
            vec![Some("Camp Tea"), Some("Center Camp"), Some("Temple"), None, None]
        );
        assert_eq!(normalized.states[0].location.as_deref(), Some("7:30 & E"));
        assert_eq!(normalized.states[1].location, None);
    }

    #[test]
    fn print_description_is_backfilled() {
        let mut blank = event("e1", "Tea", "Food");
        blank.description = "Hot tea all night".to_string();
        let mut printed = event("e2", "Talk", "Talk");
        printed.description = "long".to_string();
        printed.print_description = "short".to_string();
        let raw = RawDataset {
            events: vec![blank, printed],
            ..RawDataset::default()
        };
        let normalized = run(raw, NormalizeOptions::default(), before(20));
        assert_eq!(normalized.events[0].print_description, "Hot tea all night");
        assert_eq!(normalized.events[1].print_description, "short");
    }

    #[test]
    fn categories_and_days_are_sorted_and_unique() {
        let mut a = event("e1", "One", "Music");
        a.occurrence_set = vec![
            occurrence(at(2024, 8, 28, 9, 0), at(2024, 8, 28, 10, 0)),
            occurrence(at(2024, 8, 26, 9, 0), at(2024, 8, 26, 10, 0)),
        ];
        let mut b = event("e2", "Two", "Food");
        b.occurrence_set = vec![occurrence(at(2024, 8, 26, 15, 0), at(2024, 8, 26, 16, 0))];
        let c = event("e3", "Three", "Music");
        let unlabeled = event("e4", "Four", "");
        let raw = RawDataset {
            events: vec![a, b, c, unlabeled],
            ..RawDataset::default()
        };
        let normalized = run(raw, NormalizeOptions::default(), before(20));
        assert_eq!(normalized.categories, vec!["Food".to_string(), "Music".to_string()]);
        let days: Vec<_> = normalized.days.iter().copied().collect();
        assert_eq!(
            days,
            vec![
                NaiveDate::from_ymd_opt(2024, 8, 26).expect("date"),
                NaiveDate::from_ymd_opt(2024, 8, 28).expect("date"),
            ]
        );
    }

    #[test]
    fn malformed_occurrence_is_skipped_leniently() {
        let mut broken = event("e1", "Broken", "Other");
        broken.occurrence_set = vec![
            Occurrence {
                start_time: "not a date".to_string(),
                end_time: "2024-08-26T10:00:00Z".to_string(),
            },
            occurrence(at(2024, 8, 26, 9, 0), at(2024, 8, 26, 10, 0)),
        ];
        let raw = RawDataset {
            events: vec![broken],
            ..RawDataset::default()
        };
        let normalized = run(raw, NormalizeOptions::default(), before(20));
        let state = &normalized.states[0];
        assert_eq!(state.occurrences[0].long_time_string, None);
        assert!(state.occurrences[1].long_time_string.is_some());
        assert_ne!(state.time_string, UNKNOWN_TIME);
    }

    #[test]
    fn malformed_occurrence_aborts_when_strict() {
        let mut broken = event("e1", "Broken", "Other");
        broken.occurrence_set = vec![Occurrence {
            start_time: "2024-08-26T09:00:00Z".to_string(),
            end_time: String::new(),
        }];
        let raw = RawDataset {
            events: vec![broken],
            ..RawDataset::default()
        };
        let options = NormalizeOptions {
            strict: true,
            ..NormalizeOptions::default()
        };
        let mut cache = TimeStringCache::new();
        let err = normalize(raw, &options, before(20), &mut cache).expect_err("strict");
        match err {
            GuideError::MalformedOccurrence { event, .. } => assert_eq!(event.as_str(), "e1"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn event_without_resolvable_occurrence_reports_unknown() {
        let raw = RawDataset {
            events: vec![event("e1", "Someday", "Other")],
            ..RawDataset::default()
        };
        let normalized = run(raw, NormalizeOptions::default(), before(20));
        assert_eq!(normalized.states[0].time_string, UNKNOWN_TIME);
        assert_eq!(normalized.states[0].long_time_string, UNKNOWN_TIME);
        assert_eq!(normalized.states[0].start, None);
    }

    #[test]
    fn cache_is_cleared_after_the_pass() {
        let mut a = event("e1", "One", "Music");
        a.occurrence_set = vec![occurrence(at(2024, 8, 26, 9, 0), at(2024, 8, 26, 10, 0))];
        let mut b = a.clone();
        b.uid = "e2".into();
        let raw = RawDataset {
            events: vec![a, b],
            ..RawDataset::default()
        };
        let mut cache = TimeStringCache::new();
        normalize(raw, &NormalizeOptions::default(), before(20), &mut cache).expect("normalize");
        assert!(cache.is_empty());
        // The shared window is described once for occurrences and reused for events.
        assert_eq!(cache.computations(), 1);
    }

    #[test]
    fn offsetless_timestamps_use_dataset_zone() {
        let tz: Tz = "America/Los_Angeles".parse().expect("zone");
        let parsed = parse_timestamp("2024-08-26T09:00:00", tz).expect("parses");
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 8, 26, 16, 0, 0).single().expect("valid"));
        assert!(parse_timestamp("yesterday", tz).is_none());
    }

    #[test]
    fn name_comparison_ignores_case() {
        assert_eq!(compare_names("apple", "Banana"), Ordering::Less);
        assert_eq!(compare_names("Apple", "apple"), Ordering::Less);
    }
}
