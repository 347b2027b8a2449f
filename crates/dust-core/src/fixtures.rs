//! Builders shared by unit tests.

use chrono::{DateTime, TimeZone, Utc};

use crate::model::{Art, ArtId, Camp, CampId, Event, EventId, EventType, Image, Occurrence};

pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

pub fn occurrence(start: DateTime<Utc>, end: DateTime<Utc>) -> Occurrence {
    Occurrence {
        start_time: start.to_rfc3339(),
        end_time: end.to_rfc3339(),
    }
}

pub fn event(uid: &str, title: &str, category: &str) -> Event {
    Event {
        uid: EventId::from(uid),
        title: title.to_string(),
        description: String::new(),
        print_description: String::new(),
        event_type: EventType {
            label: category.to_string(),
            abbr: None,
        },
        hosted_by_camp: None,
        other_location: None,
        located_at_art: None,
        url: None,
        occurrence_set: Vec::new(),
    }
}

pub fn event_at_camp(uid: &str, title: &str, camp: &str) -> Event {
    let mut hosted = event(uid, title, "Other");
    hosted.hosted_by_camp = Some(CampId::from(camp));
    hosted
}

pub fn camp(uid: &str, name: &str, description: Option<&str>, location: Option<&str>) -> Camp {
    Camp {
        uid: CampId::from(uid),
        name: name.to_string(),
        description: description.map(str::to_string),
        location_string: location.map(str::to_string),
        url: None,
        hometown: None,
        landmark: None,
    }
}

pub fn art(uid: &str, name: &str, location: Option<&str>) -> Art {
    Art {
        uid: ArtId::from(uid),
        name: name.to_string(),
        artist: None,
        description: None,
        location_string: location.map(str::to_string),
        url: None,
        images: vec![Image {
            thumbnail_url: Some(format!("https://images.example/{uid}.jpg")),
            ready: true,
        }],
    }
}
