//! Plain-text rendering of replies.

use std::fmt::Write;

use dust_core::{Art, Camp, Day, EventView, Reply};

pub fn render_reply(reply: &Reply) -> String {
    match reply {
        Reply::Count(count) => format!("{count}\n"),
        Reply::Flag(flag) => format!("{flag}\n"),
        Reply::Events(events) => render_events(events),
        Reply::Event(event) => event.as_ref().map(render_event).unwrap_or_else(not_found),
        Reply::Camps(camps) => lines(camps, render_camp),
        Reply::Camp(camp) => camp.as_ref().map(render_camp).unwrap_or_else(not_found),
        Reply::Art(art) => lines(art, render_art),
        Reply::ArtPiece(piece) => piece.as_ref().map(render_art).unwrap_or_else(not_found),
        Reply::Days(days) => lines(days, render_day),
        Reply::Categories(categories) => lines(categories, |category| format!("{category}\n")),
        Reply::Points(points) => lines(points, |pin| format!("{:.1},{:.1}\n", pin.x, pin.y)),
        Reply::Unsupported { operation } => format!("Unsupported operation '{operation}'\n"),
        Reply::Rejected { reason } => format!("Rejected: {reason}\n"),
        Reply::Failed { reason } => format!("Failed: {reason}\n"),
    }
}

pub fn render_events(events: &[EventView]) -> String {
    if events.is_empty() {
        return "No events.\n".to_string();
    }
    lines(events, render_event)
}

fn render_event(view: &EventView) -> String {
    let mut out = String::new();
    let _ = write!(out, "{:<22} {}", view.state.time_string, view.event.title);
    if let Some(camp) = &view.state.camp {
        let _ = write!(out, " @ {camp}");
    }
    if let Some(location) = &view.state.location {
        let _ = write!(out, " ({location})");
    }
    if view.state.happening {
        out.push_str(" [now]");
    } else if view.state.old {
        out.push_str(" [ended]");
    }
    out.push('\n');
    out
}

fn render_camp(camp: &Camp) -> String {
    format!(
        "{:<30} {}\n",
        camp.name,
        camp.location_string.as_deref().unwrap_or_default()
    )
}

fn render_art(piece: &Art) -> String {
    match &piece.artist {
        Some(artist) => format!(
            "{} by {} ({})\n",
            piece.name,
            artist,
            piece.location_string.as_deref().unwrap_or_default()
        ),
        None => format!(
            "{} ({})\n",
            piece.name,
            piece.location_string.as_deref().unwrap_or_default()
        ),
    }
}

fn render_day(day: &Day) -> String {
    format!("{} {:>2}  {}\n", day.name, day.day_of_month, day.date)
}

fn lines<T>(items: &[T], render: impl Fn(&T) -> String) -> String {
    items.iter().map(render).collect()
}

fn not_found() -> String {
    "Not found.\n".to_string()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use dust_core::{CampId, Pin};

    use super::*;

    #[test]
    fn camps_render_one_per_line() {
        let camp = Camp {
            uid: CampId::from("c1"),
            name: "Tea House".to_string(),
            description: None,
            location_string: Some("7:30 & E".to_string()),
            url: None,
            hometown: None,
            landmark: None,
        };
        let rendered = render_reply(&Reply::Camps(vec![camp.clone(), camp]));
        assert_eq!(rendered.lines().count(), 2);
        assert!(rendered.starts_with("Tea House"));
        assert!(rendered.contains("7:30 & E"));
    }

    #[test]
    fn empty_and_missing_results_are_explicit() {
        assert_eq!(render_reply(&Reply::Events(Vec::new())), "No events.\n");
        assert_eq!(render_reply(&Reply::Camp(None)), "Not found.\n");
    }

    #[test]
    fn days_and_points() {
        let day = Day {
            name: "Mon".to_string(),
            day_of_month: "26".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 8, 26).expect("date"),
        };
        assert_eq!(render_reply(&Reply::Days(vec![day])), "Mon 26  2024-08-26\n");
        assert_eq!(
            render_reply(&Reply::Points(vec![Pin { x: 1.0, y: 2.5 }])),
            "1.0,2.5\n"
        );
    }
}
