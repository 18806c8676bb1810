//! Downloadable renderings of an itinerary (plain text and iCalendar)

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::debug;

use crate::calendar::{CalendarEvent, EventTime, write_calendar};
use crate::models::{DownloadFile, Itinerary};
use crate::{Result, TravelAgentError};

const DAY_START: (u32, u32) = (9, 0);
const DAY_END: (u32, u32) = (21, 0);

/// Plain-text itinerary
#[must_use]
pub fn render_text(itinerary: &Itinerary) -> DownloadFile {
    let mut lines = vec![
        format!("Itinerario: {}", itinerary.location),
        itinerary.weather_overview.clone(),
        String::new(),
    ];

    for day in &itinerary.days {
        lines.push(format!("Fecha: {} — {}", day.date, day.title));
        lines.push(format!("Mañana: {}", day.morning));
        lines.push(format!("Tarde: {}", day.afternoon));
        lines.push(format!("Noche: {}", day.evening));
        if !day.notes.is_empty() {
            lines.push(format!("Notas: {}", day.notes));
        }
        lines.push(String::new());
    }

    DownloadFile {
        filename: format!("{}.txt", itinerary.file_stem()),
        content: lines.join("\n"),
    }
}

fn parse_day_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| {
            // Accept date-times, only the date part matters
            raw.get(..10)
                .ok_or(())
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").map_err(|_| ()))
        })
        .map_err(|()| TravelAgentError::validation("Itinerario inválido"))
}

fn slug(text: &str) -> String {
    let slug: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    slug.split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// One calendar event per itinerary day, 09:00–21:00 local time
pub fn calendar_events(itinerary: &Itinerary) -> Result<Vec<CalendarEvent>> {
    let tz = itinerary.timezone.as_deref().and_then(|name| name.parse().ok());
    let start_of_day = NaiveTime::from_hms_opt(DAY_START.0, DAY_START.1, 0)
        .ok_or_else(|| TravelAgentError::validation("Itinerario inválido"))?;
    let end_of_day = NaiveTime::from_hms_opt(DAY_END.0, DAY_END.1, 0)
        .ok_or_else(|| TravelAgentError::validation("Itinerario inválido"))?;
    let location_slug = slug(&itinerary.location);

    itinerary
        .days
        .iter()
        .enumerate()
        .map(|(index, day)| {
            let date = parse_day_date(&day.date)?;
            Ok(CalendarEvent {
                uid: format!(
                    "{}-{}-{}@travel-agent",
                    date.format("%Y%m%d"),
                    index + 1,
                    location_slug
                ),
                summary: format!("{}: {}", itinerary.location, day.title),
                description: format!(
                    "Mañana: {}\nTarde: {}\nNoche: {}\n{}",
                    day.morning, day.afternoon, day.evening, itinerary.weather_overview
                ),
                start_time: EventTime::local(date.and_time(start_of_day), tz),
                end_time: EventTime::local(date.and_time(end_of_day), tz),
            })
        })
        .collect()
}

/// iCalendar rendering, stamped with `generated_at`
pub fn render_ics(itinerary: &Itinerary, generated_at: DateTime<Utc>) -> Result<DownloadFile> {
    let events = calendar_events(itinerary)?;
    for event in &events {
        debug!("Calendar event: {}", event);
    }

    Ok(DownloadFile {
        filename: format!("{}.ics", itinerary.file_stem()),
        content: write_calendar(&events, generated_at),
    })
}
