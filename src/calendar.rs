//! Minimal iCalendar (RFC 5545) writer for itinerary events

use std::fmt::Display;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

const PRODID: &str = "-//TravelAgent//Itinerary//ES";
const MAX_LINE_OCTETS: usize = 75;

/// Start or end of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTime {
    /// Absolute instant, written with a `Z` suffix
    Utc(DateTime<Utc>),
    /// Wall-clock time without a zone ("floating")
    Floating(NaiveDateTime),
}

impl EventTime {
    /// Anchor a local wall-clock time in `tz` when known
    #[must_use]
    pub fn local(naive: NaiveDateTime, tz: Option<Tz>) -> Self {
        tz.and_then(|tz| tz.from_local_datetime(&naive).earliest())
            .map_or(EventTime::Floating(naive), |local| {
                EventTime::Utc(local.with_timezone(&Utc))
            })
    }

    fn to_ics(self) -> String {
        match self {
            EventTime::Utc(time) => time.format("%Y%m%dT%H%M%SZ").to_string(),
            EventTime::Floating(time) => time.format("%Y%m%dT%H%M%S").to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CalendarEvent {
    pub uid: String,
    pub summary: String,
    pub description: String,
    pub start_time: EventTime,
    pub end_time: EventTime,
}

impl Display for CalendarEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.summary)?;
        writeln!(f, "   ⏰ {} - {}", self.start_time.to_ics(), self.end_time.to_ics())
    }
}

/// Escape a TEXT property value
#[must_use]
pub fn escape_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace("\r\n", "\\n")
        .replace('\n', "\\n")
}

/// Fold a content line at 75 octets without splitting UTF-8 sequences
#[must_use]
pub fn fold_line(line: &str) -> String {
    let mut folded = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut width = 0;
    for ch in line.chars() {
        let len = ch.len_utf8();
        if width + len > MAX_LINE_OCTETS {
            folded.push_str("\r\n ");
            width = 1;
        }
        folded.push(ch);
        width += len;
    }
    folded
}

/// Serialize events into a VCALENDAR document with CRLF line endings
#[must_use]
pub fn write_calendar(events: &[CalendarEvent], stamp: DateTime<Utc>) -> String {
    let dtstamp = stamp.format("%Y%m%dT%H%M%SZ").to_string();

    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{PRODID}"),
        "CALSCALE:GREGORIAN".to_string(),
    ];
    for event in events {
        lines.push("BEGIN:VEVENT".to_string());
        lines.push(format!("UID:{}", event.uid));
        lines.push(format!("DTSTAMP:{dtstamp}"));
        lines.push(format!("DTSTART:{}", event.start_time.to_ics()));
        lines.push(format!("DTEND:{}", event.end_time.to_ics()));
        lines.push(format!("SUMMARY:{}", escape_text(&event.summary)));
        lines.push(format!("DESCRIPTION:{}", escape_text(&event.description)));
        lines.push("END:VEVENT".to_string());
    }
    lines.push("END:VCALENDAR".to_string());

    let mut document = lines
        .iter()
        .map(|line| fold_line(line))
        .collect::<Vec<_>>()
        .join("\r\n");
    document.push_str("\r\n");
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn nine_am() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 7, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(
            escape_text("Mañana: museo, café; tarde\nNoche: C:\\ruta"),
            "Mañana: museo\\, café\\; tarde\\nNoche: C:\\\\ruta"
        );
    }

    #[test]
    fn test_fold_line_ascii() {
        let line = "D".repeat(160);
        let folded = fold_line(&line);
        let parts: Vec<&str> = folded.split("\r\n").collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 75);
        assert_eq!(parts[1].len(), 75);
        assert!(parts[1].starts_with(' '));
        assert_eq!(folded.replace("\r\n ", ""), line);
    }

    #[test]
    fn test_fold_line_keeps_utf8_sequences() {
        let line = format!("SUMMARY:{}", "ñ".repeat(60));
        let folded = fold_line(&line);
        for part in folded.split("\r\n") {
            assert!(part.len() <= 75);
        }
        assert_eq!(folded.replace("\r\n ", ""), line);
    }

    #[test]
    fn test_event_time_anchoring() {
        let floating = EventTime::local(nine_am(), None);
        assert_eq!(floating.to_ics(), "20250701T090000");

        // Madrid is UTC+2 in summer
        let anchored = EventTime::local(nine_am(), Some(chrono_tz::Europe::Madrid));
        assert_eq!(anchored.to_ics(), "20250701T070000Z");
    }

    #[test]
    fn test_write_calendar() {
        let event = CalendarEvent {
            uid: "20250701-1-roma@travel-agent".to_string(),
            summary: "Roma: Coliseo".to_string(),
            description: "Mañana: Foro".to_string(),
            start_time: EventTime::Floating(nine_am()),
            end_time: EventTime::Floating(nine_am() + chrono::Duration::hours(12)),
        };
        let stamp = Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap();
        let ics = write_calendar(&[event], stamp);

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
        assert!(ics.contains("DTSTAMP:20250601T083000Z\r\n"));
        assert!(ics.contains("DTEND:20250701T210000\r\n"));
        assert!(ics.ends_with("END:VEVENT\r\nEND:VCALENDAR\r\n"));
    }
}
