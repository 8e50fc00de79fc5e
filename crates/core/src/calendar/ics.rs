//! iCalendar parsing for CalDAV calendar objects
//!
//! Objects are unfolded and read with the `icalendar` parser; only the
//! properties the sync path stores are extracted from the first `VEVENT`.

use std::borrow::Cow;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use hearth_domain::NormalizedEvent;
use icalendar::parser::{read_calendar, unfold, Component, Property};
use icalendar::{CalendarDateTime, DatePerhapsTime};

/// Properties extracted from one calendar object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIcsEvent {
    pub uid: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl ParsedIcsEvent {
    /// Normalized event, or `None` when either boundary is missing.
    pub fn into_normalized(self) -> Option<NormalizedEvent> {
        Some(NormalizedEvent {
            external_id: self.uid,
            summary: self.summary,
            description: self.description,
            location: self.location,
            starts_at: self.start?,
            ends_at: self.end?,
            metadata: None,
        })
    }
}

/// Parse raw iCalendar text. Returns `None` when there is no `UID`.
///
/// Accepts a full `VCALENDAR` or a bare list of event properties. Property
/// parameters such as `TZID` or `VALUE=DATE` are honoured.
pub fn parse_ics(raw: &str) -> Option<ParsedIcsEvent> {
    let normalized = normalize_lines(raw);
    let unfolded = unfold(&normalized);
    let calendar = read_calendar(&unfolded).ok()?;
    let vevent = find_event(&calendar.components)?;

    let uid = vevent
        .find_prop("UID")
        .map(|p| p.val.to_string())
        .filter(|uid| !uid.is_empty())?;
    let text = |name: &str| vevent.find_prop(name).map(|p| p.val.to_string());

    Some(ParsedIcsEvent {
        uid,
        summary: text("SUMMARY"),
        description: text("DESCRIPTION"),
        location: text("LOCATION"),
        start: vevent.find_prop("DTSTART").and_then(boundary),
        end: vevent.find_prop("DTEND").and_then(boundary),
    })
}

/// Decode a raw `DTSTART`/`DTEND` value.
///
/// Only the part after the last `;` is considered. `YYYYMMDD` is midnight
/// UTC; `YYYYMMDDTHHMMSS` is UTC with a trailing `Z` and host-local time
/// otherwise; anything else goes through RFC 3339 / ISO 8601 parsing with
/// naive values taken as UTC.
pub fn decode_ics_date(value: &str) -> Option<DateTime<Utc>> {
    let date_value = value.rsplit(';').next().unwrap_or(value).trim();
    if date_value.is_empty() {
        return None;
    }

    if date_value.len() == 8 {
        let date = NaiveDate::parse_from_str(date_value, "%Y%m%d").ok()?;
        return utc_midnight(date);
    }

    let is_utc = value.ends_with('Z');
    let cleaned = date_value.strip_suffix('Z').unwrap_or(date_value);
    if cleaned.len() == 15 {
        let naive = NaiveDateTime::parse_from_str(cleaned, "%Y%m%dT%H%M%S").ok()?;
        return if is_utc { Some(Utc.from_utc_datetime(&naive)) } else { local_to_utc(&naive) };
    }

    parse_iso(date_value)
}

/// Bare property lists get a `VEVENT` wrapper; line endings become CRLF.
fn normalize_lines(raw: &str) -> String {
    let body: Cow<'_, str> = if raw.to_ascii_uppercase().contains("BEGIN:") {
        Cow::Borrowed(raw)
    } else {
        Cow::Owned(format!("BEGIN:VEVENT\n{raw}\nEND:VEVENT"))
    };
    let mut out = String::with_capacity(body.len() + 16);
    for line in body.lines().filter(|line| !line.trim().is_empty()) {
        out.push_str(line);
        out.push_str("\r\n");
    }
    out
}

fn find_event<'c, 'a>(components: &'c [Component<'a>]) -> Option<&'c Component<'a>> {
    components.iter().find_map(|component| {
        if component.name == "VEVENT" {
            Some(component)
        } else {
            find_event(&component.components)
        }
    })
}

fn boundary(prop: &Property<'_>) -> Option<DateTime<Utc>> {
    match DatePerhapsTime::try_from(prop) {
        Ok(DatePerhapsTime::Date(date)) => utc_midnight(date),
        Ok(DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt))) => Some(dt),
        Ok(DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive))) => local_to_utc(&naive),
        Ok(DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid })) => {
            match tzid.parse::<Tz>() {
                Ok(tz) => {
                    tz.from_local_datetime(&date_time).earliest().map(|dt| dt.with_timezone(&Utc))
                }
                Err(_) => local_to_utc(&date_time),
            }
        }
        Err(_) => decode_ics_date(prop.val.as_ref()),
    }
}

fn utc_midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt))
}

fn local_to_utc(naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
    Local.from_local_datetime(naive).earliest().map(|dt| dt.with_timezone(&Utc))
}

fn parse_iso(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().and_then(utc_midnight)
}
