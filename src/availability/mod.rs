//! Selectable dates and time slots for the booking form.
//!
//! Everything here is recomputed from the supplied "now" on every call.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// How the client picks a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateInputStyle {
    /// Native date input bounded by today and January 1st of next year.
    NativeRange,
    /// Calendar picker offering weekdays only.
    ConstrainedPicker,
}

impl FromStr for DateInputStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "native" => Ok(DateInputStyle::NativeRange),
            "picker" => Ok(DateInputStyle::ConstrainedPicker),
            other => Err(format!("expected 'native' or 'picker', got '{}'", other)),
        }
    }
}

impl fmt::Display for DateInputStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateInputStyle::NativeRange => f.write_str("native"),
            DateInputStyle::ConstrainedPicker => f.write_str("picker"),
        }
    }
}

/// Settings that used to differ between the two copies of the booking form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormVariant {
    pub date_input: DateInputStyle,
    pub slot_granularity_minutes: u32,
    pub max_phone_digits: usize,
    pub first_slot: NaiveTime,
    /// Inclusive.
    pub last_slot: NaiveTime,
}

impl FormVariant {
    /// Weekday picker, 09:00 to 17:00.
    pub fn booking_page() -> Self {
        Self {
            date_input: DateInputStyle::ConstrainedPicker,
            slot_granularity_minutes: 60,
            max_phone_digits: 9,
            first_slot: hm(9, 0),
            last_slot: hm(17, 0),
        }
    }

    /// Native date input, 09:00 to 18:00.
    pub fn native_range() -> Self {
        Self {
            date_input: DateInputStyle::NativeRange,
            last_slot: hm(18, 0),
            ..Self::booking_page()
        }
    }

    /// Every slot of a day, ignoring the clock.
    pub fn all_slots(&self) -> Vec<NaiveTime> {
        let step = Duration::minutes(i64::from(self.slot_granularity_minutes.max(1)));
        let mut slots = Vec::new();
        let mut slot = self.first_slot;
        while slot <= self.last_slot {
            slots.push(slot);
            let (next, wrapped) = slot.overflowing_add_signed(step);
            if wrapped != 0 {
                break;
            }
            slot = next;
        }
        slots
    }

    /// Slots offered for `date`. For today, slots in the current hour or earlier are dropped.
    pub fn available_slots(&self, date: NaiveDate, now: NaiveDateTime) -> Vec<NaiveTime> {
        let slots = self.all_slots();
        if date != now.date() {
            return slots;
        }
        slots
            .into_iter()
            .filter(|slot| slot.hour() > now.hour())
            .collect()
    }

    pub fn min_date(&self, today: NaiveDate) -> NaiveDate {
        today
    }

    /// Upper bound of the native date input. The picker has none.
    pub fn max_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self.date_input {
            DateInputStyle::NativeRange => NaiveDate::from_ymd_opt(today.year() + 1, 1, 1),
            DateInputStyle::ConstrainedPicker => None,
        }
    }

    pub fn is_selectable(&self, date: NaiveDate, today: NaiveDate) -> bool {
        if date < self.min_date(today) {
            return false;
        }
        match self.date_input {
            DateInputStyle::ConstrainedPicker => is_weekday(date),
            DateInputStyle::NativeRange => self.max_date(today).map_or(true, |max| date <= max),
        }
    }
}

pub fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

pub fn parse_slot(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}

pub fn format_slot(slot: NaiveTime) -> String {
    slot.format("%H:%M").to_string()
}

/// Response of `GET /api/availability`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub date: NaiveDate,
    pub date_input: DateInputStyle,
    pub selectable: bool,
    pub min_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_date: Option<NaiveDate>,
    pub slots: Vec<String>,
}

impl Availability {
    pub fn compute(variant: &FormVariant, date: NaiveDate, now: NaiveDateTime) -> Self {
        let today = now.date();
        let selectable = variant.is_selectable(date, today);
        let slots = if selectable {
            variant
                .available_slots(date, now)
                .into_iter()
                .map(format_slot)
                .collect()
        } else {
            Vec::new()
        };

        Self {
            date,
            date_input: variant.date_input,
            selectable,
            min_date: variant.min_date(today),
            max_date: variant.max_date(today),
            slots,
        }
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(raw: &str) -> NaiveDate {
        parse_date(raw).unwrap()
    }

    fn at(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M").unwrap()
    }

    fn labels(slots: Vec<NaiveTime>) -> Vec<String> {
        slots.into_iter().map(format_slot).collect()
    }

    #[test]
    fn test_booking_page_slots() {
        let slots = labels(FormVariant::booking_page().all_slots());
        assert_eq!(slots.first().unwrap(), "09:00");
        assert_eq!(slots.last().unwrap(), "17:00");
        assert_eq!(slots.len(), 9);
    }

    #[test]
    fn test_native_range_ends_at_six() {
        let slots = labels(FormVariant::native_range().all_slots());
        assert_eq!(slots.last().unwrap(), "18:00");
        assert_eq!(slots.len(), 10);
    }

    #[test]
    fn test_today_drops_current_and_past_hours() {
        // 2024-06-10 is a Monday
        let now = at("2024-06-10 14:20");
        let slots = labels(FormVariant::booking_page().available_slots(now.date(), now));
        assert_eq!(slots, vec!["15:00", "16:00", "17:00"]);
    }

    #[test]
    fn test_future_date_gets_full_list() {
        let now = at("2024-06-10 14:20");
        let variant = FormVariant::booking_page();
        assert_eq!(
            variant.available_slots(date("2024-06-11"), now),
            variant.all_slots()
        );
    }

    #[test]
    fn test_after_closing_today_is_empty() {
        let now = at("2024-06-10 17:05");
        assert!(FormVariant::booking_page()
            .available_slots(now.date(), now)
            .is_empty());
    }

    #[test]
    fn test_half_hour_granularity_filters_by_hour() {
        let variant = FormVariant {
            slot_granularity_minutes: 30,
            ..FormVariant::booking_page()
        };
        let now = at("2024-06-10 15:10");
        let slots = labels(variant.available_slots(now.date(), now));
        assert_eq!(slots, vec!["16:00", "16:30", "17:00"]);
    }

    #[test]
    fn test_picker_rejects_weekend() {
        // 2024-06-08 is a Saturday
        let variant = FormVariant::booking_page();
        let today = date("2024-06-08");
        assert!(!variant.is_selectable(today, today));
        assert!(!variant.is_selectable(date("2024-06-09"), today));
        assert!(variant.is_selectable(date("2024-06-10"), today));
    }

    #[test]
    fn test_past_dates_never_selectable() {
        let today = date("2024-06-10");
        assert!(!FormVariant::booking_page().is_selectable(date("2024-06-07"), today));
        assert!(!FormVariant::native_range().is_selectable(date("2024-06-09"), today));
    }

    #[test]
    fn test_native_range_bounds() {
        let variant = FormVariant::native_range();
        let today = date("2024-06-08");
        assert!(variant.is_selectable(today, today));
        assert!(variant.is_selectable(date("2025-01-01"), today));
        assert!(!variant.is_selectable(date("2025-01-02"), today));
        assert_eq!(variant.max_date(today), Some(date("2025-01-01")));
    }

    #[test]
    fn test_availability_for_weekend_has_no_slots() {
        let availability = Availability::compute(
            &FormVariant::booking_page(),
            date("2024-06-08"),
            at("2024-06-07 09:00"),
        );
        assert!(!availability.selectable);
        assert!(availability.slots.is_empty());
        assert!(availability.max_date.is_none());
    }

    #[test]
    fn test_date_input_style_parse() {
        assert_eq!(
            "native".parse::<DateInputStyle>().unwrap(),
            DateInputStyle::NativeRange
        );
        assert!("calendar".parse::<DateInputStyle>().is_err());
    }
}
