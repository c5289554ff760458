use chrono::{NaiveTime, Timelike};
use crate::domain::models::availability::AvailabilitySlot;
use crate::error::AppError;

/// A slot as submitted by an owner, before validation.
#[derive(Debug, Clone)]
pub struct SlotDraft {
    pub weekday: i32,
    pub start_time: String,
    pub end_time: String,
    pub enabled: bool,
}

pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
        .filter(|_| matches!(raw.len(), 5 | 8))
}

/// Validates a whole submission. The result replaces every existing slot of
/// the parking, so one bad entry rejects the full set.
pub fn build_slots(parking_id: &str, drafts: Vec<SlotDraft>) -> Result<Vec<AvailabilitySlot>, AppError> {
    drafts
        .into_iter()
        .enumerate()
        .map(|(idx, draft)| {
            if !(1..=7).contains(&draft.weekday) {
                return Err(AppError::validation(
                    &format!("slots[{}].weekday", idx),
                    "weekday must be between 1 (Monday) and 7 (Sunday)",
                ));
            }
            let start = parse_time_of_day(&draft.start_time).ok_or_else(|| {
                AppError::validation(&format!("slots[{}].start_time", idx), "expected HH:MM or HH:MM:SS")
            })?;
            let end = parse_time_of_day(&draft.end_time).ok_or_else(|| {
                AppError::validation(&format!("slots[{}].end_time", idx), "expected HH:MM or HH:MM:SS")
            })?;
            if draft.enabled && end <= start {
                return Err(AppError::validation(
                    &format!("slots[{}].end_time", idx),
                    "end_time must be after start_time",
                ));
            }
            Ok(AvailabilitySlot::new(parking_id.to_string(), draft.weekday, draft.start_time, draft.end_time, draft.enabled))
        })
        .collect()
}

/// Forces a persisted time into `00:00..=23:59`. Well-formed values are
/// returned untouched; anything else is rebuilt from its numeric components
/// with out-of-range parts floored or ceilinged.
pub fn clamp_time_of_day(raw: &str) -> String {
    if let Some(t) = parse_time_of_day(raw) {
        if raw.len() == 8 {
            return t.format("%H:%M:%S").to_string();
        }
        return t.format("%H:%M").to_string();
    }

    let mut parts = raw.trim().split(':').map(|p| p.trim().parse::<i64>().unwrap_or(0));
    let hour = parts.next().unwrap_or(0);
    let minute = parts.next().unwrap_or(0);

    let (hour, minute) = if hour > 23 {
        (23, 59)
    } else if hour < 0 {
        (0, minute.clamp(0, 59))
    } else {
        (hour, minute.clamp(0, 59))
    };

    format!("{:02}:{:02}", hour, minute)
}

/// Applies [`clamp_time_of_day`] to every slot and orders them by weekday,
/// then start time.
pub fn normalize_slots(mut slots: Vec<AvailabilitySlot>) -> Vec<AvailabilitySlot> {
    for slot in &mut slots {
        slot.start_time = clamp_time_of_day(&slot.start_time);
        slot.end_time = clamp_time_of_day(&slot.end_time);
    }
    slots.sort_by(|a, b| {
        a.weekday.cmp(&b.weekday).then_with(|| minutes_of(&a.start_time).cmp(&minutes_of(&b.start_time)))
    });
    slots
}

fn minutes_of(raw: &str) -> u32 {
    parse_time_of_day(raw).map(|t| t.hour() * 60 + t.minute()).unwrap_or(0)
}
