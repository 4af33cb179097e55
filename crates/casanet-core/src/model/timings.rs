use chrono::{DateTime, Utc};

use super::{DaysOptions, Timing, TimingProperties, TimingTypes};
use crate::error::CoreError;

/// A duration split into clock parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hms {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

/// Split a millisecond duration. `None` and zero give all zeros.
pub fn ms_to_hms(ms: Option<u64>) -> Hms {
    let Some(ms) = ms.filter(|ms| *ms > 0) else {
        return Hms::default();
    };
    let total_seconds = ms / 1000;
    Hms {
        hours: total_seconds / 3600,
        minutes: (total_seconds / 60) % 60,
        seconds: total_seconds % 60,
    }
}

/// Remove `day` when selected, append it otherwise. Returns a new list.
pub fn toggle_day(days: &[DaysOptions], day: DaysOptions) -> Vec<DaysOptions> {
    if days.contains(&day) {
        days.iter().copied().filter(|d| *d != day).collect()
    } else {
        let mut next = days.to_vec();
        next.push(day);
        next
    }
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::ValidationFailed {
        message: message.into(),
    }
}

/// Check a timing before it is sent to the hub.
///
/// The populated properties branch must match `timing_type`, times must
/// be on the clock and durations in range.
pub fn validate_timing(timing: &Timing) -> Result<(), CoreError> {
    if timing.timing_id.trim().is_empty() {
        return Err(invalid("timing id is empty"));
    }
    if timing.minion_id.trim().is_empty() {
        return Err(invalid("timing has no minion"));
    }

    let props = &timing.timing_properties;
    match props.kind() {
        Some(kind) if kind == timing.timing_type => {}
        Some(kind) => {
            return Err(invalid(format!(
                "properties describe a {kind} timing but the type is {}",
                timing.timing_type
            )));
        }
        None => {
            return Err(invalid(format!(
                "exactly one schedule must be set for a {} timing",
                timing.timing_type
            )));
        }
    }

    if let Some(ref sun) = props.daily_sun_trigger {
        if sun.duration_minutes < 0 {
            return Err(invalid("sun trigger offset must not be negative"));
        }
    }
    if let Some(ref daily) = props.daily_time_trigger {
        if daily.hour > 23 {
            return Err(invalid(format!("hour {} is out of range", daily.hour)));
        }
        if daily.minutes > 59 {
            return Err(invalid(format!("minutes {} is out of range", daily.minutes)));
        }
    }
    if let Some(ref timeout) = props.timeout {
        if timeout.duration_in_minutes < 1 {
            return Err(invalid("timeout must last at least one minute"));
        }
    }
    Ok(())
}

fn days_label(days: &[DaysOptions]) -> String {
    if days.len() == 7 {
        return "every day".into();
    }
    if days.is_empty() {
        return "no days".into();
    }
    days.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

fn date_label(epoch_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
        .map_or_else(|| epoch_ms.to_string(), |d| d.format("%Y-%m-%d %H:%M UTC").to_string())
}

/// One-line human description of when a timing fires.
pub fn describe_schedule(timing: &Timing) -> String {
    let TimingProperties {
        daily_sun_trigger,
        daily_time_trigger,
        once,
        timeout,
    } = &timing.timing_properties;

    match timing.timing_type {
        TimingTypes::DailySunTrigger => daily_sun_trigger.as_ref().map_or_else(String::new, |s| {
            if s.duration_minutes == 0 {
                format!("at {} on {}", s.sun_trigger, days_label(&s.days))
            } else {
                format!(
                    "{}m after {} on {}",
                    s.duration_minutes,
                    s.sun_trigger,
                    days_label(&s.days)
                )
            }
        }),
        TimingTypes::DailyTimeTrigger => daily_time_trigger.as_ref().map_or_else(String::new, |d| {
            format!("{:02}:{:02} on {}", d.hour, d.minutes, days_label(&d.days))
        }),
        TimingTypes::Once => once
            .as_ref()
            .map_or_else(String::new, |o| format!("once at {}", date_label(o.date))),
        TimingTypes::Timeout => timeout.as_ref().map_or_else(String::new, |t| {
            format!(
                "{}m after {}",
                t.duration_in_minutes,
                date_label(t.start_date)
            )
        }),
    }
}
