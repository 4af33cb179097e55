// Timing (schedule) wire types
//
// A timing fires a minion action on a schedule. Exactly one branch of
// `TimingProperties` is populated, selected by `Timing::timing_type`.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::minion::MinionStatus;

/// Schedule kinds supported by the hub.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum TimingTypes {
    DailySunTrigger,
    DailyTimeTrigger,
    Once,
    Timeout,
}

/// Day-of-week selector for the daily schedules.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DaysOptions {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SunTriggerOptions {
    Sunrise,
    Sunset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySunTrigger {
    pub sun_trigger: SunTriggerOptions,
    #[serde(default)]
    pub days: Vec<DaysOptions>,
    /// Offset from the sun event, in minutes.
    #[serde(default)]
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTimeTrigger {
    pub hour: u32,
    pub minutes: u32,
    #[serde(default)]
    pub days: Vec<DaysOptions>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnceTiming {
    /// Epoch milliseconds.
    pub date: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeoutTiming {
    /// Epoch milliseconds.
    pub start_date: i64,
    pub duration_in_minutes: i64,
}

/// Schedule parameters. Only the branch matching the timing type is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_sun_trigger: Option<DailySunTrigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_time_trigger: Option<DailyTimeTrigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub once: Option<OnceTiming>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<TimeoutTiming>,
}

impl TimingProperties {
    pub fn daily_sun(sun_trigger: SunTriggerOptions, duration_minutes: i64, days: &[DaysOptions]) -> Self {
        Self {
            daily_sun_trigger: Some(DailySunTrigger {
                sun_trigger,
                days: days.to_vec(),
                duration_minutes,
            }),
            ..Self::default()
        }
    }

    pub fn daily_time(hour: u32, minutes: u32, days: &[DaysOptions]) -> Self {
        Self {
            daily_time_trigger: Some(DailyTimeTrigger {
                hour,
                minutes,
                days: days.to_vec(),
            }),
            ..Self::default()
        }
    }

    pub fn once(date_ms: i64) -> Self {
        Self {
            once: Some(OnceTiming { date: date_ms }),
            ..Self::default()
        }
    }

    pub fn timeout(start_date_ms: i64, duration_in_minutes: i64) -> Self {
        Self {
            timeout: Some(TimeoutTiming {
                start_date: start_date_ms,
                duration_in_minutes,
            }),
            ..Self::default()
        }
    }

    /// The timing type implied by whichever branch is populated.
    ///
    /// Returns `None` when zero or several branches are set.
    pub fn kind(&self) -> Option<TimingTypes> {
        let present = [
            self.daily_sun_trigger.as_ref().map(|_| TimingTypes::DailySunTrigger),
            self.daily_time_trigger.as_ref().map(|_| TimingTypes::DailyTimeTrigger),
            self.once.as_ref().map(|_| TimingTypes::Once),
            self.timeout.as_ref().map(|_| TimingTypes::Timeout),
        ];
        let mut kinds = present.into_iter().flatten();
        match (kinds.next(), kinds.next()) {
            (Some(kind), None) => Some(kind),
            _ => None,
        }
    }
}

/// A scheduled minion action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    pub timing_id: String,
    #[serde(default)]
    pub timing_name: String,
    pub minion_id: String,
    #[serde(default)]
    pub is_active: bool,
    pub timing_type: TimingTypes,
    #[serde(default)]
    pub timing_properties: TimingProperties,
    /// Status to apply to the minion when the timing fires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_direct_action: Option<MinionStatus>,
}

/// Push-feed notification: a timing fired.
///
/// `results` is whatever the hub reports about the triggered action;
/// it is passed through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingFeed {
    pub timing: Timing,
    #[serde(default)]
    pub results: serde_json::Value,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_daily_sun_timing() {
        let json = r#"{
            "timingId": "t1",
            "timingName": "Porch at dusk",
            "minionId": "m1",
            "isActive": true,
            "timingType": "dailySunTrigger",
            "timingProperties": {
                "dailySunTrigger": {
                    "sunTrigger": "sunset",
                    "days": ["monday", "friday"],
                    "durationMinutes": -15
                }
            },
            "triggerDirectAction": { "toggle": { "status": "on" } }
        }"#;

        let timing: Timing = serde_json::from_str(json).unwrap();
        assert_eq!(timing.timing_type, TimingTypes::DailySunTrigger);
        let sun = timing.timing_properties.daily_sun_trigger.as_ref().unwrap();
        assert_eq!(sun.sun_trigger, SunTriggerOptions::Sunset);
        assert_eq!(sun.days, vec![DaysOptions::Monday, DaysOptions::Friday]);
        assert_eq!(sun.duration_minutes, -15);
        assert_eq!(timing.timing_properties.kind(), Some(TimingTypes::DailySunTrigger));
        assert!(timing.trigger_direct_action.is_some());
    }

    #[test]
    fn properties_serialize_only_the_set_branch() {
        let props = TimingProperties::timeout(1_700_000_000_000, 5);
        let value = serde_json::to_value(&props).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "timeout": { "startDate": 1_700_000_000_000_i64, "durationInMinutes": 5 } })
        );
    }

    #[test]
    fn kind_is_none_for_ambiguous_properties() {
        let mut props = TimingProperties::once(0);
        props.timeout = Some(TimeoutTiming {
            start_date: 0,
            duration_in_minutes: 1,
        });
        assert_eq!(props.kind(), None);
        assert_eq!(TimingProperties::default().kind(), None);
    }

    #[test]
    fn feed_without_results_defaults_to_null() {
        let json = r#"{ "timing": {
            "timingId": "t9", "minionId": "m2", "timingType": "once",
            "timingProperties": { "once": { "date": 1 } }
        } }"#;
        let feed: TimingFeed = serde_json::from_str(json).unwrap();
        assert_eq!(feed.timing.timing_id, "t9");
        assert!(feed.results.is_null());
        assert!(!feed.timing.is_active);
    }

    #[test]
    fn day_names_parse_case_insensitively() {
        assert_eq!("Monday".parse::<DaysOptions>().unwrap(), DaysOptions::Monday);
        assert_eq!(DaysOptions::Saturday.to_string(), "saturday");
        assert_eq!(TimingTypes::DailyTimeTrigger.to_string(), "dailyTimeTrigger");
    }
}
