//! Timing command handlers.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tabled::Tabled;
use tokio::sync::broadcast::error::RecvError;

use casanet_core::model::{SunTriggerOptions, describe_schedule};
use casanet_core::{
    DaysOptions, Hub, Minion, MinionStatus, SwitchOptions, Timing, TimingFeed, TimingProperties,
    TimingTypes, new_timing_id,
};

use crate::cli::{
    GlobalOpts, OutputFormat, PowerArg, SunArg, TimingCreateArgs, TimingsArgs, TimingsCommand,
};
use crate::error::CliError;
use crate::output;

use super::util;

const ALL_DAYS: [DaysOptions; 7] = [
    DaysOptions::Sunday,
    DaysOptions::Monday,
    DaysOptions::Tuesday,
    DaysOptions::Wednesday,
    DaysOptions::Thursday,
    DaysOptions::Friday,
    DaysOptions::Saturday,
];

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct TimingRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Minion")]
    minion: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Active")]
    active: String,
    #[tabled(rename = "Schedule")]
    schedule: String,
}

fn timing_row(t: &Timing, minion_names: &HashMap<&str, &str>, color: bool) -> TimingRow {
    TimingRow {
        id: t.timing_id.clone(),
        name: t.timing_name.clone(),
        minion: minion_names
            .get(t.minion_id.as_str())
            .map_or_else(|| t.minion_id.clone(), |n| (*n).to_owned()),
        kind: t.timing_type.to_string(),
        active: output::power_label(t.is_active, color),
        schedule: describe_schedule(t),
    }
}

fn detail(t: &Timing, minion_names: &HashMap<&str, &str>) -> String {
    let minion = minion_names
        .get(t.minion_id.as_str())
        .map_or_else(|| t.minion_id.clone(), |n| format!("{n} ({})", t.minion_id));
    let action = t
        .trigger_direct_action
        .as_ref()
        .map_or_else(|| "-".to_owned(), describe_action);
    [
        format!("ID:       {}", t.timing_id),
        format!("Name:     {}", t.timing_name),
        format!("Minion:   {minion}"),
        format!("Type:     {}", t.timing_type),
        format!("Active:   {}", t.is_active),
        format!("Schedule: {}", describe_schedule(t)),
        format!("Action:   {action}"),
    ]
    .join("\n")
}

/// `switch: on`, `light: off`, ... for the populated status branches.
fn describe_action(status: &MinionStatus) -> String {
    serde_json::to_value(status)
        .ok()
        .and_then(|v| {
            v.as_object().map(|branches| {
                branches
                    .iter()
                    .map(|(kind, body)| {
                        let state = body.get("status").and_then(|s| s.as_str()).unwrap_or("?");
                        format!("{kind}: {state}")
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            })
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "-".into())
}

fn minion_names(minions: &[Minion]) -> HashMap<&str, &str> {
    minions
        .iter()
        .map(|m| (m.minion_id.as_str(), m.name.as_str()))
        .collect()
}

// ── Timing construction ─────────────────────────────────────────────

fn invalid(field: &str, reason: impl Into<String>) -> CliError {
    CliError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

fn parse_days(raw: &[String]) -> Result<Vec<DaysOptions>, CliError> {
    if raw.is_empty() {
        return Ok(ALL_DAYS.to_vec());
    }
    let mut days = raw
        .iter()
        .map(|d| {
            d.trim()
                .parse::<DaysOptions>()
                .map_err(|_| invalid("days", format!("unknown day '{d}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    days.sort();
    days.dedup();
    Ok(days)
}

fn parse_clock(raw: &str) -> Result<(u32, u32), CliError> {
    let bad = || invalid("daily", format!("expected HH:MM, got '{raw}'"));
    let (hour, minutes) = raw.split_once(':').ok_or_else(bad)?;
    let hour: u32 = hour.trim().parse().map_err(|_| bad())?;
    let minutes: u32 = minutes.trim().parse().map_err(|_| bad())?;
    Ok((hour, minutes))
}

/// Schedule branch and type selected by the create flags.
fn schedule(
    args: &TimingCreateArgs,
    now: DateTime<Utc>,
) -> Result<(TimingTypes, TimingProperties), CliError> {
    if let Some(ref raw) = args.once {
        let at = DateTime::parse_from_rfc3339(raw)
            .map_err(|e| invalid("once", format!("'{raw}' is not an RFC 3339 date-time: {e}")))?;
        return Ok((TimingTypes::Once, TimingProperties::once(at.timestamp_millis())));
    }
    if let Some(ref raw) = args.daily {
        let (hour, minutes) = parse_clock(raw)?;
        let days = parse_days(&args.days)?;
        return Ok((
            TimingTypes::DailyTimeTrigger,
            TimingProperties::daily_time(hour, minutes, &days),
        ));
    }
    if let Some(sun) = args.sun {
        let trigger = match sun {
            SunArg::Sunrise => SunTriggerOptions::Sunrise,
            SunArg::Sunset => SunTriggerOptions::Sunset,
        };
        let days = parse_days(&args.days)?;
        return Ok((
            TimingTypes::DailySunTrigger,
            TimingProperties::daily_sun(trigger, args.offset, &days),
        ));
    }
    if let Some(minutes) = args.after {
        return Ok((
            TimingTypes::Timeout,
            TimingProperties::timeout(now.timestamp_millis(), minutes),
        ));
    }
    Err(invalid(
        "schedule",
        "one of --once, --daily, --sun or --after is required",
    ))
}

/// Build the timing a `timings create` invocation describes.
fn build_timing(
    args: &TimingCreateArgs,
    minion: &Minion,
    now: DateTime<Utc>,
) -> Result<Timing, CliError> {
    let (timing_type, timing_properties) = schedule(args, now)?;

    let mut action = MinionStatus::default_for(minion.minion_type);
    let state = match args.action {
        PowerArg::On => SwitchOptions::On,
        PowerArg::Off => SwitchOptions::Off,
    };
    action.set_switch_state(minion.minion_type, state);

    Ok(Timing {
        timing_id: new_timing_id(),
        timing_name: args.name.clone(),
        minion_id: minion.minion_id.clone(),
        is_active: !args.inactive,
        timing_type,
        timing_properties,
        trigger_direct_action: Some(action),
    })
}

// ── Feed ────────────────────────────────────────────────────────────

fn feed_line(event: &TimingFeed, format: &OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact => {
            serde_json::to_string(event).map_err(|e| CliError::Render(e.to_string()))
        }
        OutputFormat::Plain => Ok(event.timing.timing_id.clone()),
        OutputFormat::Table | OutputFormat::Yaml => {
            let name = if event.timing.timing_name.is_empty() {
                &event.timing.timing_id
            } else {
                &event.timing.timing_name
            };
            Ok(format!(
                "{} fired {name} ({})",
                Utc::now().format("%H:%M:%S"),
                describe_schedule(&event.timing)
            ))
        }
    }
}

async fn stream_feed(hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    let mut events = hub.timings().feed();
    util::fetch(hub.timings().data(), global).await?;
    if !hub.timings().is_feed_open() {
        return Err(CliError::Config {
            message: "the timings feed is disabled for this profile (feed = false)".into(),
        });
    }
    util::status_line(global, "Listening for timings, Ctrl-C to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            received = events.recv() => match received {
                Ok(event) => output::print_output(&feed_line(&event, &global.output)?, global.quiet),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "feed consumer fell behind");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(hub: &Hub, args: TimingsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let timings = hub.timings();

    match args.command {
        TimingsCommand::List => {
            let (list, minions) = tokio::try_join!(
                util::fetch(timings.data(), global),
                util::fetch(hub.minions().data(), global),
            )?;
            let names = minion_names(&minions);
            let out = output::render_list(
                &global.output,
                &list,
                |t| timing_row(t, &names, color),
                |t| t.timing_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TimingsCommand::Watch => {
            let minions = util::fetch(hub.minions().data(), global).await?;
            let names = minion_names(&minions);
            util::watch(hub, timings.data(), global, |list| {
                output::render_list(
                    &global.output,
                    list,
                    |t| timing_row(t, &names, color),
                    |t| t.timing_id.clone(),
                )
            })
            .await
        }

        TimingsCommand::Get { id } => {
            let (list, minions) = tokio::try_join!(
                util::fetch(timings.data(), global),
                util::fetch(hub.minions().data(), global),
            )?;
            let names = minion_names(&minions);
            let timing = util::find(&list, "timing", &id, |t| t.timing_id == id)?;
            let out = output::render_single(
                &global.output,
                timing,
                |t| detail(t, &names),
                |t| t.timing_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TimingsCommand::Create(create) => {
            let minions = util::fetch(hub.minions().data(), global).await?;
            let minion = util::find(&minions, "minion", &create.minion, |m| {
                m.minion_id == create.minion
            })?;
            let timing = build_timing(&create, minion, Utc::now())?;
            let id = timing.timing_id.clone();
            timings.create(timing).await?;
            util::status_line(global, &format!("Created timing {id}"));
            if matches!(global.output, OutputFormat::Plain) {
                output::print_output(&id, global.quiet);
            }
            Ok(())
        }

        TimingsCommand::Delete { id } => {
            let list = util::fetch(timings.data(), global).await?;
            util::find(&list, "timing", &id, |t| t.timing_id == id)?;
            if !util::confirm(&format!("Delete timing {id}?"), global.yes)? {
                return Ok(());
            }
            timings.delete(&id).await?;
            util::status_line(global, &format!("Deleted timing {id}"));
            Ok(())
        }

        TimingsCommand::Enable { id } => set_active(hub, &id, true, global).await,
        TimingsCommand::Disable { id } => set_active(hub, &id, false, global).await,

        TimingsCommand::Feed => stream_feed(hub, global).await,
    }
}

async fn set_active(hub: &Hub, id: &str, active: bool, global: &GlobalOpts) -> Result<(), CliError> {
    util::fetch(hub.timings().data(), global).await?;
    hub.timings().set_active(id, active).await?;
    let verb = if active { "Enabled" } else { "Disabled" };
    util::status_line(global, &format!("{verb} timing {id}"));
    Ok(())
}
