//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast::error::RecvError;

use casanet_core::{DataService, FetchOutcome, Hub, NotificationLevel};

use crate::cli::GlobalOpts;
use crate::error::{CliError, list_command};
use crate::output;

/// Spinner on stderr while a request is in flight, hidden when piped.
fn spinner(message: &str, quiet: bool) -> Option<ProgressBar> {
    if quiet || !std::io::stderr().is_terminal() {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::default_spinner());
    bar.set_message(message.to_owned());
    bar.enable_steady_tick(Duration::from_millis(80));
    Some(bar)
}

/// Fetch a fresh collection from the hub.
///
/// A superseded fetch falls back to the cache, which the newer fetch
/// has already filled.
pub async fn fetch<T>(service: &DataService<T>, global: &GlobalOpts) -> Result<Arc<Vec<T>>, CliError>
where
    T: Send + Sync + 'static,
{
    let bar = spinner(&format!("Fetching {}", service.resource()), global.quiet);
    let outcome = service.refresh().await;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    match outcome? {
        FetchOutcome::Applied(data) => Ok(data),
        FetchOutcome::Superseded => Ok(service.cached().unwrap_or_default()),
    }
}

/// Find one item in a collection or report it with a hint.
pub fn find<'a, T>(
    items: &'a [T],
    resource_type: &str,
    identifier: &str,
    matches: impl Fn(&T) -> bool,
) -> Result<&'a T, CliError> {
    items
        .iter()
        .find(|item| matches(item))
        .ok_or_else(|| CliError::NotFound {
            resource_type: resource_type.into(),
            identifier: identifier.into(),
            list_command: list_command(resource_type),
        })
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Print a status line on stderr, unless quiet.
pub fn status_line(global: &GlobalOpts, message: &str) {
    if !global.quiet {
        eprintln!("{message}");
    }
}

/// Re-render `service` on every publish until Ctrl-C.
///
/// Fetch failures and hub notifications are reported on stderr; the
/// loop keeps going with the last good collection.
pub async fn watch<T>(
    hub: &Hub,
    service: &DataService<T>,
    global: &GlobalOpts,
    render: impl Fn(&[T]) -> Result<String, CliError>,
) -> Result<(), CliError>
where
    T: Send + Sync + 'static,
{
    let color = output::should_color(&global.color);
    let mut notifications = hub.notifications();
    let mut status = service.status();
    let mut stream = service.stream();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            next = stream.next() => {
                let Some(items) = next else { break };
                output::print_output(&render(&items)?, global.quiet);
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = status.borrow_and_update().clone();
                if let (false, Some(error)) = (current.loading, current.error) {
                    eprintln!("{} {error}", output::error_label("fetch failed:", color));
                }
            }
            received = notifications.recv() => match received {
                Ok(notification) => {
                    let label = match notification.level {
                        NotificationLevel::Error => output::error_label("error:", color),
                        level => format!("{level}:"),
                    };
                    eprintln!("{label} {}", notification.message);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "notifications lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
    Ok(())
}
