//! Desktop notifications for elapsed-time alerts.

use std::process::Command;

use anyhow::{Context, Result, bail};
use timetrack_core::{Alert, Notifier};

const APP_NAME: &str = "Time Tracker";

/// Shows alerts with `osascript` on macOS and `notify-send` elsewhere.
///
/// When the platform tool is missing or fails, the alert is logged and
/// written to stderr instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, alert: &Alert) {
        match send(alert) {
            Ok(()) => tracing::debug!(title = %alert.title, "notification sent"),
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "desktop notification failed");
                eprintln!("ALERT: {}\n{}", alert.title, alert.message);
            }
        }
    }
}

fn send(alert: &Alert) -> Result<()> {
    let (program, output) = if cfg!(target_os = "macos") {
        let output = Command::new("osascript")
            .arg("-e")
            .arg(apple_script(alert))
            .output();
        ("osascript", output)
    } else {
        let output = Command::new("notify-send")
            .arg("--urgency=normal")
            .arg(format!("--app-name={APP_NAME}"))
            .arg("--icon=clock")
            .arg(&alert.title)
            .arg(&alert.message)
            .output();
        ("notify-send", output)
    };
    let output = output.with_context(|| format!("failed to run {program}"))?;
    if !output.status.success() {
        bail!(
            "{program} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

fn apple_script(alert: &Alert) -> String {
    format!(
        "display notification {} with title {} sound name \"default\"",
        apple_quote(&alert.message),
        apple_quote(&alert.title)
    )
}

fn apple_quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    #[test]
    fn apple_script_escapes_quotes() {
        let alert = Alert {
            title: "Time Tracker Alert".to_string(),
            message: "Expected time reached for \"api\"\\ops".to_string(),
        };
        assert_snapshot!(
            apple_script(&alert),
            @r#"display notification "Expected time reached for \"api\"\\ops" with title "Time Tracker Alert" sound name "default""#
        );
    }
}
