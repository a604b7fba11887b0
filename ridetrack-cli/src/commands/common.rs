//! Common types and utilities shared across CLI commands.

use clap::ValueEnum;
use ridetrack::maps::EtaResult;
use ridetrack::realtime::Role;
use ridetrack::session::SessionView;

/// Role selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum RoleArg {
    /// Passenger: streams location and follows a route
    Rider,
    /// Driver: also receives job assignments
    Driver,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Rider => Role::Rider,
            RoleArg::Driver => Role::Driver,
        }
    }
}

/// One-line ETA description.
pub fn format_eta(eta: &EtaResult) -> String {
    if !eta.success {
        return format!(
            "unavailable ({})",
            eta.error.as_deref().unwrap_or("no route")
        );
    }
    let mut line = format!("{} / {}", eta.effective_duration_text(), eta.distance_text);
    if let Some(traffic) = eta.traffic_level() {
        line.push_str(&format!(" [{}]", traffic));
    }
    line
}

/// Mask all but the last four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}

/// Lines describing the parts of `view` that differ from `previous`.
pub fn describe_changes(previous: &SessionView, view: &SessionView) -> Vec<String> {
    let mut lines = Vec::new();

    if view.permission != previous.permission {
        lines.push(format!("permission: {}", view.permission));
    }
    if view.connection != previous.connection {
        lines.push(format!("channel: {}", view.connection));
    }
    if view.fix != previous.fix {
        if let Some(fix) = &view.fix {
            let speed = fix
                .speed()
                .map(|s| format!(" {:.1} m/s", s))
                .unwrap_or_default();
            lines.push(format!(
                "fix: {:.6},{:.6} ±{:.0}m{}",
                fix.latitude(),
                fix.longitude(),
                fix.accuracy(),
                speed
            ));
        }
    }
    if view.origin_address != previous.origin_address {
        if let Some(address) = &view.origin_address {
            lines.push(format!("from: {}", address));
        }
    }
    if view.destination_address != previous.destination_address {
        if let Some(address) = &view.destination_address {
            lines.push(format!("to: {}", address));
        }
    }
    if view.eta != previous.eta {
        if let Some(eta) = &view.eta {
            lines.push(format!("eta: {}", format_eta(eta)));
        }
    }
    if view.route != previous.route {
        if let Some(route) = &view.route {
            lines.push(format!("route: {} points", route.points.len()));
        }
    }
    if view.job != previous.job {
        if let Some(job) = &view.job {
            lines.push(format!(
                "job: pickup {} -> {}",
                job.pickup.address.as_deref().unwrap_or("?"),
                job.destination.address.as_deref().unwrap_or("?"),
            ));
        }
    }
    if view.job_eta != previous.job_eta {
        if let Some(job_eta) = &view.job_eta {
            lines.push(format!(
                "job eta: pickup {}, trip {}",
                format_eta(&job_eta.to_pickup),
                format_eta(&job_eta.to_destination)
            ));
        }
    }
    if view.last_message != previous.last_message {
        if let Some(message) = &view.last_message {
            lines.push(format!("message: {}", message));
        }
    }
    if view.location_error != previous.location_error {
        if let Some(e) = &view.location_error {
            lines.push(format!("location error: {}", e));
        }
    }
    if view.config_error != previous.config_error {
        if let Some(e) = &view.config_error {
            lines.push(format!("config error: {}", e));
        }
    }
    if view.route_unavailable && !previous.route_unavailable {
        lines.push("route unavailable".to_string());
    }

    lines
}
