//! Plain-text rendering of the console panels.

use std::fmt::Write;

use client_core::{
    audit_log::{LogsPanel, RiskTier},
    metrics::{MetricsBar, PanelState, StatsPanel},
    types::{Notification, Theme},
    workflow::SubmissionState,
};

const BAR_WIDTH: usize = 20;

pub fn header(clock: Option<&str>, theme: Theme) -> String {
    let theme = match theme {
        Theme::Dark => "dark",
        Theme::Light => "light",
    };
    match clock {
        Some(time) => format!("SOVEREIGN DOCUMENT SCANNER | {time} UTC | theme: {theme}"),
        None => format!("SOVEREIGN DOCUMENT SCANNER | theme: {theme}"),
    }
}

pub fn metrics_bar(bar: &MetricsBar) -> String {
    format!(
        "PII Redacted: {} entities | Sovereignty Preserved: {}% | Utility Preserved (Token Similarity): {}%",
        bar.total_redacted, bar.sovereignty_percent, bar.utility_percent
    )
}

fn percent_bar(percent: u64) -> String {
    let filled = (percent.min(100) as usize * BAR_WIDTH + 50) / 100;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

pub fn traffic_panel(panel: &StatsPanel) -> String {
    let summary = match panel {
        PanelState::Loading => return "TRAFFIC ANALYSIS\n  Loading SOC metrics...\n".to_string(),
        PanelState::Failed(message) => return format!("TRAFFIC ANALYSIS\n  {message}\n"),
        PanelState::Ready(summary) => summary,
    };

    let mut out = String::from("TRAFFIC ANALYSIS\n");
    let _ = writeln!(out, "  Total requests: {}", summary.total_requests);
    let _ = writeln!(out, "  Blocked:        {}", summary.blocked_count);
    let _ = writeln!(
        out,
        "  Sovereign:      [{}] {}%",
        percent_bar(summary.sovereignty_percent.into()),
        summary.sovereignty_percent
    );
    let _ = writeln!(
        out,
        "  Cloud:          [{}] {}%",
        percent_bar(summary.cloud_percent.into()),
        summary.cloud_percent
    );
    let _ = writeln!(out, "  Risk distribution:");
    for share in &summary.risk {
        let _ = writeln!(
            out,
            "    {:<8} [{}] {} ({}%)",
            share.level.as_str(),
            percent_bar(share.rounded_percent()),
            share.count,
            share.rounded_percent()
        );
    }
    out
}

fn tier_marker(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::Critical => "!!",
        RiskTier::Warning => "! ",
        RiskTier::Neutral => "  ",
    }
}

pub fn logs_panel(panel: &LogsPanel) -> String {
    let view = match panel {
        PanelState::Loading => return "AUDIT LOG\n  Loading audit log...\n".to_string(),
        PanelState::Failed(message) => return format!("AUDIT LOG\n  {message}\n"),
        PanelState::Ready(view) => view,
    };

    let mut out = format!("AUDIT LOG ({} ENTRIES)\n", view.total());
    if view.entries.is_empty() {
        out.push_str("  No audit events recorded.\n");
        return out;
    }
    let _ = writeln!(
        out,
        "  {:<12} {:<19} {:<10} {:<12} {:<12} RISK",
        "EVENT", "TIMESTAMP", "ROLE", "ACTION", "DESTINATION"
    );
    for entry in &view.entries {
        let _ = writeln!(
            out,
            "  {:<12} {:<19} {:<10} {:<12} {:<12} {}{}",
            entry.event_id.as_str(),
            entry.timestamp,
            entry.user_role,
            entry.policy_action,
            entry.destination.label(),
            tier_marker(entry.risk_tier),
            entry.risk_level
        );
    }
    out
}

pub fn submission(state: &SubmissionState) -> String {
    let mut out = String::new();
    match state {
        SubmissionState::Idle => {
            out.push_str("Policy enforcement: AWAITING INPUT\n");
        }
        SubmissionState::Reading { document, .. } | SubmissionState::Submitting { document, .. } => {
            let _ = writeln!(out, "Untrusted input: {}", document.file_name());
            out.push_str("Policy enforcement: Scanning...\n");
        }
        SubmissionState::Processed {
            file_name,
            preview,
            result,
            ..
        } => {
            let kind = match preview {
                Some(preview) if preview.is_image() => " (image)",
                Some(_) => " (document)",
                None => "",
            };
            let _ = writeln!(out, "Untrusted input: {file_name}{kind}");
            let _ = writeln!(out, "Policy enforcement: {}", result.route.display_label());
            let _ = writeln!(out, "Privacy action: {}", result.privacy_action);
            let _ = writeln!(out, "Original snippet:\n{}", indent(&result.original_snippet));
            let _ = writeln!(out, "Trusted output:\n{}", indent(&result.safe_output));
        }
    }
    out
}

pub fn notification(notification: &Notification) -> String {
    format!("{}: {}", notification.title, notification.description)
}

fn indent(text: &str) -> String {
    if text.is_empty() {
        return "  (empty)".to_string();
    }
    text.lines()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::{
        audit_log::build_view,
        metrics::{summarize, DEFAULT_SOVEREIGNTY_PERCENT, UTILITY_PERCENT},
        types::ScanResult,
        workflow::RequestToken,
    };
    use shared::{
        domain::RouteDecision,
        protocol::{AuditLogEntry, TrafficStats},
    };

    #[test]
    fn metrics_bar_lists_all_three_figures() {
        let bar = MetricsBar::new(147, &PanelState::Loading);
        assert_eq!(bar.sovereignty_percent, DEFAULT_SOVEREIGNTY_PERCENT);
        let line = metrics_bar(&bar);
        assert!(line.contains("147 entities"));
        assert!(line.contains("85%"));
        assert!(line.contains(&format!("{UTILITY_PERCENT}%")));
    }

    #[test]
    fn percent_bar_is_fixed_width() {
        assert_eq!(percent_bar(0), ".".repeat(BAR_WIDTH));
        assert_eq!(percent_bar(100), "#".repeat(BAR_WIDTH));
        assert_eq!(percent_bar(250), "#".repeat(BAR_WIDTH));
        assert_eq!(percent_bar(50).matches('#').count(), BAR_WIDTH / 2);
    }

    #[test]
    fn traffic_panel_shows_each_load_state() {
        assert!(traffic_panel(&PanelState::Loading).contains("Loading SOC metrics"));
        assert!(traffic_panel(&PanelState::Failed("audit store offline".into()))
            .contains("audit store offline"));

        let stats = TrafficStats {
            total_requests: 200,
            blocked_count: 9,
            sovereign_count: 170,
            risk_distribution: [("LOW".to_string(), 150), ("HIGH".to_string(), 50)]
                .into_iter()
                .collect(),
        };
        let text = traffic_panel(&PanelState::Ready(summarize(&stats)));
        assert!(text.contains("Total requests: 200"));
        assert!(text.contains("85%"));
        assert!(text.contains("15%"));
        assert!(text.contains("LOW"));
        assert!(text.contains("150 (75%)"));
        assert!(text.contains("CRITICAL"));
        assert!(text.contains("0 (0%)"));
    }

    #[test]
    fn logs_panel_counts_entries_and_marks_critical_rows() {
        let entries = vec![
            AuditLogEntry {
                event_id: "evt-1".into(),
                timestamp_utc: "2024-05-01T09:30:00Z".into(),
                user_role: "nurse".into(),
                policy_action: "BLOCK".into(),
                routing_decision: "SAFE_MODE".into(),
                detected_risk_level: "CRITICAL".into(),
            },
            AuditLogEntry {
                event_id: "evt-2".into(),
                routing_decision: "CLOUD_LLM".into(),
                detected_risk_level: "LOW".into(),
                ..AuditLogEntry::default()
            },
        ];
        let text = logs_panel(&PanelState::Ready(build_view(&entries)));
        assert!(text.starts_with("AUDIT LOG (2 ENTRIES)"));
        let rows: Vec<&str> = text.lines().skip(2).collect();
        assert!(rows[0].contains("evt-1"));
        assert!(rows[0].contains("01/05/2024 09:30:00"));
        assert!(rows[0].contains("!!CRITICAL"));
        assert!(rows[1].contains("evt-2"));

        let empty = logs_panel(&PanelState::Ready(build_view(&[])));
        assert!(empty.contains("0 ENTRIES"));
        assert!(empty.contains("No audit events recorded."));
    }

    #[test]
    fn submission_renders_route_label() {
        assert!(submission(&SubmissionState::Idle).contains("AWAITING INPUT"));

        let state = SubmissionState::Processed {
            token: RequestToken(1),
            file_name: "scan.pdf".into(),
            preview: None,
            result: ScanResult {
                original_snippet: "Name: John".into(),
                safe_output: "Name: [REDACTED]".into(),
                privacy_action: "ALLOW_CLOUD".into(),
                route: RouteDecision::Cloud,
            },
        };
        let text = submission(&state);
        assert!(text.contains("Untrusted input: scan.pdf"));
        assert!(text.contains("CLOUD (Azure OpenAI)"));
        assert!(text.contains("  Name: [REDACTED]"));
    }

    #[test]
    fn header_includes_clock_when_mounted() {
        assert_eq!(
            header(Some("07:05:03"), Theme::Dark),
            "SOVEREIGN DOCUMENT SCANNER | 07:05:03 UTC | theme: dark"
        );
        assert!(!header(None, Theme::Light).contains("UTC"));
    }
}
