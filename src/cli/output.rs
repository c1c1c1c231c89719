// Output formatting utilities

use chrono::{DateTime, TimeZone};
use std::io::IsTerminal;
use crate::models::{Board, CallStatus, Column, FollowUpAlerts, FollowUpUrgency, Lead, Stage, StageId, Statistics};
use crate::utils::{format_datetime, format_phone, initials, truncate};

// ANSI escape codes for terminal formatting
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_DIM: &str = "\x1b[2m";
const ANSI_RESET: &str = "\x1b[0m";

const ANSI_FG_RED: &str = "\x1b[31m";
const ANSI_FG_GREEN: &str = "\x1b[32m";
const ANSI_FG_YELLOW: &str = "\x1b[33m";
const ANSI_FG_BLUE: &str = "\x1b[34m";
const ANSI_FG_BRIGHT_BLACK: &str = "\x1b[90m";

/// Check if stdout is a terminal (TTY)
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width dynamically
///
/// Uses the `terminal_size` crate for reliable detection, with fallback to
/// COLUMNS environment variable and a sensible default.
pub fn get_terminal_width() -> usize {
    if let Some((terminal_size::Width(w), _)) = terminal_size::terminal_size() {
        if w > 0 {
            return w as usize;
        }
    }

    if let Ok(cols) = std::env::var("COLUMNS") {
        if let Ok(width) = cols.parse::<usize>() {
            if width > 0 && width < 10000 {
                return width;
            }
        }
    }

    120
}

fn bold_if_tty(text: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", ANSI_BOLD, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

fn paint(text: &str, code: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", code, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

/// Parse `#rgb` / `#rrggbb` into components
fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim().strip_prefix('#')?;
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Truecolor foreground for a stage colour; falls back to bold when unparseable
fn stage_color(text: &str, hex: &str, is_tty: bool) -> String {
    if !is_tty {
        return text.to_string();
    }
    match hex_to_rgb(hex) {
        Some((r, g, b)) => format!("\x1b[1;38;2;{};{};{}m{}{}", r, g, b, text, ANSI_RESET),
        None => bold_if_tty(text, true),
    }
}

fn urgency_color(urgency: &FollowUpUrgency) -> &'static str {
    match urgency {
        FollowUpUrgency::Overdue(_) => ANSI_FG_RED,
        FollowUpUrgency::Today => ANSI_FG_YELLOW,
        FollowUpUrgency::Soon(_) => ANSI_FG_BLUE,
        FollowUpUrgency::Planned(_) => ANSI_FG_BRIGHT_BLACK,
    }
}

fn call_status_color(status: CallStatus) -> &'static str {
    match status {
        CallStatus::Answered | CallStatus::ClientAnswered => ANSI_FG_GREEN,
        CallStatus::NotAnswered | CallStatus::ClientNotAnswered => ANSI_FG_RED,
        CallStatus::Unknown => ANSI_DIM,
    }
}

/// Options for board rendering
pub struct BoardView<'a, Tz: TimeZone> {
    pub now: &'a DateTime<Tz>,
    /// Narrows the forms column to one source form
    pub form_filter: Option<i64>,
    pub width: usize,
    pub is_tty: bool,
}

/// One lead card: header line plus an indented detail line
pub fn format_lead_card<Tz: TimeZone>(lead: &Lead, now: &DateTime<Tz>, width: usize, is_tty: bool) -> String {
    let name = lead.display_name();
    let mut header = format!("#{:<5} [{}] {}", lead.id, initials(name), name);
    if lead.is_converted {
        header.push_str(" (converted)");
    }
    if lead.is_considering {
        header.push_str(" (considering)");
    }
    let header = truncate(&header, width.saturating_sub(2));

    let mut details = Vec::new();
    if let Some(phone) = lead.phone_number.as_deref().filter(|p| !p.trim().is_empty()) {
        details.push(format_phone(phone));
    }
    if let (Some(date), Some(urgency)) = (lead.follow_up_date.as_ref(), lead.follow_up_urgency(now)) {
        let text = format!("follow-up {} ({})", format_datetime(date), urgency.label());
        details.push(paint(&text, urgency_color(&urgency), is_tty));
    }
    if let Some(status) = lead.call_status.filter(|s| *s != CallStatus::Unknown) {
        details.push(paint(status.label(), call_status_color(status), is_tty));
    }
    if let Some(created) = lead.created_at.as_ref() {
        details.push(paint(&format!("added {}", format_datetime(created)), ANSI_DIM, is_tty));
    }

    let header = if lead.is_converted {
        paint(&header, ANSI_DIM, is_tty)
    } else {
        header
    };
    if details.is_empty() {
        format!("  {}", header)
    } else {
        format!("  {}\n         {}", header, details.join("  "))
    }
}

fn format_column<Tz: TimeZone>(column: &Column, index: usize, view: &BoardView<'_, Tz>) -> String {
    let items = column.visible_items(view.form_filter);
    let title = format!("{} ({})", column.stage.name, items.len());
    let mut lines = vec![stage_color(&title, column.stage.display_color(index), view.is_tty)];
    if column.is_forms_column() {
        if let Some(form) = view.form_filter {
            lines.push(paint(&format!("  form #{} only", form), ANSI_DIM, view.is_tty));
        }
    }
    if items.is_empty() {
        lines.push(paint("  (empty)", ANSI_DIM, view.is_tty));
    }
    for lead in items {
        lines.push(format_lead_card(lead, view.now, view.width, view.is_tty));
    }
    lines.join("\n")
}

/// Alert banner line, or `None` when nothing is due
pub fn format_alerts(alerts: &FollowUpAlerts, is_tty: bool) -> Option<String> {
    if alerts.is_empty() {
        return None;
    }
    let mut parts = Vec::new();
    if alerts.overdue > 0 {
        parts.push(paint(&format!("{} overdue", alerts.overdue), ANSI_FG_RED, is_tty));
    }
    if alerts.today > 0 {
        parts.push(paint(&format!("{} due today", alerts.today), ANSI_FG_YELLOW, is_tty));
    }
    if alerts.soon > 0 {
        parts.push(paint(&format!("{} due soon", alerts.soon), ANSI_FG_BLUE, is_tty));
    }
    Some(format!("Follow-ups: {}", parts.join(", ")))
}

pub fn format_statistics(stats: &Statistics, is_tty: bool) -> String {
    format!(
        "{} {}  {} {}  {} {}  {} {}",
        bold_if_tty("Total:", is_tty), stats.total,
        bold_if_tty("Today:", is_tty), stats.today,
        bold_if_tty("Converted:", is_tty), stats.converted,
        bold_if_tty("Answered:", is_tty), stats.answered,
    )
}

/// Render the whole board: statistics, alert banner, then one section per stage
pub fn format_board<Tz: TimeZone>(board: &Board, stats: &Statistics, view: &BoardView<'_, Tz>) -> String {
    let mut sections = vec![format_statistics(stats, view.is_tty)];
    if let Some(banner) = format_alerts(&board.follow_up_alerts(view.now), view.is_tty) {
        sections.push(banner);
    }
    if board.is_empty() {
        sections.push("No stages configured.".to_string());
    }
    for (index, column) in board.columns.iter().enumerate() {
        sections.push(format_column(column, index, view));
    }
    sections.join("\n\n")
}

fn stage_name(stages: &[Stage], id: StageId) -> String {
    stages.iter()
        .find(|s| s.id == id)
        .map(|s| s.name.clone())
        .unwrap_or_else(|| id.to_string())
}

pub fn format_lead_table(leads: &[Lead], stages: &[Stage], is_tty: bool) -> String {
    if leads.is_empty() {
        return "No leads found.".to_string();
    }
    let header = format!("{:<6} {:<28} {:<18} {:<16} {:<18} {:<20}",
        "ID", "Name", "Phone", "Stage", "Follow-up", "Call");
    let mut lines = vec![bold_if_tty(&header, is_tty), "-".repeat(header.len())];
    for lead in leads {
        let phone = lead.phone_number.as_deref().map(format_phone).unwrap_or_default();
        let follow_up = lead.follow_up_date.as_ref().map(format_datetime).unwrap_or_default();
        let call = lead.call_status.map(|s| s.label()).unwrap_or_default();
        let mut name = lead.display_name().to_string();
        if lead.is_converted {
            name.push_str(" *");
        }
        lines.push(format!("{:<6} {:<28} {:<18} {:<16} {:<18} {:<20}",
            lead.id,
            truncate(&name, 28),
            truncate(&phone, 18),
            truncate(&stage_name(stages, lead.stage), 16),
            follow_up,
            call));
    }
    lines.join("\n")
}

/// Detailed view of a single lead
pub fn format_lead_summary<Tz: TimeZone>(lead: &Lead, stages: &[Stage], now: &DateTime<Tz>, is_tty: bool) -> String {
    let mut lines = vec![bold_if_tty(&format!("Lead {}: {}", lead.id, lead.display_name()), is_tty)];
    let mut field = |label: &str, value: String| lines.push(format!("  {:<12} {}", label, value));

    field("Phone:", lead.phone_number.as_deref().map(format_phone).unwrap_or_else(|| "-".to_string()));
    field("Stage:", stage_name(stages, lead.stage));
    match (lead.follow_up_date.as_ref(), lead.follow_up_urgency(now)) {
        (Some(date), Some(urgency)) => field("Follow-up:", format!("{} ({})", format_datetime(date), urgency.label())),
        _ => field("Follow-up:", "-".to_string()),
    }
    field("Call:", lead.call_status.map(|s| s.label().to_string()).unwrap_or_else(|| "-".to_string()));
    field("Considering:", if lead.is_considering { "yes" } else { "no" }.to_string());
    field("Converted:", if lead.is_converted { "yes" } else { "no" }.to_string());
    if let Some(form) = lead.source_form {
        field("Form:", format!("#{}", form));
    }
    if let Some(created) = lead.created_at.as_ref() {
        field("Created:", format_datetime(created));
    }
    lines.join("\n")
}

pub fn format_stage_table(stages: &[Stage], is_tty: bool) -> String {
    if stages.is_empty() {
        return "No stages configured.".to_string();
    }
    let header = format!("{:<6} {:<6} {:<30} {:<8}", "ID", "Order", "Name", "Colour");
    let mut lines = vec![bold_if_tty(&header, is_tty), "-".repeat(header.len())];
    for (index, stage) in stages.iter().enumerate() {
        let color = stage.display_color(index);
        let marker = if stage.color.as_deref().map_or(true, |c| c.trim().is_empty()) {
            format!("{} (default)", color)
        } else {
            color.to_string()
        };
        lines.push(format!("{:<6} {:<6} {:<30} {}",
            stage.id,
            stage.order,
            stage_color(&truncate(&stage.name, 30), color, is_tty),
            marker));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn board() -> Board {
        serde_json::from_value(json!([
            {"id": 1, "name": "New", "color": "#eab308", "items": [
                {"id": 10, "client_name": "Aziz Karimov", "phone_number": "998901234567", "stage": 1}
            ]},
            {"id": 2, "name": "Formalar", "items": [
                {"id": 20, "client_name": "Form A", "stage": 2, "source_form": 4},
                {"id": 21, "client_name": "Form B", "stage": 2, "source_form": 5}
            ]}
        ])).unwrap()
    }

    #[test]
    fn test_hex_to_rgb() {
        assert_eq!(hex_to_rgb("#3b82f6"), Some((0x3b, 0x82, 0xf6)));
        assert_eq!(hex_to_rgb("#fff"), Some((255, 255, 255)));
        assert_eq!(hex_to_rgb("blue"), None);
        assert_eq!(hex_to_rgb("#zzzzzz"), None);
    }

    #[test]
    fn test_card_plain_output() {
        let now = Utc::now();
        let lead: Lead = serde_json::from_value(json!({
            "id": 3, "client_name": "Madina Rustamova", "phone_number": "998901112233",
            "stage": 1, "call_status": "answered", "is_considering": true,
            "follow_up_date": (now - Duration::days(2)).to_rfc3339()
        })).unwrap();

        let card = format_lead_card(&lead, &now, 80, false);
        assert!(card.contains("#3"));
        assert!(card.contains("[MR] Madina Rustamova (considering)"));
        assert!(card.contains("+998 90 111 22 33"));
        assert!(card.contains("2 days overdue!"));
        assert!(card.contains("Answered"));
        assert!(!card.contains('\x1b'));
    }

    #[test]
    fn test_board_counts_follow_form_filter() {
        let now = Utc::now();
        let view = BoardView { now: &now, form_filter: Some(4), width: 80, is_tty: false };
        let text = format_board(&board(), &Statistics::default(), &view);

        assert!(text.contains("New (1)"));
        assert!(text.contains("Formalar (1)"));
        assert!(text.contains("Form A"));
        assert!(!text.contains("Form B"));
    }

    #[test]
    fn test_alert_banner() {
        let alerts = FollowUpAlerts { overdue: 2, today: 0, soon: 1 };
        assert_eq!(format_alerts(&alerts, false).unwrap(), "Follow-ups: 2 overdue, 1 due soon");
        assert_eq!(format_alerts(&FollowUpAlerts::default(), false), None);
    }

    #[test]
    fn test_stage_table_marks_default_colours() {
        let stages = vec![
            Stage { id: StageId(1), name: "New".to_string(), color: None, order: 0 },
            Stage { id: StageId(2), name: "Won".to_string(), color: Some("#112233".to_string()), order: 1 },
        ];
        let table = format_stage_table(&stages, false);
        assert!(table.contains("#eab308 (default)"));
        assert!(table.contains("#112233"));
        assert!(!table.contains("#112233 (default)"));
    }
}
