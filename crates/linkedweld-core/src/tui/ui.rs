//! UI rendering for the TUI

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    symbols,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};

use super::app::{ActiveTab, App};
use super::components::{MetricCard, ProgressBar, Status, StatusIndicator};
use crate::models::{
    AlertKind, BudgetLevel, PipelineStage, ProjectStatus, Severity, WorkerStatus,
};

/// Main colors
const PRIMARY: Color = Color::Cyan;
const SECONDARY: Color = Color::Magenta;
const SUCCESS: Color = Color::Green;
const WARNING: Color = Color::Yellow;
const ERROR: Color = Color::Red;
const MUTED: Color = Color::DarkGray;

/// Draw the entire UI
pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Header + tabs
            Constraint::Min(10),    // Main content
            Constraint::Length(1),  // Status bar
        ])
        .split(frame.size());

    draw_header(frame, app, chunks[0]);
    draw_content(frame, app, chunks[1]);
    draw_status_bar(frame, app, chunks[2]);

    if app.show_help {
        draw_help_overlay(frame);
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(20),
            Constraint::Min(40),
            Constraint::Length(16),
        ])
        .split(area);

    let logo = Paragraph::new("⚙ LinkedWeld Pro")
        .style(Style::default().fg(PRIMARY).bold())
        .block(Block::default().borders(Borders::NONE));
    frame.render_widget(logo, chunks[0]);

    let tab_titles: Vec<Line> = ActiveTab::TITLES
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let style = if i == app.active_tab.index() {
                Style::default().fg(PRIMARY).bold()
            } else {
                Style::default().fg(MUTED)
            };
            Line::from(format!(" {} {} ", i + 1, t)).style(style)
        })
        .collect();

    let tabs_widget = Tabs::new(tab_titles)
        .select(app.active_tab.index())
        .highlight_style(Style::default().fg(PRIMARY))
        .divider(symbols::line::VERTICAL);
    frame.render_widget(tabs_widget, chunks[1]);

    let status = match (&app.stats, app.connected) {
        (_, false) => StatusIndicator::new("Offline", Status::Error),
        (None, true) => StatusIndicator::new("Loading", Status::Unknown),
        (Some(stats), true) if stats.critical_alerts > 0 => {
            StatusIndicator::new("Attention", Status::Warning)
        }
        (Some(_), true) => StatusIndicator::new("Live", Status::Ok),
    };
    let status_widget = Paragraph::new(status.to_span()).alignment(Alignment::Right);
    frame.render_widget(status_widget, chunks[2]);
}

fn draw_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.active_tab {
        ActiveTab::Overview => draw_overview(frame, app, area),
        ActiveTab::Workers => draw_workers(frame, app, area),
        ActiveTab::Projects => draw_projects(frame, app, area),
        ActiveTab::Pipeline => draw_pipeline(frame, app, area),
        ActiveTab::Alerts => draw_alerts(frame, app, area),
    }
}

fn bordered(title: impl Into<String>) -> Block<'static> {
    Block::default()
        .title(title.into())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(MUTED))
}

fn draw_overview(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(8)])
        .split(area);

    draw_metric_cards(frame, app, chunks[0]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(chunks[1]);

    draw_pipeline_summary(frame, app, bottom[0]);
    draw_alert_feed(frame, app, bottom[1]);
}

fn draw_metric_cards(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(20); 5])
        .split(area);

    let Some(stats) = &app.stats else {
        let loading = Paragraph::new("Loading…")
            .style(Style::default().fg(MUTED))
            .alignment(Alignment::Center)
            .block(bordered("Summary"));
        frame.render_widget(loading, area);
        return;
    };

    let used = if stats.total_budget > 0.0 {
        stats.total_spent / stats.total_budget * 100.0
    } else {
        0.0
    };

    MetricCard::new("Workers", stats.active_workers.to_string())
        .color(PRIMARY)
        .caption(format!("of {}", stats.total_workers))
        .render(frame, chunks[0]);
    MetricCard::new("Active projects", stats.active_projects.to_string())
        .color(SECONDARY)
        .render(frame, chunks[1]);
    MetricCard::new("Budget used", format!("{used:.0}%"))
        .color(if used > 90.0 { ERROR } else if used > 70.0 { WARNING } else { SUCCESS })
        .caption(format_money(stats.total_spent))
        .render(frame, chunks[2]);
    MetricCard::new("Critical", stats.critical_alerts.to_string())
        .color(if stats.critical_alerts > 0 { ERROR } else { MUTED })
        .caption(format!("+{} warn", stats.warning_alerts))
        .render(frame, chunks[3]);
    MetricCard::new("Expiring docs", stats.expiring_documents.to_string())
        .color(if stats.expiring_documents > 0 { WARNING } else { MUTED })
        .render(frame, chunks[4]);
}

fn draw_pipeline_summary(frame: &mut Frame, app: &App, area: Rect) {
    let counts = app.stats.as_ref().map(|s| &s.pipeline);
    let max = counts
        .and_then(|c| c.values().copied().max())
        .unwrap_or(0)
        .max(1);

    let rows: Vec<Row> = PipelineStage::ALL
        .iter()
        .map(|stage| {
            let count = counts
                .and_then(|c| c.get(stage.as_str()).copied())
                .unwrap_or(0);
            Row::new(vec![
                Cell::from(stage_label(*stage)),
                Cell::from(count.to_string()),
                Cell::from(ProgressBar::new(count as f64, max as f64).render_inline(12))
                    .style(Style::default().fg(stage_color(*stage))),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(11),
            Constraint::Length(4),
            Constraint::Min(6),
        ],
    )
    .block(bordered("Recruitment pipeline"));

    frame.render_widget(table, area);
}

fn draw_alert_feed(frame: &mut Frame, app: &App, area: Rect) {
    let rows: Vec<Row> = app
        .alerts
        .iter()
        .take(area.height.saturating_sub(2) as usize)
        .map(|alert| {
            Row::new(vec![
                Cell::from(alert.severity.as_str()).style(severity_style(alert.severity)),
                Cell::from(truncate(&alert.message, 60)),
            ])
        })
        .collect();

    let title = format!("Needs attention ({})", app.alerts.len());
    let table = Table::new(rows, [Constraint::Length(9), Constraint::Min(20)])
        .block(bordered(title));

    frame.render_widget(table, area);
}

fn draw_workers(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(vec!["Name", "Specialization", "Nationality", "Status", "Rate", "Next expiry"])
        .style(Style::default().fg(PRIMARY).bold())
        .height(1);

    let rows: Vec<Row> = app
        .workers
        .iter()
        .map(|view| {
            let worker = &view.worker;
            let (status_label, status_style) = match worker.status {
                WorkerStatus::Active => ("active", Style::default().fg(SUCCESS)),
                WorkerStatus::OnLeave => ("on leave", Style::default().fg(WARNING)),
                WorkerStatus::Inactive => ("inactive", Style::default().fg(MUTED)),
            };

            let expiry = match view.next_expiry {
                Some((doc_type, days)) => {
                    let style = if days <= 30 {
                        Style::default().fg(ERROR)
                    } else if days <= 90 {
                        Style::default().fg(WARNING)
                    } else {
                        Style::default()
                    };
                    Cell::from(format!("{} {}", doc_type.label(), format_days(days))).style(style)
                }
                None => Cell::from("-").style(Style::default().fg(MUTED)),
            };

            Row::new(vec![
                Cell::from(truncate(&worker.full_name(), 24)),
                Cell::from(worker.specialization.clone().unwrap_or_default()),
                Cell::from(worker.nationality.clone().unwrap_or_default()),
                Cell::from(status_label).style(status_style),
                Cell::from(worker.hourly_rate.map_or("-".to_string(), |r| format!("{r:.2}"))),
                expiry,
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(24),
            Constraint::Percentage(16),
            Constraint::Percentage(12),
            Constraint::Percentage(12),
            Constraint::Percentage(10),
            Constraint::Percentage(26),
        ],
    )
    .header(header)
    .block(bordered(format!("Workers ({})", app.workers.len())))
    .highlight_style(Style::default().bg(Color::DarkGray));

    frame.render_stateful_widget(table, area, &mut app.workers_state.clone());
}

fn draw_projects(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(vec!["Project", "Client", "Status", "Budget", "Spent", "Used", ""])
        .style(Style::default().fg(PRIMARY).bold())
        .height(1);

    let rows: Vec<Row> = app
        .projects
        .iter()
        .map(|view| {
            let project = &view.project;
            let budget = &view.budget;
            let level_color = match budget.level {
                BudgetLevel::Ok => SUCCESS,
                BudgetLevel::Warning => WARNING,
                BudgetLevel::Critical => ERROR,
            };
            let status = match project.status {
                ProjectStatus::Planned => "planned",
                ProjectStatus::Active => "active",
                ProjectStatus::OnHold => "on hold",
                ProjectStatus::Completed => "completed",
            };

            Row::new(vec![
                Cell::from(truncate(&project.name, 26)),
                Cell::from(truncate(project.client.as_deref().unwrap_or("-"), 16)),
                Cell::from(status),
                Cell::from(format_money(budget.budget)),
                Cell::from(format_money(budget.spent)),
                Cell::from(format!("{:.0}%", budget.ratio * 100.0))
                    .style(Style::default().fg(level_color)),
                Cell::from(ProgressBar::new(budget.spent, budget.budget).render_inline(14))
                    .style(Style::default().fg(level_color)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(24),
            Constraint::Percentage(14),
            Constraint::Percentage(10),
            Constraint::Percentage(11),
            Constraint::Percentage(11),
            Constraint::Percentage(7),
            Constraint::Percentage(23),
        ],
    )
    .header(header)
    .block(bordered(format!("Projects ({})", app.projects.len())))
    .highlight_style(Style::default().bg(Color::DarkGray));

    frame.render_stateful_widget(table, area, &mut app.projects_state.clone());
}

fn draw_pipeline(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(vec!["Candidate", "Specialization", "Stage", "Expected rate", "Source", "In stage"])
        .style(Style::default().fg(PRIMARY).bold())
        .height(1);

    let now = chrono::Utc::now();
    let rows: Vec<Row> = app
        .candidates
        .iter()
        .map(|candidate| {
            let days = (now - candidate.stage_changed_at).num_days();
            Row::new(vec![
                Cell::from(truncate(&candidate.full_name(), 24)),
                Cell::from(candidate.specialization.clone().unwrap_or_default()),
                Cell::from(stage_label(candidate.stage))
                    .style(Style::default().fg(stage_color(candidate.stage))),
                Cell::from(
                    candidate
                        .expected_rate
                        .map_or("-".to_string(), |r| format!("{r:.2}")),
                ),
                Cell::from(candidate.source.clone().unwrap_or_default()),
                Cell::from(format!("{days}d")),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(24),
            Constraint::Percentage(18),
            Constraint::Percentage(14),
            Constraint::Percentage(14),
            Constraint::Percentage(16),
            Constraint::Percentage(14),
        ],
    )
    .header(header)
    .block(bordered(format!("Pipeline ({})", app.candidates.len())))
    .highlight_style(Style::default().bg(Color::DarkGray));

    frame.render_stateful_widget(table, area, &mut app.pipeline_state.clone());
}

fn draw_alerts(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(10)])
        .split(area);

    let critical = app
        .alerts
        .iter()
        .filter(|a| a.severity == Severity::Critical)
        .count();
    let (summary_text, summary_style) = match (critical, app.alerts.len()) {
        (_, 0) => ("✓ Nothing needs attention".to_string(), Style::default().fg(SUCCESS)),
        (0, n) => (format!("⚠ {n} warning(s)"), Style::default().fg(WARNING)),
        (c, n) => (format!("⚠ {c} critical, {} warning(s)", n - c), Style::default().fg(ERROR)),
    };

    let summary = Paragraph::new(summary_text)
        .style(summary_style.bold())
        .block(bordered("Alert status"));
    frame.render_widget(summary, chunks[0]);

    let header = Row::new(vec!["Severity", "Type", "Alert", "Detail"])
        .style(Style::default().fg(PRIMARY).bold())
        .height(1);

    let rows: Vec<Row> = app
        .alerts
        .iter()
        .map(|alert| {
            let kind = match alert.kind {
                AlertKind::DocumentExpiry => "document",
                AlertKind::Budget => "budget",
            };
            let detail = match (alert.days_remaining, alert.ratio) {
                (Some(days), _) => format_days(days),
                (None, Some(ratio)) => format!("{:.0}% of budget", ratio * 100.0),
                (None, None) => String::new(),
            };

            Row::new(vec![
                Cell::from(alert.severity.as_str()).style(severity_style(alert.severity)),
                Cell::from(kind),
                Cell::from(truncate(&alert.title, 48)),
                Cell::from(detail),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(12),
            Constraint::Percentage(12),
            Constraint::Percentage(52),
            Constraint::Percentage(24),
        ],
    )
    .header(header)
    .block(bordered("Current alerts"))
    .highlight_style(Style::default().bg(Color::DarkGray));

    frame.render_stateful_widget(table, chunks[1], &mut app.alerts_state.clone());
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let left_text = app
        .get_status()
        .unwrap_or("? Help | Tab Switch | r Refresh | q Quit");
    let left = Paragraph::new(left_text).style(Style::default().fg(MUTED));
    frame.render_widget(left, chunks[0]);

    let unread = app.stats.as_ref().map_or(0, |s| s.unread_notifications);
    let right_text = format!(
        "Unread: {} | Refresh: {:?} | Last: {}",
        unread,
        app.refresh_rate,
        format_elapsed(app.last_update.elapsed())
    );
    let right = Paragraph::new(right_text)
        .style(Style::default().fg(MUTED))
        .alignment(Alignment::Right);
    frame.render_widget(right, chunks[1]);
}

fn draw_help_overlay(frame: &mut Frame) {
    let area = centered_rect(60, 60, frame.size());
    frame.render_widget(Clear, area);

    let help_text = vec![
        Line::from("Keyboard Shortcuts").style(Style::default().fg(PRIMARY).bold()),
        Line::from(""),
        Line::from("Navigation:").style(Style::default().fg(SECONDARY)),
        Line::from("  Tab / Shift+Tab    Switch between tabs"),
        Line::from("  1-5                Jump to specific tab"),
        Line::from("  j/k or ↑/↓         Navigate lists"),
        Line::from("  g/G                First / last row"),
        Line::from(""),
        Line::from("General:").style(Style::default().fg(SECONDARY)),
        Line::from("  r                  Reload data"),
        Line::from("  ?                  Toggle this help"),
        Line::from("  q / Ctrl+C         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().fg(MUTED).italic(),
        )]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(PRIMARY)),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(help, area);
}

// Helper functions

fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Critical => Style::default().fg(ERROR).bold(),
        Severity::Warning => Style::default().fg(WARNING),
        Severity::Info => Style::default().fg(MUTED),
    }
}

fn stage_label(stage: PipelineStage) -> &'static str {
    match stage {
        PipelineStage::Applied => "Applied",
        PipelineStage::Screening => "Screening",
        PipelineStage::Interview => "Interview",
        PipelineStage::TradeTest => "Trade test",
        PipelineStage::Offer => "Offer",
        PipelineStage::Hired => "Hired",
        PipelineStage::Rejected => "Rejected",
    }
}

fn stage_color(stage: PipelineStage) -> Color {
    match stage {
        PipelineStage::Hired => SUCCESS,
        PipelineStage::Rejected => MUTED,
        PipelineStage::Offer => SECONDARY,
        _ => PRIMARY,
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

fn format_money(amount: f64) -> String {
    if amount.abs() >= 1_000_000.0 {
        format!("{:.1}M", amount / 1_000_000.0)
    } else if amount.abs() >= 1_000.0 {
        format!("{:.1}K", amount / 1_000.0)
    } else {
        format!("{amount:.0}")
    }
}

fn format_days(days: i64) -> String {
    match days {
        d if d < 0 => format!("expired {}d ago", -d),
        0 => "expires today".to_string(),
        d => format!("in {d}d"),
    }
}

fn format_elapsed(elapsed: std::time::Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else {
        format!("{}m ago", secs / 60)
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("Świnoujście", 20), "Świnoujście");
        assert_eq!(truncate("Świnoujście", 5), "Świn…");
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_money(950.0), "950");
        assert_eq!(format_money(120_000.0), "120.0K");
        assert_eq!(format_days(-3), "expired 3d ago");
        assert_eq!(format_days(12), "in 12d");
    }

    #[test]
    fn test_draw_every_tab_without_data() {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        let mut app = App::new();
        for _ in 0..ActiveTab::TITLES.len() {
            terminal.draw(|frame| draw(frame, &app)).unwrap();
            app.active_tab = app.active_tab.next();
        }
        app.show_help = true;
        terminal.draw(|frame| draw(frame, &app)).unwrap();
    }
}
