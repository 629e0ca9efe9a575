use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use autoclick_core::logger::FIELD_SEP;
use autoclick_core::types::RunState;
use crate::App;

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = if app.log_visible {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(f.area())
    } else {
        Layout::default()
            .constraints([Constraint::Percentage(100)])
            .split(f.area())
    };

    // -- Left panel: state, config, counters --

    let (banner_label, banner_bg) = match app.clicker.state() {
        RunState::Running => ("RUNNING (Press S to stop)", Color::Green),
        RunState::Idle => ("IDLE (Press S to start)", Color::Red),
    };

    let config = app.clicker.config();
    let stats = app.clicker.stats();

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(vec![
        Span::styled(" s", Style::default().fg(Color::Yellow)),
        Span::raw(" start/stop, "),
        Span::styled("l", Style::default().fg(Color::Yellow)),
        Span::raw(" logs, "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" quit"),
    ]));
    lines.push(Line::from(""));

    let template = config
        .template_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none)".into());
    let region = config
        .region
        .map(|r| r.to_string())
        .unwrap_or_else(|| "full screen".into());
    let change = if config.change_detection {
        format!("on, >= {}% (step {})", config.change_threshold_percent, config.change_sample_step)
    } else {
        "off".into()
    };

    lines.push(section("Config"));
    lines.push(field("template", template));
    lines.push(field("tolerance", config.tolerance.to_string()));
    lines.push(field("stride", config.stride.to_string()));
    lines.push(field("offset", format!("{:+}, {:+}", config.click_offset.x, config.click_offset.y)));
    lines.push(field("interval", format!("{} ms", config.scan_interval_ms)));
    lines.push(field("region", region));
    lines.push(field("change", change));
    lines.push(Line::from(""));

    lines.push(section("Activity"));
    lines.push(field("scans", stats.ticks.to_string()));
    lines.push(field("capture errors", stats.capture_failures.to_string()));
    lines.push(field("matches", stats.matches.to_string()));
    lines.push(field("change triggers", stats.change_triggers.to_string()));
    lines.push(field("clicks ok", stats.clicks_succeeded.to_string()));
    lines.push(field("clicks failed", stats.clicks_failed.to_string()));
    if let Some(pct) = stats.last_change_percent {
        lines.push(field("last change", format!("{}%", pct)));
    }
    if let Some(m) = stats.last_match {
        lines.push(field("last match", format!("{},{} {}x{}", m.x, m.y, m.width, m.height)));
    }

    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(chunks[0]);

    // Full-width centered banner
    let banner_width = left_chunks[0].width as usize;
    let pad_total = banner_width.saturating_sub(banner_label.len());
    let pad_left = pad_total / 2;
    let pad_right = pad_total - pad_left;
    let centered_banner = format!("{}{}{}", " ".repeat(pad_left), banner_label, " ".repeat(pad_right));
    let banner = Paragraph::new(Line::from(Span::styled(
        centered_banner,
        Style::default().fg(Color::Black).bg(banner_bg).add_modifier(Modifier::BOLD),
    )));
    f.render_widget(banner, left_chunks[0]);

    let status = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::LEFT | Borders::RIGHT | Borders::BOTTOM)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(status, left_chunks[1]);

    // -- Right panel: logs --
    if app.log_visible && chunks.len() > 1 {
        let visible_height = chunks[1].height.saturating_sub(2) as usize;
        let total = app.log_messages.len();
        let max_scroll = total.saturating_sub(visible_height);
        let scroll = app.log_scroll.min(max_scroll);
        let start = total.saturating_sub(visible_height + scroll);
        let end = total.saturating_sub(scroll);
        let log_lines: Vec<Line> = app.log_messages[start..end]
            .iter()
            .map(|m| parse_log_line(m))
            .collect();

        let log_panel = Paragraph::new(log_lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Logs ")
                    .border_style(Style::default().fg(Color::Yellow)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(log_panel, chunks[1]);
    }

    if let Some(prompt) = &app.quit_prompt {
        prompt.render(f, &stats);
    }
}

fn section(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!(" {}", title),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ))
}

fn field(name: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("   {:<16}", name), Style::default().fg(Color::DarkGray)),
        Span::styled(value, Style::default().fg(Color::Cyan)),
    ])
}

/// Parse a structured log line (level, target, timestamp, message) into a
/// colored Line. Anything else is shown verbatim.
fn parse_log_line(raw: &str) -> Line<'_> {
    let parts: Vec<&str> = raw.splitn(4, FIELD_SEP).collect();
    if parts.len() < 4 {
        return Line::from(raw);
    }
    let (level, target, timestamp, message) = (parts[0], parts[1], parts[2], parts[3]);

    let msg_color = match target {
        "stub" | "desktop" => Color::DarkGray,
        "clicker" => Color::LightBlue,
        _ => Color::White,
    };

    let mut spans = vec![
        Span::styled(timestamp, Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
    ];

    // Level tag: only warn/error get one
    match level {
        "ERROR" => spans.push(Span::styled("error ", Style::default().fg(Color::Red))),
        "WARN" => spans.push(Span::styled("warn ", Style::default().fg(Color::Yellow))),
        _ => {}
    }

    spans.push(Span::styled(target, Style::default().fg(msg_color).add_modifier(Modifier::BOLD)));
    spans.push(Span::raw(" "));
    spans.push(Span::styled(message, Style::default().fg(msg_color)));

    Line::from(spans)
}
