use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use autoclick_core::Stats;

const STOP_LABEL: &str = " Stop & quit ";
const KEEP_LABEL: &str = " Keep running ";

/// Asks before quitting while the scan loop is live. The body is rebuilt
/// from the current counters on every frame, so it keeps counting while open.
#[derive(Debug, Default)]
pub struct QuitPrompt {
    /// `true` once the user moves to "Stop & quit". Starts on "Keep running".
    pub stop_selected: bool,
}

impl QuitPrompt {
    pub fn toggle(&mut self) {
        self.stop_selected = !self.stop_selected;
    }

    pub fn body(&self, stats: &Stats) -> Vec<Line<'static>> {
        let mut lines = vec![
            Line::from(Span::styled(
                "Automation is running.",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            Line::from(format!(
                "{} scans, {} clicks ok, {} failed",
                stats.ticks, stats.clicks_succeeded, stats.clicks_failed
            )),
        ];
        if let Some(m) = stats.last_match {
            lines.push(Line::from(Span::styled(
                format!("last match at {},{}", m.x, m.y),
                Style::default().fg(Color::DarkGray),
            )));
        }
        lines.push(Line::from(""));
        lines.push(self.buttons());
        lines
    }

    fn buttons(&self) -> Line<'static> {
        let (stop, keep) = if self.stop_selected {
            (Style::default().fg(Color::Black).bg(Color::Red).add_modifier(Modifier::BOLD), Style::default().fg(Color::DarkGray))
        } else {
            (Style::default().fg(Color::DarkGray), Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD))
        };
        Line::from(vec![
            Span::styled(STOP_LABEL, stop),
            Span::raw("   "),
            Span::styled(KEEP_LABEL, keep),
        ])
    }

    /// Centered horizontally, two thirds down the screen, sized to the body.
    pub fn render(&self, f: &mut Frame, stats: &Stats) {
        let body = self.body(stats);
        let width = body.iter().map(Line::width).max().unwrap_or(0) as u16 + 4;
        let height = body.len() as u16 + 2;

        let outer = f.area();
        let width = width.min(outer.width);
        let height = height.min(outer.height);
        let area = Rect::new(
            outer.x + (outer.width - width) / 2,
            outer.y + (outer.height - height) * 2 / 3,
            width,
            height,
        );

        f.render_widget(Clear, area);
        let dialog = Paragraph::new(body).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" Quit? "),
        );
        f.render_widget(dialog, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoclick_core::types::Rect as MatchRect;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn body_reports_live_counters() {
        let stats = Stats { ticks: 12, clicks_succeeded: 3, clicks_failed: 1, ..Default::default() };
        let body = QuitPrompt::default().body(&stats);
        assert_eq!(text(&body[1]), "12 scans, 3 clicks ok, 1 failed");
        assert_eq!(body.len(), 4);
    }

    #[test]
    fn last_match_adds_a_line() {
        let stats = Stats { last_match: Some(MatchRect::new(40, 60, 10, 10)), ..Default::default() };
        let body = QuitPrompt::default().body(&stats);
        assert_eq!(text(&body[2]), "last match at 40,60");
        assert_eq!(body.len(), 5);
    }

    #[test]
    fn keep_running_is_highlighted_until_toggled() {
        let mut prompt = QuitPrompt::default();
        let keep = prompt.buttons().spans[2].style;
        assert_eq!(keep.bg, Some(Color::Green));

        prompt.toggle();
        assert!(prompt.stop_selected);
        assert_eq!(prompt.buttons().spans[0].style.bg, Some(Color::Red));
    }
}
