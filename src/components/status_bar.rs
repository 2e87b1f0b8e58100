use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

const KEY_HINTS: &str = " ⏎:open  ⌫:up  y:link  ?:help  q:quit ";

/// Truncate `s` to at most `max` characters, keeping the tail.
fn tail(s: &str, max: usize) -> String {
    let count = s.chars().count();
    if count <= max {
        return s.to_string();
    }
    if max <= 3 {
        return s.chars().take(max).collect();
    }
    let kept: String = s.chars().skip(count - (max - 3)).collect();
    format!("...{}", kept)
}

/// Status bar widget that displays the selection link, folder info, key
/// hints, or a transient status message.
pub struct StatusBarWidget<'a> {
    link: &'a str,
    info: &'a str,
    theme: &'a ThemeColors,
    status_message: Option<&'a str>,
    is_error: bool,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(link: &'a str, info: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            link,
            info,
            theme,
            status_message: None,
            is_error: false,
        }
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default()
                    .bg(self.theme.error_fg)
                    .fg(self.theme.status_bg)
            } else {
                Style::default().fg(self.theme.success_fg)
            };
            let display = format!("{:<width$}", tail(msg, width), width = width);
            let line = Line::from(Span::styled(display, style));
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        }

        // Normal bar: [link] [info] [key_hints]
        let hints_len = KEY_HINTS.chars().count();
        let remaining = width.saturating_sub(hints_len);
        let info_len = self.info.chars().count();
        let link_budget = remaining.saturating_sub(info_len).saturating_sub(1);

        let link_display = tail(self.link, link_budget);
        let gap = remaining
            .saturating_sub(link_display.chars().count())
            .saturating_sub(info_len);

        let spans = vec![
            Span::styled(link_display, Style::default().fg(self.theme.status_fg)),
            Span::raw(" ".repeat(gap)),
            Span::styled(self.info, Style::default().fg(self.theme.info_fg)),
            Span::styled(
                KEY_HINTS,
                Style::default()
                    .fg(self.theme.dim_fg)
                    .add_modifier(Modifier::DIM),
            ),
        ];

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;

    fn line_text(buf: &Buffer, width: u16) -> String {
        (0..width)
            .map(|x| buf.cell((x, 0)).unwrap().symbol().to_string())
            .collect()
    }

    #[test]
    fn tail_keeps_end_of_long_links() {
        assert_eq!(tail("short", 10), "short");
        assert_eq!(tail("/index.html?file=a/b/c.txt", 12), "...a/b/c.txt");
        assert_eq!(tail("abcdef", 2), "ab");
    }

    #[test]
    fn normal_bar_rendering() {
        let tc = theme::dark_theme();
        let widget = StatusBarWidget::new("/index.html?file=a/b.txt", "2 dirs · 3 files", &tc);
        let area = Rect::new(0, 0, 100, 1);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        let content = line_text(&buf, 100);
        assert!(content.contains("/index.html?file=a/b.txt"));
        assert!(content.contains("2 dirs · 3 files"));
        assert!(content.contains("q:quit"));
    }

    #[test]
    fn error_message_uses_error_background() {
        let tc = theme::dark_theme();
        let widget = StatusBarWidget::new("", "", &tc).status_message("Folder not found: x", true);
        let area = Rect::new(0, 0, 40, 1);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        assert!(line_text(&buf, 40).contains("Folder not found: x"));
        assert_eq!(buf.cell((0, 0)).unwrap().bg, tc.error_fg);
    }

    #[test]
    fn zero_area_does_not_panic() {
        let tc = theme::dark_theme();
        let area = Rect::new(0, 0, 0, 0);
        let mut buf = Buffer::empty(area);
        StatusBarWidget::new("/path", "info", &tc).render(area, &mut buf);
    }
}
