use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;
use crate::tree::navigator::Breadcrumb;

/// Label drawn for the root crumb.
pub const ROOT_LABEL: &str = "⌂";
/// Drawn between crumbs.
pub const CRUMB_SEPARATOR: &str = " / ";

fn label(crumb: &Breadcrumb) -> &str {
    if crumb.position_index == 0 {
        ROOT_LABEL
    } else {
        &crumb.segment
    }
}

/// Map a column offset within the bar to the crumb drawn there.
pub fn hit_test(trail: &[Breadcrumb], offset: u16) -> Option<usize> {
    let offset = offset as usize;
    let sep_width = Span::raw(CRUMB_SEPARATOR).width();
    let mut x = 0usize;
    for crumb in trail {
        let width = Span::raw(label(crumb)).width();
        if offset >= x && offset < x + width {
            return Some(crumb.position_index);
        }
        x += width + sep_width;
    }
    None
}

/// One-line bar showing the breadcrumb trail, root first.
pub struct BreadcrumbBar<'a> {
    trail: &'a [Breadcrumb],
    theme: &'a ThemeColors,
}

impl<'a> BreadcrumbBar<'a> {
    pub fn new(trail: &'a [Breadcrumb], theme: &'a ThemeColors) -> Self {
        Self { trail, theme }
    }
}

impl<'a> Widget for BreadcrumbBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let crumb_style = Style::default().fg(self.theme.crumb_fg);
        let current_style = crumb_style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        let sep_style = Style::default().fg(self.theme.dim_fg);

        let mut spans = Vec::with_capacity(self.trail.len() * 2);
        for (i, crumb) in self.trail.iter().enumerate() {
            let style = if i + 1 == self.trail.len() {
                current_style
            } else {
                crumb_style
            };
            spans.push(Span::styled(label(crumb).to_string(), style));
            spans.push(Span::styled(CRUMB_SEPARATOR, sep_style));
        }

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}
