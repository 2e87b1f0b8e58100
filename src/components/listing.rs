use std::collections::HashMap;

use chrono::{DateTime, Utc};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::app::MetadataState;
use crate::inventory::ObjectRow;
use crate::theme::ThemeColors;
use crate::tree::navigator::Child;

/// Shown in place of metadata while a read is in flight.
const PENDING: &str = "…";

/// Format bytes into human-readable size string.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;
    const TB: u64 = 1024 * GB;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

/// Right-hand metadata text for one row.
fn meta_text(row: Option<&ObjectRow>, state: &MetadataState) -> String {
    match (row, state) {
        (Some(row), _) => {
            let size = row.size.map(format_size).unwrap_or_default();
            let modified = row
                .last_modified
                .as_ref()
                .map(format_timestamp)
                .unwrap_or_default();
            match (size.is_empty(), modified.is_empty()) {
                (false, false) => format!("{:>10}  {}", size, modified),
                (false, true) => size,
                (true, _) => modified,
            }
        }
        (None, MetadataState::Pending(_)) => PENDING.to_string(),
        (None, _) => String::new(),
    }
}

/// The contents of the current folder, one entry per line, in index order.
pub struct ListingWidget<'a> {
    children: &'a [Child<'a>],
    metadata: &'a HashMap<usize, ObjectRow>,
    metadata_state: &'a MetadataState,
    selected: usize,
    scroll_offset: usize,
    theme: &'a ThemeColors,
    block: Option<Block<'a>>,
}

impl<'a> ListingWidget<'a> {
    pub fn new(
        children: &'a [Child<'a>],
        metadata: &'a HashMap<usize, ObjectRow>,
        metadata_state: &'a MetadataState,
        theme: &'a ThemeColors,
    ) -> Self {
        Self {
            children,
            metadata,
            metadata_state,
            selected: 0,
            scroll_offset: 0,
            theme,
            block: None,
        }
    }

    pub fn selection(mut self, selected: usize, scroll_offset: usize) -> Self {
        self.selected = selected;
        self.scroll_offset = scroll_offset;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl<'a> Widget for ListingWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let visible_height = inner_area.height as usize;
        if visible_height == 0 {
            return;
        }

        if self.children.is_empty() {
            let line = Line::from(Span::styled(
                "(empty folder)",
                Style::default()
                    .fg(self.theme.dim_fg)
                    .add_modifier(Modifier::ITALIC),
            ));
            buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
            return;
        }

        let width = inner_area.width as usize;
        let visible = self
            .children
            .iter()
            .enumerate()
            .skip(self.scroll_offset)
            .take(visible_height);

        for (i, (idx, child)) in visible.enumerate() {
            let y = inner_area.y + i as u16;
            let is_selected = idx == self.selected;

            let (indicator, name, name_style) = match child.leaf {
                None => (
                    "[D] ",
                    format!("{}/", child.name),
                    Style::default()
                        .fg(self.theme.tree_dir_fg)
                        .add_modifier(Modifier::BOLD),
                ),
                Some(_) => (
                    "[F] ",
                    child.name.to_string(),
                    Style::default().fg(self.theme.tree_file_fg),
                ),
            };

            let meta = child
                .leaf
                .map(|leaf| {
                    meta_text(
                        self.metadata.get(&leaf.source_row_index),
                        self.metadata_state,
                    )
                })
                .unwrap_or_default();

            let left = format!("{}{}", indicator, name);
            let left_width = Span::raw(left.as_str()).width();
            let meta_width = Span::raw(meta.as_str()).width();
            let gap = width.saturating_sub(left_width + meta_width).max(1);

            let mut spans = vec![
                Span::styled(indicator, Style::default().fg(self.theme.dim_fg)),
                Span::styled(name, name_style),
            ];
            if !meta.is_empty() {
                spans.push(Span::raw(" ".repeat(gap)));
                spans.push(Span::styled(meta, Style::default().fg(self.theme.meta_fg)));
            }

            let mut line = Line::from(spans);
            if is_selected {
                line = line.style(
                    Style::default()
                        .bg(self.theme.tree_selected_bg)
                        .fg(self.theme.tree_selected_fg)
                        .add_modifier(Modifier::BOLD),
                );
                // Fill the rest of the row with the selection background.
                buf.set_style(
                    Rect::new(inner_area.x, y, inner_area.width, 1),
                    Style::default().bg(self.theme.tree_selected_bg),
                );
            }
            buf.set_line(inner_area.x, y, &line, inner_area.width);
        }
    }
}
