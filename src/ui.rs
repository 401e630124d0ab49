use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Clear, Paragraph},
};

use crate::columns::COLUMN_COUNT;
use crate::grid::SortDirection;
use crate::model::UIData;

pub const GROUP_ROW_HEIGHT: u16 = 1;
pub const HEADER_ROW_HEIGHT: u16 = 1;
pub const FILTER_ROW_HEIGHT: u16 = 1;
pub const PAGINATOR_HEIGHT: u16 = 1;
pub const STATUSLINE_HEIGHT: u16 = 1;
const COLUMN_SPACING: usize = 2;
const COLUMN_WIDTH_MAX: usize = 28;

// How long a status message stays up before the key hint returns.
const STATUS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);

const SORT_MARKER_ASC: &str = " ^";
const SORT_MARKER_DESC: &str = " v";

pub struct GridUI;

impl GridUI {
    pub fn new() -> Self {
        GridUI
    }

    pub fn draw(&self, uidata: &UIData, frame: &mut Frame<'_>) {
        let widths = column_widths(uidata);
        let chunks = Layout::vertical([
            Constraint::Length(GROUP_ROW_HEIGHT),
            Constraint::Length(HEADER_ROW_HEIGHT),
            Constraint::Length(FILTER_ROW_HEIGHT),
            Constraint::Min(1),
            Constraint::Length(PAGINATOR_HEIGHT),
            Constraint::Length(STATUSLINE_HEIGHT),
        ])
        .split(frame.area());

        frame.render_widget(Paragraph::new(group_row(uidata, &widths)), chunks[0]);
        frame.render_widget(Paragraph::new(header_row(uidata, &widths)), chunks[1]);
        frame.render_widget(Paragraph::new(filter_row(uidata, &widths)), chunks[2]);
        frame.render_widget(Paragraph::new(data_rows(uidata, &widths)), chunks[3]);
        frame.render_widget(Paragraph::new(paginator(uidata)), chunks[4]);
        frame.render_widget(Paragraph::new(statusline(uidata)), chunks[5]);

        if uidata.show_popup {
            render_popup(uidata, frame);
        }
    }
}

// Content based column widths: wide enough for the header (plus sort
// marker), the filter row and every cell on the current page.
fn column_widths(uidata: &UIData) -> Vec<usize> {
    let mut widths = Vec::with_capacity(COLUMN_COUNT);
    for (idx, header) in uidata.headers.iter().enumerate() {
        let mut width = header.spec.title.len() + SORT_MARKER_ASC.len();
        width = width.max(filter_cell_text(uidata, idx).len());
        for row in &uidata.rows {
            width = width.max(row[idx].len());
        }
        widths.push(width.min(COLUMN_WIDTH_MAX));
    }
    widths
}

fn pad(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    while out.len() < width {
        out.push(' ');
    }
    out
}

fn spacer() -> Span<'static> {
    Span::raw(" ".repeat(COLUMN_SPACING))
}

// Header group labels ("Names") centered over their member columns.
fn group_row(uidata: &UIData, widths: &[usize]) -> Line<'static> {
    let mut spans = Vec::new();
    let mut idx = 0;
    while idx < COLUMN_COUNT {
        if idx > 0 {
            spans.push(spacer());
        }
        let group = uidata.headers[idx].spec.group;
        let mut end = idx + 1;
        while end < COLUMN_COUNT && group.is_some() && uidata.headers[end].spec.group == group {
            end += 1;
        }
        let span_width: usize =
            widths[idx..end].iter().sum::<usize>() + (end - idx - 1) * COLUMN_SPACING;
        match group {
            Some(label) => spans.push(Span::styled(
                format!("{:^span_width$}", label),
                Style::new().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            )),
            None => spans.push(Span::raw(" ".repeat(span_width))),
        }
        idx = end;
    }
    Line::from(spans)
}

fn header_row(uidata: &UIData, widths: &[usize]) -> Line<'static> {
    let mut spans = Vec::new();
    for (idx, header) in uidata.headers.iter().enumerate() {
        if idx > 0 {
            spans.push(spacer());
        }
        let marker = match header.sort {
            Some(SortDirection::Asc) => SORT_MARKER_ASC,
            Some(SortDirection::Desc) => SORT_MARKER_DESC,
            None => "",
        };
        let label = pad(&format!("{}{}", header.spec.title, marker), widths[idx]);
        let mut style = Style::new().bold();
        if idx == uidata.cursor_column {
            style = style.fg(Color::Yellow);
        }
        if !header.spec.sortable {
            style = style.add_modifier(Modifier::DIM);
        }
        spans.push(Span::styled(label, style));
    }
    Line::from(spans)
}

fn filter_cell_text(uidata: &UIData, idx: usize) -> String {
    let header = &uidata.headers[idx];
    if !header.spec.filterable {
        return String::new();
    }
    if uidata.active_cmdinput && uidata.input_column == Some(header.spec.id) {
        return format!("{}_", uidata.cmdinput.input);
    }
    match &header.filter {
        Some(filter) => filter.clone(),
        // Facet hint: distinct values in the filtered subset.
        None => format!("Search... ({})", format_count(header.facet_count)),
    }
}

fn filter_row(uidata: &UIData, widths: &[usize]) -> Line<'static> {
    let mut spans = Vec::new();
    for (idx, header) in uidata.headers.iter().enumerate() {
        if idx > 0 {
            spans.push(spacer());
        }
        let text = pad(&filter_cell_text(uidata, idx), widths[idx]);
        let editing = uidata.active_cmdinput && uidata.input_column == Some(header.spec.id);
        let style = if editing {
            Style::new().fg(Color::Yellow).reversed()
        } else if header.filter.is_some() {
            Style::new().fg(Color::Yellow)
        } else if header.spec.filterable {
            Style::new().add_modifier(Modifier::DIM | Modifier::ITALIC)
        } else {
            Style::new()
        };
        spans.push(Span::styled(text, style));
    }
    Line::from(spans)
}

fn data_rows(uidata: &UIData, widths: &[usize]) -> Text<'static> {
    let mut lines = Vec::with_capacity(uidata.rows.len());
    for (row_idx, row) in uidata.rows.iter().enumerate() {
        let selected_row = row_idx == uidata.cursor_row;
        let mut spans = Vec::new();
        for (col_idx, cell) in row.iter().enumerate() {
            if col_idx > 0 {
                spans.push(spacer());
            }
            let mut style = Style::new();
            if selected_row {
                style = style.reversed();
                if col_idx == uidata.cursor_column {
                    style = style.add_modifier(Modifier::BOLD);
                }
            }
            spans.push(Span::styled(pad(cell, widths[col_idx]), style));
        }
        lines.push(Line::from(spans));
    }
    if uidata.rows.is_empty() {
        lines.push(Line::from(Span::styled(
            "No rows match the active filters.",
            Style::new().add_modifier(Modifier::DIM | Modifier::ITALIC),
        )));
    }
    Text::from(lines)
}

fn nav_span(glyph: &str, available: bool) -> Span<'static> {
    if available {
        Span::styled(glyph.to_string(), Style::new().bold())
    } else {
        Span::styled(glyph.to_string(), Style::new().add_modifier(Modifier::DIM))
    }
}

fn paginator(uidata: &UIData) -> Line<'static> {
    Line::from(vec![
        nav_span("|<", uidata.can_previous),
        Span::raw(" "),
        nav_span("<<", uidata.can_previous),
        Span::raw(format!(
            " Page {} of {} ",
            format_count(uidata.page_index + 1),
            format_count(uidata.page_count)
        )),
        nav_span(">>", uidata.can_next),
        Span::raw(" "),
        nav_span(">|", uidata.can_next),
        Span::raw(format!(
            "    {} rows found",
            format_count(uidata.filtered_rows)
        )),
    ])
}

fn statusline(uidata: &UIData) -> Line<'static> {
    if uidata.active_cmdinput
        && let Some(column) = uidata.input_column
    {
        // Render the input with the curser at its tracked position.
        let input = &uidata.cmdinput.input;
        let byte = input
            .char_indices()
            .nth(uidata.cmdinput.curser_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(input.len());
        let (left, rest) = input.split_at(byte);
        let mut rest = rest.chars();
        let under_curser = rest.next().map(String::from).unwrap_or_else(|| " ".to_string());
        return Line::from(vec![
            Span::styled(
                format!("Filter {}: ", column.spec().title),
                Style::new().bold(),
            ),
            Span::styled(left.to_string(), Style::new().fg(Color::Yellow)),
            Span::styled(under_curser, Style::new().reversed()),
            Span::styled(rest.collect::<String>(), Style::new().fg(Color::Yellow)),
        ]);
    }
    if uidata.last_status_message_update.elapsed() < STATUS_MESSAGE_TIMEOUT {
        Line::from(uidata.status_message.clone())
    } else {
        Line::from(Span::styled(
            "?: help  /: filter  s: sort  n/p: page  q: quit",
            Style::new().add_modifier(Modifier::DIM),
        ))
    }
}

fn render_popup(uidata: &UIData, frame: &mut Frame<'_>) {
    let area = popup_area(frame.area());
    frame.render_widget(Clear, area);
    let block = Block::bordered().title(Line::from(" help ".bold()).centered());
    frame.render_widget(
        Paragraph::new(uidata.popup_message.clone()).block(block),
        area,
    );
}

fn popup_area(area: Rect) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(80)]).flex(ratatui::layout::Flex::Center);
    let horizontal =
        Layout::horizontal([Constraint::Percentage(60)]).flex(ratatui::layout::Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}

// Thousands grouping for the page and row count readouts.
pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, chr) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push('.');
        }
        out.push(chr);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands_with_dots() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1.000");
        assert_eq!(format_count(100_000), "100.000");
        assert_eq!(format_count(1_234_567), "1.234.567");
    }

    #[test]
    fn pad_truncates_and_fills() {
        assert_eq!(pad("abc", 5), "abc  ");
        assert_eq!(pad("abcdef", 4), "abcd");
    }
}
