use std::time::Instant;

use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, trace};

use crate::columns::{COLUMN_COUNT, COLUMNS, ColumnId};
use crate::domain::{HELP_TEXT, Message};
use crate::grid::{ColumnHeader, Grid};
use crate::inputter::{InputResult, Inputter};

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy)]
enum Modus {
    GRID,
    FILTERINPUT,
    POPUP,
}

// Snapshot of everything the renderer needs. Rebuilt by the model after
// every state change, never mutated by the UI.
pub struct UIData {
    pub headers: Vec<ColumnHeader>,
    pub rows: Vec<Vec<String>>,
    pub cursor_row: usize,
    pub cursor_column: usize,
    pub filtered_rows: usize,
    pub total_rows: usize,
    pub page_index: usize,
    pub page_count: usize,
    pub can_previous: bool,
    pub can_next: bool,
    pub show_popup: bool,
    pub popup_message: String,
    pub cmdinput: InputResult,
    pub active_cmdinput: bool,
    pub input_column: Option<ColumnId>,
    pub status_message: String,
    pub last_status_message_update: Instant,
    pub last_update: Instant,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            headers: Vec::new(),
            rows: Vec::new(),
            cursor_row: 0,
            cursor_column: 0,
            filtered_rows: 0,
            total_rows: 0,
            page_index: 0,
            page_count: 1,
            can_previous: false,
            can_next: false,
            show_popup: false,
            popup_message: String::new(),
            cmdinput: InputResult::default(),
            active_cmdinput: false,
            input_column: None,
            status_message: String::new(),
            last_status_message_update: Instant::now(),
            last_update: Instant::now(),
        }
    }
}

pub struct Model {
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    grid: Grid,
    cursor_row: usize,
    cursor_column: usize,
    input: Inputter,
    last_input: InputResult,
    active_cmdinput: bool,
    input_column: Option<ColumnId>,
    saved_filter: Option<String>,
    clipboard: Option<Clipboard>,
    status_message: String,
    last_status_message_update: Instant,
    uidata: UIData,
}

impl Model {
    pub fn init(grid: Grid) -> Self {
        let clipboard = match Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(e) => {
                debug!("Clipboard unavailable: {e:?}");
                None
            }
        };
        let mut model = Self {
            status: Status::READY,
            modus: Modus::GRID,
            previous_modus: Modus::GRID,
            grid,
            cursor_row: 0,
            cursor_column: 0,
            input: Inputter::default(),
            last_input: InputResult::default(),
            active_cmdinput: false,
            input_column: None,
            saved_filter: None,
            clipboard,
            status_message: "Started dg! Press ? for help.".to_string(),
            last_status_message_update: Instant::now(),
            uidata: UIData::empty(),
        };
        model.update_uidata();
        model
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn raw_keyevents(&self) -> bool {
        self.active_cmdinput
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn update(&mut self, message: Message) {
        match self.modus {
            Modus::GRID => match message {
                Message::Quit => self.quit(),
                Message::MoveUp => self.move_selection_up(),
                Message::MoveDown => self.move_selection_down(),
                Message::MoveLeft => self.move_selection_left(),
                Message::MoveRight => self.move_selection_right(),
                Message::FirstPage => self.goto_page(Page::First),
                Message::PreviousPage => self.goto_page(Page::Previous),
                Message::NextPage => self.goto_page(Page::Next),
                Message::LastPage => self.goto_page(Page::Last),
                Message::ToggleSort => self.toggle_sort(),
                Message::EditFilter => self.edit_filter(),
                Message::ClearFilter => self.clear_filter(),
                Message::ClearAllFilters => self.clear_all_filters(),
                Message::CopyRow => self.copy_row(),
                Message::Help => self.show_help(),
                Message::Exit => trace!("Esc in grid modus"),
                Message::RawKey(_) => {}
            },
            Modus::FILTERINPUT => {
                if let Message::RawKey(key) = message {
                    self.raw_input(key);
                }
            }
            Modus::POPUP => match message {
                Message::Quit => self.quit(),
                Message::Exit | Message::Help => self.close_popup(),
                _ => {}
            },
        }
        self.update_uidata();
    }

    // -------------------- Control handling functions ---------------------- //

    fn current_column(&self) -> ColumnId {
        COLUMNS[self.cursor_column].id
    }

    fn page_len(&self) -> usize {
        self.grid.page_rows().len()
    }

    fn clamp_cursor_row(&mut self) {
        self.cursor_row = std::cmp::min(self.cursor_row, self.page_len().saturating_sub(1));
    }

    fn move_selection_up(&mut self) {
        if self.cursor_row > 0 {
            self.cursor_row -= 1;
        } else if self.grid.can_previous() {
            // Crossing the top of the page scrolls one page back.
            self.grid.previous_page();
            self.cursor_row = self.page_len().saturating_sub(1);
        }
    }

    fn move_selection_down(&mut self) {
        if self.cursor_row + 1 < self.page_len() {
            self.cursor_row += 1;
        } else if self.grid.can_next() {
            self.grid.next_page();
            self.cursor_row = 0;
        }
    }

    fn move_selection_left(&mut self) {
        self.cursor_column = self.cursor_column.saturating_sub(1);
    }

    fn move_selection_right(&mut self) {
        if self.cursor_column + 1 < COLUMN_COUNT {
            self.cursor_column += 1;
        }
    }

    fn goto_page(&mut self, page: Page) {
        match page {
            Page::First => self.grid.first_page(),
            Page::Previous => self.grid.previous_page(),
            Page::Next => self.grid.next_page(),
            Page::Last => self.grid.last_page(),
        }
        self.clamp_cursor_row();
    }

    fn toggle_sort(&mut self) {
        let column = self.current_column();
        if !column.spec().sortable {
            self.set_status_message(format!("Column {} is not sortable", column.spec().title));
            return;
        }
        self.grid.toggle_sort(column);
        let state = match self.grid.sort_direction(column) {
            Some(direction) => format!("{direction:?}"),
            None => "off".to_string(),
        };
        self.set_status_message(format!("Sort {}: {}", column.spec().title, state));
        self.clamp_cursor_row();
    }

    fn edit_filter(&mut self) {
        let column = self.current_column();
        if !column.spec().filterable {
            self.set_status_message(format!("Column {} has no filter", column.spec().title));
            return;
        }
        trace!("Entering filter input for {}", column.spec().name);
        self.previous_modus = self.modus;
        self.modus = Modus::FILTERINPUT;
        self.active_cmdinput = true;
        self.input_column = Some(column);
        self.saved_filter = self.grid.filter(column).map(str::to_string);

        self.input.clear();
        if let Some(current) = &self.saved_filter {
            self.input.set(current);
        }
        self.last_input = self.input.get();
    }

    // Filter keystrokes apply on every change; Esc restores the value the
    // edit started from.
    fn raw_input(&mut self, key: KeyEvent) {
        let Some(column) = self.input_column else {
            return;
        };
        self.last_input = self.input.read(key);

        if self.last_input.finished {
            if self.last_input.canceled {
                let saved = self.saved_filter.take().unwrap_or_default();
                self.grid.set_filter(column, &saved);
                self.set_status_message("Filter edit canceled".to_string());
            } else {
                self.set_status_message(format!(
                    "{} rows match",
                    self.grid.filtered_len()
                ));
            }
            self.active_cmdinput = false;
            self.input_column = None;
            self.modus = self.previous_modus;
            self.previous_modus = Modus::FILTERINPUT;
        } else {
            self.grid.set_filter(column, &self.last_input.input);
        }
        self.clamp_cursor_row();
    }

    fn clear_filter(&mut self) {
        let column = self.current_column();
        self.grid.clear_filter(column);
        self.clamp_cursor_row();
        self.set_status_message(format!("Cleared filter on {}", column.spec().title));
    }

    fn clear_all_filters(&mut self) {
        self.grid.clear_filters();
        self.clamp_cursor_row();
        self.set_status_message("Cleared all filters".to_string());
    }

    fn wrap_cell_content(c: &str) -> String {
        let needs_escaping = c.chars().any(|c| c == '"');
        let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
        let mut out = String::from(c);

        if needs_escaping {
            out = out.replace("\"", "\"\"");
        }
        if needs_wrapping {
            out = format!("\"{out}\"");
        }
        out
    }

    fn copy_row(&mut self) {
        let page = self.grid.page();
        let Some(person) = page.get(self.cursor_row) else {
            self.set_status_message("Nothing to copy".to_string());
            return;
        };
        let content = COLUMNS
            .iter()
            .map(|spec| Self::wrap_cell_content(&person.cell(spec.id)))
            .collect::<Vec<String>>();
        let row_content = content.join(",");

        match self.clipboard.as_mut().map(|c| c.set_text(row_content)) {
            Some(Ok(_)) => self.set_status_message("Copied row to clipboard".to_string()),
            Some(Err(e)) => {
                trace!("Error copying to clipboard: {e:?}");
                self.set_status_message("Copy failed".to_string());
            }
            None => self.set_status_message("Clipboard unavailable".to_string()),
        }
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
    }

    fn close_popup(&mut self) {
        trace!("Close popup ...");
        self.modus = self.previous_modus;
        self.previous_modus = Modus::POPUP;
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
    }

    // -------------------- Derived view ---------------------- //

    fn update_uidata(&mut self) {
        let rows = self
            .grid
            .page()
            .iter()
            .map(|person| {
                COLUMNS
                    .iter()
                    .map(|spec| person.cell(spec.id).into_owned())
                    .collect()
            })
            .collect();

        self.uidata = UIData {
            headers: self.grid.headers(),
            rows,
            cursor_row: self.cursor_row,
            cursor_column: self.cursor_column,
            filtered_rows: self.grid.filtered_len(),
            total_rows: self.grid.total_len(),
            page_index: self.grid.page_index(),
            page_count: self.grid.page_count(),
            can_previous: self.grid.can_previous(),
            can_next: self.grid.can_next(),
            show_popup: matches!(self.modus, Modus::POPUP),
            popup_message: HELP_TEXT.to_string(),
            cmdinput: self.last_input.clone(),
            active_cmdinput: self.active_cmdinput,
            input_column: self.input_column,
            status_message: self.status_message.clone(),
            last_status_message_update: self.last_status_message_update,
            last_update: Instant::now(),
        };
    }
}

#[derive(Debug, Clone, Copy)]
enum Page {
    First,
    Previous,
    Next,
    Last,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Dataset, Person};
    use crate::grid::SortDirection;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};

    fn person(first: &str, last: &str, age: u8, genre: &str) -> Person {
        Person {
            first_name: first.to_string(),
            last_name: last.to_string(),
            age,
            favorite_genre: genre.to_string(),
        }
    }

    fn model() -> Model {
        let dataset = Dataset::from_people(vec![
            person("Alice", "Adler", 34, "Metal"),
            person("Ben", "Baker", 12, "Jazz"),
            person("Clara", "Costa", 34, "Metal"),
            person("Diego", "Dubois", 8, "Pop"),
            person("Emma", "Fischer", 21, "Jazz"),
        ]);
        Model::init(Grid::new(dataset, 2))
    }

    fn key(model: &mut Model, code: KeyCode) {
        model.update(Message::RawKey(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    #[test]
    fn moving_down_crosses_the_page_boundary() {
        let mut model = model();
        model.update(Message::MoveDown);
        assert_eq!(model.get_uidata().cursor_row, 1);
        model.update(Message::MoveDown);
        let uidata = model.get_uidata();
        assert_eq!(uidata.page_index, 1);
        assert_eq!(uidata.cursor_row, 0);
    }

    #[test]
    fn page_navigation_reports_availability() {
        let mut model = model();
        assert!(!model.get_uidata().can_previous);
        model.update(Message::LastPage);
        let uidata = model.get_uidata();
        assert_eq!(uidata.page_index, 2);
        assert!(uidata.can_previous);
        assert!(!uidata.can_next);
        // No-op at the boundary.
        model.update(Message::NextPage);
        assert_eq!(model.get_uidata().page_index, 2);
    }

    #[test]
    fn sort_toggle_on_non_sortable_column_changes_nothing() {
        let mut model = model();
        for _ in 0..3 {
            model.update(Message::MoveRight);
        }
        model.update(Message::ToggleSort);
        let uidata = model.get_uidata();
        assert!(uidata.headers.iter().all(|h| h.sort.is_none()));
        assert_eq!(uidata.rows[0][0], "Alice");
    }

    #[test]
    fn filter_input_applies_live_and_esc_restores() {
        let mut model = model();
        model.update(Message::EditFilter);
        assert!(model.raw_keyevents());
        key(&mut model, KeyCode::Char('e'));
        key(&mut model, KeyCode::Char('m'));
        assert_eq!(model.get_uidata().filtered_rows, 1);
        key(&mut model, KeyCode::Esc);
        let uidata = model.get_uidata();
        assert!(!uidata.active_cmdinput);
        assert_eq!(uidata.filtered_rows, 5);
    }

    #[test]
    fn filter_input_commits_on_enter() {
        let mut model = model();
        model.update(Message::EditFilter);
        key(&mut model, KeyCode::Char('a'));
        key(&mut model, KeyCode::Char('l'));
        key(&mut model, KeyCode::Enter);
        let uidata = model.get_uidata();
        assert!(!uidata.active_cmdinput);
        assert_eq!(uidata.filtered_rows, 1);
        assert_eq!(uidata.rows[0][0], "Alice");
    }

    #[test]
    fn editing_a_non_filterable_column_is_refused() {
        let mut model = model();
        model.update(Message::MoveRight);
        model.update(Message::MoveRight); // Age
        model.update(Message::EditFilter);
        assert!(!model.raw_keyevents());
    }

    #[test]
    fn narrowing_filter_clamps_the_cursor() {
        let mut model = model();
        model.update(Message::LastPage);
        model.update(Message::EditFilter);
        key(&mut model, KeyCode::Char('b'));
        let uidata = model.get_uidata();
        assert_eq!(uidata.page_index, 0);
        assert!(uidata.cursor_row < uidata.rows.len().max(1));
    }

    #[test]
    fn toggling_sort_from_the_model_cycles_direction() {
        let mut model = model();
        model.update(Message::MoveRight);
        model.update(Message::MoveRight); // Age
        model.update(Message::ToggleSort);
        assert_eq!(
            model.get_uidata().headers[2].sort,
            Some(SortDirection::Asc)
        );
        assert_eq!(model.get_uidata().rows[0][2], "8");
        model.update(Message::ToggleSort);
        assert_eq!(model.get_uidata().rows[0][2], "34");
        model.update(Message::ToggleSort);
        assert_eq!(model.get_uidata().headers[2].sort, None);
    }

    #[test]
    fn help_popup_opens_and_closes() {
        let mut model = model();
        model.update(Message::Help);
        assert!(model.get_uidata().show_popup);
        model.update(Message::Exit);
        assert!(!model.get_uidata().show_popup);
    }
}
