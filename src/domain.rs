use std::io::Error;

use ratatui::crossterm::event::KeyEvent;

// Errors that can abort the application. Everything inside the grid
// pipeline is total; only startup and terminal IO can fail.
#[derive(Debug)]
pub enum GridError {
    IoError(Error),
    TerminalInit(Error),
    LoggingInit(String),
}

impl From<Error> for GridError {
    fn from(err: Error) -> Self {
        GridError::IoError(err)
    }
}

#[derive(Debug, Clone)]
pub struct GridConfig {
    pub event_poll_time: u64,
}

// User interaction events, produced by the controller and consumed
// by the model.
#[derive(Debug, Clone, Copy)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    FirstPage,
    PreviousPage,
    NextPage,
    LastPage,
    ToggleSort,
    EditFilter,
    ClearFilter,
    ClearAllFilters,
    CopyRow,
    Help,
    Exit,
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "
dg - data grid

Navigation
  Left/Right       select column
  Up/Down          select row (crosses page boundaries)
  n / PageDown     next page
  p / PageUp       previous page
  g / Home         first page
  G / End          last page

Grid
  s                cycle sort on column (asc -> desc -> off)
  /                edit column filter (Enter keeps, Esc restores)
  c                clear column filter
  C                clear all filters
  y                copy selected row to clipboard (CSV)

Other
  ?                this help
  Esc              close popup / cancel input
  q                quit
";
