use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use rand::Rng;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

mod columns;
mod controller;
mod data;
mod domain;
mod grid;
mod inputter;
mod model;
mod ui;

use columns::ColumnId;
use controller::Controller;
use data::Dataset;
use domain::{GridConfig, GridError};
use grid::{Grid, SortDirection, SortKey};
use model::{Model, Status};
use ui::GridUI;

#[derive(Parser, Debug)]
#[command(
    name = "dg",
    version,
    about = "A tui based sortable, filterable, paginated data grid."
)]
struct Cli {
    /// Number of synthetic person records to generate
    #[arg(long, default_value_t = 100_000)]
    rows: usize,

    /// Rows per page
    #[arg(long, default_value_t = 10)]
    page_size: usize,

    /// Seed for the data generator; random if omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Initial sort as "column" or "column:desc", e.g. "lastName"
    #[arg(long, value_parser = parse_sort)]
    sort: Option<SortKey>,

    /// Initial column filter as "column=text", e.g. "favoriteGenre=Metal"
    #[arg(long = "filter", value_parser = parse_filter)]
    filters: Vec<(ColumnId, String)>,

    /// Initial zero based page index (clamped to the available pages)
    #[arg(long, default_value_t = 0)]
    page_index: usize,

    /// Append logs to this file; logging is disabled without it
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn parse_sort(s: &str) -> Result<SortKey, String> {
    let (name, direction) = match s.split_once(':') {
        Some((name, direction)) => (name, direction),
        None => (s, "asc"),
    };
    let column = ColumnId::from_name(name).ok_or_else(|| format!("unknown column '{name}'"))?;
    if !column.spec().sortable {
        return Err(format!("column '{name}' is not sortable"));
    }
    let direction = match direction {
        "asc" => SortDirection::Asc,
        "desc" => SortDirection::Desc,
        other => return Err(format!("direction must be 'asc' or 'desc', got '{other}'")),
    };
    Ok(SortKey { column, direction })
}

fn parse_filter(s: &str) -> Result<(ColumnId, String), String> {
    let (name, text) = s
        .split_once('=')
        .ok_or_else(|| "expected 'column=text'".to_string())?;
    let column = ColumnId::from_name(name).ok_or_else(|| format!("unknown column '{name}'"))?;
    if !column.spec().filterable {
        return Err(format!("column '{name}' is not filterable"));
    }
    Ok((column, text.to_string()))
}

fn init_logging(path: &Path) -> Result<(), GridError> {
    let file = std::fs::File::options()
        .create(true)
        .append(true)
        .open(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Arc::new(file)).with_ansi(false))
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| GridError::LoggingInit(e.to_string()))?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Err(e) => {
            ratatui::restore();
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
        Ok(_) => {
            ratatui::restore();
            ExitCode::SUCCESS
        }
    }
}

fn run(cli: Cli) -> Result<(), GridError> {
    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }
    info!("Starting dg!");

    let seed = cli.seed.unwrap_or_else(|| rand::rng().random());
    let dataset = Dataset::generate(cli.rows, seed);

    let mut grid = Grid::new(dataset, cli.page_size);
    for (column, text) in &cli.filters {
        grid.set_filter(*column, text);
    }
    if let Some(key) = cli.sort {
        grid.set_sort(vec![key]);
    }
    grid.set_page_index(cli.page_index);

    let config = GridConfig {
        event_poll_time: 100,
    };
    let mut model = Model::init(grid);
    let controller = Controller::new(&config);
    let ui = GridUI::new();

    // The terminal is the only attachment point the renderer has; failing
    // to acquire it aborts startup instead of attempting a degraded render.
    let mut terminal = ratatui::try_init().map_err(GridError::TerminalInit)?;

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|frame| ui.draw(model.get_uidata(), frame))?;

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(&model)? {
            model.update(message);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn sort_argument_parses_column_and_direction() {
        let key = parse_sort("lastName").unwrap();
        assert_eq!(key.column, ColumnId::LastName);
        assert_eq!(key.direction, SortDirection::Asc);

        let key = parse_sort("age:desc").unwrap();
        assert_eq!(key.column, ColumnId::Age);
        assert_eq!(key.direction, SortDirection::Desc);

        assert!(parse_sort("favoriteGenre").is_err());
        assert!(parse_sort("age:sideways").is_err());
        assert!(parse_sort("height").is_err());
    }

    #[test]
    fn filter_argument_parses_column_and_text() {
        let (column, text) = parse_filter("favoriteGenre=Metal").unwrap();
        assert_eq!(column, ColumnId::FavoriteGenre);
        assert_eq!(text, "Metal");

        assert!(parse_filter("age=34").is_err());
        assert!(parse_filter("favoriteGenre").is_err());
    }
}
