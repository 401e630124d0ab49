use std::cmp::Ordering;
use std::collections::HashSet;

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::columns::{COLUMN_COUNT, COLUMNS, ColumnId, ColumnSpec, compare};
use crate::data::{Dataset, Person};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: ColumnId,
    pub direction: SortDirection,
}

// One optional filter string per column. Absent or empty values never
// exclude rows; values set for non-filterable columns are retained but
// never consulted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    values: [Option<String>; COLUMN_COUNT],
}

impl FilterState {
    pub fn set(&mut self, column: ColumnId, text: &str) {
        self.values[column.index()] = if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        };
    }

    pub fn get(&self, column: ColumnId) -> Option<&str> {
        self.values[column.index()].as_deref()
    }

    pub fn clear(&mut self, column: ColumnId) {
        self.values[column.index()] = None;
    }

    pub fn clear_all(&mut self) {
        self.values = Default::default();
    }

    // Predicates that actually take part in filtering.
    fn active(&self) -> impl Iterator<Item = (ColumnId, &str)> {
        COLUMNS
            .iter()
            .filter(|spec| spec.filterable)
            .filter_map(|spec| self.get(spec.id).map(|text| (spec.id, text)))
    }
}

// Filter stage: AND of case-insensitive substring predicates. Returns
// dataset indices in generation order.
pub fn filter_rows(dataset: &Dataset, filters: &FilterState) -> Vec<usize> {
    let needles: Vec<(ColumnId, String)> = filters
        .active()
        .map(|(column, text)| (column, text.to_lowercase()))
        .collect();
    if needles.is_empty() {
        return (0..dataset.len()).collect();
    }

    let people = dataset.people();
    // Indexed parallel filter keeps the original relative order.
    let rows: Vec<usize> = (0..people.len())
        .into_par_iter()
        .filter(|&row| {
            needles.iter().all(|(column, needle)| {
                people[row].cell(*column).to_lowercase().contains(needle.as_str())
            })
        })
        .collect();
    trace!("Filter kept {}/{} rows", rows.len(), people.len());
    rows
}

// Facet index: distinct cell values per column over the filtered subset,
// collapsed by exact value equality.
pub fn facet_counts(dataset: &Dataset, rows: &[usize]) -> [usize; COLUMN_COUNT] {
    let people = dataset.people();
    let mut counts = [0; COLUMN_COUNT];
    for spec in &COLUMNS {
        let mut seen = HashSet::new();
        for &row in rows {
            seen.insert(people[row].cell(spec.id));
        }
        counts[spec.id.index()] = seen.len();
    }
    counts
}

// Sort stage: stable sort of the filtered index vector by the key
// sequence. Ties retain filtered order.
pub fn sort_rows(dataset: &Dataset, rows: &mut [usize], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }
    let people = dataset.people();
    rows.sort_by(|&a, &b| {
        for key in keys {
            let ord = match key.direction {
                SortDirection::Asc => compare(&people[a], &people[b], key.column),
                SortDirection::Desc => compare(&people[b], &people[a], key.column),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

#[derive(Debug, Clone, Copy)]
struct Pagination {
    page_index: usize,
    page_size: usize,
}

impl Pagination {
    fn page_count(&self, rows: usize) -> usize {
        std::cmp::max(1, rows.div_ceil(self.page_size))
    }

    fn clamp(&mut self, rows: usize) {
        self.page_index = std::cmp::min(self.page_index, self.page_count(rows) - 1);
    }

    // Contiguous page slice bounds, clamped to the available length.
    fn slice(&self, rows: usize) -> (usize, usize) {
        let begin = std::cmp::min(self.page_index * self.page_size, rows);
        let end = std::cmp::min(begin + self.page_size, rows);
        (begin, end)
    }
}

// Header metadata for one column, as shown by the renderer.
#[derive(Debug, Clone)]
pub struct ColumnHeader {
    pub spec: &'static ColumnSpec,
    pub sort: Option<SortDirection>,
    pub facet_count: usize,
    pub filter: Option<String>,
}

// View controller over the staged pipeline. Owns all grid state; the
// stages above are pure functions of (data, state).
//
// Mutations recompute strictly from the changed stage downward:
// filter changes rebuild the filtered set, facet counts and sort order;
// sort changes reorder the cached filtered set; page moves only clamp.
pub struct Grid {
    dataset: Dataset,
    filters: FilterState,
    sort: Vec<SortKey>,
    pagination: Pagination,
    filtered: Vec<usize>,
    sorted: Vec<usize>,
    facets: [usize; COLUMN_COUNT],
}

impl Grid {
    pub fn new(dataset: Dataset, page_size: usize) -> Self {
        let mut grid = Grid {
            dataset,
            filters: FilterState::default(),
            sort: Vec::new(),
            pagination: Pagination {
                page_index: 0,
                page_size: std::cmp::max(1, page_size),
            },
            filtered: Vec::new(),
            sorted: Vec::new(),
            facets: [0; COLUMN_COUNT],
        };
        grid.refilter();
        grid
    }

    fn refilter(&mut self) {
        self.filtered = filter_rows(&self.dataset, &self.filters);
        self.facets = facet_counts(&self.dataset, &self.filtered);
        self.resort();
    }

    fn resort(&mut self) {
        self.sorted = self.filtered.clone();
        sort_rows(&self.dataset, &mut self.sorted, &self.sort);
        self.pagination.clamp(self.sorted.len());
    }

    pub fn set_filter(&mut self, column: ColumnId, text: &str) {
        let next = if text.is_empty() { None } else { Some(text) };
        if self.filters.get(column) == next {
            return;
        }
        debug!("Filter {} = {:?}", column.spec().name, next);
        self.filters.set(column, text);
        // Narrowing or widening the result set moves back to the first page.
        self.pagination.page_index = 0;
        self.refilter();
    }

    pub fn clear_filter(&mut self, column: ColumnId) {
        if self.filters.get(column).is_none() {
            return;
        }
        self.filters.clear(column);
        self.pagination.page_index = 0;
        self.refilter();
    }

    pub fn clear_filters(&mut self) {
        if self.filters == FilterState::default() {
            return;
        }
        self.filters.clear_all();
        self.pagination.page_index = 0;
        self.refilter();
    }

    pub fn filter(&self, column: ColumnId) -> Option<&str> {
        self.filters.get(column)
    }

    // Three-state cycle: unsorted -> asc -> desc -> unsorted. Only one
    // column sorts at a time; toggling a non-sortable column is a no-op.
    pub fn toggle_sort(&mut self, column: ColumnId) {
        if !column.spec().sortable {
            trace!("Ignoring sort toggle on {}", column.spec().name);
            return;
        }
        let next = match self.sort_direction(column) {
            None => Some(SortDirection::Asc),
            Some(SortDirection::Asc) => Some(SortDirection::Desc),
            Some(SortDirection::Desc) => None,
        };
        debug!("Sort {} -> {:?}", column.spec().name, next);
        self.sort = match next {
            Some(direction) => vec![SortKey { column, direction }],
            None => Vec::new(),
        };
        self.resort();
    }

    // Replace the sort key sequence, dropping keys on non-sortable columns.
    pub fn set_sort(&mut self, keys: Vec<SortKey>) {
        self.sort = keys
            .into_iter()
            .filter(|key| key.column.spec().sortable)
            .collect();
        self.resort();
    }

    pub fn sort_direction(&self, column: ColumnId) -> Option<SortDirection> {
        self.sort
            .iter()
            .find(|key| key.column == column)
            .map(|key| key.direction)
    }

    pub fn first_page(&mut self) {
        self.pagination.page_index = 0;
    }

    pub fn previous_page(&mut self) {
        self.pagination.page_index = self.pagination.page_index.saturating_sub(1);
    }

    pub fn next_page(&mut self) {
        if self.can_next() {
            self.pagination.page_index += 1;
        }
    }

    pub fn last_page(&mut self) {
        self.pagination.page_index = self.page_count() - 1;
    }

    pub fn set_page_index(&mut self, page_index: usize) {
        self.pagination.page_index = page_index;
        self.pagination.clamp(self.sorted.len());
    }

    pub fn can_previous(&self) -> bool {
        self.pagination.page_index > 0
    }

    pub fn can_next(&self) -> bool {
        self.pagination.page_index + 1 < self.page_count()
    }

    pub fn page_index(&self) -> usize {
        self.pagination.page_index
    }

    pub fn page_count(&self) -> usize {
        self.pagination.page_count(self.sorted.len())
    }

    pub fn page_size(&self) -> usize {
        self.pagination.page_size
    }

    pub fn filtered_len(&self) -> usize {
        self.sorted.len()
    }

    pub fn total_len(&self) -> usize {
        self.dataset.len()
    }

    // Dataset indices of the current page, in sorted order.
    pub fn page_rows(&self) -> &[usize] {
        let (begin, end) = self.pagination.slice(self.sorted.len());
        &self.sorted[begin..end]
    }

    // The materialized page of records.
    pub fn page(&self) -> Vec<&Person> {
        let people = self.dataset.people();
        self.page_rows().iter().map(|&row| &people[row]).collect()
    }

    pub fn headers(&self) -> Vec<ColumnHeader> {
        COLUMNS
            .iter()
            .map(|spec| ColumnHeader {
                spec,
                sort: self.sort_direction(spec.id),
                facet_count: self.facets[spec.id.index()],
                filter: self.filters.get(spec.id).map(str::to_string),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(first: &str, last: &str, age: u8, genre: &str) -> Person {
        Person {
            first_name: first.to_string(),
            last_name: last.to_string(),
            age,
            favorite_genre: genre.to_string(),
        }
    }

    // Ages [34, 12, 34, 8, 21]; two Metal rows, the first and third
    // share an age to probe sort stability.
    fn fixture() -> Dataset {
        Dataset::from_people(vec![
            person("Alice", "Adler", 34, "Metal"),
            person("Ben", "Baker", 12, "Jazz"),
            person("Clara", "Costa", 34, "Metal"),
            person("Diego", "Dubois", 8, "Pop"),
            person("Emma", "Fischer", 21, "Jazz"),
        ])
    }

    fn ages(grid: &Grid) -> Vec<u8> {
        grid.page().iter().map(|p| p.age).collect()
    }

    #[test]
    fn substring_filter_is_case_insensitive() {
        let mut grid = Grid::new(fixture(), 10);
        grid.set_filter(ColumnId::FavoriteGenre, "met");
        assert_eq!(grid.filtered_len(), 2);
        assert!(grid.page().iter().all(|p| p.favorite_genre == "Metal"));
    }

    #[test]
    fn active_filters_are_anded() {
        let mut grid = Grid::new(fixture(), 10);
        grid.set_filter(ColumnId::FavoriteGenre, "jazz");
        grid.set_filter(ColumnId::FirstName, "em");
        let page = grid.page();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].first_name, "Emma");
    }

    #[test]
    fn empty_filters_never_exclude() {
        let mut grid = Grid::new(fixture(), 10);
        grid.set_filter(ColumnId::FirstName, "");
        assert_eq!(grid.filtered_len(), 5);
    }

    #[test]
    fn filters_on_non_filterable_columns_are_ignored() {
        let mut filters = FilterState::default();
        filters.set(ColumnId::Age, "34");
        let dataset = fixture();
        assert_eq!(filter_rows(&dataset, &filters), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn filtered_output_preserves_generation_order() {
        let dataset = fixture();
        let mut filters = FilterState::default();
        filters.set(ColumnId::FavoriteGenre, "a");
        // "Jazz" and "Metal" both contain 'a'
        assert_eq!(filter_rows(&dataset, &filters), vec![0, 1, 2, 4]);
    }

    #[test]
    fn sort_by_age_ascending_is_stable() {
        let mut grid = Grid::new(fixture(), 10);
        grid.toggle_sort(ColumnId::Age);
        assert_eq!(ages(&grid), vec![8, 12, 21, 34, 34]);
        // The two 34s keep their original relative order.
        let page = grid.page();
        assert_eq!(page[3].first_name, "Alice");
        assert_eq!(page[4].first_name, "Clara");
    }

    #[test]
    fn sort_toggle_cycles_through_three_states() {
        let mut grid = Grid::new(fixture(), 10);
        grid.toggle_sort(ColumnId::Age);
        assert_eq!(grid.sort_direction(ColumnId::Age), Some(SortDirection::Asc));
        grid.toggle_sort(ColumnId::Age);
        assert_eq!(grid.sort_direction(ColumnId::Age), Some(SortDirection::Desc));
        assert_eq!(ages(&grid), vec![34, 34, 21, 12, 8]);
        grid.toggle_sort(ColumnId::Age);
        assert_eq!(grid.sort_direction(ColumnId::Age), None);
        // Back to the unsorted, filtered order.
        assert_eq!(ages(&grid), vec![34, 12, 34, 8, 21]);
    }

    #[test]
    fn sort_toggle_on_non_sortable_column_is_a_no_op() {
        let mut grid = Grid::new(fixture(), 10);
        grid.toggle_sort(ColumnId::FavoriteGenre);
        assert_eq!(grid.sort_direction(ColumnId::FavoriteGenre), None);
        assert_eq!(ages(&grid), vec![34, 12, 34, 8, 21]);
    }

    #[test]
    fn tie_break_keys_apply_in_order() {
        let dataset = Dataset::from_people(vec![
            person("Nora", "Weber", 20, "Pop"),
            person("Ivan", "Adler", 20, "Pop"),
            person("Sam", "Adler", 10, "Pop"),
        ]);
        let mut rows: Vec<usize> = vec![0, 1, 2];
        sort_rows(
            &dataset,
            &mut rows,
            &[
                SortKey { column: ColumnId::Age, direction: SortDirection::Asc },
                SortKey { column: ColumnId::LastName, direction: SortDirection::Asc },
                SortKey { column: ColumnId::FirstName, direction: SortDirection::Desc },
            ],
        );
        assert_eq!(rows, vec![2, 1, 0]);
    }

    #[test]
    fn pages_concatenate_to_the_sorted_sequence() {
        let mut grid = Grid::new(fixture(), 2);
        grid.toggle_sort(ColumnId::Age);
        let sorted: Vec<usize> = {
            let mut rows: Vec<usize> = (0..5).collect();
            let dataset = fixture();
            sort_rows(
                &dataset,
                &mut rows,
                &[SortKey { column: ColumnId::Age, direction: SortDirection::Asc }],
            );
            rows
        };

        let mut concatenated = Vec::new();
        grid.first_page();
        for _ in 0..grid.page_count() {
            concatenated.extend_from_slice(grid.page_rows());
            grid.next_page();
        }
        assert_eq!(concatenated, sorted);
    }

    #[test]
    fn last_page_may_be_short() {
        // 5 rows at page size 2 paginate as [0,1], [2,3], [4].
        let mut grid = Grid::new(fixture(), 2);
        grid.set_page_index(2);
        assert_eq!(grid.page_count(), 3);
        assert_eq!(grid.page_rows(), &[4]);
    }

    #[test]
    fn navigation_is_a_no_op_at_the_boundaries() {
        let mut grid = Grid::new(fixture(), 2);
        assert!(!grid.can_previous());
        grid.previous_page();
        assert_eq!(grid.page_index(), 0);

        grid.last_page();
        assert_eq!(grid.page_index(), 2);
        assert!(!grid.can_next());
        grid.next_page();
        assert_eq!(grid.page_index(), 2);
    }

    #[test]
    fn availability_flags_track_the_page_index() {
        let mut grid = Grid::new(fixture(), 2);
        assert!(!grid.can_previous());
        assert!(grid.can_next());
        grid.next_page();
        assert!(grid.can_previous());
        assert!(grid.can_next());
        grid.last_page();
        assert!(grid.can_previous());
        assert!(!grid.can_next());
    }

    #[test]
    fn out_of_range_page_requests_clamp() {
        let mut grid = Grid::new(fixture(), 2);
        grid.set_page_index(99);
        assert_eq!(grid.page_index(), 2);
    }

    #[test]
    fn empty_result_set_still_has_one_page() {
        let mut grid = Grid::new(fixture(), 2);
        grid.set_filter(ColumnId::FirstName, "zzz");
        assert_eq!(grid.filtered_len(), 0);
        assert_eq!(grid.page_count(), 1);
        assert!(grid.page().is_empty());
        assert!(!grid.can_previous());
        assert!(!grid.can_next());
    }

    #[test]
    fn filter_change_returns_to_the_first_page() {
        let mut grid = Grid::new(fixture(), 2);
        grid.last_page();
        assert_eq!(grid.page_index(), 2);
        grid.set_filter(ColumnId::FavoriteGenre, "jazz");
        assert_eq!(grid.page_index(), 0);
        assert_eq!(grid.filtered_len(), 2);
    }

    #[test]
    fn facet_counts_follow_the_filtered_subset() {
        let mut grid = Grid::new(fixture(), 10);
        let headers = grid.headers();
        assert_eq!(headers[ColumnId::FavoriteGenre.index()].facet_count, 3);
        assert_eq!(headers[ColumnId::Age.index()].facet_count, 4);

        // Stale counts after a filter change would be a correctness bug.
        grid.set_filter(ColumnId::FavoriteGenre, "jazz");
        let headers = grid.headers();
        assert_eq!(headers[ColumnId::FavoriteGenre.index()].facet_count, 1);
        assert_eq!(headers[ColumnId::FirstName.index()].facet_count, 2);
    }

    #[test]
    fn headers_expose_the_column_config() {
        let grid = Grid::new(fixture(), 10);
        let headers = grid.headers();
        assert_eq!(headers.len(), COLUMN_COUNT);
        assert!(headers[0].spec.sortable && headers[0].spec.filterable);
        assert!(!headers[ColumnId::Age.index()].spec.filterable);
        assert!(!headers[ColumnId::FavoriteGenre.index()].spec.sortable);
        assert_eq!(headers[1].spec.group, Some("Names"));
    }

    #[test]
    fn set_sort_drops_non_sortable_keys() {
        let mut grid = Grid::new(fixture(), 10);
        grid.set_sort(vec![
            SortKey { column: ColumnId::FavoriteGenre, direction: SortDirection::Asc },
            SortKey { column: ColumnId::Age, direction: SortDirection::Desc },
        ]);
        assert_eq!(grid.sort_direction(ColumnId::FavoriteGenre), None);
        assert_eq!(ages(&grid), vec![34, 34, 21, 12, 8]);
    }

    #[test]
    fn page_size_has_a_floor_of_one() {
        let grid = Grid::new(fixture(), 0);
        assert_eq!(grid.page_size(), 1);
        assert_eq!(grid.page_count(), 5);
    }
}
