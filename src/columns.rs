use std::borrow::Cow;
use std::cmp::Ordering;

use crate::data::Person;

pub const COLUMN_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnId {
    FirstName,
    LastName,
    Age,
    FavoriteGenre,
}

// Static per-column configuration. Behavior is selected by matching on
// ColumnId, there are no polymorphic column objects.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub id: ColumnId,
    pub name: &'static str,
    pub title: &'static str,
    pub group: Option<&'static str>,
    pub sortable: bool,
    pub filterable: bool,
}

pub const COLUMNS: [ColumnSpec; COLUMN_COUNT] = [
    ColumnSpec {
        id: ColumnId::FirstName,
        name: "firstName",
        title: "First Name",
        group: Some("Names"),
        sortable: true,
        filterable: true,
    },
    ColumnSpec {
        id: ColumnId::LastName,
        name: "lastName",
        title: "Last Name",
        group: Some("Names"),
        sortable: true,
        filterable: true,
    },
    ColumnSpec {
        id: ColumnId::Age,
        name: "age",
        title: "Age",
        group: None,
        sortable: true,
        filterable: false,
    },
    ColumnSpec {
        id: ColumnId::FavoriteGenre,
        name: "favoriteGenre",
        title: "Favorite Genre",
        group: None,
        sortable: false,
        filterable: true,
    },
];

impl ColumnId {
    pub fn index(self) -> usize {
        match self {
            ColumnId::FirstName => 0,
            ColumnId::LastName => 1,
            ColumnId::Age => 2,
            ColumnId::FavoriteGenre => 3,
        }
    }

    pub fn spec(self) -> &'static ColumnSpec {
        &COLUMNS[self.index()]
    }

    pub fn from_name(name: &str) -> Option<ColumnId> {
        COLUMNS
            .iter()
            .find(|spec| spec.name.eq_ignore_ascii_case(name))
            .map(|spec| spec.id)
    }
}

impl Person {
    // Display text of one cell.
    pub fn cell(&self, column: ColumnId) -> Cow<'_, str> {
        match column {
            ColumnId::FirstName => Cow::Borrowed(self.first_name.as_str()),
            ColumnId::LastName => Cow::Borrowed(self.last_name.as_str()),
            ColumnId::Age => Cow::Owned(self.age.to_string()),
            ColumnId::FavoriteGenre => Cow::Borrowed(self.favorite_genre.as_str()),
        }
    }
}

// Per-column comparison. Age compares numerically, text columns byte-wise.
pub fn compare(a: &Person, b: &Person, column: ColumnId) -> Ordering {
    match column {
        ColumnId::FirstName => a.first_name.cmp(&b.first_name),
        ColumnId::LastName => a.last_name.cmp(&b.last_name),
        ColumnId::Age => a.age.cmp(&b.age),
        ColumnId::FavoriteGenre => a.favorite_genre.cmp(&b.favorite_genre),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_indices_match_the_config_table() {
        for (idx, spec) in COLUMNS.iter().enumerate() {
            assert_eq!(spec.id.index(), idx);
        }
    }

    #[test]
    fn lookup_by_name_is_case_insensitive() {
        assert_eq!(ColumnId::from_name("favoriteGenre"), Some(ColumnId::FavoriteGenre));
        assert_eq!(ColumnId::from_name("FAVORITEGENRE"), Some(ColumnId::FavoriteGenre));
        assert_eq!(ColumnId::from_name("colour"), None);
    }

    #[test]
    fn age_cell_renders_decimal_digits() {
        let person = Person {
            first_name: "Ada".to_string(),
            last_name: "Krause".to_string(),
            age: 7,
            favorite_genre: "Jazz".to_string(),
        };
        assert_eq!(person.cell(ColumnId::Age), "7");
        assert_eq!(person.cell(ColumnId::LastName), "Krause");
    }
}
