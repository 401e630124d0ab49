use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

pub const AGE_MAX: u8 = 40;

const FIRST_NAMES: &[&str] = &[
    "Aaron", "Alice", "Amara", "Ben", "Bianca", "Carlos", "Clara", "Daan",
    "Diego", "Elena", "Emma", "Felix", "Fiona", "Gustav", "Hanna", "Hugo",
    "Ines", "Ivan", "Jonas", "Julia", "Kai", "Katrin", "Lars", "Lena",
    "Liam", "Lucia", "Marek", "Marta", "Milan", "Nadia", "Noah", "Nora",
    "Oscar", "Paula", "Quentin", "Rosa", "Sam", "Sofia", "Theo", "Vera",
];

const LAST_NAMES: &[&str] = &[
    "Adler", "Baker", "Bauer", "Bergmann", "Claes", "Costa", "DeSmet",
    "Dubois", "Fischer", "Garcia", "Haas", "Hansen", "Hoffman", "Janssen",
    "Keller", "Kovacs", "Krause", "Lang", "Lemaire", "Lopez", "Martin",
    "Mercier", "Meyer", "Moreau", "Novak", "Olsen", "Peeters", "Richter",
    "Rossi", "Santos", "Schmidt", "Silva", "Smit", "Sørensen", "Vogel",
    "Wagner", "Weber", "Willems", "Wolf", "Zimmer",
];

// Genre vocabulary of the synthetic generator.
const GENRES: &[&str] = &[
    "Blues", "Classical", "Country", "Electronic", "Folk", "Funk", "Hip Hop",
    "Jazz", "Latin", "Metal", "Non Music", "Pop", "Rap", "Reggae", "Rock",
    "Soul", "World",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    pub age: u8,
    pub favorite_genre: String,
}

impl Person {
    fn random(rng: &mut StdRng) -> Self {
        Person {
            first_name: pick(rng, FIRST_NAMES),
            last_name: pick(rng, LAST_NAMES),
            age: rng.random_range(0..=AGE_MAX),
            favorite_genre: pick(rng, GENRES),
        }
    }
}

fn pick(rng: &mut StdRng, vocabulary: &[&str]) -> String {
    vocabulary[rng.random_range(0..vocabulary.len())].to_string()
}

// Immutable record store. Generated once at startup, iteration order is
// generation order.
pub struct Dataset {
    people: Vec<Person>,
}

impl Dataset {
    pub fn generate(rows: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let people = (0..rows).map(|_| Person::random(&mut rng)).collect();
        info!("Generated {rows} person records (seed {seed})");
        Dataset { people }
    }

    pub fn from_people(people: Vec<Person>) -> Self {
        Dataset { people }
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic_for_a_seed() {
        let a = Dataset::generate(50, 17);
        let b = Dataset::generate(50, 17);
        assert_eq!(a.people(), b.people());
    }

    #[test]
    fn ages_stay_in_bounds() {
        let dataset = Dataset::generate(500, 3);
        assert!(dataset.people().iter().all(|p| p.age <= AGE_MAX));
    }

    #[test]
    fn generates_the_requested_row_count() {
        assert_eq!(Dataset::generate(123, 0).len(), 123);
        assert!(Dataset::generate(0, 0).is_empty());
    }
}
