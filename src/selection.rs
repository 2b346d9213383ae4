use crate::config::{DEFAULT_RANK, DEFAULT_YEAR, MAX_YEAR, MIN_YEAR};
use url::form_urlencoded;

/// Which year and popularity rank the map shows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub year: i32,
    pub rank: u8,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            year: DEFAULT_YEAR,
            rank: DEFAULT_RANK,
        }
    }
}

impl Selection {
    pub fn valid_year(year: i32) -> bool {
        (MIN_YEAR..=MAX_YEAR).contains(&year)
    }

    pub fn valid_rank(rank: u8) -> bool {
        rank == 1 || rank == 2
    }

    /// Read `year` and `rank` from a query string. A leading `?` is allowed.
    /// Missing or out-of-range values fall back to their defaults independently.
    pub fn from_query(query: &str) -> Self {
        let mut selection = Self::default();
        let query = query.strip_prefix('?').unwrap_or(query);

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "year" => {
                    if let Some(year) = value.trim().parse().ok().filter(|y| Self::valid_year(*y)) {
                        selection.year = year;
                    }
                }
                "rank" => {
                    if let Some(rank) = value.trim().parse().ok().filter(|r| Self::valid_rank(*r)) {
                        selection.rank = rank;
                    }
                }
                _ => {}
            }
        }
        selection
    }

    /// Query string for this selection; default values are omitted
    pub fn to_query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if self.year != DEFAULT_YEAR {
            query.append_pair("year", &self.year.to_string());
        }
        if self.rank != DEFAULT_RANK {
            query.append_pair("rank", &self.rank.to_string());
        }
        query.finish()
    }

    /// Step the year, staying inside the valid range. Returns whether it changed.
    pub fn step_year(&mut self, delta: i32) -> bool {
        let year = (self.year + delta).clamp(MIN_YEAR, MAX_YEAR);
        let changed = year != self.year;
        self.year = year;
        changed
    }

    /// Returns whether the rank changed
    pub fn set_rank(&mut self, rank: u8) -> bool {
        if !Self::valid_rank(rank) || rank == self.rank {
            return false;
        }
        self.rank = rank;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_omitted() {
        assert_eq!(Selection::default().to_query(), "");
        let s = Selection { year: 2022, rank: 1 };
        assert_eq!(s.to_query(), "year=2022");
        let s = Selection { year: 2025, rank: 2 };
        assert_eq!(s.to_query(), "rank=2");
    }

    #[test]
    fn test_query_round_trip() {
        let s = Selection { year: 2021, rank: 2 };
        assert_eq!(Selection::from_query(&s.to_query()), s);
        assert_eq!(Selection::from_query("?year=2021&rank=2"), s);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        assert_eq!(
            Selection::from_query("year=1999&rank=2"),
            Selection { year: 2025, rank: 2 }
        );
        assert_eq!(
            Selection::from_query("year=2020&rank=3"),
            Selection { year: 2020, rank: 1 }
        );
        assert_eq!(Selection::from_query("year=abc&rank="), Selection::default());
        assert_eq!(Selection::from_query(""), Selection::default());
    }

    #[test]
    fn test_step_year_clamps() {
        let mut s = Selection::default();
        assert!(!s.step_year(1));
        assert!(s.step_year(-1));
        assert_eq!(s.year, 2024);
        s.step_year(-100);
        assert_eq!(s.year, 2020);
    }

    #[test]
    fn test_set_rank() {
        let mut s = Selection::default();
        assert!(!s.set_rank(1));
        assert!(!s.set_rank(5));
        assert!(s.set_rank(2));
        assert_eq!(s.rank, 2);
    }
}
