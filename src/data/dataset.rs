use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Languages of one country, by year then rank
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CountryRecord {
    years: BTreeMap<i32, BTreeMap<u8, String>>,
}

impl CountryRecord {
    pub fn language(&self, year: i32, rank: u8) -> Option<&str> {
        self.years.get(&year)?.get(&rank).map(String::as_str)
    }

    fn insert(&mut self, year: i32, rank: u8, language: &str) {
        self.years.entry(year).or_default().insert(rank, language.to_string());
    }
}

/// The language dataset: country name → per-year, per-rank language
#[derive(Clone, Debug, Default)]
pub struct LanguageTable {
    records: HashMap<String, CountryRecord>,
}

/// Parse a `pop<rank>_<year>` column name into (rank, year)
fn parse_column(name: &str) -> Option<(u8, i32)> {
    let rest = name.trim().strip_prefix("pop")?;
    let (rank, year) = rest.split_once('_')?;

    if rank.len() != 1 || year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let rank = rank.parse().ok()?;
    let year = year.parse().ok()?;
    Some((rank, year))
}

impl LanguageTable {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        Self::from_reader(file).with_context(|| format!("parsing {}", path.display()))
    }

    /// Read CSV whose first column is the country name; `popN_YYYY` columns hold languages.
    /// Empty or missing cells mean no entry.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<Option<(u8, i32)>> = csv.headers()?.iter().map(parse_column).collect();

        let mut records = HashMap::new();
        for row in csv.records() {
            let row = row?;
            let Some(country) = row.get(0).filter(|c| !c.is_empty()) else {
                continue;
            };

            let mut record = CountryRecord::default();
            for (cell, column) in row.iter().zip(&columns).skip(1) {
                if let Some((rank, year)) = column {
                    if !cell.is_empty() {
                        record.insert(*year, *rank, cell);
                    }
                }
            }
            records.insert(country.to_string(), record);
        }

        Ok(Self { records })
    }

    pub fn record(&self, country: &str) -> Option<&CountryRecord> {
        self.records.get(country)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
