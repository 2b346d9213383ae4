use crate::data::{CountryRecord, LanguageTable};
use crate::selection::Selection;

/// Border-dataset country names → language-dataset names
const NAME_ALIASES: &[(&str, &str)] = &[
    ("United States of America", "USA"),
    ("United Kingdom", "Great-Britain"),
    ("Czech Republic", "Czechia"),
    ("Republic of Congo", "Congo"),
    ("Democratic Republic of the Congo", "Democratic-Rep-Congo"),
    ("Dominican Republic", "Dominican-Rep"),
    ("Bosnia and Herzegovina", "Bosnia-Herzegovina"),
    ("Ivory Coast", "Cote-dIvoire"),
    ("The Bahamas", "Bahamas"),
    ("United Republic of Tanzania", "Tanzania"),
    ("Republic of Serbia", "Serbia"),
    ("Turkey", "Türkiye"),
    ("Laos", "Lao"),
    ("Swaziland", "eSwatini"),
    ("Burkina Faso", "Burkina-Faso"),
    ("Guinea Bissau", "Guinea Bissau"),
    ("Saudi Arabia", "Saudi-Arabia"),
    ("Costa Rica", "Costa-Rica"),
    ("El Salvador", "El-Salvador"),
    ("South Korea", "South Korea"),
    ("North Korea", "North Korea"),
    ("South Sudan", "South Sudan"),
    ("Sri Lanka", "Sri Lanka"),
    ("East Timor", "East Timor"),
    ("Papua New Guinea", "Papua New Guinea"),
    ("New Zealand", "New Zealand"),
    ("Solomon Islands", "Solomon Islands"),
    ("Marshall Islands", "Marshall Islands"),
    ("Trinidad and Tobago", "Trinidad and Tobago"),
    ("Equatorial Guinea", "Equatorial Guinea"),
    ("Central African Republic", "Central African Republic"),
    ("United Arab Emirates", "United Arab Emirates"),
    ("Sierra Leone", "Sierra Leone"),
    ("Cabo Verde", "Cabo-Verde"),
    ("Greenland", "Denmark"),
];

fn alias(name: &str) -> Option<&'static str> {
    NAME_ALIASES
        .iter()
        .find(|(border_name, _)| *border_name == name)
        .map(|(_, dataset_name)| *dataset_name)
}

/// Maps border country names plus the current selection to a language
pub struct Resolver {
    table: LanguageTable,
}

impl Resolver {
    pub fn new(table: LanguageTable) -> Self {
        Self { table }
    }

    /// Dataset row name and record for a border country name.
    ///
    /// Tries the alias table (or the name itself), then spaces → hyphens,
    /// then hyphens → spaces.
    pub fn lookup(&self, country_name: &str) -> Option<(String, &CountryRecord)> {
        let candidate = alias(country_name).unwrap_or(country_name);

        if let Some(record) = self.table.record(candidate) {
            return Some((candidate.to_string(), record));
        }
        if candidate.contains(' ') {
            let hyphenated = candidate.replace(' ', "-");
            if let Some(record) = self.table.record(&hyphenated) {
                return Some((hyphenated, record));
            }
        }
        if candidate.contains('-') {
            let spaced = candidate.replace('-', " ");
            if let Some(record) = self.table.record(&spaced) {
                return Some((spaced, record));
            }
        }
        None
    }

    /// Language for the country at the selected year and rank
    pub fn resolve(&self, country_name: &str, selection: Selection) -> Option<&str> {
        let (_, record) = self.lookup(country_name)?;
        record.language(selection.year, selection.rank)
    }
}
