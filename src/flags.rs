use tracing::warn;

/// Language name → ISO 3166-1 alpha-2 code of the flag used for it.
/// Covers every language present in the dataset.
const LANGUAGE_TO_COUNTRY_CODE: &[(&str, &str)] = &[
    ("Arabic", "sa"),
    ("Chinese", "cn"),
    ("Danish", "dk"),
    ("English", "gb"),
    ("Finnish", "fi"),
    ("French", "fr"),
    ("German", "de"),
    ("Guarani", "py"),
    ("Hebrew", "il"),
    ("Hindi", "in"),
    ("Irish", "ie"),
    ("Italian", "it"),
    ("Japanese", "jp"),
    ("Korean", "kr"),
    ("Norwegian", "no"),
    ("Portuguese", "pt"),
    ("Russian", "ru"),
    ("Spanish", "es"),
    ("Swahili", "ke"),
    ("Swedish", "se"),
    ("Turkish", "tr"),
];

pub fn country_code(language: &str) -> Option<&'static str> {
    LANGUAGE_TO_COUNTRY_CODE
        .iter()
        .find(|(name, _)| *name == language)
        .map(|(_, code)| *code)
}

/// Flag image URL for a language, relative to the asset root.
/// Unmapped languages are logged and yield `None`.
pub fn flag_url(language: &str) -> Option<String> {
    match country_code(language) {
        Some(code) => Some(format!("./flags/{code}.png")),
        None => {
            warn!(language, "no flag mapping for language");
            None
        }
    }
}
