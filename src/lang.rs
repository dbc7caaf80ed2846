//! Language tags and ordered language pairs.
//!
//! Tags are resolved against the ISO 639 registry and always carry their
//! canonical string form, which is what equality, hashing and display use.
//! A tag is written as a primary language code optionally followed by
//! underscore-separated script and region subtags (`por_BR`, `zho_Hant`).
//! The hyphen only ever separates the two sides of a pair.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use isolang::Language;
use log::{debug, info};

use crate::error::MtdataError;

/// A canonical language identifier.
///
/// Only produced by [`resolve_tag`]; there is no way to build one from an
/// arbitrary string without going through the registry.
#[derive(Clone)]
pub struct LanguageTag {
    language: Language,
    script: Option<String>,
    region: Option<String>,
    canonical: String,
}

impl LanguageTag {
    /// The ISO 639-3 code of the primary language.
    pub fn code(&self) -> &'static str {
        self.language.to_639_3()
    }

    /// English name of the primary language.
    pub fn name(&self) -> &'static str {
        self.language.to_name()
    }

    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// The canonical string form, e.g. `deu` or `por_BR`.
    pub fn as_str(&self) -> &str {
        &self.canonical
    }
}

impl PartialEq for LanguageTag {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for LanguageTag {}

impl Hash for LanguageTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl PartialOrd for LanguageTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LanguageTag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical.cmp(&other.canonical)
    }
}

impl fmt::Debug for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LanguageTag({})", self.canonical)
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

/// Resolve a raw language code into its canonical tag.
///
/// Accepts ISO 639-1 and 639-3 primary codes in any case, followed by an
/// optional 4-letter script and an optional 2-letter or 3-digit region.
pub fn resolve_tag(raw: &str) -> Result<LanguageTag, MtdataError> {
    let unknown = || MtdataError::UnknownLanguage {
        code: raw.to_string(),
    };

    let mut subtags = raw.trim().split('_');
    let primary = subtags.next().unwrap_or_default().to_ascii_lowercase();
    let language = match primary.len() {
        2 => Language::from_639_1(&primary),
        3 => Language::from_639_3(&primary),
        _ => None,
    }
    .ok_or_else(unknown)?;

    let mut script = None;
    let mut region = None;
    for subtag in subtags {
        if script.is_none() && region.is_none() && is_script(subtag) {
            script = Some(title_case(subtag));
        } else if region.is_none() && is_region(subtag) {
            region = Some(subtag.to_ascii_uppercase());
        } else {
            return Err(unknown());
        }
    }

    let mut canonical = language.to_639_3().to_string();
    for subtag in [&script, &region].into_iter().flatten() {
        canonical.push('_');
        canonical.push_str(subtag);
    }

    Ok(LanguageTag {
        language,
        script,
        region,
        canonical,
    })
}

fn is_script(subtag: &str) -> bool {
    subtag.len() == 4 && subtag.chars().all(|c| c.is_ascii_alphabetic())
}

fn is_region(subtag: &str) -> bool {
    (subtag.len() == 2 && subtag.chars().all(|c| c.is_ascii_alphabetic()))
        || (subtag.len() == 3 && subtag.chars().all(|c| c.is_ascii_digit()))
}

fn title_case(subtag: &str) -> String {
    let lower = subtag.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// An ordered (source, target) pair of language tags.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LangPair {
    pub source: LanguageTag,
    pub target: LanguageTag,
}

impl LangPair {
    pub fn new(source: LanguageTag, target: LanguageTag) -> Self {
        Self { source, target }
    }

    /// The same languages in the opposite direction.
    pub fn reversed(&self) -> Self {
        Self::new(self.target.clone(), self.source.clone())
    }

    /// True if `other` names the same two languages in either direction.
    pub fn is_compatible(&self, other: &LangPair) -> bool {
        self == other || self.reversed() == *other
    }

    /// Both tags joined with `sep`.
    pub fn joined(&self, sep: &str) -> String {
        format!("{}{}{}", self.source, sep, self.target)
    }

    /// Iterates source then target.
    pub fn iter(&self) -> impl Iterator<Item = &LanguageTag> {
        [&self.source, &self.target].into_iter()
    }
}

impl fmt::Display for LangPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source, self.target)
    }
}

/// Parse an `L1-L2` string into a resolved [`LangPair`].
///
/// Logs a suggestion when the input is not already in canonical form.
pub fn parse_lang_pair(input: &str) -> Result<LangPair, MtdataError> {
    let parts: Vec<&str> = input.split('-').collect();
    if parts.len() != 2 {
        return Err(MtdataError::format(
            input,
            format!("expected value of form \"xxx-yyz\" eg \"deu-eng\"; given {input}"),
        ));
    }

    let pair = LangPair::new(resolve_tag(parts[0])?, resolve_tag(parts[1])?);
    debug!(
        "Languages: {} ({}) -> {} ({})",
        pair.source,
        pair.source.name(),
        pair.target,
        pair.target.name()
    );
    if let Some(suggestion) = canonical_suggestion(input, &pair) {
        info!("{suggestion}");
    }
    Ok(pair)
}

/// The suggestion line shown when `input` differs from the canonical pair.
pub fn canonical_suggestion(input: &str, pair: &LangPair) -> Option<String> {
    let std_form = pair.to_string();
    if std_form == input {
        None
    } else {
        Some(format!(
            "Suggestion: use codes {std_form} instead of {input}. \
             Three-letter codes leave room for every language of our planet."
        ))
    }
}
