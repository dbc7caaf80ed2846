//! Console output for `list` and `report`.

use std::fmt;

use crate::entry::CatalogEntry;

/// Placeholder printed by `list -f` for entries without a citation.
pub const CITATION_NOT_LISTED: &str = "CITATION_NOT_LISTED";

/// Matched catalog entries, one summary line each, then a total.
#[derive(Clone, Debug)]
pub struct EntryListing {
    pub entries: Vec<CatalogEntry>,
    /// Also print each entry's citation followed by a blank line.
    pub full: bool,
    pub delim: String,
}

impl EntryListing {
    pub fn new(entries: Vec<CatalogEntry>, full: bool) -> Self {
        Self {
            entries,
            full,
            delim: "\t".to_string(),
        }
    }
}

impl fmt::Display for EntryListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry.summary(&self.delim))?;
            if self.full {
                writeln!(f, "{}", entry.cite.as_deref().unwrap_or(CITATION_NOT_LISTED))?;
                writeln!(f)?;
            }
        }
        write!(f, "Total {} entries", format_number(self.entries.len()))
    }
}

/// Two frequency tables over matched entries, in first-seen key order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogReport {
    /// Keyed by the entry's language pair joined with `_`, e.g. `deu_eng`.
    pub languages: Vec<(String, usize)>,
    /// Keyed by entry name.
    pub names: Vec<(String, usize)>,
}

impl CatalogReport {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a CatalogEntry>) -> Self {
        let mut report = Self::default();
        for entry in entries {
            tally(&mut report.languages, entry.langs().joined("_"));
            tally(&mut report.names, entry.name().to_string());
        }
        report
    }
}

fn tally(counts: &mut Vec<(String, usize)>, key: String) {
    match counts.iter_mut().find(|(k, _)| *k == key) {
        Some((_, n)) => *n += 1,
        None => counts.push((key, 1)),
    }
}

impl fmt::Display for CatalogReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Languages:")?;
        for (key, count) in &self.languages {
            writeln!(f, "{key}\t{}", format_number(*count))?;
        }
        writeln!(f)?;
        writeln!(f, "Names:")?;
        for (key, count) in &self.names {
            writeln!(f, "{key}\t{}", format_number(*count))?;
        }
        Ok(())
    }
}

/// Format a number with thousands separators.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{parse_dataset_id, EntryUrl};

    fn entry(did: &str) -> CatalogEntry {
        CatalogEntry::new(
            parse_dataset_id(did).expect("parse"),
            EntryUrl::Single(format!("http://example.org/{did}.tsv")),
        )
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(123), "123");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn listing_prints_summaries_and_total() {
        let listing = EntryListing::new(
            vec![entry("Statmt-europarl-10-deu-eng"), entry("Statmt-europarl-10-fin-eng")],
            false,
        );
        assert_eq!(
            listing.to_string(),
            "Statmt-europarl-10-deu-eng\ttsv\thttp://example.org/Statmt-europarl-10-deu-eng.tsv\n\
             Statmt-europarl-10-fin-eng\ttsv\thttp://example.org/Statmt-europarl-10-fin-eng.tsv\n\
             Total 2 entries"
        );
    }

    #[test]
    fn full_listing_adds_citation_or_placeholder() {
        let cited = entry("Statmt-europarl-10-deu-eng").with_cite("@inproceedings{koehn2005}");
        let listing = EntryListing::new(vec![cited, entry("Local-toy-1-deu-eng")], true);
        let text = listing.to_string();

        assert!(text.contains("tsv\thttp://example.org/Statmt-europarl-10-deu-eng.tsv\n@inproceedings{koehn2005}\n\n"));
        assert!(text.contains(&format!("{CITATION_NOT_LISTED}\n\nTotal 2 entries")));
    }

    #[test]
    fn report_tallies_in_first_seen_order() {
        let entries = [
            entry("Statmt-news_commentary-14-eng-fra"),
            entry("Statmt-europarl-10-deu-eng"),
            entry("Statmt-news_commentary-14-deu-eng"),
            entry("Statmt-europarl-10-fin-eng"),
        ];
        let report = CatalogReport::from_entries(&entries);

        assert_eq!(
            report.languages,
            vec![
                ("eng_fra".to_string(), 1),
                ("deu_eng".to_string(), 2),
                ("fin_eng".to_string(), 1),
            ]
        );
        assert_eq!(
            report.names,
            vec![("news_commentary".to_string(), 2), ("europarl".to_string(), 2)]
        );
        assert_eq!(
            report.to_string(),
            "Languages:\neng_fra\t1\ndeu_eng\t2\nfin_eng\t1\n\nNames:\nnews_commentary\t2\neuroparl\t2\n"
        );
    }

    #[test]
    fn report_is_stable_across_runs() {
        let entries = [entry("A-x-1-deu-eng"), entry("B-y-1-eng-deu")];
        assert_eq!(
            CatalogReport::from_entries(&entries),
            CatalogReport::from_entries(&entries)
        );
    }
}
