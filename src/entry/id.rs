//! Structured dataset identifiers: `group-name-version-lang1-lang2`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MtdataError;
use crate::lang::{parse_lang_pair, LangPair};

const EXPECTED_FORMAT: &str = "<group>-<name>-<version>-<l1>-<l2>";

/// A unique identifier for a dataset entry in the catalog.
///
/// Fields are validated on construction and immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatasetId {
    group: String,
    name: String,
    version: String,
    langs: LangPair,
}

impl DatasetId {
    /// Creates a new DatasetId, checking each text field.
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        langs: LangPair,
    ) -> Result<Self, MtdataError> {
        let group = group.into();
        let name = name.into();
        let version = version.into();
        validate_field("group", &group)?;
        validate_field("name", &name)?;
        validate_field("version", &version)?;
        Ok(Self {
            group,
            name,
            version,
            langs,
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn langs(&self) -> &LangPair {
        &self.langs
    }

    /// The same dataset with its language pair flipped.
    pub fn reversed(&self) -> Self {
        Self {
            langs: self.langs.reversed(),
            ..self.clone()
        }
    }
}

fn validate_field(field: &'static str, value: &str) -> Result<(), MtdataError> {
    let message = if value.is_empty() {
        "must not be empty"
    } else if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.'))
    {
        "only ASCII letters, digits, '_' and '.' are allowed"
    } else {
        return Ok(());
    };

    Err(MtdataError::InvalidIdField {
        field,
        value: value.to_string(),
        message: message.to_string(),
    })
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.group, self.name, self.version, self.langs
        )
    }
}

impl TryFrom<String> for DatasetId {
    type Error = MtdataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_dataset_id(&value)
    }
}

impl From<DatasetId> for String {
    fn from(value: DatasetId) -> Self {
        value.to_string()
    }
}

/// Parse a user-supplied dataset id.
///
/// Language-pair failures propagate unchanged; field validation failures
/// are reported as a format error with the cause attached.
pub fn parse_dataset_id(input: &str) -> Result<DatasetId, MtdataError> {
    let parts: Vec<&str> = input.trim().split('-').collect();
    let [group, name, version, lang1, lang2] = parts[..] else {
        return Err(MtdataError::format(
            input,
            format!(
                "Dataset ID expected in format: {EXPECTED_FORMAT}; but given {input}. \
                 If you are unsure, run \"mtdata list | grep -i <name>\" and copy its id."
            ),
        ));
    };

    let langs = parse_lang_pair(&format!("{lang1}-{lang2}"))?;
    DatasetId::new(group, name, version, langs).map_err(|cause| MtdataError::Format {
        input: input.to_string(),
        message: format!("Invalid dataset id {input}: {cause}"),
        source: Some(Box::new(cause)),
    })
}

/// Parse every id in `inputs`, reporting all malformed ones together.
pub fn parse_dataset_ids<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<DatasetId>, MtdataError> {
    let mut ids = Vec::with_capacity(inputs.len());
    let mut errors = Vec::new();
    for input in inputs {
        match parse_dataset_id(input.as_ref()) {
            Ok(did) => ids.push(did),
            Err(err) => errors.push(err),
        }
    }

    match errors.len() {
        0 => Ok(ids),
        1 => Err(errors.remove(0)),
        _ => Err(MtdataError::FormatErrors(errors)),
    }
}
