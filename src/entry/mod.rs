//! Dataset identifiers and catalog entries.
//!
//! A [`DatasetId`] is the user-facing key (`group-name-version-l1-l2`); a
//! [`CatalogEntry`] is what the catalog knows about that key: where to fetch
//! it, in which format, and how to cite it.

mod id;
mod model;

pub use id::{parse_dataset_id, parse_dataset_ids, DatasetId};
pub use model::{infer_ext, CatalogEntry, Container, EntryFormat, EntryUrl, Layout};
