//! CSV story import.
//!
//! An upload flows through four stages, one row at a time and in file order:
//!
//! 1. `parser` turns the bytes into name-indexed [`RawRow`]s.
//! 2. `normalize` maps each row onto a `CandidateStory`.
//! 3. `validate` keeps rows without a title or with a backwards coverage
//!    range out of the database.
//! 4. `store` inserts accepted stories through the [`StoryStore`] seam.
//!
//! [`Importer`] ties the stages together and folds every row into an
//! `ImportReport`. A failing row never stops the batch.

mod dates;
pub mod normalize;
pub mod orchestrator;
pub mod parser;
pub mod store;
pub mod validate;

pub use normalize::{normalize_row, ColumnMapping, NormalizedRow};
pub use orchestrator::{approval_for, import_csv, Importer};
pub use parser::{parse_csv, RawRow};
pub use store::{SqliteStoryStore, StoryStore};
