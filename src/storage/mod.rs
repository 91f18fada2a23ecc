/// Artist data access backed by `DuckDB`
pub mod artist_storage;
/// Artist records and drafts
pub mod entities;

pub use artist_storage::ArtistStorage;
pub use entities::{Artist, ArtistDraft};
