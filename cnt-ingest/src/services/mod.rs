//! Pipeline stages and external API clients

pub mod cryptopanic_client;
pub mod dedupe;
pub mod easypeasy_client;
pub mod merger;
pub mod record_translator;
pub mod retention;
pub mod snapshot_store;

pub use cryptopanic_client::{CryptoPanicClient, FeedConfig};
pub use dedupe::dedupe;
pub use easypeasy_client::EasyPeasyClient;
pub use merger::{merge, merge_with_rng, MergeOrder};
pub use record_translator::{FieldOutcome, FieldStatus, RecordTranslator, TransformReport};
pub use retention::apply_retention;
pub use snapshot_store::{JsonSnapshotStore, SnapshotLayout};
