pub mod activity;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod filters;
pub mod parse;
pub mod persist;
pub mod source;
pub mod store;

pub use activity::{derive_id, Activity, RawListing, Source};
pub use config::Config;
pub use error::{IngestError, IngestResult};
pub use fetcher::{FetchedPage, HttpFetcher, PageFetcher};
pub use filters::FilterRules;
pub use persist::{PersistOutcome, Persister, SourceReport};
pub use source::{run_sources, ActivitySource, RunSummary};
pub use store::{DocumentStore, MemoryStore, RestDocStore};
