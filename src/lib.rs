//! Local file-backed cache for the versioned, localized static data served
//! by the Riot Data Dragon CDN.
//!
//! Datasets are keyed by (version, locale) and downloaded on first read;
//! concurrent requests for the same pair share a single download, and reads
//! self-heal through a version fallback chain when the requested pair has
//! no usable data.

pub mod cdn;
pub mod config;
pub mod coordinator;
pub mod dataset;
pub mod error;
pub mod events;
pub mod metadata;
pub mod normalize;
pub mod reader;
pub mod store;
pub mod version;

pub use cdn::{CdnClient, CdnHttpClient};
pub use config::Config;
pub use coordinator::{Coordinator, DownloadKey, LocaleKey};
pub use dataset::DatasetType;
pub use error::DdragonError;
pub use events::{EventSink, TracingSink};
pub use reader::Reader;
pub use store::Store;
pub use version::{Locale, Version};
