//! Static JSON Core Library
//!
//! Content model, content store abstraction, configuration, and error handling
//! for the Static JSON exporter.

pub mod config;
pub mod content;
pub mod error;
pub mod fixture;
pub mod language;
pub mod schema;
pub mod store;

pub use config::Config;
pub use content::{Asset, Entity, EntityId, FieldMap, SiteInfo, SiteOptions, Term};
pub use error::{CoreError, Result};
pub use fixture::{ContentDump, FixtureStore};
pub use language::Language;
pub use schema::{ContentTypeDef, FieldDefinition, FieldKind, Layout};
pub use store::{ContentStore, FieldScope, StoreError};
