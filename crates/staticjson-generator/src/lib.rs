//! Static JSON Generator Library
//!
//! Field resolution, serialization and output engine for Static JSON.
//!
//! # Modules
//!
//! - [`resolver`] - Field definition lookup for top-level and nested fields
//! - [`dispatch`] - Field kind to transform mapping and built-in transforms
//! - [`serializer`] - Recursive, schema-ordered field serialization
//! - [`links`] - Absolute entity URLs per language
//! - [`document`] - Per-language document assembly
//! - [`index`] - Build manifest (`config.json`)
//! - [`validate`] - Content model validation
//! - [`writer`] - JSON file output
//! - [`generate`] - Generation runs

pub mod dispatch;
pub mod document;
pub mod generate;
pub mod index;
pub mod links;
pub mod resolver;
pub mod serializer;
pub mod validate;
pub mod writer;

pub use dispatch::{
    EntityContext, EntityTransform, FieldTransform, RegistryError, TransformContext, TransformRegistry,
};
pub use document::{Assembler, Assembly, Document, HeaderLink, SkippedEntity};
pub use generate::{
    CompletionHook, GenerateError, GenerationReport, Generator, LanguageOutcome,
};
pub use index::{ConfigDocument, IndexEntry, IndexKind, LanguageEntry};
pub use links::LinkBuilder;
pub use resolver::{FieldSet, ParentContext, ResolveError, Resolver};
pub use serializer::{SerializeError, SerializeOptions, SerializedNode, Serializer};
pub use validate::{ModelCheck, ModelError, validate_content_model};
pub use writer::{OutputWriter, WriteError};
