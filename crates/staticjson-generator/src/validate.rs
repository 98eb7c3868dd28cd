//! Content model validation.
//!
//! Structural problems in field definitions are configuration errors and
//! stop a run before anything is written. Unknown content types only warn.

use std::collections::HashSet;

use staticjson_core::{Config, ContentStore, FieldDefinition, FieldKind, StoreError};
use thiserror::Error;
use tracing::warn;

use crate::{document::SECTION_KEYS, serializer::RESERVED_KEYS};

/// A structural problem in the content model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("{content_type}: field {name:?} declared twice in {scope}")]
    DuplicateField {
        content_type: String,
        scope: String,
        name: String,
    },

    #[error("{content_type}: field name {name:?} is reserved")]
    ReservedName { content_type: String, name: String },

    #[error("{content_type}: container field {name:?} has no key")]
    MissingKey { content_type: String, name: String },

    #[error("content type name {content_type:?} collides with a document section")]
    SectionName { content_type: String },

    #[error("{content_type}: container key {key:?} is used more than once")]
    DuplicateKey { content_type: String, key: String },

    #[error("{content_type}: layout {layout:?} declared twice in field {field:?}")]
    DuplicateLayout {
        content_type: String,
        field: String,
        layout: String,
    },

    #[error("{content_type}: layout {layout:?} declares a field named like the discriminator {name:?}")]
    DiscriminatorClash {
        content_type: String,
        layout: String,
        name: String,
    },
}

/// Outcome of validating the content model.
#[derive(Debug, Clone, Default)]
pub struct ModelCheck {
    pub errors: Vec<ModelError>,
    pub warnings: Vec<String>,
}

impl ModelCheck {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The warnings when valid, otherwise the first error.
    pub fn into_result(self) -> Result<Vec<String>, ModelError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.warnings),
        }
    }
}

/// Validate the definitions of every exported content type.
pub fn validate_content_model(config: &Config, store: &dyn ContentStore) -> ModelCheck {
    let mut check = ModelCheck::default();
    let mut types: Vec<&str> = config.export.post_types.iter().map(String::as_str).collect();
    if !config.export.pages.is_empty() && !types.contains(&"page") {
        types.push("page");
    }

    for name in types {
        if SECTION_KEYS.contains(&name) {
            check.errors.push(ModelError::SectionName {
                content_type: name.to_string(),
            });
            continue;
        }

        let def = match store.content_type(name) {
            Ok(def) => def,
            Err(StoreError::UnknownContentType(_)) => {
                let msg = format!("content type {name:?} is not defined in the content store");
                warn!(content_type = %name, "unknown content type");
                check.warnings.push(msg);
                continue;
            }
            Err(e) => {
                check.warnings.push(format!("content type {name:?}: {e}"));
                continue;
            }
        };

        // Nested schemas are looked up per content type.
        let mut keys = HashSet::new();
        let mut model = ModelWalk {
            content_type: name,
            layout_key: &config.export.layout_key,
            keys: &mut keys,
            check: &mut check,
        };

        for field in &def.fields {
            if RESERVED_KEYS.contains(&field.name.as_str()) {
                model.check.errors.push(ModelError::ReservedName {
                    content_type: name.to_string(),
                    name: field.name.clone(),
                });
            }
        }
        model.scope("top level", &def.fields);
    }

    check
}

struct ModelWalk<'a> {
    content_type: &'a str,
    layout_key: &'a str,
    keys: &'a mut HashSet<String>,
    check: &'a mut ModelCheck,
}

impl ModelWalk<'_> {
    fn scope(&mut self, scope: &str, fields: &[FieldDefinition]) {
        let mut names = HashSet::new();

        for field in fields {
            if !names.insert(field.name.as_str()) {
                self.check.errors.push(ModelError::DuplicateField {
                    content_type: self.content_type.to_string(),
                    scope: scope.to_string(),
                    name: field.name.clone(),
                });
            }

            if field.kind.is_container() {
                self.container(field);
            }
        }
    }

    fn container(&mut self, field: &FieldDefinition) {
        if field.key.is_empty() {
            self.check.errors.push(ModelError::MissingKey {
                content_type: self.content_type.to_string(),
                name: field.name.clone(),
            });
        } else if !self.keys.insert(field.key.clone()) {
            self.check.errors.push(ModelError::DuplicateKey {
                content_type: self.content_type.to_string(),
                key: field.key.clone(),
            });
        }

        match field.kind {
            FieldKind::FlexibleContent => {
                let mut layouts = HashSet::new();
                for layout in &field.layouts {
                    if !layouts.insert(layout.name.as_str()) {
                        self.check.errors.push(ModelError::DuplicateLayout {
                            content_type: self.content_type.to_string(),
                            field: field.name.clone(),
                            layout: layout.name.clone(),
                        });
                    }
                    if layout.sub_fields.iter().any(|f| f.name == self.layout_key) {
                        self.check.errors.push(ModelError::DiscriminatorClash {
                            content_type: self.content_type.to_string(),
                            layout: layout.name.clone(),
                            name: self.layout_key.to_string(),
                        });
                    }
                    let scope = format!("layout {:?} of {:?}", layout.name, field.name);
                    self.scope(&scope, &layout.sub_fields);
                }
            }
            _ => {
                let scope = format!("field {:?}", field.name);
                self.scope(&scope, &field.sub_fields);
            }
        }
    }
}
