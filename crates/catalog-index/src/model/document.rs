//! Indexable documents and their engine identity.

use serde::Serialize;
use serde_json::{Value, json};

use crate::error::{DocumentError, IndexerResult};

/// Discriminator field holding the entity type tag.
pub const TYPE_FIELD: &str = "type";
/// Field holding the document id, unique within `(index, type)`.
pub const DOC_ID_FIELD: &str = "docId";
/// Field holding string references to other entities.
pub const TAGS_FIELD: &str = "tags";

/// An entity that can be written to a tenant index.
pub trait Indexable: Serialize {
    /// Unique id within the entity type.
    fn doc_id(&self) -> &str;

    /// Entity type tag stored in the `type` field.
    fn doc_type(&self) -> &str;
}

/// Engine `_id` of a document: `{type}_{docId}`.
pub fn engine_id(doc_type: &str, doc_id: &str) -> String {
    format!("{}_{}", doc_type, doc_id)
}

/// Serializes an entity into the stored source, forcing the discriminator fields.
pub(crate) fn to_source<T: Indexable>(entity: &T) -> IndexerResult<Value> {
    let mut source = serde_json::to_value(entity)?;
    let Some(object) = source.as_object_mut() else {
        return Err(DocumentError::NotAnObject {
            doc_type: entity.doc_type().to_string(),
            doc_id: entity.doc_id().to_string(),
        }
        .into());
    };
    object.insert(TYPE_FIELD.to_string(), json!(entity.doc_type()));
    object.insert(DOC_ID_FIELD.to_string(), json!(entity.doc_id()));
    Ok(source)
}
