//! Domain types shared by the indexing and search components.

pub mod attribute;
pub mod document;
pub mod facet;
pub mod identifier;
pub mod page;
pub mod search_key;
pub mod sort;

pub use attribute::{
    AttributeDescription, LOWER_BOUND, ModelAttribute, PropertyType, Restriction, Shape,
    UPPER_BOUND, ValueFamily,
};
pub use document::{DOC_ID_FIELD, Indexable, TAGS_FIELD, TYPE_FIELD, engine_id};
pub use facet::{
    DateBucket, DateFacet, Facet, FacetFailure, FacetType, NumericBucket, NumericFacet,
    StringFacet,
};
pub use identifier::{TagResolver, UrnIdentifier, UrnTagResolver};
pub use page::{DEFAULT_PAGE_SIZE, FacetPage, Page, PageRequest};
pub use search_key::{JoinSearchKey, ResultTypeRegistry, SearchKey};
pub use sort::{Sort, SortDirection, SortOrder};
