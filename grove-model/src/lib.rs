//! Model, field and relation descriptors for grove.
//!
//! Defines the read-only metadata every other grove crate consumes:
//! - [`Model`]: a named entity type with ordered [`Field`]s and a storage binding key
//! - [`Field`]: scalar, nested object, or relation descriptor
//! - [`ModelRelation`]: two models paired through one relation, layout resolved
//! - [`Schema`]: the compiled model set; pairs bidirectional relations once
//!
//! Descriptors arrive well-formed from a schema parser; [`Schema::new`] only
//! checks the relational consistency the relation engine depends on.

mod error;
mod field;
mod model;
mod relation;
mod schema;

pub use error::{ModelError, ModelResult};
pub use field::{
    DataModelType, Field, FieldKind, KeyHolder, RelationField, RelationMetadata, ID_FIELD,
};
pub use model::{lower_first, upper_first, Model, Namings};
pub use relation::{ModelRelation, RelationShip, RelationType, Side};
pub use schema::Schema;
