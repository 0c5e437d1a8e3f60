//! Domain types.
//!
//! Pure data with serde support. Nothing in here performs I/O.

mod annotation;
mod datavalue;
mod identifier;
mod media;
mod statement;

pub use annotation::{AnnotatedEntity, Annotation};
pub use datavalue::{
    DataValue, DataValueError, EntityIdValue, GlobeCoordinate, MonolingualText, Quantity,
    TimeValue,
};
pub use identifier::{IdKind, Identifier};
pub use media::MediaEntity;
pub use statement::{Rank, Snak, SnakKind, Statement};
