//! Bidirectional mapping between the model graph and versioned schema graphs
//!
//! A serializer declares a [`FieldMappings`] table for its root model type.
//! [`map_objects`] and [`map_properties`] walk the declared fields of each
//! source type: an explicit [`Resolver`] wins, otherwise assignable values are
//! copied, nested objects are recursed into when the run is recursive, and
//! anything else is recorded as an issue on the [`MappingContext`].

mod context;
mod error;
mod mapper;
mod path;
mod registry;
pub mod resolver;

pub use context::{Direction, FieldMapping, FieldMappings, FieldMappingsBuilder, MappingContext};
pub use error::{ConversionError, DuplicateKeyError, MappingError, MappingIssue, PathError};
pub use mapper::{map_objects, map_properties, EntityTypeResolver, SameEntity, TargetTypeResolver};
pub use path::{FieldPath, ResolvedPath, Segment};
pub use registry::{FieldDescriptor, TypeDescriptor, TypeRegistry};
pub use resolver::{
    CollectionResolver, DecimalFloatResolver, EnumResolver, GuidTextResolver, OpaquePayloadResolver,
    PairsMapResolver, Resolver,
};
