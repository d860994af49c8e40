//! Version-independent template model
//!
//! Model types are plain structs declared through `model_object!`, which
//! records each struct's field list so the mapper can walk it without
//! runtime reflection. The dynamic [`Object`]/[`Value`] pair is the common
//! currency between the model and the versioned schema graphs.

#[macro_use]
mod macros;

mod audit;
mod object;
mod template;
mod value;
mod workflow;

pub use audit::{audit_flag, AuditSettings, AUDIT_FLAGS};
pub use object::{ModelObject, Namespace, Object, TypeKey};
pub use template::{CustomAction, DataRow, FieldRef, Folder, ListInstance, Template, View};
pub use value::{FieldType, FieldValue, Payload, Value, ValueError};
pub use workflow::{WorkflowDefinition, WorkflowSubscription, UNIVERSAL_RESTRICTION};

use crate::mapping::{MappingError, TypeRegistry};

/// Register the descriptor of every model type
pub fn register_model_types(registry: &mut TypeRegistry) -> Result<(), MappingError> {
    registry.register(Template::descriptor())?;
    registry.register(ListInstance::descriptor())?;
    registry.register(FieldRef::descriptor())?;
    registry.register(DataRow::descriptor())?;
    registry.register(View::descriptor())?;
    registry.register(Folder::descriptor())?;
    registry.register(CustomAction::descriptor())?;
    registry.register(WorkflowDefinition::descriptor())?;
    registry.register(WorkflowSubscription::descriptor())?;
    registry.register(AuditSettings::descriptor())?;
    Ok(())
}
