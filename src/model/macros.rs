//! Declarative model type definitions

/// Define a model struct together with its declared field list
///
/// Every field must implement [`FieldValue`](crate::model::FieldValue). The
/// generated [`ModelObject`](crate::model::ModelObject) impl registers the
/// fields in declaration order and converts losslessly to and from
/// [`Object`](crate::model::Object).
macro_rules! model_object {
    (
        $(#[$meta:meta])*
        pub struct $name:ident as $entity:literal {
            $(
                $(#[$field_meta:meta])*
                pub $field:ident : $ty:ty,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
        }

        impl $crate::model::ModelObject for $name {
            const ENTITY: &'static str = $entity;

            fn descriptor() -> $crate::mapping::TypeDescriptor {
                $crate::mapping::TypeDescriptor::new($crate::model::TypeKey::model($entity))
                    $(
                        .field(
                            stringify!($field),
                            <$ty as $crate::model::FieldValue>::field_type(),
                        )
                    )*
            }

            fn to_object(&self) -> $crate::model::Object {
                #[allow(unused_mut)]
                let mut object = $crate::model::Object::new($crate::model::TypeKey::model($entity));
                $(
                    object.set(
                        stringify!($field),
                        $crate::model::FieldValue::to_value(&self.$field),
                    );
                )*
                object
            }

            fn from_object(
                #[allow(unused_variables)] object: &$crate::model::Object,
            ) -> Result<Self, $crate::model::ValueError> {
                Ok(Self {
                    $(
                        $field: <$ty as $crate::model::FieldValue>::from_value(
                            object
                                .get(stringify!($field))
                                .cloned()
                                .unwrap_or($crate::model::Value::Null),
                        )
                        .map_err(|e| e.in_field(stringify!($field)))?,
                    )*
                })
            }
        }

        impl $crate::model::FieldValue for $name {
            fn field_type() -> $crate::model::FieldType {
                $crate::model::FieldType::Object($entity.to_string())
            }

            fn to_value(&self) -> $crate::model::Value {
                $crate::model::Value::Object($crate::model::ModelObject::to_object(self))
            }

            fn from_value(
                value: $crate::model::Value,
            ) -> Result<Self, $crate::model::ValueError> {
                match value {
                    $crate::model::Value::Object(object) => {
                        <Self as $crate::model::ModelObject>::from_object(&object)
                    }
                    $crate::model::Value::Null => Ok(Self::default()),
                    other => Err($crate::model::ValueError::new($entity, &other)),
                }
            }
        }
    };
}
