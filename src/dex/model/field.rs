use crate::dex::{Annotation, EncodedValue, FieldAccessFlags, FieldRef, TypeDescriptor};

/// Field declared by a class
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Declaring class
    pub class: TypeDescriptor,
    pub name: String,
    pub field_type: TypeDescriptor,
    pub access_flags: FieldAccessFlags,

    /// Initial value of a static field, from the class' `static_values` array
    pub initial_value: Option<EncodedValue>,

    pub annotations: Vec<Annotation>,
}

impl Field {
    pub fn reference(&self) -> FieldRef {
        FieldRef {
            class: self.class.clone(),
            name: self.name.clone(),
            field_type: self.field_type.clone(),
        }
    }

    pub fn is_static(&self) -> bool {
        self.access_flags.contains(FieldAccessFlags::STATIC)
    }
}
