use crate::dex::{Annotation, ClassAccessFlags, Field, Method, TypeDescriptor};

/// Class definition (as in a `class_def_item` along with its class data)
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    /// The class being defined
    pub class: TypeDescriptor,
    pub access_flags: ClassAccessFlags,

    /// Only `java/lang/Object` has no superclass
    pub superclass: Option<TypeDescriptor>,
    pub interfaces: Vec<TypeDescriptor>,
    pub source_file: Option<String>,
    pub annotations: Vec<Annotation>,

    /// Static fields followed by instance fields
    pub fields: Vec<Field>,

    /// Direct methods followed by virtual methods
    pub methods: Vec<Method>,
}

impl ClassDef {
    /// Look up a method by name (the first match, if overloaded)
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|method| method.name == name)
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }
}
