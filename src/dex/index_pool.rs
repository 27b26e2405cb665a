use crate::dex::{
    ClassDef, EncodeError, EncodedAnnotation, EncodedValue, FieldRef, MethodHandle,
    MethodHandleMember, MethodRef, Prototype, RenderDescriptor, TypeDescriptor,
};
use crate::util::cmp_utf16;
use std::collections::{HashMap, HashSet};

/// Everything a DEX file refers to by index, before sorting
///
/// Walk the model with the `add_*` methods, then [`Self::finish`] to get the sorted id tables.
#[derive(Default)]
pub struct IndexCollector {
    strings: HashSet<String>,
    types: HashSet<TypeDescriptor>,
    protos: HashSet<Prototype>,
    fields: HashSet<FieldRef>,
    methods: HashSet<MethodRef>,
    method_handles: HashSet<MethodHandle>,

    /// Whether any `MethodType` values were seen
    uses_method_types: bool,
}

impl IndexCollector {
    pub fn new() -> IndexCollector {
        IndexCollector::default()
    }

    pub fn add_string(&mut self, string: &str) {
        if !self.strings.contains(string) {
            self.strings.insert(string.to_owned());
        }
    }

    pub fn add_type(&mut self, descriptor: &TypeDescriptor) {
        if !self.types.contains(descriptor) {
            self.add_string(descriptor.as_str());
            self.types.insert(descriptor.clone());
        }
    }

    pub fn add_proto(&mut self, proto: &Prototype) -> Result<(), EncodeError> {
        if self.protos.contains(proto) {
            return Ok(());
        }
        let shorty = proto
            .shorty()
            .ok_or_else(|| EncodeError::MalformedDescriptor(proto.render()))?;
        self.add_string(&shorty);
        self.add_type(&proto.return_type);
        for param in &proto.parameters {
            self.add_type(param);
        }
        self.protos.insert(proto.clone());
        Ok(())
    }

    pub fn add_field(&mut self, field: &FieldRef) {
        if !self.fields.contains(field) {
            self.add_type(&field.class);
            self.add_string(&field.name);
            self.add_type(&field.field_type);
            self.fields.insert(field.clone());
        }
    }

    pub fn add_method(&mut self, method: &MethodRef) -> Result<(), EncodeError> {
        if !self.methods.contains(method) {
            self.add_type(&method.class);
            self.add_string(&method.name);
            self.add_proto(&method.prototype)?;
            self.methods.insert(method.clone());
        }
        Ok(())
    }

    pub fn add_method_handle(&mut self, handle: &MethodHandle) -> Result<(), EncodeError> {
        match &handle.member {
            MethodHandleMember::Field(field) => self.add_field(field),
            MethodHandleMember::Method(method) => self.add_method(method)?,
        }
        self.method_handles.insert(handle.clone());
        Ok(())
    }

    pub fn add_value(&mut self, value: &EncodedValue) -> Result<(), EncodeError> {
        match value {
            EncodedValue::MethodType(proto) => {
                self.uses_method_types = true;
                self.add_proto(proto)?;
            }
            EncodedValue::MethodHandle(handle) => self.add_method_handle(handle)?,
            EncodedValue::String(string) => self.add_string(string),
            EncodedValue::Type(descriptor) => self.add_type(descriptor),
            EncodedValue::Field(field) | EncodedValue::Enum(field) => self.add_field(field),
            EncodedValue::Method(method) => self.add_method(method)?,
            EncodedValue::Array(values) => {
                for value in values {
                    self.add_value(value)?;
                }
            }
            EncodedValue::Annotation(annotation) => self.add_annotation(annotation)?,
            EncodedValue::Byte(_)
            | EncodedValue::Short(_)
            | EncodedValue::Char(_)
            | EncodedValue::Int(_)
            | EncodedValue::Long(_)
            | EncodedValue::Float(_)
            | EncodedValue::Double(_)
            | EncodedValue::Null
            | EncodedValue::Boolean(_) => (),
        }
        Ok(())
    }

    pub fn add_annotation(&mut self, annotation: &EncodedAnnotation) -> Result<(), EncodeError> {
        self.add_type(&annotation.annotation_type);
        for element in &annotation.elements {
            self.add_string(&element.name);
            self.add_value(&element.value)?;
        }
        Ok(())
    }

    /// Add everything a class definition refers to
    pub fn add_class(&mut self, class: &ClassDef) -> Result<(), EncodeError> {
        self.add_type(&class.class);
        if let Some(superclass) = &class.superclass {
            self.add_type(superclass);
        }
        for interface in &class.interfaces {
            self.add_type(interface);
        }
        if let Some(source_file) = &class.source_file {
            self.add_string(source_file);
        }
        for annotation in &class.annotations {
            self.add_annotation(&annotation.annotation)?;
        }

        for field in &class.fields {
            self.add_field(&field.reference());
            if let Some(value) = &field.initial_value {
                self.add_value(value)?;
            }
            for annotation in &field.annotations {
                self.add_annotation(&annotation.annotation)?;
            }
        }

        for method in &class.methods {
            self.add_method(&method.reference())?;
            for annotation in &method.annotations {
                self.add_annotation(&annotation.annotation)?;
            }
            for annotation in method.parameter_annotations.iter().flatten() {
                self.add_annotation(&annotation.annotation)?;
            }
        }

        // Default values for static fields without initializers may be written out
        if class.fields.iter().any(|field| field.initial_value.is_some()) {
            for field in class.fields.iter().filter(|field| field.is_static()) {
                self.add_value(&EncodedValue::default_for(&field.field_type))?;
            }
        }

        Ok(())
    }

    /// Sort every table in the order required by the format and assign indices
    pub fn finish(self) -> Result<IndexPool, EncodeError> {
        let mut strings: Vec<String> = self.strings.into_iter().collect();
        strings.sort_by(|a, b| cmp_utf16(a, b));
        let string_index: HashMap<String, u32> = strings
            .iter()
            .enumerate()
            .map(|(idx, string)| (string.clone(), idx as u32))
            .collect();

        let mut types: Vec<TypeDescriptor> = self.types.into_iter().collect();
        types.sort_by_key(|descriptor| string_index[descriptor.as_str()]);
        check_size("type_ids", types.len(), 0xFFFF)?;
        let type_index: HashMap<TypeDescriptor, u32> = types
            .iter()
            .enumerate()
            .map(|(idx, descriptor)| (descriptor.clone(), idx as u32))
            .collect();

        let mut protos: Vec<Prototype> = self.protos.into_iter().collect();
        protos.sort_by_cached_key(|proto| {
            let params: Vec<u32> = proto
                .parameters
                .iter()
                .map(|param| type_index[param])
                .collect();
            (type_index[&proto.return_type], params)
        });
        check_size("proto_ids", protos.len(), 0xFFFF)?;
        let proto_index: HashMap<Prototype, u32> = protos
            .iter()
            .enumerate()
            .map(|(idx, proto)| (proto.clone(), idx as u32))
            .collect();

        let mut fields: Vec<FieldRef> = self.fields.into_iter().collect();
        fields.sort_by_key(|field| {
            (
                type_index[&field.class],
                string_index[field.name.as_str()],
                type_index[&field.field_type],
            )
        });
        let field_index: HashMap<FieldRef, u32> = fields
            .iter()
            .enumerate()
            .map(|(idx, field)| (field.clone(), idx as u32))
            .collect();

        let mut methods: Vec<MethodRef> = self.methods.into_iter().collect();
        methods.sort_by_key(|method| {
            (
                type_index[&method.class],
                string_index[method.name.as_str()],
                proto_index[&method.prototype],
            )
        });
        let method_index: HashMap<MethodRef, u32> = methods
            .iter()
            .enumerate()
            .map(|(idx, method)| (method.clone(), idx as u32))
            .collect();

        let mut method_handles: Vec<MethodHandle> = self.method_handles.into_iter().collect();
        if !method_handles.is_empty() {
            // handles store member indices as `u16`
            check_size("field_ids", fields.len(), 0x1_0000)?;
            check_size("method_ids", methods.len(), 0x1_0000)?;
        }
        method_handles.sort_by_key(|handle| {
            let member = match &handle.member {
                MethodHandleMember::Field(field) => field_index[field],
                MethodHandleMember::Method(method) => method_index[method],
            };
            (handle.kind.code(), member)
        });
        let method_handle_index: HashMap<MethodHandle, u32> = method_handles
            .iter()
            .enumerate()
            .map(|(idx, handle)| (handle.clone(), idx as u32))
            .collect();

        Ok(IndexPool {
            strings,
            string_index,
            types,
            type_index,
            protos,
            proto_index,
            fields,
            field_index,
            methods,
            method_index,
            method_handles,
            method_handle_index,
            uses_method_types: self.uses_method_types,
        })
    }
}

fn check_size(table: &'static str, count: usize, limit: usize) -> Result<(), EncodeError> {
    if count > limit {
        Err(EncodeError::TooManyItems { table, count })
    } else {
        Ok(())
    }
}

/// Sorted id tables of a DEX file being written
///
/// Lookups panic on values that were never collected, since that can only happen if the
/// collection pass missed something.
pub struct IndexPool {
    pub strings: Vec<String>,
    string_index: HashMap<String, u32>,
    pub types: Vec<TypeDescriptor>,
    type_index: HashMap<TypeDescriptor, u32>,
    pub protos: Vec<Prototype>,
    proto_index: HashMap<Prototype, u32>,
    pub fields: Vec<FieldRef>,
    field_index: HashMap<FieldRef, u32>,
    pub methods: Vec<MethodRef>,
    method_index: HashMap<MethodRef, u32>,
    pub method_handles: Vec<MethodHandle>,
    method_handle_index: HashMap<MethodHandle, u32>,
    pub uses_method_types: bool,
}

impl IndexPool {
    pub fn string(&self, string: &str) -> u32 {
        self.string_index[string]
    }

    pub fn type_idx(&self, descriptor: &TypeDescriptor) -> u32 {
        self.type_index[descriptor]
    }

    pub fn proto(&self, proto: &Prototype) -> u32 {
        self.proto_index[proto]
    }

    pub fn field(&self, field: &FieldRef) -> u32 {
        self.field_index[field]
    }

    pub fn method(&self, method: &MethodRef) -> u32 {
        self.method_index[method]
    }

    pub fn method_handle(&self, handle: &MethodHandle) -> u32 {
        self.method_handle_index[handle]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(descriptor: &str) -> TypeDescriptor {
        TypeDescriptor::from(descriptor)
    }

    #[test]
    fn tables_are_sorted() {
        let mut collector = IndexCollector::new();
        collector.add_type(&ty("Lb;"));
        collector.add_type(&ty("La;"));
        collector
            .add_method(&MethodRef {
                class: ty("Lb;"),
                name: String::from("run"),
                prototype: Prototype::new(ty("V"), vec![ty("I")]),
            })
            .unwrap();
        collector
            .add_method(&MethodRef {
                class: ty("La;"),
                name: String::from("run"),
                prototype: Prototype::new(ty("V"), vec![]),
            })
            .unwrap();
        let pool = collector.finish().unwrap();

        assert_eq!(pool.strings, vec!["I", "La;", "Lb;", "V", "VI", "run"]);
        assert_eq!(pool.types, vec![ty("I"), ty("La;"), ty("Lb;"), ty("V")]);
        // `()V` sorts before `(I)V` since the empty argument list is a prefix
        assert_eq!(pool.protos[0], Prototype::new(ty("V"), vec![]));
        assert_eq!(pool.methods[0].class, ty("La;"));
        assert_eq!(pool.method(&pool.methods[1].clone()), 1);
    }

    #[test]
    fn malformed_prototype_is_rejected() {
        let mut collector = IndexCollector::new();
        let result = collector.add_proto(&Prototype::new(ty("Q"), vec![]));
        assert!(matches!(result, Err(EncodeError::MalformedDescriptor(_))));
    }
}
