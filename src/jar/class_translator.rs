use crate::dex::{
    Annotation as DexAnnotation, ClassAccessFlags as DexClassFlags, ClassDef, EncodedValue,
    Field as DexField, FieldAccessFlags as DexFieldFlags, Method as DexMethod,
    MethodAccessFlags as DexMethodFlags, RenderDescriptor, TypeDescriptor,
};
use crate::jar::annotations::{
    annotation_attributes, parameter_annotation_attributes, SystemAnnotations,
};
use crate::jar::body::translate_body;
use crate::jar::ConversionError;
use crate::jvm::class_file::{
    to_bytes, Attribute, AttributeLike, ClassConstantIndex, ClassFile, ConstantIndex,
    ConstantValue, ConstantsPool, Exceptions, Field, Method, Signature, SourceFile, Version,
};
use crate::jvm::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags};

/// Class file translated from a DEX class definition
#[derive(Debug)]
pub struct TranslatedClass {
    /// Internal name (eg. `com/example/Foo`)
    pub name: String,

    pub bytes: Vec<u8>,
}

impl TranslatedClass {
    /// Path of the class inside a JAR
    pub fn entry_name(&self) -> String {
        format!("{}.class", self.name)
    }
}

/// Builds one class file, interning everything in a single constant pool
struct ClassTranslator {
    version: Version,
    constants_pool: ConstantsPool,
    fields: Vec<Field>,
    methods: Vec<Method>,
    attributes: Vec<Attribute>,
}

/// Translate a class definition into a serialized class file
pub fn translate_class(
    class: &ClassDef,
    version: Version,
) -> Result<TranslatedClass, ConversionError> {
    let name = class_name(&class.class)?.to_owned();
    let mut translator = ClassTranslator {
        version,
        constants_pool: ConstantsPool::new(),
        fields: vec![],
        methods: vec![],
        attributes: vec![],
    };

    let this_class = translator.constants_pool.get_class(&name)?;
    let super_class = match &class.superclass {
        Some(superclass) => Some(translator.class_constant(superclass)?),
        None => None,
    };
    let interfaces = class
        .interfaces
        .iter()
        .map(|interface| translator.class_constant(interface))
        .collect::<Result<Vec<_>, _>>()?;

    for field in &class.fields {
        translator.add_field(field)?;
    }
    for method in &class.methods {
        translator.add_method(method)?;
    }

    if let Some(source_file) = &class.source_file {
        let source_file = translator.constants_pool.get_utf8(source_file)?;
        translator.add_attribute(SourceFile(source_file))?;
    }
    translator.add_annotations(&class.annotations)?;
    log::trace!(
        "Translated {} ({} fields, {} methods)",
        name,
        translator.fields.len(),
        translator.methods.len()
    );

    let class_file = ClassFile {
        version: translator.version,
        constants: translator.constants_pool,
        access_flags: class_flags(class.access_flags),
        this_class,
        super_class,
        interfaces,
        fields: translator.fields,
        methods: translator.methods,
        attributes: translator.attributes,
    };
    let bytes = to_bytes(&class_file)?;
    Ok(TranslatedClass { name, bytes })
}

impl ClassTranslator {
    /// Class constant for an object type (arrays are passed through as descriptors)
    fn class_constant(
        &mut self,
        class: &TypeDescriptor,
    ) -> Result<ClassConstantIndex, ConversionError> {
        let name = match class.class_name() {
            Some(name) => name,
            None if class.as_str().starts_with('[') => class.as_str(),
            None => return Err(ConversionError::InvalidClassName(class.to_string())),
        };
        Ok(self.constants_pool.get_class(name)?)
    }

    fn add_attribute(&mut self, attribute: impl AttributeLike) -> Result<(), ConversionError> {
        let attribute = self.constants_pool.get_attribute(attribute)?;
        self.attributes.push(attribute);
        Ok(())
    }

    /// Signature and annotation attributes (all of which are allowed on every member too)
    fn annotation_attributes(
        &mut self,
        annotations: &[DexAnnotation],
        system: &SystemAnnotations,
    ) -> Result<Vec<Attribute>, ConversionError> {
        let mut attributes = vec![];
        if let Some(signature) = &system.signature {
            let signature = self.constants_pool.get_utf8(signature)?;
            attributes.push(self.constants_pool.get_attribute(Signature { signature })?);
        }
        attributes.extend(annotation_attributes(annotations, &mut self.constants_pool)?);
        Ok(attributes)
    }

    fn add_annotations(&mut self, annotations: &[DexAnnotation]) -> Result<(), ConversionError> {
        let system = SystemAnnotations::extract(annotations);
        let attributes = self.annotation_attributes(annotations, &system)?;
        self.attributes.extend(attributes);
        Ok(())
    }

    fn add_field(&mut self, field: &DexField) -> Result<(), ConversionError> {
        let name_index = self.constants_pool.get_utf8(&field.name)?;
        let descriptor_index = self.constants_pool.get_utf8(field.field_type.as_str())?;

        let mut attributes = vec![];
        let is_constant = field
            .access_flags
            .contains(DexFieldFlags::STATIC | DexFieldFlags::FINAL);
        if let (true, Some(value)) = (is_constant, &field.initial_value) {
            if let Some(constant) = self.constant_value(&field.field_type, value)? {
                attributes.push(self.constants_pool.get_attribute(ConstantValue(constant))?);
            }
        }
        let system = SystemAnnotations::extract(&field.annotations);
        attributes.extend(self.annotation_attributes(&field.annotations, &system)?);

        self.fields.push(Field {
            access_flags: FieldAccessFlags::from_bits_truncate(field.access_flags.bits() as u16),
            name_index,
            descriptor_index,
            attributes,
        });
        Ok(())
    }

    /// Constant for a `ConstantValue` attribute, if the value agrees with the field type
    fn constant_value(
        &mut self,
        field_type: &TypeDescriptor,
        value: &EncodedValue,
    ) -> Result<Option<ConstantIndex>, ConversionError> {
        let pool = &mut self.constants_pool;
        let constant = match (field_type.as_str(), value) {
            ("I", EncodedValue::Int(int)) => pool.get_integer(*int)?,
            ("S", EncodedValue::Short(short)) => pool.get_integer(*short as i32)?,
            ("C", EncodedValue::Char(character)) => pool.get_integer(*character as i32)?,
            ("B", EncodedValue::Byte(byte)) => pool.get_integer(*byte as i32)?,
            ("Z", EncodedValue::Boolean(boolean)) => pool.get_integer(*boolean as i32)?,
            ("J", EncodedValue::Long(long)) => pool.get_long(*long)?,
            ("F", EncodedValue::Float(float)) => pool.get_float(*float)?,
            ("D", EncodedValue::Double(double)) => pool.get_double(*double)?,
            ("Ljava/lang/String;", EncodedValue::String(string)) => pool.get_string(string)?.into(),
            _ => return Ok(None),
        };
        Ok(Some(constant))
    }

    fn add_method(&mut self, method: &DexMethod) -> Result<(), ConversionError> {
        let name_index = self.constants_pool.get_utf8(&method.name)?;
        let descriptor_index = self.constants_pool.get_utf8(&method.prototype.render())?;

        let mut attributes = vec![];
        if !method.access_flags.is_bodiless() {
            let code = translate_body(method, &mut self.constants_pool)?;
            attributes.push(self.constants_pool.get_attribute(code)?);
        }

        let system = SystemAnnotations::extract(&method.annotations);
        if !system.throws.is_empty() {
            let exceptions = system
                .throws
                .iter()
                .map(|exception| self.constants_pool.get_class(exception))
                .collect::<Result<Vec<_>, _>>()?;
            attributes.push(self.constants_pool.get_attribute(Exceptions(exceptions))?);
        }
        attributes.extend(self.annotation_attributes(&method.annotations, &system)?);
        attributes.extend(parameter_annotation_attributes(
            &method.parameter_annotations,
            &mut self.constants_pool,
        )?);

        self.methods.push(Method {
            access_flags: method_flags(method.access_flags),
            name_index,
            descriptor_index,
            attributes,
        });
        Ok(())
    }
}

fn class_name(class: &TypeDescriptor) -> Result<&str, ConversionError> {
    class
        .class_name()
        .ok_or_else(|| ConversionError::InvalidClassName(class.to_string()))
}

/// Top-level class flags
///
/// Class files have no private, protected, or static classes (those only exist in the
/// `InnerClasses` attribute), so protected classes are widened to public.
fn class_flags(flags: DexClassFlags) -> ClassAccessFlags {
    let mut class_flags = ClassAccessFlags::from_bits_truncate(
        (flags - DexClassFlags::PRIVATE - DexClassFlags::PROTECTED - DexClassFlags::STATIC).bits()
            as u16,
    );
    if flags.contains(DexClassFlags::PROTECTED) {
        class_flags |= ClassAccessFlags::PUBLIC;
    }
    if !flags.contains(DexClassFlags::INTERFACE) {
        class_flags |= ClassAccessFlags::SUPER;
    }
    class_flags
}

fn method_flags(flags: DexMethodFlags) -> MethodAccessFlags {
    let mut method_flags = MethodAccessFlags::from_bits_truncate(
        (flags - DexMethodFlags::CONSTRUCTOR - DexMethodFlags::DECLARED_SYNCHRONIZED).bits() as u16,
    );
    if flags.contains(DexMethodFlags::DECLARED_SYNCHRONIZED) {
        method_flags |= MethodAccessFlags::SYNCHRONIZED;
    }
    method_flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dex::{
        Annotation, AnnotationElement, AnnotationVisibility, EncodedAnnotation, Prototype,
    };
    use crate::stub::rewrite_method;

    fn ty(descriptor: &str) -> TypeDescriptor {
        TypeDescriptor::from(descriptor)
    }

    fn sample_class() -> ClassDef {
        let class = ty("Lcom/example/Foo;");
        let concrete = DexMethod {
            class: class.clone(),
            name: String::from("count"),
            prototype: Prototype::new(ty("I"), vec![ty("Ljava/lang/String;")]),
            access_flags: DexMethodFlags::PUBLIC | DexMethodFlags::DECLARED_SYNCHRONIZED,
            annotations: vec![],
            parameter_annotations: vec![],
            implementation: None,
        };
        let throwing = DexMethod {
            class: class.clone(),
            name: String::from("load"),
            prototype: Prototype::new(ty("V"), vec![]),
            access_flags: DexMethodFlags::PUBLIC | DexMethodFlags::ABSTRACT,
            annotations: vec![Annotation {
                visibility: AnnotationVisibility::System,
                annotation: EncodedAnnotation {
                    annotation_type: ty("Ldalvik/annotation/Throws;"),
                    elements: vec![AnnotationElement {
                        name: String::from("value"),
                        value: EncodedValue::Array(vec![EncodedValue::Type(ty(
                            "Ljava/io/IOException;",
                        ))]),
                    }],
                },
            }],
            parameter_annotations: vec![],
            implementation: None,
        };
        ClassDef {
            class: class.clone(),
            access_flags: DexClassFlags::PUBLIC | DexClassFlags::ABSTRACT,
            superclass: Some(ty("Ljava/lang/Object;")),
            interfaces: vec![ty("Ljava/lang/Runnable;")],
            source_file: Some(String::from("Foo.java")),
            annotations: vec![],
            fields: vec![DexField {
                class,
                name: String::from("LIMIT"),
                field_type: ty("I"),
                access_flags: DexFieldFlags::PUBLIC | DexFieldFlags::STATIC | DexFieldFlags::FINAL,
                initial_value: Some(EncodedValue::Int(42)),
                annotations: vec![],
            }],
            methods: vec![rewrite_method(&concrete).unwrap(), throwing],
        }
    }

    #[test]
    fn flags_are_mapped() {
        assert_eq!(
            class_flags(DexClassFlags::PROTECTED | DexClassFlags::STATIC | DexClassFlags::FINAL),
            ClassAccessFlags::PUBLIC | ClassAccessFlags::FINAL | ClassAccessFlags::SUPER
        );
        assert_eq!(
            class_flags(
                DexClassFlags::PUBLIC | DexClassFlags::INTERFACE | DexClassFlags::ABSTRACT
            ),
            ClassAccessFlags::PUBLIC | ClassAccessFlags::INTERFACE | ClassAccessFlags::ABSTRACT
        );
        assert_eq!(
            method_flags(
                DexMethodFlags::PUBLIC
                    | DexMethodFlags::CONSTRUCTOR
                    | DexMethodFlags::DECLARED_SYNCHRONIZED
            ),
            MethodAccessFlags::PUBLIC | MethodAccessFlags::SYNCHRONIZED
        );
    }

    #[test]
    fn class_file_header() {
        let translated = translate_class(&sample_class(), Version::JAVA8).unwrap();
        assert_eq!(translated.name, "com/example/Foo");
        assert_eq!(translated.entry_name(), "com/example/Foo.class");
        assert_eq!(&translated.bytes[0..4], &ClassFile::MAGIC);
        assert_eq!(&translated.bytes[4..8], &[0, 0, 0, 52]);
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|window| window == needle)
    }

    #[test]
    fn attributes_are_interned() {
        let bytes = translate_class(&sample_class(), Version::JAVA8).unwrap().bytes;
        for name in [
            "Code",
            "ConstantValue",
            "Exceptions",
            "SourceFile",
            "Foo.java",
            "java/io/IOException",
            "(Ljava/lang/String;)I",
        ] {
            assert!(contains(&bytes, name.as_bytes()), "missing {}", name);
        }
        assert!(!contains(&bytes, b"dalvik/annotation"));
    }

    #[test]
    fn non_class_types_are_rejected() {
        let mut class = sample_class();
        class.superclass = Some(ty("I"));
        assert!(matches!(
            translate_class(&class, Version::JAVA8),
            Err(ConversionError::InvalidClassName(name)) if name == "I"
        ));
    }
}
