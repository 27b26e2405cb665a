//! Annotations and the system annotations that stand in for class file attributes
//!
//! DEX keeps generic signatures and `throws` clauses as annotations in `dalvik/annotation`. Those
//! become `Signature` and `Exceptions` attributes; the remaining system annotations (inner class
//! records, member classes, annotation defaults, ...) have no place in the stub JAR and are
//! dropped. Build and runtime annotations map onto invisible and visible annotation attributes.

use crate::dex::{
    Annotation as DexAnnotation, AnnotationVisibility, EncodedAnnotation, EncodedValue,
};
use crate::jar::ConversionError;
use crate::jvm::class_file::{
    Annotation, Attribute, ConstantsPool, ElementValue, ElementValuePair,
    RuntimeInvisibleAnnotations, RuntimeInvisibleParameterAnnotations, RuntimeVisibleAnnotations,
    RuntimeVisibleParameterAnnotations,
};

const SIGNATURE: &str = "Ldalvik/annotation/Signature;";
const THROWS: &str = "Ldalvik/annotation/Throws;";

/// Information carried by `dalvik/annotation` system annotations
#[derive(Debug, Default, PartialEq)]
pub struct SystemAnnotations {
    /// Generic signature, reassembled from its string pieces
    pub signature: Option<String>,

    /// Declared checked exceptions, as internal names (or array descriptors)
    pub throws: Vec<String>,
}

impl SystemAnnotations {
    pub fn extract(annotations: &[DexAnnotation]) -> SystemAnnotations {
        let mut system = SystemAnnotations::default();
        for annotation in annotations {
            if annotation.visibility != AnnotationVisibility::System {
                continue;
            }
            let body = &annotation.annotation;
            match body.annotation_type.as_str() {
                SIGNATURE => {
                    if let Some(EncodedValue::Array(pieces)) = body.element("value") {
                        let mut signature = String::new();
                        for piece in pieces {
                            if let EncodedValue::String(piece) = piece {
                                signature.push_str(piece);
                            }
                        }
                        system.signature = Some(signature);
                    }
                }
                THROWS => {
                    if let Some(EncodedValue::Array(types)) = body.element("value") {
                        for exception in types {
                            if let EncodedValue::Type(exception) = exception {
                                let name = exception.class_name().unwrap_or(exception.as_str());
                                system.throws.push(name.to_owned());
                            }
                        }
                    }
                }
                other => log::debug!("Dropping system annotation {}", other),
            }
        }
        system
    }
}

/// `RuntimeVisibleAnnotations` and `RuntimeInvisibleAnnotations` attributes, when non-empty
pub fn annotation_attributes(
    annotations: &[DexAnnotation],
    pool: &mut ConstantsPool,
) -> Result<Vec<Attribute>, ConversionError> {
    let (visible, invisible) = split_by_visibility(annotations, pool)?;
    let mut attributes = vec![];
    if !visible.is_empty() {
        attributes.push(pool.get_attribute(RuntimeVisibleAnnotations(visible))?);
    }
    if !invisible.is_empty() {
        attributes.push(pool.get_attribute(RuntimeInvisibleAnnotations(invisible))?);
    }
    Ok(attributes)
}

/// Parameter annotation attributes, when at least one parameter has an annotation of that kind
pub fn parameter_annotation_attributes(
    parameters: &[Vec<DexAnnotation>],
    pool: &mut ConstantsPool,
) -> Result<Vec<Attribute>, ConversionError> {
    let mut visible = Vec::with_capacity(parameters.len());
    let mut invisible = Vec::with_capacity(parameters.len());
    for annotations in parameters {
        let (param_visible, param_invisible) = split_by_visibility(annotations, pool)?;
        visible.push(param_visible);
        invisible.push(param_invisible);
    }

    let mut attributes = vec![];
    if visible.iter().any(|annotations| !annotations.is_empty()) {
        attributes.push(pool.get_attribute(RuntimeVisibleParameterAnnotations(visible))?);
    }
    if invisible.iter().any(|annotations| !annotations.is_empty()) {
        attributes.push(pool.get_attribute(RuntimeInvisibleParameterAnnotations(invisible))?);
    }
    Ok(attributes)
}

fn split_by_visibility(
    annotations: &[DexAnnotation],
    pool: &mut ConstantsPool,
) -> Result<(Vec<Annotation>, Vec<Annotation>), ConversionError> {
    let mut visible = vec![];
    let mut invisible = vec![];
    for annotation in annotations {
        match annotation.visibility {
            AnnotationVisibility::Runtime => {
                visible.push(translate_annotation(&annotation.annotation, pool)?)
            }
            AnnotationVisibility::Build => {
                invisible.push(translate_annotation(&annotation.annotation, pool)?)
            }
            AnnotationVisibility::System => (),
        }
    }
    Ok((visible, invisible))
}

fn translate_annotation(
    annotation: &EncodedAnnotation,
    pool: &mut ConstantsPool,
) -> Result<Annotation, ConversionError> {
    let type_index = pool.get_utf8(annotation.annotation_type.as_str())?;
    let mut elements = Vec::with_capacity(annotation.elements.len());
    for element in &annotation.elements {
        match translate_value(&element.value, pool)? {
            Some(value) => elements.push(ElementValuePair {
                name_index: pool.get_utf8(&element.name)?,
                value,
            }),
            None => log::warn!(
                "Skipping element {} of {}: value cannot appear in a class file annotation",
                element.name,
                annotation.annotation_type
            ),
        }
    }
    Ok(Annotation {
        type_index,
        elements,
    })
}

/// Element value for an encoded value, if class file annotations can express it
fn translate_value(
    value: &EncodedValue,
    pool: &mut ConstantsPool,
) -> Result<Option<ElementValue>, ConversionError> {
    let int = |tag: u8, value: i32, pool: &mut ConstantsPool| {
        pool.get_integer(value)
            .map(|value| Some(ElementValue::Constant { tag, value }))
    };
    let element = match value {
        EncodedValue::Byte(byte) => int(b'B', *byte as i32, pool)?,
        EncodedValue::Short(short) => int(b'S', *short as i32, pool)?,
        EncodedValue::Char(character) => int(b'C', *character as i32, pool)?,
        EncodedValue::Int(integer) => int(b'I', *integer, pool)?,
        EncodedValue::Boolean(boolean) => int(b'Z', *boolean as i32, pool)?,
        EncodedValue::Long(long) => Some(ElementValue::Constant {
            tag: b'J',
            value: pool.get_long(*long)?,
        }),
        EncodedValue::Float(float) => Some(ElementValue::Constant {
            tag: b'F',
            value: pool.get_float(*float)?,
        }),
        EncodedValue::Double(double) => Some(ElementValue::Constant {
            tag: b'D',
            value: pool.get_double(*double)?,
        }),

        // Unlike `ldc`, string elements point straight at the UTF-8 constant
        EncodedValue::String(string) => Some(ElementValue::Constant {
            tag: b's',
            value: pool.get_utf8(string)?.into(),
        }),
        EncodedValue::Type(class) => Some(ElementValue::Class(pool.get_utf8(class.as_str())?)),
        EncodedValue::Enum(field) => Some(ElementValue::Enum {
            type_name: pool.get_utf8(field.field_type.as_str())?,
            const_name: pool.get_utf8(&field.name)?,
        }),
        EncodedValue::Annotation(annotation) => Some(ElementValue::Annotation(
            translate_annotation(annotation, pool)?,
        )),
        EncodedValue::Array(values) => {
            let mut elements = Vec::with_capacity(values.len());
            for value in values {
                if let Some(element) = translate_value(value, pool)? {
                    elements.push(element);
                }
            }
            Some(ElementValue::Array(elements))
        }
        EncodedValue::Null
        | EncodedValue::MethodType(_)
        | EncodedValue::MethodHandle(_)
        | EncodedValue::Field(_)
        | EncodedValue::Method(_) => None,
    };
    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dex::{AnnotationElement, FieldRef, TypeDescriptor};
    use crate::jvm::class_file::to_bytes;

    fn annotation(
        visibility: AnnotationVisibility,
        descriptor: &str,
        elements: Vec<AnnotationElement>,
    ) -> DexAnnotation {
        DexAnnotation {
            visibility,
            annotation: EncodedAnnotation {
                annotation_type: TypeDescriptor::from(descriptor),
                elements,
            },
        }
    }

    fn value_element(value: EncodedValue) -> Vec<AnnotationElement> {
        vec![AnnotationElement {
            name: String::from("value"),
            value,
        }]
    }

    #[test]
    fn signature_and_throws() {
        let annotations = vec![
            annotation(
                AnnotationVisibility::System,
                SIGNATURE,
                value_element(EncodedValue::Array(vec![
                    EncodedValue::String(String::from("Ljava/util/List<")),
                    EncodedValue::String(String::from("Ljava/lang/String;")),
                    EncodedValue::String(String::from(">;")),
                ])),
            ),
            annotation(
                AnnotationVisibility::System,
                THROWS,
                value_element(EncodedValue::Array(vec![EncodedValue::Type(
                    TypeDescriptor::from("Ljava/io/IOException;"),
                )])),
            ),
            annotation(
                AnnotationVisibility::System,
                "Ldalvik/annotation/InnerClass;",
                vec![],
            ),
        ];
        assert_eq!(
            SystemAnnotations::extract(&annotations),
            SystemAnnotations {
                signature: Some(String::from("Ljava/util/List<Ljava/lang/String;>;")),
                throws: vec![String::from("java/io/IOException")],
            }
        );
    }

    #[test]
    fn visibility_picks_attribute() {
        let mut pool = ConstantsPool::new();
        let annotations = vec![
            annotation(AnnotationVisibility::Runtime, "Lcom/example/Keep;", vec![]),
            annotation(AnnotationVisibility::Build, "Lcom/example/Generated;", vec![]),
            annotation(AnnotationVisibility::System, SIGNATURE, vec![]),
        ];
        let attributes = annotation_attributes(&annotations, &mut pool).unwrap();
        assert_eq!(attributes.len(), 2);
        assert_eq!(
            attributes[0].name_index,
            pool.get_utf8("RuntimeVisibleAnnotations").unwrap()
        );
        assert_eq!(
            attributes[1].name_index,
            pool.get_utf8("RuntimeInvisibleAnnotations").unwrap()
        );

        assert!(annotation_attributes(&annotations[2..], &mut pool)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn parameter_annotations_keep_positions() {
        let mut pool = ConstantsPool::new();
        let parameters = vec![
            vec![],
            vec![annotation(
                AnnotationVisibility::Runtime,
                "Lcom/example/NonNull;",
                vec![],
            )],
        ];
        let attributes = parameter_annotation_attributes(&parameters, &mut pool).unwrap();
        assert_eq!(attributes.len(), 1);

        // two parameters, no annotations on the first, one on the second
        let type_index = pool.get_utf8("Lcom/example/NonNull;").unwrap();
        let mut expected = vec![2, 0, 0, 0, 1];
        expected.extend(to_bytes(&type_index).unwrap());
        expected.extend([0, 0]);
        assert_eq!(attributes[0].info, expected);
    }

    #[test]
    fn unrepresentable_elements_are_skipped() {
        let mut pool = ConstantsPool::new();
        let body = EncodedAnnotation {
            annotation_type: TypeDescriptor::from("Lcom/example/Config;"),
            elements: vec![
                AnnotationElement {
                    name: String::from("mode"),
                    value: EncodedValue::Enum(FieldRef {
                        class: TypeDescriptor::from("Lcom/example/Mode;"),
                        name: String::from("FAST"),
                        field_type: TypeDescriptor::from("Lcom/example/Mode;"),
                    }),
                },
                AnnotationElement {
                    name: String::from("nothing"),
                    value: EncodedValue::Null,
                },
                AnnotationElement {
                    name: String::from("values"),
                    value: EncodedValue::Array(vec![EncodedValue::Int(1), EncodedValue::Null]),
                },
            ],
        };
        let translated = translate_annotation(&body, &mut pool).unwrap();
        assert_eq!(translated.elements.len(), 2);
        assert!(matches!(
            &translated.elements[1].value,
            ElementValue::Array(values) if values.len() == 1
        ));
    }
}
