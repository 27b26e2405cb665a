use crate::dex::{EncodedValue, TypeDescriptor};

/// Who gets to see an annotation
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub enum AnnotationVisibility {
    /// Only meant for build tools (`RetentionPolicy.CLASS`)
    Build,

    /// Readable at runtime (`RetentionPolicy.RUNTIME`)
    Runtime,

    /// Used by the runtime itself (`dalvik/annotation/*`)
    System,
}

impl AnnotationVisibility {
    pub fn from_code(code: u8) -> Option<AnnotationVisibility> {
        match code {
            0x00 => Some(AnnotationVisibility::Build),
            0x01 => Some(AnnotationVisibility::Runtime),
            0x02 => Some(AnnotationVisibility::System),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            AnnotationVisibility::Build => 0x00,
            AnnotationVisibility::Runtime => 0x01,
            AnnotationVisibility::System => 0x02,
        }
    }
}

/// Annotation attached to a class, field, method, or parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub visibility: AnnotationVisibility,
    pub annotation: EncodedAnnotation,
}

/// Annotation body, also used for annotation-valued elements
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedAnnotation {
    pub annotation_type: TypeDescriptor,
    pub elements: Vec<AnnotationElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationElement {
    pub name: String,
    pub value: EncodedValue,
}

impl EncodedAnnotation {
    /// Look up an element by name
    pub fn element(&self, name: &str) -> Option<&EncodedValue> {
        self.elements
            .iter()
            .find(|element| element.name == name)
            .map(|element| &element.value)
    }
}
