//! Dalvik executable (DEX) container
//!
//! The reader resolves every index into a self-contained [`DexFile`] model, and the writer
//! rebuilds all of the index tables from scratch. Between the two, classes and methods can be
//! rewritten freely.
//!
//! Only the parts of the format the model carries survive a round trip: debug information and
//! try blocks are dropped, and method bodies are only re-encoded when they use the
//! [`Instruction`] subset (which has no constant-pool references).
//!
//! [0]: https://source.android.com/docs/core/runtime/dex-format

mod access_flags;
mod descriptors;
mod errors;
pub mod format;
mod index_pool;
mod instruction;
mod model;
mod reader;
mod writer;

pub use access_flags::*;
pub use descriptors::*;
pub use errors::*;
pub use instruction::*;
pub use model::*;
pub use reader::{decode, DexReader};
pub use writer::{encode, DexWriter};

use crate::stub::ContainerCodec;

/// Codec for real DEX files
#[derive(Copy, Clone, Debug, Default)]
pub struct DexCodec;

impl ContainerCodec for DexCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DexFile, DecodeError> {
        decode(bytes)
    }

    fn encode(&self, file: &DexFile) -> Result<Vec<u8>, EncodeError> {
        encode(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(descriptor: &str) -> TypeDescriptor {
        TypeDescriptor::from(descriptor)
    }

    fn annotation(
        visibility: AnnotationVisibility,
        descriptor: &str,
        elements: Vec<AnnotationElement>,
    ) -> Annotation {
        Annotation {
            visibility,
            annotation: EncodedAnnotation {
                annotation_type: ty(descriptor),
                elements,
            },
        }
    }

    fn sample_file() -> DexFile {
        let foo = ty("Lcom/example/Foo;");
        let base = ty("Lcom/example/Base;");
        let object = ty("Ljava/lang/Object;");

        let base_class = ClassDef {
            class: base.clone(),
            access_flags: ClassAccessFlags::PUBLIC | ClassAccessFlags::ABSTRACT,
            superclass: Some(object.clone()),
            interfaces: vec![],
            source_file: None,
            annotations: vec![],
            fields: vec![],
            methods: vec![Method {
                class: base.clone(),
                name: String::from("bar"),
                prototype: Prototype::new(ty("V"), vec![]),
                access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::ABSTRACT,
                annotations: vec![],
                parameter_annotations: vec![],
                implementation: None,
            }],
        };

        let foo_class = ClassDef {
            class: foo.clone(),
            access_flags: ClassAccessFlags::PUBLIC,
            superclass: Some(base.clone()),
            interfaces: vec![ty("Ljava/lang/Runnable;")],
            source_file: Some(String::from("Foo.java")),
            // Elements in name order, which is how they are read back
            annotations: vec![annotation(
                AnnotationVisibility::Runtime,
                "Lcom/example/Marker;",
                vec![
                    AnnotationElement {
                        name: String::from("count"),
                        value: EncodedValue::Array(vec![
                            EncodedValue::Int(-1),
                            EncodedValue::Long(1 << 40),
                            EncodedValue::Double(0.5),
                        ]),
                    },
                    AnnotationElement {
                        name: String::from("value"),
                        value: EncodedValue::String(String::from("héllo")),
                    },
                ],
            )],
            fields: vec![
                Field {
                    class: foo.clone(),
                    name: String::from("LIMIT"),
                    field_type: ty("I"),
                    access_flags: FieldAccessFlags::PUBLIC
                        | FieldAccessFlags::STATIC
                        | FieldAccessFlags::FINAL,
                    initial_value: Some(EncodedValue::Int(300)),
                    annotations: vec![],
                },
                Field {
                    class: foo.clone(),
                    name: String::from("name"),
                    field_type: ty("Ljava/lang/String;"),
                    access_flags: FieldAccessFlags::PRIVATE,
                    initial_value: None,
                    annotations: vec![annotation(
                        AnnotationVisibility::Build,
                        "Lcom/example/Nullable;",
                        vec![],
                    )],
                },
            ],
            methods: vec![
                Method {
                    class: foo.clone(),
                    name: String::from("count"),
                    prototype: Prototype::new(ty("J"), vec![ty("I")]),
                    access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
                    annotations: vec![],
                    parameter_annotations: vec![vec![annotation(
                        AnnotationVisibility::Runtime,
                        "Lcom/example/Positive;",
                        vec![],
                    )]],
                    implementation: Some(
                        MethodImplementation::from_instructions(
                            3,
                            1,
                            &[
                                Instruction::ConstWide16(Register(1), 0),
                                Instruction::ReturnWide(Register(1)),
                            ],
                        )
                        .unwrap(),
                    ),
                },
                Method {
                    class: foo.clone(),
                    name: String::from("run"),
                    prototype: Prototype::new(ty("V"), vec![]),
                    access_flags: MethodAccessFlags::PUBLIC,
                    annotations: vec![annotation(
                        AnnotationVisibility::Runtime,
                        "Ljava/lang/Override;",
                        vec![],
                    )],
                    parameter_annotations: vec![],
                    implementation: Some(
                        MethodImplementation::from_instructions(1, 1, &[Instruction::ReturnVoid])
                            .unwrap(),
                    ),
                },
            ],
        };

        // Subclass listed first to exercise class ordering
        DexFile::new(vec![foo_class, base_class])
    }

    #[test]
    fn encode_then_decode_preserves_model() {
        let file = sample_file();
        let bytes = encode(&file).unwrap();
        let decoded = decode(&bytes).unwrap();

        assert_eq!(decoded.version, DexVersion::V035);
        // Superclass is written out first
        assert_eq!(decoded.classes[0], file.classes[1]);
        assert_eq!(decoded.classes[1], file.classes[0]);
    }

    #[test]
    fn encoding_is_deterministic() {
        let file = sample_file();
        assert_eq!(encode(&file).unwrap(), encode(&file).unwrap());
    }

    #[test]
    fn header_is_consistent() {
        let bytes = encode(&sample_file()).unwrap();
        assert_eq!(&bytes[0..8], b"dex\n035\0");
        let file_size = u32::from_le_bytes([bytes[32], bytes[33], bytes[34], bytes[35]]);
        assert_eq!(file_size as usize, bytes.len());
        let checksum = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        assert_eq!(checksum, adler::adler32_slice(&bytes[12..]));
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        let mut bytes = encode(&sample_file()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(matches!(
            decode(&bytes),
            Err(DecodeError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = encode(&sample_file()).unwrap();
        bytes[0] = b'D';
        assert!(matches!(decode(&bytes), Err(DecodeError::BadMagic(_))));
        assert!(matches!(decode(&bytes[..16]), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn body_with_try_blocks_is_not_encoded() {
        let mut file = sample_file();
        if let Some(implementation) = &mut file.classes[0].methods[1].implementation {
            implementation.tries_size = 1;
        }
        assert!(matches!(
            encode(&file),
            Err(EncodeError::TryBlocks { .. })
        ));
    }

    #[test]
    fn body_with_indexed_instructions_is_not_encoded() {
        let mut file = sample_file();
        if let Some(implementation) = &mut file.classes[0].methods[1].implementation {
            // invoke-virtual, which refers to the method_ids table
            implementation.insns = vec![0x106e, 0x0000, 0x0000, 0x000e];
        }
        assert!(matches!(
            encode(&file),
            Err(EncodeError::UnsupportedBody { .. })
        ));
    }

    #[test]
    fn cyclic_hierarchy_is_rejected() {
        let mut file = sample_file();
        file.classes[1].superclass = Some(ty("Lcom/example/Foo;"));
        assert!(matches!(
            encode(&file),
            Err(EncodeError::CyclicHierarchy(_))
        ));
    }
}
