use crate::dex::format::{
    header, item_type, value_type, ENDIAN_CONSTANT, HEADER_SIZE, MAGIC_PREFIX, NO_INDEX,
};
use crate::dex::{
    Annotation, AnnotationElement, AnnotationVisibility, ClassAccessFlags, ClassDef, DecodeError,
    DexFile, DexVersion, EncodedAnnotation, EncodedValue, Field, FieldAccessFlags, FieldRef,
    Method, MethodAccessFlags, MethodHandle, MethodHandleKind, MethodHandleMember,
    MethodImplementation, MethodRef, Prototype, TypeDescriptor,
};
use crate::util::{decode_modified_utf8, read_uleb128, utf16_len};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::collections::HashMap;
use std::io::Cursor;

/// Decode a whole DEX file into the in-memory model
pub fn decode(bytes: &[u8]) -> Result<DexFile, DecodeError> {
    DexReader::new(bytes)?.read_file()
}

/// `(size, offset)` pair from the header
#[derive(Copy, Clone, Debug)]
struct Section {
    size: u32,
    offset: u32,
}

impl Section {
    fn at(bytes: &[u8], field: usize) -> Section {
        Section {
            size: LittleEndian::read_u32(&bytes[field..]),
            offset: LittleEndian::read_u32(&bytes[field + 4..]),
        }
    }
}

/// Annotations of one class, keyed by field and method index
#[derive(Default)]
struct AnnotationsDirectory {
    class: Vec<Annotation>,
    fields: HashMap<u32, Vec<Annotation>>,
    methods: HashMap<u32, Vec<Annotation>>,
    parameters: HashMap<u32, Vec<Vec<Annotation>>>,
}

/// Reader over the bytes of a DEX file, with its id tables already resolved
pub struct DexReader<'a> {
    bytes: &'a [u8],
    version: DexVersion,
    strings: Vec<String>,
    types: Vec<TypeDescriptor>,
    protos: Vec<Prototype>,
    fields: Vec<FieldRef>,
    methods: Vec<MethodRef>,
    method_handles: Vec<MethodHandle>,
    class_defs: Section,
}

impl<'a> DexReader<'a> {
    /// Validate the header and read all of the id tables
    pub fn new(bytes: &'a [u8]) -> Result<DexReader<'a>, DecodeError> {
        if bytes.len() < HEADER_SIZE as usize {
            return Err(DecodeError::Malformed(format!(
                "{} bytes is too short to hold a header",
                bytes.len()
            )));
        }

        let mut magic = [0u8; 8];
        magic.copy_from_slice(&bytes[0..8]);
        if magic[0..4] != MAGIC_PREFIX || magic[7] != 0 {
            return Err(DecodeError::BadMagic(magic));
        }
        let version_digits = String::from_utf8_lossy(&magic[4..7]).into_owned();
        let version = match version_digits.parse::<u16>() {
            Ok(version) if (35..=39).contains(&version) => DexVersion(version),
            _ => return Err(DecodeError::UnsupportedVersion(version_digits)),
        };

        let endian_tag = LittleEndian::read_u32(&bytes[header::ENDIAN_TAG..]);
        if endian_tag != ENDIAN_CONSTANT {
            return Err(DecodeError::BadEndianTag(endian_tag));
        }

        let file_size = LittleEndian::read_u32(&bytes[header::FILE_SIZE..]);
        if file_size as usize > bytes.len() || file_size < HEADER_SIZE {
            return Err(DecodeError::FileSizeMismatch {
                header: file_size,
                actual: bytes.len(),
            });
        }
        let bytes = &bytes[..file_size as usize];

        let expected = LittleEndian::read_u32(&bytes[header::CHECKSUM..]);
        let actual = adler::adler32_slice(&bytes[header::SIGNATURE..]);
        if expected != actual {
            return Err(DecodeError::ChecksumMismatch { expected, actual });
        }

        let mut reader = DexReader {
            bytes,
            version,
            strings: vec![],
            types: vec![],
            protos: vec![],
            fields: vec![],
            methods: vec![],
            method_handles: vec![],
            class_defs: Section::at(bytes, header::CLASS_DEFS),
        };
        reader.read_id_tables()?;
        log::debug!(
            "Read id tables: {} strings, {} types, {} protos, {} fields, {} methods, {} handles",
            reader.strings.len(),
            reader.types.len(),
            reader.protos.len(),
            reader.fields.len(),
            reader.methods.len(),
            reader.method_handles.len()
        );
        Ok(reader)
    }

    pub fn version(&self) -> DexVersion {
        self.version
    }

    /// Read every class definition
    pub fn read_file(&self) -> Result<DexFile, DecodeError> {
        let mut cursor = self.cursor(self.class_defs.offset)?;
        let classes = (0..self.class_defs.size)
            .map(|_| self.read_class_def(&mut cursor))
            .collect::<Result<Vec<ClassDef>, DecodeError>>()?;
        Ok(DexFile {
            version: self.version,
            classes,
        })
    }

    fn cursor(&self, offset: u32) -> Result<Cursor<&'a [u8]>, DecodeError> {
        if offset as usize > self.bytes.len() {
            return Err(DecodeError::Malformed(format!(
                "offset {:#x} is past the end of the file",
                offset
            )));
        }
        let mut cursor = Cursor::new(self.bytes);
        cursor.set_position(offset as u64);
        Ok(cursor)
    }

    fn read_id_tables(&mut self) -> Result<(), DecodeError> {
        let bytes = self.bytes;

        let string_ids = Section::at(bytes, header::STRING_IDS);
        let mut cursor = self.cursor(string_ids.offset)?;
        for _ in 0..string_ids.size {
            let string_data_off = cursor.read_u32::<LittleEndian>()?;
            let string = self.read_string_data(string_data_off)?;
            self.strings.push(string);
        }

        let type_ids = Section::at(bytes, header::TYPE_IDS);
        let mut cursor = self.cursor(type_ids.offset)?;
        for _ in 0..type_ids.size {
            let descriptor_idx = cursor.read_u32::<LittleEndian>()?;
            let descriptor = TypeDescriptor::new(self.string(descriptor_idx)?.as_str());
            self.types.push(descriptor);
        }

        let proto_ids = Section::at(bytes, header::PROTO_IDS);
        let mut cursor = self.cursor(proto_ids.offset)?;
        for _ in 0..proto_ids.size {
            let _shorty_idx = cursor.read_u32::<LittleEndian>()?;
            let return_type_idx = cursor.read_u32::<LittleEndian>()?;
            let parameters_off = cursor.read_u32::<LittleEndian>()?;
            let proto = Prototype::new(
                self.type_at(return_type_idx)?.clone(),
                self.read_type_list(parameters_off)?,
            );
            self.protos.push(proto);
        }

        let field_ids = Section::at(bytes, header::FIELD_IDS);
        let mut cursor = self.cursor(field_ids.offset)?;
        for _ in 0..field_ids.size {
            let class_idx = cursor.read_u16::<LittleEndian>()?;
            let type_idx = cursor.read_u16::<LittleEndian>()?;
            let name_idx = cursor.read_u32::<LittleEndian>()?;
            let field = FieldRef {
                class: self.type_at(class_idx as u32)?.clone(),
                name: self.string(name_idx)?.clone(),
                field_type: self.type_at(type_idx as u32)?.clone(),
            };
            self.fields.push(field);
        }

        let method_ids = Section::at(bytes, header::METHOD_IDS);
        let mut cursor = self.cursor(method_ids.offset)?;
        for _ in 0..method_ids.size {
            let class_idx = cursor.read_u16::<LittleEndian>()?;
            let proto_idx = cursor.read_u16::<LittleEndian>()?;
            let name_idx = cursor.read_u32::<LittleEndian>()?;
            let method = MethodRef {
                class: self.type_at(class_idx as u32)?.clone(),
                name: self.string(name_idx)?.clone(),
                prototype: self.proto(proto_idx as u32)?.clone(),
            };
            self.methods.push(method);
        }

        // Method handles are only reachable through the map list
        let map_off = LittleEndian::read_u32(&bytes[header::MAP_OFF..]);
        if map_off != 0 {
            let mut cursor = self.cursor(map_off)?;
            let map_size = cursor.read_u32::<LittleEndian>()?;
            for _ in 0..map_size {
                let entry_type = cursor.read_u16::<LittleEndian>()?;
                let _unused = cursor.read_u16::<LittleEndian>()?;
                let size = cursor.read_u32::<LittleEndian>()?;
                let offset = cursor.read_u32::<LittleEndian>()?;
                if entry_type == item_type::METHOD_HANDLE_ITEM {
                    self.read_method_handles(Section { size, offset })?;
                }
            }
        }

        Ok(())
    }

    fn read_method_handles(&mut self, section: Section) -> Result<(), DecodeError> {
        let mut cursor = self.cursor(section.offset)?;
        for _ in 0..section.size {
            let kind_code = cursor.read_u16::<LittleEndian>()?;
            let _unused = cursor.read_u16::<LittleEndian>()?;
            let member_idx = cursor.read_u16::<LittleEndian>()? as u32;
            let _unused = cursor.read_u16::<LittleEndian>()?;

            let kind = MethodHandleKind::from_code(kind_code).ok_or_else(|| {
                DecodeError::Malformed(format!("unknown method handle type {:#x}", kind_code))
            })?;
            let member = if kind.is_field_accessor() {
                MethodHandleMember::Field(self.field(member_idx)?.clone())
            } else {
                MethodHandleMember::Method(self.method(member_idx)?.clone())
            };
            self.method_handles.push(MethodHandle { kind, member });
        }
        Ok(())
    }

    fn read_string_data(&self, offset: u32) -> Result<String, DecodeError> {
        let mut cursor = self.cursor(offset)?;
        let utf16_size = read_uleb128(&mut cursor)?;
        let start = cursor.position() as usize;
        let end = self.bytes[start..]
            .iter()
            .position(|byte| *byte == 0)
            .map(|len| start + len)
            .ok_or_else(|| DecodeError::MalformedString {
                offset,
                reason: String::from("missing null terminator"),
            })?;

        let string = decode_modified_utf8(&self.bytes[start..end])
            .map_err(|reason| DecodeError::MalformedString { offset, reason })?;
        if utf16_len(&string) != utf16_size as usize {
            return Err(DecodeError::MalformedString {
                offset,
                reason: format!(
                    "declared {} UTF-16 code units but found {}",
                    utf16_size,
                    utf16_len(&string)
                ),
            });
        }
        Ok(string)
    }

    fn string(&self, idx: u32) -> Result<&String, DecodeError> {
        self.strings
            .get(idx as usize)
            .ok_or(DecodeError::IndexOutOfRange {
                table: "string_ids",
                index: idx,
            })
    }

    fn type_at(&self, idx: u32) -> Result<&TypeDescriptor, DecodeError> {
        self.types
            .get(idx as usize)
            .ok_or(DecodeError::IndexOutOfRange {
                table: "type_ids",
                index: idx,
            })
    }

    fn proto(&self, idx: u32) -> Result<&Prototype, DecodeError> {
        self.protos
            .get(idx as usize)
            .ok_or(DecodeError::IndexOutOfRange {
                table: "proto_ids",
                index: idx,
            })
    }

    fn field(&self, idx: u32) -> Result<&FieldRef, DecodeError> {
        self.fields
            .get(idx as usize)
            .ok_or(DecodeError::IndexOutOfRange {
                table: "field_ids",
                index: idx,
            })
    }

    fn method(&self, idx: u32) -> Result<&MethodRef, DecodeError> {
        self.methods
            .get(idx as usize)
            .ok_or(DecodeError::IndexOutOfRange {
                table: "method_ids",
                index: idx,
            })
    }

    fn method_handle(&self, idx: u32) -> Result<&MethodHandle, DecodeError> {
        self.method_handles
            .get(idx as usize)
            .ok_or(DecodeError::IndexOutOfRange {
                table: "method_handles",
                index: idx,
            })
    }

    fn read_type_list(&self, offset: u32) -> Result<Vec<TypeDescriptor>, DecodeError> {
        if offset == 0 {
            return Ok(vec![]);
        }
        let mut cursor = self.cursor(offset)?;
        let size = cursor.read_u32::<LittleEndian>()?;
        (0..size)
            .map(|_| -> Result<TypeDescriptor, DecodeError> {
                let type_idx = cursor.read_u16::<LittleEndian>()?;
                Ok(self.type_at(type_idx as u32)?.clone())
            })
            .collect()
    }

    fn read_class_def(&self, cursor: &mut Cursor<&'a [u8]>) -> Result<ClassDef, DecodeError> {
        let class_idx = cursor.read_u32::<LittleEndian>()?;
        let raw_access_flags = cursor.read_u32::<LittleEndian>()?;
        let superclass_idx = cursor.read_u32::<LittleEndian>()?;
        let interfaces_off = cursor.read_u32::<LittleEndian>()?;
        let source_file_idx = cursor.read_u32::<LittleEndian>()?;
        let annotations_off = cursor.read_u32::<LittleEndian>()?;
        let class_data_off = cursor.read_u32::<LittleEndian>()?;
        let static_values_off = cursor.read_u32::<LittleEndian>()?;

        let class = self.type_at(class_idx)?.clone();
        let access_flags = ClassAccessFlags::from_bits(raw_access_flags).ok_or_else(|| {
            DecodeError::UnknownAccessFlags {
                item: class.to_string(),
                flags: raw_access_flags & !ClassAccessFlags::all().bits(),
            }
        })?;
        let superclass = if superclass_idx == NO_INDEX {
            None
        } else {
            Some(self.type_at(superclass_idx)?.clone())
        };
        let interfaces = self.read_type_list(interfaces_off)?;
        let source_file = if source_file_idx == NO_INDEX {
            None
        } else {
            Some(self.string(source_file_idx)?.clone())
        };

        let mut directory = self.read_annotations_directory(annotations_off)?;
        let static_values = if static_values_off == 0 {
            vec![]
        } else {
            self.read_encoded_array(&mut self.cursor(static_values_off)?)?
        };
        let (fields, methods) =
            self.read_class_data(class_data_off, &mut directory, static_values)?;

        log::trace!(
            "Read {} with {} fields and {} methods",
            class,
            fields.len(),
            methods.len()
        );
        Ok(ClassDef {
            class,
            access_flags,
            superclass,
            interfaces,
            source_file,
            annotations: directory.class,
            fields,
            methods,
        })
    }

    fn read_class_data(
        &self,
        offset: u32,
        directory: &mut AnnotationsDirectory,
        static_values: Vec<EncodedValue>,
    ) -> Result<(Vec<Field>, Vec<Method>), DecodeError> {
        if offset == 0 {
            return Ok((vec![], vec![]));
        }
        let mut cursor = self.cursor(offset)?;
        let static_fields_size = read_uleb128(&mut cursor)?;
        let instance_fields_size = read_uleb128(&mut cursor)?;
        let direct_methods_size = read_uleb128(&mut cursor)?;
        let virtual_methods_size = read_uleb128(&mut cursor)?;

        let mut static_values = static_values.into_iter();
        let mut fields = vec![];
        for (count, is_static) in [(static_fields_size, true), (instance_fields_size, false)] {
            let mut field_idx: u32 = 0;
            for _ in 0..count {
                field_idx = next_index(field_idx, read_uleb128(&mut cursor)?)?;
                let raw_access_flags = read_uleb128(&mut cursor)?;
                let reference = self.field(field_idx)?;
                let access_flags = FieldAccessFlags::from_bits(raw_access_flags).ok_or_else(|| {
                    DecodeError::UnknownAccessFlags {
                        item: reference.to_string(),
                        flags: raw_access_flags & !FieldAccessFlags::all().bits(),
                    }
                })?;
                let initial_value = if is_static { static_values.next() } else { None };
                fields.push(Field {
                    class: reference.class.clone(),
                    name: reference.name.clone(),
                    field_type: reference.field_type.clone(),
                    access_flags,
                    initial_value,
                    annotations: directory.fields.remove(&field_idx).unwrap_or_default(),
                });
            }
        }

        let mut methods = vec![];
        for count in [direct_methods_size, virtual_methods_size] {
            let mut method_idx: u32 = 0;
            for _ in 0..count {
                method_idx = next_index(method_idx, read_uleb128(&mut cursor)?)?;
                let raw_access_flags = read_uleb128(&mut cursor)?;
                let code_off = read_uleb128(&mut cursor)?;
                let reference = self.method(method_idx)?;
                let access_flags =
                    MethodAccessFlags::from_bits(raw_access_flags).ok_or_else(|| {
                        DecodeError::UnknownAccessFlags {
                            item: reference.to_string(),
                            flags: raw_access_flags & !MethodAccessFlags::all().bits(),
                        }
                    })?;
                let implementation = if code_off == 0 {
                    None
                } else {
                    Some(self.read_code_item(code_off)?)
                };
                methods.push(Method {
                    class: reference.class.clone(),
                    name: reference.name.clone(),
                    prototype: reference.prototype.clone(),
                    access_flags,
                    annotations: directory.methods.remove(&method_idx).unwrap_or_default(),
                    parameter_annotations: directory
                        .parameters
                        .remove(&method_idx)
                        .unwrap_or_default(),
                    implementation,
                });
            }
        }

        Ok((fields, methods))
    }

    /// Read a `code_item`, skipping over try blocks and debug information
    fn read_code_item(&self, offset: u32) -> Result<MethodImplementation, DecodeError> {
        let mut cursor = self.cursor(offset)?;
        let registers_size = cursor.read_u16::<LittleEndian>()?;
        let ins_size = cursor.read_u16::<LittleEndian>()?;
        let outs_size = cursor.read_u16::<LittleEndian>()?;
        let tries_size = cursor.read_u16::<LittleEndian>()?;
        let _debug_info_off = cursor.read_u32::<LittleEndian>()?;
        let insns_size = cursor.read_u32::<LittleEndian>()?;
        let insns = (0..insns_size)
            .map(|_| cursor.read_u16::<LittleEndian>())
            .collect::<Result<Vec<u16>, _>>()?;
        Ok(MethodImplementation {
            registers_size,
            ins_size,
            outs_size,
            tries_size,
            insns,
        })
    }

    fn read_annotations_directory(&self, offset: u32) -> Result<AnnotationsDirectory, DecodeError> {
        let mut directory = AnnotationsDirectory::default();
        if offset == 0 {
            return Ok(directory);
        }

        let mut cursor = self.cursor(offset)?;
        let class_annotations_off = cursor.read_u32::<LittleEndian>()?;
        let fields_size = cursor.read_u32::<LittleEndian>()?;
        let methods_size = cursor.read_u32::<LittleEndian>()?;
        let parameters_size = cursor.read_u32::<LittleEndian>()?;

        directory.class = self.read_annotation_set(class_annotations_off)?;
        for _ in 0..fields_size {
            let field_idx = cursor.read_u32::<LittleEndian>()?;
            let annotations_off = cursor.read_u32::<LittleEndian>()?;
            let annotations = self.read_annotation_set(annotations_off)?;
            directory.fields.insert(field_idx, annotations);
        }
        for _ in 0..methods_size {
            let method_idx = cursor.read_u32::<LittleEndian>()?;
            let annotations_off = cursor.read_u32::<LittleEndian>()?;
            let annotations = self.read_annotation_set(annotations_off)?;
            directory.methods.insert(method_idx, annotations);
        }
        for _ in 0..parameters_size {
            let method_idx = cursor.read_u32::<LittleEndian>()?;
            let annotations_off = cursor.read_u32::<LittleEndian>()?;
            let annotations = self.read_annotation_set_ref_list(annotations_off)?;
            directory.parameters.insert(method_idx, annotations);
        }

        Ok(directory)
    }

    fn read_annotation_set_ref_list(
        &self,
        offset: u32,
    ) -> Result<Vec<Vec<Annotation>>, DecodeError> {
        if offset == 0 {
            return Ok(vec![]);
        }
        let mut cursor = self.cursor(offset)?;
        let size = cursor.read_u32::<LittleEndian>()?;
        (0..size)
            .map(|_| -> Result<Vec<Annotation>, DecodeError> {
                let annotations_off = cursor.read_u32::<LittleEndian>()?;
                self.read_annotation_set(annotations_off)
            })
            .collect()
    }

    fn read_annotation_set(&self, offset: u32) -> Result<Vec<Annotation>, DecodeError> {
        if offset == 0 {
            return Ok(vec![]);
        }
        let mut cursor = self.cursor(offset)?;
        let size = cursor.read_u32::<LittleEndian>()?;
        (0..size)
            .map(|_| -> Result<Annotation, DecodeError> {
                let annotation_off = cursor.read_u32::<LittleEndian>()?;
                self.read_annotation_item(annotation_off)
            })
            .collect()
    }

    fn read_annotation_item(&self, offset: u32) -> Result<Annotation, DecodeError> {
        let mut cursor = self.cursor(offset)?;
        let visibility_code = cursor.read_u8()?;
        let visibility = AnnotationVisibility::from_code(visibility_code).ok_or_else(|| {
            DecodeError::Malformed(format!("unknown annotation visibility {:#x}", visibility_code))
        })?;
        let annotation = self.read_encoded_annotation(&mut cursor)?;
        Ok(Annotation {
            visibility,
            annotation,
        })
    }

    fn read_encoded_annotation(
        &self,
        cursor: &mut Cursor<&'a [u8]>,
    ) -> Result<EncodedAnnotation, DecodeError> {
        let type_idx = read_uleb128(cursor)?;
        let size = read_uleb128(cursor)?;
        let annotation_type = self.type_at(type_idx)?.clone();
        let elements = (0..size)
            .map(|_| -> Result<AnnotationElement, DecodeError> {
                let name_idx = read_uleb128(cursor)?;
                let name = self.string(name_idx)?.clone();
                let value = self.read_encoded_value(cursor)?;
                Ok(AnnotationElement { name, value })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(EncodedAnnotation {
            annotation_type,
            elements,
        })
    }

    fn read_encoded_array(
        &self,
        cursor: &mut Cursor<&'a [u8]>,
    ) -> Result<Vec<EncodedValue>, DecodeError> {
        let size = read_uleb128(cursor)?;
        (0..size).map(|_| self.read_encoded_value(cursor)).collect()
    }

    fn read_encoded_value(
        &self,
        cursor: &mut Cursor<&'a [u8]>,
    ) -> Result<EncodedValue, DecodeError> {
        let header_byte = cursor.read_u8()?;
        let value_type = header_byte & 0x1F;
        let value_arg = header_byte >> 5;
        let malformed = DecodeError::MalformedValue {
            value_type,
            value_arg,
        };
        let size = value_arg as usize + 1;

        // Reads `size` little-endian bytes, at most `max_size` of them
        let mut read_sized = |max_size: usize| -> Result<u64, DecodeError> {
            if size > max_size {
                return Err(DecodeError::MalformedValue {
                    value_type,
                    value_arg,
                });
            }
            let mut value: u64 = 0;
            for i in 0..size {
                value |= (cursor.read_u8()? as u64) << (8 * i);
            }
            Ok(value)
        };
        let sign_extend = |value: u64| -> i64 {
            let shift = 64 - 8 * size as u32;
            ((value << shift) as i64) >> shift
        };

        let value = match value_type {
            value_type::BYTE => EncodedValue::Byte(sign_extend(read_sized(1)?) as i8),
            value_type::SHORT => EncodedValue::Short(sign_extend(read_sized(2)?) as i16),
            value_type::CHAR => EncodedValue::Char(read_sized(2)? as u16),
            value_type::INT => EncodedValue::Int(sign_extend(read_sized(4)?) as i32),
            value_type::LONG => EncodedValue::Long(sign_extend(read_sized(8)?)),

            // Floating point values are zero-extended to the right
            value_type::FLOAT => {
                let bits = read_sized(4)? << (8 * (4 - size));
                EncodedValue::Float(f32::from_bits(bits as u32))
            }
            value_type::DOUBLE => {
                let bits = read_sized(8)? << (8 * (8 - size));
                EncodedValue::Double(f64::from_bits(bits))
            }

            value_type::METHOD_TYPE => {
                EncodedValue::MethodType(self.proto(read_sized(4)? as u32)?.clone())
            }
            value_type::METHOD_HANDLE => {
                EncodedValue::MethodHandle(self.method_handle(read_sized(4)? as u32)?.clone())
            }
            value_type::STRING => EncodedValue::String(self.string(read_sized(4)? as u32)?.clone()),
            value_type::TYPE => EncodedValue::Type(self.type_at(read_sized(4)? as u32)?.clone()),
            value_type::FIELD => EncodedValue::Field(self.field(read_sized(4)? as u32)?.clone()),
            value_type::METHOD => EncodedValue::Method(self.method(read_sized(4)? as u32)?.clone()),
            value_type::ENUM => EncodedValue::Enum(self.field(read_sized(4)? as u32)?.clone()),

            value_type::ARRAY if value_arg == 0 => {
                EncodedValue::Array(self.read_encoded_array(cursor)?)
            }
            value_type::ANNOTATION if value_arg == 0 => {
                EncodedValue::Annotation(self.read_encoded_annotation(cursor)?)
            }
            value_type::NULL if value_arg == 0 => EncodedValue::Null,
            value_type::BOOLEAN if value_arg <= 1 => EncodedValue::Boolean(value_arg == 1),
            _ => return Err(malformed),
        };
        Ok(value)
    }
}

/// Apply a class data index delta
fn next_index(previous: u32, diff: u32) -> Result<u32, DecodeError> {
    previous
        .checked_add(diff)
        .ok_or_else(|| DecodeError::Malformed(String::from("member index overflows in class data")))
}
