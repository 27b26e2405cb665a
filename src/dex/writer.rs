use crate::dex::format::{
    header, item_type, value_type, ENDIAN_CONSTANT, HEADER_SIZE, MAGIC_PREFIX, NO_INDEX,
};
use crate::dex::index_pool::{IndexCollector, IndexPool};
use crate::dex::{
    Annotation, ClassDef, DexFile, DexVersion, EncodeError, EncodedAnnotation, EncodedValue, Field,
    Method, MethodHandleMember, RenderDescriptor, TypeDescriptor,
};
use crate::util::{encode_modified_utf8, utf16_len, write_uleb128};
use byteorder::{LittleEndian, WriteBytesExt};
use sha1::{Digest, Sha1};
use std::collections::HashMap;

/// Encode the in-memory model into a complete DEX file
pub fn encode(file: &DexFile) -> Result<Vec<u8>, EncodeError> {
    DexWriter::new(file)?.write()
}

/// Entry of the map list
struct MapItem {
    item_type: u16,
    size: u32,
    offset: u32,
}

/// Data section being built up, along with the absolute offset it will start at
struct DataSection {
    base: u32,
    bytes: Vec<u8>,
}

impl DataSection {
    fn offset(&self) -> u32 {
        self.base + self.bytes.len() as u32
    }

    /// Pad with zeroes (`base` is itself 4-byte aligned)
    fn align(&mut self, alignment: usize) {
        while self.bytes.len() % alignment != 0 {
            self.bytes.push(0);
        }
    }
}

/// Tracks where a run of items of the same type starts and how many there are
struct SectionTracker {
    item_type: u16,
    size: u32,
    offset: u32,
}

impl SectionTracker {
    fn new(item_type: u16) -> SectionTracker {
        SectionTracker {
            item_type,
            size: 0,
            offset: 0,
        }
    }

    fn record(&mut self, offset: u32) {
        if self.size == 0 {
            self.offset = offset;
        }
        self.size += 1;
    }

    fn finish(self, map: &mut Vec<MapItem>) {
        if self.size > 0 {
            map.push(MapItem {
                item_type: self.item_type,
                size: self.size,
                offset: self.offset,
            });
        }
    }
}

/// Owner of an annotation set
#[derive(Copy, Clone, Hash, Eq, PartialEq)]
enum SetOwner {
    Class(usize),
    Field(usize, u32),
    Method(usize, u32),
    Parameter(usize, u32, usize),
}

/// Members of one class, split and sorted the way class data lists them
struct ClassMembers<'m> {
    static_fields: Vec<(u32, &'m Field)>,
    instance_fields: Vec<(u32, &'m Field)>,
    direct_methods: Vec<(u32, &'m Method)>,
    virtual_methods: Vec<(u32, &'m Method)>,
}

impl<'m> ClassMembers<'m> {
    fn new(class: &'m ClassDef, pool: &IndexPool) -> ClassMembers<'m> {
        let mut members = ClassMembers {
            static_fields: vec![],
            instance_fields: vec![],
            direct_methods: vec![],
            virtual_methods: vec![],
        };
        for field in &class.fields {
            let entry = (pool.field(&field.reference()), field);
            if field.is_static() {
                members.static_fields.push(entry);
            } else {
                members.instance_fields.push(entry);
            }
        }
        for method in &class.methods {
            let entry = (pool.method(&method.reference()), method);
            if method.access_flags.is_direct() {
                members.direct_methods.push(entry);
            } else {
                members.virtual_methods.push(entry);
            }
        }
        members.static_fields.sort_by_key(|(idx, _)| *idx);
        members.instance_fields.sort_by_key(|(idx, _)| *idx);
        members.direct_methods.sort_by_key(|(idx, _)| *idx);
        members.virtual_methods.sort_by_key(|(idx, _)| *idx);
        members
    }

    fn is_empty(&self) -> bool {
        self.static_fields.is_empty()
            && self.instance_fields.is_empty()
            && self.direct_methods.is_empty()
            && self.virtual_methods.is_empty()
    }

    fn fields(&self) -> impl Iterator<Item = &(u32, &'m Field)> {
        self.static_fields.iter().chain(self.instance_fields.iter())
    }

    fn methods(&self) -> impl Iterator<Item = &(u32, &'m Method)> {
        self.direct_methods.iter().chain(self.virtual_methods.iter())
    }

    /// Static values up to the last explicit one, filling gaps with defaults
    fn static_values(&self) -> Vec<EncodedValue> {
        let last_explicit = self
            .static_fields
            .iter()
            .rposition(|(_, field)| field.initial_value.is_some());
        match last_explicit {
            None => vec![],
            Some(last) => self.static_fields[..=last]
                .iter()
                .map(|(_, field)| {
                    field
                        .initial_value
                        .clone()
                        .unwrap_or_else(|| EncodedValue::default_for(&field.field_type))
                })
                .collect(),
        }
    }
}

/// Lays out and writes a DEX file
///
/// Id tables come right after the header, followed by a single data section holding (in order)
/// type lists, static value arrays, annotations, code, class data, string data, and the map list.
pub struct DexWriter<'m> {
    file: &'m DexFile,
    pool: IndexPool,

    /// Indices into `file.classes`, superclasses and interfaces first
    class_order: Vec<usize>,

    members: Vec<ClassMembers<'m>>,
}

impl<'m> DexWriter<'m> {
    pub fn new(file: &'m DexFile) -> Result<DexWriter<'m>, EncodeError> {
        let mut collector = IndexCollector::new();
        for class in &file.classes {
            collector.add_class(class)?;
        }
        let pool = collector.finish()?;
        let class_order = order_classes(&file.classes)?;
        let members = file
            .classes
            .iter()
            .map(|class| ClassMembers::new(class, &pool))
            .collect();
        Ok(DexWriter {
            file,
            pool,
            class_order,
            members,
        })
    }

    /// Version to stamp in the magic: method handles and method types need at least 038
    fn version(&self) -> DexVersion {
        if !self.pool.method_handles.is_empty() || self.pool.uses_method_types {
            self.file.version.max(DexVersion::V038)
        } else {
            self.file.version
        }
    }

    pub fn write(&self) -> Result<Vec<u8>, EncodeError> {
        let pool = &self.pool;
        let classes = &self.file.classes;

        let string_ids_off = HEADER_SIZE;
        let type_ids_off = string_ids_off + 4 * pool.strings.len() as u32;
        let proto_ids_off = type_ids_off + 4 * pool.types.len() as u32;
        let field_ids_off = proto_ids_off + 12 * pool.protos.len() as u32;
        let method_ids_off = field_ids_off + 8 * pool.fields.len() as u32;
        let class_defs_off = method_ids_off + 8 * pool.methods.len() as u32;
        let method_handles_off = class_defs_off + 32 * classes.len() as u32;
        let data_off = method_handles_off + 8 * pool.method_handles.len() as u32;

        let mut data = DataSection {
            base: data_off,
            bytes: vec![],
        };
        let mut data_map: Vec<MapItem> = vec![];

        let type_lists = self.write_type_lists(&mut data, &mut data_map)?;
        let static_values = self.write_static_values(&mut data, &mut data_map)?;
        let annotation_directories = self.write_annotations(&mut data, &mut data_map)?;
        let code_items = self.write_code_items(&mut data, &mut data_map)?;
        let class_data = self.write_class_data(&mut data, &mut data_map, &code_items)?;
        let string_data = self.write_string_data(&mut data, &mut data_map)?;

        data.align(4);
        let map_off = data.offset();
        let mut map = vec![MapItem {
            item_type: item_type::HEADER_ITEM,
            size: 1,
            offset: 0,
        }];
        let id_sections = [
            (item_type::STRING_ID_ITEM, pool.strings.len(), string_ids_off),
            (item_type::TYPE_ID_ITEM, pool.types.len(), type_ids_off),
            (item_type::PROTO_ID_ITEM, pool.protos.len(), proto_ids_off),
            (item_type::FIELD_ID_ITEM, pool.fields.len(), field_ids_off),
            (item_type::METHOD_ID_ITEM, pool.methods.len(), method_ids_off),
            (item_type::CLASS_DEF_ITEM, classes.len(), class_defs_off),
            (
                item_type::METHOD_HANDLE_ITEM,
                pool.method_handles.len(),
                method_handles_off,
            ),
        ];
        for (kind, size, offset) in id_sections {
            if size > 0 {
                map.push(MapItem {
                    item_type: kind,
                    size: size as u32,
                    offset,
                });
            }
        }
        map.extend(data_map);
        map.push(MapItem {
            item_type: item_type::MAP_LIST,
            size: 1,
            offset: map_off,
        });
        data.bytes.write_u32::<LittleEndian>(map.len() as u32)?;
        for item in &map {
            data.bytes.write_u16::<LittleEndian>(item.item_type)?;
            data.bytes.write_u16::<LittleEndian>(0)?;
            data.bytes.write_u32::<LittleEndian>(item.size)?;
            data.bytes.write_u32::<LittleEndian>(item.offset)?;
        }

        let file_size = data.offset();
        let mut out: Vec<u8> = Vec::with_capacity(file_size as usize);

        // Header, with checksum and signature filled in at the end
        out.extend_from_slice(&MAGIC_PREFIX);
        out.extend_from_slice(format!("{}", self.version()).as_bytes());
        out.push(0);
        out.extend_from_slice(&[0; 4 + 20]);
        out.write_u32::<LittleEndian>(file_size)?;
        out.write_u32::<LittleEndian>(HEADER_SIZE)?;
        out.write_u32::<LittleEndian>(ENDIAN_CONSTANT)?;
        out.write_u32::<LittleEndian>(0)?; // link_size
        out.write_u32::<LittleEndian>(0)?; // link_off
        out.write_u32::<LittleEndian>(map_off)?;
        for (_, size, offset) in &id_sections[..6] {
            out.write_u32::<LittleEndian>(*size as u32)?;
            out.write_u32::<LittleEndian>(if *size > 0 { *offset } else { 0 })?;
        }
        out.write_u32::<LittleEndian>(file_size - data_off)?;
        out.write_u32::<LittleEndian>(data_off)?;
        debug_assert_eq!(out.len(), HEADER_SIZE as usize);

        for string_data_off in &string_data {
            out.write_u32::<LittleEndian>(*string_data_off)?;
        }
        for descriptor in &pool.types {
            out.write_u32::<LittleEndian>(pool.string(descriptor.as_str()))?;
        }
        for proto in &pool.protos {
            let shorty = proto
                .shorty()
                .ok_or_else(|| EncodeError::MalformedDescriptor(proto.render()))?;
            out.write_u32::<LittleEndian>(pool.string(&shorty))?;
            out.write_u32::<LittleEndian>(pool.type_idx(&proto.return_type))?;
            out.write_u32::<LittleEndian>(self.type_list_offset(&type_lists, &proto.parameters))?;
        }
        for field in &pool.fields {
            out.write_u16::<LittleEndian>(pool.type_idx(&field.class) as u16)?;
            out.write_u16::<LittleEndian>(pool.type_idx(&field.field_type) as u16)?;
            out.write_u32::<LittleEndian>(pool.string(&field.name))?;
        }
        for method in &pool.methods {
            out.write_u16::<LittleEndian>(pool.type_idx(&method.class) as u16)?;
            out.write_u16::<LittleEndian>(pool.proto(&method.prototype) as u16)?;
            out.write_u32::<LittleEndian>(pool.string(&method.name))?;
        }
        for &class_idx in &self.class_order {
            let class = &classes[class_idx];
            out.write_u32::<LittleEndian>(pool.type_idx(&class.class))?;
            out.write_u32::<LittleEndian>(class.access_flags.bits())?;
            out.write_u32::<LittleEndian>(match &class.superclass {
                Some(superclass) => pool.type_idx(superclass),
                None => NO_INDEX,
            })?;
            out.write_u32::<LittleEndian>(self.type_list_offset(&type_lists, &class.interfaces))?;
            out.write_u32::<LittleEndian>(match &class.source_file {
                Some(source_file) => pool.string(source_file),
                None => NO_INDEX,
            })?;
            out.write_u32::<LittleEndian>(annotation_directories[class_idx])?;
            out.write_u32::<LittleEndian>(class_data[class_idx])?;
            out.write_u32::<LittleEndian>(static_values[class_idx])?;
        }
        for handle in &pool.method_handles {
            let member_idx = match &handle.member {
                MethodHandleMember::Field(field) => pool.field(field),
                MethodHandleMember::Method(method) => pool.method(method),
            };
            out.write_u16::<LittleEndian>(handle.kind.code())?;
            out.write_u16::<LittleEndian>(0)?;
            out.write_u16::<LittleEndian>(member_idx as u16)?;
            out.write_u16::<LittleEndian>(0)?;
        }
        debug_assert_eq!(out.len(), data_off as usize);
        out.extend_from_slice(&data.bytes);

        let signature = Sha1::digest(&out[header::FILE_SIZE..]);
        out[header::SIGNATURE..header::FILE_SIZE].copy_from_slice(&signature);
        let checksum = adler::adler32_slice(&out[header::SIGNATURE..]);
        out[header::CHECKSUM..header::SIGNATURE].copy_from_slice(&checksum.to_le_bytes());

        log::debug!(
            "Encoded {} classes into {} bytes (version {})",
            classes.len(),
            out.len(),
            self.version()
        );
        Ok(out)
    }

    fn type_list_key(&self, types: &[TypeDescriptor]) -> Vec<u32> {
        types.iter().map(|ty| self.pool.type_idx(ty)).collect()
    }

    fn type_list_offset(&self, offsets: &HashMap<Vec<u32>, u32>, types: &[TypeDescriptor]) -> u32 {
        if types.is_empty() {
            0
        } else {
            offsets[&self.type_list_key(types)]
        }
    }

    /// Write each distinct non-empty type list once
    fn write_type_lists(
        &self,
        data: &mut DataSection,
        map: &mut Vec<MapItem>,
    ) -> Result<HashMap<Vec<u32>, u32>, EncodeError> {
        let mut offsets: HashMap<Vec<u32>, u32> = HashMap::new();
        let mut tracker = SectionTracker::new(item_type::TYPE_LIST);
        let lists = self
            .pool
            .protos
            .iter()
            .map(|proto| &proto.parameters)
            .chain(self.file.classes.iter().map(|class| &class.interfaces));
        for list in lists {
            let key = self.type_list_key(list);
            if key.is_empty() || offsets.contains_key(&key) {
                continue;
            }
            data.align(4);
            let offset = data.offset();
            tracker.record(offset);
            data.bytes.write_u32::<LittleEndian>(key.len() as u32)?;
            for type_idx in &key {
                data.bytes.write_u16::<LittleEndian>(*type_idx as u16)?;
            }
            offsets.insert(key, offset);
        }
        tracker.finish(map);
        Ok(offsets)
    }

    /// Offsets of static value arrays, by class (0 if there is none)
    fn write_static_values(
        &self,
        data: &mut DataSection,
        map: &mut Vec<MapItem>,
    ) -> Result<Vec<u32>, EncodeError> {
        let mut tracker = SectionTracker::new(item_type::ENCODED_ARRAY_ITEM);
        let mut offsets = vec![0; self.members.len()];
        for (class_idx, members) in self.members.iter().enumerate() {
            let values = members.static_values();
            if values.is_empty() {
                continue;
            }
            let offset = data.offset();
            tracker.record(offset);
            write_encoded_array(&mut data.bytes, &self.pool, &values)?;
            offsets[class_idx] = offset;
        }
        tracker.finish(map);
        Ok(offsets)
    }

    /// Write annotation items, sets, set ref lists and directories
    ///
    /// Returns the offsets of the annotation directories, by class (0 if there is none).
    fn write_annotations(
        &self,
        data: &mut DataSection,
        map: &mut Vec<MapItem>,
    ) -> Result<Vec<u32>, EncodeError> {
        let pool = &self.pool;

        let mut sets: Vec<(SetOwner, &[Annotation])> = vec![];
        let classes = self.file.classes.iter().zip(&self.members);
        for (class_idx, (class, members)) in classes.enumerate() {
            if !class.annotations.is_empty() {
                sets.push((SetOwner::Class(class_idx), class.annotations.as_slice()));
            }
            for (field_idx, field) in members.fields() {
                if !field.annotations.is_empty() {
                    let owner = SetOwner::Field(class_idx, *field_idx);
                    sets.push((owner, field.annotations.as_slice()));
                }
            }
            for (method_idx, method) in members.methods() {
                if !method.annotations.is_empty() {
                    let owner = SetOwner::Method(class_idx, *method_idx);
                    sets.push((owner, method.annotations.as_slice()));
                }
            }
            for (method_idx, method) in members.methods() {
                for (param_idx, annotations) in method.parameter_annotations.iter().enumerate() {
                    if !annotations.is_empty() {
                        let owner = SetOwner::Parameter(class_idx, *method_idx, param_idx);
                        sets.push((owner, annotations.as_slice()));
                    }
                }
            }
        }

        // Items, with each set's entries sorted by annotation type
        let mut items = SectionTracker::new(item_type::ANNOTATION_ITEM);
        let mut set_entries: Vec<Vec<u32>> = Vec::with_capacity(sets.len());
        for (_, annotations) in &sets {
            let mut sorted: Vec<&Annotation> = annotations.iter().collect();
            sorted.sort_by_key(|annotation| pool.type_idx(&annotation.annotation.annotation_type));
            let mut entries = vec![];
            for annotation in sorted {
                let offset = data.offset();
                items.record(offset);
                data.bytes.push(annotation.visibility.code());
                write_encoded_annotation(&mut data.bytes, pool, &annotation.annotation)?;
                entries.push(offset);
            }
            set_entries.push(entries);
        }
        items.finish(map);

        let mut set_tracker = SectionTracker::new(item_type::ANNOTATION_SET_ITEM);
        let mut set_offsets: HashMap<SetOwner, u32> = HashMap::new();
        for ((owner, _), entries) in sets.iter().zip(&set_entries) {
            data.align(4);
            let offset = data.offset();
            set_tracker.record(offset);
            data.bytes.write_u32::<LittleEndian>(entries.len() as u32)?;
            for entry in entries {
                data.bytes.write_u32::<LittleEndian>(*entry)?;
            }
            set_offsets.insert(*owner, offset);
        }
        set_tracker.finish(map);

        let mut ref_lists = SectionTracker::new(item_type::ANNOTATION_SET_REF_LIST);
        let mut ref_list_offsets: HashMap<(usize, u32), u32> = HashMap::new();
        for (class_idx, members) in self.members.iter().enumerate() {
            for (method_idx, method) in members.methods() {
                if method.parameter_annotations.is_empty() {
                    continue;
                }
                data.align(4);
                let offset = data.offset();
                ref_lists.record(offset);
                data.bytes
                    .write_u32::<LittleEndian>(method.parameter_annotations.len() as u32)?;
                for param_idx in 0..method.parameter_annotations.len() {
                    let owner = SetOwner::Parameter(class_idx, *method_idx, param_idx);
                    let set_offset = set_offsets.get(&owner).copied().unwrap_or(0);
                    data.bytes.write_u32::<LittleEndian>(set_offset)?;
                }
                ref_list_offsets.insert((class_idx, *method_idx), offset);
            }
        }
        ref_lists.finish(map);

        let mut directories = SectionTracker::new(item_type::ANNOTATIONS_DIRECTORY_ITEM);
        let mut directory_offsets = vec![0; self.members.len()];
        for (class_idx, members) in self.members.iter().enumerate() {
            let class_set = set_offsets.get(&SetOwner::Class(class_idx)).copied();
            let mut field_sets: Vec<(u32, u32)> = members
                .fields()
                .filter_map(|(field_idx, _)| {
                    let set = set_offsets.get(&SetOwner::Field(class_idx, *field_idx))?;
                    Some((*field_idx, *set))
                })
                .collect();
            let mut method_sets: Vec<(u32, u32)> = members
                .methods()
                .filter_map(|(method_idx, _)| {
                    let set = set_offsets.get(&SetOwner::Method(class_idx, *method_idx))?;
                    Some((*method_idx, *set))
                })
                .collect();
            let mut parameter_lists: Vec<(u32, u32)> = members
                .methods()
                .filter_map(|(method_idx, _)| {
                    let list = ref_list_offsets.get(&(class_idx, *method_idx))?;
                    Some((*method_idx, *list))
                })
                .collect();
            if class_set.is_none()
                && field_sets.is_empty()
                && method_sets.is_empty()
                && parameter_lists.is_empty()
            {
                continue;
            }

            // Static and instance members interleave in index order
            field_sets.sort_unstable();
            method_sets.sort_unstable();
            parameter_lists.sort_unstable();

            data.align(4);
            let offset = data.offset();
            directories.record(offset);
            data.bytes
                .write_u32::<LittleEndian>(class_set.unwrap_or(0))?;
            data.bytes.write_u32::<LittleEndian>(field_sets.len() as u32)?;
            data.bytes.write_u32::<LittleEndian>(method_sets.len() as u32)?;
            data.bytes
                .write_u32::<LittleEndian>(parameter_lists.len() as u32)?;
            for (member_idx, item_offset) in field_sets
                .iter()
                .chain(method_sets.iter())
                .chain(parameter_lists.iter())
            {
                data.bytes.write_u32::<LittleEndian>(*member_idx)?;
                data.bytes.write_u32::<LittleEndian>(*item_offset)?;
            }
            directory_offsets[class_idx] = offset;
        }
        directories.finish(map);

        Ok(directory_offsets)
    }

    /// Offsets of code items, by method index
    fn write_code_items(
        &self,
        data: &mut DataSection,
        map: &mut Vec<MapItem>,
    ) -> Result<HashMap<u32, u32>, EncodeError> {
        let mut tracker = SectionTracker::new(item_type::CODE_ITEM);
        let mut offsets = HashMap::new();
        for members in &self.members {
            for (method_idx, method) in members.methods() {
                let implementation = match &method.implementation {
                    Some(implementation) => implementation,
                    None => continue,
                };
                if implementation.tries_size > 0 {
                    return Err(EncodeError::TryBlocks {
                        method: method.to_string(),
                    });
                }
                implementation
                    .instructions()
                    .map_err(|reason| EncodeError::UnsupportedBody {
                        method: method.to_string(),
                        reason,
                    })?;

                data.align(4);
                let offset = data.offset();
                tracker.record(offset);
                data.bytes
                    .write_u16::<LittleEndian>(implementation.registers_size)?;
                data.bytes.write_u16::<LittleEndian>(implementation.ins_size)?;
                data.bytes.write_u16::<LittleEndian>(implementation.outs_size)?;
                data.bytes.write_u16::<LittleEndian>(0)?; // tries_size
                data.bytes.write_u32::<LittleEndian>(0)?; // debug_info_off
                data.bytes
                    .write_u32::<LittleEndian>(implementation.insns.len() as u32)?;
                for unit in &implementation.insns {
                    data.bytes.write_u16::<LittleEndian>(*unit)?;
                }
                offsets.insert(*method_idx, offset);
            }
        }
        tracker.finish(map);
        Ok(offsets)
    }

    /// Offsets of class data items, by class (0 if the class has no members)
    fn write_class_data(
        &self,
        data: &mut DataSection,
        map: &mut Vec<MapItem>,
        code_items: &HashMap<u32, u32>,
    ) -> Result<Vec<u32>, EncodeError> {
        let mut tracker = SectionTracker::new(item_type::CLASS_DATA_ITEM);
        let mut offsets = vec![0; self.members.len()];
        for (class_idx, members) in self.members.iter().enumerate() {
            if members.is_empty() {
                continue;
            }
            let offset = data.offset();
            tracker.record(offset);
            let out = &mut data.bytes;
            write_uleb128(out, members.static_fields.len() as u32)?;
            write_uleb128(out, members.instance_fields.len() as u32)?;
            write_uleb128(out, members.direct_methods.len() as u32)?;
            write_uleb128(out, members.virtual_methods.len() as u32)?;

            for fields in [&members.static_fields, &members.instance_fields] {
                let mut previous = 0;
                for (field_idx, field) in fields.iter() {
                    write_uleb128(out, field_idx - previous)?;
                    write_uleb128(out, field.access_flags.bits())?;
                    previous = *field_idx;
                }
            }
            for methods in [&members.direct_methods, &members.virtual_methods] {
                let mut previous = 0;
                for (method_idx, method) in methods.iter() {
                    write_uleb128(out, method_idx - previous)?;
                    write_uleb128(out, method.access_flags.bits())?;
                    write_uleb128(out, code_items.get(method_idx).copied().unwrap_or(0))?;
                    previous = *method_idx;
                }
            }
            offsets[class_idx] = offset;
        }
        tracker.finish(map);
        Ok(offsets)
    }

    /// Offsets of string data items, in string index order
    fn write_string_data(
        &self,
        data: &mut DataSection,
        map: &mut Vec<MapItem>,
    ) -> Result<Vec<u32>, EncodeError> {
        let mut tracker = SectionTracker::new(item_type::STRING_DATA_ITEM);
        let mut offsets = Vec::with_capacity(self.pool.strings.len());
        for string in &self.pool.strings {
            let offset = data.offset();
            tracker.record(offset);
            write_uleb128(&mut data.bytes, utf16_len(string) as u32)?;
            data.bytes.extend_from_slice(&encode_modified_utf8(string));
            data.bytes.push(0);
            offsets.push(offset);
        }
        tracker.finish(map);
        Ok(offsets)
    }
}

/// Order classes so that superclasses and interfaces defined in the same file come first
fn order_classes(classes: &[ClassDef]) -> Result<Vec<usize>, EncodeError> {
    #[derive(Copy, Clone, Eq, PartialEq)]
    enum Visit {
        New,
        InProgress,
        Done,
    }

    fn visit(
        class_idx: usize,
        classes: &[ClassDef],
        by_type: &HashMap<&TypeDescriptor, usize>,
        state: &mut [Visit],
        order: &mut Vec<usize>,
    ) -> Result<(), EncodeError> {
        match state[class_idx] {
            Visit::Done => return Ok(()),
            Visit::InProgress => {
                return Err(EncodeError::CyclicHierarchy(
                    classes[class_idx].class.to_string(),
                ))
            }
            Visit::New => (),
        }
        state[class_idx] = Visit::InProgress;
        let class = &classes[class_idx];
        for parent in class.superclass.iter().chain(class.interfaces.iter()) {
            if let Some(&parent_idx) = by_type.get(parent) {
                visit(parent_idx, classes, by_type, state, order)?;
            }
        }
        state[class_idx] = Visit::Done;
        order.push(class_idx);
        Ok(())
    }

    let by_type: HashMap<&TypeDescriptor, usize> = classes
        .iter()
        .enumerate()
        .map(|(idx, class)| (&class.class, idx))
        .collect();
    let mut state = vec![Visit::New; classes.len()];
    let mut order = Vec::with_capacity(classes.len());
    for class_idx in 0..classes.len() {
        visit(class_idx, classes, &by_type, &mut state, &mut order)?;
    }
    Ok(order)
}

fn write_encoded_array(
    out: &mut Vec<u8>,
    pool: &IndexPool,
    values: &[EncodedValue],
) -> Result<(), EncodeError> {
    write_uleb128(out, values.len() as u32)?;
    for value in values {
        write_encoded_value(out, pool, value)?;
    }
    Ok(())
}

fn write_encoded_annotation(
    out: &mut Vec<u8>,
    pool: &IndexPool,
    annotation: &EncodedAnnotation,
) -> Result<(), EncodeError> {
    write_uleb128(out, pool.type_idx(&annotation.annotation_type))?;
    write_uleb128(out, annotation.elements.len() as u32)?;
    let mut elements: Vec<_> = annotation
        .elements
        .iter()
        .map(|element| (pool.string(&element.name), &element.value))
        .collect();
    elements.sort_by_key(|(name_idx, _)| *name_idx);
    for (name_idx, value) in elements {
        write_uleb128(out, name_idx)?;
        write_encoded_value(out, pool, value)?;
    }
    Ok(())
}

fn write_encoded_value(
    out: &mut Vec<u8>,
    pool: &IndexPool,
    value: &EncodedValue,
) -> Result<(), EncodeError> {
    match value {
        EncodedValue::Byte(byte) => write_sized(out, value_type::BYTE, &[*byte as u8]),
        EncodedValue::Short(short) => {
            write_sized(out, value_type::SHORT, &signed_bytes(*short as i64))
        }
        EncodedValue::Char(code_unit) => {
            write_sized(out, value_type::CHAR, &unsigned_bytes(*code_unit as u64))
        }
        EncodedValue::Int(int) => write_sized(out, value_type::INT, &signed_bytes(*int as i64)),
        EncodedValue::Long(long) => write_sized(out, value_type::LONG, &signed_bytes(*long)),
        EncodedValue::Float(float) => write_sized(
            out,
            value_type::FLOAT,
            &right_zero_extended_bytes(float.to_bits() as u64, 4),
        ),
        EncodedValue::Double(double) => write_sized(
            out,
            value_type::DOUBLE,
            &right_zero_extended_bytes(double.to_bits(), 8),
        ),
        EncodedValue::MethodType(proto) => {
            write_index(out, value_type::METHOD_TYPE, pool.proto(proto))
        }
        EncodedValue::MethodHandle(handle) => {
            write_index(out, value_type::METHOD_HANDLE, pool.method_handle(handle))
        }
        EncodedValue::String(string) => write_index(out, value_type::STRING, pool.string(string)),
        EncodedValue::Type(descriptor) => {
            write_index(out, value_type::TYPE, pool.type_idx(descriptor))
        }
        EncodedValue::Field(field) => write_index(out, value_type::FIELD, pool.field(field)),
        EncodedValue::Method(method) => write_index(out, value_type::METHOD, pool.method(method)),
        EncodedValue::Enum(field) => write_index(out, value_type::ENUM, pool.field(field)),
        EncodedValue::Array(values) => {
            out.push(value_type::ARRAY);
            write_encoded_array(out, pool, values)?;
        }
        EncodedValue::Annotation(annotation) => {
            out.push(value_type::ANNOTATION);
            write_encoded_annotation(out, pool, annotation)?;
        }
        EncodedValue::Null => out.push(value_type::NULL),
        EncodedValue::Boolean(boolean) => out.push((*boolean as u8) << 5 | value_type::BOOLEAN),
    }
    Ok(())
}

/// Header byte holds the value type and the byte count minus one
fn write_sized(out: &mut Vec<u8>, value_type: u8, bytes: &[u8]) {
    out.push(((bytes.len() - 1) as u8) << 5 | value_type);
    out.extend_from_slice(bytes);
}

fn write_index(out: &mut Vec<u8>, value_type: u8, index: u32) {
    write_sized(out, value_type, &unsigned_bytes(index as u64))
}

/// Shortest little-endian encoding that sign-extends back to `value`
fn signed_bytes(value: i64) -> Vec<u8> {
    let mut size = 8;
    while size > 1 {
        let shift = 64 - 8 * (size as u32 - 1);
        if (value << shift) >> shift == value {
            size -= 1;
        } else {
            break;
        }
    }
    value.to_le_bytes()[..size].to_vec()
}

/// Shortest little-endian encoding that zero-extends back to `value`
fn unsigned_bytes(value: u64) -> Vec<u8> {
    let significant_bits = 64 - value.leading_zeros() as usize;
    let size = ((significant_bits + 7) / 8).max(1);
    value.to_le_bytes()[..size].to_vec()
}

/// Drop low-order zero bytes (the reader zero-extends to the right)
fn right_zero_extended_bytes(bits: u64, width: usize) -> Vec<u8> {
    let mut bits = bits;
    let mut size = width;
    while size > 1 && bits & 0xFF == 0 {
        bits >>= 8;
        size -= 1;
    }
    bits.to_le_bytes()[..size].to_vec()
}
