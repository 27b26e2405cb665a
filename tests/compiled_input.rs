//! Input laid out the way `d8` emits it: bodies that call other methods, load strings and catch
//! exceptions, with debug information attached.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use dexstub::dex::format::{header, item_type, HEADER_SIZE};
use dexstub::dex::{
    decode, DexCodec, Instruction, InstructionError, MethodAccessFlags, Register, TypeDescriptor,
};
use dexstub::jar::JarConverter;
use dexstub::stub::Pipeline;
use dexstub::util::write_uleb128;
use sha1::{Digest, Sha1};
use std::io::{Cursor, Read};
use zip::ZipArchive;

const DEBUG_INFO_ITEM: u16 = 0x2003;

/// Already in code unit order
const STRINGS: [&str; 10] = [
    "<init>",
    "Greeter.java",
    "Hello",
    "LL",
    "Lcom/example/Greeter;",
    "Ljava/lang/Object;",
    "Ljava/lang/String;",
    "V",
    "concat",
    "greet",
];

/// Byte buffer with the few writes a DEX layout needs
struct Image {
    bytes: Vec<u8>,
}

impl Image {
    fn offset(&self) -> u32 {
        self.bytes.len() as u32
    }

    fn align(&mut self) {
        while self.bytes.len() % 4 != 0 {
            self.bytes.push(0);
        }
    }

    fn u16(&mut self, value: u16) {
        self.bytes.write_u16::<LittleEndian>(value).unwrap();
    }

    fn u32(&mut self, value: u32) {
        self.bytes.write_u32::<LittleEndian>(value).unwrap();
    }

    fn uleb(&mut self, value: u32) {
        write_uleb128(&mut self.bytes, value).unwrap();
    }

    fn patch(&mut self, at: usize, value: u32) {
        LittleEndian::write_u32(&mut self.bytes[at..], value);
    }

    fn section(&mut self, field: usize, size: u32, offset: u32) {
        self.patch(field, size);
        self.patch(field + 4, offset);
    }
}

/// ```java
/// public class Greeter {
///     public String greet(String name) {
///         try {
///             return "Hello".concat(name);
///         } catch (Throwable t) {
///             return null;
///         }
///     }
/// }
/// ```
fn greeter() -> Vec<u8> {
    let mut image = Image {
        bytes: vec![0; HEADER_SIZE as usize],
    };
    image.bytes[0..8].copy_from_slice(b"dex\n035\0");

    let string_ids = image.offset();
    for _ in STRINGS {
        image.u32(0);
    }

    let type_ids = image.offset();
    for descriptor in [4, 5, 6, 7] {
        image.u32(descriptor);
    }

    // (Ljava/lang/String;)Ljava/lang/String; then ()V
    let proto_ids = image.offset();
    for (shorty, return_type) in [(3, 2), (7, 3)] {
        image.u32(shorty);
        image.u32(return_type);
        image.u32(0);
    }

    // Greeter.<init>, Greeter.greet, Object.<init>, String.concat
    let method_ids = image.offset();
    for (class, proto, name) in [(0, 1, 0), (0, 0, 9), (1, 1, 0), (2, 0, 8)] {
        image.u16(class);
        image.u16(proto);
        image.u32(name);
    }

    let class_defs = image.offset();
    for value in [0, 0x1, 1, 0, 1, 0, 0, 0] {
        image.u32(value);
    }

    let data = image.offset();

    // invoke-direct {v0}, Ljava/lang/Object;-><init>()V
    // return-void
    let init_code = image.offset();
    for value in [1, 1, 1, 0] {
        image.u16(value);
    }
    let init_debug_field = image.offset() as usize;
    image.u32(0);
    let init_units = [0x1070, 0x0002, 0x0000, 0x000e];
    image.u32(init_units.len() as u32);
    for unit in init_units {
        image.u16(unit);
    }

    //  0: const-string v0, "Hello"
    //  2: invoke-virtual {v0, v2}, Ljava/lang/String;->concat(Ljava/lang/String;)Ljava/lang/String;
    //  5: move-result-object v0
    //  6: return-object v0
    //  7: move-exception v0
    //  8: const/4 v0, 0
    //  9: return-object v0
    image.align();
    let greet_code = image.offset();
    for value in [3, 2, 2, 1] {
        image.u16(value);
    }
    let greet_debug_field = image.offset() as usize;
    image.u32(0);
    let greet_units = [
        0x001a, 0x0002, 0x206e, 0x0003, 0x0020, 0x000c, 0x0011, 0x000d, 0x0012, 0x0011,
    ];
    image.u32(greet_units.len() as u32);
    for unit in greet_units {
        image.u16(unit);
    }
    // try block over addresses 0 to 5, handled by the catch-all at 7
    image.u32(0);
    image.u16(6);
    image.u16(1);
    image.uleb(1);
    image.bytes.push(0);
    image.uleb(7);

    image.align();
    let type_list = image.offset();
    image.u32(1);
    image.u16(2);
    image.patch(proto_ids as usize + 8, type_list);

    let string_data = image.offset();
    for (index, string) in STRINGS.iter().enumerate() {
        let offset = image.offset();
        image.patch(string_ids as usize + 4 * index, offset);
        image.uleb(string.len() as u32);
        image.bytes.extend_from_slice(string.as_bytes());
        image.bytes.push(0);
    }

    // line_start, parameter names (absent), then DBG_END_SEQUENCE
    let init_debug = image.offset();
    image.uleb(3);
    image.uleb(0);
    image.bytes.push(0);
    let greet_debug = image.offset();
    image.uleb(5);
    image.uleb(1);
    image.uleb(0);
    image.bytes.push(0);
    image.patch(init_debug_field, init_debug);
    image.patch(greet_debug_field, greet_debug);

    let class_data = image.offset();
    for size in [0, 0, 1, 1] {
        image.uleb(size);
    }
    image.uleb(0);
    image.uleb(0x1_0001);
    image.uleb(init_code);
    image.uleb(1);
    image.uleb(0x1);
    image.uleb(greet_code);
    image.patch(class_defs as usize + 24, class_data);

    image.align();
    let map = image.offset();
    let entries = [
        (item_type::HEADER_ITEM, 1, 0),
        (item_type::STRING_ID_ITEM, STRINGS.len() as u32, string_ids),
        (item_type::TYPE_ID_ITEM, 4, type_ids),
        (item_type::PROTO_ID_ITEM, 2, proto_ids),
        (item_type::METHOD_ID_ITEM, 4, method_ids),
        (item_type::CLASS_DEF_ITEM, 1, class_defs),
        (item_type::CODE_ITEM, 2, init_code),
        (item_type::TYPE_LIST, 1, type_list),
        (item_type::STRING_DATA_ITEM, STRINGS.len() as u32, string_data),
        (DEBUG_INFO_ITEM, 2, init_debug),
        (item_type::CLASS_DATA_ITEM, 1, class_data),
        (item_type::MAP_LIST, 1, map),
    ];
    image.u32(entries.len() as u32);
    for (entry_type, size, offset) in entries {
        image.u16(entry_type);
        image.u16(0);
        image.u32(size);
        image.u32(offset);
    }

    let file_size = image.offset();
    image.patch(header::FILE_SIZE, file_size);
    image.patch(header::FILE_SIZE + 4, HEADER_SIZE);
    image.patch(header::ENDIAN_TAG, 0x1234_5678);
    image.patch(header::MAP_OFF, map);
    image.section(header::STRING_IDS, STRINGS.len() as u32, string_ids);
    image.section(header::TYPE_IDS, 4, type_ids);
    image.section(header::PROTO_IDS, 2, proto_ids);
    image.section(header::METHOD_IDS, 4, method_ids);
    image.section(header::CLASS_DEFS, 1, class_defs);
    image.section(header::CLASS_DEFS + 8, file_size - data, data);

    let signature = Sha1::digest(&image.bytes[header::FILE_SIZE..]);
    image.bytes[header::SIGNATURE..header::FILE_SIZE].copy_from_slice(&signature);
    let checksum = adler::adler32_slice(&image.bytes[header::SIGNATURE..]);
    image.patch(header::CHECKSUM, checksum);
    image.bytes
}

fn ty(descriptor: &str) -> TypeDescriptor {
    TypeDescriptor::from(descriptor)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

#[test]
fn compiled_bodies_are_read() {
    let file = decode(&greeter()).unwrap();
    let class = file.class("Lcom/example/Greeter;").unwrap();
    assert_eq!(class.superclass, Some(ty("Ljava/lang/Object;")));
    assert_eq!(class.source_file.as_deref(), Some("Greeter.java"));
    assert_eq!(class.methods.len(), 2);

    let init = class.method("<init>").unwrap();
    assert!(init.access_flags.contains(MethodAccessFlags::CONSTRUCTOR));
    let body = init.implementation.as_ref().unwrap();
    assert_eq!(body.outs_size, 1);
    assert_eq!(body.insns, vec![0x1070, 0x0002, 0x0000, 0x000e]);

    let greet = class.method("greet").unwrap();
    assert_eq!(greet.prototype.parameters, vec![ty("Ljava/lang/String;")]);
    let body = greet.implementation.as_ref().unwrap();
    assert_eq!(body.registers_size, 3);
    assert_eq!(body.ins_size, 2);
    assert_eq!(body.outs_size, 2);
    assert_eq!(body.tries_size, 1);
    assert_eq!(body.insns.len(), 10);
    assert_eq!(
        body.instructions(),
        Err(InstructionError::UnsupportedOpcode {
            opcode: 0x1a,
            offset: 0
        })
    );
}

#[test]
fn compiled_bodies_are_stubbed_and_converted() {
    let pipeline = Pipeline::new(DexCodec, JarConverter::default());
    let output = pipeline.run(&greeter()).unwrap();

    let stubbed = decode(&output.dex).unwrap();
    let class = stubbed.class("Lcom/example/Greeter;").unwrap();

    let init = class.method("<init>").unwrap();
    let body = init.implementation.as_ref().unwrap();
    assert_eq!(body.registers_size, 1);
    assert_eq!(body.ins_size, 1);
    assert_eq!(body.outs_size, 0);
    assert_eq!(body.instructions().unwrap(), vec![Instruction::ReturnVoid]);

    // `this` and `name` stay in v1 and v2
    let greet = class.method("greet").unwrap();
    let body = greet.implementation.as_ref().unwrap();
    assert_eq!(body.registers_size, 3);
    assert_eq!(body.ins_size, 2);
    assert_eq!(body.tries_size, 0);
    assert_eq!(body.registers_size - body.ins_size, 1);
    assert_eq!(
        body.instructions().unwrap(),
        vec![
            Instruction::Const4(Register(0), 0),
            Instruction::ReturnObject(Register(0)),
        ]
    );

    // Only the original bodies referred to these
    assert!(!contains(&output.dex, b"Hello"));
    assert!(!contains(&output.dex, b"concat"));
    assert!(contains(&output.dex, b"Greeter.java"));

    let mut archive = ZipArchive::new(Cursor::new(output.converted)).unwrap();
    let mut class_file = vec![];
    archive
        .by_name("com/example/Greeter.class")
        .unwrap()
        .read_to_end(&mut class_file)
        .unwrap();
    assert_eq!(&class_file[0..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
}

#[test]
fn corrupted_input_is_rejected() {
    let mut bytes = greeter();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    let pipeline = Pipeline::new(DexCodec, JarConverter::default());
    assert!(pipeline.run(&bytes).is_err());
}
