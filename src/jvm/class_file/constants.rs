use crate::jvm::class_file::{Attribute, AttributeLike, Serialize};
use crate::jvm::Error;
use crate::util::encode_modified_utf8;
use byteorder::WriteBytesExt;
use std::collections::HashMap;

/// Class file constants pool builder
///
/// The pool is append only. Every `get_*` method returns the index of an existing equal constant
/// if there is one, and only pushes a new constant otherwise.
#[derive(Debug)]
pub struct ConstantsPool {
    constants: Vec<Constant>,

    /// Offset the next constant will get (indexing starts at 1)
    next_offset: u16,

    utf8s: HashMap<String, Utf8ConstantIndex>,
    classes: HashMap<Utf8ConstantIndex, ClassConstantIndex>,
    strings: HashMap<Utf8ConstantIndex, StringConstantIndex>,
    integers: HashMap<i32, ConstantIndex>,
    floats: HashMap<u32, ConstantIndex>,
    longs: HashMap<i64, ConstantIndex>,
    doubles: HashMap<u64, ConstantIndex>,
}

impl Default for ConstantsPool {
    fn default() -> ConstantsPool {
        ConstantsPool::new()
    }
}

impl ConstantsPool {
    /// Make a fresh empty constants pool
    pub fn new() -> ConstantsPool {
        ConstantsPool {
            constants: vec![],
            next_offset: 1,
            utf8s: HashMap::new(),
            classes: HashMap::new(),
            strings: HashMap::new(),
            integers: HashMap::new(),
            floats: HashMap::new(),
            longs: HashMap::new(),
            doubles: HashMap::new(),
        }
    }

    /// Number of entries, counting the unusable slots after `long` and `double` constants
    pub fn len(&self) -> u16 {
        self.next_offset - 1
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    /// Push a constant into the constant pool, provided there is space for it
    ///
    /// Note: the largest valid index is 65535, indexing starts at 1, and some constants take two
    /// spaces.
    fn push_constant(&mut self, constant: Constant) -> Result<ConstantIndex, ConstantPoolOverflow> {
        let offset = self.next_offset;

        // Detect if the next constant would overflow the pool
        match offset.checked_add(constant.width()) {
            None => Err(ConstantPoolOverflow { constant, offset }),
            Some(next_offset) => {
                self.constants.push(constant);
                self.next_offset = next_offset;
                Ok(ConstantIndex(offset))
            }
        }
    }

    /// Get or insert a utf8 constant from the constant pool
    pub fn get_utf8(&mut self, utf8: &str) -> Result<Utf8ConstantIndex, ConstantPoolOverflow> {
        if let Some(idx) = self.utf8s.get(utf8) {
            Ok(*idx)
        } else {
            let constant = Constant::Utf8(utf8.to_owned());
            let idx = Utf8ConstantIndex(self.push_constant(constant)?);
            self.utf8s.insert(utf8.to_owned(), idx);
            Ok(idx)
        }
    }

    /// Get or insert a class constant, given a binary name (eg. `java/lang/Object`) or an array
    /// descriptor
    pub fn get_class(&mut self, name: &str) -> Result<ClassConstantIndex, ConstantPoolOverflow> {
        let utf8 = self.get_utf8(name)?;
        if let Some(idx) = self.classes.get(&utf8) {
            Ok(*idx)
        } else {
            let idx = ClassConstantIndex(self.push_constant(Constant::Class(utf8))?);
            self.classes.insert(utf8, idx);
            Ok(idx)
        }
    }

    /// Get or insert a `java.lang.String` constant
    pub fn get_string(
        &mut self,
        string: &str,
    ) -> Result<StringConstantIndex, ConstantPoolOverflow> {
        let utf8 = self.get_utf8(string)?;
        if let Some(idx) = self.strings.get(&utf8) {
            Ok(*idx)
        } else {
            let idx = StringConstantIndex(self.push_constant(Constant::String(utf8))?);
            self.strings.insert(utf8, idx);
            Ok(idx)
        }
    }

    pub fn get_integer(&mut self, integer: i32) -> Result<ConstantIndex, ConstantPoolOverflow> {
        if let Some(idx) = self.integers.get(&integer) {
            Ok(*idx)
        } else {
            let idx = self.push_constant(Constant::Integer(integer))?;
            self.integers.insert(integer, idx);
            Ok(idx)
        }
    }

    /// Floats are deduplicated by bit pattern (so `0.0` and `-0.0` are distinct)
    pub fn get_float(&mut self, float: f32) -> Result<ConstantIndex, ConstantPoolOverflow> {
        let bits = float.to_bits();
        if let Some(idx) = self.floats.get(&bits) {
            Ok(*idx)
        } else {
            let idx = self.push_constant(Constant::Float(float))?;
            self.floats.insert(bits, idx);
            Ok(idx)
        }
    }

    pub fn get_long(&mut self, long: i64) -> Result<ConstantIndex, ConstantPoolOverflow> {
        if let Some(idx) = self.longs.get(&long) {
            Ok(*idx)
        } else {
            let idx = self.push_constant(Constant::Long(long))?;
            self.longs.insert(long, idx);
            Ok(idx)
        }
    }

    /// Doubles are deduplicated by bit pattern
    pub fn get_double(&mut self, double: f64) -> Result<ConstantIndex, ConstantPoolOverflow> {
        let bits = double.to_bits();
        if let Some(idx) = self.doubles.get(&bits) {
            Ok(*idx)
        } else {
            let idx = self.push_constant(Constant::Double(double))?;
            self.doubles.insert(bits, idx);
            Ok(idx)
        }
    }

    /// Add an attribute to the constant pool
    pub fn get_attribute<A: AttributeLike>(&mut self, attribute: A) -> Result<Attribute, Error> {
        let name_index = self.get_utf8(A::NAME)?;
        let mut info = vec![];

        attribute.serialize(&mut info).map_err(Error::IoError)?;

        Ok(Attribute { name_index, info })
    }
}

/// Count is one more than the last used index
impl Serialize for ConstantsPool {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.next_offset.serialize(writer)?;
        for constant in &self.constants {
            constant.serialize(writer)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct ConstantPoolOverflow {
    pub constant: Constant,
    pub offset: u16,
}

/// Constants as in the constant pool
///
/// Note: only the constants needed for stub classes are included (no member references, method
/// handles, or dynamic constants)
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.4
#[derive(Debug, Clone)]
pub enum Constant {
    /// Class or an interface
    Class(Utf8ConstantIndex),

    /// Constant object of type `java.lang.String`
    String(Utf8ConstantIndex),

    /// Constant primitive of type `int`
    Integer(i32),

    /// Constant primitive of type `float`
    Float(f32),

    /// Constant primitive of type `long`
    Long(i64),

    /// Constant primitive of type `double`
    Double(f64),

    /// Constant UTF-8 encoded raw string value
    ///
    /// Despite the name, the encoding is not quite UTF-8 (the encoding of the
    /// null character `\u{0000}` and the encoding of supplementary characters
    /// is different).
    Utf8(String),
}

impl Constant {
    /// Almost all constants have width 1, except for `Constant::Long` and `Constant::Double`.
    /// Quoting JVMS §4.4.5:
    ///
    /// > All 8-byte constants take up two entries in the constant_pool table of the class file.
    /// > If a CONSTANT_Long_info or CONSTANT_Double_info structure is the item in the
    /// > constant_pool table at index n, then the next usable item in the pool is located at
    /// > index n+2.
    pub fn width(&self) -> u16 {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }
}

impl Serialize for Constant {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            Constant::Utf8(string) => {
                1u8.serialize(writer)?;
                let buffer: Vec<u8> = encode_modified_utf8(string);
                (buffer.len() as u16).serialize(writer)?;
                writer.write_all(&buffer)?;
            }
            Constant::Integer(integer) => {
                3u8.serialize(writer)?;
                integer.serialize(writer)?;
            }
            Constant::Float(float) => {
                4u8.serialize(writer)?;
                float.serialize(writer)?;
            }
            Constant::Long(long) => {
                5u8.serialize(writer)?;
                long.serialize(writer)?;
            }
            Constant::Double(double) => {
                6u8.serialize(writer)?;
                double.serialize(writer)?;
            }
            Constant::Class(name) => {
                7u8.serialize(writer)?;
                name.serialize(writer)?;
            }
            Constant::String(utf8) => {
                8u8.serialize(writer)?;
                utf8.serialize(writer)?;
            }
        };
        Ok(())
    }
}

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct ConstantIndex(pub u16);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct Utf8ConstantIndex(pub ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct StringConstantIndex(pub ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct ClassConstantIndex(pub ConstantIndex);

impl From<Utf8ConstantIndex> for ConstantIndex {
    fn from(index: Utf8ConstantIndex) -> ConstantIndex {
        index.0
    }
}

impl From<StringConstantIndex> for ConstantIndex {
    fn from(index: StringConstantIndex) -> ConstantIndex {
        index.0
    }
}

impl From<ClassConstantIndex> for ConstantIndex {
    fn from(index: ClassConstantIndex) -> ConstantIndex {
        index.0
    }
}

impl Serialize for ConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

impl Serialize for Utf8ConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

impl Serialize for StringConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

impl Serialize for ClassConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jvm::class_file::to_bytes;

    #[test]
    fn constants_are_deduplicated() {
        let mut pool = ConstantsPool::new();
        let object = pool.get_class("java/lang/Object").unwrap();
        assert_eq!(pool.get_class("java/lang/Object").unwrap(), object);
        assert_eq!(
            pool.get_utf8("java/lang/Object").unwrap(),
            Utf8ConstantIndex(ConstantIndex(1))
        );
        assert_eq!(object, ClassConstantIndex(ConstantIndex(2)));
        assert_ne!(pool.get_float(0.0).unwrap(), pool.get_float(-0.0).unwrap());
    }

    #[test]
    fn wide_constants_take_two_slots() {
        let mut pool = ConstantsPool::new();
        assert_eq!(pool.get_long(5).unwrap(), ConstantIndex(1));
        assert_eq!(pool.get_integer(5).unwrap(), ConstantIndex(3));
        assert_eq!(pool.get_double(1.5).unwrap(), ConstantIndex(4));
        assert_eq!(pool.len(), 5);

        // count, then the three constants
        let bytes = to_bytes(&pool).unwrap();
        assert_eq!(&bytes[0..2], &[0, 6]);
        assert_eq!(bytes.len(), 2 + 9 + 5 + 9);
    }

    #[test]
    fn pool_overflows() {
        let mut pool = ConstantsPool::new();
        for i in 0..0xFFFD {
            pool.get_integer(i).unwrap();
        }
        assert!(pool.get_long(1).is_err());
        pool.get_integer(-1).unwrap();
        assert!(pool.get_integer(-2).is_err());
    }
}
