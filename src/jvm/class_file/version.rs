use crate::jvm::class_file::Serialize;
use byteorder::WriteBytesExt;
use std::fmt::{Display, Error as FmtError, Formatter};
use std::io::Result;

/// Version of the class file, which is used to verify that the JVM has the
/// necessary features to interpret the class
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Version {
    pub minor_version: u16,
    pub major_version: u16,
}

impl Version {
    /// JVM class file version corresponding to Java SE 8 (released March 2014)
    pub const JAVA8: Version = Version::new(52);

    /// Oldest version with annotation and signature attributes (Java 5)
    pub const MINIMUM: Version = Version::new(49);

    /// Newest version accepted for output (Java 21)
    pub const MAXIMUM: Version = Version::new(65);

    pub const fn new(major_version: u16) -> Version {
        Version {
            minor_version: 0,
            major_version,
        }
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::result::Result<(), FmtError> {
        write!(f, "{}.{}", self.major_version, self.minor_version)
    }
}

impl Serialize for Version {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        self.minor_version.serialize(writer)?;
        self.major_version.serialize(writer)?;
        Ok(())
    }
}
