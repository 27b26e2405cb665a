use crate::dex::decode;
use crate::jar::{translate_class, ConversionError, JarBuilder};
use crate::jvm::Version;
use crate::stub::FormatConverter;

/// Converts a DEX container into a JAR of class files
#[derive(Copy, Clone, Debug)]
pub struct JarConverter {
    /// Class file version of every class in the JAR
    pub version: Version,
}

impl JarConverter {
    pub fn new(version: Version) -> JarConverter {
        JarConverter { version }
    }
}

impl Default for JarConverter {
    fn default() -> JarConverter {
        JarConverter::new(Version::JAVA8)
    }
}

impl FormatConverter for JarConverter {
    fn convert(&self, container: &[u8]) -> Result<Vec<u8>, ConversionError> {
        let file = decode(container)?;
        log::info!(
            "Converting {} classes to class file version {}",
            file.classes.len(),
            self.version
        );

        let mut jar = JarBuilder::new();
        for class in &file.classes {
            let translated = translate_class(class, self.version)?;
            log::debug!("Translated {}", translated.name);
            if !jar.add_entry(translated.entry_name(), translated.bytes) {
                return Err(ConversionError::DuplicateClass(translated.name));
            }
        }
        jar.finish()
    }
}
