use crate::jar::ConversionError;
use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

const MANIFEST: &str = concat!(
    "Manifest-Version: 1.0\r\n",
    "Created-By: dexstub ",
    env!("CARGO_PKG_VERSION"),
    "\r\n\r\n"
);

/// In-memory JAR contents
///
/// Entries are kept sorted by path so that the same classes always produce the same archive. The
/// manifest always goes first, since `java.util.jar.JarInputStream` only finds it there.
#[derive(Debug, Default)]
pub struct JarBuilder {
    entries: BTreeMap<String, Vec<u8>>,
}

impl JarBuilder {
    pub fn new() -> JarBuilder {
        JarBuilder::default()
    }

    /// Add an entry, returning `false` (and leaving the archive as is) if the path is taken
    pub fn add_entry(&mut self, path: String, data: Vec<u8>) -> bool {
        if path == MANIFEST_PATH || self.entries.contains_key(&path) {
            return false;
        }
        self.entries.insert(path, data);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write out the archive using Deflated compression
    pub fn finish(self) -> Result<Vec<u8>, ConversionError> {
        let mut zip_writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        zip_writer.start_file(MANIFEST_PATH, options)?;
        zip_writer.write_all(MANIFEST.as_bytes())?;
        for (path, data) in &self.entries {
            zip_writer.start_file(path.as_str(), options)?;
            zip_writer.write_all(data)?;
        }

        Ok(zip_writer.finish()?.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn manifest_comes_first() {
        let mut jar = JarBuilder::new();
        assert!(jar.add_entry(String::from("b/B.class"), vec![2]));
        assert!(jar.add_entry(String::from("a/A.class"), vec![1]));
        assert!(!jar.add_entry(String::from("a/A.class"), vec![3]));
        assert!(!jar.add_entry(String::from(MANIFEST_PATH), vec![]));
        assert_eq!(jar.len(), 2);

        let bytes = jar.finish().unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_owned())
            .collect();
        assert_eq!(names, vec![MANIFEST_PATH, "a/A.class", "b/B.class"]);

        let mut manifest = String::new();
        archive
            .by_name(MANIFEST_PATH)
            .unwrap()
            .read_to_string(&mut manifest)
            .unwrap();
        assert!(manifest.starts_with("Manifest-Version: 1.0\r\n"));

        let mut class = vec![];
        archive
            .by_name("a/A.class")
            .unwrap()
            .read_to_end(&mut class)
            .unwrap();
        assert_eq!(class, vec![1]);
    }

    #[test]
    fn output_is_deterministic() {
        let build = || {
            let mut jar = JarBuilder::new();
            jar.add_entry(String::from("Foo.class"), vec![0xCA, 0xFE, 0xBA, 0xBE]);
            jar.finish().unwrap()
        };
        assert_eq!(build(), build());
    }
}
