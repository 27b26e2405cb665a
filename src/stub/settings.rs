use crate::jvm::Version;
use crate::stub::output_path;
use std::path::PathBuf;

pub struct Settings {
    /// Container to stub
    pub input: PathBuf,

    /// Where to write the JAR (defaults to the input path with a `jar` extension)
    pub output: Option<PathBuf>,

    /// Also write the stubbed container (as `<name>.stub.dex`)
    pub write_dex: bool,

    /// Class file version of classes in the JAR
    pub class_version: Version,
}

impl Settings {
    pub fn new(input: impl Into<PathBuf>) -> Settings {
        Settings {
            input: input.into(),
            output: None,
            write_dex: false,
            class_version: Version::JAVA8,
        }
    }

    pub fn jar_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| output_path(&self.input, "jar"))
    }

    pub fn dex_path(&self) -> PathBuf {
        output_path(&self.input, "stub.dex")
    }
}
