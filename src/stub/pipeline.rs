use crate::dex::{DecodeError, DexFile, EncodeError};
use crate::jar::ConversionError;
use crate::stub::{rewrite_file, Error};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Reading and writing the bytecode container
pub trait ContainerCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DexFile, DecodeError>;

    fn encode(&self, file: &DexFile) -> Result<Vec<u8>, EncodeError>;
}

/// Turning an encoded container into some other archive format
pub trait FormatConverter {
    fn convert(&self, container: &[u8]) -> Result<Vec<u8>, ConversionError>;
}

/// Everything produced by one run
#[derive(Debug)]
pub struct PipelineOutput {
    /// Stubbed container
    pub dex: Vec<u8>,

    /// Stubbed container, converted
    pub converted: Vec<u8>,
}

/// Decode, stub, re-encode, and convert
pub struct Pipeline<C, F> {
    codec: C,
    converter: F,
}

impl<C: ContainerCodec, F: FormatConverter> Pipeline<C, F> {
    pub fn new(codec: C, converter: F) -> Pipeline<C, F> {
        Pipeline { codec, converter }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn converter(&self) -> &F {
        &self.converter
    }

    /// Run every step in memory
    ///
    /// Since nothing is written here, a failure at any step means there is no output at all.
    pub fn run(&self, input: &[u8]) -> Result<PipelineOutput, Error> {
        let file = self.codec.decode(input)?;
        log::info!("Stubbing {} classes", file.classes.len());
        let stubbed = rewrite_file(&file)?;

        let dex = self.codec.encode(&stubbed)?;
        log::info!("Converting stubbed container ({} bytes)", dex.len());
        let converted = self.converter.convert(&dex)?;

        Ok(PipelineOutput { dex, converted })
    }
}

/// Path next to `input`, with the same base name but a new extension
///
/// `classes.dex` with extension `jar` becomes `classes.jar`.
pub fn output_path(input: &Path, extension: &str) -> PathBuf {
    let mut file_name = input
        .file_stem()
        .unwrap_or_else(|| OsStr::new("out"))
        .to_os_string();
    file_name.push(".");
    file_name.push(extension);
    input.with_file_name(file_name)
}
