use dexstub::dex::DexCodec;
use dexstub::jar::JarConverter;
use dexstub::jvm::Version;
use dexstub::stub::{Error, Pipeline, Settings};

use clap::{value_parser, Arg, ArgAction, Command};
use std::fs;
use std::path::PathBuf;

fn main() -> Result<(), Error> {
    env_logger::init();

    let matches = Command::new("DEX stubber")
        .version(clap::crate_version!())
        .about("Replaces every method body in a DEX file with a minimal stub and writes a JAR")
        .arg(
            Arg::new("INPUT")
                .help("Sets the input DEX file to use")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .index(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("PATH")
                .help("Where to write the JAR (defaults to the input with a .jar extension)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("dex")
                .long("dex")
                .help("Also write the stubbed DEX file next to the input")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("class version")
                .long("class-version")
                .value_name("MAJOR")
                .help("Class file major version of the classes in the JAR")
                .default_value("52")
                .value_parser(value_parser!(u16).range(
                    Version::MINIMUM.major_version as i64..=Version::MAXIMUM.major_version as i64,
                )),
        )
        .get_matches();

    // `INPUT` is required and `class version` has a default, so both are always present
    let mut settings = Settings::new(
        matches
            .get_one::<PathBuf>("INPUT")
            .cloned()
            .unwrap_or_default(),
    );
    settings.output = matches.get_one::<PathBuf>("output").cloned();
    settings.write_dex = matches.get_flag("dex");
    if let Some(major) = matches.get_one::<u16>("class version") {
        settings.class_version = Version::new(*major);
    }

    log::info!("Stubbing '{}'", settings.input.display());
    let input = fs::read(&settings.input)?;
    let pipeline = Pipeline::new(DexCodec, JarConverter::new(settings.class_version));
    let output = pipeline.run(&input)?;

    // Nothing gets written unless every step succeeded
    if settings.write_dex {
        let dex_path = settings.dex_path();
        log::info!("Writing '{}'", dex_path.display());
        fs::write(&dex_path, &output.dex)?;
    }
    let jar_path = settings.jar_path();
    log::info!("Writing '{}'", jar_path.display());
    fs::write(&jar_path, &output.converted)?;

    Ok(())
}
