use dexstub::dex::{
    decode, encode, ClassAccessFlags, ClassDef, DexCodec, DexFile, Instruction, Method,
    MethodAccessFlags, MethodImplementation, Prototype, Register, TypeDescriptor,
};
use dexstub::jar::{JarConverter, MANIFEST_PATH};
use dexstub::jvm::Version;
use dexstub::stub::{rewrite_file, Pipeline};
use std::io::{Cursor, Read};
use zip::ZipArchive;

fn ty(descriptor: &str) -> TypeDescriptor {
    TypeDescriptor::from(descriptor)
}

/// `static int foo() { return 7; }` and `abstract void bar();`
fn sample() -> DexFile {
    let class = ty("Lcom/example/Foo;");
    let foo = Method {
        class: class.clone(),
        name: String::from("foo"),
        prototype: Prototype::new(ty("I"), vec![]),
        access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
        annotations: vec![],
        parameter_annotations: vec![],
        implementation: Some(
            MethodImplementation::from_instructions(
                1,
                0,
                &[
                    Instruction::Const16(Register(0), 7),
                    Instruction::Return(Register(0)),
                ],
            )
            .unwrap(),
        ),
    };
    let bar = Method {
        class: class.clone(),
        name: String::from("bar"),
        prototype: Prototype::new(ty("V"), vec![]),
        access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::ABSTRACT,
        annotations: vec![],
        parameter_annotations: vec![],
        implementation: None,
    };
    DexFile::new(vec![ClassDef {
        class,
        access_flags: ClassAccessFlags::PUBLIC | ClassAccessFlags::ABSTRACT,
        superclass: Some(ty("Ljava/lang/Object;")),
        interfaces: vec![],
        source_file: Some(String::from("Foo.java")),
        annotations: vec![],
        fields: vec![],
        methods: vec![foo, bar],
    }])
}

#[test]
fn stubbed_container_and_jar() {
    let input = encode(&sample()).unwrap();
    let pipeline = Pipeline::new(DexCodec, JarConverter::new(Version::JAVA8));
    let output = pipeline.run(&input).unwrap();

    let stubbed = decode(&output.dex).unwrap();
    let class = stubbed.class("Lcom/example/Foo;").unwrap();

    let foo = class.method("foo").unwrap();
    let body = foo.implementation.as_ref().unwrap();
    assert_eq!(body.registers_size, 1);
    assert_eq!(body.ins_size, 0);
    assert_eq!(
        body.instructions().unwrap(),
        vec![
            Instruction::Const4(Register(0), 0),
            Instruction::Return(Register(0)),
        ]
    );

    let bar = class.method("bar").unwrap();
    assert!(bar.implementation.is_none());
    assert_eq!(
        bar.access_flags,
        MethodAccessFlags::PUBLIC | MethodAccessFlags::ABSTRACT
    );

    let mut archive = ZipArchive::new(Cursor::new(output.converted)).unwrap();
    let mut class_file = vec![];
    archive
        .by_name("com/example/Foo.class")
        .unwrap()
        .read_to_end(&mut class_file)
        .unwrap();
    assert_eq!(&class_file[0..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
    assert!(archive.by_name(MANIFEST_PATH).is_ok());
}

#[test]
fn stubbing_is_a_fixed_point() {
    let input = encode(&sample()).unwrap();
    let pipeline = Pipeline::new(DexCodec, JarConverter::default());
    let once = pipeline.run(&input).unwrap();
    let twice = pipeline.run(&once.dex).unwrap();
    assert_eq!(once.dex, twice.dex);
    assert_eq!(once.converted, twice.converted);

    let stubbed = decode(&once.dex).unwrap();
    assert_eq!(rewrite_file(&stubbed).unwrap(), stubbed);
}

#[test]
fn garbage_input_is_rejected() {
    let pipeline = Pipeline::new(DexCodec, JarConverter::default());
    assert!(pipeline.run(b"definitely not a dex file").is_err());
}
