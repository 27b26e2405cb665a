use crate::dex::{ClassDef, DexFile, Method};
use crate::stub::{build, classify, Error, MAX_ARGUMENT_REGISTERS};

/// Stub every class of a file, in order
///
/// The first method that cannot be stubbed aborts the whole rewrite.
pub fn rewrite_file(file: &DexFile) -> Result<DexFile, Error> {
    let classes = file
        .classes
        .iter()
        .map(rewrite_class)
        .collect::<Result<Vec<ClassDef>, Error>>()?;
    Ok(DexFile {
        version: file.version,
        classes,
    })
}

/// Stub every method of a class, keeping everything else about the class as is
pub fn rewrite_class(class: &ClassDef) -> Result<ClassDef, Error> {
    let methods = class
        .methods
        .iter()
        .map(rewrite_method)
        .collect::<Result<Vec<Method>, Error>>()?;
    log::debug!("Stubbed all methods in {}", class.class);
    Ok(ClassDef {
        methods,
        ..class.clone()
    })
}

/// Replace a method body with a stub
///
/// Abstract and native methods come back unchanged. Otherwise, the method keeps its identity and
/// access flags but loses its annotations.
pub fn rewrite_method(method: &Method) -> Result<Method, Error> {
    if method.is_abstract() || method.is_native() {
        log::trace!("Keeping {}", method);
        return Ok(method.clone());
    }
    log::trace!("Stubbing {}", method);

    let shape = classify(&method.prototype.return_type).map_err(|err| {
        Error::UnsupportedReturnType {
            class: method.class.to_string(),
            method: method.name.clone(),
            descriptor: err.descriptor,
        }
    })?;

    let parameter_registers = method.prototype.parameter_registers();
    let too_many = || Error::TooManyParameters {
        method: method.to_string(),
        registers: parameter_registers,
    };
    if method.ins_size() > MAX_ARGUMENT_REGISTERS {
        return Err(too_many());
    }
    let parameter_registers = u8::try_from(parameter_registers).map_err(|_| too_many())?;
    let implementation = build(shape, method.is_static(), parameter_registers)
        .into_implementation()
        .map_err(|reason| Error::StubEncoding {
            method: method.to_string(),
            reason,
        })?;

    Ok(Method {
        class: method.class.clone(),
        name: method.name.clone(),
        prototype: method.prototype.clone(),
        access_flags: method.access_flags,
        annotations: vec![],
        parameter_annotations: vec![],
        implementation: Some(implementation),
    })
}
