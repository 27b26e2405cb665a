use bitflags::bitflags;

bitflags! {
    /// Access flags on class definitions
    ///
    /// `PRIVATE`, `PROTECTED` and `STATIC` are only meaningful for member classes, but some
    /// compilers leave them on the class definition too.
    ///
    /// [0]: https://source.android.com/docs/core/runtime/dex-format#access-flags
    pub struct ClassAccessFlags: u32 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
    }
}

bitflags! {
    /// Access flags on methods
    ///
    /// [0]: https://source.android.com/docs/core/runtime/dex-format#access-flags
    pub struct MethodAccessFlags: u32 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const BRIDGE = 0x0040;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
        const CONSTRUCTOR = 0x1_0000;
        const DECLARED_SYNCHRONIZED = 0x2_0000;
    }
}

bitflags! {
    /// Access flags on fields
    ///
    /// [0]: https://source.android.com/docs/core/runtime/dex-format#access-flags
    pub struct FieldAccessFlags: u32 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const VOLATILE = 0x0040;
        const TRANSIENT = 0x0080;
        const SYNTHETIC = 0x1000;
        const ENUM = 0x4000;
    }
}

impl MethodAccessFlags {
    /// Direct methods (static, private, or constructors) are listed separately from virtual ones
    /// in class data
    pub fn is_direct(&self) -> bool {
        self.intersects(
            MethodAccessFlags::STATIC | MethodAccessFlags::PRIVATE | MethodAccessFlags::CONSTRUCTOR,
        )
    }

    /// Methods without a body in the container
    pub fn is_bodiless(&self) -> bool {
        self.intersects(MethodAccessFlags::ABSTRACT | MethodAccessFlags::NATIVE)
    }
}
