use std::fmt::{Debug, Display, Error as FmtError, Formatter};

/// Utility trait for rendering descriptors and member references to their string form
pub trait RenderDescriptor {
    /// Turn the descriptor into a string
    fn render(&self) -> String {
        let mut string = String::new();
        self.render_to(&mut string);
        string
    }

    /// Write the descriptor to a string
    fn render_to(&self, write_to: &mut String);
}

/// Type descriptor as it appears in the container (eg. `I`, `Ljava/lang/String;`, `[[J`)
///
/// No validation happens on construction: descriptors are carried around exactly as found so
/// that whoever consumes them can decide how strict to be.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct TypeDescriptor(String);

impl TypeDescriptor {
    pub fn new(descriptor: impl Into<String>) -> TypeDescriptor {
        TypeDescriptor(descriptor.into())
    }

    pub fn void() -> TypeDescriptor {
        TypeDescriptor(String::from("V"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shorty character for this type
    ///
    /// Every reference type (object or array) collapses to `L`. Returns `None` for anything that
    /// is not `V`, a primitive, `L...;`, or `[...`.
    pub fn shorty(&self) -> Option<char> {
        match self.0.as_bytes() {
            [c @ (b'V' | b'Z' | b'B' | b'S' | b'C' | b'F' | b'I' | b'J' | b'D')] => {
                Some(*c as char)
            }
            [b'[', ..] => Some('L'),
            [b'L', .., b';'] => Some('L'),
            _ => None,
        }
    }

    /// Number of registers (or local variable slots) needed to hold a value of this type
    pub fn register_width(&self) -> u16 {
        if self.is_wide() {
            2
        } else {
            1
        }
    }

    /// `long` and `double` occupy two consecutive registers
    pub fn is_wide(&self) -> bool {
        matches!(self.0.as_str(), "J" | "D")
    }

    /// Internal class name for object types (`Ljava/lang/Object;` becomes `java/lang/Object`)
    pub fn class_name(&self) -> Option<&str> {
        if self.0.len() >= 2 && self.0.starts_with('L') && self.0.ends_with(';') {
            Some(&self.0[1..self.0.len() - 1])
        } else {
            None
        }
    }
}

impl From<&str> for TypeDescriptor {
    fn from(descriptor: &str) -> TypeDescriptor {
        TypeDescriptor::new(descriptor)
    }
}

impl AsRef<str> for TypeDescriptor {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl RenderDescriptor for TypeDescriptor {
    fn render_to(&self, write_to: &mut String) {
        write_to.push_str(&self.0);
    }
}

impl Debug for TypeDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(&self.0)
    }
}

impl Display for TypeDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(&self.0)
    }
}

/// Method prototype: return type and parameter types (the receiver is never included)
#[derive(Clone, Hash, Eq, PartialEq, Debug)]
pub struct Prototype {
    pub return_type: TypeDescriptor,
    pub parameters: Vec<TypeDescriptor>,
}

impl Prototype {
    pub fn new(return_type: TypeDescriptor, parameters: Vec<TypeDescriptor>) -> Prototype {
        Prototype {
            return_type,
            parameters,
        }
    }

    /// Registers occupied by the parameters (wide parameters take two)
    pub fn parameter_registers(&self) -> u32 {
        self.parameters
            .iter()
            .map(|param| param.register_width() as u32)
            .sum()
    }

    /// Shorty descriptor (eg. `LIJ` for `(IJ)Ljava/lang/String;`)
    pub fn shorty(&self) -> Option<String> {
        let mut shorty = String::with_capacity(self.parameters.len() + 1);
        shorty.push(self.return_type.shorty()?);
        for param in &self.parameters {
            match param.shorty()? {
                'V' => return None,
                c => shorty.push(c),
            }
        }
        Some(shorty)
    }
}

impl RenderDescriptor for Prototype {
    fn render_to(&self, write_to: &mut String) {
        write_to.push('(');
        for param in &self.parameters {
            param.render_to(write_to);
        }
        write_to.push(')');
        self.return_type.render_to(write_to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorty_characters() {
        assert_eq!(TypeDescriptor::from("V").shorty(), Some('V'));
        assert_eq!(TypeDescriptor::from("J").shorty(), Some('J'));
        assert_eq!(TypeDescriptor::from("Ljava/lang/String;").shorty(), Some('L'));
        assert_eq!(TypeDescriptor::from("[I").shorty(), Some('L'));
        assert_eq!(TypeDescriptor::from("").shorty(), None);
        assert_eq!(TypeDescriptor::from("II").shorty(), None);
        assert_eq!(TypeDescriptor::from("Ljava/lang/String").shorty(), None);
    }

    #[test]
    fn prototype_rendering() {
        let proto = Prototype::new(
            TypeDescriptor::from("Ljava/lang/String;"),
            vec![TypeDescriptor::from("I"), TypeDescriptor::from("J")],
        );
        assert_eq!(proto.render(), "(IJ)Ljava/lang/String;");
        assert_eq!(proto.shorty().as_deref(), Some("LIJ"));
        assert_eq!(proto.parameter_registers(), 3);
    }

    #[test]
    fn void_parameters_have_no_shorty() {
        let proto = Prototype::new(TypeDescriptor::void(), vec![TypeDescriptor::void()]);
        assert_eq!(proto.shorty(), None);
    }

    #[test]
    fn class_names() {
        assert_eq!(
            TypeDescriptor::from("Ljava/lang/Object;").class_name(),
            Some("java/lang/Object")
        );
        assert_eq!(TypeDescriptor::from("[Ljava/lang/Object;").class_name(), None);
    }
}
