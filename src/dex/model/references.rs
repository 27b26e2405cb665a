use crate::dex::{Prototype, RenderDescriptor, TypeDescriptor};
use std::fmt::{Display, Error as FmtError, Formatter};

/// Reference to a field (as in a `field_id_item`)
#[derive(Clone, Hash, Eq, PartialEq, Debug)]
pub struct FieldRef {
    pub class: TypeDescriptor,
    pub name: String,
    pub field_type: TypeDescriptor,
}

/// Reference to a method (as in a `method_id_item`)
#[derive(Clone, Hash, Eq, PartialEq, Debug)]
pub struct MethodRef {
    pub class: TypeDescriptor,
    pub name: String,
    pub prototype: Prototype,
}

/// Renders as `Lcom/example/Foo;->count:I`
impl RenderDescriptor for FieldRef {
    fn render_to(&self, write_to: &mut String) {
        self.class.render_to(write_to);
        write_to.push_str("->");
        write_to.push_str(&self.name);
        write_to.push(':');
        self.field_type.render_to(write_to);
    }
}

/// Renders as `Lcom/example/Foo;->bar(IJ)V`
impl RenderDescriptor for MethodRef {
    fn render_to(&self, write_to: &mut String) {
        self.class.render_to(write_to);
        write_to.push_str("->");
        write_to.push_str(&self.name);
        self.prototype.render_to(write_to);
    }
}

impl Display for FieldRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(&self.render())
    }
}

impl Display for MethodRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(&self.render())
    }
}
