//! In-memory intermediate representation of a dex image.
//!
//! The core tables (strings, types, prototypes, fields, methods) are interned
//! once per image; encoded methods are materialized either for a single class
//! or for the whole image on top of the same tables.

use std::rc::Rc;

use crate::code::CodeItem;
use crate::dex::AccessFlags;

/// Interned core tables of one image
#[derive(Debug)]
pub struct Ir {
    /// Decoded constant-pool strings, dense over the string-id table
    pub strings: Vec<Rc<str>>,

    /// Type descriptors, indexed like the type-id table
    pub types: Vec<IrType>,

    /// Prototypes, indexed like the proto-id table
    pub protos: Vec<IrProto>,

    /// Field references, indexed like the field-id table
    pub fields: Vec<IrField>,

    /// Method references, indexed like the method-id table
    pub methods: Vec<IrMethod>,
}

#[derive(Debug)]
pub struct IrType {
    pub descriptor: Rc<str>,
}

impl IrType {
    /// Human readable form of the descriptor, e.g. `pkg.Name` or `int[]`
    pub fn decl(&self) -> String {
        descriptor_to_decl(&self.descriptor)
    }
}

#[derive(Debug)]
pub struct IrProto {
    pub shorty: Rc<str>,

    /// Type index of the return type
    pub return_type: u32,

    /// Type indices of the parameters, in order
    pub param_types: Vec<u32>,
}

#[derive(Debug)]
pub struct IrField {
    /// Type index of the declaring class
    pub parent: u32,

    /// Type index of the field type
    pub type_: u32,

    pub name: Rc<str>,
}

#[derive(Debug)]
pub struct IrMethod {
    /// Type index of the declaring class
    pub parent: u32,

    /// Proto index of the method prototype
    pub proto: u32,

    pub name: Rc<str>,
}

/// A method declaration together with its code block, when present
#[derive(Debug)]
pub struct EncodedMethod {
    /// Index into the method-id table
    pub method_idx: u32,

    pub access_flags: AccessFlags,

    /// None for abstract and native methods
    pub code: Option<CodeItem>,
}

impl Ir {
    pub fn string(&self, idx: u32) -> Option<&Rc<str>> {
        self.strings.get(idx as usize)
    }

    /// Decl form of a type index, empty string when out of range
    pub fn type_decl(&self, idx: u32) -> String {
        self.types
            .get(idx as usize)
            .map(IrType::decl)
            .unwrap_or_default()
    }

    pub fn method(&self, idx: u32) -> Option<&IrMethod> {
        self.methods.get(idx as usize)
    }

    pub fn field(&self, idx: u32) -> Option<&IrField> {
        self.fields.get(idx as usize)
    }

    /// Readable declaration of a prototype, not including the name, ex:
    /// `(android.content.Context, java.lang.String):void`
    pub fn method_declaration(&self, proto_idx: u32) -> String {
        let Some(proto) = self.protos.get(proto_idx as usize) else {
            return "()".to_owned();
        };

        let params = proto
            .param_types
            .iter()
            .map(|&type_idx| self.type_decl(type_idx))
            .collect::<Vec<_>>()
            .join(", ");

        format!("({}):{}", params, self.type_decl(proto.return_type))
    }

    /// `<parent decl>.<name><declaration>` of a method index
    pub fn method_signature(&self, method_idx: u32) -> String {
        match self.method(method_idx) {
            Some(method) => format!(
                "{}.{}{}",
                self.type_decl(method.parent),
                method.name,
                self.method_declaration(method.proto)
            ),
            None => String::new(),
        }
    }
}

/// Convert a type descriptor to its source-level declaration:
/// `Lcom/pkg/Name;` becomes `com.pkg.Name`, `[I` becomes `int[]`.
pub fn descriptor_to_decl(descriptor: &str) -> String {
    let mut rest = descriptor;
    let mut dimensions = 0usize;
    while let Some(stripped) = rest.strip_prefix('[') {
        dimensions += 1;
        rest = stripped;
    }

    let base = match rest {
        "V" => "void".to_owned(),
        "Z" => "boolean".to_owned(),
        "B" => "byte".to_owned(),
        "S" => "short".to_owned(),
        "C" => "char".to_owned(),
        "I" => "int".to_owned(),
        "J" => "long".to_owned(),
        "F" => "float".to_owned(),
        "D" => "double".to_owned(),
        _ => match rest.strip_prefix('L').and_then(|r| r.strip_suffix(';')) {
            Some(inner) => inner.replace('/', "."),
            None => rest.to_owned(),
        },
    };

    base + &"[]".repeat(dimensions)
}

/// Inverse of [`descriptor_to_decl`] for class names:
/// `com.pkg.Name` becomes `Lcom/pkg/Name;`.
pub fn decl_to_descriptor(decl: &str) -> String {
    format!("L{};", decl.replace('.', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_convert_to_decl_form() {
        assert_eq!(descriptor_to_decl("Lcom/example/Foo;"), "com.example.Foo");
        assert_eq!(descriptor_to_decl("V"), "void");
        assert_eq!(descriptor_to_decl("I"), "int");
        assert_eq!(descriptor_to_decl("[I"), "int[]");
        assert_eq!(descriptor_to_decl("[[Ljava/lang/String;"), "java.lang.String[][]");
    }

    #[test]
    fn decl_converts_back_to_descriptor() {
        assert_eq!(decl_to_descriptor("com.example.Foo"), "Lcom/example/Foo;");
    }
}
