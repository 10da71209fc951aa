use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;
use std::rc::Rc;
use std::sync::Arc;

use bitflags::bitflags;
use log::warn;
use once_cell::unsync::OnceCell;
use simd_adler32::Adler32;
use winnow::binary::{be_u16, be_u32, le_u16, le_u32, u8};
use winnow::combinator::repeat;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take;

use crate::code::CodeItem;
use crate::disasm::{CfgType, Disassembler};
use crate::errors::DexError;
use crate::ir::{EncodedMethod, Ir, IrField, IrMethod, IrProto, IrType, decl_to_descriptor};
use crate::leb;

/// Endianness tag of a little-endian image, the only byte order the
/// toolchain emits in practice
pub const ENDIAN_CONSTANT: u32 = 0x12345678;

/// Endianness tag of a byte-swapped image
pub const REVERSE_ENDIAN_CONSTANT: u32 = 0x78563412;

/// Reserved index spelling "no entry", e.g. the superclass of a root class
pub const NO_INDEX: u32 = u32::MAX;

/// A parsed dex image.
///
/// The id tables are decoded eagerly; the intermediate representation is
/// built on first use and memoized, either for one class at a time or for
/// the whole image. Queries after the first build are lookups.
#[derive(Debug)]
pub struct Dex {
    /// Raw bytes of the image
    data: Vec<u8>,

    /// Decoded fixed-size header
    pub header: DexHeader,

    /// File offsets of the string data items
    pub string_ids: Vec<u32>,

    /// String indices of the type descriptors
    pub type_ids: Vec<u32>,

    /// Prototype items
    pub proto_ids: Vec<ProtoItem>,

    /// Field items
    pub field_ids: Vec<FieldItem>,

    /// Method items
    pub method_ids: Vec<MethodItem>,

    /// Class definitions
    pub class_defs: Vec<ClassItem>,

    /// Interned core tables, built at most once
    core_ir: OnceCell<Ir>,

    /// Encoded methods per class definition index, built on demand
    class_methods: RefCell<BTreeMap<u32, Rc<[EncodedMethod]>>>,
}

impl Dex {
    /// Parse the given dex image
    ///
    /// ```ignore
    /// let dex = Dex::new(data).expect("can't parse dex file");
    /// ```
    pub fn new(data: Vec<u8>) -> Result<Dex, DexError> {
        let input = &mut &data[..];

        let header = Self::parse_dex_header(input).map_err(|_| DexError::InvalidHeader)?;

        // the checksum covers everything after the magic and the checksum itself;
        // repackers often leave it stale, which is worth surfacing
        if let Some(tail) = data.get(12..) {
            let mut hasher = Adler32::new();
            hasher.write(tail);
            if hasher.finish() != header.checksum {
                warn!(
                    "dex checksum mismatch: header says {:#010x}",
                    header.checksum
                );
            }
        }

        let string_ids = repeat(header.string_ids_size as usize, le_u32)
            .parse_next(input)
            .map_err(|_: ErrMode<ContextError>| DexError::StringError)?;

        let type_ids = repeat(header.type_ids_size as usize, le_u32)
            .parse_next(input)
            .map_err(|_: ErrMode<ContextError>| DexError::TypeError)?;

        let proto_ids = repeat(header.proto_ids_size as usize, ProtoItem::parse)
            .parse_next(input)
            .map_err(|_| DexError::ProtoError)?;

        let field_ids = repeat(header.field_ids_size as usize, FieldItem::parse)
            .parse_next(input)
            .map_err(|_| DexError::FieldError)?;

        let method_ids = repeat(header.method_ids_size as usize, MethodItem::parse)
            .parse_next(input)
            .map_err(|_| DexError::MethodError)?;

        let class_defs = repeat(header.class_defs_size as usize, ClassItem::parse)
            .parse_next(input)
            .map_err(|_| DexError::ClassError)?;

        Ok(Dex {
            data,
            header,
            string_ids,
            type_ids,
            proto_ids,
            field_ids,
            method_ids,
            class_defs,
            core_ir: OnceCell::new(),
            class_methods: RefCell::new(BTreeMap::new()),
        })
    }

    fn parse_dex_header(input: &mut &[u8]) -> ModalResult<DexHeader> {
        // magic: "dex\n", three version digits, NUL
        let magic = be_u32.verify(|magic| *magic == 0x6465780A).parse_next(input)?;
        let _ = u8.verify(|v| *v == 0x30).parse_next(input)?;
        let version = be_u16.try_map(DexVersion::try_from).parse_next(input)?;
        let _ = u8.verify(|v| *v == 0x00).parse_next(input)?;

        let (checksum, signature) = (le_u32, take(20usize).map(Arc::from)).parse_next(input)?;
        let (file_size, header_size) = (le_u32, le_u32).parse_next(input)?;
        let endian_tag = le_u32
            .verify(|&tag| tag == ENDIAN_CONSTANT || tag == REVERSE_ENDIAN_CONSTANT)
            .parse_next(input)?;
        let (link_size, link_off, map_off) = (le_u32, le_u32, le_u32).parse_next(input)?;

        // seven (count, offset) pairs describe the id tables and the data
        // section
        let table = |input: &mut &[u8]| -> ModalResult<(u32, u32)> {
            (le_u32, le_u32).parse_next(input)
        };
        let (string_ids_size, string_ids_off) = table(input)?;
        let (type_ids_size, type_ids_off) = table(input)?;
        let (proto_ids_size, proto_ids_off) = table(input)?;
        let (field_ids_size, field_ids_off) = table(input)?;
        let (method_ids_size, method_ids_off) = table(input)?;
        let (class_defs_size, class_defs_off) = table(input)?;
        let (data_size, data_off) = table(input)?;

        // type and proto counts must fit the 16-bit indices used by the
        // field and method tables
        if type_ids_size > u16::MAX.into() || proto_ids_size > u16::MAX.into() {
            return Err(ErrMode::Cut(ContextError::new()));
        }

        let (mut container_size, mut header_offset) = (0, 0);
        if version >= DexVersion::DEX41 {
            (container_size, header_offset) = (le_u32, le_u32).parse_next(input)?;
        }

        Ok(DexHeader {
            magic,
            version,
            checksum,
            signature,
            file_size,
            header_size,
            endian_tag,
            link_size,
            link_off,
            map_off,
            string_ids_size,
            string_ids_off,
            type_ids_size,
            type_ids_off,
            proto_ids_size,
            proto_ids_off,
            field_ids_size,
            field_ids_off,
            method_ids_size,
            method_ids_off,
            class_defs_size,
            class_defs_off,
            data_size,
            data_off,
            container_size,
            header_offset,
        })
    }

    /// Decode one constant-pool string: a uleb128 utf-16 length followed by
    /// NUL-terminated MUTF-8 bytes
    pub fn get_string(&self, idx: usize) -> Option<Cow<'_, str>> {
        let offset = *self.string_ids.get(idx)? as usize;
        let mut data = self.data.get(offset..)?;

        let _utf16_len = leb::uleb128(&mut data).ok()?;
        let end = data.iter().position(|&b| b == 0)?;

        Some(simd_cesu8::mutf8::decode_lossy(&data[..end]))
    }

    #[inline]
    pub fn get_type(&self, idx: usize) -> Option<Cow<'_, str>> {
        let idx = *self.type_ids.get(idx)?;
        self.get_string(idx as usize)
    }

    /// Human readable declarations of every class defined in this image
    pub fn classes(&self) -> Vec<String> {
        self.class_defs
            .iter()
            .filter_map(|class| class.get_name(self))
            .map(|descriptor| crate::ir::descriptor_to_decl(&descriptor))
            .collect()
    }

    /// Index into [`Dex::class_defs`] of the class with the given descriptor
    pub fn find_class_index(&self, descriptor: &str) -> Option<u32> {
        self.class_defs
            .iter()
            .position(|class| {
                class
                    .get_name(self)
                    .is_some_and(|candidate| candidate == descriptor)
            })
            .map(|idx| idx as u32)
    }

    /// Interned core tables, built on first call
    pub fn ir(&self) -> Result<&Ir, DexError> {
        self.core_ir.get_or_try_init(|| self.build_core_ir())
    }

    fn build_core_ir(&self) -> Result<Ir, DexError> {
        let strings: Vec<Rc<str>> = (0..self.string_ids.len())
            .map(|idx| {
                self.get_string(idx)
                    .map(|s| Rc::from(s.as_ref()))
                    .unwrap_or_else(|| Rc::from(""))
            })
            .collect();

        let types: Vec<IrType> = self
            .type_ids
            .iter()
            .map(|&string_idx| IrType {
                descriptor: strings
                    .get(string_idx as usize)
                    .cloned()
                    .unwrap_or_else(|| Rc::from("")),
            })
            .collect();

        let protos = self
            .proto_ids
            .iter()
            .map(|proto| {
                Ok(IrProto {
                    shorty: strings
                        .get(proto.shorty_idx as usize)
                        .cloned()
                        .unwrap_or_else(|| Rc::from("")),
                    return_type: proto.return_type_idx,
                    param_types: self.parse_type_list(proto.parameters_off)?,
                })
            })
            .collect::<Result<Vec<_>, DexError>>()?;

        let fields = self
            .field_ids
            .iter()
            .map(|field| IrField {
                parent: field.class_idx as u32,
                type_: field.type_idx as u32,
                name: strings
                    .get(field.name_idx as usize)
                    .cloned()
                    .unwrap_or_else(|| Rc::from("")),
            })
            .collect();

        let methods = self
            .method_ids
            .iter()
            .map(|method| IrMethod {
                parent: method.class_idx as u32,
                proto: method.proto_idx as u32,
                name: strings
                    .get(method.name_idx as usize)
                    .cloned()
                    .unwrap_or_else(|| Rc::from("")),
            })
            .collect();

        Ok(Ir {
            strings,
            types,
            protos,
            fields,
            methods,
        })
    }

    /// The `type_list` structure: a count followed by 16-bit type indices
    fn parse_type_list(&self, offset: u32) -> Result<Vec<u32>, DexError> {
        if offset == 0 {
            return Ok(Vec::new());
        }

        let mut input = self
            .data
            .get(offset as usize..)
            .ok_or(DexError::ProtoError)?;

        let size = le_u32::<_, ContextError>
            .parse_next(&mut input)
            .map_err(|_| DexError::ProtoError)?;
        let entries: Vec<u16> = repeat(size as usize, le_u16::<_, ContextError>)
            .parse_next(&mut input)
            .map_err(|_| DexError::ProtoError)?;

        Ok(entries.into_iter().map(u32::from).collect())
    }

    /// Encoded methods of one class definition, built on first call.
    ///
    /// Repeated calls for different classes accumulate; the interned core
    /// tables are shared between all of them.
    pub fn class_ir(&self, class_idx: u32) -> Result<Rc<[EncodedMethod]>, DexError> {
        if let Some(methods) = self.class_methods.borrow().get(&class_idx) {
            return Ok(Rc::clone(methods));
        }

        let methods: Rc<[EncodedMethod]> = self.parse_class_data(class_idx)?.into();
        self.class_methods
            .borrow_mut()
            .insert(class_idx, Rc::clone(&methods));

        Ok(methods)
    }

    /// Encoded methods of every class, materializing whatever is still missing
    pub fn full_ir(&self) -> Result<Vec<Rc<[EncodedMethod]>>, DexError> {
        self.ir()?;

        (0..self.class_defs.len() as u32)
            .map(|class_idx| self.class_ir(class_idx))
            .collect()
    }

    fn parse_class_data(&self, class_idx: u32) -> Result<Vec<EncodedMethod>, DexError> {
        let class = self
            .class_defs
            .get(class_idx as usize)
            .ok_or(DexError::ClassDataError(class_idx))?;

        if class.class_data_off == 0 {
            return Ok(Vec::new());
        }

        let mut input = self
            .data
            .get(class.class_data_off as usize..)
            .ok_or(DexError::ClassDataError(class_idx))?;

        let parse = |input: &mut &[u8]| -> ModalResult<Vec<(u64, u64, u64)>> {
            let static_fields = leb::uleb128(input)?;
            let instance_fields = leb::uleb128(input)?;
            let direct_methods = leb::uleb128(input)?;
            let virtual_methods = leb::uleb128(input)?;

            // encoded fields carry (idx_diff, access_flags) pairs
            for _ in 0..static_fields + instance_fields {
                let _ = leb::uleb128(input)?;
                let _ = leb::uleb128(input)?;
            }

            let mut methods = Vec::new();
            for count in [direct_methods, virtual_methods] {
                let mut method_idx = 0u64;
                for _ in 0..count {
                    let idx_diff = leb::uleb128(input)?;
                    let access_flags = leb::uleb128(input)?;
                    let code_off = leb::uleb128(input)?;
                    method_idx += idx_diff;
                    methods.push((method_idx, access_flags, code_off));
                }
            }

            Ok(methods)
        };

        let raw_methods =
            parse(&mut input).map_err(|_| DexError::ClassDataError(class_idx))?;

        raw_methods
            .into_iter()
            .map(|(method_idx, access_flags, code_off)| {
                let code = if code_off == 0 {
                    None
                } else {
                    Some(CodeItem::parse(&self.data, code_off as u32)?)
                };

                Ok(EncodedMethod {
                    method_idx: method_idx as u32,
                    access_flags: AccessFlags::from_bits_truncate(access_flags as u32),
                    code,
                })
            })
            .collect()
    }

    /// Constant-pool strings, trimmed, with empty entries dropped
    pub fn strings(&self) -> Result<Vec<String>, DexError> {
        Ok(self
            .ir()?
            .strings
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect())
    }

    /// Every encoded method as `(parent declaration, name)`
    pub fn methods(&self) -> Result<Vec<(String, String)>, DexError> {
        let ir = self.ir()?;
        let mut out = Vec::new();

        for class_methods in self.full_ir()? {
            for encoded in class_methods.iter() {
                if let Some(method) = ir.method(encoded.method_idx) {
                    out.push((ir.type_decl(method.parent), method.name.to_string()));
                }
            }
        }

        Ok(out)
    }

    /// Encoded methods of the class with the given declaration, e.g.
    /// `com.example.Foo`, as `(access flags, name)` pairs. Empty when the
    /// class is not in this image.
    pub fn class_methods(&self, class_decl: &str) -> Result<Vec<(AccessFlags, String)>, DexError> {
        let descriptor = decl_to_descriptor(class_decl);
        let Some(class_idx) = self.find_class_index(&descriptor) else {
            return Ok(Vec::new());
        };

        let ir = self.ir()?;
        Ok(self
            .class_ir(class_idx)?
            .iter()
            .filter_map(|encoded| {
                ir.method(encoded.method_idx)
                    .map(|method| (encoded.access_flags, method.name.to_string()))
            })
            .collect())
    }

    /// Disassemble the method with the given dotted `class.method` path into
    /// `sink`. Returns whether the method was found in this image.
    pub fn disassemble(
        &self,
        method_path: &str,
        cfg_type: CfgType,
        sink: &mut dyn io::Write,
    ) -> Result<bool, DexError> {
        let Some((class_path, method_name)) = method_path.rsplit_once('.') else {
            return Ok(false);
        };

        let descriptor = decl_to_descriptor(class_path);
        let Some(class_idx) = self.find_class_index(&descriptor) else {
            return Ok(false);
        };

        let ir = self.ir()?;
        let mut found = false;

        for encoded in self.class_ir(class_idx)?.iter() {
            let Some(method) = ir.method(encoded.method_idx) else {
                continue;
            };
            if &*method.name != method_name || ir.type_decl(method.parent) != class_path {
                continue;
            }

            found = true;
            Disassembler::new(self, cfg_type).dump_method(encoded, sink)?;
        }

        Ok(found)
    }
}

/// Format revision encoded in the magic, `035` through `041`
///
/// See: <https://source.android.com/docs/core/runtime/dex-format#dex-file-magic>
#[derive(Default, Debug, Clone, PartialEq, PartialOrd)]
pub enum DexVersion {
    #[default]
    DEX35,
    DEX36,
    DEX37,
    DEX38,
    DEX39,
    DEX40,
    DEX41,
}

impl TryFrom<u16> for DexVersion {
    type Error = DexError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x3335 => Ok(DexVersion::DEX35),
            0x3336 => Ok(DexVersion::DEX36),
            0x3337 => Ok(DexVersion::DEX37),
            0x3338 => Ok(DexVersion::DEX38),
            0x3339 => Ok(DexVersion::DEX39),
            0x3430 => Ok(DexVersion::DEX40),
            0x3431 => Ok(DexVersion::DEX41),
            _ => Err(DexError::UnknownVersion(value)),
        }
    }
}

/// The fixed-size header at the front of every image.
///
/// Each table is described by a count plus a file offset; an offset of zero
/// means the table is absent. Only the counts drive parsing here, since the
/// tables follow the header in their canonical order.
///
/// See: <https://source.android.com/docs/core/runtime/dex-format#header-item>
#[derive(Default, Debug, Clone)]
pub struct DexHeader {
    /// First word of the magic, `dex\n`
    pub magic: u32,

    /// Format revision parsed out of the magic digits
    pub version: DexVersion,

    /// Adler32 over everything past the first 12 bytes, for corruption checks
    pub checksum: u32,

    /// SHA-1 over the same range, 20 bytes identifying the image
    pub signature: Arc<[u8]>,

    /// Length of the whole image in bytes
    pub file_size: u32,

    /// Length of this header, 0x70 for the classic format
    pub header_size: u32,

    /// [ENDIAN_CONSTANT], or [REVERSE_ENDIAN_CONSTANT] for swapped images
    pub endian_tag: u32,

    /// Length of the static-link section, zero for ordinary images
    pub link_size: u32,

    /// Offset of the static-link section
    pub link_off: u32,

    /// Offset of the map list
    pub map_off: u32,

    /// Number of string ids
    pub string_ids_size: u32,

    /// Offset of the string-id table
    pub string_ids_off: u32,

    /// Number of type ids, bounded by the 16-bit indices that reference them
    pub type_ids_size: u32,

    /// Offset of the type-id table
    pub type_ids_off: u32,

    /// Number of prototypes, bounded like the type ids
    pub proto_ids_size: u32,

    /// Offset of the proto-id table
    pub proto_ids_off: u32,

    /// Number of field ids
    pub field_ids_size: u32,

    /// Offset of the field-id table
    pub field_ids_off: u32,

    /// Number of method ids
    pub method_ids_size: u32,

    /// Offset of the method-id table
    pub method_ids_off: u32,

    /// Number of class definitions
    pub class_defs_size: u32,

    /// Offset of the class-definition table
    pub class_defs_off: u32,

    /// Length of the data section; meaningless from version 41 on
    pub data_size: u32,

    /// Offset of the data section; meaningless from version 41 on
    pub data_off: u32,

    /// Container length, present from version 41 on
    pub container_size: u32,

    /// Offset of this header inside the container, present from version 41 on
    pub header_offset: u32,
}

/// A `proto_id_item`: method shape without a name.
///
/// See: <https://source.android.com/docs/core/runtime/dex-format#proto-id-item>
#[derive(Debug)]
pub struct ProtoItem {
    /// String index of the short-form descriptor, e.g. `VL`
    pub shorty_idx: u32,

    /// Type index of the return type
    pub return_type_idx: u32,

    /// Offset of the parameter `type_list`, zero for no parameters
    pub parameters_off: u32,
}

impl ProtoItem {
    #[inline]
    fn parse(input: &mut &[u8]) -> ModalResult<ProtoItem> {
        (le_u32, le_u32, le_u32)
            .map(|(shorty_idx, return_type_idx, parameters_off)| ProtoItem {
                shorty_idx,
                return_type_idx,
                parameters_off,
            })
            .parse_next(input)
    }
}

/// A `field_id_item`: declaring class, field type and name.
///
/// See: <https://source.android.com/docs/core/runtime/dex-format#field-id-item>
#[derive(Debug)]
pub struct FieldItem {
    /// Type index of the class declaring the field
    pub class_idx: u16,

    /// Type index of the field's own type
    pub type_idx: u16,

    /// String index of the field name
    pub name_idx: u32,
}

impl FieldItem {
    #[inline]
    fn parse(input: &mut &[u8]) -> ModalResult<FieldItem> {
        (le_u16, le_u16, le_u32)
            .map(|(class_idx, type_idx, name_idx)| FieldItem {
                class_idx,
                type_idx,
                name_idx,
            })
            .parse_next(input)
    }
}

/// A `method_id_item`: declaring class, prototype and name.
///
/// See: <https://source.android.com/docs/core/runtime/dex-format#method-id-item>
#[derive(Debug)]
pub struct MethodItem {
    /// Type index of the class declaring the method
    pub class_idx: u16,

    /// Proto index of the method shape
    pub proto_idx: u16,

    /// String index of the method name
    pub name_idx: u32,
}

impl MethodItem {
    #[inline]
    fn parse(input: &mut &[u8]) -> ModalResult<MethodItem> {
        (le_u16, le_u16, le_u32)
            .map(|(class_idx, proto_idx, name_idx)| MethodItem {
                class_idx,
                proto_idx,
                name_idx,
            })
            .parse_next(input)
    }
}

/// A `class_def_item`: one defined class with pointers into the data
/// section for everything attached to it.
///
/// See: <https://source.android.com/docs/core/runtime/dex-format#class-def-item>
#[derive(Debug)]
pub struct ClassItem {
    /// Type index of the class itself
    pub class_idx: u32,

    /// Class-level access flags
    pub access_flags: AccessFlags,

    /// Type index of the superclass, [NO_INDEX] for root classes
    pub superclass_idx: u32,

    /// Offset of the implemented-interfaces `type_list`, zero for none
    pub interfaces_off: u32,

    /// String index of the source file name, [NO_INDEX] when stripped
    pub source_file_idx: u32,

    /// Offset of the annotations directory, zero for none
    pub annotations_off: u32,

    /// Offset of the `class_data_item` holding fields and methods,
    /// zero for marker classes without members
    pub class_data_off: u32,

    /// Offset of the initial values for static fields, zero when they
    /// all start out zero or null
    pub static_values_off: u32,
}

impl ClassItem {
    #[inline]
    fn parse(input: &mut &[u8]) -> ModalResult<ClassItem> {
        (
            le_u32,
            le_u32.map(AccessFlags::from_bits_truncate),
            le_u32,
            le_u32,
            le_u32,
            le_u32,
            le_u32,
            le_u32,
        )
            .map(
                |(
                    class_idx,
                    access_flags,
                    superclass_idx,
                    interfaces_off,
                    source_file_idx,
                    annotations_off,
                    class_data_off,
                    static_values_off,
                )| ClassItem {
                    class_idx,
                    access_flags,
                    superclass_idx,
                    interfaces_off,
                    source_file_idx,
                    annotations_off,
                    class_data_off,
                    static_values_off,
                },
            )
            .parse_next(input)
    }

    /// Get the descriptor of this class
    #[inline]
    pub fn get_name<'a>(&'a self, dex: &'a Dex) -> Option<Cow<'a, str>> {
        dex.get_type(self.class_idx as usize)
    }

    /// Get the descriptor of the superclass, [None] for root classes
    #[inline]
    pub fn get_superclass<'a>(&'a self, dex: &'a Dex) -> Option<Cow<'a, str>> {
        if self.superclass_idx == NO_INDEX {
            return None;
        }

        dex.get_type(self.superclass_idx as usize)
    }
}

bitflags! {
    /// Access flags used for classes, fields and methods.
    ///
    /// See: <https://source.android.com/docs/core/runtime/dex-format#access-flags>
    #[derive(Debug, Clone, Copy)]
    pub struct AccessFlags: u32 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const VOLATILE = 0x0040;
        const BRIDGE = 0x0040;
        const TRANSIENT = 0x0080;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const CONSTRUCTOR = 0x10000;
        const DECLARED_SYNCHRONIZED = 0x20000;
    }
}

impl AccessFlags {
    /// Source-level modifier spelling for listings, with a trailing space
    /// when any modifier is set
    pub fn modifiers(&self) -> String {
        const NAMES: [(AccessFlags, &str); 8] = [
            (AccessFlags::PUBLIC, "public"),
            (AccessFlags::PRIVATE, "private"),
            (AccessFlags::PROTECTED, "protected"),
            (AccessFlags::STATIC, "static"),
            (AccessFlags::FINAL, "final"),
            (AccessFlags::ABSTRACT, "abstract"),
            (AccessFlags::NATIVE, "native"),
            (AccessFlags::SYNTHETIC, "synthetic"),
        ];

        let mut out = String::new();
        for (flag, name) in NAMES {
            if self.contains(flag) {
                out.push_str(name);
                out.push(' ');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifiers_spell_out_set_flags() {
        let flags = AccessFlags::PUBLIC | AccessFlags::STATIC;
        assert_eq!(flags.modifiers(), "public static ");

        assert_eq!(AccessFlags::empty().modifiers(), "");
    }
}
