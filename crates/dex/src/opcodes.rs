//! The Dalvik opcode table: mnemonic, encoding format and reference kind
//! for every opcode byte.
//!
//! See: <https://source.android.com/docs/core/runtime/dalvik-bytecode>

/// Instruction encoding formats
///
/// See: <https://source.android.com/docs/core/runtime/instruction-formats>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    F10x,
    F12x,
    F11n,
    F11x,
    F10t,
    F20t,
    F22x,
    F21t,
    F21s,
    F21h,
    F21c,
    F23x,
    F22b,
    F22t,
    F22s,
    F22c,
    F30t,
    F32x,
    F31i,
    F31t,
    F31c,
    F35c,
    F3rc,
    F45cc,
    F4rcc,
    F51l,
}

impl Format {
    /// Width of the encoded instruction in 16-bit code units
    pub fn units(self) -> u32 {
        match self {
            Format::F10x | Format::F12x | Format::F11n | Format::F11x | Format::F10t => 1,
            Format::F20t
            | Format::F22x
            | Format::F21t
            | Format::F21s
            | Format::F21h
            | Format::F21c
            | Format::F23x
            | Format::F22b
            | Format::F22t
            | Format::F22s
            | Format::F22c => 2,
            Format::F30t
            | Format::F32x
            | Format::F31i
            | Format::F31t
            | Format::F31c
            | Format::F35c
            | Format::F3rc => 3,
            Format::F45cc | Format::F4rcc => 4,
            Format::F51l => 5,
        }
    }
}

/// What the constant-pool index of an instruction refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    None,
    StringRef,
    TypeRef,
    FieldRef,
    MethodRef,
    /// `invoke-custom` call sites, rendered as a plain index
    CallSiteRef,
    /// `const-method-handle`, rendered as a plain index
    MethodHandleRef,
    /// `const-method-type`, rendered as a plain index
    ProtoRef,
}

#[derive(Debug)]
pub struct OpcodeInfo {
    pub name: &'static str,
    pub format: Format,
    pub index: IndexKind,
}

const fn op(name: &'static str, format: Format, index: IndexKind) -> OpcodeInfo {
    OpcodeInfo {
        name,
        format,
        index,
    }
}

const fn plain(name: &'static str, format: Format) -> OpcodeInfo {
    op(name, format, IndexKind::None)
}

const fn unused() -> OpcodeInfo {
    plain("unused", Format::F10x)
}

use Format::*;
use IndexKind::*;

#[rustfmt::skip]
static OPCODES: [OpcodeInfo; 256] = [
    /* 0x00 */ plain("nop", F10x),
    /* 0x01 */ plain("move", F12x),
    /* 0x02 */ plain("move/from16", F22x),
    /* 0x03 */ plain("move/16", F32x),
    /* 0x04 */ plain("move-wide", F12x),
    /* 0x05 */ plain("move-wide/from16", F22x),
    /* 0x06 */ plain("move-wide/16", F32x),
    /* 0x07 */ plain("move-object", F12x),
    /* 0x08 */ plain("move-object/from16", F22x),
    /* 0x09 */ plain("move-object/16", F32x),
    /* 0x0a */ plain("move-result", F11x),
    /* 0x0b */ plain("move-result-wide", F11x),
    /* 0x0c */ plain("move-result-object", F11x),
    /* 0x0d */ plain("move-exception", F11x),
    /* 0x0e */ plain("return-void", F10x),
    /* 0x0f */ plain("return", F11x),
    /* 0x10 */ plain("return-wide", F11x),
    /* 0x11 */ plain("return-object", F11x),
    /* 0x12 */ plain("const/4", F11n),
    /* 0x13 */ plain("const/16", F21s),
    /* 0x14 */ plain("const", F31i),
    /* 0x15 */ plain("const/high16", F21h),
    /* 0x16 */ plain("const-wide/16", F21s),
    /* 0x17 */ plain("const-wide/32", F31i),
    /* 0x18 */ plain("const-wide", F51l),
    /* 0x19 */ plain("const-wide/high16", F21h),
    /* 0x1a */ op("const-string", F21c, StringRef),
    /* 0x1b */ op("const-string/jumbo", F31c, StringRef),
    /* 0x1c */ op("const-class", F21c, TypeRef),
    /* 0x1d */ plain("monitor-enter", F11x),
    /* 0x1e */ plain("monitor-exit", F11x),
    /* 0x1f */ op("check-cast", F21c, TypeRef),
    /* 0x20 */ op("instance-of", F22c, TypeRef),
    /* 0x21 */ plain("array-length", F12x),
    /* 0x22 */ op("new-instance", F21c, TypeRef),
    /* 0x23 */ op("new-array", F22c, TypeRef),
    /* 0x24 */ op("filled-new-array", F35c, TypeRef),
    /* 0x25 */ op("filled-new-array/range", F3rc, TypeRef),
    /* 0x26 */ plain("fill-array-data", F31t),
    /* 0x27 */ plain("throw", F11x),
    /* 0x28 */ plain("goto", F10t),
    /* 0x29 */ plain("goto/16", F20t),
    /* 0x2a */ plain("goto/32", F30t),
    /* 0x2b */ plain("packed-switch", F31t),
    /* 0x2c */ plain("sparse-switch", F31t),
    /* 0x2d */ plain("cmpl-float", F23x),
    /* 0x2e */ plain("cmpg-float", F23x),
    /* 0x2f */ plain("cmpl-double", F23x),
    /* 0x30 */ plain("cmpg-double", F23x),
    /* 0x31 */ plain("cmp-long", F23x),
    /* 0x32 */ plain("if-eq", F22t),
    /* 0x33 */ plain("if-ne", F22t),
    /* 0x34 */ plain("if-lt", F22t),
    /* 0x35 */ plain("if-ge", F22t),
    /* 0x36 */ plain("if-gt", F22t),
    /* 0x37 */ plain("if-le", F22t),
    /* 0x38 */ plain("if-eqz", F21t),
    /* 0x39 */ plain("if-nez", F21t),
    /* 0x3a */ plain("if-ltz", F21t),
    /* 0x3b */ plain("if-gez", F21t),
    /* 0x3c */ plain("if-gtz", F21t),
    /* 0x3d */ plain("if-lez", F21t),
    /* 0x3e */ unused(),
    /* 0x3f */ unused(),
    /* 0x40 */ unused(),
    /* 0x41 */ unused(),
    /* 0x42 */ unused(),
    /* 0x43 */ unused(),
    /* 0x44 */ plain("aget", F23x),
    /* 0x45 */ plain("aget-wide", F23x),
    /* 0x46 */ plain("aget-object", F23x),
    /* 0x47 */ plain("aget-boolean", F23x),
    /* 0x48 */ plain("aget-byte", F23x),
    /* 0x49 */ plain("aget-char", F23x),
    /* 0x4a */ plain("aget-short", F23x),
    /* 0x4b */ plain("aput", F23x),
    /* 0x4c */ plain("aput-wide", F23x),
    /* 0x4d */ plain("aput-object", F23x),
    /* 0x4e */ plain("aput-boolean", F23x),
    /* 0x4f */ plain("aput-byte", F23x),
    /* 0x50 */ plain("aput-char", F23x),
    /* 0x51 */ plain("aput-short", F23x),
    /* 0x52 */ op("iget", F22c, FieldRef),
    /* 0x53 */ op("iget-wide", F22c, FieldRef),
    /* 0x54 */ op("iget-object", F22c, FieldRef),
    /* 0x55 */ op("iget-boolean", F22c, FieldRef),
    /* 0x56 */ op("iget-byte", F22c, FieldRef),
    /* 0x57 */ op("iget-char", F22c, FieldRef),
    /* 0x58 */ op("iget-short", F22c, FieldRef),
    /* 0x59 */ op("iput", F22c, FieldRef),
    /* 0x5a */ op("iput-wide", F22c, FieldRef),
    /* 0x5b */ op("iput-object", F22c, FieldRef),
    /* 0x5c */ op("iput-boolean", F22c, FieldRef),
    /* 0x5d */ op("iput-byte", F22c, FieldRef),
    /* 0x5e */ op("iput-char", F22c, FieldRef),
    /* 0x5f */ op("iput-short", F22c, FieldRef),
    /* 0x60 */ op("sget", F21c, FieldRef),
    /* 0x61 */ op("sget-wide", F21c, FieldRef),
    /* 0x62 */ op("sget-object", F21c, FieldRef),
    /* 0x63 */ op("sget-boolean", F21c, FieldRef),
    /* 0x64 */ op("sget-byte", F21c, FieldRef),
    /* 0x65 */ op("sget-char", F21c, FieldRef),
    /* 0x66 */ op("sget-short", F21c, FieldRef),
    /* 0x67 */ op("sput", F21c, FieldRef),
    /* 0x68 */ op("sput-wide", F21c, FieldRef),
    /* 0x69 */ op("sput-object", F21c, FieldRef),
    /* 0x6a */ op("sput-boolean", F21c, FieldRef),
    /* 0x6b */ op("sput-byte", F21c, FieldRef),
    /* 0x6c */ op("sput-char", F21c, FieldRef),
    /* 0x6d */ op("sput-short", F21c, FieldRef),
    /* 0x6e */ op("invoke-virtual", F35c, MethodRef),
    /* 0x6f */ op("invoke-super", F35c, MethodRef),
    /* 0x70 */ op("invoke-direct", F35c, MethodRef),
    /* 0x71 */ op("invoke-static", F35c, MethodRef),
    /* 0x72 */ op("invoke-interface", F35c, MethodRef),
    /* 0x73 */ unused(),
    /* 0x74 */ op("invoke-virtual/range", F3rc, MethodRef),
    /* 0x75 */ op("invoke-super/range", F3rc, MethodRef),
    /* 0x76 */ op("invoke-direct/range", F3rc, MethodRef),
    /* 0x77 */ op("invoke-static/range", F3rc, MethodRef),
    /* 0x78 */ op("invoke-interface/range", F3rc, MethodRef),
    /* 0x79 */ unused(),
    /* 0x7a */ unused(),
    /* 0x7b */ plain("neg-int", F12x),
    /* 0x7c */ plain("not-int", F12x),
    /* 0x7d */ plain("neg-long", F12x),
    /* 0x7e */ plain("not-long", F12x),
    /* 0x7f */ plain("neg-float", F12x),
    /* 0x80 */ plain("neg-double", F12x),
    /* 0x81 */ plain("int-to-long", F12x),
    /* 0x82 */ plain("int-to-float", F12x),
    /* 0x83 */ plain("int-to-double", F12x),
    /* 0x84 */ plain("long-to-int", F12x),
    /* 0x85 */ plain("long-to-float", F12x),
    /* 0x86 */ plain("long-to-double", F12x),
    /* 0x87 */ plain("float-to-int", F12x),
    /* 0x88 */ plain("float-to-long", F12x),
    /* 0x89 */ plain("float-to-double", F12x),
    /* 0x8a */ plain("double-to-int", F12x),
    /* 0x8b */ plain("double-to-long", F12x),
    /* 0x8c */ plain("double-to-float", F12x),
    /* 0x8d */ plain("int-to-byte", F12x),
    /* 0x8e */ plain("int-to-char", F12x),
    /* 0x8f */ plain("int-to-short", F12x),
    /* 0x90 */ plain("add-int", F23x),
    /* 0x91 */ plain("sub-int", F23x),
    /* 0x92 */ plain("mul-int", F23x),
    /* 0x93 */ plain("div-int", F23x),
    /* 0x94 */ plain("rem-int", F23x),
    /* 0x95 */ plain("and-int", F23x),
    /* 0x96 */ plain("or-int", F23x),
    /* 0x97 */ plain("xor-int", F23x),
    /* 0x98 */ plain("shl-int", F23x),
    /* 0x99 */ plain("shr-int", F23x),
    /* 0x9a */ plain("ushr-int", F23x),
    /* 0x9b */ plain("add-long", F23x),
    /* 0x9c */ plain("sub-long", F23x),
    /* 0x9d */ plain("mul-long", F23x),
    /* 0x9e */ plain("div-long", F23x),
    /* 0x9f */ plain("rem-long", F23x),
    /* 0xa0 */ plain("and-long", F23x),
    /* 0xa1 */ plain("or-long", F23x),
    /* 0xa2 */ plain("xor-long", F23x),
    /* 0xa3 */ plain("shl-long", F23x),
    /* 0xa4 */ plain("shr-long", F23x),
    /* 0xa5 */ plain("ushr-long", F23x),
    /* 0xa6 */ plain("add-float", F23x),
    /* 0xa7 */ plain("sub-float", F23x),
    /* 0xa8 */ plain("mul-float", F23x),
    /* 0xa9 */ plain("div-float", F23x),
    /* 0xaa */ plain("rem-float", F23x),
    /* 0xab */ plain("add-double", F23x),
    /* 0xac */ plain("sub-double", F23x),
    /* 0xad */ plain("mul-double", F23x),
    /* 0xae */ plain("div-double", F23x),
    /* 0xaf */ plain("rem-double", F23x),
    /* 0xb0 */ plain("add-int/2addr", F12x),
    /* 0xb1 */ plain("sub-int/2addr", F12x),
    /* 0xb2 */ plain("mul-int/2addr", F12x),
    /* 0xb3 */ plain("div-int/2addr", F12x),
    /* 0xb4 */ plain("rem-int/2addr", F12x),
    /* 0xb5 */ plain("and-int/2addr", F12x),
    /* 0xb6 */ plain("or-int/2addr", F12x),
    /* 0xb7 */ plain("xor-int/2addr", F12x),
    /* 0xb8 */ plain("shl-int/2addr", F12x),
    /* 0xb9 */ plain("shr-int/2addr", F12x),
    /* 0xba */ plain("ushr-int/2addr", F12x),
    /* 0xbb */ plain("add-long/2addr", F12x),
    /* 0xbc */ plain("sub-long/2addr", F12x),
    /* 0xbd */ plain("mul-long/2addr", F12x),
    /* 0xbe */ plain("div-long/2addr", F12x),
    /* 0xbf */ plain("rem-long/2addr", F12x),
    /* 0xc0 */ plain("and-long/2addr", F12x),
    /* 0xc1 */ plain("or-long/2addr", F12x),
    /* 0xc2 */ plain("xor-long/2addr", F12x),
    /* 0xc3 */ plain("shl-long/2addr", F12x),
    /* 0xc4 */ plain("shr-long/2addr", F12x),
    /* 0xc5 */ plain("ushr-long/2addr", F12x),
    /* 0xc6 */ plain("add-float/2addr", F12x),
    /* 0xc7 */ plain("sub-float/2addr", F12x),
    /* 0xc8 */ plain("mul-float/2addr", F12x),
    /* 0xc9 */ plain("div-float/2addr", F12x),
    /* 0xca */ plain("rem-float/2addr", F12x),
    /* 0xcb */ plain("add-double/2addr", F12x),
    /* 0xcc */ plain("sub-double/2addr", F12x),
    /* 0xcd */ plain("mul-double/2addr", F12x),
    /* 0xce */ plain("div-double/2addr", F12x),
    /* 0xcf */ plain("rem-double/2addr", F12x),
    /* 0xd0 */ plain("add-int/lit16", F22s),
    /* 0xd1 */ plain("rsub-int", F22s),
    /* 0xd2 */ plain("mul-int/lit16", F22s),
    /* 0xd3 */ plain("div-int/lit16", F22s),
    /* 0xd4 */ plain("rem-int/lit16", F22s),
    /* 0xd5 */ plain("and-int/lit16", F22s),
    /* 0xd6 */ plain("or-int/lit16", F22s),
    /* 0xd7 */ plain("xor-int/lit16", F22s),
    /* 0xd8 */ plain("add-int/lit8", F22b),
    /* 0xd9 */ plain("rsub-int/lit8", F22b),
    /* 0xda */ plain("mul-int/lit8", F22b),
    /* 0xdb */ plain("div-int/lit8", F22b),
    /* 0xdc */ plain("rem-int/lit8", F22b),
    /* 0xdd */ plain("and-int/lit8", F22b),
    /* 0xde */ plain("or-int/lit8", F22b),
    /* 0xdf */ plain("xor-int/lit8", F22b),
    /* 0xe0 */ plain("shl-int/lit8", F22b),
    /* 0xe1 */ plain("shr-int/lit8", F22b),
    /* 0xe2 */ plain("ushr-int/lit8", F22b),
    /* 0xe3 */ unused(),
    /* 0xe4 */ unused(),
    /* 0xe5 */ unused(),
    /* 0xe6 */ unused(),
    /* 0xe7 */ unused(),
    /* 0xe8 */ unused(),
    /* 0xe9 */ unused(),
    /* 0xea */ unused(),
    /* 0xeb */ unused(),
    /* 0xec */ unused(),
    /* 0xed */ unused(),
    /* 0xee */ unused(),
    /* 0xef */ unused(),
    /* 0xf0 */ unused(),
    /* 0xf1 */ unused(),
    /* 0xf2 */ unused(),
    /* 0xf3 */ unused(),
    /* 0xf4 */ unused(),
    /* 0xf5 */ unused(),
    /* 0xf6 */ unused(),
    /* 0xf7 */ unused(),
    /* 0xf8 */ unused(),
    /* 0xf9 */ unused(),
    /* 0xfa */ op("invoke-polymorphic", F45cc, MethodRef),
    /* 0xfb */ op("invoke-polymorphic/range", F4rcc, MethodRef),
    /* 0xfc */ op("invoke-custom", F35c, CallSiteRef),
    /* 0xfd */ op("invoke-custom/range", F3rc, CallSiteRef),
    /* 0xfe */ op("const-method-handle", F21c, MethodHandleRef),
    /* 0xff */ op("const-method-type", F21c, ProtoRef),
];

/// Lookup the descriptor of an opcode byte
#[inline]
pub fn info(opcode: u8) -> &'static OpcodeInfo {
    &OPCODES[opcode as usize]
}

/// Mnemonic of an opcode byte
#[inline]
pub fn name(opcode: u8) -> &'static str {
    OPCODES[opcode as usize].name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_spot_checks() {
        assert_eq!(name(0x0e), "return-void");
        assert_eq!(name(0x28), "goto");
        assert_eq!(name(0x6e), "invoke-virtual");
        assert_eq!(info(0x1a).index, IndexKind::StringRef);
        assert_eq!(info(0x22).index, IndexKind::TypeRef);
        assert_eq!(info(0x52).index, IndexKind::FieldRef);
        assert_eq!(info(0x74).format, Format::F3rc);
        assert_eq!(info(0x18).format.units(), 5);
        assert_eq!(info(0x00).format.units(), 1);
    }
}
