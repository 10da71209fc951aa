//! Method bodies: the on-disk `code_item` and its linear instruction
//! representation.
//!
//! Decoding runs in two passes. The first walks the 16-bit code units,
//! splitting instructions from switch/array payloads and collecting every
//! branch target, switch target and exception-handler address. The second
//! interleaves labels, try markers and debug annotations with the decoded
//! instructions, in code-unit order.

use std::collections::{BTreeMap, BTreeSet};

use log::warn;
use winnow::binary::{le_u16, le_u32};
use winnow::combinator::repeat;
use winnow::prelude::*;

use crate::errors::DexError;
use crate::leb;
use crate::opcodes::{self, Format, IndexKind};

pub const DBG_ADVANCE_PC: u8 = 0x01;
pub const DBG_ADVANCE_LINE: u8 = 0x02;
pub const DBG_START_LOCAL: u8 = 0x03;
pub const DBG_START_LOCAL_EXTENDED: u8 = 0x04;
pub const DBG_END_LOCAL: u8 = 0x05;
pub const DBG_RESTART_LOCAL: u8 = 0x06;
pub const DBG_SET_PROLOGUE_END: u8 = 0x07;
pub const DBG_SET_EPILOGUE_BEGIN: u8 = 0x08;
pub const DBG_SET_FILE: u8 = 0x09;
const DBG_FIRST_SPECIAL: u8 = 0x0a;
const DBG_LINE_RANGE: u32 = 15;

/// Parsed `code_item`
///
/// See: <https://source.android.com/docs/core/runtime/dex-format#code-item>
#[derive(Debug)]
pub struct CodeItem {
    /// Number of registers used by this code
    pub registers_size: u16,

    /// Number of words of incoming arguments
    pub ins_size: u16,

    /// Number of words of outgoing argument space
    pub outs_size: u16,

    /// Offset to the debug info sequence, 0 if there is none
    pub debug_info_off: u32,

    /// Bytecode, as 16-bit code units
    pub insns: Vec<u16>,

    pub tries: Vec<TryItem>,

    pub handlers: Vec<CatchHandler>,

    pub debug: Option<DebugInfo>,
}

#[derive(Debug)]
pub struct TryItem {
    /// First covered address, in code units
    pub start_addr: u32,

    /// Number of covered code units
    pub insn_count: u16,

    /// Offset into the handler list
    pub handler_off: u16,
}

#[derive(Debug)]
pub struct CatchHandler {
    /// Byte offset of this entry within the handler list, matched against
    /// [`TryItem::handler_off`]
    pub list_offset: u32,

    /// `(type index, handler address)` pairs
    pub pairs: Vec<(u32, u32)>,

    /// Address of the catch-all handler, if any
    pub catch_all_addr: Option<u32>,
}

#[derive(Debug)]
pub struct DebugInfo {
    pub line_start: u32,

    /// String indices of the parameter names, `None` for unnamed slots
    pub param_names: Vec<Option<u32>>,

    /// Positioned annotations, in increasing address order
    pub annotations: Vec<DebugAnnotation>,
}

#[derive(Debug)]
pub struct DebugAnnotation {
    /// Bytecode address the annotation refers to, in code units
    pub addr: u32,

    /// One of the `DBG_*` opcodes
    pub opcode: u8,

    pub reg: u32,
    pub name: Option<u32>,
    pub type_: Option<u32>,
    pub sig: Option<u32>,
}

impl CodeItem {
    pub fn parse(data: &[u8], offset: u32) -> Result<CodeItem, DexError> {
        let mut input = data
            .get(offset as usize..)
            .ok_or(DexError::CodeItemError(offset))?;

        let parse = |input: &mut &[u8]| -> ModalResult<CodeItem> {
            let (registers_size, ins_size, outs_size, tries_size) =
                (le_u16, le_u16, le_u16, le_u16).parse_next(input)?;
            let (debug_info_off, insns_size) = (le_u32, le_u32).parse_next(input)?;

            let insns: Vec<u16> = repeat(insns_size as usize, le_u16).parse_next(input)?;

            // two bytes of padding keep the tries four-byte aligned
            if tries_size > 0 && insns_size % 2 == 1 {
                let _ = le_u16.parse_next(input)?;
            }

            let tries: Vec<TryItem> = repeat(tries_size as usize, |input: &mut &[u8]| {
                let (start_addr, insn_count, handler_off) =
                    (le_u32, le_u16, le_u16).parse_next(input)?;
                Ok(TryItem {
                    start_addr,
                    insn_count,
                    handler_off,
                })
            })
            .parse_next(input)?;

            let mut handlers = Vec::new();
            if tries_size > 0 {
                let list_len_before = input.len();
                let list_size = leb::uleb128(input)?;

                for _ in 0..list_size {
                    let list_offset = (list_len_before - input.len()) as u32;
                    let size = leb::sleb128(input)?;

                    let mut pairs = Vec::new();
                    for _ in 0..size.unsigned_abs() {
                        let type_idx = leb::uleb128(input)? as u32;
                        let addr = leb::uleb128(input)? as u32;
                        pairs.push((type_idx, addr));
                    }

                    let catch_all_addr = if size <= 0 {
                        Some(leb::uleb128(input)? as u32)
                    } else {
                        None
                    };

                    handlers.push(CatchHandler {
                        list_offset,
                        pairs,
                        catch_all_addr,
                    });
                }
            }

            Ok(CodeItem {
                registers_size,
                ins_size,
                outs_size,
                debug_info_off,
                insns,
                tries,
                handlers,
                debug: None,
            })
        };

        let mut code = parse(&mut input).map_err(|_| DexError::CodeItemError(offset))?;

        if code.debug_info_off != 0 {
            // debug info is decoration; a broken sequence should not sink the method
            code.debug = DebugInfo::parse(data, code.debug_info_off);
            if code.debug.is_none() {
                warn!(
                    "skipping malformed debug info at {:#x}",
                    code.debug_info_off
                );
            }
        }

        Ok(code)
    }

    pub(crate) fn handler_at(&self, handler_off: u16) -> Option<&CatchHandler> {
        self.handlers
            .iter()
            .find(|handler| handler.list_offset == handler_off as u32)
    }
}

impl DebugInfo {
    /// Decode the `debug_info_item` state machine.
    ///
    /// Line bookkeeping (`DBG_ADVANCE_LINE`, `DBG_SET_FILE`) is consumed for
    /// address tracking but not retained.
    ///
    /// See: <https://source.android.com/docs/core/runtime/dex-format#debug-info-item>
    fn parse(data: &[u8], offset: u32) -> Option<DebugInfo> {
        let mut input = data.get(offset as usize..)?;

        let line_start = leb::uleb128(&mut input).ok()? as u32;
        let param_count = leb::uleb128(&mut input).ok()?;

        let mut param_names = Vec::new();
        for _ in 0..param_count {
            param_names.push(leb::uleb128p1(&mut input).ok()?);
        }

        let mut annotations = Vec::new();
        let mut addr = 0u32;

        loop {
            let opcode = *input.first()?;
            input = &input[1..];

            match opcode {
                0x00 => break,
                DBG_ADVANCE_PC => {
                    addr = addr.wrapping_add(leb::uleb128(&mut input).ok()? as u32);
                }
                DBG_ADVANCE_LINE => {
                    let _ = leb::sleb128(&mut input).ok()?;
                }
                DBG_START_LOCAL | DBG_START_LOCAL_EXTENDED => {
                    let reg = leb::uleb128(&mut input).ok()? as u32;
                    let name = leb::uleb128p1(&mut input).ok()?;
                    let type_ = leb::uleb128p1(&mut input).ok()?;
                    let sig = if opcode == DBG_START_LOCAL_EXTENDED {
                        leb::uleb128p1(&mut input).ok()?
                    } else {
                        None
                    };

                    annotations.push(DebugAnnotation {
                        addr,
                        opcode,
                        reg,
                        name,
                        type_,
                        sig,
                    });
                }
                DBG_END_LOCAL | DBG_RESTART_LOCAL => {
                    let reg = leb::uleb128(&mut input).ok()? as u32;
                    annotations.push(DebugAnnotation {
                        addr,
                        opcode,
                        reg,
                        name: None,
                        type_: None,
                        sig: None,
                    });
                }
                DBG_SET_PROLOGUE_END | DBG_SET_EPILOGUE_BEGIN => {
                    annotations.push(DebugAnnotation {
                        addr,
                        opcode,
                        reg: 0,
                        name: None,
                        type_: None,
                        sig: None,
                    });
                }
                DBG_SET_FILE => {
                    let _ = leb::uleb128p1(&mut input).ok()?;
                }
                special => {
                    let adjusted = (special - DBG_FIRST_SPECIAL) as u32;
                    addr = addr.wrapping_add(adjusted / DBG_LINE_RANGE);
                }
            }
        }

        Some(DebugInfo {
            line_start,
            param_names,
            annotations,
        })
    }
}

/// One operand of a linear-IR instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    VReg(u16),
    VRegPair(u16),
    VRegList(Vec<u16>),
    VRegRange { base: u16, count: u16 },
    Const32(u32),
    Const64(u64),
    StringRef(u32),
    TypeRef(u32),
    FieldRef(u32),
    MethodRef(u32),
    /// A code location, by label id
    Target(u32),
    Line(u32),
}

/// One element of the linear instruction stream
#[derive(Debug)]
pub enum LirInstruction {
    Bytecode {
        /// Offset in code units
        offset: u32,
        opcode: u8,
        operands: Vec<Operand>,
    },
    Label {
        id: u32,
        /// Set when the labeled position must be four-byte aligned
        aligned: bool,
    },
    TryBegin {
        id: u32,
    },
    TryEnd {
        id: u32,
        /// `(type index, label id)` per typed handler
        handlers: Vec<(u32, u32)>,
        /// Label id of the catch-all handler
        catch_all: Option<u32>,
    },
    PackedSwitchPayload {
        offset: u32,
        first_key: i32,
        /// Label ids, one per consecutive key
        targets: Vec<u32>,
    },
    SparseSwitchPayload {
        offset: u32,
        /// `(key, label id)` pairs
        cases: Vec<(i32, u32)>,
    },
    ArrayData {
        offset: u32,
    },
    DbgHeader {
        /// String indices of parameter names
        param_names: Vec<Option<u32>>,
    },
    DbgAnnotation {
        opcode: u8,
        operands: Vec<Operand>,
    },
}

/// Decoded method body: a flat instruction stream with labels at every
/// branch target, switch target and handler address.
#[derive(Debug)]
pub struct MethodBody {
    pub instructions: Vec<LirInstruction>,
}

#[derive(Debug, Default)]
struct RawOp {
    opcode: u8,
    a: u16,
    b: u16,
    c: u16,
    index: u32,
    index2: u16,
    /// Literal value; sign extension applied at decode where the format
    /// calls for it
    literal: i64,
    /// Branch displacement in code units
    rel: i32,
    regs: Vec<u16>,
}

#[derive(Debug)]
enum RawUnit {
    Op(RawOp),
    Packed { first_key: i32, rel_targets: Vec<i32> },
    Sparse { keys: Vec<i32>, rel_targets: Vec<i32> },
    Array,
}

impl MethodBody {
    pub fn decode(code: &CodeItem) -> Result<MethodBody, DexError> {
        let raw = Self::decode_units(&code.insns)?;
        let end = code.insns.len() as u32;

        // every position something can jump to gets a label
        let mut label_offsets: BTreeSet<u32> = BTreeSet::new();
        let mut aligned_offsets: BTreeSet<u32> = BTreeSet::new();
        let mut payload_base: BTreeMap<u32, u32> = BTreeMap::new();

        for (offset, unit) in &raw {
            let RawUnit::Op(op) = unit else { continue };

            match opcodes::info(op.opcode).format {
                Format::F10t | Format::F20t | Format::F30t | Format::F21t | Format::F22t => {
                    label_offsets.insert(Self::branch_target(*offset, op.rel));
                }
                Format::F31t => {
                    let target = Self::branch_target(*offset, op.rel);
                    label_offsets.insert(target);
                    aligned_offsets.insert(target);
                    if matches!(op.opcode, 0x2b | 0x2c) {
                        payload_base.insert(target, *offset);
                    }
                }
                _ => {}
            }
        }

        for (offset, unit) in &raw {
            let rel_targets = match unit {
                RawUnit::Packed { rel_targets, .. } | RawUnit::Sparse { rel_targets, .. } => {
                    rel_targets
                }
                _ => continue,
            };
            if let Some(&base) = payload_base.get(offset) {
                for &rel in rel_targets {
                    label_offsets.insert(Self::branch_target(base, rel));
                }
            }
        }

        for try_item in &code.tries {
            if let Some(handler) = code.handler_at(try_item.handler_off) {
                for &(_, addr) in &handler.pairs {
                    label_offsets.insert(addr);
                }
                if let Some(addr) = handler.catch_all_addr {
                    label_offsets.insert(addr);
                }
            }
        }

        let labels: BTreeMap<u32, u32> = label_offsets
            .iter()
            .enumerate()
            .map(|(id, &offset)| (offset, id as u32))
            .collect();

        // try markers, keyed by boundary offset
        let mut try_begins: Vec<(u32, u32)> = Vec::new();
        let mut try_ends: Vec<(u32, u32)> = Vec::new();
        for (id, try_item) in code.tries.iter().enumerate() {
            try_begins.push((try_item.start_addr, id as u32));
            try_ends.push((
                try_item.start_addr + try_item.insn_count as u32,
                id as u32,
            ));
        }
        try_begins.sort_by_key(|&(offset, _)| offset);
        try_ends.sort_by_key(|&(offset, _)| offset);

        let annotations = code
            .debug
            .as_ref()
            .map(|debug| debug.annotations.as_slice())
            .unwrap_or_default();

        let mut instructions = Vec::new();

        if let Some(debug) = &code.debug {
            instructions.push(LirInstruction::DbgHeader {
                param_names: debug.param_names.clone(),
            });
        }

        let mut next_label = labels.iter().map(|(&off, &id)| (off, id)).peekable();
        let mut next_begin = try_begins.iter().copied().peekable();
        let mut next_end = try_ends.iter().copied().peekable();
        let mut next_annotation = annotations.iter().peekable();

        let mut emit_markers =
            |instructions: &mut Vec<LirInstruction>, up_to: u32| {
                while let Some((_, id)) = next_end.next_if(|&(offset, _)| offset <= up_to) {
                    let try_item = &code.tries[id as usize];
                    let (handlers, catch_all) = match code.handler_at(try_item.handler_off) {
                        Some(handler) => (
                            handler
                                .pairs
                                .iter()
                                .map(|&(type_idx, addr)| {
                                    (type_idx, labels.get(&addr).copied().unwrap_or(0))
                                })
                                .collect(),
                            handler
                                .catch_all_addr
                                .map(|addr| labels.get(&addr).copied().unwrap_or(0)),
                        ),
                        None => (Vec::new(), None),
                    };
                    instructions.push(LirInstruction::TryEnd {
                        id,
                        handlers,
                        catch_all,
                    });
                }

                while let Some((offset, id)) = next_label.next_if(|&(offset, _)| offset <= up_to) {
                    instructions.push(LirInstruction::Label {
                        id,
                        aligned: aligned_offsets.contains(&offset),
                    });
                }

                while let Some((_, id)) = next_begin.next_if(|&(offset, _)| offset <= up_to) {
                    instructions.push(LirInstruction::TryBegin { id });
                }

                while let Some(annotation) =
                    next_annotation.next_if(|annotation| annotation.addr <= up_to)
                {
                    instructions.push(LirInstruction::DbgAnnotation {
                        opcode: annotation.opcode,
                        operands: Self::annotation_operands(annotation),
                    });
                }
            };

        for (offset, unit) in &raw {
            emit_markers(&mut instructions, *offset);

            let instruction = match unit {
                RawUnit::Op(op) => LirInstruction::Bytecode {
                    offset: *offset,
                    opcode: op.opcode,
                    operands: Self::operands_for(op, *offset, &labels),
                },
                RawUnit::Packed {
                    first_key,
                    rel_targets,
                } => match payload_base.get(offset) {
                    Some(&base) => LirInstruction::PackedSwitchPayload {
                        offset: *offset,
                        first_key: *first_key,
                        targets: rel_targets
                            .iter()
                            .map(|&rel| {
                                labels
                                    .get(&Self::branch_target(base, rel))
                                    .copied()
                                    .unwrap_or(0)
                            })
                            .collect(),
                    },
                    None => {
                        warn!("switch payload at {offset} is not referenced");
                        LirInstruction::PackedSwitchPayload {
                            offset: *offset,
                            first_key: *first_key,
                            targets: Vec::new(),
                        }
                    }
                },
                RawUnit::Sparse { keys, rel_targets } => match payload_base.get(offset) {
                    Some(&base) => LirInstruction::SparseSwitchPayload {
                        offset: *offset,
                        cases: keys
                            .iter()
                            .zip(rel_targets)
                            .map(|(&key, &rel)| {
                                (
                                    key,
                                    labels
                                        .get(&Self::branch_target(base, rel))
                                        .copied()
                                        .unwrap_or(0),
                                )
                            })
                            .collect(),
                    },
                    None => {
                        warn!("switch payload at {offset} is not referenced");
                        LirInstruction::SparseSwitchPayload {
                            offset: *offset,
                            cases: Vec::new(),
                        }
                    }
                },
                RawUnit::Array => LirInstruction::ArrayData { offset: *offset },
            };

            instructions.push(instruction);
        }

        emit_markers(&mut instructions, end);

        Ok(MethodBody { instructions })
    }

    fn branch_target(offset: u32, rel: i32) -> u32 {
        (offset as i64 + rel as i64).max(0) as u32
    }

    fn decode_units(insns: &[u16]) -> Result<Vec<(u32, RawUnit)>, DexError> {
        let mut raw = Vec::new();
        let mut pos = 0usize;

        let unit_at = |pos: usize| -> Result<u16, DexError> {
            insns.get(pos).copied().ok_or(DexError::TruncatedBody)
        };
        let int_at = |pos: usize| -> Result<i32, DexError> {
            Ok((unit_at(pos)? as u32 | (unit_at(pos + 1)? as u32) << 16) as i32)
        };

        while pos < insns.len() {
            let unit = insns[pos];
            let opcode = (unit & 0xff) as u8;
            let hi = (unit >> 8) as u8;

            // pseudo-instructions hosting switch and array data
            if opcode == 0x00 && (1..=3).contains(&hi) {
                let (consumed, payload) = match hi {
                    0x01 => {
                        let size = unit_at(pos + 1)? as usize;
                        let first_key = int_at(pos + 2)?;
                        let mut rel_targets = Vec::with_capacity(size);
                        for i in 0..size {
                            rel_targets.push(int_at(pos + 4 + 2 * i)?);
                        }
                        (
                            size * 2 + 4,
                            RawUnit::Packed {
                                first_key,
                                rel_targets,
                            },
                        )
                    }
                    0x02 => {
                        let size = unit_at(pos + 1)? as usize;
                        let mut keys = Vec::with_capacity(size);
                        let mut rel_targets = Vec::with_capacity(size);
                        for i in 0..size {
                            keys.push(int_at(pos + 2 + 2 * i)?);
                        }
                        for i in 0..size {
                            rel_targets.push(int_at(pos + 2 + 2 * size + 2 * i)?);
                        }
                        (size * 4 + 2, RawUnit::Sparse { keys, rel_targets })
                    }
                    _ => {
                        let element_width = unit_at(pos + 1)? as usize;
                        let count = int_at(pos + 2)? as u32 as usize;
                        let data_units = (element_width * count).div_ceil(2);
                        // identity + width + count + data
                        (data_units + 4, RawUnit::Array)
                    }
                };

                if pos + consumed > insns.len() {
                    return Err(DexError::TruncatedBody);
                }
                raw.push((pos as u32, payload));
                pos += consumed;
                continue;
            }

            let info = opcodes::info(opcode);
            let units = info.format.units() as usize;
            if pos + units > insns.len() {
                return Err(DexError::TruncatedBody);
            }

            let mut op = RawOp {
                opcode,
                ..RawOp::default()
            };

            match info.format {
                Format::F10x => {}
                Format::F12x => {
                    op.a = (unit >> 8) & 0xf;
                    op.b = (unit >> 12) & 0xf;
                }
                Format::F11n => {
                    op.a = (unit >> 8) & 0xf;
                    // a nibble literal, sign extended
                    op.literal = (((unit >> 12) as i16) << 12 >> 12) as i64;
                }
                Format::F11x => op.a = (unit >> 8) & 0xff,
                Format::F10t => op.rel = ((unit >> 8) as u8) as i8 as i32,
                Format::F20t => op.rel = unit_at(pos + 1)? as i16 as i32,
                Format::F22x => {
                    op.a = (unit >> 8) & 0xff;
                    op.b = unit_at(pos + 1)?;
                }
                Format::F21t => {
                    op.a = (unit >> 8) & 0xff;
                    op.rel = unit_at(pos + 1)? as i16 as i32;
                }
                Format::F21s => {
                    op.a = (unit >> 8) & 0xff;
                    op.literal = unit_at(pos + 1)? as i16 as i64;
                }
                Format::F21h => {
                    op.a = (unit >> 8) & 0xff;
                    op.literal = unit_at(pos + 1)? as i64;
                }
                Format::F21c => {
                    op.a = (unit >> 8) & 0xff;
                    op.index = unit_at(pos + 1)? as u32;
                }
                Format::F23x => {
                    op.a = (unit >> 8) & 0xff;
                    let next = unit_at(pos + 1)?;
                    op.b = next & 0xff;
                    op.c = next >> 8;
                }
                Format::F22b => {
                    op.a = (unit >> 8) & 0xff;
                    let next = unit_at(pos + 1)?;
                    op.b = next & 0xff;
                    op.literal = ((next >> 8) as u8) as i8 as i64;
                }
                Format::F22t => {
                    op.a = (unit >> 8) & 0xf;
                    op.b = (unit >> 12) & 0xf;
                    op.rel = unit_at(pos + 1)? as i16 as i32;
                }
                Format::F22s => {
                    op.a = (unit >> 8) & 0xf;
                    op.b = (unit >> 12) & 0xf;
                    op.literal = unit_at(pos + 1)? as i16 as i64;
                }
                Format::F22c => {
                    op.a = (unit >> 8) & 0xf;
                    op.b = (unit >> 12) & 0xf;
                    op.index = unit_at(pos + 1)? as u32;
                }
                Format::F30t => op.rel = int_at(pos + 1)?,
                Format::F32x => {
                    op.a = unit_at(pos + 1)?;
                    op.b = unit_at(pos + 2)?;
                }
                Format::F31i => {
                    op.a = (unit >> 8) & 0xff;
                    op.literal = int_at(pos + 1)? as u32 as i64;
                }
                Format::F31t => {
                    op.a = (unit >> 8) & 0xff;
                    op.rel = int_at(pos + 1)?;
                }
                Format::F31c => {
                    op.a = (unit >> 8) & 0xff;
                    op.index = int_at(pos + 1)? as u32;
                }
                Format::F35c | Format::F45cc => {
                    let count = ((unit >> 12) & 0xf) as usize;
                    let g = (unit >> 8) & 0xf;
                    op.index = unit_at(pos + 1)? as u32;
                    let regs_unit = unit_at(pos + 2)?;
                    let candidates = [
                        regs_unit & 0xf,
                        (regs_unit >> 4) & 0xf,
                        (regs_unit >> 8) & 0xf,
                        (regs_unit >> 12) & 0xf,
                        g,
                    ];
                    op.regs = candidates.into_iter().take(count.min(5)).collect();
                    if info.format == Format::F45cc {
                        op.index2 = unit_at(pos + 3)?;
                    }
                }
                Format::F3rc | Format::F4rcc => {
                    op.a = (unit >> 8) & 0xff;
                    op.index = unit_at(pos + 1)? as u32;
                    op.b = unit_at(pos + 2)?;
                    if info.format == Format::F4rcc {
                        op.index2 = unit_at(pos + 3)?;
                    }
                }
                Format::F51l => {
                    op.a = (unit >> 8) & 0xff;
                    let low = int_at(pos + 1)? as u32 as u64;
                    let high = int_at(pos + 3)? as u32 as u64;
                    op.literal = (low | high << 32) as i64;
                }
            }

            raw.push((pos as u32, RawUnit::Op(op)));
            pos += units;
        }

        Ok(raw)
    }

    /// Opcodes whose first register names a 64-bit pair
    fn reg_a_wide(opcode: u8) -> bool {
        matches!(
            opcode,
            0x04..=0x06 | 0x0b | 0x10 | 0x16..=0x19 | 0x45 | 0x4c | 0x53 | 0x5a | 0x61 | 0x68
        )
    }

    /// Opcodes whose second register names a 64-bit pair
    fn reg_b_wide(opcode: u8) -> bool {
        matches!(opcode, 0x04..=0x06)
    }

    fn reg(number: u16, wide: bool) -> Operand {
        if wide {
            Operand::VRegPair(number)
        } else {
            Operand::VReg(number)
        }
    }

    fn ref_operand(kind: IndexKind, index: u32) -> Operand {
        match kind {
            IndexKind::StringRef => Operand::StringRef(index),
            IndexKind::TypeRef => Operand::TypeRef(index),
            IndexKind::FieldRef => Operand::FieldRef(index),
            IndexKind::MethodRef => Operand::MethodRef(index),
            _ => Operand::Const32(index),
        }
    }

    fn operands_for(op: &RawOp, offset: u32, labels: &BTreeMap<u32, u32>) -> Vec<Operand> {
        let info = opcodes::info(op.opcode);
        let wide_a = Self::reg_a_wide(op.opcode);
        let wide_b = Self::reg_b_wide(op.opcode);

        let target = |rel: i32| -> Operand {
            let target_offset = Self::branch_target(offset, rel);
            Operand::Target(labels.get(&target_offset).copied().unwrap_or(0))
        };

        match info.format {
            Format::F10x => Vec::new(),
            Format::F12x => vec![Self::reg(op.a, wide_a), Self::reg(op.b, wide_b)],
            Format::F11n => vec![
                Operand::VReg(op.a),
                Operand::Const32(op.literal as i32 as u32),
            ],
            Format::F11x => vec![Self::reg(op.a, wide_a)],
            Format::F10t | Format::F20t | Format::F30t => vec![target(op.rel)],
            Format::F22x => vec![Self::reg(op.a, wide_a), Self::reg(op.b, wide_a)],
            Format::F21t => vec![Operand::VReg(op.a), target(op.rel)],
            Format::F21s => {
                if wide_a {
                    vec![Operand::VRegPair(op.a), Operand::Const64(op.literal as u64)]
                } else {
                    vec![
                        Operand::VReg(op.a),
                        Operand::Const32(op.literal as i32 as u32),
                    ]
                }
            }
            Format::F21h => {
                if wide_a {
                    vec![
                        Operand::VRegPair(op.a),
                        Operand::Const64((op.literal as u64) << 48),
                    ]
                } else {
                    vec![
                        Operand::VReg(op.a),
                        Operand::Const32((op.literal as u32) << 16),
                    ]
                }
            }
            Format::F21c => vec![
                Self::reg(op.a, wide_a),
                Self::ref_operand(info.index, op.index),
            ],
            Format::F23x => vec![
                Self::reg(op.a, wide_a),
                Operand::VReg(op.b),
                Operand::VReg(op.c),
            ],
            Format::F22b => vec![
                Operand::VReg(op.a),
                Operand::VReg(op.b),
                Operand::Const32(op.literal as i32 as u32),
            ],
            Format::F22t => vec![Operand::VReg(op.a), Operand::VReg(op.b), target(op.rel)],
            Format::F22s => vec![
                Operand::VReg(op.a),
                Operand::VReg(op.b),
                Operand::Const32(op.literal as i32 as u32),
            ],
            Format::F22c => vec![
                Self::reg(op.a, wide_a),
                Operand::VReg(op.b),
                Self::ref_operand(info.index, op.index),
            ],
            Format::F32x => vec![Self::reg(op.a, wide_a), Self::reg(op.b, wide_a)],
            Format::F31i => {
                if wide_a {
                    vec![
                        Operand::VRegPair(op.a),
                        Operand::Const64(op.literal as u32 as i32 as i64 as u64),
                    ]
                } else {
                    vec![Operand::VReg(op.a), Operand::Const32(op.literal as u32)]
                }
            }
            Format::F31t => vec![Operand::VReg(op.a), target(op.rel)],
            Format::F31c => vec![Operand::VReg(op.a), Operand::StringRef(op.index)],
            Format::F35c => vec![
                Operand::VRegList(op.regs.clone()),
                Self::ref_operand(info.index, op.index),
            ],
            Format::F3rc => vec![
                Operand::VRegRange {
                    base: op.b,
                    count: op.a,
                },
                Self::ref_operand(info.index, op.index),
            ],
            Format::F45cc => vec![
                Operand::VRegList(op.regs.clone()),
                Self::ref_operand(info.index, op.index),
                Operand::Const32(op.index2 as u32),
            ],
            Format::F4rcc => vec![
                Operand::VRegRange {
                    base: op.b,
                    count: op.a,
                },
                Self::ref_operand(info.index, op.index),
                Operand::Const32(op.index2 as u32),
            ],
            Format::F51l => vec![
                Operand::VRegPair(op.a),
                Operand::Const64(op.literal as u64),
            ],
        }
    }

    fn annotation_operands(annotation: &DebugAnnotation) -> Vec<Operand> {
        match annotation.opcode {
            DBG_START_LOCAL | DBG_START_LOCAL_EXTENDED => {
                let mut operands = vec![
                    Operand::VReg(annotation.reg as u16),
                    Operand::StringRef(annotation.name.unwrap_or(u32::MAX)),
                    Operand::TypeRef(annotation.type_.unwrap_or(u32::MAX)),
                ];
                if annotation.opcode == DBG_START_LOCAL_EXTENDED {
                    operands.push(Operand::StringRef(annotation.sig.unwrap_or(u32::MAX)));
                }
                operands
            }
            DBG_END_LOCAL | DBG_RESTART_LOCAL => vec![Operand::VReg(annotation.reg as u16)],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_of(insns: Vec<u16>) -> MethodBody {
        let code = CodeItem {
            registers_size: 1,
            ins_size: 1,
            outs_size: 0,
            debug_info_off: 0,
            insns,
            tries: Vec::new(),
            handlers: Vec::new(),
            debug: None,
        };
        MethodBody::decode(&code).unwrap()
    }

    #[test]
    fn decodes_return_void() {
        let body = body_of(vec![0x000e]);

        assert_eq!(body.instructions.len(), 1);
        assert!(matches!(
            body.instructions[0],
            LirInstruction::Bytecode {
                offset: 0,
                opcode: 0x0e,
                ..
            }
        ));
    }

    #[test]
    fn branch_gets_a_label() {
        // goto +1 followed by return-void
        let body = body_of(vec![0x0128, 0x000e]);

        assert!(matches!(
            body.instructions[0],
            LirInstruction::Bytecode { opcode: 0x28, .. }
        ));
        assert!(matches!(
            body.instructions[1],
            LirInstruction::Label { id: 0, .. }
        ));
        assert!(matches!(
            body.instructions[2],
            LirInstruction::Bytecode { opcode: 0x0e, .. }
        ));
    }

    #[test]
    fn every_code_location_resolves_to_a_label() {
        // if-eqz v0, +3; const/4 v0, #1; return-void; return-void
        let body = body_of(vec![0x0038, 0x0003, 0x1012, 0x000e, 0x000e]);

        let mut label_ids = Vec::new();
        let mut target_ids = Vec::new();
        for instruction in &body.instructions {
            match instruction {
                LirInstruction::Label { id, .. } => label_ids.push(*id),
                LirInstruction::Bytecode { operands, .. } => {
                    for operand in operands {
                        if let Operand::Target(id) = operand {
                            target_ids.push(*id);
                        }
                    }
                }
                _ => {}
            }
        }

        assert!(!target_ids.is_empty());
        for target in target_ids {
            assert!(label_ids.contains(&target));
        }
    }

    #[test]
    fn packed_switch_payload_resolves_targets() {
        // packed-switch v0 with payload at +4; two cases jumping to
        // the return-void instructions
        let insns = vec![
            0x002b, 0x0004, 0x0000, // packed-switch v0, +4
            0x000e, // return-void      (offset 3)
            0x0100, 0x0002, // payload ident, size = 2
            0x0000, 0x0000, // first_key = 0
            0x0003, 0x0000, // target: offset 0 + 3
            0x0003, 0x0000, // target: offset 0 + 3
        ];
        let body = body_of(insns);

        let payload = body
            .instructions
            .iter()
            .find_map(|instruction| match instruction {
                LirInstruction::PackedSwitchPayload {
                    first_key, targets, ..
                } => Some((*first_key, targets.clone())),
                _ => None,
            })
            .expect("payload decoded");

        assert_eq!(payload.0, 0);
        assert_eq!(payload.1.len(), 2);

        // the payload itself is labeled and aligned
        assert!(body.instructions.iter().any(|instruction| matches!(
            instruction,
            LirInstruction::Label { aligned: true, .. }
        )));
    }

    #[test]
    fn try_markers_bracket_the_covered_region() {
        // const/4 v0, #0; const/4 v0, #1; return-void, with a try over the
        // first two instructions and a catch-all at the return
        let code = CodeItem {
            registers_size: 1,
            ins_size: 1,
            outs_size: 0,
            debug_info_off: 0,
            insns: vec![0x0012, 0x1012, 0x000e],
            tries: vec![TryItem {
                start_addr: 0,
                insn_count: 2,
                handler_off: 1,
            }],
            handlers: vec![CatchHandler {
                list_offset: 1,
                pairs: Vec::new(),
                catch_all_addr: Some(2),
            }],
            debug: None,
        };

        let body = MethodBody::decode(&code).unwrap();

        let kinds: Vec<&'static str> = body
            .instructions
            .iter()
            .map(|instruction| match instruction {
                LirInstruction::TryBegin { .. } => "try_begin",
                LirInstruction::TryEnd { .. } => "try_end",
                LirInstruction::Label { .. } => "label",
                LirInstruction::Bytecode { .. } => "bytecode",
                _ => "other",
            })
            .collect();

        assert_eq!(
            kinds,
            vec![
                "try_begin",
                "bytecode",
                "bytecode",
                "try_end",
                "label",
                "bytecode"
            ]
        );

        let catch_all = body.instructions.iter().find_map(|i| match i {
            LirInstruction::TryEnd { catch_all, .. } => *catch_all,
            _ => None,
        });
        assert_eq!(catch_all, Some(0));
    }
}
