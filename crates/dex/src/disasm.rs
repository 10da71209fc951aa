//! Formatting of decoded method bodies into a textual listing.

use std::io::{self, Write};

use crate::cfg::ControlFlowGraph;
use crate::code::{
    DBG_END_LOCAL, DBG_RESTART_LOCAL, DBG_SET_EPILOGUE_BEGIN, DBG_SET_PROLOGUE_END,
    DBG_START_LOCAL, DBG_START_LOCAL_EXTENDED, LirInstruction, MethodBody, Operand,
};
use crate::dex::Dex;
use crate::errors::DexError;
use crate::ir::{EncodedMethod, Ir};
use crate::opcodes;

/// The kind of control-flow overlay applied to a listing:
/// `None` - plain listing, `Compact` - non-exceptional flow only,
/// `Verbose` - exception edges modeled too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CfgType {
    #[default]
    None,
    Compact,
    Verbose,
}

/// A bytecode disassembler over the linear method IR.
pub struct Disassembler<'a> {
    dex: &'a Dex,
    cfg_type: CfgType,
}

impl<'a> Disassembler<'a> {
    pub fn new(dex: &'a Dex, cfg_type: CfgType) -> Disassembler<'a> {
        Disassembler { dex, cfg_type }
    }

    /// Print one method: a `method <signature>` header, the braced body,
    /// and block banners when a control-flow overlay is requested.
    pub fn dump_method(
        &self,
        method: &EncodedMethod,
        sink: &mut dyn Write,
    ) -> Result<(), DexError> {
        let ir = self.dex.ir()?;

        write!(
            sink,
            "\nmethod {}\n{{\n",
            ir.method_signature(method.method_idx)
        )?;

        if let Some(code) = &method.code {
            let body = MethodBody::decode(code)?;
            let cfg = match self.cfg_type {
                CfgType::None => None,
                CfgType::Compact => Some(ControlFlowGraph::compact(&body)),
                CfgType::Verbose => Some(ControlFlowGraph::verbose(&body)),
            };

            let mut printer = Printer {
                ir,
                cfg: cfg.as_ref(),
                current_block: 0,
            };
            printer.print_body(&body, sink)?;
        }

        writeln!(sink, "}}")?;
        Ok(())
    }
}

struct Printer<'a> {
    ir: &'a Ir,
    cfg: Option<&'a ControlFlowGraph>,
    current_block: usize,
}

impl<'a> Printer<'a> {
    fn print_body(&mut self, body: &MethodBody, sink: &mut dyn Write) -> io::Result<()> {
        for (idx, instruction) in body.instructions.iter().enumerate() {
            self.start_instruction(idx, sink)?;
            self.print_instruction(instruction, sink)?;
            self.end_instruction(idx, sink)?;
        }
        Ok(())
    }

    fn start_instruction(&self, idx: usize, sink: &mut dyn Write) -> io::Result<()> {
        let Some(cfg) = self.cfg else { return Ok(()) };
        let Some(block) = cfg.basic_blocks.get(self.current_block) else {
            return Ok(());
        };

        if idx == block.region.0 {
            writeln!(
                sink,
                "............................. begin block {} .............................",
                block.id
            )?;
        }
        Ok(())
    }

    fn end_instruction(&mut self, idx: usize, sink: &mut dyn Write) -> io::Result<()> {
        let Some(cfg) = self.cfg else { return Ok(()) };
        let Some(block) = cfg.basic_blocks.get(self.current_block) else {
            return Ok(());
        };

        if idx == block.region.1 {
            writeln!(
                sink,
                ".............................. end block {} ..............................",
                block.id
            )?;
            self.current_block += 1;
        }
        Ok(())
    }

    fn print_instruction(
        &mut self,
        instruction: &LirInstruction,
        sink: &mut dyn Write,
    ) -> io::Result<()> {
        match instruction {
            LirInstruction::Bytecode {
                offset,
                opcode,
                operands,
            } => {
                write!(sink, "\t{:5}| {}", offset, opcodes::name(*opcode))?;
                for (i, operand) in operands.iter().enumerate() {
                    write!(sink, "{}", if i == 0 { " " } else { ", " })?;
                    self.print_operand(operand, sink)?;
                }
                writeln!(sink)
            }
            LirInstruction::Label { id, aligned } => {
                writeln!(
                    sink,
                    "Label_{}:{}",
                    id,
                    if *aligned { " <aligned>" } else { "" }
                )
            }
            LirInstruction::TryBegin { id } => writeln!(sink, "\t.try_begin_{}", id),
            LirInstruction::TryEnd {
                id,
                handlers,
                catch_all,
            } => {
                writeln!(sink, "\t.try_end_{}", id)?;
                for (type_idx, label) in handlers {
                    writeln!(
                        sink,
                        "\t  catch({}) : Label_{}",
                        self.ir.type_decl(*type_idx),
                        label
                    )?;
                }
                if let Some(label) = catch_all {
                    writeln!(sink, "\t  catch(...) : Label_{}", label)?;
                }
                Ok(())
            }
            LirInstruction::PackedSwitchPayload {
                offset,
                first_key,
                targets,
            } => {
                writeln!(sink, "\t{:5}| packed-switch-payload", offset)?;
                let mut key = *first_key;
                for target in targets {
                    writeln!(sink, "\t\t{:5}: Label_{}", key, target)?;
                    key = key.wrapping_add(1);
                }
                Ok(())
            }
            LirInstruction::SparseSwitchPayload { offset, cases } => {
                writeln!(sink, "\t{:5}| sparse-switch-payload", offset)?;
                for (key, target) in cases {
                    writeln!(sink, "\t\t{:5}: Label_{}", key, target)?;
                }
                Ok(())
            }
            LirInstruction::ArrayData { offset } => {
                writeln!(sink, "\t{:5}| fill-array-data-payload", offset)
            }
            LirInstruction::DbgHeader { param_names } => {
                write!(sink, "\t.params")?;
                for (i, name) in param_names.iter().enumerate() {
                    write!(sink, "{}", if i == 0 { " " } else { ", " })?;
                    let resolved = name
                        .and_then(|idx| self.ir.string(idx))
                        .map(|s| s.as_ref())
                        .unwrap_or("?");
                    write!(sink, "\"{}\"", resolved)?;
                }
                writeln!(sink)
            }
            LirInstruction::DbgAnnotation { opcode, operands } => {
                let name = match *opcode {
                    DBG_START_LOCAL => ".local",
                    DBG_START_LOCAL_EXTENDED => ".local_ex",
                    DBG_END_LOCAL => ".end_local",
                    DBG_RESTART_LOCAL => ".restart_local",
                    DBG_SET_PROLOGUE_END => ".prologue_end",
                    DBG_SET_EPILOGUE_BEGIN => ".epilogue_begin",
                    _ => ".dbg_???",
                };
                write!(sink, "\t{}", name)?;
                for (i, operand) in operands.iter().enumerate() {
                    write!(sink, "{}", if i == 0 { " " } else { ", " })?;
                    self.print_operand(operand, sink)?;
                }
                writeln!(sink)
            }
        }
    }

    fn print_operand(&self, operand: &Operand, sink: &mut dyn Write) -> io::Result<()> {
        match operand {
            Operand::VReg(reg) => write!(sink, "v{}", reg),
            Operand::VRegPair(reg) => write!(sink, "v{}:v{}", reg, reg + 1),
            Operand::VRegList(regs) => {
                write!(sink, "{{")?;
                for (i, reg) in regs.iter().enumerate() {
                    write!(sink, "{}v{}", if i == 0 { "" } else { "," }, reg)?;
                }
                write!(sink, "}}")
            }
            Operand::VRegRange { base, count } => {
                if *count == 0 {
                    write!(sink, "{{}}")
                } else {
                    write!(sink, "{{v{}..v{}}}", base, base + count - 1)
                }
            }
            Operand::Const32(bits) => {
                write!(sink, "#{:+} (0x{:08x} | ", *bits as i32, bits)?;
                let float = f32::from_bits(*bits);
                if float.is_nan() {
                    write!(sink, "NaN)")
                } else {
                    write!(sink, "{})", fmt_float(float as f64))
                }
            }
            Operand::Const64(bits) => {
                write!(sink, "#{:+} (0x{:016x} | ", *bits as i64, bits)?;
                let double = f64::from_bits(*bits);
                if double.is_nan() {
                    write!(sink, "NaN)")
                } else {
                    write!(sink, "{})", fmt_float(double))
                }
            }
            Operand::StringRef(idx) => match self.ir.string(*idx) {
                Some(string) => write_escaped(sink, string),
                None => write!(sink, "<null>"),
            },
            Operand::TypeRef(idx) => {
                if self.ir.types.get(*idx as usize).is_some() {
                    write!(sink, "{}", self.ir.type_decl(*idx))
                } else {
                    write!(sink, "<null>")
                }
            }
            Operand::FieldRef(idx) => match self.ir.field(*idx) {
                Some(field) => {
                    write!(sink, "{}.{}", self.ir.type_decl(field.parent), field.name)
                }
                None => write!(sink, "<null>"),
            },
            Operand::MethodRef(idx) => match self.ir.method(*idx) {
                Some(_) => write!(sink, "{}", self.ir.method_signature(*idx)),
                None => write!(sink, "<null>"),
            },
            Operand::Target(label) => write!(sink, "Label_{}", label),
            Operand::Line(line) => write!(sink, "{}", line),
        }
    }
}

/// Shortest readable rendering of a float, scientific outside `%g`'s range
fn fmt_float(value: f64) -> String {
    if value == 0.0 {
        return "0".to_owned();
    }

    let magnitude = value.abs().log10().floor();
    if (-4.0..6.0).contains(&magnitude) {
        format!("{}", value)
    } else {
        format!("{:e}", value)
    }
}

/// Quote a constant-pool string with C-style escapes; bytes outside the
/// printable range become `\xHH`.
fn write_escaped(sink: &mut dyn Write, string: &str) -> io::Result<()> {
    write!(sink, "\"")?;
    for byte in string.bytes() {
        match byte {
            b'\\' => write!(sink, "\\\\")?,
            b'"' => write!(sink, "\\\"")?,
            b'\'' => write!(sink, "\\'")?,
            b'?' => write!(sink, "\\?")?,
            0x07 => write!(sink, "\\a")?,
            0x08 => write!(sink, "\\b")?,
            0x0c => write!(sink, "\\f")?,
            b'\n' => write!(sink, "\\n")?,
            b'\r' => write!(sink, "\\r")?,
            b'\t' => write!(sink, "\\t")?,
            0x0b => write!(sink, "\\v")?,
            0x20..=0x7e => write!(sink, "{}", byte as char)?,
            other => write!(sink, "\\x{:02x}", other)?,
        }
    }
    write!(sink, "\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn empty_ir() -> Ir {
        Ir {
            strings: vec![Rc::from("hello\n")],
            types: Vec::new(),
            protos: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    fn render(ir: &Ir, operand: Operand) -> String {
        let printer = Printer {
            ir,
            cfg: None,
            current_block: 0,
        };
        let mut out = Vec::new();
        printer.print_operand(&operand, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn registers_and_ranges() {
        let ir = empty_ir();

        assert_eq!(render(&ir, Operand::VReg(3)), "v3");
        assert_eq!(render(&ir, Operand::VRegPair(4)), "v4:v5");
        assert_eq!(render(&ir, Operand::VRegList(vec![0, 1, 2])), "{v0,v1,v2}");
        assert_eq!(
            render(&ir, Operand::VRegRange { base: 2, count: 3 }),
            "{v2..v4}"
        );
        assert_eq!(
            render(&ir, Operand::VRegRange { base: 5, count: 1 }),
            "{v5..v5}"
        );
        assert_eq!(render(&ir, Operand::VRegRange { base: 0, count: 0 }), "{}");
    }

    #[test]
    fn nan_constants_render_as_nan() {
        let ir = empty_ir();

        let rendered = render(&ir, Operand::Const32(f32::NAN.to_bits()));
        assert!(rendered.ends_with("| NaN)"), "got: {rendered}");

        // a negative-sign NaN bit pattern is still NaN
        let rendered = render(&ir, Operand::Const32(0xffc0_0000));
        assert!(rendered.ends_with("| NaN)"), "got: {rendered}");

        let rendered = render(&ir, Operand::Const64(f64::NAN.to_bits()));
        assert!(rendered.ends_with("| NaN)"), "got: {rendered}");
    }

    #[test]
    fn const32_shows_signed_hex_and_float() {
        let ir = empty_ir();

        let rendered = render(&ir, Operand::Const32(1));
        assert!(rendered.starts_with("#+1 (0x00000001 | "), "got: {rendered}");

        let rendered = render(&ir, Operand::Const32(u32::MAX));
        assert!(rendered.starts_with("#-1 (0xffffffff | "), "got: {rendered}");
    }

    #[test]
    fn strings_are_quoted_and_escaped() {
        let ir = empty_ir();

        assert_eq!(render(&ir, Operand::StringRef(0)), "\"hello\\n\"");
        assert_eq!(render(&ir, Operand::StringRef(9)), "<null>");
    }

    #[test]
    fn labels_and_lines() {
        let ir = empty_ir();

        assert_eq!(render(&ir, Operand::Target(7)), "Label_7");
        assert_eq!(render(&ir, Operand::Line(42)), "42");
    }
}
