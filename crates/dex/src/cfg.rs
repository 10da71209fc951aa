//! Basic-block partitioning of a decoded method body.

use std::collections::BTreeSet;

use crate::code::{LirInstruction, MethodBody, Operand};

/// A maximal straight-line run of the instruction stream.
///
/// `region` holds the inclusive first/last indices into
/// [`MethodBody::instructions`].
#[derive(Debug, PartialEq, Eq)]
pub struct BasicBlock {
    pub id: u32,
    pub region: (usize, usize),
}

/// Ordered partition of a method body into basic blocks.
///
/// Compact graphs track only fall-through and explicit branches; verbose
/// graphs also split at try-region boundaries and handler entries.
#[derive(Debug)]
pub struct ControlFlowGraph {
    pub basic_blocks: Vec<BasicBlock>,
}

impl ControlFlowGraph {
    pub fn compact(body: &MethodBody) -> ControlFlowGraph {
        Self::build(body, false)
    }

    pub fn verbose(body: &MethodBody) -> ControlFlowGraph {
        Self::build(body, true)
    }

    fn build(body: &MethodBody, verbose: bool) -> ControlFlowGraph {
        let mut branch_targets: BTreeSet<u32> = BTreeSet::new();
        let mut handler_targets: BTreeSet<u32> = BTreeSet::new();

        for instruction in &body.instructions {
            match instruction {
                LirInstruction::Bytecode { operands, .. } => {
                    for operand in operands {
                        if let Operand::Target(id) = operand {
                            branch_targets.insert(*id);
                        }
                    }
                }
                LirInstruction::PackedSwitchPayload { targets, .. } => {
                    branch_targets.extend(targets.iter().copied());
                }
                LirInstruction::SparseSwitchPayload { cases, .. } => {
                    branch_targets.extend(cases.iter().map(|&(_, target)| target));
                }
                LirInstruction::TryEnd {
                    handlers,
                    catch_all,
                    ..
                } => {
                    handler_targets.extend(handlers.iter().map(|&(_, label)| label));
                    handler_targets.extend(catch_all.iter().copied());
                }
                _ => {}
            }
        }

        let starts_block = |instruction: &LirInstruction| -> bool {
            match instruction {
                LirInstruction::Label { id, .. } => {
                    branch_targets.contains(id) || (verbose && handler_targets.contains(id))
                }
                LirInstruction::TryBegin { .. } | LirInstruction::TryEnd { .. } => verbose,
                LirInstruction::PackedSwitchPayload { .. }
                | LirInstruction::SparseSwitchPayload { .. }
                | LirInstruction::ArrayData { .. } => true,
                _ => false,
            }
        };

        let ends_block = |instruction: &LirInstruction| -> bool {
            match instruction {
                LirInstruction::Bytecode { opcode, .. } => Self::is_terminator(*opcode),
                LirInstruction::PackedSwitchPayload { .. }
                | LirInstruction::SparseSwitchPayload { .. }
                | LirInstruction::ArrayData { .. } => true,
                _ => false,
            }
        };

        let mut basic_blocks = Vec::new();
        let mut next_id = 0u32;
        let mut start: Option<usize> = None;

        let mut close = |start: &mut Option<usize>, last: usize| {
            if let Some(first) = start.take() {
                basic_blocks.push(BasicBlock {
                    id: next_id,
                    region: (first, last),
                });
                next_id += 1;
            }
        };

        for (idx, instruction) in body.instructions.iter().enumerate() {
            if starts_block(instruction) && idx > 0 {
                close(&mut start, idx - 1);
            }
            if start.is_none() {
                start = Some(idx);
            }
            if ends_block(instruction) {
                close(&mut start, idx);
            }
        }
        let last = body.instructions.len();
        if last > 0 {
            close(&mut start, last - 1);
        }

        ControlFlowGraph { basic_blocks }
    }

    /// Instructions after which control does not fall through unconditionally
    fn is_terminator(opcode: u8) -> bool {
        matches!(opcode, 0x0e..=0x11 | 0x27 | 0x28..=0x2c | 0x32..=0x3d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::CodeItem;

    fn decode(insns: Vec<u16>) -> MethodBody {
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
    fn branch_and_fall_through_make_two_blocks() {
        // goto +1; return-void, the goto target being the return
        let body = decode(vec![0x0128, 0x000e]);
        let cfg = ControlFlowGraph::compact(&body);

        assert_eq!(cfg.basic_blocks.len(), 2);
        assert_eq!(cfg.basic_blocks[0].id, 0);
        assert_eq!(cfg.basic_blocks[1].id, 1);

        // the branch instruction closes block 0
        assert_eq!(cfg.basic_blocks[0].region, (0, 0));
        assert!(matches!(
            body.instructions[cfg.basic_blocks[0].region.1],
            LirInstruction::Bytecode { opcode: 0x28, .. }
        ));
    }

    #[test]
    fn blocks_partition_the_stream() {
        let body = decode(vec![0x0038, 0x0003, 0x1012, 0x000e, 0x000e]);
        let cfg = ControlFlowGraph::compact(&body);

        let mut covered = Vec::new();
        for block in &cfg.basic_blocks {
            assert!(block.region.0 <= block.region.1);
            for idx in block.region.0..=block.region.1 {
                covered.push(idx);
            }
        }

        let expected: Vec<usize> = (0..body.instructions.len()).collect();
        assert_eq!(covered, expected);
    }

    #[test]
    fn straight_line_code_is_one_block() {
        let body = decode(vec![0x0012, 0x1012, 0x000e]);
        let cfg = ControlFlowGraph::compact(&body);

        assert_eq!(cfg.basic_blocks.len(), 1);
        assert_eq!(cfg.basic_blocks[0].region, (0, 2));
    }
}
