//! Black-box end-to-end scenarios: literal source in, literal bytes out,
//! through the public `Assembler::assemble_str` entry point only.

use asm8::Assembler;

fn assemble(source: &str) -> Vec<u8> {
    Assembler::new().assemble_str("t.asm", source).unwrap()
}

#[test]
fn immediate_load_and_return() {
    assert_eq!(assemble("ORG $8000\nLDA #$42\nRTS\n"), vec![0xA9, 0x42, 0x60]);
}

#[test]
fn zero_page_chosen_for_backward_reference_absolute_for_forward_literal() {
    let bytes = assemble("ORG $0000\nfoo: LDA foo\nLDA $1234\n");
    assert_eq!(bytes, vec![0xA5, 0x00, 0xAD, 0x34, 0x12]);
}

#[test]
fn branch_to_self_is_minus_two() {
    assert_eq!(assemble("ORG $8000\nstart: BNE start\n"), vec![0xD0, 0xFE]);
}

#[test]
fn if_else_endif_selects_one_branch() {
    let bytes = assemble("ORG $8000\nIF 1\n DB $AA\nELSE\n DB $BB\nENDIF\n DB $CC\n");
    assert_eq!(bytes, vec![0xAA, 0xCC]);
}

#[test]
fn macro_with_positional_argument_expands_twice() {
    let bytes = assemble("ORG $0000\nMACRO two x\n DB \\1\n DB \\1\nENDM\n two $77\n");
    assert_eq!(bytes, vec![0x77, 0x77]);
}

#[test]
fn rept_replays_body_three_times() {
    assert_eq!(assemble("ORG $1000\nREPT 3\n DB $90\nENDR\n"), vec![0x90, 0x90, 0x90]);
}

#[test]
fn unresolved_forward_reference_forces_exactly_one_extra_pass_and_converges() {
    let bytes = assemble("ORG $8000\nJMP target\nNOP\ntarget: RTS\n");
    assert_eq!(bytes, vec![0x4C, 0x04, 0x80, 0xEA, 0x60]);
}

#[test]
fn cyclic_equate_definition_fails() {
    let result = Assembler::new().assemble_str("t.asm", "A EQU B\nB EQU A\nORG $8000\nDB A\n");
    assert!(matches!(result, Err(asm8::AssemblyError::RecursiveEquate { .. })));
}

#[test]
fn relative_branch_at_exactly_positive_127_succeeds() {
    let mut source = String::from("ORG $8000\nBNE target\n");
    for _ in 0 .. 127 {
        source.push_str("NOP\n");
    }
    source.push_str("target: RTS\n");
    let bytes = assemble(&source);
    assert_eq!(bytes[0], 0xD0);
    assert_eq!(bytes[1], 127);
}

#[test]
fn relative_branch_at_exactly_negative_128_succeeds() {
    let mut source = String::from("ORG $8000\nstart:\n");
    for _ in 0 .. 126 {
        source.push_str("NOP\n");
    }
    source.push_str("BNE start\n");
    let bytes = assemble(&source);
    let last_two = &bytes[bytes.len() - 2 ..];
    assert_eq!(last_two, &[0xD0, 0x80]);
}

#[test]
fn relative_branch_one_past_positive_range_is_out_of_range() {
    let mut source = String::from("ORG $8000\nBNE target\n");
    for _ in 0 .. 128 {
        source.push_str("NOP\n");
    }
    source.push_str("target: RTS\n");
    let result = Assembler::new().assemble_str("t.asm", &source);
    assert!(matches!(result, Err(asm8::AssemblyError::OutOfRange { .. })));
}

#[test]
fn hex_directive_round_trips_exact_bytes() {
    assert_eq!(assemble("ORG $8000\nHEX 00 11 22 aa BB\n"), vec![0x00, 0x11, 0x22, 0xAA, 0xBB]);
}

#[test]
fn equate_expansion_is_idempotent_with_inlining_the_literal() {
    let via_equate = assemble("SCREEN EQU $0400\nORG $8000\nLDA SCREEN\n");
    let inlined = assemble("ORG $8000\nLDA $0400\n");
    assert_eq!(via_equate, inlined);
}

#[test]
fn reassembling_the_same_source_is_deterministic() {
    let source = "ORG $8000\nloop: INX\n CPX #$10\n BNE loop\n RTS\n";
    assert_eq!(assemble(source), assemble(source));
}

#[test]
fn anonymous_labels_resolve_forward_and_backward() {
    let bytes = assemble("ORG $8000\n-\n NOP\n BNE -\n BNE +\n NOP\n+\n RTS\n");
    // backward `-` targets the label right above; forward `+` targets the
    // one below, both within branch range.
    assert_eq!(bytes[0], 0xEA); // NOP after the backward anchor
    assert_eq!(bytes[1], 0xD0); // BNE opcode (backward branch)
    assert_eq!(bytes[3], 0xD0); // BNE opcode (forward branch)
}

#[test]
fn dsb_reserves_space_filled_with_the_configured_byte() {
    let bytes = assemble("ORG $8000\nFILLVALUE $EA\nDSB 4\n");
    assert_eq!(bytes, vec![0xEA, 0xEA, 0xEA, 0xEA]);
}

#[test]
fn align_pads_up_to_the_next_boundary() {
    let bytes = assemble("ORG $8001\nALIGN $10\nNOP\n");
    assert_eq!(bytes.len(), 0x10);
    assert_eq!(*bytes.last().unwrap(), 0xEA);
}
