use super::*;

fn sample_code() -> Vec<Instruction> {
    vec![
        Instruction::new(Opcode::INC, 3),
        Instruction::new(Opcode::INC, 1),
        Instruction::new(Opcode::PBP, 0),
        Instruction::new(Opcode::LIT, 3),
        Instruction::new(Opcode::STO, 3),
        Instruction::new(Opcode::JMP, -2),
        Instruction::new(Opcode::HLT, 0),
    ]
}

#[test]
fn write_read_roundtrip() {
    let code = sample_code();

    let mut buf = Vec::new();
    write(&mut buf, &code).unwrap();
    let read_back = read(&mut &buf[..]).unwrap();

    assert_eq!(code, read_back);
}

#[test]
fn write_read_file() {
    let path = "test.pcode";
    let code = sample_code();

    write_file(path, &code).unwrap();
    let read_back = read_file(path).unwrap();

    assert_eq!(code, read_back);

    std::fs::remove_file(path).unwrap();
}

#[test]
fn read_stops_at_bad_opcode() {
    let text = "1     5    \n1     6    \n99    0    \n1     7    \n";
    let code = read(&mut text.as_bytes()).unwrap();

    assert_eq!(
        code,
        vec![
            Instruction::new(Opcode::LIT, 5),
            Instruction::new(Opcode::LIT, 6),
        ]
    );
}

#[test]
fn read_stops_at_malformed_input() {
    let text = "1 5\n13 0\nnot a number\n1 6\n";
    let code = read(&mut text.as_bytes()).unwrap();

    assert_eq!(
        code,
        vec![
            Instruction::new(Opcode::LIT, 5),
            Instruction::new(Opcode::HLT, 0),
        ]
    );
}

#[test]
fn read_stops_at_incomplete_pair() {
    let text = "1 5\n13";
    let code = read(&mut text.as_bytes()).unwrap();

    assert_eq!(code, vec![Instruction::new(Opcode::LIT, 5)]);
}

#[test]
fn read_empty_input() {
    let code = read(&mut "".as_bytes()).unwrap();
    assert!(code.is_empty());
}
