//! Code generation for the scope-checked AST.
//!
//! Procedure bodies are compiled separately and collected ahead of the main
//! code; the program starts with a jump over them. A block's own code is the
//! pushes for its constants, an INC per variable, and then its statement.
//! Nonlocal accesses go through the static-link chain: PBP followed by one
//! PSI per level outward, then LOD/STO with the slot's offset past the link
//! words.

use pvm::constants::LINKS_SIZE;
use pvm::{Address, Instruction, Opcode};

use crate::ast::*;
use crate::code::{self, Code, CodeSeq};
use crate::label::Label;
use crate::symtab::IdKind;

/// Collects the bodies of compiled procedures and hands out their start
/// addresses. Address 1 is the first available slot; slot 0 is reserved for
/// the jump over the procedure code to the start of the main code.
struct ProcHolder {
    code: CodeSeq,
    next_addr: Address,
}

impl ProcHolder {
    fn new() -> ProcHolder {
        ProcHolder {
            code: Vec::new(),
            next_addr: 1,
        }
    }

    fn register(&mut self, body: CodeSeq) -> Address {
        let start = self.next_addr;
        self.next_addr += body.len() as Address;
        self.code.extend(body);
        start
    }

    /// All registered bodies behind the initial jump to the start of the
    /// main code, or nothing at all when no procedure was registered.
    fn code_for_all(self) -> CodeSeq {
        if self.code.is_empty() {
            return Vec::new();
        }
        let start_of_main = 1 + self.code.len() as i32;
        let mut seq = vec![Code::jmp(start_of_main)];
        seq.extend(self.code);
        seq
    }
}

/// Generates the whole program: the procedure bodies (if any), then the
/// main activation record's link words, the main block, and HLT.
pub fn gen_program(program: &Program) -> Vec<Instruction> {
    let mut procs = ProcHolder::new();

    let mut main = vec![Code::inc(LINKS_SIZE)];
    main.extend(gen_block(&mut procs, &program.block));
    main.push(Code::instr(Opcode::HLT, 0));

    let mut all = procs.code_for_all();
    all.extend(main);
    code::resolve(all)
}

fn gen_block(procs: &mut ProcHolder, block: &Block) -> CodeSeq {
    let mut seq = Vec::new();
    for cd in &block.consts {
        seq.push(Code::lit(cd.value));
    }
    for _ in &block.vars {
        seq.push(Code::inc(1));
    }
    for pd in &block.procs {
        gen_proc_decl(procs, pd);
    }
    seq.extend(gen_stmt(procs, &block.body));
    seq
}

fn gen_proc_decl(procs: &mut ProcHolder, pd: &ProcDecl) {
    let mut body = gen_block(procs, &pd.block);
    // drop the local slots before returning
    let data_size = (pd.block.consts.len() + pd.block.vars.len()) as i32;
    if data_size > 0 {
        body.push(Code::inc(-data_size));
    }
    body.push(Code::instr(Opcode::RTN, 0));
    let start = procs.register(body);
    pd.label.set(start);
}

fn gen_stmt(procs: &mut ProcHolder, stmt: &Stmt) -> CodeSeq {
    match stmt {
        Stmt::Assign { target, expr, .. } => {
            let (levels, offset) = data_address(target);
            let mut seq = code::compute_fp(levels);
            seq.extend(gen_expr(expr));
            seq.push(Code::sto(offset));
            seq
        }
        Stmt::Call { callee, .. } => vec![Code::cal(proc_label(callee))],
        Stmt::Begin { stmts, .. } => {
            let mut seq = Vec::new();
            for stmt in stmts {
                seq.extend(gen_stmt(procs, stmt));
            }
            seq
        }
        Stmt::If {
            cond,
            then_stmt,
            else_stmt,
            ..
        } => {
            // JPC skips the jump over the then-branch when the condition
            // holds; the then-branch ends by jumping over the else-branch.
            let then_code = gen_stmt(procs, then_stmt);
            let else_code = gen_stmt(procs, else_stmt);
            let then_len = then_code.len() as i32;
            let else_len = else_code.len() as i32;
            let mut seq = gen_cond(cond);
            seq.push(Code::jpc(2));
            seq.push(Code::jmp(then_len + 2));
            seq.extend(then_code);
            seq.push(Code::jmp(else_len + 1));
            seq.extend(else_code);
            seq
        }
        Stmt::While { cond, body, .. } => {
            let cond_code = gen_cond(cond);
            let body_code = gen_stmt(procs, body);
            let cond_len = cond_code.len() as i32;
            let body_len = body_code.len() as i32;
            let mut seq = cond_code;
            seq.push(Code::jpc(2));
            seq.push(Code::jmp(body_len + 2));
            seq.extend(body_code);
            // back to the first instruction of the condition
            seq.push(Code::jmp(-(body_len + cond_len + 2)));
            seq
        }
        Stmt::Read { target, .. } => {
            let (levels, offset) = data_address(target);
            let mut seq = code::compute_fp(levels);
            seq.push(Code::instr(Opcode::CHI, 0));
            seq.push(Code::sto(offset));
            seq
        }
        Stmt::Write { expr, .. } => {
            let mut seq = gen_expr(expr);
            seq.push(Code::instr(Opcode::CHO, 0));
            seq
        }
        Stmt::Skip { .. } => vec![Code::instr(Opcode::NOP, 0)],
    }
}

fn gen_cond(cond: &Cond) -> CodeSeq {
    match cond {
        Cond::Odd { expr, .. } => {
            let mut seq = gen_expr(expr);
            seq.push(Code::lit(2));
            seq.push(Code::instr(Opcode::MOD, 0));
            seq
        }
        Cond::Bin {
            left, op, right, ..
        } => {
            let mut seq = gen_expr(left);
            seq.extend(gen_expr(right));
            seq.push(Code::instr(rel_opcode(*op), 0));
            seq
        }
    }
}

fn gen_expr(expr: &Expr) -> CodeSeq {
    match expr {
        Expr::Number { value, .. } => vec![Code::lit(*value)],
        Expr::Ident(ident) => {
            let (levels, offset) = data_address(ident);
            let mut seq = code::compute_fp(levels);
            seq.push(Code::lod(offset));
            seq
        }
        Expr::Bin {
            left, op, right, ..
        } => {
            let mut seq = gen_expr(left);
            seq.extend(gen_expr(right));
            seq.push(Code::instr(arith_opcode(*op), 0));
            seq
        }
    }
}

fn rel_opcode(op: RelOp) -> Opcode {
    match op {
        RelOp::Eq => Opcode::EQL,
        RelOp::Neq => Opcode::NEQ,
        RelOp::Lt => Opcode::LSS,
        RelOp::Leq => Opcode::LEQ,
        RelOp::Gt => Opcode::GTR,
        RelOp::Geq => Opcode::GEQ,
    }
}

fn arith_opcode(op: ArithOp) -> Opcode {
    match op {
        ArithOp::Add => Opcode::ADD,
        ArithOp::Sub => Opcode::SUB,
        ArithOp::Mul => Opcode::MUL,
        ArithOp::Div => Opcode::DIV,
    }
}

/// The lexical address of a resolved constant or variable use.
fn data_address(ident: &Ident) -> (u32, u32) {
    let id_use = ident.id_use();
    let offset = match &id_use.attrs.kind {
        IdKind::Constant { offset } | IdKind::Variable { offset } => *offset,
        IdKind::Procedure { .. } => panic!(
            "internal error: procedure \"{}\" used as data",
            ident.name
        ),
    };
    (id_use.levels_outward, offset)
}

fn proc_label(ident: &Ident) -> &Label {
    match &ident.id_use().attrs.kind {
        IdKind::Procedure { label } => label,
        _ => panic!(
            "internal error: \"{}\" is called but is not a procedure",
            ident.name
        ),
    }
}
