//! Hand-assembled methods shared by the integration tests.

#![allow(dead_code)]

use bytecircuit::{
    assembly::BytecodeAssembler,
    metadata::{MethodBody, TryBlock},
    Result,
};

/// `v0 = 1; return v0` without any general operation.
pub fn straight_line() -> Result<MethodBody> {
    let mut asm = BytecodeAssembler::new();
    asm.ldai(1)?.sta(0)?.lda(0)?.ret()?;
    Ok(MethodBody::new(asm.finish()?, 1, 0))
}

/// `return a + a` for the single argument `a` in v6.
pub fn arithmetic() -> Result<MethodBody> {
    let mut asm = BytecodeAssembler::new();
    asm.lda(6)?.add2(6)?.ret()?;
    Ok(MethodBody::new(asm.finish()?, 2, 1))
}

/// `v0 = 1; if (a) v0 = 2; return v0`.
///
/// Blocks: B0 `[0000..0009]`, B1 `[000c..0011]`, B2 `[0013..0015]`.
pub fn conditional_assign() -> Result<MethodBody> {
    let mut asm = BytecodeAssembler::new();
    asm.ldai(1)?
        .sta(0)?
        .lda(6)?
        .jeqz("join")?
        .ldai(2)?
        .sta(0)?
        .label("join")?
        .lda(0)?
        .ret()?;
    Ok(MethodBody::new(asm.finish()?, 2, 1))
}

/// `if (a) v0 = 1 else v0 = 2; return v0`.
pub fn if_else() -> Result<MethodBody> {
    let mut asm = BytecodeAssembler::new();
    asm.lda(6)?
        .jeqz("else")?
        .ldai(1)?
        .sta(0)?
        .jmp("end")?
        .label("else")?
        .ldai(2)?
        .sta(0)?
        .label("end")?
        .lda(0)?
        .ret()?;
    Ok(MethodBody::new(asm.finish()?, 2, 1))
}

/// `v0 = 0; while (v0 < a) v0++; return v0` with `a` in v5.
///
/// Blocks: B0 preheader, B1 header, B2 body, B3 exit.
pub fn counting_loop() -> Result<MethodBody> {
    let mut asm = BytecodeAssembler::new();
    asm.ldai(0)?
        .sta(0)?
        .label("head")?
        .lda(0)?
        .less(5)?
        .jeqz("exit")?
        .lda(0)?
        .inc()?
        .sta(0)?
        .jmp("head")?
        .label("exit")?
        .lda(0)?
        .ret()?;
    Ok(MethodBody::new(asm.finish()?, 1, 1))
}

/// A loop whose header is the entry block: `do { a++ } while (a)`.
pub fn entry_loop() -> Result<MethodBody> {
    let mut asm = BytecodeAssembler::new();
    asm.label("head")?
        .lda(6)?
        .inc()?
        .sta(6)?
        .jnez("head")?
        .returnundefined()?;
    Ok(MethodBody::new(asm.finish()?, 2, 1))
}

/// `try { a(a) } catch (e) { return e }; return`.
///
/// The call at 0x0002 is the only protected instruction, the handler at
/// 0x0005 has no normal predecessor.
pub fn guarded_call() -> Result<MethodBody> {
    let mut asm = BytecodeAssembler::new();
    asm.lda(6)?
        .label("try")?
        .callarg1(6)?
        .label("try_end")?
        .ret()?
        .label("catch")?
        .ret()?;
    let (code, labels) = asm.finish_with_labels()?;
    let try_block = TryBlock::new(labels["try"], labels["try_end"], vec![labels["catch"]]);
    Ok(MethodBody::new(code, 2, 1).with_try_block(try_block))
}

/// Like [`guarded_call`] but the protected code jumps into the handler as well.
pub fn handler_with_jump() -> Result<MethodBody> {
    let mut asm = BytecodeAssembler::new();
    asm.lda(6)?
        .label("try")?
        .callarg1(6)?
        .label("try_end")?
        .jmp("catch")?
        .label("catch")?
        .ret()?;
    let (code, labels) = asm.finish_with_labels()?;
    let try_block = TryBlock::new(labels["try"], labels["try_end"], vec![labels["catch"]]);
    Ok(MethodBody::new(code, 2, 1).with_try_block(try_block))
}

/// Two nested try blocks starting at the same pc, each with its own handler.
pub fn nested_try() -> Result<MethodBody> {
    let mut asm = BytecodeAssembler::new();
    asm.lda(6)?
        .label("try")?
        .callarg1(6)?
        .label("inner_end")?
        .inc()?
        .label("outer_end")?
        .ret()?
        .label("inner")?
        .inc()?
        .ret()?
        .label("outer")?
        .ret()?;
    let (code, labels) = asm.finish_with_labels()?;
    Ok(MethodBody::new(code, 2, 1)
        .with_try_block(TryBlock::new(
            labels["try"],
            labels["inner_end"],
            vec![labels["inner"]],
        ))
        .with_try_block(TryBlock::new(
            labels["try"],
            labels["outer_end"],
            vec![labels["outer"]],
        )))
}

/// A throw inside a try block whose handler rethrows.
pub fn rethrow() -> Result<MethodBody> {
    let mut asm = BytecodeAssembler::new();
    asm.label("try")?
        .lda(6)?
        .throw()?
        .label("try_end")?
        .label("catch")?
        .throw()?;
    let (code, labels) = asm.finish_with_labels()?;
    let try_block = TryBlock::new(labels["try"], labels["try_end"], vec![labels["catch"]]);
    Ok(MethodBody::new(code, 2, 1).with_try_block(try_block))
}

/// Code after an unconditional return is never reached.
pub fn dead_tail() -> Result<MethodBody> {
    let mut asm = BytecodeAssembler::new();
    asm.lda(6)?.ret()?.ldai(3)?.inc()?.ret()?;
    Ok(MethodBody::new(asm.finish()?, 2, 1))
}

/// Every fixture, for properties that must hold for any method.
pub fn all() -> Result<Vec<MethodBody>> {
    Ok(vec![
        straight_line()?,
        arithmetic()?,
        conditional_assign()?,
        if_else()?,
        counting_loop()?,
        entry_loop()?,
        guarded_call()?,
        handler_with_jump()?,
        nested_try()?,
        rethrow()?,
        dead_tail()?,
    ])
}
