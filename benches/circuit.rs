//! Benchmarks for circuit construction.
//!
//! - Decoding a long straight-line method
//! - Translating a chain of diamonds (many joins and selectors)
//! - Translating nested loops (deep dominator tree, header phis)
//! - Translating a batch of methods on the rayon pool

extern crate bytecircuit;

use bytecircuit::{
    assembly::{BytecodeAssembler, InstructionStream},
    metadata::{MethodBody, NoTypes, TryBlock},
    translate, translate_all, BuilderOptions,
};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

/// `v0 = v0 + v1` repeated, one block.
fn straight_line(ops: usize) -> MethodBody {
    let mut asm = BytecodeAssembler::new();
    asm.ldai(0).unwrap().sta(0).unwrap().ldai(1).unwrap().sta(1).unwrap();
    for _ in 0..ops {
        asm.lda(0).unwrap().add2(1).unwrap().sta(0).unwrap();
    }
    asm.lda(0).unwrap().ret().unwrap();
    MethodBody::new(asm.finish().unwrap(), 2, 0)
}

/// `n` diamonds in sequence, each reassigning v0 on both arms.
fn diamonds(n: usize) -> MethodBody {
    let mut asm = BytecodeAssembler::new();
    asm.ldai(0).unwrap().sta(0).unwrap();
    for i in 0..n {
        let other = format!("else{i}");
        let end = format!("end{i}");
        asm.lda(6)
            .unwrap()
            .jeqz(&other)
            .unwrap()
            .lda(0)
            .unwrap()
            .inc()
            .unwrap()
            .sta(0)
            .unwrap()
            .jmp(&end)
            .unwrap()
            .label(&other)
            .unwrap()
            .lda(0)
            .unwrap()
            .add2(6)
            .unwrap()
            .sta(0)
            .unwrap()
            .label(&end)
            .unwrap();
    }
    asm.lda(0).unwrap().ret().unwrap();
    MethodBody::new(asm.finish().unwrap(), 2, 1)
}

/// `depth` nested counting loops around a protected call.
fn nested_loops(depth: u16) -> MethodBody {
    let mut asm = BytecodeAssembler::new();
    for r in 0..depth {
        asm.ldai(0).unwrap().sta(r).unwrap();
    }
    let arg = depth + 4;
    for r in 0..depth {
        asm.label(&format!("head{r}"))
            .unwrap()
            .lda(r)
            .unwrap()
            .less(arg)
            .unwrap()
            .jeqz(&format!("exit{r}"))
            .unwrap();
    }
    let try_start = asm.current_pc();
    asm.lda(0).unwrap().callarg1(arg).unwrap().sta(0).unwrap();
    let try_end = asm.current_pc();
    for r in (0..depth).rev() {
        asm.lda(r)
            .unwrap()
            .inc()
            .unwrap()
            .sta(r)
            .unwrap()
            .jmp(&format!("head{r}"))
            .unwrap()
            .label(&format!("exit{r}"))
            .unwrap();
    }
    asm.lda(0).unwrap().ret().unwrap();
    let handler = asm.current_pc();
    asm.ret().unwrap();
    MethodBody::new(asm.finish().unwrap(), depth, 1)
        .with_try_block(TryBlock::new(try_start, try_end, vec![handler]))
}

fn bench_decode(c: &mut Criterion) {
    let method = straight_line(1000);
    c.bench_function("decode_straight_line_1000", |b| {
        b.iter(|| black_box(InstructionStream::decode(black_box(&method.code)).unwrap()));
    });
}

fn bench_translate_straight_line(c: &mut Criterion) {
    let method = straight_line(1000);
    c.bench_function("translate_straight_line_1000", |b| {
        b.iter(|| black_box(translate(black_box(&method)).unwrap()));
    });
}

fn bench_translate_diamonds(c: &mut Criterion) {
    let method = diamonds(200);
    c.bench_function("translate_diamonds_200", |b| {
        b.iter(|| black_box(translate(black_box(&method)).unwrap()));
    });
}

fn bench_translate_nested_loops(c: &mut Criterion) {
    let method = nested_loops(16);
    c.bench_function("translate_nested_loops_16", |b| {
        b.iter(|| black_box(translate(black_box(&method)).unwrap()));
    });
}

fn bench_translate_all(c: &mut Criterion) {
    let methods: Vec<MethodBody> = (1..=64).map(|n| diamonds(n % 16 + 1)).collect();
    let options = BuilderOptions::default();
    c.bench_function("translate_all_64", |b| {
        b.iter(|| black_box(translate_all(black_box(&methods), &NoTypes, &options)));
    });
}

criterion_group!(
    benches,
    bench_decode,
    bench_translate_straight_line,
    bench_translate_diamonds,
    bench_translate_nested_loops,
    bench_translate_all,
);
criterion_main!(benches);
