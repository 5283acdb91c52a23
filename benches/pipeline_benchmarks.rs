//! Performance benchmarks for the language pipeline.
//!
//! This benchmark suite measures each stage in isolation and end to end:
//! - Lexing: token throughput over operator- and literal-heavy input
//! - Parsing: statement lists, expression nests, speculative generics
//! - Evaluation: arithmetic loops and function call overhead

use calyx::{bootstrap, check, eval, parse, tokenize};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

/// A flat run of declaration and arithmetic statements.
fn statement_heavy(lines: usize) -> String {
    let mut source = String::new();
    for i in 0..lines {
        source.push_str(&format!("int v{i} = {i} * 3 + 1;\n"));
    }
    source
}

/// One deeply nested expression exercising the precedence splicer.
fn expression_heavy(terms: usize) -> String {
    let mut source = String::from("1");
    for i in 1..terms {
        let operator = match i % 4 {
            0 => "+",
            1 => "*",
            2 => "-",
            _ => "^",
        };
        source.push_str(&format!(" {operator} {}", i % 7 + 1));
    }
    source.push(';');
    source
}

/// Statements that force generic-type speculation and rewind.
fn speculation_heavy(lines: usize) -> String {
    let mut source = String::from("int list = 1; int item = 2;\n");
    for _ in 0..lines {
        source.push_str("list < item;\n");
    }
    source
}

fn lexer_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");

    let small = statement_heavy(50);
    group.throughput(Throughput::Bytes(small.len() as u64));
    group.bench_function("statements_50_lines", |b| {
        b.iter(|| tokenize(black_box(&small)).map(|t| t.len()));
    });

    let large = statement_heavy(1000);
    group.throughput(Throughput::Bytes(large.len() as u64));
    group.bench_function("statements_1000_lines", |b| {
        b.iter(|| tokenize(black_box(&large)).map(|t| t.len()));
    });

    let strings = "'hello\\tworld' + ```raw\\nbody``` + '\\x41\\u0042';\n".repeat(200);
    group.throughput(Throughput::Bytes(strings.len() as u64));
    group.bench_function("string_literals", |b| {
        b.iter(|| tokenize(black_box(&strings)).map(|t| t.len()));
    });

    group.finish();
}

fn parser_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");

    let statements = tokenize(&statement_heavy(500)).unwrap();
    group.bench_function("statements_500_lines", |b| {
        b.iter(|| parse(black_box(statements.clone())).map(|n| n.len()));
    });

    let expression = tokenize(&expression_heavy(400)).unwrap();
    group.bench_function("expression_400_terms", |b| {
        b.iter(|| parse(black_box(expression.clone())).map(|n| n.len()));
    });

    // Each statement here speculates a generic type and rewinds.
    let speculation = tokenize(&speculation_heavy(300)).unwrap();
    group.bench_function("speculation_rewind_300", |b| {
        b.iter(|| parse(black_box(speculation.clone())).map(|n| n.len()));
    });

    group.finish();
}

fn evaluation_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpreter");

    let arithmetic_loop = "int total = 0; \
                           for (int i = 0; i < 500; i += 1) { total += i * 2; } \
                           total;";
    group.bench_function("arithmetic_loop_500", |b| {
        b.iter(|| {
            let env = bootstrap();
            eval(black_box(arithmetic_loop), &env).map(|(object, _)| object)
        });
    });

    let call_overhead = "int double(int x) { return x * 2; } \
                         int total = 0; \
                         for (int i = 0; i < 200; i += 1) { total += double(i); } \
                         total;";
    group.bench_function("function_calls_200", |b| {
        b.iter(|| {
            let env = bootstrap();
            eval(black_box(call_overhead), &env).map(|(object, _)| object)
        });
    });

    group.finish();
}

fn pipeline_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");

    let source = statement_heavy(200);
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("full_pipeline_200_lines", |b| {
        b.iter(|| {
            let env = bootstrap();
            let nodes = check(parse(tokenize(black_box(&source)).unwrap()).unwrap()).unwrap();
            calyx::interpret(&nodes, &env).map(|(object, _)| object)
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    lexer_benchmarks,
    parser_benchmarks,
    evaluation_benchmarks,
    pipeline_benchmarks
);
criterion_main!(benches);
