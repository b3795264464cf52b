// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for payload decoding and status reply classification
// in the printgate-print crate.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use criterion::{Criterion, black_box, criterion_group, criterion_main};

use printgate_print::PayloadDecoder;
use printgate_print::probe::classify_response;

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// A typical receipt (~4 KiB of ESC/POS) sent as base64.
fn bench_decode_base64_receipt(c: &mut Criterion) {
    let receipt = vec![0x1bu8; 4 * 1024];
    let message = STANDARD.encode(&receipt);
    let decoder = PayloadDecoder::default();

    c.bench_function("decode base64 receipt (4 KiB)", |b| {
        b.iter(|| black_box(decoder.decode(black_box(&message))));
    });
}

/// Plain text takes the fallback path after base64 rejects it.
fn bench_decode_plain_text(c: &mut Criterion) {
    let message = "Table 4: 2x soup, 1x bread; paid by card.".repeat(20);
    let decoder = PayloadDecoder::default();

    c.bench_function("decode plain text fallback", |b| {
        b.iter(|| black_box(decoder.decode(black_box(&message))));
    });
}

fn bench_classify_response(c: &mut Criterion) {
    c.bench_function("classify_response (ready)", |b| {
        b.iter(|| black_box(classify_response(black_box(&[0x16]))));
    });
    c.bench_function("classify_response (paper out)", |b| {
        b.iter(|| black_box(classify_response(black_box(&[0x1e, 0x00]))));
    });
}

criterion_group!(
    benches,
    bench_decode_base64_receipt,
    bench_decode_plain_text,
    bench_classify_response,
);
criterion_main!(benches);
