//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Benchmarks for the telnet engine

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use mudlink_telnetcodec::{TelnetEngine, consts, escape_iac};
use std::hint::black_box;

// ============================================================================
// Helper Functions
// ============================================================================

fn engine() -> TelnetEngine {
    TelnetEngine::with_mud_handlers(Box::new(|label| label.eq_ignore_ascii_case("UTF-8")))
}

fn create_plain_text(size: usize) -> Vec<u8> {
    let text = "The quick brown kobold scurries past the fountain.\r\n";
    text.as_bytes().iter().cycle().take(size).copied().collect()
}

/// Plain text with a negotiation every 64 bytes, the shape of a busy
/// login sequence.
fn create_mixed_stream(size: usize) -> Vec<u8> {
    let mut stream = Vec::with_capacity(size);
    let text = create_plain_text(64);
    while stream.len() < size {
        stream.extend_from_slice(&[consts::IAC, consts::WILL, consts::option::ECHO]);
        stream.extend_from_slice(&[consts::IAC, consts::WONT, consts::option::ECHO]);
        stream.extend_from_slice(&text);
    }
    stream.truncate(size);
    stream
}

fn create_iac_heavy(size: usize) -> Vec<u8> {
    escape_iac(&vec![0xFF; size / 2]).to_vec()
}

// ============================================================================
// Stream Scanning Benchmarks
// ============================================================================

fn bench_process_plain_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_plain_text");

    for size in [1024usize, 16 * 1024, 64 * 1024] {
        let data = create_plain_text(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            let mut engine = engine();
            b.iter(|| {
                black_box(engine.process(black_box(data)));
            });
        });
    }

    group.finish();
}

fn bench_process_mixed_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_mixed_stream");

    for size in [1024usize, 16 * 1024] {
        let data = create_mixed_stream(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            let mut engine = engine();
            b.iter(|| {
                black_box(engine.process(black_box(data)));
            });
        });
    }

    group.finish();
}

fn bench_process_iac_heavy(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_iac_heavy");

    let size = 16 * 1024;
    let data = create_iac_heavy(size);
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
        let mut engine = engine();
        b.iter(|| {
            black_box(engine.process(black_box(data)));
        });
    });

    group.finish();
}

// ============================================================================
// Line Scanning Benchmarks
// ============================================================================

fn bench_scan_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan_line");

    let mut enabled = engine();
    enabled.process(&[consts::IAC, consts::WILL, consts::option::MSP]);

    let ordinary = b"The orc strikes you with a wicked blow.".to_vec();
    group.bench_with_input(
        BenchmarkId::from_parameter("ordinary"),
        &ordinary,
        |b, line| {
            b.iter(|| {
                black_box(enabled.scan_line(black_box(line)));
            });
        },
    );

    let trigger = b"!!SOUND(ouch.wav V=100 U=http://example.com/snd/)".to_vec();
    group.bench_with_input(
        BenchmarkId::from_parameter("sound_trigger"),
        &trigger,
        |b, line| {
            b.iter(|| {
                black_box(enabled.scan_line(black_box(line)));
            });
        },
    );

    group.finish();
}

// ============================================================================
// Output Escaping Benchmarks
// ============================================================================

fn bench_escape_iac(c: &mut Criterion) {
    let mut group = c.benchmark_group("escape_iac");

    for size in [64usize, 1024, 16 * 1024] {
        let data = create_plain_text(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| {
                black_box(escape_iac(black_box(data)));
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_process_plain_text,
    bench_process_mixed_stream,
    bench_process_iac_heavy,
    bench_scan_line,
    bench_escape_iac
);
criterion_main!(benches);
