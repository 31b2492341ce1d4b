use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use gbalz::compress::decoder;
use gbalz::compress::encoder::{self, EncodeOptions};
use gbalz::format::header::Mode;
use gbalz::matching::finder::MatchFinder;
use std::fs;
use std::path::Path;

fn gen_data(size: usize, seed: u64) -> Vec<u8> {
    let mut s = seed;
    let mut out = Vec::with_capacity(size);
    for _ in 0..size {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        out.push((s >> 33) as u8);
    }
    out
}

/// Tile-like data: short runs from a small palette with repeated rows.
fn gen_tiles(size: usize, seed: u64) -> Vec<u8> {
    let noise = gen_data(size, seed);
    let mut out = Vec::with_capacity(size);
    let mut i = 0;
    while out.len() < size {
        let n = noise[i % noise.len()];
        if n < 64 && out.len() >= 32 {
            let start = out.len() - 32;
            let row: Vec<u8> = out[start..start + 32].to_vec();
            out.extend_from_slice(&row);
        } else {
            out.extend(std::iter::repeat_n(n & 0x0F, 1 + (n as usize >> 5)));
        }
        i += 1;
    }
    out.truncate(size);
    out
}

const MODES: [(&str, Mode, bool); 3] = [
    ("lz10", Mode::Lz10, false),
    ("lz11", Mode::Lz11, false),
    ("lz11_vram", Mode::Lz11, true),
];

fn write_ratio_snapshot() {
    let mut csv = String::from("workload,mode,packed_bytes,raw_bytes,ratio\n");
    for (workload, raw) in [
        ("random", gen_data(256 * 1024, 123)),
        ("tiles", gen_tiles(256 * 1024, 123)),
    ] {
        for (name, mode, vram_safe) in MODES {
            let packed = encoder::encode(&raw, EncodeOptions::new(mode, vram_safe)).unwrap();
            let ratio = packed.len() as f64 / raw.len() as f64;
            csv.push_str(&format!(
                "{workload},{name},{},{},{ratio}\n",
                packed.len(),
                raw.len()
            ));
        }
    }
    let out_dir = Path::new("target/criterion/custom_reports");
    let _ = fs::create_dir_all(out_dir);
    let _ = fs::write(out_dir.join("ratio_snapshot.csv"), csv);
}

fn bench_encoding_speed(c: &mut Criterion) {
    let mut g = c.benchmark_group("encoding_speed_mb_s");
    for size in [16 * 1024usize, 64 * 1024, 256 * 1024] {
        let raw = gen_tiles(size, 1);
        g.throughput(Throughput::Bytes(size as u64));
        for (name, mode, vram_safe) in MODES {
            g.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    let packed =
                        encoder::encode(black_box(&raw), EncodeOptions::new(mode, vram_safe))
                            .unwrap();
                    black_box(packed);
                });
            });
        }
    }
    g.finish();
}

fn bench_decoding_speed(c: &mut Criterion) {
    let mut g = c.benchmark_group("decoding_speed_mb_s");
    for size in [64 * 1024usize, 1024 * 1024] {
        let raw = gen_tiles(size, 2);
        g.throughput(Throughput::Bytes(size as u64));
        for (name, mode, vram_safe) in MODES {
            let packed = encoder::encode(&raw, EncodeOptions::new(mode, vram_safe)).unwrap();
            g.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    let out = decoder::decode(black_box(&packed), false).unwrap();
                    black_box(out);
                });
            });
        }
    }
    g.finish();
}

fn bench_ratio_vs_mode(c: &mut Criterion) {
    write_ratio_snapshot();
    let mut g = c.benchmark_group("compression_ratio_vs_mode");
    let raw = gen_tiles(64 * 1024, 3);
    for (name, mode, vram_safe) in MODES {
        g.bench_function(name, |b| {
            b.iter(|| {
                let packed = encoder::encode(&raw, EncodeOptions::new(mode, vram_safe)).unwrap();
                let ratio = packed.len() as f64 / raw.len() as f64;
                black_box(ratio);
            });
        });
    }
    g.finish();
}

fn bench_match_finder(c: &mut Criterion) {
    let mut g = c.benchmark_group("match_finder_window");
    // Worst case for the backward scan: every window byte matches the first
    // needle byte.
    for (name, raw) in [
        ("random", gen_data(8192, 4)),
        ("uniform_pairs", [0u8, 1].repeat(4096)),
    ] {
        let finder = MatchFinder::new(Mode::Lz11, true);
        g.bench_function(name, |b| {
            b.iter(|| black_box(finder.best(black_box(&raw), 4096)));
        });
    }
    g.finish();
}

criterion_group!(
    benches,
    bench_encoding_speed,
    bench_decoding_speed,
    bench_ratio_vs_mode,
    bench_match_finder
);
criterion_main!(benches);
