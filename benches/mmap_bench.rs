use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mmap_engine::{AccessPattern, EngineFile, IoProfile, IoRequest, MmapEngine, Protection};
use std::fs;
use std::path::PathBuf;

const FILE_SIZE: u64 = 8 * 1024 * 1024;

// Simple helper to build a unique temp path per bench
fn tmp_path(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("mmap_engine_bench_{}_{}", name, std::process::id()));
    p
}

fn target_file(name: &str) -> (PathBuf, EngineFile) {
    let path = tmp_path(name);
    let _ = fs::remove_file(&path);
    let f = fs::File::create(&path).expect("create");
    f.set_len(FILE_SIZE).expect("set_len");
    drop(f);
    let file = EngineFile::open(&path, Protection::ReadWrite).expect("open");
    (path, file)
}

fn bench_window_hits(c: &mut Criterion) {
    let mut group = c.benchmark_group("window_hit");
    for &size in &[4_usize * 1024, 64 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("write", size), &size, |ben, &sz| {
            let (path, mut file) = target_file(&format!("hit_write_{}", sz));
            let engine = MmapEngine::builder().total_budget(FILE_SIZE).build().expect("engine");
            let mut req = IoRequest::write(0, vec![0xAB; sz], IoProfile::default());
            ben.iter(|| {
                engine.prepare(&mut file, &mut req).expect("prepare");
                engine.execute(&mut file, &mut req).expect("execute");
            });
            let _ = fs::remove_file(&path);
        });
        group.bench_with_input(BenchmarkId::new("read", size), &size, |ben, &sz| {
            let (path, mut file) = target_file(&format!("hit_read_{}", sz));
            let engine = MmapEngine::builder().total_budget(FILE_SIZE).build().expect("engine");
            let mut req = IoRequest::read(0, sz, IoProfile::default());
            ben.iter(|| {
                engine.prepare(&mut file, &mut req).expect("prepare");
                engine.execute(&mut file, &mut req).expect("execute");
                criterion::black_box(req.buf());
            });
            let _ = fs::remove_file(&path);
        });
    }
    group.finish();
}

fn bench_window_replacement(c: &mut Criterion) {
    let mut group = c.benchmark_group("window_replacement");
    for &window in &[64_u64 * 1024, 1024 * 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(window), &window, |ben, &win| {
            let (path, mut file) = target_file(&format!("replace_{}", win));
            let engine = MmapEngine::builder().total_budget(win).build().expect("engine");
            let profile = IoProfile {
                pattern: AccessPattern::Random,
                ..IoProfile::default()
            };
            // Alternate between two far-apart offsets so every request misses.
            let mut offsets = [0, FILE_SIZE / 2].into_iter().cycle();
            ben.iter(|| {
                let offset = offsets.next().unwrap_or(0);
                let mut req = IoRequest::read(offset, 4096, profile);
                engine.prepare(&mut file, &mut req).expect("prepare");
                engine.execute(&mut file, &mut req).expect("execute");
            });
            let _ = fs::remove_file(&path);
        });
    }
    group.finish();
}

fn bench_sync(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync");
    group.bench_function("dirty_window", |ben| {
        let (path, mut file) = target_file("sync_dirty");
        let engine = MmapEngine::builder().total_budget(1024 * 1024).build().expect("engine");
        let mut write = IoRequest::write(0, vec![0x5A; 4096], IoProfile::default());
        let mut sync = IoRequest::sync(IoProfile::default());
        ben.iter(|| {
            engine.prepare(&mut file, &mut write).expect("prepare");
            engine.execute(&mut file, &mut write).expect("write");
            engine.execute(&mut file, &mut sync).expect("sync");
        });
        let _ = fs::remove_file(&path);
    });
    group.finish();
}

criterion_group!(benches, bench_window_hits, bench_window_replacement, bench_sync);
criterion_main!(benches);
