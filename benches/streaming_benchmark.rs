use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use outfile_xlsx::converter::{Converter, StreamingConverter};
use outfile_xlsx::delimited::DelimitedWriter;
use std::path::Path;
use tempfile::TempDir;

/// Write a delimited file shaped like the engine's OUTFILE output
fn write_delimited(path: &Path, size: usize) {
    let mut writer = DelimitedWriter::create(path).unwrap();
    writer.write_record(["ID", "Name", "Value", "Note"]).unwrap();
    for i in 0..size {
        writer
            .write_record([
                i.to_string(),
                format!("Name_{}", i),
                format!("{}.25", i * 100),
                "quoted \"text\" with\ttab".to_string(),
            ])
            .unwrap();
    }
    writer.finish().unwrap();
}

fn benchmark_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");
    group.sample_size(10); // Reduce samples for large benchmarks

    for size in [100, 1000, 10000].iter() {
        // Prepare input once
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("input.csv");
        write_delimited(&input, *size);
        let output = dir.path().join("input.xlsx");
        let converter = StreamingConverter::default();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                converter.convert(black_box(&input), &output).unwrap();
            });
        });
    }

    group.finish();
}

fn benchmark_compression_levels(c: &mut Criterion) {
    use outfile_xlsx::fast_writer::WorkbookOptions;

    let mut group = c.benchmark_group("compression");
    group.sample_size(10);

    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.csv");
    write_delimited(&input, 5000);
    let output = dir.path().join("input.xlsx");

    for level in [1i64, 6, 9].iter() {
        let converter = StreamingConverter::new(WorkbookOptions {
            compression_level: *level,
            ..WorkbookOptions::default()
        });

        group.bench_with_input(BenchmarkId::from_parameter(level), level, |b, _| {
            b.iter(|| {
                converter.convert(&input, &output).unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_convert, benchmark_compression_levels);
criterion_main!(benches);
