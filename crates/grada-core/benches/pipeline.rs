use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use grada_core::settings::{ToneMapAlgorithm, ToneMapping, Vignette};
use grada_core::{CancelToken, ColorGradingSettings, CpuBackend, ImageBuf, KernelParams, Lut3d, RenderBackend};

fn test_image(width: u32, height: u32) -> ImageBuf {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            data.push((x * 255 / width) as u8);
            data.push((y * 255 / height) as u8);
            data.push(((x + y) * 255 / (width + height)) as u8);
            data.push(255);
        }
    }
    ImageBuf { width, height, data }
}

fn busy_settings() -> ColorGradingSettings {
    ColorGradingSettings {
        exposure: 0.3,
        contrast: 0.2,
        temperature: 6500.0,
        saturation: 0.1,
        vibrance: 0.25,
        clarity: 0.2,
        vignette: Vignette {
            amount: 0.4,
            ..Default::default()
        },
        tone_mapping: ToneMapping {
            algorithm: ToneMapAlgorithm::Aces,
            ..Default::default()
        },
        lut: Some(grada_core::settings::LutSettings::new("bench", 0.8)),
        ..Default::default()
    }
}

fn bench_cpu_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_render");
    let lut = Arc::new(Lut3d::from_fn(33, |c| [c[0] * 0.9 + 0.05, c[1], c[2] * 0.95]).unwrap());
    let settings = busy_settings();

    for size in [256u32, 1024, 2048] {
        group.throughput(Throughput::Elements(size as u64 * size as u64));
        let src = test_image(size, size);
        let params = KernelParams::new(&settings, size, size, Some(lut.clone()));
        let mut backend = CpuBackend::new();
        let cancel = CancelToken::new();

        group.bench_with_input(
            BenchmarkId::new("full_kernel", format!("{size}x{size}")),
            &src,
            |b, src| {
                b.iter(|| backend.render(black_box(src), black_box(&params), &cancel).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_preview_resample(c: &mut Criterion) {
    let src = test_image(2048, 1536);
    c.bench_function("resize_bilinear_quarter", |b| {
        b.iter(|| black_box(&src).scaled(0.25));
    });
}

criterion_group!(benches, bench_cpu_render, bench_preview_resample);
criterion_main!(benches);
