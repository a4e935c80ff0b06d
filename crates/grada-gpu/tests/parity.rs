//! CPU/GPU agreement. Each test skips when the machine has no adapter.

use std::sync::Arc;

use grada_core::settings::{
    ColorWheelSettings, Curve, CurvePoint, LutSettings, ToneMapAlgorithm,
};
use grada_core::{
    CancelToken, ColorGradingSettings, CpuBackend, ImageBuf, KernelParams, Lut3d, RenderBackend,
};
use grada_gpu::GpuBackend;

/// Mean per-channel difference allowed between backends, in 8-bit steps.
const TOLERANCE: f64 = 1.5;

async fn gpu() -> Option<GpuBackend> {
    match GpuBackend::new().await {
        Ok(gpu) => Some(gpu),
        Err(e) => {
            eprintln!("skipping GPU test: {e:#}");
            None
        }
    }
}

fn gradient(width: u32, height: u32) -> ImageBuf {
    let mut img = ImageBuf::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let i = ((y * width + x) * 4) as usize;
            img.data[i] = (x * 255 / width.max(2).saturating_sub(1)).min(255) as u8;
            img.data[i + 1] = (y * 255 / height.max(2).saturating_sub(1)).min(255) as u8;
            img.data[i + 2] = ((x + y) * 7 % 256) as u8;
            img.data[i + 3] = 200;
        }
    }
    img
}

fn both(gpu: &mut GpuBackend, src: &ImageBuf, params: &KernelParams) -> (ImageBuf, ImageBuf) {
    let cancel = CancelToken::new();
    let cpu_out = CpuBackend::new().render(src, params, &cancel).unwrap();
    let gpu_out = gpu.render(src, params, &cancel).unwrap();
    (cpu_out, gpu_out)
}

fn assert_close(cpu: &ImageBuf, gpu: &ImageBuf) {
    let diff = cpu.mean_abs_diff(gpu).unwrap();
    assert!(diff <= TOLERANCE, "backends differ by {diff:.3} on average");
    // Alpha is copied through on both sides.
    for (a, b) in cpu.data.chunks_exact(4).zip(gpu.data.chunks_exact(4)) {
        assert_eq!(a[3], b[3]);
    }
}

#[tokio::test]
async fn neutral_settings_return_source_unchanged() {
    let Some(mut gpu) = gpu().await else { return };
    let src = gradient(64, 48);
    let params = KernelParams::new(&ColorGradingSettings::default(), 64, 48, None);
    let out = gpu.render(&src, &params, &CancelToken::new()).unwrap();
    assert_eq!(out, src);
}

#[tokio::test]
async fn basic_adjustments_match_cpu() {
    let Some(mut gpu) = gpu().await else { return };
    let src = gradient(96, 64);
    let settings = ColorGradingSettings {
        exposure: 0.5,
        contrast: 0.3,
        temperature: 7200.0,
        tint: -20.0,
        saturation: 0.4,
        hue: 25.0,
        lightness: -0.1,
        shadows: 0.4,
        highlights: -0.3,
        whites: 0.2,
        blacks: -0.2,
        vibrance: 0.5,
        ..Default::default()
    };
    let params = KernelParams::new(&settings, 96, 64, None);
    let (cpu, gpu) = both(&mut gpu, &src, &params);
    assert_close(&cpu, &gpu);
}

#[tokio::test]
async fn curves_wheels_and_presence_match_cpu() {
    let Some(mut gpu) = gpu().await else { return };
    let src = gradient(80, 80);
    let mut settings = ColorGradingSettings {
        clarity: 0.6,
        dehaze: 0.4,
        ..Default::default()
    };
    settings.tone_curve.midtones = Curve::from_points([
        CurvePoint::new(0.0, 0.0),
        CurvePoint::new(0.5, 0.62),
        CurvePoint::new(1.0, 1.0),
    ]);
    settings.color_wheels.shadows = ColorWheelSettings {
        hue: 210.0,
        saturation: 0.5,
        luminance: 0.0,
    };
    settings.color_wheels.highlights = ColorWheelSettings {
        hue: 35.0,
        saturation: 0.4,
        luminance: 0.1,
    };
    let params = KernelParams::new(&settings, 80, 80, None);
    let (cpu, gpu) = both(&mut gpu, &src, &params);
    assert_close(&cpu, &gpu);
}

#[tokio::test]
async fn vignette_and_tone_mapping_match_cpu() {
    let Some(mut gpu) = gpu().await else { return };
    let src = gradient(120, 60);
    for algorithm in [
        ToneMapAlgorithm::Reinhard,
        ToneMapAlgorithm::Aces,
        ToneMapAlgorithm::Uncharted2,
    ] {
        let mut settings = ColorGradingSettings {
            exposure: 1.0,
            ..Default::default()
        };
        settings.vignette.amount = 0.7;
        settings.vignette.roundness = 0.2;
        settings.tone_mapping.algorithm = algorithm;
        settings.tone_mapping.exposure = 0.5;
        let params = KernelParams::new(&settings, 120, 60, None);
        let (cpu, gpu) = both(&mut gpu, &src, &params);
        assert_close(&cpu, &gpu);
    }
}

#[tokio::test]
async fn lut_blend_matches_cpu_and_survives_table_swap() {
    let Some(mut gpu) = gpu().await else { return };
    let src = gradient(64, 64);
    let settings = ColorGradingSettings {
        lut: Some(LutSettings::new("warm", 0.75)),
        ..Default::default()
    };

    let warm = Arc::new(Lut3d::from_fn(17, |c| [c[0].sqrt(), c[1], c[2] * 0.8]).unwrap());
    let params = KernelParams::new(&settings, 64, 64, Some(warm));
    let (cpu, out) = both(&mut gpu, &src, &params);
    assert_close(&cpu, &out);

    // A different table under the same name must be re-uploaded.
    let cool = Arc::new(Lut3d::from_fn(17, |c| [c[0] * 0.7, c[1], c[2].sqrt()]).unwrap());
    let params = KernelParams::new(&settings, 64, 64, Some(cool));
    let (cpu, out) = both(&mut gpu, &src, &params);
    assert_close(&cpu, &out);
}

#[tokio::test]
async fn resizing_between_renders_reallocates_targets() {
    let Some(mut gpu) = gpu().await else { return };
    let settings = ColorGradingSettings {
        contrast: 0.5,
        ..Default::default()
    };
    for (w, h) in [(32, 32), (33, 17), (1, 1), (32, 32)] {
        let src = gradient(w, h);
        let params = KernelParams::new(&settings, w, h, None);
        let (cpu, out) = both(&mut gpu, &src, &params);
        assert_eq!((out.width, out.height), (w, h));
        assert_close(&cpu, &out);
    }
}

#[tokio::test]
async fn cancelled_token_aborts_render() {
    let Some(mut gpu) = gpu().await else { return };
    let src = gradient(16, 16);
    let settings = ColorGradingSettings {
        exposure: 1.0,
        ..Default::default()
    };
    let params = KernelParams::new(&settings, 16, 16, None);
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = gpu.render(&src, &params, &cancel).unwrap_err();
    assert!(err.downcast_ref::<grada_core::Cancelled>().is_some());
}

#[tokio::test]
async fn disposed_backend_refuses_work() {
    let Some(mut gpu) = gpu().await else { return };
    gpu.dispose();
    gpu.dispose();
    let src = gradient(4, 4);
    let settings = ColorGradingSettings {
        exposure: 1.0,
        ..Default::default()
    };
    let params = KernelParams::new(&settings, 4, 4, None);
    assert!(gpu.render(&src, &params, &CancelToken::new()).is_err());
}
