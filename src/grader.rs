use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::Instant;

use anyhow::Context;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tracing::{debug, error, info, warn};

use grada_core::preset::{ColorGradingPreset, PresetCategory, PresetLibrary};
use grada_core::{
    CancelToken, Cancelled, ColorGradingHistory, ColorGradingSettings, CpuBackend, ImageBuf,
    KernelParams, Lut3d, RenderBackend, SettingsPatch,
};
use grada_gpu::GpuBackend;

use crate::config::{BackendPreference, GraderConfig};
use crate::error::{GradeError, Result};
use crate::events::{GradingEvent, GradingObserver};
use crate::metrics::PerformanceMetrics;
use crate::preview::{self, PreviewQuality};

/// Output of one [`Grader::process_image`] call.
#[derive(Clone, Debug)]
pub struct ProcessedImage {
    /// Graded image at the source's dimensions.
    pub image: Arc<ImageBuf>,
    pub metrics: PerformanceMetrics,
    /// Compare with [`Grader::is_current`] to drop superseded results.
    pub generation: u64,
    /// Backend that produced the pixels ("gpu" or "cpu").
    pub backend: &'static str,
    /// Resolution factor the image was graded at.
    pub scale: f32,
}

/// The GPU backend when it initialized, and the CPU backend always.
struct Backends {
    gpu: Option<GpuBackend>,
    cpu: CpuBackend,
}

impl Backends {
    /// Render on the GPU if present. A GPU failure other than
    /// cancellation is retried once on the CPU.
    fn render(
        &mut self,
        src: &ImageBuf,
        params: &KernelParams,
        cancel: &CancelToken,
    ) -> anyhow::Result<(ImageBuf, &'static str)> {
        if let Some(gpu) = self.gpu.as_mut() {
            match gpu.render(src, params, cancel) {
                Ok(out) => return Ok((out, gpu.name())),
                Err(err) if err.downcast_ref::<Cancelled>().is_some() => return Err(err),
                Err(err) => warn!(error = %format!("{err:#}"), "GPU render failed, retrying on CPU"),
            }
        }
        let out = self.cpu.render(src, params, cancel)?;
        Ok((out, self.cpu.name()))
    }

    fn dispose(&mut self) {
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.dispose();
        }
        self.cpu.dispose();
    }
}

/// Mutable per-session state behind one lock.
struct Session {
    history: ColorGradingHistory,
    presets: PresetLibrary,
    luts: HashMap<String, Arc<Lut3d>>,
    quality: PreviewQuality,
    last_metrics: Option<PerformanceMetrics>,
    in_flight: Option<CancelToken>,
}

/// Clears the busy flag when a render ends, however it ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct Rendered {
    image: ImageBuf,
    backend: &'static str,
    metrics: PerformanceMetrics,
}

/// One interactive grading session.
///
/// Owns the settings history, the preset library, registered LUTs and
/// the execution backends. Every method takes `&self`, so a grader can be
/// shared behind an `Arc` between input handling and rendering. At most
/// one render runs at a time; an overlapping call is rejected with
/// [`GradeError::Busy`].
pub struct Grader {
    config: GraderConfig,
    session: Mutex<Session>,
    backends: Arc<Mutex<Backends>>,
    supports_gpu: bool,
    observers: Mutex<Vec<Arc<dyn GradingObserver>>>,
    busy: AtomicBool,
    generation: AtomicU64,
    disposed: Arc<AtomicBool>,
}

impl Grader {
    /// Build a grader, initializing the GPU unless the config asks for
    /// the CPU. A GPU that fails to come up is logged and skipped.
    pub async fn new(config: GraderConfig) -> Self {
        let gpu = match config.backend {
            BackendPreference::Cpu => None,
            preference => match GpuBackend::new().await {
                Ok(gpu) => Some(gpu),
                Err(err) => {
                    if preference == BackendPreference::Gpu {
                        warn!(error = %format!("{err:#}"), "requested GPU backend is unavailable, using CPU");
                    } else {
                        warn!(error = %format!("{err:#}"), "no usable GPU, using CPU backend");
                    }
                    None
                }
            },
        };
        let supports_gpu = gpu.is_some();
        let backend = if supports_gpu { "gpu" } else { "cpu" };
        info!(backend, quality = ?config.preview_quality, "grader ready");

        let session = Session {
            history: ColorGradingHistory::new(Self::default_settings(), config.max_history),
            presets: PresetLibrary::with_builtins(),
            luts: HashMap::new(),
            quality: config.preview_quality,
            last_metrics: None,
            in_flight: None,
        };

        Self {
            config,
            session: Mutex::new(session),
            backends: Arc::new(Mutex::new(Backends {
                gpu,
                cpu: CpuBackend::new(),
            })),
            supports_gpu,
            observers: Mutex::new(Vec::new()),
            busy: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            disposed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The neutral grade: identity on every image.
    pub fn default_settings() -> ColorGradingSettings {
        ColorGradingSettings::default()
    }

    pub fn config(&self) -> &GraderConfig {
        &self.config
    }

    // ── Events ───────────────────────────────────────────────────────────

    pub fn subscribe(&self, observer: impl GradingObserver + 'static) {
        lock(&self.observers).push(Arc::new(observer));
    }

    /// Convenience: receive every event on a channel.
    pub fn events(&self) -> UnboundedReceiver<GradingEvent> {
        let (tx, rx) = unbounded_channel();
        self.subscribe(tx);
        rx
    }

    /// Observers run outside every internal lock, so they may call back
    /// into the grader.
    fn emit(&self, event: &GradingEvent) {
        let observers: Vec<_> = lock(&self.observers).clone();
        for observer in observers {
            observer.on_event(event);
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        lock(&self.session)
    }

    // ── Settings and history ─────────────────────────────────────────────

    pub fn current_settings(&self) -> ColorGradingSettings {
        self.session().history.current().clone()
    }

    /// Merge `patch` into the current settings and push the result onto
    /// the history. Values are clamped before they are stored. Does not
    /// render.
    pub fn update_settings(&self, patch: &SettingsPatch) -> ColorGradingSettings {
        let merged = {
            let mut session = self.session();
            let merged = session.history.current().merged(patch).sanitized();
            session.history.push(merged.clone());
            merged
        };
        debug!("settings updated");
        self.emit(&GradingEvent::SettingsChange(merged.clone()));
        merged
    }

    /// Make `settings` current as a whole, replacing every field.
    fn replace_settings(&self, settings: ColorGradingSettings) -> ColorGradingSettings {
        self.update_settings(&SettingsPatch::from(settings))
    }

    /// Push the neutral grade.
    pub fn reset(&self) -> ColorGradingSettings {
        self.replace_settings(Self::default_settings())
    }

    pub fn undo(&self) -> Option<ColorGradingSettings> {
        let settings = self.session().history.undo().cloned()?;
        self.emit(&GradingEvent::SettingsChange(settings.clone()));
        Some(settings)
    }

    pub fn redo(&self) -> Option<ColorGradingSettings> {
        let settings = self.session().history.redo().cloned()?;
        self.emit(&GradingEvent::SettingsChange(settings.clone()));
        Some(settings)
    }

    pub fn can_undo(&self) -> bool {
        self.session().history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.session().history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.session().history.len()
    }

    // ── Presets ──────────────────────────────────────────────────────────

    /// Snapshot the current settings as a new user preset.
    pub fn save_preset(
        &self,
        name: impl Into<String>,
        description: Option<String>,
        category: PresetCategory,
    ) -> ColorGradingPreset {
        let mut session = self.session();
        let current = session.history.current().clone();
        session
            .presets
            .create(name, description, category, Vec::new(), &current)
    }

    /// Make a preset's settings current. Returns whether it exists.
    pub fn load_preset(&self, id: &str) -> bool {
        let Some(settings) = self.session().presets.get(id).map(|p| p.settings.clone()) else {
            debug!(id, "preset not found");
            return false;
        };
        self.replace_settings(settings);
        true
    }

    /// Like [`load_preset`](Self::load_preset), but looks the preset up by
    /// name, ignoring case.
    pub fn load_preset_by_name(&self, name: &str) -> Result<ColorGradingPreset> {
        let preset = self
            .session()
            .presets
            .find_by_name(name)
            .cloned()
            .ok_or_else(|| GradeError::PresetNotFound(name.to_string()))?;
        self.replace_settings(preset.settings.clone());
        Ok(preset)
    }

    /// Remove a user preset. Built-in presets are kept.
    pub fn delete_preset(&self, id: &str) -> bool {
        self.session().presets.delete(id)
    }

    pub fn presets(&self) -> Vec<ColorGradingPreset> {
        self.session().presets.all().to_vec()
    }

    pub fn presets_by_category(&self, category: PresetCategory) -> Vec<ColorGradingPreset> {
        self.session()
            .presets
            .by_category(category)
            .into_iter()
            .cloned()
            .collect()
    }

    /// User presets as JSON, for the caller to persist.
    pub fn export_presets(&self) -> Result<String> {
        Ok(self.session().presets.export_json()?)
    }

    pub fn import_presets(&self, json: &str) -> Result<usize> {
        Ok(self.session().presets.import_json(json)?)
    }

    // ── LUTs ─────────────────────────────────────────────────────────────

    /// Make `lut` available to settings that reference `name`.
    pub fn register_lut(&self, name: impl Into<String>, lut: Lut3d) {
        let name = name.into();
        debug!(%name, size = lut.size(), "registered LUT");
        self.session().luts.insert(name, Arc::new(lut));
    }

    pub fn remove_lut(&self, name: &str) -> bool {
        self.session().luts.remove(name).is_some()
    }

    // ── Preview and backend ──────────────────────────────────────────────

    pub fn set_preview_quality(&self, quality: PreviewQuality) {
        self.session().quality = quality;
    }

    pub fn preview_quality(&self) -> PreviewQuality {
        self.session().quality
    }

    /// Whether the GPU backend initialized.
    pub fn supports_gpu(&self) -> bool {
        self.supports_gpu
    }

    pub fn backend_name(&self) -> &'static str {
        if self.supports_gpu { "gpu" } else { "cpu" }
    }

    pub fn last_metrics(&self) -> Option<PerformanceMetrics> {
        self.session().last_metrics
    }

    /// False once a newer render has started or the grader is disposed.
    pub fn is_current(&self, generation: u64) -> bool {
        !self.disposed.load(Ordering::SeqCst)
            && self.generation.load(Ordering::SeqCst) == generation
    }

    // ── Rendering ────────────────────────────────────────────────────────

    /// Grade `image` with `settings`, or with the current history state
    /// when `settings` is `None`.
    ///
    /// Emits `ProcessingStart` before the work and `ProcessingComplete`
    /// after it. Any failure emits `Error` and is returned; settings and
    /// history are left as they were.
    pub async fn process_image(
        &self,
        image: Arc<ImageBuf>,
        settings: Option<&ColorGradingSettings>,
    ) -> Result<ProcessedImage> {
        let result = self.try_process(image, settings).await;
        if let Err(err) = &result {
            let message = describe(err);
            error!(error = %message, "processing failed");
            self.emit(&GradingEvent::Error(message));
        }
        result
    }

    async fn try_process(
        &self,
        image: Arc<ImageBuf>,
        settings: Option<&ColorGradingSettings>,
    ) -> Result<ProcessedImage> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(GradeError::Disposed);
        }
        self.validate(&image)?;
        let _busy = BusyGuard::acquire(&self.busy).ok_or(GradeError::Busy)?;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancelToken::new();
        let (settings, lut, scale) = {
            let mut session = self.session();
            session.in_flight = Some(cancel.clone());
            let settings = settings.unwrap_or_else(|| session.history.current()).sanitized();
            let lut = resolve_lut(&session.luts, &settings);
            let scale = preview::preview_scale(
                image.pixel_count(),
                session.quality,
                self.config.large_image_threshold,
            );
            (settings, lut, scale)
        };

        self.emit(&GradingEvent::ProcessingStart { generation });
        debug!(
            generation,
            width = image.width,
            height = image.height,
            scale,
            "processing image"
        );

        let backends = Arc::clone(&self.backends);
        let disposed = Arc::clone(&self.disposed);
        let task_cancel = cancel.clone();
        let joined = tokio::task::spawn_blocking(move || {
            render_blocking(&backends, &disposed, &image, &settings, lut, scale, &task_cancel)
        })
        .await;
        self.session().in_flight = None;

        let rendered = joined
            .context("render task panicked")?
            .map_err(GradeError::from_render)?;
        if self.disposed.load(Ordering::SeqCst) {
            return Err(GradeError::Disposed);
        }

        let image = Arc::new(rendered.image);
        self.session().last_metrics = Some(rendered.metrics);
        debug!(
            generation,
            backend = rendered.backend,
            ms = rendered.metrics.processing_time_ms,
            "processing complete"
        );
        self.emit(&GradingEvent::ProcessingComplete {
            generation,
            image: Arc::clone(&image),
            metrics: rendered.metrics,
        });

        Ok(ProcessedImage {
            image,
            metrics: rendered.metrics,
            generation,
            backend: rendered.backend,
            scale,
        })
    }

    fn validate(&self, image: &ImageBuf) -> Result<()> {
        if !image.is_consistent() {
            return Err(GradeError::InvalidImage(format!(
                "buffer holds {} bytes but {}x{} RGBA needs {}",
                image.byte_len(),
                image.width,
                image.height,
                image.pixel_count() * 4
            )));
        }
        let pixels = image.pixel_count();
        if pixels > self.config.max_image_pixels {
            return Err(GradeError::ImageTooLarge {
                pixels,
                limit: self.config.max_image_pixels,
            });
        }
        Ok(())
    }

    /// Cancel any in-flight render and release GPU resources. Settings,
    /// history and presets stay readable; rendering fails afterwards.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(cancel) = self.session().in_flight.take() {
            cancel.cancel();
        }
        // A running render holds the lock and disposes on its way out.
        match self.backends.try_lock() {
            Ok(mut backends) => backends.dispose(),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().dispose(),
            Err(TryLockError::WouldBlock) => debug!("render in flight, deferring backend disposal"),
        }
        info!("grader disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn resolve_lut(
    luts: &HashMap<String, Arc<Lut3d>>,
    settings: &ColorGradingSettings,
) -> Option<Arc<Lut3d>> {
    let reference = settings.lut.as_ref()?;
    let lut = luts.get(&reference.name).cloned();
    if lut.is_none() {
        warn!(name = %reference.name, "unknown LUT reference, skipping LUT stage");
    }
    lut
}

fn describe(err: &GradeError) -> String {
    match err {
        GradeError::Backend(inner) => format!("{inner:#}"),
        other => other.to_string(),
    }
}

/// Runs on the blocking pool: optional downscale, render, optional
/// upscale back to the source size.
fn render_blocking(
    backends: &Mutex<Backends>,
    disposed: &AtomicBool,
    src: &ImageBuf,
    settings: &ColorGradingSettings,
    lut: Option<Arc<Lut3d>>,
    scale: f32,
    cancel: &CancelToken,
) -> anyhow::Result<Rendered> {
    let start = Instant::now();
    let reduced = preview::downsample(src, scale);
    let working = reduced.as_ref().unwrap_or(src);
    let params = KernelParams::new(settings, working.width, working.height, lut);

    let result = {
        let mut backends = lock(backends);
        let result = backends.render(working, &params, cancel);
        if disposed.load(Ordering::SeqCst) {
            backends.dispose();
        }
        result
    };
    let (graded, backend) = result?;

    let mut buffer_bytes = src.byte_len() + graded.byte_len();
    let image = match &reduced {
        Some(small) => {
            let full = preview::upsample(graded, src.width, src.height);
            buffer_bytes += small.byte_len() + full.byte_len();
            full
        }
        None => graded,
    };

    Ok(Rendered {
        image,
        backend,
        metrics: PerformanceMetrics::new(start.elapsed(), buffer_bytes),
    })
}
