use anyhow::{Context, Result, ensure};
use tracing::{debug, info};

use grada_core::backend::{CancelToken, Cancelled, RenderBackend, check_dimensions};
use grada_core::image_buf::ImageBuf;
use grada_core::pipeline::modules::{CURVE_TABLE_SIZE, CurveTable};
use grada_core::pipeline::{KernelParams, Pipeline};

use crate::context::GpuContext;
use crate::shader::KernelShader;
use crate::texture::{GpuTexture, Readback};
use crate::uniforms::KernelUniforms;

/// Per-size resources, rebuilt only when the image dimensions change.
struct Targets {
    width: u32,
    height: u32,
    source: GpuTexture,
    target: GpuTexture,
    readback: Readback,
}

impl Targets {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            source: GpuTexture::source_rgba8(device, width, height),
            target: GpuTexture::target_rgba8(device, width, height),
            readback: Readback::new(device, width, height),
        }
    }

    fn destroy(&self) {
        self.source.destroy();
        self.target.destroy();
        self.readback.destroy();
    }
}

struct LutSlot {
    fingerprint: [u8; 32],
    texture: GpuTexture,
}

/// Fragment-shader implementation of the grading kernel.
///
/// Owns one device, one compiled pipeline and a small arena of textures
/// that are re-uploaded in place on every call. The LUT strip is only
/// uploaded again when the table's content fingerprint changes, and the
/// curve table only when the baked curves change.
pub struct GpuBackend {
    ctx: GpuContext,
    shader: KernelShader,
    pipeline: Pipeline,
    uniforms: wgpu::Buffer,
    curve_texture: GpuTexture,
    curve_cache: Option<CurveTable>,
    placeholder: GpuTexture,
    targets: Option<Targets>,
    lut: Option<LutSlot>,
    disposed: bool,
}

impl GpuBackend {
    /// Acquire a device and compile the kernel. Fails when no adapter is
    /// available or the shader does not validate.
    pub async fn new() -> Result<Self> {
        let ctx = GpuContext::new().await?;
        let shader = KernelShader::new(&ctx.device).await?;

        let uniforms = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("grade_uniforms"),
            size: std::mem::size_of::<KernelUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let curve_texture =
            GpuTexture::table_rgba32f(&ctx.device, CURVE_TABLE_SIZE as u32, 1, "grade_curves");
        let placeholder = GpuTexture::table_rgba32f(&ctx.device, 1, 1, "grade_placeholder");
        placeholder.write(&ctx.queue, bytemuck::cast_slice(&[0.0_f32; 4]));

        info!(adapter = %ctx.adapter_name, "GPU grading backend ready");

        Ok(Self {
            ctx,
            shader,
            pipeline: Pipeline::new(),
            uniforms,
            curve_texture,
            curve_cache: None,
            placeholder,
            targets: None,
            lut: None,
            disposed: false,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.ctx.adapter_name
    }

    fn ensure_targets(&mut self, width: u32, height: u32) {
        let stale = self
            .targets
            .as_ref()
            .is_none_or(|t| t.width != width || t.height != height);
        if stale {
            if let Some(old) = self.targets.take() {
                old.destroy();
            }
            debug!(width, height, "allocating GPU render targets");
            self.targets = Some(Targets::new(&self.ctx.device, width, height));
        }
    }

    fn upload_curves(&mut self, params: &KernelParams) {
        let Some(table) = &params.curves else {
            return;
        };
        if self.curve_cache.as_ref() == Some(table) {
            return;
        }
        let texels: Vec<f32> = table
            .entries()
            .iter()
            .flat_map(|e| [e[0], e[1], e[2], 1.0])
            .collect();
        self.curve_texture
            .write(&self.ctx.queue, bytemuck::cast_slice(&texels));
        self.curve_cache = Some(table.clone());
    }

    fn upload_lut(&mut self, params: &KernelParams) -> Result<()> {
        let Some(lut) = &params.lut else {
            return Ok(());
        };
        if self
            .lut
            .as_ref()
            .is_some_and(|slot| slot.fingerprint == *lut.fingerprint())
        {
            return Ok(());
        }

        let n = lut.size() as u32;
        let max = self.ctx.max_texture_dimension();
        ensure!(
            n * n <= max,
            "{n}^3 LUT needs a {}-texel wide strip, device allows {max}",
            n * n
        );

        if let Some(old) = self.lut.take() {
            old.texture.destroy();
        }
        let texture = GpuTexture::table_rgba32f(&self.ctx.device, n * n, n, "grade_lut");
        texture.write(&self.ctx.queue, bytemuck::cast_slice(&lut.to_strip_rgba()));
        debug!(size = n, "uploaded LUT strip");
        self.lut = Some(LutSlot {
            fingerprint: *lut.fingerprint(),
            texture,
        });
        Ok(())
    }
}

impl RenderBackend for GpuBackend {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn render(
        &mut self,
        src: &ImageBuf,
        params: &KernelParams,
        cancel: &CancelToken,
    ) -> Result<ImageBuf> {
        ensure!(!self.disposed, "gpu backend has been disposed");
        check_dimensions(src, params)?;

        let stage_mask = self.pipeline.stage_mask(params);
        if stage_mask == 0 || src.pixel_count() == 0 {
            return Ok(src.clone());
        }
        let max = self.ctx.max_texture_dimension();
        ensure!(
            src.width <= max && src.height <= max,
            "{}x{} exceeds the device texture limit of {max}",
            src.width,
            src.height
        );
        if cancel.is_cancelled() {
            return Err(Cancelled.into());
        }

        self.upload_curves(params);
        self.upload_lut(params).context("LUT upload failed")?;
        let uniforms = KernelUniforms::from_params(params, stage_mask);
        self.ctx
            .queue
            .write_buffer(&self.uniforms, 0, bytemuck::bytes_of(&uniforms));

        self.ensure_targets(src.width, src.height);
        let targets = self
            .targets
            .as_ref()
            .context("render targets were not allocated")?;
        targets.source.write(&self.ctx.queue, &src.data);

        let lut_view = self
            .lut
            .as_ref()
            .filter(|_| params.lut.is_some())
            .map_or(&self.placeholder.view, |slot| &slot.texture.view);

        let bind_group = self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grade_bg"),
            layout: &self.shader.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&targets.source.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.shader.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&self.curve_texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(lut_view),
                },
            ],
        });

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("grade_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("grade_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &targets.target.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.shader.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..6, 0..1);
        }
        targets.readback.copy_from(&mut encoder, &targets.target);
        self.ctx.queue.submit(std::iter::once(encoder.finish()));

        let data = targets.readback.read(&self.ctx.device)?;
        // A draw cannot be interrupted; honor a cancel that arrived meanwhile.
        if cancel.is_cancelled() {
            return Err(Cancelled.into());
        }
        debug!(width = src.width, height = src.height, stage_mask, "GPU render done");
        ImageBuf::from_data(src.width, src.height, data)
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if let Some(t) = self.targets.take() {
            t.destroy();
        }
        if let Some(slot) = self.lut.take() {
            slot.texture.destroy();
        }
        self.curve_texture.destroy();
        self.placeholder.destroy();
        self.uniforms.destroy();
        self.curve_cache = None;
        self.disposed = true;
        debug!("GPU backend disposed");
    }
}

impl Drop for GpuBackend {
    fn drop(&mut self) {
        self.dispose();
    }
}
