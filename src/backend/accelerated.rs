use std::sync::mpsc;

use bytemuck::{Pod, Zeroable};
use log::{debug, info, trace};

use super::{ComputeBackend, KernelSource};
use crate::{
    command_buffer,
    command_encoder::CommandEncoderExt,
    compute,
    error::{Error, Result},
    frame::FrameBuffer,
    screen,
    typed_buffer::{self, Buffer},
    var::{self, Var},
    viewport::Viewport,
};

/// Splits `value` into an `f32` pair whose sum is `value` to about 48 bits.
pub fn split(value: f64) -> [f32; 2] {
    let hi = value as f32;
    [hi, (value - hi as f64) as f32]
}

/// Uniform parameters of `compute.wgsl#mandelbrot`. Field order and padding
/// match the WGSL `Params` struct.
///
/// The window is sent as its origin and per-pixel step, each as a
/// double-single `[hi, lo]` pair. Plain `f32` bounds stop resolving
/// neighbouring pixels of a 1920-wide frame after roughly 740 zoom steps.
#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug, PartialEq)]
pub struct Params {
    pub width: u32,
    pub height: u32,
    pub max_iterations: u32,
    pub padding: u32,
    pub origin_x: [f32; 2],
    pub origin_y: [f32; 2],
    pub step_x: [f32; 2],
    pub step_y: [f32; 2],
}

impl Params {
    pub fn new(size: screen::Size, viewport: &Viewport, max_iterations: u32) -> Self {
        Self {
            width: size.width,
            height: size.height,
            max_iterations,
            padding: 0,
            origin_x: split(viewport.xmin),
            origin_y: split(viewport.ymin),
            step_x: split(viewport.width() / size.width as f64),
            step_y: split(viewport.height() / size.height as f64),
        }
    }
}

/// Everything the device needs to render frames of one size.
///
/// Created once before the first frame. The device, queue, compiled kernel and
/// buffers are reused for every frame; only the uniform [`Params`] change. The
/// buffers are destroyed when the session is dropped.
pub struct AcceleratorSession {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    params: Var<Params>,
    output: Buffer<u32>,
    readback: Buffer<u32>,
    size: screen::Size,
}

impl AcceleratorSession {
    pub fn new(size: screen::Size, kernel: &KernelSource) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::Backends::all());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: None,
        }))
        .ok_or(Error::NoAdapter)?;
        info!("compute adapter: {:?}", adapter.get_info());

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("device"),
                features: wgpu::Features::empty(),
                limits: wgpu::Limits::default(),
            },
            None,
        ))?;

        let source = kernel.load()?;

        push_error_scopes(&device);

        let compute_shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("compute-shader"),
            source: wgpu::ShaderSource::Wgsl(source),
        });

        let compute_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("compute-bind-group-layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: false },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let compute_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("compute-pipeline-layout"),
                bind_group_layouts: &[&compute_bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("compute-pipeline"),
            layout: Some(&compute_pipeline_layout),
            module: &compute_shader_module,
            entry_point: "mandelbrot",
        });

        let words = compute::output_words(size.pixel_count()) as u64;
        let output = typed_buffer::Builder::<u32>::new(words)
            .with_label("output-buffer")
            .with_usage(wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC)
            .create(&device);
        let readback = typed_buffer::Builder::<u32>::new(words)
            .with_label("readback-buffer")
            .with_usage(wgpu::BufferUsages::MAP_READ)
            .create(&device);
        let params = var::Builder::new(Params::zeroed())
            .with_label("params-buffer")
            .with_usage(wgpu::BufferUsages::UNIFORM)
            .create(&device);

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("compute-bind-group"),
            layout: &compute_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: output.binding_resource(0, None),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: params.binding_resource(),
                },
            ],
        });

        if let Some(error) = pop_error_scopes(&device) {
            return Err(Error::KernelBuild(error.to_string()));
        }

        debug!(
            "accelerator session ready: {}x{}, {} output words",
            size.width, size.height, words
        );

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group,
            params,
            output,
            readback,
            size,
        })
    }

    pub fn size(&self) -> screen::Size {
        self.size
    }

    fn dispatch(&self) -> Result<()> {
        push_error_scopes(&self.device);

        let total_work = compute::invocation_count(self.size.pixel_count());
        let command_buffer = command_buffer::create(&self.device, "mandelbrot", |command_encoder| {
            command_encoder.with_compute_pass("compute-pass", |compute_pass| {
                compute_pass.set_pipeline(&self.pipeline);
                compute_pass.set_bind_group(0, &self.bind_group, &[]);
                compute_pass.insert_debug_marker("mandelbrot");
                let (x, y, z) = compute::mandelbrot_dispatch_size(total_work);
                compute_pass.dispatch_workgroups(x, y, z);
            });
            typed_buffer::copy_buffer_to_buffer(command_encoder, &self.output, &self.readback);
        });
        self.queue.submit([command_buffer]);

        match pop_error_scopes(&self.device) {
            Some(error) => Err(Error::dispatch(error.to_string())),
            None => Ok(()),
        }
    }

    /// Blocks until the device has finished the frame and copies it into `frame`.
    fn read_into(&self, frame: &mut FrameBuffer) -> Result<()> {
        let slice = self.readback.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        receiver
            .recv()
            .map_err(|_| Error::dispatch("device dropped the readback request"))??;

        {
            let view = slice.get_mapped_range();
            let bytes: &[u8] = bytemuck::cast_slice(&*view);
            let destination = frame.as_bytes_mut();
            let len = destination.len();
            destination.copy_from_slice(&bytes[..len]);
        }
        self.readback.unmap();
        Ok(())
    }
}

/// Device errors captured around session setup and each dispatch. Anything not
/// captured reaches wgpu's uncaptured-error handler, which panics.
const ERROR_FILTERS: [wgpu::ErrorFilter; 2] =
    [wgpu::ErrorFilter::Validation, wgpu::ErrorFilter::OutOfMemory];

fn push_error_scopes(device: &wgpu::Device) {
    for filter in ERROR_FILTERS {
        device.push_error_scope(filter);
    }
}

/// Pops every scope pushed by [`push_error_scopes`] and returns the first
/// error caught, innermost scope first.
fn pop_error_scopes(device: &wgpu::Device) -> Option<wgpu::Error> {
    let mut first = None;
    for _ in ERROR_FILTERS {
        let error = pollster::block_on(device.pop_error_scope());
        first = first.or(error);
    }
    first
}

impl ComputeBackend for AcceleratorSession {
    fn name(&self) -> &'static str {
        "accelerated"
    }

    fn fill_frame(
        &mut self,
        frame: &mut FrameBuffer,
        viewport: &Viewport,
        max_iterations: u32,
    ) -> Result<()> {
        if frame.size() != self.size {
            return Err(Error::FrameSize {
                expected: self.size,
                actual: frame.size(),
            });
        }

        trace!("dispatching {:?} at depth {}", viewport, max_iterations);
        self.params
            .write(&self.queue, Params::new(self.size, viewport, max_iterations));
        self.dispatch()?;
        self.read_into(frame)
    }
}

impl Drop for AcceleratorSession {
    fn drop(&mut self) {
        debug!("releasing accelerator session");
        self.output.destroy();
        self.readback.destroy();
        self.params.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_match_the_kernel_layout() {
        assert_eq!(std::mem::size_of::<Params>(), 48);
        let params = Params::new(screen::Size::new(16, 8), &Viewport::CANONICAL, 50);
        let words: &[u32] = bytemuck::cast_slice(bytemuck::bytes_of(&params));
        assert_eq!(&words[..4], &[16, 8, 50, 0]);
        assert_eq!(f32::from_bits(words[4]), -2.5);
        assert_eq!(f32::from_bits(words[6]), -1.0);
        // 3.5 / 16 and 2 / 8 are exact, so the low halves are zero.
        assert_eq!(params.step_x, [0.21875, 0.0]);
        assert_eq!(params.step_y, [0.25, 0.0]);
    }

    #[test]
    fn split_keeps_what_f32_drops() {
        let value = -0.743643887037151;
        let [hi, lo] = split(value);
        assert_ne!(hi as f64, value);
        assert!((hi as f64 + lo as f64 - value).abs() < 1e-14);
    }

    #[test]
    fn deep_frames_keep_neighbouring_pixels_apart() {
        let config = crate::RenderConfig::default();
        let viewport = config.zoom_sequence().iter().nth(1200).unwrap();
        let params = Params::new(config.size, &viewport, config.max_iterations);

        let value = |[hi, lo]: [f32; 2]| hi as f64 + lo as f64;
        let step = value(params.step_x);

        // A single f32 can no longer tell neighbouring pixels apart.
        let f32_spacing = (viewport.xmin as f32).abs() as f64 * f32::EPSILON as f64;
        assert!(f32_spacing > step * 100.0);
        assert!((step - viewport.width() / config.size.width as f64).abs() < step * 1e-6);
        let origin = value(params.origin_x);
        assert!((origin - viewport.xmin).abs() < step * 1e-3);
    }

    #[test]
    fn out_of_memory_is_captured_with_validation() {
        assert!(ERROR_FILTERS.contains(&wgpu::ErrorFilter::Validation));
        assert!(ERROR_FILTERS.contains(&wgpu::ErrorFilter::OutOfMemory));
    }
}
