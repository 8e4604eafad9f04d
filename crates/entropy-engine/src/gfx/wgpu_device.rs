//! wgpu-backed [`GraphicsDevice`].
//!
//! wgpu has no "current program" or per-call uniform uploads, so this device
//! emulates them:
//! - every draw snapshots the bound program's uniform values into a
//!   [`UniformArena`] (one 256-byte aligned slot per uniform)
//! - draws are recorded in submission order and replayed by [`WgpuDevice::encode`]
//!   in a single render pass, using dynamic offsets into the arena
//!
//! Programs get their pipeline at creation time; the per-stage shader modules
//! are dropped once the pipeline exists.
//!
//! A draw whose program or mesh is deleted before `encode` is skipped, and a
//! deleted texture is replaced by the white fallback. Both are logged once
//! per resource.

use std::collections::{HashMap, HashSet};

use glam::{Mat4, Vec4};
use wgpu::util::DeviceExt;

use super::state::DeviceState;
use super::uniform_arena::UniformArena;
use super::wgsl::UniformSlot;
use super::{
    DeviceError, GraphicsDevice, MeshId, ProgramId, QuadVertex, TextureId, UniformLocation,
    UniformValue,
};

struct GpuProgram {
    pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
    slots: Vec<UniformSlot>,
    /// Bound to the arena buffer of the paired generation; rebuilt when the
    /// arena buffer is recreated.
    bind_group: Option<(u64, wgpu::BindGroup)>,
}

struct GpuTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

struct DrawRecord {
    program: ProgramId,
    mesh: MeshId,
    texture: Option<TextureId>,
    vertex_count: u32,
    offsets: Vec<u32>,
}

/// A resource a recorded draw referenced but that was gone at encode time.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
enum StaleResource {
    Program(ProgramId),
    Mesh(MeshId),
    Texture(TextureId),
}

#[derive(Debug, Default)]
struct StaleWarnings {
    seen: HashSet<StaleResource>,
}

impl StaleWarnings {
    /// Warns the first time `resource` shows up. Returns whether it warned.
    fn note(&mut self, resource: StaleResource) -> bool {
        if !self.seen.insert(resource) {
            return false;
        }
        match resource {
            StaleResource::Program(id) => {
                log::warn!("program {id:?} deleted before encode; skipping its draws")
            }
            StaleResource::Mesh(id) => {
                log::warn!("mesh {id:?} deleted before encode; skipping its draws")
            }
            StaleResource::Texture(id) => {
                log::warn!("texture {id:?} deleted before encode; drawing with the white fallback")
            }
        }
        true
    }
}

pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,

    state: DeviceState,
    programs: HashMap<ProgramId, GpuProgram>,
    meshes: HashMap<MeshId, wgpu::Buffer>,
    textures: HashMap<TextureId, GpuTexture>,

    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    fallback_texture: GpuTexture,

    arena: UniformArena,
    arena_buffer: Option<wgpu::Buffer>,

    draws: Vec<DrawRecord>,
    warned_untextured: bool,
    stale: StaleWarnings,
}

impl WgpuDevice {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("entropy texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("entropy texture sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let fallback_texture = upload_texture(
            &device,
            &queue,
            &texture_layout,
            &sampler,
            1,
            1,
            &[255, 255, 255, 255],
            "entropy fallback texture",
        );

        Self {
            device,
            queue,
            surface_format,
            state: DeviceState::default(),
            programs: HashMap::new(),
            meshes: HashMap::new(),
            textures: HashMap::new(),
            texture_layout,
            sampler,
            fallback_texture,
            arena: UniformArena::new(),
            arena_buffer: None,
            draws: Vec::new(),
            warned_untextured: false,
            stale: StaleWarnings::default(),
        }
    }

    #[inline]
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Number of draws recorded since the last [`encode`](Self::encode).
    #[inline]
    pub fn pending_draws(&self) -> usize {
        self.draws.len()
    }

    /// Replays every recorded draw into `view`, in submission order.
    ///
    /// `clear` selects the load op: `Some` clears the target first, `None` keeps it.
    /// The recorded draw list and uniform arena are reset afterwards.
    pub fn encode(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        clear: Option<wgpu::Color>,
    ) {
        let draws = std::mem::take(&mut self.draws);

        if !draws.is_empty() {
            self.upload_arena();
            self.ensure_program_bind_groups();
        }

        let load = match clear {
            Some(color) => wgpu::LoadOp::Clear(color),
            None => wgpu::LoadOp::Load,
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("entropy 2d pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        for draw in &draws {
            let Some(program) = self.programs.get(&draw.program) else {
                self.stale.note(StaleResource::Program(draw.program));
                continue;
            };
            let Some((_, bind_group)) = program.bind_group.as_ref() else {
                log::warn!("program {:?} has no uniform bind group; skipping draw", draw.program);
                continue;
            };
            let Some(mesh) = self.meshes.get(&draw.mesh) else {
                self.stale.note(StaleResource::Mesh(draw.mesh));
                continue;
            };

            let texture = match draw.texture {
                Some(id) => match self.textures.get(&id) {
                    Some(texture) => texture,
                    None => {
                        self.stale.note(StaleResource::Texture(id));
                        &self.fallback_texture
                    }
                },
                None => &self.fallback_texture,
            };

            rpass.set_pipeline(&program.pipeline);
            rpass.set_bind_group(0, bind_group, &draw.offsets);
            rpass.set_bind_group(1, &texture.bind_group, &[]);
            rpass.set_vertex_buffer(0, mesh.slice(..));
            rpass.draw(0..draw.vertex_count, 0..1);
        }

        drop(rpass);
        self.arena.reset();
    }

    fn upload_arena(&mut self) {
        if let Some(capacity) = self.arena.reserve(self.arena_buffer.is_some()) {
            self.arena_buffer = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("entropy uniform arena"),
                size: capacity,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            log::debug!("uniform arena resized to {capacity} bytes");
        }

        if let Some(buffer) = self.arena_buffer.as_ref() {
            if !self.arena.is_empty() {
                self.queue.write_buffer(buffer, 0, self.arena.bytes());
            }
        }
    }

    fn ensure_program_bind_groups(&mut self) {
        let Some(arena) = self.arena_buffer.as_ref() else { return };
        let generation = self.arena.generation();

        for program in self.programs.values_mut() {
            if matches!(&program.bind_group, Some((g, _)) if *g == generation) {
                continue;
            }

            let entries: Vec<wgpu::BindGroupEntry<'_>> = program
                .slots
                .iter()
                .map(|slot| wgpu::BindGroupEntry {
                    binding: slot.binding,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: arena,
                        offset: 0,
                        size: wgpu::BufferSize::new(slot.kind.size()),
                    }),
                })
                .collect();

            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("entropy uniform bind group"),
                layout: &program.uniform_layout,
                entries: &entries,
            });
            program.bind_group = Some((generation, bind_group));
        }
    }

    fn build_pipeline(
        &self,
        vertex_src: &str,
        fragment_src: &str,
        vertex_entry: &str,
        fragment_entry: &str,
        slots: &[UniformSlot],
    ) -> (wgpu::RenderPipeline, wgpu::BindGroupLayout) {
        let vertex_module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("entropy vertex shader"),
            source: wgpu::ShaderSource::Wgsl(vertex_src.into()),
        });
        let fragment_module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("entropy fragment shader"),
            source: wgpu::ShaderSource::Wgsl(fragment_src.into()),
        });

        let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = slots
            .iter()
            .map(|slot| wgpu::BindGroupLayoutEntry {
                binding: slot.binding,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(slot.kind.size()),
                },
                count: None,
            })
            .collect();

        let uniform_layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("entropy uniform bgl"),
                entries: &layout_entries,
            });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("entropy 2d pipeline layout"),
                bind_group_layouts: &[&uniform_layout, &self.texture_layout],
                immediate_size: 0,
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("entropy 2d pipeline"),
                layout: Some(&pipeline_layout),

                vertex: wgpu::VertexState {
                    module: &vertex_module,
                    entry_point: Some(vertex_entry),
                    compilation_options: Default::default(),
                    buffers: &[QuadVertex::layout()],
                },

                fragment: Some(wgpu::FragmentState {
                    module: &fragment_module,
                    entry_point: Some(fragment_entry),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.surface_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        (pipeline, uniform_layout)
    }
}

impl GraphicsDevice for WgpuDevice {
    fn create_program(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<ProgramId, DeviceError> {
        let id = self.state.create_program(vertex_src, fragment_src)?;
        let Some(linked) = self.state.program(id).map(|p| p.linked.clone()) else {
            return Err(DeviceError::UnknownProgram(id));
        };

        let (pipeline, uniform_layout) = self.build_pipeline(
            vertex_src,
            fragment_src,
            &linked.vertex_entry,
            &linked.fragment_entry,
            &linked.uniforms,
        );

        self.programs.insert(
            id,
            GpuProgram {
                pipeline,
                uniform_layout,
                slots: linked.uniforms,
                bind_group: None,
            },
        );
        log::debug!("program {id:?} linked");
        Ok(id)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.state.uniform_location(program, name)
    }

    fn use_program(&mut self, program: Option<ProgramId>) -> Result<(), DeviceError> {
        self.state.use_program(program)
    }

    fn delete_program(&mut self, program: ProgramId) -> Result<(), DeviceError> {
        self.state.delete_program(program)?;
        self.programs.remove(&program);
        log::debug!("program {program:?} deleted");
        Ok(())
    }

    fn set_uniform_mat4(
        &mut self,
        location: UniformLocation,
        value: &Mat4,
    ) -> Result<(), DeviceError> {
        self.state
            .set_uniform(location, UniformValue::Mat4(*value))
            .map(|_| ())
    }

    fn set_uniform_vec4(
        &mut self,
        location: UniformLocation,
        value: Vec4,
    ) -> Result<(), DeviceError> {
        self.state
            .set_uniform(location, UniformValue::Vec4(value))
            .map(|_| ())
    }

    fn create_mesh(&mut self, vertices: &[QuadVertex]) -> Result<MeshId, DeviceError> {
        let id = self.state.create_mesh(vertices)?;
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("entropy mesh vbo"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.meshes.insert(id, buffer);
        Ok(id)
    }

    fn bind_mesh(&mut self, mesh: Option<MeshId>) -> Result<(), DeviceError> {
        self.state.bind_mesh(mesh)
    }

    fn delete_mesh(&mut self, mesh: MeshId) -> Result<(), DeviceError> {
        self.state.delete_mesh(mesh)?;
        self.meshes.remove(&mesh);
        Ok(())
    }

    fn draw_triangle_strip(&mut self, vertex_count: u32) -> Result<(), DeviceError> {
        let draw = self.state.check_draw(vertex_count)?;

        if draw.texture.is_none() && !self.warned_untextured {
            log::warn!("draw without a bound texture; sampling the white fallback");
            self.warned_untextured = true;
        }

        let values = &self
            .state
            .program(draw.program)
            .ok_or(DeviceError::UnknownProgram(draw.program))?
            .values;
        let offsets = self.arena.push_values(values);

        self.draws.push(DrawRecord {
            program: draw.program,
            mesh: draw.mesh,
            texture: draw.texture,
            vertex_count,
            offsets,
        });
        Ok(())
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureId, DeviceError> {
        let id = self.state.create_texture(width, height, rgba)?;
        let texture = upload_texture(
            &self.device,
            &self.queue,
            &self.texture_layout,
            &self.sampler,
            width,
            height,
            rgba,
            "entropy texture",
        );
        self.textures.insert(id, texture);
        Ok(id)
    }

    fn bind_texture(&mut self, texture: Option<TextureId>) -> Result<(), DeviceError> {
        self.state.bind_texture(texture)
    }

    fn delete_texture(&mut self, texture: TextureId) -> Result<(), DeviceError> {
        self.state.delete_texture(texture)?;
        self.textures.remove(&texture);
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    width: u32,
    height: u32,
    rgba: &[u8],
    label: &str,
) -> GpuTexture {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: Some(height),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });

    GpuTexture {
        _texture: texture,
        bind_group,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_resources_warn_once_each() {
        let mut stale = StaleWarnings::default();

        assert!(stale.note(StaleResource::Texture(TextureId(3))));
        assert!(!stale.note(StaleResource::Texture(TextureId(3))));
        assert!(stale.note(StaleResource::Texture(TextureId(4))));
        assert!(stale.note(StaleResource::Program(ProgramId(3))));
        assert!(stale.note(StaleResource::Mesh(MeshId(3))));
        assert!(!stale.note(StaleResource::Mesh(MeshId(3))));
    }
}
