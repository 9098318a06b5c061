// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Tessera sandbox: authors a small scene, replays a few frames against a
// logging device, and tears everything down. Run with RUST_LOG=debug to
// watch the call stream.

use log::{debug, info};
use std::cell::Cell;
use tessera_core::gpu::{
    AttributeInfo, AttributeLayout, BlendFactor, BufferDescriptor, BufferId, Capability,
    CompareFunction, DeviceLimits, GpuDevice, IndexFormat, PrimitiveTopology, ProgramDescriptor,
    ProgramId, ScissorRect, TextureId, UniformInfo, UniformKind, UniformLocation, UniformStage,
};
use tessera_core::math::{LinearRgba, Mat4, Vec3};
use tessera_core::{ResourceError, ShaderError};
use tessera_scene::{Model, ModelRenderer};

/// A device that logs every call instead of driving a GPU.
#[derive(Debug, Default)]
struct LoggingDevice {
    next_buffer: Cell<usize>,
    live: Cell<isize>,
}

impl GpuDevice for LoggingDevice {
    fn limits(&self) -> DeviceLimits {
        DeviceLimits::default()
    }

    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        let id = self.next_buffer.get();
        self.next_buffer.set(id + 1);
        self.live.set(self.live.get() + 1);
        debug!(
            "create buffer #{id} ({:?}, {} bytes, label {:?})",
            descriptor.usage,
            data.len(),
            descriptor.label
        );
        Ok(BufferId(id))
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        self.live.set(self.live.get() - 1);
        debug!("destroy buffer #{}", id.0);
        Ok(())
    }

    fn bind_attribute(&self, location: u32, buffer: BufferId, layout: &AttributeLayout) {
        debug!(
            "bind attribute @{location} <- buffer #{} ({} x {:?})",
            buffer.0, layout.components, layout.data_type
        );
    }

    fn disable_attribute(&self, location: u32) {
        debug!("disable attribute @{location}");
    }

    fn bind_index_buffer(&self, buffer: BufferId) {
        debug!("bind index buffer #{}", buffer.0);
    }

    fn draw_arrays(&self, topology: PrimitiveTopology, first: u32, count: u32) {
        info!("draw_arrays {topology:?} [{first}..{}]", first + count);
    }

    fn draw_elements(&self, topology: PrimitiveTopology, count: u32, format: IndexFormat, _: u32) {
        info!("draw_elements {topology:?} x{count} ({format:?})");
    }

    fn create_program(&self, descriptor: &ProgramDescriptor) -> Result<ProgramId, ShaderError> {
        debug!("create program (label {:?})", descriptor.label);
        Ok(ProgramId(0))
    }

    fn use_program(&self, program: ProgramId) {
        debug!("use program #{}", program.0);
    }

    fn program_attributes(&self, _program: ProgramId) -> Vec<AttributeInfo> {
        ["position", "color", "uv", "normal"]
            .iter()
            .enumerate()
            .map(|(location, name)| AttributeInfo {
                name: (*name).to_string(),
                location: location as u32,
            })
            .collect()
    }

    fn program_uniforms(&self, _program: ProgramId) -> Vec<UniformInfo> {
        let decls = [
            ("mvMatrix", UniformKind::Mat4),
            ("pMatrix", UniformKind::Mat4),
            ("colorMask", UniformKind::Vec4),
            ("sampler", UniformKind::Sampler2d),
            ("lights", UniformKind::Float),
            ("lightCount", UniformKind::Int),
            ("ambient", UniformKind::Vec4),
        ];
        decls
            .iter()
            .enumerate()
            .map(|(location, (name, kind))| UniformInfo {
                name: (*name).to_string(),
                location: UniformLocation(location),
                kind: *kind,
                array_size: 1,
            })
            .collect()
    }

    fn set_uniform(&self, location: UniformLocation, value: UniformStage<'_>) {
        debug!("set uniform @{} = {value:?}", location.0);
    }

    fn bind_texture(&self, unit: u32, texture: TextureId) {
        debug!("bind texture #{} -> unit {unit}", texture.0);
    }

    fn set_blend_func(&self, src: BlendFactor, dst: BlendFactor) {
        debug!("blend func {src:?} / {dst:?}");
    }

    fn set_depth_mask(&self, enabled: bool) {
        debug!("depth mask {enabled}");
    }

    fn set_depth_func(&self, func: CompareFunction) {
        debug!("depth func {func:?}");
    }

    fn set_line_width(&self, width: f32) {
        debug!("line width {width}");
    }

    fn set_capability(&self, capability: Capability, enabled: bool) {
        debug!("capability {capability:?} = {enabled}");
    }

    fn set_scissor(&self, rect: Option<ScissorRect>) {
        debug!("scissor {rect:?}");
    }

    fn clear(&self, color: Option<LinearRgba>, depth: bool) {
        debug!("clear color={color:?} depth={depth}");
    }
}

fn main() {
    env_logger::init();
    let device = LoggingDevice::default();

    let mut model = Model::new();
    model
        .clear(Some(LinearRgba::new(0.05, 0.05, 0.08, 1.0)), true)
        .and_then(|m| m.ambient_light(LinearRgba::new(0.2, 0.2, 0.2, 1.0)))
        .and_then(|m| {
            m.directional_light(Vec3::new(-0.5, -1.0, -0.3), LinearRgba::WHITE, 1.0)
        })
        .and_then(|m| m.lighting(true))
        .and_then(|m| m.color(LinearRgba::rgb(0.8, 0.3, 0.2)))
        .and_then(|m| m.fill_rect(-1.0, -1.0, 2.0, 2.0))
        .expect("authoring the floor");

    // A spinning cube face in its own scope so the transform stays local.
    model
        .push()
        .and_then(|m| m.translate_xyz(0.0, 0.5, -2.0))
        .and_then(|m| m.rotate_y(0.6))
        .and_then(|m| m.color(LinearRgba::rgb(0.2, 0.5, 0.9)))
        .and_then(|m| m.fill_rect(-0.5, -0.5, 1.0, 1.0))
        .and_then(|m| m.pop())
        .expect("authoring the panel");

    model.finish(&device).expect("scene compiles");
    info!("scene compiled: {} action(s)", model.actions().unwrap().len());

    let mut renderer = ModelRenderer::from_source(
        &device,
        &ProgramDescriptor {
            label: Some("sandbox".into()),
            vertex_source: include_str!("shaders/sandbox.vert").into(),
            fragment_source: include_str!("shaders/sandbox.frag").into(),
        },
    )
    .expect("program compiles");
    renderer.set_projection(Mat4::perspective(
        60.0f32.to_radians(),
        16.0 / 9.0,
        0.1,
        100.0,
    ));

    for frame in 0..3 {
        info!("--- frame {frame} ---");
        renderer.render(&model, &device).expect("frame renders");
    }

    model.dispose(&device).expect("scene tears down");
    info!("done; live buffers: {}", device.live.get());
}
