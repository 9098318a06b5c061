use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tessera_core::gpu::{
    AttributeInfo, AttributeLayout, BlendFactor, BufferDescriptor, BufferId, Capability,
    CompareFunction, DeviceLimits, GpuDevice, IndexFormat, PrimitiveTopology, ProgramDescriptor,
    ProgramId, ScissorRect, TextureId, UniformInfo, UniformLocation, UniformStage,
};
use tessera_core::math::LinearRgba;
use tessera_core::{ResourceError, ShaderError};
use tessera_scene::Model;

/// A device that accepts everything and retains nothing, so the benches
/// measure compilation rather than a backend.
#[derive(Debug, Default)]
struct SinkDevice {
    counter: std::cell::Cell<usize>,
}

impl GpuDevice for SinkDevice {
    fn limits(&self) -> DeviceLimits {
        DeviceLimits::default()
    }

    fn create_buffer_with_data(
        &self,
        _descriptor: &BufferDescriptor,
        _data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        let id = self.counter.get();
        self.counter.set(id + 1);
        Ok(BufferId(id))
    }

    fn destroy_buffer(&self, _id: BufferId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn bind_attribute(&self, _location: u32, _buffer: BufferId, _layout: &AttributeLayout) {}
    fn disable_attribute(&self, _location: u32) {}
    fn bind_index_buffer(&self, _buffer: BufferId) {}
    fn draw_arrays(&self, _topology: PrimitiveTopology, _first: u32, _count: u32) {}
    fn draw_elements(&self, _t: PrimitiveTopology, _c: u32, _f: IndexFormat, _o: u32) {}
    fn create_program(&self, _descriptor: &ProgramDescriptor) -> Result<ProgramId, ShaderError> {
        Ok(ProgramId(0))
    }

    fn use_program(&self, _program: ProgramId) {}

    fn program_attributes(&self, _program: ProgramId) -> Vec<AttributeInfo> {
        Vec::new()
    }

    fn program_uniforms(&self, _program: ProgramId) -> Vec<UniformInfo> {
        Vec::new()
    }

    fn set_uniform(&self, _location: UniformLocation, _value: UniformStage<'_>) {}
    fn bind_texture(&self, _unit: u32, _texture: TextureId) {}
    fn set_blend_func(&self, _src: BlendFactor, _dst: BlendFactor) {}
    fn set_depth_mask(&self, _enabled: bool) {}
    fn set_depth_func(&self, _func: CompareFunction) {}
    fn set_line_width(&self, _width: f32) {}
    fn set_capability(&self, _capability: Capability, _enabled: bool) {}
    fn set_scissor(&self, _rect: Option<ScissorRect>) {}
    fn clear(&self, _color: Option<LinearRgba>, _depth: bool) {}
}

fn author_quads(count: usize) -> Model {
    let mut model = Model::new();
    for i in 0..count {
        let x = (i % 100) as f32;
        let y = (i / 100) as f32;
        model.fill_rect(x, y, 0.9, 0.9).unwrap();
    }
    model
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("Scene compilation");

    group.bench_function("author + finish 1k quads", |b| {
        let device = SinkDevice::default();
        b.iter(|| {
            let mut model = author_quads(black_box(1_000));
            model.finish(&device).unwrap();
            black_box(&model);
        });
    });

    group.bench_function("author + finish 20k quads (batch splits)", |b| {
        let device = SinkDevice::default();
        b.iter(|| {
            let mut model = author_quads(black_box(20_000));
            model.finish(&device).unwrap();
            black_box(&model);
        });
    });

    group.bench_function("colored stripes, 1k flushes", |b| {
        let device = SinkDevice::default();
        b.iter(|| {
            let mut model = Model::new();
            for i in 0..1_000u32 {
                let shade = (i % 255) as f32 / 255.0;
                model.color(LinearRgba::rgb(shade, shade, shade)).unwrap();
                model.fill_rect(i as f32, 0.0, 0.9, 0.9).unwrap();
            }
            model.finish(&device).unwrap();
            black_box(&model);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_compile);
criterion_main!(benches);
