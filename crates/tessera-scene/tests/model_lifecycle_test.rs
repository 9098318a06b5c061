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

mod common;

use common::RecordingDevice;
use std::cell::RefCell;
use std::rc::Rc;
use tessera_core::gpu::{DeviceLimits, ProgramId, ShapeType};
use tessera_core::math::LinearRgba;
use tessera_core::ResourceError;
use tessera_scene::{Model, ModelRenderer, SceneError};

fn device() -> RecordingDevice {
    RecordingDevice::new().with_default_program()
}

#[test]
fn finish_is_idempotent() {
    let device = device();
    let mut model = Model::new();
    model.fill_rect(0.0, 0.0, 1.0, 1.0).unwrap();
    model.finish(&device).unwrap();
    let created = device.created_buffers();
    model.finish(&device).unwrap();
    assert_eq!(device.created_buffers(), created);
}

#[test]
fn reauthoring_replaces_the_compiled_scene() {
    let device = device();
    let mut model = Model::new();
    model.fill_rect(0.0, 0.0, 1.0, 1.0).unwrap();
    model.color(LinearRgba::RED).unwrap();
    model.fill_rect(2.0, 0.0, 1.0, 1.0).unwrap();
    model.finish(&device).unwrap();
    assert_eq!(model.actions().unwrap().len(), 2);

    // Free the old geometry, author a smaller scene in place.
    model.dispose_shallow(&device).unwrap();
    model.fill_rect(0.0, 0.0, 1.0, 1.0).unwrap();
    model.finish(&device).unwrap();
    assert_eq!(model.actions().unwrap().len(), 1);

    let mut renderer = ModelRenderer::new(&device, ProgramId(0));
    renderer.render(&model, &device).unwrap();
    assert_eq!(device.draw_count(), 1);

    model.dispose(&device).unwrap();
    assert_eq!(device.live_buffers(), 0);
}

#[test]
fn finish_with_open_scope_is_fatal() {
    let device = device();
    let mut model = Model::new();
    model.push().unwrap();
    model.fill_rect(0.0, 0.0, 1.0, 1.0).unwrap();
    assert!(matches!(
        model.finish(&device),
        Err(SceneError::UnclosedScopes(1))
    ));
}

#[test]
fn finish_with_open_shape_is_fatal() {
    let device = device();
    let mut model = Model::new();
    model.start(ShapeType::Triangle).unwrap();
    assert!(matches!(
        model.finish(&device),
        Err(SceneError::UnfinishedShape)
    ));
}

#[test]
fn render_before_finish_is_fatal() {
    let device = device();
    let model = Model::new();
    let mut renderer = ModelRenderer::new(&device, ProgramId(0));
    assert!(matches!(
        renderer.render(&model, &device),
        Err(SceneError::NotCompiled)
    ));
}

#[test]
fn dispose_balances_every_allocation() {
    let device = device();
    let mut model = Model::new();
    model.fill_rect(0.0, 0.0, 1.0, 1.0).unwrap();
    model.color(LinearRgba::RED).unwrap();
    model.push().unwrap();
    model.fill_rect(2.0, 0.0, 1.0, 1.0).unwrap();
    model.pop().unwrap();
    model.finish(&device).unwrap();

    assert!(device.created_buffers() > 0);
    model.dispose(&device).unwrap();
    assert_eq!(device.created_buffers(), device.destroyed_buffers());
    assert_eq!(device.live_buffers(), 0);

    // A second dispose never double-frees.
    model.dispose(&device).unwrap();
    assert_eq!(device.destroyed_buffers(), device.created_buffers());
}

#[test]
fn shallow_dispose_leaves_shared_fragments_alive() {
    let device = device();
    let fragment = Rc::new(RefCell::new(Model::new()));
    fragment
        .borrow_mut()
        .fill_rect(0.0, 0.0, 1.0, 1.0)
        .unwrap();
    fragment.borrow_mut().finish(&device).unwrap();
    let fragment_buffers = device.created_buffers();

    let mut a = Model::new();
    a.fragment(fragment.clone()).unwrap();
    a.fill_rect(2.0, 0.0, 1.0, 1.0).unwrap();
    a.finish(&device).unwrap();

    let mut b = Model::new();
    b.fragment(fragment.clone()).unwrap();
    b.finish(&device).unwrap();

    a.dispose_shallow(&device).unwrap();
    b.dispose_shallow(&device).unwrap();
    // Only the fragment's own buffers survive.
    assert_eq!(device.live_buffers(), fragment_buffers);

    fragment.borrow_mut().dispose(&device).unwrap();
    assert_eq!(device.live_buffers(), 0);
}

#[test]
fn deep_dispose_tolerates_shared_fragments() {
    let device = device();
    let fragment = Rc::new(RefCell::new(Model::new()));
    fragment
        .borrow_mut()
        .fill_rect(0.0, 0.0, 1.0, 1.0)
        .unwrap();
    fragment.borrow_mut().finish(&device).unwrap();

    let mut a = Model::new();
    a.fragment(fragment.clone()).unwrap();
    a.finish(&device).unwrap();
    let mut b = Model::new();
    b.fragment(fragment.clone()).unwrap();
    b.finish(&device).unwrap();

    a.dispose(&device).unwrap();
    // The fragment is already gone; b's deep dispose must not fail.
    b.dispose(&device).unwrap();
    assert_eq!(device.live_buffers(), 0);
}

#[test]
fn attribute_ceiling_fails_before_any_allocation() {
    let device = RecordingDevice::new()
        .with_default_program()
        .with_limits(DeviceLimits {
            max_vertex_attributes: 1,
            ..DeviceLimits::default()
        });
    let mut model = Model::new();
    // Color mode needs position plus color: one over the ceiling.
    model.fill_rect(0.0, 0.0, 1.0, 1.0).unwrap();
    match model.finish(&device) {
        Err(SceneError::Resource(ResourceError::LimitExceeded {
            requested, max, ..
        })) => {
            assert_eq!(requested, 2);
            assert_eq!(max, 1);
        }
        other => panic!("unexpected: {other:?}"),
    }
    // The refusal happened at registration, before the second buffer.
    assert!(device.created_buffers() <= 1);
}

#[test]
fn non_renderable_models_are_skipped() {
    let device = device();
    let fragment = Rc::new(RefCell::new(Model::new()));
    fragment
        .borrow_mut()
        .fill_rect(0.0, 0.0, 1.0, 1.0)
        .unwrap();
    fragment.borrow_mut().finish(&device).unwrap();
    fragment.borrow_mut().set_renderable(false);

    let mut model = Model::new();
    model.fragment(fragment).unwrap();
    model.finish(&device).unwrap();

    let mut renderer = ModelRenderer::new(&device, ProgramId(0));
    renderer.render(&model, &device).unwrap();
    assert_eq!(device.draw_count(), 0);
}
