//! Mesh integration tests.
//!
//! Tests are parameterized using `rstest` to run against each driver profile.

mod common;

use std::sync::Arc;

use rstest::rstest;

use common::{Profile, TestContext, floats, textured_layout};
use sprig_core::math::Transform2d;
use sprig_core::mesh::{
    ATTRIBUTE_POSITION, IndexFormat, MeshDescriptor, PrimitiveTopology, UsageHint,
    VertexAttribute, VertexLayout, VertexStepMode,
};
use sprig_graphics::{
    BufferAttribute, DrawCommand, Drawable, ErrorKind, GraphicsError, Texture,
};

fn mesh_draw(command: &DrawCommand) -> &sprig_graphics::backend::MeshDraw {
    match command {
        DrawCommand::Mesh(draw) => draw,
        other => panic!("expected a mesh draw, got {other:?}"),
    }
}

// ============================================================================
// Scenario
// ============================================================================

/// Four float3+float2 vertices drawn as a triangle strip.
#[rstest]
#[case::modern(Profile::Modern)]
#[case::legacy(Profile::Legacy)]
fn test_triangle_strip_scenario(#[case] profile: Profile) {
    let ctx = TestContext::new(profile);
    let mut mesh = ctx.create_textured_mesh(4, PrimitiveTopology::TriangleStrip);
    assert_eq!(mesh.vertex_stride(), Some(20));

    mesh.set_vertex(0, &[0u8; 20]).unwrap();
    assert_eq!(mesh.get_vertex(0).unwrap(), &[0u8; 20]);

    mesh.draw(&Transform2d::default()).unwrap();

    let draws = ctx.draws();
    assert_eq!(draws.len(), 1);
    let draw = mesh_draw(&draws[0]);
    assert_eq!(draw.topology, PrimitiveTopology::TriangleStrip);
    assert_eq!(draw.first, 0);
    assert_eq!(draw.count, 4);
    assert_eq!(draw.instance_count, 1);
    assert!(draw.indices.is_none());
    assert!(draw.texture.is_none());

    let names: Vec<_> = draw.attributes.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["VertexPosition", "VertexTexCoord"]);
    assert_eq!(draw.attributes[1].offset, 12);
    assert_eq!(draw.attributes[1].stride, 20);
}

// ============================================================================
// Vertex access
// ============================================================================

#[rstest]
#[case::modern(Profile::Modern)]
#[case::legacy(Profile::Legacy)]
fn test_vertex_roundtrip(#[case] profile: Profile) {
    let ctx = TestContext::new(profile);
    let mut mesh = ctx.create_textured_mesh(3, PrimitiveTopology::TriangleList);

    let vertex = floats(&[1.0, 2.0, 3.0, 0.25, 0.75]);
    mesh.set_vertex(2, &vertex).unwrap();
    assert_eq!(mesh.get_vertex(2).unwrap(), vertex.as_slice());
    assert_eq!(mesh.get_vertex(1).unwrap(), &[0u8; 20]);
}

#[rstest]
#[case::modern(Profile::Modern)]
#[case::legacy(Profile::Legacy)]
fn test_vertex_out_of_bounds(#[case] profile: Profile) {
    let ctx = TestContext::new(profile);
    let mut mesh = ctx.create_textured_mesh(3, PrimitiveTopology::TriangleList);

    let err = mesh.set_vertex(3, &[0; 4]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Bounds);
    assert!(mesh.get_vertex(3).is_err());

    let err = mesh.set_vertex(0, &[0; 21]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Bounds);
}

#[rstest]
#[case::modern(Profile::Modern)]
#[case::legacy(Profile::Legacy)]
fn test_vertex_attribute_roundtrip(#[case] profile: Profile) {
    let ctx = TestContext::new(profile);
    let mut mesh = ctx.create_textured_mesh(4, PrimitiveTopology::TriangleFan);

    let texcoord = floats(&[0.5, 1.0]);
    mesh.set_vertex_attribute(1, "VertexTexCoord", &texcoord)
        .unwrap();
    assert_eq!(
        mesh.get_vertex_attribute(1, "VertexTexCoord").unwrap(),
        texcoord.as_slice()
    );

    // Only the texcoord bytes of vertex 1 changed.
    let vertex = mesh.get_vertex(1).unwrap().to_vec();
    assert_eq!(&vertex[..12], &[0u8; 12]);
    assert_eq!(&vertex[12..], texcoord.as_slice());
}

#[rstest]
#[case::modern(Profile::Modern)]
#[case::legacy(Profile::Legacy)]
fn test_vertex_attribute_errors(#[case] profile: Profile) {
    let ctx = TestContext::new(profile);
    let mut mesh = ctx.create_textured_mesh(2, PrimitiveTopology::PointList);

    assert!(mesh.set_vertex_attribute(0, "VertexColor", &[0; 4]).is_err());
    assert!(mesh
        .set_vertex_attribute(0, "VertexTexCoord", &[0; 9])
        .is_err());
    assert!(mesh.get_vertex_attribute(2, "VertexTexCoord").is_err());

    mesh.set_attribute_enabled("VertexTexCoord", false).unwrap();
    assert!(!mesh.is_attribute_enabled("VertexTexCoord").unwrap());
    assert!(matches!(
        mesh.get_vertex_attribute(0, "VertexTexCoord"),
        Err(GraphicsError::InvalidOperation(_))
    ));
}

#[rstest]
#[case::modern(Profile::Modern)]
#[case::legacy(Profile::Legacy)]
fn test_create_from_initial_data(#[case] profile: Profile) {
    let ctx = TestContext::new(profile);
    let data = floats(&[
        0.0, 0.0, 0.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, 1.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, 1.0,
    ]);
    let mut mesh = ctx
        .device
        .create_mesh(
            &MeshDescriptor::new(textured_layout())
                .with_vertex_data(data.clone())
                .with_topology(PrimitiveTopology::TriangleList),
        )
        .unwrap();
    assert_eq!(mesh.vertex_count(), 3);
    assert_eq!(mesh.get_vertex(2).unwrap(), &data[40..]);

    let partial = ctx.device.create_mesh(
        &MeshDescriptor::new(textured_layout()).with_vertex_data(data[..30].to_vec()),
    );
    assert!(partial.is_err());
}

#[rstest]
#[case::modern(Profile::Modern)]
#[case::legacy(Profile::Legacy)]
fn test_default_vertex_format(#[case] profile: Profile) {
    let ctx = TestContext::new(profile);
    let mesh = ctx
        .device
        .create_mesh(&MeshDescriptor::new(VertexLayout::default_2d()).with_vertex_count(4))
        .unwrap();
    assert_eq!(mesh.draw_mode(), PrimitiveTopology::TriangleFan);
    assert_eq!(
        mesh.vertex_format(),
        vec![
            VertexAttribute::position_2d(),
            VertexAttribute::texcoord(),
            VertexAttribute::color(),
        ]
    );
}

// ============================================================================
// Mapping
// ============================================================================

#[rstest]
#[case::modern(Profile::Modern)]
#[case::legacy(Profile::Legacy)]
fn test_map_blocks_draw(#[case] profile: Profile) {
    let ctx = TestContext::new(profile);
    let mut mesh = ctx.create_textured_mesh(2, PrimitiveTopology::LineList);

    {
        let mut mapping = mesh.map_vertices().unwrap();
        mapping[..4].copy_from_slice(&7.0f32.to_ne_bytes());
        assert!(mesh.draw(&Transform2d::default()).is_err());
        mapping.unmap(0..4).unwrap();
    }

    mesh.draw(&Transform2d::default()).unwrap();
    let handle = mesh.vertex_buffer().unwrap().handle().unwrap();
    assert_eq!(
        &ctx.backend.buffer_contents(handle).unwrap()[..4],
        &7.0f32.to_ne_bytes()
    );
    assert_eq!(&mesh.get_vertex(0).unwrap()[..4], &7.0f32.to_ne_bytes());
}

// ============================================================================
// Vertex map, index buffer, draw range
// ============================================================================

#[rstest]
#[case::modern(Profile::Modern)]
#[case::legacy(Profile::Legacy)]
fn test_identity_vertex_map(#[case] profile: Profile) {
    let ctx = TestContext::new(profile);
    let mesh = ctx.create_textured_mesh(5, PrimitiveTopology::TriangleList);
    assert_eq!(mesh.vertex_map().unwrap(), vec![0, 1, 2, 3, 4]);
    assert_eq!(mesh.index_count(), 0);
}

#[rstest]
#[case::modern(Profile::Modern)]
#[case::legacy(Profile::Legacy)]
fn test_vertex_map_roundtrip(#[case] profile: Profile) {
    let ctx = TestContext::new(profile);
    let mut mesh = ctx.create_textured_mesh(4, PrimitiveTopology::TriangleList);

    mesh.set_vertex_map(&[0, 1, 2, 2, 3, 0]).unwrap();
    assert_eq!(mesh.vertex_map().unwrap(), vec![0, 1, 2, 2, 3, 0]);
    assert_eq!(mesh.index_count(), 6);
    assert_eq!(
        mesh.index_buffer().unwrap().index_format(),
        Some(IndexFormat::Uint16)
    );

    let bytes = IndexFormat::Uint32.encode(&[3, 2, 1]);
    mesh.set_vertex_map_bytes(IndexFormat::Uint32, &bytes)
        .unwrap();
    assert_eq!(mesh.vertex_map().unwrap(), vec![3, 2, 1]);

    mesh.draw(&Transform2d::default()).unwrap();
    let draws = ctx.draws();
    let draw = mesh_draw(&draws[0]);
    assert_eq!(draw.count, 3);
    assert_eq!(draw.indices.unwrap().format, IndexFormat::Uint32);

    mesh.clear_vertex_map();
    assert_eq!(mesh.vertex_map().unwrap(), vec![0, 1, 2, 3]);
}

#[rstest]
#[case::modern(Profile::Modern)]
#[case::legacy(Profile::Legacy)]
fn test_repeated_vertex_map_reuses_buffer(#[case] profile: Profile) {
    let ctx = TestContext::new(profile);
    let mut mesh = ctx.create_textured_mesh(4, PrimitiveTopology::TriangleList);
    mesh.set_vertex_map(&[0, 1, 2]).unwrap();
    let live = ctx.backend.live_buffer_count();

    for frame in 0..64u32 {
        let start = frame % 2;
        mesh.set_vertex_map(&[start, start + 1, start + 2]).unwrap();
    }
    assert_eq!(mesh.vertex_map().unwrap(), vec![1, 2, 3]);
    assert_eq!(ctx.backend.live_buffer_count(), live);
    assert_eq!(ctx.device.buffer_count(), live);

    // A different length needs a new buffer; the old one is released.
    mesh.set_vertex_map(&[3, 2, 1, 0]).unwrap();
    assert_eq!(mesh.index_count(), 4);
    assert_eq!(ctx.backend.live_buffer_count(), live);

    // A shared buffer is never written through.
    let shared = Arc::clone(mesh.index_buffer().unwrap());
    mesh.set_vertex_map(&[0, 0, 0, 0]).unwrap();
    assert_eq!(shared.indices().unwrap(), vec![3, 2, 1, 0]);
    assert!(!Arc::ptr_eq(&shared, mesh.index_buffer().unwrap()));

    mesh.draw(&Transform2d::default()).unwrap();
    let draws = ctx.draws();
    assert_eq!(mesh_draw(&draws[0]).count, 4);
}

#[rstest]
#[case::modern(Profile::Modern)]
#[case::legacy(Profile::Legacy)]
fn test_vertex_map_errors(#[case] profile: Profile) {
    let ctx = TestContext::new(profile);
    let mut mesh = ctx.create_textured_mesh(4, PrimitiveTopology::TriangleList);

    assert!(mesh.set_vertex_map(&[0, 4]).is_err());
    assert!(mesh.set_vertex_map(&[]).is_err());
    assert!(mesh
        .set_vertex_map_bytes(IndexFormat::Uint16, &[0, 0, 1])
        .is_err());
    assert!(mesh.index_buffer().is_none());
}

#[rstest]
#[case::modern(Profile::Modern)]
#[case::legacy(Profile::Legacy)]
fn test_external_index_buffer(#[case] profile: Profile) {
    let ctx = TestContext::new(profile);
    let mut mesh = ctx.create_textured_mesh(4, PrimitiveTopology::TriangleList);
    mesh.set_vertex_map(&[0, 1, 2]).unwrap();

    let indices = ctx
        .device
        .create_index_buffer(&[2, 3, 0, 0, 1, 2], UsageHint::Static)
        .unwrap();
    mesh.set_index_buffer(Some(Arc::clone(&indices))).unwrap();
    assert!(Arc::ptr_eq(mesh.index_buffer().unwrap(), &indices));
    assert_eq!(mesh.vertex_map().unwrap(), vec![2, 3, 0, 0, 1, 2]);

    let vertices = mesh.vertex_buffer().unwrap().clone();
    assert!(mesh.set_index_buffer(Some(vertices)).is_err());

    mesh.set_index_buffer(None).unwrap();
    assert_eq!(mesh.vertex_map().unwrap(), vec![0, 1, 2, 3]);
}

#[rstest]
#[case::modern(Profile::Modern)]
#[case::legacy(Profile::Legacy)]
fn test_draw_range_clamped(#[case] profile: Profile) {
    let ctx = TestContext::new(profile);
    let mut mesh = ctx.create_textured_mesh(6, PrimitiveTopology::TriangleList);

    mesh.set_draw_range(3, 10).unwrap();
    assert_eq!(mesh.draw_range(), Some((3, 10)));
    mesh.draw(&Transform2d::default()).unwrap();

    mesh.set_draw_range(8, 2).unwrap();
    mesh.draw(&Transform2d::default()).unwrap();

    mesh.clear_draw_range();
    mesh.draw(&Transform2d::default()).unwrap();

    assert!(mesh.set_draw_range(0, 0).is_err());

    let draws = ctx.draws();
    assert_eq!(draws.len(), 2);
    let clamped = mesh_draw(&draws[0]);
    assert_eq!((clamped.first, clamped.count), (3, 3));
    let full = mesh_draw(&draws[1]);
    assert_eq!((full.first, full.count), (0, 6));
}

// ============================================================================
// Attached attributes
// ============================================================================

fn color_buffer(ctx: &TestContext, count: usize) -> Arc<sprig_graphics::Buffer> {
    let layout = Arc::new(VertexLayout::new(vec![VertexAttribute::color()]).unwrap());
    ctx.device
        .create_vertex_buffer(layout, count, UsageHint::Dynamic)
        .unwrap()
}

#[rstest]
#[case::modern(Profile::Modern)]
#[case::legacy(Profile::Legacy)]
fn test_attach_detach_restores_format(#[case] profile: Profile) {
    let ctx = TestContext::new(profile);
    let mut mesh = ctx.create_textured_mesh(4, PrimitiveTopology::TriangleFan);
    let before = mesh.vertex_format();

    let colors = color_buffer(&ctx, 4);
    mesh.attach_attribute("VertexColor", &colors, "VertexColor", VertexStepMode::Vertex)
        .unwrap();
    assert_eq!(mesh.vertex_format().len(), before.len() + 1);
    assert_eq!(mesh.attached_attributes().len(), 1);

    mesh.set_vertex_attribute(2, "VertexColor", &[255, 0, 0, 255])
        .unwrap();
    colors.flush().unwrap();
    assert_eq!(&colors.contents().unwrap()[8..12], &[255, 0, 0, 255]);

    mesh.detach_attribute("VertexColor").unwrap();
    assert_eq!(mesh.vertex_format(), before);
    assert!(mesh.detach_attribute("VertexColor").is_err());
}

#[rstest]
#[case::modern(Profile::Modern)]
#[case::legacy(Profile::Legacy)]
fn test_latest_attachment_wins(#[case] profile: Profile) {
    let ctx = TestContext::new(profile);
    let mut mesh = ctx.create_textured_mesh(4, PrimitiveTopology::TriangleFan);

    let texcoords = Arc::new(VertexLayout::new(vec![VertexAttribute::texcoord()]).unwrap());
    let first = ctx
        .device
        .create_vertex_buffer(Arc::clone(&texcoords), 4, UsageHint::Dynamic)
        .unwrap();
    let second = ctx
        .device
        .create_vertex_buffer(texcoords, 4, UsageHint::Dynamic)
        .unwrap();

    mesh.attach_attribute("VertexTexCoord", &first, "VertexTexCoord", VertexStepMode::Vertex)
        .unwrap();
    mesh.attach_attribute("VertexTexCoord", &second, "VertexTexCoord", VertexStepMode::Vertex)
        .unwrap();
    assert_eq!(mesh.vertex_format().len(), 2);

    mesh.draw(&Transform2d::default()).unwrap();
    let draws = ctx.draws();
    let draw = mesh_draw(&draws[0]);
    let bound = draw
        .attributes
        .iter()
        .find(|a| a.name == "VertexTexCoord")
        .unwrap();
    assert_eq!(Some(bound.buffer), second.handle());
    assert_eq!(bound.offset, 0);

    // Earlier entries stay attached.
    mesh.detach_attribute("VertexTexCoord").unwrap();
    assert_eq!(mesh.attached_attributes().len(), 1);
    assert!(Arc::ptr_eq(mesh.attached_attributes()[0].buffer(), &first));
}

#[rstest]
#[case::modern(Profile::Modern)]
#[case::legacy(Profile::Legacy)]
fn test_attach_errors(#[case] profile: Profile) {
    let ctx = TestContext::new(profile);
    let mut mesh = ctx.create_textured_mesh(4, PrimitiveTopology::TriangleFan);
    let colors = color_buffer(&ctx, 4);

    assert!(mesh
        .attach_attribute("VertexColor", &colors, "Missing", VertexStepMode::Vertex)
        .is_err());
    assert!(mesh
        .attach_attribute(ATTRIBUTE_POSITION, &colors, "VertexColor", VertexStepMode::Vertex)
        .is_err());

    let indices = ctx
        .device
        .create_index_buffer(&[0, 1, 2], UsageHint::Static)
        .unwrap();
    assert!(mesh
        .attach_attribute("VertexColor", &indices, "VertexColor", VertexStepMode::Vertex)
        .is_err());
}

#[rstest]
#[case::modern(Profile::Modern)]
#[case::legacy(Profile::Legacy)]
fn test_short_attachment_fails_draw(#[case] profile: Profile) {
    let ctx = TestContext::new(profile);
    let mut mesh = ctx.create_textured_mesh(4, PrimitiveTopology::TriangleFan);
    let colors = color_buffer(&ctx, 2);
    mesh.attach_attribute("VertexColor", &colors, "VertexColor", VertexStepMode::Vertex)
        .unwrap();

    assert!(mesh.draw(&Transform2d::default()).is_err());
    mesh.set_attribute_enabled("VertexColor", false).unwrap();
    mesh.draw(&Transform2d::default()).unwrap();
}

#[rstest]
#[case::modern(Profile::Modern)]
#[case::legacy(Profile::Legacy)]
fn test_draw_requires_position(#[case] profile: Profile) {
    let ctx = TestContext::new(profile);
    let mut mesh = ctx.create_textured_mesh(3, PrimitiveTopology::TriangleList);
    mesh.set_attribute_enabled(ATTRIBUTE_POSITION, false).unwrap();
    assert!(matches!(
        mesh.draw(&Transform2d::default()),
        Err(GraphicsError::InvalidOperation(_))
    ));
    assert!(ctx.draws().is_empty());
}

#[rstest]
#[case::modern(Profile::Modern)]
#[case::legacy(Profile::Legacy)]
fn test_mesh_from_attributes(#[case] profile: Profile) {
    let ctx = TestContext::new(profile);
    let positions = ctx
        .device
        .create_vertex_buffer(
            Arc::new(VertexLayout::new(vec![VertexAttribute::position_2d()]).unwrap()),
            6,
            UsageHint::Static,
        )
        .unwrap();
    let colors = color_buffer(&ctx, 4);

    let mut mesh = ctx
        .device
        .create_mesh_from_attributes(
            vec![
                BufferAttribute::new(ATTRIBUTE_POSITION, &positions, ATTRIBUTE_POSITION, VertexStepMode::Vertex)
                    .unwrap(),
                BufferAttribute::new("VertexColor", &colors, "VertexColor", VertexStepMode::Vertex)
                    .unwrap(),
            ],
            PrimitiveTopology::PointList,
        )
        .unwrap();
    assert_eq!(mesh.vertex_count(), 4);
    assert!(mesh.vertex_stride().is_none());
    assert!(mesh.set_vertex(0, &[0; 4]).is_err());

    mesh.set_vertex_attribute(3, "VertexColor", &[1, 2, 3, 4])
        .unwrap();
    assert_eq!(
        mesh.get_vertex_attribute(3, "VertexColor").unwrap(),
        &[1, 2, 3, 4]
    );

    let missing_position = ctx.device.create_mesh_from_attributes(
        vec![BufferAttribute::new("VertexColor", &colors, "VertexColor", VertexStepMode::Vertex).unwrap()],
        PrimitiveTopology::PointList,
    );
    assert!(missing_position.is_err());
}

// ============================================================================
// Instancing and textures
// ============================================================================

#[rstest]
#[case::modern(Profile::Modern, true)]
#[case::legacy(Profile::Legacy, false)]
fn test_instanced_draw(#[case] profile: Profile, #[case] supported: bool) {
    let ctx = TestContext::new(profile);
    let mut mesh = ctx.create_textured_mesh(4, PrimitiveTopology::TriangleFan);

    let offsets = ctx
        .device
        .create_vertex_buffer(
            Arc::new(VertexLayout::new(vec![VertexAttribute::position_2d().per_instance()]).unwrap()),
            3,
            UsageHint::Stream,
        )
        .unwrap();
    mesh.attach_attribute("InstanceOffset", &offsets, ATTRIBUTE_POSITION, VertexStepMode::Instance)
        .unwrap();

    let result = mesh.draw_instanced(&Transform2d::default(), 3);
    if supported {
        result.unwrap();
        let draws = ctx.draws();
        let draw = mesh_draw(&draws[0]);
        assert_eq!(draw.instance_count, 3);
        let offset = draw
            .attributes
            .iter()
            .find(|a| a.name == "InstanceOffset")
            .unwrap();
        assert_eq!(offset.step_mode, VertexStepMode::Instance);

        assert!(mesh.draw_instanced(&Transform2d::default(), 4).is_err());
    } else {
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Unsupported);
        assert!(ctx.draws().is_empty());
    }

    mesh.draw_instanced(&Transform2d::default(), 0).unwrap();
}

#[rstest]
#[case::modern(Profile::Modern)]
#[case::legacy(Profile::Legacy)]
fn test_draw_binds_texture(#[case] profile: Profile) {
    let ctx = TestContext::new(profile);
    let mut mesh = ctx.create_textured_mesh(4, PrimitiveTopology::TriangleFan);
    let image = ctx.create_image(16, 16);

    image.unload();
    mesh.set_texture(Some(image.clone() as Arc<dyn Texture>));
    mesh.draw(&Transform2d::at(10.0, 20.0)).unwrap();

    assert!(image.is_loaded());
    let draws = ctx.draws();
    let draw = mesh_draw(&draws[0]);
    assert_eq!(draw.texture, image.handle());
    assert_eq!(draw.transform, Transform2d::at(10.0, 20.0).to_matrix());

    mesh.set_texture(None);
    assert!(mesh.texture().is_none());
}

#[rstest]
#[case::modern(Profile::Modern)]
#[case::legacy(Profile::Legacy)]
fn test_draw_reloads_unloaded_buffers(#[case] profile: Profile) {
    let ctx = TestContext::new(profile);
    let mut mesh = ctx.create_textured_mesh(4, PrimitiveTopology::TriangleFan);
    mesh.set_vertex(1, &floats(&[5.0])).unwrap();

    ctx.device.unload_all();
    assert!(mesh.vertex_buffer().unwrap().handle().is_none());

    ctx.device.reload_all().unwrap();
    mesh.draw(&Transform2d::default()).unwrap();
    let handle = mesh.vertex_buffer().unwrap().handle().unwrap();
    assert_eq!(
        &ctx.backend.buffer_contents(handle).unwrap()[20..24],
        &5.0f32.to_ne_bytes()
    );
}
