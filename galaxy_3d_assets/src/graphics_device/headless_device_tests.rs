use super::*;

// ============================================================================
// Helpers
// ============================================================================

const VERTEX_SOURCE: &str = "\
#version 330 core
uniform mat4 u_mvp;
uniform vec4 u_tint;
in vec3 position;
void main() { gl_Position = u_mvp * vec4(position, 1.0); }
";

const FRAGMENT_SOURCE: &str = "\
#version 330 core
uniform sampler2D u_texture;
uniform vec4 u_tint;
out vec4 color;
void main() { color = u_tint; }
";

fn linked_program(device: &mut HeadlessDevice) -> ProgramHandle {
    let vs = device.create_shader(ShaderStage::Vertex, VERTEX_SOURCE).unwrap();
    let fs = device.create_shader(ShaderStage::Fragment, FRAGMENT_SOURCE).unwrap();
    device.link_program(&[vs, fs]).unwrap()
}

// ============================================================================
// Buffer tests
// ============================================================================

#[test]
fn test_create_buffer_stores_data() {
    let mut device = HeadlessDevice::new();
    let buffer = device.create_buffer(BufferTarget::Vertex, &[1, 2, 3, 4], BufferUsage::StaticDraw).unwrap();

    assert_eq!(device.buffer_data(buffer), Some(&[1u8, 2, 3, 4][..]));
    assert_eq!(device.buffer_info(buffer), Some((BufferTarget::Vertex, BufferUsage::StaticDraw)));
    assert_eq!(device.live_buffers(), 1);
}

#[test]
fn test_allocate_buffer_is_zeroed() {
    let mut device = HeadlessDevice::new();
    let buffer = device.allocate_buffer(BufferTarget::PixelUnpack, 8, BufferUsage::StreamDraw).unwrap();

    assert_eq!(device.buffer_data(buffer), Some(&[0u8; 8][..]));
}

#[test]
fn test_update_buffer_sub_range() {
    let mut device = HeadlessDevice::new();
    let buffer = device.create_buffer(BufferTarget::Vertex, &[0; 6], BufferUsage::DynamicDraw).unwrap();

    device.update_buffer(buffer, 2, &[7, 8]).unwrap();

    assert_eq!(device.buffer_data(buffer), Some(&[0u8, 0, 7, 8, 0, 0][..]));
}

#[test]
fn test_update_buffer_past_end_fails() {
    let mut device = HeadlessDevice::new();
    let buffer = device.create_buffer(BufferTarget::Vertex, &[0; 4], BufferUsage::StaticDraw).unwrap();

    let result = device.update_buffer(buffer, 2, &[1, 2, 3]);
    assert!(matches!(result, Err(Error::BackendError(_))));
}

#[test]
fn test_map_unmap_cycle() {
    let mut device = HeadlessDevice::new();
    let buffer = device.allocate_buffer(BufferTarget::PixelUnpack, 4, BufferUsage::StreamDraw).unwrap();

    {
        let mapped = device.map_buffer(buffer).unwrap();
        mapped.copy_from_slice(&[9, 9, 9, 9]);
    }
    assert!(device.map_buffer(buffer).is_err());
    device.unmap_buffer(buffer).unwrap();
    assert!(device.unmap_buffer(buffer).is_err());

    assert_eq!(device.buffer_data(buffer), Some(&[9u8; 4][..]));
}

#[test]
fn test_delete_buffer_twice_is_stale() {
    let mut device = HeadlessDevice::new();
    let buffer = device.create_buffer(BufferTarget::Index, &[0, 1, 2], BufferUsage::StaticDraw).unwrap();

    device.delete_buffer(buffer);
    device.delete_buffer(buffer);

    assert_eq!(device.live_buffers(), 0);
    assert_eq!(device.stale_deletes(), 1);
}

#[test]
fn test_stale_handle_does_not_alias_new_buffer() {
    let mut device = HeadlessDevice::new();
    let old = device.create_buffer(BufferTarget::Vertex, &[1], BufferUsage::StaticDraw).unwrap();
    device.delete_buffer(old);
    let new = device.create_buffer(BufferTarget::Vertex, &[2], BufferUsage::StaticDraw).unwrap();

    assert_ne!(old, new);
    assert!(device.buffer_data(old).is_none());
    assert!(device.update_buffer(old, 0, &[5]).is_err());
    assert_eq!(device.buffer_data(new), Some(&[2u8][..]));
}

// ============================================================================
// Vertex array tests
// ============================================================================

#[test]
fn test_vertex_attribute_recorded_on_bound_array() {
    let mut device = HeadlessDevice::new();
    let buffer = device.create_buffer(BufferTarget::Vertex, &[0; 24], BufferUsage::StaticDraw).unwrap();
    let indices = device.create_buffer(BufferTarget::Index, &[0, 1, 2], BufferUsage::StaticDraw).unwrap();
    let vao = device.create_vertex_array().unwrap();

    device.bind_vertex_array(Some(vao));
    device.vertex_attribute_pointer(0, buffer, 3, ScalarType::F32);
    device.bind_index_buffer(indices);
    device.bind_vertex_array(None);

    assert_eq!(
        device.vertex_attribute(vao, 0),
        Some(VertexAttribute { buffer, components: 3, scalar: ScalarType::F32 })
    );
    assert_eq!(device.vertex_attribute_count(vao), 1);
    assert_eq!(device.vertex_array_index_buffer(vao), Some(indices));
}

#[test]
fn test_attribute_pointer_without_bound_array_is_ignored() {
    let mut device = HeadlessDevice::new();
    let buffer = device.create_buffer(BufferTarget::Vertex, &[0; 8], BufferUsage::StaticDraw).unwrap();
    let vao = device.create_vertex_array().unwrap();

    device.vertex_attribute_pointer(0, buffer, 2, ScalarType::F32);

    assert_eq!(device.vertex_attribute_count(vao), 0);
}

#[test]
fn test_delete_bound_vertex_array_unbinds() {
    let mut device = HeadlessDevice::new();
    let vao = device.create_vertex_array().unwrap();
    device.bind_vertex_array(Some(vao));

    device.delete_vertex_array(vao);

    assert_eq!(device.bound_vertex_array(), None);
    assert_eq!(device.live_vertex_arrays(), 0);
}

// ============================================================================
// Texture tests
// ============================================================================

#[test]
fn test_create_texture_allocates_level_zero() {
    let mut device = HeadlessDevice::new();
    let texture = device.create_texture(2, 3, &SamplerDesc::default()).unwrap();

    assert_eq!(device.texture_level(texture, 0).map(|l| l.len()), Some(24));
    assert_eq!(device.texture_sampler(texture), Some(SamplerDesc::default()));
}

#[test]
fn test_create_texture_zero_size_fails() {
    let mut device = HeadlessDevice::new();
    assert!(device.create_texture(0, 4, &SamplerDesc::default()).is_err());
    assert_eq!(device.live_textures(), 0);
}

#[test]
fn test_upload_texture_mip_level() {
    let mut device = HeadlessDevice::new();
    let texture = device.create_texture(4, 4, &SamplerDesc::default()).unwrap();

    device.upload_texture(texture, 1, 2, 2, &[5u8; 16]).unwrap();

    assert_eq!(device.texture_level(texture, 1), Some(&[5u8; 16][..]));
}

#[test]
fn test_upload_texture_too_large_fails() {
    let mut device = HeadlessDevice::new();
    let texture = device.create_texture(4, 4, &SamplerDesc::default()).unwrap();

    assert!(device.upload_texture(texture, 1, 4, 4, &[0u8; 64]).is_err());
}

#[test]
fn test_copy_buffer_to_texture_region() {
    let mut device = HeadlessDevice::new();
    let texture = device.create_texture(2, 2, &SamplerDesc::default()).unwrap();
    let staging = device.create_buffer(
        BufferTarget::PixelUnpack,
        &[1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4],
        BufferUsage::StreamDraw,
    ).unwrap();

    // Second pixel of each staging row lands in the right column
    let copy = TextureCopy {
        x: 1,
        y: 0,
        width: 1,
        height: 2,
        buffer_offset: 4,
        buffer_row_pixels: 2,
    };
    device.copy_buffer_to_texture(texture, 0, staging, &copy).unwrap();

    assert_eq!(
        device.texture_level(texture, 0),
        Some(&[0, 0, 0, 0, 2, 2, 2, 2, 0, 0, 0, 0, 4, 4, 4, 4][..])
    );
}

#[test]
fn test_copy_from_mapped_buffer_fails() {
    let mut device = HeadlessDevice::new();
    let texture = device.create_texture(1, 1, &SamplerDesc::default()).unwrap();
    let staging = device.allocate_buffer(BufferTarget::PixelUnpack, 4, BufferUsage::StreamDraw).unwrap();
    device.map_buffer(staging).unwrap();

    let copy = TextureCopy { x: 0, y: 0, width: 1, height: 1, buffer_offset: 0, buffer_row_pixels: 1 };
    assert!(device.copy_buffer_to_texture(texture, 0, staging, &copy).is_err());
}

#[test]
fn test_bind_and_delete_texture() {
    let mut device = HeadlessDevice::new();
    let texture = device.create_texture(1, 1, &SamplerDesc::default()).unwrap();

    device.bind_texture(3, Some(texture));
    assert_eq!(device.bound_texture(3), Some(texture));

    device.delete_texture(texture);
    assert_eq!(device.bound_texture(3), None);
    assert_eq!(device.live_textures(), 0);
}

// ============================================================================
// Shader and program tests
// ============================================================================

#[test]
fn test_shader_compiles_cleanly() {
    let mut device = HeadlessDevice::new();
    let shader = device.create_shader(ShaderStage::Vertex, VERTEX_SOURCE).unwrap();

    assert!(device.shader_info_log(shader).is_empty());
    assert_eq!(device.shader_stage(shader), Some(ShaderStage::Vertex));
}

#[test]
fn test_error_directive_produces_log() {
    let mut device = HeadlessDevice::new();
    let shader = device.create_shader(ShaderStage::Fragment, "void main() {}\n#error missing output\n").unwrap();

    let log = device.shader_info_log(shader);
    assert!(log.contains("missing output"));
    assert!(log.starts_with("0:2:"));
}

#[test]
fn test_program_uniforms_merged_across_stages() {
    let mut device = HeadlessDevice::new();
    let program = linked_program(&mut device);

    let mvp = device.uniform_location(program, "u_mvp").unwrap();
    let tint = device.uniform_location(program, "u_tint").unwrap();
    let texture = device.uniform_location(program, "u_texture").unwrap();

    assert_eq!(device.uniform_name(program, mvp), Some("u_mvp"));
    assert_eq!(device.uniform_name(program, tint), Some("u_tint"));
    assert_eq!(device.uniform_name(program, texture), Some("u_texture"));
    assert_eq!(device.uniform_location(program, "u_missing"), None);
}

#[test]
fn test_array_uniform_declaration() {
    let mut device = HeadlessDevice::new();
    let vs = device.create_shader(ShaderStage::Vertex, "uniform vec3 u_lights[4];\n").unwrap();
    let program = device.link_program(&[vs]).unwrap();

    assert!(device.uniform_location(program, "u_lights").is_some());
}

#[test]
fn test_fail_next_link_applies_once() {
    let mut device = HeadlessDevice::new();
    device.fail_next_link("undefined symbol");

    let failed = linked_program(&mut device);
    let linked = linked_program(&mut device);

    assert_eq!(device.program_info_log(failed), "undefined symbol");
    assert!(device.program_info_log(linked).is_empty());
    assert_eq!(device.link_count(), 2);
}

#[test]
fn test_link_with_deleted_shader_fails() {
    let mut device = HeadlessDevice::new();
    let vs = device.create_shader(ShaderStage::Vertex, VERTEX_SOURCE).unwrap();
    device.delete_shader(vs);

    assert!(device.link_program(&[vs]).is_err());
}

#[test]
fn test_bind_attribute_location_rules() {
    let mut device = HeadlessDevice::new().with_max_vertex_attributes(4);
    let program = linked_program(&mut device);

    assert_eq!(device.bind_attribute_location(program, 3, "tangent"), Ok(()));
    assert_eq!(device.attribute_location(program, "tangent"), Some(3));
    assert_eq!(
        device.bind_attribute_location(program, 4, "bitangent"),
        Err(AttributeBindingError::LocationOutOfRange)
    );
    assert_eq!(
        device.bind_attribute_location(program, 1, "gl_VertexID"),
        Err(AttributeBindingError::ReservedName)
    );
}

#[test]
fn test_delete_current_program_clears_binding() {
    let mut device = HeadlessDevice::new();
    let program = linked_program(&mut device);
    device.use_program(Some(program));

    device.delete_program(program);

    assert_eq!(device.bound_program(), None);
    assert_eq!(device.live_programs(), 0);
}

// ============================================================================
// Draw tests
// ============================================================================

#[test]
fn test_draw_records_bound_state() {
    let mut device = HeadlessDevice::new();
    let program = linked_program(&mut device);
    let indices = device.create_buffer(BufferTarget::Index, &[0, 1, 2], BufferUsage::StaticDraw).unwrap();
    let vao = device.create_vertex_array().unwrap();
    let texture = device.create_texture(1, 1, &SamplerDesc::default()).unwrap();

    device.bind_vertex_array(Some(vao));
    device.bind_index_buffer(indices);
    device.use_program(Some(program));
    device.bind_texture(1, Some(texture));
    let tint = device.uniform_location(program, "u_tint").unwrap();
    device.set_uniform(tint, &UniformValue::Float(0.5));
    device.draw_elements(PrimitiveTopology::Triangles, 3, IndexType::U8);

    let draw = &device.draw_calls()[0];
    assert_eq!(draw.count, 3);
    assert_eq!(draw.index_type, IndexType::U8);
    assert_eq!(draw.program, Some(program));
    assert_eq!(draw.vertex_array, Some(vao));
    assert_eq!(draw.index_buffer, Some(indices));
    assert_eq!(draw.textures, vec![(1, texture)]);

    assert_eq!(
        device.uniform_writes(),
        &[UniformWrite { program: Some(program), location: tint, value: UniformValue::Float(0.5) }]
    );
}
