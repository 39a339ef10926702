use super::*;
use crate::graphics_device::{GraphicsDevice, HeadlessDevice, ShaderStage};
use std::cell::RefCell;

const VERTEX_SOURCE: &str = "\
uniform mat4 u_mvp;
uniform float u_time;
void main() {}
";

const FRAGMENT_SOURCE: &str = "\
uniform sampler2D diffuse;
uniform sampler2D normal_map;
void main() {}
";

// ============================================================================
// Helpers
// ============================================================================

fn create_headless_device() -> (Rc<RefCell<HeadlessDevice>>, SharedDevice) {
    let headless = Rc::new(RefCell::new(HeadlessDevice::new()));
    let shared: SharedDevice = headless.clone();
    (headless, shared)
}

fn link_test_program(headless: &Rc<RefCell<HeadlessDevice>>) -> ProgramHandle {
    let mut device = headless.borrow_mut();
    let vertex = device.create_shader(ShaderStage::Vertex, VERTEX_SOURCE).unwrap();
    let fragment = device.create_shader(ShaderStage::Fragment, FRAGMENT_SOURCE).unwrap();
    device.link_program(&[vertex, fragment]).unwrap()
}

fn texture(device: &SharedDevice, name: &str) -> Rc<Texture> {
    Rc::new(Texture::new(device.clone(), name, 2, 2).unwrap())
}

// ============================================================================
// Composition
// ============================================================================

#[test]
fn test_new_material_is_empty() {
    let (_headless, device) = create_headless_device();
    let material = Material::new(device, "plain");

    assert_eq!(material.name(), "plain");
    assert!(material.textures().is_empty());
    assert!(material.samplers().is_empty());
    assert_eq!(material.program(), None);
    assert!(material.attribute_locations().is_empty());
}

#[test]
fn test_add_textures_and_samplers_keep_order() {
    let (_headless, device) = create_headless_device();
    let mut material = Material::new(device.clone(), "stone");

    material.add_textures(vec![texture(&device, "albedo"), texture(&device, "bump")]);
    material.add_samplers(["diffuse", "normal_map"]);

    let names: Vec<&str> = material.textures().iter().map(|t| t.name()).collect();
    assert_eq!(names, vec!["albedo", "bump"]);
    assert_eq!(material.samplers(), &["diffuse".to_string(), "normal_map".to_string()]);
}

#[test]
fn test_shared_texture_survives_material() {
    let (headless, device) = create_headless_device();
    let shared = texture(&device, "albedo");
    {
        let mut material = Material::new(device, "stone");
        material.add_textures([shared.clone()]);
    }
    assert_eq!(Rc::strong_count(&shared), 1);
    assert_eq!(headless.borrow().live_textures(), 1);
}

// ============================================================================
// Uniform resolution
// ============================================================================

#[test]
fn test_resolve_uniforms_without_program() {
    let (_headless, device) = create_headless_device();
    let mut material = Material::new(device, "bare");

    let result = material.resolve_uniforms(["u_mvp"]);

    assert_eq!(result, Err(Error::NoProgram { material: "bare".to_string() }));
}

#[test]
fn test_resolve_uniforms_records_locations() {
    let (headless, device) = create_headless_device();
    let program = link_test_program(&headless);
    let mut material = Material::new(device, "lit");
    material.attach_program(program);

    material.resolve_uniforms(["u_mvp", "diffuse"]).unwrap();

    let headless = headless.borrow();
    let mvp = material.uniform_location("u_mvp").unwrap();
    assert_eq!(headless.uniform_name(program, mvp), Some("u_mvp"));
    let diffuse = material.uniform_location("diffuse").unwrap();
    assert_eq!(headless.uniform_name(program, diffuse), Some("diffuse"));
    assert_eq!(material.uniform_location("u_time"), None);
}

#[test]
fn test_resolve_uniforms_unknown_aborts_remaining() {
    let (headless, device) = create_headless_device();
    let program = link_test_program(&headless);
    let mut material = Material::new(device, "lit");
    material.attach_program(program);

    let result = material.resolve_uniforms(vec!["u_mvp".to_string(), "u_missing".to_string(), "u_time".to_string()]);

    assert_eq!(
        result,
        Err(Error::UnknownUniform {
            material: "lit".to_string(),
            uniform: "u_missing".to_string(),
        })
    );
    assert!(material.uniform_location("u_mvp").is_some());
    assert_eq!(material.uniform_location("u_time"), None);
}

// ============================================================================
// Attribute locations
// ============================================================================

#[test]
fn test_bind_attribute_location_without_program() {
    let (_headless, device) = create_headless_device();
    let mut material = Material::new(device, "bare");

    assert!(matches!(
        material.bind_attribute_location("tangent", 7),
        Err(Error::NoProgram { .. })
    ));
    assert_eq!(material.attribute_location("tangent"), None);
}

#[test]
fn test_bind_attribute_location_records_slot() {
    let (headless, device) = create_headless_device();
    let program = link_test_program(&headless);
    let mut material = Material::new(device, "lit");
    material.attach_program(program);

    material.bind_attribute_location("tangent", 7).unwrap();

    assert_eq!(material.attribute_location("tangent"), Some(7));
    assert_eq!(headless.borrow().attribute_location(program, "tangent"), Some(7));
}

#[test]
fn test_bind_attribute_location_out_of_range() {
    let headless = Rc::new(RefCell::new(HeadlessDevice::new().with_max_vertex_attributes(8)));
    let device: SharedDevice = headless.clone();
    let program = link_test_program(&headless);
    let mut material = Material::new(device, "lit");
    material.attach_program(program);

    let result = material.bind_attribute_location("tangent", 8);

    assert_eq!(
        result,
        Err(Error::LocationOutOfRange {
            material: "lit".to_string(),
            attribute: "tangent".to_string(),
            location: 8,
        })
    );
    assert!(material.attribute_locations().is_empty());
}

#[test]
fn test_bind_attribute_location_reserved_name() {
    let (headless, device) = create_headless_device();
    let program = link_test_program(&headless);
    let mut material = Material::new(device, "lit");
    material.attach_program(program);

    let result = material.bind_attribute_location("gl_Position", 6);

    assert_eq!(
        result,
        Err(Error::ReservedName {
            material: "lit".to_string(),
            attribute: "gl_Position".to_string(),
        })
    );
}

// ============================================================================
// Bind / release
// ============================================================================

#[test]
fn test_bind_sets_textures_and_program() {
    let (headless, device) = create_headless_device();
    let program = link_test_program(&headless);
    let albedo = texture(&device, "albedo");
    let bump = texture(&device, "bump");
    let mut material = Material::new(device, "stone");
    material.add_textures([albedo.clone(), bump.clone()]);
    material.attach_program(program);

    material.bind();

    let state = headless.borrow();
    assert_eq!(state.bound_program(), Some(program));
    assert_eq!(state.bound_texture(0), albedo.handle());
    assert_eq!(state.bound_texture(1), bump.handle());
}

#[test]
fn test_bind_points_resolved_samplers_at_units() {
    let (headless, device) = create_headless_device();
    let program = link_test_program(&headless);
    let mut material = Material::new(device.clone(), "stone");
    material.add_textures([texture(&device, "albedo"), texture(&device, "bump")]);
    material.add_samplers(["diffuse", "normal_map"]);
    material.attach_program(program);
    material.resolve_uniforms(["diffuse", "normal_map"]).unwrap();

    material.bind();

    let state = headless.borrow();
    let writes = state.uniform_writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].program, Some(program));
    assert_eq!(state.uniform_name(program, writes[0].location), Some("diffuse"));
    assert_eq!(writes[0].value, UniformValue::Int(0));
    assert_eq!(state.uniform_name(program, writes[1].location), Some("normal_map"));
    assert_eq!(writes[1].value, UniformValue::Int(1));
}

#[test]
fn test_bind_skips_unresolved_samplers() {
    let (headless, device) = create_headless_device();
    let program = link_test_program(&headless);
    let mut material = Material::new(device.clone(), "stone");
    material.add_textures([texture(&device, "albedo")]);
    material.add_samplers(["diffuse"]);
    material.attach_program(program);

    material.bind();

    assert!(headless.borrow().uniform_writes().is_empty());
}

#[test]
fn test_release_clears_program_and_units() {
    let (headless, device) = create_headless_device();
    let program = link_test_program(&headless);
    let mut material = Material::new(device.clone(), "stone");
    material.add_textures([texture(&device, "albedo"), texture(&device, "bump")]);
    material.attach_program(program);

    material.bind();
    material.release();

    let state = headless.borrow();
    assert_eq!(state.bound_program(), None);
    assert_eq!(state.bound_texture(0), None);
    assert_eq!(state.bound_texture(1), None);
}

// ============================================================================
// Clean
// ============================================================================

#[test]
fn test_clean_drops_program_reference_only() {
    let (headless, device) = create_headless_device();
    let program = link_test_program(&headless);
    let mut material = Material::new(device, "lit");
    material.attach_program(program);

    material.clean();

    assert_eq!(material.program(), None);
    assert_eq!(headless.borrow().live_programs(), 1);
    assert!(matches!(material.resolve_uniforms(["u_mvp"]), Err(Error::NoProgram { .. })));
}
