//! Built-in scene builders.
//!
//! Every builder leaves an already published scene alone, so a graph shared
//! across animation frames is only constructed once.

use crate::core::math::transform::TransformFactory;
use crate::io::params::{parse_key_value_list, try_parse};
use crate::scene::camera::Camera;
use crate::scene::graph::{Attribute, NodeId, SceneGraph, SetOperation};
use crate::scene::light::Light;
use crate::scene::material::PhongMaterial;
use crate::scene::solid::{Cube, Plane, Sphere};
use crate::scene::texture::{CheckerTexture, WoodTexture};
use nalgebra::{Matrix4, Point3, Vector3};
use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

/// Tooltip describing the parameters accepted by [`cube_rows`].
pub const CUBE_ROWS_TOOLTIP: &str = "n=<double> (index of refraction), mat={mirror|glass|diffuse}, rows={1|2}";

/// Checkered ground plane with a single sphere. Used as the fallback scene.
pub fn default_scene(scene: &mut SceneGraph) {
    if scene.is_ready() {
        return;
    }

    let root = scene.add_inner(SetOperation::Union);
    scene.set_attribute(
        root,
        Attribute::Material(PhongMaterial::new(Vector3::new(1.0, 0.8, 0.1), 0.1, 0.6, 0.4, 16)),
    );
    scene.root = Some(root);

    scene.camera = Some(Camera::new(
        Point3::new(0.0, 0.0, -10.0),
        Vector3::new(0.0, -0.04, 1.0),
        40.0,
    ));
    scene.lights = vec![
        Light::new_ambient(1.0),
        Light::new_point(Point3::new(-5.0, 4.0, -3.0), 1.2),
    ];

    let sphere = scene.add_solid(Sphere::default());
    scene.insert_child(root, sphere, Matrix4::identity());

    add_ground(scene, root, Vector3::new(0.3, 0.3, 0.3), Vector3::new(0.9, 0.9, 0.9));

    scene.background = Some(Vector3::new(0.1, 0.2, 0.3));
}

/// Two rows of rotated cubes above a checkered plane.
///
/// Parameters: `n=<refractive index>`, `mat={mirror|glass|diffuse}`, `rows={1|2}`.
pub fn cube_rows(scene: &mut SceneGraph, param: &str) {
    if scene.is_ready() {
        return;
    }

    let p = parse_key_value_list(param);
    let mut n = 1.6_f32;
    try_parse(&p, "n", &mut n);
    let mut rows = 2_u32;
    try_parse(&p, "rows", &mut rows);

    let base = Vector3::new(1.0, 0.6, 0.1);
    let material = match p.get("mat").map(String::as_str) {
        Some("mirror") => PhongMaterial::new(Vector3::new(1.0, 1.0, 0.8), 0.0, 0.1, 0.9, 128),
        Some("glass") => PhongMaterial::new(Vector3::new(0.0, 0.2, 0.1), 0.05, 0.05, 0.1, 128)
            .with_transmission(n, 0.9),
        _ => PhongMaterial::new(base, 0.1, 0.8, 0.2, 16),
    };

    let root = scene.add_inner(SetOperation::Union);
    scene.set_attribute(root, Attribute::Material(PhongMaterial::new(base, 0.1, 0.8, 0.2, 16)));
    scene.root = Some(root);

    scene.camera = Some(Camera::new(
        Point3::new(0.7, 3.0, -10.0),
        Vector3::new(0.0, -0.3, 1.0),
        50.0,
    ));
    scene.lights = vec![
        Light::new_ambient(0.8),
        Light::new_point(Point3::new(-5.0, 3.0, -3.0), 1.0),
    ];

    add_ground(scene, root, Vector3::new(0.6, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));

    // Front row spins around Y.
    for i in 0..5 {
        let cube = scene.add_solid(Cube);
        let x = -3.5 + 2.0 * i as f32;
        let transform = TransformFactory::translation(&Vector3::new(x, -0.8, 0.0))
            * TransformFactory::rotation_y(0.6 * (i + 1) as f32);
        scene.insert_child(root, cube, transform);
        scene.set_attribute(cube, Attribute::Material(material.clone()));
    }

    // Back row tumbles around X.
    if rows > 1 {
        for i in 0..7 {
            let cube = scene.add_solid(Cube);
            let x = -4.0 + 1.5 * i as f32;
            let transform = TransformFactory::translation(&Vector3::new(x, 1.0, 2.0))
                * TransformFactory::rotation_x(3.5 - 0.5 * i as f32);
            scene.insert_child(root, cube, transform);
            scene.set_attribute(cube, Attribute::Material(material.clone()));
        }
    }

    scene.background = Some(Vector3::new(0.0, 0.05, 0.07));
}

/// Stack of wooden blocks; exercises the solid wood texture.
pub fn wooden_blocks(scene: &mut SceneGraph) {
    if scene.is_ready() {
        return;
    }

    let root = scene.add_inner(SetOperation::Union);
    scene.set_attribute(
        root,
        Attribute::Material(PhongMaterial::new(Vector3::new(0.5, 0.3, 0.15), 0.2, 0.7, 0.1, 8)),
    );
    scene.root = Some(root);

    scene.camera = Some(Camera::new(
        Point3::new(2.0, 2.5, -7.0),
        Vector3::new(-0.25, -0.35, 1.0),
        45.0,
    ));
    scene.lights = vec![
        Light::new_ambient(0.6),
        Light::new_point(Point3::new(-4.0, 6.0, -5.0), 1.0),
    ];

    add_ground(scene, root, Vector3::new(0.2, 0.25, 0.2), Vector3::new(0.35, 0.4, 0.35));

    let blocks = scene.add_inner(SetOperation::Union);
    scene.set_attribute(blocks, Attribute::Texture(Arc::new(WoodTexture::default())));
    scene.insert_child(root, blocks, TransformFactory::translation(&Vector3::new(0.0, -0.5, 0.0)));

    for (i, (x, y, z)) in [(-0.6, 0.0, 0.0), (0.6, 0.0, 0.0), (0.0, 1.0, 0.0)]
        .into_iter()
        .enumerate()
    {
        let block = scene.add_solid(Cube);
        let transform = TransformFactory::placement(
            &Vector3::new(x, y, z),
            &Vector3::new(0.0, 15.0 * i as f32, 0.0),
            &Vector3::new(1.0, 1.0, 2.0),
        );
        scene.insert_child(blocks, block, transform);
    }
    let cap = scene.add_solid(Sphere::default());
    scene.insert_child(
        blocks,
        cap,
        TransformFactory::placement(
            &Vector3::new(0.0, 1.9, 0.0),
            &Vector3::zeros(),
            &Vector3::new(0.4, 0.4, 0.4),
        ),
    );
    scene.set_attribute(
        cap,
        Attribute::Texture(Arc::new(WoodTexture::new(9.0, 7).with_colors(
            Vector3::new(0.8, 0.6, 0.4),
            Vector3::new(0.4, 0.25, 0.1),
        ))),
    );

    scene.background = Some(Vector3::new(0.05, 0.05, 0.08));
}

/// Horizontal checkered plane at y = -1.
fn add_ground(
    scene: &mut SceneGraph,
    root: NodeId,
    color: Vector3<f32>,
    checker: Vector3<f32>,
) {
    let plane = scene.add_solid(Plane::default());
    let transform = TransformFactory::translation(&Vector3::new(0.0, -1.0, 0.0))
        * TransformFactory::rotation_x(-FRAC_PI_2);
    scene.insert_child(root, plane, transform);
    scene.set_attribute(plane, Attribute::Color(color));
    scene.set_attribute(plane, Attribute::Texture(Arc::new(CheckerTexture::new(0.5, 0.5, checker))));
}
