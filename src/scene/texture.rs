use nalgebra::{Point3, Vector2, Vector3};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::fmt::Debug;

/// Surface data a texture may read and modulate.
#[derive(Debug, Clone, PartialEq)]
pub struct Intersection {
    /// Hit point in the solid's local coordinates.
    pub coord_local: Point3<f32>,
    /// 2D surface parametrization.
    pub tex_coord: Vector2<f32>,
    /// Color modulated in place by textures.
    pub surface_color: Vector3<f32>,
    pub texture_applied: bool,
}

impl Intersection {
    pub fn new(coord_local: Point3<f32>, tex_coord: Vector2<f32>, surface_color: Vector3<f32>) -> Self {
        Self {
            coord_local,
            tex_coord,
            surface_color,
            texture_applied: false,
        }
    }
}

/// Procedural texture applied at an intersection.
///
/// `apply` mutates `surface_color` in place and returns a signature for
/// adaptive sampling: two samples with equal signatures may share a result.
pub trait Texture: Debug + Send + Sync {
    fn apply(&self, inter: &mut Intersection) -> i64;
}

/// Two-color checkerboard over the surface parametrization.
#[derive(Debug, Clone)]
pub struct CheckerTexture {
    /// Cell size along u.
    pub fu: f32,
    /// Cell size along v.
    pub fv: f32,
    /// Color of odd cells; even cells keep the surface color.
    pub color2: Vector3<f32>,
}

impl CheckerTexture {
    pub fn new(fu: f32, fv: f32, color2: Vector3<f32>) -> Self {
        Self { fu, fv, color2 }
    }
}

impl Texture for CheckerTexture {
    fn apply(&self, inter: &mut Intersection) -> i64 {
        let ui = (inter.tex_coord.x / self.fu).floor() as i64;
        let vi = (inter.tex_coord.y / self.fv).floor() as i64;
        let parity = (ui + vi) & 1;
        if parity != 0 {
            inter.surface_color = self.color2;
        }
        inter.texture_applied = true;
        parity
    }
}

/// Improved Perlin noise over a seeded permutation table.
#[derive(Debug, Clone)]
pub struct PerlinNoise {
    perm: [u8; 512],
}

impl PerlinNoise {
    pub fn new(seed: u64) -> Self {
        let mut table: Vec<u8> = (0..=255).collect();
        table.shuffle(&mut StdRng::seed_from_u64(seed));

        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = table[i & 255];
        }
        Self { perm }
    }

    /// Noise value in roughly [-1, 1]; zero at integer lattice points.
    pub fn noise(&self, x: f32, y: f32, z: f32) -> f32 {
        let (xf, yf, zf) = (x.floor(), y.floor(), z.floor());
        let xi = (xf as i32 & 255) as usize;
        let yi = (yf as i32 & 255) as usize;
        let zi = (zf as i32 & 255) as usize;
        let (x, y, z) = (x - xf, y - yf, z - zf);
        let (u, v, w) = (fade(x), fade(y), fade(z));

        let p = &self.perm;
        let a = p[xi] as usize + yi;
        let aa = p[a] as usize + zi;
        let ab = p[a + 1] as usize + zi;
        let b = p[xi + 1] as usize + yi;
        let ba = p[b] as usize + zi;
        let bb = p[b + 1] as usize + zi;

        lerp(
            w,
            lerp(
                v,
                lerp(u, grad(p[aa], x, y, z), grad(p[ba], x - 1.0, y, z)),
                lerp(u, grad(p[ab], x, y - 1.0, z), grad(p[bb], x - 1.0, y - 1.0, z)),
            ),
            lerp(
                v,
                lerp(u, grad(p[aa + 1], x, y, z - 1.0), grad(p[ba + 1], x - 1.0, y, z - 1.0)),
                lerp(
                    u,
                    grad(p[ab + 1], x, y - 1.0, z - 1.0),
                    grad(p[bb + 1], x - 1.0, y - 1.0, z - 1.0),
                ),
            ),
        )
    }
}

#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(t: f32, a: f32, b: f32) -> f32 {
    a + t * (b - a)
}

#[inline]
fn grad(hash: u8, x: f32, y: f32, z: f32) -> f32 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}

/// Solid wood texture: concentric rings around the local Y axis, perturbed by noise.
#[derive(Debug, Clone)]
pub struct WoodTexture {
    pub light: Vector3<f32>,
    pub dark: Vector3<f32>,
    /// Ring frequency.
    pub frequency: f32,
    noise: PerlinNoise,
}

impl WoodTexture {
    pub const DEFAULT_SEED: u64 = 1337;

    pub fn new(frequency: f32, seed: u64) -> Self {
        Self {
            light: Vector3::new(0.5294, 0.2706, 0.1412),
            dark: Vector3::new(0.1922, 0.1176, 0.0549),
            frequency,
            noise: PerlinNoise::new(seed),
        }
    }

    pub fn with_colors(mut self, light: Vector3<f32>, dark: Vector3<f32>) -> Self {
        self.light = light;
        self.dark = dark;
        self
    }
}

impl Default for WoodTexture {
    fn default() -> Self {
        Self::new(5.0, Self::DEFAULT_SEED)
    }
}

impl Texture for WoodTexture {
    fn apply(&self, inter: &mut Intersection) -> i64 {
        let c = inter.coord_local;
        let rings = (c.x * c.x + c.z * c.z + self.noise.noise(c.x, c.y, c.z)) * self.frequency;
        let t = rings.rem_euclid(1.0);

        inter.surface_color = self.light + (self.dark - self.light) * t;
        inter.texture_applied = true;

        // LCG scramble of the quantized ring phase.
        let q = (t as f64 * 1.0e9) as u64;
        q.wrapping_mul(1_664_525).wrapping_add(1_013_904_223) as i64
    }
}
