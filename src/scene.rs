pub mod camera;
pub mod context;
pub mod graph;
pub mod library;
pub mod light;
pub mod material;
pub mod mesh;
pub mod solid;
pub mod texture;
