pub mod algorithm;
pub mod repository;
pub mod resolve;
pub mod script;
pub mod wireframe;
