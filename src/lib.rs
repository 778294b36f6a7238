pub mod camera;
pub mod collision;
pub mod config;
pub mod geometry;
pub mod mapfile;
pub mod raycaster;
pub mod renderer;
pub mod scaler;
pub mod world;
