mod component;
mod io;
mod projection;
mod render;
pub mod scale;
mod state;
mod topology;
mod types;

pub use component::FlowMapCanvas;
