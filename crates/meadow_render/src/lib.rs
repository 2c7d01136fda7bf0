pub mod camera;
pub mod gpu_context;
pub mod shape_pipeline;
pub mod shape_store;
pub mod shapes;
pub mod vertex;

pub use camera::{Camera2D, CameraUniform, ViewportRect};
pub use gpu_context::GpuContext;
pub use shape_pipeline::{CameraBinding, ShapePipeline};
pub use shape_store::{ShapeMesh, ShapeStore, ShapeTransform, Space};
pub use vertex::ShapeVertex;
