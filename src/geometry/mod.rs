//! Small geometric building blocks shared by the pipeline stages

pub mod easing;
pub mod polygon;
pub mod spline;

pub use easing::{ease_out_quad, lerp, smoothstep};
pub use polygon::{
    bounds_xz, centroid_xz, contains_xz, distance_to_edges_xz, ray_intersection_xz,
    signed_area_xz, xz,
};
pub use spline::{sample_closed, sample_open};
