//! Geometry primitives: rigid poses and similarity transforms.

pub mod pose;
pub mod sim3;

pub use pose::Pose;
pub use sim3::SimilarityTransform;
