pub mod analyses;
pub mod blobs;
