//! AI analysis of resumes: prompt building, response normalization, fallback,
//! and the heuristic checks that run alongside the model.

pub mod ats;
pub mod fallback;
pub mod handlers;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod prompts;
pub mod sections;
