//! `pricewatch-ai`
//!
//! Recommendation gateway over an external generative model.
//!
//! The crate never mutates catalog state and never fails a caller: every upstream
//! problem degrades to an empty recommendation list or a fallback analysis text.

pub mod gateway;
pub mod gemini;
pub mod model;
pub mod prompt;
pub mod result;

pub use gateway::{Recommendation, RecommendationContext, RecommendationGateway, parse_recommendations};
pub use gemini::{GeminiConfig, GeminiModel};
pub use model::{DisabledModel, GenerativeModel};
pub use result::AiError;
