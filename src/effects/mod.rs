//! Decorative effects
//!
//! Rendering lives behind [`light_rays::RaysSurface`]; this module only owns
//! configuration, uniforms and surface lifecycle.

pub mod light_rays;

pub use light_rays::{
    anchor_and_dir, hex_to_rgb, EffectError, LightRays, LightRaysConfig, RaysBackend, RaysOrigin,
    RaysSurface, RaysUniforms,
};
