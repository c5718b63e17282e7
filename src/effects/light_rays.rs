//! Light-ray background controller
//!
//! Drives a full-screen ray shader through an abstract surface:
//! - the surface is created lazily, the first time the container is visible
//! - frames are only rendered while visible
//! - the pointer position is smoothed toward the target every frame
//! - hiding, stopping or dropping the controller releases the surface once

use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, warn};

/// Exponential smoothing factor applied to the pointer per frame
const POINTER_SMOOTHING: f32 = 0.92;

/// Device pixel ratio cap
const MAX_DPR: f32 = 2.0;

/// How far outside the viewport the ray source sits, as a fraction
const ANCHOR_OFFSET: f32 = 0.2;

#[derive(Error, Debug)]
pub enum EffectError {
    #[error("failed to create rendering surface: {0}")]
    Create(String),

    #[error("render failed: {0}")]
    Render(String),
}

/// Where the rays emanate from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RaysOrigin {
    TopLeft,
    #[default]
    TopCenter,
    TopRight,
    Left,
    Right,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl FromStr for RaysOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "top-left" => Ok(Self::TopLeft),
            "top-center" => Ok(Self::TopCenter),
            "top-right" => Ok(Self::TopRight),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "bottom-left" => Ok(Self::BottomLeft),
            "bottom-center" => Ok(Self::BottomCenter),
            "bottom-right" => Ok(Self::BottomRight),
            other => Err(format!("unknown rays origin: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightRaysConfig {
    pub origin: RaysOrigin,
    /// `#rrggbb`, `#` optional
    pub color: String,
    pub speed: f32,
    pub light_spread: f32,
    pub ray_length: f32,
    pub pulsating: bool,
    pub fade_distance: f32,
    pub saturation: f32,
    pub follow_mouse: bool,
    pub mouse_influence: f32,
    pub noise_amount: f32,
    pub distortion: f32,
}

impl Default for LightRaysConfig {
    fn default() -> Self {
        Self {
            origin: RaysOrigin::TopCenter,
            color: "#ffffff".to_string(),
            speed: 1.0,
            light_spread: 1.0,
            ray_length: 2.0,
            pulsating: false,
            fade_distance: 1.0,
            saturation: 1.0,
            follow_mouse: true,
            mouse_influence: 0.1,
            noise_amount: 0.0,
            distortion: 0.0,
        }
    }
}

/// Values handed to the surface on every frame
#[derive(Debug, Clone, PartialEq)]
pub struct RaysUniforms {
    /// Seconds
    pub time: f32,
    /// Device pixels
    pub resolution: [f32; 2],
    pub ray_pos: [f32; 2],
    pub ray_dir: [f32; 2],
    pub color: [f32; 3],
    pub speed: f32,
    pub light_spread: f32,
    pub ray_length: f32,
    pub pulsating: f32,
    pub fade_distance: f32,
    pub saturation: f32,
    /// Normalized to the container, (0.5, 0.5) is the center
    pub mouse_pos: [f32; 2],
    pub mouse_influence: f32,
    pub noise_amount: f32,
    pub distortion: f32,
}

impl RaysUniforms {
    fn from_config(config: &LightRaysConfig) -> Self {
        Self {
            time: 0.0,
            resolution: [0.0, 0.0],
            ray_pos: [0.0, 0.0],
            ray_dir: [0.0, 1.0],
            color: hex_to_rgb(&config.color),
            speed: config.speed,
            light_spread: config.light_spread,
            ray_length: config.ray_length,
            pulsating: if config.pulsating { 1.0 } else { 0.0 },
            fade_distance: config.fade_distance,
            saturation: config.saturation,
            mouse_pos: [0.5, 0.5],
            mouse_influence: config.mouse_influence,
            noise_amount: config.noise_amount,
            distortion: config.distortion,
        }
    }
}

/// A live rendering surface (GL context, canvas, ...)
pub trait RaysSurface {
    fn render(&mut self, uniforms: &RaysUniforms) -> Result<(), EffectError>;

    /// Give back the underlying resources
    fn release(&mut self);
}

/// Creates surfaces on demand
pub trait RaysBackend {
    type Surface: RaysSurface;

    fn create(&mut self) -> Result<Self::Surface, EffectError>;
}

/// `#rrggbb` to normalized RGB; anything else is white
pub fn hex_to_rgb(hex: &str) -> [f32; 3] {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return [1.0, 1.0, 1.0];
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map(|v| v as f32 / 255.0)
            .unwrap_or(1.0)
    };
    [channel(0..2), channel(2..4), channel(4..6)]
}

/// Ray source and direction for a viewport of `width` x `height` pixels
pub fn anchor_and_dir(origin: RaysOrigin, width: f32, height: f32) -> ([f32; 2], [f32; 2]) {
    let outside = ANCHOR_OFFSET;
    match origin {
        RaysOrigin::TopLeft => ([0.0, -outside * height], [0.0, 1.0]),
        RaysOrigin::TopCenter => ([0.5 * width, -outside * height], [0.0, 1.0]),
        RaysOrigin::TopRight => ([width, -outside * height], [0.0, 1.0]),
        RaysOrigin::Left => ([-outside * width, 0.5 * height], [1.0, 0.0]),
        RaysOrigin::Right => ([(1.0 + outside) * width, 0.5 * height], [-1.0, 0.0]),
        RaysOrigin::BottomLeft => ([0.0, (1.0 + outside) * height], [0.0, -1.0]),
        RaysOrigin::BottomCenter => ([0.5 * width, (1.0 + outside) * height], [0.0, -1.0]),
        RaysOrigin::BottomRight => ([width, (1.0 + outside) * height], [0.0, -1.0]),
    }
}

/// Lifecycle controller for one light-ray container
pub struct LightRays<B: RaysBackend> {
    backend: B,
    config: LightRaysConfig,
    surface: Option<B::Surface>,
    uniforms: RaysUniforms,
    visible: bool,
    css_size: [f32; 2],
    dpr: f32,
    pointer: [f32; 2],
    smooth_pointer: [f32; 2],
}

impl<B: RaysBackend> LightRays<B> {
    pub fn new(backend: B, config: LightRaysConfig) -> Self {
        let uniforms = RaysUniforms::from_config(&config);
        Self {
            backend,
            config,
            surface: None,
            uniforms,
            visible: false,
            css_size: [0.0, 0.0],
            dpr: 1.0,
            pointer: [0.5, 0.5],
            smooth_pointer: [0.5, 0.5],
        }
    }

    pub fn config(&self) -> &LightRaysConfig {
        &self.config
    }

    pub fn uniforms(&self) -> &RaysUniforms {
        &self.uniforms
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    /// Replace the configuration; takes effect on the next frame
    pub fn set_config(&mut self, config: LightRaysConfig) {
        let mut uniforms = RaysUniforms::from_config(&config);
        uniforms.time = self.uniforms.time;
        uniforms.resolution = self.uniforms.resolution;
        uniforms.mouse_pos = self.uniforms.mouse_pos;
        self.uniforms = uniforms;
        self.config = config;
        self.update_geometry();
    }

    /// Visibility change; the surface follows it
    pub fn set_visible(&mut self, visible: bool) -> Result<(), EffectError> {
        self.visible = visible;
        if !visible {
            self.teardown();
            return Ok(());
        }

        if self.surface.is_none() {
            let surface = self.backend.create()?;
            debug!("Light rays surface created");
            self.surface = Some(surface);
        }
        Ok(())
    }

    /// Container size in CSS pixels plus the device pixel ratio
    pub fn resize(&mut self, width: f32, height: f32, dpr: f32) {
        self.css_size = [width.max(0.0), height.max(0.0)];
        self.dpr = dpr.clamp(f32::MIN_POSITIVE, MAX_DPR);
        self.update_geometry();
    }

    /// Pointer position normalized to the container
    pub fn set_pointer(&mut self, x: f32, y: f32) {
        self.pointer = [x, y];
    }

    /// Render one frame at `time_ms`; false when nothing was drawn
    pub fn frame(&mut self, time_ms: f64) -> bool {
        if !self.visible {
            return false;
        }
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };

        self.uniforms.time = (time_ms * 0.001) as f32;

        if self.config.follow_mouse && self.config.mouse_influence > 0.0 {
            for axis in 0..2 {
                self.smooth_pointer[axis] = self.smooth_pointer[axis] * POINTER_SMOOTHING
                    + self.pointer[axis] * (1.0 - POINTER_SMOOTHING);
            }
            self.uniforms.mouse_pos = self.smooth_pointer;
        }

        match surface.render(&self.uniforms) {
            Ok(()) => true,
            Err(e) => {
                warn!("Light rays frame failed: {}", e);
                false
            }
        }
    }

    /// Stop rendering and release the surface
    pub fn stop(&mut self) {
        self.visible = false;
        self.teardown();
    }

    fn update_geometry(&mut self) {
        let width = self.css_size[0] * self.dpr;
        let height = self.css_size[1] * self.dpr;
        let (anchor, dir) = anchor_and_dir(self.config.origin, width, height);
        self.uniforms.resolution = [width, height];
        self.uniforms.ray_pos = anchor;
        self.uniforms.ray_dir = dir;
    }

    fn teardown(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            surface.release();
            debug!("Light rays surface released");
        }
    }
}

impl<B: RaysBackend> Drop for LightRays<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}
