//! Distance falloff and light-source aggregation.

use crate::components::{GridElement, LightSource, Rgba};
use crate::ecs::World;
use crate::level::Position;

/// Darkness at or beyond the vision radius.
pub const MAX_DISTANCE_DARKNESS: f64 = 0.95;

/// Darkness of a visible tile at `distance` tiles from the viewer.
///
/// Fully lit up to 20% of the radius, then a 1.5-power ramp towards
/// [`MAX_DISTANCE_DARKNESS`].
pub fn distance_darkness(distance: f64, radius: f64) -> f64 {
    if radius <= 0.0 {
        return MAX_DISTANCE_DARKNESS;
    }
    let d = distance / radius;
    if d <= 0.2 {
        0.0
    } else if d <= 1.0 {
        ((d - 0.2) / 0.8).powf(1.5) * MAX_DISTANCE_DARKNESS
    } else {
        MAX_DISTANCE_DARKNESS
    }
}

/// Aggregated light on one tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightInfo {
    pub darkness: f64,
    pub color: Rgba,
}

impl LightInfo {
    pub const UNLIT: LightInfo = LightInfo {
        darkness: 1.0,
        color: Rgba::BLACK,
    };

    pub fn is_lit(&self) -> bool {
        self.darkness < 1.0
    }
}

/// Enabled light sources with their tile position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedLight {
    pub position: Position,
    pub light: LightSource,
}

pub fn collect_lights(world: &World) -> Vec<PlacedLight> {
    world
        .iter::<LightSource>()
        .filter(|(_, light)| light.enabled && light.radius > 0)
        .filter_map(|(entity, light)| {
            let position = world.get::<GridElement>(entity)?.position();
            Some(PlacedLight {
                position,
                light: *light,
            })
        })
        .collect()
}

/// Combines every light reaching `tile`.
///
/// Each source in range contributes `d^1.5 · 0.6 + 0.3` darkness (with
/// distances below one tile counted as one tile); the tile keeps the
/// minimum. Colours are averaged with weight `1 - d`.
pub fn light_at(tile: Position, lights: &[PlacedLight]) -> LightInfo {
    let mut darkness = f64::INFINITY;
    let mut weight_sum = 0.0;
    let mut rgb = [0.0f64; 3];
    let mut plain = [0.0f64; 3];
    let mut contributors = 0u32;

    for placed in lights {
        let radius = f64::from(placed.light.radius);
        let distance = tile.euclidean(placed.position);
        if distance > radius {
            continue;
        }
        let norm = (distance.max(1.0) / radius).min(1.0);
        darkness = darkness.min(norm.powf(1.5) * 0.6 + 0.3);

        let c = placed.light.color;
        let channels = [f64::from(c.r), f64::from(c.g), f64::from(c.b)];
        let weight = 1.0 - norm;
        for i in 0..3 {
            rgb[i] += channels[i] * weight;
            plain[i] += channels[i];
        }
        weight_sum += weight;
        contributors += 1;
    }

    if contributors == 0 {
        return LightInfo::UNLIT;
    }
    let mixed = if weight_sum > 0.0 {
        rgb.map(|v| v / weight_sum)
    } else {
        plain.map(|v| v / f64::from(contributors))
    };
    LightInfo {
        darkness,
        color: Rgba::new(
            mixed[0].round().clamp(0.0, 255.0) as u8,
            mixed[1].round().clamp(0.0, 255.0) as u8,
            mixed[2].round().clamp(0.0, 255.0) as u8,
            255,
        ),
    }
}
