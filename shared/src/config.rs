/// Vortex simulation tunables
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct VortexConfig {
    /// Wormhole position in circle coordinates
    pub center_x: f64,
    pub center_y: f64,
    /// Velocity added per integration tick, split across the axes by pull ratio
    pub pull_strength: f64,
    /// Velocity multiplier applied every integration tick
    pub damping: f64,
    /// A circle is consumed once its distance to the center is <= radius * factor
    pub wormhole_factor: f64,
    /// A gem is collected once its scaled distance to a circle is <= radius * factor
    pub gem_hit_factor: f64,
    /// Gem coordinates are multiplied by this before comparing with circles
    pub gem_scale: f64,
    /// Gem coordinates are drawn from [gem_min, gem_max)
    pub gem_min: i32,
    pub gem_max: i32,
    pub gems_per_player: usize,
}

impl Default for VortexConfig {
    fn default() -> Self {
        Self {
            center_x: 250.0,
            center_y: 250.0,
            pull_strength: 0.2,
            damping: 0.999,
            wormhole_factor: 2.0,
            gem_hit_factor: 2.0,
            gem_scale: 0.1,
            gem_min: 500,
            gem_max: 4500,
            gems_per_player: 2,
        }
    }
}

impl VortexConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.center_x.is_finite() || !self.center_y.is_finite() {
            return Err("center must be finite".to_string());
        }
        if !self.pull_strength.is_finite() || self.pull_strength < 0.0 {
            return Err("pull_strength must be finite and >= 0".to_string());
        }
        if !self.damping.is_finite() || self.damping <= 0.0 || self.damping > 1.0 {
            return Err("damping must be in (0, 1]".to_string());
        }
        if !self.wormhole_factor.is_finite() || self.wormhole_factor < 0.0 {
            return Err("wormhole_factor must be finite and >= 0".to_string());
        }
        if !self.gem_hit_factor.is_finite() || self.gem_hit_factor < 0.0 {
            return Err("gem_hit_factor must be finite and >= 0".to_string());
        }
        if !self.gem_scale.is_finite() || self.gem_scale <= 0.0 {
            return Err("gem_scale must be finite and > 0".to_string());
        }
        if self.gem_max <= self.gem_min {
            return Err("gem_max must be > gem_min".to_string());
        }
        Ok(())
    }
}
