//! Meltdown blast profile handed to the explosion executor.

/// Fixed explosion parameters for a machine meltdown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlastProfile {
    /// Explosion prototype id understood by the executor.
    pub prototype: &'static str,
    pub total_intensity: f32,
    /// Intensity falloff per tile.
    pub slope: f32,
    pub max_tile_intensity: f32,
    pub tile_break_scale: f32,
    pub max_tile_break: u32,
    pub can_create_vacuum: bool,
}

/// Every meltdown uses this profile.
pub const MELTDOWN_BLAST: BlastProfile = BlastProfile {
    prototype: "Default",
    total_intensity: 10.0,
    slope: 2.0,
    max_tile_intensity: 4.0,
    tile_break_scale: 1.0,
    max_tile_break: 10,
    can_create_vacuum: true,
};

impl BlastProfile {
    /// Rough radius in tiles before intensity falls to zero at the edge.
    pub fn approximate_radius(&self) -> f32 {
        if self.slope <= 0.0 {
            return 0.0;
        }
        self.max_tile_intensity.min(self.total_intensity) / self.slope
    }
}
