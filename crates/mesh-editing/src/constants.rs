/// Minimum distinct vertices of a polygon face.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Distinct vertices of a line entity.
pub const LINE_VERTICES: usize = 2;

/// Minimum vertex ids a merge needs to do anything.
pub const MIN_MERGE_VERTICES: usize = 2;

/// Pointer travel (screen units) before a click turns into a box select.
pub const BOX_SELECT_MIN_DRAG: f32 = 3.0;

/// Camera orbit speed in radians per screen unit.
pub const ORBIT_RADIANS_PER_UNIT: f32 = 0.01;

/// Pitch limit keeping the orbit camera off the poles.
pub const MAX_ORBIT_PITCH: f32 = 1.55;

/// Closest the orbit camera may get to its target.
pub const MIN_ORBIT_DISTANCE: f32 = 0.01;
