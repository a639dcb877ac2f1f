//! Global configuration constants for the Keel simulation core.

use serde::{Deserialize, Serialize};

/// Default gravity vector applied by a physics system (Y-up).
pub const DEFAULT_GRAVITY: [f32; 3] = [0.0, -9.81, 0.0];

/// Default damping applied to linear velocity.
pub const DEFAULT_LINEAR_DAMPING: f32 = 0.05;

/// Default damping applied to angular velocity.
pub const DEFAULT_ANGULAR_DAMPING: f32 = 0.05;

/// Default cap on linear speed (m/s).
pub const DEFAULT_MAX_LINEAR_VELOCITY: f32 = 500.0;

/// Default cap on angular speed (rad/s).
pub const DEFAULT_MAX_ANGULAR_VELOCITY: f32 = 15.0 * std::f32::consts::PI;

/// Default friction coefficient for new bodies.
pub const DEFAULT_FRICTION: f32 = 0.2;

/// Default restitution coefficient for new bodies.
pub const DEFAULT_RESTITUTION: f32 = 0.0;

/// Default convex radius used by shape settings builders.
pub const DEFAULT_CONVEX_RADIUS: f32 = 0.05;

/// Contact points stored per manifold side.
pub const MAX_MANIFOLD_POINTS: usize = 64;

/// Face points stored per collide-shape result side.
pub const MAX_FACE_POINTS: usize = 32;

/// Body lock shard count used when the caller passes zero mutexes.
pub const DEFAULT_BODY_MUTEX_COUNT: u32 = 64;

/// Wall-clock budget for one update before a warning is logged (ms).
pub const UPDATE_BUDGET_MS: f32 = 16.0;

/// Serializable snapshot of the tunable per-body defaults, mostly useful for
/// dumping effective configuration next to a repro case.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimulationDefaults {
    pub gravity: [f32; 3],
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub max_linear_velocity: f32,
    pub max_angular_velocity: f32,
    pub friction: f32,
    pub restitution: f32,
}

impl Default for SimulationDefaults {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            linear_damping: DEFAULT_LINEAR_DAMPING,
            angular_damping: DEFAULT_ANGULAR_DAMPING,
            max_linear_velocity: DEFAULT_MAX_LINEAR_VELOCITY,
            max_angular_velocity: DEFAULT_MAX_ANGULAR_VELOCITY,
            friction: DEFAULT_FRICTION,
            restitution: DEFAULT_RESTITUTION,
        }
    }
}
