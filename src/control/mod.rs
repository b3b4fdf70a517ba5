//! Control building blocks
//!
//! State-space models, LQR with input-delay compensation, plant inversion
//! feedforward and the actuation delay buffer.

pub mod state_space;
pub mod riccati;
pub mod lqr;
pub mod feedforward;
pub mod delay;

pub use state_space::{discretize_ab, LinearPlant, StateSpaceModel};
pub use riccati::{augment_with_input_delay, dlqr, solve_dare, DareConfig};
pub use lqr::{LinearQuadraticRegulator, QueueProjection};
pub use feedforward::PlantInversionFeedforward;
pub use delay::DelayBuffer;
