//! Satellite plane statistics math utilities.

pub mod math;

pub use math::aggregate::*;
pub use math::covariance::*;
pub use math::moments::*;
pub use math::quantile::*;
