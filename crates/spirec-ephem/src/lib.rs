//! Ephemeris query adapter.
//!
//! Geometry is always requested through an [`EphemerisSource`] handle that the
//! caller owns. [`AniseSession`] is the production source; tests use doubles.

pub mod error;
pub mod geometry;
pub mod instrument;
pub mod kernel_pool;
pub mod meta_kernel;
pub mod names;
pub mod session;
pub mod source;

pub use error::{EphemerisError, EphemerisResult};
pub use geometry::{illumination_direction, observe, relative_pose, Geometry, GeometryQuery};
pub use instrument::{instrument_parameters, AngleUnits, FieldOfView, InstrumentParameters};
pub use kernel_pool::{KernelPool, PoolValue};
pub use session::AniseSession;
pub use source::{Correction, EphemerisSource};
