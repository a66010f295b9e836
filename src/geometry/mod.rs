pub mod surface;

pub use surface::{Cone, ConeSheet, Cylinder, HalfSpace, Plane, Sphere, Surface};
