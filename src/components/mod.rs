//! Reference components built on the [`Component`](crate::component::Component)
//! contract. They keep their geometry simple; what they exercise is the
//! numbering, linking, cutting and insertion machinery.

mod shield_block;
mod vacuum_pipe;

pub use shield_block::ShieldBlock;
pub use vacuum_pipe::VacuumPipe;

use crate::config::FuncDataBase;
use crate::error::Result;
use crate::math::Vector3;

/// Reads the optional `XStep`/`YStep`/`ZStep`/`XYAngle`/`ZAngle` offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Offset {
    step: [f64; 3],
    xy_angle: f64,
    z_angle: f64,
}

impl Offset {
    fn populate(vars: &FuncDataBase, name: &str) -> Self {
        Self {
            step: [
                vars.eval_def_var(&format!("{name}XStep"), 0.0),
                vars.eval_def_var(&format!("{name}YStep"), 0.0),
                vars.eval_def_var(&format!("{name}ZStep"), 0.0),
            ],
            xy_angle: vars.eval_def_var(&format!("{name}XYAngle"), 0.0),
            z_angle: vars.eval_def_var(&format!("{name}ZAngle"), 0.0),
        }
    }

    fn apply(&self, frame: &mut crate::math::Frame) {
        frame.apply_shift(self.step[0], self.step[1], self.step[2]);
        frame.apply_angle_rotate(self.xy_angle, self.z_angle);
    }
}

fn var<T: crate::config::FromVar>(vars: &FuncDataBase, name: &str, key: &str) -> Result<T> {
    vars.eval_var(&format!("{name}{key}"))
}

fn axes(frame: &crate::math::Frame) -> (Vector3, Vector3, Vector3) {
    (*frame.x(), *frame.y(), *frame.z())
}
