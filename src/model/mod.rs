mod cell;
mod context;

pub use cell::Cell;
pub use context::BuildContext;
