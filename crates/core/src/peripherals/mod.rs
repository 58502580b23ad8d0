pub mod timer;
pub mod uart;
