mod cables;
mod devices;
mod interfaces;
mod locations;
mod ports;

pub use cables::*;
pub use devices::*;
pub use interfaces::*;
pub use locations::*;
pub use ports::*;
