mod fhrp;
mod helpers;
mod ip_addresses;
mod prefixes;
mod vlans;
mod vrfs;

pub use fhrp::*;
pub use ip_addresses::*;
pub use prefixes::*;
pub use vlans::*;
pub use vrfs::*;
