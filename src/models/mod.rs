pub mod enums;
pub mod conversation;
pub mod profile;

pub use conversation::*;
pub use profile::*;
