mod constants;
mod lock;
mod security;
mod util;

pub use constants::*;
pub use lock::*;
pub(crate) use security::*;
pub use util::*;
