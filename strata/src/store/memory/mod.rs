mod module;
mod session;
mod store;

pub use module::*;
pub use session::*;
pub use store::*;
