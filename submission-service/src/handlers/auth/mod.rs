pub mod registration;
pub mod session;

pub use registration::{register, send_code};
pub use session::{login, logout};
