//! Authentication for the Taskhub CLI.
//!
//! Device-flow login, durable session storage, and the expiry policy
//! consulted before authenticated requests.

mod device_flow;
pub mod guard;
mod session;

pub use device_flow::{LoginMode, run_login};
pub use session::{ActiveProject, SessionStore, UserIdentity};
