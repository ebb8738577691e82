//! Side-effecting actions behind tools, and the invoker that runs them.

pub mod clock;
pub mod email;
pub mod invoker;

pub use clock::{CurrentTimeAction, GET_CURRENT_TIME};
pub use email::{EmailAction, EmailRequest, SEND_EMAIL};
pub use invoker::ActionInvoker;
