pub mod confirmation_code;
pub mod events;
pub mod user;

pub use confirmation_code::{ConfirmationCode, NewConfirmationCode};
pub use events::{ConfirmationCodeRenewed, UserRegistered};
pub use user::{NewUser, User};
