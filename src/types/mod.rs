//! Account and contact types that flow through the pipeline.
//!
//! [Account] is the payload; a [ResultItem] carries either an [AccountContact],
//! a [CapturedError], or the end-of-stream sentinel.

mod account;
mod account_contact;
mod account_status;
mod captured_error;
mod contact_type;

pub use account::Account;
pub use account_contact::AccountContact;
pub use account_status::AccountStatus;
pub use captured_error::CapturedError;
pub use contact_type::ContactType;

/// One value on the result queue: a contact, a captured failure, or a sentinel.
pub type ResultItem = crate::queue::StageItem<Result<AccountContact, CapturedError>>;
