mod account;
mod verification;

pub use account::Account;
pub use verification::Verification;
