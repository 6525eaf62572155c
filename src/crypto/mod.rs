pub mod otp;
pub mod password;
pub mod token;

pub use otp::generate_code;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenIssuer, TokenPair};
