mod account;
mod claims;
mod token_type;

pub use account::*;
pub use claims::*;
pub use token_type::*;
