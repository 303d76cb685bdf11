pub mod supporter;

pub use self::supporter::*;
