mod domain;
mod nft;
mod query;
mod request;
mod response;
mod social;
mod token;
mod user;
mod wallet;

pub use self::domain::*;
pub use self::nft::*;
pub use self::query::*;
pub use self::request::*;
pub use self::response::*;
pub use self::social::*;
pub use self::token::*;
pub use self::user::*;
pub use self::wallet::*;
