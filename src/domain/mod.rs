pub mod user;
pub mod restaurant;
pub mod cart;
pub mod order;
pub mod money;

pub use user::*;
pub use restaurant::*;
pub use cart::*;
pub use order::*;
pub use money::*;
