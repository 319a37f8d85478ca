//! Backend flows built on [`SellerApi`](crate::api::SellerApi): connecting a marketplace
//! token and syncing dashboard fixtures to disk.

pub mod connect;
pub mod sync;

pub use connect::*;
pub use sync::*;
