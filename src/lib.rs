pub mod auction;
pub mod bidding;
pub mod board;
pub mod sources;
pub mod store;
