//! Order book infrastructure module
//!
//! Contains the priority key, book sides, per-pair books and the
//! process-wide book map.

pub mod priority;
pub mod side_book;
pub mod asset_order_book;
pub mod order_books;

pub use asset_order_book::AssetOrderBook;
pub use order_books::OrderBooks;
pub use side_book::SideBook;
