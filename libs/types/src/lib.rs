//! Types library for the matching engine core
//!
//! Shared type definitions used by the order book, the reference mid-price
//! engine and the transactional layer on top of them.
//!
//! # Modules
//! - `ids`: Unique identifiers (OrderId, ClientId, AssetPairId)
//! - `numeric`: Fixed-point decimal types (Price, Volume)
//! - `order`: Limit order types
//! - `asset_pair`: Asset pair metadata (decimal accuracy)
//! - `mid_price`: Observed mid-price samples
//! - `time`: Millisecond timestamps
//! - `errors`: Error taxonomy

pub mod ids;
pub mod numeric;
pub mod order;
pub mod asset_pair;
pub mod mid_price;
pub mod time;
pub mod errors;
