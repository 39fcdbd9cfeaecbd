//! Process-wide order books, one per asset pair

use std::collections::HashMap;
use types::ids::AssetPairId;

use super::asset_order_book::AssetOrderBook;

/// Map of asset pair to its order book
///
/// Books are created on first reference and replaced wholesale when a
/// transaction commits a mutated copy.
#[derive(Debug, Clone, Default)]
pub struct OrderBooks {
    books: HashMap<AssetPairId, AssetOrderBook>,
}

impl OrderBooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, asset_pair_id: &AssetPairId) -> Option<&AssetOrderBook> {
        self.books.get(asset_pair_id)
    }

    /// Book of `asset_pair_id`, created empty on first reference
    pub fn get_or_create(&mut self, asset_pair_id: &AssetPairId) -> &mut AssetOrderBook {
        self.books
            .entry(asset_pair_id.clone())
            .or_insert_with(|| AssetOrderBook::new(asset_pair_id.clone()))
    }

    /// Copy of the book, or an empty book if the pair has none yet
    pub fn copy_of(&self, asset_pair_id: &AssetPairId) -> AssetOrderBook {
        self.books
            .get(asset_pair_id)
            .map(AssetOrderBook::copy)
            .unwrap_or_else(|| AssetOrderBook::new(asset_pair_id.clone()))
    }

    /// Replace the book of its asset pair
    pub fn set_order_book(&mut self, book: AssetOrderBook) {
        self.books.insert(book.asset_pair_id().clone(), book);
    }

    pub fn asset_pair_ids(&self) -> impl Iterator<Item = &AssetPairId> {
        self.books.keys()
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}
