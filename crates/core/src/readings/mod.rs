//! Readings module - persisted meal measurements and their in-memory store.

mod readings_model;
mod readings_store;


pub use readings_model::{
    FoodNames, FoodPortion, NewReading, NutrientTotals, Reading, ReadingScope,
};
pub use readings_store::ReadingStore;
