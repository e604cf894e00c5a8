//! Backend collaborator seam.

mod api_traits;

pub use api_traits::NutritionApi;
