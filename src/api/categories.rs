//! Category catalog endpoint.

use crate::models::Category;

use super::{success, ApiResult};

/// GET /api/categories - The fixed category catalog, in display order.
pub async fn list_categories() -> ApiResult<Vec<Category>> {
    success(Category::all())
}
