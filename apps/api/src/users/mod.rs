pub mod handlers;
pub mod premium;
pub mod repo;

use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

/// Editable account fields. Absent (or null) fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UserUpdate {
    #[validate(length(min = 1, max = 100, message = "full_name must be 1-100 characters"))]
    pub full_name: Option<String>,
    #[validate(length(max = 15, message = "phone must be at most 15 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 20, message = "class_level must be at most 20 characters"))]
    pub class_level: Option<String>,
    #[validate(length(max = 50, message = "stream must be at most 50 characters"))]
    pub stream: Option<String>,
    pub target_exams: Option<Value>,
}

/// Editable profile attributes. Bookmarks, shortlist and exam scores are
/// only written through their own routes.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(max = 20, message = "current_class must be at most 20 characters"))]
    pub current_class: Option<String>,
    #[validate(length(max = 200, message = "school_name must be at most 200 characters"))]
    pub school_name: Option<String>,
    #[validate(length(max = 50, message = "board must be at most 50 characters"))]
    pub board: Option<String>,
    #[validate(length(max = 50, message = "budget_range must be at most 50 characters"))]
    pub budget_range: Option<String>,
    pub target_colleges: Option<Value>,
    pub preferred_streams: Option<Value>,
    pub preferred_cities: Option<Value>,
}
