use serde::Deserialize;

use crate::auth::MAX_NAME_LEN;
use crate::error::FieldErrors;
use crate::validation::{Checker, Validate};

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: Option<String>,
}

impl Validate for CreateCategoryRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut c = Checker::new();
        c.name("name", self.name.as_deref(), MAX_NAME_LEN);
        c.finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct CategoryIdQuery {
    pub category_id: Option<String>,
}
