use serde::Deserialize;

use crate::error::FieldErrors;
use crate::validation::{Checker, Validate};

/// Request body for a new record. `currency_id` is normally ignored: the
/// server picks the currency.
#[derive(Debug, Deserialize)]
pub struct CreateRecordRequest {
    pub user_id: Option<String>,
    pub category_id: Option<String>,
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency_id: Option<String>,
}

impl Validate for CreateRecordRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut c = Checker::new();
        c.name("user_id", self.user_id.as_deref(), usize::MAX);
        c.name("category_id", self.category_id.as_deref(), usize::MAX);
        c.require("amount", self.amount.as_ref());
        if self.amount.is_some_and(|a| !a.is_finite()) {
            c.add("amount", "Not a valid number.");
        }
        c.finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordListQuery {
    pub user_id: Option<String>,
    pub category_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordIdQuery {
    pub record_id: Option<String>,
}
