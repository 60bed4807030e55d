use serde::Deserialize;

use crate::auth::MAX_NAME_LEN;
use crate::error::FieldErrors;
use crate::validation::{Checker, Validate};

/// Request body for adding a currency, e.g. `{"name": "UAH"}`.
#[derive(Debug, Deserialize)]
pub struct CreateCurrencyRequest {
    pub name: Option<String>,
}

impl Validate for CreateCurrencyRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut c = Checker::new();
        c.name("name", self.name.as_deref(), MAX_NAME_LEN);
        c.finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct CurrencyIdQuery {
    pub currency_id: Option<String>,
}
