use actix_web::{Responder, web};
use serde::{Deserialize, Serialize};

use super::helpers::api_result;
use crate::context::AppContext;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewCategory {
    pub name: String,
}

pub struct CategoryApi;

impl CategoryApi {
    /// GET /categories
    pub async fn list(ctx: web::Data<AppContext>) -> impl Responder {
        api_result(ctx.categories.categories().await)
    }

    /// POST /categories
    pub async fn create(
        body: web::Json<NewCategory>,
        ctx: web::Data<AppContext>,
    ) -> impl Responder {
        api_result(ctx.categories.add_category(&body.name).await)
    }
}
