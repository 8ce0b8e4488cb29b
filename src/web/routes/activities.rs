use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};

use crate::error::AppError;
use crate::models::ActivityCategory;
use crate::services::activities_service::{self, ActivityForm, ActivityListItem, ActivityQuery};
use crate::services::capability_service::Capability;
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::render;

pub struct CategoryOption {
    pub value: &'static str,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "activities.html")]
pub struct ActivitiesTemplate {
    pub activities: Vec<ActivityListItem>,
    pub categories: Vec<CategoryOption>,
    pub q: String,
    pub category: String,
    pub date_from: String,
    pub date_to: String,
    pub location: String,
    pub min_hours: String,
    pub can_create: bool,
    pub display_name: String,
}

pub async fn activities_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> Result<Response, AppError> {
    let activities = activities_service::list_activities(&state.pool, &query).await?;
    let field = |v: &Option<String>| v.clone().unwrap_or_default();

    Ok(render(&ActivitiesTemplate {
        activities,
        categories: ActivityCategory::ALL
            .iter()
            .map(|c| CategoryOption {
                value: c.as_str(),
                selected: query.category.as_deref() == Some(c.as_str()),
            })
            .collect(),
        q: field(&query.q),
        category: field(&query.category),
        date_from: field(&query.date_from),
        date_to: field(&query.date_to),
        location: field(&query.location),
        min_hours: field(&query.min_hours),
        can_create: auth_user.can(Capability::ManageActivities),
        display_name: auth_user.display_name.clone(),
    }))
}

pub async fn create_activity_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Form(form): Form<ActivityForm>,
) -> Result<Response, AppError> {
    auth_user.require(Capability::ManageActivities)?;
    let id = activities_service::create_activity(&state.pool, &form, auth_user.id).await?;
    Ok(Redirect::to(&format!("/activities/{}?notice=created", id)).into_response())
}
