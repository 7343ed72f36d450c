//! Flatpages HTTP routes.
//!
//! Every handler checks access, makes one pass-through call into the host
//! and serializes the result. Mutations publish a reload event on success.

use std::sync::Arc;

use anyhow::Context as _;
use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use webdesq_sdk::plugin::{PluginContext, RouteDescriptor, into_router};
use webdesq_sdk::prelude::{
    Filter, Format, ListFormat, Listing, Requirement, Selector, SortKey, UserContext, Validation,
    ValidationReport, ValidationRequest,
};

use crate::error::{RouteError, RouteResult};
use crate::settings::FlatpagesSettings;
use crate::{CHANNEL, ENTITY, RELOAD_EVENT, STORE, features};

/// Shared state handed to every handler.
pub type Context = Arc<PluginContext<FlatpagesSettings>>;

/// Request header switching create and update into a dry run.
const INIT_HEADER: &str = "init";

/// Either see-feature.
fn can_see() -> Requirement {
    Requirement::any_of([features::SEE_MY, features::SEE_ALL])
}

/// Route descriptors, in registration order.
pub fn routes() -> Vec<RouteDescriptor<Context>> {
    vec![
        RouteDescriptor::get("/flatpages", list_flatpages)
            .requires(can_see())
            .purpose("Get all flatpages the user is allowed to see"),
        RouteDescriptor::get("/flatpages/settings", get_settings)
            .requires(can_see())
            .purpose("Receive all predefined settings for flatpages"),
        RouteDescriptor::get("/flatpages/{id}", get_flatpage)
            .requires(can_see())
            .purpose("Get a specific flatpage"),
        RouteDescriptor::post("/flatpages", create_flatpage)
            .requires(Requirement::feature(features::CREATE))
            .purpose("Create a new flatpage"),
        RouteDescriptor::put("/flatpages/{id}", update_flatpage)
            .requires(Requirement::feature(features::EDIT))
            .purpose("Update an existing flatpage"),
        RouteDescriptor::delete("/flatpages/{id}", delete_flatpage)
            .requires(Requirement::feature(features::DELETE))
            .purpose("Delete a specific flatpage"),
        RouteDescriptor::get("/flatpages/filters", get_filters)
            .requires(can_see())
            .purpose("Get filters defined for entity smartyellow/flatpage"),
        RouteDescriptor::get("/flatpages/formats", get_formats)
            .purpose("Get columns defined for entity smartyellow/flatpage"),
        RouteDescriptor::post("/flatpages/search", search_flatpages)
            .requires(can_see())
            .purpose("Search flatpages using entity filters"),
    ]
}

/// Build the plugin router with its context attached.
pub fn router(context: PluginContext<FlatpagesSettings>) -> Router {
    into_router(routes()).with_state(Arc::new(context))
}

/// A present, non-empty `init` header requests a dry run.
fn is_dry_run(headers: &HeaderMap) -> bool {
    headers
        .get(INIT_HEADER)
        .is_some_and(|value| !value.as_bytes().is_empty())
}

fn publish_reload(ctx: &Context) {
    ctx.server.publish(CHANNEL, RELOAD_EVENT);
}

/// Get all flatpages the user is allowed to see, newest first.
async fn list_flatpages(
    State(ctx): State<Context>,
    user: UserContext,
    headers: HeaderMap,
) -> RouteResult<Json<Listing>> {
    let listing = ctx
        .server
        .storage(&user)
        .store(STORE)
        .find()
        .sort(SortKey::descending("log.created.on"))
        .to_listing(ListFormat::from_headers(&headers))
        .await?;

    debug!(user = %user.id, count = listing.len(), "listed flatpages");
    Ok(Json(listing))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SettingsResponse {
    preview_url: String,
}

async fn get_settings(State(ctx): State<Context>) -> Json<SettingsResponse> {
    Json(SettingsResponse {
        preview_url: ctx.settings.preview.clone(),
    })
}

/// Get one flatpage. Without `seeAllFlatpages`, only the user's own pages
/// and their coworkers' pages are readable.
async fn get_flatpage(
    State(ctx): State<Context>,
    user: UserContext,
    Path(id): Path<String>,
) -> RouteResult<Json<ValidationReport>> {
    let doc = ctx
        .server
        .storage(&user)
        .store(ENTITY)
        .get(&id)
        .await?
        .ok_or(RouteError::NotFound)?;

    if user.cannot(features::SEE_ALL) && !user.is_self_or_coworker(doc.created_by()) {
        debug!(user = %user.id, flatpage = %id, "flatpage belongs to someone else");
        return Err(RouteError::Unauthorized);
    }

    let data = serde_json::to_value(&doc).context("failed to serialize flatpage")?;
    let validation = ctx
        .server
        .validate_entity(
            ValidationRequest::new(ENTITY, &user, data)
                .id(&id)
                .validate_only(true)
                .is_new(false),
        )
        .await?;

    Ok(Json(validation.into_report()))
}

async fn create_flatpage(
    State(ctx): State<Context>,
    user: UserContext,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> RouteResult<Json<ValidationReport>> {
    let dry_run = is_dry_run(&headers);

    let validation = ctx
        .server
        .validate_entity(
            ValidationRequest::new(ENTITY, &user, body)
                .is_new(true)
                .validate_only(dry_run),
        )
        .await?;

    // Only a valid, non-dry-run validation carries a commit
    let report = match validation {
        Validation::Pending { commit, .. } if !dry_run => {
            let stored = commit.commit().await?;
            info!(user = %user.id, "flatpage created");
            publish_reload(&ctx);
            stored
        }
        other => other.into_report(),
    };

    Ok(Json(report))
}

async fn update_flatpage(
    State(ctx): State<Context>,
    user: UserContext,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> RouteResult<Json<ValidationReport>> {
    let dry_run = is_dry_run(&headers);

    let report = ctx
        .server
        .validate_entity(
            ValidationRequest::new(ENTITY, &user, body)
                .id(&id)
                .is_new(false)
                .store_if_valid(true)
                .validate_only(dry_run),
        )
        .await?
        .into_report();

    if !report.has_errors() && !dry_run {
        info!(user = %user.id, flatpage = %id, "flatpage updated");
        publish_reload(&ctx);
    }

    Ok(Json(report))
}

/// Delete a flatpage the user can see in their own listing.
async fn delete_flatpage(
    State(ctx): State<Context>,
    user: UserContext,
    Path(id): Path<String>,
) -> RouteResult<StatusCode> {
    let store = ctx.server.storage(&user).store(STORE);

    let visible = store.find().to_object().await?;
    if !visible.contains_key(&id) {
        debug!(user = %user.id, flatpage = %id, "flatpage not visible, refusing delete");
        return Err(RouteError::Unauthorized);
    }

    let removed = store.delete(&Selector::Id(id.clone())).await?;
    info!(user = %user.id, flatpage = %id, removed, "flatpage deleted");
    publish_reload(&ctx);

    Ok(StatusCode::NO_CONTENT)
}

async fn get_filters(
    State(ctx): State<Context>,
    user: UserContext,
) -> RouteResult<Json<Vec<Filter>>> {
    Ok(Json(ctx.server.get_filters(ENTITY, &user).await?))
}

async fn get_formats(
    State(ctx): State<Context>,
    user: UserContext,
) -> RouteResult<Json<Vec<Format>>> {
    Ok(Json(ctx.server.get_formats(ENTITY, &user).await?))
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    #[serde(default)]
    query: Value,
    #[serde(default, deserialize_with = "language_list")]
    languages: Option<Vec<String>>,
}

/// `false` and `null` both mean "search every language".
fn language_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Languages {
        List(Vec<String>),
        Flag(bool),
    }

    match Option::<Languages>::deserialize(deserializer)? {
        Some(Languages::List(list)) => Ok(Some(list)),
        Some(Languages::Flag(false)) | None => Ok(None),
        Some(Languages::Flag(true)) => Err(serde::de::Error::custom(
            "languages must be a list of codes or false",
        )),
    }
}

async fn search_flatpages(
    State(ctx): State<Context>,
    user: UserContext,
    headers: HeaderMap,
    Json(body): Json<SearchRequest>,
) -> RouteResult<Json<Listing>> {
    let filters = ctx.server.get_filters(ENTITY, &user).await?;

    let storage = ctx.server.storage(&user);
    let query = storage.prepare_query(&filters, &body.query, body.languages.as_deref())?;
    debug!(user = %user.id, ?query, "searching flatpages");

    let listing = storage
        .store(STORE)
        .find_with(query)
        .to_listing(ListFormat::from_headers(&headers))
        .await?;

    Ok(Json(listing))
}
