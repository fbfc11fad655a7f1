//! Contact endpoint handlers.
//!
//! Mutating endpoints answer with an `Envelope`; listing, lookup and count
//! endpoints answer with the raw value.

use super::response::{ApiError, Envelope};
use crate::AppState;
use agenda_core::{Contact, ContactId};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;

type ApiResult<T> = Result<Json<T>, ApiError>;

fn contact_id(path: Result<Path<ContactId>, PathRejection>) -> Result<ContactId, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| ApiError::Malformed(rejection.body_text()))
}

fn payload(body: Result<Json<Contact>, JsonRejection>) -> Result<Contact, ApiError> {
    body.map(|Json(contact)| contact)
        .map_err(|rejection| ApiError::Malformed(rejection.body_text()))
}

pub(crate) async fn healthz() -> &'static str {
    "ok"
}

pub(crate) async fn create_contact(
    State(state): State<AppState>,
    body: Result<Json<Contact>, JsonRejection>,
) -> ApiResult<Envelope<Contact>> {
    let contact = payload(body)?;
    let created = state.run(move |service| service.create(contact)).await?;
    Ok(Json(Envelope::success(
        "Contact created successfully.",
        Some(created),
    )))
}

pub(crate) async fn list_contacts(State(state): State<AppState>) -> ApiResult<Vec<Contact>> {
    Ok(Json(state.run(|service| service.list()).await?))
}

pub(crate) async fn list_favorites(State(state): State<AppState>) -> ApiResult<Vec<Contact>> {
    Ok(Json(state.run(|service| service.list_favorites()).await?))
}

pub(crate) async fn list_inactive(State(state): State<AppState>) -> ApiResult<Vec<Contact>> {
    Ok(Json(state.run(|service| service.list_inactive()).await?))
}

pub(crate) async fn count_all(State(state): State<AppState>) -> ApiResult<u64> {
    Ok(Json(state.run(|service| service.count_all()).await?))
}

pub(crate) async fn count_active(State(state): State<AppState>) -> ApiResult<u64> {
    Ok(Json(state.run(|service| service.count_active()).await?))
}

pub(crate) async fn count_inactive(State(state): State<AppState>) -> ApiResult<u64> {
    Ok(Json(state.run(|service| service.count_inactive()).await?))
}

pub(crate) async fn count_favorites(State(state): State<AppState>) -> ApiResult<u64> {
    Ok(Json(
        state.run(|service| service.count_favorites_active()).await?,
    ))
}

pub(crate) async fn get_contact(
    State(state): State<AppState>,
    path: Result<Path<ContactId>, PathRejection>,
) -> ApiResult<Contact> {
    let id = contact_id(path)?;
    Ok(Json(state.run(move |service| service.get_by_id(id)).await?))
}

pub(crate) async fn update_contact(
    State(state): State<AppState>,
    path: Result<Path<ContactId>, PathRejection>,
    body: Result<Json<Contact>, JsonRejection>,
) -> ApiResult<Envelope<Contact>> {
    let id = contact_id(path)?;
    let contact = payload(body)?;
    let updated = state
        .run(move |service| service.update(id, contact))
        .await?;
    Ok(Json(Envelope::success(
        "Contact updated successfully.",
        Some(updated),
    )))
}

pub(crate) async fn deactivate_contact(
    State(state): State<AppState>,
    path: Result<Path<ContactId>, PathRejection>,
) -> ApiResult<Envelope<()>> {
    let id = contact_id(path)?;
    state.run(move |service| service.deactivate(id)).await?;
    Ok(Json(Envelope::success(
        "Contact deactivated successfully.",
        None,
    )))
}

pub(crate) async fn activate_contact(
    State(state): State<AppState>,
    path: Result<Path<ContactId>, PathRejection>,
) -> ApiResult<Envelope<()>> {
    let id = contact_id(path)?;
    state.run(move |service| service.activate(id)).await?;
    Ok(Json(Envelope::success(
        "Contact activated successfully.",
        None,
    )))
}

pub(crate) async fn favorite_contact(
    State(state): State<AppState>,
    path: Result<Path<ContactId>, PathRejection>,
) -> ApiResult<Envelope<Contact>> {
    let id = contact_id(path)?;
    let contact = state.run(move |service| service.favorite(id)).await?;
    Ok(Json(Envelope::success(
        "Contact marked as favorite successfully.",
        Some(contact),
    )))
}

pub(crate) async fn unfavorite_contact(
    State(state): State<AppState>,
    path: Result<Path<ContactId>, PathRejection>,
) -> ApiResult<Envelope<Contact>> {
    let id = contact_id(path)?;
    let contact = state.run(move |service| service.unfavorite(id)).await?;
    Ok(Json(Envelope::success(
        "Contact removed from favorites successfully.",
        Some(contact),
    )))
}

pub(crate) async fn toggle_favorite_contact(
    State(state): State<AppState>,
    path: Result<Path<ContactId>, PathRejection>,
) -> ApiResult<Envelope<Contact>> {
    let id = contact_id(path)?;
    let contact = state
        .run(move |service| service.toggle_favorite(id))
        .await?;
    Ok(Json(Envelope::success(
        "Favorite status updated successfully.",
        Some(contact),
    )))
}

pub(crate) async fn delete_contact(
    State(state): State<AppState>,
    path: Result<Path<ContactId>, PathRejection>,
) -> ApiResult<Envelope<()>> {
    let id = contact_id(path)?;
    state.run(move |service| service.delete(id)).await?;
    Ok(Json(Envelope::success("Contact deleted successfully.", None)))
}
