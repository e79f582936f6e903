//! Resolves the acting user from an opaque bearer token.
//!
//! Tokens are issued elsewhere; this service only looks them up in the
//! `sessions` table and reads the owner's role from `users`.

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use log::warn;
use rundown_common::model::user::Role;
use rusqlite::{params, Connection, OptionalExtension};

use crate::config::Config;
use crate::error::ApiError;

/// The authenticated user behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub role: Role,
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Looks up the session owner for `token`.
pub fn resolve_session(conn: &Connection, token: &str) -> Result<Option<Actor>, ApiError> {
    let found = conn
        .query_row(
            "SELECT u.id, u.role FROM sessions s JOIN users u ON u.id = s.user_id WHERE s.token = ?1",
            params![token],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;

    match found {
        Some((user_id, role)) => {
            let role = role.parse::<Role>().map_err(ApiError::Internal)?;
            Ok(Some(Actor { user_id, role }))
        }
        None => Ok(None),
    }
}

impl FromRequest for Actor {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let config = req.app_data::<web::Data<Config>>().cloned();

        Box::pin(async move {
            let token = token.ok_or(ApiError::Unauthorized)?;
            let config = config
                .ok_or_else(|| ApiError::Internal("configuration not registered".to_string()))?;

            let actor = web::block(move || {
                let conn = config.open_db()?;
                resolve_session(&conn, &token)
            })
            .await??;

            actor.ok_or_else(|| {
                warn!("Rejected request with unknown session token");
                ApiError::Unauthorized
            })
        })
    }
}
