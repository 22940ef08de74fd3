//! HTTP routes

use axum::{
	Router,
	body::Body,
	extract::State,
	http::{Request, header},
	middleware::{self, Next},
	response::Response,
	routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use sfgs_queue::handler;

use crate::prelude::*;

/// Shared secret expected as `Authorization: Bearer <token>`
#[derive(Clone, Debug)]
pub struct ApiToken(pub Arc<str>);

pub async fn require_token(
	State(token): State<ApiToken>,
	req: Request<Body>,
	next: Next,
) -> SfResult<Response> {
	let provided = req
		.headers()
		.get(header::AUTHORIZATION)
		.and_then(|h| h.to_str().ok())
		.and_then(|h| h.strip_prefix("Bearer "))
		.map(str::trim);

	if provided != Some(&*token.0) {
		debug!(uri = %req.uri(), "Rejected request without valid API token");
		return Err(Error::Unauthorized);
	}

	Ok(next.run(req).await)
}

fn init_api(app: App) -> Router {
	Router::new()
		// Processing
		.route("/api/queue/process", post(handler::post_process_queue))
		.route("/api/birthday", get(handler::post_birthday).post(handler::post_birthday))
		// Settings
		.route("/api/settings", get(handler::get_settings).patch(handler::patch_settings))
		// Queue
		.route("/api/queue", get(handler::list_queue).post(handler::post_queue))
		.route(
			"/api/queue/{id}",
			get(handler::get_queue_entry).delete(handler::delete_queue_entry),
		)
		.route("/api/queue/{id}/retry", post(handler::post_retry))
		.route("/api/queue/{id}/cancel", post(handler::post_cancel))
		.route("/api/queue/{id}/prioritize", post(handler::post_prioritize))
		// Files
		.route("/api/files/{id}", delete(handler::delete_file))
		// Maintenance
		.route("/api/send-email", post(handler::post_send_email))
		.route("/api/stats", get(handler::get_stats))
		.route("/api/logs", get(handler::get_logs))
		.with_state(app)
}

pub fn init(app: App, api_token: Option<Box<str>>) -> Router {
	let mut api_router = init_api(app);
	if let Some(token) = api_token {
		api_router = api_router
			.route_layer(middleware::from_fn_with_state(ApiToken(token.into()), require_token));
	} else {
		warn!("SFGS_API_TOKEN is not set, the API is unauthenticated");
	}

	Router::new()
		.route("/health", get(async || "ok\n"))
		.merge(api_router)
		.layer(TraceLayer::new_for_http())
}

// vim: ts=4
