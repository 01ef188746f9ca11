//! Local HTTP viewer.
//!
//! A single-threaded tiny_http loop in front of one [`ViewerSession`]:
//! - `GET /?compartment=…&cell_type=…&signature=…&comparison=…&plot=…` renders the page
//! - `GET /api/view?…` returns the rendered views as JSON
//! - `GET /health` answers `ok`
//!
//! Routing is a pure function of the session and the request line so it can
//! be tested without a socket.

use pv_common::SelectionInput;
use serde_json::json;
use std::net::SocketAddr;
use tracing::{debug, error, info, warn};

use crate::logging::{event_names, Stage};
use crate::session::ViewerSession;

/// A response ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    fn new(status: u16, content_type: &'static str, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, "text/plain; charset=utf-8", body)
    }

    fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status, "application/json", body.to_string())
    }
}

/// Selection input from a query string.
pub fn parse_query(query: &str) -> SelectionInput {
    SelectionInput::from_pairs(url::form_urlencoded::parse(query.as_bytes()))
}

/// Route one request.
pub fn handle_request(session: &mut ViewerSession, method: &str, url: &str) -> HttpResponse {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));

    if !method.eq_ignore_ascii_case("GET") {
        return HttpResponse::text(405, "method not allowed");
    }

    match path {
        "/" | "/index.html" => match session.page(parse_query(query)) {
            Ok((_, html)) => HttpResponse::new(200, "text/html; charset=utf-8", html),
            Err(e) => {
                error!(
                    event = event_names::SERVER_ERROR,
                    stage = %Stage::Serve,
                    run_id = %session.run_id(),
                    error = %e,
                    "Page generation failed"
                );
                HttpResponse::text(500, format!("error: {}", e))
            }
        },
        "/api/view" => {
            let data = session.handle(parse_query(query));
            match serde_json::to_value(&data) {
                Ok(value) => HttpResponse::json(200, &value),
                Err(e) => HttpResponse::json(
                    500,
                    &json!({ "error": e.to_string(), "code": pv_common::Error::Json(e).code() }),
                ),
            }
        }
        "/health" | "/healthz" => HttpResponse::text(200, "ok"),
        _ => HttpResponse::text(404, "not found"),
    }
}

/// Serve until the process is stopped.
pub fn serve(mut session: ViewerSession, addr: SocketAddr) -> Result<(), String> {
    let server = tiny_http::Server::http(addr)
        .map_err(|e| format!("failed to start viewer on {}: {}", addr, e))?;

    info!(
        event = event_names::SERVER_STARTED,
        stage = %Stage::Serve,
        run_id = %session.run_id(),
        addr = %addr,
        "Viewer listening on http://{}/",
        addr
    );

    for request in server.incoming_requests() {
        let method = request.method().to_string();
        let url = request.url().to_string();
        let response = handle_request(&mut session, &method, &url);
        debug!(
            event = event_names::SERVER_REQUEST,
            stage = %Stage::Serve,
            method = %method,
            url = %url,
            status = response.status,
            bytes = response.body.len(),
            "Request served"
        );

        let mut reply =
            tiny_http::Response::from_string(response.body).with_status_code(response.status);
        if let Ok(header) =
            tiny_http::Header::from_bytes(&b"Content-Type"[..], response.content_type.as_bytes())
        {
            reply = reply.with_header(header);
        }
        if let Err(e) = request.respond(reply) {
            warn!(error = %e, url = %url, "Failed to send response");
        }
    }
    Ok(())
}
