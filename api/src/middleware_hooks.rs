use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tower_sessions::Session;
use tracing::{debug, error, info};

use rbac::User;

use crate::{auth::CurrentUser, AppState};

/// Resolves the request identity once, before any handler runs.
///
/// Reads the session user and attaches it to the request as
/// [`CurrentUser`]. An existing `CurrentUser` extension is left alone,
/// which is how tests inject an identity without a session store. A
/// session read failure is treated as no identity: the guarded
/// handlers then return 401 rather than letting a broken session layer
/// through.
pub async fn identity_middleware(
    State(_state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    if request.extensions().get::<CurrentUser>().is_none() {
        let user: Option<User> = match request.extensions().get::<Session>().cloned() {
            Some(session) => match session.get::<User>("user").await {
                Ok(user) => user,
                Err(e) => {
                    error!("Failed to read session user: {}", e);
                    None
                }
            },
            None => None,
        };

        request.extensions_mut().insert(CurrentUser(user));
    }

    Ok(next.run(request).await)
}

/// Request processing hook: logs each request with its handling time.
pub async fn request_middleware(
    State(_state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    info!("Processing {} request to {}", method, uri);

    let response = next.run(request).await;

    let duration = start.elapsed();
    debug!(
        "{} {} -> {} in {:?}",
        method,
        uri,
        response.status(),
        duration
    );

    Ok(response)
}

/// Response processing hook: stamps outgoing responses with the
/// service version.
pub async fn response_middleware(
    State(_state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    if let Ok(value) = env!("CARGO_PKG_VERSION").parse() {
        headers.insert("X-Portals-Version", value);
    }

    Ok(response)
}
