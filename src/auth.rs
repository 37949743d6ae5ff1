use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Identity supplied by the upstream authentication gateway. The image
/// subsystem trusts these headers unconditionally; it performs no
/// authorization of its own beyond "must be authenticated".
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: String,
    pub role: String,
}

#[derive(Clone)]
pub struct AuthLayer;

impl<S> tower::Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService { inner }
    }
}

#[derive(Clone)]
pub struct AuthService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for AuthService<S>
where
    S: tower::Service<axum::http::Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let user_id = req
                .headers()
                .get("X-User-Id")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let Some(user_id) = user_id.filter(|id| !id.is_empty()) else {
                let body = json!({
                    "data": null,
                    "error": {
                        "code": 401,
                        "message": "Authentication required"
                    }
                });
                return Ok((StatusCode::UNAUTHORIZED, axum::Json(body)).into_response());
            };

            let role = req
                .headers()
                .get("X-User-Role")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("user")
                .to_string();

            req.extensions_mut().insert(UserContext { user_id, role });
            inner.call(req).await
        })
    }
}
