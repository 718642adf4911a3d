use crate::http::{ResponseBody, full_body, make_error_response};
use hyper::body::Incoming;
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;

/// Serves `/health` (process is up) and `/ready` (driven by `is_ready`).
pub struct AdminService<F> {
    is_ready: F,
}

impl<F> AdminService<F>
where
    F: Fn() -> bool,
{
    pub fn new(is_ready: F) -> Self {
        Self { is_ready }
    }

    fn respond(&self, path: &str) -> Response<ResponseBody> {
        match path {
            "/health" => Response::new(full_body("ok\n")),
            "/ready" => match (self.is_ready)() {
                true => Response::new(full_body("ok\n")),
                false => make_error_response(StatusCode::SERVICE_UNAVAILABLE),
            },
            _ => make_error_response(StatusCode::NOT_FOUND),
        }
    }
}

impl<F> Service<Request<Incoming>> for AdminService<F>
where
    F: Fn() -> bool + Send + Sync + 'static,
{
    type Response = Response<ResponseBody>;
    type Error = Infallible;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let res = self.respond(req.uri().path());
        Box::pin(async move { Ok(res) })
    }
}
