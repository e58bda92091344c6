use crate::server::routes::{HttpReply, SimRoutes};
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },
}

pub struct SimServer {
    server: tiny_http::Server,
    routes: Arc<SimRoutes>,
}

impl SimServer {
    pub fn bind(addr: &str, routes: SimRoutes) -> Result<Self, ServerError> {
        let server = tiny_http::Server::http(addr).map_err(|err| ServerError::Bind {
            addr: addr.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            server,
            routes: Arc::new(routes),
        })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Blocks forever. Each request gets its own thread, so concurrent steps run side by side.
    pub fn serve(self) {
        for request in self.server.incoming_requests() {
            let routes = Arc::clone(&self.routes);
            thread::spawn(move || handle_request(&routes, request));
        }
    }
}

fn header_value(request: &tiny_http::Request, name: &'static str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv(name))
        .map(|h| h.value.as_str().to_string())
}

fn handle_request(routes: &SimRoutes, mut request: tiny_http::Request) {
    let method = request.method().as_str().to_string();
    let url = request.url().to_string();
    let authorization = header_value(&request, "Authorization");

    let mut body = String::new();
    if request.as_reader().read_to_string(&mut body).is_err() {
        body.clear();
    }

    let reply = routes.handle(&method, &url, authorization.as_deref(), &body);
    let _ = request.respond(build_response(reply));
}

fn build_response(reply: HttpReply) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let has_body = reply.body.is_some();
    let bytes = reply
        .body
        .map(|body| body.to_string().into_bytes())
        .unwrap_or_default();
    let mut response =
        tiny_http::Response::from_data(bytes).with_status_code(tiny_http::StatusCode(reply.status));

    let mut headers: Vec<(&[u8], &[u8])> = vec![
        (&b"Cache-Control"[..], &b"no-store"[..]),
        (&b"Access-Control-Allow-Origin"[..], &b"*"[..]),
        (&b"Access-Control-Allow-Methods"[..], &b"GET, POST, OPTIONS"[..]),
        (
            &b"Access-Control-Allow-Headers"[..],
            &b"Content-Type, Authorization"[..],
        ),
    ];
    if has_body {
        headers.push((&b"Content-Type"[..], &b"application/json"[..]));
    }
    for (field, value) in headers {
        if let Ok(header) = tiny_http::Header::from_bytes(field, value) {
            response.add_header(header);
        }
    }
    response
}
