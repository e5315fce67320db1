//! Local HTTP site for tests that go through the real network stack

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Clone)]
enum Route {
    Page(Vec<u8>),
    Status(u16),
    Redirect(String),
}

#[derive(Default)]
struct SiteState {
    routes: Mutex<HashMap<String, Route>>,
    down: AtomicBool,
    hits: AtomicUsize,
}

/// HTTP/1.1 server on an ephemeral loopback port, one thread per connection.
///
/// Unknown paths answer 404. Once `go_down` is called every connection is
/// closed before a response is written.
pub(crate) struct SiteServer {
    origin: String,
    state: Arc<SiteState>,
}

impl SiteServer {
    pub(crate) fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let origin = format!("http://{}", listener.local_addr().unwrap());
        let state = Arc::new(SiteState::default());

        let shared = state.clone();
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let shared = shared.clone();
                thread::spawn(move || serve(stream, &shared));
            }
        });

        Self { origin, state }
    }

    pub(crate) fn origin(&self) -> &str {
        &self.origin
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.origin, path)
    }

    pub(crate) fn page(&self, path: &str, body: impl Into<Vec<u8>>) {
        self.route(path, Route::Page(body.into()));
    }

    pub(crate) fn status(&self, path: &str, status: u16) {
        self.route(path, Route::Status(status));
    }

    pub(crate) fn redirect(&self, path: &str, location: impl Into<String>) {
        self.route(path, Route::Redirect(location.into()));
    }

    pub(crate) fn go_down(&self) {
        self.state.down.store(true, Ordering::SeqCst);
    }

    /// Requests received so far, including refused ones
    pub(crate) fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    fn route(&self, path: &str, route: Route) {
        self.state
            .routes
            .lock()
            .unwrap()
            .insert(path.to_string(), route);
    }
}

fn serve(stream: TcpStream, state: &SiteState) {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }

    let mut content_length = 0;
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }
    let mut body = vec![0; content_length];
    if reader.read_exact(&mut body).is_err() {
        return;
    }

    state.hits.fetch_add(1, Ordering::SeqCst);
    if state.down.load(Ordering::SeqCst) {
        return;
    }

    let path = request_line.split_whitespace().nth(1).unwrap_or("/");
    let route = state.routes.lock().unwrap().get(path).cloned();
    let (status, extra, body) = match route {
        Some(Route::Page(body)) => (200, String::new(), body),
        Some(Route::Status(status)) => (status, String::new(), Vec::new()),
        Some(Route::Redirect(location)) => {
            (302, format!("Location: {}\r\n", location), Vec::new())
        }
        None => (404, String::new(), b"not found".to_vec()),
    };

    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n",
        status,
        reason(status),
        body.len(),
        extra
    );
    let mut stream = reader.into_inner();
    let _ = stream
        .write_all(head.as_bytes())
        .and_then(|_| stream.write_all(&body))
        .and_then(|_| stream.flush());
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        302 => "Found",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
