//! Loopback HTTP site the CLI can install from

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Default)]
struct SiteState {
    pages: Mutex<HashMap<String, Vec<u8>>>,
    down: AtomicBool,
}

/// Serves registered pages with 200, anything else with 404; after
/// `go_down` every connection is dropped unanswered
pub struct Site {
    origin: String,
    state: Arc<SiteState>,
}

impl Site {
    pub fn start() -> Self {
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

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn page(&self, path: &str, body: &str) {
        self.state
            .pages
            .lock()
            .unwrap()
            .insert(path.to_string(), body.as_bytes().to_vec());
    }

    pub fn go_down(&self) {
        self.state.down.store(true, Ordering::SeqCst);
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
    if reader.read_exact(&mut body).is_err() || state.down.load(Ordering::SeqCst) {
        return;
    }

    let path = request_line.split_whitespace().nth(1).unwrap_or("/");
    let page = state.pages.lock().unwrap().get(path).cloned();
    let (status, body) = match page {
        Some(body) => ("200 OK", body),
        None => ("404 Not Found", b"not found".to_vec()),
    };

    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    let mut stream = reader.into_inner();
    let _ = stream
        .write_all(head.as_bytes())
        .and_then(|_| stream.write_all(&body))
        .and_then(|_| stream.flush());
}
