#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;

use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};

/// A request captured by [`StubServer`].
#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Clone)]
struct Route {
    method: &'static str,
    path: &'static str,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
}

/// Minimal HTTP/1.1 server answering canned responses per method and path.
///
/// Unknown routes get a 404. Every connection is closed after one exchange.
pub struct StubServer {
    base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

pub struct StubServerBuilder {
    routes: Vec<Route>,
}

impl StubServerBuilder {
    pub fn route(
        mut self,
        method: &'static str,
        path: &'static str,
        status: u16,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        self.routes.push(Route {
            method,
            path,
            status,
            content_type: "application/json",
            body: body.into(),
        });
        self
    }

    pub fn binary(mut self, path: &'static str, body: impl Into<Vec<u8>>) -> Self {
        self.routes.push(Route {
            method: "GET",
            path,
            status: 200,
            content_type: "application/octet-stream",
            body: body.into(),
        });
        self
    }

    pub fn start(self) -> StubServer {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let address = listener.local_addr().expect("stub server address");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let routes = self.routes;

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                if let Some(request) = handle(stream, &routes) {
                    recorded.lock().expect("request log poisoned").push(request);
                }
            }
        });

        StubServer {
            base_url: format!("http://{}", address),
            requests,
        }
    }
}

impl StubServer {
    pub fn builder() -> StubServerBuilder {
        StubServerBuilder { routes: Vec::new() }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().expect("request log poisoned").clone()
    }
}

fn handle(mut stream: TcpStream, routes: &[Route]) -> Option<Recorded> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_owned();
    let target = parts.next()?;
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    let (path, query) = (path.to_owned(), query.to_owned());

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            headers.push((key.trim().to_owned(), value.trim().to_owned()));
        }
    }

    let header = |name: &str| {
        headers
            .iter()
            .find(|(key, _): &&(String, String)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
    };
    let chunked = header("transfer-encoding")
        .is_some_and(|value| value.eq_ignore_ascii_case("chunked"));
    let body = if chunked {
        read_chunked(&mut reader)?
    } else {
        let length = header("content-length")
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(0);
        let mut body = vec![0; length];
        reader.read_exact(&mut body).ok()?;
        body
    };

    let route = routes
        .iter()
        .find(|route| route.method == method && route.path == path);
    let (status, content_type, payload) = match route {
        Some(route) => (route.status, route.content_type, route.body.clone()),
        None => (404, "text/plain", b"not found".to_vec()),
    };

    let head = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        payload.len()
    );
    stream.write_all(head.as_bytes()).ok()?;
    stream.write_all(&payload).ok()?;
    stream.flush().ok()?;

    Some(Recorded {
        method,
        path,
        query,
        headers,
        body,
    })
}

fn read_chunked(reader: &mut impl BufRead) -> Option<Vec<u8>> {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        reader.read_line(&mut size_line).ok()?;
        let size = usize::from_str_radix(size_line.trim().split(';').next()?, 16).ok()?;
        let mut chunk = vec![0; size + 2];
        reader.read_exact(&mut chunk).ok()?;
        if size == 0 {
            return Some(body);
        }
        body.extend_from_slice(&chunk[..size]);
    }
}

/// Wraps `content` into a chat-completion response body.
pub fn chat_completion(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

/// A small semi-transparent PNG standing in for the brand logo.
pub fn logo_png() -> Vec<u8> {
    let image = RgbaImage::from_fn(240, 80, |x, _| Rgba([20, 60, (x % 255) as u8, 200]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut std::io::Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .expect("encode logo");
    bytes
}

/// A TrueType font served as the brand family.
pub fn brand_font() -> Vec<u8> {
    include_bytes!("../../assets/fonts/DejaVuSans.ttf").to_vec()
}

/// Text of every page, decoded from the content streams.
///
/// Only text drawn with a built-in font decodes to readable characters.
pub fn pdf_text(bytes: &[u8]) -> String {
    let document = lopdf::Document::load_mem(bytes).expect("parse rendered pdf");
    let pages: Vec<u32> = document.get_pages().keys().copied().collect();
    document.extract_text(&pages).expect("extract pdf text")
}

pub fn scratch_dir(root: &std::path::Path) -> PathBuf {
    root.join("fonts")
}
