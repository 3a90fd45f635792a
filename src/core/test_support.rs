// ─── Test HTTP Server ───
// Serves fixed routes on 127.0.0.1 so downloads can be exercised without
// touching the network. Unknown paths answer 404.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tiny_http::{Response, Server, StatusCode};

#[derive(Debug, Clone)]
pub enum Route {
    Body { data: Vec<u8>, delay: Option<Duration> },
    Status(u16),
}

impl Route {
    pub fn bytes(data: &[u8]) -> Self {
        Route::Body {
            data: data.to_vec(),
            delay: None,
        }
    }

    pub fn delayed(delay: Duration, data: &[u8]) -> Self {
        Route::Body {
            data: data.to_vec(),
            delay: Some(delay),
        }
    }

    pub fn status(code: u16) -> Self {
        Route::Status(code)
    }
}

/// Drop the server to stop it (via `Server::unblock`).
pub struct FileServer {
    pub url: String,
    hits: Arc<Mutex<HashMap<String, usize>>>,
    server: Arc<Server>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl FileServer {
    pub fn start(routes: Vec<(&str, Route)>) -> Self {
        let routes: Arc<HashMap<String, Route>> = Arc::new(
            routes
                .into_iter()
                .map(|(path, route)| (path.to_string(), route))
                .collect(),
        );
        let server = Arc::new(Server::http("127.0.0.1:0").expect("failed to bind test HTTP server"));
        let port = server.server_addr().to_ip().expect("not an IP addr").port();
        let url = format!("http://127.0.0.1:{port}");

        let hits = Arc::new(Mutex::new(HashMap::new()));
        let srv = Arc::clone(&server);
        let counter = Arc::clone(&hits);
        let handle = std::thread::spawn(move || {
            for request in srv.incoming_requests() {
                let path = request.url().to_string();
                *counter.lock().unwrap().entry(path.clone()).or_insert(0) += 1;

                let route = routes.get(&path).cloned();
                std::thread::spawn(move || match route {
                    Some(Route::Body { data, delay }) => {
                        if let Some(delay) = delay {
                            std::thread::sleep(delay);
                        }
                        let _ = request.respond(Response::from_data(data));
                    }
                    Some(Route::Status(code)) => {
                        let _ = request.respond(Response::empty(StatusCode(code)));
                    }
                    None => {
                        let _ = request.respond(Response::empty(StatusCode(404)));
                    }
                });
            }
        });

        Self {
            url,
            hits,
            server,
            handle: Some(handle),
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.url, path)
    }

    /// Requests seen for one path.
    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    /// Requests seen for any path.
    pub fn total_hits(&self) -> usize {
        self.hits.lock().unwrap().values().sum()
    }
}

impl Drop for FileServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
