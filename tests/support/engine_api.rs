// ABOUTME: Fake Docker-compatible engine API served over a Unix socket.
// ABOUTME: Answers image export and load requests with scripted responses.

use bollard::Docker;
use bytes::Bytes;
use hauler::runtime::{BollardRuntime, RuntimeType};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::UnixListener;

type ApiBody = BoxBody<Bytes, std::io::Error>;

/// How `GET /images/{name}/get` answers.
#[derive(Debug, Clone, Copy)]
pub enum Export {
    Archive(&'static [u8]),
    Missing,
    /// Sends this much of the archive, then drops the connection.
    BreaksAfter(&'static [u8]),
}

/// How `POST /images/load` answers once the whole body has been read.
#[derive(Debug, Clone, Copy)]
pub enum Load {
    Accept,
    Reject(&'static str),
}

struct Script {
    export: Export,
    load: Load,
    loaded: Mutex<Option<Vec<u8>>>,
}

/// A scripted engine listening on a socket in its own temp directory.
pub struct EngineApi {
    dir: TempDir,
    script: Arc<Script>,
}

impl EngineApi {
    pub fn start(export: Export, load: Load) -> Self {
        let dir = tempfile::tempdir().expect("should create socket dir");
        let listener =
            UnixListener::bind(dir.path().join("engine.sock")).expect("should bind engine socket");
        let script = Arc::new(Script {
            export,
            load,
            loaded: Mutex::new(None),
        });
        tokio::spawn(accept(listener, Arc::clone(&script)));
        Self { dir, script }
    }

    pub fn socket(&self) -> PathBuf {
        self.dir.path().join("engine.sock")
    }

    /// A client whose requests give up after `timeout_secs`.
    pub fn runtime(&self, timeout_secs: u64) -> BollardRuntime {
        let socket = self.socket();
        let client = Docker::connect_with_unix(
            socket.to_str().expect("socket path should be UTF-8"),
            timeout_secs,
            bollard::API_DEFAULT_VERSION,
        )
        .expect("should connect to fake engine");
        BollardRuntime::new(client, RuntimeType::Docker)
    }

    /// Body of the last load request that was read to the end.
    pub fn loaded(&self) -> Option<Vec<u8>> {
        self.script.loaded.lock().clone()
    }
}

async fn accept(listener: UnixListener, script: Arc<Script>) {
    while let Ok((stream, _)) = listener.accept().await {
        let script = Arc::clone(&script);
        tokio::spawn(async move {
            let service = service_fn(move |req| respond(req, Arc::clone(&script)));
            let _ = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await;
        });
    }
}

async fn respond(
    req: Request<Incoming>,
    script: Arc<Script>,
) -> Result<Response<ApiBody>, Infallible> {
    let path = req.uri().path().to_string();

    if path.ends_with("/images/load") {
        let body = match req.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(_) => {
                return Ok(json(
                    StatusCode::BAD_REQUEST,
                    r#"{"message":"unexpected EOF"}"#.to_string(),
                ));
            }
        };
        *script.loaded.lock() = Some(body.to_vec());

        let line = match script.load {
            Load::Accept => serde_json::json!({ "stream": "Loaded image: app:v1\n" }),
            Load::Reject(message) => serde_json::json!({ "errorDetail": { "message": message } }),
        };
        return Ok(json(StatusCode::OK, format!("{line}\n")));
    }

    if path.ends_with("/get") {
        return Ok(match script.export {
            Export::Archive(archive) => tar(Full::new(Bytes::from_static(archive))
                .map_err(|never| match never {})
                .boxed()),
            Export::Missing => json(
                StatusCode::NOT_FOUND,
                r#"{"message":"reference does not exist"}"#.to_string(),
            ),
            Export::BreaksAfter(part) => {
                let frames = vec![
                    Ok(Frame::data(Bytes::from_static(part))),
                    Err(std::io::Error::other("daemon went away")),
                ];
                tar(StreamBody::new(futures::stream::iter(frames)).boxed())
            }
        });
    }

    Ok(json(
        StatusCode::NOT_FOUND,
        r#"{"message":"page not found"}"#.to_string(),
    ))
}

fn json(status: StatusCode, body: String) -> Response<ApiBody> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(body)).map_err(|never| match never {}).boxed())
        .expect("should build response")
}

fn tar(body: ApiBody) -> Response<ApiBody> {
    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/x-tar")
        .body(body)
        .expect("should build response")
}
