//! End-to-end tests over a real listener

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::header::{CONTENT_TYPE, LOCATION};
use hyper::{Method, Request, StatusCode};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tempfile::TempDir;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use planetarium::git::{CommitSource, GitError};
use planetarium::health::{HealthRecord, HealthStatus};
use planetarium::server::ServeOptions;
use planetarium::Server;

/// Answers for any directory that still exists
struct DiskCommits;

#[async_trait]
impl CommitSource for DiskCommits {
    async fn latest_commit_hash(&self, dir: &Path) -> Result<String, GitError> {
        existing(dir, "9f86d081884c7d65")
    }

    async fn latest_commit_timestamp(&self, dir: &Path) -> Result<String, GitError> {
        existing(dir, "1700000000")
    }
}

fn existing(dir: &Path, value: &str) -> Result<String, GitError> {
    if dir.is_dir() {
        Ok(value.to_string())
    } else {
        Err(GitError::Spawn {
            dir: dir.to_path_buf(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })
    }
}

struct TestServer {
    addr: SocketAddr,
    chains: TempDir,
    validators: TempDir,
    client: Client<HttpConnector, Empty<Bytes>>,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(ServeOptions::default()).await
    }

    async fn start_with(options: ServeOptions) -> Self {
        let chains = tempfile::tempdir().unwrap();
        let validators = tempfile::tempdir().unwrap();
        for name in ["cosmoshub", "osmosis", ".github", "_IBC", "testnets"] {
            std::fs::create_dir(chains.path().join(name)).unwrap();
        }
        std::fs::write(
            chains.path().join("cosmoshub/chain.json"),
            "{\"chain_name\":\"cosmoshub\"}",
        )
        .unwrap();
        std::fs::create_dir(validators.path().join("tessellated")).unwrap();
        std::fs::write(
            validators.path().join("tessellated/profile.json"),
            "{\"name\":\"Tessellated\"}",
        )
        .unwrap();

        let server = Arc::new(
            Server::new(chains.path(), validators.path(), Arc::new(DiskCommits))
                .with_access_log(false),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(server.serve_with_shutdown(listener, options, async move {
            let _ = stopped.await;
        }));

        Self {
            addr,
            chains,
            validators,
            client: Client::builder(TokioExecutor::new()).build_http(),
            stop: Some(stop),
            task: Some(task),
        }
    }

    /// Signal shutdown and wait for the serving task to return
    async fn shutdown(&mut self, within: Duration) -> Duration {
        let started = Instant::now();
        if let Some(stop) = self.stop.take() {
            stop.send(()).unwrap();
        }
        let task = self.task.take().unwrap();
        tokio::time::timeout(within, task)
            .await
            .expect("server did not stop within the grace period")
            .unwrap();
        started.elapsed()
    }

    async fn request(&self, method: Method, path: &str) -> (StatusCode, hyper::HeaderMap, Bytes) {
        let req = Request::builder()
            .method(method)
            .uri(format!("http://{}{path}", self.addr))
            .body(Empty::new())
            .unwrap();
        let response = self.client.request(req).await.unwrap();
        let (parts, body) = response.into_parts();
        let body = body.collect().await.unwrap().to_bytes();
        (parts.status, parts.headers, body)
    }

    async fn get(&self, path: &str) -> (StatusCode, hyper::HeaderMap, Bytes) {
        self.request(Method::GET, path).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

#[tokio::test]
async fn test_serves_registry_files() {
    let server = TestServer::start().await;

    let (status, headers, body) = server.get("/v1/chains/cosmoshub/chain.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[CONTENT_TYPE], "application/json");
    assert_eq!(body, "{\"chain_name\":\"cosmoshub\"}");

    let (status, _, body) = server.get("/v1/validators/tessellated/profile.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "{\"name\":\"Tessellated\"}");
}

#[tokio::test]
async fn test_all_chains() {
    let server = TestServer::start().await;

    let (status, headers, body) = server.get("/v1/chains/all").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[CONTENT_TYPE], "application/json");
    let chains: Vec<String> = serde_json::from_slice(&body).unwrap();
    assert_eq!(chains, ["cosmoshub", "osmosis"]);
}

#[tokio::test]
async fn test_namespace_root_with_and_without_slash() {
    let server = TestServer::start().await;

    let (bare_status, _, bare) = server.get("/v1/chains").await;
    let (slash_status, _, slash) = server.get("/v1/chains/").await;
    assert_eq!(bare_status, StatusCode::OK);
    assert_eq!(slash_status, StatusCode::OK);
    assert_eq!(bare, slash);
    let listing = String::from_utf8(bare.to_vec()).unwrap();
    assert!(listing.contains("cosmoshub/"));
}

#[tokio::test]
async fn test_directory_redirect() {
    let server = TestServer::start().await;

    let (status, headers, _) = server.get("/v1/validators/tessellated").await;
    assert_eq!(status, StatusCode::MOVED_PERMANENTLY);
    assert_eq!(headers[LOCATION], "/v1/validators/tessellated/");
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::start().await;

    let (status, headers, body) = server.get("/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[CONTENT_TYPE], "application/json");
    let record: HealthRecord = serde_json::from_slice(&body).unwrap();
    assert_eq!(record.status, HealthStatus::Healthy);
    assert_eq!(record.chain_registry_commit, "9f86d081884c7d65");
    assert_eq!(record.validator_registry_age, "1700000000");
}

#[tokio::test]
async fn test_health_with_missing_registry() {
    let server = TestServer::start().await;
    std::fs::remove_dir_all(server.validators.path()).unwrap();

    let (status, _, body) = server.get("/v1/health").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let record: HealthRecord = serde_json::from_slice(&body).unwrap();
    assert_eq!(record.status, HealthStatus::Unhealthy);
    assert_eq!(record.validator_registry_commit, "");
    assert_eq!(record.chain_registry_commit, "9f86d081884c7d65");
}

#[tokio::test]
async fn test_unknown_paths_and_methods() {
    let server = TestServer::start().await;

    let (status, _, body) = server.get("/v2/chains/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "404 page not found\n");

    let (status, _, _) = server.get("/v1/chains/juno/chain.json").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = server.request(Method::POST, "/v1/chains/all").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_head_has_no_body() {
    let server = TestServer::start().await;
    assert!(server.chains.path().join("cosmoshub/chain.json").is_file());

    let (status, _, body) = server.request(Method::HEAD, "/v1/chains/cosmoshub/chain.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_trailing_slash_endpoints() {
    let server = TestServer::start().await;

    let (status, headers, body) = server.get("/v1/chains/all/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[CONTENT_TYPE], "application/json");
    let chains: Vec<String> = serde_json::from_slice(&body).unwrap();
    assert_eq!(chains, ["cosmoshub", "osmosis"]);

    let (status, headers, body) = server.get("/v1/health/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[CONTENT_TYPE], "application/json");
    let record: HealthRecord = serde_json::from_slice(&body).unwrap();
    assert_eq!(record.status, HealthStatus::Healthy);
}

#[tokio::test]
async fn test_percent_encoded_paths() {
    let server = TestServer::start().await;

    let (status, _, body) = server.get("/v1/chains/%61ll").await;
    assert_eq!(status, StatusCode::OK);
    let chains: Vec<String> = serde_json::from_slice(&body).unwrap();
    assert_eq!(chains, ["cosmoshub", "osmosis"]);

    let (status, _, body) = server.get("/v1/chains/cosmoshub/chain%2Ejson").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "{\"chain_name\":\"cosmoshub\"}");

    let (status, _, _) = server.get("/v1/chains/%zz").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_graceful_shutdown() {
    let options = ServeOptions {
        shutdown_grace: Duration::from_secs(2),
        ..ServeOptions::default()
    };
    let mut server = TestServer::start_with(options).await;
    let (status, _, _) = server.get("/v1/chains/all").await;
    assert_eq!(status, StatusCode::OK);
    let addr = server.addr;

    let elapsed = server.shutdown(Duration::from_secs(3)).await;
    assert!(elapsed < Duration::from_secs(3));

    assert!(TcpStream::connect(addr).await.is_err());
}
