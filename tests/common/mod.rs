use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use reqwest::StatusCode;

static SERVER: OnceLock<Option<TestServer>> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests
        // Assumes debug profile; adjust if you run tests with --release
        let mut cmd = Command::new("target/debug/orgtree-api");
        cmd.env("ORGTREE_API_PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server can see DATABASE_URL from .env
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    /// Poll /health until the server answers. Returns whether the database
    /// behind it is actually reachable.
    async fn wait_ready(&self, timeout: Duration) -> Result<bool> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                match resp.status() {
                    StatusCode::OK => return Ok(true),
                    StatusCode::SERVICE_UNAVAILABLE => return Ok(false),
                    _ => {}
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

/// Spawn (once) and return the shared test server, or None when the test
/// should be skipped because no database is reachable.
pub async fn ensure_server() -> Result<Option<&'static TestServer>> {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set; skipping HTTP integration test");
        return Ok(None);
    }

    let server = SERVER.get_or_init(|| TestServer::spawn().ok());
    let Some(server) = server.as_ref() else {
        eprintln!("server binary could not be spawned; skipping HTTP integration test");
        return Ok(None);
    };

    if server.wait_ready(Duration::from_secs(10)).await? {
        Ok(Some(server))
    } else {
        eprintln!("database unreachable behind /health; skipping HTTP integration test");
        Ok(None)
    }
}

/// Unique suffix so repeated test runs never collide on names or titles.
pub fn unique(label: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    format!("{}-{}", label, nanos)
}
