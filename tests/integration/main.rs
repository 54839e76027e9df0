//! Integration tests for sitecache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::collections::HashMap;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn sitecache() -> Command {
        cargo_bin_cmd!("sitecache")
    }

    /// Write a config whose state lives inside the temp dir
    fn write_config(temp: &TempDir, base_url: &str, precache: &[&str]) -> PathBuf {
        write_generation_config(temp, "test-cache-v1", base_url, precache)
    }

    fn write_generation_config(
        temp: &TempDir,
        generation: &str,
        base_url: &str,
        precache: &[&str],
    ) -> PathBuf {
        let state_dir = temp.path().join("state");
        let entries = precache
            .iter()
            .map(|p| format!("\"{}\"", p))
            .collect::<Vec<_>>()
            .join(", ");
        let content = format!(
            r#"[general]
journal = true

[cache]
generation = "{generation}"
precache = [{entries}]

[origin]
base_url = "{base_url}"
timeout_secs = 2

[storage]
state_dir = "{}"
"#,
            state_dir.display()
        );

        let path = temp.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn with_config(path: &Path) -> Command {
        let mut cmd = sitecache();
        cmd.arg("--config").arg(path);
        for var in [
            "HTTP_PROXY",
            "http_proxy",
            "HTTPS_PROXY",
            "https_proxy",
            "ALL_PROXY",
            "all_proxy",
        ] {
            cmd.env_remove(var);
        }
        cmd
    }

    /// Static site on a loopback port that counts every request it serves.
    ///
    /// Unknown paths get a 404 with body `nf`; POST echoes its body back.
    struct SiteServer {
        base_url: String,
        hits: Arc<AtomicUsize>,
    }

    impl SiteServer {
        fn start(pages: &[(&str, &str)]) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let base_url = format!("http://{}", listener.local_addr().unwrap());
            let pages: HashMap<String, String> = pages
                .iter()
                .map(|(path, body)| (path.to_string(), body.to_string()))
                .collect();
            let hits = Arc::new(AtomicUsize::new(0));

            let counter = hits.clone();
            thread::spawn(move || {
                for stream in listener.incoming().flatten() {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let _ = serve(stream, &pages);
                }
            });

            Self { base_url, hits }
        }

        fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }
    }

    fn serve(mut stream: TcpStream, pages: &HashMap<String, String>) -> std::io::Result<()> {
        let mut reader = BufReader::new(stream.try_clone()?);

        let mut request_line = String::new();
        reader.read_line(&mut request_line)?;
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default().to_string();
        let path = parts.next().unwrap_or("/").to_string();

        let mut content_length = 0;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line)? == 0 || line == "\r\n" {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
        }
        let mut body = vec![0; content_length];
        reader.read_exact(&mut body)?;

        let (status, payload) = match (method.as_str(), pages.get(&path)) {
            ("POST", _) => ("200 OK", format!("posted {}", String::from_utf8_lossy(&body))),
            (_, Some(page)) => ("200 OK", page.clone()),
            (_, None) => ("404 Not Found", "nf".to_string()),
        };

        write!(
            stream,
            "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nX-Site: fixture\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            payload.len(),
            payload
        )?;
        stream.flush()
    }

    #[test]
    fn help_displays() {
        sitecache()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("offline cache-first asset manager"));
    }

    #[test]
    fn version_displays() {
        sitecache()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("sitecache"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp, "http://127.0.0.1:9", &["/"]);

        with_config(&config)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp, "http://127.0.0.1:9", &["/"]);

        with_config(&config)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"))
            .stdout(predicate::str::contains("test-cache-v1"));
    }

    #[test]
    fn config_init_refuses_overwrite() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp, "http://127.0.0.1:9", &["/"]);

        with_config(&config)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));

        let content = std::fs::read_to_string(&config).unwrap();
        assert!(content.contains("test-cache-v1"));
    }

    #[test]
    fn config_init_writes_defaults() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("nested").join("config.toml");

        with_config(&config)
            .args(["config", "init"])
            .assert()
            .success();

        let content = std::fs::read_to_string(&config).unwrap();
        assert!(content.contains("juliocastillodev-cache-v1"));
    }

    #[test]
    fn invalid_config_reports_hint() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("config.toml");
        std::fs::write(&config, "[cache\ngeneration = ").unwrap();

        with_config(&config)
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn buckets_empty() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp, "http://127.0.0.1:9", &["/"]);

        with_config(&config)
            .arg("buckets")
            .assert()
            .success()
            .stdout(predicate::str::contains("No cache buckets found."));
    }

    #[test]
    fn status_before_install() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp, "http://127.0.0.1:9", &["/"]);

        with_config(&config)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("test-cache-v1"))
            .stdout(predicate::str::contains("No generation installed yet"));
    }

    #[test]
    fn activate_before_install_fails() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp, "http://127.0.0.1:9", &["/"]);

        with_config(&config)
            .arg("activate")
            .assert()
            .failure()
            .stderr(predicate::str::contains(
                "Cannot activate while worker is uninstalled",
            ))
            .stderr(predicate::str::contains("sitecache install"));
    }

    #[test]
    fn install_unreachable_origin_fails() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp, "http://127.0.0.1:9", &["/", "/about/"]);

        with_config(&config)
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Precache failed"));

        // The failed generation leaves nothing behind to serve
        with_config(&config)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("uninstalled"));

        let journal = temp.path().join("state").join("journal.log");
        let content = std::fs::read_to_string(journal).unwrap();
        assert!(content.contains("install.failed"));
    }

    #[test]
    fn verify_complete_site() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp, "http://127.0.0.1:9", &["/", "/css/main.css"]);

        let site = temp.path().join("_site");
        std::fs::create_dir_all(site.join("css")).unwrap();
        std::fs::write(site.join("index.html"), "<html></html>").unwrap();
        std::fs::write(site.join("css/main.css"), "body {}").unwrap();

        with_config(&config)
            .args(["verify", "--site-dir"])
            .arg(&site)
            .assert()
            .success()
            .stdout(predicate::str::contains("all precache entries present"));
    }

    #[test]
    fn verify_missing_asset_fails() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp, "http://127.0.0.1:9", &["/", "/css/main.css"]);

        let site = temp.path().join("_site");
        std::fs::create_dir_all(&site).unwrap();
        std::fs::write(site.join("index.html"), "<html></html>").unwrap();

        with_config(&config)
            .args(["verify", "--site-dir"])
            .arg(&site)
            .assert()
            .failure()
            .stdout(predicate::str::contains("/css/main.css"))
            .stderr(predicate::str::contains("1 precache path(s) missing"));
    }

    #[test]
    fn fetch_uncontrolled_goes_to_network() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp, "http://127.0.0.1:9", &["/"]);

        with_config(&config)
            .args(["fetch", "/"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Network request"));
    }

    #[test]
    fn generation_rollover_end_to_end() {
        let server = SiteServer::start(&[("/", "home"), ("/a.css", "css"), ("/b.css", "b-css")]);
        let temp = TempDir::new().unwrap();
        let v1 = write_generation_config(&temp, "test-cache-v1", &server.base_url, &["/", "/a.css"]);

        with_config(&v1)
            .arg("install")
            .assert()
            .success()
            .stdout(predicate::str::contains("installed 2 entries"));
        assert_eq!(server.hits(), 2);

        with_config(&v1)
            .arg("activate")
            .assert()
            .success()
            .stdout(predicate::str::contains("test-cache-v1 is active"))
            .stdout(predicate::str::contains("No stale caches."));

        // Precached asset comes from the bucket without touching the origin
        with_config(&v1)
            .args(["fetch", "-i", "/a.css"])
            .assert()
            .success()
            .stdout("css")
            .stderr(predicate::str::contains("(cache)"))
            .stderr(predicate::str::contains("status: 200"))
            .stderr(predicate::str::contains("x-site: fixture"));
        assert_eq!(server.hits(), 2);

        // A miss goes to the origin once and its 404 is passed through
        with_config(&v1)
            .args(["fetch", "-i", "/missing"])
            .assert()
            .success()
            .stdout("nf")
            .stderr(predicate::str::contains("(network)"))
            .stderr(predicate::str::contains("status: 404"));
        assert_eq!(server.hits(), 3);

        with_config(&v1)
            .args(["fetch", "-X", "POST", "-d", "hello", "/form"])
            .assert()
            .success()
            .stdout("posted hello");
        assert_eq!(server.hits(), 4);

        // Ship a new generation that also precaches /b.css
        let v2 = write_generation_config(
            &temp,
            "test-cache-v2",
            &server.base_url,
            &["/", "/a.css", "/b.css"],
        );
        with_config(&v2).arg("install").assert().success();
        assert_eq!(server.hits(), 7);

        // v1 still controls fetches until v2 activates
        with_config(&v2)
            .args(["fetch", "-i", "/b.css"])
            .assert()
            .success()
            .stdout("b-css")
            .stderr(predicate::str::contains("(network)"));
        assert_eq!(server.hits(), 8);

        with_config(&v2)
            .arg("activate")
            .assert()
            .success()
            .stdout(predicate::str::contains("removed stale cache test-cache-v1"));

        with_config(&v2)
            .args(["fetch", "-i", "/b.css"])
            .assert()
            .success()
            .stdout("b-css")
            .stderr(predicate::str::contains("(cache)"));
        assert_eq!(server.hits(), 8);

        with_config(&v2)
            .args(["buckets", "-f", "plain"])
            .assert()
            .success()
            .stdout("test-cache-v2\n");

        with_config(&v2)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("Fetches are served by test-cache-v2"))
            .stdout(predicate::str::contains("test-cache-v1").not());

        with_config(&v2)
            .arg("activate")
            .assert()
            .failure()
            .stderr(predicate::str::contains(
                "Cannot activate while worker is active",
            ));

        with_config(&v2)
            .arg("update")
            .assert()
            .success()
            .stdout(predicate::str::contains("already active"));

        let journal = std::fs::read_to_string(temp.path().join("state").join("journal.log")).unwrap();
        assert_eq!(journal.matches("install.completed").count(), 2);
        assert_eq!(journal.matches("activate.completed").count(), 2);
        assert_eq!(server.hits(), 8);
    }

    #[test]
    fn update_installs_and_activates() {
        let server = SiteServer::start(&[("/", "home")]);
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp, &server.base_url, &["/"]);

        with_config(&config)
            .arg("update")
            .assert()
            .success()
            .stdout(predicate::str::contains("installed 1 entries"))
            .stdout(predicate::str::contains("test-cache-v1 is active"));

        with_config(&config)
            .args(["fetch", "/"])
            .assert()
            .success()
            .stdout("home");
        assert_eq!(server.hits(), 1);
    }
}
