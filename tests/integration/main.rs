//! Integration tests for thile-launch

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;

    fn thile_launch() -> Command {
        cargo_bin_cmd!("thile-launch")
    }

    #[test]
    fn help_displays() {
        thile_launch()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--run"))
            .stdout(predicate::str::contains("--lock"));
    }

    #[test]
    fn version_displays() {
        thile_launch()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("thile-launch"));
    }

    #[test]
    fn socket_required() {
        thile_launch().assert().failure();
    }

    #[test]
    fn write_config_once() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        thile_launch()
            .args(["--write-config", "--config"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("copy_tool = \"hadoop\""));

        thile_launch()
            .args(["--write-config", "--config"])
            .arg(&path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
    }
}

#[cfg(unix)]
mod pipeline_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use axum::http::{header, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use predicates::prelude::*;
    use std::os::unix::fs::PermissionsExt;
    use std::os::unix::process::CommandExt;
    use std::path::{Path, PathBuf};
    use std::process::Stdio;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;
    use thile_launch::cache::local_name;

    const PHOTOS: &str = r#"{"collections":[{"collection":"photos","partition":1,"path":"/hdfs/hadoop-alidoro-nn-vip/data/photos"}]}"#;

    const DUPLICATE_VIDEOS: &str = r#"{"collections":[
        {"collection":"videos","path":"/hdfs/hadoop-alidoro-nn-vip/data/videos-old"},
        {"collection":"videos","partition":0,"path":"/hdfs/hadoop-alidoro-nn-vip/data/videos-new"}
    ]}"#;

    /// Serve a canned socket config on a local port for the rest of the test
    fn serve_config(status: StatusCode, body: &'static str) -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();

        let app = Router::new().route(
            "/sockets/{socket}",
            get(move || async move { (status, [(header::CONTENT_TYPE, "application/json")], body) }),
        );

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                axum::serve(listener, app).await.ok();
            });
        });

        format!("http://{addr}/sockets/")
    }

    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Temp workspace with a config server, a fake hadoop, a fake server and a config file
    ///
    /// The fake server records its arguments, then sleeps for `$THILE_SLEEP`
    /// seconds if set and exits with `$THILE_EXIT`.
    struct Fixture {
        dir: TempDir,
        config: PathBuf,
    }

    impl Fixture {
        fn new(body: &'static str, copy_tool: &str) -> Self {
            Self::with_status(StatusCode::OK, body, copy_tool)
        }

        fn with_status(status: StatusCode, body: &'static str, copy_tool: &str) -> Self {
            let base_url = serve_config(status, body);
            let dir = TempDir::new().unwrap();
            let copy_tool = match copy_tool {
                "fake" => script(
                    dir.path(),
                    "hadoop",
                    &format!(
                        "echo \"$3\" >> {log}\necho \"$3\" > \"$4\"",
                        log = dir.path().join("copies.log").display()
                    ),
                )
                .display()
                .to_string(),
                other => other.to_string(),
            };
            let server = script(
                dir.path(),
                "thile",
                &format!(
                    "echo \"$@\" > {out}\n\
                     if [ -n \"$THILE_SLEEP\" ]; then exec sleep \"$THILE_SLEEP\"; fi\n\
                     exit ${{THILE_EXIT:-0}}",
                    out = dir.path().join("server.args").display()
                ),
            );
            std::fs::create_dir(dir.path().join("cache")).unwrap();

            let config = dir.path().join("config.toml");
            std::fs::write(
                &config,
                format!(
                    "[service]\nbase_url = \"{base_url}\"\ntimeout_secs = 5\n\n\
                     [hdfs]\ncopy_tool = \"{copy_tool}\"\n\n\
                     [server]\nbinary = \"{server}\"\n\n\
                     [cache]\ndir = \"{cache}\"\n",
                    server = server.display(),
                    cache = dir.path().join("cache").display(),
                ),
            )
            .unwrap();

            Self { dir, config }
        }

        fn cmd(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("thile-launch");
            cmd.arg("--config").arg(&self.config);
            cmd
        }

        fn cached(&self, remote: &str) -> PathBuf {
            self.dir.path().join("cache").join(local_name(remote))
        }

        fn copies(&self) -> Vec<String> {
            std::fs::read_to_string(self.dir.path().join("copies.log"))
                .map(|s| s.lines().map(str::to_string).collect())
                .unwrap_or_default()
        }

        fn server_args(&self) -> Option<String> {
            std::fs::read_to_string(self.dir.path().join("server.args"))
                .ok()
                .map(|s| s.trim_end().to_string())
        }
    }

    #[test]
    fn dry_run_fetches_but_does_not_start() {
        let fixture = Fixture::new(PHOTOS, "fake");

        fixture
            .cmd()
            .args(["-v", "hfile-1:9999"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configured to serve"))
            .stdout(predicate::str::contains("Downloading photos/1"))
            .stdout(predicate::str::contains("DRY RUN"))
            .stdout(predicate::str::contains(format!(
                "photos/1={}",
                fixture.cached("/data/photos").display()
            )));

        assert_eq!(fixture.copies(), vec!["/data/photos"]);
        assert!(fixture.cached("/data/photos").exists());
        assert_eq!(fixture.server_args(), None);
    }

    #[test]
    fn run_starts_server_with_pairs() {
        let fixture = Fixture::new(PHOTOS, "fake");

        fixture
            .cmd()
            .args(["--run", "--lock", "hfile-1:9999", "--", "--port", "9999"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Starting"));

        assert_eq!(
            fixture.server_args(),
            Some(format!(
                "--mlock --port 9999 photos/1={}",
                fixture.cached("/data/photos").display()
            ))
        );
    }

    #[test]
    fn duplicate_key_launches_later_path_once() {
        let fixture = Fixture::new(DUPLICATE_VIDEOS, "fake");

        fixture
            .cmd()
            .args(["--run", "hfile-1:9999"])
            .assert()
            .success();

        assert_eq!(fixture.copies(), vec!["/data/videos-new"]);
        assert_eq!(
            fixture.server_args(),
            Some(format!(
                "videos/0={}",
                fixture.cached("/data/videos-new").display()
            ))
        );
    }

    #[test]
    fn cached_file_skips_copy() {
        // `false` as copy tool fails any copy attempt
        let fixture = Fixture::new(PHOTOS, "false");
        std::fs::write(fixture.cached("/data/photos"), "cached").unwrap();

        fixture
            .cmd()
            .arg("hfile-1:9999")
            .assert()
            .success()
            .stdout(predicate::str::contains("photos/1 already exists locally."));
    }

    #[test]
    fn copy_failure_aborts_before_launch() {
        let fixture = Fixture::new(PHOTOS, "false");

        fixture
            .cmd()
            .args(["--run", "hfile-1:9999"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Copy of /data/photos failed"));

        assert_eq!(fixture.server_args(), None);
    }

    #[test]
    fn server_exit_code_is_propagated() {
        let fixture = Fixture::new(PHOTOS, "fake");

        fixture
            .cmd()
            .env("THILE_EXIT", "7")
            .args(["--run", "hfile-1:9999"])
            .assert()
            .code(7)
            .stderr(predicate::str::contains("Server exited with code 7"));
    }

    #[test]
    fn ctrl_c_during_run_exits_cleanly() {
        let fixture = Fixture::new(PHOTOS, "fake");

        // Own process group so the interrupt reaches the launcher and the
        // server together, as a terminal Ctrl-C would
        let mut child = std::process::Command::new(env!("CARGO_BIN_EXE_thile-launch"))
            .arg("--config")
            .arg(&fixture.config)
            .args(["--run", "hfile-1:9999"])
            .env("THILE_SLEEP", "30")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0)
            .spawn()
            .unwrap();

        let started = Instant::now();
        while fixture.server_args().is_none() {
            assert!(
                started.elapsed() < Duration::from_secs(10),
                "server never started"
            );
            std::thread::sleep(Duration::from_millis(50));
        }
        std::thread::sleep(Duration::from_millis(300));

        let rc = unsafe { libc::killpg(child.id() as libc::pid_t, libc::SIGINT) };
        assert_eq!(rc, 0);

        let interrupted = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait().unwrap() {
                break status;
            }
            if interrupted.elapsed() > Duration::from_secs(10) {
                child.kill().ok();
                panic!("launcher did not exit after SIGINT");
            }
            std::thread::sleep(Duration::from_millis(50));
        };

        assert_eq!(status.code(), Some(0));
    }

    #[test]
    fn config_http_error_fails() {
        let fixture = Fixture::with_status(StatusCode::NOT_FOUND, "{}", "fake");

        fixture
            .cmd()
            .arg("unknown-socket")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to fetch socket config"));

        assert!(fixture.copies().is_empty());
    }
}
