//! Integration tests for shellcache

mod site;

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Command isolated in a temp dir, pointed at an origin nothing listens on
    struct Sandbox {
        dir: TempDir,
    }

    impl Sandbox {
        fn new() -> Self {
            Self::for_origin("http://127.0.0.1:9", &["/", "/index.html"])
        }

        fn for_origin(origin: &str, assets: &[&str]) -> Self {
            let dir = TempDir::new().unwrap();
            let assets = assets
                .iter()
                .map(|a| format!("\"{}\"", a))
                .collect::<Vec<_>>()
                .join(", ");
            std::fs::write(
                dir.path().join("config.toml"),
                format!(
                    "[site]\norigin = \"{}\"\n\n[precache]\nassets = [{}]\n\n[network]\ntimeout_secs = 5\n",
                    origin, assets
                ),
            )
            .unwrap();
            Self { dir }
        }

        fn status_json(&self) -> serde_json::Value {
            let output = self
                .cmd()
                .args(["status", "--format", "json"])
                .output()
                .unwrap();
            assert!(output.status.success());
            serde_json::from_slice(&output.stdout).unwrap()
        }

        fn config_path(&self) -> PathBuf {
            self.dir.path().join("config.toml")
        }

        fn cmd(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("shellcache");
            cmd.env("SHELLCACHE_CONFIG", self.config_path())
                .env("SHELLCACHE_STATE_DIR", self.dir.path().join("state"))
                .env("CI", "1");
            cmd
        }
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("shellcache")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("offline cache manager"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("shellcache")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("shellcache"));
    }

    #[test]
    fn config_path() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_fills_defaults() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[precache]"))
            .stdout(predicate::str::contains("http://127.0.0.1:9"))
            .stdout(predicate::str::contains("/index.html"));
    }

    #[test]
    fn config_init_refuses_to_overwrite() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));

        let content = std::fs::read_to_string(sandbox.config_path()).unwrap();
        assert!(content.contains("127.0.0.1:9"));
    }

    #[test]
    fn status_without_registration() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["status"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Not registered"));
    }

    #[test]
    fn status_json_is_parseable() {
        let sandbox = Sandbox::new();
        let report = sandbox.status_json();

        assert_eq!(report["backend"], "disk");
        assert!(report["state_dir"].as_str().unwrap().ends_with("state"));
        assert!(report["registration"].is_null());
        assert_eq!(report["partitions"], serde_json::json!([]));
        assert_eq!(report["events"], serde_json::json!([]));
    }

    #[test]
    fn install_fails_when_origin_unreachable() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["install"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Install failed"));

        // The failed version is recorded but nothing was cached
        let report = sandbox.status_json();
        assert_eq!(report["events"][0]["event"], "worker.install_failed");
        assert_eq!(report["registration"]["waiting"]["state"], "redundant");
        assert_eq!(report["partitions"], serde_json::json!([]));
    }

    #[test]
    fn activate_without_install() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["activate"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("is not installed"))
            .stderr(predicate::str::contains("shellcache install"));
    }

    #[test]
    fn events_need_an_active_worker() {
        let sandbox = Sandbox::new();
        for args in [
            vec!["fetch", "/index.html"],
            vec!["sync", "form-submission"],
            vec!["push", "--body", "hello"],
        ] {
            sandbox
                .cmd()
                .args(&args)
                .assert()
                .failure()
                .stderr(predicate::str::contains("No active service worker"));
        }
    }

    #[test]
    fn clear_with_nothing_to_clear() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Nothing to clear"));
    }

    #[test]
    fn fetch_rejects_unknown_method() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["fetch", "/", "-X", "BREW"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unsupported method"));
    }

    #[test]
    fn serves_installed_site_online_and_offline() {
        let site = crate::site::Site::start();
        site.page("/", "root");
        site.page("/index.html", "<h1>Jeressar</h1>");
        site.page("/news.html", "news");
        site.page("/contact", "thanks");
        let sandbox = Sandbox::for_origin(site.origin(), &["/", "/index.html"]);

        sandbox
            .cmd()
            .args(["install"])
            .assert()
            .success();
        assert_eq!(
            sandbox.status_json()["registration"]["waiting"]["state"],
            "installed"
        );
        sandbox.cmd().args(["activate"]).assert().success();

        sandbox
            .cmd()
            .args(["fetch", "/index.html"])
            .assert()
            .success()
            .stdout("<h1>Jeressar</h1>")
            .stderr(predicate::str::contains(" cache "));

        sandbox
            .cmd()
            .args(["fetch", "/news.html"])
            .assert()
            .success()
            .stdout("news")
            .stderr(predicate::str::contains("network+cached"));

        sandbox
            .cmd()
            .args(["fetch", "/contact", "-X", "POST", "-H", "Accept: text/html"])
            .assert()
            .success()
            .stdout("thanks")
            .stderr(predicate::str::contains("bypass"));

        site.go_down();

        sandbox
            .cmd()
            .args(["fetch", "/news.html"])
            .assert()
            .success()
            .stdout("news")
            .stderr(predicate::str::contains(" cache "));

        sandbox
            .cmd()
            .args(["fetch", "/academics.html", "--navigate"])
            .assert()
            .success()
            .stdout("<h1>Jeressar</h1>")
            .stderr(predicate::str::contains("offline"));

        sandbox
            .cmd()
            .args(["fetch", "/resources/banner.jpg"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Network error"));

        let report = sandbox.status_json();
        assert_eq!(report["registration"]["active"]["state"], "active");
        let partitions: Vec<_> = report["partitions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| (p["name"].as_str().unwrap(), p["status"].as_str().unwrap()))
            .collect();
        assert_eq!(
            partitions,
            vec![
                ("jeressar-dynamic-v1.0.0", "current"),
                ("jeressar-static-v1.0.0", "current"),
            ]
        );
        let events: Vec<_> = report["events"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["event"].as_str().unwrap())
            .collect();
        assert_eq!(events, vec!["worker.installed", "worker.activated"]);
    }
}
