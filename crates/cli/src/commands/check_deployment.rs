//! Deployment readiness checks.
//!
//! Inspects a project root and the storefront environment the same way the
//! server reads it at startup: `.env` in the root first, then the process
//! environment on top.
//!
//! A failure is anything that stops a deploy or the server from starting.
//! Warnings are printed but never change the exit code.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use robo_shop_storefront::config::{SecretAssessment, parse_bool, parse_host_list};

/// Files and directories a deployable checkout must contain.
pub const REQUIRED_PATHS: &[&str] = &[
    "Dockerfile",
    ".env.example",
    "DEPLOYMENT.md",
    "README.md",
    "Cargo.toml",
    "crates/storefront/migrations",
];

const DEFAULT_STATIC_DIR: &str = "crates/storefront/static";
const DEFAULT_MEDIA_DIR: &str = "media";

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pass,
    Warn,
    Fail,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pass => "PASS",
            Self::Warn => "WARN",
            Self::Fail => "FAIL",
        })
    }
}

/// One line of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub section: &'static str,
    pub status: Status,
    pub message: String,
}

/// All findings, in the order they were checked.
#[derive(Debug, Default)]
pub struct Report {
    findings: Vec<Finding>,
}

impl Report {
    fn push(&mut self, section: &'static str, status: Status, message: impl Into<String>) {
        self.findings.push(Finding {
            section,
            status,
            message: message.into(),
        });
    }

    /// Every finding.
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Findings that fail the check.
    pub fn issues(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.status == Status::Fail)
    }

    /// Findings worth a look that do not fail the check.
    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.status == Status::Warn)
    }

    /// Whether any finding fails the check.
    #[must_use]
    pub fn has_issues(&self) -> bool {
        self.issues().next().is_some()
    }

    /// Print the report to stdout.
    #[allow(clippy::print_stdout)]
    pub fn print(&self) {
        println!("Robo Shop deployment check");
        println!("==========================");

        let mut section = "";
        for finding in self.findings() {
            if finding.section != section {
                section = finding.section;
                println!();
                println!("{section}");
            }
            println!("  [{}] {}", finding.status, finding.message);
        }

        println!();
        if self.has_issues() {
            println!("Issues that block deployment:");
            for (n, finding) in self.issues().enumerate() {
                println!("  {}. {}", n + 1, finding.message);
            }
        } else {
            println!("No blocking issues found.");
            println!("Next steps:");
            println!("  1. robo-cli migrate");
            println!("  2. docker build -t robo-shop .");
            println!("  3. Follow DEPLOYMENT.md for the target host");
        }

        let warnings = self.warnings().count();
        if warnings > 0 {
            println!("{warnings} warning(s); review them before going live.");
        }
    }
}

/// Storefront settings as the server would see them.
#[derive(Debug, Default, Clone)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Read `<root>/.env` (if any), overridden by the process environment.
    #[must_use]
    pub fn load(root: &Path) -> Self {
        let mut vars = HashMap::new();
        if let Ok(iter) = dotenvy::from_path_iter(root.join(".env")) {
            vars.extend(iter.flatten());
        }
        vars.extend(std::env::vars());
        Self { vars }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// Check `root` against the current environment.
#[must_use]
pub fn run(root: &Path) -> Report {
    check(root, &Environment::load(root))
}

/// Check `root` against `env`.
#[must_use]
pub fn check(root: &Path, env: &Environment) -> Report {
    let mut report = Report::default();
    check_files(&mut report, root);
    check_settings(&mut report, env);
    check_directories(&mut report, root, env);
    check_database(&mut report, env);
    check_env_file(&mut report, root);
    report
}

fn check_files(report: &mut Report, root: &Path) {
    for path in REQUIRED_PATHS {
        if root.join(path).exists() {
            report.push("Files", Status::Pass, format!("{path} present"));
        } else {
            report.push("Files", Status::Fail, format!("{path} is missing"));
        }
    }
}

fn check_settings(report: &mut Report, env: &Environment) {
    const SECTION: &str = "Settings";

    match parse_bool("STOREFRONT_DEBUG", env.get("STOREFRONT_DEBUG").unwrap_or("false")) {
        Ok(false) => report.push(SECTION, Status::Pass, "STOREFRONT_DEBUG is off"),
        Ok(true) => report.push(
            SECTION,
            Status::Warn,
            "STOREFRONT_DEBUG is on; turn it off in production",
        ),
        Err(e) => report.push(SECTION, Status::Fail, e.to_string()),
    }

    let hosts = parse_host_list(env.get("STOREFRONT_ALLOWED_HOSTS").unwrap_or(""));
    if hosts.is_empty() {
        report.push(
            SECTION,
            Status::Warn,
            "STOREFRONT_ALLOWED_HOSTS is empty; any Host header is accepted",
        );
    } else if hosts.iter().any(|h| h == "*") {
        report.push(
            SECTION,
            Status::Warn,
            "STOREFRONT_ALLOWED_HOSTS contains '*'; any Host header is accepted",
        );
    } else {
        report.push(
            SECTION,
            Status::Pass,
            format!("STOREFRONT_ALLOWED_HOSTS = {}", hosts.join(", ")),
        );
    }

    match env.get("STOREFRONT_SESSION_SECRET") {
        None => report.push(SECTION, Status::Fail, "STOREFRONT_SESSION_SECRET is not set"),
        Some(secret) => match SecretAssessment::of(secret).reason() {
            None => report.push(SECTION, Status::Pass, "STOREFRONT_SESSION_SECRET looks strong"),
            Some(reason) => report.push(
                SECTION,
                Status::Fail,
                format!("STOREFRONT_SESSION_SECRET {reason}"),
            ),
        },
    }

    match env.get("STOREFRONT_BASE_URL") {
        None => report.push(SECTION, Status::Fail, "STOREFRONT_BASE_URL is not set"),
        Some(url) if url.starts_with("https://") => {
            report.push(SECTION, Status::Pass, format!("STOREFRONT_BASE_URL = {url}"));
        }
        Some(url) => report.push(
            SECTION,
            Status::Warn,
            format!("STOREFRONT_BASE_URL = {url}; session cookies will not be Secure"),
        ),
    }
}

fn check_directories(report: &mut Report, root: &Path, env: &Environment) {
    const SECTION: &str = "Directories";

    let static_dir = env.get("STOREFRONT_STATIC_DIR").unwrap_or(DEFAULT_STATIC_DIR);
    if root.join(static_dir).is_dir() {
        report.push(SECTION, Status::Pass, format!("static files in {static_dir}"));
    } else {
        report.push(
            SECTION,
            Status::Warn,
            format!("static directory {static_dir} not found; pages will render unstyled"),
        );
    }

    let media_dir = env.get("STOREFRONT_MEDIA_DIR").unwrap_or(DEFAULT_MEDIA_DIR);
    if root.join(media_dir).is_dir() {
        report.push(SECTION, Status::Pass, format!("media uploads in {media_dir}"));
    } else {
        report.push(
            SECTION,
            Status::Warn,
            format!("media directory {media_dir} not found; it will be created at startup"),
        );
    }
}

fn check_database(report: &mut Report, env: &Environment) {
    const SECTION: &str = "Database";

    let Some(url) = env
        .get("STOREFRONT_DATABASE_URL")
        .or_else(|| env.get("DATABASE_URL"))
    else {
        report.push(
            SECTION,
            Status::Fail,
            "STOREFRONT_DATABASE_URL (or DATABASE_URL) is not set",
        );
        return;
    };

    // The URL carries credentials: report the scheme only.
    let scheme = url.split_once("://").map_or("", |(scheme, _)| scheme);
    if matches!(scheme, "postgres" | "postgresql") {
        report.push(SECTION, Status::Pass, "database is PostgreSQL");
    } else {
        report.push(
            SECTION,
            Status::Warn,
            format!("database scheme {scheme:?} is not PostgreSQL; the storefront only supports PostgreSQL"),
        );
    }
}

fn check_env_file(report: &mut Report, root: &Path) {
    if root.join(".env").is_file() {
        report.push("Environment", Status::Pass, ".env present");
    } else {
        report.push(
            "Environment",
            Status::Warn,
            ".env not found; settings must come from the process environment",
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    const STRONG_SECRET: &str = "k3J9vQx2Lm8Pz5Rt7Wy4Nb6Hc1Df0GsA";

    /// A fresh directory under the system temp dir.
    fn scratch_root(name: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!("robo-check-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(&root).unwrap();
        root
    }

    fn complete_root(name: &str) -> PathBuf {
        let root = scratch_root(name);
        for file in ["Dockerfile", ".env.example", "DEPLOYMENT.md", "README.md", "Cargo.toml", ".env"] {
            std::fs::write(root.join(file), "").unwrap();
        }
        for dir in ["crates/storefront/migrations", "crates/storefront/static", "media"] {
            std::fs::create_dir_all(root.join(dir)).unwrap();
        }
        root
    }

    fn production_env() -> Environment {
        let pairs = [
            ("STOREFRONT_DEBUG", "false"),
            ("STOREFRONT_ALLOWED_HOSTS", "shop.example.dz"),
            ("STOREFRONT_SESSION_SECRET", STRONG_SECRET),
            ("STOREFRONT_BASE_URL", "https://shop.example.dz"),
            ("STOREFRONT_DATABASE_URL", "postgres://robo:pw@db/robo_shop"),
        ];
        Environment {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn status_of<'a>(report: &'a Report, needle: &str) -> Option<&'a Finding> {
        report.findings().iter().find(|f| f.message.contains(needle))
    }

    #[test]
    fn test_complete_checkout_passes() {
        let root = complete_root("complete");
        let report = check(&root, &production_env());
        assert!(!report.has_issues(), "{:?}", report.findings());
        assert_eq!(report.warnings().count(), 0, "{:?}", report.findings());
        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_missing_file_is_an_issue() {
        let root = complete_root("missing-file");
        std::fs::remove_file(root.join("DEPLOYMENT.md")).unwrap();
        let report = check(&root, &production_env());
        assert!(report.has_issues());
        let finding = status_of(&report, "DEPLOYMENT.md").unwrap();
        assert_eq!(finding.status, Status::Fail);
        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_debug_on_only_warns() {
        let root = complete_root("debug");
        let mut env = production_env();
        env.vars.insert("STOREFRONT_DEBUG".into(), "true".into());
        let report = check(&root, &env);
        assert!(!report.has_issues());
        assert_eq!(status_of(&report, "STOREFRONT_DEBUG").unwrap().status, Status::Warn);
        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_weak_secret_is_an_issue() {
        let root = complete_root("secret");
        let mut env = production_env();
        env.vars
            .insert("STOREFRONT_SESSION_SECRET".into(), "robo-insecure-change-me".into());
        let report = check(&root, &env);
        assert_eq!(
            status_of(&report, "STOREFRONT_SESSION_SECRET").unwrap().status,
            Status::Fail
        );
        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_empty_allowed_hosts_warns() {
        let root = complete_root("hosts");
        let mut env = production_env();
        env.vars.remove("STOREFRONT_ALLOWED_HOSTS");
        let report = check(&root, &env);
        assert_eq!(
            status_of(&report, "STOREFRONT_ALLOWED_HOSTS").unwrap().status,
            Status::Warn
        );
        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_sqlite_url_warns_without_leaking_credentials() {
        let root = complete_root("sqlite");
        let mut env = production_env();
        env.vars
            .insert("STOREFRONT_DATABASE_URL".into(), "sqlite://secret-db.sqlite3".into());
        let report = check(&root, &env);
        let finding = status_of(&report, "not PostgreSQL").unwrap();
        assert_eq!(finding.status, Status::Warn);
        assert!(!finding.message.contains("secret-db"));
        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_database_url_falls_back_to_generic_var() {
        let root = complete_root("fallback");
        let mut env = production_env();
        env.vars.remove("STOREFRONT_DATABASE_URL");
        env.vars
            .insert("DATABASE_URL".into(), "postgresql://localhost/robo".into());
        let report = check(&root, &env);
        assert_eq!(status_of(&report, "PostgreSQL").unwrap().status, Status::Pass);
        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_missing_media_dir_and_env_file_only_warn() {
        let root = complete_root("dirs");
        std::fs::remove_dir_all(root.join("media")).unwrap();
        std::fs::remove_file(root.join(".env")).unwrap();
        let report = check(&root, &production_env());
        assert!(!report.has_issues());
        assert_eq!(report.warnings().count(), 2);
        std::fs::remove_dir_all(root).unwrap();
    }
}
