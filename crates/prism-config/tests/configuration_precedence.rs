//! Behaviour tests for layering defaults, files, environment and flags.

use std::cell::RefCell;
use std::ffi::OsString;
use std::fs;
use std::sync::{Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;
use prism_config::{Config, LogFormat};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Variables cleared for the duration of a scenario.
const PRISM_VARS: &[&str] = &[
    "PRISM_CONFIG_PATH",
    "PRISM_LOG_FILTER",
    "PRISM_LOG_FORMAT",
    "PRISM_DEBOUNCE_MS",
];

struct Harness {
    temp_dir: TempDir,
    cli_args: RefCell<Vec<OsString>>,
    env_overrides: RefCell<Vec<(String, Option<OsString>)>>,
    loaded: RefCell<Option<Config>>,
    error: RefCell<Option<String>>,
    _guard: MutexGuard<'static, ()>,
}

impl Harness {
    fn new() -> Self {
        let guard = ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
        let temp_dir = TempDir::new().unwrap_or_else(|error| panic!("temporary directory: {error}"));
        let harness = Self {
            temp_dir,
            cli_args: RefCell::new(vec![OsString::from("prism")]),
            env_overrides: RefCell::new(Vec::new()),
            loaded: RefCell::new(None),
            error: RefCell::new(None),
            _guard: guard,
        };
        for key in PRISM_VARS {
            harness.replace_env(key, None);
        }
        harness
    }

    fn replace_env(&self, key: &str, value: Option<&str>) {
        let previous = std::env::var_os(key);
        // Environment mutation is unsafe in edition 2024. Scenarios hold
        // `ENV_MUTEX` and `Drop` restores every variable.
        match value {
            Some(text) => unsafe { std::env::set_var(key, text) },
            None => unsafe { std::env::remove_var(key) },
        }
        self.env_overrides
            .borrow_mut()
            .push((key.to_owned(), previous));
    }

    fn write_config(&self, contents: &str) {
        let path = self.temp_dir.path().join("prism.toml");
        if let Err(error) = fs::write(&path, contents) {
            panic!("failed to write configuration: {error}");
        }
        let mut args = self.cli_args.borrow_mut();
        args.push(OsString::from("--config-path"));
        args.push(path.into_os_string());
    }

    fn load(&self) {
        let args = self.cli_args.borrow().clone();
        match Config::resolve_from(args) {
            Ok(config) => *self.loaded.borrow_mut() = Some(config),
            Err(error) => *self.error.borrow_mut() = Some(error.to_string()),
        }
    }

    fn config(&self) -> Config {
        if let Some(error) = self.error.borrow().as_ref() {
            panic!("configuration failed to load: {error}");
        }
        match self.loaded.borrow().as_ref() {
            Some(config) => config.clone(),
            None => panic!("configuration was not loaded"),
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let mut overrides = self.env_overrides.borrow_mut();
        while let Some((key, value)) = overrides.pop() {
            match value {
                Some(previous) => unsafe { std::env::set_var(&key, previous) },
                None => unsafe { std::env::remove_var(&key) },
            }
        }
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

fn unquote(s: &str) -> String {
    s.trim_matches('"').to_owned()
}

#[given("a configuration file setting the debounce delay to {millis} ms")]
fn given_config_file(harness: &Harness, millis: String) {
    harness.write_config(&format!("debounce_ms = {millis}\n"));
}

#[given("the environment sets {key} to {value}")]
fn given_environment(harness: &Harness, key: String, value: String) {
    harness.replace_env(&key, Some(&unquote(&value)));
}

#[given("the command line sets {flag} to {value}")]
fn given_command_line(harness: &Harness, flag: String, value: String) {
    let mut args = harness.cli_args.borrow_mut();
    args.push(OsString::from(flag));
    args.push(OsString::from(unquote(&value)));
}

#[when("the configuration loads")]
fn when_load(harness: &Harness) {
    harness.load();
}

#[then("the debounce delay is {millis} ms")]
fn then_debounce(harness: &Harness, millis: String) {
    let expected: u64 = millis
        .parse()
        .unwrap_or_else(|error| panic!("invalid delay '{millis}': {error}"));
    assert_eq!(harness.config().debounce_ms(), expected);
}

#[then("the log format is {format}")]
fn then_format(harness: &Harness, format: String) {
    let expected: LogFormat = unquote(&format)
        .parse()
        .unwrap_or_else(|error| panic!("invalid format '{format}': {error}"));
    assert_eq!(harness.config().log_format(), expected);
}

#[then("the log filter is {filter}")]
fn then_filter(harness: &Harness, filter: String) {
    assert_eq!(harness.config().log_filter(), unquote(&filter));
}

#[then("loading fails")]
fn then_fails(harness: &Harness) {
    match harness.error.borrow().as_ref() {
        Some(error) => assert!(
            error.starts_with("failed to load configuration"),
            "unexpected error: {error}"
        ),
        None => panic!("configuration loaded despite a malformed value"),
    }
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Built-in defaults apply without any layer"
)]
fn defaults_apply(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Configuration files replace defaults"
)]
fn files_replace_defaults(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Environment variables win over configuration files"
)]
fn environment_wins(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Command-line flags win over the environment"
)]
fn command_line_wins(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Malformed environment values fail fast"
)]
fn malformed_values_fail(#[from(harness)] harness: Harness) {
    let _ = harness;
}
