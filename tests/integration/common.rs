use assert_cmd::Command;
use cpm_cli::test_utils::{PackageFixture, init_test_logging};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A scratch working directory with its own CPM home.
pub struct TestEnv {
    temp: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        init_test_logging(None);
        Self {
            temp: TempDir::new().unwrap(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        self.temp.path()
    }

    pub fn home(&self) -> PathBuf {
        self.temp.path().join("cpm-home")
    }

    /// `cpm` running in the work dir against this env's home.
    pub fn cpm(&self) -> Command {
        let mut cmd = Command::cargo_bin("cpm").unwrap();
        cmd.current_dir(self.work_dir())
            .env("CPM_HOME", self.home())
            .env("CPM_NO_PROGRESS", "1")
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn write_package(&self, fixture: &PackageFixture) -> PathBuf {
        fixture.write_to(self.work_dir()).unwrap()
    }

    pub fn state(&self) -> serde_json::Value {
        let content = std::fs::read_to_string(self.home().join("state.json")).unwrap();
        serde_json::from_str(&content).unwrap()
    }
}
