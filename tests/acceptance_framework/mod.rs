// Acceptance Test Framework
// Provides infrastructure for writing Given/When/Then acceptance tests
// against a mock lead service
#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::{json, Value};
use tempfile::TempDir;
use crate::mock_backend::{BackendState, MockBackend};

/// Test context for acceptance tests
/// Owns a private HOME and a mock lead service with two empty stages
pub struct AcceptanceTestContext {
    temp_dir: TempDir,
    backend: MockBackend,
}

impl AcceptanceTestContext {
    /// Create a new test context with stages A (id 1) and B (id 2) and no leads
    pub fn new() -> Self {
        let state = BackendState {
            stages: vec![
                json!({"id": 1, "name": "A", "color": null, "order": 0}),
                json!({"id": 2, "name": "B", "color": null, "order": 1}),
            ],
            next_id: 100,
            ..Default::default()
        };
        Self {
            temp_dir: TempDir::new().unwrap(),
            backend: MockBackend::start(state),
        }
    }

    /// Get a command instance configured for this test context
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("leadboard").unwrap();
        cmd.env("HOME", self.temp_dir.path())
            .env("LEADBOARD_API_URL", &self.backend.url)
            .env_remove("LEADBOARD_API_TOKEN")
            .env("LEADBOARD_LOG", "off");
        cmd
    }

    pub fn backend(&self) -> &MockBackend {
        &self.backend
    }
}

/// Builder for Given steps (test setup)
pub struct GivenBuilder<'a> {
    ctx: &'a AcceptanceTestContext,
}

impl<'a> GivenBuilder<'a> {
    pub fn new(ctx: &'a AcceptanceTestContext) -> Self {
        Self { ctx }
    }

    /// Given: stage exists
    pub fn stage_exists(&self, id: i64, name: &str) -> &Self {
        let mut state = self.ctx.backend.state();
        let order = state.stages.len();
        state.stages.push(json!({"id": id, "name": name, "color": null, "order": order}));
        self
    }

    /// Given: lead exists in stage
    pub fn lead_exists_in_stage(&self, id: i64, stage: i64) -> &Self {
        self.ctx.backend.state().leads.push(json!({
            "id": id,
            "client_name": format!("Lead {}", id),
            "phone_number": "998900000000",
            "stage": stage,
            "is_converted": false,
        }));
        self
    }

    /// Given: converted lead exists in stage
    pub fn converted_lead_exists_in_stage(&self, id: i64, stage: i64) -> &Self {
        self.lead_exists_in_stage(id, stage);
        let mut state = self.ctx.backend.state();
        if let Some(lead) = state.leads.iter_mut().find(|l| l["id"] == json!(id)) {
            lead["is_converted"] = Value::Bool(true);
        }
        self
    }

    /// Given: the lead service rejects lead updates
    pub fn updates_are_rejected(&self) -> &Self {
        self.ctx.backend.state().fail_patch = true;
        self
    }
}

/// Builder for When steps (actions)
pub struct WhenBuilder<'a> {
    ctx: &'a AcceptanceTestContext,
    cmd_result: Option<std::process::Output>,
}

impl<'a> WhenBuilder<'a> {
    pub fn new(ctx: &'a AcceptanceTestContext) -> Self {
        Self {
            ctx,
            cmd_result: None,
        }
    }

    /// When: execute command
    pub fn execute(&mut self, args: &[&str]) -> &mut Self {
        let result = self.ctx.cmd()
            .args(args)
            .output()
            .unwrap();
        self.cmd_result = Some(result);
        self
    }

    /// When: execute command and expect success
    pub fn execute_success(&mut self, args: &[&str]) -> &mut Self {
        let result = self.ctx.cmd()
            .args(args)
            .assert()
            .success()
            .get_output()
            .clone();
        self.cmd_result = Some(result);
        self
    }

    /// When: execute command and expect failure
    pub fn execute_failure(&mut self, args: &[&str]) -> &mut Self {
        let result = self.ctx.cmd()
            .args(args)
            .assert()
            .failure()
            .get_output()
            .clone();
        self.cmd_result = Some(result);
        self
    }

    /// Get the command result for assertions
    pub fn result(&self) -> Option<&std::process::Output> {
        self.cmd_result.as_ref()
    }
}

/// Builder for Then steps (assertions)
pub struct ThenBuilder<'a> {
    ctx: &'a AcceptanceTestContext,
    when_result: Option<&'a std::process::Output>,
}

impl<'a> ThenBuilder<'a> {
    pub fn new(ctx: &'a AcceptanceTestContext, when_result: Option<&'a std::process::Output>) -> Self {
        Self {
            ctx,
            when_result,
        }
    }

    /// Then: exit code is
    pub fn exit_code_is(&self, expected: i32) -> &Self {
        if let Some(result) = self.when_result {
            let actual = result.status.code().unwrap_or(-1);
            assert_eq!(actual, expected, "Expected exit code {}, got {}", expected, actual);
        }
        self
    }

    /// Then: message contains
    pub fn message_contains(&self, text: &str) -> &Self {
        if let Some(result) = self.when_result {
            let output = String::from_utf8_lossy(&result.stdout);
            let error = String::from_utf8_lossy(&result.stderr);
            assert!(
                output.contains(text) || error.contains(text),
                "Expected message to contain '{}', but got stdout: '{}', stderr: '{}'",
                text, output, error
            );
        }
        self
    }

    /// Then: the lead service records the lead in stage
    pub fn lead_is_in_stage(&self, lead: i64, stage: i64) -> &Self {
        let actual = self.ctx.backend.state().stage_of(lead);
        assert_eq!(actual, stage, "Expected lead {} in stage {}, found {}", lead, stage, actual);
        self
    }

    /// Then: exactly these stage updates were sent, in order
    pub fn stage_updates_sent(&self, expected: &[(i64, i64)]) -> &Self {
        let actual: Vec<(i64, Value)> = self.ctx.backend.state().patches.clone();
        let expected: Vec<(i64, Value)> = expected
            .iter()
            .map(|(lead, stage)| (*lead, json!({"stage": stage})))
            .collect();
        assert_eq!(actual, expected, "Unexpected lead updates");
        self
    }

    /// Then: no lead update was sent
    pub fn no_update_sent(&self) -> &Self {
        self.stage_updates_sent(&[])
    }

    /// Then: the board was fetched this many times
    pub fn board_loaded_times(&self, expected: usize) -> &Self {
        let actual = self.ctx.backend.state().count("GET", "/api/leads/kanban/");
        assert_eq!(actual, expected, "Expected {} board loads, got {}", expected, actual);
        self
    }
}
