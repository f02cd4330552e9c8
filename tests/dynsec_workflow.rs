//! End-to-end dynsec workflows against an in-memory stand-in for
//! `mosquitto_ctrl` running on the remote host.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dynsec_mcp::dynsec::{
    AclType, CommandOutput, CommandTransport, Dynsec, Permission, CONNECTION_ERROR_MARKER,
};
use dynsec_mcp::{DynsecError, Result};

const ADMIN_USER: &str = "admin";
const ADMIN_PASSWORD: &str = "admin";

#[derive(Default)]
struct BrokerState {
    roles: HashMap<String, Vec<String>>,
    clients: HashMap<String, (String, HashSet<String>)>,
    commands: Vec<String>,
}

/// Emulates the subset of `mosquitto_ctrl dynsec` used here
#[derive(Default)]
struct FakeCtrl {
    state: Mutex<BrokerState>,
    fail_transport: bool,
}

fn ok() -> CommandOutput {
    CommandOutput {
        exit_code: Some(0),
        ..CommandOutput::new()
    }
}

fn failure(stderr: &str) -> CommandOutput {
    CommandOutput {
        stdout: String::new(),
        stderr: format!("{}\n", stderr),
        exit_code: Some(1),
    }
}

#[async_trait]
impl CommandTransport for FakeCtrl {
    async fn run(&self, command: &str, stdin: &[u8]) -> Result<CommandOutput> {
        if self.fail_transport {
            return Err(DynsecError::connection("Failed to open channel: broken pipe"));
        }

        let stdin = String::from_utf8_lossy(stdin).into_owned();
        let input: Vec<&str> = stdin.lines().collect();
        let args: Vec<&str> = command.split_whitespace().collect();

        let mut state = self.state.lock().unwrap();
        state.commands.push(command.to_string());

        if input.last() != Some(&ADMIN_PASSWORD) {
            return Ok(failure(&format!("{}Not authorized", CONNECTION_ERROR_MARKER)));
        }

        let output = match args.as_slice() {
            ["mosquitto_ctrl", "dynsec", "init", _file, user] if *user == ADMIN_USER => {
                if input.len() == 3 && input[0] == input[1] {
                    ok()
                } else {
                    failure("Error: Passwords do not match")
                }
            }
            ["mosquitto_ctrl", "-u", user, "dynsec", rest @ ..] if *user == ADMIN_USER => {
                match rest {
                    ["createRole", role] => {
                        if state.roles.contains_key(*role) {
                            failure("Error: Role already exists")
                        } else {
                            state.roles.insert(role.to_string(), Vec::new());
                            ok()
                        }
                    }
                    ["deleteRole", role] => {
                        state.roles.remove(*role);
                        ok()
                    }
                    ["addRoleACL", role, acl, topic, perm, priority] => {
                        match state.roles.get_mut(*role) {
                            Some(acls) => {
                                acls.push(format!("{} {} {} {}", acl, topic, perm, priority));
                                ok()
                            }
                            None => failure("Error: Role not found"),
                        }
                    }
                    ["createClient", client] => {
                        if input.len() != 3 || input[0] != input[1] {
                            failure("Error: Passwords do not match")
                        } else if state.clients.contains_key(*client) {
                            failure("Error: Client already exists")
                        } else {
                            state
                                .clients
                                .insert(client.to_string(), (input[0].to_string(), HashSet::new()));
                            ok()
                        }
                    }
                    ["deleteClient", client] => {
                        state.clients.remove(*client);
                        ok()
                    }
                    ["addClientRole", client, role] => {
                        if !state.roles.contains_key(*role) {
                            failure("Error: Role not found")
                        } else {
                            match state.clients.get_mut(*client) {
                                Some((_, roles)) => {
                                    roles.insert(role.to_string());
                                    ok()
                                }
                                None => failure("Error: Client not found"),
                            }
                        }
                    }
                    _ => failure("Error: Unknown command"),
                }
            }
            _ => failure(&format!("{}Not authorized", CONNECTION_ERROR_MARKER)),
        };

        Ok(output)
    }
}

fn dynsec(ctrl: &Arc<FakeCtrl>) -> Dynsec<FakeCtrl> {
    Dynsec::new(Arc::clone(ctrl), ADMIN_USER, ADMIN_PASSWORD)
}

#[tokio::test]
async fn time_publisher_workflow() {
    let ctrl = Arc::new(FakeCtrl::default());
    let ds = dynsec(&ctrl);

    // Cleanup of a fresh broker succeeds
    ds.delete_client("time_publisher").await.unwrap();
    ds.delete_role("time").await.unwrap();

    ds.create_role("time").await.unwrap();
    ds.add_role_acl(
        "time",
        AclType::PublishClientSend,
        "time_current",
        Permission::Allow,
        1,
    )
    .await
    .unwrap();
    ds.add_role_acl(
        "time",
        AclType::SubscribeLiteral,
        "time_current",
        Permission::Allow,
        1,
    )
    .await
    .unwrap();
    ds.create_client("time_publisher", "123").await.unwrap();
    ds.add_client_role("time_publisher", "time").await.unwrap();

    let state = ctrl.state.lock().unwrap();
    assert_eq!(
        state.roles["time"],
        vec![
            "publishClientSend time_current allow 1",
            "subscribeLiteral time_current allow 1"
        ]
    );
    let (password, roles) = &state.clients["time_publisher"];
    assert_eq!(password, "123");
    assert!(roles.contains("time"));
    assert_eq!(state.commands.len(), 7);
}

#[tokio::test]
async fn assigning_role_before_creation_fails() {
    let ctrl = Arc::new(FakeCtrl::default());
    let ds = dynsec(&ctrl);

    ds.create_client("time_publisher", "123").await.unwrap();
    let err = ds
        .add_client_role("time_publisher", "time")
        .await
        .unwrap_err();

    match err {
        DynsecError::CommandFailed { exit_code, stderr } => {
            assert_eq!(exit_code, 1);
            assert!(stderr.contains("Role not found"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn wrong_admin_password_is_a_broker_rejection() {
    let ctrl = Arc::new(FakeCtrl::default());
    let ds = Dynsec::new(Arc::clone(&ctrl), ADMIN_USER, "wrong");

    let err = ds.create_role("time").await.unwrap_err();
    assert!(err.is_broker_rejection());
    assert_eq!(err.to_string(), "Connection error: Not authorized");
    assert!(ctrl.state.lock().unwrap().roles.is_empty());
}

#[tokio::test]
async fn unknown_admin_user_is_a_broker_rejection() {
    let ctrl = Arc::new(FakeCtrl::default());
    let ds = Dynsec::new(Arc::clone(&ctrl), "intruder", ADMIN_PASSWORD);

    match ds.delete_client("time_publisher").await {
        Err(DynsecError::Broker(e)) => assert_eq!(e.reason, "Not authorized"),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn init_sends_confirmed_admin_password() {
    let ctrl = Arc::new(FakeCtrl::default());
    dynsec(&ctrl).init_default().await.unwrap();

    let state = ctrl.state.lock().unwrap();
    assert_eq!(
        state.commands,
        vec!["mosquitto_ctrl dynsec init /mosquitto/config/dynamic-security.json admin"]
    );
}

#[tokio::test]
async fn transport_failure_short_circuits() {
    let ctrl = Arc::new(FakeCtrl {
        fail_transport: true,
        ..FakeCtrl::default()
    });
    let logged = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&logged);
    let ds = dynsec(&ctrl).with_logger(Arc::new(
        move |command: &str, _stdin: &str, output: &CommandOutput| {
            sink.lock()
                .unwrap()
                .push((command.to_string(), output.clone()));
        },
    ));

    let err = ds.create_role("time").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "SSH connection error: Failed to open channel: broken pipe"
    );

    let logged = logged.lock().unwrap();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].1, CommandOutput::new());
}
