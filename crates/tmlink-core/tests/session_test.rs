#![allow(clippy::unwrap_used)]
// Session lifecycle tests against an in-memory controller.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use tokio::sync::{mpsc, watch};
use tokio_test::{assert_err, assert_ok};

use tmlink_core::session::client::{
    ControllerClient, ControllerSession, FieldSetResource, ResourceEvent,
};
use tmlink_core::{
    AudienceDisplay, CoreError, Credentials, Field, FieldPolicy, FieldSetCommand,
    FieldSetSnapshot, FlatState, HostSurface, MatchDescriptor, MatchRound, MatchState, Observer,
    QueueState, SessionError, SessionManager, SessionOptions, SessionSettings, SessionStatus,
    Value, Variable,
};

const INTERVAL: Duration = Duration::from_secs(10);

// ── Fake controller ──────────────────────────────────────────────────

#[derive(Default)]
struct ControllerState {
    field_sets: Vec<String>,
    fields: Vec<Field>,
    fail_auth: bool,
    fail_subscribe: bool,
    auth_attempts: usize,
    subscribe_attempts: usize,
    unsubscribes: usize,
    events: Option<mpsc::Sender<ResourceEvent>>,
    commands: Vec<FieldSetCommand>,
}

#[derive(Clone, Default)]
struct FakeController {
    state: Arc<Mutex<ControllerState>>,
}

impl FakeController {
    fn with_field_set(name: &str, fields: Vec<Field>) -> Self {
        let fake = Self::default();
        {
            let mut state = fake.state.lock().unwrap();
            state.field_sets = vec!["Skills Field Set".into(), name.into()];
            state.fields = fields;
        }
        fake
    }

    fn update(&self, f: impl FnOnce(&mut ControllerState)) {
        f(&mut self.state.lock().unwrap());
    }

    fn read<T>(&self, f: impl FnOnce(&ControllerState) -> T) -> T {
        f(&self.state.lock().unwrap())
    }

    async fn push(&self, event: ResourceEvent) {
        let events = self.read(|s| s.events.clone()).unwrap();
        events.send(event).await.unwrap();
    }
}

struct FakeSession {
    state: Arc<Mutex<ControllerState>>,
}

struct FakeFieldSet {
    name: String,
    state: Arc<Mutex<ControllerState>>,
}

impl ControllerClient for FakeController {
    type Session = FakeSession;

    async fn authenticate(&self, _credentials: &Credentials) -> Result<FakeSession, CoreError> {
        let mut state = self.state.lock().unwrap();
        state.auth_attempts += 1;
        if state.fail_auth {
            return Err(CoreError::AuthenticationFailed {
                message: "invalid_client".into(),
            });
        }
        Ok(FakeSession {
            state: Arc::clone(&self.state),
        })
    }
}

impl ControllerSession for FakeSession {
    type Resource = FakeFieldSet;

    async fn list_resources(&self) -> Result<Vec<FakeFieldSet>, CoreError> {
        let names = self.state.lock().unwrap().field_sets.clone();
        Ok(names
            .into_iter()
            .map(|name| FakeFieldSet {
                name,
                state: Arc::clone(&self.state),
            })
            .collect())
    }
}

impl FieldSetResource for FakeFieldSet {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_fields(&self) -> Result<Vec<Field>, CoreError> {
        Ok(self.state.lock().unwrap().fields.clone())
    }

    async fn subscribe(&self, events: mpsc::Sender<ResourceEvent>) -> Result<(), CoreError> {
        let mut state = self.state.lock().unwrap();
        state.subscribe_attempts += 1;
        if state.fail_subscribe {
            return Err(CoreError::ConnectionFailed {
                url: "ws://fake/api/fieldsets/1".into(),
                reason: "connection refused".into(),
            });
        }
        state.events = Some(events);
        Ok(())
    }

    async fn unsubscribe(&self) {
        let mut state = self.state.lock().unwrap();
        state.unsubscribes += 1;
        state.events = None;
    }

    async fn send_command(&self, command: FieldSetCommand) -> Result<(), CoreError> {
        self.state.lock().unwrap().commands.push(command);
        Ok(())
    }
}

// ── Recording host ───────────────────────────────────────────────────

#[derive(Default)]
struct HostLog {
    values: BTreeMap<Variable, Value>,
    updates: Vec<BTreeMap<Variable, Value>>,
    reevaluations: Vec<Vec<Observer>>,
    statuses: Vec<(SessionStatus, Option<String>)>,
}

struct RecordingHost {
    log: Mutex<HostLog>,
    publishes: watch::Sender<usize>,
}

impl RecordingHost {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            log: Mutex::new(HostLog::default()),
            publishes: watch::channel(0).0,
        })
    }

    fn statuses(&self) -> Vec<(SessionStatus, Option<String>)> {
        self.log.lock().unwrap().statuses.clone()
    }

    fn last_status(&self) -> (SessionStatus, Option<String>) {
        self.statuses().last().cloned().unwrap()
    }

    async fn wait_for_publishes(&self, count: usize) {
        let mut rx = self.publishes.subscribe();
        rx.wait_for(|n| *n >= count).await.unwrap();
    }
}

impl HostSurface for RecordingHost {
    fn publish(&self, values: &BTreeMap<Variable, Value>) {
        {
            let mut log = self.log.lock().unwrap();
            log.values.extend(values.clone());
            log.updates.push(values.clone());
        }
        self.publishes.send_modify(|n| *n += 1);
    }

    fn request_reevaluation(&self, observers: &[Observer]) {
        self.log.lock().unwrap().reevaluations.push(observers.to_vec());
    }

    fn set_status(&self, status: SessionStatus, message: Option<&str>) {
        self.log
            .lock()
            .unwrap()
            .statuses
            .push((status, message.map(str::to_owned)));
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn settings(field_set: &str) -> SessionSettings {
    SessionSettings {
        address: Some("10.0.0.5".into()),
        client_id: Some("client-1".into()),
        client_secret: Some(SecretString::from("s3cret".to_string())),
        client_expiration: Some("2099-01-01T00:00:00+0000".into()),
        api_key: Some(SecretString::from("tm-key".to_string())),
        field_set: Some(field_set.into()),
    }
}

fn two_fields() -> Vec<Field> {
    vec![Field::new(1, "A"), Field::new(2, "B")]
}

fn options() -> SessionOptions {
    SessionOptions {
        reconnect_interval: INTERVAL,
        field_policy: FieldPolicy::Strict,
    }
}

fn manager(
    fake: &FakeController,
    host: &Arc<RecordingHost>,
) -> SessionManager<FakeController, Arc<RecordingHost>> {
    SessionManager::new(fake.clone(), Arc::clone(host), options())
}

fn qual_12(field_id: u32, state: QueueState) -> FieldSetSnapshot {
    FieldSetSnapshot {
        match_state: MatchState::Match {
            field_id,
            state,
            descriptor: MatchDescriptor::new(MatchRound::Qualification, 12, None),
        },
        audience_display: Some(AudienceDisplay::InMatch),
    }
}

// ── Establishment ────────────────────────────────────────────────────

#[tokio::test]
async fn start_reaches_ok_and_loads_fields() {
    let fake = FakeController::with_field_set("Field Set #1", two_fields());
    let host = RecordingHost::new();
    let mut session = manager(&fake, &host);

    assert_ok!(session.start(&settings("Field Set #1")).await);

    assert_eq!(session.status(), SessionStatus::Ok);
    assert_eq!(session.field_set(), Some("Field Set #1"));
    assert_eq!(session.fields(), two_fields().as_slice());
    assert_eq!(
        host.statuses(),
        vec![(SessionStatus::Connecting, None), (SessionStatus::Ok, None)]
    );
    assert_eq!(fake.read(|s| s.subscribe_attempts), 1);
}

#[tokio::test]
async fn missing_credentials_never_contact_controller() {
    let fake = FakeController::with_field_set("Field Set #1", two_fields());
    let host = RecordingHost::new();
    let mut session = manager(&fake, &host);

    let incomplete = SessionSettings {
        client_id: None,
        ..settings("Field Set #1")
    };
    let err = assert_err!(session.start(&incomplete).await);

    assert!(matches!(err, SessionError::BadConfig { .. }));
    assert_eq!(session.status(), SessionStatus::BadConfig);
    assert_eq!(
        host.statuses(),
        vec![(
            SessionStatus::BadConfig,
            Some("tm api credentials not provided".into())
        )]
    );
    assert_eq!(fake.read(|s| s.auth_attempts), 0);
}

#[tokio::test]
async fn unknown_field_set_is_connection_failure() {
    let fake = FakeController::with_field_set("Field Set #1", two_fields());
    let host = RecordingHost::new();
    let mut session = manager(&fake, &host);

    let err = assert_err!(session.start(&settings("field set #1")).await);

    assert!(matches!(err, SessionError::ResourceNotFound { .. }));
    assert_eq!(session.status(), SessionStatus::ConnectionFailure);
    assert!(!session.is_reconnect_armed());
    assert_eq!(fake.read(|s| s.subscribe_attempts), 0);
}

#[tokio::test]
async fn auth_failure_names_the_step() {
    let fake = FakeController::with_field_set("Field Set #1", two_fields());
    fake.update(|s| s.fail_auth = true);
    let host = RecordingHost::new();
    let mut session = manager(&fake, &host);

    assert_err!(session.start(&settings("Field Set #1")).await);

    let (status, message) = host.last_status();
    assert_eq!(status, SessionStatus::ConnectionFailure);
    assert!(
        message
            .unwrap()
            .starts_with("Connection to controller failed"),
    );
}

#[tokio::test]
async fn subscribe_failure_is_not_retried() {
    let fake = FakeController::with_field_set("Field Set #1", two_fields());
    fake.update(|s| s.fail_subscribe = true);
    let host = RecordingHost::new();
    let mut session = manager(&fake, &host);

    let err = assert_err!(session.start(&settings("Field Set #1")).await);

    assert_eq!(err.status(), SessionStatus::ConnectionFailure);
    assert!(err.to_string().starts_with("Connecting to field set Field Set #1 failed"));
    assert!(!session.is_reconnect_armed());
    assert!(session.field_set().is_none());
}

// ── Publishing ───────────────────────────────────────────────────────

#[tokio::test]
async fn first_snapshot_publishes_every_defined_variable() {
    let fake = FakeController::with_field_set("Field Set #1", two_fields());
    let host = RecordingHost::new();
    let mut session = manager(&fake, &host);
    session.start(&settings("Field Set #1")).await.unwrap();

    session.handle_event(ResourceEvent::StateChanged(qual_12(2, QueueState::Queued)));

    let log = host.log.lock().unwrap();
    assert_eq!(log.updates.len(), 1);
    assert_eq!(log.updates[0].len(), 6);
    assert_eq!(
        log.reevaluations,
        vec![vec![Observer::AudienceDisplay, Observer::ActiveField]]
    );
}

#[tokio::test]
async fn first_idle_snapshot_leaves_unset_variables_alone() {
    let fake = FakeController::with_field_set("Field Set #1", two_fields());
    let host = RecordingHost::new();
    let mut session = manager(&fake, &host);
    session.start(&settings("Field Set #1")).await.unwrap();

    session.handle_event(ResourceEvent::StateChanged(FieldSetSnapshot::default()));

    let log = host.log.lock().unwrap();
    assert_eq!(
        log.updates,
        vec![BTreeMap::from([
            (Variable::Match, Value::Text("NONE".into())),
            (Variable::FieldName, Value::Text("UNKNOWN".into())),
        ])]
    );
    assert!(log.reevaluations.is_empty());
}

#[tokio::test]
async fn resumed_state_after_reconnect_publishes_nothing() {
    let fake = FakeController::with_field_set("Field Set #1", two_fields());
    let host = RecordingHost::new();
    let mut session = manager(&fake, &host);
    session.start(&settings("Field Set #1")).await.unwrap();
    session.handle_event(ResourceEvent::StateChanged(qual_12(2, QueueState::Running)));

    session.handle_event(ResourceEvent::Closed);
    session.reconnect_tick().await;
    assert_eq!(session.status(), SessionStatus::Ok);
    session.handle_event(ResourceEvent::StateChanged(qual_12(2, QueueState::Running)));

    let log = host.log.lock().unwrap();
    assert_eq!(log.updates.len(), 1);
    assert_eq!(log.values.get(&Variable::Match), Some(&Value::Text("Q12".into())));
    assert_eq!(log.values.get(&Variable::MatchIsRunning), Some(&Value::Bool(true)));
}

#[tokio::test]
async fn identical_snapshot_publishes_nothing() {
    let fake = FakeController::with_field_set("Field Set #1", two_fields());
    let host = RecordingHost::new();
    let mut session = manager(&fake, &host);
    session.start(&settings("Field Set #1")).await.unwrap();

    session.handle_event(ResourceEvent::StateChanged(qual_12(2, QueueState::Queued)));
    session.handle_event(ResourceEvent::StateChanged(qual_12(2, QueueState::Queued)));

    let log = host.log.lock().unwrap();
    assert_eq!(log.updates.len(), 1);
    assert_eq!(log.reevaluations.len(), 1);
}

#[tokio::test]
async fn transport_error_keeps_session_ok() {
    let fake = FakeController::with_field_set("Field Set #1", two_fields());
    let host = RecordingHost::new();
    let mut session = manager(&fake, &host);
    session.start(&settings("Field Set #1")).await.unwrap();

    session.handle_event(ResourceEvent::TransportError("frame too large".into()));

    assert_eq!(session.status(), SessionStatus::Ok);
    assert!(!session.is_reconnect_armed());
}

#[tokio::test]
async fn retain_policy_keeps_field_between_matches() {
    let fake = FakeController::with_field_set("Field Set #1", two_fields());
    let host = RecordingHost::new();
    let mut session = SessionManager::new(
        fake.clone(),
        Arc::clone(&host),
        SessionOptions {
            field_policy: FieldPolicy::RetainLastActive,
            ..options()
        },
    );
    session.start(&settings("Field Set #1")).await.unwrap();

    session.handle_event(ResourceEvent::StateChanged(qual_12(2, QueueState::Ended)));
    session.handle_event(ResourceEvent::StateChanged(FieldSetSnapshot {
        match_state: MatchState::None,
        audience_display: Some(AudienceDisplay::InMatch),
    }));

    let published = session.published().unwrap();
    assert_eq!(published.match_label, "NONE");
    assert_eq!(published.field_id, Some(2));
    assert_eq!(published.field_name.as_deref(), Some("B"));
    // The field did not change, so only the first publish re-evaluated.
    assert_eq!(host.log.lock().unwrap().reevaluations.len(), 1);
}

// ── Reconnect timer ──────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn double_close_arms_a_single_timer() {
    let fake = FakeController::with_field_set("Field Set #1", two_fields());
    let host = RecordingHost::new();
    let (handle, _task) = manager(&fake, &host).spawn();
    handle.start(settings("Field Set #1")).await.unwrap();

    fake.update(|s| s.fail_subscribe = true);
    fake.push(ResourceEvent::Closed).await;
    fake.push(ResourceEvent::Closed).await;

    // Three periods: one timer means exactly three reconnect attempts.
    tokio::time::sleep(INTERVAL * 3 + INTERVAL / 2).await;

    assert_eq!(fake.read(|s| s.subscribe_attempts), 1 + 3);
    assert_eq!(handle.status(), SessionStatus::Disconnected);
    assert_eq!(
        host.last_status(),
        (
            SessionStatus::Disconnected,
            Some("Field set Field Set #1 closed".into())
        )
    );
}

#[tokio::test(start_paused = true)]
async fn successful_reconnect_restores_ok_and_disarms() {
    let fake = FakeController::with_field_set("Field Set #1", two_fields());
    let host = RecordingHost::new();
    let (handle, _task) = manager(&fake, &host).spawn();
    handle.start(settings("Field Set #1")).await.unwrap();

    fake.update(|s| s.fail_subscribe = true);
    fake.push(ResourceEvent::Closed).await;
    tokio::time::sleep(INTERVAL * 2 + INTERVAL / 2).await;
    assert_eq!(fake.read(|s| s.subscribe_attempts), 1 + 2);

    fake.update(|s| s.fail_subscribe = false);
    tokio::time::sleep(INTERVAL).await;
    assert_eq!(handle.status(), SessionStatus::Ok);
    assert_eq!(fake.read(|s| s.subscribe_attempts), 1 + 3);

    // Disarmed: no further attempts.
    tokio::time::sleep(INTERVAL * 5).await;
    assert_eq!(fake.read(|s| s.subscribe_attempts), 1 + 3);
}

#[tokio::test(start_paused = true)]
async fn reconfigure_disarms_timer_before_new_attempt() {
    let fake = FakeController::with_field_set("Field Set #1", two_fields());
    let host = RecordingHost::new();
    let mut session = manager(&fake, &host);
    session.start(&settings("Field Set #1")).await.unwrap();

    session.handle_event(ResourceEvent::Closed);
    assert!(session.is_reconnect_armed());

    fake.update(|s| s.fail_auth = true);
    assert_err!(session.reconfigure(&settings("Field Set #1")).await);

    assert!(!session.is_reconnect_armed());
    assert_eq!(fake.read(|s| s.unsubscribes), 1);

    let statuses: Vec<SessionStatus> = host.statuses().into_iter().map(|(s, _)| s).collect();
    assert_eq!(
        statuses,
        vec![
            SessionStatus::Connecting,
            SessionStatus::Ok,
            SessionStatus::Disconnected,
            SessionStatus::Disconnected,
            SessionStatus::Connecting,
            SessionStatus::ConnectionFailure,
        ]
    );
    assert_eq!(
        host.statuses()[3],
        (SessionStatus::Disconnected, Some("config updated".into()))
    );
}

#[tokio::test(start_paused = true)]
async fn reconfigure_through_handle_stops_reconnect_attempts() {
    let fake = FakeController::with_field_set("Field Set #1", two_fields());
    let host = RecordingHost::new();
    let (handle, _task) = manager(&fake, &host).spawn();
    handle.start(settings("Field Set #1")).await.unwrap();

    fake.update(|s| s.fail_subscribe = true);
    fake.push(ResourceEvent::Closed).await;
    tokio::time::sleep(INTERVAL / 2).await;

    fake.update(|s| s.fail_auth = true);
    assert_err!(handle.reconfigure(settings("Field Set #1")).await);
    let attempts = fake.read(|s| s.subscribe_attempts);

    tokio::time::sleep(INTERVAL * 4).await;
    assert_eq!(fake.read(|s| s.subscribe_attempts), attempts);
    assert_eq!(handle.status(), SessionStatus::ConnectionFailure);
}

// ── Stop and commands ────────────────────────────────────────────────

#[tokio::test]
async fn stop_releases_binding() {
    let fake = FakeController::with_field_set("Field Set #1", two_fields());
    let host = RecordingHost::new();
    let mut session = manager(&fake, &host);
    session.start(&settings("Field Set #1")).await.unwrap();
    session.handle_event(ResourceEvent::Closed);

    session.stop().await;

    assert!(!session.is_reconnect_armed());
    assert!(session.field_set().is_none());
    assert_eq!(fake.read(|s| s.unsubscribes), 1);
    assert!(matches!(
        session
            .send_command(FieldSetCommand::QueueNextMatch)
            .await,
        Err(SessionError::NotConnected)
    ));
}

#[tokio::test]
async fn commands_target_the_active_field() {
    let fake = FakeController::with_field_set("Field Set #1", two_fields());
    let host = RecordingHost::new();
    let (handle, _task) = manager(&fake, &host).spawn();

    assert!(matches!(
        handle.send_command(FieldSetCommand::QueueNextMatch).await,
        Err(SessionError::NotConnected)
    ));

    handle.start(settings("Field Set #1")).await.unwrap();
    assert!(matches!(
        handle
            .send_command(FieldSetCommand::StartMatch { field_id: None })
            .await,
        Err(SessionError::NoActiveField)
    ));

    fake.push(ResourceEvent::StateChanged(qual_12(2, QueueState::Queued)))
        .await;
    host.wait_for_publishes(1).await;

    handle
        .send_command(FieldSetCommand::StartMatch { field_id: None })
        .await
        .unwrap();
    handle
        .send_command(FieldSetCommand::SetAudienceDisplay {
            display: AudienceDisplay::Rankings,
        })
        .await
        .unwrap();

    assert_eq!(
        fake.read(|s| s.commands.clone()),
        vec![
            FieldSetCommand::StartMatch { field_id: Some(2) },
            FieldSetCommand::SetAudienceDisplay {
                display: AudienceDisplay::Rankings,
            },
        ]
    );

    handle.stop().await;
    assert!(matches!(
        handle.send_command(FieldSetCommand::QueueNextMatch).await,
        Err(SessionError::Closed)
    ));
}

// ── End to end ───────────────────────────────────────────────────────

#[tokio::test]
async fn qualification_on_second_field_publishes_running_state() {
    let fake = FakeController::with_field_set("Field Set #1", two_fields());
    let host = RecordingHost::new();
    let (handle, _task) = manager(&fake, &host).spawn();

    handle.start(settings("Field Set #1")).await.unwrap();
    assert_eq!(handle.status(), SessionStatus::Ok);

    // Q12 is queued on B with the in-match screen up, then starts.
    fake.push(ResourceEvent::StateChanged(qual_12(2, QueueState::Queued)))
        .await;
    fake.push(ResourceEvent::StateChanged(qual_12(2, QueueState::Running)))
        .await;
    host.wait_for_publishes(2).await;

    let log = host.log.lock().unwrap();
    assert_eq!(
        log.updates[1],
        BTreeMap::from([(Variable::MatchIsRunning, Value::Bool(true))])
    );
    assert_eq!(log.reevaluations.len(), 1, "no re-evaluation for the start");
    assert_eq!(
        log.values,
        BTreeMap::from([
            (Variable::Match, Value::Text("Q12".into())),
            (Variable::FieldId, Value::Number(2)),
            (Variable::FieldSeq, Value::Number(2)),
            (Variable::FieldName, Value::Text("B".into())),
            (Variable::MatchIsRunning, Value::Bool(true)),
            (Variable::AudienceDisplay, Value::Text("in_match".into())),
        ])
    );
    drop(log);

    handle.stop().await;
    assert_eq!(fake.read(|s| s.unsubscribes), 1);
}

#[tokio::test]
async fn published_state_matches_flat_record() {
    let fake = FakeController::with_field_set("Field Set #1", two_fields());
    let host = RecordingHost::new();
    let mut session = manager(&fake, &host);
    session.start(&settings("Field Set #1")).await.unwrap();

    session.handle_event(ResourceEvent::StateChanged(qual_12(2, QueueState::Running)));

    assert_eq!(
        session.published(),
        Some(&FlatState {
            match_label: "Q12".into(),
            field_id: Some(2),
            field_seq: Some(2),
            field_name: Some("B".into()),
            match_is_running: Some(true),
            audience_display: Some(AudienceDisplay::InMatch),
        })
    );
}
