//! Behavioural tests for the daemon bootstrap sequence.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::bootstrap::BootstrapError;

use super::support::{self, HealthEvent, TestWorld};

#[fixture]
fn world() -> RefCell<TestWorld> {
    support::world()
}

#[given("a healthy configuration loader")]
fn given_healthy_loader(world: &RefCell<TestWorld>) {
    let _ = world;
}

#[given("a failing configuration loader")]
fn given_failing_loader(world: &RefCell<TestWorld>) {
    world.borrow_mut().use_failing_loader();
}

#[given("a database path occupied by a regular file")]
fn given_blocked_database(world: &RefCell<TestWorld>) {
    world.borrow().block_database();
}

#[when("the daemon bootstrap runs")]
fn when_bootstrap_runs(world: &RefCell<TestWorld>) {
    world.borrow_mut().bootstrap();
}

#[when("the gateway starts and stops")]
fn when_gateway_cycles(world: &RefCell<TestWorld>) {
    let mut world = world.borrow_mut();
    world.start_gateway();
    world.stop_gateway();
}

#[then("bootstrap succeeds")]
fn then_bootstrap_succeeds(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    assert!(
        world.bootstrap_error().is_none(),
        "bootstrap error: {:?}",
        world.bootstrap_error()
    );
    assert!(world.daemon_started(), "daemon should have been initialised");
}

#[then("bootstrap fails")]
fn then_bootstrap_fails(world: &RefCell<TestWorld>) {
    assert!(
        world.borrow().bootstrap_error().is_some(),
        "bootstrap succeeded unexpectedly"
    );
}

#[then("the failure concerns the driver database")]
fn then_storage_failure(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    assert!(
        matches!(world.bootstrap_error(), Some(BootstrapError::Storage { .. })),
        "unexpected bootstrap outcome: {:?}",
        world.bootstrap_error()
    );
}

#[then("the reporter recorded bootstrap start")]
fn then_reporter_start(world: &RefCell<TestWorld>) {
    assert!(
        world
            .borrow()
            .reporter
            .events()
            .contains(&HealthEvent::BootstrapStarting),
        "bootstrap start event missing"
    );
}

#[then("the reporter recorded an empty registry")]
fn then_reporter_registry(world: &RefCell<TestWorld>) {
    assert!(
        world
            .borrow()
            .reporter
            .events()
            .contains(&HealthEvent::RegistryOpened { drivers: 0 }),
        "registry open event missing"
    );
}

#[then("the reporter recorded bootstrap success")]
fn then_reporter_success(world: &RefCell<TestWorld>) {
    assert!(
        world
            .borrow()
            .reporter
            .events()
            .contains(&HealthEvent::BootstrapSucceeded),
        "bootstrap success event missing"
    );
}

#[then("the reporter recorded bootstrap failure")]
fn then_reporter_failure(world: &RefCell<TestWorld>) {
    let events = world.borrow().reporter.events();
    let failed = events
        .iter()
        .any(|event| matches!(event, HealthEvent::BootstrapFailed(_)));
    assert!(failed, "bootstrap failure event missing: {events:?}");
}

#[then("the reporter recorded the gateway listening and stopping")]
fn then_reporter_gateway(world: &RefCell<TestWorld>) {
    let events = world.borrow().reporter.events();
    let listening = events
        .iter()
        .position(|event| matches!(event, HealthEvent::GatewayListening(_)));
    let stopped = events
        .iter()
        .position(|event| matches!(event, HealthEvent::GatewayStopped(_)));
    match (listening, stopped) {
        (Some(listening), Some(stopped)) => assert!(listening < stopped, "{events:?}"),
        _ => panic!("gateway lifecycle events missing: {events:?}"),
    }
}

#[scenario(
    path = "tests/features/daemon_bootstrap.feature",
    name = "Bootstrap succeeds with a healthy configuration"
)]
fn bootstrap_succeeds(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_bootstrap.feature",
    name = "Bootstrap fails when the configuration is invalid"
)]
fn bootstrap_fails_on_configuration(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_bootstrap.feature",
    name = "Bootstrap fails when the database cannot be opened"
)]
fn bootstrap_fails_on_storage(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_bootstrap.feature",
    name = "The gateway reports its lifecycle"
)]
fn gateway_lifecycle_reported(world: RefCell<TestWorld>) {
    drop(world);
}
