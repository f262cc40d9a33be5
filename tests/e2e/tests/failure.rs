//! Failure-path scenarios: timeouts, rejected copies, sibling isolation.

use copyfan_core::error::LoadError;
use copyfan_core::orchestrator::run_load;
use copyfan_core::worker::{run_worker, LoadShape, WorkerDescriptor};
use copyfan_e2e::harness;

fn small_shape() -> LoadShape {
    LoadShape {
        rows_per_buffer: 100,
        repetitions: 50,
        statement_timeout_secs: 300,
    }
}

#[tokio::test]
async fn copy_into_missing_table_fails_with_copy_error() {
    let server = harness::bootstrap().await.expect("bootstrap failed");
    let env = server.create_branch("missing_table").await.unwrap();
    let instance = env.instance();

    let err = run_load(instance.options(), "no_such_table", 2, &small_shape())
        .await
        .expect_err("copy into a missing table must fail");
    assert!(matches!(err, LoadError::Copy(_)), "got: {err}");

    harness::teardown(env).await.unwrap();
}

#[tokio::test]
async fn rejected_session_setting_classifies_as_copy_failure() {
    let server = harness::bootstrap().await.expect("bootstrap failed");
    let env = server.create_branch("session_setting").await.unwrap();
    let instance = env.instance();

    // Same statement shape the worker issues after acquiring its
    // connection; a server-side rejection here is a copy-phase failure,
    // not a connection or timeout one.
    let client = harness::connect(&instance).await.unwrap();
    let err = client
        .batch_execute("SET statement_timeout = 'not_a_duration'")
        .await
        .expect_err("bogus timeout value must be rejected");

    let classified = copyfan_core::error::classify_copy_error(err);
    assert!(matches!(classified, LoadError::Copy(_)), "got: {classified}");
    assert!(!classified.is_timeout());

    harness::teardown(env).await.unwrap();
}

#[tokio::test]
async fn undersized_timeout_fails_worker_with_timeout() {
    let server = harness::bootstrap().await.expect("bootstrap failed");
    let env = server.create_branch("undersized_timeout").await.unwrap();
    let instance = env.instance();
    harness::create_copytest_table(&instance, "blocked")
        .await
        .unwrap();

    // Hold an exclusive lock so the COPY stalls past its 1s timeout.
    let locker = harness::connect(&instance).await.unwrap();
    locker
        .batch_execute("BEGIN; LOCK TABLE blocked IN ACCESS EXCLUSIVE MODE")
        .await
        .unwrap();

    let shape = LoadShape {
        rows_per_buffer: 10,
        repetitions: 1,
        statement_timeout_secs: 1,
    };
    let descriptor = WorkerDescriptor {
        worker_id: 0,
        target_table: "blocked".to_string(),
    };
    let err = run_worker(instance.options(), &descriptor, &shape)
        .await
        .expect_err("worker must hit the statement timeout");
    assert!(err.is_timeout(), "got: {err}");

    // Aborts the open transaction and releases the lock.
    drop(locker);

    harness::teardown(env).await.unwrap();
}

#[tokio::test]
async fn failed_worker_leaves_sibling_unaffected() {
    let server = harness::bootstrap().await.expect("bootstrap failed");
    let env = server.create_branch("sibling_isolation").await.unwrap();
    let instance = env.instance();
    harness::create_copytest_table(&instance, "blocked")
        .await
        .unwrap();
    harness::create_copytest_table(&instance, "copytest")
        .await
        .unwrap();

    let locker = harness::connect(&instance).await.unwrap();
    locker
        .batch_execute("BEGIN; LOCK TABLE blocked IN ACCESS EXCLUSIVE MODE")
        .await
        .unwrap();

    let doomed = WorkerDescriptor {
        worker_id: 0,
        target_table: "blocked".to_string(),
    };
    let doomed_shape = LoadShape {
        rows_per_buffer: 10,
        repetitions: 1,
        statement_timeout_secs: 1,
    };
    let healthy = WorkerDescriptor {
        worker_id: 1,
        target_table: "copytest".to_string(),
    };
    let healthy_shape = small_shape();

    let (doomed_result, healthy_result) = tokio::join!(
        run_worker(instance.options(), &doomed, &doomed_shape),
        run_worker(instance.options(), &healthy, &healthy_shape),
    );

    let err = doomed_result.expect_err("blocked worker must fail");
    assert!(err.is_timeout(), "got: {err}");

    let report = healthy_result.expect("healthy worker must finish");
    assert_eq!(report.rows_written, healthy_shape.rows_per_worker());
    assert_eq!(
        harness::table_row_count(&instance, "copytest").await.unwrap(),
        healthy_shape.rows_per_worker() as i64
    );

    drop(locker);

    harness::teardown(env).await.unwrap();
}

#[tokio::test]
async fn orchestrator_reports_failure_and_commits_nothing() {
    let server = harness::bootstrap().await.expect("bootstrap failed");
    let env = server.create_branch("orchestrator_failure").await.unwrap();
    let instance = env.instance();
    harness::create_copytest_table(&instance, "blocked")
        .await
        .unwrap();

    let locker = harness::connect(&instance).await.unwrap();
    locker
        .batch_execute("BEGIN; LOCK TABLE blocked IN ACCESS EXCLUSIVE MODE")
        .await
        .unwrap();

    let shape = LoadShape {
        rows_per_buffer: 10,
        repetitions: 1,
        statement_timeout_secs: 1,
    };
    let err = run_load(instance.options(), "blocked", 2, &shape)
        .await
        .expect_err("overall result must fail when workers fail");
    assert!(err.is_timeout(), "got: {err}");

    drop(locker);

    // A timed-out COPY aborts its transaction; nothing reaches the table.
    assert_eq!(
        harness::table_row_count(&instance, "blocked").await.unwrap(),
        0
    );

    harness::teardown(env).await.unwrap();
}
