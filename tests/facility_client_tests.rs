//! Integration tests for the agent-side facility client
//!
//! These run a real server on an ephemeral port and drive it through
//! `FacilityConnection`, checking that pushes land on the right agent handle
//! and nowhere else.

use factory_floor_sim::agents::AgentHandle;
use factory_floor_sim::facility::{
    Facility, FacilityConnection, FacilityKind, FacilityServer, PushHandler,
};
use factory_floor_sim::types::{AgentKind, AgentLocation, AgentState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

async fn start_server(kind: FacilityKind) -> (SocketAddr, CancellationToken) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let facility = Arc::new(Facility::new(
        kind,
        2,
        Duration::from_millis(10),
        Duration::from_millis(2),
    ));
    tokio::spawn(FacilityServer::new(facility, shutdown.clone()).serve(listener));
    (addr, shutdown)
}

fn client_for(
    kind: FacilityKind,
    addr: SocketAddr,
    index: usize,
) -> (Arc<AgentHandle>, FacilityConnection) {
    let handle = Arc::new(AgentHandle::new(AgentKind::Worker, index));
    let pushes: PushHandler = {
        let handle = Arc::clone(&handle);
        Arc::new(move |push| handle.apply_push(push))
    };
    let connection = FacilityConnection::new(kind, addr, handle.id().clone(), pushes);
    (handle, connection)
}

async fn wait_finished(connection: &FacilityConnection) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while !connection.break_finished() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("break never completed");
}

/// A full round trip walks the agent's handle through the visit and back to
/// idle at its origin zone.
#[tokio::test]
async fn test_visit_drives_handle_back_to_origin() {
    let (addr, shutdown) = start_server(FacilityKind::Bathroom).await;
    let (handle, mut connection) = client_for(FacilityKind::Bathroom, addr, 0);

    assert!(!connection.is_connected());
    connection.request_break().await.unwrap();
    assert!(connection.is_connected());
    wait_finished(&connection).await;

    assert_eq!(handle.state(), AgentState::Idle);
    assert_eq!(handle.location(), AgentLocation::Factory);

    connection.close().await;
    shutdown.cancel();
}

/// Pushes for one agent never leak into another agent's handle, even on the
/// same server.
#[tokio::test]
async fn test_foreign_pushes_are_filtered() {
    let (addr, shutdown) = start_server(FacilityKind::Breakroom).await;
    let (active, mut active_conn) = client_for(FacilityKind::Breakroom, addr, 0);
    let (bystander, mut bystander_conn) = client_for(FacilityKind::Breakroom, addr, 1);

    // Connect the bystander but leave it idle while the other agent visits.
    bystander_conn.request_break().await.unwrap();
    wait_finished(&bystander_conn).await;
    let settled = bystander.snapshot();

    active_conn.request_break().await.unwrap();
    wait_finished(&active_conn).await;

    assert_eq!(active.state(), AgentState::Idle);
    assert_eq!(bystander.state(), settled.state);
    assert_eq!(bystander.location(), settled.location);

    active_conn.close().await;
    bystander_conn.close().await;
    shutdown.cancel();
}

/// The connection is reusable: a second request on the same socket completes
/// too, and the finished flag resets in between.
#[tokio::test]
async fn test_connection_is_reusable() {
    let (addr, shutdown) = start_server(FacilityKind::Bathroom).await;
    let (_handle, mut connection) = client_for(FacilityKind::Bathroom, addr, 3);

    connection.request_break().await.unwrap();
    wait_finished(&connection).await;

    connection.request_break().await.unwrap();
    assert!(connection.is_connected());
    wait_finished(&connection).await;

    connection.close().await;
    shutdown.cancel();
}

/// Closing twice, or closing without ever connecting, is harmless.
#[tokio::test]
async fn test_close_is_idempotent() {
    let (addr, shutdown) = start_server(FacilityKind::Bathroom).await;

    let (_handle, mut never_used) = client_for(FacilityKind::Bathroom, addr, 0);
    never_used.close().await;

    let (_handle, mut used) = client_for(FacilityKind::Bathroom, addr, 1);
    used.request_break().await.unwrap();
    wait_finished(&used).await;
    used.close().await;
    used.close().await;
    assert!(!used.is_connected());

    shutdown.cancel();
}
