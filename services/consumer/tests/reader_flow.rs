//! Poll loop behaviour against a scripted queue

mod common;

use common::{BrokenFactory, EventResponse, ScriptedClient, SharedClientFactory};
use consumer_config::ConsumerEnvironment;
use consumer_service::{
    ConsumerError, ErrorDetails, LocalConsumerQueue, PollOutcome, QueueListenerInfo, QueueReader,
    Response, TransportError,
};
use std::sync::Arc;
use std::time::Duration;
use types::header::{HDR_MESSAGE_ID, HDR_MESSAGE_TYPE};
use types::{
    AccessRight, AccessType, Context, EventAction, ServiceInfo, ServiceRights, ServiceType,
    Session, UpdateType, Zone,
};

struct Fixture {
    session: Arc<Session>,
    listener: Arc<QueueListenerInfo>,
    district_queue: LocalConsumerQueue,
    school_queue: LocalConsumerQueue,
}

fn fixture(capacity: usize) -> Fixture {
    let subscribe = ServiceRights::new().with_right(AccessRight::Subscribe, AccessType::Approved);
    let session = Arc::new(
        Session::new(
            "StudentConsumer",
            Zone::new("district", true),
            vec![
                ServiceInfo::new(
                    "StudentPersonals",
                    ServiceType::Object,
                    Zone::new("district", true),
                    Context::new("DEFAULT", true),
                    subscribe.clone(),
                ),
                ServiceInfo::new(
                    "StudentPersonals",
                    ServiceType::Object,
                    Zone::new("schoolA", false),
                    Context::new("DEFAULT", true),
                    subscribe,
                ),
            ],
        )
        .unwrap(),
    );

    let district_queue = LocalConsumerQueue::new("district students", capacity);
    let school_queue = LocalConsumerQueue::new("schoolA students", capacity);
    let listener = Arc::new(
        QueueListenerInfo::new(
            "students",
            "http://localhost:9080/sif3/queues/students/messages",
            Duration::from_secs(10),
        )
        .with_local_queue(
            session.default_zone(),
            &Context::default_context(),
            "StudentPersonals",
            ServiceType::Object,
            district_queue.clone(),
        )
        .with_local_queue(
            &Zone::new("schoolA", false),
            &Context::default_context(),
            "StudentPersonals",
            ServiceType::Object,
            school_queue.clone(),
        ),
    );

    Fixture {
        session,
        listener,
        district_queue,
        school_queue,
    }
}

fn environment() -> ConsumerEnvironment {
    ConsumerEnvironment {
        adapter_name: "StudentConsumer".to_string(),
        default_zone: "district".to_string(),
        poll_frequency_secs: 5,
        ..ConsumerEnvironment::default()
    }
}

fn reader(fixture: &Fixture, client: &Arc<ScriptedClient>, reader_id: &str) -> QueueReader {
    let factory = SharedClientFactory::new(client.clone());
    QueueReader::new(
        fixture.listener.clone(),
        &environment(),
        fixture.session.clone(),
        reader_id,
        factory.as_ref(),
    )
    .unwrap()
}

#[test_log::test(tokio::test)]
async fn unqualified_event_resolves_to_canonical_defaults() {
    let fixture = fixture(4);
    let client = ScriptedClient::new([
        EventResponse::new("M1", "CREATE", "StudentPersonals").build(),
        EventResponse::new("M2", "DELETE", "StudentPersonals")
            .zone("district")
            .context("DEFAULT")
            .build(),
    ]);
    let reader = reader(&fixture, &client, "students 1");

    assert_eq!(reader.poll_once().await, PollOutcome::Delivered);
    assert_eq!(reader.poll_once().await, PollOutcome::Delivered);

    for _ in 0..2 {
        let event = fixture.district_queue.try_pop().unwrap();
        assert!(Arc::ptr_eq(&event.zone, fixture.session.default_zone()));
        assert!(Arc::ptr_eq(&event.context, &Context::default_context()));
    }
    assert!(fixture.school_queue.is_empty());
}

#[tokio::test]
async fn qualified_event_routes_to_its_zone_queue() {
    let fixture = fixture(4);
    let client = ScriptedClient::new([EventResponse::new("M1", "UPDATE", "StudentPersonals")
        .zone("schoolA")
        .update_type("PARTIAL")
        .build()]);
    let reader = reader(&fixture, &client, "students 1");

    assert_eq!(reader.poll_once().await, PollOutcome::Delivered);
    assert!(fixture.district_queue.is_empty());

    let event = fixture.school_queue.try_pop().unwrap();
    assert_eq!(event.zone.id(), "schoolA");
    assert!(!event.zone.is_default());
    assert_eq!(event.event_action, EventAction::Update);
    assert_eq!(event.update_type, Some(UpdateType::Partial));
    assert_eq!(event.message_id.as_deref(), Some("M1"));
    assert_eq!(event.reader_id, "students 1");
    assert_eq!(event.media_type.as_deref(), Some("application/xml"));
    assert_eq!(event.payload.as_deref(), Some("<StudentPersonals/>"));
    assert_eq!(event.metadata.generator_id.as_deref(), Some("sis-primary"));
}

#[tokio::test]
async fn bogus_message_type_is_dropped_and_polling_continues() {
    let fixture = fixture(4);
    let client = ScriptedClient::new([
        Ok(Response::new(200)
            .with_header(HDR_MESSAGE_ID, "B1")
            .with_header(HDR_MESSAGE_TYPE, "BOGUS")),
        EventResponse::new("M2", "CREATE", "StudentPersonals").build(),
    ]);
    let reader = reader(&fixture, &client, "students 1");

    assert_eq!(reader.poll_once().await, PollOutcome::DecodeFailed);
    assert!(!PollOutcome::DecodeFailed.waits());
    assert!(fixture.district_queue.is_empty());
    assert_eq!(reader.last_message_id().as_deref(), Some("B1"));

    assert_eq!(reader.poll_once().await, PollOutcome::Delivered);
    assert_eq!(
        client.acknowledged(),
        vec![None, Some("B1".to_string())]
    );
    assert_eq!(reader.stats().decode_failures, 1);
}

#[tokio::test]
async fn missing_or_invalid_event_action_skips_the_message() {
    let fixture = fixture(4);
    let client = ScriptedClient::new([
        Ok(Response::new(200)
            .with_header(HDR_MESSAGE_ID, "A1")
            .with_header(HDR_MESSAGE_TYPE, "EVENT")),
        EventResponse::new("A2", "UPSERT", "StudentPersonals").build(),
    ]);
    let reader = reader(&fixture, &client, "students 1");

    assert_eq!(reader.poll_once().await, PollOutcome::DecodeFailed);
    assert_eq!(reader.poll_once().await, PollOutcome::DecodeFailed);
    assert!(fixture.district_queue.is_empty());
}

#[tokio::test]
async fn event_without_consumer_is_discarded() {
    let fixture = fixture(4);
    let client = ScriptedClient::new([
        EventResponse::new("N1", "CREATE", "SchoolInfos").build(),
        EventResponse::new("N2", "CREATE", "StudentPersonals")
            .zone("schoolB")
            .build(),
        EventResponse::new("N3", "CREATE", "StudentPersonals")
            .service_type("FUNCTION")
            .build(),
    ]);
    let reader = reader(&fixture, &client, "students 1");

    for _ in 0..3 {
        assert_eq!(reader.poll_once().await, PollOutcome::Discarded);
    }
    assert!(fixture.district_queue.is_empty());
    assert!(fixture.school_queue.is_empty());
    assert_eq!(reader.stats().events_discarded, 3);
    assert_eq!(reader.last_message_id().as_deref(), Some("N3"));
}

#[tokio::test]
async fn redelivered_message_is_processed_again() {
    let fixture = fixture(4);

    let first_run =
        ScriptedClient::new([EventResponse::new("M1", "CREATE", "StudentPersonals").build()]);
    let crashed = reader(&fixture, &first_run, "students 1");
    assert_eq!(crashed.poll_once().await, PollOutcome::Delivered);
    drop(crashed);

    // restart: nothing was acknowledged, so the queue hands out M1 again
    let second_run =
        ScriptedClient::new([EventResponse::new("M1", "CREATE", "StudentPersonals").build()]);
    let restarted = reader(&fixture, &second_run, "students 1");
    assert_eq!(restarted.poll_once().await, PollOutcome::Delivered);
    assert_eq!(second_run.acknowledged(), vec![None]);

    let first = fixture.district_queue.try_pop().unwrap();
    let duplicate = fixture.district_queue.try_pop().unwrap();
    assert_eq!(first.message_id, duplicate.message_id);
}

#[tokio::test]
async fn error_and_transport_failures_wait_and_retry() {
    let fixture = fixture(4);
    let client = ScriptedClient::new([
        Ok(Response::new(401).with_error(ErrorDetails::new(401, "not authorised"))),
        Err(TransportError::Timeout {
            uri: "http://localhost:9080".to_string(),
        }),
        EventResponse::new("M1", "CREATE", "StudentPersonals").build(),
    ]);
    let reader = reader(&fixture, &client, "students 1");

    let outcomes = [
        reader.poll_once().await,
        reader.poll_once().await,
        reader.poll_once().await,
    ];
    assert_eq!(
        outcomes,
        [
            PollOutcome::ErrorResponse,
            PollOutcome::TransportFailure,
            PollOutcome::Delivered
        ]
    );
    assert!(outcomes[0].waits() && outcomes[1].waits() && !outcomes[2].waits());
}

#[tokio::test(start_paused = true)]
async fn full_local_queue_throttles_the_reader() {
    let fixture = fixture(1);
    let client = ScriptedClient::new([
        EventResponse::new("M1", "CREATE", "StudentPersonals").build(),
        EventResponse::new("M2", "CREATE", "StudentPersonals").build(),
        EventResponse::new("M3", "CREATE", "StudentPersonals").build(),
    ]);
    let reader = Arc::new(reader(&fixture, &client, "students 1"));
    let task = tokio::spawn({
        let reader = reader.clone();
        async move { reader.run().await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    // M1 queued, M2 fetched and waiting for space
    assert_eq!(client.calls().len(), 2);
    assert_eq!(reader.stats().events_delivered, 1);

    let mut received = Vec::new();
    for _ in 0..3 {
        received.push(fixture.district_queue.pop().await.unwrap().message_id.unwrap());
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(received, vec!["M1", "M2", "M3"]);
    assert_eq!(reader.stats().events_delivered, 3);

    reader.shutdown();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn shutdown_interrupts_a_blocked_push() {
    let fixture = fixture(1);
    let client = ScriptedClient::new([
        EventResponse::new("M1", "CREATE", "StudentPersonals").build(),
        EventResponse::new("M2", "CREATE", "StudentPersonals").build(),
    ]);
    let reader = Arc::new(reader(&fixture, &client, "students 1"));
    let task = tokio::spawn({
        let reader = reader.clone();
        async move { reader.run().await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    reader.shutdown();
    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("reader did not stop")
        .unwrap();

    assert_eq!(fixture.district_queue.len(), 1);
    assert_eq!(reader.stats().events_delivered, 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_interrupts_the_wait() {
    let fixture = fixture(1);
    let client = ScriptedClient::new([]);
    let reader = Arc::new(reader(&fixture, &client, "students 1"));
    assert_eq!(reader.wait_interval(), Duration::from_secs(10));

    let task = tokio::spawn({
        let reader = reader.clone();
        async move { reader.run().await }
    });
    tokio::time::sleep(Duration::from_secs(25)).await;
    assert_eq!(client.calls().len(), 3);

    reader.shutdown();
    task.await.unwrap();
    assert_eq!(client.calls().len(), 3);
}

#[test]
fn client_factory_failure_is_a_setup_error() {
    let fixture = fixture(1);
    let err = QueueReader::new(
        fixture.listener.clone(),
        &environment(),
        fixture.session.clone(),
        "students 1",
        &BrokenFactory,
    )
    .unwrap_err();

    assert!(matches!(err, ConsumerError::Setup { .. }));
    assert!(err.to_string().contains("no transport configured"));
}
