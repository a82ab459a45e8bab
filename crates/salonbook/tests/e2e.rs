// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end scenarios for the complete assistant pipeline.
//!
//! Each test creates an isolated TestHarness with scripted providers and,
//! where records matter, a temp SQLite database. Tests are independent and
//! order-insensitive.

use std::sync::Arc;

use salonbook_assistant::{ActionKind, SessionState};
use salonbook_core::types::{AudioClip, NewEmployee};
use salonbook_core::{Capability, FailureKind, ProviderFailure, SessionId};
use salonbook_storage::queries::{bookings, employees};
use salonbook_storage::{BookingStatus, NewBooking, SqliteStore};
use salonbook_test_utils::{RecordingStore, ScriptedProvider, StoreCall, TestHarness};

async fn seed_employee(store: &SqliteStore, name: &str) {
    employees::create_employee(
        store.database(),
        &NewEmployee {
            name: name.into(),
            role: "Stylist".into(),
            phone: "9000000000".into(),
            email: format!("{}@salon.test", name.to_lowercase()),
        },
    )
    .await
    .unwrap();
}

async fn seed_booking(
    store: &SqliteStore,
    stylist: &str,
    status: BookingStatus,
    amount: Option<f64>,
    price: Option<f64>,
) -> String {
    let mut booking = NewBooking::new("Meera", "Haircut", TestHarness::TODAY);
    booking.stylist_name = Some(stylist.into());
    booking.status = status;
    booking.amount = amount;
    booking.price = price;
    bookings::insert_booking(store.database(), &booking).await.unwrap()
}

// ---- Multi-turn slot filling ----

#[tokio::test]
async fn add_stylist_over_two_turns_creates_one_employee() {
    let provider = Arc::new(
        ScriptedProvider::conversation("openai")
            .reply(r#"{"intent":"ADD_EMPLOYEE","entities":{"name":"Rahul"},"response":"Sure!"}"#)
            .reply(
                r#"Got it. {"intent":"ADD_EMPLOYEE","entities":{"role":"Stylist","phone":"9876543210","email":"rahul@x.com"},"response":"Adding Rahul."}"#,
            ),
    );
    let harness = TestHarness::builder()
        .conversation(provider.clone())
        .with_sqlite()
        .build()
        .await
        .unwrap();

    let first = harness.send("salon-1", "Add new stylist Rahul").await.unwrap();
    assert_eq!(first.action.intent, ActionKind::AddEmployee);
    assert_eq!(first.action.entities["name"], "Rahul");
    assert_eq!(first.requires_follow_up, Some(true));
    assert_eq!(first.state, SessionState::Collecting);
    assert_eq!(first.follow_up_questions.as_ref().map(Vec::len), Some(3));

    let session = harness
        .assistant
        .sessions()
        .load(&SessionId("salon-1".into()))
        .await
        .unwrap()
        .unwrap();
    let pending = session.pending.unwrap();
    assert_eq!(pending.kind, ActionKind::AddEmployee);
    assert_eq!(pending.entities.get("name").map(String::as_str), Some("Rahul"));

    let second = harness
        .send("salon-1", "Stylist, 9876543210, rahul@x.com")
        .await
        .unwrap();
    assert_eq!(second.state, SessionState::AwaitingIntent);
    assert!(second.action_result.as_ref().unwrap().success);
    assert!(second.message.starts_with("Done! Rahul has been added as a Stylist"));

    let store = harness.sqlite.as_ref().unwrap();
    let all = employees::list_employees(store.database(), false).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "Rahul");
    assert_eq!(all[0].phone, "9876543210");
    assert_eq!(all[0].email, "rahul@x.com");
    assert_eq!(provider.calls(), 2);
}

// ---- Fallback exhaustion ----

#[tokio::test]
async fn quota_on_every_conversation_provider_reports_all_three() {
    let providers: Vec<Arc<ScriptedProvider>> = ["openai", "gemini", "anthropic"]
        .into_iter()
        .map(|name| {
            Arc::new(
                ScriptedProvider::conversation(name)
                    .always_fail(ProviderFailure::quota(format!("{name} quota exhausted"))),
            )
        })
        .collect();
    let store = Arc::new(RecordingStore::new());
    let mut builder = TestHarness::builder().with_store(store.clone());
    for provider in &providers {
        builder = builder.conversation(provider.clone());
    }
    let harness = builder.build().await.unwrap();

    let turn = harness.send("salon-1", "Show revenue for today").await.unwrap();
    for name in ["openai", "gemini", "anthropic"] {
        assert!(turn.message.contains(name), "{name} missing from {}", turn.message);
    }
    let result = turn.action_result.unwrap();
    assert!(!result.success);
    assert_eq!(result.data["providers"].as_array().unwrap().len(), 3);
    assert!(store.calls().is_empty());

    let status = harness.assistant.orchestrator().status().await;
    let conversation: Vec<_> = status
        .iter()
        .filter(|s| s.capability == Capability::Conversation)
        .collect();
    assert_eq!(conversation.len(), 3);
    assert!(conversation.iter().all(|s| !s.available));
    assert!(
        conversation
            .iter()
            .all(|s| s.last_error.as_ref().map(|e| e.kind) == Some(FailureKind::QuotaExceeded))
    );

    // Flagged providers are skipped, not retried, on the next turn.
    harness.send("salon-2", "hello").await.unwrap();
    assert!(providers.iter().all(|p| p.calls() == 1));
}

#[tokio::test]
async fn second_provider_answers_when_first_is_out_of_quota() {
    let openai = Arc::new(
        ScriptedProvider::conversation("openai").always_fail(ProviderFailure::quota("insufficient_quota")),
    );
    let gemini = Arc::new(ScriptedProvider::conversation("gemini").reply(
        r#"{"intent":"CANCEL_BOOKING","entities":{"bookingId":"b-17"},"response":"Done."}"#,
    ));
    let store = Arc::new(RecordingStore::new());
    let harness = TestHarness::builder()
        .conversation(openai.clone())
        .conversation(gemini.clone())
        .with_store(store.clone())
        .build()
        .await
        .unwrap();

    let turn = harness.send("salon-1", "cancel booking b-17").await.unwrap();
    assert_eq!(turn.provider.as_deref(), Some("gemini"));
    assert_eq!(store.calls(), [StoreCall::Cancel("b-17".into())]);
}

#[tokio::test]
async fn keyword_extraction_takes_over_when_conversation_is_down() {
    let harness = TestHarness::builder()
        .conversation(Arc::new(
            ScriptedProvider::conversation("openai").always_fail(ProviderFailure::auth("invalid key")),
        ))
        .extraction(Arc::new(salonbook_assistant::KeywordExtractor::new()))
        .with_sqlite()
        .build()
        .await
        .unwrap();
    let store = harness.sqlite.as_ref().unwrap();
    seed_booking(store, "Priya", BookingStatus::Completed, Some(25.0), None).await;
    seed_booking(store, "Priya", BookingStatus::Completed, None, Some(60.0)).await;

    let turn = harness.send("salon-1", "what's the revenue for today?").await.unwrap();
    assert_eq!(turn.provider.as_deref(), Some("keywords"));
    assert_eq!(turn.action.intent, ActionKind::GetRevenue);
    assert!(turn.message.contains("85.00"), "{}", turn.message);
}

// ---- Database-backed actions ----

#[tokio::test]
async fn revenue_counts_only_completed_bookings() {
    let harness = TestHarness::builder()
        .conversation(Arc::new(ScriptedProvider::conversation("openai").reply(
            r#"{"intent":"GET_REVENUE","entities":{"date":"today"},"response":"Let me check."}"#,
        )))
        .with_sqlite()
        .build()
        .await
        .unwrap();
    let store = harness.sqlite.as_ref().unwrap();
    seed_booking(store, "Priya", BookingStatus::Completed, Some(25.0), None).await;
    seed_booking(store, "Priya", BookingStatus::Completed, Some(60.0), Some(99.0)).await;
    seed_booking(store, "Anita", BookingStatus::Completed, None, Some(40.0)).await;
    seed_booking(store, "Anita", BookingStatus::Completed, Some(35.0), None).await;
    seed_booking(store, "Anita", BookingStatus::Pending, Some(500.0), None).await;

    let turn = harness.send("salon-1", "revenue today?").await.unwrap();
    assert_eq!(
        turn.message,
        "Revenue for 2026-10-15: 160.00 from 4 completed bookings."
    );
}

#[tokio::test]
async fn sick_stylist_bookings_are_spread_over_colleagues() {
    let harness = TestHarness::builder()
        .conversation(Arc::new(ScriptedProvider::conversation("openai").reply(
            r#"{"intent":"REASSIGN_APPOINTMENTS","entities":{"employeeName":"Priya","date":"today"},"response":"On it."}"#,
        )))
        .with_sqlite()
        .build()
        .await
        .unwrap();
    let store = harness.sqlite.as_ref().unwrap();
    for name in ["Priya", "Anita", "Kavya"] {
        seed_employee(store, name).await;
    }
    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(seed_booking(store, "Priya", BookingStatus::Confirmed, None, Some(30.0)).await);
    }

    let turn = harness
        .send("salon-1", "Priya is sick today, reassign her appointments")
        .await
        .unwrap();
    assert_eq!(
        turn.message,
        "Reassigned 3 of Priya's appointments on 2026-10-15 to other stylists."
    );

    for id in ids {
        let booking = bookings::get_booking(store.database(), &id).await.unwrap().unwrap();
        let stylist = booking.stylist_name.unwrap();
        assert!(stylist == "Anita" || stylist == "Kavya", "unexpected stylist {stylist}");
    }
}

// ---- Voice ----

#[tokio::test]
async fn voice_turn_transcribes_then_executes() {
    let whisper = Arc::new(
        ScriptedProvider::transcription("whisper").fail(ProviderFailure::transient("connection reset")),
    );
    let deepgram = Arc::new(ScriptedProvider::transcription("deepgram").reply("cancel booking b-5"));
    let store = Arc::new(RecordingStore::new());
    let harness = TestHarness::builder()
        .conversation(Arc::new(ScriptedProvider::conversation("openai").reply(
            r#"{"intent":"CANCEL_BOOKING","entities":{"bookingId":"b-5"},"response":"Cancelling."}"#,
        )))
        .transcription(whisper.clone())
        .transcription(deepgram.clone())
        .with_store(store.clone())
        .build()
        .await
        .unwrap();

    let clip = AudioClip {
        data: bytes::Bytes::from_static(b"OggS\0\0\0"),
        content_type: "audio/ogg".into(),
    };
    let voice = harness
        .assistant
        .handle_voice_turn(&SessionId("salon-1".into()), clip)
        .await
        .unwrap();

    assert_eq!(voice.transcript, "cancel booking b-5");
    assert_eq!(voice.transcribed_by, "deepgram");
    assert_eq!(voice.turn.message, "Booking b-5 has been cancelled.");
    assert_eq!(store.calls(), [StoreCall::Cancel("b-5".into())]);
    assert_eq!(whisper.calls(), 1);

    // A transient failure leaves whisper in rotation.
    let status = harness.assistant.orchestrator().status().await;
    let whisper_status = status.iter().find(|s| s.name == "whisper").unwrap();
    assert!(whisper_status.available);
}
