mod common;

use common::{pick_free_port, shared_server, unique, TEST_LOCK};
use shift_tracker::client::{FileStorage, MemoryStorage, MirroredRepository, RemoteApi};
use shift_tracker::models::{MonthlyTarget, PaymentStatus, SavedLocation, ShiftEntry, ShiftType};

fn shift(id: &str, location: &str) -> ShiftEntry {
    ShiftEntry {
        id: id.to_string(),
        date: "2031-09-01".to_string(),
        start_time: "07:00".to_string(),
        end_time: "19:00".to_string(),
        location: location.to_string(),
        specialty: "Pediatrics".to_string(),
        shift_type: ShiftType::TwelveHour,
        payment_amount: 1100.0,
        payment_status: PaymentStatus::Pending,
        notes: None,
        color: Some("#3b82f6".to_string()),
    }
}

#[tokio::test]
async fn client_talks_to_live_server() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let remote = RemoteApi::new(format!("{}/", server.base_url)).unwrap();
    assert_eq!(remote.base_url(), server.base_url);
    assert!(remote.ping().await.unwrap().message.starts_with("Pong! "));

    let repo = MirroredRepository::new(remote, MemoryStorage::new());
    let id = format!("{}/ward?b", unique("client"));
    repo.save_shift(&shift(&id, "Hospital Central")).await;

    let fetched = repo.fetch_shifts().await;
    assert!(fetched.iter().any(|row| row.id == id));

    let toggled = repo.toggle_payment(&id).await.unwrap();
    assert_eq!(toggled.payment_status, PaymentStatus::Received);
    let fetched = repo.fetch_shifts().await;
    let stored = fetched.iter().find(|row| row.id == id).unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Received);

    repo.save_target(&MonthlyTarget::new(2031, 9, 6000.0, 1100.0)).await;
    assert!(repo
        .fetch_targets()
        .await
        .iter()
        .any(|target| target.id == "2031-09" && target.pending() == 4900.0));

    repo.delete_shift(&id).await;
    assert!(!repo.fetch_shifts().await.iter().any(|row| row.id == id));
}

#[tokio::test]
async fn client_falls_back_to_mirror_when_server_is_down() {
    let dir = tempfile::tempdir().unwrap();
    let remote = RemoteApi::new(format!("http://127.0.0.1:{}", pick_free_port())).unwrap();
    assert!(remote.ping().await.is_err());

    let repo = MirroredRepository::new(remote, FileStorage::new(dir.path()));
    repo.save_shifts(&[shift("a", "Clinic North"), shift("b", "Clinic North")])
        .await;
    repo.save_location(&SavedLocation {
        id: "l1".into(),
        name: "Clinic North".into(),
        usage_count: 2,
    })
    .await;
    repo.delete_shift("a").await;

    let shifts = repo.fetch_shifts().await;
    assert_eq!(shifts.len(), 1);
    assert_eq!(shifts[0].id, "b");
    assert_eq!(repo.fetch_locations().await[0].usage_count, 2);
    assert!(repo.fetch_targets().await.is_empty());

    let toggled = repo.toggle_payment("b").await.unwrap();
    assert_eq!(toggled.payment_status, PaymentStatus::Received);
    assert_eq!(
        repo.fetch_shifts().await[0].payment_status,
        PaymentStatus::Received
    );
}
