use super::ClientError;
use super::port::{Mirror, StoragePort};
use crate::models::{MonthlyTarget, Record, SavedLocation, ShiftEntry};
use async_trait::async_trait;
use tracing::{debug, warn};

/// A backend that can list, upsert and delete records of any resource.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn list<T: Record>(&self) -> Result<Vec<T>, ClientError>;
    async fn upsert<T: Record>(&self, items: &[T]) -> Result<(), ClientError>;
    async fn delete<T: Record>(&self, id: &str) -> Result<(), ClientError>;
}

/// Remote-first access with a local mirror.
///
/// Reads: a successful, non-empty remote answer replaces the mirror and is
/// returned; a failed or empty one yields the mirror's last known value.
/// Writes: the mirror is updated first, then the remote call is attempted.
/// Remote write failures are logged and dropped; the mirror is not rolled
/// back and nothing is retried.
pub struct MirroredRepository<R, S> {
    remote: R,
    mirror: Mirror<S>,
}

impl<R: RecordSource, S: StoragePort> MirroredRepository<R, S> {
    pub fn new(remote: R, storage: S) -> Self {
        Self {
            remote,
            mirror: Mirror::new(storage),
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn mirror(&self) -> &Mirror<S> {
        &self.mirror
    }

    pub async fn fetch<T: Record>(&self) -> Vec<T> {
        match self.remote.list::<T>().await {
            Ok(items) if !items.is_empty() => {
                if let Err(err) = self.mirror.replace(&items).await {
                    warn!(resource = T::RESOURCE, "failed to refresh local mirror: {err}");
                }
                items
            }
            Ok(_) => {
                debug!(resource = T::RESOURCE, "remote returned nothing, using local mirror");
                self.local::<T>().await
            }
            Err(err) => {
                warn!(resource = T::RESOURCE, "remote fetch failed, using local mirror: {err}");
                self.local::<T>().await
            }
        }
    }

    pub async fn save<T: Record>(&self, items: &[T]) {
        if items.is_empty() {
            return;
        }
        if let Err(err) = self.mirror.upsert(items).await {
            warn!(resource = T::RESOURCE, "failed to update local mirror: {err}");
        }
        if let Err(err) = self.remote.upsert(items).await {
            warn!(resource = T::RESOURCE, count = items.len(), "remote save failed: {err}");
        }
    }

    pub async fn remove<T: Record>(&self, id: &str) {
        if let Err(err) = self.mirror.delete::<T>(id).await {
            warn!(resource = T::RESOURCE, id, "failed to update local mirror: {err}");
        }
        if let Err(err) = self.remote.delete::<T>(id).await {
            warn!(resource = T::RESOURCE, id, "remote delete failed: {err}");
        }
    }

    async fn local<T: Record>(&self) -> Vec<T> {
        self.mirror.list().await.unwrap_or_else(|err| {
            warn!(resource = T::RESOURCE, "failed to read local mirror: {err}");
            Vec::new()
        })
    }

    pub async fn fetch_shifts(&self) -> Vec<ShiftEntry> {
        self.fetch().await
    }

    pub async fn save_shift(&self, shift: &ShiftEntry) {
        self.save(std::slice::from_ref(shift)).await
    }

    pub async fn save_shifts(&self, shifts: &[ShiftEntry]) {
        self.save(shifts).await
    }

    pub async fn delete_shift(&self, id: &str) {
        self.remove::<ShiftEntry>(id).await
    }

    /// Flips pending/received on the mirrored copy and saves it.
    pub async fn toggle_payment(&self, id: &str) -> Option<ShiftEntry> {
        let mut shift = self
            .local::<ShiftEntry>()
            .await
            .into_iter()
            .find(|shift| shift.id == id)?;
        shift.payment_status = shift.payment_status.toggled();
        self.save_shift(&shift).await;
        Some(shift)
    }

    pub async fn fetch_targets(&self) -> Vec<MonthlyTarget> {
        self.fetch().await
    }

    pub async fn save_target(&self, target: &MonthlyTarget) {
        self.save(std::slice::from_ref(target)).await
    }

    pub async fn fetch_locations(&self) -> Vec<SavedLocation> {
        self.fetch().await
    }

    pub async fn save_location(&self, location: &SavedLocation) {
        self.save(std::slice::from_ref(location)).await
    }

    pub async fn delete_location(&self, id: &str) {
        self.remove::<SavedLocation>(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryStorage;
    use crate::models::{PaymentStatus, ShiftType};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Mutex;

    /// In-process stand-in for the server that can be switched offline.
    #[derive(Default)]
    struct FakeRemote {
        offline: AtomicBool,
        rows: Mutex<BTreeMap<(&'static str, String), String>>,
    }

    impl FakeRemote {
        fn go_offline(&self) {
            self.offline.store(true, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), ClientError> {
            if self.offline.load(Ordering::SeqCst) {
                Err(ClientError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl RecordSource for FakeRemote {
        async fn list<T: Record>(&self) -> Result<Vec<T>, ClientError> {
            self.check()?;
            let rows = self.rows.lock().await;
            rows.iter()
                .filter(|((resource, _), _)| *resource == T::RESOURCE)
                .map(|(_, json)| serde_json::from_str(json).map_err(ClientError::from))
                .collect()
        }

        async fn upsert<T: Record>(&self, items: &[T]) -> Result<(), ClientError> {
            self.check()?;
            let mut rows = self.rows.lock().await;
            for item in items {
                rows.insert((T::RESOURCE, item.id().to_string()), serde_json::to_string(item)?);
            }
            Ok(())
        }

        async fn delete<T: Record>(&self, id: &str) -> Result<(), ClientError> {
            self.check()?;
            self.rows.lock().await.remove(&(T::RESOURCE, id.to_string()));
            Ok(())
        }
    }

    fn shift(id: &str, date: &str) -> ShiftEntry {
        ShiftEntry {
            id: id.to_string(),
            date: date.to_string(),
            start_time: "19:00".to_string(),
            end_time: "07:00".to_string(),
            location: "Hospital Central".to_string(),
            specialty: "ICU".to_string(),
            shift_type: ShiftType::Night,
            payment_amount: 900.0,
            payment_status: PaymentStatus::Pending,
            notes: None,
            color: None,
        }
    }

    #[tokio::test]
    async fn online_fetch_replaces_the_mirror() {
        let repo = MirroredRepository::new(FakeRemote::default(), MemoryStorage::new());
        repo.remote().upsert(&[shift("remote", "2024-05-01")]).await.unwrap();
        repo.mirror().replace(&[shift("stale", "2024-01-01")]).await.unwrap();

        let fetched = repo.fetch_shifts().await;
        assert_eq!(fetched, vec![shift("remote", "2024-05-01")]);

        let mirrored: Vec<ShiftEntry> = repo.mirror().list().await.unwrap();
        assert_eq!(mirrored, fetched);
    }

    #[tokio::test]
    async fn empty_or_failed_remote_falls_back_to_mirror() {
        let repo = MirroredRepository::new(FakeRemote::default(), MemoryStorage::new());
        repo.mirror().replace(&[shift("local", "2024-01-01")]).await.unwrap();

        assert_eq!(repo.fetch_shifts().await[0].id, "local");

        repo.remote().go_offline();
        assert_eq!(repo.fetch_shifts().await[0].id, "local");
        assert!(repo.fetch_targets().await.is_empty());
    }

    #[tokio::test]
    async fn writes_land_locally_even_when_remote_fails() {
        let repo = MirroredRepository::new(FakeRemote::default(), MemoryStorage::new());
        repo.remote().go_offline();

        repo.save_shifts(&[shift("a", "2024-02-01"), shift("b", "2024-02-02")])
            .await;
        repo.delete_shift("a").await;

        let local = repo.fetch_shifts().await;
        assert_eq!(local, vec![shift("b", "2024-02-02")]);
    }

    #[tokio::test]
    async fn toggle_flips_status_on_both_sides() {
        let repo = MirroredRepository::new(FakeRemote::default(), MemoryStorage::new());
        repo.save_shift(&shift("a", "2024-02-01")).await;

        let toggled = repo.toggle_payment("a").await.unwrap();
        assert_eq!(toggled.payment_status, PaymentStatus::Received);

        let remote: Vec<ShiftEntry> = repo.remote().list().await.unwrap();
        assert_eq!(remote[0].payment_status, PaymentStatus::Received);
        assert!(repo.toggle_payment("missing").await.is_none());
    }

    #[tokio::test]
    async fn locations_and_targets_use_their_own_collections() {
        let repo = MirroredRepository::new(FakeRemote::default(), MemoryStorage::new());
        repo.save_location(&SavedLocation {
            id: "l1".into(),
            name: "Clinic North".into(),
            usage_count: 0,
        })
        .await;
        repo.save_target(&MonthlyTarget::new(2024, 4, 5000.0, 0.0)).await;

        assert_eq!(repo.fetch_locations().await.len(), 1);
        assert_eq!(repo.fetch_targets().await[0].id, "2024-04");
        assert!(repo.fetch_shifts().await.is_empty());

        repo.delete_location("l1").await;
        assert!(repo.fetch_locations().await.is_empty());
    }
}
