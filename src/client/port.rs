use super::ClientError;
use super::repository::RecordSource;
use crate::models::Record;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;

/// Key/value persistence for the local mirror.
#[async_trait]
pub trait StoragePort: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError>;
    async fn set(&self, key: &str, value: String) -> Result<(), ClientError>;
    async fn delete(&self, key: &str) -> Result<(), ClientError>;
}

#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoragePort for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), ClientError> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), ClientError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside `dir`.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

#[async_trait]
impl StoragePort for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), ClientError> {
        fs::create_dir_all(&self.dir).await?;
        fs::write(self.path_for(key), value).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), ClientError> {
        match fs::remove_file(self.path_for(key)).await {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

/// Typed record collections stored under `shift-tracker/{resource}`.
pub struct Mirror<S> {
    storage: S,
}

impl<S: StoragePort> Mirror<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    fn key<T: Record>() -> String {
        format!("shift-tracker/{}", T::RESOURCE)
    }

    /// Overwrites the whole collection.
    pub async fn replace<T: Record>(&self, items: &[T]) -> Result<(), ClientError> {
        let payload = serde_json::to_string(items)?;
        self.storage.set(&Self::key::<T>(), payload).await
    }
}

#[async_trait]
impl<S: StoragePort> RecordSource for Mirror<S> {
    async fn list<T: Record>(&self) -> Result<Vec<T>, ClientError> {
        match self.storage.get(&Self::key::<T>()).await? {
            Some(payload) => Ok(serde_json::from_str(&payload)?),
            None => Ok(Vec::new()),
        }
    }

    async fn upsert<T: Record>(&self, items: &[T]) -> Result<(), ClientError> {
        let mut stored: Vec<T> = self.list().await?;
        for item in items {
            match stored.iter_mut().find(|existing| existing.id() == item.id()) {
                Some(existing) => *existing = item.clone(),
                None => stored.push(item.clone()),
            }
        }
        self.replace(&stored).await
    }

    async fn delete<T: Record>(&self, id: &str) -> Result<(), ClientError> {
        let mut stored: Vec<T> = self.list().await?;
        stored.retain(|item| item.id() != id);
        self.replace(&stored).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SavedLocation;

    fn location(id: &str, name: &str) -> SavedLocation {
        SavedLocation {
            id: id.into(),
            name: name.into(),
            usage_count: 0,
        }
    }

    #[tokio::test]
    async fn memory_storage_round_trips_and_deletes() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").await.unwrap(), None);
        storage.set("k", "v".into()).await.unwrap();
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("v"));
        storage.delete("k").await.unwrap();
        assert_eq!(storage.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_storage_keeps_one_file_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("mirror"));

        storage.set("shift-tracker/shifts", "[]".into()).await.unwrap();
        assert!(dir.path().join("mirror/shift-tracker_shifts.json").exists());
        assert_eq!(
            storage.get("shift-tracker/shifts").await.unwrap().as_deref(),
            Some("[]")
        );

        storage.delete("shift-tracker/shifts").await.unwrap();
        storage.delete("shift-tracker/shifts").await.unwrap();
        assert_eq!(storage.get("shift-tracker/shifts").await.unwrap(), None);
    }

    #[tokio::test]
    async fn mirror_upserts_by_id_and_removes() {
        let mirror = Mirror::new(MemoryStorage::new());
        mirror
            .upsert(&[location("a", "Clinic North"), location("b", "Hospital Central")])
            .await
            .unwrap();
        mirror.upsert(&[location("a", "Clinic North Wing")]).await.unwrap();

        let stored: Vec<SavedLocation> = mirror.list().await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].name, "Clinic North Wing");

        mirror.delete::<SavedLocation>("b").await.unwrap();
        mirror.delete::<SavedLocation>("missing").await.unwrap();
        let stored: Vec<SavedLocation> = mirror.list().await.unwrap();
        assert_eq!(stored, vec![location("a", "Clinic North Wing")]);
    }

    #[tokio::test]
    async fn corrupt_mirror_is_an_error() {
        let storage = MemoryStorage::new();
        storage
            .set("shift-tracker/locations", "{oops".into())
            .await
            .unwrap();
        let mirror = Mirror::new(storage);
        assert!(matches!(
            mirror.list::<SavedLocation>().await,
            Err(ClientError::Decode(_))
        ));
    }
}
