//! Workflow store backed by JSON documents

use super::WorkflowStore;
use crate::models::workflow::{WorkflowDefinition, WorkflowInstance};
use crate::workflow::error::PersistError;
use crate::workflow::locks::{InstanceGuard, KeyedLocks};
use async_trait::async_trait;
use chrono::Utc;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const DEFINITIONS_FILE: &str = "definitions.json";
const INSTANCES_FILE: &str = "instances.json";
const INSTANCE_LOCK_DIR: &str = "instance-locks";
/// Instance ids hash onto this many lock files
const INSTANCE_LOCK_STRIPES: u64 = 64;

/// Open `path` (creating it) and take an advisory lock on it
///
/// The lock is released when the returned handle is dropped.
fn open_locked(path: &Path, exclusive: bool) -> Result<File, PersistError> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| PersistError::io(path, e))?;

    let locked = if exclusive {
        file.lock_exclusive()
    } else {
        file.lock_shared()
    };
    locked.map_err(|e| PersistError::io(path, e))?;

    Ok(file)
}

/// FNV-1a, stable across builds so every binary picks the same lock file
fn stripe_of(id: &str) -> u64 {
    let hash = id.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    });
    hash % INSTANCE_LOCK_STRIPES
}

/// A record stored in a JSON collection
trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn record_id(&self) -> &str;
}

impl Record for WorkflowDefinition {
    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Record for WorkflowInstance {
    fn record_id(&self) -> &str {
        &self.id
    }
}

/// Outcome of reading a collection document
enum Document<T> {
    Missing,
    Parsed(Vec<T>),
    Unusable(String),
}

/// One JSON document holding every record of a kind
///
/// Every read and every read-modify-write runs inside the collection's
/// critical section: an in-process mutex plus an advisory lock on a sibling
/// `.lock` file.
struct JsonCollection<T> {
    path: PathBuf,
    lock_path: PathBuf,
    gate: Mutex<()>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> JsonCollection<T> {
    fn new(directory: &Path, file_name: &str) -> Self {
        Self {
            path: directory.join(file_name),
            lock_path: directory.join(format!("{}.lock", file_name)),
            gate: Mutex::new(()),
            _record: PhantomData,
        }
    }

    fn lock_file(&self, exclusive: bool) -> Result<File, PersistError> {
        open_locked(&self.lock_path, exclusive)
    }

    fn read_document(&self) -> Document<T> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Document::Missing,
            Err(e) => return Document::Unusable(e.to_string()),
        };

        if contents.trim().is_empty() {
            return Document::Parsed(Vec::new());
        }

        match serde_json::from_str(&contents) {
            Ok(records) => Document::Parsed(records),
            Err(e) => Document::Unusable(e.to_string()),
        }
    }

    fn read_all(&self) -> Result<Vec<T>, PersistError> {
        let _gate = self.gate.lock().unwrap_or_else(|e| e.into_inner());
        let _lock = self.lock_file(false)?;

        match self.read_document() {
            Document::Missing => Ok(Vec::new()),
            Document::Parsed(records) => Ok(records),
            Document::Unusable(reason) => {
                tracing::warn!(
                    path = %self.path.display(),
                    reason = %reason,
                    "Unreadable workflow store document, treating as empty"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Read all records, apply `change`, write all records back
    fn mutate<R, F>(&self, change: F) -> Result<R, PersistError>
    where
        F: FnOnce(&mut Vec<T>) -> R,
    {
        let _gate = self.gate.lock().unwrap_or_else(|e| e.into_inner());
        let _lock = self.lock_file(true)?;

        let mut records = match self.read_document() {
            Document::Missing => Vec::new(),
            Document::Parsed(records) => records,
            Document::Unusable(reason) => {
                let preserved = self.preserve_unusable()?;
                tracing::warn!(
                    path = %self.path.display(),
                    preserved = %preserved.display(),
                    reason = %reason,
                    "Replacing unreadable workflow store document"
                );
                Vec::new()
            }
        };

        let result = change(&mut records);
        self.write_document(&records)?;
        Ok(result)
    }

    /// Move an unreadable document aside so the next write cannot destroy it
    fn preserve_unusable(&self) -> Result<PathBuf, PersistError> {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let target = self.path.with_file_name(format!(
            "{}.corrupt-{}",
            file_name,
            Utc::now().format("%Y%m%dT%H%M%S%.3fZ")
        ));

        fs::rename(&self.path, &target).map_err(|e| PersistError::io(&self.path, e))?;
        Ok(target)
    }

    fn write_document(&self, records: &[T]) -> Result<(), PersistError> {
        let json = serde_json::to_string_pretty(records)?;
        let temp_path = self.path.with_extension("json.tmp");

        let mut file = File::create(&temp_path).map_err(|e| PersistError::io(&temp_path, e))?;
        file.write_all(json.as_bytes())
            .map_err(|e| PersistError::io(&temp_path, e))?;
        file.sync_all()
            .map_err(|e| PersistError::io(&temp_path, e))?;
        drop(file);

        fs::rename(&temp_path, &self.path).map_err(|e| PersistError::io(&self.path, e))
    }

    fn find(&self, id: &str) -> Result<Option<T>, PersistError> {
        Ok(self
            .read_all()?
            .into_iter()
            .find(|record| record.record_id() == id))
    }

    fn upsert(&self, record: T) -> Result<(), PersistError> {
        self.mutate(|records| {
            match records
                .iter()
                .position(|existing| existing.record_id() == record.record_id())
            {
                Some(index) => records[index] = record,
                None => records.push(record),
            }
        })
    }

    /// Remove the record with `id`, reporting whether there was one
    fn remove(&self, id: &str) -> Result<bool, PersistError> {
        self.mutate(|records| {
            let before = records.len();
            records.retain(|record| record.record_id() != id);
            records.len() != before
        })
    }
}

/// Run a collection operation on the blocking pool
async fn blocking<T, R, F>(collection: &Arc<JsonCollection<T>>, op: F) -> Result<R, PersistError>
where
    T: Record,
    R: Send + 'static,
    F: FnOnce(&JsonCollection<T>) -> Result<R, PersistError> + Send + 'static,
{
    let collection = Arc::clone(collection);
    tokio::task::spawn_blocking(move || op(&collection))
        .await
        .map_err(|e| PersistError::Backend(format!("storage task failed: {}", e)))?
}

/// Store writing `definitions.json` and `instances.json` into a data directory
///
/// The two documents are locked independently; each is rewritten as a whole
/// on every mutation. Instance updates are additionally serialized through
/// lock files under `instance-locks/`, which every handle on the same data
/// directory shares, in this process or another.
pub struct FileWorkflowStore {
    data_directory: PathBuf,
    instance_lock_dir: PathBuf,
    definitions: Arc<JsonCollection<WorkflowDefinition>>,
    instances: Arc<JsonCollection<WorkflowInstance>>,
    instance_locks: KeyedLocks,
}

impl FileWorkflowStore {
    /// Create the store, creating the data directory if needed
    pub fn new<P: AsRef<Path>>(data_directory: P) -> Result<Self, PersistError> {
        let data_directory = data_directory.as_ref().to_path_buf();
        let instance_lock_dir = data_directory.join(INSTANCE_LOCK_DIR);
        fs::create_dir_all(&instance_lock_dir)
            .map_err(|e| PersistError::io(&instance_lock_dir, e))?;

        Ok(Self {
            instance_lock_dir,
            definitions: Arc::new(JsonCollection::new(&data_directory, DEFINITIONS_FILE)),
            instances: Arc::new(JsonCollection::new(&data_directory, INSTANCES_FILE)),
            data_directory,
            instance_locks: KeyedLocks::new(),
        })
    }

    pub fn data_directory(&self) -> &Path {
        &self.data_directory
    }

    pub fn definitions_path(&self) -> &Path {
        &self.definitions.path
    }

    pub fn instances_path(&self) -> &Path {
        &self.instances.path
    }

    fn instance_lock_path(&self, id: &str) -> PathBuf {
        self.instance_lock_dir.join(format!("{:02}.lock", stripe_of(id)))
    }
}

#[async_trait]
impl WorkflowStore for FileWorkflowStore {
    async fn save_definition(&self, definition: &WorkflowDefinition) -> Result<(), PersistError> {
        let definition = definition.clone();
        blocking(&self.definitions, move |c| c.upsert(definition)).await
    }

    async fn load_definition(&self, id: &str) -> Result<Option<WorkflowDefinition>, PersistError> {
        let id = id.to_string();
        blocking(&self.definitions, move |c| c.find(&id)).await
    }

    async fn load_all_definitions(&self) -> Result<Vec<WorkflowDefinition>, PersistError> {
        blocking(&self.definitions, |c| c.read_all()).await
    }

    async fn delete_definition(&self, id: &str) -> Result<bool, PersistError> {
        let id = id.to_string();
        blocking(&self.definitions, move |c| c.remove(&id)).await
    }

    async fn save_instance(&self, instance: &WorkflowInstance) -> Result<(), PersistError> {
        let instance = instance.clone();
        blocking(&self.instances, move |c| c.upsert(instance)).await
    }

    async fn load_instance(&self, id: &str) -> Result<Option<WorkflowInstance>, PersistError> {
        let id = id.to_string();
        blocking(&self.instances, move |c| c.find(&id)).await
    }

    async fn load_all_instances(&self) -> Result<Vec<WorkflowInstance>, PersistError> {
        blocking(&self.instances, |c| c.read_all()).await
    }

    async fn delete_instance(&self, id: &str) -> Result<bool, PersistError> {
        let id = id.to_string();
        blocking(&self.instances, move |c| c.remove(&id)).await
    }

    async fn lock_instance(&self, id: &str) -> Result<InstanceGuard<'_>, PersistError> {
        // Tasks on this handle queue here, so at most one of them blocks on the file
        let guard = InstanceGuard::new(self.instance_locks.lock(id).await);

        let path = self.instance_lock_path(id);
        let file = tokio::task::spawn_blocking(move || open_locked(&path, true))
            .await
            .map_err(|e| PersistError::Backend(format!("storage task failed: {}", e)))??;

        Ok(guard.with_file(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    fn instance(id: &str) -> WorkflowInstance {
        WorkflowInstance::new(
            id.to_string(),
            "def".to_string(),
            "start".to_string(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_initialization_creates_directory() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("nested").join("data");

        let store = FileWorkflowStore::new(&data_dir).unwrap();

        assert!(data_dir.is_dir());
        assert!(store.load_all_definitions().await.unwrap().is_empty());
        assert!(store.load_all_instances().await.unwrap().is_empty());
        // Documents are written lazily
        assert!(!store.definitions_path().exists());
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempdir().unwrap();
        let store = FileWorkflowStore::new(dir.path()).unwrap();
        store.save_instance(&instance("a")).await.unwrap();
        store.save_instance(&instance("b")).await.unwrap();
        drop(store);

        let reopened = FileWorkflowStore::new(dir.path()).unwrap();
        let ids: Vec<_> = reopened
            .load_all_instances()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_corrupt_document_is_empty_and_preserved() {
        let dir = tempdir().unwrap();
        let store = FileWorkflowStore::new(dir.path()).unwrap();
        fs::write(store.instances_path(), "{ not json").unwrap();

        assert!(store.load_all_instances().await.unwrap().is_empty());
        assert!(store.load_instance("a").await.unwrap().is_none());

        store.save_instance(&instance("a")).await.unwrap();
        assert_eq!(store.load_all_instances().await.unwrap().len(), 1);

        let preserved: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("instances.json.corrupt-"))
            .collect();
        assert_eq!(preserved.len(), 1);
        let kept = fs::read_to_string(dir.path().join(&preserved[0])).unwrap();
        assert_eq!(kept, "{ not json");
    }

    #[tokio::test]
    async fn test_concurrent_saves_are_not_lost() {
        let dir = tempdir().unwrap();
        let store = Arc::new(FileWorkflowStore::new(dir.path()).unwrap());

        let mut handles = Vec::new();
        for n in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.save_instance(&instance(&format!("i-{}", n))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.load_all_instances().await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn test_delete_only_touches_its_collection() {
        let dir = tempdir().unwrap();
        let store = FileWorkflowStore::new(dir.path()).unwrap();
        store.save_instance(&instance("shared-id")).await.unwrap();

        assert!(!store.delete_definition("shared-id").await.unwrap());
        assert!(store.load_instance("shared-id").await.unwrap().is_some());

        assert!(store.delete_instance("shared-id").await.unwrap());
        assert!(!store.delete_instance("shared-id").await.unwrap());
        assert!(store.load_instance("shared-id").await.unwrap().is_none());
    }

    #[test]
    fn test_stripe_is_stable_and_bounded() {
        assert_eq!(stripe_of("instance-1"), stripe_of("instance-1"));
        assert!(stripe_of("").max(stripe_of("x")) < INSTANCE_LOCK_STRIPES);
        // FNV-1a offset basis
        assert_eq!(stripe_of(""), 0xcbf2_9ce4_8422_2325 % INSTANCE_LOCK_STRIPES);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_instance_lock_is_shared_between_handles() {
        let dir = tempdir().unwrap();
        let first = FileWorkflowStore::new(dir.path()).unwrap();
        let second = Arc::new(FileWorkflowStore::new(dir.path()).unwrap());

        let guard = first.lock_instance("i").await.unwrap();
        assert_eq!(guard.key(), "i");

        let waiting = {
            let second = Arc::clone(&second);
            tokio::spawn(async move {
                let _guard = second.lock_instance("i").await.unwrap();
            })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!waiting.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(5), waiting)
            .await
            .unwrap()
            .unwrap();
    }
}
