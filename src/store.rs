//! Result and profile persistence.
//!
//! [`ResultStore`] is the document store contract the front ends talk to.
//! [`FileStore`] keeps documents in a local directory; [`MemoryStore`] backs
//! sessions and tests.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::assessment::{AssessmentResult, ProfileUpdate, UserProfile};
use crate::config::StoreConfig;
use crate::error::Error;

pub trait ResultStore {
    /// Append a result under its owner. Empty user ids are rejected.
    fn save_result(&mut self, result: &AssessmentResult) -> Result<(), Error>;

    /// One user's results, newest first.
    fn get_user_results(&self, user_id: &str) -> Result<Vec<AssessmentResult>, Error>;

    /// Every stored result, in storage order.
    fn get_all_results(&self) -> Result<Vec<AssessmentResult>, Error>;

    fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, Error>;

    /// Merge `update` into the stored profile, creating it when absent.
    fn update_profile(&mut self, user_id: &str, update: &ProfileUpdate) -> Result<(), Error>;
}

fn newest_first(mut results: Vec<AssessmentResult>) -> Vec<AssessmentResult> {
    results.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    results
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    results: Vec<AssessmentResult>,
    profiles: HashMap<String, UserProfile>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_profile(&mut self, profile: UserProfile) {
        self.profiles.insert(profile.user_id.clone(), profile);
    }
}

impl ResultStore for MemoryStore {
    fn save_result(&mut self, result: &AssessmentResult) -> Result<(), Error> {
        if result.user_id.is_empty() {
            return Err(Error::EmptyUserId);
        }
        self.results.push(result.clone());
        Ok(())
    }

    fn get_user_results(&self, user_id: &str) -> Result<Vec<AssessmentResult>, Error> {
        if user_id.is_empty() {
            return Err(Error::EmptyUserId);
        }
        Ok(newest_first(
            self.results
                .iter()
                .filter(|result| result.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    fn get_all_results(&self) -> Result<Vec<AssessmentResult>, Error> {
        Ok(self.results.clone())
    }

    fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, Error> {
        Ok(self.profiles.get(user_id).cloned())
    }

    fn update_profile(&mut self, user_id: &str, update: &ProfileUpdate) -> Result<(), Error> {
        if user_id.is_empty() {
            return Err(Error::EmptyUserId);
        }
        let profile = self
            .profiles
            .entry(user_id.to_string())
            .or_insert_with(|| UserProfile::new(user_id));
        update.apply(profile);
        Ok(())
    }
}

/// Directory-backed store.
///
/// `results.jsonl` holds one JSON result per line; `profiles.json` is an
/// object keyed by user id.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    const RESULTS: &'static str = "results.jsonl";
    const PROFILES: &'static str = "profiles.json";

    pub fn open(dir: impl AsRef<Path>) -> Result<Self, Error> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "opened result store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_results(&self) -> Result<Vec<AssessmentResult>, Error> {
        let path = self.dir.join(Self::RESULTS);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(path)?);
        let mut results = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            results.push(serde_json::from_str(&line)?);
        }
        Ok(results)
    }

    fn read_profiles(&self) -> Result<BTreeMap<String, UserProfile>, Error> {
        let path = self.dir.join(Self::PROFILES);
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let reader = BufReader::new(File::open(path)?);
        let mut profiles: BTreeMap<String, UserProfile> = serde_json::from_reader(reader)?;
        for (user_id, profile) in profiles.iter_mut() {
            profile.user_id.clone_from(user_id);
        }
        Ok(profiles)
    }

    fn write_profiles(&self, profiles: &BTreeMap<String, UserProfile>) -> Result<(), Error> {
        let path = self.dir.join(Self::PROFILES);
        let staging = path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&staging)?);
            serde_json::to_writer_pretty(&mut writer, profiles)?;
            writer.flush()?;
        }
        fs::rename(staging, path)?;
        Ok(())
    }
}

impl ResultStore for FileStore {
    fn save_result(&mut self, result: &AssessmentResult) -> Result<(), Error> {
        if result.user_id.is_empty() {
            return Err(Error::EmptyUserId);
        }
        let mut line = serde_json::to_string(result)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(Self::RESULTS))?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    fn get_user_results(&self, user_id: &str) -> Result<Vec<AssessmentResult>, Error> {
        if user_id.is_empty() {
            return Err(Error::EmptyUserId);
        }
        let results = self
            .read_results()?
            .into_iter()
            .filter(|result| result.user_id == user_id)
            .collect();
        Ok(newest_first(results))
    }

    fn get_all_results(&self) -> Result<Vec<AssessmentResult>, Error> {
        self.read_results()
    }

    fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, Error> {
        Ok(self.read_profiles()?.remove(user_id))
    }

    fn update_profile(&mut self, user_id: &str, update: &ProfileUpdate) -> Result<(), Error> {
        if user_id.is_empty() {
            return Err(Error::EmptyUserId);
        }
        let mut profiles = self.read_profiles()?;
        let profile = profiles
            .entry(user_id.to_string())
            .or_insert_with(|| UserProfile::new(user_id));
        update.apply(profile);
        self.write_profiles(&profiles)
    }
}

/// How many times a save is tried and how long to wait between tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(250),
        }
    }
}

impl From<&StoreConfig> for RetryPolicy {
    fn from(config: &StoreConfig) -> Self {
        Self {
            attempts: config.save_attempts,
            ..Self::default()
        }
    }
}

/// Save a result, retrying failed writes.
///
/// An empty user id fails immediately. Otherwise the write is attempted up to
/// `policy.attempts` times with a linear backoff, and the last error is
/// returned if every attempt fails.
pub fn save_with_retry<S>(
    store: &mut S,
    result: &AssessmentResult,
    policy: RetryPolicy,
) -> Result<(), Error>
where
    S: ResultStore + ?Sized,
{
    if result.user_id.is_empty() {
        return Err(Error::EmptyUserId);
    }
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match store.save_result(result) {
            Ok(()) => {
                info!(user_id = %result.user_id, attempt, "saved assessment result");
                return Ok(());
            }
            Err(err) if attempt < attempts => {
                warn!(
                    user_id = %result.user_id,
                    attempt,
                    error = %err,
                    "saving assessment result failed, retrying"
                );
                thread::sleep(policy.backoff * attempt);
                attempt += 1;
            }
            Err(err) => {
                warn!(
                    user_id = %result.user_id,
                    attempt,
                    error = %err,
                    "giving up on saving assessment result"
                );
                return Err(err);
            }
        }
    }
}

/// Fetch the profile of every distinct result owner.
///
/// Owners whose profile is missing or fails to load are left out, so their
/// results drop out of aggregation.
pub fn profiles_for<S>(store: &S, results: &[AssessmentResult]) -> HashMap<String, UserProfile>
where
    S: ResultStore + ?Sized,
{
    let user_ids: BTreeSet<&str> = results.iter().map(|r| r.user_id.as_str()).collect();
    let mut profiles = HashMap::new();
    for user_id in user_ids {
        match store.get_profile(user_id) {
            Ok(Some(profile)) => {
                profiles.insert(user_id.to_string(), profile);
            }
            Ok(None) => debug!(user_id, "no profile for result owner"),
            Err(err) => warn!(user_id, error = %err, "failed to fetch profile"),
        }
    }
    profiles
}

#[cfg(test)]
mod test {
    use super::*;

    fn result(user_id: &str, timestamp: i64, depression: u32) -> AssessmentResult {
        AssessmentResult {
            depression_score: depression,
            anxiety_score: 1,
            stress_score: 2,
            timestamp,
            user_id: user_id.to_string(),
            responses: vec![0; 42],
        }
    }

    fn no_wait(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            backoff: Duration::ZERO,
        }
    }

    /// Fails the first `failures` saves.
    struct FlakyStore {
        inner: MemoryStore,
        failures: u32,
        calls: u32,
    }

    impl ResultStore for FlakyStore {
        fn save_result(&mut self, result: &AssessmentResult) -> Result<(), Error> {
            self.calls += 1;
            if self.calls <= self.failures {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "backend unavailable",
                )));
            }
            self.inner.save_result(result)
        }

        fn get_user_results(&self, user_id: &str) -> Result<Vec<AssessmentResult>, Error> {
            self.inner.get_user_results(user_id)
        }

        fn get_all_results(&self) -> Result<Vec<AssessmentResult>, Error> {
            self.inner.get_all_results()
        }

        fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, Error> {
            self.inner.get_profile(user_id)
        }

        fn update_profile(&mut self, user_id: &str, update: &ProfileUpdate) -> Result<(), Error> {
            self.inner.update_profile(user_id, update)
        }
    }

    #[test]
    fn test_memory_store_user_results_newest_first() {
        let mut store = MemoryStore::new();
        store.save_result(&result("a", 1, 1)).unwrap();
        store.save_result(&result("b", 2, 2)).unwrap();
        store.save_result(&result("a", 3, 3)).unwrap();
        let results = store.get_user_results("a").unwrap();
        let stamps: Vec<_> = results.iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![3, 1]);
        assert_eq!(store.get_all_results().unwrap().len(), 3);
    }

    #[test]
    fn test_empty_user_id_rejected() {
        let mut store = MemoryStore::new();
        assert!(matches!(
            store.save_result(&result("", 1, 1)),
            Err(Error::EmptyUserId)
        ));
        assert!(store.get_user_results("").is_err());
        assert!(matches!(
            save_with_retry(&mut store, &result("", 1, 1), no_wait(3)),
            Err(Error::EmptyUserId)
        ));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("nested")).unwrap();
        assert!(store.get_all_results().unwrap().is_empty());

        store.save_result(&result("a", 10, 5)).unwrap();
        store.save_result(&result("a", 20, 30)).unwrap();
        store.save_result(&result("b", 15, 0)).unwrap();

        let reopened = FileStore::open(store.dir()).unwrap();
        let all = reopened.get_all_results().unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0], result("a", 10, 5));
        let mine = reopened.get_user_results("a").unwrap();
        assert_eq!(mine[0].depression_score, 30);
        assert_eq!(mine[1].depression_score, 5);
    }

    #[test]
    fn test_file_store_profiles_merge() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        assert!(store.get_profile("a").unwrap().is_none());

        store
            .update_profile(
                "a",
                &ProfileUpdate {
                    name: Some(String::from("Asha")),
                    department: Some(String::from("Civil")),
                    ..ProfileUpdate::default()
                },
            )
            .unwrap();
        store
            .update_profile(
                "a",
                &ProfileUpdate {
                    year: Some(String::from("Third Year")),
                    ..ProfileUpdate::default()
                },
            )
            .unwrap();

        let profile = store.get_profile("a").unwrap().unwrap();
        assert_eq!(profile.user_id, "a");
        assert_eq!(profile.name, "Asha");
        assert_eq!(profile.department, "Civil");
        assert_eq!(profile.year, "Third Year");
        assert_eq!(profile.mobile_number, "N/A");
    }

    #[test]
    fn test_retry_recovers() {
        let mut store = FlakyStore {
            inner: MemoryStore::new(),
            failures: 2,
            calls: 0,
        };
        save_with_retry(&mut store, &result("a", 1, 1), no_wait(3)).unwrap();
        assert_eq!(store.calls, 3);
        assert_eq!(store.get_all_results().unwrap().len(), 1);
    }

    #[test]
    fn test_retry_surfaces_last_error() {
        let mut store = FlakyStore {
            inner: MemoryStore::new(),
            failures: 5,
            calls: 0,
        };
        let err = save_with_retry(&mut store, &result("a", 1, 1), no_wait(2)).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(store.calls, 2);
        assert!(store.get_all_results().unwrap().is_empty());
    }

    #[test]
    fn test_profiles_for_skips_missing() {
        let mut store = MemoryStore::new();
        let mut profile = UserProfile::new("a");
        profile.name = String::from("Asha");
        store.insert_profile(profile);
        let results = vec![result("a", 1, 1), result("a", 2, 1), result("ghost", 3, 1)];
        let profiles = profiles_for(&store, &results);
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles["a"].name, "Asha");
    }
}
