use crate::{args::usage, clock::Clock, filter::AgeFilter};
use anyhow::Context;
use async_trait::async_trait;
use std::io::Write;

/// The cluster operations a retention run needs
#[async_trait]
pub trait IndexStore {
    /// Names of every index currently in the cluster
    async fn list_indices(&self) -> anyhow::Result<Vec<String>>;

    /// Delete all of `indices` as one action. Any failure aborts the run.
    async fn delete_indices(&self, indices: &[String]) -> anyhow::Result<()>;
}

/// How a retention run ended, short of an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No endpoints were given
    Usage,
    /// The cluster holds no indices at all
    NoIndices,
    /// Indices exist but none is old enough
    NothingToDelete,
    /// These indices were deleted
    Deleted(Vec<String>),
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Usage => 1,
            _ => 0,
        }
    }

    /// Line printed to stdout for the early-exit outcomes
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Outcome::NoIndices => Some("ElasticSearch has no indices"),
            Outcome::NothingToDelete => Some("No indices to delete"),
            _ => None,
        }
    }

    /// Write what the user sees on stdout for this outcome. `program` is
    /// the name shown in the usage line.
    pub fn report<W: Write>(
        &self, program: &str, out: &mut W,
    ) -> std::io::Result<()> {
        match self {
            Outcome::Usage => writeln!(out, "{}", usage(program)),
            Outcome::Deleted(indices) => {
                log::info!("{} indices deleted", indices.len());
                Ok(())
            }
            other => match other.message() {
                Some(message) => writeln!(out, "{}", message),
                None => Ok(()),
            },
        }
    }
}

/// Run one retention pass against the cluster reachable at `endpoints`.
///
/// `connect` is only called when at least one endpoint is given. Errors from
/// connecting, listing or deleting are returned untouched apart from context.
pub async fn run<S, C>(
    endpoints: &[String], connect: C, clock: &dyn Clock,
) -> anyhow::Result<Outcome>
where
    S: IndexStore,
    C: FnOnce(&[String]) -> anyhow::Result<S>,
{
    if endpoints.is_empty() {
        return Ok(Outcome::Usage);
    }

    let store =
        connect(endpoints).context("failed to connect to elasticsearch")?;

    let indices = store.list_indices().await.context("failed to list indices")?;
    if indices.is_empty() {
        return Ok(Outcome::NoIndices);
    }
    log::info!("{} indices found", indices.len());

    let outdated = AgeFilter::default().apply(&indices, clock.now())?;
    if outdated.is_empty() {
        return Ok(Outcome::NothingToDelete);
    }
    log::info!("deleting {} outdated indices: {:?}", outdated.len(), outdated);

    store
        .delete_indices(&outdated)
        .await
        .context("failed to delete indices")?;
    Ok(Outcome::Deleted(outdated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    };

    #[derive(Default)]
    struct FakeStore {
        indices: Vec<String>,
        fail_list: bool,
        fail_delete: bool,
        deleted: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl<'a> IndexStore for &'a FakeStore {
        async fn list_indices(&self) -> anyhow::Result<Vec<String>> {
            if self.fail_list {
                anyhow::bail!("connection refused");
            }
            Ok(self.indices.clone())
        }

        async fn delete_indices(
            &self, indices: &[String],
        ) -> anyhow::Result<()> {
            self.deleted.lock().unwrap().push(indices.to_vec());
            if self.fail_delete {
                anyhow::bail!("index_not_found_exception");
            }
            Ok(())
        }
    }

    fn store(indices: &[&str]) -> FakeStore {
        FakeStore {
            indices: indices.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn clock() -> FixedClock {
        let midnight = NaiveDate::from_ymd_opt(2023, 1, 10)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        FixedClock(Utc.from_utc_datetime(&midnight))
    }

    fn endpoints() -> Vec<String> {
        vec!["es1:9200".to_string()]
    }

    fn reported(outcome: &Outcome) -> String {
        let mut out = Vec::new();
        outcome.report("es-retention", &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn report_writes_one_line_per_early_exit() {
        assert_eq!(
            reported(&Outcome::Usage),
            "USAGE: es-retention HOSTNAME[:PORT] ...\n"
        );
        assert_eq!(
            reported(&Outcome::NoIndices),
            "ElasticSearch has no indices\n"
        );
        assert_eq!(
            reported(&Outcome::NothingToDelete),
            "No indices to delete\n"
        );
        assert_eq!(reported(&Outcome::Deleted(endpoints())), "");
    }

    #[tokio::test]
    async fn no_endpoints_is_usage_without_connecting() {
        let connected = AtomicBool::new(false);
        let fake = store(&[]);
        let outcome = run(
            &[],
            |_| {
                connected.store(true, Ordering::SeqCst);
                Ok(&fake)
            },
            &clock(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, Outcome::Usage);
        assert_eq!(outcome.exit_code(), 1);
        assert!(!connected.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn empty_cluster_stops_before_delete() {
        let fake = store(&[]);
        let outcome = run(&endpoints(), |_| Ok(&fake), &clock()).await.unwrap();

        assert_eq!(outcome, Outcome::NoIndices);
        assert_eq!(outcome.message(), Some("ElasticSearch has no indices"));
        assert_eq!(outcome.exit_code(), 0);
        assert!(fake.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn nothing_old_enough_stops_before_delete() {
        let fake = store(&["logs-2023-01-08", "logs-2023-01-10", ".kibana"]);
        let outcome = run(&endpoints(), |_| Ok(&fake), &clock()).await.unwrap();

        assert_eq!(outcome, Outcome::NothingToDelete);
        assert_eq!(outcome.message(), Some("No indices to delete"));
        assert!(fake.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn deletes_exactly_the_outdated_indices_once() {
        let fake =
            store(&["logs-2023-01-01", "logs-2023-01-05", "logs-2023-01-10"]);
        let passed = Mutex::new(Vec::new());
        let outcome = run(
            &endpoints(),
            |hosts| {
                passed.lock().unwrap().extend_from_slice(hosts);
                Ok(&fake)
            },
            &clock(),
        )
        .await
        .unwrap();

        let expected = vec![
            "logs-2023-01-01".to_string(),
            "logs-2023-01-05".to_string(),
        ];
        assert_eq!(outcome, Outcome::Deleted(expected.clone()));
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(outcome.message(), None);
        assert_eq!(*fake.deleted.lock().unwrap(), vec![expected]);
        assert_eq!(*passed.lock().unwrap(), endpoints());
    }

    #[tokio::test]
    async fn delete_failure_propagates() {
        let mut fake = store(&["logs-2023-01-01"]);
        fake.fail_delete = true;
        let err = run(&endpoints(), |_| Ok(&fake), &clock()).await.unwrap_err();

        assert!(format!("{:#}", err).contains("index_not_found_exception"));
        assert_eq!(fake.deleted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_and_connect_failures_propagate() {
        let mut fake = store(&["logs-2023-01-01"]);
        fake.fail_list = true;
        let err = run(&endpoints(), |_| Ok(&fake), &clock()).await.unwrap_err();
        assert!(format!("{:#}", err).contains("failed to list indices"));
        assert!(fake.deleted.lock().unwrap().is_empty());

        let err = run::<&FakeStore, _>(
            &endpoints(),
            |_| Err(anyhow::anyhow!("relative URL without a base")),
            &clock(),
        )
        .await
        .unwrap_err();
        assert!(format!("{:#}", err).contains("failed to connect"));
    }
}
