//! Visibility Updater - makes each selected repository private
//!
//! Repositories are processed one at a time. A failure is recorded against
//! its repository and the run moves on to the next one.

use std::time::{Duration, Instant};
use tracing::{error, info};

use crate::console::Console;
use crate::error::{PrivacyError, Result};
use crate::github::RepositoryHost;
use crate::selection::SelectionSet;

/// Outcome for a single repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResult {
    pub name: String,
    pub outcome: std::result::Result<(), PrivacyError>,
}

impl UpdateResult {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Results from a complete update pass
#[derive(Debug, Clone, Default)]
pub struct UpdateReport {
    pub results: Vec<UpdateResult>,
    pub duration: Duration,
}

impl UpdateReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn successful(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.successful()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &PrivacyError)> {
        self.results.iter().filter_map(|r| match &r.outcome {
            Ok(()) => None,
            Err(e) => Some((r.name.as_str(), e)),
        })
    }
}

/// Make every repository in `selection` private, reporting progress to `console`
pub async fn apply<H>(
    host: &H,
    selection: &SelectionSet,
    console: &mut dyn Console,
) -> Result<UpdateReport>
where
    H: RepositoryHost + ?Sized,
{
    let start_time = Instant::now();
    let mut results = Vec::with_capacity(selection.len());

    console.say("")?;
    console.say(&format!(
        "🔄 Making {} repositories private...",
        selection.len()
    ))?;

    for name in selection.iter() {
        let outcome = host.make_private(name).await;

        match &outcome {
            Ok(()) => console.say(&format!("Processing {}... ✅ Done", name))?,
            Err(e) => {
                error!("Failed to make {} private: {}", name, e);
                console.say(&format!("Processing {}... ❌ Failed", name))?;
            }
        }

        results.push(UpdateResult {
            name: name.to_string(),
            outcome,
        });
    }

    let report = UpdateReport {
        results,
        duration: start_time.elapsed(),
    };

    info!(
        "Update completed in {:.2}s: {} successful, {} failed",
        report.duration.as_secs_f64(),
        report.successful(),
        report.failed()
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::LineConsole;
    use crate::github::MockRepositoryHost;
    use assert_matches::assert_matches;
    use std::io::Cursor;

    fn console() -> LineConsole<Cursor<Vec<u8>>, Vec<u8>> {
        LineConsole::new(Cursor::new(Vec::new()), Vec::new())
    }

    #[tokio::test]
    async fn test_continues_past_failures() {
        let mut host = MockRepositoryHost::new();
        host.expect_make_private()
            .withf(|name: &str| name == "a")
            .times(1)
            .returning(|_| Ok(()));
        host.expect_make_private()
            .withf(|name: &str| name == "b")
            .times(1)
            .returning(|_| Err(PrivacyError::RateLimited("API rate limit exceeded".into())));
        host.expect_make_private()
            .withf(|name: &str| name == "c")
            .times(1)
            .returning(|_| {
                Err(PrivacyError::Auth {
                    status: 403,
                    message: "Must have admin rights to Repository.".into(),
                })
            });
        host.expect_make_private()
            .withf(|name: &str| name == "d")
            .times(1)
            .returning(|_| Ok(()));

        let selection: SelectionSet = ["a", "b", "c", "d"].into_iter().collect();
        let mut console = console();
        let report = apply(&host, &selection, &mut console).await.unwrap();

        assert_eq!(report.total(), 4);
        assert_eq!(report.successful(), 2);
        assert_eq!(report.failed(), 2);
        assert!(report.has_failures());

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures[0].0, "b");
        assert_matches!(failures[0].1, PrivacyError::RateLimited(_));
        assert_eq!(failures[1].0, "c");
        assert_matches!(failures[1].1, PrivacyError::Auth { .. });

        let output = String::from_utf8(console.into_output()).unwrap();
        assert!(output.contains("Processing a... ✅ Done"));
        assert!(output.contains("Processing b... ❌ Failed"));
    }

    #[tokio::test]
    async fn test_processes_in_selection_order() {
        let mut host = MockRepositoryHost::new();
        let mut seq = mockall::Sequence::new();
        for expected in ["second", "first"] {
            host.expect_make_private()
                .withf(move |name: &str| name == expected)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(()));
        }

        let selection: SelectionSet = ["second", "first"].into_iter().collect();
        let report = apply(&host, &selection, &mut console()).await.unwrap();
        assert!(!report.has_failures());
        assert_eq!(report.successful(), 2);
    }

    #[tokio::test]
    async fn test_empty_selection_makes_no_calls() {
        let mut host = MockRepositoryHost::new();
        host.expect_make_private().times(0);

        let report = apply(&host, &SelectionSet::new(), &mut console()).await.unwrap();
        assert_eq!(report.total(), 0);
        assert!(!report.has_failures());
    }
}
