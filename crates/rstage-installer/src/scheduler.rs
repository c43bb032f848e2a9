use std::collections::{HashSet, VecDeque};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use anyhow::{anyhow, Result};
use rstage_core::{PackageRequest, RunOutcome, SourceResolution, TaskStatus};

use crate::primitive::PackageInstaller;
use crate::report::Reporter;
use crate::types::{FailureKind, FailurePolicy, InstallConfig, InstallFailure, InstallRun, InstallTask};

struct WorkItem {
    index: usize,
    request: PackageRequest,
    resolution: SourceResolution,
}

enum WorkerMessage {
    Started {
        index: usize,
    },
    Finished {
        index: usize,
        result: Result<(), InstallFailure>,
    },
}

/// Installs every task with a fixed pool of `ncpus` worker threads.
///
/// Workers pull from a shared queue and report `Started`/`Finished` over a
/// channel; the calling thread is the only writer of task status and forwards
/// each transition to the reporter in arrival order. A package's begin line
/// therefore always precedes its terminal line, while independent packages
/// may interleave freely. Started installations are never cancelled; resource
/// exhaustion only stops new work from being dispatched.
pub fn run_install<W: Write>(
    mut tasks: Vec<InstallTask>,
    config: &InstallConfig,
    installer: &dyn PackageInstaller,
    reporter: &mut Reporter<W>,
) -> Result<InstallRun> {
    if config.ncpus == 0 {
        return Err(anyhow!("concurrency budget must be at least 1"));
    }

    let mut seen = HashSet::new();
    for task in &tasks {
        if !seen.insert(task.name().to_string()) {
            return Err(anyhow!(
                "duplicate install task for package '{}'",
                task.name()
            ));
        }
        if task.status != TaskStatus::Pending {
            return Err(anyhow!(
                "install task for package '{}' is not pending",
                task.name()
            ));
        }
        if !task.resolution.is_available() {
            return Err(anyhow!(
                "package '{}' reached the scheduler without a resolved source",
                task.name()
            ));
        }
    }

    reporter.run_started(config.ncpus)?;

    if tasks.is_empty() {
        return Ok(InstallRun {
            tasks,
            ncpus: config.ncpus,
            outcome: RunOutcome::Success,
        });
    }

    let queue: Arc<Mutex<VecDeque<WorkItem>>> = Arc::new(Mutex::new(
        tasks
            .iter()
            .enumerate()
            .map(|(index, task)| WorkItem {
                index,
                request: task.request.clone(),
                resolution: task.resolution.clone(),
            })
            .collect(),
    ));
    let abort = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel::<WorkerMessage>();
    let worker_count = config.ncpus.min(tasks.len());

    thread::scope(|scope| -> Result<()> {
        for _ in 0..worker_count {
            let queue = Arc::clone(&queue);
            let abort = Arc::clone(&abort);
            let tx = tx.clone();
            scope.spawn(move || loop {
                if abort.load(Ordering::SeqCst) {
                    break;
                }
                let Some(item) = queue.lock().ok().and_then(|mut pending| pending.pop_front())
                else {
                    break;
                };
                if tx.send(WorkerMessage::Started { index: item.index }).is_err() {
                    break;
                }
                let result = installer.install(&item.request, &item.resolution);
                // The failing worker flips the abort flag itself, so no
                // further task is dispatched before the failure is even
                // observed by the aggregator.
                let exhausted = matches!(
                    &result,
                    Err(failure) if failure.kind == FailureKind::ResourceExhaustion
                );
                if exhausted {
                    abort.store(true, Ordering::SeqCst);
                    if let Ok(mut pending) = queue.lock() {
                        pending.clear();
                    }
                }
                if tx
                    .send(WorkerMessage::Finished {
                        index: item.index,
                        result,
                    })
                    .is_err()
                {
                    break;
                }
            });
        }
        drop(tx);

        while let Ok(message) = rx.recv() {
            match message {
                WorkerMessage::Started { index } => {
                    tasks[index].status = TaskStatus::Installing;
                    reporter.package_started(tasks[index].name())?;
                }
                WorkerMessage::Finished { index, result } => match result {
                    Ok(()) => {
                        tasks[index].status = TaskStatus::Installed;
                        reporter.package_installed(tasks[index].name())?;
                    }
                    Err(failure) => {
                        reporter.package_failed(tasks[index].name(), &failure.detail)?;
                        if config.failure_policy == FailurePolicy::WarnTransitive
                            && tasks[index].transitive
                        {
                            reporter.transitive_failure_warned(tasks[index].name())?;
                        }
                        tasks[index].status = TaskStatus::Failed(failure.detail);
                    }
                },
            }
        }
        Ok(())
    })?;

    let outcome = if abort.load(Ordering::SeqCst) {
        RunOutcome::Aborted
    } else if tasks.iter().any(|task| {
        matches!(task.status, TaskStatus::Failed(_))
            && (config.failure_policy == FailurePolicy::Strict || !task.transitive)
    }) {
        RunOutcome::PartialFailure
    } else {
        RunOutcome::Success
    };

    Ok(InstallRun {
        tasks,
        ncpus: config.ncpus,
        outcome,
    })
}
