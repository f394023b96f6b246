//! Per-type worker loops and the startup recovery sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use mentionloop_core::config::WorkerConfig;
use mentionloop_core::{JobStatus, JobType};

use crate::context::WorkerContext;
use crate::error::WorkerError;
use crate::ingest::run_search_mentions;
use crate::reply::run_process_mentions;

/// Move jobs orphaned by an unclean shutdown back to pending, for every
/// job type. Must run before any loop starts, and only in a
/// single-active-instance deployment — a live peer's running jobs would
/// be swept too.
pub async fn recover_orphaned_jobs(ctx: &WorkerContext) -> Result<(), WorkerError> {
    for job_type in JobType::ALL {
        let recovered = ctx.jobs.reschedule(job_type).await?;
        if recovered > 0 {
            info!(job_type = %job_type, recovered, "rescheduled orphaned running jobs");
        }
    }
    Ok(())
}

/// Run the recovery sweep, then spawn one polling loop per job type.
pub async fn start_workers(
    ctx: Arc<WorkerContext>,
    config: &WorkerConfig,
) -> Result<(), WorkerError> {
    recover_orphaned_jobs(&ctx).await?;

    tokio::spawn(run_job_loop(
        ctx.clone(),
        JobType::SearchMentions,
        Duration::from_secs(config.search_interval_secs),
    ));
    tokio::spawn(run_job_loop(
        ctx,
        JobType::ProcessMentions,
        Duration::from_secs(config.process_interval_secs),
    ));

    Ok(())
}

/// Poll one job type forever. A failed tick is logged and never stops
/// the loop; ticks cannot overlap because the body is awaited inline.
pub async fn run_job_loop(ctx: Arc<WorkerContext>, job_type: JobType, period: Duration) {
    info!(job_type = %job_type, period_secs = period.as_secs(), "worker loop started");

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        if let Err(e) = run_tick(&ctx, job_type).await {
            warn!(job_type = %job_type, error = %e, "worker tick failed");
        }
    }
}

/// One poll cycle: claim, maybe execute, never leave a claimed job
/// running.
pub async fn run_tick(ctx: &WorkerContext, job_type: JobType) -> Result<(), WorkerError> {
    let job = ctx.jobs.claim_next(job_type).await?;

    if job.status == JobStatus::Pending {
        // Queue was empty; the claim seeded it for the next tick.
        debug!(job_type = %job_type, job_id = %job.id, "no runnable job this tick");
        return Ok(());
    }

    info!(job_type = %job_type, job_id = %job.id, "executing job");
    let result = match job_type {
        JobType::SearchMentions => run_search_mentions(ctx, &job).await.map(|_| ()),
        JobType::ProcessMentions => run_process_mentions(ctx, &job).await.map(|_| ()),
    };

    if let Err(e) = result {
        // Last line of defense against a job left running inside a
        // live process; the execution function normally transitions it.
        if let Err(fail_err) = ctx.jobs.fail(job.id).await {
            error!(job_id = %job.id, error = %fail_err, "could not mark job as failed");
        }
        return Err(e);
    }

    Ok(())
}
