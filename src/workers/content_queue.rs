use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, error, info};

use crate::db::operations::content::{
    cache_key, fetch_queued, get_cache_entry, insert_content_item, mark_request_status,
    upsert_cache_entry, ContentRequest,
};
use crate::db::DatabaseProxy;
use crate::services::content_provider::{select_provider, ContentProvider, GenerationJob};

const BATCH_SIZE: i64 = 5;
const CACHE_TTL_SECONDS: i64 = 604_800;

#[derive(Debug, Default)]
struct QueueStats {
    jobs_fetched: i64,
    served_from_cache: i64,
    generated: i64,
    failed: i64,
    duration_secs: f64,
}

/// Drains up to [`BATCH_SIZE`] queued content requests in FIFO order. A
/// failing job is marked `failed` and the loop continues; anything left
/// queued is picked up by the next invocation.
pub async fn drain_content_queue(
    db: Arc<DatabaseProxy>,
    provider: Arc<ContentProvider>,
) -> Result<(), super::WorkerError> {
    let start = Instant::now();

    let pool = db.pool();
    let jobs = fetch_queued(pool, BATCH_SIZE).await?;

    if jobs.is_empty() {
        debug!("Content queue empty, nothing to do");
        return Ok(());
    }

    let mut stats = QueueStats {
        jobs_fetched: jobs.len() as i64,
        ..Default::default()
    };

    info!(jobs = jobs.len(), "Draining content queue");

    // Per-record isolation: no job outcome, including a status-write failure,
    // may abort the rest of the batch.
    for job in &jobs {
        match process_job(pool, &provider, job, &mut stats).await {
            Ok(()) => {
                if let Err(e) = mark_request_status(pool, &job.id, "ready").await {
                    stats.failed += 1;
                    error!(request_id = %job.id, error = %e, "Failed to mark request ready");
                }
            }
            Err(e) => {
                stats.failed += 1;
                error!(request_id = %job.id, skill = %job.skill, error = %e, "Content job failed");
                if let Err(mark_err) = mark_request_status(pool, &job.id, "failed").await {
                    error!(request_id = %job.id, error = %mark_err, "Failed to mark request failed");
                }
            }
        }
    }

    stats.duration_secs = start.elapsed().as_secs_f64();

    info!(
        jobs_fetched = stats.jobs_fetched,
        served_from_cache = stats.served_from_cache,
        generated = stats.generated,
        failed = stats.failed,
        duration_secs = format!("{:.2}", stats.duration_secs),
        "Content queue drain completed"
    );

    Ok(())
}

async fn process_job(
    pool: &PgPool,
    provider: &ContentProvider,
    job: &ContentRequest,
    stats: &mut QueueStats,
) -> Result<(), super::WorkerError> {
    let key = cache_key(
        &job.grade,
        &job.subject,
        &job.skill,
        &job.difficulty,
        &job.request_type,
        &job.language,
    );

    // TTL is enforced on read: a stale hit falls through to regeneration.
    if let Some(entry) = get_cache_entry(pool, &key).await? {
        if entry.is_fresh(Utc::now()) {
            insert_content_item(pool, job, &entry.content, "cache", true).await?;
            stats.served_from_cache += 1;
            debug!(request_id = %job.id, cache_key = %key, "Content served from cache");
            return Ok(());
        }
        debug!(cache_key = %key, "Cache entry expired, regenerating");
    }

    let selected = select_provider(&job.request_type, job.preferred_provider.as_deref());
    let generation_job = GenerationJob {
        request_type: &job.request_type,
        grade: &job.grade,
        subject: &job.subject,
        skill: &job.skill,
        difficulty: &job.difficulty,
        language: &job.language,
        prompt: job.prompt.as_deref(),
    };

    let payload = provider.generate(selected, &generation_job).await?;

    insert_content_item(pool, job, &payload, selected.as_str(), false).await?;
    upsert_cache_entry(pool, &key, &payload, selected.as_str(), CACHE_TTL_SECONDS).await?;
    stats.generated += 1;

    debug!(
        request_id = %job.id,
        provider = selected.as_str(),
        cache_key = %key,
        "Content generated"
    );

    Ok(())
}
