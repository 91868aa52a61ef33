use anyhow::{Context, Result};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::progress;

pub const DEFAULT_CONCURRENCY: usize = 8;

/// `job` を最大 `concurrency` 並列で実行し、入力順に結果を返す。
pub fn run_bounded<T, R, F>(concurrency: usize, message: &str, items: &[T], job: F) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    let pool = ThreadPoolBuilder::new()
        .num_threads(concurrency.max(1))
        .thread_name(|idx| format!("godep-scout-{idx}"))
        .build()
        .context("ワーカープールの初期化に失敗しました")?;

    let bar = progress::counter_bar(items.len(), message);
    let results = pool.install(|| {
        items
            .par_iter()
            .map(|item| {
                let result = job(item);
                bar.inc(1);
                result
            })
            .collect()
    });
    bar.finish_and_clear();
    Ok(results)
}
