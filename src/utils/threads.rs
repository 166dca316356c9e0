use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// 并发执行一组future，同时运行的数量不超过 `max_concurrent`。
/// 返回结果的顺序与输入顺序一致，与完成先后无关。
pub async fn do_parallel_with_limit<F, T>(futures: Vec<F>, max_concurrent: usize) -> Vec<T>
where
    F: Future<Output = T>,
{
    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));

    let guarded = futures.into_iter().map(|future| {
        let semaphore = semaphore.clone();
        async move {
            // 信号量不会被关闭，acquire只会在关闭时失败
            let _permit = semaphore.acquire().await.ok();
            future.await
        }
    });

    join_all(guarded).await
}

#[cfg(test)]
mod tests {
    use super::do_parallel_with_limit;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let futures: Vec<_> = (0..5u64)
            .map(|i| async move {
                // 越靠前的任务越晚完成
                tokio::time::sleep(Duration::from_millis(50 - i * 10)).await;
                i
            })
            .collect();

        let results = do_parallel_with_limit(futures, 5).await;
        assert_eq!(results, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let futures: Vec<_> = (0..8)
            .map(|_| {
                let running = running.clone();
                let peak = peak.clone();
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .collect();

        do_parallel_with_limit(futures, 2).await;
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_zero_limit_still_runs() {
        let futures: Vec<_> = (0..3).map(|i| async move { i * 2 }).collect();
        assert_eq!(do_parallel_with_limit(futures, 0).await, vec![0, 2, 4]);
    }
}
