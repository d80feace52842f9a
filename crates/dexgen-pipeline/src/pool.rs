use futures::future::join_all;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Runs `worker` over `items` with at most `concurrency` calls in flight.
///
/// Each runner claims the next index from a shared counter and writes its
/// result into the slot for that index, so the output keeps input order and
/// runners never contend on the same slot.
pub async fn map_with_concurrency<T, R, F, Fut>(
    items: &[T],
    concurrency: usize,
    worker: F,
) -> Vec<R>
where
    T: Clone,
    F: Fn(T, usize) -> Fut,
    Fut: Future<Output = R>,
{
    let slots: Vec<Mutex<Option<R>>> = items.iter().map(|_| Mutex::new(None)).collect();
    let next = AtomicUsize::new(0);
    let runners = concurrency.max(1).min(items.len());

    let slots_ref = &slots;
    let next_ref = &next;
    let worker_ref = &worker;

    join_all((0..runners).map(move |_| async move {
        loop {
            let index = next_ref.fetch_add(1, Ordering::Relaxed);
            if index >= items.len() {
                break;
            }
            let result = worker_ref(items[index].clone(), index).await;
            *slots_ref[index].lock() = Some(result);
        }
    }))
    .await;

    slots
        .into_iter()
        .filter_map(|slot| slot.into_inner())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test]
    async fn test_preserves_input_order() {
        let items: Vec<u64> = (0..20).collect();
        let out = map_with_concurrency(&items, 4, |n, _| async move {
            // Later items finish first.
            tokio::time::sleep(Duration::from_millis(20 - n)).await;
            n * 10
        })
        .await;
        assert_eq!(out, (0..20).map(|n| n * 10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_never_exceeds_concurrency() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let items: Vec<usize> = (0..30).collect();

        let in_flight_ref = &in_flight;
        let peak_ref = &peak;

        let out = map_with_concurrency(&items, 3, move |n, index| async move {
            let now = in_flight_ref.fetch_add(1, Ordering::SeqCst) + 1;
            peak_ref.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            in_flight_ref.fetch_sub(1, Ordering::SeqCst);
            assert_eq!(n, index);
            n
        })
        .await;

        assert_eq!(out.len(), 30);
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let out: Vec<u8> = map_with_concurrency(&Vec::<u8>::new(), 6, |n, _| async move { n }).await;
        assert!(out.is_empty());
    }
}
