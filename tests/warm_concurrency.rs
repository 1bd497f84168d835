use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use slidedeck::slides::{PageImageCache, RenderSize, WarmPool, WarmResponse};
use slidedeck::test_utils::FakeDeck;

const WAIT: Duration = Duration::from_secs(10);

#[test]
fn concurrent_gets_share_one_entry() {
    let deck = Arc::new(FakeDeck::new(4).with_delay(Duration::from_millis(5)));
    let cache = Arc::new(PageImageCache::new(deck.clone(), RenderSize::new(160, 90)));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache.get(2).unwrap()
            })
        })
        .collect();
    let pages: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Racing readers may each render, but all of them get the stored entry
    let stored = cache.get(2).unwrap();
    for page in &pages {
        assert!(Arc::ptr_eq(page, &stored));
    }
    assert_eq!(cache.len(), 1);
    assert!(deck.render_count(2) >= 1);
}

#[test]
fn entries_always_match_current_size_under_resize_churn() {
    let deck = Arc::new(FakeDeck::new(6).with_delay(Duration::from_millis(1)));
    let cache = Arc::new(PageImageCache::new(deck, RenderSize::new(160, 90)));
    let mut pool = WarmPool::new(3);

    let readers: Vec<_> = (0..3)
        .map(|n| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..40 {
                    let page = cache.get((n + i) % 6).unwrap();
                    assert_eq!(page.page, (n + i) % 6);
                }
            })
        })
        .collect();

    let sizes = [RenderSize::new(320, 180), RenderSize::new(64, 36)];
    for round in 0..20 {
        pool.schedule(&cache, (0..6).collect());
        cache.set_render_size(sizes[round % 2]);
    }
    for reader in readers {
        reader.join().unwrap();
    }

    // Drain every batch so no worker is still storing
    for _ in 0..20 {
        let WarmResponse::Finished { .. } = pool.response_receiver().recv_timeout(WAIT).unwrap();
    }

    let current = cache.render_size();
    for page in cache.cached_pages() {
        assert_eq!(cache.get(page).unwrap().render_size, current);
    }
}

#[test]
fn warm_then_get_is_a_hit() {
    let deck = Arc::new(FakeDeck::new(5));
    let cache = Arc::new(PageImageCache::new(deck.clone(), RenderSize::new(160, 90)));
    let mut pool = WarmPool::new(2);

    pool.schedule(&cache, vec![3, 4, 2]);
    pool.response_receiver().recv_timeout(WAIT).unwrap();

    for page in [2, 3, 4] {
        cache.get(page).unwrap();
        assert_eq!(deck.render_count(page), 1);
    }
}
