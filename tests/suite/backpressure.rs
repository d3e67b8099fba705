//! Slow readers, cancellation and emitter caps.

use std::num::NonZeroUsize;
use std::time::Duration;

use keyrate_engine::{Pacer, PacerSettings, get};
use tokio::time::Instant;

use crate::common::{collect_timed, rate_ms, same_key_gaps, sorted};

const INTERVAL: Duration = Duration::from_millis(10);

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[tokio::test(start_paused = true)]
async fn stalled_reader_delays_rest_of_group_without_burst() {
    let pacer = Pacer::new(rate_ms(10), PacerSettings::default());
    let mut stream = pacer.get((1..=5).map(|i| ("k", i)));
    let start = Instant::now();

    let mut timed = Vec::new();
    let first = stream.recv().await.unwrap();
    timed.push((first, start.elapsed()));
    tokio::time::sleep(ms(50)).await;
    timed.extend(collect_timed(stream, start).await);

    // Value 2 was offered at 10ms but only taken at 50ms. Value 3 then waits
    // a full interval from there instead of catching up on the missed schedule.
    assert_eq!(
        timed,
        vec![(1, ms(0)), (2, ms(50)), (3, ms(60)), (4, ms(70)), (5, ms(80))]
    );
}

#[tokio::test(start_paused = true)]
async fn reader_returning_from_stall_sees_no_same_key_burst() {
    let mut stream = get((1..=4).map(|i| ("k", i)), &rate_ms(10));
    let start = Instant::now();

    let mut arrivals = vec![(stream.recv().await.unwrap(), start.elapsed())];
    tokio::time::sleep(ms(50)).await;
    arrivals.extend(collect_timed(stream, start).await);

    assert_eq!(arrivals.len(), 4);
    for pair in arrivals.windows(2) {
        let gap = pair[1].1 - pair[0].1;
        assert!(gap >= INTERVAL, "gap {gap:?} between {pair:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn stall_then_drain_keeps_every_key_paced() {
    let items: Vec<(char, (char, u32))> = ['a', 'b', 'c']
        .into_iter()
        .flat_map(|key| (0..4).map(move |i| (key, (key, i))))
        .collect();
    let mut stream = get(items, &rate_ms(10));
    let start = Instant::now();

    let mut timed = vec![(stream.recv().await.unwrap(), start.elapsed())];
    tokio::time::sleep(ms(35)).await;
    timed.extend(collect_timed(stream, start).await);

    assert_eq!(timed.len(), 12);
    let arrivals: Vec<(char, Duration)> = timed
        .iter()
        .map(|((key, _), at)| (*key, *at))
        .collect();
    let gaps = same_key_gaps(&arrivals);
    assert_eq!(gaps.len(), 9);
    for (key, gap) in gaps {
        assert!(gap >= INTERVAL, "key {key}: gap {gap:?} below interval");
    }
    // Each key still arrives in input order.
    for key in ['a', 'b', 'c'] {
        let order: Vec<u32> = timed
            .iter()
            .filter(|((k, _), _)| *k == key)
            .map(|((_, i), _)| *i)
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3], "key {key}");
    }
}

#[tokio::test(start_paused = true)]
async fn slow_reader_never_sees_same_key_values_closer_than_interval() {
    let items: Vec<(u8, u8)> = (0..12).map(|i| (i % 2, i)).collect();
    let mut stream = get(items, &rate_ms(10));
    let start = Instant::now();

    let mut arrivals = Vec::new();
    while let Some(value) = stream.recv().await {
        arrivals.push((value % 2, start.elapsed()));
        tokio::time::sleep(ms(7)).await;
    }

    assert_eq!(arrivals.len(), 12);
    for (key, gap) in same_key_gaps(&arrivals) {
        assert!(gap >= INTERVAL, "key {key}: gap {gap:?} below interval");
    }
}

#[tokio::test(start_paused = true)]
async fn dropping_stream_stops_all_emitters() {
    let pacer = Pacer::new(rate_ms(60_000), PacerSettings::default());
    let items: Vec<(u32, u32)> = (0..30).map(|i| (i % 3, i)).collect();
    let mut run = pacer.spawn(items);
    let start = Instant::now();

    for _ in 0..3 {
        assert!(run.stream.recv().await.is_some());
    }
    drop(run.stream);

    let summary = run.completion.wait().await.unwrap();
    assert_eq!(summary.groups, 3);
    assert_eq!(summary.abandoned, 3);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.emitted, 3);
    assert!(start.elapsed() < Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn emitter_cap_limits_concurrent_groups() {
    let two = NonZeroUsize::new(2).unwrap();
    let settings = PacerSettings::default().with_max_emitters(Some(two));
    let pacer = Pacer::new(rate_ms(10), settings);
    // Four keys, three values each: 20ms per group, two groups at a time.
    let items: Vec<(u8, u8)> = (0..12).map(|i| (i % 4, i)).collect();
    let start = Instant::now();

    let timed = collect_timed(pacer.get(items), start).await;

    assert_eq!(timed.len(), 12);
    let values: Vec<u8> = timed.iter().map(|(v, _)| *v).collect();
    assert_eq!(sorted(values), (0..12).collect::<Vec<_>>());
    assert_eq!(start.elapsed(), ms(40));
    let immediate = timed.iter().filter(|(_, at)| at.is_zero()).count();
    assert_eq!(immediate, 2);
}
