use std::collections::HashMap;
use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use rift_ingest::classifier::classify;
use rift_ingest::model::{MatchId, Puuid, ReconciliationGap};
use rift_ingest::reconciler::{WindowSearch, recover_window};
use rift_ingest::resolver::{MatchHistorySource, RecentMatches};

struct SyntheticHistory {
    lists: HashMap<Puuid, Vec<MatchId>>,
}

impl MatchHistorySource for SyntheticHistory {
    fn recent_matches(&self, puuid: &Puuid, count: usize, skip: usize) -> Vec<MatchId> {
        self.lists
            .get(puuid)
            .map(|list| list.iter().skip(skip).take(count).cloned().collect())
            .unwrap_or_default()
    }
}

/// `players` lists of ten matches, overlapping with the neighbouring player.
fn synthetic_recent(players: usize) -> RecentMatches {
    (0..players)
        .map(|p| {
            let list = (0..10)
                .map(|m| MatchId::new(format!("EUW1_{}", p * 5 + m)))
                .collect();
            (Puuid::new(format!("player-{p}")), list)
        })
        .collect()
}

fn bench_classify(c: &mut Criterion) {
    let recent = synthetic_recent(2_000);
    c.bench_function("classify_2000_players", |b| {
        b.iter(|| {
            let classification = classify(black_box(&recent), 5);
            black_box(classification.potential_t0.len());
        })
    });
}

fn bench_recover_window(c: &mut Criterion) {
    let puuid = Puuid::from("deep-history");
    let list: Vec<MatchId> = (0..1_000)
        .map(|m| MatchId::new(format!("EUW1_{m}")))
        .collect();
    let history = SyntheticHistory {
        lists: HashMap::from([(puuid.clone(), list)]),
    };
    let gap = ReconciliationGap::new(MatchId::from("EUW1_900"), puuid);
    let search = WindowSearch {
        page_size: 20,
        historical_memory: 5,
        max_pages: 100,
    };
    c.bench_function("recover_window_deep_target", |b| {
        b.iter(|| {
            let window = recover_window(&history, black_box(&gap), &search);
            black_box(window.matches.len());
        })
    });
}

criterion_group!(benches, bench_classify, bench_recover_window);
criterion_main!(benches);
