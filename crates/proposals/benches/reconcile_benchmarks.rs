use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use autoproposal_core::{Amount, ProposalId, ProposalItemId};
use autoproposal_proposals::{plan, ProposalItem, SubmittedItem};

fn existing_items(proposal_id: ProposalId, n: usize) -> Vec<ProposalItem> {
    (0..n)
        .map(|i| ProposalItem {
            id: ProposalItemId::new(),
            proposal_id,
            name: format!("line {i}"),
            description: None,
            unit: Some("sqft".to_string()),
            quantity: Amount::new(i as f64, "quantity").unwrap(),
            unit_price: Amount::new(12.5, "unit_price").unwrap(),
        })
        .collect()
}

/// Half the rows are edited, a quarter dropped, and as many new rows added.
fn typical_edit(existing: &[ProposalItem]) -> Vec<SubmittedItem> {
    let mut out: Vec<SubmittedItem> = existing
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 4 != 3)
        .map(|(i, item)| {
            let s = SubmittedItem::from(item);
            if i % 2 == 0 {
                SubmittedItem {
                    quantity: Some((item.quantity.value() + 1.0).into()),
                    ..s
                }
            } else {
                s
            }
        })
        .collect();
    out.extend((0..existing.len() / 4).map(|i| SubmittedItem::new(format!("new {i}"), 1.0, 99.0)));
    out
}

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_plan");

    for size in [10usize, 100, 1_000].iter() {
        let proposal_id = ProposalId::new();
        let existing = existing_items(proposal_id, *size);
        let submitted = typical_edit(&existing);

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("typical_edit", size), size, |b, _| {
            b.iter(|| {
                let p = plan(
                    black_box(proposal_id),
                    black_box(&existing),
                    black_box(&submitted),
                    ProposalItemId::new,
                );
                black_box(p.apply_to(&existing))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_plan);
criterion_main!(benches);
