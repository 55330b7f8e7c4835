//! Diff Performance Benchmarks
//!
//! Measures attribute diffing and object serialization for groups with
//! growing member lists, the case that dominates modify cost in practice.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use ldap_provider::client::diff::{diff_attributes, plan_rename};
use ldap_provider::objects::{DirectoryObject, Group, GroupCategory, GroupScope};

const GROUPS: &str = "ou=groups,dc=example,dc=com";

fn group_with_members(count: usize) -> Group {
    let mut group = Group::new("engineering", GROUPS);
    group.description = "Engineering".to_string();
    group.group_category = Some(GroupCategory::Security);
    group.group_scope = Some(GroupScope::Universal);
    group.members = (0..count)
        .map(|i| format!("cn=user{i},ou=people,dc=example,dc=com"))
        .collect();
    group
}

fn bench_diff(c: &mut Criterion) {
    let mut bench_group = c.benchmark_group("diff_attributes");
    for count in [10, 100, 1_000, 10_000] {
        let old = group_with_members(count).to_attributes();
        let unchanged = old.clone();
        let mut changed_group = group_with_members(count);
        changed_group.members.push("cn=new,ou=people,dc=example,dc=com".to_string());
        changed_group.description = "Engineering and Ops".to_string();
        let changed = changed_group.to_attributes();

        bench_group.throughput(Throughput::Elements(count as u64));
        bench_group.bench_with_input(BenchmarkId::new("unchanged", count), &count, |b, _| {
            b.iter(|| diff_attributes(black_box(&old), black_box(&unchanged)))
        });
        bench_group.bench_with_input(BenchmarkId::new("changed", count), &count, |b, _| {
            b.iter(|| diff_attributes(black_box(&old), black_box(&changed)))
        });
    }
    bench_group.finish();
}

fn bench_to_attributes(c: &mut Criterion) {
    let mut bench_group = c.benchmark_group("to_attributes");
    for count in [10, 1_000] {
        let group = group_with_members(count);
        bench_group.bench_with_input(BenchmarkId::new("group", count), &group, |b, group| {
            b.iter(|| black_box(group).to_attributes())
        });
    }
    bench_group.finish();
}

fn bench_plan_rename(c: &mut Criterion) {
    let old = group_with_members(10);
    let mut new = old.clone();
    new.set_common_name("platform");
    new.set_path("ou=teams,dc=example,dc=com");

    c.bench_function("plan_rename", |b| {
        b.iter(|| plan_rename(black_box(&old), black_box(&new)))
    });
}

criterion_group!(benches, bench_diff, bench_to_attributes, bench_plan_rename);
criterion_main!(benches);
