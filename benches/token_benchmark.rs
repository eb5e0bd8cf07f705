use chrono::Duration;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use tokengate::services::{PasswordHasher, TokenAuthority};

fn benchmark_tokens(c: &mut Criterion) {
    let authority = TokenAuthority::new(
        b"benchmark_signing_key_32_bytes!!",
        Duration::hours(24),
        Duration::hours(168),
    );
    let tokens = authority
        .create_tokens("alice")
        .expect("Failed to mint tokens");

    let mut group = c.benchmark_group("tokens");

    group.bench_function("create_pair", |b| {
        b.iter(|| authority.create_tokens(black_box("alice")))
    });

    group.bench_function("validate_access", |b| {
        b.iter(|| authority.validate(black_box(&tokens.access_token)))
    });

    group.bench_function("rotate_refresh", |b| {
        b.iter(|| authority.validate_and_rotate(black_box(&tokens.refresh_token)))
    });

    group.finish();
}

fn benchmark_password(c: &mut Criterion) {
    // Production default cost; each iteration is tens of milliseconds.
    let hasher = PasswordHasher::new(8);
    let digest = hasher.hash("correct horse").expect("Failed to hash");

    let mut group = c.benchmark_group("password");
    group.sample_size(10);

    group.bench_function("verify_cost_8", |b| {
        b.iter(|| hasher.verify(black_box(&digest), black_box("correct horse")))
    });

    group.finish();
}

criterion_group!(benches, benchmark_tokens, benchmark_password);
criterion_main!(benches);
