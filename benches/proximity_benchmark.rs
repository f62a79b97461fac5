use chrono::{NaiveDate, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use kindred_api::models::{Gender, Location, Preferences, User};
use kindred_api::services::search::{rank_candidates, SearchCriteria};
use std::hint::black_box;

fn user(i: usize, longitude: f64, latitude: f64) -> User {
    let now = Utc::now();
    User {
        id: format!("user-{:05}", i),
        email: format!("user{}@example.com", i),
        password_hash: String::new(),
        first_name: "Bench".to_string(),
        last_name: "User".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1970 + (i % 40) as i32, 1 + (i % 12) as u32, 1)
            .unwrap_or_default(),
        gender: if i % 2 == 0 { Gender::Female } else { Gender::Male },
        bio: String::new(),
        interests: vec![],
        photos: vec![],
        location: Location {
            longitude,
            latitude,
        },
        preferences: Preferences::default(),
        last_active: now,
        is_verified: false,
        refresh_token: None,
        created_at: now,
        updated_at: now,
    }
}

fn benchmark_rank_candidates(c: &mut Criterion) {
    let requester = user(0, -122.08, 37.39);

    // A 1°x1° grid around the requester, roughly what a 50 km band returns
    let candidates: Vec<User> = (1..=10_000)
        .map(|i| {
            let dx = ((i % 100) as f64 - 50.0) / 100.0;
            let dy = ((i / 100) as f64 - 50.0) / 100.0;
            user(i, -122.08 + dx, 37.39 + dy)
        })
        .collect();

    let now = Utc::now();
    let default_criteria = SearchCriteria::for_requester(&requester);
    let filtered_criteria = SearchCriteria {
        gender: Some(Gender::Female),
        min_age: Some(30),
        max_age: Some(45),
        max_distance_km: 10.0,
        ..SearchCriteria::for_requester(&requester)
    };

    let mut group = c.benchmark_group("rank_candidates");

    group.bench_function("default_radius_10k", |b| {
        b.iter(|| {
            rank_candidates(
                black_box(&requester),
                black_box(candidates.clone()),
                black_box(&default_criteria),
                now,
            )
        })
    });

    group.bench_function("filtered_10k", |b| {
        b.iter(|| {
            rank_candidates(
                black_box(&requester),
                black_box(candidates.clone()),
                black_box(&filtered_criteria),
                now,
            )
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_rank_candidates);
criterion_main!(benches);
