use criterion::{black_box, criterion_group, criterion_main, Criterion};

use migration::MigratorTrait;
use models::db::{connect_with_config, sqlite_memory_config};
use service::auth::domain::{LoginInput, RegisterInput};
use service::auth::password::{hash_password, verify_and_maybe_upgrade};
use service::ledger::Amount;
use service::session::ClientInfo;
use service::{ServiceContext, ServiceSettings};

fn bench_password(c: &mut Criterion) {
    let argon = hash_password("Benchmark1").unwrap();
    c.bench_function("password_verify_argon2id", |b| {
        b.iter(|| verify_and_maybe_upgrade(black_box(&argon), black_box("Benchmark1")).unwrap());
    });
    c.bench_function("password_reject_plaintext", |b| {
        b.iter(|| verify_and_maybe_upgrade(black_box("legacy-secret"), black_box("guess")).unwrap());
    });
}

fn bench_amount_parse(c: &mut Criterion) {
    c.bench_function("amount_parse", |b| {
        b.iter(|| {
            for raw in ["100", "12.50", "1e3", "0.001", "abc"] {
                let _ = Amount::parse(black_box(raw));
            }
        });
    });
}

fn bench_login(c: &mut Criterion) {
    // build the database and user outside of the measured loop
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ctx = rt.block_on(async {
        let db = connect_with_config(&sqlite_memory_config()).await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let settings = ServiceSettings {
            idle_timeout: chrono::Duration::minutes(15),
            request_timeout: std::time::Duration::from_secs(10),
        };
        let ctx = ServiceContext::new(db, settings);
        ctx.auth
            .register(RegisterInput { username: "bench".into(), password: "Benchmark1".into() })
            .await
            .unwrap();
        ctx
    });

    c.bench_function("auth_login_session", |b| {
        b.iter(|| {
            let input = LoginInput {
                username: "bench".into(),
                password: "Benchmark1".into(),
                client: ClientInfo::unknown(),
            };
            rt.block_on(ctx.auth.login(input)).unwrap();
        });
    });
}

criterion_group!(benches, bench_password, bench_amount_parse, bench_login);
criterion_main!(benches);
