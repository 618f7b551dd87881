//! tests/persistence/postgres_users.rs
//! Every test runs in its own throwaway schema, dropped afterwards.

use std::str::FromStr;

use devtracker_api::database::{DatabaseService, DuplicateEmail, PgUserRepository, UserRepository};
use devtracker_api::models::user::{DeveloperType, NewUser, SubscriptionPlan, PROVIDER_GITHUB};
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Executor, PgPool};

macro_rules! skip_if_no_db {
    () => {
        match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("Skipping test: DATABASE_URL not set");
                return;
            }
        }
    };
}

struct TestSchema {
    admin: PgPool,
    pool: PgPool,
    name: String,
}

impl TestSchema {
    async fn create(url: &str) -> Self {
        let name = format!("devtracker_test_{}", uuid::Uuid::new_v4().simple());
        let admin = PgPool::connect(url).await.expect("Failed to connect to DATABASE_URL");
        admin
            .execute(format!("CREATE SCHEMA {name}").as_str())
            .await
            .expect("Failed to create test schema");

        let options = PgConnectOptions::from_str(url)
            .expect("Invalid DATABASE_URL")
            .options([("search_path", name.as_str())]);
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .expect("Failed to connect to test schema");
        DatabaseService::apply_schema(&pool).await.expect("Schema script failed");

        Self { admin, pool, name }
    }

    fn repository(&self) -> PgUserRepository {
        PgUserRepository::new(self.pool.clone())
    }

    async fn teardown(self) {
        self.pool.close().await;
        self.admin
            .execute(format!("DROP SCHEMA {} CASCADE", self.name).as_str())
            .await
            .expect("Failed to drop test schema");
    }
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        email: email.into(),
        password: Some("$2b$04$hash".into()),
        nickname: "dev".into(),
        developer_type: Some(DeveloperType::Backend),
        provider: "local".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn create_fills_defaults_and_generated_columns() {
    let url = skip_if_no_db!();
    let schema = TestSchema::create(&url).await;
    let repo = schema.repository();

    let mut draft = new_user("a@example.com");
    draft.hourly_rate = Some(Decimal::new(123_456, 3));
    let user = repo.create(draft).await.unwrap();

    assert!(user.id > 0);
    assert_eq!(user.subscription_plan, SubscriptionPlan::Free);
    assert_eq!(user.timezone, "Asia/Seoul");
    assert_eq!(user.preferred_currency, "KRW");
    assert_eq!(user.hourly_rate, Decimal::new(12_346, 2));
    assert!(!user.email_verified);
    assert_eq!(user.created_at, user.updated_at);

    let loaded = repo.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(loaded.email, "a@example.com");
    assert_eq!(loaded.developer_type, DeveloperType::Backend);
    assert_eq!(loaded.hourly_rate, user.hourly_rate);

    schema.teardown().await;
}

#[tokio::test]
async fn lookups_and_counts() {
    let url = skip_if_no_db!();
    let schema = TestSchema::create(&url).await;
    let repo = schema.repository();

    let mut github = new_user("gh@example.com");
    github.provider = PROVIDER_GITHUB.into();
    github.provider_id = Some("4242".into());
    github.github_username = Some("octocat".into());
    github.email_verified = true;
    repo.create(github).await.unwrap();

    let mut mobile = new_user("m@example.com");
    mobile.developer_type = Some(DeveloperType::Mobile);
    repo.create(mobile).await.unwrap();

    assert!(repo.exists_by_email("gh@example.com").await.unwrap());
    assert!(!repo.exists_by_email("nobody@example.com").await.unwrap());
    assert!(repo.exists_by_github_username("octocat").await.unwrap());
    assert_eq!(
        repo.find_by_github_username("octocat").await.unwrap().unwrap().email,
        "gh@example.com"
    );
    assert!(repo
        .find_by_provider_and_provider_id(PROVIDER_GITHUB, "4242")
        .await
        .unwrap()
        .is_some());
    assert!(repo.find_by_email_and_verified("gh@example.com").await.unwrap().is_some());
    assert!(repo.find_by_email_and_verified("m@example.com").await.unwrap().is_none());
    assert_eq!(repo.count_by_developer_type(DeveloperType::Mobile).await.unwrap(), 1);
    assert_eq!(repo.count_by_developer_type(DeveloperType::Frontend).await.unwrap(), 0);
    repo.ping().await.unwrap();

    schema.teardown().await;
}

#[tokio::test]
async fn update_writes_columns_and_bumps_updated_at() {
    let url = skip_if_no_db!();
    let schema = TestSchema::create(&url).await;
    let repo = schema.repository();

    let mut user = repo.create(new_user("a@example.com")).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    user.nickname = "renamed".into();
    user.hourly_rate = Decimal::new(9_999_999_999, 2);
    user.developer_type = DeveloperType::Fullstack;
    let updated = repo.update(&user).await.unwrap();

    assert_eq!(updated.nickname, "renamed");
    assert_eq!(updated.developer_type, DeveloperType::Fullstack);
    assert_eq!(updated.hourly_rate, Decimal::new(9_999_999_999, 2));
    assert_eq!(updated.created_at, user.created_at);
    assert!(updated.updated_at > user.updated_at);

    user.id = 999_999;
    assert!(repo.update(&user).await.is_err());

    schema.teardown().await;
}

#[tokio::test]
async fn unique_email_violation_is_reported_as_duplicate() {
    let url = skip_if_no_db!();
    let schema = TestSchema::create(&url).await;
    let repo = schema.repository();

    repo.create(new_user("a@example.com")).await.unwrap();
    let err = repo.create(new_user("a@example.com")).await.unwrap_err();
    assert!(err.is::<DuplicateEmail>());

    let mut second = repo.create(new_user("b@example.com")).await.unwrap();
    second.email = "a@example.com".into();
    let err = repo.update(&second).await.unwrap_err();
    assert!(err.is::<DuplicateEmail>());

    schema.teardown().await;
}
