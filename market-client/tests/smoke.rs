use std::time::{SystemTime, UNIX_EPOCH};

use market_client::core::forms::{LoginForm, NoticeForm, RegisterForm};
use market_client::core::listing::{SortTab, sort_posts};
use market_client::{ClientConfig, MarketClient, MarketClientError};

fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock must be after unix epoch")
        .as_nanos();
    format!("{nanos}")
}

#[tokio::test]
#[ignore = "requires running marketplace backend"]
async fn http_smoke_flow() {
    let base_url = std::env::var("MARKET_API_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:8080/api".to_string());
    let mut client = MarketClient::new(ClientConfig::new(base_url)).expect("client must build");

    let suffix = unique_suffix();
    let email = format!("smoke_{suffix}@example.com");
    let password = "password123".to_string();

    let register = client
        .register(&RegisterForm {
            name: "Smoke".to_string(),
            surname: "Test".to_string(),
            phone: "+10000000000".to_string(),
            email: email.clone(),
            password: password.clone(),
        })
        .await
        .expect("register must succeed");
    assert!(!register.token.is_empty());
    assert!(client.session().is_logged_in());

    let login = client
        .login(&LoginForm {
            email: email.clone(),
            password,
        })
        .await
        .expect("login must succeed");
    assert!(!login.token.is_empty());

    let me = client.current_user().await.expect("current_user must succeed");
    assert_eq!(me.email, email);

    let categories = client.categories().await.expect("categories must load");

    let created = client
        .create_post(
            &NoticeForm {
                title: "smoke title".to_string(),
                caption: "smoke caption".to_string(),
                price: 42.0,
                currency: "USD".to_string(),
                category_id: categories.first().map(|c| c.id),
                tags: vec!["smoke".to_string()],
            },
            Vec::new(),
        )
        .await
        .expect("create_post must succeed");
    assert_eq!(created.title, "smoke title");

    let fetched = client
        .get_post(created.id)
        .await
        .expect("get_post must succeed");
    assert_eq!(fetched.id, created.id);

    let listed = client.list_posts().await.expect("list_posts must succeed");
    let sorted = sort_posts(&listed, SortTab::New);
    assert_eq!(sorted.len(), listed.len());
    assert!(listed.iter().any(|post| post.id == created.id));

    client
        .delete_post(created.id)
        .await
        .expect("delete_post must succeed");

    let after_delete = client.get_post(created.id).await;
    assert!(matches!(after_delete, Err(MarketClientError::NotFound)));

    client.logout();
    assert!(!client.session().is_logged_in());
}
