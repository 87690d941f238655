use rest_deployer::mock::{InMemoryCatalog, InMemoryContainer, MockTransport, RecordingListenerFactory};
use rest_deployer::model::{ApplicationRecord, WebModuleRecord};
use rest_deployer::tracker::AppState;
use rest_deployer::{Collaborators, RestService, RestServiceConfig};
use std::sync::Arc;

fn collaborators(transport: Arc<MockTransport>) -> Collaborators {
    Collaborators {
        container: Arc::new(
            InMemoryContainer::new()
                .with_web_module("shop-web", "shop-loader")
                .with_web_module("blog-web", "blog-loader"),
        ),
        catalog: Arc::new(
            InMemoryCatalog::new()
                .with_class("shop.Widgets", Some("widgets"))
                .with_class("blog.Posts", Some("posts")),
        ),
        transport,
        listeners: Arc::new(RecordingListenerFactory::new()),
    }
}

fn shop() -> ApplicationRecord {
    ApplicationRecord::new("shop")
        .with_web_module(WebModuleRecord::new("shop-web", "/app").with_class("shop.Widgets"))
}

fn blog() -> ApplicationRecord {
    ApplicationRecord::new("blog")
        .with_web_module(WebModuleRecord::new("blog-web", "/blog").with_class("blog.Posts"))
}

/// Notifications racing from several tasks still deploy the application once.
#[tokio::test]
async fn test_concurrent_duplicate_notifications_deploy_once() {
    let transport = Arc::new(MockTransport::new(["http://host:8080"]));
    let service = RestService::start(
        collaborators(transport.clone()),
        RestServiceConfig::default(),
        Vec::new(),
    )
    .await;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let client = service.client.clone();
        tasks.push(tokio::spawn(async move { client.application_created(shop()).await }));
    }

    let mut fresh = 0;
    for task in tasks {
        let report = task.await.unwrap().unwrap();
        if !report.already_deployed {
            fresh += 1;
        }
    }

    assert_eq!(fresh, 1);
    assert_eq!(
        service.client.bound_addresses().await.unwrap(),
        vec!["http://host:8080/app/widgets/.*".to_string()]
    );
    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_start_replays_and_stop_undeploys_everything() {
    let transport = Arc::new(MockTransport::new(["http://host:8080"]));
    let service = RestService::start(
        collaborators(transport.clone()),
        RestServiceConfig::default(),
        vec![shop(), blog()],
    )
    .await;

    assert_eq!(service.client.active_services().await.unwrap().len(), 2);
    assert_eq!(
        service.client.application_state("blog").await.unwrap(),
        Some(AppState::Deployed)
    );

    let reports = service.stop().await.unwrap();

    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|report| report.removed.len() == 1));
    assert!(transport.bound_patterns().is_empty());
}

#[tokio::test]
async fn test_deploy_undeploy_round_trip_through_client() {
    let transport = Arc::new(MockTransport::new(["http://host:8080"]));
    let service = RestService::start(
        collaborators(transport.clone()),
        RestServiceConfig::default(),
        Vec::new(),
    )
    .await;

    service.client.application_created(shop()).await.unwrap();
    let report = service.client.application_destroyed(shop()).await.unwrap();
    assert_eq!(report.removed, vec!["http://host:8080/app/widgets/.*".to_string()]);

    let again = service.client.application_destroyed(shop()).await.unwrap();
    assert!(again.not_deployed);

    let reports = service.stop().await.unwrap();
    assert!(reports.is_empty());
}
