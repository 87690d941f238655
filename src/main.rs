use rest_deployer::mock::{InMemoryCatalog, InMemoryContainer, MockTransport, RecordingListenerFactory};
use rest_deployer::model::{
    ApplicationRecord, BeanContext, ClassLoaderRef, EnterpriseBeanRecord, ResourceClass,
    WebModuleRecord,
};
use rest_deployer::{setup_tracing, Collaborators, RestService, RestServiceConfig};
use std::sync::Arc;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = RestServiceConfig::from_env().map_err(|e| e.to_string())?;
    info!(?config, "Starting REST deployer demo");

    let container = InMemoryContainer::new()
        .with_web_module("shop-web", "shop-loader")
        .with_bean(
            "OrdersBean",
            BeanContext {
                bean_class: ResourceClass::new("shop.Orders", Some("orders")),
                class_loader: ClassLoaderRef::from("shop-ejb"),
            },
        );
    let catalog = InMemoryCatalog::new()
        .with_class("shop.Widgets", Some("widgets"))
        .with_class("shop.Health", None);
    let listeners = RecordingListenerFactory::new();

    let collaborators = Collaborators {
        container: Arc::new(container),
        catalog: Arc::new(catalog),
        transport: Arc::new(MockTransport::new(["http://localhost:8080"])),
        listeners: Arc::new(listeners.clone()),
    };

    let shop = ApplicationRecord::new("shop")
        .with_web_module(
            WebModuleRecord::new("shop-web", "/shop")
                .with_class("shop.Widgets")
                .with_class("shop.Health")
                .with_class("shop.Orders")
                .with_bean_service("shop.Orders"),
        )
        .with_bean(EnterpriseBeanRecord::rest("OrdersBean", "shop.Orders"));

    let service = RestService::start(collaborators, config, Vec::new()).await;

    let span = tracing::info_span!("deploy");
    let deployed = async { service.client.application_created(shop.clone()).await }
        .instrument(span)
        .await;
    match deployed {
        Ok(report) => {
            for binding in &report.deployed {
                info!(kind = %binding.kind, class = %binding.class_name, address = %binding.full_address, "Published");
            }
        }
        Err(e) => error!(error = %e, "Deployment failed"),
    }

    let undeployed = service
        .client
        .application_destroyed(shop)
        .await
        .map_err(|e| e.to_string())?;
    info!(removed = undeployed.removed.len(), "Shop undeployed");

    service.stop().await.map_err(|e| e.to_string())?;
    info!(events = listeners.events().len(), "Demo completed successfully");
    Ok(())
}
