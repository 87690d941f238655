//! # Endpoint Resolution
//!
//! Decides which targets a web module exposes and under which prefix.
//!
//! - Without resource-application descriptors, every scanned class is
//!   deployed at the module's context root.
//! - With descriptors, the scanned classes are ignored: each descriptor's
//!   singletons and classes are deployed under the context root extended by
//!   the descriptor's path override.
//! - Either way, a class that is also a REST bean is deployed as that bean and
//!   never loaded or instantiated here.
//!
//! Targets are emitted in the order of the source collections.

use crate::container::ClassCatalog;
use crate::error::{DeployError, DeployResult};
use crate::model::{
    BeanRegistration, ClassLoaderRef, EndpointTarget, ResolvedEndpoint, WebModuleRecord,
};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

/// REST beans of an application, keyed by implementation class name, in
/// declaration order.
pub type RestBeans = IndexMap<String, Arc<BeanRegistration>>;

pub struct EndpointResolver<'a> {
    catalog: &'a dyn ClassCatalog,
}

impl<'a> EndpointResolver<'a> {
    pub fn new(catalog: &'a dyn ClassCatalog) -> Self {
        Self { catalog }
    }

    /// Resolves every target of `module`.
    ///
    /// Fails with [`DeployError::ClassResolution`] on the first scanned class
    /// that cannot be loaded and [`DeployError::DescriptorInstantiation`] on
    /// the first descriptor that cannot be built.
    pub fn resolve(
        &self,
        module: &WebModuleRecord,
        loader: &ClassLoaderRef,
        beans: &RestBeans,
    ) -> DeployResult<Vec<ResolvedEndpoint>> {
        let mut endpoints = Vec::new();
        if module.rest_applications.is_empty() {
            self.resolve_scanned(module, loader, beans, &mut endpoints)?;
        } else {
            debug!(
                module = %module.module_id,
                ignored = module.rest_classes.len(),
                "Descriptors present, scanned classes ignored"
            );
            for descriptor in &module.rest_applications {
                self.resolve_descriptor(descriptor, module, loader, beans, &mut endpoints)?;
            }
        }
        Ok(endpoints)
    }

    fn resolve_scanned(
        &self,
        module: &WebModuleRecord,
        loader: &ClassLoaderRef,
        beans: &RestBeans,
        endpoints: &mut Vec<ResolvedEndpoint>,
    ) -> DeployResult<()> {
        let prefix = Some(module.context_root.clone());
        for name in &module.rest_classes {
            let target = match beans.get(name) {
                Some(bean) => {
                    debug!(class = %name, "Scanned class is a REST bean");
                    EndpointTarget::Bean(bean.clone())
                }
                None => {
                    let class = self.catalog.load_class(name, loader).map_err(|reason| {
                        DeployError::ClassResolution {
                            class: name.clone(),
                            reason,
                        }
                    })?;
                    EndpointTarget::Class {
                        class,
                        descriptor: None,
                    }
                }
            };
            endpoints.push(ResolvedEndpoint::new(target, prefix.clone()));
        }
        Ok(())
    }

    fn resolve_descriptor(
        &self,
        name: &str,
        module: &WebModuleRecord,
        loader: &ClassLoaderRef,
        beans: &RestBeans,
        endpoints: &mut Vec<ResolvedEndpoint>,
    ) -> DeployResult<()> {
        let descriptor = self
            .catalog
            .instantiate_application(name, loader)
            .map_err(|reason| DeployError::DescriptorInstantiation {
                class: name.to_string(),
                reason,
            })?;
        let descriptor = Arc::new(descriptor);
        let prefix = Some(effective_prefix(
            &module.context_root,
            descriptor.path.as_deref(),
        ));
        debug!(descriptor = name, prefix = ?prefix, "Resolving descriptor");

        for instance in &descriptor.singletons {
            let target = match beans.get(&instance.class.name) {
                Some(bean) => EndpointTarget::Bean(bean.clone()),
                None => EndpointTarget::Singleton {
                    instance: instance.clone(),
                    descriptor: descriptor.clone(),
                },
            };
            endpoints.push(ResolvedEndpoint::new(target, prefix.clone()));
        }

        for class in &descriptor.classes {
            let target = match beans.get(&class.name) {
                Some(bean) => EndpointTarget::Bean(bean.clone()),
                None => EndpointTarget::Class {
                    class: class.clone(),
                    descriptor: Some(descriptor.clone()),
                },
            };
            endpoints.push(ResolvedEndpoint::new(target, prefix.clone()));
        }
        Ok(())
    }
}

/// The context root, ending with `/`, followed by the descriptor's path
/// override without its leading `/`.
pub fn effective_prefix(context_root: &str, path_override: Option<&str>) -> String {
    let mut prefix = context_root.to_string();
    if !prefix.ends_with('/') {
        prefix.push('/');
    }
    if let Some(path) = path_override {
        prefix.push_str(path.strip_prefix('/').unwrap_or(path));
    }
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::InMemoryCatalog;
    use crate::model::{
        ResourceApplicationDescriptor, ResourceClass, SingletonInstance, TargetKind,
    };

    fn loader() -> ClassLoaderRef {
        ClassLoaderRef::from("shop-web")
    }

    fn bean(class: &str) -> (String, Arc<BeanRegistration>) {
        let registration = BeanRegistration {
            deployment_id: format!("{class}Bean"),
            bean_class: ResourceClass::new(class, Some("/beans")),
            class_loader: ClassLoaderRef::from("shop-ejb"),
            context_root: Some("/app".into()),
        };
        (class.to_string(), Arc::new(registration))
    }

    fn summary(endpoints: &[ResolvedEndpoint]) -> Vec<(TargetKind, String, Option<String>)> {
        endpoints
            .iter()
            .map(|e| {
                (
                    e.target.kind(),
                    e.target.resource_class().name.clone(),
                    e.context_prefix.clone(),
                )
            })
            .collect()
    }

    #[test]
    fn test_scanned_classes_deploy_at_context_root() {
        let catalog = InMemoryCatalog::new()
            .with_class("shop.Widgets", Some("/widgets"))
            .with_class("shop.Gadgets", Some("/gadgets"));
        let module = WebModuleRecord::new("shop-web", "/app")
            .with_class("shop.Widgets")
            .with_class("shop.Gadgets");

        let endpoints = EndpointResolver::new(&catalog)
            .resolve(&module, &loader(), &RestBeans::new())
            .unwrap();

        assert_eq!(
            summary(&endpoints),
            vec![
                (TargetKind::Class, "shop.Widgets".into(), Some("/app".into())),
                (TargetKind::Class, "shop.Gadgets".into(), Some("/app".into())),
            ]
        );
    }

    #[test]
    fn test_bean_wins_over_scanned_class() {
        let catalog = InMemoryCatalog::new().with_class("shop.Orders", Some("/orders"));
        let module = WebModuleRecord::new("shop-web", "/app").with_class("shop.Orders");
        let beans: RestBeans = [bean("shop.Orders")].into_iter().collect();

        let endpoints = EndpointResolver::new(&catalog)
            .resolve(&module, &loader(), &beans)
            .unwrap();

        assert_eq!(
            summary(&endpoints),
            vec![(TargetKind::Bean, "shop.Orders".into(), Some("/app".into()))]
        );
        assert!(catalog.loaded_classes().is_empty());
    }

    #[test]
    fn test_descriptor_excludes_scanned_classes() {
        let descriptor = ResourceApplicationDescriptor::new("shop.ShopApplication", Some("/api"))
            .with_singleton(SingletonInstance::new(
                ResourceClass::new("shop.Ping", Some("/ping")),
                "ping",
            ))
            .with_class(ResourceClass::new("shop.Carts", Some("/carts")));
        let catalog = InMemoryCatalog::new()
            .with_class("shop.Widgets", Some("/widgets"))
            .with_application(descriptor);
        let module = WebModuleRecord::new("shop-web", "/app")
            .with_class("shop.Widgets")
            .with_application("shop.ShopApplication");

        let endpoints = EndpointResolver::new(&catalog)
            .resolve(&module, &loader(), &RestBeans::new())
            .unwrap();

        assert_eq!(
            summary(&endpoints),
            vec![
                (TargetKind::Singleton, "shop.Ping".into(), Some("/app/api".into())),
                (TargetKind::Class, "shop.Carts".into(), Some("/app/api".into())),
            ]
        );
        assert!(catalog.loaded_classes().is_empty());
        match &endpoints[1].target {
            EndpointTarget::Class { descriptor, .. } => {
                assert_eq!(
                    descriptor.as_ref().map(|d| d.class_name.as_str()),
                    Some("shop.ShopApplication")
                );
            }
            other => panic!("expected a class target, got {other:?}"),
        }
    }

    #[test]
    fn test_bean_wins_over_descriptor_entries() {
        let descriptor = ResourceApplicationDescriptor::new("shop.ShopApplication", None)
            .with_singleton(SingletonInstance::new(
                ResourceClass::new("shop.Orders", Some("/orders")),
                "orders",
            ))
            .with_class(ResourceClass::new("shop.Stock", Some("/stock")));
        let catalog = InMemoryCatalog::new().with_application(descriptor);
        let module = WebModuleRecord::new("shop-web", "/app").with_application("shop.ShopApplication");
        let beans: RestBeans = [bean("shop.Orders"), bean("shop.Stock")].into_iter().collect();

        let endpoints = EndpointResolver::new(&catalog)
            .resolve(&module, &loader(), &beans)
            .unwrap();

        assert_eq!(
            summary(&endpoints),
            vec![
                (TargetKind::Bean, "shop.Orders".into(), Some("/app/".into())),
                (TargetKind::Bean, "shop.Stock".into(), Some("/app/".into())),
            ]
        );
    }

    #[test]
    fn test_every_descriptor_is_resolved_in_order() {
        let first = ResourceApplicationDescriptor::new("shop.PublicApi", Some("public"))
            .with_class(ResourceClass::new("shop.Catalog", Some("/catalog")));
        let second = ResourceApplicationDescriptor::new("shop.AdminApi", Some("/admin"))
            .with_class(ResourceClass::new("shop.Users", Some("/users")));
        let catalog = InMemoryCatalog::new()
            .with_application(first)
            .with_application(second);
        let module = WebModuleRecord::new("shop-web", "app")
            .with_application("shop.PublicApi")
            .with_application("shop.AdminApi");

        let endpoints = EndpointResolver::new(&catalog)
            .resolve(&module, &loader(), &RestBeans::new())
            .unwrap();

        assert_eq!(
            summary(&endpoints),
            vec![
                (TargetKind::Class, "shop.Catalog".into(), Some("app/public".into())),
                (TargetKind::Class, "shop.Users".into(), Some("app/admin".into())),
            ]
        );
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let catalog = InMemoryCatalog::new()
            .with_class("shop.A", Some("/a"))
            .with_class("shop.B", Some("/b"))
            .with_class("shop.C", Some("/c"));
        let module = WebModuleRecord::new("shop-web", "/app")
            .with_class("shop.C")
            .with_class("shop.A")
            .with_class("shop.B");
        let beans: RestBeans = [bean("shop.A")].into_iter().collect();
        let resolver = EndpointResolver::new(&catalog);

        let first = summary(&resolver.resolve(&module, &loader(), &beans).unwrap());
        for _ in 0..5 {
            let again = summary(&resolver.resolve(&module, &loader(), &beans).unwrap());
            assert_eq!(first, again);
        }
        let names: Vec<&str> = first.iter().map(|(_, name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["shop.C", "shop.A", "shop.B"]);
    }

    #[test]
    fn test_unknown_class_fails_resolution() {
        let catalog = InMemoryCatalog::new().with_class("shop.Widgets", Some("/widgets"));
        let module = WebModuleRecord::new("shop-web", "/app")
            .with_class("shop.Widgets")
            .with_class("shop.Missing");

        let err = EndpointResolver::new(&catalog)
            .resolve(&module, &loader(), &RestBeans::new())
            .unwrap_err();

        assert!(matches!(
            err,
            DeployError::ClassResolution { ref class, .. } if class == "shop.Missing"
        ));
    }

    #[test]
    fn test_broken_descriptor_fails_resolution() {
        let catalog = InMemoryCatalog::new();
        let module = WebModuleRecord::new("shop-web", "/app").with_application("shop.Broken");

        let err = EndpointResolver::new(&catalog)
            .resolve(&module, &loader(), &RestBeans::new())
            .unwrap_err();

        assert!(matches!(
            err,
            DeployError::DescriptorInstantiation { ref class, .. } if class == "shop.Broken"
        ));
    }

    #[test]
    fn test_effective_prefix() {
        assert_eq!(effective_prefix("/app", None), "/app/");
        assert_eq!(effective_prefix("/app/", Some("/api")), "/app/api");
        assert_eq!(effective_prefix("app", Some("api")), "app/api");
        assert_eq!(effective_prefix("", Some("/api")), "/api");
    }
}
