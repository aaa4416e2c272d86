pub mod kube_client;
pub mod kube_resources;
pub mod services;
pub mod ingresses;
pub mod watchers;
