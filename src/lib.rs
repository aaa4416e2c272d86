//! Kubernetes operator that gives every Service annotated with
//! `auto-ingress: <path>` a Traefik Ingress routing that path to the Service.

pub mod api;
pub mod app_state;
pub mod cli;
pub mod config;
pub mod controller;
pub mod core;
pub mod debug;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod routes;
