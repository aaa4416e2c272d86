pub mod ingress_reconcile_service;
