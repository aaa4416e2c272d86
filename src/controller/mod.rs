pub mod service_controller;
