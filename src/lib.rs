pub mod service {
    pub mod config_service;
}

pub mod config {
    pub mod config;
    pub mod ports;
}

pub mod action {
    pub mod cli;
}

pub mod utils {
    pub mod charset;
    pub mod convert;
    pub mod file;
    pub mod utils;
}
